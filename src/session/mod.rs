//! Session data model: games, timelines, theorem selection and the registry.

mod game_session;
mod registry;
mod theorem;
mod timeline;

pub use game_session::{
    FormulaState, GameConfig, GameId, GameMode, GameSession, GameStatus, RequestSequence,
    SessionKey, SessionPhase, Ticket,
};
pub use registry::SessionRegistry;
pub use theorem::{SelectionChange, TheoremRange, TheoremSelection};
pub use timeline::{Timeline, TimelineElement, TimelineError};
