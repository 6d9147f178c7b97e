//! Dragon client - session controller for the formula rewriting game
//!
//! A server holds a formula and the rewrite rules legal on it; this crate
//! drives game sessions against it: starting and resuming games, applying
//! rules, walking the timeline, timed play, several games side by side and
//! theorem creation from a timeline interval.
//!
//! # Architecture
//!
//! - **Protocol**: request kinds, paths, response validation
//! - **Transport**: request/response round trips (HTTP via reqwest)
//! - **Countdown**: timer contract, per-session timer state, tokio timer
//! - **Session**: games, timelines, theorem selection, the registry
//! - **Controller**: orchestration entry points called by the UI
//! - **Presenter**: notification and rendering hooks the UI implements
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dragon_client::{
//!     ControllerDeps, ControllerSettings, GameConfig, GameController, GameMode,
//!     HttpTransport, SessionRegistry, TokioCountdownFactory,
//! };
//! # use dragon_client::{GameView, NotificationSink};
//! # async fn example(
//! #     notifier: Arc<dyn NotificationSink>,
//! #     view: Arc<dyn GameView>,
//! # ) -> anyhow::Result<()> {
//! let mut registry = SessionRegistry::new();
//! registry.create(GameConfig::new(GameMode::Normal, "base", "f1", false));
//!
//! let transport = HttpTransport::new(
//!     "http://localhost:8080/libreDragon/api".to_string(),
//!     std::time::Duration::from_secs(10),
//! )?;
//! let (controller, mut timer_events) = GameController::new(ControllerDeps::new(
//!     registry,
//!     Arc::new(transport),
//!     notifier,
//!     view,
//!     Arc::new(TokioCountdownFactory::default()),
//!     ControllerSettings::default(),
//! ));
//!
//! controller.enter().await?;
//! while let Some(event) = timer_events.recv().await {
//!     controller.handle_timer_event(event).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod client_config;
mod controller;
mod countdown;
mod presenter;
mod protocol;
mod session;
mod transport;

// Crate-level exports - Configuration
pub use client_config::{ClientConfig, ConfigError, SERVER_URL_ENV};

// Crate-level exports - Orchestration
pub use controller::{
    ControllerDeps, ControllerError, ControllerSettings, Dismissal, EntryState, GameController,
    RestartWorkflow, RuleApplication, TheoremCheck, TimelineClick, TimerEvent,
};

// Crate-level exports - Countdown
pub use countdown::{
    Countdown, CountdownError, CountdownFactory, CountdownHooks, DEFAULT_GAME_DURATION,
    TimerState, TokioCountdown, TokioCountdownFactory,
};

// Crate-level exports - Presentation hooks
pub use presenter::{GameListEntry, GameView, NotificationSink, Page, Popup};

// Crate-level exports - Wire protocol
pub use protocol::{
    GameUpdatePayload, RawResponse, Request, RequestKind, RulesCatalog, TransportError,
    ValidationError, check_error, check_formula_state,
};

// Crate-level exports - Session model
pub use session::{
    FormulaState, GameConfig, GameId, GameMode, GameSession, GameStatus, RequestSequence,
    SelectionChange, SessionKey, SessionPhase, SessionRegistry, TheoremRange, TheoremSelection,
    Ticket, Timeline, TimelineElement, TimelineError,
};

// Crate-level exports - Transport
pub use transport::{HttpTransport, Transport};
