//! Outward collaborators: user notifications and view rendering.
//!
//! The controller never draws anything itself. It reports through these
//! traits and the embedding UI decides how things look.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol::RulesCatalog;
use crate::session::{GameMode, TheoremRange, Timeline};

/// Pages the client can ask the shell to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Page {
    /// Landing page.
    Home,
    /// Game page.
    Game,
}

/// Modal dialogs. Dialogs with choices are answered through the controller
/// (`dismiss`, `send_theorem_creation`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Popup {
    /// Formula solved; offers home / restart.
    Victory {
        /// Time used, if the game was timed.
        elapsed: Option<Duration>,
    },
    /// Time ran out; offers home / restart.
    Defeat,
    /// Theorem validation with a slot still empty.
    IncompleteTheorem,
    /// Asks for confirmation before creating a theorem.
    ConfirmTheorem(TheoremRange),
}

/// User-visible notifications and navigation.
pub trait NotificationSink: Send + Sync {
    /// Shows an error notification.
    fn error(&self, message: &str);

    /// Shows an informational notification.
    fn success(&self, message: &str);

    /// Opens a dialog.
    fn popup(&self, popup: Popup);

    /// Requests a page change.
    fn navigate(&self, page: Page);
}

/// One row of the game list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameListEntry {
    /// Registry index, used to select or delete the game.
    pub index: usize,
    /// Game mode.
    pub mode: GameMode,
    /// True for the current game.
    pub is_current: bool,
    /// Time left for timed games.
    pub remaining: Option<Duration>,
    /// Active formula, or the configured formula before the first state.
    pub summary: Option<String>,
}

/// Rendering hooks of the game page.
pub trait GameView: Send + Sync {
    /// Replaces the displayed formula and typesets it.
    fn show_formula(&self, math: &str);

    /// Redraws the timeline, highlighting `timeline.current()`.
    fn show_timeline(&self, timeline: &Timeline);

    /// Shows or hides the timer.
    fn show_timer(&self, visible: bool);

    /// Updates the timer text.
    fn update_timer(&self, remaining: Duration);

    /// Displays the rules listing.
    fn show_rules(&self, rules: &RulesCatalog);

    /// Displays the game list.
    fn show_game_list(&self, entries: &[GameListEntry]);

    /// Displays the "no game in progress" placeholder.
    fn show_no_game(&self);
}
