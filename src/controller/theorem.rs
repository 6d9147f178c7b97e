//! Theorem creation from a selected timeline interval.

use tracing::{debug, info, instrument, warn};

use super::{ControllerError, GameController};
use crate::presenter::Popup;
use crate::protocol::{Request, RequestKind};
use crate::session::{SelectionChange, TheoremRange};

/// Result of [`GameController::valid_theorem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TheoremCheck {
    /// A slot is empty; the user was told so.
    Incomplete,
    /// Both bounds set; the user was asked to confirm.
    Ready(TheoremRange),
}

impl GameController {
    /// Enters or leaves theorem mode. The selection is cleared either way.
    /// Returns the new mode.
    #[instrument(skip(self))]
    pub fn toggle_create_theorem(&self) -> bool {
        let mut state = self.state();
        state.theorem_mode = !state.theorem_mode;
        state.selection.clear();
        debug!(theorem_mode = state.theorem_mode, "Theorem mode toggled");
        state.theorem_mode
    }

    /// Toggles `index` in the theorem selection.
    #[instrument(skip(self))]
    pub fn select_for_theorem(&self, index: usize) -> SelectionChange {
        self.state().selection.toggle(index)
    }

    /// Orders the selection and asks for confirmation, or reports the
    /// missing bound.
    #[instrument(skip(self))]
    pub fn valid_theorem(&self) -> TheoremCheck {
        let range = {
            let mut state = self.state();
            state.selection.normalize();
            state.selection.range()
        };
        match range {
            Some(range) => {
                self.notifier().popup(Popup::ConfirmTheorem(range));
                TheoremCheck::Ready(range)
            }
            None => {
                debug!("Theorem selection incomplete");
                self.notifier().popup(Popup::IncompleteTheorem);
                TheoremCheck::Incomplete
            }
        }
    }

    /// Asks the server to create a theorem from the selected interval, then
    /// clears the selection and leaves theorem mode whatever happened.
    #[instrument(skip(self))]
    pub async fn send_theorem_creation(&self) -> Result<(), ControllerError> {
        let (target, range) = {
            let mut state = self.state();
            let target = state.current_target();
            let range = state.selection.range();
            state.reset_theorem_mode();
            (target, range)
        };

        let (_, game_id) = target?;
        let Some(range) = range else {
            warn!("Theorem creation with an incomplete selection");
            return Err(ControllerError::IncompleteSelection);
        };

        info!(%game_id, start = range.start, end = range.end, "Creating theorem");
        let request = Request::for_game(RequestKind::CreateTheorem, &game_id)
            .segment(range.start)
            .segment(range.end);
        self.fire_and_forget(request).await;
        Ok(())
    }
}
