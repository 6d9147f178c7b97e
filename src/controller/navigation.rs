//! Rule application and timeline navigation.
//!
//! The server owns the timeline bounds: indices are sent as given.

use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ControllerError, GameController};
use crate::protocol::{Request, RequestKind};
use crate::session::SelectionChange;

/// A rule the user picked on a sub-expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct RuleApplication {
    /// Sub-expression the rule applies to.
    #[new(into)]
    pub expression_id: String,
    /// Rule to apply.
    #[new(into)]
    pub rule_id: String,
    /// Rule context chosen by the user.
    #[new(into)]
    pub context: String,
}

/// What a click on a timeline entry did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineClick {
    /// Theorem mode: the selection changed.
    Selection(SelectionChange),
    /// History mode: the state at the index was requested.
    Navigated,
}

impl GameController {
    /// Refetches the current game's state.
    #[instrument(skip(self))]
    pub async fn game_state_request(&self) -> Result<(), ControllerError> {
        let (key, game_id) = self.state().current_target()?;
        self.fetch_update(key, Request::for_game(RequestKind::GameState, &game_id))
            .await
    }

    /// Applies a rewrite rule to the current formula.
    #[instrument(skip(self))]
    pub async fn game_rule_request(&self, rule: RuleApplication) -> Result<(), ControllerError> {
        let (key, game_id) = self.state().current_target()?;
        let request = Request::new(RequestKind::ApplyRule)
            .segment(&game_id)
            .segment(&rule.expression_id)
            .segment(&rule.rule_id)
            .segment(&rule.context);
        self.fetch_update(key, request).await
    }

    /// Steps one state back.
    #[instrument(skip(self))]
    pub async fn previous_state(&self) -> Result<(), ControllerError> {
        let (key, game_id) = self.state().current_target()?;
        self.fetch_update(key, Request::for_game(RequestKind::Previous, &game_id))
            .await
    }

    /// Steps one state forward.
    #[instrument(skip(self))]
    pub async fn next_state(&self) -> Result<(), ControllerError> {
        let (key, game_id) = self.state().current_target()?;
        self.fetch_update(key, Request::for_game(RequestKind::Next, &game_id))
            .await
    }

    /// Jumps to the state at `index`.
    #[instrument(skip(self))]
    pub async fn request_state_from_timeline(&self, index: usize) -> Result<(), ControllerError> {
        let (key, game_id) = self.state().current_target()?;
        let request = Request::for_game(RequestKind::Timeline, &game_id).segment(index);
        self.fetch_update(key, request).await
    }

    /// Handles a click on timeline entry `index`: selects it for a theorem
    /// in theorem mode, jumps to it otherwise.
    #[instrument(skip(self))]
    pub async fn timeline_clicked(&self, index: usize) -> Result<TimelineClick, ControllerError> {
        let selection = {
            let mut state = self.state();
            if state.theorem_mode {
                Some(state.selection.toggle(index))
            } else {
                None
            }
        };
        match selection {
            Some(change) => Ok(TimelineClick::Selection(change)),
            None => {
                self.request_state_from_timeline(index).await?;
                Ok(TimelineClick::Navigated)
            }
        }
    }
}
