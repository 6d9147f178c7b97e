//! On-demand rules listing.

use tracing::{debug, error, instrument};

use super::{ControllerError, GameController};
use crate::protocol::{Request, RequestKind, RulesCatalog, check_error};

impl GameController {
    /// Opens the rules listing, fetching it anew, or closes it.
    ///
    /// Returns the fetched catalog when opening, `None` when closing.
    #[instrument(skip(self))]
    pub async fn toggle_rules_list(&self) -> Result<Option<RulesCatalog>, ControllerError> {
        let game_id = {
            let mut state = self.state();
            if state.rules_open {
                state.rules_open = false;
                debug!("Rules listing closed");
                return Ok(None);
            }
            let (_, game_id) = state.current_target()?;
            state.rules_open = true;
            game_id
        };

        let response = self
            .send(&Request::for_game(RequestKind::RulesList, &game_id))
            .await;
        let rules = check_error(response, self.notifier())
            .and_then(|payload| {
                payload
                    .require_rules()
                    .inspect_err(|e| self.notifier().error(&e.to_string()))
            })
            .map_err(|e| {
                error!(error = %e, "Request response invalid, request might have failed");
                ControllerError::from(e)
            })?;

        debug!(rules = rules.len(), "Rules listing received");
        self.view().show_rules(&rules);
        Ok(Some(rules))
    }
}
