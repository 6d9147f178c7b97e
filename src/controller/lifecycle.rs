//! Starting, resuming, restarting, ending and switching games.

use tracing::{debug, error, info, instrument, warn};

use super::{ControllerError, GameController, TimerEvent};
use crate::presenter::{GameListEntry, Page, Popup};
use crate::protocol::{RawResponse, Request, RequestKind, TransportError, ValidationError, check_error};
use crate::session::{GameConfig, GameId, SessionKey, SessionPhase, Ticket};

/// What [`GameController::enter`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// No game is current; the placeholder is shown.
    NoGame,
    /// The current game was started or resumed.
    Started,
}

/// Answer to the Victory / Defeat dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    /// Discard the game and go to the home page.
    Home,
    /// Play the same configuration again.
    Restart,
    /// Keep the finished game and leave it be.
    Stay,
}

/// Restart as two explicit steps: tell the server the old game is over,
/// then start a fresh one with the same configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartWorkflow {
    key: SessionKey,
    over: Option<GameId>,
}

impl RestartWorkflow {
    /// Plans a restart of session `key`, whose server game is `over`.
    pub fn new(key: SessionKey, over: Option<GameId>) -> Self {
        Self { key, over }
    }

    /// Runs OVER, then START once the OVER request was delivered.
    #[instrument(skip(controller), fields(key = %self.key))]
    pub async fn run(self, controller: &GameController) -> Result<(), ControllerError> {
        if let Some(game_id) = &self.over {
            let response = controller
                .send(&Request::for_game(RequestKind::Over, game_id))
                .await;
            if let Err(e) = delivered(response) {
                error!(error = %e, "OVER not delivered, restart aborted");
                controller.notifier().error(&e.to_string());
                return Err(e.into());
            }
            debug!("Old game closed");
        }
        controller.start_game(self.key).await
    }
}

fn delivered(response: Result<RawResponse, TransportError>) -> Result<(), ValidationError> {
    match response {
        Ok(r) if r.is_dispatched() => Ok(()),
        Ok(r) => Err(ValidationError::HttpStatus { status: r.status() }),
        Err(e) => Err(ValidationError::Transport { message: e.message }),
    }
}

impl GameController {
    /// Opens the game page: shows the placeholder when no game is current,
    /// otherwise starts or resumes it.
    #[instrument(skip(self))]
    pub async fn enter(&self) -> Result<EntryState, ControllerError> {
        let has_current = self.state().registry.current().is_some();
        if !has_current {
            info!("No game in progress");
            self.view().show_no_game();
            return Ok(EntryState::NoGame);
        }
        self.on_start().await?;
        Ok(EntryState::Started)
    }

    /// Leaves the game page: stops the current countdown.
    #[instrument(skip(self))]
    pub fn dispose(&self) {
        self.state().registry.stop_countdown();
        self.view().show_timer(false);
        debug!("Controller disposed");
    }

    /// Starts the current game if it has no server id, resumes it otherwise.
    #[instrument(skip(self))]
    pub async fn on_start(&self) -> Result<(), ControllerError> {
        let (key, game_id) = {
            let state = self.state();
            let session = state.registry.current().ok_or(ControllerError::NoCurrentGame)?;
            (session.key(), session.game_id().cloned())
        };
        match game_id {
            None => self.start_game(key).await,
            Some(game_id) => self.resume_game(key, game_id).await,
        }
    }

    /// Starts the current game afresh with its stored configuration.
    #[instrument(skip(self))]
    pub async fn start_new_game(&self) -> Result<(), ControllerError> {
        let key = self
            .state()
            .registry
            .current()
            .map(|s| s.key())
            .ok_or(ControllerError::NoCurrentGame)?;
        self.start_game(key).await
    }

    pub(crate) async fn start_game(&self, key: SessionKey) -> Result<(), ControllerError> {
        let config = {
            let mut state = self.state();
            let session = state
                .registry
                .find_mut(key)
                .ok_or(ControllerError::UnknownSession { key })?;
            session.phase = SessionPhase::Starting;
            session.config().clone()
        };
        info!(%key, mode = %config.mode(), rule_set = %config.rule_set(), formula_id = %config.formula_id(), "Starting game");

        let request = Request::new(RequestKind::Start)
            .segment(config.mode())
            .segment(config.rule_set())
            .segment(config.formula_id())
            .segment(config.use_theorem());
        let response = self.send(&request).await;

        let game_id = check_error(response, self.notifier())
            .and_then(|payload| {
                payload.require_id().inspect_err(|e| self.notifier().error(&e.to_string()))
            })
            .map_err(|e| {
                error!(error = %e, "Request response invalid, request might have failed");
                ControllerError::from(e)
            })?;

        let ticket = {
            let mut state = self.state();
            let session = state
                .registry
                .find_mut(key)
                .ok_or(ControllerError::UnknownSession { key })?;
            session.game_id = Some(game_id.clone());
            session.sequence.issue()
        };
        info!(%key, %game_id, "Game created");

        let response = self
            .send(&Request::for_game(RequestKind::GameState, &game_id))
            .await;
        self.game_start_response(key, ticket, response).await
    }

    async fn resume_game(&self, key: SessionKey, game_id: GameId) -> Result<(), ControllerError> {
        if let Some(session) = self.state().registry.find_mut(key) {
            session.phase = SessionPhase::Resuming;
        }
        info!(%key, %game_id, "Resuming game");

        let response = self
            .send(&Request::for_game(RequestKind::Resume, &game_id))
            .await;
        check_error(response, self.notifier()).map_err(|e| {
            error!(error = %e, "Resume refused, session presumed out of sync");
            ControllerError::from(e)
        })?;

        let ticket = self.issue_ticket(key)?;
        let response = self
            .send(&Request::for_game(RequestKind::GameState, &game_id))
            .await;
        self.game_start_response(key, ticket, response).await
    }

    /// Funnels the first state of a started or resumed game, then restarts
    /// the session timer.
    async fn game_start_response(
        &self,
        key: SessionKey,
        ticket: Ticket,
        response: Result<RawResponse, TransportError>,
    ) -> Result<(), ControllerError> {
        self.game_update_math_response(key, ticket, response).await?;

        let is_current = {
            let mut state = self.state();
            let is_current = state.registry.is_current(key);
            if is_current {
                state.registry.stop_countdown();
            }
            is_current
        };
        if !is_current {
            debug!(%key, "Game no longer current, timer not started");
            return Ok(());
        }
        self.view().show_timer(false);
        self.start_timer(key)
    }

    /// Plays the current game again: stops and forgets its timer, then runs
    /// a [`RestartWorkflow`].
    #[instrument(skip(self))]
    pub async fn restart_game(&self) -> Result<(), ControllerError> {
        let workflow = {
            let mut state = self.state();
            state.registry.stop_countdown();
            let session = state
                .registry
                .current_mut()
                .ok_or(ControllerError::NoCurrentGame)?;
            session.clear_timer();
            RestartWorkflow::new(session.key(), session.game_id().cloned())
        };
        self.view().show_timer(false);
        info!("Restarting game");
        workflow.run(self).await
    }

    /// Routes a countdown event. Events of a discarded countdown are
    /// dropped.
    #[instrument(skip(self))]
    pub async fn handle_timer_event(&self, event: TimerEvent) -> Result<(), ControllerError> {
        match event {
            TimerEvent::Tick {
                key,
                generation,
                remaining,
            } => {
                let live = {
                    let state = self.state();
                    state.registry.is_current(key)
                        && state
                            .registry
                            .find(key)
                            .is_some_and(|s| s.owns_timer_event(generation))
                };
                if live {
                    self.view().update_timer(remaining);
                }
                Ok(())
            }
            TimerEvent::Expired { key, generation } => self.timer_on_over(key, generation).await,
        }
    }

    /// Ends session `key` on time: sends OVER and moves it to Defeat once
    /// the server acknowledged.
    ///
    /// Ignored when the countdown `generation` was replaced or cleared, and
    /// when the game already finished.
    #[instrument(skip(self))]
    pub async fn timer_on_over(&self, key: SessionKey, generation: u64) -> Result<(), ControllerError> {
        let (game_id, is_current) = {
            let mut state = self.state();
            let is_current = state.registry.is_current(key);
            let Some(session) = state.registry.find_mut(key) else {
                debug!("Expired timer of a removed game");
                return Ok(());
            };
            if !session.owns_timer_event(generation) {
                debug!(
                    live_generation = session.timer_generation(),
                    "Expiry of a discarded countdown, ignored"
                );
                return Ok(());
            }
            if session.phase.is_terminal() {
                debug!(phase = ?session.phase, "Game already finished, expiry ignored");
                return Ok(());
            }
            session.timer.expire();
            (session.game_id().cloned(), is_current)
        };

        if is_current {
            self.view().show_timer(false);
        }
        self.notifier().success("Time is up, the game is over.");

        let Some(game_id) = game_id else {
            warn!(%key, "Timer expired for a game without server id");
            return Ok(());
        };

        let response = self
            .send(&Request::for_game(RequestKind::Over, &game_id))
            .await;
        check_error(response, self.notifier()).map_err(|e| {
            error!(error = %e, "Request response invalid, request might have failed");
            ControllerError::from(e)
        })?;

        let defeated = match self.state().registry.find_mut(key) {
            Some(session) if !session.phase.is_terminal() => {
                session.phase = SessionPhase::Defeat;
                true
            }
            _ => false,
        };
        if !defeated {
            debug!(%key, "Game finished or removed while OVER was in flight");
            return Ok(());
        }
        info!(%key, %game_id, "Defeat");
        if is_current {
            self.notifier().popup(Popup::Defeat);
        }
        Ok(())
    }

    /// Answers the Victory / Defeat dialog of the current game.
    #[instrument(skip(self))]
    pub async fn dismiss(&self, choice: Dismissal) -> Result<(), ControllerError> {
        {
            let state = self.state();
            let session = state.registry.current().ok_or(ControllerError::NoCurrentGame)?;
            if !session.phase().is_terminal() {
                return Err(ControllerError::NotFinished { key: session.key() });
            }
        }

        match choice {
            Dismissal::Home => {
                {
                    let mut state = self.state();
                    state.registry.stop_countdown();
                    if let Some(index) = state.registry.current_index() {
                        state.registry.remove(index);
                    }
                    state.registry.update_current();
                    state.reset_theorem_mode();
                    state.rules_open = false;
                }
                self.notifier().navigate(Page::Home);
                Ok(())
            }
            Dismissal::Restart => self.restart_game().await,
            Dismissal::Stay => {
                debug!("Finished game kept");
                Ok(())
            }
        }
    }

    /// Adds a configured game and makes it current. Call [`GameController::enter`]
    /// or [`GameController::on_start`] to start it.
    #[instrument(skip(self, config))]
    pub fn create_game(&self, config: GameConfig) -> SessionKey {
        let key = {
            let mut state = self.state();
            state.registry.stop_countdown();
            state.reset_theorem_mode();
            state.rules_open = false;
            state.registry.create(config)
        };
        self.view().show_timer(false);
        key
    }

    /// Rows of the game list.
    pub fn game_list(&self) -> Vec<GameListEntry> {
        let state = self.state();
        let current = state.registry.current_index();
        state
            .registry
            .iter()
            .enumerate()
            .map(|(index, session)| GameListEntry {
                index,
                mode: session.mode(),
                is_current: current == Some(index),
                remaining: session.timer().remaining(),
                summary: session.summary().map(str::to_string),
            })
            .collect()
    }

    /// Renders the game list and returns its rows.
    #[instrument(skip(self))]
    pub fn show_game_list(&self) -> Vec<GameListEntry> {
        let entries = self.game_list();
        self.view().show_game_list(&entries);
        entries
    }

    /// Switches to the game at `index` and resumes it.
    #[instrument(skip(self))]
    pub async fn select_game(&self, index: usize) -> Result<(), ControllerError> {
        {
            let mut state = self.state();
            if index >= state.registry.len() {
                return Err(ControllerError::NoSuchGame { index });
            }
            state.registry.stop_countdown();
            state.registry.set_current(index);
            state.reset_theorem_mode();
            state.rules_open = false;
        }
        self.view().show_timer(false);
        info!(index, "Game selected");
        self.on_start().await
    }

    /// Deletes the game at `index`, or the current one. The server is told
    /// to drop it when it has an id.
    #[instrument(skip(self))]
    pub async fn delete_game(&self, index: Option<usize>) -> Result<(), ControllerError> {
        let (key, game_id, was_current) = {
            let mut state = self.state();
            let index = index
                .or(state.registry.current_index())
                .ok_or(ControllerError::NoCurrentGame)?;
            let was_current = state.registry.current_index() == Some(index);
            let (key, game_id) = state
                .registry
                .get(index)
                .map(|s| (s.key(), s.game_id().cloned()))
                .ok_or(ControllerError::NoSuchGame { index })?;
            if was_current {
                state.registry.stop_countdown();
                state.reset_theorem_mode();
                state.rules_open = false;
            }
            (key, game_id, was_current)
        };
        if was_current {
            self.view().show_timer(false);
        }

        if let Some(game_id) = &game_id {
            self.fire_and_forget(Request::for_game(RequestKind::Delete, game_id))
                .await;
        }

        {
            let mut state = self.state();
            let removed = match &game_id {
                Some(game_id) => state.registry.delete(game_id),
                None => state
                    .registry
                    .position(key)
                    .and_then(|index| state.registry.remove(index)),
            };
            if removed.is_none() {
                debug!(%key, "Game already removed");
            }
            state.registry.update_current();
        }
        info!(%key, "Game deleted");
        self.notifier().navigate(Page::Game);
        Ok(())
    }
}
