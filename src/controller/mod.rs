//! Session orchestration: the entry points UI events call into.
//!
//! [`GameController`] owns the [`SessionRegistry`] behind a mutex that is
//! never held across an `.await`, so entry points may run concurrently and
//! interleave with timer events. Every state-bearing reply goes through
//! [`GameController::game_update_math_response`], which applies it only to
//! the session that issued the request and only if no newer reply for that
//! session was applied already.

mod lifecycle;
mod navigation;
mod rules;
mod theorem;

pub use lifecycle::{Dismissal, EntryState, RestartWorkflow};
pub use navigation::{RuleApplication, TimelineClick};
pub use theorem::TheoremCheck;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use derive_more::{Display, Error, From};
use derive_new::new;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::countdown::{CountdownError, CountdownFactory, CountdownHooks, DEFAULT_GAME_DURATION};
use crate::presenter::{GameView, NotificationSink, Popup};
use crate::protocol::{RawResponse, Request, RequestKind, TransportError, ValidationError, check_formula_state};
use crate::session::{
    GameId, GameMode, GameStatus, SessionKey, SessionPhase, SessionRegistry, TheoremSelection,
    Ticket, Timeline,
};
use crate::transport::Transport;

/// Failure of an orchestration entry point.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum ControllerError {
    /// A reply failed validation; the user was already notified.
    #[from]
    #[display("Request response invalid, request might have failed: {}", _0)]
    Validation(ValidationError),

    /// Timer misuse; the user was already notified.
    #[from]
    #[display("{}", _0)]
    Countdown(CountdownError),

    /// No session is current.
    #[display("No game in progress")]
    NoCurrentGame,

    /// The session was never started server-side.
    #[display("Game {} has no server id yet", key)]
    MissingGameId {
        /// Local handle of the session.
        key: SessionKey,
    },

    /// No session at a registry index.
    #[display("No game at index {}", index)]
    NoSuchGame {
        /// Requested index.
        index: usize,
    },

    /// The session was removed while a flow was running.
    #[display("Game {} was removed", key)]
    UnknownSession {
        /// Local handle of the session.
        key: SessionKey,
    },

    /// The session is neither won nor lost.
    #[display("Game {} is not finished", key)]
    NotFinished {
        /// Local handle of the session.
        key: SessionKey,
    },

    /// Theorem creation requested with a slot still empty.
    #[display("Theorem selection is incomplete")]
    IncompleteSelection,
}

/// Timer callbacks, delivered to [`GameController::handle_timer_event`].
///
/// `generation` names the countdown that fired; events of a countdown the
/// session has since discarded are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Remaining time of a session's countdown.
    Tick {
        /// Session owning the countdown.
        key: SessionKey,
        /// Countdown that fired.
        generation: u64,
        /// Time left.
        remaining: Duration,
    },
    /// A session's countdown reached zero.
    Expired {
        /// Session owning the countdown.
        key: SessionKey,
        /// Countdown that fired.
        generation: u64,
    },
}

/// Tunables of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Countdown length for a NORMAL game without a recorded duration.
    pub default_duration: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            default_duration: DEFAULT_GAME_DURATION,
        }
    }
}

/// Everything the controller needs, handed over at construction.
#[derive(new)]
pub struct ControllerDeps {
    /// Sessions to drive.
    pub registry: SessionRegistry,
    /// Request/response channel to the game server.
    pub transport: Arc<dyn Transport>,
    /// Notifications, dialogs and navigation.
    pub notifier: Arc<dyn NotificationSink>,
    /// Game page rendering.
    pub view: Arc<dyn GameView>,
    /// Countdown constructor.
    pub countdowns: Arc<dyn CountdownFactory>,
    /// Tunables.
    pub settings: ControllerSettings,
}

#[derive(Debug, Default)]
struct ControllerState {
    registry: SessionRegistry,
    theorem_mode: bool,
    selection: TheoremSelection,
    rules_open: bool,
}

impl ControllerState {
    fn current_target(&self) -> Result<(SessionKey, GameId), ControllerError> {
        let session = self.registry.current().ok_or(ControllerError::NoCurrentGame)?;
        let game_id = session
            .game_id()
            .cloned()
            .ok_or(ControllerError::MissingGameId { key: session.key() })?;
        Ok((session.key(), game_id))
    }

    fn reset_theorem_mode(&mut self) {
        self.theorem_mode = false;
        self.selection.clear();
    }
}

struct Inner {
    state: Mutex<ControllerState>,
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn NotificationSink>,
    view: Arc<dyn GameView>,
    countdowns: Arc<dyn CountdownFactory>,
    settings: ControllerSettings,
    timer_tx: mpsc::UnboundedSender<TimerEvent>,
}

/// Client-side controller of the rewriting game. Cheap to clone.
#[derive(Clone)]
pub struct GameController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for GameController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameController")
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

impl GameController {
    /// Creates a controller and the receiver its countdowns report to.
    ///
    /// Feed every received event to [`GameController::handle_timer_event`].
    #[instrument(skip_all, fields(sessions = deps.registry.len()))]
    pub fn new(deps: ControllerDeps) -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        info!("Creating game controller");
        let controller = Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ControllerState {
                    registry: deps.registry,
                    ..ControllerState::default()
                }),
                transport: deps.transport,
                notifier: deps.notifier,
                view: deps.view,
                countdowns: deps.countdowns,
                settings: deps.settings,
                timer_tx,
            }),
        };
        (controller, timer_rx)
    }

    /// Reads the registry.
    pub fn with_registry<R>(&self, f: impl FnOnce(&SessionRegistry) -> R) -> R {
        f(&self.state().registry)
    }

    /// Timeline of the current session.
    pub fn current_timeline(&self) -> Option<Timeline> {
        self.state().registry.current().and_then(|s| s.timeline().cloned())
    }

    /// True while timeline clicks select theorem bounds.
    pub fn theorem_mode(&self) -> bool {
        self.state().theorem_mode
    }

    /// Current theorem selection.
    pub fn selection(&self) -> TheoremSelection {
        self.state().selection
    }

    /// True while the rules listing is open.
    pub fn rules_open(&self) -> bool {
        self.state().rules_open
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notifier(&self) -> &dyn NotificationSink {
        self.inner.notifier.as_ref()
    }

    fn view(&self) -> &dyn GameView {
        self.inner.view.as_ref()
    }

    async fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        debug!(%request, "Sending request");
        self.inner.transport.send(request).await
    }

    /// Sends a request whose reply is not processed.
    async fn fire_and_forget(&self, request: Request) {
        match self.send(&request).await {
            Ok(response) if response.is_dispatched() => {
                trace!(%request, "Fire-and-forget request delivered");
            }
            Ok(response) => {
                warn!(%request, status = response.status(), "Fire-and-forget request rejected");
            }
            Err(e) => warn!(%request, error = %e, "Fire-and-forget request failed"),
        }
    }

    /// Takes a ticket for a state-bearing request of session `key`.
    fn issue_ticket(&self, key: SessionKey) -> Result<Ticket, ControllerError> {
        let mut state = self.state();
        let session = state
            .registry
            .find_mut(key)
            .ok_or(ControllerError::UnknownSession { key })?;
        Ok(session.sequence.issue())
    }

    /// Sends a state-bearing request for session `key` and funnels the reply.
    async fn fetch_update(&self, key: SessionKey, request: Request) -> Result<(), ControllerError> {
        let ticket = self.issue_ticket(key)?;
        let result = self.send(&request).await;
        self.game_update_math_response(key, ticket, result).await
    }

    /// Funnel for every reply carrying a formula state.
    ///
    /// Replaces the session's state and timeline. In NORMAL mode a VICTORY
    /// stops the timer, reads the elapsed time, moves the session to
    /// Victory and tells the server the game is over. Replies for removed
    /// sessions and replies older than the last applied one are dropped.
    #[instrument(skip(self, result))]
    pub(crate) async fn game_update_math_response(
        &self,
        key: SessionKey,
        ticket: Ticket,
        result: Result<RawResponse, TransportError>,
    ) -> Result<(), ControllerError> {
        let formula = check_formula_state(result, self.notifier()).map_err(|e| {
            error!(error = %e, "Request response invalid, request might have failed");
            ControllerError::from(e)
        })?;

        let (is_current, victory) = {
            let mut state = self.state();
            let is_current = state.registry.is_current(key);
            let Some(session) = state.registry.find_mut(key) else {
                debug!("Session removed before its reply arrived, dropping");
                return Ok(());
            };
            if !session.sequence.accept(ticket) {
                debug!(?ticket, "Stale reply, dropping");
                return Ok(());
            }

            let victory = formula.game_status == GameStatus::Victory
                && session.mode() == GameMode::Normal
                && !session.phase.is_terminal();
            session.current_state = Some(formula.clone());

            let victory = if victory {
                session.timer.stop();
                let elapsed = session.timer.elapsed();
                session.phase = SessionPhase::Victory { elapsed };
                info!(elapsed_ms = ?elapsed.map(|d| d.as_millis() as u64), "Victory");
                Some((elapsed, session.game_id.clone()))
            } else {
                if !session.phase.is_terminal() {
                    session.phase = SessionPhase::Active;
                }
                None
            };
            (is_current, victory)
        };

        if is_current {
            self.view().show_formula(&formula.math);
            self.view().show_timeline(&formula.timeline);
        }

        if let Some((elapsed, game_id)) = victory {
            self.view().show_timer(false);
            self.notifier().popup(Popup::Victory { elapsed });
            match game_id {
                Some(game_id) => {
                    self.fire_and_forget(Request::for_game(RequestKind::Over, &game_id))
                        .await
                }
                None => warn!("Victory for a game without server id"),
            }
        }
        Ok(())
    }

    fn timer_hooks(&self, key: SessionKey, generation: u64) -> CountdownHooks {
        let tick_tx = self.inner.timer_tx.clone();
        let expire_tx = self.inner.timer_tx.clone();
        CountdownHooks::new(
            move |remaining| {
                let event = TimerEvent::Tick {
                    key,
                    generation,
                    remaining,
                };
                if tick_tx.send(event).is_err() {
                    trace!(%key, "Timer listener gone");
                }
            },
            move || {
                if expire_tx.send(TimerEvent::Expired { key, generation }).is_err() {
                    warn!(%key, "Timer listener gone, expiry lost");
                }
            },
        )
    }

    /// Starts the timer of session `key` if it is current, timed and not
    /// finished.
    #[instrument(skip(self))]
    pub(crate) fn start_timer(&self, key: SessionKey) -> Result<(), ControllerError> {
        let result = {
            let mut state = self.state();
            if !state.registry.is_current(key) {
                debug!("Not the current session, timer left alone");
                return Ok(());
            }
            let Some(session) = state.registry.find_mut(key) else {
                return Ok(());
            };
            if session.mode() != GameMode::Normal || session.phase.is_terminal() {
                return Ok(());
            }
            let generation = session.next_timer_generation();
            let result = session.timer.start(
                self.inner.countdowns.as_ref(),
                self.inner.settings.default_duration,
                self.timer_hooks(key, generation),
            );
            if result.is_ok() && generation != session.timer_generation {
                debug!(generation, "New countdown wired");
                session.timer_generation = generation;
            }
            result
        };

        match result {
            Ok(()) => {
                self.view().show_timer(true);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Countdown is over, game should be deleted or restarted");
                self.notifier().error(
                    "The timer is over: this game should be deleted or restarted.",
                );
                Err(e.into())
            }
        }
    }
}
