//! Countdown primitive contract and the per-session timer state.

mod tokio_countdown;

pub use tokio_countdown::{TokioCountdown, TokioCountdownFactory};

use std::sync::Arc;
use std::time::Duration;

use derive_more::{Display, Error};
use tracing::{debug, info, instrument, warn};

/// Length of a NORMAL game when no remaining time was recorded.
pub const DEFAULT_GAME_DURATION: Duration = Duration::from_millis(2 * 60 * 1000);

/// A running clock with a terminal "over" state.
pub trait Countdown: Send + std::fmt::Debug {
    /// Starts or resumes the clock.
    fn start(&mut self);

    /// Pauses the clock. Safe to call when already stopped.
    fn stop(&mut self);

    /// Time consumed so far.
    fn elapsed(&self) -> Duration;

    /// Time left before expiry.
    fn remaining(&self) -> Duration;

    /// True once the clock reached zero.
    fn is_over(&self) -> bool;
}

/// Builds countdowns wired to the given hooks.
pub trait CountdownFactory: Send + Sync {
    /// Creates a stopped countdown of `duration`.
    fn create(&self, duration: Duration, hooks: CountdownHooks) -> Box<dyn Countdown>;
}

/// Callbacks a countdown fires while running.
#[derive(Clone)]
pub struct CountdownHooks {
    on_tick: Arc<dyn Fn(Duration) + Send + Sync>,
    on_expire: Arc<dyn Fn() + Send + Sync>,
}

impl CountdownHooks {
    /// Creates hooks from a tick callback (receives the remaining time) and
    /// an expiry callback.
    pub fn new(
        on_tick: impl Fn(Duration) + Send + Sync + 'static,
        on_expire: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_tick: Arc::new(on_tick),
            on_expire: Arc::new(on_expire),
        }
    }

    /// Hooks that do nothing.
    pub fn noop() -> Self {
        Self::new(|_| {}, || {})
    }

    /// Reports the remaining time.
    pub fn tick(&self, remaining: Duration) {
        (self.on_tick)(remaining)
    }

    /// Reports expiry.
    pub fn expire(&self) {
        (self.on_expire)()
    }
}

impl std::fmt::Debug for CountdownHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountdownHooks").finish_non_exhaustive()
    }
}

/// Misuse of a session timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum CountdownError {
    /// The timer already expired; the game must be deleted or restarted.
    #[display("Countdown is over, the game should be deleted or restarted")]
    Over,
}

/// Timer of one session.
#[derive(Debug, Default)]
pub enum TimerState {
    /// Never started.
    #[default]
    Unset,
    /// A recorded remaining duration, not yet turned into a countdown.
    PendingDuration(Duration),
    /// Ticking.
    Running(Box<dyn Countdown>),
    /// Constructed but stopped; can be resumed.
    Paused(Box<dyn Countdown>),
    /// Reached zero. Terminal until cleared.
    Expired(Box<dyn Countdown>),
}

impl TimerState {
    /// Starts the timer.
    ///
    /// An unset timer gets `default_duration`, a pending one its recorded
    /// duration. Starting a running timer is a no-op. Starting an expired
    /// timer fails and leaves it expired.
    #[instrument(skip(self, factory, hooks), fields(state = self.label()))]
    pub fn start(
        &mut self,
        factory: &dyn CountdownFactory,
        default_duration: Duration,
        hooks: CountdownHooks,
    ) -> Result<(), CountdownError> {
        let next = match std::mem::take(self) {
            Self::Unset => {
                info!(duration_ms = default_duration.as_millis() as u64, "Creating countdown");
                let mut countdown = factory.create(default_duration, hooks);
                countdown.start();
                Self::Running(countdown)
            }
            Self::PendingDuration(duration) => {
                info!(duration_ms = duration.as_millis() as u64, "Creating countdown from recorded duration");
                let mut countdown = factory.create(duration, hooks);
                countdown.start();
                Self::Running(countdown)
            }
            Self::Paused(countdown) | Self::Running(countdown) if countdown.is_over() => {
                *self = Self::Expired(countdown);
                warn!("Refusing to start an expired countdown");
                return Err(CountdownError::Over);
            }
            Self::Paused(mut countdown) => {
                debug!("Resuming countdown");
                countdown.start();
                Self::Running(countdown)
            }
            running @ Self::Running(_) => {
                debug!("Countdown already running");
                running
            }
            expired @ Self::Expired(_) => {
                *self = expired;
                warn!("Refusing to start an expired countdown");
                return Err(CountdownError::Over);
            }
        };
        *self = next;
        Ok(())
    }

    /// Stops a running timer. No-op in every other state.
    pub fn stop(&mut self) {
        *self = match std::mem::take(self) {
            Self::Running(mut countdown) => {
                countdown.stop();
                if countdown.is_over() {
                    Self::Expired(countdown)
                } else {
                    debug!(remaining_ms = countdown.remaining().as_millis() as u64, "Countdown stopped");
                    Self::Paused(countdown)
                }
            }
            other => other,
        };
    }

    /// Marks the timer expired.
    pub fn expire(&mut self) {
        *self = match std::mem::take(self) {
            Self::Running(countdown) | Self::Paused(countdown) | Self::Expired(countdown) => {
                Self::Expired(countdown)
            }
            other => other,
        };
    }

    /// Stops and forgets the timer.
    pub fn clear(&mut self) {
        self.stop();
        *self = Self::Unset;
    }

    /// Time consumed, once a countdown exists.
    pub fn elapsed(&self) -> Option<Duration> {
        self.handle().map(|c| c.elapsed())
    }

    /// Time left: the recorded duration while pending, the countdown's
    /// remaining time once constructed.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            Self::PendingDuration(duration) => Some(*duration),
            _ => self.handle().map(|c| c.remaining()),
        }
    }

    /// True while ticking.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    /// True once a countdown was built, running or not.
    pub fn is_constructed(&self) -> bool {
        self.handle().is_some()
    }

    /// True once expired.
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired(_))
    }

    fn handle(&self) -> Option<&dyn Countdown> {
        match self {
            Self::Running(c) | Self::Paused(c) | Self::Expired(c) => Some(c.as_ref()),
            Self::Unset | Self::PendingDuration(_) => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::PendingDuration(_) => "pending",
            Self::Running(_) => "running",
            Self::Paused(_) => "paused",
            Self::Expired(_) => "expired",
        }
    }
}
