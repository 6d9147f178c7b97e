//! Countdown driven by a tokio interval task.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, trace};

use super::{Countdown, CountdownFactory, CountdownHooks};

#[derive(Debug)]
struct Clock {
    duration: Duration,
    consumed: Duration,
    started_at: Option<Instant>,
    over: bool,
    /// Bumped on every start/stop so a superseded ticker task exits.
    generation: u64,
}

impl Clock {
    fn elapsed(&self) -> Duration {
        let live = self.started_at.map(|at| at.elapsed()).unwrap_or_default();
        (self.consumed + live).min(self.duration)
    }

    fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed())
    }
}

/// Countdown that spawns a ticker task on the current tokio runtime while
/// running. Hooks are called from that task.
#[derive(Debug)]
pub struct TokioCountdown {
    clock: Arc<Mutex<Clock>>,
    hooks: CountdownHooks,
    tick: Duration,
}

fn lock(clock: &Mutex<Clock>) -> MutexGuard<'_, Clock> {
    clock.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TokioCountdown {
    /// Creates a stopped countdown ticking every `tick`.
    pub fn new(duration: Duration, tick: Duration, hooks: CountdownHooks) -> Self {
        Self {
            clock: Arc::new(Mutex::new(Clock {
                duration,
                consumed: Duration::ZERO,
                started_at: None,
                over: duration.is_zero(),
                generation: 0,
            })),
            hooks,
            tick,
        }
    }

    async fn run_ticker(
        clock: Arc<Mutex<Clock>>,
        hooks: CountdownHooks,
        tick: Duration,
        generation: u64,
    ) {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let remaining = {
                let mut clock = lock(&clock);
                if clock.generation != generation || clock.started_at.is_none() {
                    trace!(generation, "Ticker superseded");
                    return;
                }
                let remaining = clock.remaining();
                if remaining.is_zero() {
                    clock.consumed = clock.duration;
                    clock.started_at = None;
                    clock.over = true;
                }
                remaining
            };

            if remaining.is_zero() {
                info!("Countdown expired");
                hooks.expire();
                return;
            }
            hooks.tick(remaining);
        }
    }
}

impl Countdown for TokioCountdown {
    #[instrument(skip(self))]
    fn start(&mut self) {
        let generation = {
            let mut clock = lock(&self.clock);
            if clock.over || clock.started_at.is_some() {
                return;
            }
            clock.started_at = Some(Instant::now());
            clock.generation += 1;
            clock.generation
        };
        debug!(generation, "Countdown started");
        tokio::spawn(Self::run_ticker(
            Arc::clone(&self.clock),
            self.hooks.clone(),
            self.tick,
            generation,
        ));
    }

    #[instrument(skip(self))]
    fn stop(&mut self) {
        let mut clock = lock(&self.clock);
        if let Some(at) = clock.started_at.take() {
            clock.consumed = (clock.consumed + at.elapsed()).min(clock.duration);
            clock.generation += 1;
            debug!(consumed_ms = clock.consumed.as_millis() as u64, "Countdown stopped");
        }
    }

    fn elapsed(&self) -> Duration {
        lock(&self.clock).elapsed()
    }

    fn remaining(&self) -> Duration {
        lock(&self.clock).remaining()
    }

    fn is_over(&self) -> bool {
        lock(&self.clock).over
    }
}

/// Factory for [`TokioCountdown`].
#[derive(Debug, Clone, Copy)]
pub struct TokioCountdownFactory {
    tick: Duration,
}

impl TokioCountdownFactory {
    /// Creates a factory whose countdowns tick every `tick`.
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }
}

impl Default for TokioCountdownFactory {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl CountdownFactory for TokioCountdownFactory {
    fn create(&self, duration: Duration, hooks: CountdownHooks) -> Box<dyn Countdown> {
        Box::new(TokioCountdown::new(duration, self.tick, hooks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_expires_once_after_duration() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let expiries = Arc::new(AtomicUsize::new(0));
        let hooks = {
            let ticks = ticks.clone();
            let expiries = expiries.clone();
            CountdownHooks::new(
                move |_| {
                    ticks.fetch_add(1, Ordering::SeqCst);
                },
                move || {
                    expiries.fetch_add(1, Ordering::SeqCst);
                },
            )
        };

        let mut countdown =
            TokioCountdown::new(Duration::from_secs(3), Duration::from_secs(1), hooks);
        countdown.start();
        tokio::time::sleep(Duration::from_millis(5500)).await;

        assert!(countdown.is_over());
        assert_eq!(countdown.remaining(), Duration::ZERO);
        assert_eq!(expiries.load(Ordering::SeqCst), 1);
        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_freezes_elapsed() {
        let mut countdown = TokioCountdown::new(
            Duration::from_secs(60),
            Duration::from_secs(1),
            CountdownHooks::noop(),
        );
        countdown.start();
        tokio::time::sleep(Duration::from_secs(10)).await;
        countdown.stop();
        let frozen = countdown.elapsed();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(countdown.elapsed(), frozen);
        assert_eq!(frozen, Duration::from_secs(10));
        assert!(!countdown.is_over());
    }
}
