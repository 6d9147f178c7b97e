//! One game session: configuration, server state, timer and phase.

use std::time::Duration;

use derive_getters::Getters;
use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display};
use tracing::{debug, instrument};

use super::Timeline;
use crate::countdown::TimerState;

/// Server-issued game identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    /// Wraps an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for GameId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Number(u64),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Text(text) => Self(text),
            Wire::Number(n) => Self(n.to_string()),
        })
    }
}

/// Local handle of a session, stable for the life of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey(pub(crate) u64);

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Game mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum GameMode {
    /// Timed play.
    #[default]
    Normal,
    /// Untimed play for building theorems.
    Theorem,
}

/// Outcome reported by the server with every formula state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum GameStatus {
    /// Still in progress.
    #[default]
    #[serde(alias = "RUNNING")]
    Playing,
    /// Formula solved.
    Victory,
    /// Game lost.
    Defeat,
}

/// Latest formula state of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaState {
    /// Formula text.
    pub math: String,
    /// History of states.
    pub timeline: Timeline,
    /// Outcome so far.
    pub game_status: GameStatus,
}

/// Parameters chosen before a session is created.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct GameConfig {
    /// Timed or theorem play.
    mode: GameMode,
    /// Rule set the server applies.
    rule_set: String,
    /// Formula to solve.
    formula_id: String,
    /// Whether user theorems count as rules.
    use_theorem: bool,
    /// Display text of the formula before the first state arrives.
    #[serde(default)]
    formula_latex: Option<String>,
}

impl GameConfig {
    /// Creates a configuration.
    pub fn new(
        mode: GameMode,
        rule_set: impl Into<String>,
        formula_id: impl Into<String>,
        use_theorem: bool,
    ) -> Self {
        Self {
            mode,
            rule_set: rule_set.into(),
            formula_id: formula_id.into(),
            use_theorem,
            formula_latex: None,
        }
    }

    /// Sets the pre-start display text.
    pub fn with_formula_latex(mut self, latex: impl Into<String>) -> Self {
        self.formula_latex = Some(latex.into());
        self
    }
}

/// Where a session is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Configured, no server id yet.
    #[default]
    Created,
    /// START sent.
    Starting,
    /// RESUME sent for a known id.
    Resuming,
    /// Playing.
    Active,
    /// Solved in NORMAL mode.
    Victory {
        /// Time used, if a timer was running.
        elapsed: Option<Duration>,
    },
    /// Lost on time.
    Defeat,
}

impl SessionPhase {
    /// True for Victory and Defeat.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Victory { .. } | Self::Defeat)
    }
}

/// Ticket handed to a state-bearing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Per-session request numbering; only responses newer than the last
/// applied one are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestSequence {
    issued: u64,
    applied: u64,
}

impl RequestSequence {
    /// Takes the next ticket.
    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Records `ticket` as applied unless a newer response already was.
    pub fn accept(&mut self, ticket: Ticket) -> bool {
        if ticket.0 <= self.applied {
            return false;
        }
        self.applied = ticket.0;
        true
    }
}

/// One game, in progress or finished.
#[derive(Debug)]
pub struct GameSession {
    pub(crate) key: SessionKey,
    pub(crate) game_id: Option<GameId>,
    pub(crate) config: GameConfig,
    pub(crate) current_state: Option<FormulaState>,
    pub(crate) timer: TimerState,
    /// Bumped whenever a countdown is built or discarded; timer events carry
    /// the generation they were wired with.
    pub(crate) timer_generation: u64,
    pub(crate) phase: SessionPhase,
    pub(crate) sequence: RequestSequence,
}

impl GameSession {
    pub(crate) fn new(key: SessionKey, config: GameConfig) -> Self {
        Self {
            key,
            game_id: None,
            config,
            current_state: None,
            timer: TimerState::Unset,
            timer_generation: 0,
            phase: SessionPhase::Created,
            sequence: RequestSequence::default(),
        }
    }

    /// Local handle.
    pub fn key(&self) -> SessionKey {
        self.key
    }

    /// Server id, once started.
    pub fn game_id(&self) -> Option<&GameId> {
        self.game_id.as_ref()
    }

    /// Creation parameters.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Game mode.
    pub fn mode(&self) -> GameMode {
        self.config.mode
    }

    /// Latest formula state.
    pub fn current_state(&self) -> Option<&FormulaState> {
        self.current_state.as_ref()
    }

    /// Latest timeline.
    pub fn timeline(&self) -> Option<&Timeline> {
        self.current_state.as_ref().map(|s| &s.timeline)
    }

    /// Timer.
    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    /// Generation of the current countdown.
    pub fn timer_generation(&self) -> u64 {
        self.timer_generation
    }

    /// Generation the next `timer.start` will wire its hooks with: a new one
    /// when a countdown gets built, the current one when it is resumed.
    pub(crate) fn next_timer_generation(&self) -> u64 {
        if self.timer.is_constructed() {
            self.timer_generation
        } else {
            self.timer_generation + 1
        }
    }

    /// Stops and forgets the timer. Events of the discarded countdown no
    /// longer match.
    pub(crate) fn clear_timer(&mut self) {
        self.timer.clear();
        self.timer_generation += 1;
    }

    /// True when timer events wired with `generation` belong to the live
    /// countdown.
    pub fn owns_timer_event(&self, generation: u64) -> bool {
        self.timer.is_constructed() && self.timer_generation == generation
    }

    /// Life-cycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Records a remaining duration to resume with. Ignored once a
    /// countdown exists.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn set_pending_duration(&mut self, remaining: Duration) {
        if matches!(self.timer, TimerState::Unset | TimerState::PendingDuration(_)) {
            self.timer = TimerState::PendingDuration(remaining);
        } else {
            debug!("Countdown already constructed, keeping it");
        }
    }

    /// Text shown for this session in lists: the active timeline state, or
    /// the configured formula before any state arrived.
    pub fn summary(&self) -> Option<&str> {
        match &self.current_state {
            Some(state) => state.timeline.current_element().map(|e| e.text.as_str()),
            None => self.config.formula_latex.as_deref(),
        }
    }
}
