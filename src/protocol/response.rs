//! Response envelope, payload and validation.
//!
//! Every server reply goes through [`check_error`] before any field is read.
//! A failed check has already been reported to the user through the
//! [`NotificationSink`] when the caller sees the `Err`.

use std::collections::BTreeMap;

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::presenter::NotificationSink;
use crate::session::{FormulaState, GameId, GameStatus, Timeline};

/// Raw reply of one round trip: HTTP status plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    status: u16,
    body: String,
}

impl RawResponse {
    /// Creates a raw response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Shorthand for a `200` reply carrying a JSON body.
    pub fn ok(body: serde_json::Value) -> Self {
        Self::new(200, body.to_string())
    }

    /// Returns the HTTP status.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the body text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// True when the request reached the server and got a 2xx answer.
    pub fn is_dispatched(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to complete a round trip at all.
#[derive(Debug, Clone, Display, Error)]
#[display("Transport error: {} at {}:{}", message, file, line)]
pub struct TransportError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl TransportError {
    /// Creates a new transport error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        Self::new(format!("HTTP client error: {}", err))
    }
}

/// Why a response was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ValidationError {
    /// The request never completed.
    #[display("Request could not be sent: {}", message)]
    Transport {
        /// Transport failure description.
        message: String,
    },

    /// The server answered with a non-2xx status.
    #[display("Server answered with HTTP status {}", status)]
    HttpStatus {
        /// HTTP status code.
        status: u16,
    },

    /// The envelope carried a FAILURE status.
    #[display("Server refused the request: {}", message)]
    Refused {
        /// Server-provided explanation.
        message: String,
    },

    /// The body was not the expected JSON shape.
    #[display("Malformed response: {}", message)]
    Malformed {
        /// Parser message.
        message: String,
    },

    /// A field the caller needs is absent.
    #[display("Response is missing field `{}`", field)]
    MissingField {
        /// Wire name of the field.
        field: &'static str,
    },
}

/// Rules legal in a game, grouped by item then by rule type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RulesCatalog(BTreeMap<String, BTreeMap<String, Vec<String>>>);

impl RulesCatalog {
    /// Builds a catalog from its nested map.
    pub fn new(groups: BTreeMap<String, BTreeMap<String, Vec<String>>>) -> Self {
        Self(groups)
    }

    /// Yields `(item, type, rules)` in key order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &str, &[String])> {
        self.0.iter().flat_map(|(item, types)| {
            types
                .iter()
                .map(move |(kind, rules)| (item.as_str(), kind.as_str(), rules.as_slice()))
        })
    }

    /// Total number of rules across all groups.
    pub fn len(&self) -> usize {
        self.0.values().flat_map(|types| types.values()).map(Vec::len).sum()
    }

    /// True when the catalog holds no rule.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Payload fields this client consumes. All optional on the wire; callers
/// require what they need through the `require_*` helpers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameUpdatePayload {
    /// Server id of a freshly started game.
    #[serde(default)]
    pub id: Option<GameId>,
    /// Formula text.
    #[serde(default)]
    pub math: Option<String>,
    /// Formula history.
    #[serde(default)]
    pub timeline: Option<Timeline>,
    /// Game outcome so far.
    #[serde(default)]
    pub game_status: Option<GameStatus>,
    /// Rules listing.
    #[serde(default)]
    pub rules: Option<RulesCatalog>,
}

impl GameUpdatePayload {
    /// Extracts the id of a started game.
    pub fn require_id(self) -> Result<GameId, ValidationError> {
        self.id.ok_or(ValidationError::MissingField { field: "id" })
    }

    /// Extracts the rules listing.
    pub fn require_rules(self) -> Result<RulesCatalog, ValidationError> {
        self.rules.ok_or(ValidationError::MissingField { field: "rules" })
    }

    /// Extracts a full formula state. A missing `gameStatus` reads as playing.
    pub fn into_formula_state(self) -> Result<FormulaState, ValidationError> {
        let math = self.math.ok_or(ValidationError::MissingField { field: "math" })?;
        let timeline = self
            .timeline
            .ok_or(ValidationError::MissingField { field: "timeline" })?;
        Ok(FormulaState {
            math,
            timeline,
            game_status: self.game_status.unwrap_or(GameStatus::Playing),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    complementary_info: Option<String>,
    #[serde(flatten)]
    payload: GameUpdatePayload,
}

/// Validates a round-trip result and extracts its payload.
///
/// On any failure the user is notified through `notifier` and no payload
/// field is returned.
#[instrument(skip_all)]
pub fn check_error(
    result: Result<RawResponse, TransportError>,
    notifier: &dyn NotificationSink,
) -> Result<GameUpdatePayload, ValidationError> {
    match parse_envelope(result) {
        Ok(payload) => Ok(payload),
        Err(err) => {
            warn!(error = %err, "Response rejected");
            notifier.error(&err.to_string());
            Err(err)
        }
    }
}

/// Like [`check_error`] but also requires the payload to carry a complete
/// formula state.
#[instrument(skip_all)]
pub fn check_formula_state(
    result: Result<RawResponse, TransportError>,
    notifier: &dyn NotificationSink,
) -> Result<FormulaState, ValidationError> {
    check_error(result, notifier)?
        .into_formula_state()
        .inspect_err(|err| {
            warn!(error = %err, "Incomplete formula state");
            notifier.error(&err.to_string());
        })
}

fn parse_envelope(
    result: Result<RawResponse, TransportError>,
) -> Result<GameUpdatePayload, ValidationError> {
    let response = result.map_err(|e| ValidationError::Transport { message: e.message })?;

    if !response.is_dispatched() {
        return Err(ValidationError::HttpStatus {
            status: response.status(),
        });
    }

    let envelope: Envelope =
        serde_json::from_str(response.body()).map_err(|e| ValidationError::Malformed {
            message: e.to_string(),
        })?;

    if envelope
        .status
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("FAILURE"))
    {
        return Err(ValidationError::Refused {
            message: envelope
                .complementary_info
                .unwrap_or_else(|| "no details given".to_string()),
        });
    }

    debug!(info = ?envelope.complementary_info, "Response accepted");
    Ok(envelope.payload)
}
