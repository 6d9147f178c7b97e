//! Request kinds and path construction.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};
use tracing::instrument;

use super::TransportError;
use crate::session::GameId;

/// One server endpoint per request kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RequestKind {
    /// Check that a known game still exists server-side.
    Resume,
    /// Fetch the formula state of a game.
    GameState,
    /// Create a new game.
    Start,
    /// Apply a rewrite rule to a sub-expression.
    ApplyRule,
    /// Mark a game as finished.
    Over,
    /// Step back in the timeline.
    Previous,
    /// Step forward in the timeline.
    Next,
    /// Jump to an arbitrary timeline index.
    Timeline,
    /// Turn a timeline interval into a theorem.
    CreateTheorem,
    /// List the rules legal for a game.
    RulesList,
    /// Drop a game server-side.
    Delete,
}

impl RequestKind {
    /// Endpoint segment the kind is served under.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::GameState => "gamestate",
            Self::Start => "start",
            Self::ApplyRule => "applyrule",
            Self::Over => "over",
            Self::Previous => "previous",
            Self::Next => "next",
            Self::Timeline => "timeline",
            Self::CreateTheorem => "createtheorem",
            Self::RulesList => "ruleslist",
            Self::Delete => "delete",
        }
    }
}

/// A tagged request: the endpoint kind plus the path segments it carries.
///
/// Segments are kept raw and percent-encoded when joined onto a base URL,
/// so a `/`, `?` or `#` inside a rule id or context stays one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    kind: RequestKind,
    segments: Vec<String>,
}

impl Request {
    /// Creates a request with an empty path.
    pub fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            segments: Vec::new(),
        }
    }

    /// Creates a request addressed to a game, i.e. with path `/{game_id}`.
    #[instrument(level = "trace")]
    pub fn for_game(kind: RequestKind, game_id: &GameId) -> Self {
        Self::new(kind).segment(game_id)
    }

    /// Appends one path segment.
    pub fn segment(mut self, value: impl std::fmt::Display) -> Self {
        self.segments.push(value.to_string());
        self
    }

    /// Returns the request kind.
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Raw path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the unencoded path, `/a/b/c`, empty without segments.
    pub fn path(&self) -> String {
        self.segments.iter().map(|s| format!("/{}", s)).collect()
    }

    /// Joins the request onto a server base URL, percent-encoding each
    /// segment.
    pub fn url(&self, base_url: &str) -> Result<Url, TransportError> {
        let mut url = Url::parse(base_url)
            .map_err(|e| TransportError::new(format!("Invalid server URL {}: {}", base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| TransportError::new(format!("Server URL {} cannot take a path", base_url)))?
            .pop_if_empty()
            .push(self.kind.endpoint())
            .extend(&self.segments);
        Ok(url)
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_segments_build_path() {
        let request = Request::new(RequestKind::ApplyRule)
            .segment(42)
            .segment("e3")
            .segment("commut")
            .segment(0);
        assert_eq!(request.path(), "/42/e3/commut/0");
        assert_eq!(
            request.url("http://host/api/").expect("url").as_str(),
            "http://host/api/applyrule/42/e3/commut/0"
        );
        assert_eq!(
            request.url("http://host/api").expect("url").as_str(),
            "http://host/api/applyrule/42/e3/commut/0"
        );
    }

    #[test]
    fn test_reserved_characters_stay_in_their_segment() {
        let request = Request::new(RequestKind::ApplyRule)
            .segment(7)
            .segment("e/1")
            .segment("r?x")
            .segment("ctx#2 a");

        let url = request.url("http://host/api").expect("url");

        assert_eq!(
            url.as_str(),
            "http://host/api/applyrule/7/e%2F1/r%3Fx/ctx%232%20a"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path_segments().expect("segments").count(), 6);
    }

    #[test]
    fn test_unusable_base_url_is_an_error() {
        let request = Request::for_game(RequestKind::Over, &GameId::new("1"));
        assert!(request.url("not a url").is_err());
        assert!(request.url("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_endpoints_are_distinct() {
        let mut endpoints: Vec<_> = RequestKind::iter().map(RequestKind::endpoint).collect();
        endpoints.sort_unstable();
        endpoints.dedup();
        assert_eq!(endpoints.len(), RequestKind::iter().count());
    }
}
