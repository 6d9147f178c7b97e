//! Formula history with a current-position pointer.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// One formula state in the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineElement {
    /// Formula text of this state.
    pub text: String,
}

impl TimelineElement {
    /// Creates an element.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Timeline whose pointer does not index into its elements.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Timeline pointer {} is out of bounds for {} elements", current, len)]
pub struct TimelineError {
    /// Offending pointer.
    pub current: usize,
    /// Number of elements.
    pub len: usize,
}

/// Ordered history of formula states, owned by the server.
///
/// The client never edits it: every update replaces it wholesale. `current`
/// always indexes into `elements` when there is at least one element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeline")]
pub struct Timeline {
    elements: Vec<TimelineElement>,
    current: usize,
}

#[derive(Deserialize)]
struct RawTimeline {
    elements: Vec<TimelineElement>,
    #[serde(default)]
    current: usize,
}

impl TryFrom<RawTimeline> for Timeline {
    type Error = TimelineError;

    fn try_from(raw: RawTimeline) -> Result<Self, Self::Error> {
        Self::new(raw.elements, raw.current)
    }
}

impl Timeline {
    /// Creates a timeline, checking the pointer.
    pub fn new(elements: Vec<TimelineElement>, current: usize) -> Result<Self, TimelineError> {
        if !elements.is_empty() && current >= elements.len() {
            return Err(TimelineError {
                current,
                len: elements.len(),
            });
        }
        Ok(Self { elements, current })
    }

    /// All states, oldest first.
    pub fn elements(&self) -> &[TimelineElement] {
        &self.elements
    }

    /// Index of the active state.
    pub fn current(&self) -> usize {
        self.current
    }

    /// The active state, if any.
    pub fn current_element(&self) -> Option<&TimelineElement> {
        self.elements.get(self.current)
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True when there is no state yet.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// True when `index` addresses a state.
    pub fn contains(&self, index: usize) -> bool {
        index < self.elements.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_out_of_bounds_rejected() {
        let elements = vec![TimelineElement::new("a"), TimelineElement::new("b")];
        assert!(Timeline::new(elements.clone(), 1).is_ok());
        assert_eq!(
            Timeline::new(elements, 2),
            Err(TimelineError { current: 2, len: 2 })
        );
    }

    #[test]
    fn test_empty_timeline_accepted() {
        let timeline: Timeline =
            serde_json::from_str(r#"{"elements": [], "current": 0}"#).expect("valid timeline");
        assert!(timeline.is_empty());
        assert!(timeline.current_element().is_none());
    }

    #[test]
    fn test_deserialize_validates_pointer() {
        let err = serde_json::from_str::<Timeline>(r#"{"elements": [{"text": "x"}], "current": 3}"#);
        assert!(err.is_err());

        let timeline: Timeline =
            serde_json::from_str(r#"{"elements": [{"text": "x"}, {"text": "y"}], "current": 1}"#)
                .expect("valid timeline");
        assert_eq!(timeline.current_element().map(|e| e.text.as_str()), Some("y"));
    }
}
