//! Two-slot interval selection over timeline indices.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Effect of a click on a timeline entry while selecting a theorem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionChange {
    /// The index now occupies a slot.
    Selected(usize),
    /// The index left its slot.
    Deselected(usize),
    /// Both slots were taken; nothing changed.
    Ignored(usize),
}

/// A complete, ordered selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TheoremRange {
    /// First timeline index.
    pub start: usize,
    /// Last timeline index, `>= start`.
    pub end: usize,
}

/// Toggle-based `(start, end)` selector.
///
/// Slots fill in click order, not numeric order; [`TheoremSelection::normalize`]
/// orders them when the selection is validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TheoremSelection {
    start: Option<usize>,
    end: Option<usize>,
}

impl TheoremSelection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// First slot.
    pub fn start(&self) -> Option<usize> {
        self.start
    }

    /// Second slot.
    pub fn end(&self) -> Option<usize> {
        self.end
    }

    /// True when neither slot is filled.
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Applies a click on `index`.
    #[instrument(level = "debug")]
    pub fn toggle(&mut self, index: usize) -> SelectionChange {
        let change = if self.start == Some(index) {
            self.start = None;
            SelectionChange::Deselected(index)
        } else if self.end == Some(index) {
            self.end = None;
            SelectionChange::Deselected(index)
        } else if self.start.is_none() {
            self.start = Some(index);
            SelectionChange::Selected(index)
        } else if self.end.is_none() {
            self.end = Some(index);
            SelectionChange::Selected(index)
        } else {
            SelectionChange::Ignored(index)
        };
        debug!(?change, start = ?self.start, end = ?self.end, "Theorem selection updated");
        change
    }

    /// Swaps the slots when both are set and `start > end`.
    pub fn normalize(&mut self) {
        if let (Some(start), Some(end)) = (self.start, self.end)
            && start > end
        {
            self.start = Some(end);
            self.end = Some(start);
        }
    }

    /// The ordered range, or `None` while a slot is empty.
    pub fn range(&self) -> Option<TheoremRange> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(TheoremRange {
                start: start.min(end),
                end: start.max(end),
            }),
            _ => None,
        }
    }

    /// Empties both slots.
    pub fn clear(&mut self) {
        self.start = None;
        self.end = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_start_then_end() {
        let mut selection = TheoremSelection::new();
        assert_eq!(selection.toggle(4), SelectionChange::Selected(4));
        assert_eq!(selection.toggle(1), SelectionChange::Selected(1));
        assert_eq!(selection.start(), Some(4));
        assert_eq!(selection.end(), Some(1));
    }

    #[test]
    fn test_third_click_ignored_when_full() {
        let mut selection = TheoremSelection::new();
        selection.toggle(0);
        selection.toggle(2);
        assert_eq!(selection.toggle(3), SelectionChange::Ignored(3));
        assert_eq!((selection.start(), selection.end()), (Some(0), Some(2)));
    }

    #[test]
    fn test_freed_start_slot_refilled_first() {
        let mut selection = TheoremSelection::new();
        selection.toggle(0);
        selection.toggle(2);
        assert_eq!(selection.toggle(0), SelectionChange::Deselected(0));
        selection.toggle(5);
        assert_eq!((selection.start(), selection.end()), (Some(5), Some(2)));
    }

    #[test]
    fn test_normalize_leaves_partial_selection() {
        let mut selection = TheoremSelection::new();
        selection.toggle(7);
        selection.normalize();
        assert_eq!((selection.start(), selection.end()), (Some(7), None));
        assert!(selection.range().is_none());
    }
}
