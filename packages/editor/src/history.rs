//! # Snapshot History
//!
//! Undo stack over whole-document snapshots.
//!
//! ## Design
//!
//! - A stack of [`Document`] values with a pointer at the current one.
//! - Committing truncates any "future" entries beyond the pointer,
//!   skips structurally-equal states, then pushes and advances.
//! - Undo moves the pointer back and returns the stored snapshot
//!   verbatim — never re-normalized, so it restores the exact prior
//!   state including uncommitted live-edit content.
//! - Redo is the mirror pointer move; nothing extra is stored for it.
//! - Snapshots are independent clones: an undo can never observe a
//!   half-written state, and later mutations cannot reach back into
//!   the stack.

use promptloom_document::Document;

/// Snapshot stack with pointer.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Document>,
    index: usize,
    /// Maximum number of snapshots kept (0 = unlimited).
    max_levels: usize,
}

impl History {
    /// Start history with the initial loaded document as its only
    /// entry.
    pub fn new(initial: Document) -> Self {
        Self::with_max_levels(initial, 100)
    }

    pub fn with_max_levels(initial: Document, max_levels: usize) -> Self {
        Self {
            snapshots: vec![initial],
            index: 0,
            max_levels,
        }
    }

    /// Push a new state. Entries beyond the pointer are discarded, and
    /// a state structurally equal to the current one is skipped so
    /// no-op edits do not grow the stack.
    pub fn commit(&mut self, document: Document) {
        self.snapshots.truncate(self.index + 1);

        if self.snapshots.last() == Some(&document) {
            return;
        }

        self.snapshots.push(document);
        self.index += 1;

        if self.max_levels > 0 && self.snapshots.len() > self.max_levels {
            self.snapshots.remove(0);
            self.index -= 1;
        }
    }

    /// Step back, returning the restored snapshot verbatim.
    pub fn undo(&mut self) -> Option<&Document> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.snapshots.get(self.index)
    }

    /// Step forward over previously undone states.
    pub fn redo(&mut self) -> Option<&Document> {
        if self.index + 1 >= self.snapshots.len() {
            return None;
        }
        self.index += 1;
        self.snapshots.get(self.index)
    }

    /// The snapshot the pointer currently rests on.
    pub fn current(&self) -> &Document {
        &self.snapshots[self.index]
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptloom_document::Segment;
    use pretty_assertions::assert_eq;

    fn doc(content: &str) -> Document {
        Document::new(vec![Segment::text("t1", content)])
    }

    #[test]
    fn starts_with_initial_entry() {
        let history = History::new(doc("a"));
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_returns_exact_prior_snapshot() {
        let mut history = History::new(doc("a"));
        history.commit(doc("b"));

        let restored = history.undo().unwrap();
        assert_eq!(restored, &doc("a"));
        assert!(!history.can_undo());
        assert!(history.can_redo());
    }

    #[test]
    fn identical_state_is_not_pushed() {
        let mut history = History::new(doc("a"));
        history.commit(doc("a"));
        assert_eq!(history.len(), 1);

        history.commit(doc("b"));
        history.commit(doc("b"));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn commit_after_undo_discards_future() {
        let mut history = History::new(doc("a"));
        history.commit(doc("b"));
        history.commit(doc("c"));

        history.undo();
        history.undo();
        assert_eq!(history.current(), &doc("a"));

        history.commit(doc("d"));
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.current(), &doc("d"));
    }

    #[test]
    fn redo_replays_undone_state() {
        let mut history = History::new(doc("a"));
        history.commit(doc("b"));

        history.undo();
        let replayed = history.redo().unwrap();
        assert_eq!(replayed, &doc("b"));
        assert!(!history.can_redo());
    }

    #[test]
    fn max_levels_drops_oldest() {
        let mut history = History::with_max_levels(doc("0"), 3);
        history.commit(doc("1"));
        history.commit(doc("2"));
        history.commit(doc("3"));

        assert_eq!(history.len(), 3);
        // "0" was dropped; undo bottoms out at "1".
        history.undo();
        history.undo();
        assert_eq!(history.current(), &doc("1"));
        assert!(!history.can_undo());
    }

    #[test]
    fn snapshots_are_independent_clones() {
        let original = doc("a");
        let mut history = History::new(original.clone());

        let mut mutated = original;
        if let Segment::Text { content, .. } = &mut mutated.segments[0] {
            content.push_str("-changed");
        }
        history.commit(mutated);

        let restored = history.undo().unwrap();
        assert_eq!(restored.segments[0].as_text(), Some("a"));
    }
}
