//! # Caret & Selection Mapping
//!
//! Translates between the pointer-driven visual surface and abstract
//! `(segment id, character offset)` coordinates.
//!
//! The mapper owns the selection state exclusively: it changes only in
//! response to explicit events, and stale or unresolvable events are
//! ignored rather than clearing it — so "insert at the last known
//! caret" keeps working after focus moves to toolbar chrome.
//!
//! The rendering layer is abstract: the core needs only the
//! [`SegmentView`] capability (rendered span boxes, point-to-caret
//! resolution, caret placement), not any particular visual tree.

use promptloom_document::Document;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Vertical slack, in view units, for clicks that just miss a line.
const CLICK_TOLERANCE: f32 = 6.0;

/// A caret position: segment id plus character offset within it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caret {
    pub segment_id: String,
    pub offset: usize,
}

impl Caret {
    pub fn new(segment_id: impl Into<String>, offset: usize) -> Self {
        Self {
            segment_id: segment_id.into(),
            offset,
        }
    }
}

/// Last known selection. `segment_id` of `None` means no anchor yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub segment_id: Option<String>,
    pub start_offset: usize,
    pub end_offset: usize,
    /// Textual content of the active range selection (empty when the
    /// selection is collapsed).
    pub text: String,
}

impl SelectionState {
    pub fn caret(&self) -> Option<Caret> {
        self.segment_id
            .as_ref()
            .map(|id| Caret::new(id.clone(), self.start_offset))
    }

    pub fn is_range(&self) -> bool {
        self.segment_id.is_some() && !self.text.is_empty()
    }
}

/// Raw selection-changed event from the rendering layer. An event
/// whose anchor did not resolve to a rendered segment carries `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEvent {
    pub anchor_segment_id: Option<String>,
    pub start_offset: usize,
    pub end_offset: usize,
    pub text: String,
}

/// Point in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned box in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    fn contains_y(&self, y: f32, tolerance: f32) -> bool {
        y >= self.top - tolerance && y <= self.bottom + tolerance
    }
}

/// One rendered line box of a segment. A wrapped segment contributes
/// several.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanBox {
    pub segment_id: String,
    pub rect: Rect,
}

/// Capability the rendering layer provides. The core never touches a
/// visual tree directly.
pub trait SegmentView {
    /// Line boxes for every rendered segment, in document order.
    fn span_boxes(&self) -> Vec<SpanBox>;

    /// Rendered text of a segment, if it is currently present.
    fn segment_text(&self, segment_id: &str) -> Option<String>;

    /// Backend-native caret resolution for a point landing on text.
    fn caret_from_point(&self, point: Point) -> Option<Caret>;

    /// Place the visual caret.
    fn place_caret(&mut self, caret: &Caret);
}

#[derive(Debug, Clone)]
struct PendingCaret {
    caret: Caret,
    attempts: u8,
}

/// Owns selection state and pending caret placement.
#[derive(Debug, Default)]
pub struct CaretMapper {
    selection: SelectionState,
    pending: Option<PendingCaret>,
}

impl CaretMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Feed a raw selection event. Updates state only when the anchor
    /// resolves to a known segment; everything else is ignored so the
    /// previous anchor survives focus excursions into non-document UI.
    pub fn observe(&mut self, event: SelectionEvent, document: &Document) {
        let Some(anchor) = event.anchor_segment_id else {
            return;
        };
        if document.find(&anchor).is_none() {
            trace!(segment = %anchor, "selection anchor unknown, ignoring");
            return;
        }

        self.selection = SelectionState {
            segment_id: Some(anchor),
            start_offset: event.start_offset,
            end_offset: event.end_offset,
            text: event.text,
        };
    }

    /// Forget the anchor (after undo, or a workspace clear).
    pub fn clear_selection(&mut self) {
        self.selection = SelectionState::default();
    }

    /// Ask for the caret to be placed once the segment next renders.
    /// A newer request supersedes an unflushed one.
    pub fn request_caret(&mut self, caret: Caret) {
        self.pending = Some(PendingCaret { caret, attempts: 0 });
    }

    pub fn has_pending_request(&self) -> bool {
        self.pending.is_some()
    }

    /// Run after a render pass. Places the pending caret, clamped to
    /// the segment's rendered content; a request whose segment has not
    /// rendered yet is retried on the next pass, then dropped.
    pub fn flush(&mut self, view: &mut dyn SegmentView) -> Option<Caret> {
        let mut pending = self.pending.take()?;

        match view.segment_text(&pending.caret.segment_id) {
            Some(text) => {
                let clamped = Caret::new(
                    pending.caret.segment_id.clone(),
                    pending.caret.offset.min(text.chars().count()),
                );
                view.place_caret(&clamped);
                Some(clamped)
            }
            None if pending.attempts == 0 => {
                pending.attempts = 1;
                self.pending = Some(pending);
                None
            }
            None => {
                trace!(
                    segment = %pending.caret.segment_id,
                    "caret request expired, segment never rendered"
                );
                None
            }
        }
    }

    /// Resolve a click in the editing surface that did not land
    /// exactly on rendered text.
    ///
    /// Candidates are span boxes whose vertical extent contains the
    /// click — exact first, then with a small tolerance to catch
    /// boundary misses. The rightmost candidate on that line wins:
    /// clicks to the right of all text place the caret at
    /// end-of-content, stepping back over a trailing line break so the
    /// caret stays on the clicked line. Clicks inside text defer to
    /// the view's native resolution, with the same trailing-newline
    /// adjustment.
    pub fn resolve_click(&self, point: Point, view: &dyn SegmentView) -> Option<Caret> {
        let boxes = view.span_boxes();

        let candidates_at = |tolerance: f32| -> Vec<&SpanBox> {
            boxes
                .iter()
                .filter(|b| b.rect.contains_y(point.y, tolerance))
                .collect()
        };

        let mut candidates = candidates_at(0.0);
        if candidates.is_empty() {
            candidates = candidates_at(CLICK_TOLERANCE);
        }
        let rightmost = candidates
            .into_iter()
            .max_by(|a, b| a.rect.right.total_cmp(&b.rect.right))?;

        if point.x > rightmost.rect.right {
            let text = view.segment_text(&rightmost.segment_id)?;
            return Some(Caret::new(
                rightmost.segment_id.clone(),
                end_of_line_offset(&text),
            ));
        }

        let native = view.caret_from_point(point)?;
        let text = view.segment_text(&native.segment_id)?;
        let len = text.chars().count();
        let mut offset = native.offset.min(len);
        if offset == len && text.ends_with('\n') && offset > 0 {
            offset -= 1;
        }
        Some(Caret::new(native.segment_id, offset))
    }
}

/// End of content, minus one offset when the content ends in a line
/// break, so the caret does not wrap onto the following line.
fn end_of_line_offset(text: &str) -> usize {
    let len = text.chars().count();
    if text.ends_with('\n') && len > 0 {
        len - 1
    } else {
        len
    }
}
