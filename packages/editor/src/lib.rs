//! # Promptloom Editor
//!
//! Editing engine over the Promptloom segment document model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ document: segments + normalize + compile    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: session lifecycle + operations      │
//! │  - Structural operations with benign no-ops │
//! │  - Snapshot history (undo/redo)             │
//! │  - Caret/selection mapping over an abstract │
//! │    rendering surface                        │
//! │  - Clipboard fragment codec                 │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core principles
//!
//! 1. **Normalize everything**: every structural mutation routes
//!    through the document model's normalization before it becomes
//!    observable state.
//! 2. **History holds values**: whole-document snapshots, deduped by
//!    structural equality; undo restores them verbatim.
//! 3. **Failures are no-ops**: an edit racing a deleted segment
//!    applies to nothing instead of erroring.
//! 4. **Single writer**: one synchronous mutation path; the only
//!    asynchrony (clipboard I/O, the reroll timer) lives behind
//!    external boundaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use promptloom_editor::{EditSession, EditorConfig, Operation};
//!
//! let mut session = EditSession::new(&initial, "workspace", EditorConfig::default());
//!
//! session.apply(Operation::SplitText { id, offset: 5 });
//! session.undo();
//!
//! let prompt = session.compile();
//! ```

mod caret;
mod clipboard;
mod config;
mod errors;
mod history;
mod operations;
mod presets;
mod session;

pub use caret::{Caret, CaretMapper, Point, Rect, SegmentView, SelectionEvent, SelectionState, SpanBox};
pub use clipboard::{decode_fragment, encode_fragment, Clipboard, MemoryClipboard, FRAGMENT_TYPE};
pub use config::EditorConfig;
pub use errors::{ClipboardError, EditorError};
pub use history::History;
pub use operations::{Applied, Direction, Operation};
pub use presets::{OptionPreset, SectionPreset};
pub use session::{EditSession, PendingReroll};

// Re-export the document model for convenience.
pub use promptloom_document::{compile, normalize, Document, IdGenerator, Segment, SectionGroup};
