//! # Promptloom Document Model
//!
//! The segment document model for the Promptloom prompt composer.
//!
//! A document is an ordered run of [`Segment`]s: free-form text
//! interleaved with inline blocks — variant pickers and section
//! labels. The model keeps a user-editable text surface synchronized
//! with this discrete, typed structure:
//!
//! ```text
//! edit operation → raw segment run → normalize() → Document
//!                                                     ↓
//!                                      compile() → prompt string
//! ```
//!
//! ## Core principles
//!
//! 1. **Normalization is the choke point**: every structural mutation
//!    routes its result through [`normalize`], so the invariants it
//!    documents hold whenever a [`Document`] is observable.
//! 2. **Documents are values**: cloned snapshots share no mutable
//!    sub-structure, and `Eq` is structural, which is what the undo
//!    history relies on.
//! 3. **Ids are minted, never reused**: one [`IdGenerator`] per
//!    session, injected into every operation that creates segments.

mod compile;
mod id_generator;
mod normalize;
mod segment;

pub use compile::compile;
pub use id_generator::{get_session_seed, IdGenerator};
pub use normalize::normalize;
pub use segment::{flatten_groups, group_segments, Document, SectionGroup, Segment};
