//! # Edit Session
//!
//! One user's editing state: the current document, its history, the
//! caret mapper, and the id generator every operation draws from.
//!
//! All structural edits funnel through [`EditSession::apply`]:
//!
//! ```text
//! Operation → raw segments → normalize → history.commit → document
//!                                ↓
//!                       caret request (first candidate that
//!                       survived normalization)
//! ```
//!
//! Live text edits are the deliberate exception: they mutate one text
//! segment in place, without normalizing or snapshotting per
//! keystroke, and are folded into history by the next structural
//! operation or an explicit [`EditSession::commit_live`] (blur).

use promptloom_document::{compile, normalize, Document, IdGenerator, Segment};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::caret::{Caret, CaretMapper, SelectionEvent, SelectionState};
use crate::clipboard::{encode_fragment, Clipboard};
use crate::config::EditorConfig;
use crate::errors::EditorError;
use crate::history::History;
use crate::operations::Operation;
use crate::presets::{OptionPreset, SectionPreset};

/// A computed reroll waiting for its animation timer. A newer prepare
/// supersedes an older pending one — last write wins, no queue.
#[derive(Debug, Clone)]
pub struct PendingReroll {
    document: Document,
    generation: u64,
}

pub struct EditSession {
    document: Document,
    history: History,
    mapper: CaretMapper,
    ids: IdGenerator,
    config: EditorConfig,
    reroll_generation: u64,
}

impl EditSession {
    /// Seed a session. The initial segments come from the persistence
    /// boundary and may violate the invariants; they are normalized
    /// before anything observes them, and history starts with that
    /// state as its only entry.
    pub fn new(initial: &[Segment], session_name: &str, config: EditorConfig) -> Self {
        let mut ids = IdGenerator::new(session_name);
        let document = normalize(initial, &mut ids);
        let history = History::with_max_levels(document.clone(), config.max_undo_levels);

        Self {
            document,
            history,
            mapper: CaretMapper::new(),
            ids,
            config,
            reroll_generation: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> &SelectionState {
        self.mapper.selection()
    }

    pub fn mapper(&self) -> &CaretMapper {
        &self.mapper
    }

    pub fn mapper_mut(&mut self) -> &mut CaretMapper {
        &mut self.mapper
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Current prompt output. Pure derivation; recompute after any
    /// change to the document or an active value.
    pub fn compile(&self) -> String {
        compile(&self.document)
    }

    /// Feed a raw selection event through to the mapper.
    pub fn observe_selection(&mut self, event: SelectionEvent) {
        self.mapper.observe(event, &self.document);
    }

    /// Apply a structural operation. Returns false when it was a
    /// no-op (missing target, invalid selection) — the document and
    /// history are untouched in that case.
    pub fn apply(&mut self, op: Operation) -> bool {
        let Some(applied) = op.apply(&self.document, &mut self.ids) else {
            debug!(?op, "operation did not apply");
            return false;
        };

        let normalized = normalize(&applied.segments, &mut self.ids);

        // First caret candidate whose segment survived normalization.
        for candidate in applied.caret_candidates {
            if normalized.find(&candidate.segment_id).is_some() {
                self.mapper.request_caret(candidate);
                break;
            }
        }

        self.history.commit(normalized.clone());
        self.document = normalized;
        true
    }

    // --- live edits ---

    /// Rewrite one text segment's content in place while the user is
    /// composing. No normalization, no snapshot — that is deferred to
    /// the next structural operation or to `commit_live`.
    pub fn edit_text_live(&mut self, id: &str, content: &str) -> bool {
        match self.document.find_mut(id) {
            Some(Segment::Text { content: current, .. }) => {
                *current = content.to_string();
                true
            }
            _ => false,
        }
    }

    /// Commit signal (focus left the segment): snapshot the live state
    /// if it drifted from the history top.
    pub fn commit_live(&mut self) -> bool {
        if &self.document != self.history.current() {
            self.history.commit(self.document.clone());
            return true;
        }
        false
    }

    // --- history ---

    /// Restore the previous snapshot verbatim — never re-normalized,
    /// so uncommitted live-edit content captured at blur comes back
    /// exactly. The selection anchor is dropped since its segment may
    /// no longer exist.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.document = snapshot.clone();
                self.mapper.clear_selection();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.document = snapshot.clone();
                self.mapper.clear_selection();
                true
            }
            None => false,
        }
    }

    // --- convenience operations anchored at the current caret ---

    fn caret_anchor(&self) -> Option<Caret> {
        self.mapper.selection().caret()
    }

    pub fn split_text(&mut self, id: &str, offset: usize) -> bool {
        self.apply(Operation::SplitText {
            id: id.to_string(),
            offset,
        })
    }

    pub fn delete_backward(&mut self, id: &str) -> bool {
        self.apply(Operation::DeleteBackward { id: id.to_string() })
    }

    /// Insert an (initially unnamed) label at the caret, with a color
    /// drawn from the configured palette.
    pub fn insert_label(&mut self, rng: &mut impl Rng) -> bool {
        let color = self
            .config
            .label_colors
            .choose(rng)
            .cloned()
            .unwrap_or_default();
        self.apply(Operation::InsertLabel {
            name: String::new(),
            color,
            icon: self.config.default_label_icon.clone(),
            caret: self.caret_anchor(),
        })
    }

    /// Turn the active range selection into a variant block. No-op
    /// unless the selection is non-empty after trimming and sits
    /// inside one text segment.
    pub fn convert_selection_to_variant(&mut self) -> bool {
        let selection = self.mapper.selection().clone();
        let Some(id) = selection.segment_id else {
            return false;
        };
        if selection.text.trim().is_empty() {
            return false;
        }

        let applied = self.apply(Operation::ConvertToVariant {
            id,
            start: selection.start_offset,
            end: selection.end_offset,
            selected: selection.text,
        });
        if applied {
            self.mapper.clear_selection();
        }
        applied
    }

    pub fn insert_option_preset(&mut self, preset: &OptionPreset) -> bool {
        self.apply(Operation::InsertVariant {
            options: preset.options.clone(),
            caret: self.caret_anchor(),
        })
    }

    pub fn replace_option_preset(&mut self, variant_id: &str, preset: &OptionPreset) -> bool {
        self.apply(Operation::ReplaceVariantOptions {
            id: variant_id.to_string(),
            options: preset.options.clone(),
        })
    }

    pub fn insert_section_preset(&mut self, preset: &SectionPreset) -> bool {
        self.apply(Operation::InsertSection {
            data: preset.data.clone(),
            caret: self.caret_anchor(),
        })
    }

    /// Externally generated candidate options are appended like
    /// manually typed ones.
    pub fn append_generated_options(&mut self, variant_id: &str, options: Vec<String>) -> bool {
        self.apply(Operation::AppendOptions {
            id: variant_id.to_string(),
            options,
        })
    }

    /// Snapshot a labeled section for the preset library.
    pub fn section_preset_from(&self, label_id: &str) -> Option<SectionPreset> {
        let group = self
            .document
            .groups()
            .into_iter()
            .find(|g| g.label.as_ref().is_some_and(|l| l.id() == label_id))?;
        Some(SectionPreset {
            data: group.segments(),
        })
    }

    // --- reroll ---

    fn rerolled_segments(&self, rng: &mut impl Rng) -> Vec<Segment> {
        self.document
            .segments
            .iter()
            .map(|seg| match seg {
                Segment::Variant {
                    id,
                    options,
                    disabled_indices,
                    ..
                } if !options.is_empty() => {
                    let enabled: Vec<&String> = options
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| !disabled_indices.contains(i))
                        .map(|(_, option)| option)
                        .collect();
                    match enabled.choose(rng) {
                        Some(pick) => Segment::Variant {
                            id: id.clone(),
                            options: options.clone(),
                            active_value: (*pick).clone(),
                            disabled_indices: disabled_indices.clone(),
                        },
                        // Every option disabled: leave it be.
                        None => seg.clone(),
                    }
                }
                _ => seg.clone(),
            })
            .collect()
    }

    /// Compute the next roll now; the host applies it when its
    /// animation timer fires.
    pub fn prepare_reroll(&mut self, rng: &mut impl Rng) -> PendingReroll {
        self.reroll_generation += 1;
        let segments = self.rerolled_segments(rng);
        PendingReroll {
            document: normalize(&segments, &mut self.ids),
            generation: self.reroll_generation,
        }
    }

    /// Apply a prepared reroll. A pending roll that was superseded by
    /// a newer `prepare_reroll` is discarded (returns false).
    pub fn complete_reroll(&mut self, pending: PendingReroll) -> bool {
        if pending.generation != self.reroll_generation {
            debug!(
                generation = pending.generation,
                current = self.reroll_generation,
                "pending reroll superseded"
            );
            return false;
        }
        self.history.commit(pending.document.clone());
        self.document = pending.document;
        true
    }

    /// Immediate reroll, for hosts without an animation delay.
    pub fn reroll(&mut self, rng: &mut impl Rng) {
        let pending = self.prepare_reroll(rng);
        self.complete_reroll(pending);
    }

    // --- clipboard ---

    pub fn paste_text(&mut self, payload: &str) -> bool {
        self.apply(Operation::Paste {
            payload: payload.to_string(),
            caret: self.caret_anchor(),
        })
    }

    /// Paste from the platform clipboard. I/O failure is surfaced to
    /// the caller; the document is untouched by it.
    pub fn paste_from(&mut self, clipboard: &mut impl Clipboard) -> Result<bool, EditorError> {
        let text = clipboard.read_text()?;
        Ok(self.paste_text(&text))
    }

    pub fn copy_compiled(&self, clipboard: &mut impl Clipboard) -> Result<(), EditorError> {
        clipboard.write_text(&self.compile())?;
        Ok(())
    }

    /// Copy a labeled section as an internal fragment payload.
    pub fn copy_section(
        &self,
        label_id: &str,
        clipboard: &mut impl Clipboard,
    ) -> Result<(), EditorError> {
        let preset = self
            .section_preset_from(label_id)
            .ok_or_else(|| EditorError::SectionNotFound(label_id.to_string()))?;
        clipboard.write_text(&encode_fragment(&preset.data))?;
        Ok(())
    }

    // --- workspace ---

    /// Reset to an empty document, preserving undo back to the old
    /// content.
    pub fn clear(&mut self) {
        self.commit_live();
        let empty = normalize(&[], &mut self.ids);
        self.history.commit(empty.clone());
        self.document = empty;
        self.mapper.clear_selection();
    }

    /// Replace the working document (loading a saved project). The
    /// incoming segments come from outside and are normalized first.
    pub fn load_document(&mut self, segments: &[Segment]) {
        let loaded = normalize(segments, &mut self.ids);
        self.history.commit(loaded.clone());
        self.document = loaded;
        self.mapper.clear_selection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn session(segments: &[Segment]) -> EditSession {
        EditSession::new(segments, "test-session", EditorConfig::default())
    }

    fn select(session: &mut EditSession, id: &str, start: usize, end: usize, text: &str) {
        session.observe_selection(SelectionEvent {
            anchor_segment_id: Some(id.to_string()),
            start_offset: start,
            end_offset: end,
            text: text.to_string(),
        });
    }

    #[test]
    fn live_edits_skip_history_until_committed() {
        let mut s = session(&[Segment::text("t1", "draft")]);
        let before = s.document().clone();

        assert!(s.edit_text_live(before.segments[0].id(), "draft more"));
        assert!(!s.can_undo());
        assert_eq!(s.compile(), "draft more");

        assert!(s.commit_live());
        assert!(s.can_undo());
        assert!(!s.commit_live());
    }

    #[test]
    fn noop_operation_leaves_history_alone() {
        let mut s = session(&[Segment::text("t1", "abc")]);
        assert!(!s.split_text("ghost", 1));
        assert!(!s.can_undo());
    }

    #[test]
    fn reroll_respects_disabled_indices() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut s = session(&[
            Segment::text("t1", ""),
            Segment::Variant {
                id: "v1".into(),
                options: vec!["a".into(), "b".into(), "c".into()],
                active_value: "a".into(),
                disabled_indices: vec![0, 2],
            },
            Segment::text("t2", ""),
        ]);

        for _ in 0..20 {
            s.reroll(&mut rng);
            let Segment::Variant { active_value, .. } = s.document().find("v1").unwrap() else {
                panic!("expected variant");
            };
            assert_eq!(active_value, "b");
        }
    }

    #[test]
    fn fully_disabled_variant_is_untouched_by_reroll() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut s = session(&[
            Segment::text("t1", ""),
            Segment::Variant {
                id: "v1".into(),
                options: vec!["a".into(), "b".into()],
                active_value: "b".into(),
                disabled_indices: vec![0, 1],
            },
            Segment::text("t2", ""),
        ]);

        s.reroll(&mut rng);
        let Segment::Variant { active_value, .. } = s.document().find("v1").unwrap() else {
            panic!("expected variant");
        };
        assert_eq!(active_value, "b");
    }

    #[test]
    fn superseded_reroll_is_discarded() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = session(&[
            Segment::text("t1", ""),
            Segment::variant("v1", vec!["x".into(), "y".into()], "x"),
            Segment::text("t2", ""),
        ]);

        let first = s.prepare_reroll(&mut rng);
        let second = s.prepare_reroll(&mut rng);

        assert!(!s.complete_reroll(first));
        assert!(s.complete_reroll(second));
    }

    #[test]
    fn convert_selection_requires_single_text_segment() {
        let mut s = session(&[Segment::text("t1", "hello world")]);
        let id = s.document().segments[0].id().to_string();

        select(&mut s, &id, 6, 11, "world");
        assert!(s.convert_selection_to_variant());

        let doc = s.document();
        assert!(doc
            .segments
            .iter()
            .any(|seg| matches!(seg, Segment::Variant { active_value, .. } if active_value == "world")));
        // Selection is consumed by the conversion.
        assert!(s.selection().segment_id.is_none());
    }

    #[test]
    fn insert_label_uses_palette_color() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut s = session(&[Segment::text("t1", "abc")]);

        assert!(s.insert_label(&mut rng));
        let label = s
            .document()
            .segments
            .iter()
            .find(|seg| seg.is_label())
            .unwrap();
        let Segment::Label { color, .. } = label else {
            unreachable!()
        };
        assert!(EditorConfig::default().label_colors.contains(color));
    }

    #[test]
    fn clipboard_failure_leaves_document_untouched() {
        struct DeniedClipboard;
        impl Clipboard for DeniedClipboard {
            fn read_text(&mut self) -> Result<String, crate::errors::ClipboardError> {
                Err(crate::errors::ClipboardError::AccessDenied("nope".into()))
            }
            fn write_text(&mut self, _: &str) -> Result<(), crate::errors::ClipboardError> {
                Err(crate::errors::ClipboardError::AccessDenied("nope".into()))
            }
        }

        let mut s = session(&[Segment::text("t1", "stable")]);
        let before = s.document().clone();

        assert!(s.paste_from(&mut DeniedClipboard).is_err());
        assert!(s.copy_compiled(&mut DeniedClipboard).is_err());
        assert_eq!(s.document(), &before);
        assert!(!s.can_undo());
    }

    #[test]
    fn clear_resets_to_empty_document() {
        let mut s = session(&[Segment::text("t1", "content")]);
        s.clear();

        assert_eq!(s.document().segments.len(), 1);
        assert_eq!(s.document().segments[0].as_text(), Some(""));
        // The old content is one undo away.
        assert!(s.undo());
        assert_eq!(s.compile(), "content");
    }
}
