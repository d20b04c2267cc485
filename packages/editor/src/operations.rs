//! # Structural Edit Operations
//!
//! High-level semantic operations on prompt documents.
//!
//! ## Design
//!
//! 1. **Intent-preserving**: each operation represents one user-level
//!    edit (split a line, backspace through a block, paste).
//! 2. **Non-destructive**: operations never mutate the input document;
//!    they produce a raw successor sequence that the session routes
//!    through normalization and history.
//! 3. **Benign failure**: an operation whose target id no longer
//!    exists, or whose selection is invalid, applies to nothing —
//!    `apply` returns `None`, no snapshot is pushed, and the caller
//!    keeps the prior state.
//!
//! Offsets are character offsets (not bytes) and are clamped to the
//! segment's content length.

use promptloom_document::{group_segments, flatten_groups, Document, IdGenerator, Segment};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::caret::Caret;
use crate::clipboard::decode_fragment;

/// Successor state produced by an operation: the raw (pre-normalize)
/// segment run plus caret candidates, tried in order against the
/// normalized result (a candidate whose segment was merged away is
/// skipped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub segments: Vec<Segment>,
    pub caret_candidates: Vec<Caret>,
}

impl Applied {
    fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            caret_candidates: Vec::new(),
        }
    }

    fn with_caret(mut self, caret: Caret) -> Self {
        self.caret_candidates.push(caret);
        self
    }
}

/// Direction for section moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

/// Structural mutations. All of them consume and produce raw segment
/// runs; the session normalizes and snapshots the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Break a text segment at a caret offset (line-break keystroke).
    SplitText { id: String, offset: usize },

    /// Backspace at offset 0: merge with the previous text segment, or
    /// delete the previous block.
    DeleteBackward { id: String },

    /// Turn a range selection inside one text segment into a variant
    /// block whose sole option is the trimmed selection.
    ConvertToVariant {
        id: String,
        start: usize,
        end: usize,
        selected: String,
    },

    /// Insert a section label at the caret (forcing a line break
    /// before it), after the anchored block, or at the document end.
    InsertLabel {
        name: String,
        color: String,
        icon: String,
        caret: Option<Caret>,
    },

    /// Insert a variant from a reusable option set.
    InsertVariant {
        options: Vec<String>,
        caret: Option<Caret>,
    },

    /// Overwrite an existing variant's option list in place,
    /// preserving its id.
    ReplaceVariantOptions { id: String, options: Vec<String> },

    /// Full option-set edit with active-value fallback.
    UpdateVariant {
        id: String,
        options: Vec<String>,
        disabled_indices: Vec<usize>,
    },

    /// Append externally generated candidate options (trimmed,
    /// empties dropped) to a variant.
    AppendOptions { id: String, options: Vec<String> },

    /// Replace a variant with plain text holding its active value.
    FlattenVariant { id: String },

    /// Remove a single segment.
    DeleteSegment { id: String },

    /// Rename / recolor / re-icon a label in place.
    UpdateLabel {
        id: String,
        name: Option<String>,
        color: Option<String>,
        icon: Option<String>,
    },

    /// Paste clipboard text: an internal fragment payload is spliced
    /// in with fresh ids, anything else is treated as plain text.
    Paste {
        payload: String,
        caret: Option<Caret>,
    },

    /// Insert a saved section (label + content) with fresh ids.
    InsertSection {
        data: Vec<Segment>,
        caret: Option<Caret>,
    },

    /// Swap a labeled section with its neighbor.
    MoveSection { label_id: String, direction: Direction },

    /// Remove a labeled section and its content.
    DeleteSection { label_id: String },
}

impl Operation {
    /// Apply against the current document. `None` means the operation
    /// was a no-op (missing target, invalid selection) and the caller
    /// should keep the prior state.
    pub fn apply(&self, doc: &Document, ids: &mut IdGenerator) -> Option<Applied> {
        match self {
            Operation::SplitText { id, offset } => split_text(doc, id, *offset, ids),
            Operation::DeleteBackward { id } => delete_backward(doc, id),
            Operation::ConvertToVariant {
                id,
                start,
                end,
                selected,
            } => convert_to_variant(doc, id, *start, *end, selected, ids),
            Operation::InsertLabel {
                name,
                color,
                icon,
                caret,
            } => {
                let label = Segment::label(ids.new_id(), name.clone(), color.clone(), icon.clone());
                insert_label(doc, label, caret.as_ref(), ids)
            }
            Operation::InsertVariant { options, caret } => {
                let active = options.first().cloned().unwrap_or_default();
                let variant = Segment::variant(ids.new_id(), options.clone(), active);
                insert_inline_block(doc, variant, caret.as_ref(), ids)
            }
            Operation::ReplaceVariantOptions { id, options } => {
                replace_variant_options(doc, id, options)
            }
            Operation::UpdateVariant {
                id,
                options,
                disabled_indices,
            } => update_variant(doc, id, options, disabled_indices),
            Operation::AppendOptions { id, options } => append_options(doc, id, options),
            Operation::FlattenVariant { id } => flatten_variant(doc, id, ids),
            Operation::DeleteSegment { id } => delete_segment(doc, id),
            Operation::UpdateLabel {
                id,
                name,
                color,
                icon,
            } => update_label(doc, id, name.as_deref(), color.as_deref(), icon.as_deref()),
            Operation::Paste { payload, caret } => paste(doc, payload, caret.as_ref(), ids),
            Operation::InsertSection { data, caret } => insert_section(doc, data, caret.as_ref(), ids),
            Operation::MoveSection {
                label_id,
                direction,
            } => move_section(doc, label_id, *direction),
            Operation::DeleteSection { label_id } => delete_section(doc, label_id),
        }
    }
}

// --- character-offset helpers ---

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split at a character offset; offsets past the end yield an empty
/// tail.
fn char_split(s: &str, at: usize) -> (String, String) {
    match s.char_indices().nth(at) {
        Some((byte, _)) => (s[..byte].to_string(), s[byte..].to_string()),
        None => (s.to_string(), String::new()),
    }
}

/// Normalize platform line endings, then split. Mirrors the paste
/// handling of multi-line plain text.
fn split_plain_lines(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .split('\n')
        .map(str::to_string)
        .collect()
}

// --- operations ---

fn split_text(doc: &Document, id: &str, offset: usize, ids: &mut IdGenerator) -> Option<Applied> {
    let index = doc.index_of(id)?;
    let content = doc.segments[index].as_text()?;

    let offset = offset.min(char_len(content));
    let (mut pre, post) = char_split(content, offset);
    pre.push('\n');
    let caret_fallback = char_len(&pre);

    let new_id = ids.new_id();
    let mut segments = doc.segments.clone();
    segments.splice(
        index..=index,
        [
            Segment::text(id, pre),
            Segment::text(new_id.clone(), post),
        ],
    );

    Some(
        Applied::new(segments)
            .with_caret(Caret::new(new_id, 0))
            .with_caret(Caret::new(id, caret_fallback)),
    )
}

fn delete_backward(doc: &Document, id: &str) -> Option<Applied> {
    let index = doc.index_of(id)?;
    if index == 0 {
        return None;
    }

    let current = &doc.segments[index];
    let previous = &doc.segments[index - 1];

    match (previous, current) {
        (
            Segment::Text {
                id: prev_id,
                content: prev_content,
            },
            Segment::Text {
                content: curr_content,
                ..
            },
        ) => {
            let mut merged = prev_content.clone();
            if merged.ends_with('\n') {
                merged.pop();
            }
            let join_offset = char_len(&merged);
            merged.push_str(curr_content);

            let mut segments = doc.segments.clone();
            segments[index - 1] = Segment::text(prev_id.clone(), merged);
            segments.remove(index);

            Some(Applied::new(segments).with_caret(Caret::new(prev_id.clone(), join_offset)))
        }
        (prev, Segment::Text { .. }) if prev.is_block() => {
            let mut segments = doc.segments.clone();
            segments.remove(index - 1);

            let mut applied = Applied::new(segments).with_caret(Caret::new(id, 0));
            // Removing the block can expose a text segment the current
            // one merges into; the caret then lands at the join.
            if index >= 2 {
                if let Segment::Text {
                    id: before_id,
                    content,
                } = &doc.segments[index - 2]
                {
                    applied = applied.with_caret(Caret::new(before_id.clone(), char_len(content)));
                }
            }
            Some(applied)
        }
        _ => None,
    }
}

fn convert_to_variant(
    doc: &Document,
    id: &str,
    start: usize,
    end: usize,
    selected: &str,
    ids: &mut IdGenerator,
) -> Option<Applied> {
    let trimmed = selected.trim();
    if trimmed.is_empty() {
        trace!(segment = id, "selection trims to empty, skipping convert");
        return None;
    }

    let index = doc.index_of(id)?;
    let content = doc.segments[index].as_text()?;

    let len = char_len(content);
    let (start, end) = (start.min(len), end.min(len));
    let (start, end) = if start <= end { (start, end) } else { (end, start) };

    let before = char_split(content, start).0;
    let after = char_split(content, end).1;

    let mut replacement = Vec::with_capacity(3);
    if !before.is_empty() {
        replacement.push(Segment::text(ids.new_id(), before));
    }
    let variant_id = ids.new_id();
    replacement.push(Segment::variant(
        variant_id.clone(),
        vec![trimmed.to_string()],
        trimmed,
    ));
    if !after.is_empty() {
        replacement.push(Segment::text(ids.new_id(), after));
    }

    let mut segments = doc.segments.clone();
    segments.splice(index..=index, replacement);

    Some(Applied::new(segments).with_caret(Caret::new(variant_id, 0)))
}

fn insert_label(
    doc: &Document,
    label: Segment,
    caret: Option<&Caret>,
    ids: &mut IdGenerator,
) -> Option<Applied> {
    let mut segments = doc.segments.clone();

    match caret.and_then(|c| doc.index_of(&c.segment_id).map(|i| (i, c.offset))) {
        Some((index, offset)) => match doc.segments[index].as_text() {
            Some(content) => {
                // A label always starts its own line.
                let (mut pre, post) = char_split(content, offset.min(char_len(content)));
                if !pre.ends_with('\n') {
                    pre.push('\n');
                }
                let keep_id = doc.segments[index].id().to_string();
                segments.splice(
                    index..=index,
                    [
                        Segment::text(keep_id, pre),
                        label,
                        Segment::text(ids.new_id(), post),
                    ],
                );
            }
            None => segments.insert(index + 1, label),
        },
        None => segments.push(label),
    }

    Some(Applied::new(segments))
}

/// Variant insertion shares the label's positional rules but does not
/// force a line break.
fn insert_inline_block(
    doc: &Document,
    block: Segment,
    caret: Option<&Caret>,
    ids: &mut IdGenerator,
) -> Option<Applied> {
    let mut segments = doc.segments.clone();

    match caret.and_then(|c| doc.index_of(&c.segment_id).map(|i| (i, c.offset))) {
        Some((index, offset)) => match doc.segments[index].as_text() {
            Some(content) => {
                let (pre, post) = char_split(content, offset.min(char_len(content)));
                let keep_id = doc.segments[index].id().to_string();
                segments.splice(
                    index..=index,
                    [
                        Segment::text(keep_id, pre),
                        block,
                        Segment::text(ids.new_id(), post),
                    ],
                );
            }
            None => segments.insert(index + 1, block),
        },
        None => segments.push(block),
    }

    Some(Applied::new(segments))
}

fn replace_variant_options(doc: &Document, id: &str, options: &[String]) -> Option<Applied> {
    let index = doc.index_of(id)?;
    let Segment::Variant { id: vid, .. } = &doc.segments[index] else {
        return None;
    };

    let mut segments = doc.segments.clone();
    segments[index] = Segment::variant(
        vid.clone(),
        options.to_vec(),
        options.first().cloned().unwrap_or_default(),
    );

    Some(Applied::new(segments))
}

fn update_variant(
    doc: &Document,
    id: &str,
    options: &[String],
    disabled_indices: &[usize],
) -> Option<Applied> {
    let index = doc.index_of(id)?;
    let Segment::Variant {
        id: vid,
        active_value,
        ..
    } = &doc.segments[index]
    else {
        return None;
    };

    // Fall back when the active value was removed or is now disabled:
    // first enabled option, else first option regardless of disabled
    // state.
    let active_index = options.iter().position(|o| o == active_value);
    let active_disabled = active_index.is_some_and(|i| disabled_indices.contains(&i));

    let new_active = if active_index.is_none() || active_disabled {
        (0..options.len())
            .find(|i| !disabled_indices.contains(i))
            .or(if options.is_empty() { None } else { Some(0) })
            .map(|i| options[i].clone())
            .unwrap_or_default()
    } else {
        active_value.clone()
    };

    let mut segments = doc.segments.clone();
    segments[index] = Segment::Variant {
        id: vid.clone(),
        options: options.to_vec(),
        active_value: new_active,
        disabled_indices: disabled_indices.to_vec(),
    };

    Some(Applied::new(segments))
}

fn append_options(doc: &Document, id: &str, candidates: &[String]) -> Option<Applied> {
    let index = doc.index_of(id)?;
    let Segment::Variant {
        id: vid,
        options,
        active_value,
        disabled_indices,
    } = &doc.segments[index]
    else {
        return None;
    };

    let additions: Vec<String> = candidates
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if additions.is_empty() {
        return None;
    }

    let mut options = options.clone();
    options.extend(additions);

    let mut segments = doc.segments.clone();
    segments[index] = Segment::Variant {
        id: vid.clone(),
        options,
        active_value: active_value.clone(),
        disabled_indices: disabled_indices.clone(),
    };

    Some(Applied::new(segments))
}

fn flatten_variant(doc: &Document, id: &str, ids: &mut IdGenerator) -> Option<Applied> {
    let index = doc.index_of(id)?;
    let Segment::Variant { active_value, .. } = &doc.segments[index] else {
        return None;
    };

    let mut segments = doc.segments.clone();
    segments[index] = Segment::text(ids.new_id(), active_value.clone());

    Some(Applied::new(segments))
}

fn delete_segment(doc: &Document, id: &str) -> Option<Applied> {
    doc.index_of(id)?;
    let segments = doc
        .segments
        .iter()
        .filter(|s| s.id() != id)
        .cloned()
        .collect();
    Some(Applied::new(segments))
}

fn update_label(
    doc: &Document,
    id: &str,
    name: Option<&str>,
    color: Option<&str>,
    icon: Option<&str>,
) -> Option<Applied> {
    let index = doc.index_of(id)?;
    let Segment::Label {
        id: lid,
        name: old_name,
        color: old_color,
        icon: old_icon,
    } = &doc.segments[index]
    else {
        return None;
    };

    let mut segments = doc.segments.clone();
    segments[index] = Segment::Label {
        id: lid.clone(),
        name: name.unwrap_or(old_name).to_string(),
        color: color.unwrap_or(old_color).to_string(),
        icon: icon.unwrap_or(old_icon).to_string(),
    };

    Some(Applied::new(segments))
}

fn paste(
    doc: &Document,
    payload: &str,
    caret: Option<&Caret>,
    ids: &mut IdGenerator,
) -> Option<Applied> {
    if payload.is_empty() {
        return None;
    }

    // Internal fragments are cloned with fresh ids; anything else is
    // plain text.
    let fragment: Option<Vec<Segment>> = decode_fragment(payload)
        .map(|segs| segs.into_iter().map(|s| s.with_id(ids.new_id())).collect());

    let anchor = caret.and_then(|c| doc.index_of(&c.segment_id).map(|i| (i, c.offset)));

    let Some((index, offset)) = anchor else {
        // No caret anchor: append at the end.
        let mut segments = doc.segments.clone();
        match fragment {
            Some(frag) => segments.extend(frag),
            None => segments.push(Segment::text(ids.new_id(), payload)),
        }
        return Some(Applied::new(segments));
    };

    let mut segments = doc.segments.clone();

    match doc.segments[index].as_text() {
        Some(content) => {
            let (mut pre, post) = char_split(content, offset.min(char_len(content)));
            let keep_id = doc.segments[index].id().to_string();

            match fragment {
                Some(frag) => {
                    // A fragment that opens with a label starts its own
                    // line.
                    if frag.first().is_some_and(Segment::is_label)
                        && !pre.is_empty()
                        && !pre.ends_with('\n')
                    {
                        pre.push('\n');
                    }
                    let mut replacement = vec![Segment::text(keep_id, pre)];
                    replacement.extend(frag);
                    replacement.push(Segment::text(ids.new_id(), post));
                    segments.splice(index..=index, replacement);
                }
                None => {
                    let lines = split_plain_lines(payload);
                    if lines.len() == 1 {
                        segments[index] =
                            Segment::text(keep_id, format!("{pre}{payload}{post}"));
                    } else {
                        let last = lines.len() - 1;
                        let replacement: Vec<Segment> = lines
                            .into_iter()
                            .enumerate()
                            .map(|(i, mut line)| {
                                if i != last {
                                    line.push('\n');
                                }
                                if i == 0 {
                                    line = format!("{pre}{line}");
                                }
                                if i == last {
                                    line.push_str(&post);
                                }
                                Segment::text(ids.new_id(), line)
                            })
                            .collect();
                        segments.splice(index..=index, replacement);
                    }
                }
            }
        }
        None => {
            // Caret rests on a block: content goes right after it.
            let insert: Vec<Segment> = match fragment {
                Some(frag) => frag,
                None => {
                    let lines = split_plain_lines(payload);
                    let last = lines.len() - 1;
                    lines
                        .into_iter()
                        .enumerate()
                        .map(|(i, mut line)| {
                            if i != last {
                                line.push('\n');
                            }
                            Segment::text(ids.new_id(), line)
                        })
                        .collect()
                }
            };
            segments.splice(index + 1..index + 1, insert);
        }
    }

    Some(Applied::new(segments))
}

fn insert_section(
    doc: &Document,
    data: &[Segment],
    caret: Option<&Caret>,
    ids: &mut IdGenerator,
) -> Option<Applied> {
    if data.is_empty() {
        return None;
    }

    let pasted: Vec<Segment> = data
        .iter()
        .map(|s| s.clone().with_id(ids.new_id()))
        .collect();

    let mut segments = doc.segments.clone();

    match caret.and_then(|c| doc.index_of(&c.segment_id).map(|i| (i, c.offset))) {
        Some((index, offset)) => match doc.segments[index].as_text() {
            Some(content) => {
                let (mut pre, post) = char_split(content, offset.min(char_len(content)));
                if !pre.is_empty() && !pre.ends_with('\n') {
                    pre.push('\n');
                }
                let keep_id = doc.segments[index].id().to_string();
                let mut replacement = vec![Segment::text(keep_id, pre)];
                replacement.extend(pasted);
                replacement.push(Segment::text(ids.new_id(), post));
                segments.splice(index..=index, replacement);
            }
            None => {
                segments.splice(index + 1..index + 1, pasted);
            }
        },
        None => segments.extend(pasted),
    }

    Some(Applied::new(segments))
}

fn move_section(doc: &Document, label_id: &str, direction: Direction) -> Option<Applied> {
    let mut groups = group_segments(&doc.segments);
    let index = groups
        .iter()
        .position(|g| g.label.as_ref().is_some_and(|l| l.id() == label_id))?;

    let target = match direction {
        Direction::Up if index > 0 => index - 1,
        Direction::Down if index + 1 < groups.len() => index + 1,
        _ => return None,
    };

    groups.swap(index, target);
    Some(Applied::new(flatten_groups(&groups)))
}

fn delete_section(doc: &Document, label_id: &str) -> Option<Applied> {
    let mut groups = group_segments(&doc.segments);
    let index = groups
        .iter()
        .position(|g| g.label.as_ref().is_some_and(|l| l.id() == label_id))?;

    groups.remove(index);
    Some(Applied::new(flatten_groups(&groups)))
}
