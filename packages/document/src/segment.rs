use serde::{Deserialize, Serialize};

/// Atomic document unit.
///
/// A prompt document is an ordered run of segments: free-form text
/// interleaved with inline blocks (variant pickers and section labels).
/// Every segment carries a stable id so the rendering layer and edit
/// operations can address it across structural changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// Plain prose. May embed `\n`; empty only as a structural
    /// placeholder around blocks and blank lines.
    Text { id: String, content: String },

    /// Inline multi-option pick block with one active selection.
    Variant {
        id: String,
        /// Ordered option texts; insertion order is meaningful and
        /// duplicates are allowed.
        options: Vec<String>,
        /// Currently displayed option. Not necessarily a member of
        /// `options` after the set is edited.
        active_value: String,
        /// Indices into `options` that are temporarily ignored.
        #[serde(default)]
        disabled_indices: Vec<usize>,
    },

    /// Section delimiter with display metadata. Never editable prose
    /// and never part of compiled output.
    Label {
        id: String,
        name: String,
        color: String,
        icon: String,
    },
}

impl Segment {
    pub fn text(id: impl Into<String>, content: impl Into<String>) -> Self {
        Segment::Text {
            id: id.into(),
            content: content.into(),
        }
    }

    pub fn variant(id: impl Into<String>, options: Vec<String>, active_value: impl Into<String>) -> Self {
        Segment::Variant {
            id: id.into(),
            options,
            active_value: active_value.into(),
            disabled_indices: Vec::new(),
        }
    }

    pub fn label(
        id: impl Into<String>,
        name: impl Into<String>,
        color: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Segment::Label {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            icon: icon.into(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Segment::Text { id, .. } | Segment::Variant { id, .. } | Segment::Label { id, .. } => id,
        }
    }

    /// Replace this segment's id, keeping the payload. Used when
    /// splicing cloned segments (paste, preset insertion) so ids are
    /// never reused.
    pub fn with_id(mut self, new_id: String) -> Self {
        match &mut self {
            Segment::Text { id, .. } | Segment::Variant { id, .. } | Segment::Label { id, .. } => {
                *id = new_id
            }
        }
        self
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Segment::Text { .. })
    }

    pub fn is_label(&self) -> bool {
        matches!(self, Segment::Label { .. })
    }

    /// Variant and label blocks, as opposed to editable text.
    pub fn is_block(&self) -> bool {
        !self.is_text()
    }

    /// Text content, when this is a text segment.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Segment::Text { content, .. } => Some(content),
            _ => None,
        }
    }

    /// True when every option index of a variant is disabled. Non-variant
    /// segments and empty option lists report false.
    pub fn all_options_disabled(&self) -> bool {
        match self {
            Segment::Variant {
                options,
                disabled_indices,
                ..
            } => !options.is_empty() && (0..options.len()).all(|i| disabled_indices.contains(&i)),
            _ => false,
        }
    }
}

/// An ordered sequence of segments.
///
/// Construct one through [`crate::normalize`] — every structural
/// mutation must pass through it so the invariants documented there
/// hold whenever a `Document` is observable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub segments: Vec<Segment>,
}

impl Document {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn find(&self, id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id() == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|s| s.id() == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.segments.iter().position(|s| s.id() == id)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Partition into section groups: each label starts a group that
    /// carries all following non-label segments. Content before the
    /// first label forms an unlabeled leading group.
    pub fn groups(&self) -> Vec<SectionGroup> {
        group_segments(&self.segments)
    }
}

/// A label plus its following content segments. Derived view, never
/// persisted; used for section-scoped move/delete/copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionGroup {
    pub label: Option<Segment>,
    pub content: Vec<Segment>,
}

impl SectionGroup {
    /// Label followed by content, in document order.
    pub fn segments(&self) -> Vec<Segment> {
        let mut out = Vec::with_capacity(self.content.len() + 1);
        if let Some(label) = &self.label {
            out.push(label.clone());
        }
        out.extend(self.content.iter().cloned());
        out
    }
}

pub fn group_segments(segments: &[Segment]) -> Vec<SectionGroup> {
    let mut groups = Vec::new();
    let mut current = SectionGroup {
        label: None,
        content: Vec::new(),
    };

    for seg in segments {
        if seg.is_label() {
            if current.label.is_some() || !current.content.is_empty() {
                groups.push(current);
            }
            current = SectionGroup {
                label: Some(seg.clone()),
                content: Vec::new(),
            };
        } else {
            current.content.push(seg.clone());
        }
    }

    if current.label.is_some() || !current.content.is_empty() {
        groups.push(current);
    }

    groups
}

/// Re-flatten section groups back into a single segment run.
pub fn flatten_groups(groups: &[SectionGroup]) -> Vec<Segment> {
    groups.iter().flat_map(|g| g.segments()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::new(vec![
            Segment::text("t1", "intro "),
            Segment::label("l1", "Scene", "#0ea5e9", "Layers"),
            Segment::text("t2", "a city street"),
            Segment::variant("v1", vec!["at dawn".into(), "at night".into()], "at dawn"),
            Segment::text("t3", ""),
            Segment::label("l2", "Mood", "#22c55e", "Tag"),
            Segment::text("t4", "quiet"),
        ])
    }

    #[test]
    fn groups_split_at_labels() {
        let groups = doc().groups();
        assert_eq!(groups.len(), 3);

        assert!(groups[0].label.is_none());
        assert_eq!(groups[0].content.len(), 1);

        assert_eq!(groups[1].label.as_ref().unwrap().id(), "l1");
        assert_eq!(groups[1].content.len(), 3);

        assert_eq!(groups[2].label.as_ref().unwrap().id(), "l2");
        assert_eq!(groups[2].content.len(), 1);
    }

    #[test]
    fn flatten_round_trips_grouping() {
        let d = doc();
        assert_eq!(flatten_groups(&d.groups()), d.segments);
    }

    #[test]
    fn grouping_without_leading_content_has_no_empty_group() {
        let segments = vec![
            Segment::label("l1", "Scene", "#0ea5e9", "Tag"),
            Segment::text("t1", "x"),
        ];
        let groups = group_segments(&segments);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].label.is_some());
    }

    #[test]
    fn all_options_disabled_requires_full_cover() {
        let mut seg = Segment::variant("v", vec!["a".into(), "b".into()], "a");
        assert!(!seg.all_options_disabled());
        if let Segment::Variant {
            disabled_indices, ..
        } = &mut seg
        {
            *disabled_indices = vec![0, 1];
        }
        assert!(seg.all_options_disabled());

        let empty = Segment::variant("v2", vec![], "");
        assert!(!empty.all_options_disabled());
    }

    #[test]
    fn segment_serialization_is_tagged() {
        let seg = Segment::variant("v1", vec!["red".into()], "red");
        let json = serde_json::to_string(&seg).unwrap();
        assert!(json.contains("\"kind\":\"variant\""));

        let back: Segment = serde_json::from_str(&json).unwrap();
        assert_eq!(seg, back);
    }
}
