use crate::{IdGenerator, Document, Segment};

/// Restore the document invariants over any raw segment sequence.
///
/// This is the single choke point every structural mutation must pass
/// through before its result is a valid [`Document`]:
///
/// 1. The sequence is never empty — no content means one empty text
///    segment.
/// 2. The first and last segments are text.
/// 3. Adjacent text segments are merged unless the left one ends with
///    a newline or the right one starts with one, so the segment
///    boundary around a line break stays stable.
/// 4. Every block (variant or label) is immediately followed by a text
///    segment; an empty one is synthesized when missing.
/// 5. A final text segment ending in a newline gets an empty text
///    segment appended after it, so the blank line it creates remains
///    addressable.
///
/// Input segments are never mutated; everything that survives is a
/// clone. New ids are minted only for synthesized placeholders, which
/// keeps the function idempotent: a second pass finds nothing to merge
/// and nothing missing, so `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &[Segment], ids: &mut IdGenerator) -> Document {
    if raw.is_empty() {
        return Document::new(vec![Segment::text(ids.new_id(), "")]);
    }

    let mut normalized: Vec<Segment> = Vec::with_capacity(raw.len() + 2);

    if !raw[0].is_text() {
        normalized.push(Segment::text(ids.new_id(), ""));
    }

    for (i, segment) in raw.iter().enumerate() {
        let current = segment.clone();

        // Merge runs of text, except across an explicit line break.
        if let (Some(Segment::Text { content: prev, .. }), Segment::Text { content: curr, .. }) =
            (normalized.last_mut(), &current)
        {
            if !prev.ends_with('\n') && !curr.starts_with('\n') {
                prev.push_str(curr);
                continue;
            }
        }

        let current_is_block = current.is_block();
        normalized.push(current);

        let next_is_block = raw.get(i + 1).map_or(true, |next| !next.is_text());
        if current_is_block && next_is_block {
            normalized.push(Segment::text(ids.new_id(), ""));
        }
    }

    match normalized.last() {
        Some(Segment::Text { content, .. }) => {
            if content.ends_with('\n') {
                normalized.push(Segment::text(ids.new_id(), ""));
            }
        }
        _ => normalized.push(Segment::text(ids.new_id(), "")),
    }

    Document::new(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids() -> IdGenerator {
        IdGenerator::from_seed("norm")
    }

    #[test]
    fn empty_input_becomes_single_empty_text() {
        let doc = normalize(&[], &mut ids());
        assert_eq!(doc.segments, vec![Segment::text("norm-1", "")]);
    }

    #[test]
    fn endpoints_are_always_text() {
        let raw = vec![
            Segment::label("l1", "Scene", "#0ea5e9", "Tag"),
            Segment::variant("v1", vec!["x".into()], "x"),
        ];
        let doc = normalize(&raw, &mut ids());

        assert!(doc.segments.first().unwrap().is_text());
        assert!(doc.segments.last().unwrap().is_text());
    }

    #[test]
    fn blocks_are_followed_by_text() {
        let raw = vec![
            Segment::text("t1", "a"),
            Segment::variant("v1", vec!["x".into()], "x"),
            Segment::variant("v2", vec!["y".into()], "y"),
            Segment::text("t2", "b"),
        ];
        let doc = normalize(&raw, &mut ids());

        for (i, seg) in doc.segments.iter().enumerate() {
            if seg.is_block() {
                assert!(
                    doc.segments[i + 1].is_text(),
                    "block at {} not followed by text",
                    i
                );
            }
        }
    }

    #[test]
    fn adjacent_text_merges_without_newline() {
        let raw = vec![Segment::text("t1", "foo"), Segment::text("t2", "bar")];
        let doc = normalize(&raw, &mut ids());
        assert_eq!(doc.segments, vec![Segment::text("t1", "foobar")]);
    }

    #[test]
    fn newline_boundary_prevents_merge() {
        let raw = vec![Segment::text("t1", "foo\n"), Segment::text("t2", "bar")];
        let doc = normalize(&raw, &mut ids());
        assert_eq!(doc.segments.len(), 2);
        assert_eq!(doc.segments[0], Segment::text("t1", "foo\n"));
        assert_eq!(doc.segments[1], Segment::text("t2", "bar"));

        let raw = vec![Segment::text("t1", "foo"), Segment::text("t2", "\nbar")];
        let doc = normalize(&raw, &mut ids());
        assert_eq!(doc.segments.len(), 2);
    }

    #[test]
    fn trailing_newline_gets_addressable_blank_line() {
        let raw = vec![Segment::text("t1", "line\n")];
        let doc = normalize(&raw, &mut ids());
        assert_eq!(doc.segments.len(), 2);
        assert_eq!(doc.segments[1].as_text(), Some(""));
    }

    #[test]
    fn surviving_segments_keep_their_ids() {
        let raw = vec![
            Segment::text("t1", "a\n"),
            Segment::variant("v1", vec!["x".into()], "x"),
            Segment::text("t2", "b"),
        ];
        let doc = normalize(&raw, &mut ids());
        let kept: Vec<&str> = doc.segments.iter().map(|s| s.id()).collect();
        assert!(kept.contains(&"t1"));
        assert!(kept.contains(&"v1"));
        assert!(kept.contains(&"t2"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let raws = vec![
            vec![],
            vec![Segment::variant("v1", vec!["x".into()], "x")],
            vec![
                Segment::label("l1", "A", "#fff", "Tag"),
                Segment::text("t1", "one\n"),
                Segment::text("t2", "two"),
                Segment::text("t3", " three"),
                Segment::variant("v1", vec!["x".into()], "x"),
                Segment::label("l2", "B", "#000", "Tag"),
            ],
            vec![Segment::text("t1", "ends in break\n")],
        ];

        for raw in raws {
            let mut gen = ids();
            let once = normalize(&raw, &mut gen);
            let twice = normalize(&once.segments, &mut gen);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn input_is_not_mutated() {
        let raw = vec![Segment::text("t1", "foo"), Segment::text("t2", "bar")];
        let before = raw.clone();
        let _ = normalize(&raw, &mut ids());
        assert_eq!(raw, before);
    }
}
