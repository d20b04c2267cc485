use crate::{Document, Segment};

/// Punctuation that suppresses the auto-comma after a variant value.
const CLAUSE_PUNCTUATION: [char; 5] = ['.', ',', ';', '?', '!'];

/// Compile a document into its final prompt string.
///
/// Labels are organizational only and contribute nothing. Text is
/// emitted literally. A variant emits its active value unless every
/// option is disabled, in which case the block is silent (it stays
/// visible in the editor). After a non-empty variant value, a `", "`
/// separator is appended unless the next content segment is text that
/// already leads with clause punctuation, or there is no next segment.
///
/// Pure derivation: recompute whenever the document or any active
/// value changes.
pub fn compile(document: &Document) -> String {
    let content: Vec<&Segment> = document
        .segments
        .iter()
        .filter(|s| !s.is_label())
        .collect();

    let mut prompt = String::new();

    for (idx, seg) in content.iter().enumerate() {
        match seg {
            Segment::Text { content, .. } => prompt.push_str(content),
            Segment::Variant {
                options,
                active_value,
                ..
            } => {
                if options.is_empty() || seg.all_options_disabled() || active_value.is_empty() {
                    continue;
                }

                prompt.push_str(active_value);

                if needs_separator(content.get(idx + 1)) {
                    prompt.push_str(", ");
                }
            }
            Segment::Label { .. } => unreachable!("labels are filtered out"),
        }
    }

    prompt
}

fn needs_separator(next: Option<&&Segment>) -> bool {
    match next {
        None => false,
        Some(Segment::Text { content, .. }) => !content
            .trim_start()
            .starts_with(CLAUSE_PUNCTUATION),
        // A following block supplies no punctuation of its own.
        Some(_) => true,
    }
}
