use promptloom_document::Segment;
use serde::{Deserialize, Serialize};

/// A reusable option set, created and stored by the surrounding
/// application. The editor only reads it: inserting one mints fresh
/// segment ids, so a preset can be dropped into a document any number
/// of times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionPreset {
    pub options: Vec<String>,
}

/// A saved labeled section — a label segment plus its content — owned
/// by the surrounding application. Inserted segments always get fresh
/// ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionPreset {
    pub data: Vec<Segment>,
}
