//! Internal clipboard fragment format and the platform I/O boundary.
//!
//! Copying a section produces a tagged JSON payload carrying raw
//! segments, so internal paste is lossless. Any clipboard text that
//! fails to decode as a fragment is plain text — that is the fallback
//! path, never an error.

use promptloom_document::Segment;
use serde::{Deserialize, Serialize};

use crate::errors::ClipboardError;

/// Marker distinguishing internal fragments from arbitrary clipboard
/// text.
pub const FRAGMENT_TYPE: &str = "application/x-promptloom-fragment";

#[derive(Debug, Serialize, Deserialize)]
struct FragmentPayload {
    #[serde(rename = "type")]
    marker: String,
    data: Vec<Segment>,
}

/// Encode segments as an internal fragment payload.
pub fn encode_fragment(segments: &[Segment]) -> String {
    let payload = FragmentPayload {
        marker: FRAGMENT_TYPE.to_string(),
        data: segments.to_vec(),
    };
    serde_json::to_string(&payload).expect("fragment payload serializes")
}

/// Decode an internal fragment payload. Returns `None` for anything
/// that is not one — malformed JSON, foreign JSON, a missing or wrong
/// marker — in which case the caller treats the text as plain text.
pub fn decode_fragment(text: &str) -> Option<Vec<Segment>> {
    let payload: FragmentPayload = serde_json::from_str(text).ok()?;
    if payload.marker != FRAGMENT_TYPE {
        return None;
    }
    Some(payload.data)
}

/// External clipboard boundary. Reads and writes may fail (platform
/// denial, headless environment); failures surface to the user as
/// transient notifications and never touch document state.
pub trait Clipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError>;
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// In-memory clipboard for tests and headless use.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    buffer: String,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            buffer: text.into(),
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        Ok(self.buffer.clone())
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.buffer = text.to_string();
        Ok(())
    }
}
