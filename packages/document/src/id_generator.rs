use crc32fast::Hasher;

/// Generate a stable session seed from a workspace name using CRC32.
pub fn get_session_seed(name: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(name.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential id generator for segments within a session.
///
/// Ids are `<seed>-<n>` with a monotonically increasing counter, so an
/// id is never reused for the lifetime of a session. Injected into
/// every operation that creates segments; tests substitute a fixed
/// seed to get deterministic ids.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u64,
}

impl IdGenerator {
    pub fn new(session_name: &str) -> Self {
        Self {
            seed: get_session_seed(session_name),
            count: 0,
        }
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Mint the next id.
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
