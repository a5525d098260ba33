use serde::{Deserialize, Serialize};

/// Statistics about the loaded archives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of live archives
    pub archives: usize,

    /// Distinct canonical class names
    pub classes: usize,

    /// Distinct lookup keys
    pub aliases: usize,

    /// Parsed documents currently cached
    pub cached_docs: usize,

    /// Time taken in milliseconds
    pub time_ms: u64,

    /// Archives that failed to load
    pub errors: Vec<String>,
}

impl IndexStats {
    pub fn new() -> Self {
        Self {
            archives: 0,
            classes: 0,
            aliases: 0,
            cached_docs: 0,
            time_ms: 0,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }
}

impl Default for IndexStats {
    fn default() -> Self {
        Self::new()
    }
}
