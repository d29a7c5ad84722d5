//! Tree load progress reporting.

use compact_str::CompactString;

/// Progress information during a tree load.
#[derive(Debug, Clone, Default)]
pub struct LoadProgress {
    /// Number of folders listed so far (the root included).
    pub folders_listed: u64,
    /// Number of entries returned by all listings so far.
    pub entries_seen: u64,
    /// Path of the folder listed last ("" for the root).
    pub current_path: CompactString,
    /// Number of folders whose listing failed.
    pub errors_count: u64,
}

impl LoadProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self::default()
    }
}
