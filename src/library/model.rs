use std::path::PathBuf;
use std::time::Duration;

pub type AssetId = u64;

/// A single playable audio unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub id: AssetId,
    pub path: PathBuf,
    pub title: String,
    /// Duration from the file's tags/properties, when it could be read.
    pub duration: Option<Duration>,
}
