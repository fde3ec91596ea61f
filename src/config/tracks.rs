//! Track-descriptor batch loading.
//!
//! A batch is all-or-nothing: any missing key, mistyped value or invalid
//! range rejects every record in it.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// One track's construction parameters, as served by the project API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackDescriptor {
    pub id: i64,
    pub minvolume: f32,
    pub maxvolume: f32,
    pub minduration: f32,
    pub maxduration: f32,
    pub mindeadair: f32,
    pub maxdeadair: f32,
    pub minfadeintime: f32,
    pub maxfadeintime: f32,
    pub minfadeouttime: f32,
    pub maxfadeouttime: f32,
    pub repeatrecordings: bool,
}

impl TrackDescriptor {
    fn ranges(&self) -> [(&'static str, f32, f32); 5] {
        [
            ("volume", self.minvolume, self.maxvolume),
            ("duration", self.minduration, self.maxduration),
            ("deadair", self.mindeadair, self.maxdeadair),
            ("fadeintime", self.minfadeintime, self.maxfadeintime),
            ("fadeouttime", self.minfadeouttime, self.maxfadeouttime),
        ]
    }
}

#[derive(Deserialize)]
struct TomlBatch {
    #[serde(default)]
    track: Vec<TrackDescriptor>,
}

/// Load a batch from disk. `.toml` files use `[[track]]` tables, anything
/// else is parsed as a JSON array.
pub fn load_track_descriptors(path: &Path) -> Result<Vec<TrackDescriptor>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_toml = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    if is_toml {
        parse_toml_batch(&text)
    } else {
        parse_json_batch(&text)
    }
}

pub fn parse_json_batch(text: &str) -> Result<Vec<TrackDescriptor>, ConfigError> {
    let batch: Vec<TrackDescriptor> = serde_json::from_str(text)?;
    validate_batch(&batch)?;
    Ok(batch)
}

pub fn parse_toml_batch(text: &str) -> Result<Vec<TrackDescriptor>, ConfigError> {
    let batch: TomlBatch = toml::from_str(text)?;
    validate_batch(&batch.track)?;
    Ok(batch.track)
}

fn validate_batch(batch: &[TrackDescriptor]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for d in batch {
        if !seen.insert(d.id) {
            return Err(ConfigError::DuplicateId(d.id));
        }
        for (field, min, max) in d.ranges() {
            if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
                return Err(ConfigError::InvalidRange {
                    id: d.id,
                    field,
                    min,
                    max,
                });
            }
        }
    }
    Ok(())
}
