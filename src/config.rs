//! Configuration loader and schema types.
//!
//! Runtime settings come from an optional TOML file plus environment
//! overrides. The track-descriptor batch is loaded separately and, unlike
//! settings, is fatal when malformed.

mod load;
mod schema;
mod tracks;

pub use load::resolve_config_path;
pub use schema::*;
pub use tracks::{TrackDescriptor, load_track_descriptors, parse_json_batch, parse_toml_batch};

#[cfg(test)]
mod tests;
