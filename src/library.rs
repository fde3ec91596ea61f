//! Asset catalog: the pool of short audio files tracks draw from.

mod model;
mod scan;

pub use model::{Asset, AssetId};
pub use scan::scan;
