//! Tour pipelines
//!
//! - **build** - suggestion, concurrent enrichment, optimization
//! - **recompute** - re-optimization after POIs are added or removed
//! - **merge** - field-level merge of a POI with its place lookup

pub mod build;
pub mod merge;
pub mod recompute;

pub use build::TourBuilder;
pub use merge::merge_poi;
pub use recompute::{recompute, reoptimize};
