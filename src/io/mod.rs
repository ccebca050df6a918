//! Input/output helpers.
//!
//! - sample ingest + validation (`ingest`)
//! - TOML run settings (`settings`)
//! - sectioned-CSV workbook export (`export`)
//! - JSON run snapshots (`snapshot`)

pub mod export;
pub mod ingest;
pub mod settings;
pub mod snapshot;

pub use export::*;
pub use ingest::*;
pub use settings::*;
pub use snapshot::*;
