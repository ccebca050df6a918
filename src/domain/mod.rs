//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - run configuration (`RunSettings`, `IdentConfig`) and its selector enums
//! - the block bounds object (`BlockLayout`) shared by every stage

pub mod layout;
pub mod types;

pub use layout::*;
pub use types::*;
