//! Reporting utilities: formatted run summaries.

pub mod format;

pub use format::*;
