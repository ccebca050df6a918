//! Sample preparation: min–max normalization and synthetic samples.

pub mod normalize;
pub mod synthetic;

pub use normalize::*;
pub use synthetic::*;
