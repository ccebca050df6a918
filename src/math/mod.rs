//! Mathematical utilities: basis functions, the log transform, and linear solvers.

pub mod basis;
pub mod solver;
pub mod transform;

pub use basis::*;
pub use solver::*;
pub use transform::*;
