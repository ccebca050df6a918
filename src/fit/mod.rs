//! Identification stages.
//!
//! Responsibilities:
//!
//! - build target `B` and basis matrix `A` (plus their log transforms)
//! - estimate lambda (joint or split, parallel per output)
//! - aggregate into Psi, fit block weights `a`, build Phi
//! - fit `c`, reconstruct `F`, compute error norms

pub mod aggregate;
pub mod basis_matrix;
pub mod combine;
pub mod diagnostics;
pub mod lambda;
pub mod target;

pub use aggregate::*;
pub use basis_matrix::*;
pub use combine::*;
pub use diagnostics::*;
pub use lambda::*;
pub use target::*;
