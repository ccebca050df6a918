//! `sysident` library crate.
//!
//! The binary (`sysid`) is a thin wrapper around this library so that:
//!
//! - the identification pipeline is testable without spawning processes
//! - every intermediate matrix is reachable through `app::pipeline::Identification`

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod report;
