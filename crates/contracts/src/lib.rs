//! # Contracts
//!
//! Shared interface contracts between the bridge crates: readings handed to
//! sinks, the sink trait, configuration records and the unified error type.
//! Business crates only depend on this crate, never on each other.
//!
//! ## Units
//! - Distances are integer centimeters as reported by the TF-Luna
//! - Normalized values are `f32` in `[0, 1]`, 1 = near, 0 = far

mod config;
mod error;
mod reading;
mod sink;

pub use config::*;
pub use error::*;
pub use reading::*;
pub use sink::*;
