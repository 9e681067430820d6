//! # Core Module
//!
//! This module provides the stateless building blocks of a parametric molecular-dynamics
//! sweep in mdsweep: the values being swept, the matrix of combinations to explore, and
//! the file formats exchanged with the simulation binary.
//!
//! ## Architecture
//!
//! - **Parameter Values** ([`params`]) - Numeric values, parameter sets, and derived job names
//! - **Combination Generation** ([`combinations`]) - Cartesian products with positional pegging
//! - **File I/O** ([`io`]) - Input-script templating, output table parsing, combination CSV
//! - **Post-processing** ([`analysis`]) - Block-averaging estimators for time series
//!
//! Nothing in this module touches the process state or spawns work; orchestration lives
//! in [`crate::engine`].

pub mod analysis;
pub mod combinations;
pub mod io;
pub mod params;
