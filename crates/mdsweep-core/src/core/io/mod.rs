//! Provides input/output functionality for simulation files.
//!
//! This module contains the input-script template that rewrites literal `variable`
//! declarations, parsers for tabular simulation output (the thermo log table and
//! column-oriented dumps) behind a common trait, and the CSV interchange format for
//! parameter combinations.

pub mod columnar;
pub mod combinations;
pub mod input_script;
pub(crate) mod table;
pub mod thermo_log;
pub mod traits;

pub use table::{DataTable, TableParseError};
