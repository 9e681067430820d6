//! # mdsweep Core Library
//!
//! Parametric molecular-dynamics experiments: generate the matrix of parameter
//! combinations to explore, materialize an isolated workspace per combination and per
//! random seed, template the simulation input script for each workspace, and run the
//! simulation binary across all of them within a core budget.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless parameter values, the combination generator,
//!   file formats (input scripts, thermo logs, columnar dumps, combination CSV) and
//!   post-processing estimators.
//!
//! - **[`engine`]: The Logic Core.** Stateful orchestration: projects, jobs and seeds on
//!   disk, the process invoker, and the batch scheduler.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures that tie `core` and `engine`
//!   together, such as running a complete sweep from a list of parameter sets.

pub mod core;
pub mod engine;
pub mod workflows;
