//! # Workflows Module
//!
//! High-level entry points that run a complete parametric sweep.
//!
//! ## Architecture
//!
//! - **Sweep Workflow** ([`sweep`]) - Project creation, job registration from parameter
//!   sets, and batched execution of every seed.

pub mod sweep;
