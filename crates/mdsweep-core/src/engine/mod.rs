//! # Engine Module
//!
//! This module implements the stateful side of a parametric sweep: it turns parameter
//! sets into on-disk job workspaces and drives the external simulation binary across
//! them under a fixed core budget.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Project, seed and execution settings with a validating builder
//! - **Workspaces** ([`project`], [`job`]) - The project output root, its jobs and their seed directories
//! - **Process Invocation** ([`invoker`]) - Command templates with `{np}` and `{input}` placeholders
//! - **Scheduling** ([`scheduler`]) - Batched parallel execution with per-unit failure isolation
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events for front ends
//! - **Error Handling** ([`error`]) - The orchestration error taxonomy
//!
//! ## Workspace Layout
//!
//! ```text
//! <base>/<project>/
//!   <script>
//!   <job>/
//!     job.toml
//!     seed0/ .. seed{n-1}/
//!       <script>_<job>
//! ```
//!
//! Existing directories are never merged into or overwritten: creating a project or a
//! job whose directory is already present is an error.

pub mod config;
pub mod error;
pub mod invoker;
pub mod job;
pub mod progress;
pub mod project;
pub mod scheduler;
