//! Output module for reporting on stored posts and runs
//!
//! Rendering and export of posts happen elsewhere; this module only backs the
//! `--stats` view.

pub mod stats;

pub use stats::{load_statistics, print_statistics, render_statistics, HarvestStatistics};
