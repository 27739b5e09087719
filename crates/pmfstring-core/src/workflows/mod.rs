//! # Workflows Module
//!
//! High-level entry points that run a complete path relaxation.
//!
//! A workflow loads its inputs, configures a [`crate::engine::relaxer::PathRelaxer`],
//! runs the requested number of iterations while reporting progress, and
//! post-processes the resulting profile into arc-length coordinates and,
//! optionally, a reduced set of waypoints.
//!
//! - **Relaxation Workflow** ([`relax`]) - Surface loading, relaxation and profile post-processing.

pub mod relax;
