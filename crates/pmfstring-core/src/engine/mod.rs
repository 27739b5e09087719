//! # Engine Module
//!
//! The stateful layer of the library. It owns a surface together with the path
//! being relaxed and drives the iterative grid search over it.
//!
//! ## Overview
//!
//! A [`relaxer::PathRelaxer`] holds the chain of nodes, the registered external
//! energy terms and the current search steps. Each relaxation iteration asks
//! every node for its best local position against a single snapshot of the
//! path, commits all of the answers at once and then refreshes the cached
//! energies of the whole chain.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Validated parameters for a complete relaxation run
//! - **Relaxation** ([`relaxer`]) - The path relaxer and its energy-term registry
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Engine-level error type wrapping the core errors

pub mod config;
pub mod error;
pub mod progress;
pub mod relaxer;
