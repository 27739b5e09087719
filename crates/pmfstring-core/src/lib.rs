//! # pmfstring Core Library
//!
//! Minimum-energy path refinement on two-dimensional potential-of-mean-force
//! (PMF) surfaces. A path is a chain of nodes placed on a sampled energy grid;
//! every interior node repeatedly moves to the lowest-energy position in a small
//! neighborhood around it while optional spring terms keep neighbors together.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture so that each concern
//! can be tested on its own.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Surface`, `Node`,
//!   `Chain`), the interpolation schemes, the external energy terms and CSV I/O.
//!
//! - **[`engine`]: The Logic Core.** The stateful `PathRelaxer`, which owns a
//!   surface and a chain and performs the synchronous grid-search relaxation,
//!   together with configuration, progress reporting and the engine error type.
//!
//! - **[`workflows`]: The Public API.** Complete procedures that load inputs,
//!   run a relaxation and post-process its profile. This is the entry point
//!   used by the command-line tool.

pub mod core;
pub mod engine;
pub mod workflows;
