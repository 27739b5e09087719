//! # Core Module
//!
//! Stateless building blocks for describing a free-energy surface and a path
//! across it.
//!
//! ## Architecture
//!
//! - **Surface** ([`surface`]) - The sampled PMF grid, nearest-sample lookup and interpolation
//! - **Energy Terms** ([`energy`]) - External couplings between adjacent path nodes
//! - **Path Representation** ([`models`]) - Nodes and the index-linked chain they form
//! - **Profiles** ([`profile`]) - Per-node output and its arc-length post-processing
//! - **File I/O** ([`io`]) - CSV tables for samples, paths and profiles
//!
//! Nothing in this module keeps state between calls; the [`crate::engine`]
//! layer owns the surface and chain while a relaxation is running.

pub mod energy;
pub mod io;
pub mod models;
pub mod profile;
pub mod surface;
