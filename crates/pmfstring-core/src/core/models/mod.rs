//! # Core Models Module
//!
//! Data structures describing a path across the surface.
//!
//! ## Overview
//!
//! A path is a [`chain::Chain`] of [`node::Node`]s stored in one flat array.
//! Nodes reference their neighbors by index, so the chain is the single owner
//! of every node and traversal is plain index-bounded iteration. The first and
//! last nodes are static and keep their positions for the whole relaxation.
//!
//! ## Key Components
//!
//! - [`node`] - Position, cached energies, attached terms, neighborhood enumeration
//! - [`chain`] - Construction, linkage, per-node energy recomputation
//! - [`ids`] - Stable identifiers for registered energy terms
//!
//! ## Usage
//!
//! ```ignore
//! use pmfstring::core::models::chain::Chain;
//! use nalgebra::Point2;
//!
//! let positions = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)];
//! let chain = Chain::build(&positions, &surface, None)?;
//! assert!(chain.first().is_static());
//! ```

pub mod chain;
pub mod ids;
pub mod node;
