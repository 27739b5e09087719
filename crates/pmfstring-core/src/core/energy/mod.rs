//! # Energy Module
//!
//! External energy terms that couple neighboring nodes of a path.
//!
//! The set of terms is closed: [`term::EnergyTerm`] is an enum whose only
//! variant today is the one-dimensional [`spring::Spring`]. Each term is
//! evaluated on demand against an ordered pair of nodes and yields zero when
//! either side of the pair is missing (a chain endpoint).

pub mod spring;
pub mod term;
