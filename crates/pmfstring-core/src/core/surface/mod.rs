//! # Surface Module
//!
//! Sampled potential-of-mean-force surfaces and the interpolators built on top
//! of them.
//!
//! ## Overview
//!
//! A [`grid::Surface`] is assembled from unordered `(x, y, energy, probability)`
//! samples that must cover a full rectangular grid. It answers two kinds of
//! queries:
//!
//! - **Nearest-sample lookup** - snaps a coordinate to the closest grid point on
//!   each axis and returns the raw energy and probability stored there.
//! - **Interpolated lookup** - combines an [`interpolation::Interpolator`] energy
//!   estimate with the nearest-sample probability. Probability is never
//!   interpolated.
//!
//! ## Key Components
//!
//! - [`grid`] - Sample validation, axis storage, nearest lookups
//! - [`interpolation`] - Regular-grid interpolators (`nearest`, `linear`,
//!   `slinear`, `cubic`, `quintic`, `pchip`)
//!
//! ## Usage
//!
//! ```ignore
//! use pmfstring::core::surface::{grid::Surface, interpolation::InterpolationMethod};
//!
//! let surface = Surface::new(&samples)?;
//! let interpolator = surface.build_interpolator(InterpolationMethod::Cubic)?;
//! let value = surface.value_at(0.35, 1.2, Some(&interpolator))?;
//! ```

pub mod grid;
pub mod interpolation;
pub(crate) mod spline;
