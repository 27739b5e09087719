use super::interpolation::{InterpolationError, InterpolationMethod, Interpolator};
use nalgebra::{DMatrix, Point2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single raw sample of the potential-of-mean-force surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub energy: f64,
    pub probability: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, energy: f64, probability: f64) -> Self {
        Self {
            x,
            y,
            energy,
            probability,
        }
    }
}

/// Energy and probability read from the surface at a query position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceValue {
    pub energy: f64,
    pub probability: f64,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("Malformed surface: {reason}")]
    MalformedSurface { reason: String },

    #[error("Cannot resolve nearest grid point for ({x}, {y})")]
    Lookup { x: f64, y: f64 },

    #[error("Interpolation failed: {0}")]
    Interpolation(#[from] InterpolationError),
}

/// Axis-aligned bounds of the sampled grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl GridBounds {
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// Bounds widened on every side by `relative` times the span of that axis.
    pub fn widened(&self, relative: f64) -> Self {
        let margin_x = relative * (self.x_max - self.x_min).abs().max(1.0);
        let margin_y = relative * (self.y_max - self.y_min).abs().max(1.0);
        Self {
            x_min: self.x_min - margin_x,
            x_max: self.x_max + margin_x,
            y_min: self.y_min - margin_y,
            y_max: self.y_max + margin_y,
        }
    }
}

/// Sorted unique coordinate values along one grid axis.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxis {
    values: Vec<f64>,
}

impl GridAxis {
    fn from_unsorted(mut values: Vec<f64>) -> Self {
        values.sort_by(f64::total_cmp);
        values.dedup();
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> f64 {
        self.values[0]
    }

    pub fn max(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// Index of the grid value closest to `value`.
    ///
    /// Equidistant queries resolve to the lower grid value. Returns `None` for
    /// non-finite queries or an empty axis.
    pub fn nearest_index(&self, value: f64) -> Option<usize> {
        if !value.is_finite() || self.values.is_empty() {
            return None;
        }
        let upper = self.values.partition_point(|&v| v < value);
        if upper == 0 {
            return Some(0);
        }
        if upper == self.values.len() {
            return Some(upper - 1);
        }
        let below = value - self.values[upper - 1];
        let above = self.values[upper] - value;
        Some(if below <= above { upper - 1 } else { upper })
    }

    /// Index `i` of the cell `[values[i], values[i + 1]]` containing `value`.
    ///
    /// The caller guarantees `value` lies within the axis and the axis has at
    /// least two points.
    pub(crate) fn cell_index(&self, value: f64) -> usize {
        let upper = self.values.partition_point(|&v| v <= value);
        upper.clamp(1, self.values.len() - 1) - 1
    }

    pub(crate) fn contains(&self, value: f64) -> bool {
        value >= self.min() && value <= self.max()
    }
}

/// A rectangular potential-of-mean-force surface.
///
/// The samples must cover the full Cartesian product of their unique x and y
/// values exactly once. Energies and probabilities are stored as
/// `n_x × n_y` matrices indexed by the sorted axis positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    x_axis: GridAxis,
    y_axis: GridAxis,
    energies: DMatrix<f64>,
    probabilities: DMatrix<f64>,
}

impl Surface {
    pub fn new(samples: &[Sample]) -> Result<Self, SurfaceError> {
        if samples.is_empty() {
            return Err(SurfaceError::MalformedSurface {
                reason: "the sample set is empty".to_string(),
            });
        }
        if let Some(bad) = samples
            .iter()
            .find(|s| !s.x.is_finite() || !s.y.is_finite())
        {
            return Err(SurfaceError::MalformedSurface {
                reason: format!("non-finite sample coordinate ({}, {})", bad.x, bad.y),
            });
        }

        let x_axis = GridAxis::from_unsorted(samples.iter().map(|s| s.x).collect());
        let y_axis = GridAxis::from_unsorted(samples.iter().map(|s| s.y).collect());
        let (nx, ny) = (x_axis.len(), y_axis.len());

        if samples.len() != nx * ny {
            return Err(SurfaceError::MalformedSurface {
                reason: format!(
                    "{} samples cannot fill a {}x{} grid of unique coordinates",
                    samples.len(),
                    nx,
                    ny
                ),
            });
        }

        let mut energies = DMatrix::from_element(nx, ny, f64::NAN);
        let mut probabilities = DMatrix::from_element(nx, ny, f64::NAN);
        let mut filled = vec![false; nx * ny];

        for sample in samples {
            // Exact matches: both axes were built from these very values.
            let ix = x_axis.values.partition_point(|&v| v < sample.x);
            let iy = y_axis.values.partition_point(|&v| v < sample.y);
            let slot = ix * ny + iy;
            if filled[slot] {
                return Err(SurfaceError::MalformedSurface {
                    reason: format!("duplicate sample at ({}, {})", sample.x, sample.y),
                });
            }
            filled[slot] = true;
            energies[(ix, iy)] = sample.energy;
            probabilities[(ix, iy)] = sample.probability;
        }

        Ok(Self {
            x_axis,
            y_axis,
            energies,
            probabilities,
        })
    }

    pub fn x_axis(&self) -> &GridAxis {
        &self.x_axis
    }

    pub fn y_axis(&self) -> &GridAxis {
        &self.y_axis
    }

    pub fn energies(&self) -> &DMatrix<f64> {
        &self.energies
    }

    pub fn probabilities(&self) -> &DMatrix<f64> {
        &self.probabilities
    }

    pub fn bounds(&self) -> GridBounds {
        GridBounds {
            x_min: self.x_axis.min(),
            x_max: self.x_axis.max(),
            y_min: self.y_axis.min(),
            y_max: self.y_axis.max(),
        }
    }

    /// Snaps `(x, y)` to the closest grid point on each axis independently
    /// and returns the raw sample stored there.
    pub fn nearest_value(&self, x: f64, y: f64) -> Result<SurfaceValue, SurfaceError> {
        let (ix, iy) = self.nearest_indices(x, y)?;
        Ok(SurfaceValue {
            energy: self.energies[(ix, iy)],
            probability: self.probabilities[(ix, iy)],
        })
    }

    pub fn nearest_indices(&self, x: f64, y: f64) -> Result<(usize, usize), SurfaceError> {
        match (self.x_axis.nearest_index(x), self.y_axis.nearest_index(y)) {
            (Some(ix), Some(iy)) => Ok((ix, iy)),
            _ => Err(SurfaceError::Lookup { x, y }),
        }
    }

    /// The grid point closest to `point`, taken axis by axis.
    pub fn snap_to_grid(&self, point: Point2<f64>) -> Result<Point2<f64>, SurfaceError> {
        let (ix, iy) = self.nearest_indices(point.x, point.y)?;
        Ok(Point2::new(self.x_axis.values[ix], self.y_axis.values[iy]))
    }

    pub fn build_interpolator(
        &self,
        method: InterpolationMethod,
    ) -> Result<Interpolator, SurfaceError> {
        Ok(Interpolator::new(self, method)?)
    }

    /// Reads the surface at `(x, y)`.
    ///
    /// With an interpolator the energy is interpolated, but the probability is
    /// always the raw value of the nearest sample.
    pub fn value_at(
        &self,
        x: f64,
        y: f64,
        interpolator: Option<&Interpolator>,
    ) -> Result<SurfaceValue, SurfaceError> {
        let nearest = self.nearest_value(x, y)?;
        match interpolator {
            Some(interpolator) => Ok(SurfaceValue {
                energy: interpolator.evaluate(x, y)?,
                probability: nearest.probability,
            }),
            None => Ok(nearest),
        }
    }
}
