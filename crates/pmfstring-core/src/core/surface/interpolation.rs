use super::grid::{GridAxis, Surface};
use super::spline;
use nalgebra::DMatrix;
use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Regular-grid interpolation schemes for the surface energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterpolationMethod {
    Nearest,
    Linear,
    Slinear,
    Cubic,
    Quintic,
    Pchip,
}

static METHOD_NAMES: Map<&'static str, InterpolationMethod> = phf_map! {
    "nearest" => InterpolationMethod::Nearest,
    "linear"  => InterpolationMethod::Linear,
    "slinear" => InterpolationMethod::Slinear,
    "cubic"   => InterpolationMethod::Cubic,
    "quintic" => InterpolationMethod::Quintic,
    "pchip"   => InterpolationMethod::Pchip,
};

impl InterpolationMethod {
    pub const ALL: [InterpolationMethod; 6] = [
        InterpolationMethod::Nearest,
        InterpolationMethod::Linear,
        InterpolationMethod::Slinear,
        InterpolationMethod::Cubic,
        InterpolationMethod::Quintic,
        InterpolationMethod::Pchip,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            InterpolationMethod::Nearest => "nearest",
            InterpolationMethod::Linear => "linear",
            InterpolationMethod::Slinear => "slinear",
            InterpolationMethod::Cubic => "cubic",
            InterpolationMethod::Quintic => "quintic",
            InterpolationMethod::Pchip => "pchip",
        }
    }

    /// Smallest number of grid points per axis the method can work with.
    pub fn min_points(&self) -> usize {
        match self {
            InterpolationMethod::Nearest => 1,
            InterpolationMethod::Linear | InterpolationMethod::Slinear => 2,
            InterpolationMethod::Cubic | InterpolationMethod::Pchip => 4,
            InterpolationMethod::Quintic => 6,
        }
    }

    fn spline_degree(&self) -> Option<usize> {
        match self {
            InterpolationMethod::Slinear => Some(1),
            InterpolationMethod::Cubic => Some(3),
            InterpolationMethod::Quintic => Some(5),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown interpolation method '{0}'. Expected one of: nearest, linear, slinear, cubic, quintic, pchip")]
pub struct ParseInterpolationMethodError(pub String);

impl FromStr for InterpolationMethod {
    type Err = ParseInterpolationMethodError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        METHOD_NAMES
            .get(s.trim().to_lowercase().as_str())
            .copied()
            .ok_or_else(|| ParseInterpolationMethodError(s.to_string()))
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InterpolationError {
    #[error("Method '{method}' needs at least {required} points along the {axis} axis, found {found}")]
    TooFewPoints {
        method: InterpolationMethod,
        axis: char,
        required: usize,
        found: usize,
    },

    #[error("Spline collocation system for the {axis} axis is singular")]
    SingularSystem { axis: char },

    #[error("Point ({x}, {y}) lies outside the interpolation grid")]
    OutOfBounds { x: f64, y: f64 },
}

#[derive(Debug, Clone, PartialEq)]
enum Scheme {
    Nearest,
    Bilinear,
    BSpline {
        degree: usize,
        x_knots: Vec<f64>,
        y_knots: Vec<f64>,
        coefficients: DMatrix<f64>,
    },
    Pchip,
}

/// Continuous energy estimate over the regular grid of a [`Surface`].
///
/// The interpolator keeps its own copy of the axes and energy values, so it
/// stays valid independently of the surface it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolator {
    method: InterpolationMethod,
    x_axis: GridAxis,
    y_axis: GridAxis,
    values: DMatrix<f64>,
    scheme: Scheme,
}

impl Interpolator {
    pub fn new(surface: &Surface, method: InterpolationMethod) -> Result<Self, InterpolationError> {
        let x_axis = surface.x_axis().clone();
        let y_axis = surface.y_axis().clone();

        for (axis, label) in [(&x_axis, 'x'), (&y_axis, 'y')] {
            if axis.len() < method.min_points() {
                return Err(InterpolationError::TooFewPoints {
                    method,
                    axis: label,
                    required: method.min_points(),
                    found: axis.len(),
                });
            }
        }

        let values = surface.energies().clone();
        let scheme = match method {
            InterpolationMethod::Nearest => Scheme::Nearest,
            InterpolationMethod::Linear => Scheme::Bilinear,
            InterpolationMethod::Pchip => Scheme::Pchip,
            InterpolationMethod::Slinear
            | InterpolationMethod::Cubic
            | InterpolationMethod::Quintic => {
                let degree = method.spline_degree().unwrap_or(3);
                Self::fit_tensor_spline(&x_axis, &y_axis, &values, degree)?
            }
        };

        Ok(Self {
            method,
            x_axis,
            y_axis,
            values,
            scheme,
        })
    }

    pub fn method(&self) -> InterpolationMethod {
        self.method
    }

    /// Solves `A_x · C · A_yᵀ = Z` for the tensor-product coefficients `C`.
    fn fit_tensor_spline(
        x_axis: &GridAxis,
        y_axis: &GridAxis,
        values: &DMatrix<f64>,
        degree: usize,
    ) -> Result<Scheme, InterpolationError> {
        let x_knots = spline::not_a_knot_knots(x_axis.values(), degree);
        let y_knots = spline::not_a_knot_knots(y_axis.values(), degree);
        let a_x = spline::collocation_matrix(x_axis.values(), &x_knots, degree);
        let a_y = spline::collocation_matrix(y_axis.values(), &y_knots, degree);

        let partial = a_x
            .lu()
            .solve(values)
            .ok_or(InterpolationError::SingularSystem { axis: 'x' })?;
        let coefficients = a_y
            .lu()
            .solve(&partial.transpose())
            .ok_or(InterpolationError::SingularSystem { axis: 'y' })?
            .transpose();

        Ok(Scheme::BSpline {
            degree,
            x_knots,
            y_knots,
            coefficients,
        })
    }

    pub fn evaluate(&self, x: f64, y: f64) -> Result<f64, InterpolationError> {
        if !(self.x_axis.contains(x) && self.y_axis.contains(y)) {
            return Err(InterpolationError::OutOfBounds { x, y });
        }

        let value = match &self.scheme {
            Scheme::Nearest => self.evaluate_nearest(x, y),
            Scheme::Bilinear => self.evaluate_bilinear(x, y),
            Scheme::BSpline {
                degree,
                x_knots,
                y_knots,
                coefficients,
            } => Self::evaluate_bspline(*degree, x_knots, y_knots, coefficients, x, y),
            Scheme::Pchip => self.evaluate_pchip(x, y),
        };
        Ok(value)
    }

    fn evaluate_nearest(&self, x: f64, y: f64) -> f64 {
        // Bounds were checked, so both lookups succeed.
        let ix = self.x_axis.nearest_index(x).unwrap_or(0);
        let iy = self.y_axis.nearest_index(y).unwrap_or(0);
        self.values[(ix, iy)]
    }

    fn evaluate_bilinear(&self, x: f64, y: f64) -> f64 {
        let xs = self.x_axis.values();
        let ys = self.y_axis.values();
        let i = self.x_axis.cell_index(x);
        let j = self.y_axis.cell_index(y);

        let tx = (x - xs[i]) / (xs[i + 1] - xs[i]);
        let ty = (y - ys[j]) / (ys[j + 1] - ys[j]);

        let v00 = self.values[(i, j)];
        let v10 = self.values[(i + 1, j)];
        let v01 = self.values[(i, j + 1)];
        let v11 = self.values[(i + 1, j + 1)];

        v00 * (1.0 - tx) * (1.0 - ty) + v10 * tx * (1.0 - ty) + v01 * (1.0 - tx) * ty + v11 * tx * ty
    }

    fn evaluate_bspline(
        degree: usize,
        x_knots: &[f64],
        y_knots: &[f64],
        coefficients: &DMatrix<f64>,
        x: f64,
        y: f64,
    ) -> f64 {
        let (nx, ny) = coefficients.shape();
        let span_x = spline::find_span(x_knots, degree, nx, x);
        let span_y = spline::find_span(y_knots, degree, ny, y);
        let basis_x = spline::basis_functions(x_knots, degree, span_x, x);
        let basis_y = spline::basis_functions(y_knots, degree, span_y, y);

        let mut total = 0.0;
        for (a, bx) in basis_x.iter().enumerate() {
            for (b, by) in basis_y.iter().enumerate() {
                total += coefficients[(span_x - degree + a, span_y - degree + b)] * bx * by;
            }
        }
        total
    }

    /// Interpolates along y for every x row, then along x through the row results.
    fn evaluate_pchip(&self, x: f64, y: f64) -> f64 {
        let ys = self.y_axis.values();
        let folded: Vec<f64> = self
            .values
            .row_iter()
            .map(|row| {
                let row_values: Vec<f64> = row.iter().copied().collect();
                spline::pchip_evaluate(ys, &row_values, y)
            })
            .collect();
        spline::pchip_evaluate(self.x_axis.values(), &folded, x)
    }
}
