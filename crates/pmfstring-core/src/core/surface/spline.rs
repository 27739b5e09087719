//! One-dimensional spline building blocks used by the grid interpolators.
//!
//! Interpolating B-splines use not-a-knot knot vectors, so the interior knots
//! are a subset of the data sites and the collocation system is square.
//! The Hermite routines implement the monotonicity-preserving PCHIP scheme of
//! Fritsch and Butland.

use nalgebra::DMatrix;

/// Knot vector of an odd-degree interpolating spline with not-a-knot ends.
///
/// Requires `sites.len() >= degree + 1`.
pub(crate) fn not_a_knot_knots(sites: &[f64], degree: usize) -> Vec<f64> {
    let n = sites.len();
    let m = (degree - 1) / 2;
    let first = sites[0];
    let last = sites[n - 1];

    let mut knots = Vec::with_capacity(n + degree + 1);
    knots.extend(std::iter::repeat_n(first, degree + 1));
    knots.extend_from_slice(&sites[m + 1..n - m - 1]);
    knots.extend(std::iter::repeat_n(last, degree + 1));
    knots
}

/// Index `mu` of the knot span `[t[mu], t[mu + 1])` containing `x`, clamped to
/// the valid range `[degree, n_basis - 1]` so the right endpoint is included.
pub(crate) fn find_span(knots: &[f64], degree: usize, n_basis: usize, x: f64) -> usize {
    let interior = &knots[degree + 1..n_basis];
    degree + interior.partition_point(|&knot| knot <= x)
}

/// Values of the `degree + 1` basis functions that are non-zero on `span`,
/// i.e. `B[span - degree] .. B[span]` evaluated at `x` (Cox-de Boor).
pub(crate) fn basis_functions(knots: &[f64], degree: usize, span: usize, x: f64) -> Vec<f64> {
    let mut values = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    values[0] = 1.0;

    for j in 1..=degree {
        left[j] = x - knots[span + 1 - j];
        right[j] = knots[span + j] - x;
        let mut saved = 0.0;
        for r in 0..j {
            let temp = values[r] / (right[r + 1] + left[j - r]);
            values[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        values[j] = saved;
    }
    values
}

/// Square collocation matrix `A[i][j] = B_j(sites[i])`.
pub(crate) fn collocation_matrix(sites: &[f64], knots: &[f64], degree: usize) -> DMatrix<f64> {
    let n = sites.len();
    let mut matrix = DMatrix::zeros(n, n);
    for (row, &site) in sites.iter().enumerate() {
        let span = find_span(knots, degree, n, site);
        let basis = basis_functions(knots, degree, span, site);
        for (offset, value) in basis.into_iter().enumerate() {
            matrix[(row, span - degree + offset)] = value;
        }
    }
    matrix
}

/// Piecewise cubic Hermite interpolant through `(sites, values)` at `x`.
///
/// With two points this degenerates to linear interpolation.
pub(crate) fn pchip_evaluate(sites: &[f64], values: &[f64], x: f64) -> f64 {
    let n = sites.len();
    let cell = sites.partition_point(|&s| s <= x).clamp(1, n - 1) - 1;

    let h: Vec<f64> = sites.windows(2).map(|w| w[1] - w[0]).collect();
    let slopes: Vec<f64> = values
        .windows(2)
        .zip(&h)
        .map(|(w, &step)| (w[1] - w[0]) / step)
        .collect();

    let d0 = pchip_derivative(&h, &slopes, cell);
    let d1 = pchip_derivative(&h, &slopes, cell + 1);

    let step = h[cell];
    let t = (x - sites[cell]) / step;
    let t2 = t * t;
    let t3 = t2 * t;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    h00 * values[cell] + h10 * step * d0 + h01 * values[cell + 1] + h11 * step * d1
}

fn pchip_derivative(h: &[f64], slopes: &[f64], k: usize) -> f64 {
    let last = slopes.len();
    if last == 1 {
        return slopes[0];
    }
    if k == 0 {
        return pchip_edge(h[0], h[1], slopes[0], slopes[1]);
    }
    if k == last {
        return pchip_edge(
            h[last - 1],
            h[last - 2],
            slopes[last - 1],
            slopes[last - 2],
        );
    }

    let (m_prev, m_next) = (slopes[k - 1], slopes[k]);
    if m_prev == 0.0 || m_next == 0.0 || m_prev.signum() != m_next.signum() {
        return 0.0;
    }
    let w1 = 2.0 * h[k] + h[k - 1];
    let w2 = h[k] + 2.0 * h[k - 1];
    (w1 + w2) / (w1 / m_prev + w2 / m_next)
}

/// One-sided three-point end derivative, limited to keep the shape monotone.
fn pchip_edge(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if d.signum() != m0.signum() || m0 == 0.0 {
        0.0
    } else if m0.signum() != m1.signum() && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}
