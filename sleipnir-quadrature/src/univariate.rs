//! Gauss-Legendre rules for the one-dimensional reference interval `[-1, 1]`.

use crate::Rule;
use std::f64::consts::PI;

/// Evaluates the Legendre polynomial `P_n` and its derivative at `x`.
///
/// Uses the three-term recurrence `m P_m = (2m - 1) x P_{m-1} - (m - 1) P_{m-2}`
/// together with the derivative identity `P_n' = n (x P_n - P_{n-1}) / (x^2 - 1)`,
/// which is only valid in the open interval `(-1, 1)`.
fn legendre_value_and_derivative(n: usize, x: f64) -> (f64, f64) {
    let mut p_curr = 1.0;
    let mut p_prev = 0.0;
    for m in 1..=n {
        let m = m as f64;
        let p_next = ((2.0 * m - 1.0) * x * p_curr - (m - 1.0) * p_prev) / m;
        p_prev = p_curr;
        p_curr = p_next;
    }
    let n = n as f64;
    let dp = n * (x * p_curr - p_prev) / (x * x - 1.0);
    (p_curr, dp)
}

/// Gauss-Legendre quadrature for the reference interval `[-1, 1]`.
///
/// Returns the rule with the given number of points. Given `n` points, the rule
/// integrates polynomials of degree up to `2 n - 1` exactly.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss(num_points: usize) -> Rule {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    let mut weights = vec![0.0; n];
    let mut points = vec![0.0; n];

    // Roots come in +/- pairs, so only the first half needs Newton iteration;
    // the rest follow by symmetry.
    let half = (n + 1) / 2;
    for i in 0..half {
        // Tricomi's asymptotic estimate of the i-th root, accurate enough that
        // Newton converges in a handful of steps
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();

        let mut dp;
        loop {
            let (p, dp_new) = legendre_value_and_derivative(n, x);
            dp = dp_new;
            let dx = -p / dp;
            x += dx;
            if dx.abs() <= 1e-15 {
                break;
            }
        }

        let w = 2.0 / ((1.0 - x * x) * dp * dp);
        points[i] = x;
        weights[i] = w;
        points[n - 1 - i] = -x;
        weights[n - 1 - i] = w;
    }

    (weights, points)
}

/// The Gauss-Legendre rule matched to a spline space of the given degree.
///
/// `degree + 1` points integrate products of two degree-`degree` polynomials
/// (and therefore spline mass and stiffness integrands) exactly on each knot
/// span.
pub fn gauss_for_degree(degree: usize) -> Rule {
    gauss(degree + 1)
}
