//! Quadrature rules and per-element quadrature grids.
//!
//! Rules are tabulated in `f64` by the `sleipnir-quadrature` crate and
//! converted to the working scalar type on the way in.

use crate::nalgebra::{convert, DMatrix, RealField};
use itertools::izip;

/// A univariate quadrature rule: weights and points on `[-1, 1]`.
pub type QuadraturePair<T> = (Vec<T>, Vec<T>);

fn convert_rule_from_f64<T: RealField>(rule: sleipnir_quadrature::Rule) -> QuadraturePair<T> {
    let (weights, points) = rule;
    let weights = weights.into_iter().map(convert).collect();
    let points = points.into_iter().map(convert).collect();
    (weights, points)
}

/// Gauss-Legendre rule with the given number of points on `[-1, 1]`.
pub fn gauss<T: RealField>(num_points: usize) -> QuadraturePair<T> {
    convert_rule_from_f64(sleipnir_quadrature::univariate::gauss(num_points))
}

/// The Gauss-Legendre rule matched to a spline space of the given degree
/// (`degree + 1` points).
pub fn gauss_for_degree<T: RealField>(degree: usize) -> QuadraturePair<T> {
    convert_rule_from_f64(sleipnir_quadrature::univariate::gauss_for_degree(degree))
}

/// Maps a reference rule on `[-1, 1]` onto every element of a 1-D partition.
///
/// Returns `(points, weights)`, both of shape `(nelements, npoints)`: row `ie`
/// holds the physical quadrature points and weights of the element
/// `[breaks[ie], breaks[ie + 1]]`.
pub fn quadrature_grid<T: RealField + Copy>(
    breaks: &[T],
    rule_weights: &[T],
    rule_points: &[T],
) -> (DMatrix<T>, DMatrix<T>) {
    assert_eq!(rule_weights.len(), rule_points.len());
    assert!(breaks.len() >= 2, "at least one element is required");

    let ne = breaks.len() - 1;
    let k = rule_points.len();
    let two = T::one() + T::one();

    let mut points = DMatrix::zeros(ne, k);
    let mut weights = DMatrix::zeros(ne, k);

    for ie in 0..ne {
        let a = breaks[ie];
        let b = breaks[ie + 1];
        let center = (a + b) / two;
        let half_width = (b - a) / two;
        for (g, (&w, &x)) in izip!(rule_weights, rule_points).enumerate() {
            points[(ie, g)] = center + half_width * x;
            weights[(ie, g)] = half_width * w;
        }
    }

    (points, weights)
}
