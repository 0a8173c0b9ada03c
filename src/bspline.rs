//! B-spline knot sequences and basis evaluation.
//!
//! The routines here produce the numeric inputs consumed by the assembly
//! kernels: knot sequences, the span of every mesh element, and tabulated
//! basis values/derivatives on a per-element quadrature grid.

use nalgebra::{DMatrix, RealField};
use serde::{Deserialize, Serialize};

/// Constructs the knot sequence for a spline space of the given degree over
/// the breakpoints `breaks`.
///
/// For an open (clamped) space the first and last breakpoints are repeated
/// `degree` additional times. For a periodic space the breakpoints are
/// extended by periodicity on both sides instead. Either way the returned
/// sequence has length `len(breaks) + 2 * degree`.
///
/// # Panics
///
/// Panics if fewer than two breakpoints are given or if they are not strictly
/// increasing.
pub fn make_knots<T: RealField + Copy>(breaks: &[T], degree: usize, periodic: bool) -> Vec<T> {
    assert!(breaks.len() >= 2, "at least two breakpoints are required");
    assert!(
        breaks.windows(2).all(|w| w[0] < w[1]),
        "breakpoints must be strictly increasing"
    );

    let nb = breaks.len();
    let mut knots = Vec::with_capacity(nb + 2 * degree);

    if periodic {
        assert!(
            nb > degree,
            "a periodic space needs more breakpoints than its degree"
        );
        let period = breaks[nb - 1] - breaks[0];
        for i in 0..degree {
            knots.push(breaks[nb - 1 - degree + i] - period);
        }
        knots.extend_from_slice(breaks);
        for i in 0..degree {
            knots.push(breaks[1 + i] + period);
        }
    } else {
        for _ in 0..degree {
            knots.push(breaks[0]);
        }
        knots.extend_from_slice(breaks);
        for _ in 0..degree {
            knots.push(breaks[nb - 1]);
        }
    }

    knots
}

/// Extracts the breakpoints (distinct interior knot values) from a knot
/// sequence.
pub fn breakpoints<T: RealField + Copy>(knots: &[T], degree: usize) -> Vec<T> {
    let mut breaks: Vec<T> = Vec::new();
    for &t in &knots[degree..knots.len() - degree] {
        if breaks.last().map_or(true, |&last| t != last) {
            breaks.push(t);
        }
    }
    breaks
}

/// Finds the knot span index containing `x`.
///
/// The span of `x` is the index `i` such that `knots[i] <= x < knots[i + 1]`,
/// clamped so that points on (or beyond) the domain boundaries are assigned
/// to the first or last non-empty span.
pub fn find_span<T: RealField + Copy>(knots: &[T], degree: usize, x: T) -> usize {
    let low = degree;
    let high = knots.len() - 1 - degree;

    if x <= knots[low] {
        return low;
    }
    if x >= knots[high] {
        return high - 1;
    }

    let (mut low, mut high) = (low, high);
    let mut span = (low + high) / 2;
    while x < knots[span] || x >= knots[span + 1] {
        if x < knots[span] {
            high = span;
        } else {
            low = span;
        }
        span = (low + high) / 2;
    }
    span
}

/// Returns the knot span of every element of the partition underlying `knots`.
pub fn elements_spans<T: RealField + Copy>(knots: &[T], degree: usize) -> Vec<usize> {
    let ne = breakpoints(knots, degree).len() - 1;
    let mut spans = Vec::with_capacity(ne);
    for ik in degree..knots.len() - degree - 1 {
        if knots[ik] != knots[ik + 1] {
            spans.push(ik);
        }
        if spans.len() == ne {
            break;
        }
    }
    spans
}

/// Evaluates the `degree + 1` basis functions that do not vanish on the span
/// of `x`, using the Cox-de Boor recursion.
pub fn basis_funs<T: RealField + Copy>(knots: &[T], degree: usize, x: T, span: usize) -> Vec<T> {
    let mut left = vec![T::zero(); degree];
    let mut right = vec![T::zero(); degree];
    let mut values = vec![T::zero(); degree + 1];

    values[0] = T::one();
    for j in 0..degree {
        left[j] = x - knots[span - j];
        right[j] = knots[span + 1 + j] - x;
        let mut saved = T::zero();
        for r in 0..=j {
            let temp = values[r] / (right[r] + left[j - r]);
            values[r] = saved + right[r] * temp;
            saved = left[j - r] * temp;
        }
        values[j + 1] = saved;
    }

    values
}

/// Evaluates the nonvanishing basis functions and their derivatives up to
/// order `nders` at `x`.
///
/// Returns a matrix of shape `(nders + 1, degree + 1)` whose entry `(d, j)`
/// is the `d`-th derivative of the `j`-th nonvanishing basis function. The
/// computation shares the knot-difference table between the value and
/// derivative triangles, so requesting derivatives costs little beyond the
/// plain evaluation.
pub fn basis_funs_all_ders<T: RealField + Copy>(
    knots: &[T],
    degree: usize,
    x: T,
    span: usize,
    nders: usize,
) -> DMatrix<T> {
    let p = degree;
    let n = nders.min(p);

    let mut left = vec![T::zero(); p];
    let mut right = vec![T::zero(); p];
    // ndu holds basis values in its upper triangle and reciprocal knot
    // differences in its lower triangle
    let mut ndu = DMatrix::<T>::zeros(p + 1, p + 1);
    let mut a = DMatrix::<T>::zeros(2, p + 1);
    let mut ders = DMatrix::<T>::zeros(nders + 1, p + 1);

    ndu[(0, 0)] = T::one();
    for j in 0..p {
        left[j] = x - knots[span - j];
        right[j] = knots[span + 1 + j] - x;
        let mut saved = T::zero();
        for r in 0..=j {
            ndu[(j + 1, r)] = T::one() / (right[r] + left[j - r]);
            let temp = ndu[(r, j)] * ndu[(j + 1, r)];
            ndu[(r, j + 1)] = saved + right[r] * temp;
            saved = left[j - r] * temp;
        }
        ndu[(j + 1, j + 1)] = saved;
    }

    for j in 0..=p {
        ders[(0, j)] = ndu[(j, p)];
    }

    for r in 0..=p {
        let mut s1 = 0;
        let mut s2 = 1;
        a[(0, 0)] = T::one();

        for k in 1..=n {
            let mut d = T::zero();
            let rk = r as isize - k as isize;
            let pk = p - k;

            if r >= k {
                let rk = rk as usize;
                a[(s2, 0)] = a[(s1, 0)] * ndu[(pk + 1, rk)];
                d = a[(s2, 0)] * ndu[(rk, pk)];
            }

            let j1 = if rk >= -1 { 1 } else { (-rk) as usize };
            let j2 = if r <= pk + 1 { k - 1 } else { p - r };
            for j in j1..=j2 {
                let rkj = (rk + j as isize) as usize;
                a[(s2, j)] = (a[(s1, j)] - a[(s1, j - 1)]) * ndu[(pk + 1, rkj)];
                d += a[(s2, j)] * ndu[(rkj, pk)];
            }

            if r <= pk {
                a[(s2, k)] = -a[(s1, k - 1)] * ndu[(pk + 1, r)];
                d += a[(s2, k)] * ndu[(r, pk)];
            }

            ders[(k, r)] = d;
            std::mem::swap(&mut s1, &mut s2);
        }
    }

    // Scale by p! / (p - k)!
    let mut factor = T::from_usize(p).unwrap();
    for k in 1..=n {
        for j in 0..=p {
            ders[(k, j)] *= factor;
        }
        factor *= T::from_usize(p - k).unwrap();
    }

    ders
}

/// Returns the Greville abscissae of the spline space defined by `knots`.
///
/// The `i`-th abscissa is the average of the `degree` knots following knot
/// `i`. Requires `degree >= 1`.
pub fn greville<T: RealField + Copy>(knots: &[T], degree: usize) -> Vec<T> {
    assert!(degree >= 1, "Greville abscissae require degree >= 1");
    let n = knots.len() - degree - 1;
    let inv_p = T::one() / T::from_usize(degree).unwrap();
    (0..n)
        .map(|i| {
            let mut sum = T::zero();
            for j in 1..=degree {
                sum += knots[i + j];
            }
            sum * inv_p
        })
        .collect()
}

/// Evaluates the spline curve with control coefficients `coeffs` at `x`.
pub fn point_on_spline_curve<T: RealField + Copy>(knots: &[T], coeffs: &[T], x: T) -> T {
    let degree = knots.len() - coeffs.len() - 1;
    let span = find_span(knots, degree, x);
    let b = basis_funs(knots, degree, x, span);

    let mut value = T::zero();
    for (k, &bk) in b.iter().enumerate() {
        value += bk * coeffs[span - degree + k];
    }
    value
}

/// Evaluates the tensor-product spline surface with coefficients `coeffs`
/// (shape `nbasis1 x nbasis2`) at `(x, y)`.
pub fn point_on_spline_surface<T: RealField + Copy>(
    knots1: &[T],
    knots2: &[T],
    coeffs: &DMatrix<T>,
    x: T,
    y: T,
) -> T {
    let p1 = knots1.len() - coeffs.nrows() - 1;
    let p2 = knots2.len() - coeffs.ncols() - 1;

    let span1 = find_span(knots1, p1, x);
    let span2 = find_span(knots2, p2, y);
    let b1 = basis_funs(knots1, p1, x, span1);
    let b2 = basis_funs(knots2, p2, y, span2);

    let mut value = T::zero();
    for (k1, &bk1) in b1.iter().enumerate() {
        for (k2, &bk2) in b2.iter().enumerate() {
            value += bk1 * bk2 * coeffs[(span1 - p1 + k1, span2 - p2 + k2)];
        }
    }
    value
}

/// Basis values and derivatives tabulated on a per-element quadrature grid.
///
/// Entry `(ie, il, d, g)` is the `d`-th derivative of the `il`-th
/// nonvanishing basis function, evaluated at quadrature point `g` of element
/// `ie`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasisTable<T> {
    data: Vec<T>,
    nelements: usize,
    nlocal: usize,
    nders: usize,
    npoints: usize,
}

impl<T: RealField + Copy> BasisTable<T> {
    /// Tabulates basis values and derivatives up to order `nders` at every
    /// quadrature point of every element.
    ///
    /// `points` has shape `(nelements, npoints)`, as produced by
    /// [`crate::quadrature::quadrature_grid`].
    pub fn on_quad_grid(knots: &[T], degree: usize, points: &DMatrix<T>, nders: usize) -> Self {
        let nelements = points.nrows();
        let npoints = points.ncols();
        let nlocal = degree + 1;
        let mut data = vec![T::zero(); nelements * nlocal * (nders + 1) * npoints];

        for ie in 0..nelements {
            for g in 0..npoints {
                let x = points[(ie, g)];
                let span = find_span(knots, degree, x);
                let ders = basis_funs_all_ders(knots, degree, x, span, nders);
                for il in 0..nlocal {
                    for d in 0..=nders {
                        let idx = ((ie * nlocal + il) * (nders + 1) + d) * npoints + g;
                        data[idx] = ders[(d, il)];
                    }
                }
            }
        }

        Self {
            data,
            nelements,
            nlocal,
            nders,
            npoints,
        }
    }

    pub fn nelements(&self) -> usize {
        self.nelements
    }

    /// Number of nonvanishing basis functions per element (`degree + 1`).
    pub fn nlocal(&self) -> usize {
        self.nlocal
    }

    /// Highest tabulated derivative order.
    pub fn nders(&self) -> usize {
        self.nders
    }

    pub fn npoints(&self) -> usize {
        self.npoints
    }

    /// The `der`-th derivative of local basis function `il` at quadrature
    /// point `g` of element `ie`.
    #[inline]
    pub fn value(&self, ie: usize, il: usize, der: usize, g: usize) -> T {
        debug_assert!(ie < self.nelements && il < self.nlocal);
        debug_assert!(der <= self.nders && g < self.npoints);
        self.data[((ie * self.nlocal + il) * (self.nders + 1) + der) * self.npoints + g]
    }
}
