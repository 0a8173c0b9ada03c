//! Spline discretization spaces.
//!
//! A [`SplineSpace`] bundles everything the assembly kernels consume for one
//! tensor-product dimension: the knot sequence, the span of every element and
//! the basis values/derivatives tabulated on the per-element quadrature grid.
//! [`TensorProductSpace`] composes several 1-D spaces into one stencil vector
//! space.

use crate::bspline::{self, BasisTable};
use crate::quadrature;
use crate::stencil::StencilVectorSpace;
use nalgebra::{DMatrix, RealField};
use std::sync::Arc;

/// A 1-D B-spline space discretized for quadrature-based assembly.
#[derive(Debug, Clone)]
pub struct SplineSpace<T: RealField> {
    degree: usize,
    periodic: bool,
    knots: Vec<T>,
    breaks: Vec<T>,
    spans: Vec<usize>,
    points: DMatrix<T>,
    weights: DMatrix<T>,
    basis: BasisTable<T>,
    nbasis: usize,
    vector_space: Arc<StencilVectorSpace<T>>,
}

impl<T: RealField + Copy> SplineSpace<T> {
    /// An open spline space of the given degree on a uniform partition of
    /// `[0, 1]` into `nelements` elements, with first derivatives tabulated.
    pub fn with_uniform_grid(degree: usize, nelements: usize) -> Self {
        let breaks: Vec<T> = (0..=nelements)
            .map(|i| T::from_usize(i).unwrap() / T::from_usize(nelements).unwrap())
            .collect();
        Self::from_breaks(degree, breaks, false, 1)
    }

    /// A spline space on the given breakpoints.
    ///
    /// `nders` is the highest derivative order tabulated on the quadrature
    /// grid. The quadrature rule is the degree-matched Gauss-Legendre rule.
    pub fn from_breaks(degree: usize, breaks: Vec<T>, periodic: bool, nders: usize) -> Self {
        let knots = bspline::make_knots(&breaks, degree, periodic);
        let spans = bspline::elements_spans(&knots, degree);
        let nelements = breaks.len() - 1;
        assert_eq!(spans.len(), nelements);

        // For a periodic space the last `degree` basis functions are
        // identified with the first ones
        let nbasis = if periodic {
            nelements
        } else {
            knots.len() - degree - 1
        };

        let (rule_weights, rule_points) = quadrature::gauss_for_degree::<T>(degree);
        let (points, weights) = quadrature::quadrature_grid(&breaks, &rule_weights, &rule_points);
        let basis = BasisTable::on_quad_grid(&knots, degree, &points, nders);

        let vector_space =
            StencilVectorSpace::new(vec![nbasis], vec![degree], vec![periodic]).unwrap();

        Self {
            degree,
            periodic,
            knots,
            breaks,
            spans,
            points,
            weights,
            basis,
            nbasis,
            vector_space,
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn periodic(&self) -> bool {
        self.periodic
    }

    pub fn knots(&self) -> &[T] {
        &self.knots
    }

    pub fn breaks(&self) -> &[T] {
        &self.breaks
    }

    /// Knot span of every element.
    pub fn spans(&self) -> &[usize] {
        &self.spans
    }

    pub fn nelements(&self) -> usize {
        self.breaks.len() - 1
    }

    /// Number of (independent) basis functions.
    pub fn nbasis(&self) -> usize {
        self.nbasis
    }

    /// Quadrature points, shape `(nelements, npoints)`.
    pub fn points(&self) -> &DMatrix<T> {
        &self.points
    }

    /// Quadrature weights, shape `(nelements, npoints)`.
    pub fn weights(&self) -> &DMatrix<T> {
        &self.weights
    }

    /// Number of quadrature points per element.
    pub fn nquad(&self) -> usize {
        self.points.ncols()
    }

    pub fn basis(&self) -> &BasisTable<T> {
        &self.basis
    }

    /// The stencil vector space holding coefficient vectors of this space.
    pub fn vector_space(&self) -> &Arc<StencilVectorSpace<T>> {
        &self.vector_space
    }
}

/// A tensor product of 1-D spline spaces.
#[derive(Debug, Clone)]
pub struct TensorProductSpace<T: RealField> {
    spaces: Vec<SplineSpace<T>>,
    vector_space: Arc<StencilVectorSpace<T>>,
}

impl<T: RealField + Copy> TensorProductSpace<T> {
    pub fn new(spaces: Vec<SplineSpace<T>>) -> Self {
        assert!(!spaces.is_empty());
        let npts = spaces.iter().map(|s| s.nbasis()).collect();
        let pads = spaces.iter().map(|s| s.degree()).collect();
        let periods = spaces.iter().map(|s| s.periodic()).collect();
        let vector_space = StencilVectorSpace::new(npts, pads, periods).unwrap();
        Self {
            spaces,
            vector_space,
        }
    }

    pub fn ndim(&self) -> usize {
        self.spaces.len()
    }

    /// The 1-D space along dimension `d`.
    pub fn space(&self, d: usize) -> &SplineSpace<T> {
        &self.spaces[d]
    }

    pub fn spaces(&self) -> &[SplineSpace<T>] {
        &self.spaces
    }

    pub fn vector_space(&self) -> &Arc<StencilVectorSpace<T>> {
        &self.vector_space
    }
}
