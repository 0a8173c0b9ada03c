//! Kronecker-structured solvers for tensor-product operators.
//!
//! A separable 2-D operator `A = A1 (x) A2` acts on the coefficient grid `X`
//! as `A1 X A2^T`. Its inverse therefore never needs to be formed: applying
//! the inverse amounts to a banded solve along each axis in sequence. This is
//! the discrete backbone for inverting the per-component mass matrices of a
//! de Rham-conforming field without ever materializing a 2-D matrix.

use crate::banded::{BandedLu, BandedMatrix};
use crate::block::BlockOperator;
use crate::operator::StencilOperator;
use crate::stencil::{StencilMatrix, StencilVector, StencilVectorSpace};
use crate::Error;
use nalgebra::{DMatrix, DVector, RealField};
use std::sync::Arc;

/// Inverse of a tensor-product operator `A1 (x) A2`, realized by two banded
/// factorizations and sequential per-axis solves.
pub struct KroneckerSolver<T: RealField> {
    space: Arc<StencilVectorSpace<T>>,
    lu1: BandedLu<T>,
    lu2: BandedLu<T>,
}

impl<T: RealField + Copy> KroneckerSolver<T> {
    /// Factors the two 1-D stencil matrices once and binds the solver to the
    /// given 2-D space.
    ///
    /// The space's global dimensions must match the orders of `a1` and `a2`.
    pub fn new(
        a1: &StencilMatrix<T>,
        a2: &StencilMatrix<T>,
        space: &Arc<StencilVectorSpace<T>>,
    ) -> eyre::Result<Self> {
        if space.ndim() != 2 {
            return Err(Error::UnsupportedDimension {
                operation: "Kronecker solve",
                ndim: space.ndim(),
            }
            .into());
        }
        let n1 = a1.codomain().npts()[0];
        let n2 = a2.codomain().npts()[0];
        if space.npts() != [n1, n2] {
            return Err(Error::ShapeMismatch {
                context: "space dimensions must match the orders of the two 1-D factors",
            }
            .into());
        }

        let lu1 = BandedMatrix::from_stencil(a1)?.factor()?;
        let lu2 = BandedMatrix::from_stencil(a2)?.factor()?;
        log::debug!("built Kronecker solver: {n1} x {n2} unknowns");
        Ok(Self {
            space: Arc::clone(space),
            lu1,
            lu2,
        })
    }
}

impl<T: RealField + Copy> StencilOperator<T> for KroneckerSolver<T> {
    fn domain(&self) -> &Arc<StencilVectorSpace<T>> {
        &self.space
    }

    fn codomain(&self) -> &Arc<StencilVectorSpace<T>> {
        &self.space
    }

    /// Solves `(A1 (x) A2) x = b`.
    ///
    /// With the right-hand side reshaped to the coefficient grid `B`, the
    /// solution is `A1^{-1} B A2^{-T}`: one banded solve per column along the
    /// first axis, then one per row along the second.
    fn apply(&self, b: &StencilVector<T>) -> eyre::Result<StencilVector<T>> {
        if !Arc::ptr_eq(b.space(), &self.space) {
            return Err(Error::ShapeMismatch {
                context: "vector is not bound to the solver's space",
            }
            .into());
        }

        let (n1, n2) = (self.space.npts()[0], self.space.npts()[1]);
        let flat = b.to_dvector();
        let mut grid = DMatrix::from_fn(n1, n2, |i, j| flat[i * n2 + j]);

        // Axis 0: X <- A1^{-1} X
        for j in 0..n2 {
            let mut column = DVector::from_fn(n1, |i, _| grid[(i, j)]);
            self.lu1.solve_in_place(&mut column);
            for i in 0..n1 {
                grid[(i, j)] = column[i];
            }
        }

        // Axis 1: X <- X A2^{-T}
        for i in 0..n1 {
            let mut row = DVector::from_fn(n2, |j, _| grid[(i, j)]);
            self.lu2.solve_in_place(&mut row);
            for j in 0..n2 {
                grid[(i, j)] = row[j];
            }
        }

        let mut out = StencilVector::zeros(&self.space);
        let flat = DVector::from_fn(n1 * n2, |k, _| grid[(k / n2, k % n2)]);
        out.copy_owned_from(&flat)?;
        Ok(out)
    }
}

/// Builds the block-diagonal inverse mass operator of a two-component
/// H(curl) field from per-axis 1-D mass matrices.
///
/// Per the discrete de Rham sequence, the first component lives in the
/// reduced-degree space along axis 0 and the full-degree space along axis 1,
/// and vice versa for the second component. Each component's 2-D mass matrix
/// is therefore the Kronecker product of the matched pair of 1-D mass
/// matrices, and its inverse a [`KroneckerSolver`]:
///
/// - component 0: `mass_1_reduced (x) mass_2`
/// - component 1: `mass_1 (x) mass_2_reduced`
pub fn hcurl_mass_solver<T: RealField + Copy>(
    mass_1: &StencilMatrix<T>,
    mass_1_reduced: &StencilMatrix<T>,
    mass_2: &StencilMatrix<T>,
    mass_2_reduced: &StencilMatrix<T>,
    component_space_0: &Arc<StencilVectorSpace<T>>,
    component_space_1: &Arc<StencilVectorSpace<T>>,
) -> eyre::Result<BlockOperator<T>> {
    let solver_0 = KroneckerSolver::new(mass_1_reduced, mass_2, component_space_0)?;
    let solver_1 = KroneckerSolver::new(mass_1, mass_2_reduced, component_space_1)?;

    let diagonal: Vec<Box<dyn StencilOperator<T>>> = vec![Box::new(solver_0), Box::new(solver_1)];
    Ok(BlockOperator::block_diagonal(diagonal)?)
}
