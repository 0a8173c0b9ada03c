//! A capability interface for linear operators on stencil vectors.
//!
//! Boundary projectors, Kronecker solvers and stencil matrices all expose the
//! same `{domain, codomain, apply}` contract, so they compose transparently
//! in an operator pipeline without an inheritance hierarchy.

use crate::stencil::{StencilMatrix, StencilVector, StencilVectorSpace};
use crate::Error;
use eyre::eyre;
use nalgebra::{DMatrix, RealField};
use std::sync::Arc;

/// A linear operator mapping one stencil space into another.
pub trait StencilOperator<T: RealField> {
    fn domain(&self) -> &Arc<StencilVectorSpace<T>>;

    fn codomain(&self) -> &Arc<StencilVectorSpace<T>>;

    /// Applies the operator to a vector bound to the domain space.
    fn apply(&self, v: &StencilVector<T>) -> eyre::Result<StencilVector<T>>;
}

impl<T: RealField + Copy> StencilOperator<T> for StencilMatrix<T> {
    fn domain(&self) -> &Arc<StencilVectorSpace<T>> {
        StencilMatrix::domain(self)
    }

    fn codomain(&self) -> &Arc<StencilVectorSpace<T>> {
        StencilMatrix::codomain(self)
    }

    /// Stencil matrix-vector product over the owned region.
    ///
    /// Halo reads supply zeros for non-periodic dimensions and wrap around
    /// for periodic ones, so no boundary special-casing is needed.
    fn apply(&self, v: &StencilVector<T>) -> eyre::Result<StencilVector<T>> {
        if !Arc::ptr_eq(v.space(), StencilMatrix::domain(self)) {
            return Err(Error::ShapeMismatch {
                context: "vector is not bound to the operator's domain space",
            }
            .into());
        }

        let codomain = StencilMatrix::codomain(self);
        let mut out = StencilVector::zeros(codomain);
        let npts = codomain.npts();
        let pads = codomain.pads();

        match codomain.ndim() {
            1 => {
                let (n, p) = (npts[0] as isize, pads[0] as isize);
                for i in 0..n {
                    let mut sum = T::zero();
                    for k in -p..=p {
                        sum += self.get(&[i], &[k]) * v.get(&[i + k]);
                    }
                    out.set(&[i], sum);
                }
            }
            2 => {
                let (n1, p1) = (npts[0] as isize, pads[0] as isize);
                let (n2, p2) = (npts[1] as isize, pads[1] as isize);
                for i1 in 0..n1 {
                    for i2 in 0..n2 {
                        let mut sum = T::zero();
                        for k1 in -p1..=p1 {
                            for k2 in -p2..=p2 {
                                sum += self.get(&[i1, i2], &[k1, k2]) * v.get(&[i1 + k1, i2 + k2]);
                            }
                        }
                        out.set(&[i1, i2], sum);
                    }
                }
            }
            ndim => {
                return Err(Error::UnsupportedDimension {
                    operation: "stencil matrix-vector product",
                    ndim,
                }
                .into())
            }
        }

        Ok(out)
    }
}

/// Materializes any stencil operator as a dense matrix by applying it to
/// every unit vector of its domain.
///
/// Only implemented for one- and two-dimensional spaces. Each column is built
/// from a fresh unit vector, so no caller-visible buffer is ever aliased.
pub fn to_dense<T: RealField + Copy>(op: &dyn StencilOperator<T>) -> eyre::Result<DMatrix<T>> {
    let domain = op.domain();
    let codomain = op.codomain();
    if domain.ndim() > 2 {
        return Err(Error::UnsupportedDimension {
            operation: "dense operator materialization",
            ndim: domain.ndim(),
        }
        .into());
    }

    let nrows = codomain.dimension();
    let ncols = domain.dimension();
    let mut dense = DMatrix::zeros(nrows, ncols);

    for j in 0..ncols {
        let index = match domain.ndim() {
            1 => vec![j],
            2 => vec![j / domain.npts()[1], j % domain.npts()[1]],
            _ => unreachable!(),
        };
        let e_j = StencilVector::unit(domain, &index)?;
        let column = op.apply(&e_j)?;
        if column.space().dimension() != nrows {
            return Err(eyre!("operator produced a vector outside its codomain"));
        }
        dense.set_column(j, &column.to_dvector());
    }

    Ok(dense)
}
