//! Assembly kernels for 1-D spline spaces.

use super::BasisValue1d;
use crate::space::SplineSpace;
use crate::stencil::{StencilMatrix, StencilVector};
use crate::Error;
use nalgebra::RealField;
use std::sync::Arc;

fn check_bound_to_space<T: RealField + Copy>(
    space: &SplineSpace<T>,
    matrix: &StencilMatrix<T>,
) -> Result<(), Error> {
    let bound = Arc::ptr_eq(matrix.domain(), space.vector_space())
        && Arc::ptr_eq(matrix.codomain(), space.vector_space());
    if bound {
        Ok(())
    } else {
        Err(Error::ShapeMismatch {
            context: "matrix is not bound to the spline space's vector space",
        })
    }
}

/// Assembles the bilinear form defined by `kernel` into `matrix`.
///
/// For every quadrature point, `kernel` receives the test basis data, the
/// trial basis data and the physical coordinate, and returns the integrand
/// value; the element loop handles quadrature weighting and the scatter-add
/// into the stencil band.
pub fn assemble_bilinear_1d<T, K>(
    space: &SplineSpace<T>,
    kernel: K,
    matrix: &mut StencilMatrix<T>,
) -> eyre::Result<()>
where
    T: RealField + Copy,
    K: Fn(&BasisValue1d<T>, &BasisValue1d<T>, T) -> T,
{
    check_bound_to_space(space, matrix)?;

    let p = space.degree();
    let spans = space.spans();
    let basis = space.basis();
    let weights = space.weights();
    let points = space.points();
    let nquad = space.nquad();

    for ie in 0..space.nelements() {
        let span = spans[ie] as isize;

        for il in 0..=p {
            for jl in 0..=p {
                let i = span - p as isize + il as isize;
                let offset = jl as isize - il as isize;

                let mut value = T::zero();
                for g in 0..nquad {
                    let bi = BasisValue1d {
                        v: basis.value(ie, il, 0, g),
                        dx: basis.value(ie, il, 1, g),
                    };
                    let bj = BasisValue1d {
                        v: basis.value(ie, jl, 0, g),
                        dx: basis.value(ie, jl, 1, g),
                    };
                    let x = points[(ie, g)];
                    value += kernel(&bi, &bj, x) * weights[(ie, g)];
                }

                matrix.add(&[i], &[offset], value)?;
            }
        }
    }

    log::debug!(
        "assembled 1-D bilinear form: {} elements, degree {}",
        space.nelements(),
        p
    );
    Ok(())
}

/// Assembles the stiffness matrix (gradient dot product).
pub fn assemble_stiffness_1d<T: RealField + Copy>(
    space: &SplineSpace<T>,
    matrix: &mut StencilMatrix<T>,
) -> eyre::Result<()> {
    assemble_bilinear_1d(space, |bi, bj, _| bi.dx * bj.dx, matrix)
}

/// Assembles the mass matrix (product of values).
pub fn assemble_mass_1d<T: RealField + Copy>(
    space: &SplineSpace<T>,
    matrix: &mut StencilMatrix<T>,
) -> eyre::Result<()> {
    assemble_bilinear_1d(space, |bi, bj, _| bi.v * bj.v, matrix)
}

/// Assembles the load vector for the source function `f`.
pub fn assemble_rhs_1d<T, F>(
    space: &SplineSpace<T>,
    f: F,
    rhs: &mut StencilVector<T>,
) -> eyre::Result<()>
where
    T: RealField + Copy,
    F: Fn(T) -> T,
{
    if !Arc::ptr_eq(rhs.space(), space.vector_space()) {
        return Err(Error::ShapeMismatch {
            context: "rhs vector is not bound to the spline space's vector space",
        }
        .into());
    }

    let p = space.degree();
    let spans = space.spans();
    let basis = space.basis();
    let weights = space.weights();
    let points = space.points();
    let nquad = space.nquad();

    for ie in 0..space.nelements() {
        let span = spans[ie] as isize;

        for il in 0..=p {
            let i = span - p as isize + il as isize;

            let mut value = T::zero();
            for g in 0..nquad {
                let bi = basis.value(ie, il, 0, g);
                let x = points[(ie, g)];
                value += bi * f(x) * weights[(ie, g)];
            }

            rhs.add(&[i], value);
        }
    }

    Ok(())
}
