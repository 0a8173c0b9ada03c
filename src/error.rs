//! Functionality for error estimation.
//!
//! The $L^2$ estimators reuse the assembly machinery's interpolation pass but
//! accumulate into a single running scalar instead of a stencil container.

use crate::space::{SplineSpace, TensorProductSpace};
use crate::stencil::StencilVector;
use crate::Error;
use nalgebra::RealField;
use rayon::prelude::*;
use std::sync::Arc;

/// Estimate the $L^2$ error $\|u_h - u\|_{L^2}$ of a 1-D spline field.
#[allow(non_snake_case)]
pub fn estimate_L2_error_1d<T, F>(
    space: &SplineSpace<T>,
    u_exact: F,
    u_h: &StencilVector<T>,
) -> eyre::Result<T>
where
    T: RealField + Copy,
    F: Fn(T) -> T,
{
    if !Arc::ptr_eq(u_h.space(), space.vector_space()) {
        return Err(Error::ShapeMismatch {
            context: "solution vector is not bound to the spline space's vector space",
        }
        .into());
    }

    let p = space.degree();
    let basis = space.basis();
    let mut result = T::zero();

    for ie in 0..space.nelements() {
        let span = space.spans()[ie] as isize;

        for g in 0..space.nquad() {
            let mut value = T::zero();
            for il in 0..=p {
                let i = span - p as isize + il as isize;
                value += u_h.get(&[i]) * basis.value(ie, il, 0, g);
            }
            let x = space.points()[(ie, g)];
            let diff = value - u_exact(x);
            result += diff * diff * space.weights()[(ie, g)];
        }
    }

    Ok(result.sqrt())
}

/// Estimate the $L^2$ error $\|u_h - u\|_{L^2}$ of a 2-D tensor-product
/// spline field.
///
/// Elements are independent for a scalar reduction, so the element loop runs
/// in parallel.
#[allow(non_snake_case)]
pub fn estimate_L2_error_2d<T, F>(
    space: &TensorProductSpace<T>,
    u_exact: F,
    u_h: &StencilVector<T>,
) -> eyre::Result<T>
where
    T: RealField + Copy + Send + Sync,
    F: Fn(T, T) -> T + Sync,
{
    if space.ndim() != 2 {
        return Err(Error::UnsupportedDimension {
            operation: "2-D error estimation",
            ndim: space.ndim(),
        }
        .into());
    }
    if !Arc::ptr_eq(u_h.space(), space.vector_space()) {
        return Err(Error::ShapeMismatch {
            context: "solution vector is not bound to the tensor space's vector space",
        }
        .into());
    }

    let (s1, s2) = (space.space(0), space.space(1));
    let (p1, p2) = (s1.degree(), s2.degree());
    let (ne1, ne2) = (s1.nelements(), s2.nelements());

    let result: T = (0..ne1 * ne2)
        .into_par_iter()
        .map(|e| {
            let (ie1, ie2) = (e / ne2, e % ne2);
            let span1 = s1.spans()[ie1] as isize;
            let span2 = s2.spans()[ie2] as isize;

            let mut element_sum = T::zero();
            for g1 in 0..s1.nquad() {
                for g2 in 0..s2.nquad() {
                    let mut value = T::zero();
                    for il1 in 0..=p1 {
                        let i1 = span1 - p1 as isize + il1 as isize;
                        let b1 = s1.basis().value(ie1, il1, 0, g1);
                        for il2 in 0..=p2 {
                            let i2 = span2 - p2 as isize + il2 as isize;
                            let b2 = s2.basis().value(ie2, il2, 0, g2);
                            value += u_h.get(&[i1, i2]) * b1 * b2;
                        }
                    }

                    let x1 = s1.points()[(ie1, g1)];
                    let x2 = s2.points()[(ie2, g2)];
                    let wvol = s1.weights()[(ie1, g1)] * s2.weights()[(ie2, g2)];
                    let diff = value - u_exact(x1, x2);
                    element_sum += diff * diff * wvol;
                }
            }
            element_sum
        })
        .reduce(T::zero, |a, b| a + b);

    Ok(result.sqrt())
}
