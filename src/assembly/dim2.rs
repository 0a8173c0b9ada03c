//! Assembly kernels for 2-D tensor-product spline spaces.

use super::BasisValue2d;
use crate::space::TensorProductSpace;
use crate::stencil::{StencilMatrix, StencilVector};
use crate::Error;
use nalgebra::{DMatrix, RealField};
use std::sync::Arc;

fn check_two_dimensional<T: RealField + Copy>(space: &TensorProductSpace<T>) -> Result<(), Error> {
    if space.ndim() != 2 {
        return Err(Error::UnsupportedDimension {
            operation: "2-D assembly",
            ndim: space.ndim(),
        });
    }
    Ok(())
}

fn check_matrix_bound<T: RealField + Copy>(
    space: &TensorProductSpace<T>,
    matrix: &StencilMatrix<T>,
) -> Result<(), Error> {
    let bound = Arc::ptr_eq(matrix.domain(), space.vector_space())
        && Arc::ptr_eq(matrix.codomain(), space.vector_space());
    if bound {
        Ok(())
    } else {
        Err(Error::ShapeMismatch {
            context: "matrix is not bound to the tensor space's vector space",
        })
    }
}

/// Interpolates the coefficient field `u` at every quadrature point of
/// element `(ie1, ie2)`.
///
/// Writes into `values` (shape `nquad1 x nquad2`). This is the pre-pass of
/// every solution-dependent form: local coefficients are gathered once per
/// element and contracted with the tensor-product basis values.
fn interpolate_on_element<T: RealField + Copy>(
    space: &TensorProductSpace<T>,
    u: &StencilVector<T>,
    ie1: usize,
    ie2: usize,
    values: &mut DMatrix<T>,
) {
    let (s1, s2) = (space.space(0), space.space(1));
    let (p1, p2) = (s1.degree(), s2.degree());
    let span1 = s1.spans()[ie1] as isize;
    let span2 = s2.spans()[ie2] as isize;

    values.fill(T::zero());
    for il1 in 0..=p1 {
        for il2 in 0..=p2 {
            let i1 = span1 - p1 as isize + il1 as isize;
            let i2 = span2 - p2 as isize + il2 as isize;
            let coeff = u.get(&[i1, i2]);
            for g1 in 0..s1.nquad() {
                let b1 = s1.basis().value(ie1, il1, 0, g1);
                for g2 in 0..s2.nquad() {
                    let b2 = s2.basis().value(ie2, il2, 0, g2);
                    values[(g1, g2)] += coeff * b1 * b2;
                }
            }
        }
    }
}

/// Assembles the bilinear form defined by `kernel` into `matrix`.
///
/// `kernel` receives the test basis data, the trial basis data and the
/// physical coordinates of the quadrature point.
pub fn assemble_bilinear_2d<T, K>(
    space: &TensorProductSpace<T>,
    kernel: K,
    matrix: &mut StencilMatrix<T>,
) -> eyre::Result<()>
where
    T: RealField + Copy,
    K: Fn(&BasisValue2d<T>, &BasisValue2d<T>, (T, T)) -> T,
{
    check_two_dimensional(space)?;
    check_matrix_bound(space, matrix)?;

    let (s1, s2) = (space.space(0), space.space(1));
    let (p1, p2) = (s1.degree(), s2.degree());
    let (k1, k2) = (s1.nquad(), s2.nquad());

    for ie1 in 0..s1.nelements() {
        let span1 = s1.spans()[ie1] as isize;
        for ie2 in 0..s2.nelements() {
            let span2 = s2.spans()[ie2] as isize;

            for il1 in 0..=p1 {
                for il2 in 0..=p2 {
                    for jl1 in 0..=p1 {
                        for jl2 in 0..=p2 {
                            let i1 = span1 - p1 as isize + il1 as isize;
                            let i2 = span2 - p2 as isize + il2 as isize;
                            let offset1 = jl1 as isize - il1 as isize;
                            let offset2 = jl2 as isize - il2 as isize;

                            let mut value = T::zero();
                            for g1 in 0..k1 {
                                for g2 in 0..k2 {
                                    let bi = BasisValue2d::from_factors(
                                        s1.basis().value(ie1, il1, 0, g1),
                                        s1.basis().value(ie1, il1, 1, g1),
                                        s2.basis().value(ie2, il2, 0, g2),
                                        s2.basis().value(ie2, il2, 1, g2),
                                    );
                                    let bj = BasisValue2d::from_factors(
                                        s1.basis().value(ie1, jl1, 0, g1),
                                        s1.basis().value(ie1, jl1, 1, g1),
                                        s2.basis().value(ie2, jl2, 0, g2),
                                        s2.basis().value(ie2, jl2, 1, g2),
                                    );
                                    let x = (s1.points()[(ie1, g1)], s2.points()[(ie2, g2)]);
                                    let wvol = s1.weights()[(ie1, g1)] * s2.weights()[(ie2, g2)];
                                    value += kernel(&bi, &bj, x) * wvol;
                                }
                            }

                            matrix.add(&[i1, i2], &[offset1, offset2], value)?;
                        }
                    }
                }
            }
        }
    }

    log::debug!(
        "assembled 2-D bilinear form: {} x {} elements, degrees ({}, {})",
        s1.nelements(),
        s2.nelements(),
        p1,
        p2
    );
    Ok(())
}

/// Assembles the stiffness matrix (gradient dot product).
pub fn assemble_stiffness_2d<T: RealField + Copy>(
    space: &TensorProductSpace<T>,
    matrix: &mut StencilMatrix<T>,
) -> eyre::Result<()> {
    assemble_bilinear_2d(space, |bi, bj, _| bi.dx * bj.dx + bi.dy * bj.dy, matrix)
}

/// Assembles the mass matrix (product of values).
pub fn assemble_mass_2d<T: RealField + Copy>(
    space: &TensorProductSpace<T>,
    matrix: &mut StencilMatrix<T>,
) -> eyre::Result<()> {
    assemble_bilinear_2d(space, |bi, bj, _| bi.v * bj.v, matrix)
}

/// Assembles the diffusion operator with a solution-dependent coefficient.
///
/// The current iterate `u` is interpolated at every quadrature point in a
/// pre-pass; `diffusivity` maps the interpolated value to the coefficient
/// scaling the gradient contraction, e.g. `|u| 1 + u * u` for the classic
/// quasilinear model problem.
pub fn assemble_diffusion_2d<T, F>(
    space: &TensorProductSpace<T>,
    u: &StencilVector<T>,
    diffusivity: F,
    matrix: &mut StencilMatrix<T>,
) -> eyre::Result<()>
where
    T: RealField + Copy,
    F: Fn(T) -> T,
{
    check_two_dimensional(space)?;
    check_matrix_bound(space, matrix)?;
    if !Arc::ptr_eq(u.space(), space.vector_space()) {
        return Err(Error::ShapeMismatch {
            context: "coefficient field is not bound to the tensor space's vector space",
        }
        .into());
    }

    let (s1, s2) = (space.space(0), space.space(1));
    let (p1, p2) = (s1.degree(), s2.degree());
    let (k1, k2) = (s1.nquad(), s2.nquad());
    let mut u_values = DMatrix::zeros(k1, k2);

    for ie1 in 0..s1.nelements() {
        let span1 = s1.spans()[ie1] as isize;
        for ie2 in 0..s2.nelements() {
            let span2 = s2.spans()[ie2] as isize;

            interpolate_on_element(space, u, ie1, ie2, &mut u_values);

            for il1 in 0..=p1 {
                for il2 in 0..=p2 {
                    for jl1 in 0..=p1 {
                        for jl2 in 0..=p2 {
                            let i1 = span1 - p1 as isize + il1 as isize;
                            let i2 = span2 - p2 as isize + il2 as isize;
                            let offset1 = jl1 as isize - il1 as isize;
                            let offset2 = jl2 as isize - il2 as isize;

                            let mut value = T::zero();
                            for g1 in 0..k1 {
                                for g2 in 0..k2 {
                                    let bi = BasisValue2d::from_factors(
                                        s1.basis().value(ie1, il1, 0, g1),
                                        s1.basis().value(ie1, il1, 1, g1),
                                        s2.basis().value(ie2, il2, 0, g2),
                                        s2.basis().value(ie2, il2, 1, g2),
                                    );
                                    let bj = BasisValue2d::from_factors(
                                        s1.basis().value(ie1, jl1, 0, g1),
                                        s1.basis().value(ie1, jl1, 1, g1),
                                        s2.basis().value(ie2, jl2, 0, g2),
                                        s2.basis().value(ie2, jl2, 1, g2),
                                    );
                                    let wvol = s1.weights()[(ie1, g1)] * s2.weights()[(ie2, g2)];
                                    let coeff = diffusivity(u_values[(g1, g2)]);
                                    value += coeff * (bi.dx * bj.dx + bi.dy * bj.dy) * wvol;
                                }
                            }

                            matrix.add(&[i1, i2], &[offset1, offset2], value)?;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Assembles the load vector for the source function `f`.
pub fn assemble_rhs_2d<T, F>(
    space: &TensorProductSpace<T>,
    f: F,
    rhs: &mut StencilVector<T>,
) -> eyre::Result<()>
where
    T: RealField + Copy,
    F: Fn(T, T) -> T,
{
    check_two_dimensional(space)?;
    if !Arc::ptr_eq(rhs.space(), space.vector_space()) {
        return Err(Error::ShapeMismatch {
            context: "rhs vector is not bound to the tensor space's vector space",
        }
        .into());
    }

    let (s1, s2) = (space.space(0), space.space(1));
    let (p1, p2) = (s1.degree(), s2.degree());
    let (k1, k2) = (s1.nquad(), s2.nquad());

    for ie1 in 0..s1.nelements() {
        let span1 = s1.spans()[ie1] as isize;
        for ie2 in 0..s2.nelements() {
            let span2 = s2.spans()[ie2] as isize;

            for il1 in 0..=p1 {
                for il2 in 0..=p2 {
                    let i1 = span1 - p1 as isize + il1 as isize;
                    let i2 = span2 - p2 as isize + il2 as isize;

                    let mut value = T::zero();
                    for g1 in 0..k1 {
                        for g2 in 0..k2 {
                            let b = s1.basis().value(ie1, il1, 0, g1)
                                * s2.basis().value(ie2, il2, 0, g2);
                            let x1 = s1.points()[(ie1, g1)];
                            let x2 = s2.points()[(ie2, g2)];
                            let wvol = s1.weights()[(ie1, g1)] * s2.weights()[(ie2, g2)];
                            value += b * f(x1, x2) * wvol;
                        }
                    }

                    rhs.add(&[i1, i2], value);
                }
            }
        }
    }

    Ok(())
}
