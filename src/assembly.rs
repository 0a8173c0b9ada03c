//! Quadrature-based assembly of stencil matrices and vectors.
//!
//! The kernels follow the classical local-to-global protocol: loop over mesh
//! elements, evaluate the integrand from tabulated basis values at the
//! element's quadrature points, and scatter-add the local contribution into
//! the caller-supplied stencil container. Bilinear forms are parameterized by
//! a closure of the test/trial basis data, so stiffness and mass matrices are
//! thin wrappers around one generic element loop.

use nalgebra::RealField;

pub mod dim1;
pub mod dim2;

/// Value and derivative of one basis function at one quadrature point.
#[derive(Debug, Clone, Copy)]
pub struct BasisValue1d<T> {
    pub v: T,
    pub dx: T,
}

/// Value and gradient of one tensor-product basis function at one quadrature
/// point.
#[derive(Debug, Clone, Copy)]
pub struct BasisValue2d<T> {
    pub v: T,
    pub dx: T,
    pub dy: T,
}

impl<T: RealField + Copy> BasisValue2d<T> {
    /// Combines two 1-D basis evaluations into the tensor-product value and
    /// gradient.
    #[inline]
    pub fn from_factors(b1: T, d1: T, b2: T, d2: T) -> Self {
        Self {
            v: b1 * b2,
            dx: d1 * b2,
            dy: b1 * d2,
        }
    }
}
