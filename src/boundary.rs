//! Projectors enforcing homogeneous essential boundary conditions.
//!
//! Boundary conditions are enforced by direct substitution on the coefficient
//! vector: the projectors zero the boundary-adjacent degrees of freedom on
//! the relevant non-periodic sides and leave everything else untouched, so no
//! boundary matrix is ever materialized. Applying a projector twice equals
//! applying it once.

use crate::block::BlockVector;
use crate::operator::StencilOperator;
use crate::stencil::{StencilVector, StencilVectorSpace};
use crate::Error;
use nalgebra::RealField;
use std::sync::Arc;

/// Zeroes the two boundary layers of dimension `dim`.
fn zero_boundary_layers<T: RealField + Copy>(
    v: &mut StencilVector<T>,
    dim: usize,
) -> Result<(), Error> {
    let space = Arc::clone(v.space());
    let npts = space.npts();

    match space.ndim() {
        1 => {
            v.set(&[0], T::zero());
            v.set(&[npts[0] as isize - 1], T::zero());
        }
        2 => {
            let (n1, n2) = (npts[0] as isize, npts[1] as isize);
            if dim == 0 {
                for i2 in 0..n2 {
                    v.set(&[0, i2], T::zero());
                    v.set(&[n1 - 1, i2], T::zero());
                }
            } else {
                for i1 in 0..n1 {
                    v.set(&[i1, 0], T::zero());
                    v.set(&[i1, n2 - 1], T::zero());
                }
            }
        }
        ndim => {
            return Err(Error::UnsupportedDimension {
                operation: "boundary projection",
                ndim,
            })
        }
    }
    Ok(())
}

/// Projector onto the subspace of scalar fields vanishing on the boundary.
///
/// Zeroes the boundary-adjacent coefficient on both sides of every
/// non-periodic dimension.
pub struct DirichletProjector<T: RealField> {
    space: Arc<StencilVectorSpace<T>>,
    dims: Vec<usize>,
}

impl<T: RealField + Copy> DirichletProjector<T> {
    /// Builds the projector for the given space.
    ///
    /// Returns `None` for a fully periodic space: there is no boundary and
    /// hence no boundary condition to enforce. Callers must check for this
    /// sentinel instead of applying blindly.
    pub fn try_new(space: &Arc<StencilVectorSpace<T>>) -> Option<Self> {
        let dims: Vec<usize> = space
            .periods()
            .iter()
            .enumerate()
            .filter(|(_, &periodic)| !periodic)
            .map(|(d, _)| d)
            .collect();
        if dims.is_empty() {
            return None;
        }
        Some(Self {
            space: Arc::clone(space),
            dims,
        })
    }

    /// The non-periodic dimensions whose sides are constrained.
    pub fn constrained_dims(&self) -> &[usize] {
        &self.dims
    }
}

impl<T: RealField + Copy> StencilOperator<T> for DirichletProjector<T> {
    fn domain(&self) -> &Arc<StencilVectorSpace<T>> {
        &self.space
    }

    fn codomain(&self) -> &Arc<StencilVectorSpace<T>> {
        &self.space
    }

    fn apply(&self, v: &StencilVector<T>) -> eyre::Result<StencilVector<T>> {
        if !Arc::ptr_eq(v.space(), &self.space) {
            return Err(Error::ShapeMismatch {
                context: "vector is not bound to the projector's space",
            }
            .into());
        }

        let mut out = v.clone();
        for &dim in &self.dims {
            zero_boundary_layers(&mut out, dim)?;
        }
        Ok(out)
    }
}

/// Projector enforcing homogeneous tangential boundary conditions on a
/// two-component edge-element field.
///
/// The condition `n x E = 0` constrains the component *tangent* to each
/// boundary: on the sides of dimension 1 the tangent is the first component,
/// and on the sides of dimension 0 the second. Component `c` is therefore
/// zeroed on the sides of dimension `1 - c`, and only when that dimension is
/// non-periodic; the side set aligned with the component's own direction is
/// left untouched.
pub struct TangentialProjector<T: RealField> {
    component_spaces: [Arc<StencilVectorSpace<T>>; 2],
}

impl<T: RealField + Copy> TangentialProjector<T> {
    /// Builds the projector from the two component spaces.
    ///
    /// The spaces must agree on periodicity per dimension. Returns `None`
    /// when both dimensions are periodic (no boundary).
    pub fn try_new(
        space_0: &Arc<StencilVectorSpace<T>>,
        space_1: &Arc<StencilVectorSpace<T>>,
    ) -> Option<Self> {
        assert_eq!(space_0.ndim(), 2);
        assert_eq!(space_1.ndim(), 2);
        assert_eq!(
            space_0.periods(),
            space_1.periods(),
            "component spaces must agree on periodicity"
        );

        if space_0.periods().iter().all(|&periodic| periodic) {
            return None;
        }
        Some(Self {
            component_spaces: [Arc::clone(space_0), Arc::clone(space_1)],
        })
    }

    pub fn component_space(&self, c: usize) -> &Arc<StencilVectorSpace<T>> {
        &self.component_spaces[c]
    }

    /// Projects a two-component block vector onto the tangential-BC
    /// subspace.
    pub fn apply(&self, v: &BlockVector<T>) -> eyre::Result<BlockVector<T>> {
        if v.nblocks() != 2 {
            return Err(Error::ShapeMismatch {
                context: "tangential projection expects a two-component block vector",
            }
            .into());
        }

        let mut out = Vec::with_capacity(2);
        for c in 0..2 {
            if !Arc::ptr_eq(v.block(c).space(), &self.component_spaces[c]) {
                return Err(Error::ShapeMismatch {
                    context: "block component is not bound to the projector's component space",
                }
                .into());
            }

            let mut component = v.block(c).clone();
            let constrained_dim = 1 - c;
            if !self.component_spaces[c].periods()[constrained_dim] {
                zero_boundary_layers(&mut component, constrained_dim)?;
            }
            out.push(component);
        }

        Ok(BlockVector::new(out))
    }
}
