//! Stencil-structured linear algebra and assembly for tensor-product B-spline
//! discretizations.
//!
//! The crate is organized around three layers:
//!
//! - leaf evaluation: B-spline basis tabulation ([`bspline`]) and per-element
//!   quadrature grids ([`quadrature`]),
//! - stencil storage: vector spaces, vectors and banded-per-dimension matrices
//!   over tensor-product index sets ([`stencil`]), filled by the element loops
//!   in [`assembly`],
//! - solver adapters: banded factorization ([`banded`]), Kronecker-structured
//!   tensor-product solves ([`solve`]) and block operators ([`block`]), all
//!   exposed through the [`operator::StencilOperator`] interface together with
//!   the boundary projectors in [`boundary`].

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod assembly;
pub mod banded;
pub mod block;
pub mod boundary;
pub mod bspline;
pub mod error;
pub mod operator;
pub mod quadrature;
pub mod solve;
pub mod space;
pub mod stencil;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

/// Identifies a row or column of a block operator grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockAxis {
    Row,
    Column,
}

impl Display for BlockAxis {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row => write!(f, "row"),
            Self::Column => write!(f, "column"),
        }
    }
}

/// Library-wide error type.
///
/// Every variant indicates a structural configuration error, not a transient
/// condition: callers are expected to propagate rather than retry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Dimensionality or padding disagreement between spaces or operands.
    ShapeMismatch { context: &'static str },
    /// A write targeted a diagonal offset outside the representable band.
    OutOfBandwidth {
        dim: usize,
        offset: isize,
        pad: usize,
    },
    /// A block operator row or column contains no populated block.
    EmptyBlock { axis: BlockAxis, index: usize },
    /// The operation is only implemented for a restricted number of
    /// dimensions, and was invoked outside that range.
    UnsupportedDimension {
        operation: &'static str,
        ndim: usize,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { context } => {
                write!(f, "shape mismatch: {context}")
            }
            Self::OutOfBandwidth { dim, offset, pad } => {
                write!(
                    f,
                    "offset {offset} in dimension {dim} is outside the stencil band (pad = {pad})"
                )
            }
            Self::EmptyBlock { axis, index } => {
                write!(f, "block {axis} {index} contains no populated block")
            }
            Self::UnsupportedDimension { operation, ndim } => {
                write!(f, "{operation} is not implemented for {ndim}-dimensional spaces")
            }
        }
    }
}

impl std::error::Error for Error {}
