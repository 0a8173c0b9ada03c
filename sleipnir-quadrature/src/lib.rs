//! Univariate quadrature rules for spline finite element applications.
//!
//! The main purpose of this crate is to support the `sleipnir` isogeometric
//! analysis library, which integrates element-by-element over the knot spans of
//! a B-spline patch. The rules here are plain `f64` data and carry no further
//! dependencies, so they may also be used completely independently of
//! `sleipnir`.

pub mod univariate;

/// A univariate quadrature rule: weights and points on the reference
/// interval `[-1, 1]`.
pub type Rule = (Vec<f64>, Vec<f64>);
