//! Banded matrix storage and direct factorization.
//!
//! The storage layout is the classic band format: a `(1 + upper + 2 * lower,
//! n)` array where column `j` of the array holds the matrix column `j`, and
//! entry `(i, j)` lives in array row `lower + upper + i - j`. The extra
//! `lower` rows above the band hold the fill-in produced by row pivoting
//! during factorization.

use crate::stencil::StencilMatrix;
use crate::Error;
use eyre::eyre;
use nalgebra::{DMatrix, DVector, RealField};

/// A banded matrix with `lower` sub- and `upper` super-diagonals.
#[derive(Debug, Clone)]
pub struct BandedMatrix<T: RealField> {
    n: usize,
    lower: usize,
    upper: usize,
    data: DMatrix<T>,
}

impl<T: RealField + Copy> BandedMatrix<T> {
    /// A zero banded matrix of order `n`.
    pub fn zeros(n: usize, lower: usize, upper: usize) -> Self {
        Self {
            n,
            lower,
            upper,
            data: DMatrix::zeros(1 + upper + 2 * lower, n),
        }
    }

    /// Extracts the band of a 1-D stencil matrix.
    ///
    /// The lower and upper bandwidths are taken from the actual nonzero
    /// diagonal extent, which may be smaller than the stencil padding. The
    /// matrix must be one-dimensional and non-periodic: a periodic stencil
    /// wraps around and is not banded in the dense sense.
    pub fn from_stencil(matrix: &StencilMatrix<T>) -> Result<Self, Error> {
        if matrix.ndim() != 1 {
            return Err(Error::UnsupportedDimension {
                operation: "band extraction",
                ndim: matrix.ndim(),
            });
        }
        if matrix.domain().periods()[0] || matrix.codomain().periods()[0] {
            return Err(Error::ShapeMismatch {
                context: "band extraction requires a non-periodic stencil matrix",
            });
        }
        if matrix.domain().npts() != matrix.codomain().npts() {
            return Err(Error::ShapeMismatch {
                context: "band extraction requires a square stencil matrix",
            });
        }

        let n = matrix.codomain().npts()[0];
        let pad = matrix.pads()[0] as isize;

        // Nonzero diagonal extent
        let mut lower = 0usize;
        let mut upper = 0usize;
        for i in 0..n as isize {
            for k in -pad..=pad {
                let j = i + k;
                if j < 0 || j >= n as isize {
                    continue;
                }
                if matrix.get(&[i], &[k]) != T::zero() {
                    if k < 0 {
                        lower = lower.max((-k) as usize);
                    } else {
                        upper = upper.max(k as usize);
                    }
                }
            }
        }

        let mut banded = Self::zeros(n, lower, upper);
        for i in 0..n as isize {
            for k in -(lower as isize)..=(upper as isize) {
                let j = i + k;
                if j < 0 || j >= n as isize {
                    continue;
                }
                banded.set(i as usize, j as usize, matrix.get(&[i], &[k]));
            }
        }

        log::debug!("extracted band: n = {n}, bandwidths = ({lower}, {upper})");
        Ok(banded)
    }

    pub fn order(&self) -> usize {
        self.n
    }

    pub fn lower_bandwidth(&self) -> usize {
        self.lower
    }

    pub fn upper_bandwidth(&self) -> usize {
        self.upper
    }

    #[inline]
    fn storage_row(&self, i: usize, j: usize) -> usize {
        self.lower + self.upper + i - j
    }

    /// Whether `(i, j)` lies inside the band (including pivot fill-in rows).
    #[inline]
    fn in_band(&self, i: usize, j: usize) -> bool {
        let (i, j) = (i as isize, j as isize);
        j - i <= (self.upper + self.lower) as isize && i - j <= self.lower as isize
    }

    pub fn get(&self, i: usize, j: usize) -> T {
        if self.in_band(i, j) {
            self.data[(self.storage_row(i, j), j)]
        } else {
            T::zero()
        }
    }

    pub fn set(&mut self, i: usize, j: usize, value: T) {
        assert!(self.in_band(i, j), "entry ({i}, {j}) lies outside the band");
        let row = self.storage_row(i, j);
        self.data[(row, j)] = value;
    }

    /// Materializes the banded matrix densely.
    pub fn to_dense(&self) -> DMatrix<T> {
        let mut dense = DMatrix::zeros(self.n, self.n);
        for j in 0..self.n {
            let i_min = j.saturating_sub(self.upper + self.lower);
            let i_max = (j + self.lower).min(self.n - 1);
            for i in i_min..=i_max {
                dense[(i, j)] = self.get(i, j);
            }
        }
        dense
    }

    /// Factors the matrix as `P A = L U` within the band, with partial
    /// pivoting confined to the `lower` rows below the diagonal.
    pub fn factor(mut self) -> eyre::Result<BandedLu<T>> {
        let n = self.n;
        let lower = self.lower;
        let total_upper = self.upper + self.lower;
        let mut pivots = vec![0usize; n];

        for column in 0..n {
            // Pivot search among the admissible rows below the diagonal
            let last_row = (column + lower).min(n - 1);
            let mut pivot = column;
            let mut pivot_magnitude = self.get(column, column).abs();
            for i in column + 1..=last_row {
                let magnitude = self.get(i, column).abs();
                if magnitude > pivot_magnitude {
                    pivot = i;
                    pivot_magnitude = magnitude;
                }
            }
            pivots[column] = pivot;

            if pivot_magnitude == T::zero() {
                return Err(eyre!("banded factorization failed: zero pivot in column {column}"));
            }

            if pivot != column {
                let last_col = (column + total_upper).min(n - 1);
                for j in column..=last_col {
                    let a = self.get(column, j);
                    let b = self.get(pivot, j);
                    self.set(column, j, b);
                    self.set(pivot, j, a);
                }
            }

            let diag = self.get(column, column);
            for i in column + 1..=last_row {
                let multiplier = self.get(i, column) / diag;
                self.set(i, column, multiplier);
                let last_col = (column + total_upper).min(n - 1);
                for j in column + 1..=last_col {
                    let update = self.get(i, j) - multiplier * self.get(column, j);
                    self.set(i, j, update);
                }
            }
        }

        log::debug!(
            "factored banded matrix: n = {}, bandwidths = ({}, {})",
            n,
            self.lower,
            self.upper
        );
        Ok(BandedLu {
            banded: self,
            pivots,
        })
    }
}

/// A banded LU factorization with partial pivoting.
#[derive(Debug, Clone)]
pub struct BandedLu<T: RealField> {
    banded: BandedMatrix<T>,
    pivots: Vec<usize>,
}

impl<T: RealField + Copy> BandedLu<T> {
    pub fn order(&self) -> usize {
        self.banded.n
    }

    /// Solves `A x = b` in place.
    pub fn solve_in_place(&self, b: &mut DVector<T>) {
        let n = self.banded.n;
        assert_eq!(b.len(), n, "right-hand side length mismatch");
        let lower = self.banded.lower;
        let total_upper = self.banded.upper + self.banded.lower;

        // Forward substitution, applying the row interchanges as recorded
        for column in 0..n {
            let pivot = self.pivots[column];
            if pivot != column {
                b.swap_rows(column, pivot);
            }
            let last_row = (column + lower).min(n - 1);
            for i in column + 1..=last_row {
                let update = b[i] - self.banded.get(i, column) * b[column];
                b[i] = update;
            }
        }

        // Back substitution within the (widened) upper band
        for column in (0..n).rev() {
            let mut value = b[column];
            let last_col = (column + total_upper).min(n - 1);
            for j in column + 1..=last_col {
                value -= self.banded.get(column, j) * b[j];
            }
            b[column] = value / self.banded.get(column, column);
        }
    }

    /// Solves `A x = b`.
    pub fn solve(&self, b: &DVector<T>) -> DVector<T> {
        let mut x = b.clone();
        self.solve_in_place(&mut x);
        x
    }
}
