//! Stencil-format vector spaces, vectors and matrices on tensor-product
//! index sets.
//!
//! A stencil space describes one index range per tensor-product dimension,
//! together with a halo padding equal to the spline degree. Vectors own a
//! dense buffer over the padded range; matrices store one value per
//! `(row, diagonal offset)` pair instead of `(row, col)`, exploiting the
//! bounded bandwidth induced by the finite support of B-spline basis
//! functions.

use crate::Error;
use itertools::izip;
use nalgebra::{DMatrix, DVector, RealField};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;

/// Translates a logical index along one dimension into a coordinate of the
/// padded buffer.
///
/// For a periodic dimension the index is first wrapped into the owned range
/// `[0, npts)`, so scatter-adds from wrap-around stencil reach land directly
/// on the owned entries. For a non-periodic dimension the halo range
/// `[start - pad, end + pad]` is admissible.
///
/// This is the only place where the `index - start + pad` shift occurs.
///
/// # Panics
///
/// Panics if a non-periodic index lies outside the padded range.
#[inline]
pub fn buffer_coord(
    index: isize,
    start: usize,
    end: usize,
    pad: usize,
    npts: usize,
    periodic: bool,
) -> usize {
    if periodic {
        let wrapped = index.rem_euclid(npts as isize) as usize;
        wrapped - start + pad
    } else {
        let shifted = index - start as isize + pad as isize;
        let size = end - start + 2 * pad + 1;
        assert!(
            shifted >= 0 && (shifted as usize) < size,
            "index {index} outside the padded range of a non-periodic dimension"
        );
        shifted as usize
    }
}

/// Flattens multi-dimensional buffer coordinates in row-major order.
#[inline]
fn ravel(coords: &[usize], shape: &[usize]) -> usize {
    debug_assert_eq!(coords.len(), shape.len());
    let mut flat = 0;
    for (&c, &s) in coords.iter().zip(shape) {
        debug_assert!(c < s);
        flat = flat * s + c;
    }
    flat
}

/// Splits a flat row-major index into per-dimension coordinates.
fn unravel(mut flat: usize, shape: &[usize], coords: &mut [usize]) {
    for (c, &s) in coords.iter_mut().zip(shape).rev() {
        *c = flat % s;
        flat /= s;
    }
    debug_assert_eq!(flat, 0);
}

/// Invokes `f` for every owned multi-index, in row-major order.
fn for_each_owned<F: FnMut(&[usize])>(starts: &[usize], ends: &[usize], mut f: F) {
    let ndim = starts.len();
    let mut index: Vec<usize> = starts.to_vec();
    loop {
        f(&index);
        // Row-major odometer increment
        let mut dim = ndim;
        loop {
            if dim == 0 {
                return;
            }
            dim -= 1;
            if index[dim] < ends[dim] {
                index[dim] += 1;
                break;
            }
            index[dim] = starts[dim];
        }
    }
}

/// Vector space in n-dimensional stencil format.
///
/// Per dimension: the global number of points, the halo padding (equal to the
/// spline degree) and the periodicity. The `starts`/`ends` fields describe the
/// owned index range; in the serial case this is always `[0, npts - 1]`, but
/// the fields are kept so that a partitioned decomposition does not require a
/// different storage layout.
///
/// Spaces are shared behind [`Arc`]; two vectors interoperate only when they
/// are bound to the *same* space object, not merely to equal shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StencilVectorSpace<T> {
    npts: Vec<usize>,
    pads: Vec<usize>,
    periods: Vec<bool>,
    starts: Vec<usize>,
    ends: Vec<usize>,
    marker: PhantomData<T>,
}

impl<T: RealField + Copy> StencilVectorSpace<T> {
    /// Creates a serial stencil space.
    ///
    /// Fails with [`Error::ShapeMismatch`] if the per-dimension argument
    /// lengths differ.
    pub fn new(npts: Vec<usize>, pads: Vec<usize>, periods: Vec<bool>) -> Result<Arc<Self>, Error> {
        if npts.len() != pads.len() || npts.len() != periods.len() {
            return Err(Error::ShapeMismatch {
                context: "npts, pads and periods must have one entry per dimension",
            });
        }
        assert!(npts.iter().all(|&n| n > 0), "every dimension must be nonempty");

        let starts = vec![0; npts.len()];
        let ends = npts.iter().map(|&n| n - 1).collect();
        Ok(Arc::new(Self {
            npts,
            pads,
            periods,
            starts,
            ends,
            marker: PhantomData,
        }))
    }

    /// The total number of degrees of freedom.
    pub fn dimension(&self) -> usize {
        self.npts.iter().product()
    }

    pub fn ndim(&self) -> usize {
        self.npts.len()
    }

    pub fn npts(&self) -> &[usize] {
        &self.npts
    }

    pub fn pads(&self) -> &[usize] {
        &self.pads
    }

    pub fn periods(&self) -> &[bool] {
        &self.periods
    }

    pub fn starts(&self) -> &[usize] {
        &self.starts
    }

    pub fn ends(&self) -> &[usize] {
        &self.ends
    }

    /// Buffer extent per dimension: owned range plus halo on both sides.
    fn buffer_shape(&self) -> Vec<usize> {
        izip!(&self.starts, &self.ends, &self.pads)
            .map(|(&s, &e, &p)| e - s + 2 * p + 1)
            .collect()
    }
}

/// Vector in n-dimensional stencil format.
///
/// Owns a dense buffer over its space's padded index range. The halo cells
/// exist so that assembly can scatter-add without per-write bounds checks;
/// their contents are not numerically meaningful outside periodic wrap
/// accounting, and all reductions ([`Self::dot`], [`Self::to_dvector`])
/// restrict themselves to the owned region.
#[derive(Debug, Clone)]
pub struct StencilVector<T: RealField> {
    space: Arc<StencilVectorSpace<T>>,
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T: RealField + Copy> StencilVector<T> {
    /// A fresh zero vector bound to the given space.
    pub fn zeros(space: &Arc<StencilVectorSpace<T>>) -> Self {
        let space = Arc::clone(space);
        let shape = space.buffer_shape();
        let len = shape.iter().product();
        Self {
            space,
            shape,
            data: vec![T::zero(); len],
        }
    }

    /// A fresh vector that is zero everywhere except for a one at the given
    /// owned index.
    ///
    /// Only implemented for one and two dimensions. Always allocates its own
    /// buffer, so no caller-visible vector is ever aliased or reset.
    pub fn unit(space: &Arc<StencilVectorSpace<T>>, index: &[usize]) -> Result<Self, Error> {
        if space.ndim() > 2 {
            return Err(Error::UnsupportedDimension {
                operation: "unit vector construction",
                ndim: space.ndim(),
            });
        }
        assert_eq!(index.len(), space.ndim());
        let logical: Vec<isize> = index.iter().map(|&i| i as isize).collect();
        let mut e = Self::zeros(space);
        e.set(&logical, T::one());
        Ok(e)
    }

    pub fn space(&self) -> &Arc<StencilVectorSpace<T>> {
        &self.space
    }

    fn buffer_index(&self, index: &[isize]) -> usize {
        let space = &self.space;
        assert_eq!(index.len(), space.ndim(), "index dimensionality mismatch");
        let mut coords = [0usize; 8];
        let ndim = space.ndim();
        assert!(ndim <= 8);
        for d in 0..ndim {
            coords[d] = buffer_coord(
                index[d],
                space.starts[d],
                space.ends[d],
                space.pads[d],
                space.npts[d],
                space.periods[d],
            );
        }
        ravel(&coords[..ndim], &self.shape)
    }

    pub fn get(&self, index: &[isize]) -> T {
        self.data[self.buffer_index(index)]
    }

    pub fn set(&mut self, index: &[isize], value: T) {
        let i = self.buffer_index(index);
        self.data[i] = value;
    }

    /// Adds `value` to the entry at `index`.
    pub fn add(&mut self, index: &[isize], value: T) {
        let i = self.buffer_index(index);
        self.data[i] += value;
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Flattens the owned (non-halo) region into a dense vector, row-major.
    pub fn to_dvector(&self) -> DVector<T> {
        let space = &self.space;
        let mut out = Vec::with_capacity(space.dimension());
        for_each_owned(&space.starts, &space.ends, |index| {
            let logical: Vec<isize> = index.iter().map(|&i| i as isize).collect();
            out.push(self.get(&logical));
        });
        DVector::from_vec(out)
    }

    /// Copies a flat row-major vector into the owned region.
    pub fn copy_owned_from(&mut self, values: &DVector<T>) -> Result<(), Error> {
        let space = Arc::clone(&self.space);
        if values.len() != space.dimension() {
            return Err(Error::ShapeMismatch {
                context: "flat vector length must equal the space dimension",
            });
        }
        let mut flat = 0;
        for_each_owned(&space.starts, &space.ends, |index| {
            let logical: Vec<isize> = index.iter().map(|&i| i as isize).collect();
            self.set(&logical, values[flat]);
            flat += 1;
        });
        Ok(())
    }

    /// Adds `other` to this vector over the owned region.
    ///
    /// The two vectors must be bound to the *same* space object.
    pub fn add_assign_owned(&mut self, other: &Self) -> Result<(), Error> {
        if !Arc::ptr_eq(&self.space, &other.space) {
            return Err(Error::ShapeMismatch {
                context: "vector sum operands must be bound to the same space",
            });
        }
        let space = Arc::clone(&self.space);
        for_each_owned(&space.starts, &space.ends, |index| {
            let logical: Vec<isize> = index.iter().map(|&i| i as isize).collect();
            let value = other.get(&logical);
            self.add(&logical, value);
        });
        Ok(())
    }

    /// Dot product over the owned region.
    ///
    /// The two vectors must be bound to the *same* space object; halo
    /// contents are assembly-in-progress state and never participate.
    pub fn dot(&self, other: &Self) -> Result<T, Error> {
        if !Arc::ptr_eq(&self.space, &other.space) {
            return Err(Error::ShapeMismatch {
                context: "dot product operands must be bound to the same space",
            });
        }
        let mut sum = T::zero();
        for_each_owned(&self.space.starts, &self.space.ends, |index| {
            let logical: Vec<isize> = index.iter().map(|&i| i as isize).collect();
            sum += self.get(&logical) * other.get(&logical);
        });
        Ok(sum)
    }
}

/// Matrix in n-dimensional stencil format.
///
/// A linear operator from stencil space `domain` to stencil space `codomain`.
/// Entries are stored by `(row, signed diagonal offset)`: logical entry
/// `(i, j)` with `j` within bandwidth of `i` lives at buffer position
/// `(i - start + pad, j - i + pad)` per dimension. The two spaces may differ
/// in global size but must agree on padding, which bounds the representable
/// offsets to `|offset| <= pad` per dimension.
#[derive(Debug, Clone)]
pub struct StencilMatrix<T: RealField> {
    domain: Arc<StencilVectorSpace<T>>,
    codomain: Arc<StencilVectorSpace<T>>,
    dims: Vec<usize>,
    diags: Vec<usize>,
    data: Vec<T>,
}

impl<T: RealField + Copy> StencilMatrix<T> {
    /// Creates a zero matrix mapping `domain` into `codomain`.
    ///
    /// Fails with [`Error::ShapeMismatch`] if the spaces disagree in
    /// dimensionality or padding.
    pub fn new(
        domain: &Arc<StencilVectorSpace<T>>,
        codomain: &Arc<StencilVectorSpace<T>>,
    ) -> Result<Self, Error> {
        if domain.ndim() != codomain.ndim() {
            return Err(Error::ShapeMismatch {
                context: "domain and codomain must have the same number of dimensions",
            });
        }
        if domain.pads() != codomain.pads() {
            return Err(Error::ShapeMismatch {
                context: "domain and codomain must agree on padding",
            });
        }

        let dims = codomain.buffer_shape();
        let diags: Vec<usize> = codomain.pads().iter().map(|&p| 2 * p + 1).collect();
        let len = dims.iter().product::<usize>() * diags.iter().product::<usize>();
        Ok(Self {
            domain: Arc::clone(domain),
            codomain: Arc::clone(codomain),
            dims,
            diags,
            data: vec![T::zero(); len],
        })
    }

    pub fn domain(&self) -> &Arc<StencilVectorSpace<T>> {
        &self.domain
    }

    pub fn codomain(&self) -> &Arc<StencilVectorSpace<T>> {
        &self.codomain
    }

    pub fn pads(&self) -> &[usize] {
        self.codomain.pads()
    }

    pub fn ndim(&self) -> usize {
        self.codomain.ndim()
    }

    fn entry_index(&self, rows: &[isize], offsets: &[isize]) -> Result<usize, Error> {
        let space = &self.codomain;
        let ndim = space.ndim();
        assert_eq!(rows.len(), ndim, "row dimensionality mismatch");
        assert_eq!(offsets.len(), ndim, "offset dimensionality mismatch");

        let mut coords = [0usize; 16];
        assert!(2 * ndim <= 16);
        for d in 0..ndim {
            coords[d] = buffer_coord(
                rows[d],
                space.starts[d],
                space.ends[d],
                space.pads[d],
                space.npts[d],
                space.periods[d],
            );
        }
        for d in 0..ndim {
            let pad = space.pads[d];
            if offsets[d].unsigned_abs() > pad {
                return Err(Error::OutOfBandwidth {
                    dim: d,
                    offset: offsets[d],
                    pad,
                });
            }
            coords[ndim + d] = (offsets[d] + pad as isize) as usize;
        }

        let mut shape = [0usize; 16];
        shape[..ndim].copy_from_slice(&self.dims);
        shape[ndim..2 * ndim].copy_from_slice(&self.diags);
        Ok(ravel(&coords[..2 * ndim], &shape[..2 * ndim]))
    }

    /// Reads entry `(rows, offsets)`.
    ///
    /// # Panics
    ///
    /// Panics if an offset lies outside the representable band; use the
    /// checked writers for assembly-facing code.
    pub fn get(&self, rows: &[isize], offsets: &[isize]) -> T {
        let i = self.entry_index(rows, offsets).unwrap();
        self.data[i]
    }

    /// Writes entry `(rows, offsets)`, failing with
    /// [`Error::OutOfBandwidth`] for offsets outside the band.
    pub fn set(&mut self, rows: &[isize], offsets: &[isize], value: T) -> Result<(), Error> {
        let i = self.entry_index(rows, offsets)?;
        self.data[i] = value;
        Ok(())
    }

    /// Adds `value` to entry `(rows, offsets)`, failing with
    /// [`Error::OutOfBandwidth`] for offsets outside the band.
    ///
    /// Additive accumulation is the primitive used by assembly: a degree of
    /// freedom's support spans several elements, all of which contribute.
    pub fn add(&mut self, rows: &[isize], offsets: &[isize], value: T) -> Result<(), Error> {
        let i = self.entry_index(rows, offsets)?;
        self.data[i] += value;
        Ok(())
    }

    /// Exports the matrix as a COO triplet matrix.
    ///
    /// Walks only the owned region, reconstructs true column indices
    /// (wrapping around for periodic dimensions), emits every logical entry
    /// at most once and elides exact zeros. For non-periodic dimensions,
    /// offsets reaching outside the global index range have no representable
    /// column and are skipped; they are structurally zero in any assembled
    /// matrix.
    pub fn to_coo(&self) -> CooMatrix<T> {
        let codomain = &self.codomain;
        let domain = &self.domain;
        let ndim = self.ndim();

        let mut coo = CooMatrix::new(codomain.dimension(), domain.dimension());
        let mut col = vec![0usize; ndim];
        let diag_starts = vec![0usize; ndim];
        let diag_ends: Vec<usize> = self.diags.iter().map(|&d| d - 1).collect();

        for_each_owned(&codomain.starts, &codomain.ends, |row| {
            let row_logical: Vec<isize> = row.iter().map(|&i| i as isize).collect();
            for_each_owned(&diag_starts, &diag_ends, |diag| {
                let offsets: Vec<isize> = diag
                    .iter()
                    .zip(codomain.pads())
                    .map(|(&l, &p)| l as isize - p as isize)
                    .collect();
                let value = self.get(&row_logical, &offsets);
                if value == T::zero() {
                    return;
                }

                for d in 0..ndim {
                    let j = row_logical[d] + offsets[d];
                    let n = domain.npts[d] as isize;
                    if domain.periods[d] {
                        col[d] = j.rem_euclid(n) as usize;
                    } else if j < 0 || j >= n {
                        return;
                    } else {
                        col[d] = j as usize;
                    }
                }

                let i = ravel(row, codomain.npts());
                let j = ravel(&col, domain.npts());
                coo.push(i, j, value);
            });
        });

        log::debug!(
            "exported stencil matrix to COO: {} x {}, {} nonzeros",
            coo.nrows(),
            coo.ncols(),
            coo.nnz()
        );
        coo
    }

    /// Exports the matrix in CSR format.
    pub fn to_csr(&self) -> CsrMatrix<T> {
        CsrMatrix::from(&self.to_coo())
    }

    /// Scatters a COO matrix into this stencil matrix, the inverse of
    /// [`Self::to_coo`].
    ///
    /// Fails with [`Error::OutOfBandwidth`] if a triplet lies outside the
    /// stencil band.
    pub fn scatter_coo(&mut self, coo: &CooMatrix<T>) -> Result<(), Error> {
        let ndim = self.ndim();
        let mut row = vec![0usize; ndim];
        let mut col = vec![0usize; ndim];

        for (i, j, &value) in coo.triplet_iter() {
            unravel(i, self.codomain.npts(), &mut row);
            unravel(j, self.domain.npts(), &mut col);

            let rows: Vec<isize> = row.iter().map(|&r| r as isize).collect();
            let mut offsets = vec![0isize; ndim];
            for d in 0..ndim {
                let pad = self.codomain.pads[d] as isize;
                let n = self.domain.npts[d] as isize;
                let mut k = col[d] as isize - row[d] as isize;
                if self.domain.periods[d] {
                    // Wrap to the representative within the band
                    if k > pad {
                        k -= n;
                    } else if k < -pad {
                        k += n;
                    }
                }
                offsets[d] = k;
            }
            self.add(&rows, &offsets, value)?;
        }
        Ok(())
    }

    /// Materializes the matrix as a dense array.
    ///
    /// Only implemented for one and two dimensions.
    pub fn to_dense(&self) -> Result<DMatrix<T>, Error> {
        if self.ndim() > 2 {
            return Err(Error::UnsupportedDimension {
                operation: "to_dense",
                ndim: self.ndim(),
            });
        }
        let coo = self.to_coo();
        let mut dense = DMatrix::zeros(coo.nrows(), coo.ncols());
        for (i, j, &value) in coo.triplet_iter() {
            dense[(i, j)] += value;
        }
        Ok(dense)
    }
}
