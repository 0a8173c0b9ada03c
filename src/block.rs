//! Block vectors and block operators over stencil spaces.
//!
//! A block operator is a sparse grid of optional sub-operators. Emptiness is
//! validated eagerly at construction: every row and every column must carry
//! at least one populated block, since an all-empty row or column leaves the
//! block dimensions undefined.

use crate::operator::StencilOperator;
use crate::stencil::{StencilVector, StencilVectorSpace};
use crate::{BlockAxis, Error};
use nalgebra::RealField;
use nalgebra_sparse::CooMatrix;
use std::sync::Arc;

/// A vector with one stencil-vector component per block.
#[derive(Debug, Clone)]
pub struct BlockVector<T: RealField> {
    blocks: Vec<StencilVector<T>>,
}

impl<T: RealField + Copy> BlockVector<T> {
    pub fn new(blocks: Vec<StencilVector<T>>) -> Self {
        assert!(!blocks.is_empty());
        Self { blocks }
    }

    pub fn nblocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, i: usize) -> &StencilVector<T> {
        &self.blocks[i]
    }

    pub fn block_mut(&mut self, i: usize) -> &mut StencilVector<T> {
        &mut self.blocks[i]
    }

    pub fn into_blocks(self) -> Vec<StencilVector<T>> {
        self.blocks
    }
}

/// A grid of optional operators acting on block vectors.
pub struct BlockOperator<T: RealField> {
    nrows: usize,
    ncols: usize,
    blocks: Vec<Option<Box<dyn StencilOperator<T>>>>,
    row_spaces: Vec<Arc<StencilVectorSpace<T>>>,
    col_spaces: Vec<Arc<StencilVectorSpace<T>>>,
}

impl<T: RealField + Copy> BlockOperator<T> {
    /// Creates a block operator from a row-major grid of optional blocks.
    ///
    /// Fails with [`Error::EmptyBlock`] if a row or column has no populated
    /// block, and with [`Error::ShapeMismatch`] if two blocks of the same
    /// row (column) disagree on the codomain (domain) space.
    pub fn new(
        nrows: usize,
        ncols: usize,
        blocks: Vec<Option<Box<dyn StencilOperator<T>>>>,
    ) -> Result<Self, Error> {
        assert_eq!(blocks.len(), nrows * ncols, "grid size mismatch");

        let mut row_spaces: Vec<Option<Arc<StencilVectorSpace<T>>>> = vec![None; nrows];
        let mut col_spaces: Vec<Option<Arc<StencilVectorSpace<T>>>> = vec![None; ncols];

        for i in 0..nrows {
            for j in 0..ncols {
                let block = match &blocks[i * ncols + j] {
                    Some(block) => block,
                    None => continue,
                };
                match &row_spaces[i] {
                    None => row_spaces[i] = Some(Arc::clone(block.codomain())),
                    Some(space) => {
                        if !Arc::ptr_eq(space, block.codomain()) {
                            return Err(Error::ShapeMismatch {
                                context: "blocks of one row must share their codomain space",
                            });
                        }
                    }
                }
                match &col_spaces[j] {
                    None => col_spaces[j] = Some(Arc::clone(block.domain())),
                    Some(space) => {
                        if !Arc::ptr_eq(space, block.domain()) {
                            return Err(Error::ShapeMismatch {
                                context: "blocks of one column must share their domain space",
                            });
                        }
                    }
                }
            }
        }

        let row_spaces = row_spaces
            .into_iter()
            .enumerate()
            .map(|(i, space)| {
                space.ok_or(Error::EmptyBlock {
                    axis: BlockAxis::Row,
                    index: i,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let col_spaces = col_spaces
            .into_iter()
            .enumerate()
            .map(|(j, space)| {
                space.ok_or(Error::EmptyBlock {
                    axis: BlockAxis::Column,
                    index: j,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            nrows,
            ncols,
            blocks,
            row_spaces,
            col_spaces,
        })
    }

    /// A square operator with the given blocks on its diagonal.
    pub fn block_diagonal(diagonal: Vec<Box<dyn StencilOperator<T>>>) -> Result<Self, Error> {
        let n = diagonal.len();
        let mut blocks: Vec<Option<Box<dyn StencilOperator<T>>>> =
            (0..n * n).map(|_| None).collect();
        for (i, block) in diagonal.into_iter().enumerate() {
            blocks[i * n + i] = Some(block);
        }
        Self::new(n, n, blocks)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn block(&self, i: usize, j: usize) -> Option<&dyn StencilOperator<T>> {
        self.blocks[i * self.ncols + j].as_deref()
    }

    /// Codomain space of block row `i`.
    pub fn row_space(&self, i: usize) -> &Arc<StencilVectorSpace<T>> {
        &self.row_spaces[i]
    }

    /// Domain space of block column `j`.
    pub fn col_space(&self, j: usize) -> &Arc<StencilVectorSpace<T>> {
        &self.col_spaces[j]
    }

    /// Applies the block operator to a block vector.
    pub fn apply(&self, v: &BlockVector<T>) -> eyre::Result<BlockVector<T>> {
        if v.nblocks() != self.ncols {
            return Err(Error::ShapeMismatch {
                context: "block vector must have one component per block column",
            }
            .into());
        }
        for j in 0..self.ncols {
            if !Arc::ptr_eq(v.block(j).space(), &self.col_spaces[j]) {
                return Err(Error::ShapeMismatch {
                    context: "block vector component is not bound to the column's domain space",
                }
                .into());
            }
        }

        let mut out: Vec<StencilVector<T>> =
            self.row_spaces.iter().map(StencilVector::zeros).collect();
        for i in 0..self.nrows {
            for j in 0..self.ncols {
                if let Some(block) = self.block(i, j) {
                    let contribution = block.apply(v.block(j))?;
                    out[i].add_assign_owned(&contribution)?;
                }
            }
        }

        Ok(BlockVector::new(out))
    }
}

/// Assembles a global COO matrix from a row-major grid of optional COO
/// blocks, shifting each block by the accumulated row/column extents.
///
/// Every row and column of the grid must contain at least one populated
/// block, so that its extent is defined; otherwise [`Error::EmptyBlock`] is
/// raised.
pub fn coo_from_blocks<T: RealField + Copy>(
    blocks: &[Vec<Option<CooMatrix<T>>>],
    nrows: usize,
    ncols: usize,
) -> Result<CooMatrix<T>, Error> {
    assert_eq!(blocks.len(), nrows);
    assert!(blocks.iter().all(|row| row.len() == ncols));

    let mut row_sizes = vec![0usize; nrows];
    let mut col_sizes = vec![0usize; ncols];

    for i in 0..nrows {
        let size = blocks[i]
            .iter()
            .flatten()
            .map(|block| block.nrows())
            .next()
            .ok_or(Error::EmptyBlock {
                axis: BlockAxis::Row,
                index: i,
            })?;
        row_sizes[i] = size;
    }
    for j in 0..ncols {
        let size = blocks
            .iter()
            .filter_map(|row| row[j].as_ref())
            .map(|block| block.ncols())
            .next()
            .ok_or(Error::EmptyBlock {
                axis: BlockAxis::Column,
                index: j,
            })?;
        col_sizes[j] = size;
    }

    let total_rows: usize = row_sizes.iter().sum();
    let total_cols: usize = col_sizes.iter().sum();
    let mut coo = CooMatrix::new(total_rows, total_cols);

    let mut row_shift = 0;
    for i in 0..nrows {
        let mut col_shift = 0;
        for j in 0..ncols {
            if let Some(block) = &blocks[i][j] {
                if block.nrows() != row_sizes[i] || block.ncols() != col_sizes[j] {
                    return Err(Error::ShapeMismatch {
                        context: "block extents disagree within their row or column",
                    });
                }
                for (r, c, &value) in block.triplet_iter() {
                    coo.push(row_shift + r, col_shift + c, value);
                }
            }
            col_shift += col_sizes[j];
        }
        row_shift += row_sizes[i];
    }

    Ok(coo)
}
