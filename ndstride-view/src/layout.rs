//! Shape/offset/stride descriptor and its pure transforms.
//!
//! Nothing here reads or writes element data. Every method takes `&self` and
//! returns a fresh [`Layout`], so any number of layouts may describe the same
//! buffer at once.

use std::sync::Arc;

use crate::{Result, StridedError};

// ============================================================================
// Canonical strides
// ============================================================================

/// Compute column-major strides (first index varies fastest).
pub fn col_major_strides(dims: &[usize]) -> Vec<isize> {
    let mut strides = Vec::with_capacity(dims.len());
    let mut acc = 1isize;
    for &d in dims {
        strides.push(acc);
        acc = acc.saturating_mul(d as isize);
    }
    strides
}

/// Compute row-major strides (last index varies fastest).
pub fn row_major_strides(dims: &[usize]) -> Vec<isize> {
    let mut strides = vec![0isize; dims.len()];
    let mut acc = 1isize;
    for (s, &d) in strides.iter_mut().zip(dims.iter()).rev() {
        *s = acc;
        acc = acc.saturating_mul(d as isize);
    }
    strides
}

/// Compare `strides` against the canonical strides for `dims`, walking axes in
/// the order given by `axes` (fastest-varying first). Axes of size 1 never
/// break contiguity and a layout with no elements is trivially contiguous.
fn matches_canonical(
    dims: &[usize],
    strides: &[isize],
    axes: impl Iterator<Item = usize>,
) -> bool {
    if dims.contains(&0) {
        return true;
    }
    let mut expected = 1isize;
    for axis in axes {
        let dim = dims[axis];
        if dim <= 1 {
            continue;
        }
        if strides[axis] != expected {
            return false;
        }
        expected = expected.saturating_mul(dim as isize);
    }
    true
}

// ============================================================================
// Layout
// ============================================================================

/// Immutable `(shape, offset, strides)` descriptor.
///
/// `address(pos) = offset + Σ pos[d] * strides[d]`. A stride of zero repeats
/// one element along an axis (broadcast); a negative stride walks it backwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Layout {
    shape: Arc<[usize]>,
    strides: Arc<[isize]>,
    offset: isize,
}

impl Layout {
    /// Build a layout from explicit parts.
    pub fn new(shape: &[usize], strides: &[isize], offset: isize) -> Result<Self> {
        if shape.len() != strides.len() {
            return Err(StridedError::StrideLengthMismatch);
        }
        Ok(Self::from_parts(shape.to_vec(), strides.to_vec(), offset))
    }

    #[inline]
    pub(crate) fn from_parts(shape: Vec<usize>, strides: Vec<isize>, offset: isize) -> Self {
        debug_assert_eq!(shape.len(), strides.len());
        Self {
            shape: Arc::from(shape),
            strides: Arc::from(strides),
            offset,
        }
    }

    /// Contiguous C-order layout starting at offset 0.
    pub fn row_major(shape: &[usize]) -> Self {
        Self::from_parts(shape.to_vec(), row_major_strides(shape), 0)
    }

    /// Contiguous Fortran-order layout starting at offset 0.
    pub fn col_major(shape: &[usize]) -> Self {
        Self::from_parts(shape.to_vec(), col_major_strides(shape), 0)
    }

    /// Rank-0 layout addressing a single element.
    pub fn scalar(offset: isize) -> Self {
        Self::from_parts(Vec::new(), Vec::new(), offset)
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of addressable elements; `1` for a rank-0 layout.
    #[inline]
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shape.iter().any(|&d| d == 0)
    }

    /// Stride of the last axis, `None` for rank 0.
    #[inline]
    pub fn inner_stride(&self) -> Option<isize> {
        self.strides.last().copied()
    }

    /// Same shape and strides, different base offset.
    pub fn with_offset(&self, offset: isize) -> Self {
        Self {
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            offset,
        }
    }

    /// Linear address of `pos`. Bounds are only checked in debug builds.
    #[inline]
    pub fn address(&self, pos: &[usize]) -> isize {
        debug_assert_eq!(pos.len(), self.rank());
        pos.iter()
            .zip(self.strides.iter())
            .fold(self.offset, |acc, (&p, &s)| acc + p as isize * s)
    }

    /// Linear address of `pos`, validating every index against the shape.
    pub fn checked_address(&self, pos: &[usize]) -> Result<isize> {
        if pos.len() != self.rank() {
            return Err(StridedError::RankMismatch(pos.len(), self.rank()));
        }
        for (axis, (&p, &size)) in pos.iter().zip(self.shape.iter()).enumerate() {
            if p >= size {
                return Err(StridedError::IndexOutOfRange {
                    axis,
                    index: p,
                    size,
                });
            }
        }
        Ok(self.address(pos))
    }

    /// Smallest and largest address reachable by any valid position, or `None`
    /// for an empty layout.
    pub fn address_span(&self) -> Result<Option<(isize, isize)>> {
        if self.is_empty() {
            return Ok(None);
        }
        let mut lo = self.offset;
        let mut hi = self.offset;
        for (&dim, &stride) in self.shape.iter().zip(self.strides.iter()) {
            if dim <= 1 {
                continue;
            }
            let end = stride
                .checked_mul(dim as isize - 1)
                .ok_or(StridedError::OffsetOverflow)?;
            if end >= 0 {
                hi = hi.checked_add(end).ok_or(StridedError::OffsetOverflow)?;
            } else {
                lo = lo.checked_add(end).ok_or(StridedError::OffsetOverflow)?;
            }
        }
        Ok(Some((lo, hi)))
    }

    /// Check that every reachable address lies in `[0, len)`.
    pub fn validate_bounds(&self, len: usize) -> Result<()> {
        let Some((lo, hi)) = self.address_span()? else {
            return Ok(());
        };
        if lo < 0 {
            return Err(StridedError::OutOfBounds { index: lo, len });
        }
        if hi as usize >= len {
            return Err(StridedError::OutOfBounds { index: hi, len });
        }
        Ok(())
    }

    fn check_axis(&self, axis: usize) -> Result<()> {
        if axis >= self.rank() {
            return Err(StridedError::InvalidAxis {
                axis,
                rank: self.rank(),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Axis reordering
    // ------------------------------------------------------------------------

    /// Exchange two axes.
    pub fn swap_axes(&self, ax1: usize, ax2: usize) -> Result<Self> {
        self.check_axis(ax1)?;
        self.check_axis(ax2)?;
        let mut shape = self.shape.to_vec();
        let mut strides = self.strides.to_vec();
        shape.swap(ax1, ax2);
        strides.swap(ax1, ax2);
        Ok(Self::from_parts(shape, strides, self.offset))
    }

    /// Reorder axes so that new axis `i` is old axis `perm[i]`.
    pub fn permute(&self, perm: &[usize]) -> Result<Self> {
        let rank = self.rank();
        if perm.len() != rank {
            return Err(StridedError::RankMismatch(perm.len(), rank));
        }
        let mut seen = vec![false; rank];
        for &p in perm {
            if p >= rank || seen[p] {
                return Err(StridedError::InvalidPermutation(perm.to_vec()));
            }
            seen[p] = true;
        }
        let shape = perm.iter().map(|&p| self.shape[p]).collect();
        let strides = perm.iter().map(|&p| self.strides[p]).collect();
        Ok(Self::from_parts(shape, strides, self.offset))
    }

    /// Reverse the order of all axes.
    pub fn transpose(&self) -> Self {
        let shape = self.shape.iter().rev().copied().collect();
        let strides = self.strides.iter().rev().copied().collect();
        Self::from_parts(shape, strides, self.offset)
    }

    /// Move `axis` to the last position, keeping the others in order.
    pub fn move_axis_last(&self, axis: usize) -> Result<Self> {
        self.check_axis(axis)?;
        let mut perm: Vec<usize> = (0..self.rank()).filter(|&a| a != axis).collect();
        perm.push(axis);
        self.permute(&perm)
    }

    /// Drop `axis` from the shape (the result addresses the `index = 0` slice).
    pub fn remove_axis(&self, axis: usize) -> Result<Self> {
        self.check_axis(axis)?;
        let mut shape = self.shape.to_vec();
        let mut strides = self.strides.to_vec();
        shape.remove(axis);
        strides.remove(axis);
        Ok(Self::from_parts(shape, strides, self.offset))
    }

    // ------------------------------------------------------------------------
    // Padding and broadcasting
    // ------------------------------------------------------------------------

    /// Insert a size-1, stride-0 axis in front.
    pub fn pad_left(&self) -> Self {
        let mut shape = Vec::with_capacity(self.rank() + 1);
        let mut strides = Vec::with_capacity(self.rank() + 1);
        shape.push(1);
        strides.push(0);
        shape.extend_from_slice(&self.shape);
        strides.extend_from_slice(&self.strides);
        Self::from_parts(shape, strides, self.offset)
    }

    /// Append a size-1, stride-0 axis.
    pub fn pad_right(&self) -> Self {
        let mut shape = self.shape.to_vec();
        let mut strides = self.strides.to_vec();
        shape.push(1);
        strides.push(0);
        Self::from_parts(shape, strides, self.offset)
    }

    /// Stretch a size-1 axis to `size` by giving it stride 0.
    pub fn broadcast_axis(&self, axis: usize, size: usize) -> Result<Self> {
        self.check_axis(axis)?;
        let from = self.shape[axis];
        if from != 1 {
            return Err(StridedError::NotBroadcastable {
                axis,
                from,
                to: size,
            });
        }
        let mut shape = self.shape.to_vec();
        let mut strides = self.strides.to_vec();
        shape[axis] = size;
        strides[axis] = 0;
        Ok(Self::from_parts(shape, strides, self.offset))
    }

    /// Broadcast to `target`, left-padding the rank first.
    pub fn broadcast_to(&self, target: &[usize]) -> Result<Self> {
        if self.rank() > target.len() {
            return Err(StridedError::RankMismatch(self.rank(), target.len()));
        }
        let mut layout = self.clone();
        while layout.rank() < target.len() {
            layout = layout.pad_left();
        }
        for (axis, &size) in target.iter().enumerate() {
            let current = layout.shape[axis];
            if current == size {
                continue;
            }
            if current != 1 {
                return Err(StridedError::NotBroadcastable {
                    axis,
                    from: current,
                    to: size,
                });
            }
            layout = layout.broadcast_axis(axis, size)?;
        }
        Ok(layout)
    }

    // ------------------------------------------------------------------------
    // Contiguity
    // ------------------------------------------------------------------------

    /// Strides equal the C-order strides for this shape (degenerate axes ignored).
    pub fn is_row_major(&self) -> bool {
        matches_canonical(&self.shape, &self.strides, (0..self.rank()).rev())
    }

    /// Strides equal the Fortran-order strides for this shape (degenerate axes ignored).
    pub fn is_col_major(&self) -> bool {
        matches_canonical(&self.shape, &self.strides, 0..self.rank())
    }

    /// Walking the layout in row-major order reads one dense block of memory
    /// front to back. A transposed matrix covers a dense block too, but out of
    /// order, and does not qualify.
    pub fn has_contiguous_memory(&self) -> bool {
        self.is_row_major()
    }

    /// No two valid positions share an address.
    ///
    /// Conservative: axes are sorted by stride magnitude and each must step
    /// past the full extent of the faster ones.
    pub fn is_non_overlapping(&self) -> bool {
        let mut axes: Vec<(usize, usize)> = self
            .shape
            .iter()
            .zip(self.strides.iter())
            .filter(|(d, _)| **d > 1)
            .map(|(&d, &s)| (d, s.unsigned_abs()))
            .collect();
        axes.sort_unstable_by_key(|&(_, s)| s);
        let mut extent = 1usize;
        for (dim, stride) in axes {
            if stride < extent {
                return false;
            }
            extent = stride.saturating_mul(dim - 1).saturating_add(extent);
        }
        true
    }

    // ------------------------------------------------------------------------
    // Diagonal
    // ------------------------------------------------------------------------

    /// View the diagonal of axes `ax1` and `ax2`.
    ///
    /// `ax2` is dropped and `ax1` takes stride `strides[ax1] + strides[ax2]`.
    ///
    /// # Example
    /// `A[i,i,j]` shape=`[n,n,m]` strides=`[s0,s1,s2]` -> shape=`[n,m]` strides=`[s0+s1, s2]`
    pub fn diagonal(&self, ax1: usize, ax2: usize) -> Result<Self> {
        self.check_axis(ax1)?;
        self.check_axis(ax2)?;
        if ax1 == ax2 {
            return Err(StridedError::InvalidAxis {
                axis: ax2,
                rank: self.rank(),
            });
        }
        if self.shape[ax1] != self.shape[ax2] {
            return Err(StridedError::ShapeMismatch(
                vec![self.shape[ax1]],
                vec![self.shape[ax2]],
            ));
        }
        let mut shape = self.shape.to_vec();
        let mut strides = self.strides.to_vec();
        strides[ax1] += strides[ax2];
        shape.remove(ax2);
        strides.remove(ax2);
        Ok(Self::from_parts(shape, strides, self.offset))
    }
}

// ============================================================================
// Multi-layout broadcasting
// ============================================================================

/// Common broadcast shape of `shapes`, aligning them on the right.
///
/// Per axis all sizes other than 1 must agree; the result takes that size, or 1
/// when every input has size 1.
pub fn broadcast_shapes(shapes: &[&[usize]]) -> Result<Vec<usize>> {
    let rank = shapes.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut out = vec![1usize; rank];
    // k counts axes from the right
    for (k, target) in out.iter_mut().enumerate() {
        for shape in shapes {
            if k >= shape.len() {
                continue;
            }
            let n = shape[shape.len() - 1 - k];
            if n == 1 {
                continue;
            }
            if *target == 1 {
                *target = n;
            } else if *target != n {
                return Err(StridedError::IncompatibleShapes(
                    shapes.iter().map(|s| s.to_vec()).collect(),
                ));
            }
        }
    }
    out.reverse();
    Ok(out)
}

/// Broadcast every layout to their common shape.
pub fn broadcast_layouts(layouts: &[&Layout]) -> Result<Vec<Layout>> {
    let shapes: Vec<&[usize]> = layouts.iter().map(|l| l.shape()).collect();
    let target = broadcast_shapes(&shapes)?;
    layouts.iter().map(|l| l.broadcast_to(&target)).collect()
}
