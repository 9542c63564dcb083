//! Shared precondition checks and layout queries for the engine.

use ndstride_view::{Layout, StridedError};

use crate::Result;

pub(crate) fn ensure_same_shape(a: &[usize], b: &[usize]) -> Result<()> {
    if a.len() != b.len() {
        return Err(StridedError::RankMismatch(a.len(), b.len()));
    }
    if a != b {
        return Err(StridedError::ShapeMismatch(a.to_vec(), b.to_vec()));
    }
    Ok(())
}

pub(crate) fn check_axis(axis: usize, rank: usize) -> Result<()> {
    if axis >= rank {
        return Err(StridedError::InvalidAxis { axis, rank });
    }
    Ok(())
}

/// Layout half of the vector-path test: the target walks its inner axis with
/// unit stride and every source either does too or repeats one element.
pub(crate) fn inner_axis_vectorizable(dest: &Layout, sources: &[&Layout]) -> bool {
    if dest.rank() == 0 || dest.inner_stride() != Some(1) {
        return false;
    }
    sources
        .iter()
        .all(|s| matches!(s.inner_stride(), Some(0) | Some(1)))
}

/// `(start, len)` of the dense block a row- or column-major layout covers,
/// if any. The block is in memory order, not row-major order.
///
/// Rank-0 layouts cover one element; empty layouts cover none.
pub(crate) fn contiguous_span(layout: &Layout) -> Option<(usize, usize)> {
    if !(layout.is_row_major() || layout.is_col_major()) {
        return None;
    }
    let len = layout.len();
    if len == 0 {
        return Some((0, 0));
    }
    Some((layout.offset() as usize, len))
}
