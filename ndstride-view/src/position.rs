//! Row-major walk over a sub-range of a layout's axes.

use std::ops::Range;

use crate::layout::Layout;
use crate::{Result, StridedError};

/// Lazily produces the linear addresses of a layout, visiting the axes in
/// `axes` with the rightmost one varying fastest.
///
/// Axes outside `axes` stay fixed at their starting index. The address is
/// updated incrementally by [`PositionIter::advance`] and always equals
/// `layout.address(self.position())`.
#[derive(Debug, Clone)]
pub struct PositionIter {
    layout: Layout,
    axes: Range<usize>,
    position: Vec<usize>,
    address: isize,
    active: bool,
    remaining: usize,
}

impl PositionIter {
    /// Start at `start` (all zeros when `None`) and walk the axes in `axes`.
    ///
    /// An empty `axes` yields exactly one address. A zero-size iterated axis
    /// yields none.
    pub fn new(layout: &Layout, start: Option<&[usize]>, axes: Range<usize>) -> Result<Self> {
        let rank = layout.rank();
        if axes.end > rank || axes.start > axes.end {
            return Err(StridedError::InvalidAxis {
                axis: axes.end.max(axes.start),
                rank,
            });
        }
        let position = match start {
            Some(start) => {
                if start.len() != rank {
                    return Err(StridedError::RankMismatch(start.len(), rank));
                }
                start.to_vec()
            }
            None => vec![0; rank],
        };
        let shape = layout.shape();
        for (axis, (&index, &size)) in position.iter().zip(shape.iter()).enumerate() {
            if index >= size && !(size == 0 && index == 0) {
                return Err(StridedError::IndexOutOfRange { axis, index, size });
            }
        }

        let active = axes.clone().all(|d| shape[d] > 0);
        let remaining = if active {
            // row-major rank of the start position among the iterated axes
            let mut total = 1usize;
            let mut consumed = 0usize;
            for d in axes.clone().rev() {
                consumed += position[d] * total;
                total *= shape[d];
            }
            total - consumed
        } else {
            0
        };

        Ok(Self {
            address: layout.address(&position),
            layout: layout.clone(),
            axes,
            position,
            active,
            remaining,
        })
    }

    /// Walk every axis of `layout` from the origin.
    pub fn full(layout: &Layout) -> Self {
        let rank = layout.rank();
        let shape = layout.shape();
        let active = shape.iter().all(|&d| d > 0);
        Self {
            address: layout.offset(),
            layout: layout.clone(),
            axes: 0..rank,
            position: vec![0; rank],
            active,
            remaining: if active { layout.len() } else { 0 },
        }
    }

    /// Address of the current position.
    #[inline]
    pub fn address(&self) -> isize {
        self.address
    }

    /// Current multi-dimensional index (full rank).
    #[inline]
    pub fn position(&self) -> &[usize] {
        &self.position
    }

    /// `false` once the iterated range has been exhausted.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Step to the next position, carrying into outer axes on overflow.
    pub fn advance(&mut self) {
        if !self.active {
            return;
        }
        let shape = self.layout.shape();
        let strides = self.layout.strides();
        for d in self.axes.clone().rev() {
            self.position[d] += 1;
            self.address += strides[d];
            if self.position[d] < shape[d] {
                self.remaining -= 1;
                return;
            }
            self.address -= strides[d] * shape[d] as isize;
            self.position[d] = 0;
        }
        self.active = false;
        self.remaining = 0;
    }
}

impl Iterator for PositionIter {
    type Item = isize;

    #[inline]
    fn next(&mut self) -> Option<isize> {
        if !self.active {
            return None;
        }
        let address = self.address;
        self.advance();
        Some(address)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for PositionIter {}

impl std::iter::FusedIterator for PositionIter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_walk_row_major_order() {
        let l = Layout::col_major(&[2, 3]);
        let addrs: Vec<isize> = PositionIter::full(&l).collect();
        assert_eq!(addrs, vec![0, 2, 4, 1, 3, 5]);
    }

    #[test]
    fn test_carry_and_position() {
        let l = Layout::row_major(&[2, 2]);
        let mut it = PositionIter::full(&l);
        assert_eq!(it.position(), &[0, 0]);
        it.advance();
        assert_eq!(it.position(), &[0, 1]);
        it.advance();
        assert_eq!(it.position(), &[1, 0]);
        assert_eq!(it.address(), 2);
        it.advance();
        it.advance();
        assert!(!it.is_active());
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_sub_range_keeps_other_axes_fixed() {
        let l = Layout::row_major(&[2, 3, 4]);
        let it = PositionIter::new(&l, Some(&[1, 0, 2][..]), 1..2).unwrap();
        let addrs: Vec<isize> = it.collect();
        assert_eq!(addrs, vec![14, 18, 22]);
    }

    #[test]
    fn test_outer_axes_only() {
        let l = Layout::row_major(&[2, 3, 4]);
        let it = PositionIter::new(&l, None, 0..2).unwrap();
        assert_eq!(it.len(), 6);
        let addrs: Vec<isize> = it.collect();
        assert_eq!(addrs, vec![0, 4, 8, 12, 16, 20]);
    }

    #[test]
    fn test_start_mid_range() {
        let l = Layout::row_major(&[3, 2]);
        let it = PositionIter::new(&l, Some(&[1, 1][..]), 0..2).unwrap();
        assert_eq!(it.len(), 3);
        assert_eq!(it.collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    #[test]
    fn test_empty_axis_range_yields_once() {
        let l = Layout::row_major(&[4]).with_offset(3);
        let it = PositionIter::new(&l, None, 0..0).unwrap();
        assert_eq!(it.collect::<Vec<_>>(), vec![3]);

        let s = Layout::scalar(7);
        assert_eq!(PositionIter::full(&s).collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_zero_size_axis_yields_nothing() {
        let l = Layout::row_major(&[3, 0]);
        assert_eq!(PositionIter::full(&l).count(), 0);
        let it = PositionIter::new(&l, None, 0..1).unwrap();
        assert_eq!(it.count(), 3);
    }

    #[test]
    fn test_negative_and_broadcast_strides() {
        let l = Layout::new(&[2, 3], &[0, -1], 2).unwrap();
        let addrs: Vec<isize> = PositionIter::full(&l).collect();
        assert_eq!(addrs, vec![2, 1, 0, 2, 1, 0]);
    }

    #[test]
    fn test_invalid_arguments() {
        let l = Layout::row_major(&[2, 3]);
        assert!(PositionIter::new(&l, None, 0..3).is_err());
        assert!(PositionIter::new(&l, Some(&[0][..]), 0..2).is_err());
        assert_eq!(
            PositionIter::new(&l, Some(&[2, 0][..]), 0..2).unwrap_err(),
            StridedError::IndexOutOfRange {
                axis: 0,
                index: 2,
                size: 2
            }
        );
    }
}
