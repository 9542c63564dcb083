//! Per-axis slice specifiers and [`Layout::slice`].

use std::ops::{RangeFull, RangeInclusive};

use crate::layout::Layout;
use crate::{Result, StridedError};

/// One entry of a slice expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceSpec {
    /// Keep the whole axis.
    Full,
    /// Inclusive `start..=stop` walked with `step` (which may be negative).
    ///
    /// `stop < start` with a positive step (or `stop > start` with a negative
    /// one) selects nothing and produces a zero-size axis.
    Range {
        start: usize,
        stop: usize,
        step: isize,
    },
    /// Select a single index and drop the axis.
    Index(usize),
    /// Insert a new size-1 axis; consumes no source axis.
    NewAxis,
    /// Expand to as many [`SliceSpec::Full`] as needed to cover the axes not
    /// named by the other specifiers.
    Rest,
}

impl SliceSpec {
    /// Inclusive range with unit step.
    pub fn range(start: usize, stop: usize) -> Self {
        SliceSpec::Range {
            start,
            stop,
            step: 1,
        }
    }

    /// Inclusive range with an explicit step.
    pub fn range_step(start: usize, stop: usize, step: isize) -> Self {
        SliceSpec::Range { start, stop, step }
    }

    fn consumes_axis(&self) -> bool {
        !matches!(self, SliceSpec::NewAxis | SliceSpec::Rest)
    }
}

impl From<usize> for SliceSpec {
    fn from(index: usize) -> Self {
        SliceSpec::Index(index)
    }
}

impl From<RangeInclusive<usize>> for SliceSpec {
    fn from(r: RangeInclusive<usize>) -> Self {
        SliceSpec::range(*r.start(), *r.end())
    }
}

impl From<RangeFull> for SliceSpec {
    fn from(_: RangeFull) -> Self {
        SliceSpec::Full
    }
}

/// Number of elements selected by an inclusive range, `0` when empty.
fn range_len(start: usize, stop: usize, step: isize) -> usize {
    let magnitude = step.unsigned_abs();
    if step > 0 {
        if stop < start {
            0
        } else {
            (stop - start) / magnitude + 1
        }
    } else if stop > start {
        0
    } else {
        (start - stop) / magnitude + 1
    }
}

fn shift(offset: isize, index: usize, stride: isize) -> Result<isize> {
    (index as isize)
        .checked_mul(stride)
        .and_then(|delta| offset.checked_add(delta))
        .ok_or(StridedError::OffsetOverflow)
}

impl Layout {
    /// Apply a slice expression, one specifier per source axis.
    ///
    /// Specifiers are consumed left to right. Axes not covered by the
    /// expression are kept whole.
    pub fn slice(&self, specs: &[SliceSpec]) -> Result<Layout> {
        let rank = self.rank();
        if specs.iter().filter(|s| matches!(s, SliceSpec::Rest)).count() > 1 {
            return Err(StridedError::MultipleRest);
        }
        let named = specs.iter().filter(|s| s.consumes_axis()).count();
        if named > rank {
            return Err(StridedError::TooManyIndices { given: named, rank });
        }
        let rest_width = rank - named;

        let src_shape = self.shape();
        let src_strides = self.strides();
        let mut shape = Vec::with_capacity(rank + specs.len());
        let mut strides = Vec::with_capacity(rank + specs.len());
        let mut offset = self.offset();
        let mut axis = 0usize;

        for spec in specs {
            match *spec {
                SliceSpec::Full => {
                    shape.push(src_shape[axis]);
                    strides.push(src_strides[axis]);
                    axis += 1;
                }
                SliceSpec::Rest => {
                    shape.extend_from_slice(&src_shape[axis..axis + rest_width]);
                    strides.extend_from_slice(&src_strides[axis..axis + rest_width]);
                    axis += rest_width;
                }
                SliceSpec::NewAxis => {
                    shape.push(1);
                    strides.push(0);
                }
                SliceSpec::Index(index) => {
                    let size = src_shape[axis];
                    if index >= size {
                        return Err(StridedError::IndexOutOfRange { axis, index, size });
                    }
                    offset = shift(offset, index, src_strides[axis])?;
                    axis += 1;
                }
                SliceSpec::Range { start, stop, step } => {
                    if step == 0 {
                        return Err(StridedError::ZeroStep { axis });
                    }
                    let size = src_shape[axis];
                    let len = range_len(start, stop, step);
                    if len > 0 {
                        for bound in [start, stop] {
                            if bound >= size {
                                return Err(StridedError::IndexOutOfRange {
                                    axis,
                                    index: bound,
                                    size,
                                });
                            }
                        }
                        offset = shift(offset, start, src_strides[axis])?;
                    }
                    shape.push(len);
                    strides.push(
                        src_strides[axis]
                            .checked_mul(step)
                            .ok_or(StridedError::OffsetOverflow)?,
                    );
                    axis += 1;
                }
            }
        }

        shape.extend_from_slice(&src_shape[axis..]);
        strides.extend_from_slice(&src_strides[axis..]);
        Ok(Layout::from_parts(shape, strides, offset))
    }
}
