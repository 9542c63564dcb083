//! Strided layout algebra and view types.
//!
//! A [`Layout`] is the immutable `(shape, offset, strides)` triple that maps a
//! multi-dimensional index to a linear buffer address. Every transformation in
//! this crate (permute, broadcast, slice, reshape, diagonal, ...) derives a new
//! layout and never touches the data it describes.
//!
//! # Core Types
//!
//! - [`Layout`]: shape/offset/stride descriptor and its pure transforms
//! - [`SliceSpec`]: per-axis slice specifier consumed by [`Layout::slice`]
//! - [`PositionIter`]: row-major walk over a sub-range of a layout's axes
//! - [`StridedView`] / [`StridedViewMut`]: a layout paired with a borrowed buffer
//! - [`StridedArray`]: owned buffer plus layout
//!
//! # Example
//!
//! ```rust
//! use ndstride_view::{SliceSpec, StridedArray};
//!
//! let a = StridedArray::from_vec(vec![1, 2, 3, 4, 5, 6], &[2, 3]).unwrap();
//! let row = a.view().slice(&[SliceSpec::Index(1), SliceSpec::range(0, 1)]).unwrap();
//! assert_eq!(row.to_vec(), vec![4, 5]);
//! ```

pub mod layout;
pub mod position;
mod reshape;
pub mod slice;
pub mod strided_view;

pub use layout::{broadcast_layouts, broadcast_shapes, col_major_strides, row_major_strides, Layout};
pub use ndstride_traits::{Element, ElementKind, FloatElement, NumElement};
pub use position::PositionIter;
pub use slice::SliceSpec;
pub use strided_view::{StridedArray, StridedView, StridedViewMut};

// ============================================================================
// Error types
// ============================================================================

/// Coarse classification of [`StridedError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rank/shape mismatch, non-broadcastable shapes, wrong axis count.
    Shape,
    /// Index, bound, axis or permutation outside its valid range.
    Range,
    /// No kernel exists for the requested element type and operation.
    UnsupportedOperation,
    /// A view-only reshape was requested but the layout needs a copy.
    Reshape,
    /// A layout addresses memory outside its buffer.
    Bounds,
    /// The operation is defined but the input values are not (e.g. integer
    /// division by zero).
    Arithmetic,
}

/// Errors produced by layout transforms and the kernels built on them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StridedError {
    /// Array ranks do not match.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Array shapes are incompatible for the operation.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// A single axis cannot be broadcast to the requested size.
    #[error("cannot broadcast axis {axis} from size {from} to {to}")]
    NotBroadcastable { axis: usize, from: usize, to: usize },

    /// A set of shapes has no common broadcast shape.
    #[error("shapes cannot be broadcast together: {0:?}")]
    IncompatibleShapes(Vec<Vec<usize>>),

    /// The requested reshape is malformed.
    #[error("cannot reshape {from:?} into {to:?}: {reason}")]
    InvalidReshape {
        from: Vec<usize>,
        to: Vec<isize>,
        reason: &'static str,
    },

    /// More slice specifiers than axes.
    #[error("too many slice specifiers: {given} for rank {rank}")]
    TooManyIndices { given: usize, rank: usize },

    /// Stride array length doesn't match dimensions.
    #[error("stride and dims length mismatch")]
    StrideLengthMismatch,

    /// Invalid axis index for the given array rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// Index or slice bound outside `[0, size)`.
    #[error("index {index} out of range for axis {axis} of size {size}")]
    IndexOutOfRange {
        axis: usize,
        index: usize,
        size: usize,
    },

    /// Axis list is not a permutation of `0..rank`.
    #[error("invalid permutation {0:?}")]
    InvalidPermutation(Vec<usize>),

    /// Slice with step zero.
    #[error("slice step must be non-zero (axis {axis})")]
    ZeroStep { axis: usize },

    /// More than one `SliceSpec::Rest` in a slice expression.
    #[error("at most one Rest specifier is allowed")]
    MultipleRest,

    /// Integer overflow while computing an address.
    #[error("offset overflow while computing pointer")]
    OffsetOverflow,

    /// Layout addresses an element outside the buffer.
    #[error("layout addresses element {index} outside buffer of length {len}")]
    OutOfBounds { index: isize, len: usize },

    /// No kernel is registered for this operation and element type.
    #[error("operation {op} not implemented for element type {kind}")]
    UnsupportedOperation { op: &'static str, kind: ElementKind },

    /// A view-only reshape is impossible without copying.
    #[error("reshape of {from:?} into {to:?} requires a copy")]
    ReshapeNeedsCopy { from: Vec<usize>, to: Vec<usize> },

    /// Integer division or remainder with a zero divisor.
    #[error("integer division by zero")]
    DivisionByZero,

    /// A reduction without an identity (max, argmin, ...) over zero elements.
    #[error("reduction over an empty axis {axis:?} has no identity")]
    EmptyReduction { axis: Option<usize> },
}

impl StridedError {
    /// Which family of precondition this error reports.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StridedError::RankMismatch(..)
            | StridedError::ShapeMismatch(..)
            | StridedError::NotBroadcastable { .. }
            | StridedError::IncompatibleShapes(_)
            | StridedError::InvalidReshape { .. }
            | StridedError::TooManyIndices { .. }
            | StridedError::StrideLengthMismatch
            | StridedError::EmptyReduction { .. } => ErrorKind::Shape,
            StridedError::InvalidAxis { .. }
            | StridedError::IndexOutOfRange { .. }
            | StridedError::InvalidPermutation(_)
            | StridedError::ZeroStep { .. }
            | StridedError::MultipleRest => ErrorKind::Range,
            StridedError::OffsetOverflow | StridedError::OutOfBounds { .. } => ErrorKind::Bounds,
            StridedError::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            StridedError::ReshapeNeedsCopy { .. } => ErrorKind::Reshape,
            StridedError::DivisionByZero => ErrorKind::Arithmetic,
        }
    }
}

/// Result type for strided array operations.
pub type Result<T> = std::result::Result<T, StridedError>;
