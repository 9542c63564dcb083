//! Element-wise execution over strided views.
//!
//! This crate drives kernels over [`StridedView`]s of arbitrary layout:
//!
//! - [`apply`]: the generic engine (`apply_noary` .. `apply_ternary`,
//!   `reduce_axis_into`) walking operands in lockstep
//! - [`scalar`]: per-type registries of scalar kernels ([`UnaryOp`],
//!   [`BinaryOp`], [`CompareOp`])
//! - [`vector`]: lane-batched kernels for unit-stride rows
//! - [`ops`]: the [`Dispatcher`] choosing between them, plus free functions
//!   using the default configuration
//!
//! # Features
//!
//! - `parallel` (default): split the outermost axis across the rayon pool
//!   once an operation covers more than [`MINTHREADLENGTH`] elements
//! - `simd`: runtime CPU-feature dispatch through `pulp` for rows of at least
//!   [`SIMD_DISPATCH_MIN_LEN`] elements
//!
//! # Example
//!
//! ```rust
//! use ndstride_kernel::{ops, StridedArray};
//!
//! let a = StridedArray::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
//! let b = StridedArray::from_vec(vec![10.0, 20.0, 30.0], &[3]).unwrap();
//! let b = b.view().broadcast_to(&[2, 3]).unwrap();
//!
//! let mut out = StridedArray::<f64>::row_major(&[2, 3]);
//! ops::add_into(&mut out.view_mut(), &a.view(), &b).unwrap();
//! assert_eq!(out.to_vec(), vec![11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);
//!
//! let mut col = StridedArray::<f64>::row_major(&[3]);
//! ops::sum_axis_into(&mut col.view_mut(), &a.view(), 0).unwrap();
//! assert_eq!(col.to_vec(), vec![5.0, 7.0, 9.0]);
//! ```

pub mod apply;
mod kernel;
pub mod maybe_sync;
pub mod ops;
pub mod scalar;
mod simd;
mod threading;
pub mod vector;

pub use apply::{apply_binary, apply_noary, apply_ternary, apply_unary, reduce_axis_into, Engine};
pub use maybe_sync::{MaybeSendSync, MaybeSync};
pub use ops::Dispatcher;
pub use scalar::{BinaryOp, CompareOp, KernelElement, KernelSet, UnaryOp};
pub use simd::SIMD_DISPATCH_MIN_LEN;
pub use threading::MINTHREADLENGTH;
pub use vector::{Operand, VectorElement};

pub use ndstride_view::{
    broadcast_layouts, broadcast_shapes, Element, ElementKind, ErrorKind, FloatElement, Layout,
    NumElement, PositionIter, SliceSpec, StridedArray, StridedError, StridedView, StridedViewMut,
};

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, StridedError>;
