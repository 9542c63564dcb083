//! NumPy-style strided N-dimensional arrays.
//!
//! `ndstride` is the array front-end over two lower layers:
//!
//! - [`ndstride_view`]: the [`Layout`] algebra (broadcast, slice, transpose,
//!   reshape, diagonal) and borrowed [`StridedView`]s over a
//!   [`StridedArray`]'s buffer
//! - [`ndstride_kernel`]: the apply engine and the [`Dispatcher`] running
//!   element-wise kernels and reductions over views
//!
//! The functions in this crate take views of any layout, broadcast them to a
//! common shape, allocate a row-major result and run the default dispatcher.
//! Use [`ops`] directly to write into an existing target instead.
//!
//! # Example
//!
//! ```rust
//! use ndstride::StridedArray;
//!
//! let a = StridedArray::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
//! let b = StridedArray::from_vec(vec![10.0, 20.0, 30.0], &[3]).unwrap();
//!
//! let c = ndstride::add(&a.view(), &b.view()).unwrap();
//! assert_eq!(c.shape(), &[2, 3]);
//! assert_eq!(c.to_vec(), vec![11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);
//!
//! let cols = ndstride::sum_axis(&c.view(), 0).unwrap();
//! assert_eq!(cols.to_vec(), vec![25.0, 47.0, 69.0]);
//!
//! let t = ndstride::to_contiguous(&a.view().transpose()).unwrap();
//! assert_eq!(t.to_vec(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
//! ```

pub use ndstride_kernel::{
    apply, apply_binary, apply_noary, apply_ternary, apply_unary, ops, reduce_axis_into, scalar,
    vector, BinaryOp, CompareOp, Dispatcher, Engine, KernelElement, UnaryOp, MINTHREADLENGTH,
    SIMD_DISPATCH_MIN_LEN,
};
pub use ndstride_view::{
    broadcast_layouts, broadcast_shapes, Element, ElementKind, ErrorKind, FloatElement, Layout,
    NumElement, PositionIter, SliceSpec, StridedArray, StridedError, StridedView, StridedViewMut,
};

use num_traits::AsPrimitive;

/// Result type for array operations.
pub type Result<T> = std::result::Result<T, StridedError>;

// ============================================================================
// Broadcasting
// ============================================================================

fn broadcast2<'a, 'b, A, B>(
    a: &StridedView<'a, A>,
    b: &StridedView<'b, B>,
) -> Result<(StridedView<'a, A>, StridedView<'b, B>)> {
    let layouts = broadcast_layouts(&[a.layout(), b.layout()])?;
    let mut layouts = layouts.into_iter();
    match (layouts.next(), layouts.next()) {
        (Some(la), Some(lb)) => Ok((a.with_layout(la)?, b.with_layout(lb)?)),
        _ => Err(StridedError::RankMismatch(a.rank(), b.rank())),
    }
}

/// View `a` with the given shape, padding leading axes and repeating size-1
/// axes with stride 0.
pub fn broadcast_to<'a, T>(a: &StridedView<'a, T>, shape: &[usize]) -> Result<StridedView<'a, T>> {
    a.broadcast_to(shape)
}

fn reduced_shape(shape: &[usize], axis: usize) -> Result<Vec<usize>> {
    if axis >= shape.len() {
        return Err(StridedError::InvalidAxis {
            axis,
            rank: shape.len(),
        });
    }
    let mut out = shape.to_vec();
    out.remove(axis);
    Ok(out)
}

// ============================================================================
// Element-wise
// ============================================================================

/// `op(a, b)` with broadcasting.
pub fn binary<T: KernelElement>(
    op: BinaryOp,
    a: &StridedView<'_, T>,
    b: &StridedView<'_, T>,
) -> Result<StridedArray<T>> {
    let (a, b) = broadcast2(a, b)?;
    let mut out = StridedArray::row_major(a.shape());
    ops::binary_into(op, &mut out.view_mut(), &a, &b)?;
    Ok(out)
}

pub fn add<T: KernelElement>(a: &StridedView<'_, T>, b: &StridedView<'_, T>) -> Result<StridedArray<T>> {
    binary(BinaryOp::Add, a, b)
}

pub fn sub<T: KernelElement>(a: &StridedView<'_, T>, b: &StridedView<'_, T>) -> Result<StridedArray<T>> {
    binary(BinaryOp::Sub, a, b)
}

pub fn mul<T: KernelElement>(a: &StridedView<'_, T>, b: &StridedView<'_, T>) -> Result<StridedArray<T>> {
    binary(BinaryOp::Mul, a, b)
}

/// Element-wise quotient. Integer division by zero is an error.
pub fn div<T: KernelElement>(a: &StridedView<'_, T>, b: &StridedView<'_, T>) -> Result<StridedArray<T>> {
    binary(BinaryOp::Div, a, b)
}

/// Truncated remainder: the sign follows the dividend.
pub fn rem<T: KernelElement>(a: &StridedView<'_, T>, b: &StridedView<'_, T>) -> Result<StridedArray<T>> {
    binary(BinaryOp::Rem, a, b)
}

pub fn minimum<T: KernelElement>(
    a: &StridedView<'_, T>,
    b: &StridedView<'_, T>,
) -> Result<StridedArray<T>> {
    binary(BinaryOp::Min, a, b)
}

pub fn maximum<T: KernelElement>(
    a: &StridedView<'_, T>,
    b: &StridedView<'_, T>,
) -> Result<StridedArray<T>> {
    binary(BinaryOp::Max, a, b)
}

/// `op(a, scalar)` for every element of `a`.
pub fn binary_scalar<T: KernelElement>(
    op: BinaryOp,
    a: &StridedView<'_, T>,
    scalar: T,
) -> Result<StridedArray<T>> {
    let mut out = StridedArray::row_major(a.shape());
    ops::scalar_binary_into(op, &mut out.view_mut(), a, scalar)?;
    Ok(out)
}

pub fn map_unary<T: KernelElement>(op: UnaryOp, a: &StridedView<'_, T>) -> Result<StridedArray<T>> {
    let mut out = StridedArray::row_major(a.shape());
    ops::unary_into(op, &mut out.view_mut(), a)?;
    Ok(out)
}

/// Element-wise comparison with broadcasting.
pub fn compare<T: KernelElement>(
    op: CompareOp,
    a: &StridedView<'_, T>,
    b: &StridedView<'_, T>,
) -> Result<StridedArray<bool>> {
    let (a, b) = broadcast2(a, b)?;
    let mut out = StridedArray::row_major(a.shape());
    ops::compare_into(op, &mut out.view_mut(), &a, &b)?;
    Ok(out)
}

/// `a` where `cond` is non-zero, `b` elsewhere; all three broadcast together.
pub fn select<C: Element, T: KernelElement>(
    cond: &StridedView<'_, C>,
    a: &StridedView<'_, T>,
    b: &StridedView<'_, T>,
) -> Result<StridedArray<T>> {
    let layouts = broadcast_layouts(&[cond.layout(), a.layout(), b.layout()])?;
    let [lc, la, lb]: [Layout; 3] = layouts
        .try_into()
        .map_err(|_| StridedError::RankMismatch(cond.rank(), a.rank()))?;
    let (cond, a, b) = (cond.with_layout(lc)?, a.with_layout(la)?, b.with_layout(lb)?);
    let mut out = StridedArray::row_major(a.shape());
    ops::select_into(&mut out.view_mut(), &cond, &a, &b)?;
    Ok(out)
}

pub fn clamp<T: KernelElement>(a: &StridedView<'_, T>, lo: T, hi: T) -> Result<StridedArray<T>> {
    let mut out = StridedArray::row_major(a.shape());
    ops::clamp_into(&mut out.view_mut(), a, lo, hi)?;
    Ok(out)
}

/// Convert every element with Rust `as` semantics.
pub fn cast<D, S>(a: &StridedView<'_, S>) -> Result<StridedArray<D>>
where
    D: Element,
    S: Element + AsPrimitive<D>,
{
    let mut out = StridedArray::row_major(a.shape());
    ops::cast_into(&mut out.view_mut(), a)?;
    Ok(out)
}

// ============================================================================
// Reductions
// ============================================================================

macro_rules! axis_reduction {
    ($(#[$meta:meta])* $name:ident, $into:ident, $out:ty, [$($bound:tt)+]) => {
        $(#[$meta])*
        pub fn $name<T: $($bound)+>(a: &StridedView<'_, T>, axis: usize) -> Result<StridedArray<$out>> {
            let mut out = StridedArray::row_major(&reduced_shape(a.shape(), axis)?);
            ops::$into(&mut out.view_mut(), a, axis)?;
            Ok(out)
        }
    };
}

axis_reduction!(
    /// Sum along `axis`; the axis is removed from the result.
    sum_axis, sum_axis_into, T, [KernelElement + NumElement]
);
axis_reduction!(prod_axis, prod_axis_into, T, [KernelElement + NumElement]);
axis_reduction!(
    /// Largest element along `axis`. An empty axis is an error.
    max_axis, max_axis_into, T, [KernelElement]
);
axis_reduction!(min_axis, min_axis_into, T, [KernelElement]);
axis_reduction!(
    /// Index of the first largest element along `axis`.
    argmax_axis, argmax_axis_into, i64, [KernelElement]
);
axis_reduction!(argmin_axis, argmin_axis_into, i64, [KernelElement]);
axis_reduction!(count_nonzero_axis, count_nonzero_axis_into, i64, [KernelElement]);
axis_reduction!(any_axis, any_axis_into, bool, [KernelElement]);
axis_reduction!(all_axis, all_axis_into, bool, [KernelElement]);

// ============================================================================
// Layout
// ============================================================================

/// Outcome of [`reshape`]: a view of the same buffer when the layout allows
/// it, otherwise a fresh row-major copy.
#[derive(Debug)]
pub enum Reshaped<'a, T> {
    View(StridedView<'a, T>),
    Copied(StridedArray<T>),
}

impl<T> Reshaped<'_, T> {
    pub fn is_view(&self) -> bool {
        matches!(self, Reshaped::View(_))
    }

    pub fn view(&self) -> StridedView<'_, T> {
        match self {
            Reshaped::View(v) => v.clone(),
            Reshaped::Copied(a) => a.view(),
        }
    }
}

/// Reshape `a`; `-1` in `shape` is inferred from the element count.
///
/// Row-major element order is preserved. Data is copied only when no stride
/// assignment can express the new shape over the existing buffer.
pub fn reshape<'a, T: KernelElement>(a: &StridedView<'a, T>, shape: &[isize]) -> Result<Reshaped<'a, T>> {
    if let Some(view) = a.try_reshape(shape)? {
        return Ok(Reshaped::View(view));
    }
    tracing::debug!(from = ?a.shape(), to = ?shape, "reshape requires a copy");
    let dense = to_contiguous(a)?;
    let layout = dense.layout().reshape_view(shape)?;
    let (data, _) = dense.into_parts();
    Ok(Reshaped::Copied(StridedArray::from_parts(data, layout)?))
}

/// Row-major copy of `a`.
pub fn to_contiguous<T: KernelElement>(a: &StridedView<'_, T>) -> Result<StridedArray<T>> {
    let mut out = StridedArray::row_major(a.shape());
    ops::copy_into(&mut out.view_mut(), a)?;
    Ok(out)
}
