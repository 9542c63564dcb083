//! Backend dispatcher: named operations over views.
//!
//! Every operation resolves its scalar kernel from the registry first (so an
//! unsupported `(op, type)` pair fails before anything is written), checks
//! shapes, then either hands contiguous rows to the vector library or runs the
//! generic apply engine with the scalar kernel.

use ndstride_traits::{Element, NumElement};
use ndstride_view::{Layout, StridedError, StridedView, StridedViewMut};
use num_traits::AsPrimitive;

use crate::apply::{for_each_row, Engine};
use crate::kernel::{check_axis, contiguous_span, ensure_same_shape, inner_axis_vectorizable};
use crate::maybe_sync::MaybeSync;
use crate::scalar::{func, BinaryOp, CompareOp, KernelElement, UnaryOp};
use crate::threading::SendPtr;
use crate::vector::Operand;
use crate::Result;

/// Row view of a source for the vector kernels.
///
/// # Safety
/// `ptr` must address `len` valid elements with unit stride, or at least one
/// when `stride == 0`.
#[inline(always)]
unsafe fn operand<'a, T: Copy>(ptr: *const T, stride: isize, len: usize) -> Operand<'a, T> {
    if stride == 0 {
        Operand::Splat(*ptr)
    } else {
        Operand::Slice(std::slice::from_raw_parts(ptr, len))
    }
}

fn last_axis(rank: usize) -> Result<usize> {
    rank.checked_sub(1)
        .ok_or(StridedError::InvalidAxis { axis: 0, rank })
}

/// Reductions without an identity cannot produce a value for an empty axis
/// unless there is nothing to write.
fn ensure_reducible(src: &Layout, axis: usize) -> Result<()> {
    check_axis(axis, src.rank())?;
    let shape = src.shape();
    let outer_nonempty = shape
        .iter()
        .enumerate()
        .all(|(d, &n)| d == axis || n > 0);
    if shape[axis] == 0 && outer_nonempty {
        return Err(StridedError::EmptyReduction { axis: Some(axis) });
    }
    Ok(())
}

/// Run-time switches for the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatcher {
    /// Route eligible rows through the vector kernel library.
    pub vectorize: bool,
    /// Allow the apply engine to split work across threads.
    pub parallel: bool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {
            vectorize: true,
            parallel: true,
        }
    }
}

impl Dispatcher {
    /// Scalar path only; useful as a reference when checking the vector path.
    pub fn scalar() -> Self {
        Self {
            vectorize: false,
            ..Self::default()
        }
    }

    fn engine(&self) -> Engine {
        Engine {
            parallel: self.parallel,
        }
    }

    fn use_vector<T: Element>(&self, supported: bool, dest: &Layout, sources: &[&Layout]) -> bool {
        let vector = self.vectorize
            && T::LANES > 0
            && supported
            && inner_axis_vectorizable(dest, sources);
        tracing::trace!(
            kind = %T::KIND,
            path = if vector { "vector" } else { "scalar" },
            len = dest.len(),
            "element-wise dispatch"
        );
        vector
    }

    fn vector_rows1<T, K>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        src: Option<&StridedView<'_, T>>,
        kernel: K,
    ) -> Result<()>
    where
        T: KernelElement,
        K: Fn(&mut [T], Option<Operand<'_, T>>) + MaybeSync,
    {
        let dp = SendPtr(dest.as_mut_ptr());
        let layout = dest.layout();
        let parallel = self.engine().parallel_for(layout);
        match src {
            None => for_each_row([layout], parallel, |_, base, len, _| unsafe {
                kernel(
                    std::slice::from_raw_parts_mut(dp.as_ptr().offset(base[0]), len),
                    None,
                )
            }),
            Some(src) => {
                let sp = SendPtr::from_const(src.as_ptr());
                for_each_row(
                    [layout, src.layout()],
                    parallel,
                    |_, base, len, st| unsafe {
                        kernel(
                            std::slice::from_raw_parts_mut(dp.as_ptr().offset(base[0]), len),
                            Some(operand(sp.as_const().offset(base[1]), st[1], len)),
                        )
                    },
                )
            }
        }
    }

    fn vector_rows2<T: KernelElement>(
        &self,
        op: BinaryOp,
        dest: &mut StridedViewMut<'_, T>,
        a: &StridedView<'_, T>,
        b: &StridedView<'_, T>,
    ) -> Result<()> {
        let dp = SendPtr(dest.as_mut_ptr());
        let ap = SendPtr::from_const(a.as_ptr());
        let bp = SendPtr::from_const(b.as_ptr());
        let layout = dest.layout();
        for_each_row(
            [layout, a.layout(), b.layout()],
            self.engine().parallel_for(layout),
            |_, base, len, st| unsafe {
                let handled = T::vector_binary(
                    op,
                    std::slice::from_raw_parts_mut(dp.as_ptr().offset(base[0]), len),
                    operand(ap.as_const().offset(base[1]), st[1], len),
                    operand(bp.as_const().offset(base[2]), st[2], len),
                );
                debug_assert!(handled);
            },
        )
    }

    // ------------------------------------------------------------------------
    // Element-wise
    // ------------------------------------------------------------------------

    /// Set every element of `dest` to `value`.
    pub fn fill<T: KernelElement>(&self, dest: &mut StridedViewMut<'_, T>, value: T) -> Result<()> {
        if self.use_vector::<T>(true, dest.layout(), &[]) {
            return self.vector_rows1(dest, None, |dst, _| {
                T::vector_fill(dst, value);
            });
        }
        self.engine().noary(dest, |_| value)
    }

    /// `dest[pos] = f(pos)`.
    pub fn fill_with<T, F>(&self, dest: &mut StridedViewMut<'_, T>, f: F) -> Result<()>
    where
        T: KernelElement,
        F: Fn(&[usize]) -> T + MaybeSync,
    {
        self.engine().noary(dest, f)
    }

    /// `dest[pos] = start + i * step`, where `i` is the row-major rank of `pos`.
    pub fn arange<T>(&self, dest: &mut StridedViewMut<'_, T>, start: T, step: T) -> Result<()>
    where
        T: KernelElement + NumElement,
        usize: AsPrimitive<T>,
    {
        let shape = dest.shape().to_vec();
        self.engine().noary(dest, |pos| {
            let i = pos
                .iter()
                .zip(&shape)
                .fold(0usize, |acc, (&p, &n)| acc * n + p);
            let i: T = i.as_();
            start + i * step
        })
    }

    /// `dest[pos] = src[pos]`.
    pub fn copy_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        src: &StridedView<'_, T>,
    ) -> Result<()> {
        ensure_same_shape(dest.shape(), src.shape())?;
        if self.use_vector::<T>(true, dest.layout(), &[src.layout()]) {
            return self.vector_rows1(dest, Some(src), |dst, src| {
                if let Some(src) = src {
                    T::vector_copy(dst, src);
                }
            });
        }
        self.engine().unary(dest, src, |x| x)
    }

    /// `dest[pos] = src[pos] as D`, with Rust `as` semantics.
    pub fn cast_into<D, S>(&self, dest: &mut StridedViewMut<'_, D>, src: &StridedView<'_, S>) -> Result<()>
    where
        D: Element,
        S: Element + AsPrimitive<D>,
    {
        self.engine().unary(dest, src, |x: S| x.as_())
    }

    /// `dest[pos] = op(src[pos])`.
    pub fn unary_into<T: KernelElement>(
        &self,
        op: UnaryOp,
        dest: &mut StridedViewMut<'_, T>,
        src: &StridedView<'_, T>,
    ) -> Result<()> {
        let f = T::kernels().unary(op)?;
        ensure_same_shape(dest.shape(), src.shape())?;
        if self.use_vector::<T>(T::vector_supports_unary(op), dest.layout(), &[src.layout()]) {
            return self.vector_rows1(dest, Some(src), |dst, src| {
                if let Some(src) = src {
                    T::vector_unary(op, dst, src);
                }
            });
        }
        self.engine().unary(dest, src, f)
    }

    /// `dest[pos] = op(a[pos], b[pos])`.
    ///
    /// Integer `Div` and `Rem` fail with [`StridedError::DivisionByZero`] if
    /// any divisor is zero; nothing is written in that case.
    pub fn binary_into<T: KernelElement>(
        &self,
        op: BinaryOp,
        dest: &mut StridedViewMut<'_, T>,
        a: &StridedView<'_, T>,
        b: &StridedView<'_, T>,
    ) -> Result<()> {
        let f = T::kernels().binary(op)?;
        ensure_same_shape(dest.shape(), a.shape())?;
        ensure_same_shape(dest.shape(), b.shape())?;
        if matches!(op, BinaryOp::Div | BinaryOp::Rem)
            && T::KIND.is_integer()
            && b.iter().any(|x| !x.is_nonzero())
        {
            return Err(StridedError::DivisionByZero);
        }
        let vector = self.use_vector::<T>(
            T::vector_supports_binary(op),
            dest.layout(),
            &[a.layout(), b.layout()],
        );
        if vector {
            return self.vector_rows2(op, dest, a, b);
        }
        self.engine().binary(dest, a, b, f)
    }

    /// `dest[pos] = op(a[pos], scalar)`.
    pub fn scalar_binary_into<T: KernelElement>(
        &self,
        op: BinaryOp,
        dest: &mut StridedViewMut<'_, T>,
        a: &StridedView<'_, T>,
        scalar: T,
    ) -> Result<()> {
        let cell = [scalar];
        let layout = Layout::new(dest.shape(), &vec![0; dest.rank()], 0)?;
        let b = StridedView::new(&cell, layout)?;
        self.binary_into(op, dest, a, &b)
    }

    /// `dest[pos] = op(a[pos], b[pos])` as `bool`.
    pub fn compare_into<T: KernelElement>(
        &self,
        op: CompareOp,
        dest: &mut StridedViewMut<'_, bool>,
        a: &StridedView<'_, T>,
        b: &StridedView<'_, T>,
    ) -> Result<()> {
        let f = T::kernels().compare(op);
        self.engine().binary(dest, a, b, f)
    }

    /// `dest[pos] = if cond[pos] { a[pos] } else { b[pos] }`, where any
    /// non-zero condition counts as true.
    pub fn select_into<C: Element, T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        cond: &StridedView<'_, C>,
        a: &StridedView<'_, T>,
        b: &StridedView<'_, T>,
    ) -> Result<()> {
        self.engine()
            .ternary(dest, cond, a, b, |c: C, x, y| if c.is_nonzero() { x } else { y })
    }

    /// `dest[pos] = min(max(src[pos], lo), hi)`.
    ///
    /// With `lo > hi` every element becomes `hi`.
    pub fn clamp_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        src: &StridedView<'_, T>,
        lo: T,
        hi: T,
    ) -> Result<()> {
        self.engine()
            .unary(dest, src, |x| func::min(func::max(x, lo), hi))
    }

    pub fn add_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        a: &StridedView<'_, T>,
        b: &StridedView<'_, T>,
    ) -> Result<()> {
        self.binary_into(BinaryOp::Add, dest, a, b)
    }

    pub fn sub_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        a: &StridedView<'_, T>,
        b: &StridedView<'_, T>,
    ) -> Result<()> {
        self.binary_into(BinaryOp::Sub, dest, a, b)
    }

    pub fn mul_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        a: &StridedView<'_, T>,
        b: &StridedView<'_, T>,
    ) -> Result<()> {
        self.binary_into(BinaryOp::Mul, dest, a, b)
    }

    pub fn div_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        a: &StridedView<'_, T>,
        b: &StridedView<'_, T>,
    ) -> Result<()> {
        self.binary_into(BinaryOp::Div, dest, a, b)
    }

    pub fn rem_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        a: &StridedView<'_, T>,
        b: &StridedView<'_, T>,
    ) -> Result<()> {
        self.binary_into(BinaryOp::Rem, dest, a, b)
    }

    pub fn min_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        a: &StridedView<'_, T>,
        b: &StridedView<'_, T>,
    ) -> Result<()> {
        self.binary_into(BinaryOp::Min, dest, a, b)
    }

    pub fn max_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        a: &StridedView<'_, T>,
        b: &StridedView<'_, T>,
    ) -> Result<()> {
        self.binary_into(BinaryOp::Max, dest, a, b)
    }

    pub fn neg_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        src: &StridedView<'_, T>,
    ) -> Result<()> {
        self.unary_into(UnaryOp::Neg, dest, src)
    }

    pub fn abs_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        src: &StridedView<'_, T>,
    ) -> Result<()> {
        self.unary_into(UnaryOp::Abs, dest, src)
    }

    pub fn sqrt_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        src: &StridedView<'_, T>,
    ) -> Result<()> {
        self.unary_into(UnaryOp::Sqrt, dest, src)
    }

    // ------------------------------------------------------------------------
    // Axis reductions
    // ------------------------------------------------------------------------

    pub fn sum_axis_into<T: KernelElement + NumElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        src: &StridedView<'_, T>,
        axis: usize,
    ) -> Result<()> {
        let add = T::kernels().binary(BinaryOp::Add)?;
        self.engine()
            .reduce_axis(dest, src, axis, T::zero(), move |acc, _, x| add(acc, x), |acc| acc)
    }

    pub fn prod_axis_into<T: KernelElement + NumElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        src: &StridedView<'_, T>,
        axis: usize,
    ) -> Result<()> {
        let mul = T::kernels().binary(BinaryOp::Mul)?;
        self.engine()
            .reduce_axis(dest, src, axis, T::one(), move |acc, _, x| mul(acc, x), |acc| acc)
    }

    /// Largest element along `axis`. Fails on an empty axis.
    pub fn max_axis_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        src: &StridedView<'_, T>,
        axis: usize,
    ) -> Result<()> {
        self.extremum_axis_into(BinaryOp::Max, dest, src, axis)
    }

    /// Smallest element along `axis`. Fails on an empty axis.
    pub fn min_axis_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        src: &StridedView<'_, T>,
        axis: usize,
    ) -> Result<()> {
        self.extremum_axis_into(BinaryOp::Min, dest, src, axis)
    }

    fn extremum_axis_into<T: KernelElement>(
        &self,
        op: BinaryOp,
        dest: &mut StridedViewMut<'_, T>,
        src: &StridedView<'_, T>,
        axis: usize,
    ) -> Result<()> {
        let pick = T::kernels().binary(op)?;
        ensure_reducible(src.layout(), axis)?;
        self.engine().reduce_axis(
            dest,
            src,
            axis,
            None,
            move |acc: Option<T>, _, x| Some(acc.map_or(x, |m| pick(m, x))),
            |acc| acc.unwrap_or_default(),
        )
    }

    /// Index of the first maximum along `axis`.
    pub fn argmax_axis_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, i64>,
        src: &StridedView<'_, T>,
        axis: usize,
    ) -> Result<()> {
        self.arg_extremum_axis_into(CompareOp::Gt, dest, src, axis)
    }

    /// Index of the first minimum along `axis`.
    pub fn argmin_axis_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, i64>,
        src: &StridedView<'_, T>,
        axis: usize,
    ) -> Result<()> {
        self.arg_extremum_axis_into(CompareOp::Lt, dest, src, axis)
    }

    /// A later element replaces the current best only if `better(x, best)`,
    /// so ties keep the first index.
    fn arg_extremum_axis_into<T: KernelElement>(
        &self,
        op: CompareOp,
        dest: &mut StridedViewMut<'_, i64>,
        src: &StridedView<'_, T>,
        axis: usize,
    ) -> Result<()> {
        let better = T::kernels().compare(op);
        ensure_reducible(src.layout(), axis)?;
        self.engine().reduce_axis(
            dest,
            src,
            axis,
            None,
            move |acc: Option<(usize, T)>, k, x| match acc {
                Some((i, best)) if !better(x, best) => Some((i, best)),
                _ => Some((k, x)),
            },
            |acc| acc.map_or(-1, |(i, _)| i as i64),
        )
    }

    pub fn count_nonzero_axis_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, i64>,
        src: &StridedView<'_, T>,
        axis: usize,
    ) -> Result<()> {
        self.engine().reduce_axis(
            dest,
            src,
            axis,
            0i64,
            |acc, _, x: T| acc + i64::from(x.is_nonzero()),
            |acc| acc,
        )
    }

    pub fn any_axis_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, bool>,
        src: &StridedView<'_, T>,
        axis: usize,
    ) -> Result<()> {
        self.engine()
            .reduce_axis(dest, src, axis, false, |acc, _, x: T| acc || x.is_nonzero(), |acc| acc)
    }

    pub fn all_axis_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, bool>,
        src: &StridedView<'_, T>,
        axis: usize,
    ) -> Result<()> {
        self.engine()
            .reduce_axis(dest, src, axis, true, |acc, _, x: T| acc && x.is_nonzero(), |acc| acc)
    }

    /// Index of the first element equal to `value` along `axis`, `-1` if none.
    pub fn find_first_axis_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, i64>,
        src: &StridedView<'_, T>,
        axis: usize,
        value: T,
    ) -> Result<()> {
        self.engine().reduce_axis(
            dest,
            src,
            axis,
            -1i64,
            move |acc, k, x: T| {
                if acc < 0 && x == value {
                    k as i64
                } else {
                    acc
                }
            },
            |acc| acc,
        )
    }

    pub fn sum_last_axis_into<T: KernelElement + NumElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        src: &StridedView<'_, T>,
    ) -> Result<()> {
        self.sum_axis_into(dest, src, last_axis(src.rank())?)
    }

    pub fn prod_last_axis_into<T: KernelElement + NumElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        src: &StridedView<'_, T>,
    ) -> Result<()> {
        self.prod_axis_into(dest, src, last_axis(src.rank())?)
    }

    pub fn max_last_axis_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        src: &StridedView<'_, T>,
    ) -> Result<()> {
        self.max_axis_into(dest, src, last_axis(src.rank())?)
    }

    pub fn min_last_axis_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, T>,
        src: &StridedView<'_, T>,
    ) -> Result<()> {
        self.min_axis_into(dest, src, last_axis(src.rank())?)
    }

    pub fn argmax_last_axis_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, i64>,
        src: &StridedView<'_, T>,
    ) -> Result<()> {
        self.argmax_axis_into(dest, src, last_axis(src.rank())?)
    }

    pub fn argmin_last_axis_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, i64>,
        src: &StridedView<'_, T>,
    ) -> Result<()> {
        self.argmin_axis_into(dest, src, last_axis(src.rank())?)
    }

    pub fn count_nonzero_last_axis_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, i64>,
        src: &StridedView<'_, T>,
    ) -> Result<()> {
        self.count_nonzero_axis_into(dest, src, last_axis(src.rank())?)
    }

    pub fn any_last_axis_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, bool>,
        src: &StridedView<'_, T>,
    ) -> Result<()> {
        self.any_axis_into(dest, src, last_axis(src.rank())?)
    }

    pub fn all_last_axis_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, bool>,
        src: &StridedView<'_, T>,
    ) -> Result<()> {
        self.all_axis_into(dest, src, last_axis(src.rank())?)
    }

    pub fn find_first_last_axis_into<T: KernelElement>(
        &self,
        dest: &mut StridedViewMut<'_, i64>,
        src: &StridedView<'_, T>,
        value: T,
    ) -> Result<()> {
        self.find_first_axis_into(dest, src, last_axis(src.rank())?, value)
    }

    // ------------------------------------------------------------------------
    // Full reductions
    // ------------------------------------------------------------------------

    /// Sum of every element; `0` for an empty view.
    ///
    /// A contiguous float view may be summed with explicit SIMD, which
    /// reassociates the additions.
    pub fn sum<T: KernelElement + NumElement>(&self, src: &StridedView<'_, T>) -> Result<T> {
        let add = T::kernels().binary(BinaryOp::Add)?;
        if self.vectorize {
            if let Some((start, len)) = contiguous_span(src.layout()) {
                if let Some(total) = T::simd_sum(&src.data()[start..start + len]) {
                    tracing::trace!(kind = %T::KIND, len, "simd sum");
                    return Ok(total);
                }
            }
        }
        Ok(src.iter().fold(T::zero(), add))
    }

    /// Largest element. Fails on an empty view.
    pub fn max<T: KernelElement>(&self, src: &StridedView<'_, T>) -> Result<T> {
        self.extremum(BinaryOp::Max, src)
    }

    /// Smallest element. Fails on an empty view.
    pub fn min<T: KernelElement>(&self, src: &StridedView<'_, T>) -> Result<T> {
        self.extremum(BinaryOp::Min, src)
    }

    fn extremum<T: KernelElement>(&self, op: BinaryOp, src: &StridedView<'_, T>) -> Result<T> {
        let pick = T::kernels().binary(op)?;
        let mut values = src.iter();
        let first = values
            .next()
            .ok_or(StridedError::EmptyReduction { axis: None })?;
        Ok(values.fold(first, pick))
    }
}

// ============================================================================
// Free functions (default dispatcher)
// ============================================================================

pub fn fill<T: KernelElement>(dest: &mut StridedViewMut<'_, T>, value: T) -> Result<()> {
    Dispatcher::default().fill(dest, value)
}

pub fn fill_with<T, F>(dest: &mut StridedViewMut<'_, T>, f: F) -> Result<()>
where
    T: KernelElement,
    F: Fn(&[usize]) -> T + MaybeSync,
{
    Dispatcher::default().fill_with(dest, f)
}

pub fn arange<T>(dest: &mut StridedViewMut<'_, T>, start: T, step: T) -> Result<()>
where
    T: KernelElement + NumElement,
    usize: AsPrimitive<T>,
{
    Dispatcher::default().arange(dest, start, step)
}

pub fn copy_into<T: KernelElement>(
    dest: &mut StridedViewMut<'_, T>,
    src: &StridedView<'_, T>,
) -> Result<()> {
    Dispatcher::default().copy_into(dest, src)
}

pub fn cast_into<D, S>(dest: &mut StridedViewMut<'_, D>, src: &StridedView<'_, S>) -> Result<()>
where
    D: Element,
    S: Element + AsPrimitive<D>,
{
    Dispatcher::default().cast_into(dest, src)
}

pub fn unary_into<T: KernelElement>(
    op: UnaryOp,
    dest: &mut StridedViewMut<'_, T>,
    src: &StridedView<'_, T>,
) -> Result<()> {
    Dispatcher::default().unary_into(op, dest, src)
}

pub fn binary_into<T: KernelElement>(
    op: BinaryOp,
    dest: &mut StridedViewMut<'_, T>,
    a: &StridedView<'_, T>,
    b: &StridedView<'_, T>,
) -> Result<()> {
    Dispatcher::default().binary_into(op, dest, a, b)
}

pub fn scalar_binary_into<T: KernelElement>(
    op: BinaryOp,
    dest: &mut StridedViewMut<'_, T>,
    a: &StridedView<'_, T>,
    scalar: T,
) -> Result<()> {
    Dispatcher::default().scalar_binary_into(op, dest, a, scalar)
}

pub fn compare_into<T: KernelElement>(
    op: CompareOp,
    dest: &mut StridedViewMut<'_, bool>,
    a: &StridedView<'_, T>,
    b: &StridedView<'_, T>,
) -> Result<()> {
    Dispatcher::default().compare_into(op, dest, a, b)
}

pub fn select_into<C: Element, T: KernelElement>(
    dest: &mut StridedViewMut<'_, T>,
    cond: &StridedView<'_, C>,
    a: &StridedView<'_, T>,
    b: &StridedView<'_, T>,
) -> Result<()> {
    Dispatcher::default().select_into(dest, cond, a, b)
}

pub fn clamp_into<T: KernelElement>(
    dest: &mut StridedViewMut<'_, T>,
    src: &StridedView<'_, T>,
    lo: T,
    hi: T,
) -> Result<()> {
    Dispatcher::default().clamp_into(dest, src, lo, hi)
}

macro_rules! free_binary {
    ($($name:ident),* $(,)?) => {$(
        pub fn $name<T: KernelElement>(
            dest: &mut StridedViewMut<'_, T>,
            a: &StridedView<'_, T>,
            b: &StridedView<'_, T>,
        ) -> Result<()> {
            Dispatcher::default().$name(dest, a, b)
        }
    )*};
}

macro_rules! free_unary {
    ($($name:ident),* $(,)?) => {$(
        pub fn $name<T: KernelElement>(
            dest: &mut StridedViewMut<'_, T>,
            src: &StridedView<'_, T>,
        ) -> Result<()> {
            Dispatcher::default().$name(dest, src)
        }
    )*};
}

free_binary!(add_into, sub_into, mul_into, div_into, rem_into, min_into, max_into);
free_unary!(neg_into, abs_into, sqrt_into);

pub fn sum_axis_into<T: KernelElement + NumElement>(
    dest: &mut StridedViewMut<'_, T>,
    src: &StridedView<'_, T>,
    axis: usize,
) -> Result<()> {
    Dispatcher::default().sum_axis_into(dest, src, axis)
}

pub fn prod_axis_into<T: KernelElement + NumElement>(
    dest: &mut StridedViewMut<'_, T>,
    src: &StridedView<'_, T>,
    axis: usize,
) -> Result<()> {
    Dispatcher::default().prod_axis_into(dest, src, axis)
}

pub fn max_axis_into<T: KernelElement>(
    dest: &mut StridedViewMut<'_, T>,
    src: &StridedView<'_, T>,
    axis: usize,
) -> Result<()> {
    Dispatcher::default().max_axis_into(dest, src, axis)
}

pub fn min_axis_into<T: KernelElement>(
    dest: &mut StridedViewMut<'_, T>,
    src: &StridedView<'_, T>,
    axis: usize,
) -> Result<()> {
    Dispatcher::default().min_axis_into(dest, src, axis)
}

pub fn argmax_axis_into<T: KernelElement>(
    dest: &mut StridedViewMut<'_, i64>,
    src: &StridedView<'_, T>,
    axis: usize,
) -> Result<()> {
    Dispatcher::default().argmax_axis_into(dest, src, axis)
}

pub fn argmin_axis_into<T: KernelElement>(
    dest: &mut StridedViewMut<'_, i64>,
    src: &StridedView<'_, T>,
    axis: usize,
) -> Result<()> {
    Dispatcher::default().argmin_axis_into(dest, src, axis)
}

pub fn count_nonzero_axis_into<T: KernelElement>(
    dest: &mut StridedViewMut<'_, i64>,
    src: &StridedView<'_, T>,
    axis: usize,
) -> Result<()> {
    Dispatcher::default().count_nonzero_axis_into(dest, src, axis)
}

pub fn any_axis_into<T: KernelElement>(
    dest: &mut StridedViewMut<'_, bool>,
    src: &StridedView<'_, T>,
    axis: usize,
) -> Result<()> {
    Dispatcher::default().any_axis_into(dest, src, axis)
}

pub fn all_axis_into<T: KernelElement>(
    dest: &mut StridedViewMut<'_, bool>,
    src: &StridedView<'_, T>,
    axis: usize,
) -> Result<()> {
    Dispatcher::default().all_axis_into(dest, src, axis)
}

pub fn find_first_axis_into<T: KernelElement>(
    dest: &mut StridedViewMut<'_, i64>,
    src: &StridedView<'_, T>,
    axis: usize,
    value: T,
) -> Result<()> {
    Dispatcher::default().find_first_axis_into(dest, src, axis, value)
}

pub fn sum_last_axis_into<T: KernelElement + NumElement>(
    dest: &mut StridedViewMut<'_, T>,
    src: &StridedView<'_, T>,
) -> Result<()> {
    Dispatcher::default().sum_last_axis_into(dest, src)
}

pub fn prod_last_axis_into<T: KernelElement + NumElement>(
    dest: &mut StridedViewMut<'_, T>,
    src: &StridedView<'_, T>,
) -> Result<()> {
    Dispatcher::default().prod_last_axis_into(dest, src)
}

free_unary!(max_last_axis_into, min_last_axis_into);

pub fn argmax_last_axis_into<T: KernelElement>(
    dest: &mut StridedViewMut<'_, i64>,
    src: &StridedView<'_, T>,
) -> Result<()> {
    Dispatcher::default().argmax_last_axis_into(dest, src)
}

pub fn argmin_last_axis_into<T: KernelElement>(
    dest: &mut StridedViewMut<'_, i64>,
    src: &StridedView<'_, T>,
) -> Result<()> {
    Dispatcher::default().argmin_last_axis_into(dest, src)
}

pub fn count_nonzero_last_axis_into<T: KernelElement>(
    dest: &mut StridedViewMut<'_, i64>,
    src: &StridedView<'_, T>,
) -> Result<()> {
    Dispatcher::default().count_nonzero_last_axis_into(dest, src)
}

pub fn any_last_axis_into<T: KernelElement>(
    dest: &mut StridedViewMut<'_, bool>,
    src: &StridedView<'_, T>,
) -> Result<()> {
    Dispatcher::default().any_last_axis_into(dest, src)
}

pub fn all_last_axis_into<T: KernelElement>(
    dest: &mut StridedViewMut<'_, bool>,
    src: &StridedView<'_, T>,
) -> Result<()> {
    Dispatcher::default().all_last_axis_into(dest, src)
}

pub fn find_first_last_axis_into<T: KernelElement>(
    dest: &mut StridedViewMut<'_, i64>,
    src: &StridedView<'_, T>,
    value: T,
) -> Result<()> {
    Dispatcher::default().find_first_last_axis_into(dest, src, value)
}

pub fn sum<T: KernelElement + NumElement>(src: &StridedView<'_, T>) -> Result<T> {
    Dispatcher::default().sum(src)
}

pub fn max<T: KernelElement>(src: &StridedView<'_, T>) -> Result<T> {
    Dispatcher::default().max(src)
}

pub fn min<T: KernelElement>(src: &StridedView<'_, T>) -> Result<T> {
    Dispatcher::default().min(src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndstride_view::{SliceSpec, StridedArray};

    #[test]
    fn test_fill_strided_target() {
        let mut a = StridedArray::full(&[4, 4], 0i32);
        {
            let mut rows = a
                .view_mut()
                .slice(&[SliceSpec::range_step(0, 3, 2), SliceSpec::Full])
                .unwrap();
            fill(&mut rows, 7).unwrap();
        }
        assert_eq!(a.get(&[0, 3]), 7);
        assert_eq!(a.get(&[1, 0]), 0);
        assert_eq!(a.get(&[2, 1]), 7);
    }

    #[test]
    fn test_arange_on_transposed_target() {
        let mut a = StridedArray::<f64>::col_major(&[2, 3]);
        arange(&mut a.view_mut(), 1.0, 0.5).unwrap();
        assert_eq!(a.to_vec(), vec![1.0, 1.5, 2.0, 2.5, 3.0, 3.5]);
    }

    #[test]
    fn test_scalar_binary() {
        let a = StridedArray::from_vec(vec![1i64, 2, 3], &[3]).unwrap();
        let mut out = StridedArray::<i64>::row_major(&[3]);
        scalar_binary_into(BinaryOp::Mul, &mut out.view_mut(), &a.view(), 10).unwrap();
        assert_eq!(out.to_vec(), vec![10, 20, 30]);
    }

    #[test]
    fn test_integer_division_by_zero_writes_nothing() {
        let a = StridedArray::from_vec(vec![6i32, 7, 8], &[3]).unwrap();
        let b = StridedArray::from_vec(vec![2i32, 0, 4], &[3]).unwrap();
        let mut out = StridedArray::full(&[3], -1i32);
        assert_eq!(
            div_into(&mut out.view_mut(), &a.view(), &b.view()),
            Err(StridedError::DivisionByZero)
        );
        assert_eq!(
            rem_into(&mut out.view_mut(), &a.view(), &b.view()),
            Err(StridedError::DivisionByZero)
        );
        assert_eq!(out.to_vec(), vec![-1, -1, -1]);
    }

    #[test]
    fn test_float_division_by_zero_is_ieee() {
        let a = StridedArray::from_vec(vec![1.0f64, -1.0], &[2]).unwrap();
        let b = StridedArray::from_vec(vec![0.0f64, 0.0], &[2]).unwrap();
        let mut out = StridedArray::<f64>::row_major(&[2]);
        div_into(&mut out.view_mut(), &a.view(), &b.view()).unwrap();
        assert_eq!(out.to_vec(), vec![f64::INFINITY, f64::NEG_INFINITY]);
    }

    #[test]
    fn test_unsupported_before_write() {
        let a = StridedArray::from_vec(vec![4i32, 9], &[2]).unwrap();
        let mut out = StridedArray::full(&[2], 0i32);
        let err = sqrt_into(&mut out.view_mut(), &a.view()).unwrap_err();
        assert!(matches!(err, StridedError::UnsupportedOperation { op: "sqrt", .. }));
        assert_eq!(out.to_vec(), vec![0, 0]);
    }

    #[test]
    fn test_compare_select_clamp() {
        let a = StridedArray::from_vec(vec![1.0f32, 5.0, 3.0], &[3]).unwrap();
        let b = StridedArray::from_vec(vec![2.0f32, 4.0, 3.0], &[3]).unwrap();
        let mut mask = StridedArray::<bool>::row_major(&[3]);
        compare_into(CompareOp::Ge, &mut mask.view_mut(), &a.view(), &b.view()).unwrap();
        assert_eq!(mask.to_vec(), vec![false, true, true]);

        let mut out = StridedArray::<f32>::row_major(&[3]);
        select_into(&mut out.view_mut(), &mask.view(), &a.view(), &b.view()).unwrap();
        assert_eq!(out.to_vec(), vec![2.0, 5.0, 3.0]);

        clamp_into(&mut out.view_mut(), &a.view(), 2.0, 4.0).unwrap();
        assert_eq!(out.to_vec(), vec![2.0, 4.0, 3.0]);
    }

    #[test]
    fn test_cast() {
        let a = StridedArray::from_vec(vec![1.7f64, -2.2, 300.0], &[3]).unwrap();
        let mut out = StridedArray::<i32>::row_major(&[3]);
        cast_into(&mut out.view_mut(), &a.view()).unwrap();
        assert_eq!(out.to_vec(), vec![1, -2, 300]);
        let mut bytes = StridedArray::<u8>::row_major(&[3]);
        cast_into(&mut bytes.view_mut(), &out.view()).unwrap();
        assert_eq!(bytes.to_vec(), vec![1, 254, 44]);
    }

    #[test]
    fn test_axis_reductions() {
        let a = StridedArray::from_vec(vec![3i64, 9, 9, 0, 4, 1], &[2, 3]).unwrap();

        let mut s = StridedArray::<i64>::row_major(&[2]);
        sum_last_axis_into(&mut s.view_mut(), &a.view()).unwrap();
        assert_eq!(s.to_vec(), vec![21, 5]);

        let mut p = StridedArray::<i64>::row_major(&[3]);
        prod_axis_into(&mut p.view_mut(), &a.view(), 0).unwrap();
        assert_eq!(p.to_vec(), vec![0, 36, 9]);

        let mut m = StridedArray::<i64>::row_major(&[2]);
        min_last_axis_into(&mut m.view_mut(), &a.view()).unwrap();
        assert_eq!(m.to_vec(), vec![3, 0]);

        let mut idx = StridedArray::<i64>::row_major(&[2]);
        argmax_last_axis_into(&mut idx.view_mut(), &a.view()).unwrap();
        assert_eq!(idx.to_vec(), vec![1, 1]);
        argmin_axis_into(&mut idx.view_mut(), &a.view(), 1).unwrap();
        assert_eq!(idx.to_vec(), vec![0, 0]);

        let mut c = StridedArray::<i64>::row_major(&[3]);
        count_nonzero_axis_into(&mut c.view_mut(), &a.view(), 0).unwrap();
        assert_eq!(c.to_vec(), vec![1, 2, 2]);

        let mut flags = StridedArray::<bool>::row_major(&[2]);
        all_last_axis_into(&mut flags.view_mut(), &a.view()).unwrap();
        assert_eq!(flags.to_vec(), vec![true, false]);
        any_last_axis_into(&mut flags.view_mut(), &a.view()).unwrap();
        assert_eq!(flags.to_vec(), vec![true, true]);

        let mut f = StridedArray::<i64>::row_major(&[2]);
        find_first_last_axis_into(&mut f.view_mut(), &a.view(), 9).unwrap();
        assert_eq!(f.to_vec(), vec![1, -1]);
    }

    #[test]
    fn test_empty_axis() {
        let a = StridedArray::<f64>::row_major(&[2, 0]);
        let mut out = StridedArray::<f64>::row_major(&[2]);
        assert_eq!(
            max_axis_into(&mut out.view_mut(), &a.view(), 1),
            Err(StridedError::EmptyReduction { axis: Some(1) })
        );
        sum_axis_into(&mut out.view_mut(), &a.view(), 1).unwrap();
        assert_eq!(out.to_vec(), vec![0.0, 0.0]);

        let z = StridedArray::<f64>::row_major(&[0, 0]);
        let mut none = StridedArray::<f64>::row_major(&[0]);
        max_axis_into(&mut none.view_mut(), &z.view(), 0).unwrap();

        assert_eq!(max(&a.view()), Err(StridedError::EmptyReduction { axis: None }));
        assert_eq!(sum(&a.view()), Ok(0.0));
    }

    #[test]
    fn test_full_reductions() {
        let a = StridedArray::from_fn_row_major(&[10, 10], |p| (p[0] * 10 + p[1]) as f64);
        approx::assert_relative_eq!(sum(&a.view()).unwrap(), 4950.0);
        approx::assert_relative_eq!(sum(&a.view().transpose()).unwrap(), 4950.0);
        let every_other = a.view().slice(&[SliceSpec::Full, SliceSpec::range_step(0, 9, 2)]).unwrap();
        approx::assert_relative_eq!(Dispatcher::scalar().sum(&every_other).unwrap(), 2450.0);
        assert_eq!(max(&a.view()), Ok(99.0));
        assert_eq!(min(&every_other), Ok(0.0));
    }

    #[test]
    fn test_last_axis_needs_rank() {
        let a = StridedArray::full(&[], 1i32);
        let mut out = StridedArray::full(&[], 0i32);
        assert_eq!(
            sum_last_axis_into(&mut out.view_mut(), &a.view()),
            Err(StridedError::InvalidAxis { axis: 0, rank: 0 })
        );
    }
}
