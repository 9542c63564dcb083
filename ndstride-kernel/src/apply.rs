//! Generic apply engine.
//!
//! Every element-wise operation is one of four traversal patterns (noary,
//! unary, binary, ternary) or an axis reduction. All of them share one
//! driver: a [`PositionIter`] per operand walks every axis except the last in
//! lockstep, and a tight pointer loop covers the last axis.
//!
//! Shapes are checked before any element is touched, so a failing call leaves
//! the target unchanged.

use ndstride_view::{Layout, PositionIter, StridedView, StridedViewMut};

use crate::kernel::{check_axis, ensure_same_shape};
use crate::maybe_sync::{MaybeSendSync, MaybeSync};
use crate::simd;
use crate::threading::{for_each_outer_index, should_parallelize, SendPtr};
use crate::Result;

// ============================================================================
// Row driver
// ============================================================================

/// Visit every row (run along the last axis) of `layouts`, which must share
/// one shape.
///
/// `body(pos, bases, len, strides)` receives the full-rank position of the
/// row start (last index 0), each operand's address there, the row length
/// and each operand's last-axis stride. `pos` is a scratch buffer owned by
/// the walk; the body may overwrite its last index. A rank-0 shape is one row of length 1
/// with zero strides. Nothing is visited for an empty shape.
pub(crate) fn for_each_row<const N: usize, F>(
    layouts: [&Layout; N],
    parallel: bool,
    body: F,
) -> Result<()>
where
    F: Fn(&mut [usize], [isize; N], usize, [isize; N]) + MaybeSync,
{
    let lead = layouts[0];
    let rank = lead.rank();
    if rank == 0 {
        body(&mut [], layouts.map(|l| l.offset()), 1, [0; N]);
        return Ok(());
    }
    if lead.is_empty() {
        return Ok(());
    }

    let last = rank - 1;
    let len = lead.shape()[last];
    let inner = layouts.map(|l| l.strides()[last]);

    if parallel && should_parallelize(rank, lead.len()) {
        tracing::trace!(rank, len = lead.len(), rows = lead.shape()[0], "parallel apply");
        return for_each_outer_index(lead.shape()[0], |i| {
            let mut start = vec![0usize; rank];
            start[0] = i;
            rows(layouts, Some(&start[..]), 1..last, len, inner, &body)
        });
    }

    rows(layouts, None, 0..last, len, inner, &body)
}

fn rows<const N: usize, F>(
    layouts: [&Layout; N],
    start: Option<&[usize]>,
    outer: std::ops::Range<usize>,
    len: usize,
    inner: [isize; N],
    body: &F,
) -> Result<()>
where
    F: Fn(&mut [usize], [isize; N], usize, [isize; N]),
{
    let mut iters = layouts
        .iter()
        .map(|l| PositionIter::new(l, start, outer.clone()))
        .collect::<Result<Vec<_>>>()?;
    let mut pos = vec![0usize; layouts[0].rank()];

    while iters[0].is_active() {
        let bases: [isize; N] = std::array::from_fn(|k| iters[k].address());
        pos.copy_from_slice(iters[0].position());
        body(&mut pos, bases, len, inner);
        for it in &mut iters {
            it.advance();
        }
    }
    Ok(())
}

// ============================================================================
// Inner loops
//
// Unit strides everywhere take a slice loop the compiler can vectorize;
// anything else (including stride-0 broadcast sources) steps raw pointers.
// ============================================================================

#[inline(always)]
unsafe fn inner_fill<D>(
    dp: *mut D,
    ds: isize,
    len: usize,
    pos: &mut [usize],
    f: &impl Fn(&[usize]) -> D,
) {
    let Some(last) = pos.len().checked_sub(1) else {
        *dp = f(pos);
        return;
    };
    let mut dp = dp;
    for j in 0..len {
        pos[last] = j;
        *dp = f(pos);
        dp = dp.wrapping_offset(ds);
    }
}

#[inline(always)]
unsafe fn inner_map1<D, A: Copy>(
    dp: *mut D,
    ds: isize,
    ap: *const A,
    a_s: isize,
    len: usize,
    f: &impl Fn(A) -> D,
) {
    if ds == 1 && a_s == 1 {
        let dst = std::slice::from_raw_parts_mut(dp, len);
        let src = std::slice::from_raw_parts(ap, len);
        simd::dispatch_if_large(len, || {
            for (d, &a) in dst.iter_mut().zip(src) {
                *d = f(a);
            }
        });
    } else {
        let (mut dp, mut ap) = (dp, ap);
        for _ in 0..len {
            *dp = f(*ap);
            dp = dp.wrapping_offset(ds);
            ap = ap.wrapping_offset(a_s);
        }
    }
}

#[inline(always)]
unsafe fn inner_map2<D, A: Copy, B: Copy>(
    dp: *mut D,
    ds: isize,
    ap: *const A,
    a_s: isize,
    bp: *const B,
    b_s: isize,
    len: usize,
    f: &impl Fn(A, B) -> D,
) {
    if ds == 1 && a_s == 1 && b_s == 1 {
        let dst = std::slice::from_raw_parts_mut(dp, len);
        let src_a = std::slice::from_raw_parts(ap, len);
        let src_b = std::slice::from_raw_parts(bp, len);
        simd::dispatch_if_large(len, || {
            for ((d, &a), &b) in dst.iter_mut().zip(src_a).zip(src_b) {
                *d = f(a, b);
            }
        });
    } else {
        let (mut dp, mut ap, mut bp) = (dp, ap, bp);
        for _ in 0..len {
            *dp = f(*ap, *bp);
            dp = dp.wrapping_offset(ds);
            ap = ap.wrapping_offset(a_s);
            bp = bp.wrapping_offset(b_s);
        }
    }
}

#[inline(always)]
unsafe fn inner_map3<D, A: Copy, B: Copy, C: Copy>(
    dp: *mut D,
    ds: isize,
    ap: *const A,
    a_s: isize,
    bp: *const B,
    b_s: isize,
    cp: *const C,
    c_s: isize,
    len: usize,
    f: &impl Fn(A, B, C) -> D,
) {
    let (mut dp, mut ap, mut bp, mut cp) = (dp, ap, bp, cp);
    for _ in 0..len {
        *dp = f(*ap, *bp, *cp);
        dp = dp.wrapping_offset(ds);
        ap = ap.wrapping_offset(a_s);
        bp = bp.wrapping_offset(b_s);
        cp = cp.wrapping_offset(c_s);
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Traversal settings shared by every pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engine {
    /// Allow splitting the outermost axis across the rayon pool.
    pub parallel: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl Engine {
    pub fn sequential() -> Self {
        Self { parallel: false }
    }

    /// A target that maps two positions to one address must be written in order.
    pub(crate) fn parallel_for(&self, dest: &Layout) -> bool {
        self.parallel && dest.is_non_overlapping()
    }

    /// `dest[pos] = f(pos)`.
    pub fn noary<D, F>(&self, dest: &mut StridedViewMut<'_, D>, f: F) -> Result<()>
    where
        D: Copy + MaybeSendSync,
        F: Fn(&[usize]) -> D + MaybeSync,
    {
        let dp = SendPtr(dest.as_mut_ptr());
        let layout = dest.layout();
        for_each_row([layout], self.parallel_for(layout), |pos, base, len, st| {
            unsafe { inner_fill(dp.as_ptr().offset(base[0]), st[0], len, pos, &f) }
        })
    }

    /// `dest[pos] = f(a[pos])`.
    pub fn unary<D, A, F>(
        &self,
        dest: &mut StridedViewMut<'_, D>,
        a: &StridedView<'_, A>,
        f: F,
    ) -> Result<()>
    where
        D: Copy + MaybeSendSync,
        A: Copy + MaybeSendSync,
        F: Fn(A) -> D + MaybeSync,
    {
        ensure_same_shape(dest.shape(), a.shape())?;
        let dp = SendPtr(dest.as_mut_ptr());
        let ap = SendPtr::from_const(a.as_ptr());
        let layout = dest.layout();
        for_each_row(
            [layout, a.layout()],
            self.parallel_for(layout),
            |_, base, len, st| unsafe {
                inner_map1(
                    dp.as_ptr().offset(base[0]),
                    st[0],
                    ap.as_const().offset(base[1]),
                    st[1],
                    len,
                    &f,
                )
            },
        )
    }

    /// `dest[pos] = f(a[pos], b[pos])`.
    pub fn binary<D, A, B, F>(
        &self,
        dest: &mut StridedViewMut<'_, D>,
        a: &StridedView<'_, A>,
        b: &StridedView<'_, B>,
        f: F,
    ) -> Result<()>
    where
        D: Copy + MaybeSendSync,
        A: Copy + MaybeSendSync,
        B: Copy + MaybeSendSync,
        F: Fn(A, B) -> D + MaybeSync,
    {
        ensure_same_shape(dest.shape(), a.shape())?;
        ensure_same_shape(dest.shape(), b.shape())?;
        let dp = SendPtr(dest.as_mut_ptr());
        let ap = SendPtr::from_const(a.as_ptr());
        let bp = SendPtr::from_const(b.as_ptr());
        let layout = dest.layout();
        for_each_row(
            [layout, a.layout(), b.layout()],
            self.parallel_for(layout),
            |_, base, len, st| unsafe {
                inner_map2(
                    dp.as_ptr().offset(base[0]),
                    st[0],
                    ap.as_const().offset(base[1]),
                    st[1],
                    bp.as_const().offset(base[2]),
                    st[2],
                    len,
                    &f,
                )
            },
        )
    }

    /// `dest[pos] = f(a[pos], b[pos], c[pos])`.
    pub fn ternary<D, A, B, C, F>(
        &self,
        dest: &mut StridedViewMut<'_, D>,
        a: &StridedView<'_, A>,
        b: &StridedView<'_, B>,
        c: &StridedView<'_, C>,
        f: F,
    ) -> Result<()>
    where
        D: Copy + MaybeSendSync,
        A: Copy + MaybeSendSync,
        B: Copy + MaybeSendSync,
        C: Copy + MaybeSendSync,
        F: Fn(A, B, C) -> D + MaybeSync,
    {
        ensure_same_shape(dest.shape(), a.shape())?;
        ensure_same_shape(dest.shape(), b.shape())?;
        ensure_same_shape(dest.shape(), c.shape())?;
        let dp = SendPtr(dest.as_mut_ptr());
        let ap = SendPtr::from_const(a.as_ptr());
        let bp = SendPtr::from_const(b.as_ptr());
        let cp = SendPtr::from_const(c.as_ptr());
        let layout = dest.layout();
        for_each_row(
            [layout, a.layout(), b.layout(), c.layout()],
            self.parallel_for(layout),
            |_, base, len, st| unsafe {
                inner_map3(
                    dp.as_ptr().offset(base[0]),
                    st[0],
                    ap.as_const().offset(base[1]),
                    st[1],
                    bp.as_const().offset(base[2]),
                    st[2],
                    cp.as_const().offset(base[3]),
                    st[3],
                    len,
                    &f,
                )
            },
        )
    }

    /// Reduce `src` along `axis` into `dest`, whose shape is `src`'s shape
    /// with `axis` removed.
    ///
    /// For each target element the accumulator starts at `init`, is folded
    /// with `fold(acc, k, src[.., k, ..])` for `k` in order along the axis, and
    /// `finish(acc)` is stored. A zero-length axis stores `finish(init)`.
    pub fn reduce_axis<D, T, U, Fo, Fi>(
        &self,
        dest: &mut StridedViewMut<'_, D>,
        src: &StridedView<'_, T>,
        axis: usize,
        init: U,
        fold: Fo,
        finish: Fi,
    ) -> Result<()>
    where
        D: Copy + MaybeSendSync,
        T: Copy + MaybeSendSync,
        U: Clone + MaybeSendSync,
        Fo: Fn(U, usize, T) -> U + MaybeSync,
        Fi: Fn(U) -> D + MaybeSync,
    {
        check_axis(axis, src.rank())?;
        let moved = src.layout().move_axis_last(axis)?;
        let outer = moved.remove_axis(moved.rank() - 1)?;
        ensure_same_shape(dest.shape(), outer.shape())?;

        let n = src.shape()[axis];
        let ks = src.strides()[axis];
        let dp = SendPtr(dest.as_mut_ptr());
        let sp = SendPtr::from_const(src.as_ptr());
        let layout = dest.layout();
        for_each_row(
            [layout, &outer],
            self.parallel_for(layout),
            |_, base, len, st| unsafe {
                let mut d = dp.as_ptr().offset(base[0]);
                let mut s = sp.as_const().offset(base[1]);
                for _ in 0..len {
                    let mut acc = init.clone();
                    let mut p = s;
                    for k in 0..n {
                        acc = fold(acc, k, *p);
                        p = p.wrapping_offset(ks);
                    }
                    *d = finish(acc);
                    d = d.wrapping_offset(st[0]);
                    s = s.wrapping_offset(st[1]);
                }
            },
        )
    }
}

// ============================================================================
// Free functions (default engine)
// ============================================================================

/// Fill `dest` from its own positions: `dest[pos] = f(pos)`.
pub fn apply_noary<D, F>(dest: &mut StridedViewMut<'_, D>, f: F) -> Result<()>
where
    D: Copy + MaybeSendSync,
    F: Fn(&[usize]) -> D + MaybeSync,
{
    Engine::default().noary(dest, f)
}

/// `dest[pos] = f(a[pos])`.
pub fn apply_unary<D, A, F>(
    dest: &mut StridedViewMut<'_, D>,
    a: &StridedView<'_, A>,
    f: F,
) -> Result<()>
where
    D: Copy + MaybeSendSync,
    A: Copy + MaybeSendSync,
    F: Fn(A) -> D + MaybeSync,
{
    Engine::default().unary(dest, a, f)
}

/// `dest[pos] = f(a[pos], b[pos])`.
pub fn apply_binary<D, A, B, F>(
    dest: &mut StridedViewMut<'_, D>,
    a: &StridedView<'_, A>,
    b: &StridedView<'_, B>,
    f: F,
) -> Result<()>
where
    D: Copy + MaybeSendSync,
    A: Copy + MaybeSendSync,
    B: Copy + MaybeSendSync,
    F: Fn(A, B) -> D + MaybeSync,
{
    Engine::default().binary(dest, a, b, f)
}

/// `dest[pos] = f(a[pos], b[pos], c[pos])`.
pub fn apply_ternary<D, A, B, C, F>(
    dest: &mut StridedViewMut<'_, D>,
    a: &StridedView<'_, A>,
    b: &StridedView<'_, B>,
    c: &StridedView<'_, C>,
    f: F,
) -> Result<()>
where
    D: Copy + MaybeSendSync,
    A: Copy + MaybeSendSync,
    B: Copy + MaybeSendSync,
    C: Copy + MaybeSendSync,
    F: Fn(A, B, C) -> D + MaybeSync,
{
    Engine::default().ternary(dest, a, b, c, f)
}

/// See [`Engine::reduce_axis`].
pub fn reduce_axis_into<D, T, U, Fo, Fi>(
    dest: &mut StridedViewMut<'_, D>,
    src: &StridedView<'_, T>,
    axis: usize,
    init: U,
    fold: Fo,
    finish: Fi,
) -> Result<()>
where
    D: Copy + MaybeSendSync,
    T: Copy + MaybeSendSync,
    U: Clone + MaybeSendSync,
    Fo: Fn(U, usize, T) -> U + MaybeSync,
    Fi: Fn(U) -> D + MaybeSync,
{
    Engine::default().reduce_axis(dest, src, axis, init, fold, finish)
}
