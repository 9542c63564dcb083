//! Rayon partitioning of the outermost axis.

use crate::Result;

/// A raw pointer wrapper that is `Send` + `Sync`.
///
/// # Safety
/// The caller must guarantee that the pointed-to buffer outlives every use
/// and that concurrent users only write to disjoint addresses.
pub(crate) struct SendPtr<T>(pub(crate) *mut T);

impl<T> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendPtr<T> {}

unsafe impl<T> Send for SendPtr<T> {}
unsafe impl<T> Sync for SendPtr<T> {}

impl<T> SendPtr<T> {
    pub(crate) fn from_const(ptr: *const T) -> Self {
        SendPtr(ptr as *mut T)
    }

    #[inline(always)]
    pub(crate) fn as_ptr(self) -> *mut T {
        self.0
    }

    #[inline(always)]
    pub(crate) fn as_const(self) -> *const T {
        self.0 as *const T
    }
}

/// Minimum number of elements before work is split across threads.
pub const MINTHREADLENGTH: usize = 1 << 15;

/// Whether a call over `len` elements of rank `rank` should fan out.
#[inline]
pub(crate) fn should_parallelize(rank: usize, len: usize) -> bool {
    cfg!(feature = "parallel") && rank >= 2 && len > MINTHREADLENGTH
}

/// Run `f(i)` for every outer index `i in 0..n` on the rayon pool, stopping at
/// the first error.
#[cfg(feature = "parallel")]
pub(crate) fn for_each_outer_index<F>(n: usize, f: F) -> Result<()>
where
    F: Fn(usize) -> Result<()> + Send + Sync,
{
    use rayon::prelude::*;
    (0..n).into_par_iter().try_for_each(f)
}

/// Sequential stand-in used when the `parallel` feature is off.
#[cfg(not(feature = "parallel"))]
pub(crate) fn for_each_outer_index<F>(n: usize, f: F) -> Result<()>
where
    F: Fn(usize) -> Result<()>,
{
    (0..n).try_for_each(f)
}
