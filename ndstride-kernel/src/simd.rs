//! Runtime CPU-feature dispatch.
//!
//! With the `simd` feature, loops passed to [`dispatch`] are compiled once per
//! instruction set `pulp` knows about and the best one is picked at run time.
//! Without it they simply run.

/// Below this many elements the dispatch overhead outweighs any gain.
pub const SIMD_DISPATCH_MIN_LEN: usize = 64;

#[inline(always)]
pub(crate) fn dispatch<R>(f: impl FnOnce() -> R) -> R {
    #[cfg(feature = "simd")]
    {
        pulp::Arch::new().dispatch(f)
    }
    #[cfg(not(feature = "simd"))]
    {
        f()
    }
}

#[inline(always)]
pub(crate) fn dispatch_if_large<R>(len: usize, f: impl FnOnce() -> R) -> R {
    if len >= SIMD_DISPATCH_MIN_LEN {
        dispatch(f)
    } else {
        f()
    }
}

/// Explicit-SIMD horizontal sums for contiguous float slices.
///
/// Four independent accumulators hide the add latency; the result may differ
/// from a sequential sum in the last bits.
#[cfg(feature = "simd")]
pub(crate) mod sum {
    use pulp::{Simd, WithSimd};

    macro_rules! simd_sum {
        ($name:ident, $t:ty, $as_simd:ident, $splat:ident, $add:ident, $reduce:ident) => {
            pub(crate) fn $name(src: &[$t]) -> $t {
                struct Kernel<'a>(&'a [$t]);

                impl WithSimd for Kernel<'_> {
                    type Output = $t;

                    #[inline(always)]
                    fn with_simd<S: Simd>(self, simd: S) -> $t {
                        let (head, tail) = S::$as_simd(self.0);
                        let mut acc = [simd.$splat(0.0); 4];
                        let mut quads = head.chunks_exact(4);
                        for quad in &mut quads {
                            for (a, &v) in acc.iter_mut().zip(quad) {
                                *a = simd.$add(*a, v);
                            }
                        }
                        for &v in quads.remainder() {
                            acc[0] = simd.$add(acc[0], v);
                        }
                        let total = simd.$add(simd.$add(acc[0], acc[1]), simd.$add(acc[2], acc[3]));
                        tail.iter().fold(simd.$reduce(total), |s, &x| s + x)
                    }
                }

                pulp::Arch::new().dispatch(Kernel(src))
            }
        };
    }

    simd_sum!(sum_f32, f32, as_simd_f32s, splat_f32s, add_f32s, reduce_sum_f32s);
    simd_sum!(sum_f64, f64, as_simd_f64s, splat_f64s, add_f64s, reduce_sum_f64s);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_returns_closure_value() {
        assert_eq!(dispatch(|| 41 + 1), 42);
        assert_eq!(dispatch_if_large(3, || "small"), "small");
        assert_eq!(dispatch_if_large(SIMD_DISPATCH_MIN_LEN, || "large"), "large");
    }

    #[cfg(feature = "simd")]
    #[test]
    fn test_simd_sums() {
        let v: Vec<f64> = (1..=1000).map(|i| i as f64).collect();
        approx::assert_relative_eq!(sum::sum_f64(&v), 500_500.0);
        let w: Vec<f32> = (0..37).map(|i| i as f32 * 0.5).collect();
        approx::assert_relative_eq!(sum::sum_f32(&w), 333.0, max_relative = 1e-6);
        assert_eq!(sum::sum_f64(&[]), 0.0);
    }
}
