//! Lane-batched kernels for contiguous rows.
//!
//! A row is cut into `LANES`-element chunks; each chunk is loaded into a
//! fixed-size array, combined lane by lane and stored back, which is the shape
//! LLVM turns into packed instructions. The tail shorter than one chunk runs
//! the same per-element function, so every element of a row is computed by
//! exactly the scalar function the registry holds.
//!
//! Sources are either a unit-stride slice or a single broadcast value
//! ([`Operand::Splat`]); the dispatcher only routes rows here when the target
//! is unit-stride too.

use ndstride_traits::Element;

use crate::scalar::{func, BinaryOp, UnaryOp};
use crate::simd;

/// One source row as the vector kernels see it.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a, T> {
    /// Unit-stride elements, at least as long as the target row.
    Slice(&'a [T]),
    /// Stride-0 source: the same value for every lane.
    Splat(T),
}

impl<T: Copy> Operand<'_, T> {
    #[inline(always)]
    fn load<const N: usize>(&self, base: usize) -> [T; N] {
        match *self {
            Operand::Slice(s) => std::array::from_fn(|i| s[base + i]),
            Operand::Splat(v) => [v; N],
        }
    }

    #[inline(always)]
    fn at(&self, i: usize) -> T {
        match *self {
            Operand::Slice(s) => s[i],
            Operand::Splat(v) => v,
        }
    }
}

#[inline(always)]
fn fill_lanes<T: Copy, const N: usize>(dst: &mut [T], value: T) {
    let splat = [value; N];
    let mut chunks = dst.chunks_exact_mut(N);
    for chunk in &mut chunks {
        chunk.copy_from_slice(&splat);
    }
    for d in chunks.into_remainder() {
        *d = value;
    }
}

#[inline(always)]
fn unary_lanes<T: Copy, const N: usize>(dst: &mut [T], src: Operand<'_, T>, f: impl Fn(T) -> T) {
    let mut chunks = dst.chunks_exact_mut(N);
    let mut base = 0;
    for chunk in &mut chunks {
        let x = src.load::<N>(base);
        for (d, x) in chunk.iter_mut().zip(x) {
            *d = f(x);
        }
        base += N;
    }
    for (i, d) in chunks.into_remainder().iter_mut().enumerate() {
        *d = f(src.at(base + i));
    }
}

#[inline(always)]
fn binary_lanes<T: Copy, const N: usize>(
    dst: &mut [T],
    a: Operand<'_, T>,
    b: Operand<'_, T>,
    f: impl Fn(T, T) -> T,
) {
    let mut chunks = dst.chunks_exact_mut(N);
    let mut base = 0;
    for chunk in &mut chunks {
        let (xa, xb) = (a.load::<N>(base), b.load::<N>(base));
        for (d, (x, y)) in chunk.iter_mut().zip(xa.into_iter().zip(xb)) {
            *d = f(x, y);
        }
        base += N;
    }
    for (i, d) in chunks.into_remainder().iter_mut().enumerate() {
        *d = f(a.at(base + i), b.at(base + i));
    }
}

/// Element types with lane-batched kernels.
///
/// Every method returns `false` without touching `dst` when the type has no
/// vector kernel for the request; callers then take the scalar path.
pub trait VectorElement: Element {
    fn vector_supports_unary(_op: UnaryOp) -> bool {
        false
    }

    fn vector_supports_binary(_op: BinaryOp) -> bool {
        false
    }

    fn vector_fill(_dst: &mut [Self], _value: Self) -> bool {
        false
    }

    fn vector_copy(_dst: &mut [Self], _src: Operand<'_, Self>) -> bool {
        false
    }

    fn vector_unary(_op: UnaryOp, _dst: &mut [Self], _src: Operand<'_, Self>) -> bool {
        false
    }

    fn vector_binary(
        _op: BinaryOp,
        _dst: &mut [Self],
        _a: Operand<'_, Self>,
        _b: Operand<'_, Self>,
    ) -> bool {
        false
    }
}

macro_rules! impl_vector_common {
    ($t:ty, $lanes:literal) => {
        fn vector_fill(dst: &mut [$t], value: $t) -> bool {
            simd::dispatch_if_large(dst.len(), || fill_lanes::<$t, $lanes>(dst, value));
            true
        }

        fn vector_copy(dst: &mut [$t], src: Operand<'_, $t>) -> bool {
            simd::dispatch_if_large(dst.len(), || unary_lanes::<$t, $lanes>(dst, src, |x| x));
            true
        }
    };
}

macro_rules! impl_float_vector {
    ($($t:ty => $lanes:literal),* $(,)?) => {$(
        const _: () = assert!(<$t as Element>::LANES == $lanes);

        impl VectorElement for $t {
            fn vector_supports_unary(op: UnaryOp) -> bool {
                matches!(op, UnaryOp::Abs | UnaryOp::Sqrt)
            }

            fn vector_supports_binary(op: BinaryOp) -> bool {
                matches!(
                    op,
                    BinaryOp::Add
                        | BinaryOp::Sub
                        | BinaryOp::Mul
                        | BinaryOp::Div
                        | BinaryOp::Min
                        | BinaryOp::Max
                )
            }

            impl_vector_common!($t, $lanes);

            fn vector_unary(op: UnaryOp, dst: &mut [$t], src: Operand<'_, $t>) -> bool {
                let f: fn($t) -> $t = match op {
                    UnaryOp::Abs => func::float_abs,
                    UnaryOp::Sqrt => func::float_sqrt,
                    _ => return false,
                };
                simd::dispatch_if_large(dst.len(), || unary_lanes::<$t, $lanes>(dst, src, f));
                true
            }

            fn vector_binary(
                op: BinaryOp,
                dst: &mut [$t],
                a: Operand<'_, $t>,
                b: Operand<'_, $t>,
            ) -> bool {
                let f: fn($t, $t) -> $t = match op {
                    BinaryOp::Add => func::add,
                    BinaryOp::Sub => func::sub,
                    BinaryOp::Mul => func::mul,
                    BinaryOp::Div => func::div,
                    BinaryOp::Min => func::min,
                    BinaryOp::Max => func::max,
                    _ => return false,
                };
                simd::dispatch_if_large(dst.len(), || binary_lanes::<$t, $lanes>(dst, a, b, f));
                true
            }
        }
    )*};
}

macro_rules! impl_int_vector {
    ($($t:ty => $lanes:literal),* $(,)?) => {$(
        const _: () = assert!(<$t as Element>::LANES == $lanes);

        impl VectorElement for $t {
            fn vector_supports_unary(op: UnaryOp) -> bool {
                matches!(op, UnaryOp::Abs)
            }

            fn vector_supports_binary(op: BinaryOp) -> bool {
                matches!(
                    op,
                    BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Min | BinaryOp::Max
                )
            }

            impl_vector_common!($t, $lanes);

            fn vector_unary(op: UnaryOp, dst: &mut [$t], src: Operand<'_, $t>) -> bool {
                if op != UnaryOp::Abs {
                    return false;
                }
                simd::dispatch_if_large(dst.len(), || {
                    unary_lanes::<$t, $lanes>(dst, src, func::wrapping_abs)
                });
                true
            }

            fn vector_binary(
                op: BinaryOp,
                dst: &mut [$t],
                a: Operand<'_, $t>,
                b: Operand<'_, $t>,
            ) -> bool {
                let f: fn($t, $t) -> $t = match op {
                    BinaryOp::Add => func::wrapping_add,
                    BinaryOp::Sub => func::wrapping_sub,
                    BinaryOp::Mul => func::wrapping_mul,
                    BinaryOp::Min => func::min,
                    BinaryOp::Max => func::max,
                    _ => return false,
                };
                simd::dispatch_if_large(dst.len(), || binary_lanes::<$t, $lanes>(dst, a, b, f));
                true
            }
        }
    )*};
}

impl_float_vector!(f32 => 8, f64 => 4);
impl_int_vector!(i32 => 8, i64 => 4);

impl VectorElement for bool {}
impl VectorElement for u8 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_covers_tail() {
        let mut dst = vec![0.0f64; 11];
        assert!(f64::vector_fill(&mut dst, 2.5));
        assert!(dst.iter().all(|&x| x == 2.5));
    }

    #[test]
    fn test_binary_splat_and_slice() {
        let a: Vec<f32> = (0..19).map(|i| i as f32).collect();
        let mut dst = vec![0.0f32; 19];
        assert!(f32::vector_binary(
            BinaryOp::Mul,
            &mut dst,
            Operand::Slice(&a),
            Operand::Splat(2.0)
        ));
        let expected: Vec<f32> = a.iter().map(|x| x * 2.0).collect();
        assert_eq!(dst, expected);
    }

    #[test]
    fn test_int_wrapping_add() {
        let a = [i32::MAX; 9];
        let mut dst = [0i32; 9];
        assert!(i32::vector_binary(
            BinaryOp::Add,
            &mut dst,
            Operand::Slice(&a),
            Operand::Splat(1)
        ));
        assert!(dst.iter().all(|&x| x == i32::MIN));
    }

    #[test]
    fn test_unsupported_leaves_target() {
        let mut dst = [7i64; 5];
        assert!(!i64::vector_binary(
            BinaryOp::Div,
            &mut dst,
            Operand::Splat(1),
            Operand::Splat(1)
        ));
        assert!(!i64::vector_unary(UnaryOp::Sqrt, &mut dst, Operand::Splat(4)));
        assert_eq!(dst, [7; 5]);
        assert!(!u8::vector_fill(&mut [0u8; 3], 1));
        assert!(!bool::vector_supports_binary(BinaryOp::And));
    }

    #[test]
    fn test_copy_and_sqrt() {
        let src: Vec<f64> = (0..70).map(|i| (i * i) as f64).collect();
        let mut dst = vec![0.0; 70];
        assert!(f64::vector_copy(&mut dst, Operand::Slice(&src)));
        assert_eq!(dst, src);
        assert!(f64::vector_unary(UnaryOp::Sqrt, &mut dst, Operand::Slice(&src)));
        assert_eq!(dst[9], 9.0);
        assert_eq!(dst[69], 69.0);
    }
}
