//! Scalar kernel registry.
//!
//! Each element type owns one [`KernelSet`]: a table of plain function
//! pointers indexed by operation, built on first use and shared by every
//! thread for the rest of the process. Looking up an operation the type does
//! not support is an [`StridedError::UnsupportedOperation`] error, never a
//! panic.
//!
//! # Semantics
//!
//! - Integer arithmetic wraps (`i32::MAX + 1 == i32::MIN`).
//! - `Rem` truncates: the result takes the sign of the dividend, for integers
//!   and floats alike (`-7 % 3 == -1`, `7 % -3 == 1`).
//! - `Min`/`Max` return the first operand unless the second is strictly
//!   smaller/larger, so a NaN first operand propagates and a NaN second
//!   operand is ignored.
//! - `Sign` is `-1`, `0` or `1` for integers; for floats it keeps `±0` and NaN
//!   and is `±1` otherwise.

use std::sync::OnceLock;

use ndstride_traits::{Element, ElementKind};
use ndstride_view::StridedError;
use num_traits::{
    CheckedDiv, CheckedRem, Float, PrimInt, WrappingAdd, WrappingMul, WrappingNeg, WrappingSub,
};

use crate::vector::VectorElement;
use crate::Result;

macro_rules! op_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];
            pub const COUNT: usize = Self::ALL.len();

            /// Lowercase name used in error messages.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text),*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

op_enum! {
    /// Single-operand element-wise operations.
    UnaryOp {
        Neg => "neg",
        Abs => "abs",
        Sqrt => "sqrt",
        Square => "square",
        Recip => "recip",
        Exp => "exp",
        Ln => "ln",
        Sin => "sin",
        Cos => "cos",
        Tanh => "tanh",
        Floor => "floor",
        Ceil => "ceil",
        Round => "round",
        Sign => "sign",
        Not => "not",
    }
}

op_enum! {
    /// Two-operand element-wise operations with a result of the operand type.
    BinaryOp {
        Add => "add",
        Sub => "sub",
        Mul => "mul",
        Div => "div",
        Rem => "rem",
        Pow => "pow",
        Min => "min",
        Max => "max",
        And => "and",
        Or => "or",
        Xor => "xor",
    }
}

op_enum! {
    /// Element-wise comparisons producing `bool`.
    CompareOp {
        Eq => "eq",
        Ne => "ne",
        Lt => "lt",
        Le => "le",
        Gt => "gt",
        Ge => "ge",
    }
}

/// Element functions shared by the registry and the vector kernels.
pub(crate) mod func {
    use super::*;

    #[inline(always)]
    pub(crate) fn add<T: std::ops::Add<Output = T>>(a: T, b: T) -> T {
        a + b
    }

    #[inline(always)]
    pub(crate) fn sub<T: std::ops::Sub<Output = T>>(a: T, b: T) -> T {
        a - b
    }

    #[inline(always)]
    pub(crate) fn mul<T: std::ops::Mul<Output = T>>(a: T, b: T) -> T {
        a * b
    }

    #[inline(always)]
    pub(crate) fn div<T: std::ops::Div<Output = T>>(a: T, b: T) -> T {
        a / b
    }

    #[inline(always)]
    pub(crate) fn min<T: PartialOrd>(a: T, b: T) -> T {
        if b < a {
            b
        } else {
            a
        }
    }

    #[inline(always)]
    pub(crate) fn max<T: PartialOrd>(a: T, b: T) -> T {
        if b > a {
            b
        } else {
            a
        }
    }

    #[inline(always)]
    pub(crate) fn wrapping_add<T: WrappingAdd>(a: T, b: T) -> T {
        a.wrapping_add(&b)
    }

    #[inline(always)]
    pub(crate) fn wrapping_sub<T: WrappingSub>(a: T, b: T) -> T {
        a.wrapping_sub(&b)
    }

    #[inline(always)]
    pub(crate) fn wrapping_mul<T: WrappingMul>(a: T, b: T) -> T {
        a.wrapping_mul(&b)
    }

    /// `|a|`, with `MIN` mapping to itself. Identity on unsigned types.
    #[inline(always)]
    pub(crate) fn wrapping_abs<T: PrimInt + WrappingNeg>(a: T) -> T {
        if a < T::zero() {
            a.wrapping_neg()
        } else {
            a
        }
    }

    #[inline(always)]
    pub(crate) fn float_abs<T: Float>(a: T) -> T {
        a.abs()
    }

    #[inline(always)]
    pub(crate) fn float_sqrt<T: Float>(a: T) -> T {
        a.sqrt()
    }
}

/// Function-pointer table for one element type.
pub struct KernelSet<T> {
    kind: ElementKind,
    unary: [Option<fn(T) -> T>; UnaryOp::COUNT],
    binary: [Option<fn(T, T) -> T>; BinaryOp::COUNT],
}

impl<T: Element> KernelSet<T> {
    fn empty() -> Self {
        Self {
            kind: T::KIND,
            unary: [None; UnaryOp::COUNT],
            binary: [None; BinaryOp::COUNT],
        }
    }

    fn with_unary(mut self, op: UnaryOp, f: fn(T) -> T) -> Self {
        self.unary[op as usize] = Some(f);
        self
    }

    fn with_binary(mut self, op: BinaryOp, f: fn(T, T) -> T) -> Self {
        self.binary[op as usize] = Some(f);
        self
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn supports_unary(&self, op: UnaryOp) -> bool {
        self.unary[op as usize].is_some()
    }

    pub fn supports_binary(&self, op: BinaryOp) -> bool {
        self.binary[op as usize].is_some()
    }

    pub fn unary(&self, op: UnaryOp) -> Result<fn(T) -> T> {
        self.unary[op as usize].ok_or(StridedError::UnsupportedOperation {
            op: op.name(),
            kind: self.kind,
        })
    }

    pub fn binary(&self, op: BinaryOp) -> Result<fn(T, T) -> T> {
        self.binary[op as usize].ok_or(StridedError::UnsupportedOperation {
            op: op.name(),
            kind: self.kind,
        })
    }

    /// Comparisons exist for every element type.
    pub fn compare(&self, op: CompareOp) -> fn(T, T) -> bool {
        match op {
            CompareOp::Eq => |a, b| a == b,
            CompareOp::Ne => |a, b| a != b,
            CompareOp::Lt => |a, b| a < b,
            CompareOp::Le => |a, b| a <= b,
            CompareOp::Gt => |a, b| a > b,
            CompareOp::Ge => |a, b| a >= b,
        }
    }

    fn counts(&self) -> (usize, usize) {
        (
            self.unary.iter().filter(|f| f.is_some()).count(),
            self.binary.iter().filter(|f| f.is_some()).count(),
        )
    }
}

impl<T> std::fmt::Debug for KernelSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unary: Vec<_> = UnaryOp::ALL
            .iter()
            .filter(|op| self.unary[**op as usize].is_some())
            .collect();
        let binary: Vec<_> = BinaryOp::ALL
            .iter()
            .filter(|op| self.binary[**op as usize].is_some())
            .collect();
        f.debug_struct("KernelSet")
            .field("kind", &self.kind)
            .field("unary", &unary)
            .field("binary", &binary)
            .finish()
    }
}

fn float_kernels<T: Element + Float>() -> KernelSet<T> {
    KernelSet::<T>::empty()
        .with_unary(UnaryOp::Neg, |a| -a)
        .with_unary(UnaryOp::Abs, func::float_abs)
        .with_unary(UnaryOp::Sqrt, func::float_sqrt)
        .with_unary(UnaryOp::Square, |a| a * a)
        .with_unary(UnaryOp::Recip, |a| a.recip())
        .with_unary(UnaryOp::Exp, |a| a.exp())
        .with_unary(UnaryOp::Ln, |a| a.ln())
        .with_unary(UnaryOp::Sin, |a| a.sin())
        .with_unary(UnaryOp::Cos, |a| a.cos())
        .with_unary(UnaryOp::Tanh, |a| a.tanh())
        .with_unary(UnaryOp::Floor, |a| a.floor())
        .with_unary(UnaryOp::Ceil, |a| a.ceil())
        .with_unary(UnaryOp::Round, |a| a.round())
        .with_unary(UnaryOp::Sign, |a| {
            if a.is_nan() || a == T::zero() {
                a
            } else {
                a.signum()
            }
        })
        .with_binary(BinaryOp::Add, func::add)
        .with_binary(BinaryOp::Sub, func::sub)
        .with_binary(BinaryOp::Mul, func::mul)
        .with_binary(BinaryOp::Div, func::div)
        .with_binary(BinaryOp::Rem, |a, b| a % b)
        .with_binary(BinaryOp::Pow, |a, b| a.powf(b))
        .with_binary(BinaryOp::Min, func::min)
        .with_binary(BinaryOp::Max, func::max)
}

/// Integer table. Division by zero returns the dividend and remainder by zero
/// returns zero; the dispatcher rejects zero divisors before reaching here.
fn int_kernels<T>(signed: bool) -> KernelSet<T>
where
    T: Element
        + PrimInt
        + CheckedDiv
        + CheckedRem
        + WrappingAdd
        + WrappingSub
        + WrappingMul
        + WrappingNeg,
{
    let set = KernelSet::<T>::empty()
        .with_unary(UnaryOp::Abs, func::wrapping_abs)
        .with_unary(UnaryOp::Square, |a| a.wrapping_mul(&a))
        .with_unary(UnaryOp::Sign, |a| {
            if a > T::zero() {
                T::one()
            } else if a < T::zero() {
                T::zero().wrapping_sub(&T::one())
            } else {
                T::zero()
            }
        })
        .with_binary(BinaryOp::Add, func::wrapping_add)
        .with_binary(BinaryOp::Sub, func::wrapping_sub)
        .with_binary(BinaryOp::Mul, func::wrapping_mul)
        .with_binary(BinaryOp::Div, |a, b| a.checked_div(&b).unwrap_or(a))
        .with_binary(BinaryOp::Rem, |a, b| a.checked_rem(&b).unwrap_or(T::zero()))
        .with_binary(BinaryOp::Min, func::min)
        .with_binary(BinaryOp::Max, func::max)
        .with_binary(BinaryOp::And, |a, b| a & b)
        .with_binary(BinaryOp::Or, |a, b| a | b)
        .with_binary(BinaryOp::Xor, |a, b| a ^ b);
    if signed {
        set.with_unary(UnaryOp::Neg, |a| a.wrapping_neg())
    } else {
        set
    }
}

fn bool_kernels() -> KernelSet<bool> {
    KernelSet::<bool>::empty()
        .with_unary(UnaryOp::Not, |a| !a)
        .with_binary(BinaryOp::And, |a, b| a & b)
        .with_binary(BinaryOp::Or, |a, b| a | b)
        .with_binary(BinaryOp::Xor, |a, b| a ^ b)
        .with_binary(BinaryOp::Min, func::min)
        .with_binary(BinaryOp::Max, func::max)
}

/// Element types with a scalar kernel registry.
pub trait KernelElement: VectorElement {
    /// The process-wide table for this type, built on first call.
    fn kernels() -> &'static KernelSet<Self>;

    /// Sum of a contiguous run with explicit SIMD, if this type has one.
    fn simd_sum(_values: &[Self]) -> Option<Self> {
        None
    }
}

macro_rules! impl_kernel_element {
    ($t:ty, $build:expr $(, sum = $sum:path)?) => {
        impl KernelElement for $t {
            fn kernels() -> &'static KernelSet<$t> {
                static SET: OnceLock<KernelSet<$t>> = OnceLock::new();
                SET.get_or_init(|| {
                    let set: KernelSet<$t> = $build;
                    let (unary, binary) = set.counts();
                    tracing::debug!(kind = %set.kind(), unary, binary, "built scalar kernel registry");
                    set
                })
            }

            $(
                #[cfg(feature = "simd")]
                fn simd_sum(values: &[$t]) -> Option<$t> {
                    Some($sum(values))
                }
            )?
        }
    };
}

impl_kernel_element!(bool, bool_kernels());
impl_kernel_element!(u8, int_kernels::<u8>(false));
impl_kernel_element!(i32, int_kernels::<i32>(true));
impl_kernel_element!(i64, int_kernels::<i64>(true));
impl_kernel_element!(f32, float_kernels::<f32>(), sum = crate::simd::sum::sum_f32);
impl_kernel_element!(f64, float_kernels::<f64>(), sum = crate::simd::sum::sum_f64);

#[cfg(test)]
mod tests {
    use super::*;
    use ndstride_view::ErrorKind;

    #[test]
    fn test_op_tables() {
        assert_eq!(UnaryOp::COUNT, 15);
        assert_eq!(BinaryOp::COUNT, 11);
        assert_eq!(CompareOp::COUNT, 6);
        for (i, op) in BinaryOp::ALL.iter().enumerate() {
            assert_eq!(*op as usize, i);
        }
        assert_eq!(UnaryOp::Sqrt.to_string(), "sqrt");
    }

    #[test]
    fn test_tables_build_for_each_family() {
        let f = float_kernels::<f64>();
        assert_eq!(f.unary(UnaryOp::Neg).unwrap()(2.5), -2.5);
        assert_eq!(f.unary(UnaryOp::Square).unwrap()(3.0), 9.0);

        let signed = int_kernels::<i32>(true);
        assert_eq!(signed.unary(UnaryOp::Square).unwrap()(-7), 49);
        assert_eq!(signed.unary(UnaryOp::Neg).unwrap()(4), -4);
        let unsigned = int_kernels::<u8>(false);
        assert!(!unsigned.supports_unary(UnaryOp::Neg));

        let b = bool_kernels();
        assert!(b.unary(UnaryOp::Not).unwrap()(false));
        assert!(!b.binary(BinaryOp::And).unwrap()(true, false));
    }

    #[test]
    fn test_registry_is_shared() {
        let a = f64::kernels() as *const _;
        let b = f64::kernels() as *const _;
        assert_eq!(a, b);
        assert_eq!(f64::kernels().kind(), ElementKind::F64);
    }

    #[test]
    fn test_unsupported_pairs() {
        let err = i32::kernels().unary(UnaryOp::Sqrt).unwrap_err();
        assert_eq!(
            err,
            StridedError::UnsupportedOperation {
                op: "sqrt",
                kind: ElementKind::I32
            }
        );
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
        assert!(bool::kernels().binary(BinaryOp::Add).is_err());
        assert!(u8::kernels().unary(UnaryOp::Neg).is_err());
        assert!(f32::kernels().binary(BinaryOp::Xor).is_err());
        assert!(!f64::kernels().supports_unary(UnaryOp::Not));
        assert!(i64::kernels().supports_binary(BinaryOp::Rem));
    }

    #[test]
    fn test_rem_sign_follows_dividend() {
        let rem = i32::kernels().binary(BinaryOp::Rem).unwrap();
        assert_eq!(rem(-7, 3), -1);
        assert_eq!(rem(7, -3), 1);
        assert_eq!(rem(i32::MIN, -1), 0);
        let frem = f64::kernels().binary(BinaryOp::Rem).unwrap();
        assert_eq!(frem(-7.5, 2.0), -1.5);
        assert_eq!(frem(7.5, -2.0), 1.5);
    }

    #[test]
    fn test_integer_wrapping() {
        let k = i32::kernels();
        assert_eq!(k.binary(BinaryOp::Add).unwrap()(i32::MAX, 1), i32::MIN);
        assert_eq!(k.unary(UnaryOp::Abs).unwrap()(i32::MIN), i32::MIN);
        assert_eq!(k.unary(UnaryOp::Neg).unwrap()(5), -5);
        assert_eq!(k.binary(BinaryOp::Div).unwrap()(i32::MIN, -1), i32::MIN);
        assert_eq!(k.binary(BinaryOp::Div).unwrap()(-7, 2), -3);
        assert_eq!(u8::kernels().binary(BinaryOp::Sub).unwrap()(0, 1), 255);
    }

    #[test]
    fn test_sign() {
        let s = i64::kernels().unary(UnaryOp::Sign).unwrap();
        assert_eq!((s(-9), s(0), s(4)), (-1, 0, 1));
        let fs = f64::kernels().unary(UnaryOp::Sign).unwrap();
        assert_eq!(fs(-2.5), -1.0);
        assert_eq!(fs(0.0), 0.0);
        assert!(fs(f64::NAN).is_nan());
        assert_eq!(u8::kernels().unary(UnaryOp::Sign).unwrap()(200), 1);
    }

    #[test]
    fn test_min_max_nan_order() {
        let min = f64::kernels().binary(BinaryOp::Min).unwrap();
        assert!(min(f64::NAN, 1.0).is_nan());
        assert_eq!(min(1.0, f64::NAN), 1.0);
        let max = bool::kernels().binary(BinaryOp::Max).unwrap();
        assert!(max(false, true));
    }

    #[test]
    fn test_float_transcendentals() {
        let k = f64::kernels();
        approx::assert_relative_eq!(k.unary(UnaryOp::Exp).unwrap()(1.0), std::f64::consts::E);
        approx::assert_relative_eq!(k.unary(UnaryOp::Ln).unwrap()(std::f64::consts::E), 1.0);
        approx::assert_relative_eq!(k.binary(BinaryOp::Pow).unwrap()(2.0, 10.0), 1024.0);
        assert_eq!(k.unary(UnaryOp::Round).unwrap()(2.5), 3.0);
    }

    #[test]
    fn test_compare() {
        let k = i32::kernels();
        assert!(k.compare(CompareOp::Lt)(1, 2));
        assert!(!k.compare(CompareOp::Ge)(1, 2));
        assert!(!f64::kernels().compare(CompareOp::Eq)(f64::NAN, f64::NAN));
        assert!(f64::kernels().compare(CompareOp::Ne)(f64::NAN, f64::NAN));
    }

    #[test]
    fn test_bool_logic() {
        let k = bool::kernels();
        assert!(!k.unary(UnaryOp::Not).unwrap()(true));
        assert!(k.binary(BinaryOp::Xor).unwrap()(true, false));
        assert!(!k.binary(BinaryOp::And).unwrap()(true, false));
    }
}
