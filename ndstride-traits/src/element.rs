//! Element type bounds for strided buffers and kernels.

use std::fmt::Debug;

use crate::kind::ElementKind;

/// A value that can be stored in a strided buffer.
///
/// `LANES` is the batch width used by the vector kernel library for this type;
/// `0` means the type has no vector kernels and always takes the scalar path.
pub trait Element: Copy + Send + Sync + PartialEq + PartialOrd + Debug + Default + 'static {
    const KIND: ElementKind;
    const LANES: usize;

    /// Truthiness used by count/any/all reductions and `select`.
    fn is_nonzero(self) -> bool;
}

/// Elements with ring arithmetic and numeric casts.
pub trait NumElement: Element + num_traits::Num + num_traits::NumCast {}

/// Floating-point elements.
pub trait FloatElement: NumElement + num_traits::Float {}

impl Element for bool {
    const KIND: ElementKind = ElementKind::Bool;
    const LANES: usize = 0;

    #[inline]
    fn is_nonzero(self) -> bool {
        self
    }
}

macro_rules! impl_numeric_element {
    ($($t:ty => $kind:ident, $lanes:expr);* $(;)?) => {
        $(
            impl Element for $t {
                const KIND: ElementKind = ElementKind::$kind;
                const LANES: usize = $lanes;

                #[inline]
                fn is_nonzero(self) -> bool {
                    self != <$t as num_traits::Zero>::zero()
                }
            }

            impl NumElement for $t {}
        )*
    };
}

impl_numeric_element! {
    u8 => U8, 0;
    i32 => I32, 8;
    i64 => I64, 4;
    f32 => F32, 8;
    f64 => F64, 4;
}

impl FloatElement for f32 {}
impl FloatElement for f64 {}
