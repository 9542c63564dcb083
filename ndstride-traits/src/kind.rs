//! Runtime element type tags.

use std::fmt;

/// Closed set of element types the kernel libraries know about.
///
/// Generic code is monomorphized per type; the tag exists so that errors and
/// registry lookups can name the type at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Bool,
    U8,
    I32,
    I64,
    F32,
    F64,
}

impl ElementKind {
    /// Size in bytes of one element.
    pub fn size_of(self) -> usize {
        match self {
            ElementKind::Bool | ElementKind::U8 => 1,
            ElementKind::I32 | ElementKind::F32 => 4,
            ElementKind::I64 | ElementKind::F64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, ElementKind::F32 | ElementKind::F64)
    }

    pub fn is_integer(self) -> bool {
        matches!(self, ElementKind::U8 | ElementKind::I32 | ElementKind::I64)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            ElementKind::I32 | ElementKind::I64 | ElementKind::F32 | ElementKind::F64
        )
    }

    /// Short lowercase name, matching the Rust primitive.
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Bool => "bool",
            ElementKind::U8 => "u8",
            ElementKind::I32 => "i32",
            ElementKind::I64 => "i64",
            ElementKind::F32 => "f32",
            ElementKind::F64 => "f64",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(ElementKind::Bool.size_of(), 1);
        assert_eq!(ElementKind::I32.size_of(), 4);
        assert_eq!(ElementKind::F64.size_of(), 8);
    }

    #[test]
    fn test_classification() {
        assert!(ElementKind::F32.is_float());
        assert!(!ElementKind::I64.is_float());
        assert!(ElementKind::U8.is_integer());
        assert!(!ElementKind::U8.is_signed());
        assert!(ElementKind::I32.is_signed());
        assert!(!ElementKind::Bool.is_integer());
    }

    #[test]
    fn test_display() {
        assert_eq!(ElementKind::F64.to_string(), "f64");
        assert_eq!(format!("{}", ElementKind::Bool), "bool");
    }
}
