//! Shared element traits for the ndstride workspace.
//!
//! This crate holds the type bounds every other crate agrees on:
//!
//! - [`Element`]: anything that can live in a strided buffer, tagged with a
//!   runtime [`ElementKind`]
//! - [`NumElement`]: elements with arithmetic, used by reductions
//! - [`FloatElement`]: floating-point elements, used by transcendental kernels
//!
//! Keeping them in a leaf crate lets downstream crates implement kernels for
//! these types without orphan rule violations.

pub mod element;
pub mod kind;

pub use element::{Element, FloatElement, NumElement};
pub use kind::ElementKind;
