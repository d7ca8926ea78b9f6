//! # Base types for tabiya
//!
//! This is an auxiliary crate for `tabiya`, which contains the plain value types shared by
//! the rules crate: files, ranks, squares, colors and piece kinds.
//!
//! Normally you don't want to use this crate directly. Use `tabiya` instead.

pub mod geometry;
pub mod types;
