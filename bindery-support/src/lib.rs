//! # Bindery Support
//!
//! Shared utilities for the bindery crates.
//!
//! This crate provides:
//! - Type-name shortening for diagnostics
//! - Resolution path rendering
//! - "Did you mean?" suggestions for unbound capabilities

pub mod rendering;
