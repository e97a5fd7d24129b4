//! Common types shared across CipherFlow crates.
//!
//! This module provides the error taxonomy used throughout the codebase,
//! ensuring every crate reports failures in a consistent shape.

pub mod error;

pub use error::{Error, Result};
