//! Core types: the element-type contract and the error types.

pub mod error;
pub mod types;

pub use error::{AutodiffError, Result};
pub use types::{constants, Scalar};
