//! Shared definitions used across the scanner and the patcher

pub mod error;

pub use error::{Error, Result};
