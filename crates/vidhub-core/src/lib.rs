//! # vidhub-core
//!
//! Core crate for VidHub. Contains configuration schemas, the default
//! video vocabularies that extensions may patch, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other VidHub crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
