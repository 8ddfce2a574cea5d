//! Dynamic library entry points.

pub mod abi;

pub use abi::{ABI_VERSION, AbiVersionFn, RegisterFn, UnregisterFn};
