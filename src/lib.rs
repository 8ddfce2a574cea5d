//! # vidhub
//!
//! The VidHub server: HTTP surface over the extension host.

pub mod http;
pub mod logging;
