//! Utility types and functions for x402.
//!
//! - [`b64`] - Base64 encoding/decoding for header values
//! - [`lit_str`] - String literal types such as the `"exact"` scheme tag

pub mod b64;
pub mod lit_str;

pub use b64::*;
