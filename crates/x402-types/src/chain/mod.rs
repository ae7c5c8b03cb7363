//! Chain identifiers for x402 payment processing.
//!
//! The v1 protocol names networks with short strings (`"base-sepolia"`). Internally
//! those names are resolved to a [`ChainId`] through [`crate::networks`], and the
//! chain-specific crates turn the [`ChainId`] into whatever numeric form they sign with.

mod chain_id;

pub use chain_id::*;
