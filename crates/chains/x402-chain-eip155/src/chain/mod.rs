//! EVM chain types for x402 payments via EIP-155.
//!
//! # Key Types
//!
//! - [`Eip155ChainReference`] - A numeric chain ID for EVM networks (e.g., `84532` for Base Sepolia)
//! - [`ChecksummedAddress`] - An address that always serializes with its EIP-55 checksum
//! - [`TokenAmount`] - A token amount in the smallest unit, written as a decimal string
//! - [`Eip155TokenDeployment`] - A token contract and its EIP-712 domain parameters

pub mod types;
pub use types::*;
