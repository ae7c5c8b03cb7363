//! EIP-155 (EVM) chain support for x402 payment clients.
//!
//! This crate turns a selected x402 v1 payment requirement into a signed
//! payment header for EVM chains. The "exact" scheme is based on ERC-3009
//! `transferWithAuthorization`: the payer signs an EIP-712 message off-chain and
//! the server's settlement service submits it on-chain.
//!
//! # Architecture
//!
//! - [`chain`] - EVM wire types: checksummed addresses, decimal amounts, chain references
//! - [`networks`] - Well-known networks and their USDC deployments
//! - [`v1_eip155_exact`] - Authorization construction, typed data and signing
//!
//! # Feature Flags
//!
//! - `telemetry` - `tracing` spans and events around signing
//!
//! # Example
//!
//! ```ignore
//! use alloy_signer_local::PrivateKeySigner;
//! use x402_chain_eip155::v1_eip155_exact::{PaymentRequirements, sign_payment};
//! use x402_chain_eip155::chain::Eip155ChainReference;
//! use x402_types::timestamp::UnixTimestamp;
//!
//! let signer = PrivateKeySigner::random();
//! let requirements = PaymentRequirements::try_from(offer.select_requirement("base-sepolia")?)?;
//! let envelope = sign_payment(
//!     &signer,
//!     &requirements,
//!     Eip155ChainReference::new(84532),
//!     UnixTimestamp::try_now()?,
//!     60,
//! )
//! .await?;
//! let header = envelope.encode_header()?;
//! ```

pub mod chain;
pub mod networks;
pub mod v1_eip155_exact;
