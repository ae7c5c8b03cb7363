#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Wire types for the client side of the x402 payment protocol.
//!
//! A server that wants to be paid answers `402 Payment Required` with a JSON body
//! listing the payment methods it accepts. The client picks one, signs an
//! authorization and replays the original request with the signed payload in a
//! Base64 header. This crate holds everything about that exchange that does not
//! depend on a particular chain.
//!
//! # Modules
//!
//! - [`chain`] - CAIP-2 chain identifiers
//! - [`config`] - Configuration values that may be resolved from the environment
//! - [`networks`] - The fixed network name to chain id table and its overrides
//! - [`proto`] - Protocol messages: payment offers, payment headers, settlement receipts
//! - [`timestamp`] - Unix timestamps for authorization validity windows
//! - [`util`] - Base64 helpers and string literal types

pub mod chain;
pub mod config;
pub mod networks;
pub mod proto;
pub mod timestamp;
pub mod util;
