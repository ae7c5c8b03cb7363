#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Caller-driven [x402](https://www.x402.org) payments for `reqwest`.
//!
//! A [`PaymentChallengeAdapter`] sends requests unmodified. When the server
//! answers `402 Payment Required`, the adapter does not pay on its own: it parses
//! the x402 v1 offer and returns it as a [`PaymentChallenge`]. The caller then
//! signs an EIP-3009 `TransferWithAuthorization` with a wallet of their choice
//! and the adapter retries the original request exactly once with the
//! `X-Payment` header.
//!
//! ## Quickstart
//!
//! ```rust,ignore
//! use alloy_signer_local::PrivateKeySigner;
//! use reqwest::Client;
//! use x402_reqwest::{AdapterConfig, Issued, ReqwestWithPaymentChallenges};
//!
//! let signer: PrivateKeySigner = "PRIVATE_KEY".parse()?;
//! let adapter = Client::new().with_payment_challenges(AdapterConfig::default());
//!
//! let request = adapter.http().get("https://api.example.com/protected").build()?;
//! let response = match adapter.issue(request).await? {
//!     Issued::Response(response) => response,
//!     Issued::PaymentRequired(challenge) => {
//!         println!("Server asks for {:?}", challenge.offer().accepts);
//!         adapter.pay(challenge, &signer).await?
//!     }
//! };
//! ```
//!
//! ## Step by step
//!
//! [`PaymentChallengeAdapter::pay`] is shorthand for
//! [`select_requirement`](PaymentChallengeAdapter::select_requirement),
//! [`build_authorization`](PaymentChallengeAdapter::build_authorization),
//! [`sign`](PaymentChallengeAdapter::sign) and
//! [`retry`](PaymentChallengeAdapter::retry). Callers that need to show the
//! offer or the authorization to a user before signing can run them one at a time.
//!
//! ## Cancellation
//!
//! [`PaymentChallengeAdapter::cancel`] abandons the outstanding cycle. A wallet
//! prompt in flight is dropped and a signature that arrives afterwards is never
//! sent.

mod builder;
mod client;
pub mod config;
pub mod cycle;
pub mod error;
pub mod http_transport;

pub use builder::*;
pub use client::*;
pub use config::{AdapterConfig, AssetPolicy};
pub use cycle::{Attempt, AttemptOutcome, CyclePhase};
pub use error::PaymentError;
pub use http_transport::{payment_offer_from_response, settlement_receipt};
