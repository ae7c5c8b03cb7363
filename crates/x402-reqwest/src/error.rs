//! Errors of the payment-challenge cycle.

use alloy_primitives::Address;
use std::time::SystemTimeError;
use x402_chain_eip155::chain::TokenAmount;
use x402_chain_eip155::v1_eip155_exact::SigningFailed;
use x402_types::networks::UnknownNetwork;
use x402_types::proto::NoMatchingScheme;

/// Errors that can occur while driving an x402 payment cycle.
///
/// Every failure is returned to the caller; the adapter never swallows one and
/// never retries on its own.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The 402 body is not a valid x402 v1 offer, or the selected entry does not
    /// parse as an exact EVM requirement.
    #[error("Malformed payment offer: {0}")]
    MalformedOffer(String),
    /// No accepted requirement uses the exact scheme on the target network.
    #[error(transparent)]
    NoMatchingScheme(#[from] NoMatchingScheme),
    /// The requirement names a network without a known chain id.
    #[error(transparent)]
    UnknownNetwork(#[from] UnknownNetwork),
    /// The wallet refused or failed. Starting over signs a new authorization.
    #[error(transparent)]
    SigningFailed(#[from] SigningFailed),
    /// The paid retry was answered with another 402. Terminal.
    #[error("Payment rejected by server: {}", .hint.as_deref().unwrap_or("no reason given"))]
    PaymentRejected { hint: Option<String> },
    /// Network or backend failure, passed through unmodified.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The original request could not be kept for the retry.
    #[error("Request object is not cloneable. Are you passing a streaming body?")]
    RequestNotCloneable,
    /// A challenge from this adapter is still outstanding.
    #[error("Another payment cycle is already in progress")]
    CycleInProgress,
    /// The cycle was cancelled; a late signature was discarded.
    #[error("Payment cycle was cancelled")]
    Cancelled,
    /// The asset is not on the configured allow-list.
    #[error("Asset {asset} on {network} is not allowed")]
    AssetNotAllowed { asset: Address, network: String },
    /// The amount exceeds the configured per-payment maximum.
    #[error("Payment amount {requested} exceeds maximum allowed {allowed}")]
    AmountAboveLimit {
        requested: TokenAmount,
        allowed: TokenAmount,
    },
    /// The envelope could not be turned into a header value.
    #[error("Failed to encode payment header: {0}")]
    HeaderEncode(String),
    /// Raised when the system clock could not be read to compute the validity window.
    #[error("Failed to get system clock")]
    Clock(#[source] SystemTimeError),
}
