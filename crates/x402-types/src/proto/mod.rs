//! Protocol types for x402 payment messages.
//!
//! Only protocol version 1 is spoken: the 402 body carries the offer as JSON, the
//! replay carries the signed payload in the `X-Payment` header, and the server
//! may acknowledge settlement in `X-Payment-Response`.
//!
//! # Key Types
//!
//! - [`v1::PaymentOffer`] - The 402 response body: accepted payment requirements
//! - [`v1::PaymentRequirements`] - One way of paying the server will accept
//! - [`v1::PaymentPayload`] - The signed envelope carried in the payment header
//! - [`v1::SettleResponse`] - Settlement receipt returned with a paid response

pub mod v1;

crate::lit_str!(ExactScheme, "exact");

/// Request header carrying the Base64 payment envelope.
pub const PAYMENT_HEADER: &str = "X-Payment";

/// Response header carrying the Base64 settlement receipt.
pub const PAYMENT_RESPONSE_HEADER: &str = "X-Payment-Response";

/// No accepted requirement uses the `exact` scheme on the wanted network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("No supported payment scheme found (need exact on {network})")]
pub struct NoMatchingScheme {
    /// The network the caller asked to pay on.
    pub network: String,
}
