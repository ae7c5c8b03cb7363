//! Protocol version 1 (V1) types for x402.
//!
//! V1 names networks with short strings (e.g., "base-sepolia") and transports the
//! payment offer in the body of the 402 response.
//!
//! # Key Types
//!
//! - [`X402Version1`] - Version marker that serializes as `1`
//! - [`PaymentOffer`] - HTTP 402 response body
//! - [`PaymentRequirements`] - Payment terms set by the seller
//! - [`PaymentPayload`] - Signed payment authorization from the buyer
//! - [`SettleResponse`] - Settlement result

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;

use crate::proto::{ExactScheme, NoMatchingScheme};
use crate::util::Base64Bytes;

/// Version marker for x402 protocol version 1.
///
/// Serializes as the integer `1`. Deserializing any other number fails, which is
/// how an offer with an unsupported `x402Version` gets rejected.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct X402Version1;

impl X402Version1 {
    pub const VALUE: u8 = 1;
}

impl PartialEq<u8> for X402Version1 {
    fn eq(&self, other: &u8) -> bool {
        *other == Self::VALUE
    }
}

impl From<X402Version1> for u8 {
    fn from(_: X402Version1) -> Self {
        X402Version1::VALUE
    }
}

impl Serialize for X402Version1 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(Self::VALUE)
    }
}

impl<'de> Deserialize<'de> for X402Version1 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let num = u64::deserialize(deserializer)?;
        if num == u64::from(Self::VALUE) {
            Ok(X402Version1)
        } else {
            Err(serde::de::Error::custom(format!(
                "unsupported x402Version: expected {}, got {}",
                Self::VALUE,
                num
            )))
        }
    }
}

impl Display for X402Version1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::VALUE)
    }
}

/// Payment requirements set by the seller.
///
/// The default type parameters give the raw, lossless form found in a 402 body:
/// every field is kept as the server sent it, and optional descriptive fields that
/// were absent stay absent on re-serialization. Chain-specific crates convert the
/// selected entry into a typed form with [`PaymentRequirements::as_concrete`].
///
/// # Type Parameters
///
/// - `TScheme` - The scheme identifier type (default: `String`)
/// - `TAmount` - The amount type (default: `String`)
/// - `TAddress` - The address type (default: `String`)
/// - `TExtra` - Scheme-specific extra data type (default: `serde_json::Value`)
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements<
    TScheme = String,
    TAmount = String,
    TAddress = String,
    TExtra = serde_json::Value,
> {
    /// The payment scheme (e.g., "exact").
    pub scheme: TScheme,
    /// The network name (e.g., "base-sepolia").
    pub network: String,
    /// The exact amount to transfer, in the token's smallest unit.
    pub max_amount_required: TAmount,
    /// The resource URL being paid for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Human-readable description of the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Optional JSON schema for the resource output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    /// The recipient address for payment.
    pub pay_to: TAddress,
    /// Upper bound, in seconds, of the authorization validity window.
    pub max_timeout_seconds: u64,
    /// The token contract address.
    pub asset: TAddress,
    /// Scheme-specific extra data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<TExtra>,
}

impl PaymentRequirements {
    /// Whether this entry asks for an `exact` payment on `network`.
    pub fn is_exact_on(&self, network: &str) -> bool {
        self.scheme == ExactScheme::VALUE && self.network == network
    }

    /// Parses the string fields into chain-specific types.
    ///
    /// Returns `None` when any of scheme, amount or addresses do not parse. An
    /// `extra` object that does not fit `TExtra` is dropped rather than failing.
    pub fn as_concrete<
        TScheme: FromStr,
        TAmount: FromStr,
        TAddress: FromStr,
        TExtra: DeserializeOwned,
    >(
        &self,
    ) -> Option<PaymentRequirements<TScheme, TAmount, TAddress, TExtra>> {
        let scheme = self.scheme.parse::<TScheme>().ok()?;
        let max_amount_required = self.max_amount_required.parse::<TAmount>().ok()?;
        let pay_to = self.pay_to.parse::<TAddress>().ok()?;
        let asset = self.asset.parse::<TAddress>().ok()?;
        let extra = self
            .extra
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok());
        Some(PaymentRequirements {
            scheme,
            network: self.network.clone(),
            max_amount_required,
            resource: self.resource.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
            output_schema: self.output_schema.clone(),
            pay_to,
            max_timeout_seconds: self.max_timeout_seconds,
            asset,
            extra,
        })
    }
}

/// HTTP 402 Payment Required response body for V1.
///
/// ```json
/// {
///   "x402Version": 1,
///   "accepts": [{ "scheme": "exact", "network": "base-sepolia", ... }],
///   "error": "X-PAYMENT header is required"
/// }
/// ```
///
/// Created per 402 response and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOffer {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// Acceptable payment methods. Order matters for display only.
    pub accepts: Vec<PaymentRequirements>,
    /// Diagnostic from the server, e.g. why a previous payment was refused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PaymentOffer {
    /// Picks the first requirement with the `exact` scheme on `network`.
    ///
    /// Never falls back to another network: paying on a chain the caller did not
    /// ask for would move funds somewhere unintended.
    pub fn select_requirement(
        &self,
        network: &str,
    ) -> Result<&PaymentRequirements, NoMatchingScheme> {
        self.accepts
            .iter()
            .find(|requirement| requirement.is_exact_on(network))
            .ok_or_else(|| NoMatchingScheme {
                network: network.to_string(),
            })
    }
}

/// A signed payment authorization from the buyer: the payment header envelope.
///
/// Field declaration order is the canonical JSON key order of the header.
///
/// # Type Parameters
///
/// - `TScheme` - The scheme identifier type (default: `String`)
/// - `TPayload` - The scheme-specific payload type (default: raw JSON)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload<TScheme = String, TPayload = serde_json::Value> {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// The payment scheme (e.g., "exact").
    pub scheme: TScheme,
    /// The network name (e.g., "base-sepolia").
    pub network: String,
    /// The scheme-specific signed payload.
    pub payload: TPayload,
}

impl<TScheme, TPayload> PaymentPayload<TScheme, TPayload> {
    /// Encodes the envelope as a payment header value: compact JSON, then
    /// standard Base64.
    ///
    /// The output is deterministic for a given envelope, since keys are written
    /// in declaration order.
    pub fn encode_header(&self) -> Result<String, serde_json::Error>
    where
        TScheme: Serialize,
        TPayload: Serialize,
    {
        let json = serde_json::to_vec(self)?;
        Ok(Base64Bytes::encode(json).into_string())
    }

    /// Decodes a payment header value produced by [`Self::encode_header`].
    pub fn decode_header(header: &str) -> Result<Self, HeaderDecodeError>
    where
        TScheme: DeserializeOwned,
        TPayload: DeserializeOwned,
    {
        let json = Base64Bytes::from(header.trim()).decode()?;
        let payload = serde_json::from_slice(&json)?;
        Ok(payload)
    }
}

/// A payment or receipt header could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum HeaderDecodeError {
    #[error("Header is not valid Base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Header does not hold the expected JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settlement receipt a server may return in `X-Payment-Response`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleResponse {
    /// Settlement succeeded.
    Success {
        /// The address that paid.
        payer: String,
        /// The transaction hash.
        transaction: String,
        /// The network where settlement occurred.
        network: String,
    },
    /// Settlement failed.
    Error {
        /// The reason for failure.
        reason: String,
        /// The network where settlement was attempted.
        network: String,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettleResponseWire {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    pub network: String,
}

impl Serialize for SettleResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            SettleResponse::Success {
                payer,
                transaction,
                network,
            } => SettleResponseWire {
                success: true,
                error_reason: None,
                payer: Some(payer.clone()),
                transaction: Some(transaction.clone()),
                network: network.clone(),
            },
            SettleResponse::Error { reason, network } => SettleResponseWire {
                success: false,
                error_reason: Some(reason.clone()),
                payer: None,
                transaction: None,
                network: network.clone(),
            },
        };
        wire.serialize(serializer)
    }
}

impl SettleResponse {
    /// Decodes an `X-Payment-Response` header value.
    pub fn decode_header(header: &str) -> Result<Self, HeaderDecodeError> {
        let json = Base64Bytes::from(header.trim()).decode()?;
        let receipt = serde_json::from_slice(&json)?;
        Ok(receipt)
    }
}

impl<'de> Deserialize<'de> for SettleResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = SettleResponseWire::deserialize(deserializer)?;
        if wire.success {
            let payer = wire
                .payer
                .ok_or_else(|| serde::de::Error::missing_field("payer"))?;
            let transaction = wire
                .transaction
                .ok_or_else(|| serde::de::Error::missing_field("transaction"))?;
            Ok(SettleResponse::Success {
                payer,
                transaction,
                network: wire.network,
            })
        } else {
            let reason = wire
                .error_reason
                .ok_or_else(|| serde::de::Error::missing_field("errorReason"))?;
            Ok(SettleResponse::Error {
                reason,
                network: wire.network,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_sepolia_offer() -> serde_json::Value {
        json!({
            "x402Version": 1,
            "accepts": [{
                "scheme": "exact",
                "network": "base-sepolia",
                "maxAmountRequired": "1000",
                "resource": "http://localhost:8000/chat",
                "description": "One chat completion",
                "mimeType": "application/json",
                "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                "maxTimeoutSeconds": 300,
                "asset": "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
                "extra": { "name": "USDC", "version": "2", "decimals": 6 }
            }],
            "error": "X-PAYMENT header is required"
        })
    }

    #[test]
    fn test_offer_parse_is_lossless() {
        let original = base_sepolia_offer();
        let offer: PaymentOffer = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(serde_json::to_value(&offer).unwrap(), original);
    }

    #[test]
    fn test_minimal_offer_is_lossless() {
        let original = json!({
            "x402Version": 1,
            "accepts": [{
                "scheme": "exact",
                "network": "base",
                "maxAmountRequired": "10",
                "payTo": "0xabc",
                "maxTimeoutSeconds": 60,
                "asset": "0xdef"
            }]
        });
        let offer: PaymentOffer = serde_json::from_value(original.clone()).unwrap();
        assert!(offer.error.is_none());
        assert_eq!(serde_json::to_value(&offer).unwrap(), original);
    }

    #[test]
    fn test_offer_rejects_other_versions() {
        let mut body = base_sepolia_offer();
        body["x402Version"] = json!(2);
        let err = serde_json::from_value::<PaymentOffer>(body).unwrap_err();
        assert!(err.to_string().contains("unsupported x402Version"));
    }

    #[test]
    fn test_offer_rejects_missing_fields() {
        let body = json!({ "x402Version": 1, "accepts": [{ "scheme": "exact" }] });
        assert!(serde_json::from_value::<PaymentOffer>(body).is_err());
        let body = json!({ "x402Version": 1 });
        assert!(serde_json::from_value::<PaymentOffer>(body).is_err());
    }

    #[test]
    fn test_select_requirement_first_match() {
        let offer: PaymentOffer = serde_json::from_value(json!({
            "x402Version": 1,
            "accepts": [
                { "scheme": "upto", "network": "base-sepolia", "maxAmountRequired": "1",
                  "payTo": "0x1", "maxTimeoutSeconds": 1, "asset": "0xa" },
                { "scheme": "exact", "network": "base", "maxAmountRequired": "2",
                  "payTo": "0x2", "maxTimeoutSeconds": 1, "asset": "0xb" },
                { "scheme": "exact", "network": "base-sepolia", "maxAmountRequired": "3",
                  "payTo": "0x3", "maxTimeoutSeconds": 1, "asset": "0xc" },
                { "scheme": "exact", "network": "base-sepolia", "maxAmountRequired": "4",
                  "payTo": "0x4", "maxTimeoutSeconds": 1, "asset": "0xd" }
            ]
        }))
        .unwrap();
        for _ in 0..3 {
            let selected = offer.select_requirement("base-sepolia").unwrap();
            assert_eq!(selected.max_amount_required, "3");
        }
        assert_eq!(
            offer.select_requirement("base").unwrap().max_amount_required,
            "2"
        );
    }

    #[test]
    fn test_select_requirement_never_substitutes_network() {
        let offer: PaymentOffer = serde_json::from_value(base_sepolia_offer()).unwrap();
        let err = offer.select_requirement("mainnet").unwrap_err();
        assert_eq!(err.network, "mainnet");
    }

    #[test]
    fn test_raw_header_round_trip() {
        let header = Base64Bytes::encode(
            br#"{"x402Version":1,"scheme":"exact","network":"base","payload":{"signature":"0x01","authorization":{"from":"0x1","to":"0x2","value":"5","validAfter":"1","validBefore":"2","nonce":"0x3"}}}"#,
        )
        .into_string();
        let envelope = PaymentPayload::<String, serde_json::Value>::decode_header(&header).unwrap();
        assert_eq!(envelope.network, "base");
        assert_eq!(envelope.encode_header().unwrap(), header);
    }

    #[test]
    fn test_header_decode_errors() {
        let err = PaymentPayload::<String, serde_json::Value>::decode_header("not base64!").unwrap_err();
        assert!(matches!(err, HeaderDecodeError::Base64(_)));
        let header = Base64Bytes::encode(b"{}").into_string();
        let err = PaymentPayload::<String, serde_json::Value>::decode_header(&header).unwrap_err();
        assert!(matches!(err, HeaderDecodeError::Json(_)));
    }

    #[test]
    fn test_settle_response_from_header() {
        let header = Base64Bytes::encode(
            br#"{"success":true,"payer":"0x1","transaction":"0x2","network":"base-sepolia"}"#,
        )
        .into_string();
        let receipt = SettleResponse::decode_header(&header).unwrap();
        assert_eq!(
            receipt,
            SettleResponse::Success {
                payer: "0x1".to_string(),
                transaction: "0x2".to_string(),
                network: "base-sepolia".to_string()
            }
        );
    }

    #[test]
    fn test_settle_response_wire() {
        let receipt: SettleResponse = serde_json::from_value(json!({
            "success": true,
            "payer": "0x857b06519E91e3A54538791bDbb0E22373e36b66",
            "transaction": "0xabc",
            "network": "base-sepolia"
        }))
        .unwrap();
        assert!(matches!(receipt, SettleResponse::Success { .. }));

        let failed: SettleResponse = serde_json::from_value(json!({
            "success": false,
            "errorReason": "insufficient_funds",
            "network": "base-sepolia"
        }))
        .unwrap();
        assert_eq!(
            failed,
            SettleResponse::Error {
                reason: "insufficient_funds".to_string(),
                network: "base-sepolia".to_string()
            }
        );
    }
}
