//! Type definitions for the V1 EIP-155 "exact" payment scheme.
//!
//! This module defines the wire format types for ERC-3009 based payments
//! on EVM chains using the V1 x402 protocol.

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::sol;
use serde::{Deserialize, Serialize};
use x402_types::proto::v1;
use x402_types::timestamp::UnixTimestamp;

use crate::chain::{ChecksummedAddress, TokenAmount, decimal_u256};

pub use x402_types::proto::ExactScheme;

/// The payment header envelope of the exact scheme.
pub type PaymentPayload = v1::PaymentPayload<ExactScheme, ExactEvmPayload>;

/// Full payload required to authorize an ERC-3009 transfer:
/// includes the signature and the EIP-712 struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayload {
    pub signature: Bytes,
    pub authorization: ExactEvmPayloadAuthorization,
}

/// EIP-712 structured data for ERC-3009-based authorization.
/// Defines who can transfer how much tokens and when.
///
/// Field order is the canonical key order of the header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayloadAuthorization {
    pub from: ChecksummedAddress,
    pub to: ChecksummedAddress,
    #[serde(with = "decimal_u256")]
    pub value: U256,
    pub valid_after: UnixTimestamp,
    pub valid_before: UnixTimestamp,
    pub nonce: B256,
}

/// A payment requirement with its fields parsed for the exact scheme.
pub type PaymentRequirements =
    v1::PaymentRequirements<ExactScheme, TokenAmount, Address, PaymentRequirementsExtra>;

/// Optional EIP-712 domain overrides carried in `extra`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirementsExtra {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// The selected requirement could not be read as an exact EVM payment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Requirement is not a valid exact EVM payment: scheme, amount, payTo or asset did not parse")]
pub struct InvalidRequirements;

/// Parses a raw requirement from a 402 body into its typed form.
///
/// Descriptive fields and the domain overrides are carried over; any other key
/// in `extra` is ignored here but stays in the raw offer.
pub fn parse_requirements(
    raw: &v1::PaymentRequirements,
) -> Result<PaymentRequirements, InvalidRequirements> {
    raw.as_concrete().ok_or(InvalidRequirements)
}

sol!(
    /// Solidity-compatible struct definition for ERC-3009 `transferWithAuthorization`.
    ///
    /// This matches the EIP-3009 format used in EIP-712 typed data:
    /// it defines the authorization to transfer tokens from `from` to `to`
    /// for a specific `value`, valid only between `validAfter` and `validBefore`
    /// and identified by a unique `nonce`.
    #[derive(Debug, PartialEq, Eq)]
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
);

impl From<&ExactEvmPayloadAuthorization> for TransferWithAuthorization {
    fn from(authorization: &ExactEvmPayloadAuthorization) -> Self {
        TransferWithAuthorization {
            from: authorization.from.into(),
            to: authorization.to.into(),
            value: authorization.value,
            validAfter: U256::from(authorization.valid_after.as_secs()),
            validBefore: U256::from(authorization.valid_before.as_secs()),
            nonce: authorization.nonce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_requirement() -> serde_json::Value {
        json!({
            "scheme": "exact",
            "network": "base-sepolia",
            "maxAmountRequired": "1000",
            "resource": "http://localhost:8000/chat",
            "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
            "maxTimeoutSeconds": 300,
            "asset": "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
            "extra": { "name": "USDC", "version": "2", "decimals": 6 }
        })
    }

    #[test]
    fn test_parse_requirements() {
        let raw: v1::PaymentRequirements = serde_json::from_value(raw_requirement()).unwrap();
        let typed = parse_requirements(&raw).unwrap();
        assert_eq!(typed.max_amount_required, TokenAmount::from(1000));
        assert_eq!(typed.max_timeout_seconds, 300);
        assert_eq!(
            typed.extra,
            Some(PaymentRequirementsExtra {
                name: Some("USDC".into()),
                version: Some("2".into())
            })
        );
        assert_eq!(typed.resource.as_deref(), Some("http://localhost:8000/chat"));
    }

    #[test]
    fn test_parse_requirements_rejects_bad_fields() {
        let mut value = raw_requirement();
        value["maxAmountRequired"] = json!("ten");
        let raw: v1::PaymentRequirements = serde_json::from_value(value).unwrap();
        assert_eq!(parse_requirements(&raw), Err(InvalidRequirements));

        let mut value = raw_requirement();
        value["payTo"] = json!("0xabc");
        let raw: v1::PaymentRequirements = serde_json::from_value(value).unwrap();
        assert_eq!(parse_requirements(&raw), Err(InvalidRequirements));

        let mut value = raw_requirement();
        value["scheme"] = json!("upto");
        let raw: v1::PaymentRequirements = serde_json::from_value(value).unwrap();
        assert_eq!(parse_requirements(&raw), Err(InvalidRequirements));
    }

    #[test]
    fn test_authorization_wire_format() {
        let authorization = ExactEvmPayloadAuthorization {
            from: "0x857b06519e91e3a54538791bdbb0e22373e36b66".parse().unwrap(),
            to: "0x209693bc6afc0c5328ba36faf03c514ef312287c".parse().unwrap(),
            value: U256::from(1000u64),
            valid_after: UnixTimestamp::from_secs(1699999940),
            valid_before: UnixTimestamp::from_secs(1700000300),
            nonce: B256::repeat_byte(0xab),
        };
        let json = serde_json::to_string(&authorization).unwrap();
        assert_eq!(
            json,
            format!(
                r#"{{"from":"0x857b06519E91e3A54538791bDbb0E22373e36b66","to":"0x209693Bc6afc0C5328bA36FaF03C514EF312287C","value":"1000","validAfter":"1699999940","validBefore":"1700000300","nonce":"0x{}"}}"#,
                "ab".repeat(32)
            )
        );
    }
}
