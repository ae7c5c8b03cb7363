//! Adapter configuration.
//!
//! Everything the adapter would otherwise read from the environment is an
//! explicit field here, handed over at construction:
//!
//! ```json
//! {
//!   "targetNetwork": "base-sepolia",
//!   "chainIdOverrides": { "base-sepolia": 84532 },
//!   "paymentHeader": "X-Payment",
//!   "clockSkewSeconds": 60,
//!   "assetPolicy": "knownUsdc",
//!   "maxAmount": "1000000"
//! }
//! ```
//!
//! All fields are optional.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use x402_chain_eip155::chain::{ChecksummedAddress, Eip155ChainReference, TokenAmount};
use x402_chain_eip155::networks::USDC;
use x402_chain_eip155::v1_eip155_exact::DEFAULT_CLOCK_SKEW_SECS;
use x402_types::networks::NetworkTable;
use x402_types::proto::PAYMENT_HEADER;

/// Configuration of a [`PaymentChallengeAdapter`](crate::PaymentChallengeAdapter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterConfig {
    /// The only network payments are made on.
    #[serde(default = "config_defaults::target_network")]
    pub target_network: String,
    /// Extra or replacement `network name -> chain id` entries.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub chain_id_overrides: BTreeMap<String, u64>,
    /// Request header the payment envelope is attached as.
    #[serde(default = "config_defaults::payment_header")]
    pub payment_header: String,
    /// Seconds `validAfter` lies before now.
    #[serde(default = "config_defaults::clock_skew_seconds")]
    pub clock_skew_seconds: u64,
    /// Which token contracts may be signed for.
    #[serde(default)]
    pub asset_policy: AssetPolicy,
    /// Upper bound for a single payment, in the token's smallest unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<TokenAmount>,
}

mod config_defaults {
    use super::*;

    pub const DEFAULT_TARGET_NETWORK: &str = "base-sepolia";

    pub fn target_network() -> String {
        DEFAULT_TARGET_NETWORK.to_string()
    }

    pub fn payment_header() -> String {
        PAYMENT_HEADER.to_string()
    }

    pub fn clock_skew_seconds() -> u64 {
        DEFAULT_CLOCK_SKEW_SECS
    }
}

pub use config_defaults::DEFAULT_TARGET_NETWORK;

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            target_network: config_defaults::target_network(),
            chain_id_overrides: BTreeMap::new(),
            payment_header: config_defaults::payment_header(),
            clock_skew_seconds: config_defaults::clock_skew_seconds(),
            asset_policy: AssetPolicy::default(),
            max_amount: None,
        }
    }
}

impl AdapterConfig {
    /// Sets the network payments are made on.
    pub fn with_target_network<N: Into<String>>(mut self, network: N) -> Self {
        self.target_network = network.into();
        self
    }

    /// Adds or replaces a chain id.
    pub fn with_chain_id_override<N: Into<String>>(mut self, network: N, chain_id: u64) -> Self {
        self.chain_id_overrides.insert(network.into(), chain_id);
        self
    }

    pub fn with_asset_policy(mut self, policy: AssetPolicy) -> Self {
        self.asset_policy = policy;
        self
    }

    pub fn with_max_amount<A: Into<TokenAmount>>(mut self, max: A) -> Self {
        self.max_amount = Some(max.into());
        self
    }

    /// The chain-id table: built-in networks plus the overrides.
    pub fn network_table(&self) -> NetworkTable {
        NetworkTable::new(self.chain_id_overrides.clone())
    }
}

/// Which token contracts the adapter is willing to sign an authorization for.
///
/// The EIP-712 domain comes from the server's offer. Without a restriction the
/// adapter signs against whatever contract the server names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetPolicy {
    /// Sign for any asset.
    #[default]
    Any,
    /// Only the USDC deployment of the payment's chain.
    KnownUsdc,
    /// Only the listed contracts.
    Allow(Vec<ChecksummedAddress>),
}

impl AssetPolicy {
    /// Whether `asset` on `chain_reference` may be signed for.
    pub fn allows(&self, asset: &ChecksummedAddress, chain_reference: Eip155ChainReference) -> bool {
        match self {
            AssetPolicy::Any => true,
            AssetPolicy::KnownUsdc => USDC::by_chain(chain_reference)
                .is_some_and(|deployment| deployment.address == asset.0),
            AssetPolicy::Allow(assets) => assets.contains(asset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config: AdapterConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, AdapterConfig::default());
        assert_eq!(config.target_network, "base-sepolia");
        assert_eq!(config.payment_header, "X-Payment");
        assert_eq!(config.clock_skew_seconds, 60);
        assert_eq!(config.asset_policy, AssetPolicy::Any);
        assert!(config.max_amount.is_none());
    }

    #[test]
    fn test_full_config() {
        let config: AdapterConfig = serde_json::from_value(json!({
            "targetNetwork": "base",
            "chainIdOverrides": { "anvil": 31337 },
            "paymentHeader": "X-PAYMENT",
            "clockSkewSeconds": 30,
            "assetPolicy": { "allow": ["0x833589fcd6edb6e08f4c7c32d4f71b54bda02913"] },
            "maxAmount": "5000000"
        }))
        .unwrap();
        assert_eq!(config.target_network, "base");
        assert_eq!(
            config.network_table().chain_id("anvil").unwrap().reference,
            "31337"
        );
        assert_eq!(config.max_amount, Some(TokenAmount::from(5_000_000)));
        assert!(matches!(config.asset_policy, AssetPolicy::Allow(ref list) if list.len() == 1));

        let config: AdapterConfig =
            serde_json::from_value(json!({ "assetPolicy": "knownUsdc" })).unwrap();
        assert_eq!(config.asset_policy, AssetPolicy::KnownUsdc);
    }

    #[test]
    fn test_asset_policy() {
        let base = Eip155ChainReference::new(8453);
        let usdc_base: ChecksummedAddress =
            "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".parse().unwrap();
        let usdc_base_sepolia: ChecksummedAddress =
            "0x036CbD53842c5426634e7929541eC2318f3dCF7e".parse().unwrap();

        assert!(AssetPolicy::Any.allows(&usdc_base_sepolia, base));
        assert!(AssetPolicy::KnownUsdc.allows(&usdc_base, base));
        assert!(!AssetPolicy::KnownUsdc.allows(&usdc_base_sepolia, base));
        assert!(!AssetPolicy::KnownUsdc.allows(&usdc_base, Eip155ChainReference::new(137)));

        let allow = AssetPolicy::Allow(vec![usdc_base_sepolia]);
        assert!(allow.allows(&usdc_base_sepolia, base));
        assert!(!allow.allows(&usdc_base, base));
    }
}
