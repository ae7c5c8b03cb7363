//! Network name to chain id resolution.
//!
//! Version 1 of the x402 protocol identifies networks by short names such as
//! `"base-sepolia"`. The client only ever pays on networks it can name with
//! certainty: the built-in table below, optionally amended by explicit
//! configuration. An unrecognized name is an error, never a guess.
//!
//! | name           | chain id   |
//! |----------------|------------|
//! | `base-sepolia` | `84532`    |
//! | `base`         | `8453`     |
//! | `sepolia`      | `11155111` |
//! | `mainnet`      | `1`        |
//!
//! # Examples
//!
//! ```
//! use x402_types::networks::NetworkTable;
//!
//! let table = NetworkTable::default();
//! assert_eq!(table.chain_id("base-sepolia").unwrap().reference, "84532");
//! assert!(table.chain_id("polygon").is_err());
//!
//! let table = NetworkTable::default().with_override("base-sepolia", 31337);
//! assert_eq!(table.chain_id("base-sepolia").unwrap().reference, "31337");
//! ```

use std::collections::BTreeMap;

use crate::chain::ChainId;

/// The CAIP-2 namespace of every network in the built-in table.
pub const EIP155_NAMESPACE: &str = "eip155";

/// A known network definition with its chain ID and human-readable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Human-readable network name (e.g., "base-sepolia")
    pub name: &'static str,
    /// CAIP-2 namespace (always "eip155" here)
    pub namespace: &'static str,
    /// Chain reference (e.g., "84532" for Base Sepolia)
    pub reference: &'static str,
}

impl NetworkInfo {
    /// Create a ChainId from this network info
    pub fn chain_id(&self) -> ChainId {
        ChainId::new(self.namespace, self.reference)
    }
}

/// The networks a payment may be signed for without extra configuration.
pub static KNOWN_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "base-sepolia",
        namespace: EIP155_NAMESPACE,
        reference: "84532",
    },
    NetworkInfo {
        name: "base",
        namespace: EIP155_NAMESPACE,
        reference: "8453",
    },
    NetworkInfo {
        name: "sepolia",
        namespace: EIP155_NAMESPACE,
        reference: "11155111",
    },
    NetworkInfo {
        name: "mainnet",
        namespace: EIP155_NAMESPACE,
        reference: "1",
    },
];

/// Looks a name up in [`KNOWN_NETWORKS`]. Case-sensitive.
pub fn known_network(name: &str) -> Option<&'static NetworkInfo> {
    KNOWN_NETWORKS.iter().find(|info| info.name == name)
}

/// The network name was neither in the built-in table nor configured.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown network: {0}")]
pub struct UnknownNetwork(pub String);

/// Resolves network names to chain ids.
///
/// Starts from [`KNOWN_NETWORKS`]; explicit overrides replace the chain id of a
/// known name or register an additional name. Overrides are plain data handed in
/// at construction, there is no ambient lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkTable {
    overrides: BTreeMap<String, u64>,
}

impl NetworkTable {
    /// Builds a table from a set of `name -> chain id` overrides.
    pub fn new(overrides: BTreeMap<String, u64>) -> Self {
        Self { overrides }
    }

    /// Returns a copy of the table with one more override.
    pub fn with_override<N: Into<String>>(mut self, name: N, chain_id: u64) -> Self {
        self.overrides.insert(name.into(), chain_id);
        self
    }

    /// Resolves `name` to a chain id, overrides first.
    pub fn chain_id(&self, name: &str) -> Result<ChainId, UnknownNetwork> {
        if let Some(chain_id) = self.overrides.get(name) {
            return Ok(ChainId::new(EIP155_NAMESPACE, chain_id.to_string()));
        }
        known_network(name)
            .map(NetworkInfo::chain_id)
            .ok_or_else(|| UnknownNetwork(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_networks_table() {
        let table = NetworkTable::default();
        assert_eq!(
            table.chain_id("base-sepolia").unwrap(),
            ChainId::new("eip155", "84532")
        );
        assert_eq!(table.chain_id("base").unwrap(), ChainId::new("eip155", "8453"));
        assert_eq!(
            table.chain_id("sepolia").unwrap(),
            ChainId::new("eip155", "11155111")
        );
        assert_eq!(table.chain_id("mainnet").unwrap(), ChainId::new("eip155", "1"));
    }

    #[test]
    fn test_unknown_network_is_not_guessed() {
        let table = NetworkTable::default();
        assert_eq!(
            table.chain_id("polygon"),
            Err(UnknownNetwork("polygon".to_string()))
        );
        // Lookups are case-sensitive
        assert!(table.chain_id("Base").is_err());
    }

    #[test]
    fn test_overrides() {
        let table = NetworkTable::default()
            .with_override("base", 31337)
            .with_override("anvil", 31338);
        assert_eq!(table.chain_id("base").unwrap().reference, "31337");
        assert_eq!(table.chain_id("anvil").unwrap().reference, "31338");
        assert_eq!(table.chain_id("sepolia").unwrap().reference, "11155111");
        assert!(table.chain_id("polygon").is_err());
    }
}
