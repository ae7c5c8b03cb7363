//! CAIP-2 chain identifier type.
//!
//! A CAIP-2 chain ID consists of two parts separated by a colon:
//!
//! - **Namespace**: The blockchain ecosystem (`eip155` for EVM chains)
//! - **Reference**: The chain-specific identifier (`84532` for Base Sepolia)
//!
//! # Examples
//!
//! ```
//! use x402_types::chain::ChainId;
//!
//! let base = ChainId::new("eip155", "8453");
//! assert_eq!(base.to_string(), "eip155:8453");
//!
//! let sepolia: ChainId = "eip155:11155111".parse().unwrap();
//! assert_eq!(sepolia.namespace, "eip155");
//! assert_eq!(sepolia.reference, "11155111");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::networks;

/// A CAIP-2 compliant blockchain identifier, displayed as `"eip155:84532"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainId {
    /// The blockchain namespace (`eip155` for EVM chains).
    pub namespace: String,
    /// The chain-specific reference (`8453` for Base).
    pub reference: String,
}

impl ChainId {
    /// Creates a new chain ID from namespace and reference components.
    pub fn new<N: Into<String>, R: Into<String>>(namespace: N, reference: R) -> Self {
        Self {
            namespace: namespace.into(),
            reference: reference.into(),
        }
    }

    /// Returns the namespace component of the chain ID.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the reference component of the chain ID.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Creates a chain ID from one of the built-in network names.
    ///
    /// Only consults the fixed table; configured overrides live in
    /// [`networks::NetworkTable`].
    ///
    /// ```
    /// use x402_types::chain::ChainId;
    ///
    /// let base = ChainId::from_network_name("base").unwrap();
    /// assert_eq!(base.to_string(), "eip155:8453");
    ///
    /// assert!(ChainId::from_network_name("polygon").is_none());
    /// ```
    pub fn from_network_name(network_name: &str) -> Option<Self> {
        networks::known_network(network_name).map(|info| info.chain_id())
    }

    /// Returns the built-in network name for this chain ID, if any.
    pub fn as_network_name(&self) -> Option<&'static str> {
        networks::KNOWN_NETWORKS
            .iter()
            .find(|info| info.namespace == self.namespace && info.reference == self.reference)
            .map(|info| info.name)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.reference)
    }
}

/// Error returned when parsing an invalid chain ID string.
///
/// A valid chain ID must be in the format `namespace:reference` where both
/// components are non-empty strings.
#[derive(Debug, thiserror::Error)]
#[error("Invalid chain id format {0}")]
pub struct ChainIdFormatError(String);

impl FromStr for ChainId {
    type Err = ChainIdFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((namespace, reference)) if !namespace.is_empty() && !reference.is_empty() => {
                Ok(ChainId::new(namespace, reference))
            }
            _ => Err(ChainIdFormatError(s.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let chain_id: ChainId = "eip155:11155111".parse().unwrap();
        assert_eq!(chain_id.namespace(), "eip155");
        assert_eq!(chain_id.reference(), "11155111");
        assert_eq!(chain_id.to_string(), "eip155:11155111");

        assert!("invalid".parse::<ChainId>().is_err());
        assert!("eip155:".parse::<ChainId>().is_err());
        assert!(":1".parse::<ChainId>().is_err());
    }

    #[test]
    fn test_chain_id_from_network_name() {
        let base_sepolia = ChainId::from_network_name("base-sepolia").unwrap();
        assert_eq!(base_sepolia, ChainId::new("eip155", "84532"));

        let mainnet = ChainId::from_network_name("mainnet").unwrap();
        assert_eq!(mainnet, ChainId::new("eip155", "1"));

        assert!(ChainId::from_network_name("polygon").is_none());
    }

    #[test]
    fn test_chain_id_as_network_name() {
        assert_eq!(ChainId::new("eip155", "8453").as_network_name(), Some("base"));
        assert_eq!(
            ChainId::new("eip155", "11155111").as_network_name(),
            Some("sepolia")
        );
        assert!(ChainId::new("eip155", "137").as_network_name().is_none());
    }
}
