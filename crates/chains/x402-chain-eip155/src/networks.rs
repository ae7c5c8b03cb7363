//! Well-known EVM networks and their USDC deployments.
//!
//! Mirrors the network table of [`x402_types::networks`]: Base Sepolia, Base,
//! Sepolia and Ethereum mainnet.

use alloy_primitives::{Address, address};
use x402_types::chain::ChainId;

use crate::chain::{Eip155ChainReference, Eip155TokenDeployment, TokenDeploymentEip712};

/// Per-network instances for the EVM networks x402 clients pay on.
///
/// # Examples
///
/// ```
/// use x402_chain_eip155::networks::{KnownNetworkEip155, USDC};
/// use x402_types::chain::ChainId;
///
/// let base = ChainId::base();
/// assert_eq!(base.reference, "8453");
///
/// let usdc = USDC::base_sepolia();
/// assert_eq!(usdc.eip712.name, "USDC");
/// ```
pub trait KnownNetworkEip155<A> {
    /// Returns the instance for Base Sepolia testnet (eip155:84532)
    fn base_sepolia() -> A;
    /// Returns the instance for Base mainnet (eip155:8453)
    fn base() -> A;
    /// Returns the instance for Ethereum Sepolia testnet (eip155:11155111)
    fn sepolia() -> A;
    /// Returns the instance for Ethereum mainnet (eip155:1)
    fn mainnet() -> A;
}

impl KnownNetworkEip155<ChainId> for ChainId {
    fn base_sepolia() -> ChainId {
        Eip155ChainReference::new(84532).as_chain_id()
    }

    fn base() -> ChainId {
        Eip155ChainReference::new(8453).as_chain_id()
    }

    fn sepolia() -> ChainId {
        Eip155ChainReference::new(11155111).as_chain_id()
    }

    fn mainnet() -> ChainId {
        Eip155ChainReference::new(1).as_chain_id()
    }
}

/// Circle's USDC, the asset x402 servers charge in.
#[derive(Debug, Clone, Copy)]
#[allow(clippy::upper_case_acronyms)]
pub struct USDC;

fn usdc(chain_id: u64, address: Address, name: &str) -> Eip155TokenDeployment {
    Eip155TokenDeployment {
        chain_reference: Eip155ChainReference::new(chain_id),
        address,
        decimals: 6,
        eip712: TokenDeploymentEip712 {
            name: name.into(),
            version: "2".into(),
        },
    }
}

impl KnownNetworkEip155<Eip155TokenDeployment> for USDC {
    fn base_sepolia() -> Eip155TokenDeployment {
        usdc(
            84532,
            address!("0x036CbD53842c5426634e7929541eC2318f3dCF7e"),
            "USDC",
        )
    }

    fn base() -> Eip155TokenDeployment {
        usdc(
            8453,
            address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
            "USD Coin",
        )
    }

    fn sepolia() -> Eip155TokenDeployment {
        usdc(
            11155111,
            address!("0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"),
            "USDC",
        )
    }

    fn mainnet() -> Eip155TokenDeployment {
        usdc(
            1,
            address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            "USD Coin",
        )
    }
}

impl USDC {
    /// All known USDC deployments.
    pub fn all() -> [Eip155TokenDeployment; 4] {
        [Self::base_sepolia(), Self::base(), Self::sepolia(), Self::mainnet()]
    }

    /// The USDC deployment on a chain, if known.
    pub fn by_chain(chain_reference: Eip155ChainReference) -> Option<Eip155TokenDeployment> {
        Self::all()
            .into_iter()
            .find(|deployment| deployment.chain_reference == chain_reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usdc_by_chain() {
        let usdc = USDC::by_chain(Eip155ChainReference::new(84532)).unwrap();
        assert_eq!(
            usdc.address,
            address!("0x036CbD53842c5426634e7929541eC2318f3dCF7e")
        );
        assert_eq!(usdc.decimals, 6);
        assert!(USDC::by_chain(Eip155ChainReference::new(137)).is_none());
    }

    #[test]
    fn test_chain_ids_match_network_table() {
        let table = x402_types::networks::NetworkTable::default();
        assert_eq!(table.chain_id("base-sepolia").unwrap(), ChainId::base_sepolia());
        assert_eq!(table.chain_id("base").unwrap(), ChainId::base());
        assert_eq!(table.chain_id("sepolia").unwrap(), ChainId::sepolia());
        assert_eq!(table.chain_id("mainnet").unwrap(), ChainId::mainnet());
    }
}
