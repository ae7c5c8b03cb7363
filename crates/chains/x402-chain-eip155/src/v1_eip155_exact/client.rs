//! Client-side payment signing for the V1 EIP-155 "exact" scheme.
//!
//! Signing happens in three steps, each usable on its own:
//!
//! 1. [`build_authorization`] - a fresh ERC-3009 authorization with a new nonce
//!    and validity window
//! 2. [`TransferTypedData::new`] - the EIP-712 domain and message for it
//! 3. [`sign_authorization`] - delegate to a [`SignerLike`] wallet
//!
//! [`sign_payment`] runs all three and wraps the result in the header envelope.

use alloy_primitives::{Address, B256, FixedBytes, Signature};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain};
use async_trait::async_trait;
use rand::{Rng, rng};
use std::sync::Arc;
use x402_types::proto::v1::X402Version1;
use x402_types::timestamp::UnixTimestamp;

#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

use crate::chain::Eip155ChainReference;
use crate::v1_eip155_exact::types::{
    ExactEvmPayload, ExactEvmPayloadAuthorization, ExactScheme, PaymentPayload,
    PaymentRequirements, TransferWithAuthorization,
};

/// Seconds subtracted from "now" for `validAfter`, to tolerate clock drift
/// between the payer and the settlement verifier.
pub const DEFAULT_CLOCK_SKEW_SECS: u64 = 60;

/// EIP-712 domain name used when the requirement carries no `extra.name`.
pub const DEFAULT_EIP712_NAME: &str = "USD Coin";

/// EIP-712 domain version used when the requirement carries no `extra.version`.
pub const DEFAULT_EIP712_VERSION: &str = "2";

/// Builds a fresh authorization for `requirements` with the default clock skew.
///
/// See [`build_authorization_with_skew`].
pub fn build_authorization(
    requirements: &PaymentRequirements,
    payer: Address,
    now: UnixTimestamp,
) -> ExactEvmPayloadAuthorization {
    build_authorization_with_skew(requirements, payer, now, DEFAULT_CLOCK_SKEW_SECS)
}

/// Builds a fresh authorization for `requirements`.
///
/// - `value` is `maxAmountRequired` verbatim, no conversion or rounding
/// - `validAfter` is `now - clock_skew`, `validBefore` is `now + maxTimeoutSeconds`,
///   both saturating
/// - `nonce` is 32 fresh random bytes on every call
pub fn build_authorization_with_skew(
    requirements: &PaymentRequirements,
    payer: Address,
    now: UnixTimestamp,
    clock_skew: u64,
) -> ExactEvmPayloadAuthorization {
    let nonce: [u8; 32] = rng().random();
    ExactEvmPayloadAuthorization {
        from: payer.into(),
        to: requirements.pay_to.into(),
        value: requirements.max_amount_required.into(),
        valid_after: now - clock_skew,
        valid_before: now + requirements.max_timeout_seconds,
        nonce: FixedBytes(nonce),
    }
}

/// The EIP-712 domain a requirement asks the payer to sign under.
///
/// Name and version come from `extra` when present, otherwise
/// [`DEFAULT_EIP712_NAME`] / [`DEFAULT_EIP712_VERSION`]. The verifying contract
/// is the requirement's `asset`.
pub fn eip712_domain_for(
    requirements: &PaymentRequirements,
    chain_reference: Eip155ChainReference,
) -> Eip712Domain {
    let extra = requirements.extra.clone().unwrap_or_default();
    let name = extra.name.unwrap_or_else(|| DEFAULT_EIP712_NAME.to_string());
    let version = extra
        .version
        .unwrap_or_else(|| DEFAULT_EIP712_VERSION.to_string());
    eip712_domain! {
        name: name,
        version: version,
        chain_id: chain_reference.inner(),
        verifying_contract: requirements.asset,
    }
}

/// The typed data a wallet is asked to sign.
#[derive(Debug, Clone)]
pub struct TransferTypedData {
    pub domain: Eip712Domain,
    pub message: TransferWithAuthorization,
}

impl TransferTypedData {
    pub fn new(
        authorization: &ExactEvmPayloadAuthorization,
        requirements: &PaymentRequirements,
        chain_reference: Eip155ChainReference,
    ) -> Self {
        Self {
            domain: eip712_domain_for(requirements, chain_reference),
            message: TransferWithAuthorization::from(authorization),
        }
    }

    /// The EIP-712 hash the signature commits to.
    pub fn signing_hash(&self) -> B256 {
        self.message.eip712_signing_hash(&self.domain)
    }
}

/// The wallet refused, failed or disappeared while signing.
///
/// Terminal for the attempt. Starting over builds a new authorization, never
/// re-signs the old one.
#[derive(Debug, thiserror::Error)]
#[error("Failed to sign payment authorization: {0}")]
pub struct SigningFailed(#[source] pub alloy_signer::Error);

/// Signs `authorization` for `requirements` on the given chain.
#[cfg_attr(feature = "telemetry", instrument(name = "x402.eip155.sign_authorization", skip_all, err, fields(chain_id = %chain_reference, from = %authorization.from)))]
pub async fn sign_authorization<S: SignerLike + Sync + ?Sized>(
    signer: &S,
    authorization: &ExactEvmPayloadAuthorization,
    requirements: &PaymentRequirements,
    chain_reference: Eip155ChainReference,
) -> Result<Signature, SigningFailed> {
    let typed_data = TransferTypedData::new(authorization, requirements, chain_reference);
    signer
        .sign_typed_data(&typed_data)
        .await
        .map_err(SigningFailed)
}

/// Builds, signs and wraps a payment for `requirements`.
///
/// Every call produces a new nonce and validity window.
#[cfg_attr(feature = "telemetry", instrument(name = "x402.eip155.sign_payment", skip_all, err, fields(network = %requirements.network, amount = %requirements.max_amount_required)))]
pub async fn sign_payment<S: SignerLike + Sync + ?Sized>(
    signer: &S,
    requirements: &PaymentRequirements,
    chain_reference: Eip155ChainReference,
    now: UnixTimestamp,
    clock_skew: u64,
) -> Result<PaymentPayload, SigningFailed> {
    let authorization =
        build_authorization_with_skew(requirements, signer.address(), now, clock_skew);

    #[cfg(feature = "telemetry")]
    debug!(
        nonce = %authorization.nonce,
        valid_after = %authorization.valid_after,
        valid_before = %authorization.valid_before,
        "Built transfer authorization"
    );

    let signature =
        sign_authorization(signer, &authorization, requirements, chain_reference).await?;
    Ok(PaymentPayload {
        x402_version: X402Version1,
        scheme: ExactScheme,
        network: requirements.network.clone(),
        payload: ExactEvmPayload {
            signature: signature.as_bytes().into(),
            authorization,
        },
    })
}

/// A trait that abstracts signing operations, allowing both owned signers and Arc-wrapped signers.
///
/// A browser or hardware wallet implements it by showing `typed_data` to the user;
/// a local key signs [`TransferTypedData::signing_hash`] directly.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use alloy_signer_local::PrivateKeySigner;
///
/// let signer: PrivateKeySigner = "0x…".parse()?;
/// let signer = Arc::new(signer);
/// // Now you can use `signer` anywhere `SignerLike` is expected
/// ```
#[async_trait]
pub trait SignerLike {
    /// Returns the address of the signer.
    fn address(&self) -> Address;

    /// Signs the EIP-712 typed data of a transfer authorization.
    async fn sign_typed_data(
        &self,
        typed_data: &TransferTypedData,
    ) -> Result<Signature, alloy_signer::Error>;
}

#[async_trait]
impl SignerLike for PrivateKeySigner {
    fn address(&self) -> Address {
        PrivateKeySigner::address(self)
    }

    async fn sign_typed_data(
        &self,
        typed_data: &TransferTypedData,
    ) -> Result<Signature, alloy_signer::Error> {
        alloy_signer::Signer::sign_hash(self, &typed_data.signing_hash()).await
    }
}

#[async_trait]
impl<T: SignerLike + Send + Sync + ?Sized> SignerLike for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    async fn sign_typed_data(
        &self,
        typed_data: &TransferTypedData,
    ) -> Result<Signature, alloy_signer::Error> {
        (**self).sign_typed_data(typed_data).await
    }
}
