//! The payment-challenge adapter.
//!
//! [`PaymentChallengeAdapter`] sends a request and, when the server answers
//! `402 Payment Required`, hands the parsed offer back to the caller as a
//! [`PaymentChallenge`] instead of paying on its own. The caller decides when
//! a wallet is available and drives the rest of the cycle, either step by step
//! or with [`PaymentChallengeAdapter::pay`]:
//!
//! ```rust,ignore
//! use x402_reqwest::{AdapterConfig, Issued, PaymentChallengeAdapter};
//!
//! let adapter = PaymentChallengeAdapter::new(reqwest::Client::new(), AdapterConfig::default());
//! let request = adapter.http().post("http://localhost:8000/chat").json(&body).build()?;
//! let response = match adapter.issue(request).await? {
//!     Issued::Response(response) => response,
//!     Issued::PaymentRequired(challenge) => adapter.pay(challenge, &signer).await?,
//! };
//! ```
//!
//! Only one challenge per adapter may be outstanding at a time, and each
//! challenge is retried at most once.

use alloy_primitives::{Address, Signature};
use http::HeaderValue;
use http::header::HeaderName;
use reqwest::{Client, Request, Response};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use x402_chain_eip155::chain::{ChecksummedAddress, Eip155ChainReference};
use x402_chain_eip155::v1_eip155_exact::{
    self as exact, ExactEvmPayload, ExactEvmPayloadAuthorization, ExactScheme,
    PaymentRequirements, SignerLike,
};
use x402_types::networks::{NetworkTable, UnknownNetwork};
use x402_types::proto::v1::{self, PaymentOffer, X402Version1};
use x402_types::timestamp::UnixTimestamp;

#[cfg(feature = "telemetry")]
use tracing::{debug, info, instrument, trace, warn};

use crate::config::AdapterConfig;
use crate::cycle::{Attempt, AttemptOutcome, CyclePhase};
use crate::error::PaymentError;
use crate::http_transport::payment_offer_from_response;

/// Result of issuing a request through the adapter.
#[derive(Debug)]
pub enum Issued {
    /// Anything but a 402, returned verbatim.
    Response(Response),
    /// The server asked for payment.
    PaymentRequired(PaymentChallenge),
}

/// An outstanding 402: the offer and everything needed to retry once.
///
/// Holding a challenge blocks the adapter from issuing another request. The
/// slot frees when the challenge is retried, paid, or dropped.
#[derive(Debug)]
pub struct PaymentChallenge {
    offer: PaymentOffer,
    request: Request,
    generation: u64,
    cancellation: CancellationToken,
    phase: CyclePhase,
    _slot: CycleGuard,
}

impl PaymentChallenge {
    /// The parsed 402 body.
    pub fn offer(&self) -> &PaymentOffer {
        &self.offer
    }

    /// The request the retry will re-send.
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Whether [`PaymentChallengeAdapter::cancel`] was called since this
    /// challenge was issued.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    fn advance(&mut self, next: CyclePhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "invalid cycle transition {:?} -> {:?}",
            self.phase,
            next
        );
        self.phase = next;
    }
}

#[derive(Debug, Default)]
struct CycleSlot {
    outstanding: AtomicBool,
    generation: AtomicU64,
    cancellation: Mutex<CancellationToken>,
    last_phase: Mutex<Option<CyclePhase>>,
}

impl CycleSlot {
    fn try_claim(self: &Arc<Self>) -> Result<CycleGuard, PaymentError> {
        self.outstanding
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PaymentError::CycleInProgress)?;
        Ok(CycleGuard {
            slot: Arc::clone(self),
        })
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn token(&self) -> CancellationToken {
        self.cancellation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let previous = {
            let mut token = self
                .cancellation
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *token)
        };
        previous.cancel();
    }

    fn finish(&self, phase: CyclePhase) {
        debug_assert!(phase.is_terminal());
        *self
            .last_phase
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(phase);
    }

    fn last_phase(&self) -> Option<CyclePhase> {
        *self
            .last_phase
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
struct CycleGuard {
    slot: Arc<CycleSlot>,
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.slot.outstanding.store(false, Ordering::Release);
    }
}

/// Intercepts 402 responses and drives the x402 v1 exact-scheme payment cycle.
#[derive(Debug)]
pub struct PaymentChallengeAdapter {
    http: Client,
    config: AdapterConfig,
    networks: NetworkTable,
    cycle: Arc<CycleSlot>,
}

impl Default for PaymentChallengeAdapter {
    fn default() -> Self {
        Self::new(Client::new(), AdapterConfig::default())
    }
}

impl PaymentChallengeAdapter {
    pub fn new(http: Client, config: AdapterConfig) -> Self {
        let networks = config.network_table();
        Self {
            http,
            config,
            networks,
            cycle: Arc::new(CycleSlot::default()),
        }
    }

    /// The underlying HTTP client, for building requests to [`Self::issue`].
    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// How the most recently retried cycle ended: [`CyclePhase::Settled`] or
    /// [`CyclePhase::Rejected`]. `None` until a retry got an answer.
    pub fn last_cycle_phase(&self) -> Option<CyclePhase> {
        self.cycle.last_phase()
    }

    /// Sends `request` unmodified.
    ///
    /// Returns any non-402 response verbatim. A 402 body is parsed into a
    /// [`PaymentChallenge`]; nothing is signed or retried here.
    ///
    /// The adapter is busy from the moment the request is sent: a concurrent
    /// `issue` fails with [`PaymentError::CycleInProgress`] without reaching
    /// the server.
    #[cfg_attr(feature = "telemetry", instrument(name = "x402.reqwest.issue", skip_all, err, fields(method = %request.method(), url = %request.url())))]
    pub async fn issue(&self, request: Request) -> Result<Issued, PaymentError> {
        let slot = self.cycle.try_claim()?;
        let generation = self.cycle.generation();
        let retry_request = request.try_clone();
        let response = self.http.execute(request).await?;

        if Attempt::First.classify(response.status()) == AttemptOutcome::Passthrough {
            #[cfg(feature = "telemetry")]
            trace!(status = ?response.status(), "No payment required, returning response");
            return Ok(Issued::Response(response));
        }

        #[cfg(feature = "telemetry")]
        info!(url = %response.url(), "Received 402 Payment Required");

        let offer = payment_offer_from_response(response).await?;
        let request = retry_request.ok_or(PaymentError::RequestNotCloneable)?;
        if self.cycle.generation() != generation {
            return Err(PaymentError::Cancelled);
        }
        let mut challenge = PaymentChallenge {
            offer,
            request,
            generation,
            cancellation: self.cycle.token(),
            phase: CyclePhase::Idle,
            _slot: slot,
        };
        challenge.advance(CyclePhase::OfferReceived);
        Ok(Issued::PaymentRequired(challenge))
    }

    /// Picks the requirement to pay: the first exact-scheme entry on the
    /// configured target network, parsed into its typed form.
    pub fn select_requirement(
        &self,
        challenge: &PaymentChallenge,
    ) -> Result<PaymentRequirements, PaymentError> {
        let raw = challenge
            .offer
            .select_requirement(&self.config.target_network)?;
        let requirements = exact::parse_requirements(raw)
            .map_err(|e| PaymentError::MalformedOffer(e.to_string()))?;

        #[cfg(feature = "telemetry")]
        debug!(
            network = %requirements.network,
            asset = %requirements.asset,
            amount = %requirements.max_amount_required,
            "Selected payment requirement"
        );

        Ok(requirements)
    }

    /// Resolves a network name through the built-in table and configured overrides.
    pub fn chain_reference(&self, network: &str) -> Result<Eip155ChainReference, PaymentError> {
        let chain_id = self.networks.chain_id(network)?;
        Eip155ChainReference::try_from(&chain_id)
            .map_err(|_| PaymentError::UnknownNetwork(UnknownNetwork(network.to_string())))
    }

    /// Builds a fresh authorization from `payer` for `requirements`, at the
    /// current time with the configured clock skew.
    pub fn build_authorization(
        &self,
        requirements: &PaymentRequirements,
        payer: Address,
    ) -> Result<ExactEvmPayloadAuthorization, PaymentError> {
        let now = UnixTimestamp::try_now().map_err(PaymentError::Clock)?;
        Ok(exact::build_authorization_with_skew(
            requirements,
            payer,
            now,
            self.config.clock_skew_seconds,
        ))
    }

    /// Signs `authorization` with `signer` after checking the configured
    /// asset policy and amount cap.
    #[cfg_attr(feature = "telemetry", instrument(name = "x402.reqwest.sign", skip_all, err, fields(network = %requirements.network)))]
    pub async fn sign<S: SignerLike + Sync + ?Sized>(
        &self,
        authorization: &ExactEvmPayloadAuthorization,
        requirements: &PaymentRequirements,
        signer: &S,
    ) -> Result<Signature, PaymentError> {
        let chain_reference = self.chain_reference(&requirements.network)?;
        self.check_limits(requirements, chain_reference)?;
        let signature =
            exact::sign_authorization(signer, authorization, requirements, chain_reference)
                .await?;
        Ok(signature)
    }

    fn check_limits(
        &self,
        requirements: &PaymentRequirements,
        chain_reference: Eip155ChainReference,
    ) -> Result<(), PaymentError> {
        let asset = ChecksummedAddress::from(requirements.asset);
        if !self.config.asset_policy.allows(&asset, chain_reference) {
            return Err(PaymentError::AssetNotAllowed {
                asset: requirements.asset,
                network: requirements.network.clone(),
            });
        }
        #[cfg(feature = "telemetry")]
        if self.config.asset_policy == crate::config::AssetPolicy::Any {
            warn!(
                asset = %requirements.asset,
                "No asset policy configured, signing against the server-supplied EIP-712 domain"
            );
        }
        match self.config.max_amount {
            Some(max) if requirements.max_amount_required > max => {
                Err(PaymentError::AmountAboveLimit {
                    requested: requirements.max_amount_required,
                    allowed: max,
                })
            }
            _ => Ok(()),
        }
    }

    /// Re-sends the challenged request with `envelope` as the payment header.
    ///
    /// Consumes the challenge, so a cycle retries at most once. A 402 answer is
    /// [`PaymentError::PaymentRejected`] with the server's hint; any other
    /// response is returned as is.
    #[cfg_attr(feature = "telemetry", instrument(name = "x402.reqwest.retry", skip_all, err, fields(url = %challenge.request.url())))]
    pub async fn retry<TScheme, TPayload>(
        &self,
        challenge: PaymentChallenge,
        envelope: &v1::PaymentPayload<TScheme, TPayload>,
    ) -> Result<Response, PaymentError>
    where
        TScheme: Serialize,
        TPayload: Serialize,
    {
        self.ensure_current(&challenge)?;
        let header = envelope
            .encode_header()
            .map_err(|e| PaymentError::HeaderEncode(e.to_string()))?;
        let name = HeaderName::try_from(self.config.payment_header.as_str())
            .map_err(|e| PaymentError::HeaderEncode(e.to_string()))?;
        let value =
            HeaderValue::from_str(&header).map_err(|e| PaymentError::HeaderEncode(e.to_string()))?;

        let mut challenge = challenge;
        challenge.advance(CyclePhase::Retried);
        let PaymentChallenge {
            mut request,
            phase,
            _slot: slot,
            ..
        } = challenge;
        request.headers_mut().insert(name, value);

        #[cfg(feature = "telemetry")]
        trace!(url = %request.url(), "Retrying request with payment header");

        let response = self.http.execute(request).await?;
        let outcome = Attempt::Paid.classify(response.status());
        if let Some(terminal) = outcome.terminal_phase() {
            debug_assert!(phase.can_advance_to(terminal));
            self.cycle.finish(terminal);

            #[cfg(feature = "telemetry")]
            debug!(phase = ?terminal, "Payment cycle finished");
        }
        drop(slot);

        match outcome {
            AttemptOutcome::Rejected => {
                let hint = payment_offer_from_response(response)
                    .await
                    .ok()
                    .and_then(|offer| offer.error);

                #[cfg(feature = "telemetry")]
                warn!(hint = ?hint, "Payment rejected by server");

                Err(PaymentError::PaymentRejected { hint })
            }
            _ => Ok(response),
        }
    }

    /// Runs the rest of the cycle: select, build, sign, encode and retry.
    ///
    /// If [`Self::cancel`] is called while the wallet is signing, the wallet
    /// prompt is abandoned and the result discarded with
    /// [`PaymentError::Cancelled`]; no retry is sent.
    #[cfg_attr(feature = "telemetry", instrument(name = "x402.reqwest.pay", skip_all, err))]
    pub async fn pay<S: SignerLike + Sync + ?Sized>(
        &self,
        challenge: PaymentChallenge,
        signer: &S,
    ) -> Result<Response, PaymentError> {
        let mut challenge = challenge;
        self.ensure_current(&challenge)?;
        let requirements = self.select_requirement(&challenge)?;
        let authorization = self.build_authorization(&requirements, signer.address())?;

        challenge.advance(CyclePhase::Signing);
        let cancellation = challenge.cancellation.clone();
        let signature = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(PaymentError::Cancelled),
            signature = self.sign(&authorization, &requirements, signer) => signature?,
        };
        self.ensure_current(&challenge)?;

        let envelope = exact::PaymentPayload {
            x402_version: X402Version1,
            scheme: ExactScheme,
            network: requirements.network.clone(),
            payload: ExactEvmPayload {
                signature: signature.as_bytes().into(),
                authorization,
            },
        };
        self.retry(challenge, &envelope).await
    }

    /// Cancels the outstanding cycle, if any.
    ///
    /// A pending wallet prompt is abandoned, and a signature delivered for a
    /// cancelled cycle is discarded.
    pub fn cancel(&self) {
        #[cfg(feature = "telemetry")]
        debug!("Cancelling payment cycle");
        self.cycle.cancel();
    }

    fn ensure_current(&self, challenge: &PaymentChallenge) -> Result<(), PaymentError> {
        if challenge.is_cancelled() || challenge.generation != self.cycle.generation() {
            return Err(PaymentError::Cancelled);
        }
        Ok(())
    }
}
