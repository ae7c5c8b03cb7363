//! Typed client for the infra402 chat and lease backends.
//!
//! Every call goes through a [`PaymentChallengeAdapter`]. A call either returns
//! its decoded body ([`Reply::Ready`]) or stops at the payment challenge
//! ([`Reply::PaymentRequired`]), leaving it to the caller to show the offer
//! and pick a wallet before [`Infra402Client::complete`] pays and decodes.
//!
//! ```rust,ignore
//! let client = Infra402Client::try_from_config(&config)?;
//! let reply = match client.send_message("Spin up a small VM", &[]).await? {
//!     Reply::Ready(reply) => reply,
//!     Reply::PaymentRequired(pending) => client.complete(pending, &signer).await?,
//! };
//! println!("{}", reply.reply);
//! ```

use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use url::Url;
use x402_chain_eip155::v1_eip155_exact::SignerLike;
use x402_reqwest::{
    AdapterConfig, Issued, PaymentChallenge, PaymentChallengeAdapter, PaymentError,
    ReqwestWithPaymentChallenges, settlement_receipt,
};

use crate::config::Config;

pub const EMPTY_REPLY: &str = "Received an empty response.";
pub const DEFAULT_LEASE_STATUS: &str = "pending";

/// Errors of the caller-facing client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The payment cycle failed, including plain transport errors.
    #[error(transparent)]
    Payment(#[from] PaymentError),
    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Backend { status: StatusCode, message: String },
    #[error("Failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Failed to construct endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        ClientError::Payment(PaymentError::Transport(value))
    }
}

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    history: &'a [ChatTurn],
}

/// Body of a `/chat` answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    #[serde(default)]
    pub reply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
}

/// Parameters of a lease request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseRequest {
    pub sku: String,
    pub runtime_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl LeaseRequest {
    pub fn new<S: Into<String>>(sku: S, runtime_minutes: u32) -> Self {
        Self {
            sku: sku.into(),
            runtime_minutes,
            requester: None,
            payload: None,
        }
    }

    pub fn with_requester<S: Into<String>>(mut self, requester: S) -> Self {
        self.requester = Some(requester.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Body of a lease answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_id: Option<String>,
    #[serde(default = "default_lease_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_lease_status() -> String {
    DEFAULT_LEASE_STATUS.to_string()
}

/// Model metadata served at `/info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub base_url: String,
    pub model_name: String,
    /// Masked by the backend.
    pub api_key: String,
}

/// A response body the client knows how to decode.
pub trait ReplyBody: DeserializeOwned {
    /// Fills in what the backend left empty.
    fn normalize(self) -> Self {
        self
    }
}

impl ReplyBody for ChatReply {
    fn normalize(mut self) -> Self {
        if self.reply.is_empty() {
            self.reply = EMPTY_REPLY.to_string();
        }
        self
    }
}

impl ReplyBody for LeaseReply {}

impl ReplyBody for ModelInfo {}

/// Outcome of a call that may be payment-gated.
#[derive(Debug)]
pub enum Reply<T> {
    Ready(T),
    PaymentRequired(PendingPayment<T>),
}

/// A payment challenge bound to the body type of the call that raised it.
#[derive(Debug)]
pub struct PendingPayment<T> {
    challenge: PaymentChallenge,
    _reply: PhantomData<fn() -> T>,
}

impl<T> PendingPayment<T> {
    fn new(challenge: PaymentChallenge) -> Self {
        Self {
            challenge,
            _reply: PhantomData,
        }
    }

    pub fn challenge(&self) -> &PaymentChallenge {
        &self.challenge
    }

    /// Unbinds the challenge, e.g. to drive the cycle step by step.
    pub fn into_challenge(self) -> PaymentChallenge {
        self.challenge
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "detail")]
    message: Option<String>,
}

/// Client for the chat (`/chat`, `/info`) and lease endpoints of an infra402 backend.
#[derive(Debug)]
pub struct Infra402Client {
    adapter: PaymentChallengeAdapter,
    base_url: Url,
    lease_path: String,
}

impl Infra402Client {
    pub fn new(adapter: PaymentChallengeAdapter, base_url: Url) -> Self {
        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            adapter,
            base_url,
            lease_path: crate::config::DEFAULT_LEASE_PATH.to_string(),
        }
    }

    /// Builds the client from a loaded [`Config`].
    pub fn try_from_config(config: &Config) -> Result<Self, ClientError> {
        let adapter: PaymentChallengeAdapter = reqwest::Client::builder()
            .with_payment_challenges(config.adapter().clone())?;
        let client = Self::new(adapter, config.api_base().clone())
            .with_lease_path(config.lease_path());
        Ok(client)
    }

    /// Sets the endpoint [`Self::request_lease`] posts to.
    pub fn with_lease_path<P: Into<String>>(mut self, path: P) -> Self {
        self.lease_path = path.into();
        self
    }

    pub fn adapter(&self) -> &PaymentChallengeAdapter {
        &self.adapter
    }

    pub fn adapter_config(&self) -> &AdapterConfig {
        self.adapter.config()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        Ok(url)
    }

    /// Sends a chat message with the prior conversation.
    pub async fn send_message(
        &self,
        text: &str,
        history: &[ChatTurn],
    ) -> Result<Reply<ChatReply>, ClientError> {
        let url = self.endpoint("chat")?;
        let body = ChatRequest {
            message: text,
            history,
        };
        let request = self.adapter.http().post(url).json(&body).build()?;
        self.issue(request).await
    }

    /// Requests an infrastructure lease.
    pub async fn request_lease(
        &self,
        request: &LeaseRequest,
    ) -> Result<Reply<LeaseReply>, ClientError> {
        let url = self.endpoint(&self.lease_path)?;
        let request = self.adapter.http().post(url).json(request).build()?;
        self.issue(request).await
    }

    /// Fetches model metadata.
    pub async fn info(&self) -> Result<Reply<ModelInfo>, ClientError> {
        let url = self.endpoint("info")?;
        let request = self.adapter.http().get(url).build()?;
        self.issue(request).await
    }

    /// Pays a pending challenge with `signer` and decodes the paid response.
    pub async fn complete<T, S>(
        &self,
        pending: PendingPayment<T>,
        signer: &S,
    ) -> Result<T, ClientError>
    where
        T: ReplyBody,
        S: SignerLike + Sync + ?Sized,
    {
        let response = self.adapter.pay(pending.challenge, signer).await?;
        if let Some(receipt) = settlement_receipt(&response) {
            tracing::info!(?receipt, "Payment settled");
        }
        decode_reply(response).await
    }

    /// Abandons an outstanding payment cycle.
    pub fn cancel(&self) {
        self.adapter.cancel();
    }

    async fn issue<T: ReplyBody>(&self, request: reqwest::Request) -> Result<Reply<T>, ClientError> {
        match self.adapter.issue(request).await? {
            Issued::Response(response) => Ok(Reply::Ready(decode_reply(response).await?)),
            Issued::PaymentRequired(challenge) => {
                Ok(Reply::PaymentRequired(PendingPayment::new(challenge)))
            }
        }
    }
}

async fn decode_reply<T: ReplyBody>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|body| body.message)
            .or_else(|| {
                let text = String::from_utf8_lossy(&body).trim().to_string();
                (!text.is_empty()).then_some(text)
            })
            .unwrap_or_else(|| format!("Backend returned {status}"));
        return Err(ClientError::Backend { status, message });
    }
    let body: &[u8] = if body.is_empty() { b"{}" } else { &body };
    let reply = serde_json::from_slice::<T>(body)?;
    Ok(reply.normalize())
}
