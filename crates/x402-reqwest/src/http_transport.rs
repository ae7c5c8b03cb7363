//! Reading x402 messages off reqwest responses.

use x402_types::proto::PAYMENT_RESPONSE_HEADER;
use x402_types::proto::v1::{PaymentOffer, SettleResponse};

#[cfg(feature = "telemetry")]
use tracing::debug;

use crate::error::PaymentError;

/// Parses the body of a 402 response as a v1 [`PaymentOffer`].
///
/// A body that cannot be read is a transport error; a body that is not an offer,
/// or names another protocol version, is [`PaymentError::MalformedOffer`].
pub async fn payment_offer_from_response(
    response: reqwest::Response,
) -> Result<PaymentOffer, PaymentError> {
    let body = response.bytes().await?;
    let offer = serde_json::from_slice::<PaymentOffer>(&body)
        .map_err(|e| PaymentError::MalformedOffer(e.to_string()))?;

    #[cfg(feature = "telemetry")]
    debug!(accepts = offer.accepts.len(), "Parsed V1 payment offer from body");

    Ok(offer)
}

/// Decodes the `X-Payment-Response` settlement receipt of a paid response.
///
/// Best effort: a missing or undecodable header gives `None`.
pub fn settlement_receipt(response: &reqwest::Response) -> Option<SettleResponse> {
    let header = response.headers().get(PAYMENT_RESPONSE_HEADER)?;
    let header = header.to_str().ok()?;
    SettleResponse::decode_header(header).ok()
}
