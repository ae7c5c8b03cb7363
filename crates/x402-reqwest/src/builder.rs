use reqwest::{Client, ClientBuilder};

use crate::client::PaymentChallengeAdapter;
use crate::config::AdapterConfig;

/// Wraps a reqwest client (or client builder) into a [`PaymentChallengeAdapter`].
pub trait ReqwestWithPaymentChallenges {
    type Output;

    fn with_payment_challenges(self, config: AdapterConfig) -> Self::Output;
}

impl ReqwestWithPaymentChallenges for Client {
    type Output = PaymentChallengeAdapter;

    fn with_payment_challenges(self, config: AdapterConfig) -> Self::Output {
        PaymentChallengeAdapter::new(self, config)
    }
}

impl ReqwestWithPaymentChallenges for ClientBuilder {
    type Output = Result<PaymentChallengeAdapter, reqwest::Error>;

    fn with_payment_challenges(self, config: AdapterConfig) -> Self::Output {
        let client = self.build()?;
        Ok(PaymentChallengeAdapter::new(client, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_wraps_client_and_builder() {
        let adapter = Client::new().with_payment_challenges(AdapterConfig::default());
        assert_eq!(adapter.config().target_network, "base-sepolia");

        let adapter = Client::builder()
            .timeout(Duration::from_secs(30))
            .with_payment_challenges(AdapterConfig::default().with_target_network("base"))
            .unwrap();
        assert_eq!(adapter.config().target_network, "base");
    }
}
