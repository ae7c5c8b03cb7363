//! Log output of the `infra402` binary.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber.
///
/// `RUST_LOG` selects what is printed; without it, `info` and above. Build with
/// the `telemetry` feature to also see the payment cycle's spans and events.
#[derive(Debug, Default)]
pub struct Telemetry {
    default_filter: Option<String>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter used when `RUST_LOG` is unset.
    pub fn with_default_filter<F: Into<String>>(mut self, filter: F) -> Self {
        self.default_filter = Some(filter.into());
        self
    }

    pub fn register(self) {
        let default_filter = self.default_filter.as_deref().unwrap_or(DEFAULT_FILTER);
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
