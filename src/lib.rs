//! Client for infra402 backends that charge per request over
//! [x402](https://www.x402.org).
//!
//! The payment cycle itself lives in `x402-reqwest`; this crate adds the typed
//! chat and lease calls, configuration loading and the `infra402` binary.
//!
//! # Modules
//!
//! - [`api`]: [`Infra402Client`](api::Infra402Client) with `send_message`, `request_lease`, `info`, `complete`.
//! - [`config`]: CLI arguments and the JSON configuration file.
//! - [`sig_down`]: Ctrl-C handling for an in-flight payment cycle.
//! - [`telemetry`]: log subscriber setup.

pub mod api;
pub mod config;
pub mod sig_down;
pub mod telemetry;
