//! `infra402` command-line client.
//!
//! Talks to an infra402 backend and pays its x402 challenges with a local key:
//!
//! - `infra402 chat "<text>"` – send a chat message
//! - `infra402 lease <sku> --minutes N` – request an infrastructure lease
//! - `infra402 info` – show the backend's model metadata
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `CONFIG` names the JSON config file
//! - `PRIVATE_KEY`, `INFRA402_API_BASE` fill in what the config file leaves out
//! - `RUST_LOG` controls log output

use clap::Parser;
use dotenvy::dotenv;
use std::error::Error;

use infra402::api::{ChatTurn, Infra402Client, LeaseRequest, Reply, ReplyBody};
use infra402::config::{CliArgs, Command, Config};
use infra402::sig_down::SigDown;
use infra402::telemetry::Telemetry;

#[derive(Debug, thiserror::Error)]
#[error("Payment required but no wallet is configured; set PRIVATE_KEY or \"privateKey\"")]
struct MissingSigner;

#[derive(Debug, thiserror::Error)]
#[error("Interrupted")]
struct Interrupted;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    Telemetry::new().register();

    let cli_args = CliArgs::parse();
    let config = Config::load(&cli_args)?;
    let client = Infra402Client::try_from_config(&config)?;
    tracing::debug!(api_base = %client.base_url(), network = %config.adapter().target_network, "Client ready");

    let sig_down = SigDown::try_new()?;
    let cancellation_token = sig_down.cancellation_token();
    let result = tokio::select! {
        result = execute(&client, &config, cli_args.command) => result,
        _ = cancellation_token.cancelled() => {
            client.cancel();
            Err(Interrupted.into())
        }
    };
    sig_down.shutdown().await;
    result
}

async fn execute(
    client: &Infra402Client,
    config: &Config,
    command: Command,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Chat { text } => {
            let history: [ChatTurn; 0] = [];
            let reply = client.send_message(&text, &history).await?;
            let reply = settle(client, config, reply).await?;
            println!("{}", reply.reply);
            for step in reply.steps.unwrap_or_default() {
                println!("  - {step}");
            }
        }
        Command::Lease { sku, minutes } => {
            let mut request = LeaseRequest::new(sku, minutes);
            if let Some(signer) = config.signer() {
                request = request.with_requester(signer.address().to_string());
            }
            let reply = client.request_lease(&request).await?;
            let lease = settle(client, config, reply).await?;
            let lease_id = lease.lease_id.as_deref().unwrap_or("(unassigned)");
            println!("Lease {lease_id} is {}", lease.status);
            if let Some(expires_at) = lease.expires_at {
                println!("Expires at {expires_at}");
            }
            if let Some(message) = lease.message {
                println!("{message}");
            }
        }
        Command::Info => {
            let info = settle(client, config, client.info().await?).await?;
            println!("Model: {}", info.model_name);
            println!("Provider: {}", info.base_url);
            println!("API key: {}", info.api_key);
        }
    }
    Ok(())
}

/// Pays with the configured key when the backend asks for it.
async fn settle<T: ReplyBody>(
    client: &Infra402Client,
    config: &Config,
    reply: Reply<T>,
) -> Result<T, Box<dyn Error>> {
    match reply {
        Reply::Ready(body) => Ok(body),
        Reply::PaymentRequired(pending) => {
            let offer = pending.challenge().offer();
            tracing::info!(
                accepts = offer.accepts.len(),
                hint = offer.error.as_deref().unwrap_or_default(),
                "Backend requires payment"
            );
            let signer = config.signer().ok_or(MissingSigner)?;
            let body = client.complete(pending, signer).await?;
            Ok(body)
        }
    }
}
