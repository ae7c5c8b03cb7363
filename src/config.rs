//! Configuration of the `infra402` command-line client.
//!
//! Command-line arguments select the subcommand and the config file. The JSON
//! file holds the backend location, the wallet key and the adapter settings;
//! string values may reference environment variables (`$VAR` or `${VAR}`):
//!
//! ```json
//! {
//!   "apiBase": "$INFRA402_API_BASE",
//!   "privateKey": "$PRIVATE_KEY",
//!   "leasePath": "/lease",
//!   "targetNetwork": "base-sepolia",
//!   "assetPolicy": "knownUsdc"
//! }
//! ```

use alloy_signer_local::PrivateKeySigner;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;
use x402_reqwest::AdapterConfig;
use x402_types::config::LiteralOrEnv;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_LEASE_PATH: &str = "/lease";
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// CLI arguments for the infra402 client.
#[derive(Parser, Debug)]
#[command(name = "infra402")]
#[command(about = "Chat and lease against an x402-gated infra402 backend")]
pub struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "CONFIG")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send a chat message, paying if the backend asks for it
    Chat {
        text: String,
    },
    /// Request an infrastructure lease
    Lease {
        sku: String,
        /// Lease runtime in minutes
        #[arg(long, default_value_t = 60)]
        minutes: u32,
    },
    /// Show the backend's model metadata
    Info,
}

/// Client configuration.
///
/// Fields missing from the file fall back to environment variables, then to
/// hardcoded defaults. A `PRIVATE_KEY` that is set but malformed fails the load.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "config_defaults::default_api_base")]
    api_base: LiteralOrEnv<Url>,
    #[serde(default)]
    private_key: Option<LiteralOrEnv<PrivateKeySigner>>,
    #[serde(default = "config_defaults::default_lease_path")]
    lease_path: String,
    #[serde(flatten)]
    adapter: AdapterConfig,
}

pub mod config_defaults {
    use super::*;
    use std::env;

    /// `$INFRA402_API_BASE`, then `http://localhost:8000`.
    pub fn default_api_base() -> LiteralOrEnv<Url> {
        let url = env::var("INFRA402_API_BASE")
            .ok()
            .and_then(|s| Url::parse(s.trim()).ok())
            .unwrap_or_else(|| Url::parse(DEFAULT_API_BASE).unwrap());
        LiteralOrEnv::from_literal(url)
    }

    /// Parses the value of `$PRIVATE_KEY`. Unset or blank means no wallet.
    pub fn private_key_from_env(
        value: Option<String>,
    ) -> Result<Option<LiteralOrEnv<PrivateKeySigner>>, ConfigError> {
        match value.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(key) => key
                .parse::<PrivateKeySigner>()
                .map(|signer| Some(LiteralOrEnv::from_literal(signer)))
                .map_err(|_| ConfigError::InvalidPrivateKey(PRIVATE_KEY_ENV)),
        }
    }

    pub fn default_lease_path() -> String {
        DEFAULT_LEASE_PATH.to_string()
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("${0} is set but is not a valid private key")]
    InvalidPrivateKey(&'static str),
}

impl Config {
    pub fn api_base(&self) -> &Url {
        self.api_base.inner()
    }

    /// The local wallet, if a key is configured.
    pub fn signer(&self) -> Option<&PrivateKeySigner> {
        self.private_key.as_ref().map(|key| key.inner())
    }

    pub fn lease_path(&self) -> &str {
        &self.lease_path
    }

    pub fn adapter(&self) -> &AdapterConfig {
        &self.adapter
    }

    /// Load configuration from the file named on the command line.
    ///
    /// Without `--config`, `./config.json` is read if it exists; otherwise
    /// every value comes from the environment or the defaults.
    pub fn load(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        match &cli_args.config {
            Some(path) => Self::load_from_path(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
            }
            None => Self::from_json("{}"),
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_json::from_str(content)?;
        if config.private_key.is_none() {
            config.private_key =
                config_defaults::private_key_from_env(std::env::var(PRIVATE_KEY_ENV).ok())?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x402_reqwest::AssetPolicy;

    // Anvil's first development key
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_adapter_settings_are_flattened() {
        let config = Config::from_json(
            r#"{
                "apiBase": "https://infra.example.com/api",
                "leasePath": "/vm/lease",
                "targetNetwork": "base",
                "chainIdOverrides": { "anvil": 31337 },
                "assetPolicy": "knownUsdc",
                "maxAmount": "250000"
            }"#,
        )
        .unwrap();
        assert_eq!(config.api_base().as_str(), "https://infra.example.com/api");
        assert_eq!(config.lease_path(), "/vm/lease");
        assert_eq!(config.adapter().target_network, "base");
        assert_eq!(config.adapter().asset_policy, AssetPolicy::KnownUsdc);
        assert_eq!(config.adapter().chain_id_overrides.get("anvil"), Some(&31337));
    }

    #[test]
    fn test_private_key_from_environment() {
        // SAFETY: the variable name is unique to this test
        unsafe { std::env::set_var("INFRA402_TEST_WALLET_KEY", DEV_KEY) };
        let config =
            Config::from_json(r#"{ "privateKey": "${INFRA402_TEST_WALLET_KEY}" }"#).unwrap();
        let expected: PrivateKeySigner = DEV_KEY.parse().unwrap();
        assert_eq!(
            config.signer().map(|signer| signer.address()),
            Some(expected.address())
        );
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(matches!(
            Config::from_json(r#"{ "apiBase": "not a url" }"#),
            Err(ConfigError::JsonParse(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{ "privateKey": "$INFRA402_SURELY_UNSET_KEY" }"#),
            Err(ConfigError::JsonParse(_))
        ));
    }

    #[test]
    fn test_malformed_private_key_is_an_error() {
        let err = config_defaults::private_key_from_env(Some("0xnot-a-key".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPrivateKey("PRIVATE_KEY")));
        assert!(err.to_string().contains("$PRIVATE_KEY"));

        assert!(config_defaults::private_key_from_env(None).unwrap().is_none());
        assert!(config_defaults::private_key_from_env(Some("  ".to_string()))
            .unwrap()
            .is_none());
        let signer = config_defaults::private_key_from_env(Some(format!(" {DEV_KEY}\n")))
            .unwrap()
            .unwrap();
        let expected: PrivateKeySigner = DEV_KEY.parse().unwrap();
        assert_eq!(signer.inner().address(), expected.address());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load_from_path("/nonexistent/infra402.json").unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(..)));
    }

    #[test]
    fn test_cli_parsing() {
        let args = CliArgs::try_parse_from(["infra402", "lease", "vm.small", "--minutes", "15"])
            .unwrap();
        assert_eq!(
            args.command,
            Command::Lease {
                sku: "vm.small".to_string(),
                minutes: 15
            }
        );

        let args = CliArgs::try_parse_from(["infra402", "--config", "x.json", "chat", "hello"])
            .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("x.json")));
        assert_eq!(
            args.command,
            Command::Chat {
                text: "hello".to_string()
            }
        );
    }
}
