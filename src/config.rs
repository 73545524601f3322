use crate::keys::{KeyError, keypair_from_secret};
use crate::types::TransferRequest;
use anyhow::{Context, Result};
use serde::Deserialize;
use solana_sdk::pubkey::{ParsePubkeyError, Pubkey};
use solana_sdk::signature::Keypair;
use std::fmt;
use std::fs::File;
use std::path::Path;
use thiserror::Error;
use zeroize::Zeroizing;

pub const RPC_ENDPOINT: &str = "RPC_ENDPOINT";
pub const HOLDER_SECRET: &str = "HOLDER_SECRET";
pub const FEEPAYER_SECRET: &str = "FEEPAYER_SECRET";
pub const ASSET_ADDRESS: &str = "ASSET_ADDRESS";
pub const RECIPIENT_ADDRESS: &str = "RECIPIENT_ADDRESS";

/// Every setting the transfer needs, in reporting order.
pub const REQUIRED: [&str; 5] = [
    RPC_ENDPOINT,
    HOLDER_SECRET,
    FEEPAYER_SECRET,
    ASSET_ADDRESS,
    RECIPIENT_ADDRESS,
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("{name} is not a valid address: {source}")]
    InvalidAddress {
        name: &'static str,
        source: ParsePubkeyError,
    },

    #[error("{name} is not a usable secret key: {source}")]
    InvalidSecret {
        name: &'static str,
        source: KeyError,
    },
}

/// Optional YAML file layer, consulted for any variable the environment lacks.
#[derive(Default, Deserialize)]
pub struct FileConfig {
    pub rpc_endpoint: Option<String>,
    pub holder_secret: Option<Zeroizing<String>>,
    pub feepayer_secret: Option<Zeroizing<String>>,
    pub asset_address: Option<String>,
    pub recipient_address: Option<String>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {:?}", path))?;
        let config: FileConfig =
            serde_yaml::from_reader(file).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        match name {
            RPC_ENDPOINT => self.rpc_endpoint.as_deref(),
            HOLDER_SECRET => self.holder_secret.as_ref().map(|s| s.as_str()),
            FEEPAYER_SECRET => self.feepayer_secret.as_ref().map(|s| s.as_str()),
            ASSET_ADDRESS => self.asset_address.as_deref(),
            RECIPIENT_ADDRESS => self.recipient_address.as_deref(),
            _ => None,
        }
    }
}

/// The five raw settings, all present and non-empty.
pub struct Config {
    pub rpc_endpoint: String,
    holder_secret: Zeroizing<String>,
    feepayer_secret: Zeroizing<String>,
    pub asset_address: String,
    pub recipient_address: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_endpoint", &self.rpc_endpoint)
            .field("holder_secret", &"<redacted>")
            .field("feepayer_secret", &"<redacted>")
            .field("asset_address", &self.asset_address)
            .field("recipient_address", &self.recipient_address)
            .finish()
    }
}

fn required<F>(
    lookup: &F,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> Zeroizing<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = Zeroizing::new(lookup(name).unwrap_or_default());
    let trimmed = value.trim();
    if trimmed.is_empty() {
        missing.push(name);
    }
    Zeroizing::new(trimmed.to_string())
}

impl Config {
    /// Reads the process environment, falling back to `file` for unset or empty variables.
    pub fn from_env(file: Option<&FileConfig>) -> Result<Self, ConfigError> {
        Self::from_sources(|name| std::env::var(name).ok(), file)
    }

    /// Layers `env` over `file`; blank `env` values defer to the file.
    pub fn from_sources<E>(env: E, file: Option<&FileConfig>) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        Self::from_lookup(|name| {
            env(name)
                .filter(|value| !value.trim().is_empty())
                .or_else(|| file.and_then(|f| f.get(name)).map(str::to_string))
        })
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let rpc_endpoint = required(&lookup, RPC_ENDPOINT, &mut missing);
        let holder_secret = required(&lookup, HOLDER_SECRET, &mut missing);
        let feepayer_secret = required(&lookup, FEEPAYER_SECRET, &mut missing);
        let asset_address = required(&lookup, ASSET_ADDRESS, &mut missing);
        let recipient_address = required(&lookup, RECIPIENT_ADDRESS, &mut missing);

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        Ok(Self {
            rpc_endpoint: rpc_endpoint.to_string(),
            holder_secret,
            feepayer_secret,
            asset_address: asset_address.to_string(),
            recipient_address: recipient_address.to_string(),
        })
    }

    /// Parses addresses and derives both keypairs. Performs no network calls.
    pub fn resolve(&self) -> Result<Resolved, ConfigError> {
        let asset = parse_address(ASSET_ADDRESS, &self.asset_address)?;
        let recipient = parse_address(RECIPIENT_ADDRESS, &self.recipient_address)?;
        let holder = keypair_from_secret(&self.holder_secret).map_err(|source| {
            ConfigError::InvalidSecret {
                name: HOLDER_SECRET,
                source,
            }
        })?;
        let fee_payer = keypair_from_secret(&self.feepayer_secret).map_err(|source| {
            ConfigError::InvalidSecret {
                name: FEEPAYER_SECRET,
                source,
            }
        })?;

        Ok(Resolved {
            rpc_endpoint: self.rpc_endpoint.clone(),
            asset,
            recipient,
            holder,
            fee_payer,
        })
    }
}

fn parse_address(name: &'static str, value: &str) -> Result<Pubkey, ConfigError> {
    value
        .parse::<Pubkey>()
        .map_err(|source| ConfigError::InvalidAddress { name, source })
}

/// Validated settings ready for a transfer.
pub struct Resolved {
    pub rpc_endpoint: String,
    pub asset: Pubkey,
    pub recipient: Pubkey,
    pub holder: Keypair,
    pub fee_payer: Keypair,
}

impl Resolved {
    pub fn request(&self) -> TransferRequest<'_> {
        TransferRequest {
            asset: self.asset,
            recipient: self.recipient,
            holder: &self.holder,
            fee_payer: &self.fee_payer,
        }
    }
}
