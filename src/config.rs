//! Environment-driven configuration.
//!
//! All settings have defaults suitable for devnet experimentation and can be
//! overridden through `PAYFLOW_*` environment variables. Resolution goes
//! through an injectable lookup function so tests can supply values without
//! mutating process-wide environment state.

use solana_commitment_config::{CommitmentConfig, CommitmentLevel};
use std::str::FromStr;
use url::Url;

use crate::ledger::DEFAULT_LEDGER_KEY;

/// Environment variable names.
mod env {
    pub const RPC_URL: &str = "PAYFLOW_RPC_URL";
    pub const FRESHNESS_COMMITMENT: &str = "PAYFLOW_FRESHNESS_COMMITMENT";
    pub const CONFIRMATION_COMMITMENT: &str = "PAYFLOW_CONFIRMATION_COMMITMENT";
    pub const LEDGER_KEY: &str = "PAYFLOW_LEDGER_KEY";
    pub const NETWORK_LABEL: &str = "PAYFLOW_NETWORK_LABEL";
}

/// A configuration value failed to parse.
#[derive(Debug, thiserror::Error)]
#[error("invalid {name}: {message}")]
pub struct ConfigError {
    pub name: &'static str,
    pub message: String,
}

/// Settings for the payment flow.
#[derive(Clone, Debug, PartialEq)]
pub struct PayflowConfig {
    /// HTTP endpoint of the Solana RPC node.
    pub rpc_url: Url,
    /// Commitment level for the blockhash freshness anchor.
    pub freshness_commitment: CommitmentConfig,
    /// Commitment level a submission must reach to count as settled.
    /// `processed` trades finality for UI responsiveness.
    pub confirmation_commitment: CommitmentConfig,
    /// Storage key the transaction ledger persists under.
    pub ledger_key: String,
    /// Label recorded as the `source` of every receipt.
    pub network_label: String,
}

impl Default for PayflowConfig {
    fn default() -> Self {
        Self {
            rpc_url: Url::parse("https://api.devnet.solana.com").expect("valid default rpc url"),
            freshness_commitment: CommitmentConfig::finalized(),
            confirmation_commitment: CommitmentConfig::processed(),
            ledger_key: DEFAULT_LEDGER_KEY.to_string(),
            network_label: "devnet".to_string(),
        }
    }
}

impl PayflowConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults for
    /// every absent variable.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let rpc_url = match lookup(env::RPC_URL) {
            Some(raw) => Url::parse(&raw).map_err(|e| ConfigError {
                name: env::RPC_URL,
                message: e.to_string(),
            })?,
            None => defaults.rpc_url,
        };
        let freshness_commitment = match lookup(env::FRESHNESS_COMMITMENT) {
            Some(raw) => parse_commitment(env::FRESHNESS_COMMITMENT, &raw)?,
            None => defaults.freshness_commitment,
        };
        let confirmation_commitment = match lookup(env::CONFIRMATION_COMMITMENT) {
            Some(raw) => parse_commitment(env::CONFIRMATION_COMMITMENT, &raw)?,
            None => defaults.confirmation_commitment,
        };
        let ledger_key = lookup(env::LEDGER_KEY).unwrap_or(defaults.ledger_key);
        let network_label = lookup(env::NETWORK_LABEL).unwrap_or(defaults.network_label);
        Ok(Self {
            rpc_url,
            freshness_commitment,
            confirmation_commitment,
            ledger_key,
            network_label,
        })
    }
}

fn parse_commitment(name: &'static str, raw: &str) -> Result<CommitmentConfig, ConfigError> {
    let commitment = CommitmentLevel::from_str(raw).map_err(|_| ConfigError {
        name,
        message: format!("unknown commitment level {raw:?}"),
    })?;
    Ok(CommitmentConfig { commitment })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = PayflowConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, PayflowConfig::default());
        assert_eq!(config.confirmation_commitment, CommitmentConfig::processed());
        assert_eq!(config.ledger_key, "transactions");
    }

    #[test]
    fn overrides_are_applied() {
        let config = PayflowConfig::from_lookup(lookup_from(&[
            ("PAYFLOW_RPC_URL", "http://localhost:8899"),
            ("PAYFLOW_CONFIRMATION_COMMITMENT", "confirmed"),
            ("PAYFLOW_NETWORK_LABEL", "localnet"),
        ]))
        .unwrap();
        assert_eq!(config.rpc_url.as_str(), "http://localhost:8899/");
        assert_eq!(config.confirmation_commitment, CommitmentConfig::confirmed());
        assert_eq!(config.network_label, "localnet");
        // untouched values keep their defaults
        assert_eq!(config.freshness_commitment, CommitmentConfig::finalized());
    }

    #[test]
    fn bad_commitment_is_rejected() {
        let err = PayflowConfig::from_lookup(lookup_from(&[(
            "PAYFLOW_FRESHNESS_COMMITMENT",
            "eventually",
        )]))
        .unwrap_err();
        assert_eq!(err.name, "PAYFLOW_FRESHNESS_COMMITMENT");
    }

    #[test]
    fn bad_url_is_rejected() {
        let err = PayflowConfig::from_lookup(lookup_from(&[("PAYFLOW_RPC_URL", "not a url")]))
            .unwrap_err();
        assert_eq!(err.name, "PAYFLOW_RPC_URL");
    }
}
