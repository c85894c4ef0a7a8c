//! Oracle configuration.
//!
//! Configuration is divided into:
//! - Codec: bech32 prefixes used to parse and render addresses
//! - Governance: the authority allowed to change denoms and params
//! - Initial state: params and required denoms written on first start

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::address::{AccAddress, AddressCodec};
use crate::core::params::Params;
use crate::error::{Error, Result};
use crate::utils::validation::validate_denom;

// ═══════════════════════════════════════════════════════════════════════════════
// ORACLE CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Complete oracle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Address prefixes
    pub codec: AddressCodec,
    /// Bech32 account address of the governance authority
    pub authority: String,
    /// Params written when the store is empty
    pub params: Params,
    /// Required denoms written when the store is empty
    pub required_denoms: Vec<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        let codec = AddressCodec::default();
        Self {
            authority: default_authority(&codec),
            codec,
            params: Params::default(),
            required_denoms: vec!["BTC".into(), "ETH".into()],
        }
    }
}

/// Module account derived authority: truncated hash of the module name
fn default_authority(codec: &AddressCodec) -> String {
    let bytes = crate::utils::crypto::sha256_truncated(b"gov");
    AccAddress::from_bytes(&bytes)
        .and_then(|addr| codec.encode_account(&addr))
        .unwrap_or_default()
}

impl OracleConfig {
    /// Configuration for local networks (short periods)
    pub fn testnet() -> Self {
        Self {
            params: Params::testnet(),
            ..Default::default()
        }
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Config(e.to_string()))?;
        }

        std::fs::write(path, content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Apply `RATE_ORACLE_*` environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(prefix) = std::env::var("RATE_ORACLE_ACCOUNT_PREFIX") {
            self.codec.account_prefix = prefix;
        }

        if let Ok(prefix) = std::env::var("RATE_ORACLE_VALIDATOR_PREFIX") {
            self.codec.validator_prefix = prefix;
        }

        if let Ok(authority) = std::env::var("RATE_ORACLE_AUTHORITY") {
            self.authority = authority;
        }

        if let Ok(period) = std::env::var("RATE_ORACLE_VOTE_PERIOD") {
            if let Ok(blocks) = period.parse() {
                self.params.vote_period = blocks;
            }
        }

        if let Ok(denoms) = std::env::var("RATE_ORACLE_REQUIRED_DENOMS") {
            self.required_denoms = denoms
                .split(',')
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect();
        }

        self
    }

    /// Default configuration with environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Parsed governance authority
    pub fn authority_address(&self) -> Result<AccAddress> {
        self.codec
            .parse_account(&self.authority)
            .map_err(|e| Error::address("authority", e))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.codec
            .validate()
            .map_err(|e| Error::Config(format!("invalid address prefix: {}", e)))?;
        self.authority_address()?;
        self.params.validate()?;
        for denom in &self.required_denoms {
            validate_denom(denom)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = OracleConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.authority.starts_with("oracle1"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("oracle.json");

        let mut config = OracleConfig::testnet();
        config.required_denoms = vec!["ATOM".into()];
        config.save(&path).unwrap();

        let loaded = OracleConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = OracleConfig::load(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_denom_rejected() {
        let mut config = OracleConfig::default();
        config.required_denoms.push("1X".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_authority_rejected() {
        let mut config = OracleConfig::default();
        config.authority = "cosmos1qqqq".into();
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidAddress { field: "authority", .. })
        ));
    }
}
