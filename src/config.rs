use crate::constants::{self, BASE_MAINNET, BASE_SEPOLIA};
use crate::error::{BadgeError, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub chain: ChainConfig,
    pub onboarding: OnboardingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the Mini App manifest and images
    pub static_dir: PathBuf,
    pub metrics_port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: PathBuf::from("public"),
            metrics_port: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub network: String,
    pub rpc_url: Option<String>,
    pub chain_id: Option<u64>,
    pub private_key: Option<Secret>,
    pub contract_address: Option<String>,
    pub rpc_timeout_secs: u64,
    pub receipt_timeout_secs: u64,
    pub receipt_poll_interval_ms: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            network: BASE_SEPOLIA.to_string(),
            rpc_url: None,
            chain_id: None,
            private_key: None,
            contract_address: None,
            rpc_timeout_secs: 45,
            receipt_timeout_secs: 120,
            receipt_poll_interval_ms: 2000,
        }
    }
}

impl ChainConfig {
    /// Chain id to sign for: explicit value, else the network's well-known id
    pub fn chain_id(&self) -> u64 {
        self.chain_id
            .or_else(|| constants::default_chain_id(&self.network))
            .unwrap_or(constants::BASE_SEPOLIA_CHAIN_ID)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OnboardingConfig {
    pub quiz_answer: String,
    pub mock_user_id: Option<String>,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            quiz_answer: constants::DEFAULT_QUIZ_ANSWER.to_string(),
            mock_user_id: None,
        }
    }
}

/// A string that never shows up in Debug output or logs.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

impl Config {
    /// Defaults, then the TOML file (explicit path or ./config.toml if present), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BadgeError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Overlay environment variables. Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(network) = get(constants::ENV_NETWORK) {
            self.chain.network = network;
        }

        let (rpc_var, chain_id_var) = if self.chain.network == BASE_MAINNET {
            (constants::ENV_MAINNET_RPC_URL, constants::ENV_MAINNET_CHAIN_ID)
        } else {
            (constants::ENV_SEPOLIA_RPC_URL, constants::ENV_SEPOLIA_CHAIN_ID)
        };
        if let Some(url) = get(rpc_var) {
            self.chain.rpc_url = Some(url);
        }
        if let Some(raw) = get(chain_id_var) {
            self.chain.chain_id = Some(parse_number(chain_id_var, &raw)?);
        }
        if let Some(key) = get(constants::ENV_PRIVATE_KEY) {
            self.chain.private_key = Some(Secret::new(key));
        }
        if let Some(address) = get(constants::ENV_CONTRACT_ADDRESS) {
            self.chain.contract_address = Some(address);
        }

        if let Some(user) =
            get(constants::ENV_MOCK_USER_ID).or_else(|| get(constants::ENV_MOCK_USER_ID_LEGACY))
        {
            self.onboarding.mock_user_id = Some(user);
        }

        if let Some(host) = get(constants::ENV_HOST) {
            self.server.host = host;
        }
        if let Some(raw) = get(constants::ENV_PORT) {
            self.server.port = parse_number(constants::ENV_PORT, &raw)?;
        }
        if let Some(raw) = get(constants::ENV_METRICS_PORT) {
            self.server.metrics_port = Some(parse_number(constants::ENV_METRICS_PORT, &raw)?);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.chain.network != BASE_SEPOLIA && self.chain.network != BASE_MAINNET {
            return Err(BadgeError::Config(format!(
                "Unknown network '{}', expected '{}' or '{}'",
                self.chain.network, BASE_SEPOLIA, BASE_MAINNET
            )));
        }
        if self.onboarding.quiz_answer.is_empty() {
            return Err(BadgeError::Config("quiz_answer must not be empty".to_string()));
        }
        Ok(())
    }

    /// True when everything a backend mint needs is present
    pub fn can_mint(&self) -> bool {
        self.chain.rpc_url.is_some()
            && self.chain.private_key.is_some()
            && self.chain.contract_address.is_some()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| BadgeError::Config(format!("{} must be a number, got '{}'", key, raw)))
}
