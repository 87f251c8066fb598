use std::collections::HashMap;
use thiserror::Error;

/// Mnemonic shipped with the local development node snapshot.
pub const DEFAULT_MNEMONIC: &str =
    "concert load couple harbor equip island argue ramp clarify fence smart topic";
pub const DEFAULT_BASE_DERIVATION_PATH: &str = "44'/60'/0'/0";
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_NETWORK_ID: u64 = 50;
pub const DEFAULT_ADDRESS_SEARCH_LIMIT: usize = 11;
pub const DEFAULT_GAS_LIMIT: u64 = 400_000;
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 1_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub network_id: u64,
    pub mnemonic: String,
    pub base_derivation_path: String,
    pub address_search_limit: usize,
    pub gas_limit: u64,
    pub rpc_timeout_ms: u64,
    pub seed_fixtures: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            network_id: DEFAULT_NETWORK_ID,
            mnemonic: DEFAULT_MNEMONIC.to_string(),
            base_derivation_path: DEFAULT_BASE_DERIVATION_PATH.to_string(),
            address_search_limit: DEFAULT_ADDRESS_SEARCH_LIMIT,
            gas_limit: DEFAULT_GAS_LIMIT,
            rpc_timeout_ms: DEFAULT_RPC_TIMEOUT_MS,
            seed_fixtures: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let rpc_url = env_map
            .get("RPC_URL")
            .cloned()
            .unwrap_or(defaults.rpc_url);
        if !rpc_url.starts_with("http://") && !rpc_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "RPC_URL".to_string(),
                format!("must be an http(s) URL, got {}", rpc_url),
            ));
        }

        let network_id = parse_or(&env_map, "NETWORK_ID", defaults.network_id, "must be a valid u64")?;

        let mnemonic = env_map
            .get("MNEMONIC")
            .map(|s| s.trim().to_string())
            .unwrap_or(defaults.mnemonic);

        let base_derivation_path = env_map
            .get("BASE_DERIVATION_PATH")
            .map(|s| s.trim().to_string())
            .unwrap_or(defaults.base_derivation_path);

        let address_search_limit = parse_or(
            &env_map,
            "ADDRESS_SEARCH_LIMIT",
            defaults.address_search_limit,
            "must be a valid usize",
        )?;
        if address_search_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "ADDRESS_SEARCH_LIMIT".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let gas_limit = parse_or(&env_map, "TX_GAS_LIMIT", defaults.gas_limit, "must be a valid u64")?;

        let rpc_timeout_ms = parse_or(
            &env_map,
            "RPC_TIMEOUT_MS",
            defaults.rpc_timeout_ms,
            "must be a valid u64",
        )?;

        let seed_fixtures = env_map
            .get("LOCAL_NODE")
            .map(|s| is_truthy(s))
            .unwrap_or(false);

        Ok(Config {
            rpc_url,
            network_id,
            mnemonic,
            base_derivation_path,
            address_search_limit,
            gas_limit,
            rpc_timeout_ms,
            seed_fixtures,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
    expectation: &str,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), expectation.to_string())),
        None => Ok(default),
    }
}

fn is_truthy(raw: &str) -> bool {
    let value = raw.trim();
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}
