use anyhow::Result;
use reelpool_rewards::{RetryPolicy, RewardSchedule};
use reelpool_types::ReelAmount;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub node: NodeSettings,
    pub rewards: RewardsConfig,
    pub storage: StorageConfig,
    pub api: ApiConfig,
    pub ledger: LedgerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSettings {
    pub data_dir: PathBuf,
    pub name: String,
}

/// Reward rates in whole REEL; fixed for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    pub like_rate: f64,
    pub share_rate: f64,
    pub comment_rate: f64,
    pub viral_threshold: u64,
    pub viral_bonus: f64,
}

impl From<RewardsConfig> for RewardSchedule {
    fn from(config: RewardsConfig) -> Self {
        RewardSchedule {
            like_rate: ReelAmount::from_reel(config.like_rate),
            share_rate: ReelAmount::from_reel(config.share_rate),
            comment_rate: ReelAmount::from_reel(config.comment_rate),
            viral_threshold: config.viral_threshold,
            viral_bonus: ReelAmount::from_reel(config.viral_bonus),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Funds minted into the in-process reward pool at startup, in REEL.
    pub pool_funds: f64,
    pub max_submit_attempts: u32,
    pub submit_backoff_ms: u64,
    pub status_poll_attempts: u32,
    pub status_poll_interval_ms: u64,
}

impl From<LedgerConfig> for RetryPolicy {
    fn from(config: LedgerConfig) -> Self {
        RetryPolicy {
            max_submit_attempts: config.max_submit_attempts,
            submit_backoff: Duration::from_millis(config.submit_backoff_ms),
            status_poll_attempts: config.status_poll_attempts,
            status_poll_interval: Duration::from_millis(config.status_poll_interval_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_output: Option<PathBuf>,
    #[serde(default)]
    pub module_filters: HashMap<String, String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node: NodeSettings {
                data_dir: PathBuf::from("./data"),
                name: "reelpool-node".to_string(),
            },
            rewards: RewardsConfig {
                like_rate: 0.1,
                share_rate: 0.5,
                comment_rate: 0.2,
                viral_threshold: 1000,
                viral_bonus: 50.0,
            },
            storage: StorageConfig {
                backend: "memory".to_string(),
            },
            api: ApiConfig {
                enabled: true,
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            ledger: LedgerConfig {
                pool_funds: 1_000_000.0,
                max_submit_attempts: 3,
                submit_backoff_ms: 200,
                status_poll_attempts: 10,
                status_poll_interval_ms: 500,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
                file_output: None,
                module_filters: HashMap::new(),
            },
        }
    }
}

impl NodeConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(data_dir) = env::var("DATA_DIR") {
            self.node.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(name) = env::var("NODE_ID") {
            if !name.is_empty() {
                self.node.name = name;
            }
        }

        if let Ok(api_host) = env::var("API_HOST") {
            self.api.host = api_host;
        }
        if let Ok(api_port) = env::var("API_PORT") {
            if let Ok(port) = api_port.parse() {
                self.api.port = port;
            }
        }

        if let Ok(backend) = env::var("STORAGE_BACKEND") {
            self.storage.backend = backend;
        }

        if let Ok(funds) = env::var("REWARD_POOL_FUNDS") {
            if let Ok(val) = funds.parse() {
                self.ledger.pool_funds = val;
            }
        }
        if let Ok(threshold) = env::var("VIRAL_THRESHOLD") {
            if let Ok(val) = threshold.parse() {
                self.rewards.viral_threshold = val;
            }
        }
    }

    pub fn reward_schedule(&self) -> RewardSchedule {
        self.rewards.clone().into()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.ledger.clone().into()
    }
}
