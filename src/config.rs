use serde::{Deserialize, Serialize};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::native_token::lamports_to_sol;
use solana_sdk::signature::{read_keypair_file, Keypair, Signer};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::datasource::defillama::DEFAULT_POOLS_URL;
use crate::error::{AgentError, Result};
use crate::evaluator::{PlanConfig, TOTAL_BPS};

const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
const DEFAULT_WALLET_PATH: &str = "~/.config/solana/id.json";
const DEFAULT_POOL_LIMIT: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Gold,
    Silver,
    Bronze,
}

impl Tier {
    /// Execution order for a run.
    pub const ALL: [Tier; 3] = [Tier::Gold, Tier::Silver, Tier::Bronze];

    fn vault_env_key(self) -> &'static str {
        match self {
            Tier::Gold => "GOLD_VAULT",
            Tier::Silver => "SILVER_VAULT",
            Tier::Bronze => "BRONZE_VAULT",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Gold => "gold",
            Tier::Silver => "silver",
            Tier::Bronze => "bronze",
        };
        f.write_str(name)
    }
}

/// Static policy for one tier's vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    pub tier: Tier,
    pub vault: String,
    pub max_per_adapter_bps: u16,
    pub slots: usize,
}

impl TierConfig {
    pub fn new(tier: Tier, max_per_adapter_bps: u16, slots: usize) -> Self {
        Self {
            tier,
            vault: String::new(),
            max_per_adapter_bps,
            slots,
        }
    }

    pub fn plan_config(&self) -> PlanConfig {
        PlanConfig {
            max_per_adapter_bps: self.max_per_adapter_bps,
            slots: self.slots,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rpc_url: String,
    pub wallet_path: PathBuf,
    pub vault_program_id: Option<String>,
    pub pools_url: String,
    pub pool_limit: usize,

    /// Global switch: when off, plans are computed and reported but nothing
    /// is sent on-chain.
    pub push_transactions: bool,

    pub tiers: Vec<TierConfig>,

    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            wallet_path: PathBuf::from(DEFAULT_WALLET_PATH),
            vault_program_id: None,
            pools_url: DEFAULT_POOLS_URL.to_string(),
            pool_limit: DEFAULT_POOL_LIMIT,
            push_transactions: false,
            tiers: vec![
                TierConfig::new(Tier::Gold, 3000, 2),
                TierConfig::new(Tier::Silver, 4000, 2),
                TierConfig::new(Tier::Bronze, 2000, 2),
            ],
            telegram_bot_token: None,
            telegram_chat_id: None,
            log_dir: PathBuf::from("./logs"),
        }
    }
}

impl Config {
    /// Defaults overridden by whatever `lookup` knows about.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        // Override defaults with environment variables
        if let Some(rpc_url) = lookup("SOLANA_RPC_URL") {
            config.rpc_url = rpc_url;
        }

        if let Some(wallet_path) = lookup("WALLET_PATH") {
            config.wallet_path = PathBuf::from(wallet_path);
        }

        if let Some(program_id) = lookup("VAULT_PROGRAM_ID") {
            config.vault_program_id = Some(program_id);
        }

        if let Some(pools_url) = lookup("POOLS_URL") {
            config.pools_url = pools_url;
        }

        if let Some(limit) = lookup("POOL_LIMIT") {
            config.pool_limit = limit
                .parse()
                .map_err(|_| AgentError::config_error(format!("POOL_LIMIT is not a number: {}", limit)))?;
        }

        if let Some(push) = lookup("PUSH_TX") {
            config.push_transactions = push == "true";
        }

        // Vault addresses, one per tier
        for tier in config.tiers.iter_mut() {
            if let Some(vault) = lookup(tier.tier.vault_env_key()) {
                tier.vault = vault;
            }
        }

        // Telegram settings
        config.telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN");
        config.telegram_chat_id = lookup("TELEGRAM_CHAT_ID");

        if let Some(log_dir) = lookup("LOG_DIR") {
            config.log_dir = PathBuf::from(log_dir);
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tiers.iter().map(|t| t.tier).eq(Tier::ALL) {
            return Err(AgentError::config_error(
                "tiers must be configured as gold, silver, bronze",
            ));
        }

        for tier in &self.tiers {
            if tier.max_per_adapter_bps > TOTAL_BPS {
                return Err(AgentError::config_error(format!(
                    "{} cap {} bps exceeds {}",
                    tier.tier, tier.max_per_adapter_bps, TOTAL_BPS
                )));
            }
            if tier.slots == 0 {
                return Err(AgentError::config_error(format!(
                    "{} needs at least one slot",
                    tier.tier
                )));
            }
            if self.push_transactions && tier.vault.is_empty() {
                return Err(AgentError::config_error(format!(
                    "{} is not set but transaction pushing is enabled",
                    tier.tier.vault_env_key()
                )));
            }
        }

        if self.push_transactions && self.vault_program_id.is_none() {
            return Err(AgentError::config_error(
                "VAULT_PROGRAM_ID is not set but transaction pushing is enabled",
            ));
        }

        Ok(())
    }

    pub fn tier(&self, tier: Tier) -> Option<&TierConfig> {
        self.tiers.iter().find(|t| t.tier == tier)
    }
}

pub async fn load_config() -> Result<Config> {
    let config = Config::from_lookup(|key| env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Config for read-only planning: pushing is forced off before validation,
/// so missing vault addresses don't matter.
pub async fn load_plan_config() -> Result<Config> {
    plan_config_from(|key| env::var(key).ok())
}

fn plan_config_from<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = Config::from_lookup(lookup)?;
    config.push_transactions = false;
    config.validate()?;
    Ok(config)
}

pub async fn initialize_config(config: &Config) -> Result<()> {
    info!("Initializing configuration...");

    // Connect to Solana RPC
    info!("Connecting to Solana RPC at: {}", config.rpc_url);
    let client =
        RpcClient::new_with_commitment(config.rpc_url.clone(), CommitmentConfig::confirmed());

    match client.get_version().await {
        Ok(version) => info!("Connected to Solana node version: {}", version.solana_core),
        Err(e) => warn!("Could not connect to Solana RPC: {}", e),
    }

    // Check wallet
    match get_keypair(&config.wallet_path) {
        Ok(keypair) => {
            let pubkey = keypair.pubkey();
            info!("Using wallet: {}", pubkey);

            match client.get_balance(&pubkey).await {
                Ok(balance) => {
                    let sol_balance = lamports_to_sol(balance);
                    info!("Wallet balance: {} SOL", sol_balance);

                    if sol_balance < 0.1 {
                        warn!("Wallet balance is low. Two transactions per tier need fees.");
                    }
                }
                Err(e) => warn!("Could not get wallet balance: {}", e),
            }
        }
        Err(e) => warn!("{}", e),
    }

    // Check vault configuration
    for tier in &config.tiers {
        if tier.vault.is_empty() {
            warn!("No vault configured for {}", tier.tier);
        } else {
            info!("{} vault: {}", tier.tier, tier.vault);
        }
    }

    info!("Configuration initialized successfully!");
    Ok(())
}

pub fn get_keypair(wallet_path: &Path) -> Result<Keypair> {
    let raw = wallet_path.to_string_lossy();
    let expanded_path = shellexpand::tilde(raw.as_ref()).to_string();

    read_keypair_file(&expanded_path).map_err(|e| {
        AgentError::config_error(format!(
            "Failed to read keypair from {}: {}",
            expanded_path, e
        ))
    })
}
