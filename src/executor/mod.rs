pub mod solana;

pub use self::solana::SolanaVaultSigner;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::TierConfig;
use crate::error::{AgentError, Result};
use crate::evaluator::Allocation;

/// A call against a tier vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultCall {
    SetTargetWeights {
        adapters: Vec<String>,
        weights_bps: Vec<u16>,
    },
    Rebalance,
}

impl VaultCall {
    /// Projects the plan into parallel arrays, keeping plan order.
    pub fn set_target_weights(plan: &[Allocation]) -> Self {
        Self::SetTargetWeights {
            adapters: plan.iter().map(|a| a.adapter.clone()).collect(),
            weights_bps: plan.iter().map(|a| a.weight_bps).collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SetTargetWeights { .. } => "setTargetWeights",
            Self::Rebalance => "rebalance",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Nothing landed on-chain: RPC, signing or encoding failure.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The transaction was processed and failed.
    #[error("transaction reverted: {0}")]
    Reverted(String),
}

impl From<SubmitError> for AgentError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Transport(msg) => AgentError::ExecutionTransport(msg),
            SubmitError::Reverted(msg) => AgentError::ExecutionRevert(msg),
        }
    }
}

/// Submits a call to a vault and waits for confirmation. Returns the
/// transaction id.
#[async_trait]
pub trait ChainSigner: Send + Sync {
    async fn submit(&self, vault: &str, call: VaultCall) -> std::result::Result<String, SubmitError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    pub weights_tx: String,
    pub rebalance_tx: String,
}

pub struct TierExecutor {
    signer: Arc<dyn ChainSigner>,
}

impl TierExecutor {
    pub fn new(signer: Arc<dyn ChainSigner>) -> Self {
        Self { signer }
    }

    /// Commits `plan` in two confirmed transactions: target weights, then
    /// rebalance. The rebalance is only sent once the weights are confirmed.
    pub async fn execute(&self, tier: &TierConfig, plan: &[Allocation]) -> Result<ExecutionReceipt> {
        let call = VaultCall::set_target_weights(plan);
        info!(
            "[{}] Submitting {} for {} adapters to {}",
            tier.tier,
            call.name(),
            plan.len(),
            tier.vault
        );

        let weights_tx = match self.signer.submit(&tier.vault, call).await {
            Ok(tx) => tx,
            Err(e) => {
                error!("[{}] setTargetWeights failed, skipping rebalance: {}", tier.tier, e);
                return Err(e.into());
            }
        };
        info!("[{}] Target weights confirmed: {}", tier.tier, weights_tx);

        let rebalance_tx = match self.signer.submit(&tier.vault, VaultCall::Rebalance).await {
            Ok(tx) => tx,
            Err(cause) => {
                warn!(
                    "[{}] Weights are live ({}) but rebalance failed: {}",
                    tier.tier, weights_tx, cause
                );
                return Err(AgentError::PartialExecution { weights_tx, cause });
            }
        };
        info!("[{}] Rebalance confirmed: {}", tier.tier, rebalance_tx);

        Ok(ExecutionReceipt {
            weights_tx,
            rebalance_tx,
        })
    }

    /// Sends only `rebalance()`. Recovery path after a partial failure, the
    /// weights already on-chain are reused.
    pub async fn rebalance_only(&self, tier: &TierConfig) -> Result<String> {
        info!("[{}] Submitting rebalance to {}", tier.tier, tier.vault);
        let tx = self.signer.submit(&tier.vault, VaultCall::Rebalance).await?;
        info!("[{}] Rebalance confirmed: {}", tier.tier, tx);
        Ok(tx)
    }
}
