use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{Tier, TierConfig};
use crate::datasource::PoolDataSource;
use crate::error::{AgentError, Result};
use crate::evaluator::{
    Allocation, AllocationPlanner, RiskScorer, ScoringOptions, UtilityRanker, TOTAL_BPS,
};
use crate::executor::{ExecutionReceipt, SubmitError, TierExecutor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Revert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCause {
    pub kind: FailureKind,
    pub message: String,
}

impl From<SubmitError> for FailureCause {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Transport(message) => Self {
                kind: FailureKind::Transport,
                message,
            },
            SubmitError::Reverted(message) => Self {
                kind: FailureKind::Revert,
                message,
            },
        }
    }
}

/// Outcome of one tier in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TierStatus {
    /// Plan computed, execution switched off.
    Pending,
    Succeeded {
        weights_tx: String,
        rebalance_tx: String,
    },
    /// Weights are live but capital has not moved. Recover with a
    /// rebalance-only call, not a full resubmit.
    PartialFailure {
        weights_tx: String,
        cause: FailureCause,
    },
    Failed {
        cause: FailureCause,
    },
}

impl TierStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::PartialFailure { .. } | Self::Failed { .. })
    }
}

impl From<Result<ExecutionReceipt>> for TierStatus {
    fn from(result: Result<ExecutionReceipt>) -> Self {
        match result {
            Ok(receipt) => Self::Succeeded {
                weights_tx: receipt.weights_tx,
                rebalance_tx: receipt.rebalance_tx,
            },
            Err(AgentError::PartialExecution { weights_tx, cause }) => Self::PartialFailure {
                weights_tx,
                cause: cause.into(),
            },
            Err(AgentError::ExecutionRevert(message)) => Self::Failed {
                cause: FailureCause {
                    kind: FailureKind::Revert,
                    message,
                },
            },
            Err(other) => Self::Failed {
                cause: FailureCause {
                    kind: FailureKind::Transport,
                    message: match other {
                        AgentError::ExecutionTransport(message) => message,
                        e => e.to_string(),
                    },
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierReport {
    pub tier: Tier,
    pub vault: String,
    pub plan: Vec<Allocation>,
    pub total_bps: u32,
    pub status: TierStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pools_considered: usize,
    pub push_transactions: bool,
    pub tiers: Vec<TierReport>,
}

impl RunReport {
    pub fn tier(&self, tier: Tier) -> Option<&TierReport> {
        self.tiers.iter().find(|t| t.tier == tier)
    }

    pub fn failures(&self) -> impl Iterator<Item = &TierReport> {
        self.tiers.iter().filter(|t| t.status.is_failure())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

/// Runs one fetch → score → rank → plan/execute pass over all tiers.
pub struct Orchestrator {
    source: Arc<dyn PoolDataSource>,
    executor: Option<TierExecutor>,
    tiers: Vec<TierConfig>,
    push_transactions: bool,
}

impl Orchestrator {
    pub fn new(source: Arc<dyn PoolDataSource>, tiers: Vec<TierConfig>, push_transactions: bool) -> Self {
        Self {
            source,
            executor: None,
            tiers,
            push_transactions,
        }
    }

    pub fn with_executor(mut self, executor: TierExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    pub async fn run_once(&self) -> Result<RunReport> {
        let started_at = Utc::now();

        let executor = match (self.push_transactions, &self.executor) {
            (true, Some(executor)) => Some(executor),
            (true, None) => {
                return Err(AgentError::config_error(
                    "transaction pushing is enabled but no signer is configured",
                ))
            }
            (false, _) => None,
        };

        let pools = self.source.fetch_pools().await?;
        for pool in &pools {
            pool.validate()?;
        }
        let pools_considered = pools.len();

        // Product policy: every tier is stable-leaning.
        let scorer = RiskScorer::new(ScoringOptions { stable_bias: true });
        let scored = scorer.score_all(pools);
        let ranked = UtilityRanker::new().rank(&scored);

        let mut tiers = Vec::with_capacity(self.tiers.len());
        for tier in &self.tiers {
            let plan = AllocationPlanner::new(tier.plan_config()).plan(&ranked);
            let total_bps = check_plan(tier, &plan)?;

            info!(
                "[{}] Proposed {} allocations, {} bps: {}",
                tier.tier,
                plan.len(),
                total_bps,
                serde_json::to_string(&plan)?
            );

            let status: TierStatus = match executor {
                Some(executor) => executor.execute(tier, &plan).await.into(),
                None => TierStatus::Pending,
            };

            tiers.push(TierReport {
                tier: tier.tier,
                vault: tier.vault.clone(),
                plan,
                total_bps,
                status,
            });
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            pools_considered,
            push_transactions: self.push_transactions,
            tiers,
        };
        log_summary(&report);

        Ok(report)
    }

    /// Re-sends `rebalance()` for one tier without touching its weights.
    pub async fn rebalance_tier(&self, tier: Tier) -> Result<String> {
        let executor = self
            .executor
            .as_ref()
            .ok_or_else(|| AgentError::config_error("no signer configured"))?;
        let tier_config = self
            .tiers
            .iter()
            .find(|t| t.tier == tier)
            .ok_or_else(|| AgentError::config_error(format!("{} is not configured", tier)))?;

        executor.rebalance_only(tier_config).await
    }
}

/// Cap and total invariants of a tier plan. A violation is a bug, the run stops.
fn check_plan(tier: &TierConfig, plan: &[Allocation]) -> Result<u32> {
    if let Some(over) = plan.iter().find(|a| a.weight_bps > tier.max_per_adapter_bps) {
        return Err(AgentError::planning_error(format!(
            "[{}] {} got {} bps over the {} bps cap",
            tier.tier, over.adapter, over.weight_bps, tier.max_per_adapter_bps
        )));
    }

    let total: u32 = plan.iter().map(|a| u32::from(a.weight_bps)).sum();
    if total > u32::from(TOTAL_BPS) {
        return Err(AgentError::planning_error(format!(
            "[{}] plan allocates {} bps",
            tier.tier, total
        )));
    }

    Ok(total)
}

fn log_summary(report: &RunReport) {
    for tier in &report.tiers {
        match &tier.status {
            TierStatus::Pending => info!("[{}] pending (execution disabled)", tier.tier),
            TierStatus::Succeeded { rebalance_tx, .. } => {
                info!("[{}] succeeded, rebalance {}", tier.tier, rebalance_tx)
            }
            TierStatus::PartialFailure { weights_tx, cause } => warn!(
                "[{}] PARTIAL: weights {} live, rebalance failed ({:?}): {}",
                tier.tier, weights_tx, cause.kind, cause.message
            ),
            TierStatus::Failed { cause } => error!(
                "[{}] failed ({:?}): {}",
                tier.tier, cause.kind, cause.message
            ),
        }
    }
}
