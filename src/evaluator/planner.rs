use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ranker::sort_by_utility;
use super::ScoredPool;

/// 100% expressed in basis points.
pub const TOTAL_BPS: u16 = 10_000;

const ADAPTER_PREFIX: &str = "0xADAPTER";
const ADAPTER_SYMBOL_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Concentration cap for any single adapter.
    pub max_per_adapter_bps: u16,
    /// Max number of distinct allocations.
    pub slots: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub adapter: String,
    pub weight_bps: u16,
    pub reason: String,
}

pub struct AllocationPlanner {
    config: PlanConfig,
}

impl AllocationPlanner {
    pub fn new(config: PlanConfig) -> Self {
        Self { config }
    }

    /// Equal-weights the top `slots` pools by utility, each capped at
    /// `max_per_adapter_bps`. When the cap bites the plan sums to less than
    /// 10000 bps and the remainder stays unallocated.
    pub fn plan(&self, pools: &[ScoredPool]) -> Vec<Allocation> {
        // Re-rank locally, callers' ordering is not relied on.
        let mut candidates = pools.to_vec();
        sort_by_utility(&mut candidates);
        candidates.truncate(self.config.slots);

        if candidates.is_empty() {
            info!("No candidate pools, empty plan");
            return Vec::new();
        }

        let count = candidates.len() as u32;
        let base_weight = (u32::from(TOTAL_BPS) / count) as u16;
        let weight_bps = base_weight.min(self.config.max_per_adapter_bps);

        if weight_bps < base_weight {
            debug!(
                "Cap {} bps below equal weight {} bps, leaving {} bps unallocated",
                self.config.max_per_adapter_bps,
                base_weight,
                u32::from(TOTAL_BPS) - u32::from(weight_bps) * count
            );
        }

        candidates
            .iter()
            .map(|p| Allocation {
                adapter: adapter_id(&p.pool().protocol, &p.pool().symbol),
                weight_bps,
                reason: format!(
                    "Chosen by utility score; APY={:.2}% risk={}",
                    apy_percent(p.pool().apy),
                    p.risk_score()
                ),
            })
            .collect()
    }
}

// Percent rounded to hundredths, ties away from zero.
fn apy_percent(apy: f64) -> f64 {
    (apy * 10_000.0).round() / 100.0
}

/// Placeholder adapter identifier until adapters come from a registry:
/// `0xADAPTER_<protocol>_<first 8 alphanumerics of symbol>`.
pub fn adapter_id(protocol: &str, symbol: &str) -> String {
    let short_symbol: String = symbol
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(ADAPTER_SYMBOL_LEN)
        .collect();
    format!("{}_{}_{}", ADAPTER_PREFIX, protocol, short_symbol)
}
