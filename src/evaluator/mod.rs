pub mod planner;
pub mod ranker;
pub mod risk_scorer;

pub use planner::{adapter_id, Allocation, AllocationPlanner, PlanConfig, TOTAL_BPS};
pub use ranker::{utility, UtilityRanker};
pub use risk_scorer::{RiskBreakdown, RiskScorer, ScoringOptions};

use serde::Serialize;

use crate::datasource::PoolMetric;

/// A pool that has been through the risk scorer. Only [`RiskScorer`] builds
/// these, so anything downstream always sees an assigned score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPool {
    #[serde(flatten)]
    pool: PoolMetric,
    risk_score: u8,
}

impl ScoredPool {
    pub(crate) fn new(pool: PoolMetric, risk_score: u8) -> Self {
        Self { pool, risk_score }
    }

    pub fn pool(&self) -> &PoolMetric {
        &self.pool
    }

    /// 0-100, lower is safer.
    pub fn risk_score(&self) -> u8 {
        self.risk_score
    }
}
