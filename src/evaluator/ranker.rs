use tracing::debug;

use super::ScoredPool;

/// Risk-adjusted expected return: `apy * (1 - risk/100)`.
pub fn utility(pool: &ScoredPool) -> f64 {
    pool.pool().apy * (1.0 - f64::from(pool.risk_score()) / 100.0)
}

/// Sorts descending by utility. `sort_by` is stable, so equal-utility pools
/// keep their relative input order.
pub(crate) fn sort_by_utility(pools: &mut [ScoredPool]) {
    pools.sort_by(|a, b| utility(b).total_cmp(&utility(a)));
}

pub struct UtilityRanker;

impl UtilityRanker {
    pub fn new() -> Self {
        Self
    }

    /// Returns a ranked copy; the input is left untouched.
    pub fn rank(&self, pools: &[ScoredPool]) -> Vec<ScoredPool> {
        let mut ranked = pools.to_vec();
        sort_by_utility(&mut ranked);

        if let Some(top) = ranked.first() {
            debug!(
                "Top pool by utility: {} {} ({:.4})",
                top.pool().protocol,
                top.pool().symbol,
                utility(top)
            );
        }

        ranked
    }
}

impl Default for UtilityRanker {
    fn default() -> Self {
        Self::new()
    }
}
