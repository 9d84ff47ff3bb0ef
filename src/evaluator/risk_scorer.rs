use serde::Serialize;
use tracing::{debug, info};

use super::ScoredPool;
use crate::datasource::PoolMetric;

const STABLE_MARKERS: [&str; 2] = ["USD", "DAI"];

const STABLE_ASSET_RISK: u32 = 25;
const BIASED_STABLE_ASSET_RISK: u32 = 15;
const VOLATILE_ASSET_RISK: u32 = 55;

const PROTOCOL_BASELINE_RISK: u32 = 20;

const MAX_RISK: u32 = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringOptions {
    /// Rewards pools holding fiat-pegged collateral.
    pub stable_bias: bool,
}

/// Per-component view of a score, mostly for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskBreakdown {
    pub asset: u32,
    pub liquidity: u32,
    pub yield_risk: u32,
    pub protocol: u32,
}

impl RiskBreakdown {
    pub fn total(&self) -> u8 {
        let sum = self.asset + self.liquidity + self.yield_risk + self.protocol;
        // result stays in [0, 100] whatever the component weights
        sum.clamp(0, MAX_RISK) as u8
    }
}

pub struct RiskScorer {
    options: ScoringOptions,
}

impl RiskScorer {
    pub fn new(options: ScoringOptions) -> Self {
        Self { options }
    }

    pub fn breakdown(&self, pool: &PoolMetric) -> RiskBreakdown {
        RiskBreakdown {
            asset: self.asset_risk(pool),
            liquidity: liquidity_risk(pool.tvl_usd),
            yield_risk: yield_risk(pool.apy),
            protocol: self.protocol_risk(pool),
        }
    }

    pub fn score(&self, pool: &PoolMetric) -> u8 {
        self.breakdown(pool).total()
    }

    pub fn score_pool(&self, pool: PoolMetric) -> ScoredPool {
        let breakdown = self.breakdown(&pool);
        debug!("Risk for {} ({}): {:?}", pool.id, pool.symbol, breakdown);
        ScoredPool::new(pool, breakdown.total())
    }

    pub fn score_all(&self, pools: Vec<PoolMetric>) -> Vec<ScoredPool> {
        info!(
            "Scoring {} pools (stable bias: {})",
            pools.len(),
            self.options.stable_bias
        );
        pools.into_iter().map(|p| self.score_pool(p)).collect()
    }

    fn asset_risk(&self, pool: &PoolMetric) -> u32 {
        match (is_stable(&pool.symbol), self.options.stable_bias) {
            (true, true) => BIASED_STABLE_ASSET_RISK,
            (true, false) => STABLE_ASSET_RISK,
            (false, _) => VOLATILE_ASSET_RISK,
        }
    }

    /// Protocol-level risk. Same baseline for every pool until per-protocol
    /// signals exist.
    // TODO: feed audit count, protocol age and bug-bounty size in here
    pub fn protocol_risk(&self, _pool: &PoolMetric) -> u32 {
        PROTOCOL_BASELINE_RISK
    }
}

/// Case-insensitive check for fiat-pegged markers in the pool symbol.
pub fn is_stable(symbol: &str) -> bool {
    let upper = symbol.to_uppercase();
    STABLE_MARKERS.iter().any(|marker| upper.contains(marker))
}

// Deeper pools are treated as more battle-tested.
fn liquidity_risk(tvl_usd: f64) -> u32 {
    if tvl_usd > 100_000_000.0 {
        10
    } else if tvl_usd > 10_000_000.0 {
        20
    } else {
        35
    }
}

// High yield is a red flag, not a reward.
fn yield_risk(apy: f64) -> u32 {
    if apy > 0.15 {
        35
    } else if apy > 0.08 {
        25
    } else {
        15
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(symbol: &str, apy: f64, tvl_usd: f64) -> PoolMetric {
        PoolMetric {
            id: format!("{}-pool", symbol),
            protocol: "aave-v3".to_string(),
            chain: "Ethereum".to_string(),
            symbol: symbol.to_string(),
            apy,
            tvl_usd,
        }
    }

    fn biased() -> RiskScorer {
        RiskScorer::new(ScoringOptions { stable_bias: true })
    }

    #[test]
    fn large_usdc_pool_scores_sixty() {
        let scorer = biased();
        let p = pool("USDC", 0.05, 200_000_000.0);
        let bd = scorer.breakdown(&p);
        assert_eq!(
            bd,
            RiskBreakdown {
                asset: 15,
                liquidity: 10,
                yield_risk: 15,
                protocol: 20
            }
        );
        assert_eq!(scorer.score(&p), 60);
    }

    #[test]
    fn risky_pool_is_clamped_to_hundred() {
        let scorer = biased();
        let p = pool("XYZ", 0.30, 5_000_000.0);
        let bd = scorer.breakdown(&p);
        assert_eq!(bd.asset + bd.liquidity + bd.yield_risk + bd.protocol, 145);
        assert_eq!(scorer.score(&p), 100);
    }

    #[test]
    fn stable_detection_is_case_insensitive() {
        assert!(is_stable("usdc"));
        assert!(is_stable("sDAI"));
        assert!(is_stable("GHO-USDT"));
        assert!(!is_stable("WETH"));
        assert!(!is_stable(""));
    }

    #[test]
    fn stable_bias_only_changes_stable_pools() {
        let plain = RiskScorer::new(ScoringOptions::default());
        let bias = biased();

        let stable = pool("DAI", 0.04, 50_000_000.0);
        assert_eq!(plain.score(&stable), 25 + 20 + 15 + 20);
        assert_eq!(bias.score(&stable), 15 + 20 + 15 + 20);

        let volatile = pool("WETH", 0.04, 50_000_000.0);
        assert_eq!(plain.score(&volatile), bias.score(&volatile));
    }

    #[test]
    fn band_boundaries_are_exclusive() {
        let scorer = biased();
        assert_eq!(scorer.breakdown(&pool("X", 0.15, 100_000_000.0)).yield_risk, 25);
        assert_eq!(scorer.breakdown(&pool("X", 0.08, 100_000_000.0)).yield_risk, 15);
        assert_eq!(scorer.breakdown(&pool("X", 0.05, 100_000_000.0)).liquidity, 20);
        assert_eq!(scorer.breakdown(&pool("X", 0.05, 10_000_000.0)).liquidity, 35);
    }

    #[test]
    fn score_pool_keeps_metric_and_assigns_score() {
        let p = pool("USDC", 0.05, 200_000_000.0);
        let scored = biased().score_pool(p.clone());
        assert_eq!(scored.pool(), &p);
        assert_eq!(scored.risk_score(), 60);
    }
}
