use proptest::prelude::*;

use tier_allocator::datasource::PoolMetric;
use tier_allocator::evaluator::{
    utility, AllocationPlanner, PlanConfig, RiskScorer, ScoredPool, ScoringOptions, UtilityRanker,
};

fn make_pool(symbol: &str, apy: f64, tvl_usd: f64) -> PoolMetric {
    PoolMetric {
        id: format!("{}-{}-{}", symbol, apy, tvl_usd),
        protocol: "proto".to_string(),
        chain: "Ethereum".to_string(),
        symbol: symbol.to_string(),
        apy,
        tvl_usd,
    }
}

fn arb_symbol() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("USDC".to_string()),
        Just("sdai".to_string()),
        Just("WETH".to_string()),
        Just("WBTC-ETH".to_string()),
        "[A-Za-z0-9-]{0,12}",
    ]
}

fn arb_pool() -> impl Strategy<Value = PoolMetric> {
    (arb_symbol(), 0.0f64..2.0, 0.0f64..1e10)
        .prop_map(|(symbol, apy, tvl)| make_pool(&symbol, apy, tvl))
}

fn score_all(pools: Vec<PoolMetric>) -> Vec<ScoredPool> {
    RiskScorer::new(ScoringOptions { stable_bias: true }).score_all(pools)
}

proptest! {
    #[test]
    fn score_is_bounded(pool in arb_pool(), stable_bias in any::<bool>()) {
        let score = RiskScorer::new(ScoringOptions { stable_bias }).score(&pool);
        prop_assert!(score <= 100, "score {} out of range", score);
    }
}

// Above 15% APY on a thin pool both scores hit the 100 clamp and tie.
proptest! {
    #[test]
    fn stable_bias_beats_identical_volatile_pool(
        apy in 0.0f64..0.15,
        tvl in 0.0f64..1e9,
    ) {
        let scorer = RiskScorer::new(ScoringOptions { stable_bias: true });
        let stable = scorer.score(&make_pool("USDC", apy, tvl));
        let volatile = scorer.score(&make_pool("WETH", apy, tvl));
        prop_assert!(stable < volatile, "stable {} >= volatile {}", stable, volatile);
    }
}

proptest! {
    #[test]
    fn ranking_is_descending_and_stable(pools in prop::collection::vec(arb_pool(), 0..20)) {
        let scored = score_all(pools);
        let ranked = UtilityRanker::new().rank(&scored);
        prop_assert_eq!(ranked.len(), scored.len());

        for pair in ranked.windows(2) {
            let (a, b) = (utility(&pair[0]), utility(&pair[1]));
            prop_assert!(a >= b);
            if a == b {
                let pos_a = scored.iter().position(|p| p == &pair[0]).unwrap();
                let pos_b = scored.iter().rposition(|p| p == &pair[1]).unwrap();
                prop_assert!(pos_a <= pos_b);
            }
        }
    }
}

proptest! {
    #[test]
    fn plans_respect_cap_and_total(
        pools in prop::collection::vec(arb_pool(), 0..20),
        max_per_adapter_bps in 0u16..=10_000,
        slots in 1usize..8,
    ) {
        let scored = score_all(pools);
        let plan = AllocationPlanner::new(PlanConfig { max_per_adapter_bps, slots }).plan(&scored);

        prop_assert_eq!(plan.len(), scored.len().min(slots));
        prop_assert!(plan.iter().all(|a| a.weight_bps <= max_per_adapter_bps));
        let total: u32 = plan.iter().map(|a| u32::from(a.weight_bps)).sum();
        prop_assert!(total <= 10_000, "total {} bps", total);
    }
}

proptest! {
    #[test]
    fn planning_is_idempotent(
        pools in prop::collection::vec(arb_pool(), 0..10),
        slots in 1usize..4,
    ) {
        let scored = score_all(pools);
        let planner = AllocationPlanner::new(PlanConfig { max_per_adapter_bps: 4000, slots });
        prop_assert_eq!(planner.plan(&scored), planner.plan(&scored));
    }
}
