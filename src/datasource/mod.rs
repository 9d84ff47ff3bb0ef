pub mod defillama;

pub use defillama::DefiLlamaSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// A candidate yield pool as produced by a data source, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolMetric {
    pub id: String,
    pub protocol: String,
    pub chain: String,
    pub symbol: String,
    /// Decimal fraction, 0.08 = 8%.
    pub apy: f64,
    pub tvl_usd: f64,
}

impl PoolMetric {
    /// Rejects records the scorer and planner cannot reason about.
    pub fn validate(&self) -> Result<()> {
        if !self.apy.is_finite() || self.apy < 0.0 {
            return Err(AgentError::planning_error(format!(
                "pool {} has invalid apy {}",
                self.id, self.apy
            )));
        }
        if !self.tvl_usd.is_finite() || self.tvl_usd < 0.0 {
            return Err(AgentError::planning_error(format!(
                "pool {} has invalid tvl {}",
                self.id, self.tvl_usd
            )));
        }
        Ok(())
    }
}

#[async_trait]
pub trait PoolDataSource: Send + Sync {
    async fn fetch_pools(&self) -> Result<Vec<PoolMetric>>;
}

/// Serves a fixed list of pools. Used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticPoolSource {
    pools: Vec<PoolMetric>,
}

impl StaticPoolSource {
    pub fn new(pools: Vec<PoolMetric>) -> Self {
        Self { pools }
    }
}

#[async_trait]
impl PoolDataSource for StaticPoolSource {
    async fn fetch_pools(&self) -> Result<Vec<PoolMetric>> {
        Ok(self.pools.clone())
    }
}
