use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::{PoolDataSource, PoolMetric};
use crate::error::{AgentError, Result};

pub const DEFAULT_POOLS_URL: &str = "https://yields.llama.fi/pools";

/// Pools below this TVL are dropped before ranking.
const MIN_TVL_USD: f64 = 100_000.0;

#[derive(Debug, Deserialize)]
struct LlamaResponse {
    data: Vec<LlamaPool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlamaPool {
    pool: String,
    project: String,
    chain: String,
    #[serde(default)]
    symbol: Option<String>,
    apy: Option<f64>,
    tvl_usd: Option<f64>,
}

pub struct DefiLlamaSource {
    url: String,
    limit: usize,
    client: Client,
}

impl DefiLlamaSource {
    pub fn new(url: impl Into<String>, limit: usize) -> Self {
        Self {
            url: url.into(),
            limit,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl PoolDataSource for DefiLlamaSource {
    async fn fetch_pools(&self) -> Result<Vec<PoolMetric>> {
        info!("Fetching candidate pools from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AgentError::data_fetch_error(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AgentError::data_fetch_error(format!(
                "pool endpoint returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AgentError::data_fetch_error(format!("failed to read pool payload: {}", e)))?;

        let pools = parse_pools(&body, self.limit)?;
        info!("Selected {} candidate pools", pools.len());

        Ok(pools)
    }
}

/// Decodes a `/pools` response body and selects the top `limit` pools.
fn parse_pools(body: &str, limit: usize) -> Result<Vec<PoolMetric>> {
    let response: LlamaResponse = serde_json::from_str(body)
        .map_err(|e| AgentError::data_fetch_error(format!("invalid pool payload: {}", e)))?;

    debug!("Pool endpoint returned {} raw entries", response.data.len());

    Ok(select_top_pools(response.data, limit))
}

/// Keeps positive-yield pools above the TVL floor, highest APY first.
fn select_top_pools(raw: Vec<LlamaPool>, limit: usize) -> Vec<PoolMetric> {
    let mut eligible: Vec<LlamaPool> = raw
        .into_iter()
        .filter(|p| p.apy.unwrap_or(0.0) > 0.0 && p.tvl_usd.unwrap_or(0.0) > MIN_TVL_USD)
        .collect();

    eligible.sort_by(|a, b| b.apy.unwrap_or(0.0).total_cmp(&a.apy.unwrap_or(0.0)));
    eligible.truncate(limit);

    eligible
        .into_iter()
        .map(|p| PoolMetric {
            id: p.pool,
            protocol: p.project,
            chain: p.chain,
            symbol: p.symbol.unwrap_or_default(),
            // DefiLlama quotes APY in percent
            apy: p.apy.unwrap_or(0.0) / 100.0,
            tvl_usd: p.tvl_usd.unwrap_or(0.0),
        })
        .collect()
}
