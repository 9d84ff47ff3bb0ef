use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::orchestrator::RunReport;

const RUN_LOG_FILE: &str = "runs.jsonl";

/// Appends one JSON line per run.
pub struct RunLogger {
    log_path: PathBuf,
}

impl RunLogger {
    pub fn new(log_dir: &Path) -> Result<Self> {
        fs::create_dir_all(log_dir)?;

        Ok(Self {
            log_path: log_dir.join(RUN_LOG_FILE),
        })
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub async fn log_run(&self, report: &RunReport) -> Result<()> {
        info!("Recording run report to {}", self.log_path.display());

        // One report per line
        let mut line = serde_json::to_string(report)?;
        line.push('\n');

        // Append to the run log
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        file.write_all(line.as_bytes())?;

        Ok(())
    }

    pub async fn run_history(&self) -> Result<Vec<RunReport>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        // Read and parse every recorded run
        let content = fs::read_to_string(&self.log_path)?;
        let reports = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<std::result::Result<Vec<RunReport>, _>>()?;

        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tier;
    use crate::evaluator::Allocation;
    use crate::orchestrator::{TierReport, TierStatus};
    use chrono::Utc;

    fn report(status: TierStatus) -> RunReport {
        RunReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            pools_considered: 2,
            push_transactions: true,
            tiers: vec![TierReport {
                tier: Tier::Gold,
                vault: "GoldVault".to_string(),
                plan: vec![Allocation {
                    adapter: "0xADAPTER_aave-v3_USDC".to_string(),
                    weight_bps: 3000,
                    reason: "Chosen by utility score; APY=5.00% risk=60".to_string(),
                }],
                total_bps: 3000,
                status,
            }],
        }
    }

    #[tokio::test]
    async fn history_is_empty_before_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let logger = RunLogger::new(dir.path()).unwrap();
        assert!(logger.run_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appends_and_reads_back_runs() {
        let dir = tempfile::tempdir().unwrap();
        let logger = RunLogger::new(&dir.path().join("nested")).unwrap();

        let first = report(TierStatus::Pending);
        let second = report(TierStatus::Succeeded {
            weights_tx: "w".to_string(),
            rebalance_tx: "r".to_string(),
        });
        logger.log_run(&first).await.unwrap();
        logger.log_run(&second).await.unwrap();

        let history = logger.run_history().await.unwrap();
        assert_eq!(history, vec![first, second]);
    }
}
