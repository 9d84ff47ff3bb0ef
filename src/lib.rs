//! Tiered yield allocation agent.
//!
//! One run fetches candidate pools, scores and ranks them, plans Gold/Silver/
//! Bronze weights under per-tier caps and, when pushing is enabled, commits
//! each plan to its vault with `setTargetWeights` followed by `rebalance`.

pub mod config;
pub mod datasource;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod monitoring;
pub mod orchestrator;

pub use error::{AgentError, Result};
pub use orchestrator::{Orchestrator, RunReport, TierReport, TierStatus};
