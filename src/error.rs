use std::io;
use thiserror::Error;

use crate::executor::SubmitError;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Data fetch error: {0}")]
    DataFetch(String),

    #[error("Planning error: {0}")]
    Planning(String),

    #[error("Execution transport error: {0}")]
    ExecutionTransport(String),

    #[error("Execution reverted: {0}")]
    ExecutionRevert(String),

    /// Target weights are live on-chain but capital has not moved.
    #[error("Partial execution: weights committed in {weights_tx} but rebalance failed: {cause}")]
    PartialExecution {
        weights_tx: String,
        cause: SubmitError,
    },

    #[error("Notification error: {0}")]
    Notification(String),
}

impl AgentError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn data_fetch_error(msg: impl Into<String>) -> Self {
        Self::DataFetch(msg.into())
    }

    pub fn planning_error(msg: impl Into<String>) -> Self {
        Self::Planning(msg.into())
    }

    pub fn transport_error(msg: impl Into<String>) -> Self {
        Self::ExecutionTransport(msg.into())
    }

    pub fn revert_error(msg: impl Into<String>) -> Self {
        Self::ExecutionRevert(msg.into())
    }

    pub fn notification_error(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
