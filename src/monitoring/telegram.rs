use reqwest::Client;
use tracing::{error, info};

use crate::error::{AgentError, Result};
use crate::orchestrator::{RunReport, TierStatus};

pub struct TelegramNotifier {
    bot_token: Option<String>,
    chat_id: Option<String>,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: Option<String>, chat_id: Option<String>) -> Self {
        Self {
            bot_token,
            chat_id,
            client: Client::new(),
        }
    }

    pub async fn send_notification(&self, message: &str) -> Result<()> {
        // Check if Telegram integration is configured
        let (bot_token, chat_id) = match (&self.bot_token, &self.chat_id) {
            (Some(token), Some(chat)) => (token, chat),
            _ => {
                info!("Telegram notification skipped: Bot token or chat ID not configured");
                return Ok(());
            }
        };

        info!("Sending Telegram notification");

        let url = format!("https://api.telegram.org/bot{}/sendMessage", bot_token);

        // Send the request
        let response = self
            .client
            .post(&url)
            .form(&[
                ("chat_id", chat_id.as_str()),
                ("text", message),
                ("parse_mode", "HTML"),
            ])
            .send()
            .await
            .map_err(|e| AgentError::notification_error(e.to_string()))?;

        // Check response
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Failed to send Telegram notification: {}", error_text);
            return Err(AgentError::notification_error(format!(
                "Telegram API error: {}",
                error_text
            )));
        }

        info!("Telegram notification sent successfully");
        Ok(())
    }

    pub async fn notify_run(&self, report: &RunReport) -> Result<()> {
        self.send_notification(&format_run_summary(report)).await
    }
}

pub fn format_run_summary(report: &RunReport) -> String {
    let header = if report.has_failures() {
        "<b>⚠️ Tier allocation run needs attention</b>"
    } else {
        "<b>✅ Tier allocation run complete</b>"
    };

    let mut message = format!(
        "{}\n\nPools considered: <b>{}</b>\n",
        header, report.pools_considered
    );

    for tier in &report.tiers {
        let status = match &tier.status {
            TierStatus::Pending => "pending".to_string(),
            TierStatus::Succeeded { rebalance_tx, .. } => {
                format!("succeeded <code>{}</code>", escape_html(rebalance_tx))
            }
            TierStatus::PartialFailure { weights_tx, cause } => format!(
                "PARTIAL - weights live <code>{}</code>, rebalance failed: {}",
                escape_html(weights_tx),
                escape_html(&cause.message)
            ),
            TierStatus::Failed { cause } => format!("failed: {}", escape_html(&cause.message)),
        };
        message.push_str(&format!(
            "{}: <b>{} bps</b> over {} adapters, {}\n",
            tier.tier,
            tier.total_bps,
            tier.plan.len(),
            status
        ));
    }

    message
}

// Telegram's HTML parse mode rejects stray `&`, `<` and `>`.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tier;
    use crate::orchestrator::{FailureCause, FailureKind, TierReport};
    use chrono::Utc;

    #[test]
    fn summary_flags_partial_failures() {
        let report = RunReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            pools_considered: 30,
            push_transactions: true,
            tiers: vec![TierReport {
                tier: Tier::Silver,
                vault: "SilverVault".to_string(),
                plan: vec![],
                total_bps: 0,
                status: TierStatus::PartialFailure {
                    weights_tx: "5xWeights".to_string(),
                    cause: FailureCause {
                        kind: FailureKind::Transport,
                        message: "blockhash expired".to_string(),
                    },
                },
            }],
        };

        let message = format_run_summary(&report);
        assert!(message.contains("needs attention"));
        assert!(message.contains("silver: <b>0 bps</b>"));
        assert!(message.contains("5xWeights"));
    }

    #[test]
    fn summary_escapes_error_text() {
        let report = RunReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            pools_considered: 30,
            push_transactions: true,
            tiers: vec![TierReport {
                tier: Tier::Gold,
                vault: "GoldVault".to_string(),
                plan: vec![],
                total_bps: 0,
                status: TierStatus::Failed {
                    cause: FailureCause {
                        kind: FailureKind::Revert,
                        message: "custom program error: <0x1> & more".to_string(),
                    },
                },
            }],
        };

        let message = format_run_summary(&report);
        assert!(message.contains("failed: custom program error: &lt;0x1&gt; &amp; more"));
        assert!(!message.contains("<0x1>"));
    }
}
