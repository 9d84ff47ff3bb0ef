use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use tier_allocator::config::{self, Config, Tier};
use tier_allocator::datasource::DefiLlamaSource;
use tier_allocator::executor::{SolanaVaultSigner, TierExecutor};
use tier_allocator::monitoring::{RunLogger, TelegramNotifier};
use tier_allocator::Orchestrator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one allocation pass over all tiers
    Run {
        /// Push weights on-chain even if PUSH_TX is not set
        #[arg(long)]
        push: bool,
    },
    /// Compute and print the plans without sending anything
    Plan,
    /// Re-send rebalance() for a tier whose weights are already live
    Rebalance {
        #[arg(long, value_enum)]
        tier: Tier,
    },
    /// Check RPC connectivity, wallet and vault configuration
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    info!("Starting tier allocator");

    // Parse command line arguments
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Run { push }) => {
            let mut config = config::load_config().await?;
            if *push {
                config.push_transactions = true;
                config.validate()?;
            }
            run_allocation(config).await?;
        }
        Some(Commands::Plan) => {
            let config = config::load_plan_config().await?;
            let report = build_orchestrator(&config).run_once().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some(Commands::Rebalance { tier }) => {
            let config = config::load_config().await?;
            let tx = build_orchestrator(&config)
                .with_executor(build_executor(&config)?)
                .rebalance_tier(*tier)
                .await?;
            info!("Rebalance for {} confirmed: {}", tier, tx);
        }
        Some(Commands::Init) => {
            let config = config::load_config().await?;
            config::initialize_config(&config).await?;
        }
        None => {
            info!("No command specified. Use --help for available commands.");
        }
    }

    Ok(())
}

async fn run_allocation(config: Config) -> Result<()> {
    if config.push_transactions {
        info!("Transaction pushing ENABLED for all tiers");
    } else {
        info!("Transaction pushing disabled - plans will only be reported");
    }

    let mut orchestrator = build_orchestrator(&config);
    if config.push_transactions {
        orchestrator = orchestrator.with_executor(build_executor(&config)?);
    }

    // Initialize monitoring
    let logger = RunLogger::new(&config.log_dir)?;
    let telegram = TelegramNotifier::new(
        config.telegram_bot_token.clone(),
        config.telegram_chat_id.clone(),
    );

    let report = orchestrator
        .run_once()
        .await
        .context("allocation run aborted")?;

    // Record the run and notify
    if let Err(e) = logger.log_run(&report).await {
        error!("Failed to record run report: {}", e);
    }

    if let Err(e) = telegram.notify_run(&report).await {
        error!("Failed to send Telegram notification: {}", e);
    }

    let failed: Vec<String> = report.failures().map(|t| t.tier.to_string()).collect();
    if failed.is_empty() {
        info!("Run complete");
    } else {
        error!("Run complete with failed tiers: {}", failed.join(", "));
    }

    Ok(())
}

fn build_orchestrator(config: &Config) -> Orchestrator {
    let source = Arc::new(DefiLlamaSource::new(
        config.pools_url.clone(),
        config.pool_limit,
    ));
    Orchestrator::new(source, config.tiers.clone(), config.push_transactions)
}

fn build_executor(config: &Config) -> Result<TierExecutor> {
    let program_id = config
        .vault_program_id
        .as_deref()
        .context("VAULT_PROGRAM_ID is required to send transactions")?;
    let authority = config::get_keypair(&config.wallet_path)?;
    let signer = SolanaVaultSigner::new(&config.rpc_url, program_id, authority)?;
    Ok(TierExecutor::new(Arc::new(signer)))
}
