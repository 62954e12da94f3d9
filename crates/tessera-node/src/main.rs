//! Tessera CLI
//!
//! Local operation and inspection of a Tessera node's state.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tessera_contract::{Evaluation, EvaluationStatus, SubmissionPayload};
use tessera_core::ContentHash;
use tessera_economics::{format_tsr, ContributionTier, Epoch};
use tessera_node::{init_logging, NodeConfig, TesseraNode};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(version)]
#[command(about = "Tessera - fixed-supply rewards for scored contributions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "TESSERA_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and an empty genesis state
    Init {
        /// Where to write the configuration
        #[arg(short, long, default_value = "tessera.toml")]
        output: PathBuf,
    },

    /// Run the periodic miner until interrupted
    Run,

    /// Register a contribution
    Submit {
        /// Contributor identifier
        #[arg(long)]
        contributor: String,

        /// Inline content
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,

        /// Read content from a file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Category labels, first one sets the primary tier
        #[arg(long = "category")]
        categories: Vec<String>,
    },

    /// Record an evaluation for a pending submission
    Evaluate {
        /// Submission hash (hex)
        hash: String,

        #[arg(long, default_value_t = 0)]
        coherence: u32,

        #[arg(long, default_value_t = 0)]
        density: u32,

        #[arg(long, default_value_t = 0)]
        novelty: u32,

        #[arg(long, default_value_t = 0)]
        redundancy: u32,

        /// Record a rejection instead of an approval
        #[arg(long)]
        reject: bool,
    },

    /// Allocate rewards for an approved submission
    Allocate {
        /// Submission hash (hex)
        hash: String,

        /// Explicit epoch (requires --tier)
        #[arg(long, requires = "tier")]
        epoch: Option<String>,

        /// Explicit tier (requires --epoch)
        #[arg(long, requires = "epoch")]
        tier: Option<String>,
    },

    /// Preview allocations from the mirror
    Preview {
        /// Submission hash (hex)
        hash: String,
    },

    /// Mine pending transactions into one block
    Mine,

    /// Check chain integrity and supply conservation
    Verify,

    /// Print node statistics as JSON
    Stats,

    /// Show a contributor's activity and balance
    Contributor {
        id: String,
    },

    /// Rank contributors by total reward
    Top {
        #[arg(short, long, default_value_t = 10)]
        n: usize,
    },

    /// Print metrics in Prometheus text format
    Metrics,
}

fn parse_hash(value: &str) -> anyhow::Result<ContentHash> {
    value
        .parse()
        .with_context(|| format!("invalid submission hash: {value}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = NodeConfig::load(cli.config.as_deref())?;
    init_logging(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Init { output } => {
            if output.exists() {
                bail!("{} already exists", output.display());
            }
            std::fs::write(&output, config.to_toml()?)
                .with_context(|| format!("failed to write {}", output.display()))?;

            let node = TesseraNode::from_config(config)?;
            node.persist()?;

            println!("Configuration: {}", output.display());
            println!("Data directory: {}", node.config().data_dir().display());
            println!("Genesis: {}", node.chain().stats().tip_hash);
        }

        Commands::Run => {
            let node = Arc::new(TesseraNode::from_config(config)?);
            let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
            let miner = tokio::spawn(Arc::clone(&node).run_miner(shutdown_rx));

            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for ctrl-c")?;
            tracing::info!("Shutdown requested");
            let _ = shutdown_tx.send(()).await;
            miner.await?;
            node.persist()?;
        }

        Commands::Submit {
            contributor,
            content,
            file,
            categories,
        } => {
            let content = match (content, file) {
                (Some(content), _) => content,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, None) => bail!("either --content or --file is required"),
            };
            let node = TesseraNode::from_config(config)?;
            let hash = node.submit(SubmissionPayload::new(contributor, content, categories))?;
            node.persist()?;
            println!("{hash}");
        }

        Commands::Evaluate {
            hash,
            coherence,
            density,
            novelty,
            redundancy,
            reject,
        } => {
            let hash = parse_hash(&hash)?;
            let evaluation = Evaluation {
                coherence,
                density,
                novelty,
                redundancy,
                status: if reject {
                    EvaluationStatus::Rejected
                } else {
                    EvaluationStatus::Approved
                },
            };
            let node = TesseraNode::from_config(config)?;
            let submission = node.evaluate(hash, evaluation)?;
            node.persist()?;

            println!("Status: {}", submission.status);
            if let (Some(score), Some(epoch)) = (submission.score, submission.qualified_epoch) {
                println!("Score: {score}");
                println!("Qualified epoch: {epoch}");
            }
        }

        Commands::Allocate { hash, epoch, tier } => {
            let hash = parse_hash(&hash)?;
            let node = TesseraNode::from_config(config)?;
            let attempts = match (epoch, tier) {
                (Some(epoch), Some(tier)) => {
                    let epoch: Epoch = epoch.parse()?;
                    let tier: ContributionTier = tier.parse()?;
                    vec![node.request_allocation(hash, epoch, tier)?]
                }
                _ => node.allocate(hash)?.attempts,
            };
            node.persist()?;

            for attempt in attempts {
                match attempt.reason {
                    None => println!(
                        "{} @ {}: {} (balance {} -> {})",
                        attempt.tier,
                        attempt.epoch,
                        format_tsr(attempt.reward),
                        format_tsr(attempt.balance_before),
                        format_tsr(attempt.balance_after)
                    ),
                    Some(reason) => {
                        println!("{} @ {}: unavailable, {}", attempt.tier, attempt.epoch, reason)
                    }
                }
            }
        }

        Commands::Preview { hash } => {
            let hash = parse_hash(&hash)?;
            let node = TesseraNode::from_config(config)?;
            for quote in node.preview(hash)? {
                let status = match &quote.reason {
                    None => "available".to_string(),
                    Some(reason) => reason.to_string(),
                };
                println!(
                    "{} @ {}: score {} reward {} ({})",
                    quote.tier,
                    quote.epoch,
                    quote.score,
                    format_tsr(quote.reward),
                    status
                );
            }
        }

        Commands::Mine => {
            let node = TesseraNode::from_config(config)?;
            match node.mine_pending(&node.mining_budget())? {
                Some(block) => {
                    println!("Block #{}: {}", block.index(), block.hash());
                    println!("Transactions: {}", block.transactions().len());
                    println!("Epoch: {}", node.contract().current_epoch());
                }
                None => println!("Nothing to mine"),
            }
        }

        Commands::Verify => {
            let node = TesseraNode::from_config(config)?;
            node.verify()?;
            println!("OK: {} blocks, supply conserved", node.chain().len());
        }

        Commands::Stats => {
            let node = TesseraNode::from_config(config)?;
            println!("{}", serde_json::to_string_pretty(&node.stats())?);
        }

        Commands::Contributor { id } => {
            let node = TesseraNode::from_config(config)?;
            let Some(summary) = node.contract().contributor(&id) else {
                bail!("unknown contributor {id}");
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
            for submission in node.contract().submissions_by(&id) {
                let score = submission
                    .score
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{} {} tier={} score={}",
                    submission.hash, submission.status, submission.tier, score
                );
            }
        }

        Commands::Top { n } => {
            let node = TesseraNode::from_config(config)?;
            for (rank, summary) in node.contract().top_contributors(n).iter().enumerate() {
                println!(
                    "{:>3}. {} {} ({} approved)",
                    rank + 1,
                    summary.contributor,
                    format_tsr(summary.balance.total),
                    summary.activity.approved
                );
            }
        }

        Commands::Metrics => {
            let node = TesseraNode::from_config(config)?;
            let Some(metrics) = node.metrics() else {
                bail!("metrics are disabled");
            };
            print!("{}", metrics.render()?);
        }
    }

    Ok(())
}
