//! castmatch - run one diagnosis session from the command line
//!
//! Reads survey answers from a JSON file, walks the wizard so every
//! per-step validation runs exactly as in the interactive flow, submits to
//! the scoring service, and prints the ranked matches together with the
//! compact transport payload.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use castmatch::config::AppConfig;
use castmatch::notifier::Navigator;
use castmatch::pipeline::DiagnosisPipeline;
use castmatch::store::SessionStores;
use castmatch::wizard::Transition;
use castmatch::FormInput;

#[derive(Parser, Debug)]
#[command(
    name = "castmatch",
    about = "Submit a diagnosis survey and print the ranked matches"
)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, env = "CASTMATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Survey answers as JSON (the form input shape)
    #[arg(long)]
    answers: PathBuf,

    /// Override the scoring service base URL
    #[arg(long)]
    base_url: Option<String>,
}

struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn navigate(&self, url: &str) {
        info!(url, "navigation requested");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(base_url) = args.base_url {
        config.matching_base_url = base_url;
    }
    info!(base_url = %config.matching_base_url, "starting diagnosis run");

    let raw = std::fs::read_to_string(&args.answers)
        .with_context(|| format!("reading {}", args.answers.display()))?;
    let answers: FormInput =
        serde_json::from_str(&raw).context("answers file is not a valid survey input")?;

    let stores = SessionStores::in_memory();
    let mut pipeline = DiagnosisPipeline::new(&config, stores, None, Arc::new(LoggingNavigator))?;
    pipeline.update_input(|input| *input = answers)?;

    loop {
        match pipeline.advance()? {
            Transition::MovedTo(step) => info!(?step, "step passed"),
            Transition::SubmissionStarted(_) => break,
        }
    }

    let outcome = pipeline.submit().await?;
    match &outcome.session.error {
        Some(error) => println!("diagnosis failed: {error}"),
        None => {
            println!("{} matches:", outcome.session.results.len());
            for result in &outcome.session.results {
                println!(
                    "  #{:<2} {:<24} {:>5.1}  {}",
                    result.rank,
                    result.name,
                    result.score,
                    result.category.as_deref().unwrap_or("-")
                );
            }
            println!(
                "transport payload: {}={}",
                castmatch::codec::TRANSPORT_PARAM,
                outcome.url_payload
            );
        }
    }

    Ok(())
}
