use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_patterns::config::{self, Config};
use chat_patterns::demo::{ConsoleReporter, DemoOrchestrator, Scenario};
use chat_patterns::llm::ProviderRegistry;

#[derive(Parser)]
#[command(name = "chat-patterns")]
#[command(version, about = "Run chat-completion interaction patterns against configured providers", long_about = None)]
struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Scenario to run (repeatable). Runs all of them when omitted.
    #[arg(short, long, value_enum)]
    scenario: Vec<Scenario>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in a local .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_patterns=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .await
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let registry = ProviderRegistry::from_env(&config)?;

    let scenarios = if cli.scenario.is_empty() {
        Scenario::ALL.to_vec()
    } else {
        cli.scenario
    };

    let demo = DemoOrchestrator::new(registry);
    let mut reporter = ConsoleReporter;
    let summary = demo.run(&scenarios, &mut reporter).await;

    if !summary.configured {
        return Ok(());
    }

    info!(
        scenarios = summary.scenarios.len(),
        failures = summary.total_failures(),
        "Run complete"
    );
    Ok(())
}
