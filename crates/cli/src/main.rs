use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use extreme_air_core::llm::gemini::GeminiClient;
use extreme_air_core::llm::generator::StrategyGenerator;

#[derive(Debug, Parser)]
#[command(name = "extreme_air_cli")]
struct Args {
    /// Business to build the marketing strategy for.
    #[arg(long)]
    client_name: String,

    /// Pretty-print the JSON result.
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = extreme_air_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    // Logs go to stderr so stdout stays pipeable JSON.
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let client = GeminiClient::from_settings(&settings)?;
    let generator = StrategyGenerator::new(Arc::new(client));

    let strategy = match generator.generate_strategy(&args.client_name).await {
        Ok(strategy) => strategy,
        Err(err) => {
            if let Some(raw) = err.raw_output() {
                tracing::debug!(raw_output = raw, "raw LLM output");
            }
            let err = anyhow::Error::new(err)
                .context(format!("strategy generation failed for {}", args.client_name));
            sentry_anyhow::capture_anyhow(&err);
            return Err(err);
        }
    };

    let out = if args.pretty {
        serde_json::to_string_pretty(&strategy)
    } else {
        serde_json::to_string(&strategy)
    }
    .context("failed to serialize strategy")?;
    println!("{out}");

    Ok(())
}

fn init_sentry(settings: &extreme_air_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
