use analysis_orchestrator::{config, PipelineConfig, SentimentPipeline, USAGE};
use anyhow::{Context, Result};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sentiment_pipeline=info,analysis_orchestrator=info".into());
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if config::wants_help(&args) {
        print!("{}", USAGE);
        return Ok(());
    }

    let config = PipelineConfig::from_env_and_args(args)?;
    tracing::info!(
        "{}: prices {}, headlines {}, return basis {}",
        config.ticker,
        config.price_csv.display(),
        config.headlines_csv.display(),
        config.return_basis
    );

    let report = SentimentPipeline::new(config).run()?;
    let json = serde_json::to_string_pretty(&report).context("serializing report")?;
    println!("{}", json);
    Ok(())
}
