mod agent;
mod config;
mod engine;
mod providers;
mod tools;
mod traits;
mod types;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod testing;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use agent::Agent;
use config::AppConfig;
use engine::{StructuredGenerator, ZodiacEngine};
use providers::{NominatimResolver, OpenAiCompatibleProvider, ProkeralaChartProvider};
use tools::ToolRegistry;
use traits::{GeoResolver, Message};
use types::ConversationContext;

const USAGE: &str = "\
Usage: zodiac-agent [OPTIONS] <QUESTION>

Options:
      --birth <DATETIME>        Birth datetime, ISO-8601 (required)
      --coords <LAT,LNG>        Birth coordinates
      --birth-city <CITY>       Birth city (resolved to coordinates)
      --transit <DATETIME>      Transit datetime (default: now)
      --current-coords <LAT,LNG>  Current coordinates (default: birth)
      --config <PATH>           Config file (default: config.toml)
      --stream                  Stream the answer as it is generated
  -h, --help                    Print help
  -V, --version                 Print version";

struct CliArgs {
    question: String,
    birth_datetime: String,
    birth_coords: Option<String>,
    birth_city: Option<String>,
    transit_datetime: Option<String>,
    current_coords: Option<String>,
    config_path: PathBuf,
    stream: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<CliArgs> {
    let mut question = None;
    let mut birth_datetime = None;
    let mut birth_coords = None;
    let mut birth_city = None;
    let mut transit_datetime = None;
    let mut current_coords = None;
    let mut config_path = PathBuf::from("config.toml");
    let mut stream = false;

    let value = |args: &mut dyn Iterator<Item = String>, flag: &str| {
        args.next()
            .ok_or_else(|| anyhow::anyhow!("{} requires a value", flag))
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--birth" => birth_datetime = Some(value(&mut args, "--birth")?),
            "--coords" => birth_coords = Some(value(&mut args, "--coords")?),
            "--birth-city" => birth_city = Some(value(&mut args, "--birth-city")?),
            "--transit" => transit_datetime = Some(value(&mut args, "--transit")?),
            "--current-coords" => current_coords = Some(value(&mut args, "--current-coords")?),
            "--config" => config_path = PathBuf::from(value(&mut args, "--config")?),
            "--stream" => stream = true,
            "-h" | "--help" => {
                println!("zodiac-agent {}\n\n{}", env!("CARGO_PKG_VERSION"), USAGE);
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("zodiac-agent {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            other if question.is_none() && !other.starts_with('-') => {
                question = Some(other.to_string());
            }
            other => anyhow::bail!("Unexpected argument '{}'\n\n{}", other, USAGE),
        }
    }

    Ok(CliArgs {
        question: question.ok_or_else(|| anyhow::anyhow!("Missing question\n\n{}", USAGE))?,
        birth_datetime: birth_datetime
            .ok_or_else(|| anyhow::anyhow!("--birth is required\n\n{}", USAGE))?,
        birth_coords,
        birth_city,
        transit_datetime,
        current_coords,
        config_path,
        stream,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    let config = AppConfig::load(&args.config_path)?;

    anyhow::ensure!(
        !config.provider.api_key.is_empty(),
        "No LLM API key configured (set GEMINI_API_KEY or provider.api_key)"
    );

    // Coordinates: explicit wins; otherwise resolve the birth city.
    let birth_coords = match (args.birth_coords, args.birth_city) {
        (Some(coords), _) => coords,
        (None, Some(city)) => {
            let resolver = NominatimResolver::new(&config.geo.base_url)
                .map_err(|e| anyhow::anyhow!(e))?;
            resolver.coordinates(&city).await?
        }
        (None, None) => anyhow::bail!("Either --coords or --birth-city is required\n\n{}", USAGE),
    };
    let transit_datetime = args
        .transit_datetime
        .unwrap_or_else(|| Utc::now().to_rfc3339());

    let transport = Arc::new(
        OpenAiCompatibleProvider::new(&config.provider.base_url, &config.provider.api_key)
            .map_err(|e| anyhow::anyhow!(e))?,
    );
    let chart = Arc::new(
        ProkeralaChartProvider::new(
            &config.chart.base_url,
            &config.chart.client_id,
            &config.chart.client_secret,
        )
        .map_err(|e| anyhow::anyhow!(e))?,
    );
    let generator = StructuredGenerator::new(
        transport.clone(),
        config.provider.model.clone(),
        config.engine.ai_retries,
    );
    let engine = Arc::new(ZodiacEngine::new(
        chart,
        generator,
        config.engine.transit_top_k,
    ));

    let context = ConversationContext::new(
        args.birth_datetime,
        birth_coords,
        transit_datetime,
        args.current_coords,
    );
    let zodiac = Agent::new(
        context,
        transport,
        ToolRegistry::new(engine),
        config.provider.model.clone(),
    );

    let history = vec![Message::user(args.question)];
    if args.stream {
        let mut rx = zodiac.chat_stream(history).await?;
        let mut stdout = std::io::stdout();
        while let Some(fragment) = rx.recv().await {
            write!(stdout, "{}", fragment?)?;
            stdout.flush()?;
        }
        writeln!(stdout)?;
    } else {
        println!("{}", zodiac.chat(history).await?);
    }

    Ok(())
}
