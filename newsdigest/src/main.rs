/*
newsdigest - single-binary main.rs
This binary loads configuration, builds the two provider clients and starts
the Rocket HTTP server.
*/

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use newsdigest::llm::remote::RemoteChatProvider;
use newsdigest::llm::{ChatProvider, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TOP_P};
use newsdigest::news::NewsClient;
use newsdigest::server::{launch_rocket, AppState};

#[derive(Parser, Debug)]
#[command(name = "newsdigest", about = "newsdigest HTTP gateway")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() {
            Some(p)
        } else {
            None
        }
    };

    // Load configuration with defaults
    let config = match Config::load_with_defaults(
        if default_path.exists() {
            Some(&default_path)
        } else {
            None
        },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default = ?default_path, override_path = ?override_path, "configuration loaded");

    // Build the news client; the key comes from the environment, never from TOML
    let news_key = common::resolve_api_key(
        config.news.api_key_env.as_deref(),
        "NEWSDATA_IO_API_TOKEN",
    )
    .context("news provider API key missing")?;

    let news_url = config
        .news
        .api_url
        .clone()
        .unwrap_or_else(|| "https://newsdata.io/api/1/news".to_string());

    let mut news = NewsClient::new(news_url, news_key)?;
    if let Some(lang) = config.news.language.clone() {
        news = news.with_language(lang);
    }
    if let Some(timeout) = config.news.timeout_seconds {
        news = news.with_timeout(timeout)?;
    }

    // Build the chat-completion provider
    let llm_key = common::resolve_api_key(config.llm.api_key_env.as_deref(), "OPENAI_API_KEY")
        .context("completion provider API key missing")?;

    let llm_url = config
        .llm
        .api_url
        .clone()
        .context("llm.api_url must be set in configuration")?;
    let deployment = config
        .llm
        .deployment
        .clone()
        .unwrap_or_else(|| "gpt-35-turbo".to_string());
    let api_version = config
        .llm
        .api_version
        .clone()
        .unwrap_or_else(|| "2023-03-15-preview".to_string());

    let provider = RemoteChatProvider::new(llm_url, llm_key, deployment.as_str(), api_version)
        .with_defaults(
            config.llm.timeout_seconds.unwrap_or(30),
            config.llm.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            config.llm.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            config.llm.top_p.unwrap_or(DEFAULT_TOP_P),
        );
    let llm: Arc<dyn ChatProvider> = Arc::new(provider);
    info!(deployment = %deployment, "chat-completion provider initialized");

    let state = AppState {
        started_at: Utc::now(),
        config: Arc::new(config),
        news,
        llm,
    };

    // Launch the Rocket server (blocking until Rocket shuts down)
    info!("Launching Rocket HTTP server");
    if let Err(e) = launch_rocket(state).await {
        error!(%e, "Rocket server failed");
        return Err(e);
    }

    info!("Shutdown complete");
    Ok(())
}
