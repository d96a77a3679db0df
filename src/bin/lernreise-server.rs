//! # lernreise-server
//!
//! Serves the Lernreise command transport over HTTP.
//!
//! ```bash
//! lernreise-server --config lernreise.toml
//! LERNREISE_CATALOG_URL=https://catalog.example.org/api lernreise-server --bind 127.0.0.1:8080
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;

use lernreise::api;
use lernreise::{HttpCatalogClient, HttpRegistryClient, InMemoryStore, LernreiseConfig, Lernreise};

/// Lernreise orchestration service.
#[derive(Debug, Parser)]
#[command(name = "lernreise-server")]
#[command(about = "Binds users to catalog courses and tracks their progress")]
#[command(version)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(long, short, env = "LERNREISE_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides `http.bind`.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => LernreiseConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LernreiseConfig::default(),
    };
    let mut config = config
        .with_env_overrides()
        .context("applying LERNREISE_* environment")?;
    if let Some(bind) = args.bind {
        config.http.bind = bind;
    }

    tracing::info!(
        catalog = %config.catalog.base_url,
        registry = %config.registry.base_url,
        "starting lernreise"
    );

    let catalog_config = config.catalog.clone();
    let registry_config = config.registry.clone();
    let rewards = config.rewards;

    // reqwest's blocking client owns a runtime and must be built off the async workers
    let service = tokio::task::spawn_blocking(move || -> Result<_> {
        let catalog = HttpCatalogClient::new(&catalog_config).context("building catalog client")?;
        let registry =
            HttpRegistryClient::new(&registry_config).context("building registry client")?;
        Ok(Lernreise::new(InMemoryStore::new(), catalog, registry, rewards))
    })
    .await??;

    let api = Arc::new(api::handlers::api(service));
    api::serve(api, &config.http.bind).await?;
    Ok(())
}
