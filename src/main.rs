//! Thumbfetch CLI - build-time image placeholder pipeline
//!
//! Transforms rendered HTML documents in place (or into an output
//! directory), backed by a persistent metadata cache.
//!
//! # Run Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load configuration (optional TOML file plus environment overrides)
//! 3. Short-circuit unless the pipeline is activated
//! 4. Pick the persistence backend (gist when configured, local file otherwise)
//! 5. Load the cache and reset its per-build counters
//! 6. Transform every input document through one shared scheduler
//! 7. Log the cache report and persist the cache if it changed

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thumbfetch::pipeline::PROGRESSIVE_CSS;
use thumbfetch::{
    transform_html, CacheBackend, Config, DedupScheduler, GistBackend, LocalFileBackend,
    MetadataCache, MetadataFetcher,
};

/// Rewrite image tags in rendered HTML with thumbhash placeholders.
#[derive(Debug, Parser)]
#[command(name = "thumbfetch", version, about)]
struct Args {
    /// HTML documents to transform
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write transformed documents here instead of in place
    #[arg(short, long)]
    out_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thumbfetch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    if !config.is_active() {
        info!("image processing disabled, skipping");
        return Ok(());
    }

    let backend: Box<dyn CacheBackend> = if config.gist_id.is_some() {
        Box::new(GistBackend::new(
            config.gist_id.clone(),
            config.github_token.clone(),
            config.cache_file.clone(),
        ))
    } else {
        Box::new(LocalFileBackend::new(&config.root, &config.cache_file))
    };

    let mut store = MetadataCache::new(config.cache_key_type);
    store.load_from(backend.as_ref()).await;
    store.reset_stats();

    let cache = Arc::new(RwLock::new(store));
    let scheduler = DedupScheduler::new(cache.clone(), Arc::new(MetadataFetcher::new()));

    if let Some(out_dir) = &args.out_dir {
        tokio::fs::create_dir_all(out_dir)
            .await
            .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    }

    for input in &args.inputs {
        let html = tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("reading {}", input.display()))?;

        let transformed = transform_html(&html, &config, &scheduler).await;

        let target = match (&args.out_dir, input.file_name()) {
            (Some(out_dir), Some(name)) => out_dir.join(name),
            _ => input.clone(),
        };
        tokio::fs::write(&target, transformed)
            .await
            .with_context(|| format!("writing {}", target.display()))?;
        info!("processed {}", input.display());
    }

    if config.inject_css {
        let css_dir = args.out_dir.clone().unwrap_or_else(|| config.root.clone());
        let css_dir = css_dir.join("css");
        tokio::fs::create_dir_all(&css_dir)
            .await
            .with_context(|| format!("creating {}", css_dir.display()))?;
        let css_path = css_dir.join("progressive_image.css");
        tokio::fs::write(&css_path, PROGRESSIVE_CSS)
            .await
            .with_context(|| format!("writing {}", css_path.display()))?;
        info!("stylesheet written to {}", css_path.display());
    }

    let report = cache.read().await.report();
    info!(
        "cache has {} items, {} hits / {} requests ({}% hit rate)",
        report.total_items, report.cache_hits, report.total_requests, report.cache_hit_rate
    );

    cache.write().await.save_to(backend.as_ref()).await;

    Ok(())
}
