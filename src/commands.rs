//! CLI command implementations

use crate::config::{self, Overrides, Settings};
use anyhow::Context;
use diffgraph_ai::create_provider;
use diffgraph_git::{discover_changes, is_git_repo};
use diffgraph_pipeline::AnalysisPipeline;
use std::path::PathBuf;

pub async fn analyze(root: PathBuf, overrides: Overrides) -> anyhow::Result<()> {
    if !is_git_repo(&root).await {
        anyhow::bail!("{} is not inside a git repository", root.display());
    }

    let mut settings = Settings::load(&root)?;
    settings.apply_overrides(overrides);

    // A missing key fails before any file is analysed.
    let provider = create_provider(&settings.provider, &settings.provider_options())?;

    let changes = discover_changes(&root)
        .await
        .with_context(|| format!("Failed to list changes in {}", root.display()))?;
    if changes.is_empty() {
        tracing::info!("No uncommitted changes, nothing to analyse");
        return Ok(());
    }
    tracing::info!("Found {} changed file(s)", changes.len());

    let mut pipeline = AnalysisPipeline::new(provider, settings.pipeline_options());
    pipeline.enqueue(changes);
    let outcome = pipeline.run().await;

    if outcome.stopped_early {
        tracing::warn!(
            "Token budget reached: {} file(s) were not analysed",
            outcome.stats.pending
        );
    }
    tracing::info!("Used {} tokens", outcome.tokens_used);

    let output = if settings.output.is_absolute() {
        settings.output.clone()
    } else {
        root.join(&settings.output)
    };
    let report = diffgraph_report::write_report(&output, &outcome.diagram, &outcome.summary)?;
    println!("Report written to {}", report.display());

    if settings.open {
        if let Err(e) = diffgraph_report::open_report(&report) {
            tracing::warn!("{}", e);
        }
    }

    Ok(())
}

pub fn env(root: PathBuf) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    println!("Current directory: {}", cwd.display());
    if let Ok(exe) = std::env::current_exe() {
        println!("Executable: {}", exe.display());
    }

    println!("\n.env candidates:");
    for candidate in config::env_candidates() {
        let state = if candidate.is_file() { "found" } else { "missing" };
        println!("  {} ({})", candidate.display(), state);
    }
    let config_file = root.join(config::CONFIG_FILE);
    let state = if config_file.is_file() { "found" } else { "missing" };
    println!("Config file: {} ({})", config_file.display(), state);

    let settings = Settings::load(&root)?;
    println!("\nProvider: {}", settings.provider);
    match settings.model.as_deref() {
        Some(model) => println!("Model: {}", model),
        None => println!("Model: provider default"),
    }
    match settings.api_key.as_deref() {
        Some(key) => println!("OPENAI_API_KEY: set ({})", config::mask_key(key)),
        None => println!("OPENAI_API_KEY: not set"),
    }

    Ok(())
}
