//! Resolve command - run the content source chain once

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use hausset_content::{ContentResolver, Resolved};
use hausset_core::Environment;

use super::load_config;

/// Run the resolve command.
///
/// Prints which tier served the content and a summary of it, or the whole
/// bundle as JSON.
pub async fn run(
    config_path: &Path,
    environment: Option<Environment>,
    api_base: Option<String>,
    json: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(environment) = environment {
        config.environment = environment;
    }
    if let Some(api_base) = api_base {
        config.source.api_base = api_base;
    }
    tracing::info!(
        environment = %config.environment,
        api_base = %config.source.api_base,
        "Resolving content"
    );

    let resolver =
        ContentResolver::from_config(&config).wrap_err("Failed to create content client")?;
    let resolved = resolver.resolve().await;

    if json {
        let out = serde_json::to_string_pretty(&resolved.bundle)
            .wrap_err("Failed to serialize content")?;
        println!("{out}");
    } else {
        print_summary(&resolved);
    }

    Ok(())
}

fn print_summary(resolved: &Resolved) {
    let bundle = &resolved.bundle;

    println!();
    println!("  Content Source:");
    println!("  ─────────────────────────────────");
    println!("  Tier:         {}", resolved.tier);
    println!("  Company:      {}", bundle.config.company.name);
    println!("  Tagline:      {}", bundle.config.company.tagline);
    println!("  Problems:     {:>6}", bundle.problems.len());
    println!("  Products:     {:>6}", bundle.products.len());
    if let Some(updated) = bundle.last_updated {
        println!("  Updated:      {}", updated.to_rfc3339());
    }
    println!("  ─────────────────────────────────");
    println!();
}
