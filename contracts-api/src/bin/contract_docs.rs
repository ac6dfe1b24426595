//! Contract API documentation generator
//!
//! Usage: `contract-docs [config.toml]`. Without a path the configuration is
//! read from `CONTRACTS_*` environment variables.

use anyhow::Context;
use contracts_api::config::DocsFormat;
use contracts_api::{Config, TypesRegistry};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path).with_context(|| format!("loading config from {}", path))?,
        None => Config::from_env().context("loading config from environment")?,
    };

    let capabilities = config.capabilities();
    tracing::info!(
        api_version = %capabilities.version(),
        capabilities = capabilities.iter().count(),
        "Generating contract API documentation"
    );

    let registry = TypesRegistry::build(&capabilities, config.docs.include_descriptions);
    let output = match config.docs.format {
        DocsFormat::Json => serde_json::to_string_pretty(&registry)?,
        DocsFormat::Toml => toml::to_string_pretty(&registry)?,
    };
    println!("{}", output);

    tracing::info!(types = registry.types.len(), "Documentation written");
    Ok(())
}
