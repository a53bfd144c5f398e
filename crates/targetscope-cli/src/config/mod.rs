use anyhow::Context;
use std::path::Path;

use targetscope_ranker::EngineConfig;


/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "targetscope.toml";

/// Load the engine configuration.
/// Checks TARGETSCOPE_CONFIG first, then ./targetscope.toml, then falls
/// back to built-in defaults.
pub fn load() -> anyhow::Result<EngineConfig> {
    let explicit = std::env::var("TARGETSCOPE_CONFIG").ok();
    load_from(explicit.as_deref())
}

/// An explicit path must exist; the default path is optional.
pub fn load_from(explicit: Option<&str>) -> anyhow::Result<EngineConfig> {
    let config = match explicit {
        Some(path) => {
            if !Path::new(path).exists() {
                anyhow::bail!("Config file not found: {}", path);
            }
            EngineConfig::from_path(Path::new(path))
                .with_context(|| format!("Failed to load config from {path}"))?
        }
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => EngineConfig::from_path(Path::new(DEFAULT_CONFIG_FILE))
            .with_context(|| format!("Failed to load config from {DEFAULT_CONFIG_FILE}"))?,
        None => {
            tracing::debug!("No {DEFAULT_CONFIG_FILE} found, using defaults");
            EngineConfig::default()
        }
    };

    config.validate().context("Invalid configuration")?;
    Ok(config)
}
