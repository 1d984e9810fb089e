use std::path::Path;

use anyhow::{Context, bail};
use serde::Deserialize;
use tether_core::VmOptions;

/// Settings read from `--config FILE`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub max_call_depth: Option<usize>,
    /// Trace filter used when `TETHER_TRACE` is not set.
    pub trace: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config '{}'", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(text)?;
        if config.max_call_depth == Some(0) {
            bail!("max_call_depth must be at least 1");
        }
        Ok(config)
    }

    pub fn vm_options(&self) -> VmOptions {
        let mut options = VmOptions::default();
        if let Some(depth) = self.max_call_depth {
            options.max_call_depth = depth;
        }
        options
    }
}
