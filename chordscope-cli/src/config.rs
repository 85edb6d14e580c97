use anyhow::{Context, Result};
use chordscope_core::DetectorConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::Cli;

const DEFAULT_CONFIG_FILE: &str = "chordscope.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub detector: DetectorConfig,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Explicit `--config`, else `chordscope.toml` in the working directory.
pub fn config_path(cli: &Cli) -> Option<PathBuf> {
    cli.config.clone().or_else(|| {
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.exists().then_some(local)
    })
}

/// Detector settings from the file (if any) with command-line overrides.
pub fn resolve(cli: &Cli) -> Result<DetectorConfig> {
    let mut detector = match config_path(cli) {
        Some(path) => {
            let config = load_config(&path)?;
            log::info!("[MAIN] Loaded config from {}", path.display());
            config.detector
        }
        None => DetectorConfig::default(),
    };

    apply_overrides(&mut detector, cli);
    detector.validate()?;
    Ok(detector)
}

fn apply_overrides(detector: &mut DetectorConfig, cli: &Cli) {
    if let Some(fft_size) = cli.fft_size {
        detector.fft_size = fft_size;
    }
    if let Some(frames) = cli.stability_frames {
        detector.stability_frames = frames;
    }
    if let Some(max) = cli.max_fundamentals {
        detector.max_fundamentals = max;
    }
}
