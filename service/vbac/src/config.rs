use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vbac_features::EncoderOptions;
use vbac_model::TrainingOptions;

pub const CONFIG_FILE: &str = "vbac.toml";

/// Contents of `vbac.toml`; every section and key is optional
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub encoder: EncoderOptions,
    pub training: TrainingOptions,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

pub fn parse_config(text: &str) -> Result<PipelineConfig, toml::de::Error> {
    toml::from_str::<PipelineConfig>(text)
}

/// Read `explicit` if given, else `vbac.toml` in the working directory if it
/// exists, else defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = PathBuf::from(CONFIG_FILE);
            if !p.exists() {
                log::debug!("No {CONFIG_FILE} found, using defaults");
                return Ok(PipelineConfig::default());
            }
            p
        }
    };
    let text = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config = parse_config(&text).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    log::info!("Loaded configuration from {}", path.display());
    Ok(config)
}
