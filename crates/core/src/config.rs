use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{LecternError, Result},
    provider::Provider,
    segmenter::{DEFAULT_CHUNK_SIZE, MergePolicy},
    transcript::NoiseClassifier,
};

/// Environment variable naming a TOML settings file.
pub const CONFIG_ENV_VAR: &str = "LECTERN_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: Provider,
    pub output_dir: Option<PathBuf>,
    pub segmenter: SegmenterSettings,
    pub noise: NoiseClassifier,
    pub quiz: QuizSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterSettings {
    pub chunk_size: usize,
    /// 1 keeps chunk calls strictly sequential.
    pub max_concurrent_chunks: usize,
    /// 0 means a failed chunk is not retried.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub merge_policy: MergePolicy,
    /// Overrides the provider's default model.
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for SegmenterSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_concurrent_chunks: 1,
            max_retries: 0,
            retry_backoff_ms: 500,
            merge_policy: MergePolicy::None,
            model: None,
            max_tokens: 4096,
            temperature: 0.0,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
    pub base_url: String,
    pub questions_per_chapter: u32,
    pub request_timeout_secs: u64,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            questions_per_chapter: 3,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Load settings from `path`, else from `$LECTERN_CONFIG`, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from),
        };

        let Some(path) = path else {
            debug!("no settings file, using defaults");
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(&path)?;
        let settings = Self::from_toml(&content).map_err(|e| LecternError::InvalidConfig {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(default_output_dir)
    }
}

pub fn default_output_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("lectern")
}
