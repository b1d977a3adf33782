use crate::common::error::{FaceGateError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_api_timeout")]
    pub timeout_seconds: u64,
}

fn default_api_timeout() -> u64 {
    10
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalyzerConfig {
    #[serde(default = "default_analyzer_url")]
    pub base_url: String,
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,
}

fn default_analyzer_url() -> String {
    "http://127.0.0.1:7700".to_string()
}

fn default_connect_retries() -> u32 {
    3
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            base_url: default_analyzer_url(),
            connect_retries: default_connect_retries(),
        }
    }
}

/// Thresholds for the detection quality gate.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QualityConfig {
    #[serde(default = "default_min_score")]
    pub min_score: f32,
    #[serde(default = "default_min_face_size")]
    pub min_face_size_px: f32,
}

fn default_min_score() -> f32 {
    0.9
}

fn default_min_face_size() -> f32 {
    150.0
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            min_face_size_px: default_min_face_size(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CaptureConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_seconds: u64,
}

fn default_tick_interval() -> u64 {
    500
}

fn default_scan_timeout() -> u64 {
    60
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            scan_timeout_seconds: default_scan_timeout(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    20
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl Config {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FaceGateError::Other(anyhow::anyhow!(
                "Config file not found: {}. Please create it from the example.",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| FaceGateError::Other(anyhow::anyhow!("Config parse error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.quality.min_score < 0.0 || self.quality.min_score > 1.0 {
            return Err(FaceGateError::Other(anyhow::anyhow!(
                "Quality min_score must be between 0.0 and 1.0, got {}",
                self.quality.min_score
            )));
        }
        if self.quality.min_face_size_px <= 0.0 {
            return Err(FaceGateError::Other(anyhow::anyhow!(
                "Quality min_face_size_px must be positive, got {}",
                self.quality.min_face_size_px
            )));
        }

        if self.capture.tick_interval_ms == 0 || self.capture.tick_interval_ms > 10_000 {
            return Err(FaceGateError::Other(anyhow::anyhow!(
                "Capture tick_interval_ms must be between 1 and 10000, got {}",
                self.capture.tick_interval_ms
            )));
        }
        if self.capture.scan_timeout_seconds == 0 || self.capture.scan_timeout_seconds > 600 {
            return Err(FaceGateError::Other(anyhow::anyhow!(
                "Capture scan_timeout_seconds must be between 1 and 600, got {}",
                self.capture.scan_timeout_seconds
            )));
        }

        if self.search.top_k == 0 {
            return Err(FaceGateError::Other(anyhow::anyhow!(
                "Search top_k must be at least 1"
            )));
        }

        if self.api.base_url.is_empty() {
            return Err(FaceGateError::Other(anyhow::anyhow!(
                "API base_url must not be empty"
            )));
        }
        if self.api.email.is_empty() {
            return Err(FaceGateError::Other(anyhow::anyhow!(
                "API email must not be empty"
            )));
        }

        Ok(())
    }
}
