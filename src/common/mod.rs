pub mod config;
pub mod credentials;
pub mod error;

pub use config::{AnalyzerConfig, ApiConfig, CaptureConfig, Config, QualityConfig, SearchConfig};
pub use credentials::Credentials;
pub use error::{FaceGateError, Result};
