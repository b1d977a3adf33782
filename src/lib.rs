// Core modules
pub mod common;
pub mod core;
pub mod service;

// Re-export commonly used types
pub use common::{CaptureConfig, Config, Credentials, FaceGateError, QualityConfig, Result};
pub use core::{
    evaluate, AttendanceStatus, CancelToken, CaptureSession, Detection, Embedding, FaceAnalyzer,
    FaceApi, FaceBox, Mode, QualityVerdict, SessionOutcome, SessionState, StudentRecord,
    TickFeedback, EMBEDDING_DIM,
};
pub use service::{AnalyzerClient, ApiClient};
