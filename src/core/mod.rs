pub mod detection;
pub mod quality;
pub mod session;

pub use detection::{Detection, Embedding, FaceAnalyzer, FaceBox, EMBEDDING_DIM};
pub use quality::{evaluate, QualityVerdict};
pub use session::{
    AttendanceStatus, CancelToken, CaptureSession, FaceApi, Mode, SessionOutcome, SessionState,
    StudentRecord, TickFeedback,
};
