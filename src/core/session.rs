use crate::common::error::{FaceGateError, Result};
use crate::common::{CaptureConfig, Config, QualityConfig};
use crate::core::detection::{Detection, Embedding, FaceAnalyzer};
use crate::core::quality::{evaluate, QualityVerdict};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Identity record returned by the server-side embedding search. Field
/// names on the wire are the server's; they are mapped to English here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellidos")]
    pub last_name: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "especialidad")]
    pub area: String,
    #[serde(rename = "grado")]
    pub grade: String,
    #[serde(rename = "grupo")]
    pub group: String,
}

impl StudentRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Result of the attendance side effect after a successful identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    Registered,
    Rejected,
    Failed,
}

/// Outbound port to the classroom API. The capture session drives it for
/// its terminal action; the HTTP implementation lives in `service`.
pub trait FaceApi {
    fn register_face(&self, student_id: &str, embedding: &Embedding) -> Result<()>;
    fn search_face(
        &self,
        group_id: &str,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Option<StudentRecord>>;
    fn register_attendance(&self, student: &StudentRecord) -> Result<bool>;
}

/// What a capture session does once a detection passes the quality gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Store the embedding against a known student.
    Register { student_id: String },
    /// Search for a matching identity within a group and record attendance.
    Verify { group_id: String },
}

/// Cooperative cancellation flag shared between the session loop and its
/// caller. Cancelling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Scanning,
    Submitting,
    Complete(SessionOutcome),
}

/// Terminal result of one session activation.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Register mode: embedding stored.
    Registered,
    /// Verify mode: identity found; attendance attempted with its fields.
    Recognized {
        student: StudentRecord,
        attendance: AttendanceStatus,
    },
    /// Verify mode: the search returned no identity. Not an error.
    NotRecognized,
    /// Submission failed in transport or on the server. Retry is manual.
    Failed(String),
    Cancelled,
    TimedOut,
}

/// Per-tick feedback for live UI display. Score and size are zero when no
/// face was found, matching what the capture overlay shows.
#[derive(Debug, Clone, PartialEq)]
pub struct TickFeedback {
    pub verdict: QualityVerdict,
    pub score: f32,
    pub face_width: f32,
    pub face_height: f32,
}

impl TickFeedback {
    fn new(verdict: QualityVerdict, detection: Option<&Detection>) -> Self {
        match detection {
            Some(d) => Self {
                verdict,
                score: d.score,
                face_width: d.bounding_box.width,
                face_height: d.bounding_box.height,
            },
            None => Self {
                verdict,
                score: 0.0,
                face_width: 0.0,
                face_height: 0.0,
            },
        }
    }
}

/// Releases the analyzer on every exit path of `CaptureSession::run`.
struct ScanGuard<'a, A: FaceAnalyzer> {
    analyzer: &'a mut A,
}

impl<A: FaceAnalyzer> ScanGuard<'_, A> {
    fn detect(&mut self) -> Result<Option<Detection>> {
        self.analyzer.detect()
    }
}

impl<A: FaceAnalyzer> Drop for ScanGuard<'_, A> {
    fn drop(&mut self) {
        self.analyzer.stop();
    }
}

/// One activation of the capture workflow: poll the analyzer on a fixed
/// cadence, gate each detection, and on the first accepted detection submit
/// exactly once according to the configured mode.
///
/// The tick is loop-driven rather than timer-driven: a new detection is only
/// requested after the previous one has been evaluated, so detection calls
/// never overlap and no tick can run concurrently with a submission.
pub struct CaptureSession<'a, C: FaceApi> {
    api: &'a C,
    mode: Mode,
    quality: QualityConfig,
    tick_interval: Duration,
    scan_timeout: Duration,
    top_k: usize,
    state: SessionState,
}

impl<'a, C: FaceApi> CaptureSession<'a, C> {
    pub fn new(api: &'a C, mode: Mode, config: &Config) -> Self {
        Self::with_settings(
            api,
            mode,
            config.quality.clone(),
            config.capture.clone(),
            config.search.top_k,
        )
    }

    pub fn with_settings(
        api: &'a C,
        mode: Mode,
        quality: QualityConfig,
        capture: CaptureConfig,
        top_k: usize,
    ) -> Self {
        Self {
            api,
            mode,
            quality,
            tick_interval: Duration::from_millis(capture.tick_interval_ms),
            scan_timeout: Duration::from_secs(capture.scan_timeout_seconds),
            top_k,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Return a completed (or stopped) session to `Idle` so it can run again.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
    }

    /// Drive the session to a terminal outcome. `on_tick` receives feedback
    /// for every detection tick while scanning.
    ///
    /// The analyzer's camera is released before this returns, on every path.
    /// Device errors from `FaceAnalyzer::start` are returned as `Err`; a
    /// failing submission is an outcome, not an error.
    pub fn run<A, F>(
        &mut self,
        analyzer: &mut A,
        token: &CancelToken,
        mut on_tick: F,
    ) -> Result<SessionOutcome>
    where
        A: FaceAnalyzer,
        F: FnMut(&TickFeedback),
    {
        if self.state != SessionState::Idle {
            return Err(FaceGateError::Session(
                "capture session already ran; call reset() first".to_string(),
            ));
        }

        analyzer.start()?;
        let mut guard = ScanGuard { analyzer };
        self.state = SessionState::Scanning;
        let deadline = Instant::now() + self.scan_timeout;

        loop {
            if token.is_cancelled() {
                tracing::debug!("capture session cancelled while scanning");
                self.state = SessionState::Idle;
                return Ok(SessionOutcome::Cancelled);
            }
            if Instant::now() >= deadline {
                tracing::info!("capture session timed out without an accepted detection");
                self.state = SessionState::Idle;
                return Ok(SessionOutcome::TimedOut);
            }

            // A failing tick is live feedback, not a terminal condition.
            let detection = match guard.detect() {
                Ok(detection) => detection,
                Err(e) => {
                    tracing::warn!("detection tick failed: {}", e);
                    None
                }
            };

            let verdict = evaluate(detection.as_ref(), &self.quality);
            on_tick(&TickFeedback::new(verdict, detection.as_ref()));

            if let (QualityVerdict::Accepted, Some(detection)) = (verdict, detection) {
                tracing::debug!(
                    score = detection.score,
                    width = detection.bounding_box.width,
                    height = detection.bounding_box.height,
                    "detection accepted"
                );

                // Scanning has stopped; honor cancellation one last time
                // before anything leaves the process.
                if token.is_cancelled() {
                    self.state = SessionState::Idle;
                    return Ok(SessionOutcome::Cancelled);
                }

                self.state = SessionState::Submitting;
                let outcome = self.submit(&detection.embedding);
                self.state = SessionState::Complete(outcome.clone());
                return Ok(outcome);
            }

            sleep_with_cancel(token, self.tick_interval);
        }
    }

    fn submit(&self, embedding: &Embedding) -> SessionOutcome {
        match &self.mode {
            Mode::Register { student_id } => {
                match self.api.register_face(student_id, embedding) {
                    Ok(()) => SessionOutcome::Registered,
                    Err(e) => {
                        tracing::error!("face registration failed: {}", e);
                        SessionOutcome::Failed(e.to_string())
                    }
                }
            }
            Mode::Verify { group_id } => {
                match self.api.search_face(group_id, embedding, self.top_k) {
                    Ok(Some(student)) => {
                        // Attendance is only attempted for a confirmed
                        // identity, and its failure does not undo the match.
                        let attendance = match self.api.register_attendance(&student) {
                            Ok(true) => AttendanceStatus::Registered,
                            Ok(false) => AttendanceStatus::Rejected,
                            Err(e) => {
                                tracing::error!("attendance registration failed: {}", e);
                                AttendanceStatus::Failed
                            }
                        };
                        SessionOutcome::Recognized {
                            student,
                            attendance,
                        }
                    }
                    Ok(None) => SessionOutcome::NotRecognized,
                    Err(e) => {
                        tracing::error!("face search failed: {}", e);
                        SessionOutcome::Failed(e.to_string())
                    }
                }
            }
        }
    }
}

// Sleeps in short slices so a cancel is observed promptly instead of after
// a full tick interval.
fn sleep_with_cancel(token: &CancelToken, duration: Duration) {
    const SLICE: Duration = Duration::from_millis(25);
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        if token.is_cancelled() {
            return;
        }
        std::thread::sleep(SLICE.min(deadline.saturating_duration_since(Instant::now())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn student_record_parses_server_field_names() {
        let json = r#"{
            "id": 7,
            "nombre": "Ana",
            "apellidos": "Lopez Garcia",
            "correo": "ana@example.com",
            "especialidad": "Programacion",
            "grado": "3",
            "grupo": "B"
        }"#;
        let student: StudentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(student.id, 7);
        assert_eq!(student.first_name, "Ana");
        assert_eq!(student.last_name, "Lopez Garcia");
        assert_eq!(student.full_name(), "Ana Lopez Garcia");
        assert_eq!(student.area, "Programacion");
        assert_eq!(student.grade, "3");
        assert_eq!(student.group, "B");
    }

    #[test]
    fn tick_feedback_zeroes_fields_without_detection() {
        let feedback = TickFeedback::new(QualityVerdict::NoFaceFound, None);
        assert_eq!(feedback.score, 0.0);
        assert_eq!(feedback.face_width, 0.0);
        assert_eq!(feedback.face_height, 0.0);
    }
}
