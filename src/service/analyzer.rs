use crate::common::{AnalyzerConfig, FaceGateError, Result};
use crate::core::detection::{Detection, FaceAnalyzer, EMBEDDING_DIM};
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Client for the face-analysis sidecar that owns the camera and the
/// detection/embedding models. One `start`/`stop` pair brackets each
/// capture session.
pub struct AnalyzerClient {
    base_url: String,
    connect_retries: u32,
    http: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct DetectResponse {
    detections: Vec<WireDetection>,
}

#[derive(Deserialize)]
struct WireDetection {
    score: f32,
    #[serde(rename = "box")]
    bounding_box: WireBox,
    descriptor: Vec<f32>,
}

#[derive(Deserialize)]
struct WireBox {
    width: f32,
    height: f32,
}

fn into_detection(wire: WireDetection) -> Result<Detection> {
    if wire.descriptor.len() != EMBEDDING_DIM {
        return Err(FaceGateError::Analyzer(format!(
            "descriptor has {} values, expected {}",
            wire.descriptor.len(),
            EMBEDDING_DIM
        )));
    }

    Ok(Detection::new(
        wire.score,
        wire.bounding_box.width,
        wire.bounding_box.height,
        wire.descriptor,
    ))
}

// The sidecar reports every face it found; the capture flow only ever
// consumes the best one.
fn first_detection(response: DetectResponse) -> Result<Option<Detection>> {
    response
        .detections
        .into_iter()
        .next()
        .map(into_detection)
        .transpose()
}

impl AnalyzerClient {
    pub fn new(config: &AnalyzerConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            connect_retries: config.connect_retries.max(1),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post(&self, path: &str) -> Result<reqwest::blocking::Response> {
        let response = self.http.post(self.url(path)).send()?;
        Ok(response.error_for_status()?)
    }
}

impl FaceAnalyzer for AnalyzerClient {
    fn start(&mut self) -> Result<()> {
        for attempt in 0..self.connect_retries {
            match self.post("/capture/start") {
                Ok(_) => return Ok(()),
                Err(e) if attempt < self.connect_retries - 1 => {
                    tracing::warn!(
                        "analyzer not ready (attempt {}): {}",
                        attempt + 1,
                        e
                    );
                    std::thread::sleep(RETRY_DELAY);
                }
                Err(e) => {
                    return Err(FaceGateError::Analyzer(format!(
                        "failed to start capture after {} attempts: {}",
                        self.connect_retries, e
                    )));
                }
            }
        }
        unreachable!()
    }

    fn detect(&mut self) -> Result<Option<Detection>> {
        let response: DetectResponse = self.post("/capture/detect")?.json()?;
        first_detection(response)
    }

    fn stop(&mut self) {
        // Best effort; the camera must not keep a session hostage.
        if let Err(e) = self.post("/capture/stop") {
            tracing::warn!("failed to stop analyzer capture: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor_json(len: usize) -> String {
        let values = vec!["0.25"; len].join(",");
        format!(
            r#"{{"detections":[{{"score":0.93,"box":{{"width":210.0,"height":198.0}},"descriptor":[{}]}}]}}"#,
            values
        )
    }

    #[test]
    fn parses_first_detection() {
        let response: DetectResponse = serde_json::from_str(&descriptor_json(128)).unwrap();
        let detection = first_detection(response).unwrap().unwrap();

        assert_eq!(detection.score, 0.93);
        assert_eq!(detection.bounding_box.width, 210.0);
        assert_eq!(detection.bounding_box.height, 198.0);
        assert_eq!(detection.embedding.len(), EMBEDDING_DIM);
    }

    #[test]
    fn empty_detections_is_none() {
        let response: DetectResponse = serde_json::from_str(r#"{"detections":[]}"#).unwrap();
        assert_eq!(first_detection(response).unwrap(), None);
    }

    #[test]
    fn wrong_descriptor_length_is_rejected() {
        let response: DetectResponse = serde_json::from_str(&descriptor_json(64)).unwrap();
        assert!(first_detection(response).is_err());
    }
}
