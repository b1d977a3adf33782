use crate::common::Result;

/// Face descriptor produced by the external analysis model.
pub type Embedding = Vec<f32>;

/// Descriptor length the recognition model emits and the server indexes.
pub const EMBEDDING_DIM: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub struct FaceBox {
    pub width: f32,
    pub height: f32,
}

/// One face found in a single capture tick. Transient; never persisted on
/// this side of the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub score: f32,
    pub bounding_box: FaceBox,
    pub embedding: Embedding,
}

impl Detection {
    pub fn new(score: f32, width: f32, height: f32, embedding: Embedding) -> Self {
        Self {
            score,
            bounding_box: FaceBox { width, height },
            embedding,
        }
    }
}

/// Boundary to the external face-analysis collaborator that owns the camera
/// and the detection/embedding models.
///
/// `start` acquires the capture device and may fail; `detect` performs one
/// tick and returns the best detection of the current frame, if any; `stop`
/// releases the device and must be safe to call in any state, including
/// repeatedly.
pub trait FaceAnalyzer {
    fn start(&mut self) -> Result<()>;
    fn detect(&mut self) -> Result<Option<Detection>>;
    fn stop(&mut self);
}
