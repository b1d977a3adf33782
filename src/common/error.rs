use thiserror::Error;

#[derive(Error, Debug)]
pub enum FaceGateError {
    #[error("Analyzer error: {0}")]
    Analyzer(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FaceGateError>;
