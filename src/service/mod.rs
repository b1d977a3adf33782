pub mod analyzer;
pub mod client;

pub use analyzer::AnalyzerClient;
pub use client::ApiClient;
