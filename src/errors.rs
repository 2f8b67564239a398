/// Domain-specific error types for the analysis engine.
/// A failed analysis pass never escapes as a panic: errors are caught at the
/// `analyze` boundary and converted into a structured failure result.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("malformed snapshot: {0}")]
    MalformedInput(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(e: serde_json::Error) -> Self {
        AnalyzerError::Parse(e.to_string())
    }
}

pub type AnalyzerResult<T> = Result<T, AnalyzerError>;
