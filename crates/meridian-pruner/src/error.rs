use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrunerError {
    #[error("finality oracle did not advance past {requested} within the wait budget")]
    FinalityTimeout { requested: u64 },
}

impl PrunerError {
    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::WARN
    }

    pub fn is_retryable(&self) -> bool {
        true
    }
}

pub type Result<T> = std::result::Result<T, PrunerError>;
