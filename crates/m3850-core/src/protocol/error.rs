use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
}
