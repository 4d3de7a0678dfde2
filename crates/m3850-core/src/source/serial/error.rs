use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerialSourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error ({context}): {message}")]
    Serial {
        context: &'static str,
        message: String,
    },
}
