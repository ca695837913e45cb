use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot detect source format: {0}")]
    Detect(String),

    #[error(transparent)]
    Core(#[from] lazypipe_core::Error),
}

/// Failures raised while a sequence is being pulled surface as `Source` errors.
impl From<Error> for lazypipe_core::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Core(inner) => inner,
            other => lazypipe_core::Error::Source(other.to_string()),
        }
    }
}
