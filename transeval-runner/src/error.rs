/// Runner-level error kinds (§7). `Validation` is the typed start-error the
/// experiment driver returns when a precondition in §4.11 fails; it carries
/// an HTTP-style status hint and never mutates experiment state.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("validation error ({status_hint}): {message}")]
    Validation { status_hint: u16, message: String },

    #[error("sink error: {0}")]
    Sink(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<transeval_core::CoreError> for RunnerError {
    fn from(e: transeval_core::CoreError) -> Self {
        RunnerError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RunnerError>;
