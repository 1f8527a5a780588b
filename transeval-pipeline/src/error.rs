/// Only the Translator and Repairer stages ever construct this type (§7):
/// StateBuilder, Verifier, and Judge recover from an LLM failure internally
/// and never surface it.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] transeval_model::GatewayError),
}

pub type Result<T> = std::result::Result<T, StageError>;
