use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridZoomError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM provider error: {0}")]
    LlmProvider(String),

    /// The model reply could not be read as a structured decision at all.
    /// Distinct from a well-formed decision whose action is `none`.
    #[error("Decision parse error: {reason} (reply: {reply})")]
    DecisionParse { reason: String, reply: String },

    #[error("Perception error: {0}")]
    Perception(String),

    #[error("Executor error: {0}")]
    Executor(String),

    #[error("Conversation error: {0}")]
    Conversation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

pub type GridZoomResult<T> = Result<T, GridZoomError>;
