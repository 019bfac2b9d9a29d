use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("Database error: {0}")]
    #[diagnostic(code(estateql::database))]
    Database(#[from] sqlx::Error),

    #[error("AI provider error: {0}")]
    #[diagnostic(code(estateql::ai))]
    Ai(String),

    #[error("Missing API key. Set one of: {0}")]
    #[diagnostic(code(estateql::api_key), help("or pass --api-key"))]
    MissingApiKey(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    #[diagnostic(code(estateql::config))]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("query field is required")]
    EmptyQuery,

    #[error("blocked: {reason}")]
    #[diagnostic(code(estateql::blocked), help("only read-only property searches are allowed"))]
    Blocked { sql: String, reason: String },

    #[error("Server error: {0}")]
    Server(String),
}
