use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatuslineError {
    #[error("invalid JSON on stdin: {0}")]
    Input(#[from] serde_json::Error),

    #[error("expected a JSON object on stdin, got {0}")]
    NotAnObject(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}
