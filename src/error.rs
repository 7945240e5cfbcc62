use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShiftError>;

#[derive(Error, Debug)]
pub enum ShiftError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Conversion error ({rule}): {message}")]
    Conversion { rule: String, message: String },

    #[error("Unsupported target dialect: {0}")]
    UnsupportedTarget(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ShiftError {
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Why a single line could not be decomposed into a [`Rule`](crate::ir::Rule).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line is blank or a comment")]
    NotARule,

    #[error("missing action or protocol")]
    MissingHeader,

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("no parenthesized options block")]
    MissingOptions,

    #[error("no direction marker ('->' or '<>') before the options block")]
    MissingDirection,

    #[error("empty {0} address")]
    EmptyAddress(&'static str),
}
