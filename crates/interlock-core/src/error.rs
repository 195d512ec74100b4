use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Badge errors
    #[error("Invalid badge frame: {0}")]
    InvalidBadgeFrame(String),

    #[error("Invalid badge number: {0}")]
    InvalidBadgeId(String),

    #[error("Invalid tool identifier: {0}")]
    InvalidToolId(String),

    // Session errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
