//! Error types for ptwit

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PtwitError>;

#[derive(Error, Debug)]
pub enum PtwitError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PtwitError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PtwitError::InvalidInput(_) => 3,
            PtwitError::Auth(_) => 2,
            // Any failure reported by the remote API
            PtwitError::Client(_) => 2,
            PtwitError::Config(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid account name: {0}")]
    InvalidAccountName(String),

    #[error("Account name '{0}' is reserved")]
    ReservedName(String),

    #[error("Account '{0}' already exists")]
    AccountExists(String),

    #[error("Invalid option name: {0}")]
    InvalidOptionName(String),

    #[error("Config directory not found")]
    MissingConfigDir,
}

#[derive(Error, Debug, Clone)]
pub enum ClientError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),
}
