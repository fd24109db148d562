use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("No keychain found at {}. Pass --path or set ONEPASSWORD_KEYCHAIN.", .0.display())]
    NotFound(PathBuf),

    #[error("Keychain is corrupted: {0}")]
    CorruptStore(String),

    #[error("Keychain config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
