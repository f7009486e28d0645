use thiserror::Error;
use tickforge_core::{BackupError, ConfigurationError};
use tickforge_warehouse::WarehouseError;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Store(#[from] WarehouseError),

    #[error("backup failed: {0}")]
    Backup(#[from] BackupError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Store(_) => 3,
            Self::Backup(_) => 4,
            Self::Serialization(_) => 5,
            Self::Io(_) => 10,
        }
    }
}
