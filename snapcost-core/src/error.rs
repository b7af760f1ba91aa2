use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::StorageType;

#[derive(Error, Debug)]
pub enum SnapcostError {
    #[error("Unknown storage type '{token}' (expected one of: EBS, EFS, RDS)")]
    UnknownStorageType { token: String },

    #[error("Unknown backup schedule: {name}")]
    UnknownSchedule { name: String },

    #[error("Invalid size '{value}': {reason}")]
    InvalidSize { value: String, reason: String },

    #[error(
        "Schedule '{schedule}' transitions to cold storage but {storage_type} has no cold tier"
    )]
    UnsupportedTierCombination {
        schedule: String,
        storage_type: StorageType,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SnapcostError>;

impl SnapcostError {
    /// True for the per-request failures a caller can fix by changing the
    /// resource it submitted.
    pub fn is_invalid_resource(&self) -> bool {
        matches!(
            self,
            SnapcostError::UnknownStorageType { .. }
                | SnapcostError::UnknownSchedule { .. }
                | SnapcostError::InvalidSize { .. }
                | SnapcostError::UnsupportedTierCombination { .. }
        )
    }

    /// Input field the error refers to, using the request's wire names.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            SnapcostError::UnknownStorageType { .. } => Some("type"),
            SnapcostError::UnknownSchedule { .. } => Some("job"),
            SnapcostError::InvalidSize { .. } => Some("size_gb"),
            SnapcostError::UnsupportedTierCombination { .. } => Some("job"),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SnapcostError::UnknownStorageType { .. } => ErrorKind::UnknownStorageType,
            SnapcostError::UnknownSchedule { .. } => ErrorKind::UnknownSchedule,
            SnapcostError::InvalidSize { .. } => ErrorKind::InvalidSize,
            SnapcostError::UnsupportedTierCombination { .. } => {
                ErrorKind::UnsupportedTierCombination
            }
            SnapcostError::ConfigError(_) | SnapcostError::InvalidDuration(_) => {
                ErrorKind::Configuration
            }
            _ => ErrorKind::Internal,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            field: self.field().map(str::to_string),
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownStorageType,
    UnknownSchedule,
    InvalidSize,
    UnsupportedTierCombination,
    Configuration,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::UnknownStorageType => write!(f, "unknown_storage_type"),
            ErrorKind::UnknownSchedule => write!(f, "unknown_schedule"),
            ErrorKind::InvalidSize => write!(f, "invalid_size"),
            ErrorKind::UnsupportedTierCombination => write!(f, "unsupported_tier_combination"),
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// Serializable form of a per-resource failure, as returned in batch results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}
