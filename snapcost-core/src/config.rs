use crate::{BackupDuration, Schedule, StorageType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_SCHEDULE: &str = "daily";

/// On-disk form of the schedule catalog and price table.
///
/// Nothing here is validated; `ScheduleCatalog::from_config` checks every
/// invariant before the values are used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub version: String,
    #[serde(default = "default_schedule_name")]
    pub default_schedule: String,
    #[serde(default)]
    pub tier_conflict: TierConflictPolicy,
    pub prices: BTreeMap<StorageType, PriceConfig>,
    pub schedules: Vec<Schedule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceConfig {
    pub warm: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cold: Option<Decimal>,
}

/// What to do when a schedule moves backups to cold storage but the storage
/// type has no cold tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierConflictPolicy {
    /// Keep such backups warm for their whole retention.
    #[default]
    WarmOnly,
    /// Refuse to build the catalog.
    Reject,
}

impl std::fmt::Display for TierConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TierConflictPolicy::WarmOnly => write!(f, "warm_only"),
            TierConflictPolicy::Reject => write!(f, "reject"),
        }
    }
}

fn default_schedule_name() -> String {
    DEFAULT_SCHEDULE.to_string()
}

impl CatalogConfig {
    /// Loads `~/.snapcost/catalog.yaml`, falling back to the built-in tables
    /// when the file does not exist.
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> crate::Result<Self> {
        serde_yaml::from_str(content).map_err(|e| crate::SnapcostError::ConfigError(e.to_string()))
    }

    pub fn save(&self) -> crate::Result<PathBuf> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(config_dir) = path.parent() {
            std::fs::create_dir_all(config_dir)?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| crate::SnapcostError::ConfigError(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_path() -> crate::Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            crate::SnapcostError::ConfigError("Cannot determine home directory".to_string())
        })?;
        Ok(home.join(".snapcost").join("catalog.yaml"))
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let mut prices = BTreeMap::new();
        prices.insert(
            StorageType::BlockStorage,
            PriceConfig {
                warm: Decimal::new(5, 2),
                cold: Some(Decimal::new(125, 4)),
            },
        );
        prices.insert(
            StorageType::FileStorage,
            PriceConfig {
                warm: Decimal::new(5, 2),
                cold: Some(Decimal::new(1, 2)),
            },
        );
        prices.insert(
            StorageType::DatabaseStorage,
            PriceConfig {
                warm: Decimal::new(95, 3),
                cold: None,
            },
        );

        Self {
            version: "1.0".to_string(),
            default_schedule: default_schedule_name(),
            tier_conflict: TierConflictPolicy::WarmOnly,
            prices,
            schedules: vec![
                Schedule::new(
                    "intraday",
                    BackupDuration::hours(4),
                    BackupDuration::days(7),
                    None,
                ),
                Schedule::new(
                    "daily",
                    BackupDuration::days(1),
                    BackupDuration::days(30),
                    Some(BackupDuration::days(5)),
                ),
                Schedule::new(
                    "weekly",
                    BackupDuration::weeks(1),
                    BackupDuration::days(90),
                    Some(BackupDuration::days(5)),
                ),
                Schedule::new(
                    "monthly_180",
                    BackupDuration::months(1),
                    BackupDuration::days(180),
                    Some(BackupDuration::days(5)),
                ),
                Schedule::new(
                    "monthly_365",
                    BackupDuration::months(1),
                    BackupDuration::days(365),
                    Some(BackupDuration::days(5)),
                ),
                Schedule::new(
                    "yearly",
                    BackupDuration::years(1),
                    BackupDuration::days(365 * 5),
                    Some(BackupDuration::days(5)),
                ),
            ],
        }
    }
}
