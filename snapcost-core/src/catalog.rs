use crate::{
    BackupDuration, CatalogConfig, PriceEntry, Resource, ResourceRequest, Result, Schedule,
    SnapcostError, StorageType, TierConflictPolicy,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// Upper bound on backups a single schedule may keep alive at once.
pub const MAX_LIVE_BACKUPS: i64 = 10_000;

/// Validated, immutable schedule registry and price table.
///
/// Built once at startup and shared read-only (usually behind an `Arc`).
/// Construction fails on any invalid schedule or price, so a catalog that
/// exists is always safe to project against.
#[derive(Debug, Clone)]
pub struct ScheduleCatalog {
    schedules: Vec<Schedule>,
    index: HashMap<String, usize>,
    prices: BTreeMap<StorageType, PriceEntry>,
    default_schedule: String,
    tier_conflict: TierConflictPolicy,
}

/// Cold transition that actually applies to one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColdTransition {
    pub after: BackupDuration,
    pub rate: Decimal,
}

/// Effective pricing for a (schedule, storage type) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPlan {
    pub schedule: Schedule,
    pub warm_rate: Decimal,
    pub cold: Option<ColdTransition>,
}

impl ScheduleCatalog {
    pub fn from_config(config: CatalogConfig) -> Result<Self> {
        let mut schedules = Vec::with_capacity(config.schedules.len());
        let mut index = HashMap::new();

        for mut schedule in config.schedules {
            schedule.name = schedule.name.trim().to_lowercase();
            validate_schedule(&schedule)?;

            if index.insert(schedule.name.clone(), schedules.len()).is_some() {
                return Err(SnapcostError::ConfigError(format!(
                    "Duplicate schedule name '{}'",
                    schedule.name
                )));
            }
            schedules.push(schedule);
        }

        let mut prices = BTreeMap::new();
        for (storage_type, price) in config.prices {
            if price.warm < Decimal::ZERO {
                return Err(SnapcostError::ConfigError(format!(
                    "Warm price for {storage_type} must not be negative"
                )));
            }
            if price.cold.is_some_and(|cold| cold < Decimal::ZERO) {
                return Err(SnapcostError::ConfigError(format!(
                    "Cold price for {storage_type} must not be negative"
                )));
            }
            prices.insert(storage_type, PriceEntry::new(price.warm, price.cold));
        }

        let default_schedule = config.default_schedule.trim().to_lowercase();
        if !index.contains_key(&default_schedule) {
            return Err(SnapcostError::ConfigError(format!(
                "Default schedule '{default_schedule}' is not defined"
            )));
        }

        let catalog = Self {
            schedules,
            index,
            prices,
            default_schedule,
            tier_conflict: config.tier_conflict,
        };

        let conflicts = catalog.tier_conflicts();
        if !conflicts.is_empty() {
            match catalog.tier_conflict {
                TierConflictPolicy::Reject => {
                    let pairs: Vec<String> = conflicts
                        .iter()
                        .map(|(schedule, storage_type)| format!("{schedule}/{storage_type}"))
                        .collect();
                    return Err(SnapcostError::ConfigError(format!(
                        "Schedules with a cold transition used with storage types that have no cold tier: {}",
                        pairs.join(", ")
                    )));
                }
                TierConflictPolicy::WarmOnly => {
                    for (schedule, storage_type) in &conflicts {
                        warn!(
                            "Schedule {} keeps {} backups warm: no cold tier",
                            schedule, storage_type
                        );
                    }
                }
            }
        }

        info!(
            "Loaded catalog with {} schedules and {} storage types",
            catalog.schedules.len(),
            catalog.prices.len()
        );
        Ok(catalog)
    }

    /// Swaps the tier-conflict policy without re-validating.
    #[cfg(test)]
    pub(crate) fn with_tier_conflict(mut self, policy: TierConflictPolicy) -> Self {
        self.tier_conflict = policy;
        self
    }

    /// Catalog built from the compiled-in tables.
    pub fn builtin() -> Result<Self> {
        Self::from_config(CatalogConfig::default())
    }

    pub fn lookup(&self, name: &str) -> Result<&Schedule> {
        self.index
            .get(name)
            .map(|&i| &self.schedules[i])
            .ok_or_else(|| SnapcostError::UnknownSchedule {
                name: name.to_string(),
            })
    }

    pub fn lookup_price(&self, storage_type: StorageType) -> Result<&PriceEntry> {
        self.prices
            .get(&storage_type)
            .ok_or_else(|| SnapcostError::UnknownStorageType {
                token: storage_type.to_string(),
            })
    }

    pub fn schedules(&self) -> &[Schedule] {
        &self.schedules
    }

    pub fn prices(&self) -> &BTreeMap<StorageType, PriceEntry> {
        &self.prices
    }

    pub fn default_schedule(&self) -> &str {
        &self.default_schedule
    }

    pub fn tier_conflict(&self) -> TierConflictPolicy {
        self.tier_conflict
    }

    /// (schedule, storage type) pairs where the schedule asks for a cold
    /// transition the storage type cannot provide.
    pub fn tier_conflicts(&self) -> Vec<(String, StorageType)> {
        self.schedules
            .iter()
            .filter(|schedule| schedule.cold_after.is_some())
            .flat_map(|schedule| {
                self.prices
                    .iter()
                    .filter(|(_, price)| !price.supports_cold())
                    .map(|(storage_type, _)| (schedule.name.clone(), *storage_type))
            })
            .collect()
    }

    /// Validates a raw request: storage type, size, then schedule (the
    /// default schedule when the request names none).
    pub fn resource_for(&self, request: &ResourceRequest) -> Result<Resource> {
        let storage_type: StorageType = request.storage_type.parse()?;
        self.lookup_price(storage_type)
            .map_err(|_| SnapcostError::UnknownStorageType {
                token: request.storage_type.clone(),
            })?;

        let size_gb = request.size_gb.to_decimal()?;

        let schedule = request
            .normalized_job()
            .unwrap_or_else(|| self.default_schedule.clone());
        self.lookup(&schedule)?;

        Ok(Resource {
            storage_type,
            size_gb,
            schedule,
        })
    }

    pub fn resolve(&self, resource: &Resource) -> Result<TierPlan> {
        let schedule = self.lookup(&resource.schedule)?;
        let price = self.lookup_price(resource.storage_type)?;

        let cold = match (schedule.cold_after, price.cold_rate()) {
            (Some(after), Some(rate)) => Some(ColdTransition { after, rate }),
            // Only reachable for a catalog whose policy changed after build.
            (Some(_), None) if self.tier_conflict == TierConflictPolicy::Reject => {
                return Err(SnapcostError::UnsupportedTierCombination {
                    schedule: schedule.name.clone(),
                    storage_type: resource.storage_type,
                });
            }
            _ => None,
        };

        Ok(TierPlan {
            schedule: schedule.clone(),
            warm_rate: price.warm,
            cold,
        })
    }
}

fn validate_schedule(schedule: &Schedule) -> Result<()> {
    let name = &schedule.name;
    if name.is_empty() {
        return Err(SnapcostError::ConfigError(
            "Schedule name cannot be empty".to_string(),
        ));
    }

    if !schedule.interval.is_positive() {
        return Err(SnapcostError::ConfigError(format!(
            "Schedule '{name}': interval must be greater than zero"
        )));
    }

    if !schedule.retention.is_positive() {
        return Err(SnapcostError::ConfigError(format!(
            "Schedule '{name}': retention must be greater than zero"
        )));
    }

    if let Some(cold_after) = schedule.cold_after {
        if !cold_after.is_positive() {
            return Err(SnapcostError::ConfigError(format!(
                "Schedule '{name}': cold_after must be greater than zero"
            )));
        }
        if !cold_after.always_shorter_than(&schedule.retention) {
            return Err(SnapcostError::ConfigError(format!(
                "Schedule '{name}': cold_after ({cold_after}) must be shorter than retention ({})",
                schedule.retention
            )));
        }
    }

    let (shortest_interval, _) = schedule.interval.span_bounds();
    let (_, longest_retention) = schedule.retention.span_bounds();
    if shortest_interval <= 0 {
        return Err(SnapcostError::ConfigError(format!(
            "Schedule '{name}': interval cannot be resolved to a calendar span"
        )));
    }
    if longest_retention / shortest_interval > MAX_LIVE_BACKUPS {
        return Err(SnapcostError::ConfigError(format!(
            "Schedule '{name}' keeps more than {MAX_LIVE_BACKUPS} backups alive (interval {}, retention {})",
            schedule.interval, schedule.retention
        )));
    }

    Ok(())
}
