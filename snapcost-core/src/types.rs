use crate::{BackupDuration, ErrorReport, Result, SnapcostError};
use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Decimal places of every externally visible amount.
pub const CURRENCY_DP: u32 = 2;

pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum StorageType {
    #[serde(rename = "EBS")]
    BlockStorage,
    #[serde(rename = "EFS")]
    FileStorage,
    #[serde(rename = "RDS")]
    DatabaseStorage,
}

impl StorageType {
    pub const ALL: [StorageType; 3] = [
        StorageType::BlockStorage,
        StorageType::FileStorage,
        StorageType::DatabaseStorage,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            StorageType::BlockStorage => "EBS",
            StorageType::FileStorage => "EFS",
            StorageType::DatabaseStorage => "RDS",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StorageType::BlockStorage => "Block storage volume",
            StorageType::FileStorage => "Shared file system",
            StorageType::DatabaseStorage => "Managed database storage",
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl FromStr for StorageType {
    type Err = SnapcostError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim().to_uppercase();
        StorageType::ALL
            .into_iter()
            .find(|storage_type| storage_type.token() == token)
            .ok_or_else(|| SnapcostError::UnknownStorageType {
                token: s.to_string(),
            })
    }
}

/// Cold-tier pricing for a storage type. A zero rate is a free tier;
/// `Unsupported` means the storage type cannot move backups to cold storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColdTier {
    Rate(Decimal),
    Unsupported,
}

impl From<Option<Decimal>> for ColdTier {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(ColdTier::Unsupported, ColdTier::Rate)
    }
}

impl std::fmt::Display for ColdTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColdTier::Rate(rate) => write!(f, "{rate}"),
            ColdTier::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Dollars per GB-month for each tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub warm: Decimal,
    pub cold: ColdTier,
}

impl PriceEntry {
    pub fn new(warm: Decimal, cold: Option<Decimal>) -> Self {
        Self {
            warm,
            cold: cold.into(),
        }
    }

    pub fn cold_rate(&self) -> Option<Decimal> {
        match self.cold {
            ColdTier::Rate(rate) => Some(rate),
            ColdTier::Unsupported => None,
        }
    }

    pub fn supports_cold(&self) -> bool {
        self.cold_rate().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub name: String,
    pub interval: BackupDuration,
    pub retention: BackupDuration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cold_after: Option<BackupDuration>,
}

impl Schedule {
    pub fn new(
        name: impl Into<String>,
        interval: BackupDuration,
        retention: BackupDuration,
        cold_after: Option<BackupDuration>,
    ) -> Self {
        Self {
            name: name.into(),
            interval,
            retention,
            cold_after,
        }
    }
}

/// Size as it arrives from callers: JSON numbers, or text from CSV rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeInput {
    Number(f64),
    Text(String),
}

impl SizeInput {
    pub fn to_decimal(&self) -> Result<Decimal> {
        let size = match self {
            SizeInput::Number(value) => self.number_to_decimal(*value)?,
            SizeInput::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(self.invalid("is missing"));
                }
                let parsed = Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text));
                match (parsed, text.parse::<f64>()) {
                    (Ok(size), _) if !size.is_zero() => size,
                    // Numbers beyond Decimal's range or scale get the same checks as floats
                    (_, Ok(value)) => self.number_to_decimal(value)?,
                    (Ok(size), Err(_)) => size,
                    (Err(_), Err(_)) => return Err(self.invalid("is not a number")),
                }
            }
        };

        if size <= Decimal::ZERO {
            return Err(self.invalid("must be greater than zero"));
        }
        Ok(size)
    }

    fn number_to_decimal(&self, value: f64) -> Result<Decimal> {
        if !value.is_finite() {
            return Err(self.invalid("must be a finite number"));
        }
        let size = Decimal::from_f64(value).ok_or_else(|| self.invalid("is out of range"))?;
        if value > 0.0 && size.is_zero() {
            return Err(self.invalid("is too small to represent"));
        }
        Ok(size)
    }

    fn invalid(&self, reason: &str) -> SnapcostError {
        SnapcostError::InvalidSize {
            value: self.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl std::fmt::Display for SizeInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeInput::Number(value) => write!(f, "{value}"),
            SizeInput::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<f64> for SizeInput {
    fn from(value: f64) -> Self {
        SizeInput::Number(value)
    }
}

impl From<&str> for SizeInput {
    fn from(value: &str) -> Self {
        SizeInput::Text(value.to_string())
    }
}

/// Unvalidated resource as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    #[serde(rename = "type", alias = "storage_type")]
    pub storage_type: String,
    pub size_gb: SizeInput,
    #[serde(default, alias = "schedule", skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
}

impl ResourceRequest {
    pub fn new(
        storage_type: impl Into<String>,
        size_gb: impl Into<SizeInput>,
        job: Option<&str>,
    ) -> Self {
        Self {
            storage_type: storage_type.into(),
            size_gb: size_gb.into(),
            job: job.map(str::to_string),
        }
    }

    /// Schedule name trimmed and lowercased, with blank values treated as
    /// absent.
    pub fn normalized_job(&self) -> Option<String> {
        self.job
            .as_deref()
            .map(str::trim)
            .filter(|job| !job.is_empty())
            .map(str::to_lowercase)
    }
}

/// A validated resource with its schedule resolved (default applied).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub storage_type: StorageType,
    pub size_gb: Decimal,
    pub schedule: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCostEntry {
    pub month: u32,
    pub period_start: NaiveDate,
    /// Backups alive at any point during the month.
    pub live_backups: u32,
    /// Backups taken during the month.
    pub new_backups: u32,
    pub cost: Decimal,
    pub breakdown: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub resource: Resource,
    pub horizon_start: NaiveDate,
    pub monthly_costs: Vec<MonthlyCostEntry>,
    #[serde(skip)]
    pub(crate) exact_costs: Vec<Decimal>,
}

impl Projection {
    /// Sum of the twelve months, rounded once.
    pub fn total(&self) -> Decimal {
        round_currency(self.exact_costs.iter().copied().sum())
    }

    /// Unrounded monthly costs, in month order.
    pub fn exact_costs(&self) -> &[Decimal] {
        &self.exact_costs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Projected(Projection),
    Failed(ErrorReport),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub index: usize,
    pub request: ResourceRequest,
    pub outcome: Outcome,
}

impl BatchOutcome {
    pub fn projection(&self) -> Option<&Projection> {
        match &self.outcome {
            Outcome::Projected(projection) => Some(projection),
            Outcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorReport> {
        match &self.outcome {
            Outcome::Projected(_) => None,
            Outcome::Failed(report) => Some(report),
        }
    }
}
