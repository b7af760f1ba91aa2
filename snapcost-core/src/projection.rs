use crate::{
    MonthlyCostEntry, Projection, ResourceRequest, Result, Schedule, ScheduleCatalog,
    SnapcostError, TierPlan, round_currency,
};
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Number of calendar months in every projection.
pub const HORIZON_MONTHS: u32 = 12;

/// Where a projection starts and how its schedule is anchored.
///
/// The horizon always begins at 00:00 UTC on the first day of a month. Backups
/// are taken at `anchor + k × interval` for every integer `k`, so the series
/// extends before the horizon as well as through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionOptions {
    horizon_start: NaiveDate,
    anchor: Option<NaiveDateTime>,
}

impl ProjectionOptions {
    /// Horizon beginning with the first full calendar month after `today`.
    pub fn following(today: NaiveDate) -> Result<Self> {
        let start = first_of_month(today)
            .checked_add_months(Months::new(1))
            .ok_or_else(|| SnapcostError::DateOutOfRange(format!("month after {today}")))?;
        Ok(Self::starting(start))
    }

    /// Horizon beginning with the month that contains `date`.
    pub fn starting(date: NaiveDate) -> Self {
        Self {
            horizon_start: first_of_month(date),
            anchor: None,
        }
    }

    pub fn with_anchor(mut self, anchor: NaiveDateTime) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn horizon_start(&self) -> NaiveDate {
        self.horizon_start
    }

    /// Explicit anchor, or midnight on the horizon start.
    pub fn anchor(&self) -> NaiveDateTime {
        self.anchor
            .unwrap_or_else(|| self.horizon_start.and_time(NaiveTime::MIN))
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[derive(Debug, Clone, Copy)]
struct MonthWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl MonthWindow {
    fn seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    fn overlaps(&self, from: NaiveDateTime, to: NaiveDateTime) -> bool {
        from < self.end && to > self.start
    }

    fn overlap_seconds(&self, from: NaiveDateTime, to: NaiveDateTime) -> i64 {
        (to.min(self.end) - from.max(self.start))
            .num_seconds()
            .max(0)
    }
}

fn month_windows(horizon_start: NaiveDate) -> Result<Vec<MonthWindow>> {
    let start = horizon_start.and_time(NaiveTime::MIN);
    (0..HORIZON_MONTHS)
        .map(|offset| {
            let window_start = start.checked_add_months(Months::new(offset));
            let window_end = start.checked_add_months(Months::new(offset + 1));
            match (window_start, window_end) {
                (Some(start), Some(end)) => Ok(MonthWindow { start, end }),
                _ => Err(SnapcostError::DateOutOfRange(format!(
                    "month {} after {horizon_start}",
                    offset + 1
                ))),
            }
        })
        .collect()
}

/// Per-month totals gathered while walking the backup series.
#[derive(Debug, Clone, Copy, Default)]
struct MonthAccrual {
    /// Σ seconds-in-tier × tier rate over every backup alive in the month.
    rate_seconds: Decimal,
    live_backups: u32,
    new_backups: u32,
}

/// Walks every backup alive at some point in the horizon and accrues, per
/// month, the time each one spends warm and cold.
fn simulate(
    plan: &TierPlan,
    anchor: NaiveDateTime,
    windows: &[MonthWindow],
) -> Result<Vec<MonthAccrual>> {
    let mut accruals = vec![MonthAccrual::default(); windows.len()];
    let (Some(first), Some(last)) = (windows.first(), windows.last()) else {
        return Ok(accruals);
    };
    let (horizon_start, horizon_end) = (first.start, last.end);

    let schedule = &plan.schedule;
    let earliest = schedule.retention.before(horizon_start)?;
    let mut k = schedule.interval.steps_between(anchor, earliest) - 1;

    loop {
        let taken = schedule.interval.add_times(anchor, k).ok_or_else(|| {
            SnapcostError::DateOutOfRange(format!("backup {k} of schedule '{}'", schedule.name))
        })?;
        if taken >= horizon_end {
            break;
        }
        k += 1;

        let expires = schedule.retention.after(taken)?;
        if expires <= horizon_start {
            continue;
        }

        let cold_from = match plan.cold {
            Some(cold) => Some(cold.after.after(taken)?.min(expires)),
            None => None,
        };
        let warm_until = cold_from.unwrap_or(expires);

        for (window, accrual) in windows.iter().zip(accruals.iter_mut()) {
            if !window.overlaps(taken, expires) {
                continue;
            }
            accrual.live_backups += 1;
            if taken >= window.start {
                accrual.new_backups += 1;
            }

            let warm_seconds = window.overlap_seconds(taken, warm_until);
            accrual.rate_seconds = accrue(accrual.rate_seconds, warm_seconds, plan.warm_rate)
                .ok_or_else(|| too_expensive(schedule))?;

            if let (Some(cold), Some(cold_from)) = (plan.cold, cold_from) {
                let cold_seconds = window.overlap_seconds(cold_from, expires);
                accrual.rate_seconds = accrue(accrual.rate_seconds, cold_seconds, cold.rate)
                    .ok_or_else(|| too_expensive(schedule))?;
            }
        }
    }

    Ok(accruals)
}

fn accrue(total: Decimal, seconds: i64, rate: Decimal) -> Option<Decimal> {
    Decimal::from(seconds)
        .checked_mul(rate)
        .and_then(|cost| total.checked_add(cost))
}

fn too_expensive(schedule: &Schedule) -> SnapcostError {
    SnapcostError::ConfigError(format!(
        "Prices are too large to project schedule '{}'",
        schedule.name
    ))
}

/// Projects monthly backup storage cost for resources against a shared,
/// immutable catalog. Cloning is cheap; every clone reads the same catalog.
#[derive(Debug, Clone)]
pub struct ProjectionEngine {
    catalog: Arc<ScheduleCatalog>,
}

impl ProjectionEngine {
    pub fn new(catalog: Arc<ScheduleCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ScheduleCatalog {
        &self.catalog
    }

    /// Projects the twelve months following the current UTC month.
    pub fn project(&self, request: &ResourceRequest) -> Result<Projection> {
        let options = ProjectionOptions::following(Utc::now().date_naive())?;
        self.project_with(request, &options)
    }

    pub fn project_with(
        &self,
        request: &ResourceRequest,
        options: &ProjectionOptions,
    ) -> Result<Projection> {
        let resource = self.catalog.resource_for(request)?;
        let plan = self.catalog.resolve(&resource)?;
        let windows = month_windows(options.horizon_start())?;
        let accruals = simulate(&plan, options.anchor(), &windows)?;

        let mut monthly_costs = Vec::with_capacity(windows.len());
        let mut exact_costs = Vec::with_capacity(windows.len());

        for (month, (window, accrual)) in (1..).zip(windows.iter().zip(&accruals)) {
            let exact = resource
                .size_gb
                .checked_mul(accrual.rate_seconds)
                .and_then(|weighted| weighted.checked_div(Decimal::from(window.seconds())))
                .ok_or_else(|| SnapcostError::InvalidSize {
                    value: resource.size_gb.to_string(),
                    reason: "is too large to price".to_string(),
                })?;
            let cost = round_currency(exact);

            monthly_costs.push(MonthlyCostEntry {
                month,
                period_start: window.start.date(),
                live_backups: accrual.live_backups,
                new_backups: accrual.new_backups,
                cost,
                breakdown: BTreeMap::from([(resource.schedule.clone(), cost)]),
            });
            exact_costs.push(exact);
        }

        debug!(
            "Projected {} GB {} on '{}' from {}",
            resource.size_gb,
            resource.storage_type,
            resource.schedule,
            options.horizon_start()
        );

        Ok(Projection {
            resource,
            horizon_start: options.horizon_start(),
            monthly_costs,
            exact_costs,
        })
    }
}
