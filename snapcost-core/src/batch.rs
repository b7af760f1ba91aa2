use crate::{
    BatchOutcome, MonthlyCostEntry, Outcome, Projection, ProjectionEngine, ProjectionOptions,
    ResourceRequest, Result, SnapcostError, round_currency,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Month-by-month totals across every resource of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostSummary {
    pub resources: usize,
    pub failed: usize,
    pub horizon_start: Option<NaiveDate>,
    pub monthly_costs: Vec<MonthlyCostEntry>,
    pub total: Decimal,
}

fn outcome(index: usize, request: ResourceRequest, result: Result<Projection>) -> BatchOutcome {
    let outcome = match result {
        Ok(projection) => Outcome::Projected(projection),
        Err(e) => {
            debug!("Resource {} failed: {}", index, e);
            Outcome::Failed(e.report())
        }
    };

    BatchOutcome {
        index,
        request,
        outcome,
    }
}

impl ProjectionEngine {
    /// Projects every request independently; one failure never stops the
    /// rest. Outcomes come back in input order.
    pub fn project_batch(
        &self,
        requests: &[ResourceRequest],
        options: &ProjectionOptions,
    ) -> Vec<BatchOutcome> {
        let outcomes: Vec<BatchOutcome> = requests
            .iter()
            .enumerate()
            .map(|(index, request)| {
                outcome(index, request.clone(), self.project_with(request, options))
            })
            .collect();

        log_batch(&outcomes);
        outcomes
    }

    /// Same as [`project_batch`](Self::project_batch), with each resource
    /// projected as its own task on the blocking pool.
    pub async fn project_batch_concurrent(
        &self,
        requests: Vec<ResourceRequest>,
        options: ProjectionOptions,
    ) -> Vec<BatchOutcome> {
        let tasks: Vec<_> = requests
            .into_iter()
            .enumerate()
            .map(|(index, request)| {
                let engine = self.clone();
                let task_request = request.clone();
                let handle = tokio::task::spawn_blocking(move || {
                    engine.project_with(&task_request, &options)
                });
                (index, request, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (index, request, handle) in tasks {
            let result = handle.await.unwrap_or_else(|e| {
                Err(SnapcostError::Other(anyhow::anyhow!(
                    "projection task failed: {e}"
                )))
            });
            outcomes.push(outcome(index, request, result));
        }

        log_batch(&outcomes);
        outcomes
    }
}

fn log_batch(outcomes: &[BatchOutcome]) {
    let failed = outcomes.iter().filter(|o| o.error().is_some()).count();
    info!(
        "Projected {} resources ({} failed)",
        outcomes.len() - failed,
        failed
    );
}

struct MonthTotals {
    period_start: NaiveDate,
    live_backups: u32,
    new_backups: u32,
    by_schedule: BTreeMap<String, Decimal>,
}

/// Aggregates the successful projections of a batch. Sums are taken at full
/// precision and rounded once; the breakdown is keyed by schedule name.
pub fn summarize(outcomes: &[BatchOutcome]) -> CostSummary {
    let projections: Vec<_> = outcomes.iter().filter_map(BatchOutcome::projection).collect();

    let mut months: BTreeMap<u32, MonthTotals> = BTreeMap::new();
    for projection in &projections {
        for (entry, exact) in projection
            .monthly_costs
            .iter()
            .zip(projection.exact_costs.iter())
        {
            let month = months.entry(entry.month).or_insert_with(|| MonthTotals {
                period_start: entry.period_start,
                live_backups: 0,
                new_backups: 0,
                by_schedule: BTreeMap::new(),
            });
            month.live_backups += entry.live_backups;
            month.new_backups += entry.new_backups;
            *month
                .by_schedule
                .entry(projection.resource.schedule.clone())
                .or_insert(Decimal::ZERO) += *exact;
        }
    }

    let mut total = Decimal::ZERO;
    let monthly_costs = months
        .into_iter()
        .map(|(month, totals)| {
            let exact: Decimal = totals.by_schedule.values().copied().sum();
            total += exact;
            MonthlyCostEntry {
                month,
                period_start: totals.period_start,
                live_backups: totals.live_backups,
                new_backups: totals.new_backups,
                cost: round_currency(exact),
                breakdown: totals
                    .by_schedule
                    .into_iter()
                    .map(|(schedule, cost)| (schedule, round_currency(cost)))
                    .collect(),
            }
        })
        .collect();

    CostSummary {
        resources: outcomes.len(),
        failed: outcomes.len() - projections.len(),
        horizon_start: projections.first().map(|p| p.horizon_start),
        monthly_costs,
        total: round_currency(total),
    }
}
