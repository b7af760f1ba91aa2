use crate::commands::HorizonArgs;
use crate::commands::project::MonthRow;
use crate::input::load_requests;
use crate::output::{
    OutputFormat, OutputFormatter, emit, print_info, print_warning, status_cell,
};
use crate::utils::format_money;
use colored::*;
use serde::Serialize;
use snapcost_core::{BatchOutcome, CostSummary, ProjectionEngine, Result, summarize};
use std::path::Path;
use tabled::Tabled;

#[derive(Serialize, Tabled)]
struct OutcomeRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "type")]
    storage_type: String,
    size_gb: String,
    schedule: String,
    status: String,
    #[tabled(rename = "total / error")]
    detail: String,
}

impl From<&BatchOutcome> for OutcomeRow {
    fn from(outcome: &BatchOutcome) -> Self {
        let request = &outcome.request;
        let (schedule, status, detail) = match (outcome.projection(), outcome.error()) {
            (Some(projection), _) => (
                projection.resource.schedule.clone(),
                status_cell(true, "ok"),
                format_money(projection.total()),
            ),
            (None, Some(report)) => (
                request.job.clone().unwrap_or_else(|| "-".to_string()),
                status_cell(false, "failed"),
                report.message.clone(),
            ),
            (None, None) => ("-".to_string(), "-".to_string(), String::new()),
        };

        OutcomeRow {
            index: outcome.index + 1,
            storage_type: request.storage_type.clone(),
            size_gb: request.size_gb.to_string(),
            schedule,
            status,
            detail,
        }
    }
}

#[derive(Serialize)]
struct BatchReport<'a> {
    outcomes: &'a [BatchOutcome],
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<CostSummary>,
}

pub async fn execute(
    engine: &ProjectionEngine,
    file: &Path,
    summary: bool,
    sequential: bool,
    horizon: &HorizonArgs,
    format: OutputFormat,
) -> Result<()> {
    let requests = load_requests(file)?;
    let options = horizon.options()?;

    let outcomes = if sequential {
        engine.project_batch(&requests, &options)
    } else {
        engine.project_batch_concurrent(requests, options).await
    };
    let summary = summary.then(|| summarize(&outcomes));

    if !format.is_table() {
        emit(
            format,
            BatchReport {
                outcomes: &outcomes,
                summary,
            },
        );
        return Ok(());
    }

    let rows: Vec<OutcomeRow> = outcomes.iter().map(OutcomeRow::from).collect();
    println!("\n{}", format.format_table(rows));

    let failed = outcomes.iter().filter(|o| o.error().is_some()).count();
    if failed > 0 {
        print_warning(&format!(
            "{} of {} resources could not be projected",
            failed,
            outcomes.len()
        ));
    }

    if let Some(summary) = summary {
        print_info(&format!(
            "Totals across {} resources",
            summary.resources - summary.failed
        ));
        let rows: Vec<MonthRow> = summary.monthly_costs.iter().map(MonthRow::from).collect();
        println!("\n{}", format.format_table(rows));
        println!(
            "\n{} {}",
            "Total:".bold(),
            format_money(summary.total).bold()
        );
    }

    Ok(())
}
