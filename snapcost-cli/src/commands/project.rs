use crate::commands::HorizonArgs;
use crate::output::{OutputFormat, OutputFormatter, emit, print_info};
use crate::utils::format_money;
use colored::*;
use serde::Serialize;
use snapcost_core::{MonthlyCostEntry, ProjectionEngine, ResourceRequest, Result};
use tabled::Tabled;

#[derive(Serialize, Tabled)]
pub struct MonthRow {
    month: u32,
    period: String,
    live: u32,
    new: u32,
    cost: String,
}

impl From<&MonthlyCostEntry> for MonthRow {
    fn from(entry: &MonthlyCostEntry) -> Self {
        MonthRow {
            month: entry.month,
            period: entry.period_start.format("%Y-%m").to_string(),
            live: entry.live_backups,
            new: entry.new_backups,
            cost: format_money(entry.cost),
        }
    }
}

pub async fn execute(
    engine: &ProjectionEngine,
    storage_type: String,
    size: String,
    schedule: Option<String>,
    horizon: &HorizonArgs,
    format: OutputFormat,
) -> Result<()> {
    let request = ResourceRequest::new(storage_type, size.as_str(), schedule.as_deref());
    let projection = engine.project_with(&request, &horizon.options()?)?;

    if !format.is_table() {
        emit(format, &projection);
        return Ok(());
    }

    let resource = &projection.resource;
    print_info(&format!(
        "{} {} GB on schedule '{}', starting {}",
        resource.storage_type,
        resource.size_gb.normalize(),
        resource.schedule,
        projection.horizon_start.format("%Y-%m")
    ));

    let rows: Vec<MonthRow> = projection.monthly_costs.iter().map(MonthRow::from).collect();
    println!("\n{}", format.format_table(rows));
    println!(
        "\n{} {}",
        "Total:".bold(),
        format_money(projection.total()).bold()
    );

    Ok(())
}
