use crate::output::{OutputFormat, OutputFormatter};
use serde::Serialize;
use snapcost_core::{Result, Schedule, ScheduleCatalog};
use tabled::Tabled;

#[derive(Serialize, Tabled)]
struct ScheduleRow {
    name: String,
    interval: String,
    retention: String,
    cold_after: String,
    default: String,
}

impl ScheduleRow {
    fn new(schedule: &Schedule, default_schedule: &str) -> Self {
        ScheduleRow {
            name: schedule.name.clone(),
            interval: schedule.interval.to_string(),
            retention: schedule.retention.to_string(),
            cold_after: schedule
                .cold_after
                .map_or_else(|| "-".to_string(), |after| after.to_string()),
            default: if schedule.name == default_schedule {
                "*".to_string()
            } else {
                String::new()
            },
        }
    }
}

pub async fn execute(catalog: &ScheduleCatalog, format: OutputFormat) -> Result<()> {
    if !format.is_table() {
        println!("{}", format.format(catalog.schedules()));
        return Ok(());
    }

    let rows: Vec<ScheduleRow> = catalog
        .schedules()
        .iter()
        .map(|schedule| ScheduleRow::new(schedule, catalog.default_schedule()))
        .collect();
    println!("{}", format.format_table(rows));

    Ok(())
}
