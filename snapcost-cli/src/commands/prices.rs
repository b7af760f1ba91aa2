use crate::output::{OutputFormat, OutputFormatter};
use serde::Serialize;
use snapcost_core::{PriceEntry, Result, ScheduleCatalog, StorageType};
use tabled::Tabled;

#[derive(Serialize, Tabled)]
struct PriceRow {
    #[tabled(rename = "type")]
    storage_type: StorageType,
    description: &'static str,
    #[tabled(rename = "warm $/GB-month")]
    warm: String,
    #[tabled(rename = "cold $/GB-month")]
    cold: String,
}

impl PriceRow {
    fn new(storage_type: StorageType, price: &PriceEntry) -> Self {
        PriceRow {
            storage_type,
            description: storage_type.description(),
            warm: price.warm.normalize().to_string(),
            cold: match price.cold_rate() {
                Some(rate) => rate.normalize().to_string(),
                None => "-".to_string(),
            },
        }
    }
}

pub async fn execute(catalog: &ScheduleCatalog, format: OutputFormat) -> Result<()> {
    let rows: Vec<PriceRow> = catalog
        .prices()
        .iter()
        .map(|(storage_type, price)| PriceRow::new(*storage_type, price))
        .collect();
    println!("{}", format.format_table(rows));

    Ok(())
}
