use crate::commands::{ConfigAction, load_catalog};
use crate::output::{OutputFormat, OutputFormatter, print_info, print_success, print_warning};
use crate::utils::catalog_location;
use snapcost_core::{CatalogConfig, Result, ScheduleCatalog, SnapcostError};
use std::path::Path;

pub async fn execute(
    action: ConfigAction,
    catalog_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = match catalog_path {
                Some(path) => CatalogConfig::load_from(path)?,
                None => CatalogConfig::load()?,
            };
            println!("{}", format.format(&config));
        }
        ConfigAction::Path => {
            let path = catalog_location(catalog_path)?;
            println!("{}", path.display());
            if !path.exists() {
                print_info("No catalog file yet; the built-in catalog is used");
            }
        }
        ConfigAction::Init { force } => {
            let path = catalog_location(catalog_path)?;
            if path.exists() && !force {
                return Err(SnapcostError::ConfigError(format!(
                    "Catalog already exists at {} (use --force to overwrite)",
                    path.display()
                )));
            }

            CatalogConfig::default().save_to(&path)?;
            print_success(&format!("Wrote built-in catalog to {}", path.display()));
        }
        ConfigAction::Validate { path } => {
            let catalog = match path.as_deref() {
                Some(path) => ScheduleCatalog::from_config(CatalogConfig::load_from(path)?)?,
                None => load_catalog(catalog_path)?,
            };

            for (schedule, storage_type) in catalog.tier_conflicts() {
                print_warning(&format!(
                    "Schedule '{schedule}' moves backups to cold storage, but {storage_type} has no cold tier; they stay warm"
                ));
            }
            print_success(&format!(
                "Catalog is valid: {} schedules, {} storage types, default schedule '{}'",
                catalog.schedules().len(),
                catalog.prices().len(),
                catalog.default_schedule()
            ));
        }
    }

    Ok(())
}
