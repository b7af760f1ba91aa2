mod batch;
mod config;
mod prices;
mod project;
mod schedules;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use clap::{Args, Subcommand};
use snapcost_core::{CatalogConfig, ProjectionEngine, ProjectionOptions, Result, ScheduleCatalog};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::output::OutputFormat;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Project twelve months of backup cost for one resource
    Project {
        /// Storage type (EBS, EFS, RDS)
        #[arg(short = 't', long = "type")]
        storage_type: String,

        /// Size in GB
        #[arg(short, long)]
        size: String,

        /// Backup schedule (defaults to the catalog's default schedule)
        #[arg(short = 'j', long, alias = "job")]
        schedule: Option<String>,

        #[command(flatten)]
        horizon: HorizonArgs,
    },

    /// Project every resource listed in a CSV, JSON or YAML file
    Batch {
        /// Resource file
        file: PathBuf,

        /// Also print month-by-month totals across all resources
        #[arg(long)]
        summary: bool,

        /// Project resources one after another instead of concurrently
        #[arg(long)]
        sequential: bool,

        #[command(flatten)]
        horizon: HorizonArgs,
    },

    /// List the backup schedules in the catalog
    Schedules,

    /// List warm and cold storage prices
    Prices,

    /// Manage the catalog file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the catalog in effect
    Show,

    /// Print the default catalog location
    Path,

    /// Write the built-in catalog to the default location
    Init {
        /// Overwrite an existing catalog
        #[arg(short, long)]
        force: bool,
    },

    /// Check a catalog file without projecting anything
    Validate {
        /// Catalog to check (defaults to the catalog in effect)
        path: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct HorizonArgs {
    /// First month of the horizon (YYYY-MM-DD, moved to the 1st); defaults to next month
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Instant the schedule's backup series is aligned to (YYYY-MM-DDTHH:MM:SS)
    #[arg(long)]
    pub anchor: Option<NaiveDateTime>,
}

impl HorizonArgs {
    pub fn options(&self) -> Result<ProjectionOptions> {
        let options = match self.start {
            Some(start) => ProjectionOptions::starting(start),
            None => ProjectionOptions::following(Utc::now().date_naive())?,
        };

        Ok(match self.anchor {
            Some(anchor) => options.with_anchor(anchor),
            None => options,
        })
    }
}

/// Loads the catalog named on the command line, or the user's catalog, or
/// the built-in one.
pub fn load_catalog(path: Option<&Path>) -> Result<ScheduleCatalog> {
    let config = match path {
        Some(path) => {
            debug!("Loading catalog from {}", path.display());
            CatalogConfig::load_from(path)?
        }
        None => CatalogConfig::load()?,
    };
    ScheduleCatalog::from_config(config)
}

pub fn load_engine(path: Option<&Path>) -> Result<ProjectionEngine> {
    Ok(ProjectionEngine::new(Arc::new(load_catalog(path)?)))
}

pub async fn execute(
    command: Command,
    catalog_path: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let catalog_path = catalog_path.as_deref();

    match command {
        Command::Project {
            storage_type,
            size,
            schedule,
            horizon,
        } => {
            let engine = load_engine(catalog_path)?;
            project::execute(&engine, storage_type, size, schedule, &horizon, format).await
        }
        Command::Batch {
            file,
            summary,
            sequential,
            horizon,
        } => {
            let engine = load_engine(catalog_path)?;
            batch::execute(&engine, &file, summary, sequential, &horizon, format).await
        }
        Command::Schedules => schedules::execute(&load_catalog(catalog_path)?, format).await,
        Command::Prices => prices::execute(&load_catalog(catalog_path)?, format).await,
        Command::Config { action } => config::execute(action, catalog_path, format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_start_is_moved_to_first_of_month() {
        let args = HorizonArgs {
            start: NaiveDate::from_ymd_opt(2025, 3, 17),
            anchor: None,
        };

        let options = args.options().unwrap();
        assert_eq!(
            options.horizon_start(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_horizon_defaults_to_next_month() {
        let options = HorizonArgs::default().options().unwrap();
        assert!(options.horizon_start() > Utc::now().date_naive());
    }

    #[test]
    fn test_missing_catalog_path_fails() {
        let result = load_engine(Some(Path::new("/nonexistent/catalog.yaml")));
        assert!(result.is_err());
    }
}
