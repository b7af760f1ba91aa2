use crate::{
    BackupDuration, CatalogConfig, ColdTier, ErrorKind, PriceConfig, ResourceRequest, Result,
    Schedule, ScheduleCatalog, SizeInput, SnapcostError, StorageType, TierConflictPolicy,
};
use rust_decimal::Decimal;

fn config_with(schedule: Schedule) -> CatalogConfig {
    let mut config = CatalogConfig::default();
    config.schedules.push(schedule);
    config
}

fn assert_config_error(config: CatalogConfig, needle: &str) {
    match ScheduleCatalog::from_config(config) {
        Err(SnapcostError::ConfigError(message)) => assert!(
            message.contains(needle),
            "expected '{needle}' in '{message}'"
        ),
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn test_builtin_catalog() -> Result<()> {
    let catalog = ScheduleCatalog::builtin()?;

    let names: Vec<&str> = catalog.schedules().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        ["intraday", "daily", "weekly", "monthly_180", "monthly_365", "yearly"]
    );
    assert_eq!(catalog.default_schedule(), "daily");
    assert_eq!(catalog.tier_conflict(), TierConflictPolicy::WarmOnly);

    let daily = catalog.lookup("daily")?;
    assert_eq!(daily.interval, BackupDuration::days(1));
    assert_eq!(daily.retention, BackupDuration::days(30));
    assert_eq!(daily.cold_after, Some(BackupDuration::days(5)));

    let ebs = catalog.lookup_price(StorageType::BlockStorage)?;
    assert_eq!(ebs.warm, Decimal::new(5, 2));
    assert_eq!(ebs.cold, ColdTier::Rate(Decimal::new(125, 4)));

    let rds = catalog.lookup_price(StorageType::DatabaseStorage)?;
    assert_eq!(rds.cold, ColdTier::Unsupported);
    assert!(!rds.supports_cold());

    Ok(())
}

#[test]
fn test_lookup_is_exact() -> Result<()> {
    let catalog = ScheduleCatalog::builtin()?;

    assert!(catalog.lookup("weekly").is_ok());
    assert!(matches!(
        catalog.lookup("Weekly"),
        Err(SnapcostError::UnknownSchedule { .. })
    ));
    assert!(matches!(
        catalog.lookup("fortnightly"),
        Err(SnapcostError::UnknownSchedule { .. })
    ));

    Ok(())
}

#[test]
fn test_resource_for_normalizes_input() -> Result<()> {
    let catalog = ScheduleCatalog::builtin()?;

    let resource = catalog.resource_for(&ResourceRequest::new(" ebs ", 100.0, Some(" Weekly ")))?;
    assert_eq!(resource.storage_type, StorageType::BlockStorage);
    assert_eq!(resource.size_gb, Decimal::from(100));
    assert_eq!(resource.schedule, "weekly");

    let defaulted = catalog.resource_for(&ResourceRequest::new("EFS", "2.5", None))?;
    assert_eq!(defaulted.schedule, "daily");
    assert_eq!(defaulted.size_gb, Decimal::new(25, 1));

    let blank_job = catalog.resource_for(&ResourceRequest::new("RDS", 10.0, Some("  ")))?;
    assert_eq!(blank_job.schedule, "daily");

    Ok(())
}

#[test]
fn test_resource_for_reports_the_bad_field() -> Result<()> {
    let catalog = ScheduleCatalog::builtin()?;

    let cases = [
        (ResourceRequest::new("S3", 10.0, None), ErrorKind::UnknownStorageType, "type"),
        (ResourceRequest::new("EBS", 0.0, None), ErrorKind::InvalidSize, "size_gb"),
        (ResourceRequest::new("EBS", -4.0, None), ErrorKind::InvalidSize, "size_gb"),
        (ResourceRequest::new("EBS", f64::NAN, None), ErrorKind::InvalidSize, "size_gb"),
        (ResourceRequest::new("EBS", "lots", None), ErrorKind::InvalidSize, "size_gb"),
        (ResourceRequest::new("EBS", "", None), ErrorKind::InvalidSize, "size_gb"),
        (
            ResourceRequest::new("EBS", 10.0, Some("hourly")),
            ErrorKind::UnknownSchedule,
            "job",
        ),
    ];

    for (request, kind, field) in cases {
        let err = catalog.resource_for(&request).unwrap_err();
        assert!(err.is_invalid_resource(), "{err} should be a resource error");
        assert_eq!(err.kind(), kind, "{request:?}");
        assert_eq!(err.field(), Some(field));
    }

    Ok(())
}

#[test]
fn test_size_accepts_text_forms() -> Result<()> {
    let catalog = ScheduleCatalog::builtin()?;

    let plain = catalog.resource_for(&ResourceRequest::new("EBS", " 250 ", None))?;
    assert_eq!(plain.size_gb, Decimal::from(250));

    let scientific = catalog.resource_for(&ResourceRequest::new("EBS", "1e3", None))?;
    assert_eq!(scientific.size_gb, Decimal::from(1000));

    Ok(())
}

fn size_reason(size: SizeInput) -> String {
    match size.to_decimal() {
        Err(SnapcostError::InvalidSize { reason, .. }) => reason,
        other => panic!("expected an invalid size, got {other:?}"),
    }
}

#[test]
fn test_size_rejections_agree_across_forms() {
    assert_eq!(size_reason(SizeInput::Number(1e-30)), "is too small to represent");
    assert_eq!(size_reason("1e-30".into()), "is too small to represent");
    assert_eq!(size_reason(SizeInput::Number(0.0)), "must be greater than zero");
    assert_eq!(size_reason("0".into()), "must be greater than zero");
    assert_eq!(size_reason(SizeInput::Number(-1e-30)), "must be greater than zero");
    assert_eq!(size_reason("-2".into()), "must be greater than zero");
    assert_eq!(size_reason(SizeInput::Number(f64::NAN)), "must be a finite number");
    assert_eq!(size_reason("ten".into()), "is not a number");
    assert_eq!(size_reason("  ".into()), "is missing");
}

#[test]
fn test_resolve_warm_only_for_storage_without_cold_tier() -> Result<()> {
    let catalog = ScheduleCatalog::builtin()?;

    let rds = catalog.resource_for(&ResourceRequest::new("RDS", 50.0, Some("daily")))?;
    let plan = catalog.resolve(&rds)?;
    assert_eq!(plan.warm_rate, Decimal::new(95, 3));
    assert_eq!(plan.cold, None);

    let ebs = catalog.resource_for(&ResourceRequest::new("EBS", 50.0, Some("daily")))?;
    let plan = catalog.resolve(&ebs)?;
    let cold = plan.cold.expect("EBS supports cold storage");
    assert_eq!(cold.after, BackupDuration::days(5));
    assert_eq!(cold.rate, Decimal::new(125, 4));

    let intraday = catalog.resource_for(&ResourceRequest::new("EBS", 50.0, Some("intraday")))?;
    assert_eq!(catalog.resolve(&intraday)?.cold, None);

    Ok(())
}

#[test]
fn test_tier_conflicts_listed() -> Result<()> {
    let catalog = ScheduleCatalog::builtin()?;

    let conflicts = catalog.tier_conflicts();
    // Every schedule except intraday has a cold transition, RDS has no cold tier.
    assert_eq!(conflicts.len(), 5);
    assert!(conflicts
        .iter()
        .all(|(_, storage_type)| *storage_type == StorageType::DatabaseStorage));
    assert!(!conflicts.iter().any(|(name, _)| name == "intraday"));

    Ok(())
}

#[test]
fn test_reject_policy_fails_at_build() {
    let mut config = CatalogConfig::default();
    config.tier_conflict = TierConflictPolicy::Reject;

    assert_config_error(config, "daily/RDS");
}

#[test]
fn test_reject_policy_without_conflicts() -> Result<()> {
    let mut config = CatalogConfig::default();
    config.tier_conflict = TierConflictPolicy::Reject;
    config.prices.remove(&StorageType::DatabaseStorage);

    let catalog = ScheduleCatalog::from_config(config)?;

    let err = catalog
        .resource_for(&ResourceRequest::new("rds", 10.0, None))
        .unwrap_err();
    assert!(matches!(err, SnapcostError::UnknownStorageType { ref token } if token == "rds"));

    Ok(())
}

#[test]
fn test_resolve_rejects_cold_transition_without_cold_tier() -> Result<()> {
    let catalog = ScheduleCatalog::builtin()?.with_tier_conflict(TierConflictPolicy::Reject);

    let rds = catalog.resource_for(&ResourceRequest::new("RDS", 10.0, Some("daily")))?;
    let err = catalog.resolve(&rds).unwrap_err();
    assert!(matches!(
        err,
        SnapcostError::UnsupportedTierCombination { ref schedule, storage_type }
            if schedule == "daily" && storage_type == StorageType::DatabaseStorage
    ));
    assert_eq!(err.kind(), ErrorKind::UnsupportedTierCombination);
    assert_eq!(err.field(), Some("job"));

    // Schedules without a cold transition still resolve.
    let intraday = catalog.resource_for(&ResourceRequest::new("RDS", 10.0, Some("intraday")))?;
    assert_eq!(catalog.resolve(&intraday)?.cold, None);

    Ok(())
}

#[test]
fn test_zero_cold_price_is_a_real_tier() -> Result<()> {
    let mut config = CatalogConfig::default();
    config.prices.insert(
        StorageType::DatabaseStorage,
        PriceConfig {
            warm: Decimal::new(95, 3),
            cold: Some(Decimal::ZERO),
        },
    );
    let catalog = ScheduleCatalog::from_config(config)?;

    let rds = catalog.resource_for(&ResourceRequest::new("RDS", 10.0, Some("daily")))?;
    let cold = catalog.resolve(&rds)?.cold.expect("zero-priced cold tier");
    assert_eq!(cold.rate, Decimal::ZERO);
    assert!(catalog.tier_conflicts().is_empty());

    Ok(())
}

#[test]
fn test_invalid_schedules_rejected() {
    assert_config_error(
        config_with(Schedule::new(
            "late_cold",
            BackupDuration::days(1),
            BackupDuration::days(30),
            Some(BackupDuration::days(30)),
        )),
        "cold_after (30d) must be shorter than retention (30d)",
    );

    assert_config_error(
        config_with(Schedule::new(
            "calendar_cold",
            BackupDuration::days(1),
            BackupDuration::days(30),
            Some(BackupDuration::months(1)),
        )),
        "must be shorter than retention",
    );

    assert_config_error(
        config_with(Schedule::new(
            "stalled",
            BackupDuration::seconds(0),
            BackupDuration::days(30),
            None,
        )),
        "interval must be greater than zero",
    );

    assert_config_error(
        config_with(Schedule::new(
            "forgetful",
            BackupDuration::days(1),
            BackupDuration::months(0),
            None,
        )),
        "retention must be greater than zero",
    );

    assert_config_error(
        config_with(Schedule::new(
            "chatty",
            BackupDuration::minutes(1),
            BackupDuration::days(7),
            None,
        )),
        "backups alive",
    );

    assert_config_error(
        config_with(Schedule::new(
            " Daily ",
            BackupDuration::days(1),
            BackupDuration::days(7),
            None,
        )),
        "Duplicate schedule name 'daily'",
    );

    assert_config_error(
        config_with(Schedule::new(
            "   ",
            BackupDuration::days(1),
            BackupDuration::days(7),
            None,
        )),
        "cannot be empty",
    );
}

#[test]
fn test_invalid_catalog_settings_rejected() {
    let mut config = CatalogConfig::default();
    config.default_schedule = "hourly".to_string();
    assert_config_error(config, "Default schedule 'hourly' is not defined");

    let mut config = CatalogConfig::default();
    config.prices.insert(
        StorageType::FileStorage,
        PriceConfig {
            warm: Decimal::new(-1, 2),
            cold: None,
        },
    );
    assert_config_error(config, "Warm price for EFS");

    let mut config = CatalogConfig::default();
    config.prices.insert(
        StorageType::FileStorage,
        PriceConfig {
            warm: Decimal::new(5, 2),
            cold: Some(Decimal::new(-1, 2)),
        },
    );
    assert_config_error(config, "Cold price for EFS");
}

#[test]
fn test_catalog_from_yaml() -> Result<()> {
    let yaml = r#"
version: "1.0"
default_schedule: nightly
tier_conflict: reject
prices:
  EBS: { warm: "0.08", cold: "0.02" }
  EFS: { warm: "0.30" }
schedules:
  - { name: nightly, interval: 1d, retention: 14d }
  - { name: Monthly, interval: 1mo, retention: 1y, cold_after: 7d }
"#;

    let config = CatalogConfig::from_yaml(yaml);
    // monthly has a cold transition and EFS has no cold tier
    assert!(matches!(
        ScheduleCatalog::from_config(config?),
        Err(SnapcostError::ConfigError(_))
    ));

    let relaxed = yaml.replace("tier_conflict: reject", "tier_conflict: warm_only");
    let catalog = ScheduleCatalog::from_config(CatalogConfig::from_yaml(&relaxed)?)?;
    assert_eq!(catalog.default_schedule(), "nightly");
    assert_eq!(catalog.lookup("monthly")?.retention, BackupDuration::months(12));
    assert!(catalog.lookup_price(StorageType::DatabaseStorage).is_err());

    Ok(())
}

#[test]
fn test_catalog_yaml_errors_are_config_errors() {
    let result = CatalogConfig::from_yaml("version: \"1.0\"\nprices: {}\nschedules:\n  - { name: x, interval: soon, retention: 1d }\n");
    assert!(matches!(result, Err(SnapcostError::ConfigError(_))));
}

#[test]
fn test_config_save_and_load() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("catalog.yaml");

    let config = CatalogConfig::default();
    config.save_to(&path)?;

    let loaded = CatalogConfig::load_from(&path)?;
    assert_eq!(loaded, config);
    ScheduleCatalog::from_config(loaded)?;

    Ok(())
}
