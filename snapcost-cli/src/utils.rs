use rust_decimal::Decimal;
use snapcost_core::{CatalogConfig, Result, round_currency};
use std::path::{Path, PathBuf};

/// Dollar amount with two decimals, e.g. `$56.25`.
pub fn format_money(amount: Decimal) -> String {
    let rounded = round_currency(amount);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${:.2}", rounded.abs())
    } else {
        format!("${:.2}", rounded.abs())
    }
}

/// The catalog file a command reads or writes: the path given on the
/// command line, else `~/.snapcost/catalog.yaml`.
pub fn catalog_location(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => CatalogConfig::config_path(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(5625, 2)), "$56.25");
        assert_eq!(format_money(Decimal::new(285, 0)), "$285.00");
        assert_eq!(format_money(Decimal::new(12345, 4)), "$1.23");
        assert_eq!(format_money(Decimal::new(125, 3)), "$0.13");
        assert_eq!(format_money(Decimal::ZERO), "$0.00");
        assert_eq!(format_money(Decimal::new(-15, 1)), "-$1.50");
    }

    #[test]
    fn test_catalog_location() {
        let explicit = Path::new("/tmp/catalog.yaml");
        assert_eq!(catalog_location(Some(explicit)).unwrap(), explicit);

        let default = catalog_location(None).unwrap();
        assert!(default.ends_with(".snapcost/catalog.yaml"));
    }
}
