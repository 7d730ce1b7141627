use std::fs;
use std::path::Path;

use ptu_sentinel_types::models::ReservationScopeKind;
use ptu_sentinel_types::{ScanMode, SentinelConfig};

use crate::error::{AppError, AppResult};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_PATH_ENV: &str = "PTU_SENTINEL_CONFIG";

const ENV_PREFIX: &str = "PTU_SENTINEL_";

/// Load configuration: defaults, then the JSON file (if any), then
/// `PTU_SENTINEL_*` environment overrides. The result is validated.
pub fn load_config(path: Option<&Path>) -> AppResult<SentinelConfig> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => SentinelConfig::default(),
    };
    apply_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate().map_err(AppError::Config)?;
    Ok(config)
}

fn read_config_file(path: &Path) -> AppResult<SentinelConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        AppError::Config(format!("failed to parse config file {}: {}", path.display(), e))
    })
}

/// Apply overrides from a key lookup (the process environment in production).
pub fn apply_overrides<F>(config: &mut SentinelConfig, lookup: F) -> AppResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name)).filter(|v| !v.is_empty());

    if let Some(mode) = get("SCAN_MODE") {
        config.scan_mode = match mode.as_str() {
            "triggering_account" => ScanMode::TriggeringAccount,
            "subscription" => ScanMode::Subscription,
            other => {
                return Err(AppError::Config(format!(
                    "unknown scan mode '{}' (expected triggering_account or subscription)",
                    other
                )))
            },
        };
    }
    if let Some(v) = get("MAX_PARALLEL_SCANS") {
        config.max_parallel_scans = parse_number("MAX_PARALLEL_SCANS", &v)?;
    }
    if let Some(v) = get("TIMEOUT_SECS") {
        config.timeout_secs = parse_number("TIMEOUT_SECS", &v)?;
    }
    if let Some(scope) = get("RESERVATION_SCOPE") {
        config.reservation_scope = match scope.as_str() {
            "subscription" => ReservationScopeKind::Subscription,
            "tenant" => ReservationScopeKind::Tenant,
            other => {
                return Err(AppError::Config(format!("unknown reservation scope '{}'", other)))
            },
        };
    }
    // An explicitly empty filter is meaningful (keep all), so bypass `get`.
    if let Some(filter) = lookup(&format!("{}RESERVATION_SKU_FILTER", ENV_PREFIX)) {
        config.reservation_sku_filter = filter;
    }
    if let Some(endpoint) = get("ARM_ENDPOINT") {
        config.arm_endpoint = endpoint.trim_end_matches('/').to_string();
    }
    if let Some(v) = get("REQUEST_TIMEOUT_SECS") {
        config.request_timeout_secs = parse_number("REQUEST_TIMEOUT_SECS", &v)?;
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> AppResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{}{} is not a number: {}", ENV_PREFIX, name, value)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = SentinelConfig::default();
        apply_overrides(
            &mut config,
            lookup(&[
                ("PTU_SENTINEL_SCAN_MODE", "subscription"),
                ("PTU_SENTINEL_MAX_PARALLEL_SCANS", "4"),
                ("PTU_SENTINEL_RESERVATION_SCOPE", "tenant"),
                ("PTU_SENTINEL_RESERVATION_SKU_FILTER", ""),
                ("PTU_SENTINEL_ARM_ENDPOINT", "http://localhost:9000/"),
            ]),
        )
        .unwrap();

        assert_eq!(config.scan_mode, ScanMode::Subscription);
        assert_eq!(config.max_parallel_scans, 4);
        assert_eq!(config.reservation_scope, ReservationScopeKind::Tenant);
        assert_eq!(config.reservation_sku_filter, "");
        assert_eq!(config.arm_endpoint, "http://localhost:9000");
    }

    #[test]
    fn test_bad_number_is_config_error() {
        let mut config = SentinelConfig::default();
        let err = apply_overrides(&mut config, lookup(&[("PTU_SENTINEL_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"timeout_secs": 15, "max_parallel_scans": 2}}"#).unwrap();

        let config = read_config_file(file.path()).unwrap();
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.max_parallel_scans, 2);
        assert_eq!(config.arm_endpoint, "https://management.azure.com");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = read_config_file(Path::new("/nonexistent/ptu-sentinel.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
