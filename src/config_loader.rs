use crate::config::Config;
use crate::error::Diagnostic;
use crate::pool::PoolRegistry;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and parse a pool configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading pool configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| {
            format!("Failed to open pool configuration '{}'", config_path.display())
        })?;

    let config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| {
            format!("Failed to parse pool configuration '{}'", config_path.display())
        })?;

    info!("Found {} pool definitions", config.pools.len());

    Ok(config)
}

/// CLI arguments that can override YAML settings
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_catalog_size: Option<usize>,
}

/// Apply CLI overrides to a loaded configuration
pub fn apply_overrides(config: &mut Config, overrides: &ConfigOverrides) {
    if let Some(limit) = overrides.max_catalog_size {
        info!("Overriding maximum catalog size: {}", limit);
        config.max_catalog_size = Some(limit);
    }
}

/// Validate a configuration into a pool registry, logging the diagnostic on
/// failure
pub fn build_registry(config: &Config) -> Result<PoolRegistry> {
    config.validate().map_err(|error| {
        log::error!("{}", Diagnostic::from(&error));
        color_eyre::Report::new(error).wrap_err("Invalid pool configuration")
    })
}

/// Load, override and validate in one step
pub fn load_registry(config_path: &Path, overrides: &ConfigOverrides) -> Result<PoolRegistry> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, overrides);
    build_registry(&config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID: &str = r#"
pools:
  - name: "POOL1"
    prefix_length: 24
    gateway: "10.1.1.254"
    ranges:
      - from_ip: "10.1.1.1"
        to_ip: "10.1.1.10"
"#;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_load_config() {
        let temp_file = write_temp(VALID);
        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.pools.len(), 1);
        assert_eq!(config.pools[0].name, "POOL1");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_config(Path::new("/nonexistent/pools.yaml")).is_err());
    }

    #[test]
    fn test_load_malformed_yaml() {
        let temp_file = write_temp("pools: [ {name: ");
        assert!(load_config(temp_file.path()).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config: Config = serde_yaml::from_str(VALID).unwrap();

        apply_overrides(&mut config, &ConfigOverrides::default());
        assert_eq!(config.max_catalog_size, None);

        apply_overrides(&mut config, &ConfigOverrides { max_catalog_size: Some(5) });
        assert_eq!(config.max_catalog_size, Some(5));
    }

    #[test]
    fn test_load_registry() {
        let temp_file = write_temp(VALID);
        let registry = load_registry(temp_file.path(), &ConfigOverrides::default()).unwrap();
        assert_eq!(registry.catalog("POOL1").unwrap().len(), 10);
    }

    #[test]
    fn test_load_registry_override_can_reject_pool() {
        let temp_file = write_temp(VALID);
        let error = load_registry(temp_file.path(), &ConfigOverrides { max_catalog_size: Some(5) })
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ValidationError>(),
            Some(ValidationError::RangeTooLarge { limit: 5, .. })
        ));
    }

    #[test]
    fn test_build_registry_keeps_validation_error() {
        let config: Config = serde_yaml::from_str(
            r#"
pools:
  - name: "POOL1"
    prefix_length: 24
    gateway: "not-an-ip"
"#,
        )
        .unwrap();

        let error = build_registry(&config).unwrap_err();
        assert_eq!(
            error.downcast_ref::<ValidationError>(),
            Some(&ValidationError::InvalidAddress {
                field: "gateway",
                value: "not-an-ip".to_string(),
            })
        );
    }
}
