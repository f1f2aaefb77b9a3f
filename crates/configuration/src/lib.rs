use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{AnalyticsSettings, Config};

/// Loads the application configuration from the `config.toml` file.
///
/// This function is the primary entry point for this crate. It reads the
/// configuration file, deserializes it into our strongly-typed `Config` struct,
/// validates it, and returns it.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from("config.toml")
}

/// Loads configuration from an explicit path, primarily for tests and tools.
pub fn load_config_from(path: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path))
        // Environment variables override the file, e.g. MERIDIAN_ANALYTICS__RISK_FREE_RATE.
        .add_source(config::Environment::with_prefix("MERIDIAN").separator("__"))
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let analytics = &config.analytics;
    if !analytics.risk_free_rate.is_finite() || analytics.risk_free_rate <= -1.0 {
        return Err(ConfigError::ValidationError(format!(
            "risk_free_rate must be a finite rate greater than -100%, got {}",
            analytics.risk_free_rate
        )));
    }
    if !analytics.base_index_value.is_finite() || analytics.base_index_value <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "base_index_value must be strictly positive, got {}",
            analytics.base_index_value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AnalyticsSettings;

    #[test]
    fn defaults_are_sane() {
        let settings = AnalyticsSettings::default();
        assert_eq!(settings.risk_free_rate, 0.0);
        assert_eq!(settings.base_index_value, 100.0);
        assert_eq!(settings.target_frequency, None);
    }

    #[test]
    fn validation_rejects_bad_rates() {
        let config = Config {
            analytics: AnalyticsSettings {
                risk_free_rate: -1.5,
                ..AnalyticsSettings::default()
            },
        };
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ValidationError(_))
        ));

        let config = Config {
            analytics: AnalyticsSettings {
                base_index_value: 0.0,
                ..AnalyticsSettings::default()
            },
        };
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
