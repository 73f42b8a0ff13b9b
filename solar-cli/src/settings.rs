//! Startup configuration.
//!
//! Settings come from an optional TOML file; command-line flags override
//! individual values. Every section and key is optional.
//!
//! ```toml
//! [services]
//! backend = "memory"
//!
//! [calculation]
//! cost_per_kw = "1200"
//!
//! [logging]
//! level = "debug"
//! file = "solar-quote.log"
//!
//! [data]
//! postcodes = "tables/postcodes.csv"
//!
//! [wizard]
//! address_mode = "free-text"
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use solar_core::calculations::ConfigError;
use solar_core::services::ServiceConfig;
use solar_core::{AddressMode, CalculationConfig};
use thiserror::Error;

use crate::logging::DEFAULT_LEVEL;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid calculation settings: {0}")]
    Calculation(#[from] ConfigError),
}

/// How the location question is asked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AddressEntry {
    #[default]
    Postcode,
    FreeText,
}

impl From<AddressEntry> for AddressMode {
    fn from(entry: AddressEntry) -> Self {
        match entry {
            AddressEntry::Postcode => AddressMode::Postcode,
            AddressEntry::FreeText => AddressMode::FreeText,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// Append log records to this file as well as stderr.
    pub file: Option<PathBuf>,
    /// Log to stderr. File logging is unaffected.
    pub console: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            file: None,
            console: true,
        }
    }
}

/// Replacement reference tables. Unset entries use the bundled tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub incentives: Option<PathBuf>,
    pub postcodes: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardSettings {
    pub address_mode: AddressEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub services: ServiceConfig,
    pub calculation: CalculationConfig,
    pub logging: LoggingSettings,
    pub data: DataSettings,
    pub wizard: WizardSettings,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates settings.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        settings.calculation.validate()?;
        Ok(settings)
    }

    /// Loads the file named by `--config` (defaults otherwise) and applies
    /// the remaining flags on top.
    pub fn load(cli: &Cli) -> Result<Self, SettingsError> {
        let mut settings = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_overrides(cli);
        Ok(settings)
    }

    pub fn apply_overrides(
        &mut self,
        cli: &Cli,
    ) {
        if let Some(backend) = &cli.backend {
            self.services.backend = backend.clone();
        }
        if let Some(level) = &cli.log_level {
            self.logging.level = level.clone();
        }
        if let Some(file) = &cli.log_file {
            self.logging.file = Some(file.clone());
        }
        if cli.quiet {
            self.logging.console = false;
        }
        if let Some(path) = &cli.incentives {
            self.data.incentives = Some(path.clone());
        }
        if let Some(path) = &cli.postcodes {
            self.data.postcodes = Some(path.clone());
        }
        if let Some(mode) = cli.address_mode {
            self.wizard.address_mode = mode;
        }
    }
}

/// Residential solar quote questionnaire.
///
/// Walks through the questions on the terminal, estimates system size,
/// cost, rebates and payback, and submits the answers as a lead.
#[derive(Debug, Default, Parser)]
#[command(name = "solar-quote")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML settings file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Service backend (`http` or `memory`).
    #[arg(long)]
    pub backend: Option<String>,

    /// Log level or EnvFilter directive. `RUST_LOG` takes precedence.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Also write logs to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Do not log to stderr.
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Incentive table CSV replacing the bundled one.
    #[arg(long)]
    pub incentives: Option<PathBuf>,

    /// Postcode table CSV replacing the bundled one.
    #[arg(long)]
    pub postcodes: Option<PathBuf>,

    /// Ask for a postcode or a street address.
    #[arg(long, value_enum)]
    pub address_mode: Option<AddressEntry>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn sections_override_individual_keys() {
        let settings = Settings::from_toml(
            r#"
            [services]
            backend = "memory"

            [calculation]
            cost_per_kw = "1200"

            [logging]
            level = "debug"

            [wizard]
            address_mode = "free-text"
            "#,
        )
        .unwrap();

        assert_eq!(settings.services.backend, "memory");
        assert_eq!(
            settings.services.geocoder_url,
            ServiceConfig::default().geocoder_url
        );
        assert_eq!(settings.calculation.cost_per_kw, dec!(1200));
        assert_eq!(
            settings.calculation.deeming_years,
            CalculationConfig::default().deeming_years
        );
        assert_eq!(settings.logging.level, "debug");
        assert!(settings.logging.console);
        assert_eq!(settings.wizard.address_mode, AddressEntry::FreeText);
    }

    #[test]
    fn invalid_calculation_values_are_rejected() {
        let err = Settings::from_toml("[calculation]\nexport_fraction = \"1.5\"\n").unwrap_err();

        assert!(matches!(err, SettingsError::Calculation(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Settings::from_toml("[services\nbackend = 1").unwrap_err();

        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn flags_override_file_values() {
        let mut settings = Settings::from_toml("[services]\nbackend = \"http\"\n").unwrap();
        let cli = Cli::parse_from([
            "solar-quote",
            "--backend",
            "memory",
            "--log-level",
            "warn",
            "--quiet",
            "--postcodes",
            "p.csv",
            "--address-mode",
            "free-text",
        ]);

        settings.apply_overrides(&cli);

        assert_eq!(settings.services.backend, "memory");
        assert_eq!(settings.logging.level, "warn");
        assert!(!settings.logging.console);
        assert_eq!(settings.data.postcodes, Some(PathBuf::from("p.csv")));
        assert_eq!(settings.data.incentives, None);
        assert_eq!(settings.wizard.address_mode, AddressEntry::FreeText);
    }

    #[test]
    fn missing_file_names_path() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/solar.toml")),
            ..Default::default()
        };

        let err = Settings::load(&cli).unwrap_err();

        assert!(err.to_string().contains("/nonexistent/solar.toml"));
    }
}
