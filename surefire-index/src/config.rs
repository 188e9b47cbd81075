// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for a collection run.
//!
//! Configuration is read from TOML. The embedded [default config](CollectorConfig::DEFAULT_CONFIG)
//! is always loaded first, and an optional user-provided file is layered on top of it.

use crate::{
    errors::{
        ConfigParseError, ConfigParseErrorKind, ConfigValidationError,
        MalformedReportPolicyParseError,
    },
    metrics::{DEFAULT_DENSITY_PRECISION, MAX_DENSITY_PRECISION},
    sanitize::DEFAULT_NESTING_SEPARATOR,
};
use camino::Utf8Path;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::{collections::BTreeSet, fmt, str::FromStr};
use tracing::warn;

/// Trait for handling configuration warnings.
///
/// The default implementation, [`DefaultConfigWarnings`], logs warnings.
pub trait ConfigWarnings {
    /// Handle unknown configuration keys found in a config file.
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>);
}

/// Logs configuration warnings with `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push_str("key: ");
            unknown_str.push_str(unknown.iter().next().map_or("", String::as_str));
        } else {
            unknown_str.push_str("keys:");
            for ignored_key in unknown {
                unknown_str.push('\n');
                unknown_str.push_str("  - ");
                unknown_str.push_str(ignored_key);
            }
        }

        warn!("in config file {config_file}, ignoring unknown configuration {unknown_str}");
    }
}

/// Configuration for a collection run.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct CollectorConfig {
    /// How report files are found and handled.
    pub reports: ReportsConfig,

    /// How class identities are interpreted.
    pub classes: ClassesConfig,

    /// How metrics are computed and published.
    pub metrics: MetricsConfig,
}

impl CollectorConfig {
    /// The default config, embedded in the library.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the default config, with `config_file` layered on top if provided.
    ///
    /// Unknown keys are reported through `warnings`.
    pub fn from_sources(
        config_file: Option<&Utf8Path>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let mut builder = Self::make_default_config();
        let config_file = match config_file {
            Some(config_file) => {
                builder = builder.add_source(File::new(config_file.as_str(), FileFormat::Toml));
                config_file
            }
            None => Utf8Path::new("<default config>"),
        };

        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(config_file, kind))?;
        if !unknown.is_empty() {
            warnings.unknown_config_keys(config_file, &unknown);
        }

        config
            .validate()
            .map_err(|err| ConfigParseError::new(config_file, ConfigParseErrorKind::Validation(err)))?;
        Ok(config)
    }

    /// Checks that values are in range.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.classes.nesting_separator.is_empty() {
            return Err(ConfigValidationError::EmptyNestingSeparator);
        }
        if self.reports.primary_prefix.is_empty() {
            return Err(ConfigValidationError::EmptyReportPrefix {
                key: "primary-prefix",
            });
        }
        if self.reports.fallback_prefix.is_empty() {
            return Err(ConfigValidationError::EmptyReportPrefix {
                key: "fallback-prefix",
            });
        }
        if self.metrics.density_precision > MAX_DENSITY_PRECISION {
            return Err(ConfigValidationError::DensityPrecisionTooLarge {
                max: MAX_DENSITY_PRECISION,
                found: self.metrics.density_precision,
            });
        }
        Ok(())
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(Self, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: CollectorConfig = serde_path_to_error::deserialize(ignored_de).map_err(|error| {
            // Both serde_path_to_error and the config crate report the key. Drop the key from the
            // config error for consistency.
            let path = error.path().clone();
            let config_error = error.into_inner();
            let error = match config_error {
                ConfigError::At { error, .. } => *error,
                other => other,
            };
            ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                path, error,
            )))
        })?;

        Ok((config, ignored))
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            reports: ReportsConfig {
                primary_prefix: "TEST-".to_owned(),
                fallback_prefix: "TESTS-".to_owned(),
                suffix: ".xml".to_owned(),
                on_malformed: MalformedReportPolicy::Abort,
            },
            classes: ClassesConfig {
                nesting_separator: DEFAULT_NESTING_SEPARATOR.to_owned(),
                source_suffix: ".pas".to_owned(),
            },
            metrics: MetricsConfig {
                density_precision: DEFAULT_DENSITY_PRECISION,
                publish_details: false,
            },
        }
    }
}

/// The `[reports]` section.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ReportsConfig {
    /// Preferred report file name prefix.
    pub primary_prefix: String,

    /// Report file name prefix used if no file matches the primary prefix.
    pub fallback_prefix: String,

    /// Report file name suffix.
    pub suffix: String,

    /// What to do with reports that can't be parsed.
    pub on_malformed: MalformedReportPolicy,
}

/// The `[classes]` section.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ClassesConfig {
    /// Separator between an enclosing class and a nested class.
    pub nesting_separator: String,

    /// Appended to a class identity to find its source file.
    pub source_suffix: String,
}

/// The `[metrics]` section.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct MetricsConfig {
    /// Number of decimals the success density is rounded to.
    pub density_precision: u32,

    /// Whether per-test details are published.
    pub publish_details: bool,
}

/// What to do when a report can't be opened or parsed.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum MalformedReportPolicy {
    /// Stop the run and return the error. Nothing is published.
    #[default]
    Abort,

    /// Log a warning, discard everything read from that report, and continue.
    Skip,
}

impl MalformedReportPolicy {
    /// Returns the string representations of all variants.
    pub fn variants() -> &'static [&'static str] {
        &["abort", "skip"]
    }
}

impl fmt::Display for MalformedReportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

impl FromStr for MalformedReportPolicy {
    type Err = MalformedReportPolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(MalformedReportPolicyParseError::new(other)),
        }
    }
}
