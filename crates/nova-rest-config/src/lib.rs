//! Configuration for the REST build step (`nova-rest.toml`).
//!
//! Every table is optional; omitted keys fall back to the defaults used by the
//! Quarkus REST runtime so generated artifacts stay loadable without extra
//! setup.

use std::path::Path;
use std::sync::Once;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

mod schema;

pub use schema::json_schema;

/// Tracing target used for build-step events.
pub const PROCESSOR_TARGET: &str = "nova.rest";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("invalid config: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // Keep the message and drop the source snippet.
        ConfigError::Toml(err.message().to_owned())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct ConverterConfig {
    /// Wrap every resolved converter so the conversion can be replaced at deployment time.
    ///
    /// When disabled, a parameter type without a usable constructor or static factory fails
    /// the build.
    #[serde(default)]
    pub runtime_delegation: bool,

    /// Namespace for converters of primitive types. Must be empty or end with `.`.
    #[serde(default = "ConverterConfig::default_generated_namespace")]
    pub generated_namespace: String,

    /// Root packages generated classes may not be defined in.
    #[serde(default = "ConverterConfig::default_reserved_roots")]
    pub reserved_roots: Vec<String>,

    /// Appended to a reserved root to form its escaped replacement (`java` -> `javaq`).
    #[serde(default = "ConverterConfig::default_escaped_suffix")]
    pub escaped_suffix: String,

    /// Appended to the element type name to form the converter class name.
    #[serde(default = "ConverterConfig::default_unit_suffix")]
    pub unit_suffix: String,
}

impl ConverterConfig {
    fn default_generated_namespace() -> String {
        "io.quarkus.generated.".to_owned()
    }

    fn default_reserved_roots() -> Vec<String> {
        vec!["java".to_owned()]
    }

    fn default_escaped_suffix() -> String {
        "q".to_owned()
    }

    fn default_unit_suffix() -> String {
        "$quarkusrestparamConverter$".to_owned()
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            runtime_delegation: false,
            generated_namespace: Self::default_generated_namespace(),
            reserved_roots: Self::default_reserved_roots(),
            escaped_suffix: Self::default_escaped_suffix(),
            unit_suffix: Self::default_unit_suffix(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct MultipartConfig {
    /// Message body writer registered for multipart-compatible return types.
    #[serde(default = "MultipartConfig::default_writer_class")]
    pub writer_class: String,

    #[serde(default = "MultipartConfig::default_media_type")]
    pub media_type: String,

    /// Part media type used when a field carries no `@PartType`.
    #[serde(default = "MultipartConfig::default_part_type")]
    pub default_part_type: String,
}

impl MultipartConfig {
    fn default_writer_class() -> String {
        "io.quarkus.resteasy.reactive.server.runtime.multipart.MultipartMessageBodyWriter"
            .to_owned()
    }

    fn default_media_type() -> String {
        "multipart/form-data".to_owned()
    }

    fn default_part_type() -> String {
        "text/plain".to_owned()
    }
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            writer_class: Self::default_writer_class(),
            media_type: Self::default_media_type(),
            default_part_type: Self::default_part_type(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level, or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    /// `level` as filter directives. Bare level names are accepted in any case
    /// (plus `warning`); anything else is passed through as directives.
    pub(crate) fn directives(&self) -> String {
        let level = self.level.trim();
        if level.is_empty() {
            return Self::default_level();
        }
        if level.eq_ignore_ascii_case("warning") {
            return "warn".to_owned();
        }
        match level.parse::<LevelFilter>() {
            Ok(filter) => filter.to_string().to_ascii_lowercase(),
            Err(_) => level.to_owned(),
        }
    }

    /// Effective filter: the configured directives followed by `RUST_LOG`, so
    /// the environment wins for any target both mention.
    ///
    /// Invalid directives fall back to the default level.
    pub fn env_filter(&self) -> EnvFilter {
        let mut directives = self.directives();
        if let Ok(env) = std::env::var(EnvFilter::DEFAULT_ENV) {
            let env = env.trim();
            if !env.is_empty() {
                directives.push(',');
                directives.push_str(env);
            }
        }
        EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(Self::default_level()))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct ProcessorConfig {
    #[serde(default)]
    pub converters: ConverterConfig,
    #[serde(default)]
    pub multipart: MultipartConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProcessorConfig {
    /// Load and validate a config file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let config: ProcessorConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic checks serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        let converters = &self.converters;

        if converters.reserved_roots.iter().any(|root| root.trim().is_empty()) {
            errors.push("converters.reserved_roots must not contain empty entries".to_owned());
        }
        if converters.escaped_suffix.is_empty() {
            errors.push("converters.escaped_suffix must not be empty".to_owned());
        }
        if converters.unit_suffix.is_empty() {
            errors.push("converters.unit_suffix must not be empty".to_owned());
        }
        if !converters.generated_namespace.is_empty()
            && !converters.generated_namespace.ends_with('.')
        {
            errors.push(format!(
                "converters.generated_namespace must end with '.' (got {:?})",
                converters.generated_namespace
            ));
        }
        for root in &converters.reserved_roots {
            let escaped = format!("{root}{}", converters.escaped_suffix);
            if converters.generated_namespace.starts_with(root.as_str())
                && !converters.generated_namespace.starts_with(&escaped)
            {
                errors.push(format!(
                    "converters.generated_namespace may not start with reserved root {root:?}"
                ));
            }
        }

        let multipart = &self.multipart;
        if multipart.writer_class.trim().is_empty() {
            errors.push("multipart.writer_class must not be empty".to_owned());
        }
        if !multipart.media_type.contains('/') {
            errors.push(format!(
                "multipart.media_type is not a media type: {:?}",
                multipart.media_type
            ));
        }
        if !multipart.default_part_type.contains('/') {
            errors.push(format!(
                "multipart.default_part_type is not a media type: {:?}",
                multipart.default_part_type
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}

static TRACING_INIT: Once = Once::new();

/// Installs a global `tracing` subscriber writing to stderr.
///
/// Safe to call multiple times; only the first call has an effect. If another
/// subscriber was installed by the host process it is left in place.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let registry = tracing_subscriber::registry().with(config.env_filter());
        let installed = if config.json {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()
        };
        if installed.is_err() {
            tracing::debug!(
                target: PROCESSOR_TARGET,
                "global tracing subscriber already installed"
            );
        }
    });
}
