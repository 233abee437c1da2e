/// Build-time failures. Any of these aborts the build step; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to find converter for {type_name} (required by {location})")]
    UnresolvableConverter { type_name: String, location: String },

    #[error("endpoint indexer is missing a required collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("multipart class {0} is not present in the type index")]
    UnknownMultipartClass(String),

    #[error("invalid processor config")]
    InvalidConfig(#[from] nova_rest_config::ConfigError),
}

/// Deployment-time failures while instantiating a converter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no parameter converter registered for {element_type}")]
    NoConverter { element_type: String },

    #[error("generated converter class {class_name} is not loaded")]
    UnknownConverterClass { class_name: String },
}

/// A converter rejected its input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot convert {input:?}: {reason}")]
pub struct ConversionError {
    pub input: String,
    pub reason: String,
}

impl ConversionError {
    pub fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
