//! Build-time converter descriptors and their deployment-time resolution.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{BuildError, ConversionError, ResolveError};

/// How a parameter obtains its converter once the application is deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConverterSupplier {
    /// Instantiate the generated converter class.
    Loaded { class_name: String },
    /// Look up an override registered for `element_type` at deployment time,
    /// falling back to `delegate`.
    RuntimeResolved {
        element_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        delegate: Option<Box<ConverterSupplier>>,
    },
}

impl ConverterSupplier {
    pub fn loaded(class_name: impl Into<String>) -> Self {
        ConverterSupplier::Loaded {
            class_name: class_name.into(),
        }
    }

    /// Generated class this supplier ultimately loads, if any.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            ConverterSupplier::Loaded { class_name } => Some(class_name),
            ConverterSupplier::RuntimeResolved { delegate, .. } => {
                delegate.as_deref().and_then(ConverterSupplier::class_name)
            }
        }
    }

    pub fn is_runtime_resolved(&self) -> bool {
        matches!(self, ConverterSupplier::RuntimeResolved { .. })
    }
}

/// Wraps the resolved converter unit (if any) for use by parameter binding.
///
/// With runtime delegation every outcome, including a missing unit, becomes a
/// deployment-time lookup. Without it a missing unit fails the build.
pub fn wrap_converter(
    element_type: &str,
    location: &str,
    unit: Option<String>,
    runtime_delegation: bool,
) -> Result<ConverterSupplier, BuildError> {
    let delegate = unit.map(ConverterSupplier::loaded);
    if runtime_delegation {
        return Ok(ConverterSupplier::RuntimeResolved {
            element_type: element_type.to_owned(),
            delegate: delegate.map(Box::new),
        });
    }
    delegate.ok_or_else(|| BuildError::UnresolvableConverter {
        type_name: element_type.to_owned(),
        location: location.to_owned(),
    })
}

/// Deployment-time string-to-value conversion.
pub trait ParameterConverter: Send + Sync {
    fn convert(&self, input: &str) -> Result<Box<dyn Any + Send>, ConversionError>;
}

impl<F> ParameterConverter for F
where
    F: Fn(&str) -> Result<Box<dyn Any + Send>, ConversionError> + Send + Sync,
{
    fn convert(&self, input: &str) -> Result<Box<dyn Any + Send>, ConversionError> {
        self(input)
    }
}

/// Converters known to a deployed application.
///
/// `loaded` holds instances of generated converter classes by class name;
/// `overrides` holds converters contributed at deployment time by element type.
#[derive(Default, Clone)]
pub struct ConverterRegistry {
    loaded: HashMap<String, Arc<dyn ParameterConverter>>,
    overrides: HashMap<String, Arc<dyn ParameterConverter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_loaded(
        &mut self,
        class_name: impl Into<String>,
        converter: Arc<dyn ParameterConverter>,
    ) {
        self.loaded.insert(class_name.into(), converter);
    }

    pub fn register_override(
        &mut self,
        element_type: impl Into<String>,
        converter: Arc<dyn ParameterConverter>,
    ) {
        self.overrides.insert(element_type.into(), converter);
    }

    /// Instantiates the converter described by `supplier`.
    pub fn instantiate(
        &self,
        supplier: &ConverterSupplier,
    ) -> Result<Arc<dyn ParameterConverter>, ResolveError> {
        match supplier {
            ConverterSupplier::Loaded { class_name } => self
                .loaded
                .get(class_name)
                .cloned()
                .ok_or_else(|| ResolveError::UnknownConverterClass {
                    class_name: class_name.clone(),
                }),
            ConverterSupplier::RuntimeResolved {
                element_type,
                delegate,
            } => {
                if let Some(converter) = self.overrides.get(element_type) {
                    return Ok(converter.clone());
                }
                match delegate {
                    Some(delegate) => self.instantiate(delegate),
                    None => Err(ResolveError::NoConverter {
                        element_type: element_type.clone(),
                    }),
                }
            }
        }
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut loaded: Vec<_> = self.loaded.keys().collect();
        loaded.sort();
        let mut overrides: Vec<_> = self.overrides.keys().collect();
        overrides.sort();
        f.debug_struct("ConverterRegistry")
            .field("loaded", &loaded)
            .field("overrides", &overrides)
            .finish()
    }
}
