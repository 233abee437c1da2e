//! Synthesis of `ParameterConverter` classes for endpoint parameter types.

use std::sync::Arc;

use nova_rest_config::{ConverterConfig, PROCESSOR_TARGET};
use nova_rest_index::TypeIndex;
use serde::Serialize;

use crate::cache::OnceMap;
use crate::delegation::{wrap_converter, ConverterSupplier};
use crate::error::BuildError;
use crate::sink::{GeneratedUnit, UnitSink};
use crate::strategy::{ConversionStrategy, StrategyInspector};
use crate::ApplicationClassPredicate;

/// A generated converter class. Its single method passes the incoming string
/// to the constructor or factory named by `strategy` and returns the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConverterUnit {
    pub name: String,
    pub element_type: String,
    pub strategy: ConversionStrategy,
    pub application_class: bool,
}

/// Name of the converter class generated for `element_type`.
///
/// Primitive converters live under the generated namespace. A name that would
/// start with a reserved root package (`java`) has every occurrence of that
/// root replaced by its escaped form, since classes may not be defined there.
pub fn converter_unit_name(config: &ConverterConfig, element_type: &str, primitive: bool) -> String {
    let prefix = if primitive {
        config.generated_namespace.as_str()
    } else {
        ""
    };
    let mut effective = format!("{prefix}{element_type}");
    for root in &config.reserved_roots {
        if effective.starts_with(root.as_str()) {
            let escaped = format!("{root}{}", config.escaped_suffix);
            effective = effective.replace(root.as_str(), &escaped);
        }
    }
    format!("{effective}{}", config.unit_suffix)
}

pub struct ConverterSynthesizer {
    config: ConverterConfig,
    units: Arc<dyn UnitSink>,
    is_application_class: ApplicationClassPredicate,
}

impl ConverterSynthesizer {
    pub fn new(
        config: ConverterConfig,
        units: Arc<dyn UnitSink>,
        is_application_class: ApplicationClassPredicate,
    ) -> Self {
        Self {
            config,
            units,
            is_application_class,
        }
    }

    /// Emits a converter unit for `strategy`; `NotFound` emits nothing.
    pub fn synthesize(
        &self,
        element_type: &str,
        strategy: ConversionStrategy,
    ) -> Option<ConverterUnit> {
        if !strategy.is_found() {
            return None;
        }

        let primitive = matches!(strategy, ConversionStrategy::PrimitiveWrapperValueOf(_));
        let unit = ConverterUnit {
            name: converter_unit_name(&self.config, element_type, primitive),
            element_type: element_type.to_owned(),
            strategy,
            application_class: (self.is_application_class)(element_type),
        };

        tracing::info!(
            target: PROCESSOR_TARGET,
            element_type,
            unit = %unit.name,
            strategy = unit.strategy.kind(),
            "generated parameter converter"
        );
        self.units.emit(GeneratedUnit::Converter(unit.clone()));
        Some(unit)
    }
}

/// Resolves converters for parameter element types, synthesizing each at most
/// once per session. A type with no usable member is remembered as such.
pub struct ConverterResolver {
    index: Arc<dyn TypeIndex>,
    synthesizer: ConverterSynthesizer,
    cache: OnceMap<Option<String>>,
}

impl ConverterResolver {
    pub fn new(index: Arc<dyn TypeIndex>, synthesizer: ConverterSynthesizer) -> Self {
        Self {
            index,
            synthesizer,
            cache: OnceMap::new(),
        }
    }

    /// Generated converter class for `element_type`, or `None` when the type
    /// offers no string constructor or factory.
    pub fn unit_name(&self, element_type: &str) -> Option<String> {
        let mut computed = false;
        let name = self.cache.get_or_init(element_type, || {
            computed = true;
            let strategy = StrategyInspector::new(self.index.as_ref()).resolve(element_type);
            self.synthesizer
                .synthesize(element_type, strategy)
                .map(|unit| unit.name)
        });
        if !computed {
            tracing::debug!(
                target: PROCESSOR_TARGET,
                element_type,
                unit = ?name,
                "converter cache hit"
            );
        }
        name
    }

    pub fn extract(
        &self,
        element_type: &str,
        location: &str,
        runtime_delegation: bool,
    ) -> Result<ConverterSupplier, BuildError> {
        let _span = tracing::debug_span!(target: PROCESSOR_TARGET, "extract_converter", element_type)
            .entered();
        let unit = self.unit_name(element_type);
        wrap_converter(element_type, location, unit, runtime_delegation)
    }

    /// Cached outcomes keyed by element type (`None` = nothing usable).
    pub fn cache(&self) -> &OnceMap<Option<String>> {
        &self.cache
    }
}
