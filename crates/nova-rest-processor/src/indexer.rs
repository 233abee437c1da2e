use std::collections::BTreeMap;
use std::sync::Arc;

use nova_rest_config::{ProcessorConfig, PROCESSOR_TARGET};
use nova_rest_index::{ClassInfo, TypeIndex};

use crate::converter::{ConverterResolver, ConverterSynthesizer};
use crate::delegation::ConverterSupplier;
use crate::error::BuildError;
use crate::multipart::{
    AdditionalWriter, MultipartBinder, MultipartContext, OutputChecker, OutputRecord,
};
use crate::sink::{
    FieldExtractor, InitConverterCall, InitConvertersRecorder, NoopSink, ReflectiveSink,
    Transform, TransformRequest, TransformSink, UnitSink,
};
use crate::ApplicationClassPredicate;

/// Prefix of the static method generated on bean classes to initialise the
/// converter of one injected field.
pub const INIT_CONVERTER_METHOD_PREFIX: &str = "__quarkus_init_converter__";

/// Inputs available to a [`DefaultProducesHandler`].
pub struct DefaultProducesContext<'a> {
    pub non_async_return_type: &'a str,
    pub index: &'a dyn TypeIndex,
    pub config: &'a ProcessorConfig,
}

/// Supplies default `@Produces` media types for endpoints that declare none.
pub trait DefaultProducesHandler: Send + Sync {
    fn handle(&self, cx: &DefaultProducesContext<'_>) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDefaultProduces;

impl DefaultProducesHandler for NoopDefaultProduces {
    fn handle(&self, _cx: &DefaultProducesContext<'_>) -> Vec<String> {
        Vec::new()
    }
}

/// Collaborators for an [`EndpointIndexer`].
///
/// `index` and `units` are required; every other collaborator defaults to a
/// no-op and the application-class predicate defaults to "never".
#[derive(Default)]
pub struct IndexerContext {
    pub config: ProcessorConfig,
    pub index: Option<Arc<dyn TypeIndex>>,
    pub units: Option<Arc<dyn UnitSink>>,
    pub transforms: Option<Arc<dyn TransformSink>>,
    pub reflective: Option<Arc<dyn ReflectiveSink>>,
    pub init_converters: Option<Arc<dyn InitConvertersRecorder>>,
    pub default_produces: Option<Arc<dyn DefaultProducesHandler>>,
    pub is_application_class: Option<ApplicationClassPredicate>,
}

/// Build-time processing of endpoint parameters and multipart bodies.
///
/// All caches live for the lifetime of the indexer, which is one build
/// session. Methods take `&self` and may be called from several threads.
pub struct EndpointIndexer {
    config: ProcessorConfig,
    index: Arc<dyn TypeIndex>,
    transforms: Arc<dyn TransformSink>,
    init_converters: Arc<dyn InitConvertersRecorder>,
    default_produces: Arc<dyn DefaultProducesHandler>,
    converters: ConverterResolver,
    binder: MultipartBinder,
    outputs: OutputChecker,
}

impl EndpointIndexer {
    pub fn new(cx: IndexerContext) -> Result<Self, BuildError> {
        cx.config.validate()?;
        let index = cx
            .index
            .ok_or(BuildError::MissingCollaborator("type index"))?;
        let units = cx
            .units
            .ok_or(BuildError::MissingCollaborator("generated unit sink"))?;
        let transforms: Arc<dyn TransformSink> = cx.transforms.unwrap_or_else(|| Arc::new(NoopSink));
        let reflective: Arc<dyn ReflectiveSink> = cx.reflective.unwrap_or_else(|| Arc::new(NoopSink));
        let init_converters: Arc<dyn InitConvertersRecorder> =
            cx.init_converters.unwrap_or_else(|| Arc::new(NoopSink));
        let default_produces: Arc<dyn DefaultProducesHandler> = cx
            .default_produces
            .unwrap_or_else(|| Arc::new(NoopDefaultProduces));
        let is_application_class: ApplicationClassPredicate = cx
            .is_application_class
            .unwrap_or_else(|| Arc::new(|_: &str| false));

        let synthesizer = ConverterSynthesizer::new(
            cx.config.converters.clone(),
            units.clone(),
            is_application_class.clone(),
        );
        let multipart = MultipartContext {
            index: index.clone(),
            config: cx.config.multipart.clone(),
            units,
            transforms: transforms.clone(),
            reflective,
            is_application_class,
        };

        Ok(Self {
            converters: ConverterResolver::new(index.clone(), synthesizer),
            binder: MultipartBinder::new(multipart.clone()),
            outputs: OutputChecker::new(multipart),
            config: cx.config,
            index,
            transforms,
            init_converters,
            default_produces,
        })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn index(&self) -> &dyn TypeIndex {
        self.index.as_ref()
    }

    /// Converter for a parameter of type `element_type`, honouring the
    /// configured runtime delegation setting.
    pub fn extract_converter(
        &self,
        element_type: &str,
        location: &str,
    ) -> Result<ConverterSupplier, BuildError> {
        self.extract_converter_with(
            element_type,
            location,
            self.config.converters.runtime_delegation,
        )
    }

    /// Like [`EndpointIndexer::extract_converter`] with an explicit choice of
    /// runtime delegation for this parameter.
    pub fn extract_converter_with(
        &self,
        element_type: &str,
        location: &str,
        runtime_delegation: bool,
    ) -> Result<ConverterSupplier, BuildError> {
        self.converters
            .extract(element_type, location, runtime_delegation)
    }

    /// Cached outcome for `element_type`: `None` if never resolved,
    /// `Some(None)` if resolved without a usable member.
    pub fn cached_converter(&self, element_type: &str) -> Option<Option<String>> {
        self.converters.cache().get(element_type)
    }

    pub fn converter_cache(&self) -> BTreeMap<String, Option<String>> {
        self.converters.cache().snapshot()
    }

    /// Prepares `class` for use as a multipart request body and returns its populator.
    pub fn handle_multipart_for_param_type(&self, class: &ClassInfo) -> String {
        self.binder.bind_class(class)
    }

    /// [`EndpointIndexer::handle_multipart_for_param_type`] by class name.
    pub fn bind_multipart_class(&self, class_name: &str) -> Result<String, BuildError> {
        let class = self.lookup(class_name)?;
        Ok(self.binder.bind_class(class))
    }

    pub fn populators(&self) -> BTreeMap<String, String> {
        self.binder.populators().snapshot()
    }

    /// Whether `class` can be written as a multipart response body.
    pub fn handle_multipart_for_return_type(&self, class: &ClassInfo) -> bool {
        self.outputs.check_output_compatible(class)
    }

    /// [`EndpointIndexer::handle_multipart_for_return_type`] by class name.
    pub fn check_output_compatible(&self, class_name: &str) -> Result<bool, BuildError> {
        let class = self.lookup(class_name)?;
        Ok(self.outputs.check_output_compatible(class))
    }

    pub fn output_records(&self) -> BTreeMap<String, OutputRecord> {
        self.outputs.records().snapshot()
    }

    pub fn additional_writers(&self) -> Vec<AdditionalWriter> {
        self.outputs.additional_writers()
    }

    /// Default media types for an endpoint returning `non_async_return_type`.
    ///
    /// `None` means the handler had no opinion and the framework default applies.
    pub fn apply_additional_defaults(&self, non_async_return_type: &str) -> Option<Vec<String>> {
        let cx = DefaultProducesContext {
            non_async_return_type,
            index: self.index.as_ref(),
            config: &self.config,
        };
        let media_types = self.default_produces.handle(&cx);
        if media_types.is_empty() {
            None
        } else {
            Some(media_types)
        }
    }

    /// Requests field injection for a bean class with request-bound fields.
    pub fn handle_field_extractors(
        &self,
        class_name: &str,
        fields: Vec<FieldExtractor>,
        super_type_is_injectable: bool,
    ) {
        tracing::debug!(
            target: PROCESSOR_TARGET,
            class = class_name,
            fields = fields.len(),
            "injecting request-bound fields"
        );
        self.transforms.transform(TransformRequest {
            class_name: class_name.to_owned(),
            transform: Transform::ClassInjector {
                fields,
                super_type_is_injectable,
            },
        });
    }

    /// Records the initialisation call for the converter of `field_name` on `class_name`.
    pub fn handle_converter(&self, class_name: &str, field_name: &str) {
        self.init_converters.record(InitConverterCall {
            class_name: class_name.to_owned(),
            method_name: format!("{INIT_CONVERTER_METHOD_PREFIX}{field_name}"),
        });
    }

    fn lookup(&self, class_name: &str) -> Result<&ClassInfo, BuildError> {
        self.index
            .class_by_name(class_name)
            .ok_or_else(|| BuildError::UnknownMultipartClass(class_name.to_owned()))
    }
}

impl std::fmt::Debug for EndpointIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointIndexer")
            .field("config", &self.config)
            .field("converters", self.converters.cache())
            .field("populators", self.binder.populators())
            .field("outputs", self.outputs.records())
            .finish_non_exhaustive()
    }
}
