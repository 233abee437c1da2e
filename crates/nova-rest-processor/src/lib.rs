//! Build-time processing for Quarkus REST endpoints.
//!
//! This crate decides how endpoint parameters are converted from their wire
//! strings and generates the small adapter classes that perform the
//! conversion. It also prepares multipart request and response classes:
//! populators for input bodies, mappers for output bodies, and the class
//! transforms and reflection registrations they depend on.
//!
//! Every decision is memoized for the lifetime of an [`EndpointIndexer`], so a
//! given type is inspected and generated at most once per build even when
//! endpoints are processed in parallel.

mod cache;
mod converter;
mod delegation;
mod error;
mod indexer;
mod multipart;
mod render;
mod sink;
mod strategy;

use std::sync::Arc;

pub use cache::OnceMap;
pub use converter::{converter_unit_name, ConverterResolver, ConverterSynthesizer, ConverterUnit};
pub use delegation::{wrap_converter, ConverterRegistry, ConverterSupplier, ParameterConverter};
pub use error::{BuildError, ConversionError, ResolveError};
pub use indexer::{
    DefaultProducesContext, DefaultProducesHandler, EndpointIndexer, IndexerContext,
    NoopDefaultProduces, INIT_CONVERTER_METHOD_PREFIX,
};
pub use multipart::{
    form_fields, mapper_name, output_parts, populator_name, AdditionalWriter, FieldAccess,
    FormField, MultipartBinder, MultipartContext, OutputChecker, OutputMapperUnit, OutputRecord,
    PopulatorUnit, JAKARTA_FORM_PARAM, JAVAX_FORM_PARAM, PART_TYPE, REST_FORM,
};
pub use sink::{
    FieldExtractor, GeneratedUnit, InitConverterCall, InitConvertersRecorder, NoopSink,
    ParameterKind, RecordingSink, ReflectiveClass, ReflectiveSink, Transform, TransformRequest,
    TransformSink, UnitSink,
};
pub use strategy::{
    primitive_wrapper, ConversionStrategy, MethodRef, StrategyInspector, PRIMITIVE_WRAPPERS,
};

/// Decides whether a class name belongs to the application (as opposed to a
/// library), which controls where its generated units are placed.
pub type ApplicationClassPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;
