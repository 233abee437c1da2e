//! Outputs of the build step.
//!
//! The processor never writes files or patches classes itself. Generated units,
//! class transforms and reflection registrations are handed to sinks supplied
//! by the host build, which decides how to persist or apply them.

use parking_lot::Mutex;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::converter::ConverterUnit;
use crate::delegation::ConverterSupplier;
use crate::multipart::{OutputMapperUnit, PopulatorUnit};
use crate::render;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratedUnit {
    Converter(ConverterUnit),
    Populator(PopulatorUnit),
    Mapper(OutputMapperUnit),
}

impl GeneratedUnit {
    /// Fully-qualified class name of the generated unit.
    pub fn name(&self) -> &str {
        match self {
            GeneratedUnit::Converter(unit) => &unit.name,
            GeneratedUnit::Populator(unit) => &unit.name,
            GeneratedUnit::Mapper(unit) => &unit.name,
        }
    }

    /// Whether the unit belongs with application classes (as opposed to
    /// framework/library classes) when the host splits its output.
    pub fn application_class(&self) -> bool {
        match self {
            GeneratedUnit::Converter(unit) => unit.application_class,
            GeneratedUnit::Populator(unit) => unit.application_class,
            GeneratedUnit::Mapper(unit) => unit.application_class,
        }
    }

    /// Java source for the unit. Identical inputs render identical bytes.
    pub fn render(&self) -> String {
        match self {
            GeneratedUnit::Converter(unit) => render::converter(unit),
            GeneratedUnit::Populator(unit) => render::populator(unit),
            GeneratedUnit::Mapper(unit) => render::mapper(unit),
        }
    }

    /// Hex SHA-256 of [`GeneratedUnit::render`].
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.render().as_bytes()))
    }
}

/// Where a field-bound request parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Path,
    Query,
    Header,
    Cookie,
    Form,
    Matrix,
    Context,
    Bean,
}

/// A bean field populated from a request parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldExtractor {
    pub field_name: String,
    pub kind: ParameterKind,
    /// Parameter name on the wire (query key, header name, ...).
    pub parameter_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converter: Option<ConverterSupplier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// Grant `populator` access to the declared fields of the target class.
    MultipartAccess { populator: String },
    /// Inject request parameters into bean fields on instantiation.
    ClassInjector {
        fields: Vec<FieldExtractor>,
        super_type_is_injectable: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformRequest {
    pub class_name: String,
    pub transform: Transform,
}

/// A class that must stay reflectively accessible in a closed-world image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ReflectiveClass {
    pub class_name: String,
    pub methods: bool,
    pub fields: bool,
}

impl ReflectiveClass {
    pub fn new(class_name: impl Into<String>, methods: bool, fields: bool) -> Self {
        Self {
            class_name: class_name.into(),
            methods,
            fields,
        }
    }
}

/// A static call recorded into the generated converter initialisation method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitConverterCall {
    pub class_name: String,
    pub method_name: String,
}

pub trait UnitSink: Send + Sync {
    fn emit(&self, unit: GeneratedUnit);
}

pub trait TransformSink: Send + Sync {
    fn transform(&self, request: TransformRequest);
}

pub trait ReflectiveSink: Send + Sync {
    fn register(&self, class: ReflectiveClass);
}

pub trait InitConvertersRecorder: Send + Sync {
    fn record(&self, call: InitConverterCall);
}

/// Discards everything. Default for optional collaborators.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl UnitSink for NoopSink {
    fn emit(&self, _unit: GeneratedUnit) {}
}

impl TransformSink for NoopSink {
    fn transform(&self, _request: TransformRequest) {}
}

impl ReflectiveSink for NoopSink {
    fn register(&self, _class: ReflectiveClass) {}
}

impl InitConvertersRecorder for NoopSink {
    fn record(&self, _call: InitConverterCall) {}
}

/// Collects every output in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    units: Mutex<Vec<GeneratedUnit>>,
    transforms: Mutex<Vec<TransformRequest>>,
    reflective: Mutex<Vec<ReflectiveClass>>,
    init_calls: Mutex<Vec<InitConverterCall>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn units(&self) -> Vec<GeneratedUnit> {
        self.units.lock().clone()
    }

    pub fn transforms(&self) -> Vec<TransformRequest> {
        self.transforms.lock().clone()
    }

    pub fn reflective(&self) -> Vec<ReflectiveClass> {
        self.reflective.lock().clone()
    }

    pub fn init_calls(&self) -> Vec<InitConverterCall> {
        self.init_calls.lock().clone()
    }

    /// Transforms recorded against `class_name`.
    pub fn transforms_for(&self, class_name: &str) -> Vec<Transform> {
        self.transforms
            .lock()
            .iter()
            .filter(|request| request.class_name == class_name)
            .map(|request| request.transform.clone())
            .collect()
    }
}

impl UnitSink for RecordingSink {
    fn emit(&self, unit: GeneratedUnit) {
        self.units.lock().push(unit);
    }
}

impl TransformSink for RecordingSink {
    fn transform(&self, request: TransformRequest) {
        self.transforms.lock().push(request);
    }
}

impl ReflectiveSink for RecordingSink {
    fn register(&self, class: ReflectiveClass) {
        self.reflective.lock().push(class);
    }
}

impl InitConvertersRecorder for RecordingSink {
    fn record(&self, call: InitConverterCall) {
        self.init_calls.lock().push(call);
    }
}
