//! Binding multipart form data to and from user classes.
//!
//! Input classes get a generated populator that assigns their form fields
//! from request parts; the class and its superclasses are transformed so the
//! populator may write private fields. Output classes get a generated mapper
//! that reads their form fields into response parts.

use std::collections::HashSet;
use std::sync::Arc;

use nova_rest_config::{MultipartConfig, PROCESSOR_TARGET};
use nova_rest_index::{hierarchy, ClassInfo, FieldInfo, TypeIndex};
use parking_lot::Mutex;
use serde::Serialize;

use crate::cache::OnceMap;
use crate::sink::{
    GeneratedUnit, ReflectiveClass, ReflectiveSink, Transform, TransformRequest, TransformSink,
    UnitSink,
};
use crate::ApplicationClassPredicate;

pub const REST_FORM: &str = "org.jboss.resteasy.reactive.RestForm";
pub const JAVAX_FORM_PARAM: &str = "javax.ws.rs.FormParam";
pub const JAKARTA_FORM_PARAM: &str = "jakarta.ws.rs.FormParam";
pub const PART_TYPE: &str = "org.jboss.resteasy.reactive.PartType";

const FORM_ANNOTATIONS: &[&str] = &[REST_FORM, JAVAX_FORM_PARAM, JAKARTA_FORM_PARAM];

const POPULATOR_SUFFIX: &str = "_generated_populator";
const MAPPER_SUFFIX: &str = "_generated_mapper";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "method", rename_all = "snake_case")]
pub enum FieldAccess {
    Direct,
    Getter(String),
}

/// A field bound to one multipart part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub declaring_class: String,
    pub field_name: String,
    pub field_type: String,
    pub part_name: String,
    pub part_type: String,
    pub access: FieldAccess,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopulatorUnit {
    pub name: String,
    pub target_class: String,
    pub fields: Vec<FormField>,
    pub application_class: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputMapperUnit {
    pub name: String,
    pub target_class: String,
    pub parts: Vec<FormField>,
    pub application_class: bool,
}

/// Writer registered for a multipart-compatible return type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdditionalWriter {
    pub writer_class: String,
    pub media_type: String,
    pub entity_class: String,
}

/// Cached decision for a return type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    pub compatible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapper: Option<String>,
}

pub fn populator_name(class_name: &str) -> String {
    format!("{class_name}{POPULATOR_SUFFIX}")
}

pub fn mapper_name(class_name: &str) -> String {
    format!("{class_name}{MAPPER_SUFFIX}")
}

/// Form-annotated instance fields of `class` and its superclasses, leaf first.
///
/// Every annotated field is bound, including a superclass field shadowed by a
/// subclass field of the same name and fields that share a part name.
pub fn form_fields(index: &dyn TypeIndex, class: &ClassInfo, default_part_type: &str) -> Vec<FormField> {
    let mut out = Vec::new();
    for current in hierarchy(index, class) {
        for field in current.fields.iter().filter(|f| !f.is_static()) {
            let Some(form) = field.annotation_of(FORM_ANNOTATIONS) else {
                continue;
            };
            let part_name = form
                .value
                .clone()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| field.name.clone());
            let part_type = field
                .annotation_of(&[PART_TYPE])
                .and_then(|ann| ann.value.clone())
                .unwrap_or_else(|| default_part_type.to_owned());
            out.push(FormField {
                declaring_class: current.name.clone(),
                field_name: field.name.clone(),
                field_type: field.type_name.clone(),
                part_name,
                part_type,
                access: FieldAccess::Direct,
            });
        }
    }
    out
}

/// How a mapper can read `field` of `declaring`: the field itself when it is
/// not private, otherwise a non-private no-arg getter on `declaring` or one of
/// its superclasses.
fn read_access(index: &dyn TypeIndex, declaring: &ClassInfo, field: &FieldInfo) -> Option<FieldAccess> {
    if !field.is_private() {
        return Some(FieldAccess::Direct);
    }

    let capitalized = capitalize(&field.name);
    let mut candidates = vec![format!("get{capitalized}")];
    if field.type_name == "boolean" {
        candidates.push(format!("is{capitalized}"));
    }

    hierarchy(index, declaring)
        .flat_map(|c| c.methods.iter())
        .find(|m| {
            !m.is_static()
                && !m.is_private()
                && m.parameters.is_empty()
                && candidates.contains(&m.name)
        })
        .map(|m| FieldAccess::Getter(m.name.clone()))
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Output parts for `class`, or `None` when it cannot be written as multipart.
///
/// A compatible class is concrete, has at least one form field, and every
/// form field is readable.
pub fn output_parts(index: &dyn TypeIndex, class: &ClassInfo, default_part_type: &str) -> Option<Vec<FormField>> {
    if class.is_interface() || class.is_abstract() {
        return None;
    }

    let mut parts = form_fields(index, class, default_part_type);
    if parts.is_empty() {
        return None;
    }
    for part in &mut parts {
        let declaring = index
            .class_by_name(&part.declaring_class)
            .unwrap_or(class);
        let field = declaring.field(&part.field_name)?;
        part.access = read_access(index, declaring, field)?;
    }
    Some(parts)
}

/// Shared handles for the two multipart components.
#[derive(Clone)]
pub struct MultipartContext {
    pub index: Arc<dyn TypeIndex>,
    pub config: MultipartConfig,
    pub units: Arc<dyn UnitSink>,
    pub transforms: Arc<dyn TransformSink>,
    pub reflective: Arc<dyn ReflectiveSink>,
    pub is_application_class: ApplicationClassPredicate,
}

pub struct MultipartBinder {
    cx: MultipartContext,
    populators: OnceMap<String>,
    applied_transforms: Mutex<HashSet<(String, String)>>,
}

impl MultipartBinder {
    pub fn new(cx: MultipartContext) -> Self {
        Self {
            cx,
            populators: OnceMap::new(),
            applied_transforms: Mutex::new(HashSet::new()),
        }
    }

    /// Generates (once) the populator for `class` and grants it field access
    /// on `class` and every indexed superclass.
    pub fn bind_class(&self, class: &ClassInfo) -> String {
        let _span =
            tracing::debug_span!(target: PROCESSOR_TARGET, "bind_multipart", class = %class.name)
                .entered();
        self.populators.get_or_init(&class.name, || {
            let cx = &self.cx;
            cx.reflective
                .register(ReflectiveClass::new(class.name.clone(), false, false));

            let unit = PopulatorUnit {
                name: populator_name(&class.name),
                target_class: class.name.clone(),
                fields: form_fields(cx.index.as_ref(), class, &cx.config.default_part_type),
                application_class: (cx.is_application_class)(&class.name),
            };
            let populator = unit.name.clone();
            tracing::debug!(
                target: PROCESSOR_TARGET,
                populator = %populator,
                fields = unit.fields.len(),
                "generated multipart populator"
            );
            cx.units.emit(GeneratedUnit::Populator(unit));

            for current in hierarchy(cx.index.as_ref(), class) {
                self.grant_access(&current.name, &populator);
            }
            populator
        })
    }

    /// Emits the access transform for a `(class, populator)` pair at most once.
    fn grant_access(&self, class_name: &str, populator: &str) {
        let key = (class_name.to_owned(), populator.to_owned());
        if !self.applied_transforms.lock().insert(key) {
            return;
        }
        self.cx.transforms.transform(TransformRequest {
            class_name: class_name.to_owned(),
            transform: Transform::MultipartAccess {
                populator: populator.to_owned(),
            },
        });
    }

    pub fn populators(&self) -> &OnceMap<String> {
        &self.populators
    }
}

pub struct OutputChecker {
    cx: MultipartContext,
    records: OnceMap<OutputRecord>,
    writers: Mutex<Vec<AdditionalWriter>>,
}

impl OutputChecker {
    pub fn new(cx: MultipartContext) -> Self {
        Self {
            cx,
            records: OnceMap::new(),
            writers: Mutex::new(Vec::new()),
        }
    }

    /// Whether `class` can be returned as a multipart body. The first call for
    /// a class decides and, when compatible, generates its mapper.
    pub fn check_output_compatible(&self, class: &ClassInfo) -> bool {
        self.record(class).compatible
    }

    pub fn record(&self, class: &ClassInfo) -> OutputRecord {
        self.records
            .get_or_init(&class.name, || self.evaluate(class))
    }

    fn evaluate(&self, class: &ClassInfo) -> OutputRecord {
        let cx = &self.cx;
        let Some(parts) = output_parts(cx.index.as_ref(), class, &cx.config.default_part_type)
        else {
            tracing::debug!(
                target: PROCESSOR_TARGET,
                class = %class.name,
                "class is not usable as a multipart response"
            );
            return OutputRecord {
                compatible: false,
                mapper: None,
            };
        };

        self.writers.lock().push(AdditionalWriter {
            writer_class: cx.config.writer_class.clone(),
            media_type: cx.config.media_type.clone(),
            entity_class: class.name.clone(),
        });

        let unit = OutputMapperUnit {
            name: mapper_name(&class.name),
            target_class: class.name.clone(),
            parts,
            application_class: (cx.is_application_class)(&class.name),
        };
        let mapper = unit.name.clone();
        cx.units.emit(GeneratedUnit::Mapper(unit));

        cx.reflective
            .register(ReflectiveClass::new(cx.config.writer_class.clone(), true, false));
        cx.reflective
            .register(ReflectiveClass::new(class.name.clone(), false, false));
        cx.reflective
            .register(ReflectiveClass::new(mapper.clone(), true, false));

        tracing::debug!(
            target: PROCESSOR_TARGET,
            class = %class.name,
            mapper = %mapper,
            "generated multipart output mapper"
        );
        OutputRecord {
            compatible: true,
            mapper: Some(mapper),
        }
    }

    pub fn records(&self) -> &OnceMap<OutputRecord> {
        &self.records
    }

    pub fn additional_writers(&self) -> Vec<AdditionalWriter> {
        self.writers.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_rest_index::flags::{ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC};
    use nova_rest_index::{AnnotationInfo, MemoryIndex, MethodInfo, STRING};

    fn form(name: &str, ty: &str, flags: u16) -> FieldInfo {
        FieldInfo::new(name, ty, flags).with_annotation(AnnotationInfo::new(REST_FORM))
    }

    #[test]
    fn shadowed_superclass_fields_are_still_bound() {
        let index = MemoryIndex::new()
            .with_class(
                ClassInfo::new("com.acme.Base")
                    .with_field(form("name", STRING, ACC_PUBLIC))
                    .with_field(form("id", "long", ACC_PUBLIC)),
            )
            .with_class(
                ClassInfo::new("com.acme.Leaf")
                    .with_super("com.acme.Base")
                    .with_field(form("name", STRING, ACC_PRIVATE))
                    .with_field(form("CONSTANT", STRING, ACC_PUBLIC | ACC_STATIC)),
            );

        let leaf = index.class_by_name("com.acme.Leaf").unwrap();
        let fields = form_fields(&index, leaf, "text/plain");
        let owners: Vec<_> = fields
            .iter()
            .map(|f| (f.declaring_class.as_str(), f.part_name.as_str()))
            .collect();
        assert_eq!(
            owners,
            vec![
                ("com.acme.Leaf", "name"),
                ("com.acme.Base", "name"),
                ("com.acme.Base", "id"),
            ]
        );
    }

    #[test]
    fn annotation_values_override_names_and_types() {
        let index = MemoryIndex::new().with_class(
            ClassInfo::new("com.acme.Upload").with_field(
                FieldInfo::new("payload", "byte[]", ACC_PUBLIC)
                    .with_annotation(AnnotationInfo::with_value(JAKARTA_FORM_PARAM, "file"))
                    .with_annotation(AnnotationInfo::with_value(
                        PART_TYPE,
                        "application/octet-stream",
                    )),
            ),
        );
        let upload = index.class_by_name("com.acme.Upload").unwrap();
        let fields = form_fields(&index, upload, "text/plain");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].part_name, "file");
        assert_eq!(fields[0].part_type, "application/octet-stream");
    }

    #[test]
    fn private_fields_need_a_getter_for_output() {
        let without_getter =
            ClassInfo::new("com.acme.Hidden").with_field(form("secret", STRING, ACC_PRIVATE));
        let with_getter = ClassInfo::new("com.acme.Visible")
            .with_field(form("active", "boolean", ACC_PRIVATE))
            .with_method(MethodInfo::new("isActive", ACC_PUBLIC, &[], "boolean"));
        let index = MemoryIndex::new()
            .with_class(without_getter.clone())
            .with_class(with_getter.clone());

        assert_eq!(output_parts(&index, &without_getter, "text/plain"), None);
        let parts = output_parts(&index, &with_getter, "text/plain").unwrap();
        assert_eq!(parts[0].access, FieldAccess::Getter("isActive".to_owned()));
    }

    #[test]
    fn capitalize_handles_empty_and_unicode() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("name"), "Name");
        assert_eq!(capitalize("élan"), "Élan");
    }
}
