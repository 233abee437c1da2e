#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nova_rest_index::flags::{ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC};
use nova_rest_index::{
    AnnotationInfo, ClassInfo, FieldInfo, MemoryIndex, MethodInfo, TypeIndex, STRING,
};
use nova_rest_processor::{EndpointIndexer, IndexerContext, RecordingSink, REST_FORM};

/// Counts lookups so tests can assert the index was (not) consulted.
pub struct CountingIndex {
    inner: MemoryIndex,
    lookups: AtomicUsize,
}

impl CountingIndex {
    pub fn new(inner: MemoryIndex) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl TypeIndex for CountingIndex {
    fn class_by_name(&self, name: &str) -> Option<&ClassInfo> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.class_by_name(name)
    }
}

pub struct Fixture {
    pub index: Arc<CountingIndex>,
    pub sink: Arc<RecordingSink>,
    pub indexer: EndpointIndexer,
}

pub fn fixture(index: MemoryIndex) -> Fixture {
    fixture_with(index, |_| {})
}

pub fn fixture_with(index: MemoryIndex, customize: impl FnOnce(&mut IndexerContext)) -> Fixture {
    let index = Arc::new(CountingIndex::new(index));
    let sink = Arc::new(RecordingSink::new());
    let mut cx = IndexerContext {
        index: Some(index.clone()),
        units: Some(sink.clone()),
        transforms: Some(sink.clone()),
        reflective: Some(sink.clone()),
        init_converters: Some(sink.clone()),
        ..IndexerContext::default()
    };
    customize(&mut cx);
    let indexer = EndpointIndexer::new(cx).expect("valid indexer context");
    Fixture {
        index,
        sink,
        indexer,
    }
}

pub fn public_static_string_factory(name: &str, owner: &str) -> MethodInfo {
    MethodInfo::new(name, ACC_PUBLIC | ACC_STATIC, &[STRING], owner)
}

pub fn string_ctor() -> MethodInfo {
    MethodInfo::constructor(ACC_PUBLIC, &[STRING])
}

/// `enum Status { ...; static Status fromString(String) }` with the implicit `valueOf`.
pub fn status_enum() -> ClassInfo {
    ClassInfo::enumeration("com.acme.Status")
        .with_method(public_static_string_factory("valueOf", "com.acme.Status"))
        .with_method(public_static_string_factory("fromString", "com.acme.Status"))
}

pub fn form_field(name: &str, ty: &str) -> FieldInfo {
    FieldInfo::new(name, ty, ACC_PRIVATE).with_annotation(AnnotationInfo::new(REST_FORM))
}

pub fn public_form_field(name: &str, ty: &str) -> FieldInfo {
    FieldInfo::new(name, ty, ACC_PUBLIC).with_annotation(AnnotationInfo::new(REST_FORM))
}

/// A form field bound to an explicitly named part.
pub fn named_form_field(name: &str, ty: &str, part: &str, access_flags: u16) -> FieldInfo {
    FieldInfo::new(name, ty, access_flags)
        .with_annotation(AnnotationInfo::with_value(REST_FORM, part))
}
