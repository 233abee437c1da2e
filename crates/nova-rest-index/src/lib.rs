//! Read-only class index consumed by the REST build step.
//!
//! The index is a flattened view of the application's classes: declared
//! constructors, methods, fields, annotations and the superclass link. It is
//! populated once (from a build tool export or programmatically in tests) and
//! never mutated while the processor runs.
#![forbid(unsafe_code)]

mod error;
pub mod flags;
mod hierarchy;
mod memory;
mod model;

pub use crate::error::{IndexError, Result};
pub use crate::hierarchy::{hierarchy, Hierarchy};
pub use crate::memory::MemoryIndex;
pub use crate::model::{AnnotationInfo, ClassInfo, FieldInfo, MethodInfo};
pub use crate::model::{CONSTRUCTOR_NAME, ENUM, OBJECT, STRING, VOID};

/// Lookup interface over a set of indexed classes.
///
/// Names are fully-qualified binary names using `.` as the package separator
/// (`com.acme.Outer$Inner`).
pub trait TypeIndex: Send + Sync {
    fn class_by_name(&self, name: &str) -> Option<&ClassInfo>;

    fn contains(&self, name: &str) -> bool {
        self.class_by_name(name).is_some()
    }
}

impl<T: TypeIndex + ?Sized> TypeIndex for std::sync::Arc<T> {
    fn class_by_name(&self, name: &str) -> Option<&ClassInfo> {
        (**self).class_by_name(name)
    }
}
