use serde::{Deserialize, Serialize};

use crate::flags::{
    ACC_ABSTRACT, ACC_ENUM, ACC_FINAL, ACC_INTERFACE, ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC,
};

pub const OBJECT: &str = "java.lang.Object";
pub const ENUM: &str = "java.lang.Enum";
pub const STRING: &str = "java.lang.String";
pub const VOID: &str = "void";
pub const CONSTRUCTOR_NAME: &str = "<init>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationInfo {
    pub name: String,
    /// The `value` element, when present and representable as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl AnnotationInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    #[serde(default, deserialize_with = "crate::flags::deserialize")]
    pub access_flags: u16,
    /// Parameter types as fully-qualified names (`int`, `java.lang.String`, ...).
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default = "default_return_type")]
    pub return_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationInfo>,
}

fn default_return_type() -> String {
    VOID.to_string()
}

impl MethodInfo {
    pub fn new(
        name: impl Into<String>,
        access_flags: u16,
        parameters: &[&str],
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            access_flags,
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            return_type: return_type.into(),
            annotations: Vec::new(),
        }
    }

    pub fn constructor(access_flags: u16, parameters: &[&str]) -> Self {
        Self::new(CONSTRUCTOR_NAME, access_flags, parameters, VOID)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }

    pub fn is_private(&self) -> bool {
        self.access_flags & ACC_PRIVATE != 0
    }

    /// `true` when the method takes exactly one parameter of type `ty`.
    pub fn takes_single(&self, ty: &str) -> bool {
        matches!(self.parameters.as_slice(), [only] if only == ty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, deserialize_with = "crate::flags::deserialize")]
    pub access_flags: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationInfo>,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, access_flags: u16) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            access_flags,
            annotations: Vec::new(),
        }
    }

    pub fn with_annotation(mut self, annotation: AnnotationInfo) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }

    pub fn is_private(&self) -> bool {
        self.access_flags & ACC_PRIVATE != 0
    }

    /// First annotation whose name is one of `names`, in declaration order.
    pub fn annotation_of(&self, names: &[&str]) -> Option<&AnnotationInfo> {
        self.annotations
            .iter()
            .find(|ann| names.contains(&ann.name.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    /// `None` only for `java.lang.Object` and interfaces exported without a superclass.
    #[serde(default = "default_super_name")]
    pub super_name: Option<String>,
    #[serde(default, deserialize_with = "crate::flags::deserialize")]
    pub access_flags: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationInfo>,
}

fn default_super_name() -> Option<String> {
    Some(OBJECT.to_string())
}

impl ClassInfo {
    /// A public class extending `java.lang.Object` with no members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            super_name: default_super_name(),
            access_flags: ACC_PUBLIC,
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// A public enum. Enum classes always extend `java.lang.Enum`.
    pub fn enumeration(name: impl Into<String>) -> Self {
        Self {
            super_name: Some(ENUM.to_string()),
            access_flags: ACC_PUBLIC | ACC_FINAL | ACC_ENUM,
            ..Self::new(name)
        }
    }

    pub fn with_super(mut self, super_name: impl Into<String>) -> Self {
        self.super_name = Some(super_name.into());
        self
    }

    pub fn with_flags(mut self, access_flags: u16) -> Self {
        self.access_flags = access_flags;
        self
    }

    pub fn with_method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    pub fn is_enum(&self) -> bool {
        self.access_flags & ACC_ENUM != 0
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & ACC_INTERFACE != 0
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags & ACC_ABSTRACT != 0
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MethodInfo> {
        self.methods.iter().filter(|m| m.is_constructor())
    }

    /// Looks up a declared method by name and exact parameter list.
    pub fn method(&self, name: &str, parameters: &[&str]) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| {
            m.name == name
                && m.parameters.len() == parameters.len()
                && m.parameters.iter().zip(parameters).all(|(a, b)| a == b)
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerations_are_detected_by_flag() {
        let status = ClassInfo::enumeration("com.acme.Status");
        assert!(status.is_enum());
        assert_eq!(status.super_name.as_deref(), Some(ENUM));
        assert!(!ClassInfo::new("com.acme.Money").is_enum());
    }

    #[test]
    fn single_parameter_match_is_exact() {
        let m = MethodInfo::new("valueOf", ACC_PUBLIC | ACC_STATIC, &[STRING], "com.acme.X");
        assert!(m.takes_single(STRING));
        assert!(!m.takes_single("java.lang.CharSequence"));

        let two = MethodInfo::new("valueOf", ACC_STATIC, &[STRING, "int"], "com.acme.X");
        assert!(!two.takes_single(STRING));
    }
}
