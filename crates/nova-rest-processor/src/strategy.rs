//! Choosing how a parameter type is built from its wire string.

use nova_rest_index::{ClassInfo, MethodInfo, TypeIndex, STRING};
use serde::Serialize;

/// Primitive type names and the wrapper class whose `valueOf(String)` parses them.
///
/// `char` is absent: `Character` has no `valueOf(String)` and is converted by
/// a built-in runtime converter instead.
pub const PRIMITIVE_WRAPPERS: &[(&str, &str)] = &[
    ("boolean", "java.lang.Boolean"),
    ("byte", "java.lang.Byte"),
    ("short", "java.lang.Short"),
    ("int", "java.lang.Integer"),
    ("long", "java.lang.Long"),
    ("float", "java.lang.Float"),
    ("double", "java.lang.Double"),
];

pub fn primitive_wrapper(type_name: &str) -> Option<&'static str> {
    PRIMITIVE_WRAPPERS
        .iter()
        .find(|(primitive, _)| *primitive == type_name)
        .map(|(_, wrapper)| *wrapper)
}

/// A constructor or static method taking a single `java.lang.String`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MethodRef {
    pub owner: String,
    pub name: String,
    pub return_type: String,
}

impl MethodRef {
    fn of(owner: &ClassInfo, method: &MethodInfo) -> Self {
        Self {
            owner: owner.name.clone(),
            name: method.name.clone(),
            return_type: method.return_type.clone(),
        }
    }

    fn value_of(wrapper: &str) -> Self {
        Self {
            owner: wrapper.to_owned(),
            name: "valueOf".to_owned(),
            return_type: wrapper.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "method", rename_all = "snake_case")]
pub enum ConversionStrategy {
    StringConstructor(MethodRef),
    StaticValueOf(MethodRef),
    StaticFromString(MethodRef),
    PrimitiveWrapperValueOf(MethodRef),
    NotFound,
}

impl ConversionStrategy {
    pub fn is_found(&self) -> bool {
        !matches!(self, ConversionStrategy::NotFound)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ConversionStrategy::StringConstructor(_) => "string_constructor",
            ConversionStrategy::StaticValueOf(_) => "static_value_of",
            ConversionStrategy::StaticFromString(_) => "static_from_string",
            ConversionStrategy::PrimitiveWrapperValueOf(_) => "primitive_wrapper_value_of",
            ConversionStrategy::NotFound => "not_found",
        }
    }
}

/// Read-only inspection of a type's string-accepting members.
pub struct StrategyInspector<'a> {
    index: &'a dyn TypeIndex,
}

impl<'a> StrategyInspector<'a> {
    pub fn new(index: &'a dyn TypeIndex) -> Self {
        Self { index }
    }

    /// Picks the conversion strategy for `element_type`.
    ///
    /// Primitive names short-circuit without touching the index. Otherwise the
    /// type's non-private single-`String` members are considered, preferring a
    /// constructor, then `valueOf`, then `fromString`. Enums invert the last
    /// two: every enum has a compiler-generated `valueOf` that matches constant
    /// names, so a hand-written `fromString` takes priority over it.
    pub fn resolve(&self, element_type: &str) -> ConversionStrategy {
        if let Some(wrapper) = primitive_wrapper(element_type) {
            return ConversionStrategy::PrimitiveWrapperValueOf(MethodRef::value_of(wrapper));
        }

        let Some(class) = self.index.class_by_name(element_type) else {
            return ConversionStrategy::NotFound;
        };

        let string_ctor = class
            .constructors()
            .find(|m| !m.is_private() && m.takes_single(STRING));
        let factory = |name: &str| {
            class
                .method(name, &[STRING])
                .filter(|m| m.is_static() && !m.is_private())
        };
        let from_string = factory("fromString");
        let value_of = if class.is_enum() && from_string.is_some() {
            None
        } else {
            factory("valueOf")
        };

        match (string_ctor, value_of, from_string) {
            (Some(ctor), _, _) => ConversionStrategy::StringConstructor(MethodRef::of(class, ctor)),
            (None, Some(m), _) => ConversionStrategy::StaticValueOf(MethodRef::of(class, m)),
            (None, None, Some(m)) => ConversionStrategy::StaticFromString(MethodRef::of(class, m)),
            (None, None, None) => ConversionStrategy::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_rest_index::flags::{ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC};
    use nova_rest_index::MemoryIndex;

    fn public_static(name: &str, returns: &str) -> MethodInfo {
        MethodInfo::new(name, ACC_PUBLIC | ACC_STATIC, &[STRING], returns)
    }

    #[test]
    fn enum_prefers_from_string_over_value_of() {
        let index = MemoryIndex::new().with_class(
            ClassInfo::enumeration("com.acme.Status")
                .with_method(public_static("valueOf", "com.acme.Status"))
                .with_method(public_static("fromString", "com.acme.Status")),
        );

        let strategy = StrategyInspector::new(&index).resolve("com.acme.Status");
        let ConversionStrategy::StaticFromString(method) = strategy else {
            panic!("expected fromString, got {strategy:?}");
        };
        assert_eq!(method.owner, "com.acme.Status");
        assert_eq!(method.name, "fromString");
    }

    #[test]
    fn non_enum_prefers_value_of_over_from_string() {
        let index = MemoryIndex::new().with_class(
            ClassInfo::new("com.acme.Code")
                .with_method(public_static("fromString", "com.acme.Code"))
                .with_method(public_static("valueOf", "com.acme.Code")),
        );

        let strategy = StrategyInspector::new(&index).resolve("com.acme.Code");
        assert!(matches!(strategy, ConversionStrategy::StaticValueOf(_)), "{strategy:?}");
    }

    #[test]
    fn private_and_instance_members_are_ignored() {
        let index = MemoryIndex::new().with_class(
            ClassInfo::new("com.acme.Secret")
                .with_method(MethodInfo::constructor(ACC_PRIVATE, &[STRING]))
                .with_method(MethodInfo::new(
                    "valueOf",
                    ACC_PRIVATE | ACC_STATIC,
                    &[STRING],
                    "com.acme.Secret",
                ))
                .with_method(MethodInfo::new(
                    "fromString",
                    ACC_PUBLIC,
                    &[STRING],
                    "com.acme.Secret",
                )),
        );

        assert_eq!(
            StrategyInspector::new(&index).resolve("com.acme.Secret"),
            ConversionStrategy::NotFound
        );
    }

    #[test]
    fn char_is_not_a_wrapped_primitive() {
        assert_eq!(primitive_wrapper("int"), Some("java.lang.Integer"));
        assert_eq!(primitive_wrapper("char"), None);
    }
}
