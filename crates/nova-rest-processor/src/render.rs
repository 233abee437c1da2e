//! Java source for generated units.

use crate::converter::ConverterUnit;
use crate::multipart::{FieldAccess, FormField, OutputMapperUnit, PopulatorUnit};
use crate::strategy::ConversionStrategy;

const PARAMETER_CONVERTER: &str =
    "org.jboss.resteasy.reactive.server.core.parameters.converters.ParameterConverter";
const FORM_DATA: &str = "org.jboss.resteasy.reactive.server.multipart.FormDataInput";
const MULTIPART_OUTPUT: &str = "org.jboss.resteasy.reactive.server.multipart.MultipartFormDataOutput";

struct JavaWriter {
    out: String,
    indent: usize,
}

impl JavaWriter {
    fn new(class_name: &str) -> Self {
        let mut writer = Self {
            out: String::new(),
            indent: 0,
        };
        let (package, _) = split_name(class_name);
        if !package.is_empty() {
            writer.line(&format!("package {package};"));
            writer.blank();
        }
        writer
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn open(&mut self, header: &str) {
        self.line(&format!("{header} {{"));
        self.indent += 1;
    }

    fn close(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.line("}");
    }

    fn finish(self) -> String {
        self.out
    }
}

/// `(package, simple name)` of a binary class name.
fn split_name(name: &str) -> (&str, &str) {
    name.rsplit_once('.').unwrap_or(("", name))
}

/// Source-level spelling of a binary name (`Outer$Inner` -> `Outer.Inner`).
fn source_name(name: &str) -> String {
    name.replace('$', ".")
}

pub(crate) fn converter(unit: &ConverterUnit) -> String {
    let (_, simple) = split_name(&unit.name);
    let mut w = JavaWriter::new(&unit.name);
    w.open(&format!(
        "public final class {simple} implements {PARAMETER_CONVERTER}"
    ));
    w.line("@Override");
    w.open("public Object convert(Object value)");
    let call = match &unit.strategy {
        ConversionStrategy::StringConstructor(m) => {
            format!("new {}((String) value)", source_name(&m.owner))
        }
        ConversionStrategy::StaticValueOf(m)
        | ConversionStrategy::StaticFromString(m)
        | ConversionStrategy::PrimitiveWrapperValueOf(m) => {
            format!("{}.{}((String) value)", source_name(&m.owner), m.name)
        }
        ConversionStrategy::NotFound => "null".to_owned(),
    };
    w.line(&format!("return {call};"));
    w.close();
    w.close();
    w.finish()
}

pub(crate) fn populator(unit: &PopulatorUnit) -> String {
    let (_, simple) = split_name(&unit.name);
    let target = source_name(&unit.target_class);
    let mut w = JavaWriter::new(&unit.name);
    w.open(&format!("public final class {simple}"));
    w.open(&format!("public static Object populate({FORM_DATA} input)"));
    w.line(&format!("{target} instance = new {target}();"));
    for field in &unit.fields {
        w.line(&format!(
            "{}.{} = ({}) input.part(\"{}\", {}.class, \"{}\");",
            receiver(field, &unit.target_class),
            field.field_name,
            source_name(&field.field_type),
            escape(&field.part_name),
            erasure(&field.field_type),
            escape(&field.part_type),
        ));
    }
    w.line("return instance;");
    w.close();
    w.close();
    w.finish()
}

pub(crate) fn mapper(unit: &OutputMapperUnit) -> String {
    let (_, simple) = split_name(&unit.name);
    let target = source_name(&unit.target_class);
    let mut w = JavaWriter::new(&unit.name);
    w.open(&format!("public final class {simple}"));
    w.open("public Object map(Object entity)");
    w.line(&format!("{target} instance = ({target}) entity;"));
    w.line(&format!("{MULTIPART_OUTPUT} output = new {MULTIPART_OUTPUT}();"));
    for part in &unit.parts {
        w.line(&format!(
            "output.addFormData(\"{}\", {}, \"{}\");",
            escape(&part.part_name),
            read_expr(part, &unit.target_class),
            escape(&part.part_type),
        ));
    }
    w.line("return output;");
    w.close();
    w.close();
    w.finish()
}

/// `instance`, cast to the declaring class when the field is inherited so a
/// shadowed superclass field is reached instead of the subclass one.
fn receiver(field: &FormField, target_class: &str) -> String {
    if field.declaring_class == target_class {
        "instance".to_owned()
    } else {
        format!("(({}) instance)", source_name(&field.declaring_class))
    }
}

fn read_expr(part: &FormField, target_class: &str) -> String {
    let receiver = receiver(part, target_class);
    match &part.access {
        FieldAccess::Direct => format!("{receiver}.{}", part.field_name),
        FieldAccess::Getter(getter) => format!("{receiver}.{getter}()"),
    }
}

/// Class literal target: generic arguments are dropped.
fn erasure(type_name: &str) -> String {
    let raw = type_name.split('<').next().unwrap_or(type_name);
    source_name(raw)
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::MethodRef;

    #[test]
    fn converter_for_nested_class_uses_source_names() {
        let unit = ConverterUnit {
            name: "com.acme.Outer$Id$quarkusrestparamConverter$".to_owned(),
            element_type: "com.acme.Outer$Id".to_owned(),
            strategy: ConversionStrategy::StringConstructor(MethodRef {
                owner: "com.acme.Outer$Id".to_owned(),
                name: "<init>".to_owned(),
                return_type: "void".to_owned(),
            }),
            application_class: true,
        };

        let expected = "\
package com.acme;

public final class Outer$Id$quarkusrestparamConverter$ implements org.jboss.resteasy.reactive.server.core.parameters.converters.ParameterConverter {
    @Override
    public Object convert(Object value) {
        return new com.acme.Outer.Id((String) value);
    }
}
";
        assert_eq!(converter(&unit), expected);
    }

    #[test]
    fn erasure_drops_type_arguments() {
        assert_eq!(erasure("java.util.List<java.lang.String>"), "java.util.List");
        assert_eq!(erasure("com.acme.A$B"), "com.acme.A.B");
    }
}
