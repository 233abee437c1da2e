use nova_rest_index::flags::{ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC};
use nova_rest_index::{
    hierarchy, ClassInfo, FieldInfo, IndexError, MemoryIndex, MethodInfo, TypeIndex, STRING,
};
use pretty_assertions::assert_eq;

fn names<'a>(classes: impl Iterator<Item = &'a ClassInfo>) -> Vec<&'a str> {
    classes.map(|c| c.name.as_str()).collect()
}

#[test]
fn hierarchy_walks_up_to_object() {
    let index = MemoryIndex::new()
        .with_class(ClassInfo::new("com.acme.Base"))
        .with_class(ClassInfo::new("com.acme.Middle").with_super("com.acme.Base"))
        .with_class(ClassInfo::new("com.acme.Leaf").with_super("com.acme.Middle"));

    let leaf = index.class_by_name("com.acme.Leaf").unwrap();
    assert_eq!(
        names(hierarchy(&index, leaf)),
        vec!["com.acme.Leaf", "com.acme.Middle", "com.acme.Base"]
    );
}

#[test]
fn hierarchy_stops_at_first_unresolvable_superclass() {
    let index = MemoryIndex::new()
        .with_class(ClassInfo::new("com.acme.Middle").with_super("org.thirdparty.Missing"))
        .with_class(ClassInfo::new("com.acme.Leaf").with_super("com.acme.Middle"));

    let leaf = index.class_by_name("com.acme.Leaf").unwrap();
    assert_eq!(
        names(hierarchy(&index, leaf)),
        vec!["com.acme.Leaf", "com.acme.Middle"]
    );
}

#[test]
fn hierarchy_terminates_on_cycles() {
    let index = MemoryIndex::new()
        .with_class(ClassInfo::new("com.acme.A").with_super("com.acme.B"))
        .with_class(ClassInfo::new("com.acme.B").with_super("com.acme.A"));

    let a = index.class_by_name("com.acme.A").unwrap();
    assert_eq!(names(hierarchy(&index, a)), vec!["com.acme.A", "com.acme.B"]);
}

#[test]
fn json_index_accepts_keyword_flags() {
    let json = r#"{
        "classes": [
            {
                "name": "com.acme.Money",
                "access_flags": ["public", "final"],
                "methods": [
                    { "name": "<init>", "access_flags": ["public"], "parameters": ["java.lang.String"] },
                    { "name": "parse", "access_flags": ["private", "static"], "parameters": ["java.lang.String"], "return_type": "com.acme.Money" }
                ],
                "fields": [
                    { "name": "amount", "type": "long", "access_flags": ["private"] }
                ]
            }
        ]
    }"#;

    let index = MemoryIndex::from_json_str(json).unwrap();
    let money = index.class_by_name("com.acme.Money").unwrap();
    assert_eq!(money.super_name.as_deref(), Some("java.lang.Object"));
    assert_eq!(money.constructors().count(), 1);

    let parse = money.method("parse", &[STRING]).unwrap();
    assert!(parse.is_static());
    assert!(parse.is_private());
    assert_eq!(money.field("amount").unwrap().access_flags, ACC_PRIVATE);
}

#[test]
fn duplicate_classes_are_rejected() {
    let json = r#"{ "classes": [ { "name": "com.acme.A" }, { "name": "com.acme.A" } ] }"#;
    match MemoryIndex::from_json_str(json) {
        Err(IndexError::DuplicateClass(name)) => assert_eq!(name, "com.acme.A"),
        other => panic!("expected duplicate class error, got {other:?}"),
    }
}

#[test]
fn index_loads_from_disk() {
    let expected = ClassInfo::new("com.acme.Form")
        .with_method(MethodInfo::new(
            "fromString",
            ACC_PUBLIC | ACC_STATIC,
            &[STRING],
            "com.acme.Form",
        ))
        .with_field(FieldInfo::new("name", STRING, ACC_PUBLIC));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.json");
    std::fs::write(
        &path,
        r#"{
            "classes": [
                {
                    "name": "com.acme.Form",
                    "access_flags": 1,
                    "methods": [
                        {
                            "name": "fromString",
                            "access_flags": ["public", "static"],
                            "parameters": ["java.lang.String"],
                            "return_type": "com.acme.Form"
                        }
                    ],
                    "fields": [{ "name": "name", "type": "java.lang.String", "access_flags": ["public"] }]
                }
            ]
        }"#,
    )
    .unwrap();

    let loaded = MemoryIndex::load_from_path(&path).unwrap();
    assert_eq!(loaded.class_by_name("com.acme.Form"), Some(&expected));
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.json");
    let err = MemoryIndex::load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("nope.json"), "{err}");
}
