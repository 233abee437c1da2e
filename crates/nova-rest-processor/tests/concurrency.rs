mod support;

use std::sync::{Arc, Barrier};
use std::thread;

use nova_rest_index::{ClassInfo, MemoryIndex};
use nova_rest_processor::GeneratedUnit;
use pretty_assertions::assert_eq;
use support::{fixture, form_field, status_enum, string_ctor};

const THREADS: usize = 16;

#[test]
fn parallel_endpoints_share_one_unit_per_type() {
    let f = fixture(
        MemoryIndex::new()
            .with_class(status_enum())
            .with_class(ClassInfo::new("com.acme.Money").with_method(string_ctor()))
            .with_class(
                ClassInfo::new("com.acme.Upload").with_field(form_field("file", "java.io.File")),
            ),
    );
    let indexer = Arc::new(f.indexer);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let indexer = Arc::clone(&indexer);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let location = format!("Resource#endpoint{i}");
                let status = indexer.extract_converter("com.acme.Status", &location).unwrap();
                let money = indexer.extract_converter("com.acme.Money", &location).unwrap();
                let int = indexer.extract_converter("int", &location).unwrap();
                let populator = indexer.bind_multipart_class("com.acme.Upload").unwrap();
                (status, money, int, populator)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker panicked"))
        .collect();
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));

    let mut names: Vec<_> = f
        .sink
        .units()
        .iter()
        .map(|u| u.name().to_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "com.acme.Money$quarkusrestparamConverter$".to_owned(),
            "com.acme.Status$quarkusrestparamConverter$".to_owned(),
            "com.acme.Upload_generated_populator".to_owned(),
            "io.quarkus.generated.int$quarkusrestparamConverter$".to_owned(),
        ]
    );
    assert_eq!(f.sink.transforms_for("com.acme.Upload").len(), 1);
    assert_eq!(
        f.sink
            .units()
            .iter()
            .filter(|u| matches!(u, GeneratedUnit::Converter(_)))
            .count(),
        3
    );
}
