use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ja_core::{Archive, ArchiverConfig, EncodedNode, Fields, Identity, NumberNode, RootKey};
use std::collections::BTreeMap;

fn make_archive(count: u64) -> Archive {
    let mut objects = BTreeMap::new();
    for i in 1..=count {
        let mut fields = Fields::new();
        fields.insert("index", EncodedNode::Number(NumberNode::UInt(i)));
        fields.insert("label", EncodedNode::String(format!("node {i}")));
        let next = if i == count { 1 } else { i + 1 };
        fields.insert("next", EncodedNode::Reference(Identity::new(next)));
        objects.insert(Identity::new(i), EncodedNode::object("Node", fields));
    }
    Archive::new(
        vec![(RootKey::Index(0), EncodedNode::Reference(Identity::new(1)))],
        objects,
        false,
    )
}

fn bench_archive_serialization(c: &mut Criterion) {
    let archive = make_archive(1000);
    c.bench_function("archive_serialize_1000_nodes", |b| {
        b.iter(|| black_box(serde_json::to_string(black_box(&archive)).unwrap()))
    });

    c.bench_function("archive_to_json_value_1000_nodes", |b| {
        b.iter(|| black_box(archive.to_json().unwrap()))
    });
}

fn bench_fields(c: &mut Criterion) {
    c.bench_function("fields_insert_32", |b| {
        b.iter(|| {
            let mut fields = Fields::new();
            for i in 0..32 {
                fields.insert(format!("field_{i}"), EncodedNode::Bool(i % 2 == 0));
            }
            black_box(fields)
        })
    });
}

fn bench_config_parsing(c: &mut Criterion) {
    let json_str = serde_json::to_string(&ArchiverConfig::default()).unwrap();
    c.bench_function("config_parse_1000", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                black_box(ArchiverConfig::from_json(black_box(&json_str)).unwrap());
            }
        })
    });
}

criterion_group!(benches, bench_archive_serialization, bench_fields, bench_config_parsing);
criterion_main!(benches);
