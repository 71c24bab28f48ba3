use crate::*;
use crate::layer1_refs;
use crate::layer2_inline;
use crate::layer3_layout;
use ja_core::{Archive, EncodedNode, Fields, Identity, Layout, RootKey};
use serde_json::json;
use std::collections::BTreeMap;

fn id(n: u64) -> Identity {
    Identity::new(n)
}

fn reference(n: u64) -> EncodedNode {
    EncodedNode::Reference(id(n))
}

fn node(tag: &str, fields: Vec<(&str, EncodedNode)>) -> EncodedNode {
    EncodedNode::object(tag, fields.into_iter().collect::<Fields>())
}

fn archive(roots: Vec<(RootKey, EncodedNode)>, objects: Vec<(u64, EncodedNode)>) -> Archive {
    let objects: BTreeMap<Identity, EncodedNode> =
        objects.into_iter().map(|(n, node)| (id(n), node)).collect();
    Archive::new(roots, objects, false)
}

fn literal_root(value: &str) -> Archive {
    archive(vec![(RootKey::Index(0), EncodedNode::String(value.into()))], vec![])
}

fn cycle() -> Archive {
    archive(
        vec![(RootKey::Index(0), reference(1))],
        vec![
            (1, node("Node", vec![("next", reference(2))])),
            (2, node("Node", vec![("next", reference(1))])),
        ],
    )
}

// ========== Layer 1: Refs ==========

#[test]
fn test_l1_counts_roots_and_objects() {
    let counts = layer1_refs::incoming_counts(&cycle());
    assert_eq!(layer1_refs::count_for(&counts, id(1)), 2);
    assert_eq!(layer1_refs::count_for(&counts, id(2)), 1);
}

#[test]
fn test_l1_unreferenced_is_zero() {
    let counts = layer1_refs::incoming_counts(&literal_root("hi"));
    assert!(counts.is_empty());
    assert_eq!(layer1_refs::count_for(&counts, id(5)), 0);
}

#[test]
fn test_l1_counts_nested_arrays() {
    let a = archive(
        vec![(RootKey::Index(0), reference(1))],
        vec![
            (1, EncodedNode::Array(vec![
                EncodedNode::String("List".into()),
                reference(2),
                reference(2),
            ])),
            (2, EncodedNode::String("a long shared string".into())),
        ],
    );
    let counts = layer1_refs::incoming_counts(&a);
    assert_eq!(layer1_refs::count_for(&counts, id(2)), 2);
}

// ========== Layer 2: Inline ==========

#[test]
fn test_l2_inlines_unshared_root() {
    let mut a = archive(
        vec![(RootKey::Key("person".into()), reference(1))],
        vec![(1, node("Person", vec![("name", EncodedNode::String("Ada".into()))]))],
    );
    let counts = layer1_refs::incoming_counts(&a);
    let inlined = layer2_inline::inline_unshared_roots(&mut a, &counts);
    assert_eq!(inlined, vec![id(1)]);
    assert!(a.is_empty());
    assert_eq!(a.root("person").unwrap().type_tag(), Some("Person"));
}

#[test]
fn test_l2_keeps_root_in_cycle() {
    let mut a = cycle();
    let counts = layer1_refs::incoming_counts(&a);
    assert!(layer2_inline::inline_unshared_roots(&mut a, &counts).is_empty());
    assert_eq!(a.len(), 2);
}

#[test]
fn test_l2_keeps_root_shared_by_two_roots() {
    let mut a = archive(
        vec![
            (RootKey::Key("a".into()), reference(1)),
            (RootKey::Key("b".into()), reference(1)),
        ],
        vec![(1, node("Shared", vec![]))],
    );
    let counts = layer1_refs::incoming_counts(&a);
    assert!(layer2_inline::inline_unshared_roots(&mut a, &counts).is_empty());
    assert_eq!(a.root("a"), Some(&reference(1)));
}

#[test]
fn test_l2_leaves_non_root_nodes_alone() {
    let mut a = archive(
        vec![(RootKey::Index(0), reference(1))],
        vec![
            (1, node("Parent", vec![("child", reference(2))])),
            (2, node("Child", vec![])),
        ],
    );
    let counts = layer1_refs::incoming_counts(&a);
    let inlined = layer2_inline::inline_unshared_roots(&mut a, &counts);
    assert_eq!(inlined, vec![id(1)]);
    // the child has a single referrer too, but it is not a root
    assert_eq!(a.object(id(2)).and_then(|n| n.type_tag()), Some("Child"));
}

#[test]
fn test_l2_is_unshared() {
    let counts = layer1_refs::incoming_counts(&cycle());
    assert!(!layer2_inline::is_unshared(&reference(1), &counts));
    assert!(layer2_inline::is_unshared(&reference(2), &counts));
    assert!(!layer2_inline::is_unshared(&EncodedNode::Null, &counts));
}

// ========== Layer 3: Layout ==========

#[test]
fn test_l3_bare_for_single_indexed_root() {
    assert_eq!(layer3_layout::choose_layout(&literal_root("hi")), Layout::Bare);
}

#[test]
fn test_l3_flat_for_keyed_roots() {
    let a = archive(vec![(RootKey::Key("greeting".into()), EncodedNode::String("hi".into()))], vec![]);
    assert_eq!(layer3_layout::choose_layout(&a), Layout::Flat);
}

#[test]
fn test_l3_flat_for_several_indexed_roots() {
    let a = archive(
        vec![
            (RootKey::Index(0), EncodedNode::Bool(true)),
            (RootKey::Index(1), EncodedNode::Bool(false)),
        ],
        vec![],
    );
    assert_eq!(layer3_layout::choose_layout(&a), Layout::Flat);
}

#[test]
fn test_l3_standard_when_objects_remain() {
    assert_eq!(layer3_layout::choose_layout(&cycle()), Layout::Standard);
}

// ========== Pipeline ==========

#[test]
fn test_pipeline_bare_literal() {
    let result = RootCompactor::full().compact(literal_root("hi"));
    assert_eq!(result.layout, Layout::Bare);
    assert_eq!(result.archive.to_json().unwrap(), json!("hi"));
    assert!(result.changed());
}

#[test]
fn test_pipeline_inline_then_bare() {
    let a = archive(
        vec![(RootKey::Index(0), reference(3))],
        vec![(3, node("Point", vec![("x", EncodedNode::Bool(true))]))],
    );
    let result = RootCompactor::full().compact(a);
    assert_eq!(result.inlined, vec![id(3)]);
    assert_eq!((result.objects_before, result.objects_after), (1, 0));
    assert_eq!(result.archive.to_json().unwrap(), json!({"$class": "Point", "x": true}));
}

#[test]
fn test_pipeline_inline_level_keeps_standard_shape() {
    let a = archive(
        vec![(RootKey::Index(0), reference(3))],
        vec![(3, node("Point", vec![]))],
    );
    let result = RootCompactor::inline_only().compact(a);
    assert_eq!(result.layout, Layout::Standard);
    assert_eq!(result.layers_applied, vec!["refs", "inline"]);
    assert_eq!(
        result.archive.to_json().unwrap(),
        json!({"$roots": {"$0": {"$class": "Point"}}, "$objects": {}})
    );
}

#[test]
fn test_pipeline_cycle_unchanged() {
    let before = cycle();
    let result = RootCompactor::default().compact(before.clone());
    assert!(!result.changed());
    assert_eq!(result.archive, before);
    assert_eq!(result.layers_applied, vec!["refs", "inline", "layout"]);
}

#[test]
fn test_pipeline_preserves_every_identity() {
    let a = archive(
        vec![
            (RootKey::Key("parent".into()), reference(1)),
            (RootKey::Key("other".into()), reference(3)),
        ],
        vec![
            (1, node("Parent", vec![("child", reference(2))])),
            (2, node("Child", vec![("back", reference(3))])),
            (3, node("Leaf", vec![])),
        ],
    );
    let result = RootCompactor::full().compact(a);
    let mut present: Vec<u64> = result.archive.into_iter().map(|(id, _)| id.get()).collect();
    present.extend(result.inlined.iter().map(|id| id.get()));
    present.sort_unstable();
    assert_eq!(present, vec![1, 2, 3]);
}

#[test]
fn test_pipeline_empty_archive() {
    let result = RootCompactor::full().compact(archive(vec![], vec![]));
    assert_eq!(result.layout, Layout::Flat);
    assert_eq!(result.archive.to_json().unwrap(), json!({}));
}
