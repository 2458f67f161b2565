//! Parsing and replaying scene files from disk

use gem_cast::Value;
use gem_indented::{parse_file, parse_str, NodeId, NodeRegistry, ParseOptions, Scene};

#[test]
fn test_equal_indents_share_parent() {
    let parsed = parse_str("A:\n    B:\n    C:\n", &ParseOptions::default());
    let tree = &parsed.tree;
    assert_eq!(tree.parent(NodeId(1)), Some(NodeId(0)));
    assert_eq!(tree.parent(NodeId(2)), Some(NodeId(0)));
}

#[test]
fn test_dedent_has_no_parent() {
    let parsed = parse_str("A:\n    B:\nC:\n", &ParseOptions::default());
    let tree = &parsed.tree;
    assert_eq!(tree.parent(NodeId(1)), Some(NodeId(0)));
    assert_eq!(tree.parent(NodeId(2)), None);
}

#[test]
fn test_partial_dedent_attaches_to_shallower_node() {
    let parsed = parse_str("A:\n    B:\n C:\n", &ParseOptions::default());
    assert_eq!(parsed.tree.parent(NodeId(2)), Some(NodeId(0)));
}

#[test]
fn test_deep_nesting_and_render() {
    let source = "World:\n  Room hall: 1\n    Lamp: on\n  Room den: 2\n";
    let parsed = parse_str(source, &ParseOptions::default());
    let tree = &parsed.tree;

    assert_eq!(tree.depth(NodeId(2)), 2);
    assert_eq!(tree.parent(NodeId(3)), Some(NodeId(0)));
    assert_eq!(
        tree.to_string(),
        "World:\n    Room: 1\n        Lamp: on\n    Room: 2\n"
    );
}

#[derive(Debug, PartialEq)]
enum Prop {
    Room(i64),
    Lamp(bool),
}

#[test]
fn test_scene_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("house.scene");
    std::fs::write(
        &path,
        "; house layout\nRoom hall: 1\n    Lamp desk: true\n    Broken line\n*Lamp spare: false\n",
    )
    .unwrap();

    let mut registry = NodeRegistry::new();
    registry
        .register("Room", |args| Prop::Room(gem_cast::cast(args).as_int().unwrap_or_default()))
        .register("Lamp", |args| Prop::Lamp(gem_cast::cast(args) == Value::Bool(true)));

    let options = ParseOptions::default().with_cast_args(true);
    let parsed = parse_file(&path, &options).unwrap();
    assert_eq!(parsed.errors.len(), 1);
    assert_eq!(parsed.tree[NodeId(0)].value, Some(Value::Int(1)));

    let scene = Scene::load(&path, &registry, &options).unwrap();
    assert_eq!(scene.get("hall"), Some(&Prop::Room(1)));
    assert_eq!(scene.parent_of("desk"), Some(&Prop::Room(1)));
    assert_eq!(scene.get("spare"), Some(&Prop::Lamp(false)));
    assert_eq!(scene.parent_of("spare"), None);
}
