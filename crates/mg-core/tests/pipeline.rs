//! End-to-end: BodyMovin JSON → parse → translate → optimize → emit.

use mg_core::codegen::{CodegenConfiguration, generate};
use mg_core::issues::Issues;
use mg_core::optimize::optimize;
use mg_core::parser::parse;
use mg_core::serializer::to_yaml;
use mg_core::translate::translate;

/// A small but real document: one shape layer with a filled rectangle in a
/// group, plus a null layer that parents nothing.
const CHECKBOX: &str = r#"{
  "v": "5.5.2", "nm": "checkbox", "fr": 30,
  "w": 200, "h": 200, "ip": 0, "op": 60,
  "layers": [
    {
      "ty": 4, "nm": "box", "ind": 1, "ip": 0, "op": 60, "st": 0,
      "ks": {
        "p": {"a": 0, "k": [100, 100]},
        "a": {"a": 0, "k": [50, 50]},
        "o": {"a": 1, "k": [
          {"t": 0, "s": [0], "o": {"x": 0.42, "y": 0}, "i": {"x": 0.58, "y": 1}},
          {"t": 60, "s": [100]}
        ]}
      },
      "shapes": [
        {"ty": "gr", "nm": "square", "it": [
          {"ty": "rc", "p": {"a": 0, "k": [50, 50]}, "s": {"a": 0, "k": [80, 80]}, "r": {"a": 0, "k": 0}},
          {"ty": "fl", "c": {"a": 0, "k": [0.2, 0.6, 0.2, 1]}, "o": {"a": 0, "k": 100}},
          {"ty": "tr", "p": {"a": 0, "k": [0, 0]}, "a": {"a": 0, "k": [0, 0]}, "o": {"a": 0, "k": 100}}
        ]}
      ]
    },
    {"ty": 3, "nm": "anchor", "ind": 2, "ip": 0, "op": 60, "st": 0}
  ]
}"#;

#[test]
fn pipeline_shrinks_and_emits() {
    let mut issues = Issues::new();
    let composition = parse(CHECKBOX, &mut issues).expect("parse failed");
    assert_eq!(composition.layers.len(), 2);

    let mut graph = translate(&composition, &mut issues);
    let before = graph.reachable_count();
    optimize(&mut graph);
    let after = graph.reachable_count();
    assert!(
        after < before,
        "optimizer should shrink the translated tree ({before} -> {after})"
    );

    // The animated opacity must survive optimization.
    let yaml = to_yaml(&graph);
    assert!(yaml.contains("target: Opacity"), "opacity animator lost:\n{yaml}");
    assert!(yaml.contains("kind: SpriteShape"), "sprite shape lost:\n{yaml}");
    assert!(yaml.contains("RectangleGeometry"), "geometry lost:\n{yaml}");

    let config = CodegenConfiguration {
        class_name: "Checkbox".into(),
        namespace: "tests::generated".into(),
        width: composition.width,
        height: composition.height,
        duration_nanos: composition.duration_nanos(),
        disable_optimization: false,
        source_metadata: vec!["source: checkbox (inline fixture)".into()],
    };
    let source = generate(&graph, &config);
    assert!(source.contains("pub struct Checkbox;"));
    assert!(source.contains("pub fn build() -> CompGraph"));
    assert!(source.contains("start_animation"));
}

#[test]
fn pipeline_is_stable_under_reoptimization() {
    let mut issues = Issues::new();
    let composition = parse(CHECKBOX, &mut issues).expect("parse failed");
    let mut graph = translate(&composition, &mut issues);

    optimize(&mut graph);
    let first = to_yaml(&graph);
    optimize(&mut graph);
    assert_eq!(first, to_yaml(&graph));
}

#[test]
fn unsupported_constructs_become_issues_not_errors() {
    let json = r#"{
      "v": "5.5.2", "fr": 30, "w": 10, "h": 10, "ip": 0, "op": 30,
      "layers": [
        {"ty": 5, "ip": 0, "op": 30},
        {"ty": 3, "ip": 0, "op": 30}
      ]
    }"#;
    let mut issues = Issues::new();
    let composition = parse(json, &mut issues).expect("parse failed");
    let graph = translate(&composition, &mut issues);

    assert!(issues.iter().any(|i| i.code == "LT0010"), "text layer issue expected");
    assert!(graph.reachable_count() >= 1);
}
