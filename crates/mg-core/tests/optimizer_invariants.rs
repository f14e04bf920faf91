//! Whole-graph invariants of the optimizer: termination, monotonicity,
//! idempotence, and equivalence of what a leaf observes before and after.

use glam::{Mat3, Vec2};
use mg_core::model::{
    Color, CompGraph, KeyFrame, KeyFrames, Node, NodeIndex, NodeKind, ShapeProps, SlotKind,
    StrokeAttrs, VisualProps,
};
use mg_core::name::PropName;
use mg_core::optimize::optimize;
use mg_core::serializer::to_yaml;
use mg_core::simplify::shape_transform;

// ─── Helpers ─────────────────────────────────────────────────────────────

fn add_sprite(graph: &mut CompGraph, parent: NodeIndex, color: Color) -> NodeIndex {
    let sprite = graph.add_child(
        parent,
        Node::new(NodeKind::SpriteShape {
            transform: ShapeProps::default(),
            stroke: StrokeAttrs::default(),
        }),
    );
    let brush = graph.add_node(Node::new(NodeKind::ColorBrush { color }));
    graph.set_slot(sprite, SlotKind::FillBrush, brush);
    sprite
}

/// The composed static transform a sprite shape observes from its shape
/// ancestors.
fn composed_transform(graph: &CompGraph, leaf: NodeIndex) -> Mat3 {
    let mut m = Mat3::IDENTITY;
    let mut current = Some(leaf);
    while let Some(idx) = current {
        match graph.node(idx).kind.shape_props() {
            Some(props) => m = shape_transform(props) * m,
            None => break,
        }
        current = graph.parent(idx);
    }
    m
}

/// Find the surviving sprite shapes, in tree order.
fn sprite_shapes(graph: &CompGraph) -> Vec<NodeIndex> {
    let mut out = Vec::new();
    let mut stack = vec![graph.root];
    while let Some(idx) = stack.pop() {
        if matches!(graph.node(idx).kind, NodeKind::SpriteShape { .. }) {
            out.push(idx);
        }
        if graph.node(idx).kind.has_children() {
            let mut children = graph.children(idx);
            children.reverse();
            stack.extend(children);
        }
    }
    out
}

/// A deep tree exercising most of the shape passes at once.
fn deep_fixture() -> CompGraph {
    let mut g = CompGraph::new();
    let visual = g.add_child(
        g.root,
        Node::new(NodeKind::ShapeVisual(VisualProps {
            size: Some(Vec2::new(256.0, 256.0)),
            ..Default::default()
        })),
    );
    let a = g.add_child(
        visual,
        Node::new(NodeKind::ContainerShape(ShapeProps {
            offset: Some(Vec2::new(5.0, 0.0)),
            ..Default::default()
        })),
    );
    let b = g.add_child(
        a,
        Node::new(NodeKind::ContainerShape(ShapeProps {
            rotation_degrees: Some(90.0),
            center_point: Some(Vec2::new(10.0, 10.0)),
            ..Default::default()
        })),
    );
    let c = g.add_child(b, Node::new(NodeKind::ContainerShape(ShapeProps::default())));
    add_sprite(&mut g, c, Color::rgba(1.0, 0.0, 0.0, 1.0));

    // An empty subtree and a transparent sprite that must vanish.
    let empty = g.add_child(visual, Node::new(NodeKind::ContainerShape(ShapeProps::default())));
    g.add_child(empty, Node::new(NodeKind::ContainerShape(ShapeProps::default())));
    let junk = g.add_child(visual, Node::new(NodeKind::ContainerShape(ShapeProps::default())));
    add_sprite(&mut g, junk, Color::TRANSPARENT);

    g
}

// ─── Invariants ──────────────────────────────────────────────────────────

#[test]
fn node_count_is_non_increasing() {
    let mut g = deep_fixture();
    let before = g.reachable_count();
    optimize(&mut g);
    assert!(
        g.reachable_count() <= before,
        "optimizer must never grow the graph"
    );
}

#[test]
fn optimize_is_idempotent() {
    let mut g = deep_fixture();
    optimize(&mut g);
    let first = to_yaml(&g);
    optimize(&mut g);
    let second = to_yaml(&g);
    assert_eq!(first, second, "a second run must be a no-op");
}

#[test]
fn leaf_transform_is_preserved() {
    let mut g = deep_fixture();
    let before: Vec<Mat3> = sprite_shapes(&g)
        .into_iter()
        .map(|s| composed_transform(&g, s))
        .collect();

    optimize(&mut g);

    let after: Vec<Mat3> = sprite_shapes(&g)
        .into_iter()
        .map(|s| composed_transform(&g, s))
        .collect();

    // Only the opaque sprite survives; its composed transform is intact.
    assert_eq!(after.len(), 1);
    assert!(
        after[0].abs_diff_eq(before[0], 1e-4),
        "composed transform changed:\nbefore {:?}\nafter {:?}",
        before[0],
        after[0]
    );
}

#[test]
fn ownership_stays_a_tree() {
    let mut g = deep_fixture();
    optimize(&mut g);

    let mut stack = vec![g.root];
    let mut seen = std::collections::HashSet::new();
    while let Some(idx) = stack.pop() {
        assert!(seen.insert(idx), "node owned twice: {idx:?}");
        if idx != g.root {
            assert!(g.parent(idx).is_some(), "non-root node without owner");
        }
        if g.node(idx).kind.has_children() {
            stack.extend(g.children(idx));
        }
    }
}

#[test]
fn surviving_brushes_are_unchanged() {
    let mut g = deep_fixture();
    optimize(&mut g);

    let sprites = sprite_shapes(&g);
    assert_eq!(sprites.len(), 1);
    let brush = g
        .slot(sprites[0], SlotKind::FillBrush)
        .expect("fill brush preserved");
    let NodeKind::ColorBrush { color } = g.node(brush).kind else {
        panic!("expected color brush");
    };
    assert_eq!(color, Color::rgba(1.0, 0.0, 0.0, 1.0));
}

#[test]
fn animators_survive_container_elision() {
    let mut g = CompGraph::new();
    let visual = g.add_child(
        g.root,
        Node::new(NodeKind::ShapeVisual(VisualProps::default())),
    );
    let wrapper = g.add_child(
        visual,
        Node::new(NodeKind::ContainerShape(ShapeProps::default())),
    );
    let sprite = add_sprite(&mut g, wrapper, Color::rgba(0.0, 0.0, 1.0, 1.0));

    let easing = g.add_node(Node::new(NodeKind::LinearEasing));
    let anim = g.add_node(Node::new(NodeKind::KeyFrameAnimation(KeyFrames::Vec2(
        vec![
            KeyFrame {
                progress: 0.0,
                value: Vec2::ZERO,
                easing: Some(easing),
            },
            KeyFrame {
                progress: 1.0,
                value: Vec2::new(40.0, 0.0),
                easing: Some(easing),
            },
        ],
    ))));
    g.start_animation(wrapper, PropName::intern("Offset"), anim, None);

    optimize(&mut g);

    // The wrapper may be gone, but its offset animator must live on,
    // still bound to the same animation node.
    let carrier = sprite_shapes(&g)
        .into_iter()
        .find(|&s| s == sprite)
        .expect("sprite survives");
    let holder = if g.node(carrier).is_animated("Offset") {
        carrier
    } else {
        g.parent(carrier).expect("animated ancestor")
    };
    let animator = g
        .animators(holder)
        .iter()
        .find(|a| a.target.as_str() == "Offset")
        .expect("offset animator preserved");
    assert_eq!(animator.animation, anim);
}

#[test]
fn surface_source_transforms_are_not_hoisted() {
    let mut g = CompGraph::new();
    let source = g.add_child(
        g.root,
        Node::new(NodeKind::ContainerVisual(VisualProps::default())),
    );
    let child = g.add_child(
        source,
        Node::new(NodeKind::SpriteVisual(VisualProps {
            offset: Some(glam::Vec3::new(7.0, 0.0, 0.0)),
            ..Default::default()
        })),
    );
    // Register `source` as a visual-surface source.
    g.add_node(Node::new(NodeKind::VisualSurface {
        source: Some(source),
        source_size: None,
        source_offset: None,
    }));

    optimize(&mut g);

    assert!(g.contains(source), "surface source must not be elided");
    let NodeKind::ContainerVisual(props) = &g.node(source).kind else {
        panic!("expected container visual");
    };
    assert!(
        props.offset.is_none(),
        "child transform must not be hoisted onto a surface source"
    );
    assert_eq!(g.parent(child), Some(source));
}

#[test]
fn empty_graph_is_a_fixed_point() {
    let mut g = CompGraph::new();
    optimize(&mut g);
    assert_eq!(g.reachable_count(), 1);
    optimize(&mut g);
    assert_eq!(g.reachable_count(), 1);
}
