//! Graph optimizer: a fixed-point suite of local rewrites.
//!
//! Each pass has a single responsibility and is safe to compose. Passes
//! visit a snapshot of the arena taken at pass start and re-check their
//! preconditions per node, because earlier visits may have changed the
//! graph. A rewrite whose preconditions fail declines silently.
//!
//! Every rewrite preserves the composed transform, clip, opacity, and
//! visibility observed at every leaf. The driver loops until a full sweep
//! reports no progress.

use crate::index::GraphIndex;
use crate::model::{
    CompGraph, KeyFrame, KeyFrames, Node, NodeIndex, NodeKind, SlotKind, VisualProps,
};
use crate::name::PropName;
use crate::simplify::simplify_properties;
use glam::{Mat3, Vec2};
use std::ops::BitOr;

// ─── Property bitset ─────────────────────────────────────────────────────

/// Bitmask over the property ids that are non-default or animated on a
/// node. Drives the orthogonality checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropMask(u32);

impl PropMask {
    pub const EMPTY: PropMask = PropMask(0);
    pub const CENTER_POINT: PropMask = PropMask(1 << 0);
    pub const OFFSET: PropMask = PropMask(1 << 1);
    pub const ROTATION: PropMask = PropMask(1 << 2);
    pub const ROTATION_AXIS: PropMask = PropMask(1 << 3);
    pub const SCALE: PropMask = PropMask(1 << 4);
    pub const TRANSFORM_MATRIX: PropMask = PropMask(1 << 5);
    pub const CLIP: PropMask = PropMask(1 << 6);
    pub const SIZE: PropMask = PropMask(1 << 7);
    pub const OPACITY: PropMask = PropMask(1 << 8);
    pub const IS_VISIBLE: PropMask = PropMask(1 << 9);
    pub const BORDER_MODE: PropMask = PropMask(1 << 10);
    pub const COLOR: PropMask = PropMask(1 << 11);
    pub const PATH: PropMask = PropMask(1 << 12);
    pub const TRIM_START: PropMask = PropMask(1 << 13);
    pub const TRIM_END: PropMask = PropMask(1 << 14);
    pub const TRIM_OFFSET: PropMask = PropMask(1 << 15);
    pub const PROGRESS: PropMask = PropMask(1 << 16);
    pub const STROKE_THICKNESS: PropMask = PropMask(1 << 17);
    /// Animated property name not in the table. Vetoes every
    /// orthogonality check.
    pub const UNKNOWN: PropMask = PropMask(1 << 31);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn intersects(self, other: PropMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn contains(self, other: PropMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PropMask {
    type Output = PropMask;
    fn bitor(self, rhs: PropMask) -> PropMask {
        PropMask(self.0 | rhs.0)
    }
}

/// Map an animated property name to its property id.
fn mask_for_property_name(name: &str) -> PropMask {
    match name {
        "CenterPoint" => PropMask::CENTER_POINT,
        "Offset" | "Position" | "Translation" => PropMask::OFFSET,
        "RotationAngleInDegrees" => PropMask::ROTATION,
        "RotationAxis" => PropMask::ROTATION_AXIS,
        "Scale" => PropMask::SCALE,
        "TransformMatrix" => PropMask::TRANSFORM_MATRIX,
        "Size" => PropMask::SIZE,
        "Opacity" => PropMask::OPACITY,
        "IsVisible" => PropMask::IS_VISIBLE,
        "Color" => PropMask::COLOR,
        "Path" => PropMask::PATH,
        "TrimStart" => PropMask::TRIM_START,
        "TrimEnd" => PropMask::TRIM_END,
        "TrimOffset" => PropMask::TRIM_OFFSET,
        "Progress" => PropMask::PROGRESS,
        "StrokeThickness" => PropMask::STROKE_THICKNESS,
        _ => PropMask::UNKNOWN,
    }
}

/// The set of non-default property slots plus animated property names of a
/// node.
pub fn node_mask(graph: &CompGraph, idx: NodeIndex) -> PropMask {
    let node = graph.node(idx);
    let mut mask = PropMask::EMPTY;

    match &node.kind {
        NodeKind::ContainerVisual(p) | NodeKind::ShapeVisual(p) | NodeKind::SpriteVisual(p) => {
            if p.center_point.is_some() {
                mask = mask | PropMask::CENTER_POINT;
            }
            if p.offset.is_some() {
                mask = mask | PropMask::OFFSET;
            }
            if p.rotation_degrees.is_some() {
                mask = mask | PropMask::ROTATION;
            }
            if p.rotation_axis.is_some() {
                mask = mask | PropMask::ROTATION_AXIS;
            }
            if p.scale.is_some() {
                mask = mask | PropMask::SCALE;
            }
            if p.transform_matrix.is_some() {
                mask = mask | PropMask::TRANSFORM_MATRIX;
            }
            if p.size.is_some() {
                mask = mask | PropMask::SIZE;
            }
            if p.opacity.is_some() {
                mask = mask | PropMask::OPACITY;
            }
            if p.is_visible.is_some() {
                mask = mask | PropMask::IS_VISIBLE;
            }
            if p.border_mode.is_some() {
                mask = mask | PropMask::BORDER_MODE;
            }
            if graph.slot(idx, SlotKind::Clip).is_some() {
                mask = mask | PropMask::CLIP;
            }
        }
        NodeKind::ContainerShape(p) | NodeKind::SpriteShape { transform: p, .. } => {
            if p.center_point.is_some() {
                mask = mask | PropMask::CENTER_POINT;
            }
            if p.offset.is_some() {
                mask = mask | PropMask::OFFSET;
            }
            if p.rotation_degrees.is_some() {
                mask = mask | PropMask::ROTATION;
            }
            if p.scale.is_some() {
                mask = mask | PropMask::SCALE;
            }
            if p.transform_matrix.is_some() {
                mask = mask | PropMask::TRANSFORM_MATRIX;
            }
        }
        _ => {}
    }

    for animator in &node.animators {
        mask = mask | mask_for_property_name(animator.target.as_str());
    }
    mask
}

/// Order-compatibility of a parent/child pair under the evaluation order
/// TransformMatrix ↦ Offset ↦ Rotation ↦ Scale. Color, opacity, and path
/// commute through transforms and carry no extra constraint.
pub fn orthogonal(parent: PropMask, child: PropMask) -> bool {
    if parent.intersects(PropMask::UNKNOWN) || child.intersects(PropMask::UNKNOWN) {
        return false;
    }
    if parent.intersects(child) {
        return false;
    }
    if child.contains(PropMask::TRANSFORM_MATRIX)
        && parent.intersects(
            PropMask::OFFSET
                | PropMask::ROTATION
                | PropMask::SCALE
                | PropMask::CLIP
                | PropMask::CENTER_POINT,
        )
    {
        return false;
    }
    if parent.contains(PropMask::ROTATION) && child.intersects(PropMask::OFFSET | PropMask::CLIP) {
        return false;
    }
    if parent.contains(PropMask::SCALE)
        && child.intersects(PropMask::OFFSET | PropMask::ROTATION | PropMask::CLIP)
    {
        return false;
    }
    true
}

// ─── Driver ──────────────────────────────────────────────────────────────

/// Optimize the graph in place: run the pass suite to a fixed point, then
/// sweep unreferenced arena nodes.
pub fn optimize(graph: &mut CompGraph) {
    let mut iteration = 0u32;
    loop {
        iteration += 1;
        log::debug!(
            "optimize: iteration {iteration}, {} reachable nodes",
            graph.reachable_count()
        );

        simplify_properties(graph);
        let index = GraphIndex::build(graph);

        let mut progress = false;
        progress |= elide_transparent_sprite_shapes(graph);
        progress |= coalesce_sibling_container_shapes(graph);
        progress |= elide_empty_container_shapes(graph);
        progress |= elide_structural_container_shapes(graph);
        progress |= push_container_shape_transforms_down(graph);
        progress |= coalesce_single_child_container_shapes(graph);
        progress |= push_properties_down_to_sprite_shape(graph);
        progress |= push_shape_visibility_down(graph);
        progress |= push_shape_tree_visibility_into_visual_tree(graph);

        progress |= push_properties_down_to_shape_visual(graph);
        progress |= coalesce_container_visuals(graph, &index);
        progress |= coalesce_orthogonal_visuals(graph, &index);
        progress |= coalesce_orthogonal_container_visuals(graph, &index);
        progress |= remove_redundant_inset_clip_visuals(graph, &index);

        if !progress {
            break;
        }
    }
    graph.collect_garbage();
    log::debug!(
        "optimize: fixed point after {iteration} iterations, {} nodes",
        graph.reachable_count()
    );
}

// ─── Shared helpers ──────────────────────────────────────────────────────

fn snapshot(graph: &CompGraph) -> Vec<NodeIndex> {
    graph.graph.node_indices().collect()
}

/// Copy author metadata from an eliminated node onto a retained one.
fn propagate_description(graph: &mut CompGraph, from: NodeIndex, to: NodeIndex) {
    let source = graph.node(from);
    let short = source.short_description.clone();
    let long = source.long_description.clone();
    let name = source.name.clone();

    let dest = graph.node_mut(to);
    match (short, &mut dest.short_description) {
        (Some(s), Some(existing)) => *existing = format!("{s} {existing}"),
        (Some(s), none) => *none = Some(s),
        (None, _) => {}
    }
    if dest.long_description.is_none() {
        dest.long_description = long;
    }
    if dest.name.is_none() {
        dest.name = name;
    }
}

/// Detach `idx` from its parent's child sequence (renumbering the
/// siblings) and delete its owned subtree.
fn remove_from_parent(graph: &mut CompGraph, idx: NodeIndex) {
    if let Some(parent) = graph.parent(idx) {
        let mut children = graph.children(parent);
        if let Some(pos) = children.iter().position(|&c| c == idx) {
            children.remove(pos);
            graph.set_children(parent, &children);
        }
    }
    graph.remove_subtree(idx);
}

/// A brush slot is transparent if it is absent or a non-animated color
/// brush with zero alpha.
fn brush_is_transparent(graph: &CompGraph, brush: Option<NodeIndex>) -> bool {
    match brush {
        None => true,
        Some(idx) => match &graph.node(idx).kind {
            NodeKind::ColorBrush { color } => {
                color.a == 0.0 && graph.node(idx).animators.is_empty()
            }
            _ => false,
        },
    }
}

fn vec2_is_visibility(v: Vec2) -> bool {
    v == Vec2::ZERO || v == Vec2::ONE
}

/// True if the node's `Scale` is used solely to toggle visibility: every
/// observable value is `(0,0)` or `(1,1)` and any animation steps between
/// them (step or hold easing on every frame).
fn scale_encodes_visibility(graph: &CompGraph, idx: NodeIndex) -> bool {
    let Some(props) = graph.node(idx).kind.shape_props() else {
        return false;
    };
    if let Some(value) = props.scale
        && !vec2_is_visibility(value)
    {
        return false;
    }

    let scale = PropName::intern("Scale");
    let animator = graph.animators(idx).iter().find(|a| a.target == scale);
    if let Some(animator) = animator {
        let NodeKind::KeyFrameAnimation(KeyFrames::Vec2(frames)) =
            &graph.node(animator.animation).kind
        else {
            return false;
        };
        if frames.is_empty() {
            return false;
        }
        for frame in frames {
            if !vec2_is_visibility(frame.value) {
                return false;
            }
            let steps = frame.easing.is_some_and(|e| {
                matches!(
                    graph.node(e).kind,
                    NodeKind::StepEasing { .. } | NodeKind::HoldEasing
                )
            });
            if !steps {
                return false;
            }
        }
    }
    props.scale.is_some() || animator.is_some()
}

/// Animator equality for sibling coalescing: same target, same animation
/// type, keyframe animations shared by reference, expression animations
/// equal textually with parameters resolving to the same node or to each
/// animator's own owner. Controllers must both be absent, or be the same
/// node, or agree on paused state and their own bindings.
fn animators_equal(
    graph: &CompGraph,
    a_owner: NodeIndex,
    a: &crate::model::Animator,
    b_owner: NodeIndex,
    b: &crate::model::Animator,
) -> bool {
    if a.target != b.target {
        return false;
    }
    let animations_equal = match (&graph.node(a.animation).kind, &graph.node(b.animation).kind) {
        (NodeKind::KeyFrameAnimation(_), NodeKind::KeyFrameAnimation(_)) => {
            a.animation == b.animation
        }
        (
            NodeKind::ExpressionAnimation {
                expression: expr_a,
                references: refs_a,
            },
            NodeKind::ExpressionAnimation {
                expression: expr_b,
                references: refs_b,
            },
        ) => {
            expr_a == expr_b
                && refs_a.len() == refs_b.len()
                && refs_a.iter().zip(refs_b).all(|(&(na, ta), &(nb, tb))| {
                    na == nb && (ta == tb || (ta == a_owner && tb == b_owner))
                })
        }
        _ => false,
    };
    if !animations_equal {
        return false;
    }

    match (a.controller, b.controller) {
        (None, None) => true,
        (Some(ca), Some(cb)) => ca == cb || controllers_equivalent(graph, ca, cb),
        _ => false,
    }
}

fn controllers_equivalent(graph: &CompGraph, a: NodeIndex, b: NodeIndex) -> bool {
    let (
        NodeKind::AnimationController { paused: pa },
        NodeKind::AnimationController { paused: pb },
    ) = (&graph.node(a).kind, &graph.node(b).kind)
    else {
        return false;
    };
    if pa != pb {
        return false;
    }
    let anims_a = graph.animators(a);
    let anims_b = graph.animators(b);
    anims_a.len() == anims_b.len()
        && anims_a
            .iter()
            .zip(anims_b)
            .all(|(x, y)| animators_equal(graph, a, x, b, y))
}

/// Two container shapes are equivalent modulo children when their slots,
/// property sets, and animators agree.
fn shapes_equivalent_modulo_children(graph: &CompGraph, a: NodeIndex, b: NodeIndex) -> bool {
    let node_a = graph.node(a);
    let node_b = graph.node(b);
    let (NodeKind::ContainerShape(props_a), NodeKind::ContainerShape(props_b)) =
        (&node_a.kind, &node_b.kind)
    else {
        return false;
    };
    props_a == props_b
        && node_a.properties.is_empty()
        && node_b.properties.is_empty()
        && node_a.animators.len() == node_b.animators.len()
        && node_a
            .animators
            .iter()
            .zip(&node_b.animators)
            .all(|(x, y)| animators_equal(graph, a, x, b, y))
}

/// Move every property of one visual onto another. Callers guarantee the
/// two property sets are disjoint.
fn transfer_visual_properties(graph: &mut CompGraph, from: NodeIndex, to: NodeIndex) {
    let from_props = *graph
        .node(from)
        .kind
        .visual_props()
        .expect("transfer_visual_properties: source is not a visual");
    {
        let to_props = graph
            .node_mut(to)
            .kind
            .visual_props_mut()
            .expect("transfer_visual_properties: target is not a visual");
        merge_visual_props(to_props, &from_props);
    }

    if let Some(clip) = graph.take_slot(from, SlotKind::Clip) {
        graph.set_slot(to, SlotKind::Clip, clip);
    }

    let animators = std::mem::take(&mut graph.node_mut(from).animators);
    graph.node_mut(to).animators.extend(animators);

    let entries: Vec<_> = graph
        .node(from)
        .properties
        .iter()
        .map(|&(n, v)| (n, v))
        .collect();
    for (name, value) in entries {
        graph.node_mut(to).properties.set(name, value);
    }

    propagate_description(graph, from, to);
}

fn merge_visual_props(dst: &mut VisualProps, src: &VisualProps) {
    if dst.center_point.is_none() {
        dst.center_point = src.center_point;
    }
    if dst.offset.is_none() {
        dst.offset = src.offset;
    }
    if dst.rotation_degrees.is_none() {
        dst.rotation_degrees = src.rotation_degrees;
    }
    if dst.rotation_axis.is_none() {
        dst.rotation_axis = src.rotation_axis;
    }
    if dst.scale.is_none() {
        dst.scale = src.scale;
    }
    if dst.transform_matrix.is_none() {
        dst.transform_matrix = src.transform_matrix;
    }
    if dst.size.is_none() {
        dst.size = src.size;
    }
    if dst.opacity.is_none() {
        dst.opacity = src.opacity;
    }
    if dst.is_visible.is_none() {
        dst.is_visible = src.is_visible;
    }
    if dst.border_mode.is_none() {
        dst.border_mode = src.border_mode;
    }
}

/// Replace `node` with `replacement` in the tree, handling the root case.
fn replace_in_tree(graph: &mut CompGraph, node: NodeIndex, replacement: NodeIndex) {
    if node == graph.root {
        graph.detach(replacement);
        graph.root = replacement;
    } else if let Some(parent) = graph.parent(node) {
        graph.replace_child(parent, node, replacement);
    } else {
        return;
    }
    graph.remove_subtree(node);
}

/// Zero-inset, unanimated `InsetClip` with no center point or scale.
fn clip_is_redundant(graph: &CompGraph, clip: NodeIndex) -> bool {
    let node = graph.node(clip);
    let NodeKind::InsetClip {
        left,
        top,
        right,
        bottom,
        center_point,
        scale,
    } = &node.kind
    else {
        return false;
    };
    *left == 0.0
        && *top == 0.0
        && *right == 0.0
        && *bottom == 0.0
        && center_point.is_none()
        && scale.is_none()
        && node.animators.is_empty()
}

// ─── Shape passes ────────────────────────────────────────────────────────

/// Remove sprite shapes whose fill and stroke are both transparent.
pub fn elide_transparent_sprite_shapes(graph: &mut CompGraph) -> bool {
    let mut progress = false;
    for idx in snapshot(graph) {
        if !graph.contains(idx) {
            continue;
        }
        if !matches!(graph.node(idx).kind, NodeKind::SpriteShape { .. }) {
            continue;
        }
        let fill = graph.slot(idx, SlotKind::FillBrush);
        let stroke = graph.slot(idx, SlotKind::StrokeBrush);
        if brush_is_transparent(graph, fill) && brush_is_transparent(graph, stroke) {
            remove_from_parent(graph, idx);
            progress = true;
        }
    }
    progress
}

/// Merge consecutive sibling container shapes that are equivalent modulo
/// children: their child lists are concatenated under the first.
pub fn coalesce_sibling_container_shapes(graph: &mut CompGraph) -> bool {
    let mut progress = false;
    for parent in snapshot(graph) {
        if !graph.contains(parent) {
            continue;
        }
        if !matches!(
            graph.node(parent).kind,
            NodeKind::ContainerShape(_) | NodeKind::ShapeVisual(_)
        ) {
            continue;
        }

        let kids = graph.children(parent);
        let mut result: Vec<NodeIndex> = Vec::with_capacity(kids.len());
        let mut merged = false;
        for kid in kids {
            if let Some(&prev) = result.last()
                && shapes_equivalent_modulo_children(graph, prev, kid)
            {
                for grandchild in graph.children(kid) {
                    graph.detach(grandchild);
                    graph.append_child(prev, grandchild);
                }
                propagate_description(graph, kid, prev);
                graph.remove_subtree(kid);
                merged = true;
                continue;
            }
            result.push(kid);
        }
        if merged {
            graph.set_children(parent, &result);
            progress = true;
        }
    }
    progress
}

/// Drop container shapes with no children, repeating until stable.
pub fn elide_empty_container_shapes(graph: &mut CompGraph) -> bool {
    let mut progress = false;
    loop {
        let mut changed = false;
        for idx in snapshot(graph) {
            if !graph.contains(idx) {
                continue;
            }
            if !matches!(graph.node(idx).kind, NodeKind::ContainerShape(_)) {
                continue;
            }
            if graph.children(idx).is_empty() {
                remove_from_parent(graph, idx);
                changed = true;
            }
        }
        if !changed {
            break;
        }
        progress = true;
    }
    progress
}

/// Splice out container shapes with no set or animated properties.
pub fn elide_structural_container_shapes(graph: &mut CompGraph) -> bool {
    let mut progress = false;
    for idx in snapshot(graph) {
        if !graph.contains(idx) {
            continue;
        }
        if !matches!(graph.node(idx).kind, NodeKind::ContainerShape(_)) {
            continue;
        }
        if !node_mask(graph, idx).is_empty() || !graph.node(idx).properties.is_empty() {
            continue;
        }
        if graph.parent(idx).is_none() || graph.children(idx).is_empty() {
            continue;
        }
        for child in graph.children(idx) {
            propagate_description(graph, idx, child);
        }
        graph.splice_into_parent(idx);
        progress = true;
    }
    progress
}

/// Fold a matrix-only container into its children: each child's matrix is
/// premultiplied so the pushed matrix still applies outside the child's own
/// transform slots.
pub fn push_container_shape_transforms_down(graph: &mut CompGraph) -> bool {
    let mut progress = false;
    for idx in snapshot(graph) {
        if !graph.contains(idx) {
            continue;
        }
        let NodeKind::ContainerShape(props) = &graph.node(idx).kind else {
            continue;
        };
        let Some(matrix) = props.transform_matrix else {
            continue;
        };
        if node_mask(graph, idx) != PropMask::TRANSFORM_MATRIX
            || !graph.node(idx).animators.is_empty()
            || !graph.node(idx).properties.is_empty()
        {
            continue;
        }
        let children = graph.children(idx);
        if children.is_empty() || graph.parent(idx).is_none() {
            continue;
        }
        let any_child_animated_matrix = children
            .iter()
            .any(|&c| graph.node(c).is_animated("TransformMatrix"));
        if any_child_animated_matrix {
            continue;
        }

        for &child in &children {
            let child_props = graph
                .node_mut(child)
                .kind
                .shape_props_mut()
                .expect("shape container child is not a shape");
            let own = child_props.transform_matrix.unwrap_or(Mat3::IDENTITY);
            child_props.transform_matrix = Some(matrix * own);
            propagate_description(graph, idx, child);
        }
        graph.splice_into_parent(idx);
        progress = true;
    }
    progress
}

/// Transfer a matrix-only container's matrix to its sole container child
/// and splice the parent out.
pub fn coalesce_single_child_container_shapes(graph: &mut CompGraph) -> bool {
    let mut progress = false;
    for idx in snapshot(graph) {
        if !graph.contains(idx) {
            continue;
        }
        let NodeKind::ContainerShape(props) = &graph.node(idx).kind else {
            continue;
        };
        let Some(matrix) = props.transform_matrix else {
            continue;
        };
        if node_mask(graph, idx) != PropMask::TRANSFORM_MATRIX
            || !graph.node(idx).animators.is_empty()
            || !graph.node(idx).properties.is_empty()
            || graph.parent(idx).is_none()
        {
            continue;
        }
        let children = graph.children(idx);
        let &[child] = children.as_slice() else {
            continue;
        };
        if !matches!(graph.node(child).kind, NodeKind::ContainerShape(_)) {
            continue;
        }
        if !graph.node(child).animators.is_empty()
            || node_mask(graph, child).intersects(PropMask::TRANSFORM_MATRIX)
        {
            continue;
        }

        graph
            .node_mut(child)
            .kind
            .shape_props_mut()
            .expect("container shape child")
            .transform_matrix = Some(matrix);
        propagate_description(graph, idx, child);
        graph.splice_into_parent(idx);
        progress = true;
    }
    progress
}

/// Move a container's transform slots and animators onto its sole,
/// property-free sprite child and splice the container out.
pub fn push_properties_down_to_sprite_shape(graph: &mut CompGraph) -> bool {
    let mut progress = false;
    for idx in snapshot(graph) {
        if !graph.contains(idx) {
            continue;
        }
        let NodeKind::ContainerShape(props) = &graph.node(idx).kind else {
            continue;
        };
        let props = *props;
        if !graph.node(idx).properties.is_empty() || graph.parent(idx).is_none() {
            continue;
        }
        let children = graph.children(idx);
        let &[child] = children.as_slice() else {
            continue;
        };
        if !matches!(graph.node(child).kind, NodeKind::SpriteShape { .. }) {
            continue;
        }
        if !node_mask(graph, child).is_empty() {
            continue;
        }

        *graph
            .node_mut(child)
            .kind
            .shape_props_mut()
            .expect("sprite shape") = props;
        let animators = std::mem::take(&mut graph.node_mut(idx).animators);
        graph.node_mut(child).animators.extend(animators);
        propagate_description(graph, idx, child);
        graph.splice_into_parent(idx);
        progress = true;
    }
    progress
}

/// Move a visibility-encoding `Scale` from a container to its sole child.
pub fn push_shape_visibility_down(graph: &mut CompGraph) -> bool {
    let scale_name = PropName::intern("Scale");
    let mut progress = false;
    for idx in snapshot(graph) {
        if !graph.contains(idx) {
            continue;
        }
        if !matches!(graph.node(idx).kind, NodeKind::ContainerShape(_)) {
            continue;
        }
        if node_mask(graph, idx) != PropMask::SCALE
            || !graph.node(idx).properties.is_empty()
            || graph.parent(idx).is_none()
            || !scale_encodes_visibility(graph, idx)
        {
            continue;
        }
        let children = graph.children(idx);
        let &[child] = children.as_slice() else {
            continue;
        };
        if !graph.node(child).kind.is_shape()
            || node_mask(graph, child).intersects(PropMask::SCALE)
        {
            continue;
        }

        let value = graph.node(idx).kind.shape_props().and_then(|p| p.scale);
        if let Some(value) = value {
            graph
                .node_mut(child)
                .kind
                .shape_props_mut()
                .expect("shape child")
                .scale = Some(value);
        }
        if let Some(animator) = graph.stop_animation(idx, scale_name) {
            graph.start_animation(child, scale_name, animator.animation, animator.controller);
        }
        propagate_description(graph, idx, child);
        graph.splice_into_parent(idx);
        progress = true;
    }
    progress
}

/// Rewrite a visibility-encoding `Scale` on a shape visual's sole shape
/// into the visual's `IsVisible` property.
pub fn push_shape_tree_visibility_into_visual_tree(graph: &mut CompGraph) -> bool {
    let scale_name = PropName::intern("Scale");
    let visible_name = PropName::intern("IsVisible");
    let mut progress = false;
    for idx in snapshot(graph) {
        if !graph.contains(idx) {
            continue;
        }
        let NodeKind::ShapeVisual(visual_props) = &graph.node(idx).kind else {
            continue;
        };
        // Merging two visibility timelines is out of scope; decline when
        // the visual already has one.
        if visual_props.is_visible.is_some() || graph.node(idx).is_animated("IsVisible") {
            continue;
        }
        let children = graph.children(idx);
        let &[shape] = children.as_slice() else {
            continue;
        };
        if !node_mask(graph, shape).intersects(PropMask::SCALE)
            || !scale_encodes_visibility(graph, shape)
        {
            continue;
        }

        if let Some(animator) = graph.stop_animation(shape, scale_name) {
            let NodeKind::KeyFrameAnimation(KeyFrames::Vec2(frames)) =
                &graph.node(animator.animation).kind
            else {
                unreachable!("scale_encodes_visibility admitted a non-Vec2 animation");
            };
            let bool_frames: Vec<KeyFrame<bool>> = frames
                .iter()
                .map(|f| KeyFrame {
                    progress: f.progress,
                    value: f.value == Vec2::ONE,
                    easing: None,
                })
                .collect();
            let visibility = graph.add_node(Node::new(NodeKind::KeyFrameAnimation(
                KeyFrames::Bool(bool_frames),
            )));
            graph.start_animation(idx, visible_name, visibility, animator.controller);
        } else if graph.node(shape).kind.shape_props().and_then(|p| p.scale)
            == Some(Vec2::ZERO)
        {
            // Statically hidden shape, no timeline to carry over.
            let NodeKind::ShapeVisual(props) = &mut graph.node_mut(idx).kind else {
                unreachable!()
            };
            props.is_visible = Some(false);
        }
        graph
            .node_mut(shape)
            .kind
            .shape_props_mut()
            .expect("shape child")
            .scale = None;
        progress = true;
    }
    progress
}

// ─── Visual passes ───────────────────────────────────────────────────────

/// Drop a redundant clip and size from a container whose sole shape-visual
/// child implies them.
pub fn push_properties_down_to_shape_visual(graph: &mut CompGraph) -> bool {
    let mut progress = false;
    for idx in snapshot(graph) {
        if !graph.contains(idx) {
            continue;
        }
        let NodeKind::ContainerVisual(props) = &graph.node(idx).kind else {
            continue;
        };
        let size = props.size;
        if node_mask(graph, idx) != (PropMask::CLIP | PropMask::SIZE) {
            continue;
        }
        let Some(clip) = graph.slot(idx, SlotKind::Clip) else {
            continue;
        };
        if !clip_is_redundant(graph, clip) {
            continue;
        }
        let children = graph.children(idx);
        let &[child] = children.as_slice() else {
            continue;
        };
        let NodeKind::ShapeVisual(child_props) = &graph.node(child).kind else {
            continue;
        };
        if size.is_none() || child_props.size != size {
            continue;
        }

        graph.clear_slot(idx, SlotKind::Clip);
        let NodeKind::ContainerVisual(props) = &mut graph.node_mut(idx).kind else {
            unreachable!()
        };
        props.size = None;
        progress = true;
    }
    progress
}

/// Splice out container visuals with no set or animated properties.
pub fn coalesce_container_visuals(graph: &mut CompGraph, index: &GraphIndex) -> bool {
    let mut progress = false;
    for idx in snapshot(graph) {
        if !graph.contains(idx) || idx == graph.root {
            continue;
        }
        if !matches!(graph.node(idx).kind, NodeKind::ContainerVisual(_)) {
            continue;
        }
        if !node_mask(graph, idx).is_empty()
            || !graph.node(idx).properties.is_empty()
            || !index.in_references(idx).is_empty()
        {
            continue;
        }
        let Some(parent) = graph.parent(idx) else {
            continue;
        };
        if !graph.node(parent).kind.is_visual() || graph.children(idx).is_empty() {
            continue;
        }
        for child in graph.children(idx) {
            propagate_description(graph, idx, child);
        }
        graph.splice_into_parent(idx);
        progress = true;
    }
    progress
}

/// Fold a container visual into its sole sprite or shape child when their
/// property sets are orthogonal.
pub fn coalesce_orthogonal_visuals(graph: &mut CompGraph, index: &GraphIndex) -> bool {
    let mut progress = false;
    for idx in snapshot(graph) {
        if !graph.contains(idx) {
            continue;
        }
        if !matches!(graph.node(idx).kind, NodeKind::ContainerVisual(_)) {
            continue;
        }
        let parent = graph.parent(idx);
        let parent_is_container = parent
            .is_some_and(|p| matches!(graph.node(p).kind, NodeKind::ContainerVisual(_)));
        if !(parent_is_container || idx == graph.root) {
            continue;
        }
        let children = graph.children(idx);
        let &[child] = children.as_slice() else {
            continue;
        };
        if !matches!(
            graph.node(child).kind,
            NodeKind::SpriteVisual(_) | NodeKind::ShapeVisual(_)
        ) {
            continue;
        }
        if !index.in_references(idx).is_empty() || index.is_surface_source(child) {
            continue;
        }
        if !orthogonal(node_mask(graph, idx), node_mask(graph, child)) {
            continue;
        }

        transfer_visual_properties(graph, idx, child);
        replace_in_tree(graph, idx, child);
        progress = true;
    }
    progress
}

/// Fold a container visual's sole container child upward when their
/// property sets are orthogonal.
pub fn coalesce_orthogonal_container_visuals(graph: &mut CompGraph, index: &GraphIndex) -> bool {
    let mut progress = false;
    for idx in snapshot(graph) {
        if !graph.contains(idx) {
            continue;
        }
        if !matches!(graph.node(idx).kind, NodeKind::ContainerVisual(_)) {
            continue;
        }
        let children = graph.children(idx);
        let &[child] = children.as_slice() else {
            continue;
        };
        if !matches!(graph.node(child).kind, NodeKind::ContainerVisual(_)) {
            continue;
        }
        // Hoisting the child's transforms onto a surface source would hide
        // them from the runtime; an in-referenced child must stay.
        if index.is_surface_source(idx) || !index.in_references(child).is_empty() {
            continue;
        }
        if !orthogonal(node_mask(graph, idx), node_mask(graph, child)) {
            continue;
        }

        transfer_visual_properties(graph, child, idx);
        graph.splice_into_parent(child);
        progress = true;
    }
    progress
}

/// Replace a `{zero InsetClip, Size}` container with its same-size shape
/// visual child.
pub fn remove_redundant_inset_clip_visuals(graph: &mut CompGraph, index: &GraphIndex) -> bool {
    let mut progress = false;
    for idx in snapshot(graph) {
        if !graph.contains(idx) {
            continue;
        }
        let NodeKind::ContainerVisual(props) = &graph.node(idx).kind else {
            continue;
        };
        let size = props.size;
        if node_mask(graph, idx) != (PropMask::CLIP | PropMask::SIZE)
            || !graph.node(idx).properties.is_empty()
            || !index.in_references(idx).is_empty()
        {
            continue;
        }
        let Some(clip) = graph.slot(idx, SlotKind::Clip) else {
            continue;
        };
        if !clip_is_redundant(graph, clip) {
            continue;
        }
        let children = graph.children(idx);
        let &[child] = children.as_slice() else {
            continue;
        };
        let NodeKind::ShapeVisual(child_props) = &graph.node(child).kind else {
            continue;
        };
        if size.is_none() || child_props.size != size {
            continue;
        }

        propagate_description(graph, idx, child);
        replace_in_tree(graph, idx, child);
        progress = true;
    }
    progress
}

// ─── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, ShapeProps, StrokeAttrs};

    fn sprite_shape(graph: &mut CompGraph, parent: NodeIndex, fill: Option<Color>) -> NodeIndex {
        let sprite = graph.add_child(
            parent,
            Node::new(NodeKind::SpriteShape {
                transform: ShapeProps::default(),
                stroke: StrokeAttrs::default(),
            }),
        );
        if let Some(color) = fill {
            let brush = graph.add_node(Node::new(NodeKind::ColorBrush { color }));
            graph.set_slot(sprite, SlotKind::FillBrush, brush);
        }
        sprite
    }

    #[test]
    fn transparent_sprite_is_removed() {
        let mut g = CompGraph::new();
        let shapes = g.add_child(g.root, Node::new(NodeKind::ShapeVisual(VisualProps::default())));
        let visible = sprite_shape(&mut g, shapes, Some(Color::rgba(1.0, 0.0, 0.0, 1.0)));
        let invisible = sprite_shape(&mut g, shapes, Some(Color::TRANSPARENT));

        assert!(elide_transparent_sprite_shapes(&mut g));
        assert_eq!(g.children(shapes), vec![visible]);
        assert!(!g.contains(invisible));
    }

    #[test]
    fn sprite_with_no_brushes_is_removed() {
        let mut g = CompGraph::new();
        let shapes = g.add_child(g.root, Node::new(NodeKind::ShapeVisual(VisualProps::default())));
        sprite_shape(&mut g, shapes, None);

        assert!(elide_transparent_sprite_shapes(&mut g));
        assert!(g.children(shapes).is_empty());
    }

    #[test]
    fn matrix_pushdown_multiplies_outside_child_matrix() {
        let mut g = CompGraph::new();
        let shapes = g.add_child(g.root, Node::new(NodeKind::ShapeVisual(VisualProps::default())));
        let outer_m = Mat3::from_translation(Vec2::new(10.0, 0.0));
        let inner_m = Mat3::from_scale(Vec2::new(2.0, 2.0));
        let outer = g.add_child(
            shapes,
            Node::new(NodeKind::ContainerShape(ShapeProps {
                transform_matrix: Some(outer_m),
                ..Default::default()
            })),
        );
        let inner = g.add_child(
            outer,
            Node::new(NodeKind::ContainerShape(ShapeProps {
                transform_matrix: Some(inner_m),
                ..Default::default()
            })),
        );
        sprite_shape(&mut g, inner, Some(Color::rgba(0.0, 0.0, 0.0, 1.0)));

        assert!(push_container_shape_transforms_down(&mut g));
        assert!(!g.contains(outer));
        let props = g.node(inner).kind.shape_props().unwrap();
        assert!(
            props
                .transform_matrix
                .unwrap()
                .abs_diff_eq(outer_m * inner_m, 1e-6)
        );
    }

    #[test]
    fn matrix_pushdown_declines_on_animated_child_matrix() {
        let mut g = CompGraph::new();
        let shapes = g.add_child(g.root, Node::new(NodeKind::ShapeVisual(VisualProps::default())));
        let outer = g.add_child(
            shapes,
            Node::new(NodeKind::ContainerShape(ShapeProps {
                transform_matrix: Some(Mat3::from_scale(Vec2::new(2.0, 2.0))),
                ..Default::default()
            })),
        );
        let inner = g.add_child(
            outer,
            Node::new(NodeKind::ContainerShape(ShapeProps::default())),
        );
        let anim = g.add_node(Node::new(NodeKind::KeyFrameAnimation(KeyFrames::Scalar(
            vec![],
        ))));
        g.start_animation(inner, PropName::intern("TransformMatrix"), anim, None);

        assert!(!push_container_shape_transforms_down(&mut g));
        assert!(g.contains(outer));
    }

    #[test]
    fn orthogonality_rejects_order_violations() {
        // Scale ∈ parent, Offset ∈ child.
        assert!(!orthogonal(PropMask::SCALE, PropMask::OFFSET));
        // Rotation ∈ parent, Clip ∈ child.
        assert!(!orthogonal(PropMask::ROTATION, PropMask::CLIP));
        // TransformMatrix ∈ child, CenterPoint ∈ parent.
        assert!(!orthogonal(PropMask::CENTER_POINT, PropMask::TRANSFORM_MATRIX));
        // Overlap.
        assert!(!orthogonal(PropMask::OPACITY, PropMask::OPACITY));
        // Opacity and offset commute.
        assert!(orthogonal(PropMask::OPACITY, PropMask::OFFSET));
        // Offset over scale is fine in this direction.
        assert!(orthogonal(PropMask::OFFSET, PropMask::SCALE));
        // Unknown animated names veto everything.
        assert!(!orthogonal(PropMask::UNKNOWN, PropMask::EMPTY));
    }

    #[test]
    fn unknown_animated_property_blocks_coalescing() {
        let mut g = CompGraph::new();
        let parent = g.add_child(
            g.root,
            Node::new(NodeKind::ContainerVisual(VisualProps::default())),
        );
        let child = g.add_child(
            parent,
            Node::new(NodeKind::SpriteVisual(VisualProps::default())),
        );
        let anim = g.add_node(Node::new(NodeKind::KeyFrameAnimation(KeyFrames::Scalar(
            vec![],
        ))));
        g.start_animation(parent, PropName::intern("MyCustomThing"), anim, None);

        let index = GraphIndex::build(&g);
        assert!(!coalesce_orthogonal_visuals(&mut g, &index));
        assert!(g.contains(parent));
        let _ = child;
    }
}
