//! Property simplifier: canonicalises transform slots into a single matrix.
//!
//! Runs once per optimizer iteration, over every visual and shape. Folding
//! reduces the arity of later equivalence checks and opens more elisions.
//! Never folds into an animated property, and never folds a 3D rotation
//! about a non-Z axis (not representable as a planar matrix rotation).

use crate::model::{CompGraph, NodeKind, ShapeProps, VisualProps};
use glam::{Mat3, Mat4, Vec2, Vec3};

const EPSILON: f32 = 1e-6;

/// Canonicalise the transform slots of every visual and shape in `graph`.
pub fn simplify_properties(graph: &mut CompGraph) {
    let indices: Vec<_> = graph.graph.node_indices().collect();
    for idx in indices {
        let node = graph.node(idx);
        let scale_or_rotation_animated =
            node.is_animated("Scale") || node.is_animated("RotationAngleInDegrees");
        let any_animated = !node.animators.is_empty();

        match &mut graph.node_mut(idx).kind {
            NodeKind::ContainerShape(props) | NodeKind::SpriteShape { transform: props, .. } => {
                simplify_shape(props, scale_or_rotation_animated, any_animated);
            }
            NodeKind::ContainerVisual(props)
            | NodeKind::ShapeVisual(props)
            | NodeKind::SpriteVisual(props) => {
                simplify_visual(props, scale_or_rotation_animated, any_animated);
            }
            _ => {}
        }
    }
}

fn simplify_shape(props: &mut ShapeProps, scale_or_rotation_animated: bool, any_animated: bool) {
    // A center point is observable only while scale or rotation can act on it.
    if props.center_point.is_some()
        && props.scale.is_none()
        && props.rotation_degrees.is_none()
        && !scale_or_rotation_animated
    {
        props.center_point = None;
    }

    if any_animated {
        return;
    }
    if props.center_point.is_none()
        && props.offset.is_none()
        && props.rotation_degrees.is_none()
        && props.scale.is_none()
    {
        return;
    }

    let combined = shape_transform(props);
    props.center_point = None;
    props.offset = None;
    props.rotation_degrees = None;
    props.scale = None;
    props.transform_matrix = if combined.abs_diff_eq(Mat3::IDENTITY, EPSILON) {
        None
    } else {
        Some(combined)
    };
}

fn simplify_visual(props: &mut VisualProps, scale_or_rotation_animated: bool, any_animated: bool) {
    if props.center_point.is_some()
        && props.scale.is_none()
        && props.rotation_degrees.is_none()
        && !scale_or_rotation_animated
    {
        props.center_point = None;
        props.rotation_axis = None;
    }

    if any_animated || !rotation_axis_is_planar(props.rotation_axis) {
        return;
    }
    if props.center_point.is_none()
        && props.offset.is_none()
        && props.rotation_degrees.is_none()
        && props.scale.is_none()
    {
        return;
    }

    let combined = visual_transform(props);
    props.center_point = None;
    props.offset = None;
    props.rotation_degrees = None;
    props.rotation_axis = None;
    props.scale = None;
    props.transform_matrix = if combined.abs_diff_eq(Mat4::IDENTITY, EPSILON) {
        None
    } else {
        Some(combined)
    };
}

fn rotation_axis_is_planar(axis: Option<Vec3>) -> bool {
    match axis {
        None => true,
        Some(axis) => axis.abs_diff_eq(Vec3::Z, EPSILON),
    }
}

// ─── Matrix composition ──────────────────────────────────────────────────
//
// Evaluation order from innermost to outermost: TransformMatrix, Offset,
// Rotation, Scale — scale and rotation pivot around CenterPoint. Column
// vectors, so the outermost factor is leftmost.

/// Static transform of a 2D shape's slots as one affine matrix.
pub fn shape_transform(props: &ShapeProps) -> Mat3 {
    let cp = props.center_point.unwrap_or(Vec2::ZERO);
    let mut m = Mat3::IDENTITY;
    if let Some(tm) = props.transform_matrix {
        m = tm;
    }
    if let Some(offset) = props.offset {
        m = Mat3::from_translation(offset) * m;
    }
    if let Some(degrees) = props.rotation_degrees {
        m = about_2d(Mat3::from_angle(degrees.to_radians()), cp) * m;
    }
    if let Some(scale) = props.scale {
        m = about_2d(Mat3::from_scale(scale), cp) * m;
    }
    m
}

/// Static transform of a visual's slots as one 4×4 matrix. Callers must
/// have ruled out non-Z rotation axes.
pub fn visual_transform(props: &VisualProps) -> Mat4 {
    let cp = props.center_point.unwrap_or(Vec3::ZERO);
    let mut m = Mat4::IDENTITY;
    if let Some(tm) = props.transform_matrix {
        m = tm;
    }
    if let Some(offset) = props.offset {
        m = Mat4::from_translation(offset) * m;
    }
    if let Some(degrees) = props.rotation_degrees {
        m = about_3d(Mat4::from_rotation_z(degrees.to_radians()), cp) * m;
    }
    if let Some(scale) = props.scale {
        m = about_3d(Mat4::from_scale(scale), cp) * m;
    }
    m
}

fn about_2d(m: Mat3, center: Vec2) -> Mat3 {
    Mat3::from_translation(center) * m * Mat3::from_translation(-center)
}

fn about_3d(m: Mat4, center: Vec3) -> Mat4 {
    Mat4::from_translation(center) * m * Mat4::from_translation(-center)
}

// ─── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, NodeKind};
    use crate::name::PropName;
    use crate::model::{KeyFrames, ShapeProps};

    fn shape_with(props: ShapeProps) -> Node {
        Node::new(NodeKind::ContainerShape(props))
    }

    #[test]
    fn folds_scale_rotation_offset_into_matrix() {
        let mut g = CompGraph::new();
        let idx = g.add_child(
            g.root,
            shape_with(ShapeProps {
                center_point: Some(Vec2::new(10.0, 10.0)),
                offset: Some(Vec2::new(5.0, 0.0)),
                rotation_degrees: Some(90.0),
                scale: Some(Vec2::new(2.0, 2.0)),
                transform_matrix: None,
            }),
        );

        simplify_properties(&mut g);

        let NodeKind::ContainerShape(props) = &g.node(idx).kind else {
            unreachable!()
        };
        assert!(props.center_point.is_none());
        assert!(props.offset.is_none());
        assert!(props.rotation_degrees.is_none());
        assert!(props.scale.is_none());

        let m = props.transform_matrix.expect("combined matrix expected");
        let expected = about_2d(Mat3::from_scale(Vec2::new(2.0, 2.0)), Vec2::new(10.0, 10.0))
            * about_2d(Mat3::from_angle(90f32.to_radians()), Vec2::new(10.0, 10.0))
            * Mat3::from_translation(Vec2::new(5.0, 0.0));
        assert!(m.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn clears_inert_center_point() {
        let mut g = CompGraph::new();
        let idx = g.add_child(
            g.root,
            shape_with(ShapeProps {
                center_point: Some(Vec2::new(3.0, 4.0)),
                ..Default::default()
            }),
        );
        simplify_properties(&mut g);
        let NodeKind::ContainerShape(props) = &g.node(idx).kind else {
            unreachable!()
        };
        assert!(props.center_point.is_none());
        assert!(props.transform_matrix.is_none());
    }

    #[test]
    fn keeps_center_point_when_scale_is_animated() {
        let mut g = CompGraph::new();
        let idx = g.add_child(
            g.root,
            shape_with(ShapeProps {
                center_point: Some(Vec2::new(3.0, 4.0)),
                ..Default::default()
            }),
        );
        let anim = g.add_node(Node::new(NodeKind::KeyFrameAnimation(KeyFrames::Vec2(
            vec![],
        ))));
        g.start_animation(idx, PropName::intern("Scale"), anim, None);

        simplify_properties(&mut g);
        let NodeKind::ContainerShape(props) = &g.node(idx).kind else {
            unreachable!()
        };
        assert_eq!(props.center_point, Some(Vec2::new(3.0, 4.0)));
    }

    #[test]
    fn does_not_fold_animated_nodes() {
        let mut g = CompGraph::new();
        let idx = g.add_child(
            g.root,
            shape_with(ShapeProps {
                offset: Some(Vec2::new(5.0, 0.0)),
                ..Default::default()
            }),
        );
        let anim = g.add_node(Node::new(NodeKind::KeyFrameAnimation(KeyFrames::Scalar(
            vec![],
        ))));
        g.start_animation(idx, PropName::intern("Opacity"), anim, None);

        simplify_properties(&mut g);
        let NodeKind::ContainerShape(props) = &g.node(idx).kind else {
            unreachable!()
        };
        assert_eq!(props.offset, Some(Vec2::new(5.0, 0.0)));
        assert!(props.transform_matrix.is_none());
    }

    #[test]
    fn does_not_fold_off_axis_visual_rotation() {
        let mut g = CompGraph::new();
        let idx = g.add_child(
            g.root,
            Node::new(NodeKind::ContainerVisual(VisualProps {
                rotation_degrees: Some(45.0),
                rotation_axis: Some(Vec3::Y),
                ..Default::default()
            })),
        );
        simplify_properties(&mut g);
        let NodeKind::ContainerVisual(props) = &g.node(idx).kind else {
            unreachable!()
        };
        assert_eq!(props.rotation_degrees, Some(45.0));
        assert!(props.transform_matrix.is_none());
    }

    #[test]
    fn identity_fold_leaves_no_matrix() {
        let mut g = CompGraph::new();
        let idx = g.add_child(
            g.root,
            shape_with(ShapeProps {
                scale: Some(Vec2::ONE),
                offset: Some(Vec2::ZERO),
                ..Default::default()
            }),
        );
        simplify_properties(&mut g);
        let NodeKind::ContainerShape(props) = &g.node(idx).kind else {
            unreachable!()
        };
        assert!(props.scale.is_none());
        assert!(props.transform_matrix.is_none());
    }

    #[test]
    fn already_canonical_graph_is_untouched() {
        let mut g = CompGraph::new();
        let tm = Mat3::from_translation(Vec2::new(1.0, 2.0));
        let idx = g.add_child(
            g.root,
            shape_with(ShapeProps {
                transform_matrix: Some(tm),
                ..Default::default()
            }),
        );
        simplify_properties(&mut g);
        let NodeKind::ContainerShape(props) = &g.node(idx).kind else {
            unreachable!()
        };
        assert_eq!(props.transform_matrix, Some(tm));
    }
}
