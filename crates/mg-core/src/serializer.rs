//! YAML dump of a composition graph, for human inspection.
//!
//! One node per mapping: kind, author metadata, non-default slots,
//! animators, then children. Not a round-trip format.

use crate::model::{
    Animator, Color, CompGraph, KeyFrame, KeyFrames, NodeIndex, NodeKind, PropValue, ShapeProps,
    SlotKind, StrokeAttrs, TrimProps, VisualProps,
};
use glam::Vec2;
use std::fmt::Write;

/// Serialize the reachable tree as YAML.
#[must_use]
pub fn to_yaml(graph: &CompGraph) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str("composition:\n");
    emit_node(&mut out, graph, graph.root, 1);
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn line(out: &mut String, depth: usize, text: &str) {
    indent(out, depth);
    out.push_str(text);
    out.push('\n');
}

fn format_num(v: f32) -> String {
    if v == v.trunc() && v.abs() < 1e9 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

fn format_vec2(v: Vec2) -> String {
    format!("[{}, {}]", format_num(v.x), format_num(v.y))
}

fn format_color(c: Color) -> String {
    format!("\"{}\"", c.to_hex())
}

// ─── Nodes ───────────────────────────────────────────────────────────────

fn emit_node(out: &mut String, graph: &CompGraph, idx: NodeIndex, depth: usize) {
    let node = graph.node(idx);
    line(out, depth, &format!("kind: {}", node.kind.variant_name()));
    if let Some(name) = &node.name {
        line(out, depth, &format!("name: {name:?}"));
    }
    if let Some(short) = &node.short_description {
        line(out, depth, &format!("description: {short:?}"));
    }

    match &node.kind {
        NodeKind::ContainerVisual(p) | NodeKind::ShapeVisual(p) | NodeKind::SpriteVisual(p) => {
            emit_visual_props(out, p, depth);
        }
        NodeKind::ContainerShape(p) => emit_shape_props(out, p, depth),
        NodeKind::SpriteShape { transform, stroke } => {
            emit_shape_props(out, transform, depth);
            emit_stroke_attrs(out, stroke, depth);
        }
        NodeKind::PathGeometry { data, trim } => {
            line(out, depth, &format!("commands: {}", data.commands.len()));
            emit_trim(out, trim, depth);
        }
        NodeKind::EllipseGeometry { center, radius, trim } => {
            if let Some(center) = center {
                line(out, depth, &format!("center: {}", format_vec2(*center)));
            }
            line(out, depth, &format!("radius: {}", format_vec2(*radius)));
            emit_trim(out, trim, depth);
        }
        NodeKind::RectangleGeometry { offset, size, trim } => {
            if let Some(offset) = offset {
                line(out, depth, &format!("offset: {}", format_vec2(*offset)));
            }
            line(out, depth, &format!("size: {}", format_vec2(*size)));
            emit_trim(out, trim, depth);
        }
        NodeKind::RoundedRectangleGeometry {
            offset,
            size,
            corner_radius,
            trim,
        } => {
            if let Some(offset) = offset {
                line(out, depth, &format!("offset: {}", format_vec2(*offset)));
            }
            line(out, depth, &format!("size: {}", format_vec2(*size)));
            line(
                out,
                depth,
                &format!("cornerRadius: {}", format_vec2(*corner_radius)),
            );
            emit_trim(out, trim, depth);
        }
        NodeKind::ColorBrush { color } => {
            line(out, depth, &format!("color: {}", format_color(*color)));
        }
        NodeKind::InsetClip {
            left,
            top,
            right,
            bottom,
            center_point,
            scale,
        } => {
            line(
                out,
                depth,
                &format!(
                    "insets: [{}, {}, {}, {}]",
                    format_num(*left),
                    format_num(*top),
                    format_num(*right),
                    format_num(*bottom)
                ),
            );
            if let Some(cp) = center_point {
                line(out, depth, &format!("centerPoint: {}", format_vec2(*cp)));
            }
            if let Some(s) = scale {
                line(out, depth, &format!("scale: {}", format_vec2(*s)));
            }
        }
        NodeKind::ExpressionAnimation { expression, .. } => {
            line(out, depth, &format!("expression: {expression:?}"));
        }
        NodeKind::KeyFrameAnimation(frames) => emit_keyframes(out, graph, frames, depth),
        NodeKind::AnimationController { paused } => {
            line(out, depth, &format!("paused: {paused}"));
        }
        NodeKind::ViewBox { size } => {
            line(out, depth, &format!("size: {}", format_vec2(*size)));
        }
        NodeKind::VisualSurface { source_size, .. } => {
            if let Some(size) = source_size {
                line(out, depth, &format!("sourceSize: {}", format_vec2(*size)));
            }
        }
        NodeKind::EffectBrush
        | NodeKind::SurfaceBrush
        | NodeKind::GeometricClip
        | NodeKind::LinearEasing
        | NodeKind::StepEasing { .. }
        | NodeKind::HoldEasing => {}
        NodeKind::CubicBezierEasing { c1, c2 } => {
            line(
                out,
                depth,
                &format!("controlPoints: [{}, {}]", format_vec2(*c1), format_vec2(*c2)),
            );
        }
    }

    if !node.properties.is_empty() {
        line(out, depth, "properties:");
        for (name, value) in node.properties.iter() {
            line(
                out,
                depth + 1,
                &format!("{name}: {}", format_prop_value(value)),
            );
        }
    }

    for (label, slot) in [
        ("geometry", SlotKind::Geometry),
        ("fill", SlotKind::FillBrush),
        ("stroke", SlotKind::StrokeBrush),
        ("clip", SlotKind::Clip),
        ("viewBox", SlotKind::ViewBox),
        ("surface", SlotKind::Surface),
    ] {
        if let Some(target) = graph.slot(idx, slot) {
            line(out, depth, &format!("{label}:"));
            emit_node(out, graph, target, depth + 1);
        }
    }

    if !node.animators.is_empty() {
        line(out, depth, "animators:");
        for animator in &node.animators {
            emit_animator(out, graph, animator, depth + 1);
        }
    }

    if node.kind.has_children() {
        let children = graph.children(idx);
        if !children.is_empty() {
            line(out, depth, "children:");
            for child in children {
                indent(out, depth + 1);
                out.push_str("- ");
                emit_node_inline_first(out, graph, child, depth + 2);
            }
        }
    }
}

/// Emit a node as a YAML sequence item: first line follows the dash, the
/// rest are indented under it.
fn emit_node_inline_first(out: &mut String, graph: &CompGraph, idx: NodeIndex, depth: usize) {
    let mut buffer = String::new();
    emit_node(&mut buffer, graph, idx, depth);
    // Strip the indentation of the first line, which sits after "- ".
    let stripped = buffer.trim_start_matches(' ');
    let _ = write!(out, "{stripped}");
}

// ─── Fragments ───────────────────────────────────────────────────────────

fn emit_visual_props(out: &mut String, p: &VisualProps, depth: usize) {
    if let Some(v) = p.center_point {
        line(out, depth, &format!("centerPoint: [{}, {}, {}]", format_num(v.x), format_num(v.y), format_num(v.z)));
    }
    if let Some(v) = p.offset {
        line(out, depth, &format!("offset: [{}, {}, {}]", format_num(v.x), format_num(v.y), format_num(v.z)));
    }
    if let Some(v) = p.rotation_degrees {
        line(out, depth, &format!("rotationDegrees: {}", format_num(v)));
    }
    if let Some(v) = p.rotation_axis {
        line(out, depth, &format!("rotationAxis: [{}, {}, {}]", format_num(v.x), format_num(v.y), format_num(v.z)));
    }
    if let Some(v) = p.scale {
        line(out, depth, &format!("scale: [{}, {}, {}]", format_num(v.x), format_num(v.y), format_num(v.z)));
    }
    if p.transform_matrix.is_some() {
        line(out, depth, "transformMatrix: set");
    }
    if let Some(v) = p.size {
        line(out, depth, &format!("size: {}", format_vec2(v)));
    }
    if let Some(v) = p.opacity {
        line(out, depth, &format!("opacity: {}", format_num(v)));
    }
    if let Some(v) = p.is_visible {
        line(out, depth, &format!("isVisible: {v}"));
    }
}

fn emit_shape_props(out: &mut String, p: &ShapeProps, depth: usize) {
    if let Some(v) = p.center_point {
        line(out, depth, &format!("centerPoint: {}", format_vec2(v)));
    }
    if let Some(v) = p.offset {
        line(out, depth, &format!("offset: {}", format_vec2(v)));
    }
    if let Some(v) = p.rotation_degrees {
        line(out, depth, &format!("rotationDegrees: {}", format_num(v)));
    }
    if let Some(v) = p.scale {
        line(out, depth, &format!("scale: {}", format_vec2(v)));
    }
    if let Some(m) = p.transform_matrix {
        let c = m.to_cols_array();
        line(
            out,
            depth,
            &format!(
                "transformMatrix: [{}, {}, {}, {}, {}, {}]",
                format_num(c[0]),
                format_num(c[1]),
                format_num(c[3]),
                format_num(c[4]),
                format_num(c[6]),
                format_num(c[7])
            ),
        );
    }
}

fn emit_stroke_attrs(out: &mut String, stroke: &StrokeAttrs, depth: usize) {
    if let Some(width) = stroke.width {
        line(out, depth, &format!("strokeWidth: {}", format_num(width)));
    }
    if let Some(cap) = stroke.cap {
        line(out, depth, &format!("strokeCap: {cap:?}"));
    }
    if let Some(join) = stroke.join {
        line(out, depth, &format!("strokeJoin: {join:?}"));
    }
    if let Some(limit) = stroke.miter_limit {
        line(out, depth, &format!("miterLimit: {}", format_num(limit)));
    }
}

fn emit_trim(out: &mut String, trim: &TrimProps, depth: usize) {
    if let Some(v) = trim.trim_start {
        line(out, depth, &format!("trimStart: {}", format_num(v)));
    }
    if let Some(v) = trim.trim_end {
        line(out, depth, &format!("trimEnd: {}", format_num(v)));
    }
    if let Some(v) = trim.trim_offset {
        line(out, depth, &format!("trimOffset: {}", format_num(v)));
    }
}

fn format_prop_value(value: &PropValue) -> String {
    match value {
        PropValue::Scalar(v) => format_num(*v),
        PropValue::Vec2(v) => format_vec2(*v),
        PropValue::Vec3(v) => format!(
            "[{}, {}, {}]",
            format_num(v.x),
            format_num(v.y),
            format_num(v.z)
        ),
        PropValue::Vec4(v) => format!(
            "[{}, {}, {}, {}]",
            format_num(v.x),
            format_num(v.y),
            format_num(v.z),
            format_num(v.w)
        ),
        PropValue::Color(c) => format_color(*c),
        PropValue::Bool(b) => b.to_string(),
    }
}

fn emit_animator(out: &mut String, graph: &CompGraph, animator: &Animator, depth: usize) {
    indent(out, depth);
    let _ = writeln!(out, "- target: {}", animator.target);
    line(out, depth + 1, "animation:");
    emit_node(out, graph, animator.animation, depth + 2);
    if let Some(controller) = animator.controller {
        line(out, depth + 1, "controller:");
        emit_node(out, graph, controller, depth + 2);
    }
}

fn emit_keyframes(out: &mut String, graph: &CompGraph, frames: &KeyFrames, depth: usize) {
    line(out, depth, &format!("type: {}", frames.type_name()));
    line(out, depth, "frames:");

    fn frame_line<T>(
        out: &mut String,
        graph: &CompGraph,
        frame: &KeyFrame<T>,
        depth: usize,
        value: String,
    ) {
        let easing = frame
            .easing
            .map_or("Step", |e| graph.node(e).kind.variant_name());
        indent(out, depth);
        let _ = writeln!(
            out,
            "- {{progress: {}, value: {}, easing: {}}}",
            format_num(frame.progress),
            value,
            easing
        );
    }

    match frames {
        KeyFrames::Scalar(list) => {
            for f in list {
                frame_line(out, graph, f, depth + 1, format_num(f.value));
            }
        }
        KeyFrames::Vec2(list) => {
            for f in list {
                frame_line(out, graph, f, depth + 1, format_vec2(f.value));
            }
        }
        KeyFrames::Vec3(list) => {
            for f in list {
                let value = format!(
                    "[{}, {}, {}]",
                    format_num(f.value.x),
                    format_num(f.value.y),
                    format_num(f.value.z)
                );
                frame_line(out, graph, f, depth + 1, value);
            }
        }
        KeyFrames::Vec4(list) => {
            for f in list {
                let value = format!(
                    "[{}, {}, {}, {}]",
                    format_num(f.value.x),
                    format_num(f.value.y),
                    format_num(f.value.z),
                    format_num(f.value.w)
                );
                frame_line(out, graph, f, depth + 1, value);
            }
        }
        KeyFrames::Color(list) => {
            for f in list {
                frame_line(out, graph, f, depth + 1, format_color(f.value));
            }
        }
        KeyFrames::Path(list) => {
            for f in list {
                let commands = f.value.commands.len();
                frame_line(out, graph, f, depth + 1, format!("path({commands} commands)"));
            }
        }
        KeyFrames::Bool(list) => {
            for f in list {
                frame_line(out, graph, f, depth + 1, f.value.to_string());
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────
