//! Factory code generator.
//!
//! Emits a self-contained Rust module that rebuilds the composition graph
//! through the `mg-core` API: the owning tree first, then animator wiring
//! (easings, animations, controllers, bindings). Emission order is a
//! deterministic depth-first walk, so regenerating an unchanged graph
//! yields byte-identical output.

use crate::model::{
    Color, CompGraph, KeyFrame, KeyFrames, NodeIndex, NodeKind, PathCmd, PropValue, ShapeProps,
    SlotKind, StrokeAttrs, TrimProps, VisualProps,
};
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

// ─── Configuration ───────────────────────────────────────────────────────

/// Settings for a code generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodegenConfiguration {
    /// Name of the emitted factory struct.
    pub class_name: String,
    /// Intended module path for the emitted file, recorded in the header.
    pub namespace: String,
    pub width: f32,
    pub height: f32,
    pub duration_nanos: u64,
    /// Recorded in the header so a reader knows whether the graph was
    /// optimized before emission.
    pub disable_optimization: bool,
    /// Free-form provenance lines (tool version, source file, …).
    pub source_metadata: Vec<String>,
}

impl Default for CodegenConfiguration {
    fn default() -> Self {
        Self {
            class_name: "Composition".into(),
            namespace: "generated".into(),
            width: 0.0,
            height: 0.0,
            duration_nanos: 0,
            disable_optimization: false,
            source_metadata: Vec::new(),
        }
    }
}

// ─── Entry point ─────────────────────────────────────────────────────────

/// Generate factory source for the graph. The graph is emitted as-is;
/// optimizing it first is the caller's decision.
#[must_use]
pub fn generate(graph: &CompGraph, config: &CodegenConfiguration) -> String {
    let mut generator = Generator {
        graph,
        out: String::with_capacity(4096),
        names: HashMap::new(),
        counter: 0,
        animated: Vec::new(),
        wired: HashSet::new(),
    };
    generator.emit_module(config);
    generator.out
}

struct Generator<'a> {
    graph: &'a CompGraph,
    out: String,
    names: HashMap<NodeIndex, String>,
    counter: usize,
    /// Nodes with animators, in creation order; wired after the tree.
    animated: Vec<NodeIndex>,
    /// Controllers whose own bindings were already emitted.
    wired: HashSet<NodeIndex>,
}

impl Generator<'_> {
    fn emit_module(&mut self, config: &CodegenConfiguration) {
        let _ = writeln!(self.out, "//! {} — generated composition factory.", config.class_name);
        let _ = writeln!(self.out, "//!");
        for meta in &config.source_metadata {
            let _ = writeln!(self.out, "//! {meta}");
        }
        let _ = writeln!(
            self.out,
            "//! Optimization: {}.",
            if config.disable_optimization {
                "disabled"
            } else {
                "enabled"
            }
        );
        let _ = writeln!(self.out, "//! Intended module path: {}", config.namespace);
        let _ = writeln!(self.out, "//! Do not edit by hand.");
        self.out.push('\n');

        self.out
            .push_str("#[allow(unused_imports)]\nuse glam::{Mat3, Mat4, Vec2, Vec3, Vec4};\n");
        self.out.push_str("use mg_core::model::*;\n");
        self.out.push_str("use mg_core::name::PropName;\n\n");

        let _ = writeln!(self.out, "pub const WIDTH: f32 = {};", float(config.width));
        let _ = writeln!(self.out, "pub const HEIGHT: f32 = {};", float(config.height));
        let _ = writeln!(
            self.out,
            "pub const DURATION_NANOS: u64 = {};",
            config.duration_nanos
        );
        self.out.push('\n');

        let _ = writeln!(self.out, "pub struct {};", config.class_name);
        self.out.push('\n');
        let _ = writeln!(self.out, "impl {} {{", config.class_name);
        self.out
            .push_str("    pub fn build() -> CompGraph {\n        let mut graph = CompGraph::new();\n");

        self.emit_root();
        let animated = std::mem::take(&mut self.animated);
        for owner in animated {
            self.emit_animators(owner);
        }

        self.out.push_str("        graph\n    }\n}\n");
    }

    // ─── Tree emission ───────────────────────────────────────────────────

    fn fresh(&mut self, idx: NodeIndex) -> String {
        let name = format!("node_{}", self.counter);
        self.counter += 1;
        self.names.insert(idx, name.clone());
        name
    }

    fn stmt(&mut self, text: &str) {
        self.out.push_str("        ");
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn emit_root(&mut self) {
        let root = self.graph.root;
        self.names.insert(root, "root".into());
        self.stmt("let root = graph.root;");
        let expr = self.kind_expr(&self.graph.node(root).kind);
        self.stmt(&format!("graph.node_mut(root).kind = {expr};"));
        self.emit_metadata(root);
        self.emit_slots_and_children(root);
    }

    fn emit_node(&mut self, idx: NodeIndex, parent: Option<&str>) {
        let var = self.fresh(idx);
        let expr = self.kind_expr(&self.graph.node(idx).kind);
        match parent {
            Some(parent) => self.stmt(&format!(
                "let {var} = graph.add_child({parent}, Node::new({expr}));"
            )),
            None => self.stmt(&format!("let {var} = graph.add_node(Node::new({expr}));")),
        }
        self.emit_metadata(idx);
        self.emit_slots_and_children(idx);
    }

    fn emit_metadata(&mut self, idx: NodeIndex) {
        let var = self.names[&idx].clone();
        let node = self.graph.node(idx);
        if let Some(name) = node.name.clone() {
            self.stmt(&format!(
                "graph.node_mut({var}).name = Some({}.into());",
                quoted(&name)
            ));
        }
        if let Some(short) = node.short_description.clone() {
            self.stmt(&format!(
                "graph.node_mut({var}).short_description = Some({}.into());",
                quoted(&short)
            ));
        }
        if let Some(long) = node.long_description.clone() {
            self.stmt(&format!(
                "graph.node_mut({var}).long_description = Some({}.into());",
                quoted(&long)
            ));
        }
        let entries: Vec<_> = node.properties.iter().cloned().collect();
        for (name, value) in entries {
            self.stmt(&format!(
                "graph.node_mut({var}).properties.set({}, {});",
                prop_name(name.as_str()),
                prop_value(&value)
            ));
        }
        if !self.graph.node(idx).animators.is_empty() {
            self.animated.push(idx);
        }
    }

    fn emit_slots_and_children(&mut self, idx: NodeIndex) {
        let var = self.names[&idx].clone();
        for (slot_name, slot) in [
            ("Geometry", SlotKind::Geometry),
            ("FillBrush", SlotKind::FillBrush),
            ("StrokeBrush", SlotKind::StrokeBrush),
            ("Clip", SlotKind::Clip),
            ("ViewBox", SlotKind::ViewBox),
            ("Surface", SlotKind::Surface),
        ] {
            if let Some(target) = self.graph.slot(idx, slot) {
                self.emit_node(target, None);
                let target_var = self.names[&target].clone();
                self.stmt(&format!(
                    "graph.set_slot({var}, SlotKind::{slot_name}, {target_var});"
                ));
            }
        }
        if self.graph.node(idx).kind.has_children() {
            for child in self.graph.children(idx) {
                self.emit_node(child, Some(&var));
            }
        }
    }

    // ─── Animator wiring ─────────────────────────────────────────────────

    /// Create (or reuse) the variable holding an arena node that is only
    /// reachable through animators: animations, easings, controllers.
    fn ensure_arena_node(&mut self, idx: NodeIndex) -> String {
        if let Some(name) = self.names.get(&idx) {
            return name.clone();
        }
        // Easings referenced by keyframes must exist before the animation
        // node that mentions them.
        if let NodeKind::KeyFrameAnimation(frames) = &self.graph.node(idx).kind {
            for easing in easing_refs(frames) {
                self.ensure_arena_node(easing);
            }
        }
        let var = self.fresh(idx);
        let expr = self.kind_expr(&self.graph.node(idx).kind);
        self.stmt(&format!("let {var} = graph.add_node(Node::new({expr}));"));
        var
    }

    fn emit_animators(&mut self, owner: NodeIndex) {
        if !self.wired.insert(owner) {
            return;
        }
        let owner_var = self.names[&owner].clone();
        let animators: Vec<_> = self.graph.node(owner).animators.iter().copied().collect();
        for animator in animators {
            let animation_var = self.ensure_arena_node(animator.animation);
            let controller_expr = match animator.controller {
                Some(controller) => {
                    let var = self.ensure_arena_node(controller);
                    self.emit_animators(controller);
                    format!("Some({var})")
                }
                None => "None".into(),
            };
            self.stmt(&format!(
                "graph.start_animation({owner_var}, {}, {animation_var}, {controller_expr});",
                prop_name(animator.target.as_str())
            ));
        }
    }

    // ─── Expressions ─────────────────────────────────────────────────────

    fn kind_expr(&self, kind: &NodeKind) -> String {
        match kind {
            NodeKind::ContainerVisual(p) => {
                format!("NodeKind::ContainerVisual({})", visual_props(p))
            }
            NodeKind::ShapeVisual(p) => format!("NodeKind::ShapeVisual({})", visual_props(p)),
            NodeKind::SpriteVisual(p) => format!("NodeKind::SpriteVisual({})", visual_props(p)),
            NodeKind::ContainerShape(p) => {
                format!("NodeKind::ContainerShape({})", shape_props(p))
            }
            NodeKind::SpriteShape { transform, stroke } => format!(
                "NodeKind::SpriteShape {{ transform: {}, stroke: {} }}",
                shape_props(transform),
                stroke_attrs(stroke)
            ),
            NodeKind::PathGeometry { data, trim } => format!(
                "NodeKind::PathGeometry {{ data: {}, trim: {} }}",
                path_data(data),
                trim_props(trim)
            ),
            NodeKind::EllipseGeometry { center, radius, trim } => format!(
                "NodeKind::EllipseGeometry {{ center: {}, radius: {}, trim: {} }}",
                option(center.map(vec2)),
                vec2(*radius),
                trim_props(trim)
            ),
            NodeKind::RectangleGeometry { offset, size, trim } => format!(
                "NodeKind::RectangleGeometry {{ offset: {}, size: {}, trim: {} }}",
                option(offset.map(vec2)),
                vec2(*size),
                trim_props(trim)
            ),
            NodeKind::RoundedRectangleGeometry {
                offset,
                size,
                corner_radius,
                trim,
            } => format!(
                "NodeKind::RoundedRectangleGeometry {{ offset: {}, size: {}, corner_radius: {}, trim: {} }}",
                option(offset.map(vec2)),
                vec2(*size),
                vec2(*corner_radius),
                trim_props(trim)
            ),
            NodeKind::ColorBrush { color: c } => {
                format!("NodeKind::ColorBrush {{ color: {} }}", color(*c))
            }
            NodeKind::EffectBrush => "NodeKind::EffectBrush".into(),
            NodeKind::SurfaceBrush => "NodeKind::SurfaceBrush".into(),
            NodeKind::InsetClip {
                left,
                top,
                right,
                bottom,
                center_point,
                scale,
            } => format!(
                "NodeKind::InsetClip {{ left: {}, top: {}, right: {}, bottom: {}, center_point: {}, scale: {} }}",
                float(*left),
                float(*top),
                float(*right),
                float(*bottom),
                option(center_point.map(vec2)),
                option(scale.map(vec2))
            ),
            NodeKind::GeometricClip => "NodeKind::GeometricClip".into(),
            NodeKind::LinearEasing => "NodeKind::LinearEasing".into(),
            NodeKind::CubicBezierEasing { c1, c2 } => format!(
                "NodeKind::CubicBezierEasing {{ c1: {}, c2: {} }}",
                vec2(*c1),
                vec2(*c2)
            ),
            NodeKind::StepEasing { steps } => {
                format!("NodeKind::StepEasing {{ steps: {steps} }}")
            }
            NodeKind::HoldEasing => "NodeKind::HoldEasing".into(),
            NodeKind::ExpressionAnimation {
                expression,
                references,
            } => {
                let refs: Vec<String> = references
                    .iter()
                    .map(|(name, target)| {
                        let target_var = self
                            .names
                            .get(target)
                            .cloned()
                            .unwrap_or_else(|| "root".into());
                        format!("({}, {target_var})", prop_name(name.as_str()))
                    })
                    .collect();
                format!(
                    "NodeKind::ExpressionAnimation {{ expression: {}.into(), references: vec![{}] }}",
                    quoted(expression),
                    refs.join(", ")
                )
            }
            NodeKind::KeyFrameAnimation(frames) => {
                format!("NodeKind::KeyFrameAnimation({})", self.keyframes_expr(frames))
            }
            NodeKind::AnimationController { paused } => {
                format!("NodeKind::AnimationController {{ paused: {paused} }}")
            }
            NodeKind::VisualSurface {
                source,
                source_size,
                source_offset,
            } => {
                let source_expr = match source.and_then(|s| self.names.get(&s)) {
                    Some(var) => format!("Some({var})"),
                    None => "None".into(),
                };
                format!(
                    "NodeKind::VisualSurface {{ source: {source_expr}, source_size: {}, source_offset: {} }}",
                    option(source_size.map(vec2)),
                    option(source_offset.map(vec2))
                )
            }
            NodeKind::ViewBox { size } => {
                format!("NodeKind::ViewBox {{ size: {} }}", vec2(*size))
            }
        }
    }

    fn keyframes_expr(&self, frames: &KeyFrames) -> String {
        fn list<T>(
            generator: &Generator<'_>,
            frames: &[KeyFrame<T>],
            value: impl Fn(&T) -> String,
        ) -> String {
            let items: Vec<String> = frames
                .iter()
                .map(|f| {
                    let easing = match f.easing.and_then(|e| generator.names.get(&e)) {
                        Some(var) => format!("Some({var})"),
                        None => "None".into(),
                    };
                    format!(
                        "KeyFrame {{ progress: {}, value: {}, easing: {easing} }}",
                        float(f.progress),
                        value(&f.value)
                    )
                })
                .collect();
            format!("vec![{}]", items.join(", "))
        }

        match frames {
            KeyFrames::Scalar(v) => format!("KeyFrames::Scalar({})", list(self, v, |x| float(*x))),
            KeyFrames::Vec2(v) => format!("KeyFrames::Vec2({})", list(self, v, |x| vec2(*x))),
            KeyFrames::Vec3(v) => format!("KeyFrames::Vec3({})", list(self, v, |x| vec3(*x))),
            KeyFrames::Vec4(v) => format!("KeyFrames::Vec4({})", list(self, v, |x| vec4(*x))),
            KeyFrames::Color(v) => format!("KeyFrames::Color({})", list(self, v, |x| color(*x))),
            KeyFrames::Path(v) => format!(
                "KeyFrames::Path({})",
                list(self, v, |x| path_data(x))
            ),
            KeyFrames::Bool(v) => {
                format!("KeyFrames::Bool({})", list(self, v, |x| x.to_string()))
            }
        }
    }
}

fn easing_refs(frames: &KeyFrames) -> Vec<NodeIndex> {
    fn collect<T>(frames: &[KeyFrame<T>]) -> Vec<NodeIndex> {
        frames.iter().filter_map(|f| f.easing).collect()
    }
    match frames {
        KeyFrames::Scalar(v) => collect(v),
        KeyFrames::Vec2(v) => collect(v),
        KeyFrames::Vec3(v) => collect(v),
        KeyFrames::Vec4(v) => collect(v),
        KeyFrames::Color(v) => collect(v),
        KeyFrames::Path(v) => collect(v),
        KeyFrames::Bool(v) => collect(v),
    }
}

// ─── Literal formatting ──────────────────────────────────────────────────

fn float(v: f32) -> String {
    format!("{v:?}")
}

fn quoted(s: &str) -> String {
    format!("{s:?}")
}

fn prop_name(name: &str) -> String {
    format!("PropName::intern({name:?})")
}

fn vec2(v: Vec2) -> String {
    format!("Vec2::new({}, {})", float(v.x), float(v.y))
}

fn vec3(v: Vec3) -> String {
    format!("Vec3::new({}, {}, {})", float(v.x), float(v.y), float(v.z))
}

fn vec4(v: Vec4) -> String {
    format!(
        "Vec4::new({}, {}, {}, {})",
        float(v.x),
        float(v.y),
        float(v.z),
        float(v.w)
    )
}

fn mat3(m: Mat3) -> String {
    let cols: Vec<String> = m.to_cols_array().iter().map(|&v| float(v)).collect();
    format!("Mat3::from_cols_array(&[{}])", cols.join(", "))
}

fn mat4(m: Mat4) -> String {
    let cols: Vec<String> = m.to_cols_array().iter().map(|&v| float(v)).collect();
    format!("Mat4::from_cols_array(&[{}])", cols.join(", "))
}

fn color(c: Color) -> String {
    format!(
        "Color::rgba({}, {}, {}, {})",
        float(c.r),
        float(c.g),
        float(c.b),
        float(c.a)
    )
}

fn option(value: Option<String>) -> String {
    match value {
        Some(inner) => format!("Some({inner})"),
        None => "None".into(),
    }
}

fn prop_value(value: &PropValue) -> String {
    match value {
        PropValue::Scalar(v) => format!("PropValue::Scalar({})", float(*v)),
        PropValue::Vec2(v) => format!("PropValue::Vec2({})", vec2(*v)),
        PropValue::Vec3(v) => format!("PropValue::Vec3({})", vec3(*v)),
        PropValue::Vec4(v) => format!("PropValue::Vec4({})", vec4(*v)),
        PropValue::Color(c) => format!("PropValue::Color({})", color(*c)),
        PropValue::Bool(b) => format!("PropValue::Bool({b})"),
    }
}

fn visual_props(p: &VisualProps) -> String {
    let mut fields = Vec::new();
    if let Some(v) = p.center_point {
        fields.push(format!("center_point: Some({})", vec3(v)));
    }
    if let Some(v) = p.offset {
        fields.push(format!("offset: Some({})", vec3(v)));
    }
    if let Some(v) = p.rotation_degrees {
        fields.push(format!("rotation_degrees: Some({})", float(v)));
    }
    if let Some(v) = p.rotation_axis {
        fields.push(format!("rotation_axis: Some({})", vec3(v)));
    }
    if let Some(v) = p.scale {
        fields.push(format!("scale: Some({})", vec3(v)));
    }
    if let Some(v) = p.transform_matrix {
        fields.push(format!("transform_matrix: Some({})", mat4(v)));
    }
    if let Some(v) = p.size {
        fields.push(format!("size: Some({})", vec2(v)));
    }
    if let Some(v) = p.opacity {
        fields.push(format!("opacity: Some({})", float(v)));
    }
    if let Some(v) = p.is_visible {
        fields.push(format!("is_visible: Some({v})"));
    }
    if p.border_mode.is_some() {
        fields.push("border_mode: Some(BorderMode::Hard)".into());
    }
    if fields.is_empty() {
        "VisualProps::default()".into()
    } else {
        format!(
            "VisualProps {{ {}, ..Default::default() }}",
            fields.join(", ")
        )
    }
}

fn shape_props(p: &ShapeProps) -> String {
    let mut fields = Vec::new();
    if let Some(v) = p.center_point {
        fields.push(format!("center_point: Some({})", vec2(v)));
    }
    if let Some(v) = p.offset {
        fields.push(format!("offset: Some({})", vec2(v)));
    }
    if let Some(v) = p.rotation_degrees {
        fields.push(format!("rotation_degrees: Some({})", float(v)));
    }
    if let Some(v) = p.scale {
        fields.push(format!("scale: Some({})", vec2(v)));
    }
    if let Some(v) = p.transform_matrix {
        fields.push(format!("transform_matrix: Some({})", mat3(v)));
    }
    if fields.is_empty() {
        "ShapeProps::default()".into()
    } else {
        format!(
            "ShapeProps {{ {}, ..Default::default() }}",
            fields.join(", ")
        )
    }
}

fn stroke_attrs(s: &StrokeAttrs) -> String {
    let mut fields = Vec::new();
    if let Some(v) = s.width {
        fields.push(format!("width: Some({})", float(v)));
    }
    if let Some(cap) = s.cap {
        fields.push(format!("cap: Some(StrokeCap::{cap:?})"));
    }
    if let Some(join) = s.join {
        fields.push(format!("join: Some(StrokeJoin::{join:?})"));
    }
    if let Some(v) = s.miter_limit {
        fields.push(format!("miter_limit: Some({})", float(v)));
    }
    if fields.is_empty() {
        "StrokeAttrs::default()".into()
    } else {
        format!(
            "StrokeAttrs {{ {}, ..Default::default() }}",
            fields.join(", ")
        )
    }
}

fn trim_props(t: &TrimProps) -> String {
    let mut fields = Vec::new();
    if let Some(v) = t.trim_start {
        fields.push(format!("trim_start: Some({})", float(v)));
    }
    if let Some(v) = t.trim_end {
        fields.push(format!("trim_end: Some({})", float(v)));
    }
    if let Some(v) = t.trim_offset {
        fields.push(format!("trim_offset: Some({})", float(v)));
    }
    if fields.is_empty() {
        "TrimProps::default()".into()
    } else {
        format!(
            "TrimProps {{ {}, ..Default::default() }}",
            fields.join(", ")
        )
    }
}

fn path_data(data: &crate::model::PathData) -> String {
    let commands: Vec<String> = data
        .commands
        .iter()
        .map(|cmd| match cmd {
            PathCmd::MoveTo(p) => format!("PathCmd::MoveTo({})", vec2(*p)),
            PathCmd::LineTo(p) => format!("PathCmd::LineTo({})", vec2(*p)),
            PathCmd::CubicTo(c1, c2, p) => format!(
                "PathCmd::CubicTo({}, {}, {})",
                vec2(*c1),
                vec2(*c2),
                vec2(*p)
            ),
            PathCmd::Close => "PathCmd::Close".into(),
        })
        .collect();
    format!(
        "PathData {{ commands: vec![{}] }}",
        commands.join(", ")
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, NodeKind, VisualProps};
    use crate::name::PropName;

    fn config() -> CodegenConfiguration {
        CodegenConfiguration {
            class_name: "Checkmark".into(),
            namespace: "app::animations".into(),
            width: 200.0,
            height: 100.0,
            duration_nanos: 2_000_000_000,
            disable_optimization: false,
            source_metadata: vec!["source: checkmark.json".into()],
        }
    }

    #[test]
    fn emits_factory_skeleton() {
        let g = CompGraph::new();
        let source = generate(&g, &config());
        assert!(source.contains("pub struct Checkmark;"));
        assert!(source.contains("pub fn build() -> CompGraph"));
        assert!(source.contains("pub const DURATION_NANOS: u64 = 2000000000;"));
        assert!(source.contains("source: checkmark.json"));
    }

    #[test]
    fn emits_children_and_slots() {
        let mut g = CompGraph::new();
        let sprite = g.add_child(
            g.root,
            Node::new(NodeKind::SpriteVisual(VisualProps {
                size: Some(Vec2::new(10.0, 20.0)),
                ..Default::default()
            })),
        );
        let brush = g.add_node(Node::new(NodeKind::ColorBrush {
            color: Color::rgba(1.0, 0.0, 0.0, 1.0),
        }));
        g.set_slot(sprite, SlotKind::FillBrush, brush);

        let source = generate(&g, &config());
        assert!(source.contains("graph.add_child(root, Node::new(NodeKind::SpriteVisual"));
        assert!(source.contains("graph.set_slot(node_0, SlotKind::FillBrush, node_1);"));
    }

    #[test]
    fn animator_wiring_follows_tree() {
        let mut g = CompGraph::new();
        let easing = g.add_node(Node::new(NodeKind::LinearEasing));
        let anim = g.add_node(Node::new(NodeKind::KeyFrameAnimation(KeyFrames::Scalar(
            vec![KeyFrame {
                progress: 0.0,
                value: 0.5,
                easing: Some(easing),
            }],
        ))));
        g.start_animation(g.root, PropName::intern("Opacity"), anim, None);

        let source = generate(&g, &config());
        let easing_pos = source.find("NodeKind::LinearEasing").unwrap();
        let anim_pos = source.find("NodeKind::KeyFrameAnimation").unwrap();
        let wiring_pos = source
            .find("graph.start_animation(root, PropName::intern(\"Opacity\")")
            .unwrap();
        assert!(easing_pos < anim_pos);
        assert!(anim_pos < wiring_pos);
    }

    #[test]
    fn generation_is_deterministic() {
        let mut g = CompGraph::new();
        g.add_child(
            g.root,
            Node::named(NodeKind::ContainerVisual(VisualProps::default()), "layer"),
        );
        assert_eq!(generate(&g, &config()), generate(&g, &config()));
    }
}
