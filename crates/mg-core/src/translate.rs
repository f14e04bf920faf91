//! Lowers a parsed BodyMovin document to the composition graph.
//!
//! The output deliberately over-nests containers — one per layer, one per
//! parent link, one per shape group — and leaves visibility and transforms
//! in separate slots. Shrinking that tree is the optimizer's job, not
//! ours.
//!
//! All animations run on normalized progress. Each animator gets a paused
//! controller whose `Progress` is bound, through one shared expression
//! animation, to the `Progress` property on the root visual.

use crate::issues::Issues;
use crate::lottie::{
    Animatable, BezierPath, KeyFrameEasing, Layer, LayerKind, LineCap, LineJoin,
    LottieComposition, LottieKeyFrame, ShapeElement, Transform,
};
use crate::model::{
    Color, CompGraph, KeyFrame, KeyFrames, Node, NodeIndex, NodeKind, PathCmd, PathData,
    PropValue, ShapeProps, SlotKind, StrokeAttrs, StrokeCap, StrokeJoin, TrimProps, VisualProps,
};
use crate::name::PropName;
use glam::{Vec2, Vec3};
use std::collections::HashSet;

// ─── Entry point ─────────────────────────────────────────────────────────

/// Translate a document into a fresh composition graph.
pub fn translate(composition: &LottieComposition, issues: &mut Issues) -> CompGraph {
    let mut graph = CompGraph::new();
    let root = graph.root;
    {
        let node = graph.node_mut(root);
        node.name = composition.name.clone();
        let NodeKind::ContainerVisual(props) = &mut node.kind else {
            unreachable!("fresh graph root is a container visual");
        };
        props.size = Some(Vec2::new(composition.width, composition.height));
        node.properties
            .set(PropName::intern("Progress"), PropValue::Scalar(0.0));
    }

    let mut translator = Translator {
        graph,
        issues,
        comp: composition,
        linear_easing: None,
        hold_easing: None,
        progress_expression: None,
    };
    translator.add_layers(root, &composition.layers, &mut HashSet::new());
    translator.graph
}

struct Translator<'a> {
    graph: CompGraph,
    issues: &'a mut Issues,
    comp: &'a LottieComposition,
    linear_easing: Option<NodeIndex>,
    hold_easing: Option<NodeIndex>,
    progress_expression: Option<NodeIndex>,
}

// ─── Animation plumbing ──────────────────────────────────────────────────

impl Translator<'_> {
    fn easing_node(&mut self, easing: KeyFrameEasing) -> NodeIndex {
        match easing {
            KeyFrameEasing::Linear => match self.linear_easing {
                Some(idx) => idx,
                None => {
                    let idx = self.graph.add_node(Node::new(NodeKind::LinearEasing));
                    self.linear_easing = Some(idx);
                    idx
                }
            },
            KeyFrameEasing::Hold => match self.hold_easing {
                Some(idx) => idx,
                None => {
                    let idx = self.graph.add_node(Node::new(NodeKind::HoldEasing));
                    self.hold_easing = Some(idx);
                    idx
                }
            },
            KeyFrameEasing::CubicBezier { c1, c2 } => self
                .graph
                .add_node(Node::new(NodeKind::CubicBezierEasing { c1, c2 })),
        }
    }

    /// The one expression animation that feeds document progress to every
    /// controller.
    fn progress_expression(&mut self) -> NodeIndex {
        if let Some(expr) = self.progress_expression {
            return expr;
        }
        let root = self.graph.root;
        let expr = self.graph.add_node(Node::new(NodeKind::ExpressionAnimation {
            expression: "_.Progress".into(),
            references: vec![(PropName::intern("_"), root)],
        }));
        self.progress_expression = Some(expr);
        expr
    }

    /// Bind a keyframe animation on `target`, driven by a fresh paused
    /// controller linked to document progress.
    fn bind(&mut self, target: NodeIndex, prop: &str, frames: KeyFrames) {
        let animation = self
            .graph
            .add_node(Node::new(NodeKind::KeyFrameAnimation(frames)));
        let expr = self.progress_expression();
        let controller = self
            .graph
            .add_node(Node::new(NodeKind::AnimationController { paused: true }));
        self.graph
            .start_animation(controller, PropName::intern("Progress"), expr, None);
        self.graph
            .start_animation(target, PropName::intern(prop), animation, Some(controller));
    }

    /// Convert source keyframes, shifting each segment's easing onto its
    /// destination frame (the runtime eases *into* a keyframe).
    fn convert_frames<T: Clone, U>(
        &mut self,
        frames: &[LottieKeyFrame<T>],
        map: impl Fn(&T) -> U,
    ) -> Vec<KeyFrame<U>> {
        frames
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                let easing = if i == 0 {
                    KeyFrameEasing::Linear
                } else {
                    frames[i - 1].easing
                };
                KeyFrame {
                    progress: self.comp.progress_of_frame(frame.frame),
                    value: map(&frame.value),
                    easing: Some(self.easing_node(easing)),
                }
            })
            .collect()
    }

    fn bind_scalar(
        &mut self,
        target: NodeIndex,
        prop: &str,
        frames: &[LottieKeyFrame<f32>],
        map: impl Fn(f32) -> f32,
    ) {
        let converted = self.convert_frames(frames, |v| map(*v));
        self.bind(target, prop, KeyFrames::Scalar(converted));
    }

    fn bind_vec2(
        &mut self,
        target: NodeIndex,
        prop: &str,
        frames: &[LottieKeyFrame<Vec2>],
        map: impl Fn(Vec2) -> Vec2,
    ) {
        let converted = self.convert_frames(frames, |v| map(*v));
        self.bind(target, prop, KeyFrames::Vec2(converted));
    }

    fn bind_vec3(
        &mut self,
        target: NodeIndex,
        prop: &str,
        frames: &[LottieKeyFrame<Vec2>],
        map: impl Fn(Vec2) -> Vec3,
    ) {
        let converted = self.convert_frames(frames, |v| map(*v));
        self.bind(target, prop, KeyFrames::Vec3(converted));
    }
}

// ─── Layers ──────────────────────────────────────────────────────────────

impl Translator<'_> {
    /// Append layer subtrees under `parent`, bottom layer first (BodyMovin
    /// lists layers top-down, the runtime paints children in order).
    fn add_layers(&mut self, parent: NodeIndex, layers: &[Layer], precomp_stack: &mut HashSet<String>) {
        for layer in layers.iter().rev() {
            self.add_layer(parent, layer, layers, precomp_stack);
        }
    }

    fn add_layer(
        &mut self,
        parent: NodeIndex,
        layer: &Layer,
        siblings: &[Layer],
        precomp_stack: &mut HashSet<String>,
    ) {
        // Wrap in the transform chain of `parent`-linked ancestor layers,
        // outermost ancestor first.
        let mut attach = parent;
        for ancestor in parent_chain(layer, siblings, self.issues) {
            let container = self.graph.add_child(
                attach,
                Node::new(NodeKind::ContainerVisual(VisualProps::default())),
            );
            self.apply_visual_transform(container, &ancestor.transform);
            attach = container;
        }

        let container = self.graph.add_child(
            attach,
            Node::new(NodeKind::ContainerVisual(VisualProps::default())),
        );
        self.graph.node_mut(container).name = layer.name.clone();
        self.apply_visual_transform(container, &layer.transform);
        self.apply_visibility(container, layer);

        match &layer.kind {
            LayerKind::Null => {}
            LayerKind::Solid { color, width, height } => {
                let sprite = self.graph.add_child(
                    container,
                    Node::new(NodeKind::SpriteVisual(VisualProps {
                        size: Some(Vec2::new(*width, *height)),
                        ..Default::default()
                    })),
                );
                let brush = self
                    .graph
                    .add_node(Node::new(NodeKind::ColorBrush { color: *color }));
                self.graph.set_slot(sprite, SlotKind::FillBrush, brush);
            }
            LayerKind::Shape { shapes } => {
                let size = Vec2::new(self.comp.width, self.comp.height);
                self.set_size_and_clip(container, size);
                let visual = self.graph.add_child(
                    container,
                    Node::new(NodeKind::ShapeVisual(VisualProps {
                        size: Some(size),
                        ..Default::default()
                    })),
                );
                self.add_shape_elements(visual, shapes, 1.0);
            }
            LayerKind::Precomp { ref_id, width, height } => {
                self.set_size_and_clip(container, Vec2::new(*width, *height));
                if !precomp_stack.insert(ref_id.clone()) {
                    self.issues
                        .error("LT0050", format!("precomp cycle through `{ref_id}`"));
                    return;
                }
                match self.comp.asset(ref_id) {
                    Some(asset) => {
                        let layers = asset.layers.clone();
                        self.add_layers(container, &layers, precomp_stack);
                    }
                    None => {
                        self.issues
                            .warning("LT0051", format!("missing precomp asset `{ref_id}`"));
                    }
                }
                precomp_stack.remove(ref_id);
            }
            LayerKind::Image { ref_id } => {
                self.issues.warning(
                    "LT0011",
                    format!("image layer `{ref_id}` is not supported; skipped"),
                );
            }
            LayerKind::Text => {
                self.issues
                    .warning("LT0010", "text layer is not supported; skipped");
            }
        }
    }

    /// Size plus a zero inset clip — the runtime clips layer content to its
    /// declared bounds. Redundant instances are elided by the optimizer.
    fn set_size_and_clip(&mut self, visual: NodeIndex, size: Vec2) {
        let NodeKind::ContainerVisual(props) = &mut self.graph.node_mut(visual).kind else {
            return;
        };
        props.size = Some(size);
        let clip = self.graph.add_node(Node::new(NodeKind::InsetClip {
            left: 0.0,
            top: 0.0,
            right: 0.0,
            bottom: 0.0,
            center_point: None,
            scale: None,
        }));
        self.graph.set_slot(visual, SlotKind::Clip, clip);
    }

    /// In/out points inside the document range become an `IsVisible`
    /// timeline; a hidden layer is simply invisible.
    fn apply_visibility(&mut self, visual: NodeIndex, layer: &Layer) {
        if layer.is_hidden {
            if let NodeKind::ContainerVisual(props) = &mut self.graph.node_mut(visual).kind {
                props.is_visible = Some(false);
            }
            return;
        }

        let appears = layer.in_point > self.comp.in_point;
        let disappears = layer.out_point < self.comp.out_point;
        if !appears && !disappears {
            return;
        }

        let mut frames = Vec::with_capacity(3);
        if appears {
            frames.push(KeyFrame {
                progress: 0.0,
                value: false,
                easing: None,
            });
        }
        frames.push(KeyFrame {
            progress: self.comp.progress_of_frame(layer.in_point),
            value: true,
            easing: None,
        });
        if disappears {
            frames.push(KeyFrame {
                progress: self.comp.progress_of_frame(layer.out_point),
                value: false,
                easing: None,
            });
        }
        self.bind(visual, "IsVisible", KeyFrames::Bool(frames));
    }

    fn apply_visual_transform(&mut self, visual: NodeIndex, transform: &Transform) {
        let anchor = match &transform.anchor {
            Animatable::Static(a) => *a,
            Animatable::Animated(_) => {
                self.issues.warning(
                    "LT0021",
                    "animated anchor point is not supported; using initial value",
                );
                transform.anchor.initial().unwrap_or(Vec2::ZERO)
            }
        };

        {
            let props = self
                .graph
                .node_mut(visual)
                .kind
                .visual_props_mut()
                .expect("layer container is a visual");
            if anchor != Vec2::ZERO {
                props.center_point = Some(anchor.extend(0.0));
            }
            if let Animatable::Static(position) = &transform.position
                && *position - anchor != Vec2::ZERO
            {
                props.offset = Some((*position - anchor).extend(0.0));
            }
            if let Animatable::Static(scale) = &transform.scale_percent
                && *scale / 100.0 != Vec2::ONE
            {
                props.scale = Some((*scale / 100.0).extend(1.0));
            }
            if let Animatable::Static(rotation) = &transform.rotation_degrees
                && *rotation != 0.0
            {
                props.rotation_degrees = Some(*rotation);
            }
            if let Animatable::Static(opacity) = &transform.opacity_percent
                && *opacity != 100.0
            {
                props.opacity = Some(*opacity / 100.0);
            }
        }

        if let Animatable::Animated(frames) = &transform.position {
            let frames = frames.clone();
            self.bind_vec3(visual, "Offset", &frames, |p| (p - anchor).extend(0.0));
        }
        if let Animatable::Animated(frames) = &transform.scale_percent {
            let frames = frames.clone();
            self.bind_vec3(visual, "Scale", &frames, |s| (s / 100.0).extend(1.0));
        }
        if let Animatable::Animated(frames) = &transform.rotation_degrees {
            let frames = frames.clone();
            self.bind_scalar(visual, "RotationAngleInDegrees", &frames, |r| r);
        }
        if let Animatable::Animated(frames) = &transform.opacity_percent {
            let frames = frames.clone();
            self.bind_scalar(visual, "Opacity", &frames, |o| o / 100.0);
        }
    }
}

// ─── Shapes ──────────────────────────────────────────────────────────────

/// Paints and trim collected from one group's element list; they apply to
/// every geometry at the same level.
struct GroupContext<'a> {
    fill: Option<&'a ShapeElement>,
    stroke: Option<&'a ShapeElement>,
    trim: Option<&'a ShapeElement>,
}

impl<'a> GroupContext<'a> {
    fn scan(elements: &'a [ShapeElement]) -> Self {
        let mut ctx = Self {
            fill: None,
            stroke: None,
            trim: None,
        };
        for element in elements {
            match element {
                ShapeElement::Fill { .. } if ctx.fill.is_none() => ctx.fill = Some(element),
                ShapeElement::Stroke { .. } if ctx.stroke.is_none() => ctx.stroke = Some(element),
                ShapeElement::TrimPath { .. } if ctx.trim.is_none() => ctx.trim = Some(element),
                _ => {}
            }
        }
        ctx
    }
}

impl Translator<'_> {
    /// Lower one element list into `parent` (a shape visual or container
    /// shape). `opacity` accumulates static group opacity, pre-multiplied
    /// into brush alpha.
    fn add_shape_elements(&mut self, parent: NodeIndex, elements: &[ShapeElement], opacity: f32) {
        let ctx = GroupContext::scan(elements);
        for element in elements {
            match element {
                ShapeElement::Group {
                    name,
                    elements: inner,
                } => {
                    let container = self.graph.add_child(
                        parent,
                        Node::new(NodeKind::ContainerShape(ShapeProps::default())),
                    );
                    self.graph.node_mut(container).name = name.clone();
                    let group_opacity = self.apply_group_transform(container, inner);
                    self.add_shape_elements(container, inner, opacity * group_opacity);
                }
                ShapeElement::Rectangle { .. }
                | ShapeElement::Ellipse { .. }
                | ShapeElement::Path { .. } => {
                    self.add_sprite(parent, element, &ctx, opacity);
                }
                // Paints, trim, and the group transform were consumed above.
                _ => {}
            }
        }
    }

    /// Apply a group's trailing `tr` element to its container shape.
    /// Returns the group's static opacity factor.
    fn apply_group_transform(&mut self, container: NodeIndex, elements: &[ShapeElement]) -> f32 {
        let Some(ShapeElement::Transform(transform)) = elements
            .iter()
            .find(|e| matches!(e, ShapeElement::Transform(_)))
        else {
            return 1.0;
        };

        let anchor = transform.anchor.initial().unwrap_or(Vec2::ZERO);
        {
            let props = self
                .graph
                .node_mut(container)
                .kind
                .shape_props_mut()
                .expect("group container is a shape");
            if anchor != Vec2::ZERO {
                props.center_point = Some(anchor);
            }
            if let Animatable::Static(position) = &transform.position
                && *position - anchor != Vec2::ZERO
            {
                props.offset = Some(*position - anchor);
            }
            if let Animatable::Static(scale) = &transform.scale_percent
                && *scale / 100.0 != Vec2::ONE
            {
                props.scale = Some(*scale / 100.0);
            }
            if let Animatable::Static(rotation) = &transform.rotation_degrees
                && *rotation != 0.0
            {
                props.rotation_degrees = Some(*rotation);
            }
        }

        if let Animatable::Animated(frames) = &transform.position {
            let frames = frames.clone();
            self.bind_vec2(container, "Offset", &frames, |p| p - anchor);
        }
        if let Animatable::Animated(frames) = &transform.scale_percent {
            let frames = frames.clone();
            self.bind_vec2(container, "Scale", &frames, |s| s / 100.0);
        }
        if let Animatable::Animated(frames) = &transform.rotation_degrees {
            let frames = frames.clone();
            self.bind_scalar(container, "RotationAngleInDegrees", &frames, |r| r);
        }

        match &transform.opacity_percent {
            Animatable::Static(o) => o / 100.0,
            Animatable::Animated(_) => {
                self.issues.warning(
                    "LT0030",
                    "animated group opacity is not supported; using initial value",
                );
                transform.opacity_percent.initial().unwrap_or(100.0) / 100.0
            }
        }
    }

    fn add_sprite(
        &mut self,
        parent: NodeIndex,
        geometry: &ShapeElement,
        ctx: &GroupContext<'_>,
        opacity: f32,
    ) {
        let Some(geometry_node) = self.geometry_node(geometry) else {
            return;
        };
        if let Some(ShapeElement::TrimPath {
            start_percent,
            end_percent,
            offset_degrees,
        }) = ctx.trim
        {
            self.apply_trim(geometry_node, start_percent, end_percent, offset_degrees);
        }

        let sprite = self.graph.add_child(
            parent,
            Node::new(NodeKind::SpriteShape {
                transform: ShapeProps::default(),
                stroke: StrokeAttrs::default(),
            }),
        );
        self.graph.set_slot(sprite, SlotKind::Geometry, geometry_node);

        if let Some(ShapeElement::Fill {
            color,
            opacity_percent,
        }) = ctx.fill
        {
            let brush = self.color_brush(color, opacity_percent, opacity);
            self.graph.set_slot(sprite, SlotKind::FillBrush, brush);
        }
        if let Some(ShapeElement::Stroke {
            color,
            opacity_percent,
            width,
            cap,
            join,
            miter_limit,
        }) = ctx.stroke
        {
            let brush = self.color_brush(color, opacity_percent, opacity);
            self.graph.set_slot(sprite, SlotKind::StrokeBrush, brush);
            let NodeKind::SpriteShape { stroke, .. } = &mut self.graph.node_mut(sprite).kind
            else {
                unreachable!()
            };
            stroke.cap = Some(match cap {
                LineCap::Butt => StrokeCap::Flat,
                LineCap::Round => StrokeCap::Round,
                LineCap::Projected => StrokeCap::Square,
            });
            stroke.join = Some(match join {
                LineJoin::Miter => StrokeJoin::Miter,
                LineJoin::Round => StrokeJoin::Round,
                LineJoin::Bevel => StrokeJoin::Bevel,
            });
            stroke.miter_limit = Some(*miter_limit);
            match width {
                Animatable::Static(w) => {
                    let NodeKind::SpriteShape { stroke, .. } =
                        &mut self.graph.node_mut(sprite).kind
                    else {
                        unreachable!()
                    };
                    stroke.width = Some(*w);
                }
                Animatable::Animated(frames) => {
                    let frames = frames.clone();
                    self.bind_scalar(sprite, "StrokeThickness", &frames, |w| w);
                }
            }
        }
    }

    fn geometry_node(&mut self, geometry: &ShapeElement) -> Option<NodeIndex> {
        match geometry {
            ShapeElement::Rectangle {
                position,
                size,
                roundness,
            } => {
                if position.is_animated() || size.is_animated() || roundness.is_animated() {
                    self.issues.warning(
                        "LT0040",
                        "animated rectangle parameters are not supported; using initial values",
                    );
                }
                let position = position.initial().unwrap_or(Vec2::ZERO);
                let size = size.initial().unwrap_or(Vec2::ZERO);
                let roundness = roundness.initial().unwrap_or(0.0);
                // BodyMovin positions rectangles by center.
                let offset = position - size / 2.0;
                let kind = if roundness > 0.0 {
                    NodeKind::RoundedRectangleGeometry {
                        offset: Some(offset),
                        size,
                        corner_radius: Vec2::splat(roundness),
                        trim: TrimProps::default(),
                    }
                } else {
                    NodeKind::RectangleGeometry {
                        offset: Some(offset),
                        size,
                        trim: TrimProps::default(),
                    }
                };
                Some(self.graph.add_node(Node::new(kind)))
            }
            ShapeElement::Ellipse { position, size } => {
                if position.is_animated() || size.is_animated() {
                    self.issues.warning(
                        "LT0040",
                        "animated ellipse parameters are not supported; using initial values",
                    );
                }
                let center = position.initial().unwrap_or(Vec2::ZERO);
                let size = size.initial().unwrap_or(Vec2::ZERO);
                Some(self.graph.add_node(Node::new(NodeKind::EllipseGeometry {
                    center: (center != Vec2::ZERO).then_some(center),
                    radius: size / 2.0,
                    trim: TrimProps::default(),
                })))
            }
            ShapeElement::Path { geometry } => {
                let initial = geometry.initial().unwrap_or_default();
                let node = self.graph.add_node(Node::new(NodeKind::PathGeometry {
                    data: path_data(&initial),
                    trim: TrimProps::default(),
                }));
                if let Animatable::Animated(frames) = geometry {
                    let frames = frames.clone();
                    let converted = self.convert_frames(&frames, path_data);
                    self.bind(node, "Path", KeyFrames::Path(converted));
                }
                Some(node)
            }
            _ => None,
        }
    }

    fn apply_trim(
        &mut self,
        geometry: NodeIndex,
        start: &Animatable<f32>,
        end: &Animatable<f32>,
        offset: &Animatable<f32>,
    ) {
        let trim = match &mut self.graph.node_mut(geometry).kind {
            NodeKind::PathGeometry { trim, .. }
            | NodeKind::EllipseGeometry { trim, .. }
            | NodeKind::RectangleGeometry { trim, .. }
            | NodeKind::RoundedRectangleGeometry { trim, .. } => trim,
            _ => return,
        };
        if let Animatable::Static(s) = start
            && *s != 0.0
        {
            trim.trim_start = Some(s / 100.0);
        }
        if let Animatable::Static(e) = end
            && *e != 100.0
        {
            trim.trim_end = Some(e / 100.0);
        }
        if let Animatable::Static(o) = offset
            && *o != 0.0
        {
            trim.trim_offset = Some(o / 360.0);
        }

        if let Animatable::Animated(frames) = start {
            let frames = frames.clone();
            self.bind_scalar(geometry, "TrimStart", &frames, |v| v / 100.0);
        }
        if let Animatable::Animated(frames) = end {
            let frames = frames.clone();
            self.bind_scalar(geometry, "TrimEnd", &frames, |v| v / 100.0);
        }
        if let Animatable::Animated(frames) = offset {
            let frames = frames.clone();
            self.bind_scalar(geometry, "TrimOffset", &frames, |v| v / 360.0);
        }
    }

    /// A color brush with group and paint opacity pre-multiplied into
    /// alpha. Animated color becomes a `Color` animator on the brush.
    fn color_brush(
        &mut self,
        color: &Animatable<Color>,
        opacity_percent: &Animatable<f32>,
        group_opacity: f32,
    ) -> NodeIndex {
        let opacity = match opacity_percent {
            Animatable::Static(o) => o / 100.0,
            Animatable::Animated(_) => {
                self.issues.warning(
                    "LT0031",
                    "animated paint opacity is not supported; using initial value",
                );
                opacity_percent.initial().unwrap_or(100.0) / 100.0
            }
        };
        let alpha = opacity * group_opacity;

        let initial = color.initial().unwrap_or(Color::rgba(0.0, 0.0, 0.0, 1.0));
        let brush = self.graph.add_node(Node::new(NodeKind::ColorBrush {
            color: Color::rgba(initial.r, initial.g, initial.b, initial.a * alpha),
        }));
        if let Animatable::Animated(frames) = color {
            let frames = frames.clone();
            let converted = self.convert_frames(&frames, |c: &Color| {
                Color::rgba(c.r, c.g, c.b, c.a * alpha)
            });
            self.bind(brush, "Color", KeyFrames::Color(converted));
        }
        brush
    }
}

// ─── Free helpers ────────────────────────────────────────────────────────

/// Ancestor layers linked through `parent`, outermost first. A broken or
/// cyclic link reports an issue and truncates the chain.
fn parent_chain<'a>(layer: &Layer, siblings: &'a [Layer], issues: &mut Issues) -> Vec<&'a Layer> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = layer.parent;
    while let Some(parent_index) = current {
        if !seen.insert(parent_index) {
            issues.error(
                "LT0052",
                format!("layer parent cycle through index {parent_index}"),
            );
            break;
        }
        let Some(parent) = siblings.iter().find(|l| l.index == Some(parent_index)) else {
            issues.warning(
                "LT0053",
                format!("missing parent layer with index {parent_index}"),
            );
            break;
        };
        chain.push(parent);
        current = parent.parent;
    }
    chain.reverse();
    chain
}

/// Convert authored bezier data (relative tangents) into absolute cubic
/// commands.
fn path_data(path: &BezierPath) -> PathData {
    let n = path.vertices.len();
    let mut commands = Vec::with_capacity(n + 2);
    if n == 0 {
        return PathData { commands };
    }
    let tangent = |list: &[Vec2], i: usize| list.get(i).copied().unwrap_or(Vec2::ZERO);

    commands.push(PathCmd::MoveTo(path.vertices[0]));
    let segments = if path.closed { n } else { n.saturating_sub(1) };
    for i in 0..segments {
        let from = path.vertices[i];
        let to = path.vertices[(i + 1) % n];
        let c1 = from + tangent(&path.out_tangents, i);
        let c2 = to + tangent(&path.in_tangents, (i + 1) % n);
        commands.push(PathCmd::CubicTo(c1, c2, to));
    }
    if path.closed {
        commands.push(PathCmd::Close);
    }
    PathData { commands }
}

// ─── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lottie::Marker;

    fn composition(layers: Vec<Layer>) -> LottieComposition {
        LottieComposition {
            version: "5.5.2".into(),
            name: Some("test".into()),
            width: 200.0,
            height: 100.0,
            frame_rate: 30.0,
            in_point: 0.0,
            out_point: 60.0,
            assets: vec![],
            layers,
            markers: Vec::<Marker>::new(),
        }
    }

    fn null_layer() -> Layer {
        Layer {
            kind: LayerKind::Null,
            index: None,
            parent: None,
            name: None,
            in_point: 0.0,
            out_point: 60.0,
            start_time: 0.0,
            stretch: 1.0,
            transform: Transform::default(),
            auto_orient: false,
            is_hidden: false,
        }
    }

    #[test]
    fn root_carries_size_and_progress() {
        let mut issues = Issues::new();
        let graph = translate(&composition(vec![null_layer()]), &mut issues);
        let root = graph.node(graph.root);
        let NodeKind::ContainerVisual(props) = &root.kind else {
            panic!("root must be a container visual");
        };
        assert_eq!(props.size, Some(Vec2::new(200.0, 100.0)));
        assert!(root.properties.get(PropName::intern("Progress")).is_some());
    }

    #[test]
    fn solid_layer_becomes_sprite_with_brush() {
        let mut issues = Issues::new();
        let mut layer = null_layer();
        layer.kind = LayerKind::Solid {
            color: Color::rgba(1.0, 0.0, 0.0, 1.0),
            width: 200.0,
            height: 100.0,
        };
        let graph = translate(&composition(vec![layer]), &mut issues);

        let container = graph.children(graph.root)[0];
        let sprite = graph.children(container)[0];
        assert!(matches!(graph.node(sprite).kind, NodeKind::SpriteVisual(_)));
        let brush = graph.slot(sprite, SlotKind::FillBrush).unwrap();
        assert!(matches!(graph.node(brush).kind, NodeKind::ColorBrush { .. }));
    }

    #[test]
    fn animated_opacity_gets_progress_bound_controller() {
        let mut issues = Issues::new();
        let mut layer = null_layer();
        layer.transform.opacity_percent = Animatable::Animated(vec![
            LottieKeyFrame {
                frame: 0.0,
                value: 0.0,
                easing: KeyFrameEasing::Linear,
            },
            LottieKeyFrame {
                frame: 60.0,
                value: 100.0,
                easing: KeyFrameEasing::Linear,
            },
        ]);
        let graph = translate(&composition(vec![layer]), &mut issues);

        let container = graph.children(graph.root)[0];
        let animators = graph.animators(container);
        assert_eq!(animators.len(), 1);
        assert_eq!(animators[0].target.as_str(), "Opacity");

        let NodeKind::KeyFrameAnimation(KeyFrames::Scalar(frames)) =
            &graph.node(animators[0].animation).kind
        else {
            panic!("expected scalar keyframes");
        };
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].progress, 1.0);
        assert_eq!(frames[1].value, 1.0);

        let controller = animators[0].controller.expect("controller expected");
        let controller_animators = graph.animators(controller);
        assert_eq!(controller_animators[0].target.as_str(), "Progress");
        assert!(matches!(
            graph.node(controller_animators[0].animation).kind,
            NodeKind::ExpressionAnimation { .. }
        ));
    }

    #[test]
    fn layer_in_out_points_become_visibility_frames() {
        let mut issues = Issues::new();
        let mut layer = null_layer();
        layer.in_point = 15.0;
        layer.out_point = 45.0;
        let graph = translate(&composition(vec![layer]), &mut issues);

        let container = graph.children(graph.root)[0];
        let animator = graph
            .animators(container)
            .iter()
            .find(|a| a.target.as_str() == "IsVisible")
            .copied()
            .expect("visibility animator");
        let NodeKind::KeyFrameAnimation(KeyFrames::Bool(frames)) =
            &graph.node(animator.animation).kind
        else {
            panic!("expected bool keyframes");
        };
        assert_eq!(frames.len(), 3);
        assert!(!frames[0].value);
        assert_eq!(frames[1].progress, 0.25);
        assert!(frames[1].value);
        assert_eq!(frames[2].progress, 0.75);
        assert!(!frames[2].value);
    }

    #[test]
    fn shape_group_lowers_to_container_and_sprite() {
        let mut issues = Issues::new();
        let mut layer = null_layer();
        layer.kind = LayerKind::Shape {
            shapes: vec![ShapeElement::Group {
                name: Some("box".into()),
                elements: vec![
                    ShapeElement::Rectangle {
                        position: Animatable::Static(Vec2::new(50.0, 25.0)),
                        size: Animatable::Static(Vec2::new(100.0, 50.0)),
                        roundness: Animatable::Static(0.0),
                    },
                    ShapeElement::Fill {
                        color: Animatable::Static(Color::rgba(0.0, 1.0, 0.0, 1.0)),
                        opacity_percent: Animatable::Static(50.0),
                    },
                    ShapeElement::Transform(Transform::default()),
                ],
            }],
        };
        let graph = translate(&composition(vec![layer]), &mut issues);

        let layer_container = graph.children(graph.root)[0];
        let shape_visual = graph.children(layer_container)[0];
        assert!(matches!(
            graph.node(shape_visual).kind,
            NodeKind::ShapeVisual(_)
        ));
        let group = graph.children(shape_visual)[0];
        assert!(matches!(
            graph.node(group).kind,
            NodeKind::ContainerShape(_)
        ));
        let sprite = graph.children(group)[0];
        let NodeKind::SpriteShape { .. } = graph.node(sprite).kind else {
            panic!("expected sprite shape");
        };
        let geometry = graph.slot(sprite, SlotKind::Geometry).unwrap();
        let NodeKind::RectangleGeometry { offset, size, .. } = graph.node(geometry).kind else {
            panic!("expected rectangle geometry");
        };
        assert_eq!(offset, Some(Vec2::new(0.0, 0.0)));
        assert_eq!(size, Vec2::new(100.0, 50.0));

        // Fill opacity 50% premultiplied into the brush alpha.
        let brush = graph.slot(sprite, SlotKind::FillBrush).unwrap();
        let NodeKind::ColorBrush { color } = graph.node(brush).kind else {
            panic!("expected color brush");
        };
        assert!((color.a - 0.5).abs() < 1e-6);
    }

    #[test]
    fn parent_linked_layer_is_wrapped_in_ancestor_transform() {
        let mut issues = Issues::new();
        let mut anchor_layer = null_layer();
        anchor_layer.index = Some(1);
        anchor_layer.transform.position = Animatable::Static(Vec2::new(10.0, 0.0));
        let mut child_layer = null_layer();
        child_layer.index = Some(2);
        child_layer.parent = Some(1);

        let graph = translate(&composition(vec![anchor_layer, child_layer]), &mut issues);
        // Bottom-up order: child layer subtree first.
        let wrapper = graph.children(graph.root)[0];
        let NodeKind::ContainerVisual(props) = &graph.node(wrapper).kind else {
            panic!("expected wrapper container");
        };
        assert_eq!(props.offset, Some(Vec3::new(10.0, 0.0, 0.0)));
        // The layer's own container nests inside the wrapper.
        assert_eq!(graph.children(wrapper).len(), 1);
    }
}
