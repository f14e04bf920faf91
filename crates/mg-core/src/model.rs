//! Composition-graph data model.
//!
//! The graph is an arena of tagged node variants (visuals, shapes,
//! geometries, brushes, clips, easings, animations) with stable indices.
//! Owning edges form a tree: ordered child slots for containers plus named
//! single slots (geometry, brushes, clip). Animations, easings, and
//! controllers live in the same arena and are referenced from animators and
//! keyframes; those references are non-owning and may be shared.

use crate::name::PropName;
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use petgraph::Direction;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use smallvec::SmallVec;
use std::collections::HashSet;

pub use petgraph::graph::NodeIndex;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`. BodyMovin solid layers
    /// carry their color in this form.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::rgba(
                    (r * 17) as f32 / 255.0,
                    (g * 17) as f32 / 255.0,
                    (b * 17) as f32 / 255.0,
                    1.0,
                ))
            }
            6 => {
                let r = hex_val(bytes[0])? << 4 | hex_val(bytes[1])?;
                let g = hex_val(bytes[2])? << 4 | hex_val(bytes[3])?;
                let b = hex_val(bytes[4])? << 4 | hex_val(bytes[5])?;
                Some(Self::rgba(
                    r as f32 / 255.0,
                    g as f32 / 255.0,
                    b as f32 / 255.0,
                    1.0,
                ))
            }
            8 => {
                let r = hex_val(bytes[0])? << 4 | hex_val(bytes[1])?;
                let g = hex_val(bytes[2])? << 4 | hex_val(bytes[3])?;
                let b = hex_val(bytes[4])? << 4 | hex_val(bytes[5])?;
                let a = hex_val(bytes[6])? << 4 | hex_val(bytes[7])?;
                Some(Self::rgba(
                    r as f32 / 255.0,
                    g as f32 / 255.0,
                    b as f32 / 255.0,
                    a as f32 / 255.0,
                ))
            }
            _ => None,
        }
    }

    /// Emit as `#RRGGBB` or `#RRGGBBAA`.
    pub fn to_hex(&self) -> String {
        let r = (self.r * 255.0).round() as u8;
        let g = (self.g * 255.0).round() as u8;
        let b = (self.b * 255.0).round() as u8;
        let a = (self.a * 255.0).round() as u8;
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

// ─── Path data ───────────────────────────────────────────────────────────

/// A single path command (SVG-like but simplified).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    MoveTo(Vec2),
    LineTo(Vec2),
    CubicTo(Vec2, Vec2, Vec2), // c1, c2, end
    Close,
}

/// Resolved path outline carried by `PathGeometry` and path keyframes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathData {
    pub commands: Vec<PathCmd>,
}

// ─── Stroke attributes ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeCap {
    #[default]
    Flat,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Stroke attributes on a sprite shape. `None` means runtime default.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StrokeAttrs {
    pub width: Option<f32>,
    pub cap: Option<StrokeCap>,
    pub join: Option<StrokeJoin>,
    pub miter_limit: Option<f32>,
}

impl StrokeAttrs {
    pub fn is_default(&self) -> bool {
        self.width.is_none()
            && self.cap.is_none()
            && self.join.is_none()
            && self.miter_limit.is_none()
    }
}

// ─── Transform slots ─────────────────────────────────────────────────────

/// How content outside a visual's bounds is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderMode {
    Soft,
    Hard,
}

/// Transform slots of a visual (3D). `None` means default:
/// identity transform, full opacity, visible.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VisualProps {
    pub center_point: Option<Vec3>,
    pub offset: Option<Vec3>,
    pub rotation_degrees: Option<f32>,
    pub rotation_axis: Option<Vec3>,
    pub scale: Option<Vec3>,
    pub transform_matrix: Option<Mat4>,
    pub size: Option<Vec2>,
    pub opacity: Option<f32>,
    pub is_visible: Option<bool>,
    pub border_mode: Option<BorderMode>,
}

/// Transform slots of a shape (2D). The matrix is an affine 3×3 whose last
/// row is `[0, 0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShapeProps {
    pub center_point: Option<Vec2>,
    pub offset: Option<Vec2>,
    pub rotation_degrees: Option<f32>,
    pub scale: Option<Vec2>,
    pub transform_matrix: Option<Mat3>,
}

/// Trim slots shared by every geometry variant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrimProps {
    pub trim_start: Option<f32>,
    pub trim_end: Option<f32>,
    pub trim_offset: Option<f32>,
}

// ─── Property sets & animators ───────────────────────────────────────────

/// A typed value in a node's property set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropValue {
    Scalar(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Color(Color),
    Bool(bool),
}

/// Name → typed value map carried by every node. Insertion-ordered so that
/// emission stays deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertySet {
    entries: Vec<(PropName, PropValue)>,
}

impl PropertySet {
    pub fn set(&mut self, name: PropName, value: PropValue) {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: PropName) -> Option<&PropValue> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(PropName, PropValue)> {
        self.entries.iter()
    }
}

/// Binds an animated property name on its owning node to an animation node
/// and an optional controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animator {
    pub target: PropName,
    pub animation: NodeIndex,
    pub controller: Option<NodeIndex>,
}

// ─── Keyframes ───────────────────────────────────────────────────────────

/// One keyframe: normalized progress, value, and an easing node describing
/// the segment leading into this frame. Bool frames carry no easing — the
/// runtime steps between them.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyFrame<T> {
    pub progress: f32,
    pub value: T,
    pub easing: Option<NodeIndex>,
}

/// Typed keyframe sequences of a `KeyFrameAnimation`.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyFrames {
    Scalar(Vec<KeyFrame<f32>>),
    Vec2(Vec<KeyFrame<Vec2>>),
    Vec3(Vec<KeyFrame<Vec3>>),
    Vec4(Vec<KeyFrame<Vec4>>),
    Color(Vec<KeyFrame<Color>>),
    Path(Vec<KeyFrame<PathData>>),
    Bool(Vec<KeyFrame<bool>>),
}

impl KeyFrames {
    pub fn len(&self) -> usize {
        match self {
            KeyFrames::Scalar(v) => v.len(),
            KeyFrames::Vec2(v) => v.len(),
            KeyFrames::Vec3(v) => v.len(),
            KeyFrames::Vec4(v) => v.len(),
            KeyFrames::Color(v) => v.len(),
            KeyFrames::Path(v) => v.len(),
            KeyFrames::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the keyframe value type, for diagnostics and dumps.
    pub fn type_name(&self) -> &'static str {
        match self {
            KeyFrames::Scalar(_) => "Scalar",
            KeyFrames::Vec2(_) => "Vector2",
            KeyFrames::Vec3(_) => "Vector3",
            KeyFrames::Vec4(_) => "Vector4",
            KeyFrames::Color(_) => "Color",
            KeyFrames::Path(_) => "Path",
            KeyFrames::Bool(_) => "Boolean",
        }
    }
}

// ─── Node kinds ──────────────────────────────────────────────────────────

/// The tagged node variants of the composition graph.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // Visuals — ordered children are visuals, except ShapeVisual whose
    // children are its shape tree.
    ContainerVisual(VisualProps),
    ShapeVisual(VisualProps),
    SpriteVisual(VisualProps),

    // Shapes.
    ContainerShape(ShapeProps),
    SpriteShape {
        transform: ShapeProps,
        stroke: StrokeAttrs,
    },

    // Geometries.
    PathGeometry {
        data: PathData,
        trim: TrimProps,
    },
    EllipseGeometry {
        center: Option<Vec2>,
        radius: Vec2,
        trim: TrimProps,
    },
    RectangleGeometry {
        offset: Option<Vec2>,
        size: Vec2,
        trim: TrimProps,
    },
    RoundedRectangleGeometry {
        offset: Option<Vec2>,
        size: Vec2,
        corner_radius: Vec2,
        trim: TrimProps,
    },

    // Brushes.
    ColorBrush {
        color: Color,
    },
    EffectBrush,
    SurfaceBrush,

    // Clips.
    InsetClip {
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
        center_point: Option<Vec2>,
        scale: Option<Vec2>,
    },
    GeometricClip,

    // Easings.
    LinearEasing,
    CubicBezierEasing {
        c1: Vec2,
        c2: Vec2,
    },
    StepEasing {
        steps: u32,
    },
    HoldEasing,

    // Animations.
    ExpressionAnimation {
        expression: String,
        references: Vec<(PropName, NodeIndex)>,
    },
    KeyFrameAnimation(KeyFrames),

    // Auxiliary.
    AnimationController {
        paused: bool,
    },
    VisualSurface {
        /// Non-owning reference to the visual rendered into the surface.
        /// The runtime ignores the source's own transform slots.
        source: Option<NodeIndex>,
        source_size: Option<Vec2>,
        source_offset: Option<Vec2>,
    },
    ViewBox {
        size: Vec2,
    },
}

impl NodeKind {
    /// Short name of the variant, for diagnostics and dumps.
    pub fn variant_name(&self) -> &'static str {
        match self {
            NodeKind::ContainerVisual(_) => "ContainerVisual",
            NodeKind::ShapeVisual(_) => "ShapeVisual",
            NodeKind::SpriteVisual(_) => "SpriteVisual",
            NodeKind::ContainerShape(_) => "ContainerShape",
            NodeKind::SpriteShape { .. } => "SpriteShape",
            NodeKind::PathGeometry { .. } => "PathGeometry",
            NodeKind::EllipseGeometry { .. } => "EllipseGeometry",
            NodeKind::RectangleGeometry { .. } => "RectangleGeometry",
            NodeKind::RoundedRectangleGeometry { .. } => "RoundedRectangleGeometry",
            NodeKind::ColorBrush { .. } => "ColorBrush",
            NodeKind::EffectBrush => "EffectBrush",
            NodeKind::SurfaceBrush => "SurfaceBrush",
            NodeKind::InsetClip { .. } => "InsetClip",
            NodeKind::GeometricClip => "GeometricClip",
            NodeKind::LinearEasing => "LinearEasing",
            NodeKind::CubicBezierEasing { .. } => "CubicBezierEasing",
            NodeKind::StepEasing { .. } => "StepEasing",
            NodeKind::HoldEasing => "HoldEasing",
            NodeKind::ExpressionAnimation { .. } => "ExpressionAnimation",
            NodeKind::KeyFrameAnimation(_) => "KeyFrameAnimation",
            NodeKind::AnimationController { .. } => "AnimationController",
            NodeKind::VisualSurface { .. } => "VisualSurface",
            NodeKind::ViewBox { .. } => "ViewBox",
        }
    }

    /// True for variants that carry an ordered child sequence.
    pub fn has_children(&self) -> bool {
        matches!(
            self,
            NodeKind::ContainerVisual(_)
                | NodeKind::ShapeVisual(_)
                | NodeKind::SpriteVisual(_)
                | NodeKind::ContainerShape(_)
        )
    }

    pub fn is_visual(&self) -> bool {
        matches!(
            self,
            NodeKind::ContainerVisual(_) | NodeKind::ShapeVisual(_) | NodeKind::SpriteVisual(_)
        )
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, NodeKind::ContainerShape(_) | NodeKind::SpriteShape { .. })
    }

    pub fn visual_props(&self) -> Option<&VisualProps> {
        match self {
            NodeKind::ContainerVisual(p) | NodeKind::ShapeVisual(p) | NodeKind::SpriteVisual(p) => {
                Some(p)
            }
            _ => None,
        }
    }

    pub fn visual_props_mut(&mut self) -> Option<&mut VisualProps> {
        match self {
            NodeKind::ContainerVisual(p) | NodeKind::ShapeVisual(p) | NodeKind::SpriteVisual(p) => {
                Some(p)
            }
            _ => None,
        }
    }

    pub fn shape_props(&self) -> Option<&ShapeProps> {
        match self {
            NodeKind::ContainerShape(p) => Some(p),
            NodeKind::SpriteShape { transform, .. } => Some(transform),
            _ => None,
        }
    }

    pub fn shape_props_mut(&mut self) -> Option<&mut ShapeProps> {
        match self {
            NodeKind::ContainerShape(p) => Some(p),
            NodeKind::SpriteShape { transform, .. } => Some(transform),
            _ => None,
        }
    }
}

// ─── Node ────────────────────────────────────────────────────────────────

/// A single node in the composition graph: variant payload plus the state
/// every node carries — author metadata, a property set, and animators.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub name: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub properties: PropertySet,
    pub animators: SmallVec<[Animator; 2]>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            name: None,
            short_description: None,
            long_description: None,
            properties: PropertySet::default(),
            animators: SmallVec::new(),
        }
    }

    pub fn named(kind: NodeKind, name: impl Into<String>) -> Self {
        let mut node = Self::new(kind);
        node.name = Some(name.into());
        node
    }

    /// True if some animator targets `name`.
    pub fn is_animated(&self, name: &str) -> bool {
        let name = PropName::intern(name);
        self.animators.iter().any(|a| a.target == name)
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// Named single-ownership slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Geometry,
    FillBrush,
    StrokeBrush,
    Clip,
    ViewBox,
    Surface,
}

/// Owning edge weights: ordered child slots or named single slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Child(u32),
    Slot(SlotKind),
}

// ─── Composition graph ───────────────────────────────────────────────────

/// The composition graph: a stable arena of nodes plus owning edges.
///
/// Owning edges form a tree rooted at `root`. Animation, easing, and
/// controller nodes are reached through animator and keyframe references
/// instead of owning edges; unreferenced ones are swept by
/// `collect_garbage`.
#[derive(Debug, Clone)]
pub struct CompGraph {
    pub graph: StableDiGraph<Node, EdgeKind>,
    pub root: NodeIndex,
}

impl CompGraph {
    /// Create a graph whose root is an empty `ContainerVisual`.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(Node::new(NodeKind::ContainerVisual(VisualProps::default())));
        Self { graph, root }
    }

    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.graph[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut Node {
        &mut self.graph[idx]
    }

    pub fn contains(&self, idx: NodeIndex) -> bool {
        self.graph.contains_node(idx)
    }

    /// Add a free node to the arena (animations, easings, controllers).
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        self.graph.add_node(node)
    }

    /// Add a node and append it to `parent`'s child sequence.
    pub fn add_child(&mut self, parent: NodeIndex, node: Node) -> NodeIndex {
        let idx = self.graph.add_node(node);
        self.append_child(parent, idx);
        idx
    }

    /// Append an existing arena node to `parent`'s child sequence.
    ///
    /// Panics if `parent`'s variant has no child sequence.
    pub fn append_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        assert!(
            self.graph[parent].kind.has_children(),
            "append_child on {} — variant has no child sequence",
            self.graph[parent].kind.variant_name()
        );
        let next = self.children(parent).len() as u32;
        self.graph.add_edge(parent, child, EdgeKind::Child(next));
    }

    /// Children of a node in document order.
    ///
    /// Panics if the variant has no child sequence — asking a sprite shape
    /// for children is a programmer error.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        assert!(
            self.graph[idx].kind.has_children(),
            "children() on {} — variant has no child sequence",
            self.graph[idx].kind.variant_name()
        );
        let mut out: Vec<(u32, NodeIndex)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|e| match e.weight() {
                EdgeKind::Child(i) => Some((*i, e.target())),
                EdgeKind::Slot(_) => None,
            })
            .collect();
        out.sort_by_key(|(i, _)| *i);
        out.into_iter().map(|(_, t)| t).collect()
    }

    /// Replace `parent`'s entire child sequence. Existing child edges are
    /// dropped; the new list is renumbered from zero.
    pub fn set_children(&mut self, parent: NodeIndex, children: &[NodeIndex]) {
        let old: Vec<_> = self
            .graph
            .edges_directed(parent, Direction::Outgoing)
            .filter(|e| matches!(e.weight(), EdgeKind::Child(_)))
            .map(|e| e.id())
            .collect();
        for edge in old {
            self.graph.remove_edge(edge);
        }
        for (i, &child) in children.iter().enumerate() {
            self.graph.add_edge(parent, child, EdgeKind::Child(i as u32));
        }
    }

    /// The owning parent, following child and slot edges alike.
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .next()
            .map(|e| e.source())
    }

    /// Position of `child` in `parent`'s child sequence.
    pub fn child_position(&self, parent: NodeIndex, child: NodeIndex) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Detach a node from its owning parent, leaving it in the arena.
    pub fn detach(&mut self, idx: NodeIndex) {
        let incoming: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| e.id())
            .collect();
        for edge in incoming {
            self.graph.remove_edge(edge);
        }
    }

    // ─── Slots ───────────────────────────────────────────────────────────

    /// The node owned through `kind`, if any.
    pub fn slot(&self, owner: NodeIndex, kind: SlotKind) -> Option<NodeIndex> {
        self.graph
            .edges_directed(owner, Direction::Outgoing)
            .find(|e| *e.weight() == EdgeKind::Slot(kind))
            .map(|e| e.target())
    }

    /// Attach `node` in the named slot, detaching (but not deleting) any
    /// previous occupant.
    pub fn set_slot(&mut self, owner: NodeIndex, kind: SlotKind, node: NodeIndex) {
        self.take_slot(owner, kind);
        self.graph.add_edge(owner, node, EdgeKind::Slot(kind));
    }

    /// Detach and return the slot occupant, if any.
    pub fn take_slot(&mut self, owner: NodeIndex, kind: SlotKind) -> Option<NodeIndex> {
        let found = self
            .graph
            .edges_directed(owner, Direction::Outgoing)
            .find(|e| *e.weight() == EdgeKind::Slot(kind))
            .map(|e| (e.id(), e.target()));
        if let Some((edge, target)) = found {
            self.graph.remove_edge(edge);
            Some(target)
        } else {
            None
        }
    }

    /// Remove the slot occupant and its owned subtree.
    pub fn clear_slot(&mut self, owner: NodeIndex, kind: SlotKind) {
        if let Some(node) = self.take_slot(owner, kind) {
            self.remove_subtree(node);
        }
    }

    // ─── Animators ───────────────────────────────────────────────────────

    pub fn animators(&self, idx: NodeIndex) -> &[Animator] {
        &self.graph[idx].animators
    }

    /// Bind an animator for `target` on `idx`.
    pub fn start_animation(
        &mut self,
        idx: NodeIndex,
        target: PropName,
        animation: NodeIndex,
        controller: Option<NodeIndex>,
    ) {
        self.graph[idx].animators.push(Animator {
            target,
            animation,
            controller,
        });
    }

    /// Remove the first animator with the given target name.
    pub fn stop_animation(&mut self, idx: NodeIndex, target: PropName) -> Option<Animator> {
        let pos = self.graph[idx].animators.iter().position(|a| a.target == target)?;
        Some(self.graph[idx].animators.remove(pos))
    }

    // ─── Structural mutation ─────────────────────────────────────────────

    /// Remove a node and everything it owns (children and slot occupants).
    /// Animations referenced by animators stay in the arena; `collect_garbage`
    /// sweeps them once nothing reachable refers to them.
    pub fn remove_subtree(&mut self, idx: NodeIndex) {
        let owned: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.target())
            .collect();
        for child in owned {
            self.remove_subtree(child);
        }
        self.graph.remove_node(idx);
    }

    /// Replace `old` with `new` in the parent's child sequence, keeping the
    /// position. `new` is detached from wherever it currently hangs first.
    pub fn replace_child(&mut self, parent: NodeIndex, old: NodeIndex, new: NodeIndex) {
        let mut children = self.children(parent);
        let Some(pos) = children.iter().position(|&c| c == old) else {
            return;
        };
        self.detach(new);
        self.detach(old);
        children[pos] = new;
        self.set_children(parent, &children);
    }

    /// Splice `node`'s children into its parent's child sequence at `node`'s
    /// position, then delete `node`. Tolerates a node that has already lost
    /// its parent to an earlier rewrite in the same pass.
    pub fn splice_into_parent(&mut self, node: NodeIndex) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        let grandchildren = self.children(node);
        let mut children = self.children(parent);
        let Some(pos) = children.iter().position(|&c| c == node) else {
            return;
        };
        for &gc in &grandchildren {
            self.detach(gc);
        }
        children.splice(pos..=pos, grandchildren.iter().copied());
        self.set_children(parent, &children);
        self.remove_subtree(node);
    }

    // ─── Liveness ────────────────────────────────────────────────────────

    /// Count of nodes reachable from the root along owning edges.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        let mut seen = HashSet::new();
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            if !seen.insert(idx) {
                continue;
            }
            for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
                stack.push(edge.target());
            }
        }
        seen.len()
    }

    /// Every node reachable through owning edges, animators, keyframe
    /// easings, and controllers. Expression references are non-owning and do
    /// not keep their targets alive.
    fn mark_live(&self) -> HashSet<NodeIndex> {
        let mut seen = HashSet::new();
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            if !seen.insert(idx) {
                continue;
            }
            for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
                stack.push(edge.target());
            }
            for animator in &self.graph[idx].animators {
                stack.push(animator.animation);
                if let Some(controller) = animator.controller {
                    stack.push(controller);
                }
            }
            if let NodeKind::KeyFrameAnimation(frames) = &self.graph[idx].kind {
                push_easings(frames, &mut stack);
            }
        }
        seen
    }

    /// Drop every arena node not reachable from the root.
    pub fn collect_garbage(&mut self) {
        let live = self.mark_live();
        let dead: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|idx| !live.contains(idx))
            .collect();
        for idx in dead {
            self.graph.remove_node(idx);
        }
    }
}

impl Default for CompGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn push_easings(frames: &KeyFrames, stack: &mut Vec<NodeIndex>) {
    fn extend<T>(frames: &[KeyFrame<T>], stack: &mut Vec<NodeIndex>) {
        stack.extend(frames.iter().filter_map(|f| f.easing));
    }
    match frames {
        KeyFrames::Scalar(v) => extend(v, stack),
        KeyFrames::Vec2(v) => extend(v, stack),
        KeyFrames::Vec3(v) => extend(v, stack),
        KeyFrames::Vec4(v) => extend(v, stack),
        KeyFrames::Color(v) => extend(v, stack),
        KeyFrames::Path(v) => extend(v, stack),
        KeyFrames::Bool(v) => extend(v, stack),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────
