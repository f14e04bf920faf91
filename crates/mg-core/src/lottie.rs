//! BodyMovin/Lottie document model.
//!
//! Faithful to the source dialect rather than to the composition graph:
//! values are keyed by frame numbers, percentages stay percentages, and
//! unsupported constructs survive as issues instead of nodes. The
//! translator lowers this model to the composition graph.

use crate::model::Color;
use glam::Vec2;

// ─── Animatable values ───────────────────────────────────────────────────

/// Easing of the segment leading out of a keyframe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyFrameEasing {
    Linear,
    /// The value jumps at the end of the segment.
    Hold,
    /// Cubic bezier with normalized control points (`o`/`i` in the JSON).
    CubicBezier { c1: Vec2, c2: Vec2 },
}

/// One keyframe on a frame-number timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct LottieKeyFrame<T> {
    pub frame: f32,
    pub value: T,
    pub easing: KeyFrameEasing,
}

/// A value that is either static or keyframed.
#[derive(Debug, Clone, PartialEq)]
pub enum Animatable<T> {
    Static(T),
    Animated(Vec<LottieKeyFrame<T>>),
}

impl<T: Clone> Animatable<T> {
    /// The value at the start of the timeline.
    pub fn initial(&self) -> Option<T> {
        match self {
            Animatable::Static(v) => Some(v.clone()),
            Animatable::Animated(frames) => frames.first().map(|f| f.value.clone()),
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, Animatable::Animated(frames) if frames.len() > 1)
    }
}

// ─── Layer transform ─────────────────────────────────────────────────────

/// The `ks` transform block of a layer or the contents of a shape-group
/// transform element. Percentages are kept as authored (scale 100 = 1×).
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub anchor: Animatable<Vec2>,
    pub position: Animatable<Vec2>,
    pub scale_percent: Animatable<Vec2>,
    pub rotation_degrees: Animatable<f32>,
    pub opacity_percent: Animatable<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            anchor: Animatable::Static(Vec2::ZERO),
            position: Animatable::Static(Vec2::ZERO),
            scale_percent: Animatable::Static(Vec2::new(100.0, 100.0)),
            rotation_degrees: Animatable::Static(0.0),
            opacity_percent: Animatable::Static(100.0),
        }
    }
}

// ─── Shape elements ──────────────────────────────────────────────────────

/// Bezier path data as authored: vertex list plus per-vertex tangents.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BezierPath {
    pub vertices: Vec<Vec2>,
    pub in_tangents: Vec<Vec2>,
    pub out_tangents: Vec<Vec2>,
    pub closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    Round,
    Projected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

/// An element of a shape layer's content tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeElement {
    Group {
        name: Option<String>,
        elements: Vec<ShapeElement>,
    },
    Rectangle {
        position: Animatable<Vec2>,
        size: Animatable<Vec2>,
        roundness: Animatable<f32>,
    },
    Ellipse {
        position: Animatable<Vec2>,
        size: Animatable<Vec2>,
    },
    Path {
        geometry: Animatable<BezierPath>,
    },
    Fill {
        color: Animatable<Color>,
        opacity_percent: Animatable<f32>,
    },
    Stroke {
        color: Animatable<Color>,
        opacity_percent: Animatable<f32>,
        width: Animatable<f32>,
        cap: LineCap,
        join: LineJoin,
        miter_limit: f32,
    },
    Transform(Transform),
    TrimPath {
        start_percent: Animatable<f32>,
        end_percent: Animatable<f32>,
        offset_degrees: Animatable<f32>,
    },
}

// ─── Layers ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Precomp {
        ref_id: String,
        width: f32,
        height: f32,
    },
    Solid {
        color: Color,
        width: f32,
        height: f32,
    },
    Image {
        ref_id: String,
    },
    Null,
    Shape {
        shapes: Vec<ShapeElement>,
    },
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub kind: LayerKind,
    pub index: Option<i64>,
    pub parent: Option<i64>,
    pub name: Option<String>,
    pub in_point: f32,
    pub out_point: f32,
    pub start_time: f32,
    pub stretch: f32,
    pub transform: Transform,
    pub auto_orient: bool,
    pub is_hidden: bool,
}

// ─── Assets & markers ────────────────────────────────────────────────────

/// A reusable precomposition referenced by `Precomp` layers.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecompAsset {
    pub id: String,
    pub layers: Vec<Layer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub name: String,
    pub frame: f32,
    pub duration_frames: f32,
}

// ─── Composition ─────────────────────────────────────────────────────────

/// A parsed BodyMovin document.
#[derive(Debug, Clone, PartialEq)]
pub struct LottieComposition {
    pub version: String,
    pub name: Option<String>,
    pub width: f32,
    pub height: f32,
    pub frame_rate: f32,
    pub in_point: f32,
    pub out_point: f32,
    pub assets: Vec<PrecompAsset>,
    pub layers: Vec<Layer>,
    pub markers: Vec<Marker>,
}

impl LottieComposition {
    /// Total duration in frames.
    pub fn duration_frames(&self) -> f32 {
        self.out_point - self.in_point
    }

    /// Total duration in whole nanoseconds, for codegen configuration.
    pub fn duration_nanos(&self) -> u64 {
        if self.frame_rate <= 0.0 {
            return 0;
        }
        (self.duration_frames() as f64 / self.frame_rate as f64 * 1e9) as u64
    }

    /// Map a frame number to normalized progress over the full range.
    pub fn progress_of_frame(&self, frame: f32) -> f32 {
        let duration = self.duration_frames();
        if duration <= 0.0 {
            return 0.0;
        }
        ((frame - self.in_point) / duration).clamp(0.0, 1.0)
    }

    pub fn asset(&self, ref_id: &str) -> Option<&PrecompAsset> {
        self.assets.iter().find(|a| a.id == ref_id)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn composition() -> LottieComposition {
        LottieComposition {
            version: "5.5.2".into(),
            name: None,
            width: 100.0,
            height: 100.0,
            frame_rate: 30.0,
            in_point: 0.0,
            out_point: 60.0,
            assets: vec![],
            layers: vec![],
            markers: vec![],
        }
    }

    #[test]
    fn progress_is_normalized_and_clamped() {
        let c = composition();
        assert_eq!(c.progress_of_frame(0.0), 0.0);
        assert_eq!(c.progress_of_frame(30.0), 0.5);
        assert_eq!(c.progress_of_frame(90.0), 1.0);
        assert_eq!(c.progress_of_frame(-5.0), 0.0);
    }

    #[test]
    fn duration_in_nanos() {
        let c = composition();
        // 60 frames at 30fps = 2 seconds.
        assert_eq!(c.duration_nanos(), 2_000_000_000);
    }

    #[test]
    fn animatable_initial_value() {
        let anim = Animatable::Animated(vec![
            LottieKeyFrame {
                frame: 0.0,
                value: 1.0f32,
                easing: KeyFrameEasing::Linear,
            },
            LottieKeyFrame {
                frame: 10.0,
                value: 0.0,
                easing: KeyFrameEasing::Hold,
            },
        ]);
        assert_eq!(anim.initial(), Some(1.0));
        assert!(anim.is_animated());
        assert!(!Animatable::Static(3.0f32).is_animated());
    }
}
