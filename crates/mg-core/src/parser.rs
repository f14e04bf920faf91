//! BodyMovin JSON parser.
//!
//! Walks a `serde_json::Value` tree instead of deriving: the dialect mixes
//! ints with floats, wraps scalars in one-element arrays, and switches
//! shape on the `a` flag, so a typed derive would fight the data. Missing
//! required document fields are fatal; everything else degrades to an
//! issue and a skipped construct.

use crate::issues::Issues;
use crate::lottie::{
    Animatable, BezierPath, KeyFrameEasing, Layer, LayerKind, LineCap, LineJoin,
    LottieComposition, LottieKeyFrame, Marker, PrecompAsset, ShapeElement, Transform,
};
use crate::model::Color;
use glam::Vec2;
use serde_json::Value;

// ─── Entry point ─────────────────────────────────────────────────────────

/// Parse a BodyMovin document.
///
/// # Errors
/// Invalid JSON, a non-object root, a missing `v`/`w`/`h`/`ip`/`op`, or an
/// absent/empty `layers` array.
pub fn parse(json: &str, issues: &mut Issues) -> Result<LottieComposition, String> {
    let root: Value = serde_json::from_str(json).map_err(|e| format!("invalid JSON: {e}"))?;
    let obj = root.as_object().ok_or("document root is not an object")?;

    let version = string(obj.get("v")).ok_or("missing required field `v`")?;
    let width = num(obj.get("w")).ok_or("missing required field `w`")?;
    let height = num(obj.get("h")).ok_or("missing required field `h`")?;
    let in_point = num(obj.get("ip")).ok_or("missing required field `ip`")?;
    let out_point = num(obj.get("op")).ok_or("missing required field `op`")?;

    let layer_values = obj
        .get("layers")
        .and_then(Value::as_array)
        .ok_or("missing required field `layers`")?;
    if layer_values.is_empty() {
        return Err("document has no layers".into());
    }

    let layers = layer_values
        .iter()
        .filter_map(|v| parse_layer(v, issues))
        .collect();

    let assets = obj
        .get("assets")
        .and_then(Value::as_array)
        .map(|assets| {
            assets
                .iter()
                .filter_map(|v| parse_asset(v, issues))
                .collect()
        })
        .unwrap_or_default();

    let markers = obj
        .get("markers")
        .and_then(Value::as_array)
        .map(|markers| markers.iter().filter_map(parse_marker).collect())
        .unwrap_or_default();

    Ok(LottieComposition {
        version,
        name: string(obj.get("nm")),
        width,
        height,
        frame_rate: num(obj.get("fr")).unwrap_or(30.0),
        in_point,
        out_point,
        assets,
        layers,
        markers,
    })
}

// ─── Scalar helpers ──────────────────────────────────────────────────────

fn num(v: Option<&Value>) -> Option<f32> {
    v?.as_f64().map(|x| x as f32)
}

fn int(v: Option<&Value>) -> Option<i64> {
    v?.as_i64()
}

fn string(v: Option<&Value>) -> Option<String> {
    v?.as_str().map(str::to_owned)
}

/// BodyMovin booleans come as `true`/`false` or `0`/`1`.
fn boolish(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|x| x != 0.0),
        _ => false,
    }
}

fn vec2(v: &Value) -> Option<Vec2> {
    let arr = v.as_array()?;
    Some(Vec2::new(
        arr.first()?.as_f64()? as f32,
        arr.get(1)?.as_f64()? as f32,
    ))
}

/// Scalars are sometimes wrapped in a one-element array.
fn scalar(v: &Value) -> Option<f32> {
    match v {
        Value::Number(n) => n.as_f64().map(|x| x as f32),
        Value::Array(arr) => arr.first()?.as_f64().map(|x| x as f32),
        _ => None,
    }
}

/// Colors come as `[r, g, b, a?]`, usually normalized but occasionally in
/// 0–255 range.
fn color(v: &Value) -> Option<Color> {
    let arr = v.as_array()?;
    let mut channels = [0.0f32; 4];
    channels[3] = 1.0;
    for (i, slot) in channels.iter_mut().enumerate().take(arr.len().min(4)) {
        *slot = arr[i].as_f64()? as f32;
    }
    if channels.iter().any(|&c| c > 1.0) {
        for c in &mut channels {
            *c /= 255.0;
        }
    }
    Some(Color::rgba(channels[0], channels[1], channels[2], channels[3]))
}

fn bezier_path(v: &Value) -> Option<BezierPath> {
    let obj = v.as_object()?;
    let points = |key: &str| -> Vec<Vec2> {
        obj.get(key)
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(vec2).collect())
            .unwrap_or_default()
    };
    let vertices = points("v");
    if vertices.is_empty() {
        return None;
    }
    Some(BezierPath {
        in_tangents: points("i"),
        out_tangents: points("o"),
        vertices,
        closed: boolish(obj.get("c")),
    })
}

// ─── Animatable values ───────────────────────────────────────────────────

/// One easing control point: `{"x": .42, "y": 0}`, components possibly
/// array-wrapped.
fn control_point(v: Option<&Value>) -> Option<Vec2> {
    let obj = v?.as_object()?;
    Some(Vec2::new(
        scalar(obj.get("x")?)?,
        scalar(obj.get("y")?)?,
    ))
}

fn keyframe_easing(frame: &serde_json::Map<String, Value>) -> KeyFrameEasing {
    if boolish(frame.get("h")) {
        return KeyFrameEasing::Hold;
    }
    match (control_point(frame.get("o")), control_point(frame.get("i"))) {
        (Some(c1), Some(c2)) => KeyFrameEasing::CubicBezier { c1, c2 },
        _ => KeyFrameEasing::Linear,
    }
}

/// Parse a keyframe list with a per-frame value extractor. Legacy
/// documents carry the segment end in `e` and may close with a bare
/// `{"t": …}` frame; the previous `e` fills the gap.
fn keyframes<T: Clone>(
    frames: &[Value],
    extract: impl Fn(&Value) -> Option<T>,
    issues: &mut Issues,
) -> Vec<LottieKeyFrame<T>> {
    let mut out = Vec::with_capacity(frames.len());
    let mut previous_end: Option<T> = None;
    for frame in frames {
        let Some(obj) = frame.as_object() else {
            issues.warning("LP0040", "keyframe is not an object; skipped");
            continue;
        };
        let Some(t) = num(obj.get("t")) else {
            issues.warning("LP0040", "keyframe without frame number; skipped");
            continue;
        };
        let value = obj
            .get("s")
            .and_then(|s| extract(s))
            .or_else(|| previous_end.clone());
        let Some(value) = value else {
            issues.warning("LP0041", format!("keyframe at frame {t} has no value; skipped"));
            continue;
        };
        previous_end = obj.get("e").and_then(|e| extract(e)).or(Some(value.clone()));
        out.push(LottieKeyFrame {
            frame: t,
            value,
            easing: keyframe_easing(obj),
        });
    }
    out
}

/// Parse an `{a, k}` animatable property. `a` may be absent in legacy
/// documents, in which case the shape of `k` decides.
fn animatable<T: Clone>(
    v: Option<&Value>,
    extract: impl Fn(&Value) -> Option<T> + Copy,
    default: T,
    issues: &mut Issues,
) -> Animatable<T> {
    let Some(obj) = v.and_then(Value::as_object) else {
        return Animatable::Static(default);
    };
    let Some(k) = obj.get("k") else {
        return Animatable::Static(default);
    };

    let animated = boolish(obj.get("a"))
        || matches!(k, Value::Array(arr) if arr.first().is_some_and(|f| f.is_object()));
    if animated {
        let frames = k.as_array().map(Vec::as_slice).unwrap_or_default();
        let parsed = keyframes(frames, extract, issues);
        if parsed.is_empty() {
            issues.warning("LP0042", "animated value with no usable keyframes");
            return Animatable::Static(default);
        }
        return Animatable::Animated(parsed);
    }

    match extract(k) {
        Some(value) => Animatable::Static(value),
        None => {
            issues.warning("LP0043", "static value with unexpected shape");
            Animatable::Static(default)
        }
    }
}

// ─── Transforms ──────────────────────────────────────────────────────────

fn parse_transform(v: Option<&Value>, issues: &mut Issues) -> Transform {
    let Some(obj) = v.and_then(Value::as_object) else {
        return Transform::default();
    };

    let position = match obj.get("p").and_then(Value::as_object) {
        // Split x/y position: approximate with the combined initial value.
        Some(p) if boolish(p.get("s")) => {
            let x = animatable(p.get("x"), scalar, 0.0, issues);
            let y = animatable(p.get("y"), scalar, 0.0, issues);
            if x.is_animated() || y.is_animated() {
                issues.warning(
                    "LP0020",
                    "split animated position is not supported; using initial value",
                );
            }
            Animatable::Static(Vec2::new(
                x.initial().unwrap_or(0.0),
                y.initial().unwrap_or(0.0),
            ))
        }
        _ => animatable(obj.get("p"), vec2, Vec2::ZERO, issues),
    };

    Transform {
        anchor: animatable(obj.get("a"), vec2, Vec2::ZERO, issues),
        position,
        scale_percent: animatable(obj.get("s"), vec2, Vec2::new(100.0, 100.0), issues),
        rotation_degrees: animatable(obj.get("r"), scalar, 0.0, issues),
        opacity_percent: animatable(obj.get("o"), scalar, 100.0, issues),
    }
}

// ─── Shape elements ──────────────────────────────────────────────────────

fn parse_shape_element(v: &Value, issues: &mut Issues) -> Option<ShapeElement> {
    let obj = v.as_object()?;
    if boolish(obj.get("hd")) {
        return None;
    }
    let ty = obj.get("ty").and_then(Value::as_str)?;
    match ty {
        "gr" => {
            let elements = obj
                .get("it")
                .and_then(Value::as_array)
                .map(|it| {
                    it.iter()
                        .filter_map(|e| parse_shape_element(e, issues))
                        .collect()
                })
                .unwrap_or_default();
            Some(ShapeElement::Group {
                name: string(obj.get("nm")),
                elements,
            })
        }
        "rc" => Some(ShapeElement::Rectangle {
            position: animatable(obj.get("p"), vec2, Vec2::ZERO, issues),
            size: animatable(obj.get("s"), vec2, Vec2::ZERO, issues),
            roundness: animatable(obj.get("r"), scalar, 0.0, issues),
        }),
        "el" => Some(ShapeElement::Ellipse {
            position: animatable(obj.get("p"), vec2, Vec2::ZERO, issues),
            size: animatable(obj.get("s"), vec2, Vec2::ZERO, issues),
        }),
        "sh" => Some(ShapeElement::Path {
            geometry: animatable(obj.get("ks"), bezier_path, BezierPath::default(), issues),
        }),
        "fl" => Some(ShapeElement::Fill {
            color: animatable(obj.get("c"), color, Color::rgba(0.0, 0.0, 0.0, 1.0), issues),
            opacity_percent: animatable(obj.get("o"), scalar, 100.0, issues),
        }),
        "st" => Some(ShapeElement::Stroke {
            color: animatable(obj.get("c"), color, Color::rgba(0.0, 0.0, 0.0, 1.0), issues),
            opacity_percent: animatable(obj.get("o"), scalar, 100.0, issues),
            width: animatable(obj.get("w"), scalar, 1.0, issues),
            cap: match int(obj.get("lc")) {
                Some(2) => LineCap::Round,
                Some(3) => LineCap::Projected,
                _ => LineCap::Butt,
            },
            join: match int(obj.get("lj")) {
                Some(2) => LineJoin::Round,
                Some(3) => LineJoin::Bevel,
                _ => LineJoin::Miter,
            },
            miter_limit: num(obj.get("ml")).unwrap_or(4.0),
        }),
        "tr" => Some(ShapeElement::Transform(parse_transform(Some(v), issues))),
        "tm" => Some(ShapeElement::TrimPath {
            start_percent: animatable(obj.get("s"), scalar, 0.0, issues),
            end_percent: animatable(obj.get("e"), scalar, 100.0, issues),
            offset_degrees: animatable(obj.get("o"), scalar, 0.0, issues),
        }),
        other => {
            issues.warning(
                "LP0030",
                format!("unsupported shape element `{other}`; skipped"),
            );
            None
        }
    }
}

// ─── Layers ──────────────────────────────────────────────────────────────

fn parse_layer(v: &Value, issues: &mut Issues) -> Option<Layer> {
    let obj = v.as_object()?;
    let ty = int(obj.get("ty"))?;

    let kind = match ty {
        0 => LayerKind::Precomp {
            ref_id: string(obj.get("refId")).unwrap_or_default(),
            width: num(obj.get("w")).unwrap_or(0.0),
            height: num(obj.get("h")).unwrap_or(0.0),
        },
        1 => LayerKind::Solid {
            color: string(obj.get("sc"))
                .and_then(|hex| Color::from_hex(&hex))
                .unwrap_or(Color::rgba(0.0, 0.0, 0.0, 1.0)),
            width: num(obj.get("sw")).unwrap_or(0.0),
            height: num(obj.get("sh")).unwrap_or(0.0),
        },
        2 => LayerKind::Image {
            ref_id: string(obj.get("refId")).unwrap_or_default(),
        },
        3 => LayerKind::Null,
        4 => LayerKind::Shape {
            shapes: obj
                .get("shapes")
                .and_then(Value::as_array)
                .map(|shapes| {
                    shapes
                        .iter()
                        .filter_map(|s| parse_shape_element(s, issues))
                        .collect()
                })
                .unwrap_or_default(),
        },
        5 => LayerKind::Text,
        other => {
            issues.warning("LP0010", format!("unsupported layer type {other}; skipped"));
            return None;
        }
    };

    Some(Layer {
        kind,
        index: int(obj.get("ind")),
        parent: int(obj.get("parent")),
        name: string(obj.get("nm")),
        in_point: num(obj.get("ip")).unwrap_or(0.0),
        out_point: num(obj.get("op")).unwrap_or(f32::MAX),
        start_time: num(obj.get("st")).unwrap_or(0.0),
        stretch: num(obj.get("sr")).unwrap_or(1.0),
        transform: parse_transform(obj.get("ks"), issues),
        auto_orient: boolish(obj.get("ao")),
        is_hidden: boolish(obj.get("hd")),
    })
}

fn parse_asset(v: &Value, issues: &mut Issues) -> Option<PrecompAsset> {
    let obj = v.as_object()?;
    let id = string(obj.get("id"))?;
    let Some(layers) = obj.get("layers").and_then(Value::as_array) else {
        // Image and sound assets have no layer list; decoding them is out
        // of scope.
        issues.info("LP0050", format!("ignoring non-precomp asset `{id}`"));
        return None;
    };
    Some(PrecompAsset {
        id,
        layers: layers.iter().filter_map(|l| parse_layer(l, issues)).collect(),
    })
}

fn parse_marker(v: &Value) -> Option<Marker> {
    let obj = v.as_object()?;
    Some(Marker {
        name: string(obj.get("cm")).unwrap_or_default(),
        frame: num(obj.get("tm"))?,
        duration_frames: num(obj.get("dr")).unwrap_or(0.0),
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn minimal(layers: &str) -> String {
        format!(
            r#"{{"v":"5.5.2","w":100,"h":50,"ip":0,"op":60,"fr":30,"layers":{layers}}}"#
        )
    }

    #[test]
    fn parses_minimal_document() {
        let mut issues = Issues::new();
        let doc = parse(&minimal(r#"[{"ty":3,"ip":0,"op":60}]"#), &mut issues).unwrap();
        assert_eq!(doc.width, 100.0);
        assert_eq!(doc.height, 50.0);
        assert_eq!(doc.layers.len(), 1);
        assert!(matches!(doc.layers[0].kind, LayerKind::Null));
        assert!(issues.is_empty());
    }

    #[test]
    fn missing_dimensions_are_fatal() {
        let mut issues = Issues::new();
        let err = parse(
            r#"{"v":"5.5.2","h":50,"ip":0,"op":60,"layers":[]}"#,
            &mut issues,
        )
        .unwrap_err();
        assert!(err.contains("`w`"), "unexpected error: {err}");
    }

    #[test]
    fn empty_layer_list_is_fatal() {
        let mut issues = Issues::new();
        assert!(parse(&minimal("[]"), &mut issues).is_err());
    }

    #[test]
    fn unknown_layer_type_becomes_issue() {
        let mut issues = Issues::new();
        let doc = parse(
            &minimal(r#"[{"ty":13,"ip":0,"op":60},{"ty":3,"ip":0,"op":60}]"#),
            &mut issues,
        )
        .unwrap();
        assert_eq!(doc.layers.len(), 1);
        assert!(issues.iter().any(|i| i.code == "LP0010"));
    }

    #[test]
    fn parses_animated_opacity() {
        let mut issues = Issues::new();
        let layer = r#"[{"ty":3,"ip":0,"op":60,"ks":{"o":{"a":1,"k":[
            {"t":0,"s":[0],"o":{"x":0.42,"y":0},"i":{"x":0.58,"y":1}},
            {"t":30,"s":[100],"h":1},
            {"t":60,"s":[0]}
        ]}}}]"#;
        let doc = parse(&minimal(layer), &mut issues).unwrap();
        let Animatable::Animated(frames) = &doc.layers[0].transform.opacity_percent else {
            panic!("expected animated opacity");
        };
        assert_eq!(frames.len(), 3);
        assert!(matches!(
            frames[0].easing,
            KeyFrameEasing::CubicBezier { .. }
        ));
        assert_eq!(frames[1].easing, KeyFrameEasing::Hold);
        assert_eq!(frames[1].value, 100.0);
    }

    #[test]
    fn parses_solid_layer_color() {
        let mut issues = Issues::new();
        let doc = parse(
            &minimal(r##"[{"ty":1,"sc":"#FF0000","sw":100,"sh":50,"ip":0,"op":60}]"##),
            &mut issues,
        )
        .unwrap();
        let LayerKind::Solid { color, width, .. } = &doc.layers[0].kind else {
            panic!("expected solid layer");
        };
        assert_eq!(color.to_hex(), "#FF0000");
        assert_eq!(*width, 100.0);
    }

    #[test]
    fn parses_shape_layer_tree() {
        let mut issues = Issues::new();
        let layer = r#"[{"ty":4,"ip":0,"op":60,"shapes":[
            {"ty":"gr","nm":"box","it":[
                {"ty":"rc","p":{"a":0,"k":[50,25]},"s":{"a":0,"k":[100,50]},"r":{"a":0,"k":0}},
                {"ty":"fl","c":{"a":0,"k":[1,0,0,1]},"o":{"a":0,"k":100}},
                {"ty":"tr","p":{"a":0,"k":[0,0]},"o":{"a":0,"k":100}}
            ]}
        ]}]"#;
        let doc = parse(&minimal(layer), &mut issues).unwrap();
        let LayerKind::Shape { shapes } = &doc.layers[0].kind else {
            panic!("expected shape layer");
        };
        let ShapeElement::Group { name, elements } = &shapes[0] else {
            panic!("expected group");
        };
        assert_eq!(name.as_deref(), Some("box"));
        assert_eq!(elements.len(), 3);
    }

    #[test]
    fn split_animated_position_degrades_with_warning() {
        let mut issues = Issues::new();
        let layer = r#"[{"ty":3,"ip":0,"op":60,"ks":{"p":{"s":true,
            "x":{"a":1,"k":[{"t":0,"s":[0]},{"t":60,"s":[10]}]},
            "y":{"a":0,"k":5}}}}]"#;
        let doc = parse(&minimal(layer), &mut issues).unwrap();
        assert!(issues.iter().any(|i| i.code == "LP0020"));
        assert_eq!(
            doc.layers[0].transform.position,
            Animatable::Static(Vec2::new(0.0, 5.0))
        );
    }

    #[test]
    fn markers_are_collected() {
        let mut issues = Issues::new();
        let json = r#"{"v":"5.5.2","w":10,"h":10,"ip":0,"op":60,
                "markers":[{"cm":"intro","tm":0,"dr":30}],
                "layers":[{"ty":3,"ip":0,"op":60}]}"#;
        let doc = parse(json, &mut issues).unwrap();
        assert_eq!(doc.markers.len(), 1);
        assert_eq!(doc.markers[0].name, "intro");
    }
}
