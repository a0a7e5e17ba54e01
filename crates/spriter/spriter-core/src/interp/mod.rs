//! Key curves and the spatial math shared by every evaluation level.
//!
//! A curve maps the linear progress between two keys to the factor used to mix
//! their payloads. Mainline keys, timeline keys and varline keys all go through
//! [`Curve::apply`].

pub mod functions;

use serde::{Deserialize, Serialize};

use crate::data::Spatial;
use functions::{bezier_ease_t, lerp_angle, lerp_f32, quadratic, quartic, quintic};

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// Hold the left key until the next one.
    Instant,
    #[default]
    Linear,
    Quadratic,
    Cubic,
    Quartic,
    Quintic,
    /// Cubic-bezier timing with control points (c1, c2) and (c3, c4).
    Bezier,
}

impl CurveKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "instant" => CurveKind::Instant,
            "linear" => CurveKind::Linear,
            "quadratic" => CurveKind::Quadratic,
            "cubic" => CurveKind::Cubic,
            "quartic" => CurveKind::Quartic,
            "quintic" => CurveKind::Quintic,
            "bezier" => CurveKind::Bezier,
            _ => return None,
        })
    }
}

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Curve {
    #[serde(default)]
    pub kind: CurveKind,
    /// c1..c4; only the leading ones the kind needs are read.
    #[serde(default)]
    pub c: [f32; 4],
}

impl Curve {
    pub const LINEAR: Curve = Curve {
        kind: CurveKind::Linear,
        c: [0.0; 4],
    };

    pub fn new(kind: CurveKind, c: [f32; 4]) -> Self {
        Self { kind, c }
    }

    /// Map linear progress `t` in [0,1] through the curve.
    #[inline]
    pub fn apply(&self, t: f32) -> f32 {
        let [c1, c2, c3, c4] = self.c;
        match self.kind {
            CurveKind::Instant => 0.0,
            CurveKind::Linear => t,
            CurveKind::Quadratic => quadratic(0.0, c1, 1.0, t),
            CurveKind::Cubic => functions::cubic(0.0, c1, c2, 1.0, t),
            CurveKind::Quartic => quartic(0.0, c1, c2, c3, 1.0, t),
            CurveKind::Quintic => quintic(0.0, c1, c2, c3, c4, 1.0, t),
            CurveKind::Bezier => bezier_ease_t(t, c1, c2, c3, c4),
        }
    }
}

/// Componentwise spatial interpolation; the angle takes the shortest arc.
pub fn lerp_spatial(a: &Spatial, b: &Spatial, t: f32) -> Spatial {
    Spatial {
        x: lerp_f32(a.x, b.x, t),
        y: lerp_f32(a.y, b.y, t),
        angle: lerp_angle(a.angle, b.angle, t),
        scale_x: lerp_f32(a.scale_x, b.scale_x, t),
        scale_y: lerp_f32(a.scale_y, b.scale_y, t),
        alpha: lerp_f32(a.alpha, b.alpha, t),
    }
}

/// Express `child` (local to `parent`) in the parent's space: scale, rotate and
/// translate the position, multiply scale and alpha, and add the angle (mirrored
/// when the parent is flipped on exactly one axis).
pub fn apply_parent(child: &mut Spatial, parent: &Spatial) {
    let px = parent.scale_x * child.x;
    let py = parent.scale_y * child.y;
    let (s, c) = parent.angle.to_radians().sin_cos();

    child.x = px * c - py * s + parent.x;
    child.y = px * s + py * c + parent.y;
    child.scale_x *= parent.scale_x;
    child.scale_y *= parent.scale_y;
    let flip = if parent.scale_x * parent.scale_y < 0.0 {
        -1.0
    } else {
        1.0
    };
    child.angle = parent.angle + flip * child.angle;
    child.alpha *= parent.alpha;
}
