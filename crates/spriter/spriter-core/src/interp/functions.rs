//! Interpolation helpers:
//! - lerp_f32 / lerp_angle (shortest arc, degrees)
//! - Bernstein curves through 0, c1..cn, 1 (quadratic..quintic)
//! - bezier_ease_t (cubic-bezier timing, x inverted by bisection)

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec2(a: [f32; 2], b: [f32; 2], t: f32) -> [f32; 2] {
    [lerp_f32(a[0], b[0], t), lerp_f32(a[1], b[1], t)]
}

/// Signed difference `b - a` reduced to (-180, 180].
#[inline]
pub fn shortest_arc(a: f32, b: f32) -> f32 {
    let mut d = (b - a) % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

/// Angle interpolation in degrees along the shortest arc.
#[inline]
pub fn lerp_angle(a: f32, b: f32, t: f32) -> f32 {
    a + shortest_arc(a, b) * t
}

#[inline]
pub fn quadratic(a: f32, b: f32, c: f32, t: f32) -> f32 {
    lerp_f32(lerp_f32(a, b, t), lerp_f32(b, c, t), t)
}

#[inline]
pub fn cubic(a: f32, b: f32, c: f32, d: f32, t: f32) -> f32 {
    lerp_f32(quadratic(a, b, c, t), quadratic(b, c, d, t), t)
}

#[inline]
pub fn quartic(a: f32, b: f32, c: f32, d: f32, e: f32, t: f32) -> f32 {
    lerp_f32(cubic(a, b, c, d, t), cubic(b, c, d, e, t), t)
}

#[inline]
pub fn quintic(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32, t: f32) -> f32 {
    lerp_f32(quartic(a, b, c, d, e, t), quartic(b, c, d, e, f, t), t)
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Given control points (x1, y1, x2, y2) and an input t in [0,1],
/// compute the eased y by inverting the x bezier via binary search.
#[inline]
pub fn bezier_ease_t(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    // Bezier(0,0,1,1) is exactly linear
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    // Monotonic X in [0,1] assumed for x1/x2 in [0,1]
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}
