//! Key lookup shared by mainlines, timelines and meta lines.
//!
//! Model:
//! - Keys are ordered by strictly increasing `time` (milliseconds).
//! - A looping track interpolates its last key toward the first key shifted by one
//!   animation length; a time before the first key wraps back to the last one.
//! - A non-looping track holds its first/last key outside the keyed range.
//! - The left key's curve maps linear progress to the mixing factor.

use crate::interp::Curve;

/// A timestamped key with an optional interpolation curve.
pub trait Keyed {
    fn time(&self) -> f32;
    fn curve(&self) -> Curve {
        Curve::LINEAR
    }
}

/// Bounding key pair for one lookup. `start`/`end` are the pair's times on the
/// same unwrapped axis as the query, so `end` may exceed the animation length.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KeyPair {
    pub a: usize,
    pub b: usize,
    pub start: f32,
    pub end: f32,
    /// Curve-mapped factor in [0,1].
    pub factor: f32,
}

impl KeyPair {
    /// `time` moved along the segment by the curve. A held key (no segment)
    /// leaves `time` as it is.
    #[inline]
    pub fn warp(&self, time: f32) -> f32 {
        if self.end > self.start {
            self.start + (self.end - self.start) * self.factor
        } else {
            time
        }
    }
}

/// Locate the keys surrounding `time` and the curve-mapped factor between them.
/// Returns `None` only for an empty key slice.
pub fn bounding_pair<K: Keyed>(keys: &[K], time: f32, length: f32, looping: bool) -> Option<KeyPair> {
    let n = keys.len();
    if n == 0 {
        return None;
    }
    let last = n - 1;
    let held = |i: usize| KeyPair {
        a: i,
        b: i,
        start: keys[i].time(),
        end: keys[i].time(),
        factor: 0.0,
    };

    // Last key at or before `time`.
    let found = keys.iter().rposition(|k| k.time() <= time);

    let (a, b, start, end) = match found {
        None if looping => (last, 0, keys[last].time() - length, keys[0].time()),
        None => return Some(held(0)),
        Some(i) if i == last && looping => (last, 0, keys[last].time(), keys[0].time() + length),
        Some(i) if i == last => return Some(held(last)),
        Some(i) => (i, i + 1, keys[i].time(), keys[i + 1].time()),
    };

    let span = end - start;
    let linear = if span > 0.0 {
        ((time - start) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Some(KeyPair {
        a,
        b,
        start,
        end,
        factor: keys[a].curve().apply(linear),
    })
}

/// Half-open time span `(after, until]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Span {
    pub after: f32,
    pub until: f32,
}

impl Span {
    #[inline]
    pub fn contains(&self, t: f32) -> bool {
        t > self.after && t <= self.until
    }
}

/// Spans of animation time crossed by a step ending at `raw_time` after advancing
/// `delta_time`. A looping step that straddles the end yields two spans in playback
/// order (tail of the previous pass, then the head of the current one).
///
/// Non-looping spans use the unclamped time, so a playhead parked past the end never
/// re-crosses the final keys. Non-positive deltas cross nothing.
pub fn trigger_spans(raw_time: f32, delta_time: f32, length: f32, looping: bool) -> [Option<Span>; 2] {
    if delta_time <= 0.0 || length <= 0.0 {
        return [None, None];
    }
    if !looping {
        return [
            Some(Span {
                after: raw_time - delta_time,
                until: raw_time,
            }),
            None,
        ];
    }
    let dt = delta_time.min(length);
    let now = raw_time.rem_euclid(length);
    let prev = now - dt;
    if prev >= 0.0 {
        [Some(Span { after: prev, until: now }), None]
    } else {
        [
            Some(Span {
                after: prev + length,
                until: length,
            }),
            Some(Span {
                after: f32::NEG_INFINITY,
                until: now,
            }),
        ]
    }
}
