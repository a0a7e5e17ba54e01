//! Custom variable values carried by varlines and reported in frame snapshots.

use serde::{Deserialize, Serialize};

use crate::data::Name;
use crate::interp::functions::lerp_f32;

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VarKind {
    Int,
    Float,
    String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum VarValue {
    Int(i32),
    Float(f32),
    /// Step-only; never interpolated.
    String(Name),
}

impl VarValue {
    pub fn kind(&self) -> VarKind {
        match self {
            VarValue::Int(_) => VarKind::Int,
            VarValue::Float(_) => VarKind::Float,
            VarValue::String(_) => VarKind::String,
        }
    }

    /// Zero value of a kind, used when a definition carries no default.
    pub fn zero(kind: VarKind) -> Self {
        match kind {
            VarKind::Int => VarValue::Int(0),
            VarKind::Float => VarValue::Float(0.0),
            VarKind::String => VarValue::String(Name::from("")),
        }
    }

    /// Parse `text` as a value of `kind`. Returns `None` for malformed numbers.
    pub fn parse(kind: VarKind, text: &str) -> Option<Self> {
        let text = text.trim();
        match kind {
            VarKind::Int => text
                .parse::<i32>()
                .ok()
                .or_else(|| text.parse::<f32>().ok().map(|f| f as i32))
                .map(VarValue::Int),
            VarKind::Float => text.parse::<f32>().ok().map(VarValue::Float),
            VarKind::String => Some(VarValue::String(Name::from(text))),
        }
    }

    /// Numeric kinds interpolate (Int truncates toward zero); strings and
    /// mismatched kinds hold the left value.
    pub fn lerp(&self, other: &VarValue, t: f32) -> VarValue {
        match (self, other) {
            (VarValue::Int(a), VarValue::Int(b)) => {
                VarValue::Int(lerp_f32(*a as f32, *b as f32, t) as i32)
            }
            (VarValue::Float(a), VarValue::Float(b)) => VarValue::Float(lerp_f32(*a, *b, t)),
            _ => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_kind() {
        assert_eq!(VarValue::parse(VarKind::Int, "12"), Some(VarValue::Int(12)));
        assert_eq!(VarValue::parse(VarKind::Int, "12.9"), Some(VarValue::Int(12)));
        assert_eq!(VarValue::parse(VarKind::Float, " 0.5 "), Some(VarValue::Float(0.5)));
        assert_eq!(
            VarValue::parse(VarKind::String, "idle"),
            Some(VarValue::String(Name::from("idle")))
        );
        assert_eq!(VarValue::parse(VarKind::Float, "fast"), None);
    }

    #[test]
    fn strings_step_and_ints_truncate() {
        let a = VarValue::String(Name::from("a"));
        let b = VarValue::String(Name::from("b"));
        assert_eq!(a.lerp(&b, 0.9), a);
        assert_eq!(VarValue::Int(0).lerp(&VarValue::Int(10), 0.55), VarValue::Int(5));
    }
}
