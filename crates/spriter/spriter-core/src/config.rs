//! Evaluation toggles for spriter-core.

use serde::{Deserialize, Serialize};

use crate::error::SpriterError;

/// Feature toggles consulted by the evaluator and the pool.
///
/// `metadata_enabled` is the master switch for variables, tags, events and sounds;
/// the per-kind flags only matter while it is on. A disabled toggle skips the
/// corresponding computation entirely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub metadata_enabled: bool,
    pub vars_enabled: bool,
    pub tags_enabled: bool,
    pub events_enabled: bool,
    pub sounds_enabled: bool,
    /// When off, every acquire constructs a fresh value and release recycles nothing.
    pub pooling_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metadata_enabled: true,
            vars_enabled: true,
            tags_enabled: true,
            events_enabled: true,
            sounds_enabled: true,
            pooling_enabled: true,
        }
    }
}

impl Config {
    /// Parse a (possibly partial) JSON configuration; missing fields keep their defaults.
    pub fn from_json(s: &str) -> Result<Self, SpriterError> {
        Ok(serde_json::from_str(s)?)
    }

    #[inline]
    pub fn vars(&self) -> bool {
        self.metadata_enabled && self.vars_enabled
    }

    #[inline]
    pub fn tags(&self) -> bool {
        self.metadata_enabled && self.tags_enabled
    }

    #[inline]
    pub fn events(&self) -> bool {
        self.metadata_enabled && self.events_enabled
    }

    #[inline]
    pub fn sounds(&self) -> bool {
        self.metadata_enabled && self.sounds_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = Config::from_json(r#"{ "sounds_enabled": false }"#).unwrap();
        assert!(cfg.events());
        assert!(!cfg.sounds());
        assert!(cfg.pooling_enabled);
    }

    #[test]
    fn metadata_switch_masks_every_kind() {
        let cfg = Config {
            metadata_enabled: false,
            ..Config::default()
        };
        assert!(!cfg.vars() && !cfg.tags() && !cfg.events() && !cfg.sounds());
    }
}
