//! Error types for document ingestion and frame evaluation

use crate::data::Name;

/// Every failure surfaced by the reader, the preprocessors and the evaluator.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SpriterError {
    /// The reader was handed no text at all
    #[error("no input text was provided")]
    MissingInput,

    /// A parser accepted the input but could not decode it
    #[error("{format} parse error: {reason}")]
    Parse { format: &'static str, reason: String },

    /// A preprocessor rejected the parsed document
    #[error("invalid document: {reason}")]
    InvalidDocument { reason: String },

    /// An object or bone ref points at a timeline the animation does not own
    #[error("animation '{animation}' references missing timeline {timeline}")]
    DanglingTimeline { animation: Name, timeline: i32 },

    /// An object or bone ref names a parent bone that is not resolved before it
    #[error("animation '{animation}' references missing parent bone {bone}")]
    DanglingBone { animation: Name, bone: i32 },

    /// A mainline, timeline or meta line without keys
    #[error("'{track}' in animation '{animation}' has no keys")]
    EmptyKeys { animation: Name, track: Name },

    #[error("entity {entity} not found")]
    MissingEntity { entity: i32 },

    #[error("animation {animation} not found in entity '{entity}'")]
    MissingAnimation { entity: Name, animation: i32 },

    #[error("variable definition {def} not found for '{owner}'")]
    MissingVariable { owner: Name, def: i32 },

    #[error("tag {tag} not found in the document tag list")]
    MissingTag { tag: i32 },

    /// A nested entity instance re-enters an entity already being evaluated
    #[error("entity {entity} instances itself")]
    EntityCycle { entity: i32 },
}

impl SpriterError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingInput => "input",
            Self::Parse { .. } => "parse",
            Self::InvalidDocument { .. } => "document",
            Self::DanglingTimeline { .. }
            | Self::DanglingBone { .. }
            | Self::EmptyKeys { .. }
            | Self::MissingEntity { .. }
            | Self::MissingAnimation { .. }
            | Self::MissingVariable { .. }
            | Self::MissingTag { .. }
            | Self::EntityCycle { .. } => "evaluation",
        }
    }
}

impl From<serde_json::Error> for SpriterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            format: "json",
            reason: err.to_string(),
        }
    }
}

impl From<quick_xml::DeError> for SpriterError {
    fn from(err: quick_xml::DeError) -> Self {
        Self::Parse {
            format: "scml",
            reason: err.to_string(),
        }
    }
}
