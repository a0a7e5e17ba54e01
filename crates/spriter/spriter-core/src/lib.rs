//! Spriter core (engine-agnostic)
//!
//! Loads Spriter documents through a pluggable reader (parsers + preprocessors) and
//! evaluates animations into a reusable, pooled [`FrameData`] snapshot once per tick:
//! sprites, points, collision boxes, variables, tags, events and sounds. Rendering and
//! asset resolution belong to the host.

pub mod blend;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod frame;
pub mod interp;
pub mod parsers;
pub mod pool;
pub mod preprocess;
pub mod provider;
pub mod reader;
pub mod sampling;
pub mod value;

// Re-exports for hosts
pub use config::Config;
pub use data::{AnimationView, Document, Name, Spatial};
pub use engine::Engine;
pub use error::SpriterError;
pub use frame::{FrameData, FrameEvent, FrameObject, SoundTrigger, TagList, VarMap};
pub use interp::{Curve, CurveKind};
pub use parsers::{JsonParser, ScmlParser};
pub use pool::{ObjectPool, PoolStats, Poolable, Pooled};
pub use preprocess::{InitPreprocessor, ValidationPreprocessor};
pub use provider::FrameDataProvider;
pub use reader::{read_document, DocumentParser, Preprocessor, SpriterReader};
pub use value::{VarKind, VarValue};
