//! Canonical Spriter document model.
//!
//! Built once by the reader (parser + preprocessors) and read-only afterwards;
//! any number of evaluators may share one `Document`. Times are milliseconds.

use std::sync::Arc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::interp::functions::{lerp_f32, lerp_vec2};
use crate::interp::{lerp_spatial, Curve};
use crate::sampling::Keyed;
use crate::value::VarValue;

/// Shared immutable name; cloning never allocates.
pub type Name = Arc<str>;

/// Position, rotation (degrees), scale and transparency of one object.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Spatial {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub alpha: f32,
}

impl Default for Spatial {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            alpha: 1.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    #[default]
    Image,
    Sound,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct File {
    pub id: i32,
    pub name: Name,
    #[serde(default)]
    pub kind: FileKind,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub pivot_x: f32,
    #[serde(default = "default_pivot_y")]
    pub pivot_y: f32,
}

fn default_pivot_y() -> f32 {
    1.0
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Folder {
    pub id: i32,
    #[serde(default)]
    pub name: Option<Name>,
    #[serde(default)]
    pub files: Vec<File>,
}

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    #[default]
    Sprite,
    Bone,
    Box,
    Point,
    Sound,
    Entity,
    Variable,
}

impl ObjectKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sprite" => ObjectKind::Sprite,
            "bone" => ObjectKind::Bone,
            "box" => ObjectKind::Box,
            "point" => ObjectKind::Point,
            "sound" => ObjectKind::Sound,
            "entity" => ObjectKind::Entity,
            "variable" => ObjectKind::Variable,
            _ => return None,
        })
    }
}

/// A custom variable declaration; the default's variant fixes the variable kind.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VarDef {
    pub id: i32,
    pub name: Name,
    pub default: VarValue,
}

/// Per-object declaration shared by every animation of an entity.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ObjectInfo {
    pub name: Name,
    #[serde(default)]
    pub kind: ObjectKind,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub pivot: [f32; 2],
    #[serde(default)]
    pub variables: Vec<VarDef>,
}

/// A mainline key's pointer to a timeline. `parent` is the id of a bone ref
/// of the same mainline key.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Ref {
    pub id: i32,
    #[serde(default)]
    pub parent: Option<i32>,
    pub timeline: i32,
    #[serde(default)]
    pub z_index: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MainlineKey {
    pub id: i32,
    pub time: f32,
    #[serde(default)]
    pub curve: Curve,
    #[serde(default)]
    pub bone_refs: Vec<Ref>,
    #[serde(default)]
    pub object_refs: Vec<Ref>,
}

/// Payload of a spatial timeline key. Sprites use `folder`/`file`, nested
/// instances use `entity`/`animation`/`t` (progress in [0,1] through the child).
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeyObject {
    pub spatial: Spatial,
    pub folder: Option<i32>,
    pub file: Option<i32>,
    /// Filled from the file or object info by the init preprocessor when absent.
    pub pivot: Option<[f32; 2]>,
    pub entity: Option<i32>,
    pub animation: Option<i32>,
    pub t: f32,
}

impl KeyObject {
    /// Interpolate toward `b`; ids and references come from `self`.
    pub fn lerp(&self, b: &KeyObject, t: f32) -> KeyObject {
        KeyObject {
            spatial: lerp_spatial(&self.spatial, &b.spatial, t),
            pivot: match (self.pivot, b.pivot) {
                (Some(pa), Some(pb)) => Some(lerp_vec2(pa, pb, t)),
                (pivot, _) => pivot,
            },
            t: lerp_f32(self.t, b.t, t),
            ..*self
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TimelineKey {
    pub id: i32,
    pub time: f32,
    #[serde(default)]
    pub curve: Curve,
    #[serde(default)]
    pub object: KeyObject,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VarKey {
    pub id: i32,
    pub time: f32,
    #[serde(default)]
    pub curve: Curve,
    pub value: VarValue,
}

/// Keys of one variable; `def` indexes the owner's variable definitions.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Varline {
    pub id: i32,
    pub def: i32,
    pub keys: Vec<VarKey>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TagKey {
    pub id: i32,
    pub time: f32,
    /// Ids into the document tag list.
    #[serde(default)]
    pub tags: Vec<i32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Tagline {
    pub keys: Vec<TagKey>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Meta {
    #[serde(default)]
    pub varlines: Vec<Varline>,
    #[serde(default)]
    pub tagline: Option<Tagline>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Timeline {
    pub id: i32,
    pub name: Name,
    #[serde(default)]
    pub kind: ObjectKind,
    /// Index into the entity's object infos.
    #[serde(default)]
    pub obj: Option<i32>,
    pub keys: Vec<TimelineKey>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EventKey {
    pub id: i32,
    pub time: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Eventline {
    pub id: i32,
    pub name: Name,
    pub keys: Vec<EventKey>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Sound {
    pub folder: i32,
    pub file: i32,
    #[serde(default = "default_true")]
    pub trigger: bool,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub panning: f32,
}

fn default_true() -> bool {
    true
}

fn default_volume() -> f32 {
    1.0
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SoundKey {
    pub id: i32,
    pub time: f32,
    pub sound: Sound,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Soundline {
    pub id: i32,
    pub name: Name,
    pub keys: Vec<SoundKey>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Animation {
    pub id: i32,
    pub name: Name,
    /// Length in milliseconds.
    pub length: f32,
    #[serde(default = "default_true")]
    pub looping: bool,
    pub mainline: Vec<MainlineKey>,
    #[serde(default)]
    pub timelines: Vec<Timeline>,
    #[serde(default)]
    pub eventlines: Vec<Eventline>,
    #[serde(default)]
    pub soundlines: Vec<Soundline>,
    #[serde(default)]
    pub meta: Option<Meta>,
    /// Timeline id -> position in `timelines`, built by the init preprocessor.
    #[serde(skip)]
    pub timeline_index: HashMap<i32, usize>,
}

impl Animation {
    /// Resolve a timeline by id, through the derived index when it is populated.
    pub fn timeline(&self, id: i32) -> Option<&Timeline> {
        self.timeline_index
            .get(&id)
            .and_then(|&i| self.timelines.get(i))
            .filter(|t| t.id == id)
            .or_else(|| self.timelines.iter().find(|t| t.id == id))
    }

    pub fn rebuild_timeline_index(&mut self) {
        self.timeline_index.clear();
        for (idx, timeline) in self.timelines.iter().enumerate() {
            self.timeline_index.insert(timeline.id, idx);
        }
    }

    /// Map an arbitrary time into the playable range: wrapped when looping,
    /// clamped otherwise.
    pub fn normalize_time(&self, time: f32) -> f32 {
        if self.length <= 0.0 {
            return 0.0;
        }
        if self.looping {
            time.rem_euclid(self.length)
        } else {
            time.clamp(0.0, self.length)
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub id: i32,
    pub name: Name,
    #[serde(default)]
    pub object_infos: Vec<ObjectInfo>,
    /// Animation-level variable definitions.
    #[serde(default)]
    pub variables: Vec<VarDef>,
    pub animations: Vec<Animation>,
}

impl Entity {
    pub fn animation(&self, name: &str) -> Option<&Animation> {
        self.animations.iter().find(|a| &*a.name == name)
    }

    pub fn animation_by_id(&self, id: i32) -> Option<&Animation> {
        self.animations.iter().find(|a| a.id == id)
    }

    pub fn object_info(&self, obj: Option<i32>) -> Option<&ObjectInfo> {
        obj.and_then(|i| usize::try_from(i).ok())
            .and_then(|i| self.object_infos.get(i))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TagDef {
    pub id: i32,
    pub name: Name,
}

/// Root of a parsed Spriter project.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub tags: Vec<TagDef>,
}

impl Document {
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| &*e.name == name)
    }

    pub fn entity_by_id(&self, id: i32) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn file(&self, folder: i32, file: i32) -> Option<&File> {
        self.folders
            .iter()
            .find(|f| f.id == folder)
            .and_then(|f| f.files.iter().find(|fi| fi.id == file))
    }

    pub fn tag(&self, id: i32) -> Option<&Name> {
        self.tags.iter().find(|t| t.id == id).map(|t| &t.name)
    }

    /// Borrow an animation together with its entity and this document.
    pub fn animation(&self, entity: &str, animation: &str) -> Option<AnimationView<'_>> {
        let entity = self.entity(entity)?;
        let animation = entity.animation(animation)?;
        Some(AnimationView {
            document: self,
            entity,
            animation,
        })
    }

    /// Serialize to the JSON form accepted by [`crate::parsers::JsonParser`].
    pub fn to_json(&self) -> Result<String, crate::error::SpriterError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// An animation plus the context it is evaluated in.
#[derive(Copy, Clone, Debug)]
pub struct AnimationView<'a> {
    pub document: &'a Document,
    pub entity: &'a Entity,
    pub animation: &'a Animation,
}

impl AnimationView<'_> {
    pub fn name(&self) -> &Name {
        &self.animation.name
    }

    pub fn length(&self) -> f32 {
        self.animation.length
    }

    pub fn looping(&self) -> bool {
        self.animation.looping
    }
}

impl Keyed for MainlineKey {
    fn time(&self) -> f32 {
        self.time
    }
    fn curve(&self) -> Curve {
        self.curve
    }
}

impl Keyed for TimelineKey {
    fn time(&self) -> f32 {
        self.time
    }
    fn curve(&self) -> Curve {
        self.curve
    }
}

impl Keyed for VarKey {
    fn time(&self) -> f32 {
        self.time
    }
    fn curve(&self) -> Curve {
        self.curve
    }
}

impl Keyed for TagKey {
    fn time(&self) -> f32 {
        self.time
    }
}

impl Keyed for EventKey {
    fn time(&self) -> f32 {
        self.time
    }
}

impl Keyed for SoundKey {
    fn time(&self) -> f32 {
        self.time
    }
}
