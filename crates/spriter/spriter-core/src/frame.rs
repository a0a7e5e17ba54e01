//! Per-frame output snapshot.
//!
//! A `FrameData` is filled by the engine once per tick and read by the host until
//! the next call. Pooled children (objects, per-owner maps and lists) are handed
//! back to the [`ObjectPool`] by [`FrameData::clear`], which the engine runs before
//! every fill, so no collection grows across ticks.

use hashbrown::HashMap;
use once_cell::sync::Lazy;

use crate::data::{KeyObject, Name, Spatial, Timeline};
use crate::pool::{ObjectPool, Poolable};
use crate::value::VarValue;

/// Variable values of one owner, keyed by variable name.
pub type VarMap = HashMap<Name, VarValue>;
/// Tags active on one owner.
pub type TagList = Vec<Name>;

static EMPTY_NAME: Lazy<Name> = Lazy::new(|| Name::from(""));

/// A resolved sprite, point or collision box.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameObject {
    /// Timeline name; stable across animations of the same entity.
    pub name: Name,
    /// Timeline id within the animation that produced this object.
    pub id: i32,
    /// Name of the nested-instance timeline that produced this object, if any.
    pub parent: Option<Name>,
    pub spatial: Spatial,
    pub folder: i32,
    pub file: i32,
    pub pivot: [f32; 2],
    /// File size for sprites, declared size for boxes, zero for points.
    pub size: [f32; 2],
}

impl Default for FrameObject {
    fn default() -> Self {
        Self {
            name: EMPTY_NAME.clone(),
            id: -1,
            parent: None,
            spatial: Spatial::default(),
            folder: -1,
            file: -1,
            pivot: [0.0, 1.0],
            size: [0.0, 0.0],
        }
    }
}

impl Poolable for FrameObject {
    fn reset(&mut self) {
        self.name = EMPTY_NAME.clone();
        self.id = -1;
        self.parent = None;
        self.spatial = Spatial::default();
        self.folder = -1;
        self.file = -1;
        self.pivot = [0.0, 1.0];
        self.size = [0.0, 0.0];
    }
}

impl FrameObject {
    pub(crate) fn assign(
        &mut self,
        timeline: &Timeline,
        parent: Option<&Name>,
        state: &KeyObject,
        size: [f32; 2],
    ) {
        self.name = timeline.name.clone();
        self.id = timeline.id;
        self.parent = parent.cloned();
        self.spatial = state.spatial;
        self.folder = state.folder.unwrap_or(-1);
        self.file = state.file.unwrap_or(-1);
        self.pivot = state.pivot.unwrap_or([0.0, 1.0]);
        self.size = size;
    }

    /// Same object slot in another evaluation (matched by name and nesting parent).
    #[inline]
    pub fn same_identity(&self, other: &FrameObject) -> bool {
        self.name == other.name && self.parent == other.parent
    }
}

/// An event key crossed during the step.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameEvent {
    pub name: Name,
    pub time: f32,
}

/// A sound key crossed during the step. `folder`/`file` identify the asset the
/// host should play.
#[derive(Clone, Debug, PartialEq)]
pub struct SoundTrigger {
    pub name: Name,
    pub folder: i32,
    pub file: i32,
    pub volume: f32,
    pub panning: f32,
    pub time: f32,
}

#[derive(Debug, Default)]
pub struct FrameData {
    /// Sprites in draw order.
    pub sprites: Vec<FrameObject>,
    /// Points in evaluation order; look up by name with [`FrameData::point`].
    pub points: Vec<FrameObject>,
    /// Collision boxes in evaluation order; look up by timeline id with
    /// [`FrameData::collision_box`].
    pub boxes: Vec<FrameObject>,
    pub animation_vars: VarMap,
    pub object_vars: HashMap<Name, VarMap>,
    pub animation_tags: TagList,
    pub object_tags: HashMap<Name, TagList>,
    pub events: Vec<FrameEvent>,
    pub sounds: Vec<SoundTrigger>,
}

impl FrameData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return every pooled child to `pool` and empty all collections.
    pub fn clear(&mut self, pool: &mut ObjectPool) {
        for obj in self.sprites.drain(..) {
            pool.release(obj);
        }
        for obj in self.points.drain(..).chain(self.boxes.drain(..)) {
            pool.release(obj);
        }
        for (_, vars) in self.object_vars.drain() {
            pool.release(vars);
        }
        for (_, tags) in self.object_tags.drain() {
            pool.release(tags);
        }
        self.animation_vars.clear();
        self.animation_tags.clear();
        self.events.clear();
        self.sounds.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
            && self.points.is_empty()
            && self.boxes.is_empty()
            && self.animation_vars.is_empty()
            && self.object_vars.is_empty()
            && self.animation_tags.is_empty()
            && self.object_tags.is_empty()
            && self.events.is_empty()
            && self.sounds.is_empty()
    }

    pub fn sprite(&self, name: &str) -> Option<&FrameObject> {
        self.sprites.iter().find(|s| &*s.name == name)
    }

    /// Point named `name` of the evaluated animation itself.
    pub fn point(&self, name: &str) -> Option<&FrameObject> {
        self.point_in(None, name)
    }

    /// Point named `name` produced by the nested instance `instance`
    /// (`None` for the evaluated animation itself).
    pub fn point_in(&self, instance: Option<&str>, name: &str) -> Option<&FrameObject> {
        self.points
            .iter()
            .find(|p| &*p.name == name && p.parent.as_deref() == instance)
    }

    /// Collision box on timeline `id` of the evaluated animation itself.
    pub fn collision_box(&self, id: i32) -> Option<&FrameObject> {
        self.collision_box_in(None, id)
    }

    pub fn collision_box_in(&self, instance: Option<&str>, id: i32) -> Option<&FrameObject> {
        self.boxes
            .iter()
            .find(|b| b.id == id && b.parent.as_deref() == instance)
    }

    pub fn add_object_var(&mut self, pool: &mut ObjectPool, owner: &Name, var: &Name, value: VarValue) {
        if !self.object_vars.contains_key(owner) {
            let map = pool.acquire::<VarMap>();
            self.object_vars.insert(owner.clone(), map);
        }
        if let Some(values) = self.object_vars.get_mut(owner) {
            values.insert(var.clone(), value);
        }
    }

    pub fn add_object_tag(&mut self, pool: &mut ObjectPool, owner: &Name, tag: &Name) {
        if !self.object_tags.contains_key(owner) {
            let list = pool.acquire::<TagList>();
            self.object_tags.insert(owner.clone(), list);
        }
        if let Some(tags) = self.object_tags.get_mut(owner) {
            tags.push(tag.clone());
        }
    }
}
