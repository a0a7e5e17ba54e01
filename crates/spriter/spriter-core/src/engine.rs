//! Engine: frame evaluation over a read-only document.
//!
//! Per call:
//! - clear the snapshot (pooled children go back to the pool)
//! - mainline lookup -> warped time -> bones -> objects (nested instances recurse)
//! - root-animation metadata: vars, tags, events, sounds
//!
//! Blended calls evaluate both animations into working snapshots and merge them
//! (see [`crate::blend`]).

use crate::blend::merge_frames;
use crate::config::Config;
use crate::data::{AnimationView, KeyObject, Meta, Name, ObjectKind, Ref, Spatial, Timeline};
use crate::error::SpriterError;
use crate::frame::{FrameData, FrameEvent, FrameObject, SoundTrigger};
use crate::interp::apply_parent;
use crate::pool::ObjectPool;
use crate::sampling::{bounding_pair, trigger_spans, KeyPair};

/// Owns the snapshot, its pool and the scratch state of one animated instance.
#[derive(Debug)]
pub struct Engine {
    cfg: Config,
    pool: ObjectPool,
    frame: FrameData,
    working: [FrameData; 2],
    /// Entity ids on the current nesting path.
    path: Vec<i32>,
}

/// Resolved transform of the nested instance currently being expanded.
struct Outer<'n> {
    spatial: Spatial,
    name: &'n Name,
}

/// Borrowed evaluation context for one fill.
struct Pass<'e> {
    cfg: &'e Config,
    pool: &'e mut ObjectPool,
    path: &'e mut Vec<i32>,
}

impl Engine {
    pub fn new(cfg: Config) -> Self {
        Self {
            pool: ObjectPool::new(&cfg),
            cfg,
            frame: FrameData::new(),
            working: [FrameData::new(), FrameData::new()],
            path: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// The snapshot filled by the last call.
    pub fn frame(&self) -> &FrameData {
        &self.frame
    }

    pub fn pool(&self) -> &ObjectPool {
        &self.pool
    }

    /// Evaluate one animation at `time`, collecting triggers crossed since
    /// `time - delta_time`.
    pub fn evaluate(
        &mut self,
        view: AnimationView<'_>,
        time: f32,
        delta_time: f32,
    ) -> Result<&FrameData, SpriterError> {
        self.frame.clear(&mut self.pool);
        self.path.clear();
        let mut pass = Pass {
            cfg: &self.cfg,
            pool: &mut self.pool,
            path: &mut self.path,
        };
        pass.fill(view, time, delta_time, &mut self.frame, None)?;
        log::trace!(
            "evaluated '{}' at {time}: {} sprites, {} events",
            view.name(),
            self.frame.sprites.len(),
            self.frame.events.len()
        );
        Ok(&self.frame)
    }

    /// Evaluate `first` and `second` and cross-fade them by `factor`
    /// (0 = pure `first`, 1 = pure `second`). `second` is sampled at
    /// `transition_time` when given, else at `time`.
    pub fn evaluate_blended(
        &mut self,
        first: AnimationView<'_>,
        second: AnimationView<'_>,
        time: f32,
        delta_time: f32,
        transition_time: Option<f32>,
        factor: f32,
    ) -> Result<&FrameData, SpriterError> {
        self.frame.clear(&mut self.pool);
        let [a, b] = &mut self.working;
        a.clear(&mut self.pool);
        b.clear(&mut self.pool);

        self.path.clear();
        let mut pass = Pass {
            cfg: &self.cfg,
            pool: &mut self.pool,
            path: &mut self.path,
        };
        let filled = pass.fill(first, time, delta_time, a, None).and_then(|_| {
            pass.path.clear();
            pass.fill(second, transition_time.unwrap_or(time), delta_time, b, None)
        });
        if let Err(err) = filled {
            a.clear(&mut self.pool);
            b.clear(&mut self.pool);
            return Err(err);
        }

        merge_frames(&mut self.frame, a, b, factor.clamp(0.0, 1.0), &mut self.pool);
        Ok(&self.frame)
    }
}

impl Pass<'_> {
    fn fill(
        &mut self,
        view: AnimationView<'_>,
        raw_time: f32,
        delta_time: f32,
        frame: &mut FrameData,
        outer: Option<&Outer<'_>>,
    ) -> Result<(), SpriterError> {
        let entity = view.entity.id;
        if self.path.contains(&entity) {
            return Err(SpriterError::EntityCycle { entity });
        }
        self.path.push(entity);
        let result = self.fill_animation(view, raw_time, delta_time, frame, outer);
        self.path.pop();
        result
    }

    fn fill_animation(
        &mut self,
        view: AnimationView<'_>,
        raw_time: f32,
        delta_time: f32,
        frame: &mut FrameData,
        outer: Option<&Outer<'_>>,
    ) -> Result<(), SpriterError> {
        let anim = view.animation;
        let time = anim.normalize_time(raw_time);
        let main = bounding_pair(&anim.mainline, time, anim.length, anim.looping)
            .ok_or_else(|| empty_keys(view, "mainline"))?;
        let key = &anim.mainline[main.a];
        let warped = anim.normalize_time(main.warp(time));

        let mut bones = self.pool.acquire_sequence::<Spatial>(key.bone_refs.len());
        let resolved = self
            .resolve_bones(view, &key.bone_refs, warped, &mut bones)
            .and_then(|_| {
                let refs = (&key.bone_refs[..], &key.object_refs[..]);
                self.resolve_objects(view, refs, &bones, warped, time, delta_time, frame, outer)
            });
        self.pool.release_sequence(bones);
        resolved?;

        if outer.is_none() {
            self.fill_metadata(view, raw_time, time, delta_time, frame)?;
        }
        Ok(())
    }

    fn resolve_bones(
        &mut self,
        view: AnimationView<'_>,
        refs: &[Ref],
        time: f32,
        bones: &mut [Option<Spatial>],
    ) -> Result<(), SpriterError> {
        for (i, bone_ref) in refs.iter().enumerate() {
            let timeline = timeline_for(view, bone_ref)?;
            let state = sample_timeline(view, timeline, time)?;
            let mut spatial = self.pool.acquire::<Spatial>();
            spatial.clone_from(&state.spatial);
            if let Some(parent) = parent_bone(view, refs, &bones[..i], bone_ref)? {
                apply_parent(&mut spatial, parent);
            }
            bones[i] = Some(spatial);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_objects(
        &mut self,
        view: AnimationView<'_>,
        (bone_refs, object_refs): (&[Ref], &[Ref]),
        bones: &[Option<Spatial>],
        warped: f32,
        time: f32,
        delta_time: f32,
        frame: &mut FrameData,
        outer: Option<&Outer<'_>>,
    ) -> Result<(), SpriterError> {
        for object_ref in object_refs {
            let timeline = timeline_for(view, object_ref)?;
            let mut state = sample_timeline(view, timeline, warped)?;
            if let Some(parent) = parent_bone(view, bone_refs, bones, object_ref)? {
                apply_parent(&mut state.spatial, parent);
            }
            if let Some(outer) = outer {
                apply_parent(&mut state.spatial, &outer.spatial);
            }
            let parent_name = outer.map(|o| o.name);

            match timeline.kind {
                ObjectKind::Sprite => {
                    let size = match (state.folder, state.file) {
                        (Some(folder), Some(file)) => view
                            .document
                            .file(folder, file)
                            .map(|f| [f.width, f.height])
                            .unwrap_or_default(),
                        _ => [0.0, 0.0],
                    };
                    let mut obj = self.pool.acquire::<FrameObject>();
                    obj.assign(timeline, parent_name, &state, size);
                    frame.sprites.push(obj);
                }
                ObjectKind::Point => {
                    let mut obj = self.pool.acquire::<FrameObject>();
                    obj.assign(timeline, parent_name, &state, [0.0, 0.0]);
                    frame.points.push(obj);
                }
                ObjectKind::Box => {
                    let size = view
                        .entity
                        .object_info(timeline.obj)
                        .map(|info| [info.width, info.height])
                        .unwrap_or_default();
                    let mut obj = self.pool.acquire::<FrameObject>();
                    obj.assign(timeline, parent_name, &state, size);
                    frame.boxes.push(obj);
                }
                ObjectKind::Entity => {
                    self.expand_instance(view, timeline, &state, delta_time, frame)?;
                }
                ObjectKind::Bone | ObjectKind::Sound | ObjectKind::Variable => {}
            }

            if outer.is_none() {
                if let Some(meta) = &timeline.meta {
                    self.fill_object_meta(view, timeline, meta, time, frame)?;
                }
            }
        }
        Ok(())
    }

    /// Evaluate the child animation of a nested instance into the same snapshot,
    /// composed with the instance's resolved transform.
    fn expand_instance(
        &mut self,
        view: AnimationView<'_>,
        timeline: &Timeline,
        state: &KeyObject,
        delta_time: f32,
        frame: &mut FrameData,
    ) -> Result<(), SpriterError> {
        let entity_id = state.entity.unwrap_or(-1);
        let entity = view
            .document
            .entity_by_id(entity_id)
            .ok_or(SpriterError::MissingEntity { entity: entity_id })?;
        let animation_id = state.animation.unwrap_or(-1);
        let animation = entity
            .animation_by_id(animation_id)
            .ok_or_else(|| SpriterError::MissingAnimation {
                entity: entity.name.clone(),
                animation: animation_id,
            })?;
        let child = AnimationView {
            document: view.document,
            entity,
            animation,
        };
        let outer = Outer {
            spatial: state.spatial,
            name: &timeline.name,
        };
        self.fill(child, state.t * animation.length, delta_time, frame, Some(&outer))
    }

    fn fill_object_meta(
        &mut self,
        view: AnimationView<'_>,
        timeline: &Timeline,
        meta: &Meta,
        time: f32,
        frame: &mut FrameData,
    ) -> Result<(), SpriterError> {
        let anim = view.animation;
        if self.cfg.vars() {
            let defs = view
                .entity
                .object_info(timeline.obj)
                .map(|info| info.variables.as_slice())
                .unwrap_or_default();
            for varline in &meta.varlines {
                let def = defs.iter().find(|d| d.id == varline.def).ok_or_else(|| {
                    SpriterError::MissingVariable {
                        owner: timeline.name.clone(),
                        def: varline.def,
                    }
                })?;
                let pair = bounding_pair(&varline.keys, time, anim.length, anim.looping)
                    .ok_or_else(|| empty_keys(view, &def.name))?;
                let value = varline.keys[pair.a]
                    .value
                    .lerp(&varline.keys[pair.b].value, pair.factor);
                frame.add_object_var(self.pool, &timeline.name, &def.name, value);
            }
        }
        if self.cfg.tags() {
            if let Some(tagline) = &meta.tagline {
                if let Some(pair) = bounding_pair(&tagline.keys, time, anim.length, anim.looping) {
                    for tag in &tagline.keys[pair.a].tags {
                        let name = view
                            .document
                            .tag(*tag)
                            .ok_or(SpriterError::MissingTag { tag: *tag })?;
                        frame.add_object_tag(self.pool, &timeline.name, name);
                    }
                }
            }
        }
        Ok(())
    }

    fn fill_metadata(
        &mut self,
        view: AnimationView<'_>,
        raw_time: f32,
        time: f32,
        delta_time: f32,
        frame: &mut FrameData,
    ) -> Result<(), SpriterError> {
        let anim = view.animation;
        if let Some(meta) = &anim.meta {
            if self.cfg.vars() {
                for varline in &meta.varlines {
                    let def = view
                        .entity
                        .variables
                        .iter()
                        .find(|d| d.id == varline.def)
                        .ok_or_else(|| SpriterError::MissingVariable {
                            owner: anim.name.clone(),
                            def: varline.def,
                        })?;
                    let pair = bounding_pair(&varline.keys, time, anim.length, anim.looping)
                        .ok_or_else(|| empty_keys(view, &def.name))?;
                    let value = varline.keys[pair.a]
                        .value
                        .lerp(&varline.keys[pair.b].value, pair.factor);
                    frame.animation_vars.insert(def.name.clone(), value);
                }
            }
            if self.cfg.tags() {
                if let Some(tagline) = &meta.tagline {
                    if let Some(pair) = bounding_pair(&tagline.keys, time, anim.length, anim.looping) {
                        for tag in &tagline.keys[pair.a].tags {
                            let name = view
                                .document
                                .tag(*tag)
                                .ok_or(SpriterError::MissingTag { tag: *tag })?;
                            frame.animation_tags.push(name.clone());
                        }
                    }
                }
            }
        }

        if !self.cfg.events() && !self.cfg.sounds() {
            return Ok(());
        }
        for span in trigger_spans(raw_time, delta_time, anim.length, anim.looping)
            .into_iter()
            .flatten()
        {
            if self.cfg.events() {
                let start = frame.events.len();
                for line in &anim.eventlines {
                    for key in line.keys.iter().filter(|k| span.contains(k.time)) {
                        frame.events.push(FrameEvent {
                            name: line.name.clone(),
                            time: key.time,
                        });
                    }
                }
                frame.events[start..].sort_unstable_by(|a, b| a.time.total_cmp(&b.time));
            }
            if self.cfg.sounds() {
                let start = frame.sounds.len();
                for line in &anim.soundlines {
                    for key in line
                        .keys
                        .iter()
                        .filter(|k| k.sound.trigger && span.contains(k.time))
                    {
                        frame.sounds.push(SoundTrigger {
                            name: line.name.clone(),
                            folder: key.sound.folder,
                            file: key.sound.file,
                            volume: key.sound.volume,
                            panning: key.sound.panning,
                            time: key.time,
                        });
                    }
                }
                frame.sounds[start..].sort_unstable_by(|a, b| a.time.total_cmp(&b.time));
            }
        }
        Ok(())
    }
}

fn empty_keys(view: AnimationView<'_>, track: &str) -> SpriterError {
    SpriterError::EmptyKeys {
        animation: view.animation.name.clone(),
        track: Name::from(track),
    }
}

fn timeline_for<'a>(view: AnimationView<'a>, r: &Ref) -> Result<&'a Timeline, SpriterError> {
    view.animation
        .timeline(r.timeline)
        .ok_or_else(|| SpriterError::DanglingTimeline {
            animation: view.animation.name.clone(),
            timeline: r.timeline,
        })
}

/// Interpolated key payload of `timeline` at `time`.
fn sample_timeline(
    view: AnimationView<'_>,
    timeline: &Timeline,
    time: f32,
) -> Result<KeyObject, SpriterError> {
    let anim = view.animation;
    let KeyPair { a, b, factor, .. } =
        bounding_pair(&timeline.keys, time, anim.length, anim.looping)
            .ok_or_else(|| empty_keys(view, &timeline.name))?;
    Ok(timeline.keys[a].object.lerp(&timeline.keys[b].object, factor))
}

/// The resolved bone a ref is parented to. `bones[i]` belongs to `bone_refs[i]`;
/// only bones resolved so far are visible.
fn parent_bone<'b>(
    view: AnimationView<'_>,
    bone_refs: &[Ref],
    bones: &'b [Option<Spatial>],
    r: &Ref,
) -> Result<Option<&'b Spatial>, SpriterError> {
    let Some(parent) = r.parent else {
        return Ok(None);
    };
    bone_refs
        .iter()
        .position(|b| b.id == parent)
        .and_then(|i| bones.get(i))
        .and_then(Option::as_ref)
        .map(Some)
        .ok_or_else(|| SpriterError::DanglingBone {
            animation: view.animation.name.clone(),
            bone: parent,
        })
}
