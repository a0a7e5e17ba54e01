//! Cross-fade of two evaluated snapshots.
//!
//! Sprites, points and boxes are matched by identity (timeline name plus nesting
//! parent); timeline ids are numbered per animation and never used for matching.
//! Matched pairs mix by `factor`; unmatched ones survive with alpha faded toward
//! the side they are missing from. Metadata is the union of both sides with
//! `second` applied last.

use crate::frame::{FrameData, FrameObject};
use crate::interp::functions::lerp_vec2;
use crate::interp::lerp_spatial;
use crate::pool::ObjectPool;

/// Mix `other` into `obj`. Ids switch sides at the halfway point.
fn mix(obj: &mut FrameObject, other: &FrameObject, factor: f32) {
    if factor <= 0.0 {
        return;
    }
    if factor >= 1.0 {
        obj.clone_from(other);
        return;
    }
    obj.spatial = lerp_spatial(&obj.spatial, &other.spatial, factor);
    obj.pivot = lerp_vec2(obj.pivot, other.pivot, factor);
    obj.size = lerp_vec2(obj.size, other.size, factor);
    if factor >= 0.5 {
        obj.id = other.id;
        obj.folder = other.folder;
        obj.file = other.file;
    }
}

/// Pair objects by [`FrameObject::same_identity`]; `first`'s order wins.
fn merge_objects(
    target: &mut Vec<FrameObject>,
    first: &mut Vec<FrameObject>,
    second: &mut Vec<FrameObject>,
    factor: f32,
    pool: &mut ObjectPool,
) {
    for mut obj in first.drain(..) {
        match second.iter().position(|o| o.same_identity(&obj)) {
            Some(pos) => {
                let other = second.remove(pos);
                mix(&mut obj, &other, factor);
                pool.release(other);
            }
            None => obj.spatial.alpha *= 1.0 - factor,
        }
        target.push(obj);
    }
    for mut obj in second.drain(..) {
        obj.spatial.alpha *= factor;
        target.push(obj);
    }
}

/// Drain `first` and `second` into `target` (expected empty). Surplus pooled
/// children go back to `pool`.
pub fn merge_frames(
    target: &mut FrameData,
    first: &mut FrameData,
    second: &mut FrameData,
    factor: f32,
    pool: &mut ObjectPool,
) {
    // `first`'s draw order; `second`-only sprites go on top.
    merge_objects(&mut target.sprites, &mut first.sprites, &mut second.sprites, factor, pool);
    merge_objects(&mut target.points, &mut first.points, &mut second.points, factor, pool);
    merge_objects(&mut target.boxes, &mut first.boxes, &mut second.boxes, factor, pool);

    target.animation_vars.extend(first.animation_vars.drain());
    target.animation_vars.extend(second.animation_vars.drain());

    target.object_vars.extend(first.object_vars.drain());
    for (owner, mut vars) in second.object_vars.drain() {
        match target.object_vars.get_mut(&owner) {
            Some(existing) => {
                existing.extend(vars.drain());
                pool.release(vars);
            }
            None => {
                target.object_vars.insert(owner, vars);
            }
        }
    }

    for tag in first.animation_tags.drain(..).chain(second.animation_tags.drain(..)) {
        if !target.animation_tags.contains(&tag) {
            target.animation_tags.push(tag);
        }
    }

    target.object_tags.extend(first.object_tags.drain());
    for (owner, mut tags) in second.object_tags.drain() {
        match target.object_tags.get_mut(&owner) {
            Some(existing) => {
                for tag in tags.drain(..) {
                    if !existing.contains(&tag) {
                        existing.push(tag);
                    }
                }
                pool.release(tags);
            }
            None => {
                target.object_tags.insert(owner, tags);
            }
        }
    }

    target.events.append(&mut first.events);
    target.events.append(&mut second.events);
    target.events.sort_by(|a, b| a.time.total_cmp(&b.time));
    target.sounds.append(&mut first.sounds);
    target.sounds.append(&mut second.sounds);
    target.sounds.sort_by(|a, b| a.time.total_cmp(&b.time));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::data::Name;
    use crate::value::VarValue;

    fn sprite(pool: &mut ObjectPool, name: &str, x: f32) -> FrameObject {
        let mut obj = pool.acquire::<FrameObject>();
        obj.name = Name::from(name);
        obj.spatial.x = x;
        obj
    }

    #[test]
    fn matched_sprites_mix_and_unmatched_fade() {
        let mut pool = ObjectPool::new(&Config::default());
        let (mut a, mut b, mut out) = (FrameData::new(), FrameData::new(), FrameData::new());
        let s = sprite(&mut pool, "body", 0.0);
        a.sprites.push(s);
        let s = sprite(&mut pool, "cape", 0.0);
        a.sprites.push(s);
        let s = sprite(&mut pool, "body", 100.0);
        b.sprites.push(s);
        let s = sprite(&mut pool, "sword", 0.0);
        b.sprites.push(s);

        merge_frames(&mut out, &mut a, &mut b, 0.25, &mut pool);

        assert_eq!(out.sprites.len(), 3);
        assert_eq!(out.sprite("body").unwrap().spatial.x, 25.0);
        assert_eq!(out.sprite("cape").unwrap().spatial.alpha, 0.75);
        assert_eq!(out.sprite("sword").unwrap().spatial.alpha, 0.25);
        assert!(a.is_empty() && b.is_empty());
        // the surplus "body" went back to the pool
        assert_eq!(pool.stats().outstanding, 3);
    }

    #[test]
    fn boxes_pair_by_name_not_timeline_id() {
        let mut pool = ObjectPool::new(&Config::default());
        let (mut a, mut b, mut out) = (FrameData::new(), FrameData::new(), FrameData::new());
        let mut hit = sprite(&mut pool, "hitbox", 0.0);
        hit.id = 0;
        a.boxes.push(hit);
        let mut hurt = sprite(&mut pool, "hurtbox", 500.0);
        hurt.id = 0;
        b.boxes.push(hurt);
        let mut hit = sprite(&mut pool, "hitbox", 100.0);
        hit.id = 1;
        b.boxes.push(hit);

        merge_frames(&mut out, &mut a, &mut b, 0.5, &mut pool);

        let hits: Vec<&FrameObject> = out.boxes.iter().filter(|o| &*o.name == "hitbox").collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].spatial.x, 50.0);
        assert_eq!(hits[0].spatial.alpha, 1.0);
        let hurt = out.boxes.iter().find(|o| &*o.name == "hurtbox").unwrap();
        assert_eq!(hurt.spatial.x, 500.0);
        assert_eq!(hurt.spatial.alpha, 0.5);
        assert_eq!(pool.stats().outstanding, 2);
    }

    #[test]
    fn second_side_variables_win() {
        let mut pool = ObjectPool::new(&Config::default());
        let (mut a, mut b, mut out) = (FrameData::new(), FrameData::new(), FrameData::new());
        let owner = Name::from("body");
        let hp = Name::from("hp");
        a.add_object_var(&mut pool, &owner, &hp, VarValue::Int(1));
        b.add_object_var(&mut pool, &owner, &hp, VarValue::Int(2));
        a.animation_tags.push(Name::from("air"));
        b.animation_tags.push(Name::from("air"));

        merge_frames(&mut out, &mut a, &mut b, 0.5, &mut pool);

        assert_eq!(out.object_vars[&owner][&hp], VarValue::Int(2));
        assert_eq!(out.animation_tags.len(), 1);
        assert_eq!(pool.stats().outstanding, 1);
    }
}
