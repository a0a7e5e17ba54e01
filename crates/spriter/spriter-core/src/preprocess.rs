//! Built-in preprocessors run by the default reader after parsing.

use crate::data::{Animation, Document, Folder, ObjectKind};
use crate::error::SpriterError;
use crate::reader::Preprocessor;
use crate::sampling::Keyed;

/// Fills implicit defaults and derived indices:
/// - sprite keys without a pivot take their file's pivot
/// - box and point keys without a pivot take their object info's pivot
/// - object refs are stably sorted by `z_index` (draw order)
/// - every animation gets its timeline id index
#[derive(Copy, Clone, Debug, Default)]
pub struct InitPreprocessor;

fn file_pivot(folders: &[Folder], folder: i32, file: i32) -> Option<[f32; 2]> {
    folders
        .iter()
        .find(|f| f.id == folder)
        .and_then(|f| f.files.iter().find(|fi| fi.id == file))
        .map(|f| [f.pivot_x, f.pivot_y])
}

impl Preprocessor for InitPreprocessor {
    fn name(&self) -> &'static str {
        "init"
    }

    fn preprocess(&self, doc: &mut Document) -> Result<(), SpriterError> {
        let folders = &doc.folders;
        for entity in &mut doc.entities {
            let infos = &entity.object_infos;
            for anim in &mut entity.animations {
                for key in &mut anim.mainline {
                    key.object_refs.sort_by_key(|r| r.z_index);
                }
                for timeline in &mut anim.timelines {
                    let info_pivot = timeline
                        .obj
                        .and_then(|i| usize::try_from(i).ok())
                        .and_then(|i| infos.get(i))
                        .map(|info| info.pivot);
                    for key in &mut timeline.keys {
                        let obj = &mut key.object;
                        if obj.pivot.is_some() {
                            continue;
                        }
                        obj.pivot = match timeline.kind {
                            ObjectKind::Sprite => match (obj.folder, obj.file) {
                                (Some(folder), Some(file)) => file_pivot(folders, folder, file),
                                _ => None,
                            },
                            ObjectKind::Box | ObjectKind::Point => info_pivot,
                            _ => None,
                        };
                    }
                }
                anim.rebuild_timeline_index();
            }
        }
        Ok(())
    }
}

/// Rejects documents the evaluator cannot walk safely.
#[derive(Copy, Clone, Debug, Default)]
pub struct ValidationPreprocessor;

fn invalid(reason: String) -> SpriterError {
    SpriterError::InvalidDocument { reason }
}

fn strictly_increasing<K: Keyed>(keys: &[K]) -> bool {
    keys.windows(2).all(|w| w[0].time() < w[1].time())
}

fn check_keys<K: Keyed>(anim: &Animation, track: &str, keys: &[K], required: bool) -> Result<(), SpriterError> {
    if required && keys.is_empty() {
        return Err(invalid(format!("'{track}' in animation '{}' has no keys", anim.name)));
    }
    if !strictly_increasing(keys) {
        return Err(invalid(format!(
            "'{track}' in animation '{}' has keys out of order",
            anim.name
        )));
    }
    Ok(())
}

impl Preprocessor for ValidationPreprocessor {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn preprocess(&self, doc: &mut Document) -> Result<(), SpriterError> {
        for entity in &doc.entities {
            for anim in &entity.animations {
                if !anim.length.is_finite() || anim.length < 0.0 {
                    return Err(invalid(format!("animation '{}' has invalid length", anim.name)));
                }
                check_keys(anim, "mainline", &anim.mainline, true)?;

                for key in &anim.mainline {
                    for r in key.bone_refs.iter().chain(&key.object_refs) {
                        if anim.timeline(r.timeline).is_none() {
                            return Err(invalid(format!(
                                "animation '{}' references missing timeline {}",
                                anim.name, r.timeline
                            )));
                        }
                        if let Some(parent) = r.parent {
                            if !key.bone_refs.iter().any(|b| b.id == parent) {
                                return Err(invalid(format!(
                                    "animation '{}' references missing bone {parent}",
                                    anim.name
                                )));
                            }
                        }
                    }
                }

                for timeline in &anim.timelines {
                    check_keys(anim, &timeline.name, &timeline.keys, true)?;
                    for key in &timeline.keys {
                        let obj = &key.object;
                        match timeline.kind {
                            ObjectKind::Sprite => {
                                if let (Some(folder), Some(file)) = (obj.folder, obj.file) {
                                    if doc.file(folder, file).is_none() {
                                        return Err(invalid(format!(
                                            "timeline '{}' uses missing file {folder}/{file}",
                                            timeline.name
                                        )));
                                    }
                                }
                            }
                            ObjectKind::Entity => {
                                let child = obj.entity.and_then(|id| doc.entity_by_id(id));
                                let found = child
                                    .zip(obj.animation)
                                    .and_then(|(e, a)| e.animation_by_id(a))
                                    .is_some();
                                if !found {
                                    return Err(invalid(format!(
                                        "timeline '{}' instances a missing entity animation",
                                        timeline.name
                                    )));
                                }
                            }
                            _ => {}
                        }
                    }
                    if let Some(meta) = &timeline.meta {
                        for line in &meta.varlines {
                            check_keys(anim, &timeline.name, &line.keys, false)?;
                        }
                        if let Some(tags) = &meta.tagline {
                            check_keys(anim, &timeline.name, &tags.keys, false)?;
                        }
                    }
                }

                for line in &anim.eventlines {
                    check_keys(anim, &line.name, &line.keys, false)?;
                }
                for line in &anim.soundlines {
                    check_keys(anim, &line.name, &line.keys, false)?;
                    for key in &line.keys {
                        if doc.file(key.sound.folder, key.sound.file).is_none() {
                            return Err(invalid(format!(
                                "soundline '{}' uses missing file {}/{}",
                                line.name, key.sound.folder, key.sound.file
                            )));
                        }
                    }
                }
                if let Some(meta) = &anim.meta {
                    for line in &meta.varlines {
                        check_keys(anim, "meta", &line.keys, false)?;
                    }
                }
            }
        }
        Ok(())
    }
}
