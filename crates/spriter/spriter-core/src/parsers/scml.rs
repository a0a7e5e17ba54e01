//! SCML (Spriter XML) parser.
//!
//! The text is deserialized with quick-xml into raw attribute structs that mirror
//! the file layout, then converted into the document model. Conversion resolves
//! what the raw form leaves implicit: curve names, object kinds, variable value
//! types (from their definitions) and sprite scale/alpha defaults.

use serde::Deserialize;

use crate::data::{
    Animation, Document, Entity, EventKey, Eventline, File, FileKind, Folder, KeyObject,
    MainlineKey, Meta, Name, ObjectInfo, ObjectKind, Ref, Sound, SoundKey, Soundline, Spatial,
    TagDef, TagKey, Tagline, Timeline, TimelineKey, VarDef, VarKey, Varline,
};
use crate::error::SpriterError;
use crate::interp::{Curve, CurveKind};
use crate::reader::DocumentParser;
use crate::value::{VarKind, VarValue};

#[derive(Copy, Clone, Debug, Default)]
pub struct ScmlParser;

impl DocumentParser for ScmlParser {
    fn name(&self) -> &'static str {
        "scml"
    }

    fn can_parse(&self, text: &str) -> bool {
        text.starts_with('<') && text.contains("<spriter_data")
    }

    fn parse(&self, text: &str) -> Result<Document, SpriterError> {
        let raw: RawSpriterData = quick_xml::de::from_str(text)?;
        raw.into_document()
    }
}

fn invalid(reason: String) -> SpriterError {
    SpriterError::Parse {
        format: "scml",
        reason,
    }
}

// ---------- raw layout ----------

#[derive(Debug, Deserialize)]
struct RawSpriterData {
    #[serde(default, rename = "folder")]
    folders: Vec<RawFolder>,
    #[serde(default, rename = "entity")]
    entities: Vec<RawEntity>,
    #[serde(default)]
    tag_list: Option<RawList>,
}

/// `<var_defs>` / `<tag_list>`: a list of `<i>` items.
#[derive(Debug, Default, Deserialize)]
struct RawList {
    #[serde(default, rename = "i")]
    items: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(rename = "@id")]
    id: i32,
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "@type")]
    kind: Option<String>,
    #[serde(default, rename = "@default")]
    default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFolder {
    #[serde(rename = "@id")]
    id: i32,
    #[serde(default, rename = "@name")]
    name: Option<String>,
    #[serde(default, rename = "file")]
    files: Vec<RawFile>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    #[serde(rename = "@id")]
    id: i32,
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "@type")]
    kind: Option<String>,
    #[serde(default, rename = "@width")]
    width: f32,
    #[serde(default, rename = "@height")]
    height: f32,
    #[serde(default, rename = "@pivot_x")]
    pivot_x: Option<f32>,
    #[serde(default, rename = "@pivot_y")]
    pivot_y: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    #[serde(rename = "@id")]
    id: i32,
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "obj_info")]
    object_infos: Vec<RawObjInfo>,
    #[serde(default)]
    var_defs: Option<RawList>,
    #[serde(default, rename = "animation")]
    animations: Vec<RawAnimation>,
}

#[derive(Debug, Deserialize)]
struct RawObjInfo {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "@type")]
    kind: Option<String>,
    #[serde(default, rename = "@w")]
    w: f32,
    #[serde(default, rename = "@h")]
    h: f32,
    #[serde(default, rename = "@pivot_x")]
    pivot_x: Option<f32>,
    #[serde(default, rename = "@pivot_y")]
    pivot_y: Option<f32>,
    #[serde(default)]
    var_defs: Option<RawList>,
}

#[derive(Debug, Deserialize)]
struct RawAnimation {
    #[serde(rename = "@id")]
    id: i32,
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@length")]
    length: f32,
    #[serde(default, rename = "@looping")]
    looping: Option<bool>,
    #[serde(default)]
    mainline: RawMainline,
    #[serde(default, rename = "timeline")]
    timelines: Vec<RawTimeline>,
    #[serde(default, rename = "eventline")]
    eventlines: Vec<RawEventline>,
    #[serde(default, rename = "soundline")]
    soundlines: Vec<RawSoundline>,
    #[serde(default)]
    meta: Option<RawMeta>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMainline {
    #[serde(default, rename = "key")]
    keys: Vec<RawMainlineKey>,
}

/// Id and time shared by every keyed element; `curved` keys also carry curve
/// attributes.
macro_rules! raw_key {
    ($(#[$m:meta])* struct $name:ident { $($body:tt)* }) => {
        $(#[$m])*
        #[derive(Debug, Deserialize)]
        struct $name {
            #[serde(default, rename = "@id")]
            id: i32,
            #[serde(default, rename = "@time")]
            time: f32,
            $($body)*
        }
    };
    (curved $(#[$m:meta])* struct $name:ident { $($body:tt)* }) => {
        raw_key! {
            $(#[$m])*
            struct $name {
                #[serde(default, rename = "@curve_type")]
                curve_type: Option<String>,
                #[serde(default, rename = "@c1")]
                c1: f32,
                #[serde(default, rename = "@c2")]
                c2: f32,
                #[serde(default, rename = "@c3")]
                c3: f32,
                #[serde(default, rename = "@c4")]
                c4: f32,
                $($body)*
            }
        }

        impl $name {
            fn curve(&self) -> Result<Curve, SpriterError> {
                let kind = match self.curve_type.as_deref() {
                    None => CurveKind::Linear,
                    Some(name) => CurveKind::from_name(name)
                        .ok_or_else(|| invalid(format!("unknown curve type '{name}'")))?,
                };
                Ok(Curve::new(kind, [self.c1, self.c2, self.c3, self.c4]))
            }
        }
    };
}

raw_key! {
    curved struct RawMainlineKey {
        #[serde(default, rename = "bone_ref")]
        bone_refs: Vec<RawRef>,
        #[serde(default, rename = "object_ref")]
        object_refs: Vec<RawRef>,
    }
}

raw_key! {
    curved struct RawTimelineKey {
        #[serde(default)]
        object: Option<RawObject>,
        #[serde(default)]
        bone: Option<RawObject>,
    }
}

raw_key! {
    curved struct RawVarKey {
        #[serde(default, rename = "@val")]
        val: String,
    }
}

raw_key! {
    struct RawTagKey {
        #[serde(default, rename = "tag")]
        tags: Vec<RawTagRef>,
    }
}

raw_key! {
    struct RawEventKey {}
}

raw_key! {
    struct RawSoundKey {
        object: RawSoundObject,
    }
}

#[derive(Debug, Deserialize)]
struct RawRef {
    #[serde(rename = "@id")]
    id: i32,
    #[serde(default, rename = "@parent")]
    parent: Option<i32>,
    #[serde(rename = "@timeline")]
    timeline: i32,
    #[serde(default, rename = "@z_index")]
    z_index: i32,
}

#[derive(Debug, Deserialize)]
struct RawTimeline {
    #[serde(rename = "@id")]
    id: i32,
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "@obj")]
    obj: Option<i32>,
    #[serde(default, rename = "@object_type")]
    object_type: Option<String>,
    #[serde(default, rename = "key")]
    keys: Vec<RawTimelineKey>,
    #[serde(default)]
    meta: Option<RawMeta>,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    #[serde(default, rename = "@x")]
    x: f32,
    #[serde(default, rename = "@y")]
    y: f32,
    #[serde(default, rename = "@angle")]
    angle: f32,
    #[serde(default, rename = "@scale_x")]
    scale_x: Option<f32>,
    #[serde(default, rename = "@scale_y")]
    scale_y: Option<f32>,
    #[serde(default, rename = "@a")]
    alpha: Option<f32>,
    #[serde(default, rename = "@folder")]
    folder: Option<i32>,
    #[serde(default, rename = "@file")]
    file: Option<i32>,
    #[serde(default, rename = "@pivot_x")]
    pivot_x: Option<f32>,
    #[serde(default, rename = "@pivot_y")]
    pivot_y: Option<f32>,
    #[serde(default, rename = "@entity")]
    entity: Option<i32>,
    #[serde(default, rename = "@animation")]
    animation: Option<i32>,
    #[serde(default, rename = "@t")]
    t: f32,
}

#[derive(Debug, Deserialize)]
struct RawSoundObject {
    #[serde(rename = "@folder")]
    folder: i32,
    #[serde(rename = "@file")]
    file: i32,
    #[serde(default, rename = "@trigger")]
    trigger: Option<bool>,
    #[serde(default, rename = "@volume")]
    volume: Option<f32>,
    #[serde(default, rename = "@panning")]
    panning: f32,
}

#[derive(Debug, Default, Deserialize)]
struct RawMeta {
    #[serde(default, rename = "varline")]
    varlines: Vec<RawVarline>,
    #[serde(default)]
    tagline: Option<RawTagline>,
}

#[derive(Debug, Deserialize)]
struct RawVarline {
    #[serde(default, rename = "@id")]
    id: i32,
    #[serde(rename = "@def")]
    def: i32,
    #[serde(default, rename = "key")]
    keys: Vec<RawVarKey>,
}

#[derive(Debug, Deserialize)]
struct RawTagline {
    #[serde(default, rename = "key")]
    keys: Vec<RawTagKey>,
}

#[derive(Debug, Deserialize)]
struct RawTagRef {
    #[serde(rename = "@t")]
    t: i32,
}

#[derive(Debug, Deserialize)]
struct RawEventline {
    #[serde(default, rename = "@id")]
    id: i32,
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "key")]
    keys: Vec<RawEventKey>,
}

#[derive(Debug, Deserialize)]
struct RawSoundline {
    #[serde(default, rename = "@id")]
    id: i32,
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "key")]
    keys: Vec<RawSoundKey>,
}

// ---------- conversion ----------

impl RawSpriterData {
    fn into_document(self) -> Result<Document, SpriterError> {
        let folders = self.folders.into_iter().map(RawFolder::convert).collect();
        let entities = self
            .entities
            .into_iter()
            .map(RawEntity::convert)
            .collect::<Result<_, _>>()?;
        let tags = self
            .tag_list
            .unwrap_or_default()
            .items
            .into_iter()
            .map(|i| TagDef {
                id: i.id,
                name: Name::from(i.name),
            })
            .collect();
        Ok(Document {
            folders,
            entities,
            tags,
        })
    }
}

impl RawFolder {
    fn convert(self) -> Folder {
        Folder {
            id: self.id,
            name: self.name.map(Name::from),
            files: self
                .files
                .into_iter()
                .map(|f| File {
                    id: f.id,
                    name: Name::from(f.name),
                    kind: match f.kind.as_deref() {
                        Some("sound") => FileKind::Sound,
                        _ => FileKind::Image,
                    },
                    width: f.width,
                    height: f.height,
                    pivot_x: f.pivot_x.unwrap_or(0.0),
                    pivot_y: f.pivot_y.unwrap_or(1.0),
                })
                .collect(),
        }
    }
}

fn object_kind(name: &str) -> Result<ObjectKind, SpriterError> {
    ObjectKind::from_name(name).ok_or_else(|| invalid(format!("unknown object type '{name}'")))
}

fn var_defs(list: Option<RawList>) -> Result<Vec<VarDef>, SpriterError> {
    list.unwrap_or_default()
        .items
        .into_iter()
        .map(|item| -> Result<VarDef, SpriterError> {
            let kind = match item.kind.as_deref() {
                Some("int") => VarKind::Int,
                Some("float") | None => VarKind::Float,
                Some("string") => VarKind::String,
                Some(other) => return Err(invalid(format!("unknown variable type '{other}'"))),
            };
            let default = match item.default.as_deref() {
                Some(text) => VarValue::parse(kind, text).ok_or_else(|| {
                    invalid(format!("bad default '{text}' for variable '{}'", item.name))
                })?,
                None => VarValue::zero(kind),
            };
            Ok(VarDef {
                id: item.id,
                name: Name::from(item.name),
                default,
            })
        })
        .collect()
}

impl RawEntity {
    fn convert(self) -> Result<Entity, SpriterError> {
        let object_infos = self
            .object_infos
            .into_iter()
            .map(|info| -> Result<ObjectInfo, SpriterError> {
                Ok(ObjectInfo {
                    name: Name::from(info.name),
                    kind: match info.kind.as_deref() {
                        Some(k) => object_kind(k)?,
                        None => ObjectKind::Sprite,
                    },
                    width: info.w,
                    height: info.h,
                    pivot: [info.pivot_x.unwrap_or(0.0), info.pivot_y.unwrap_or(1.0)],
                    variables: var_defs(info.var_defs)?,
                })
            })
            .collect::<Result<Vec<_>, SpriterError>>()?;
        let variables = var_defs(self.var_defs)?;

        let mut entity = Entity {
            id: self.id,
            name: Name::from(self.name),
            object_infos,
            variables,
            animations: Vec::with_capacity(self.animations.len()),
        };
        for raw in self.animations {
            let animation = raw.convert(&entity)?;
            entity.animations.push(animation);
        }
        Ok(entity)
    }
}

/// Convert meta lines; `defs` are the variable definitions of the line owner.
fn convert_meta(meta: RawMeta, defs: &[VarDef]) -> Result<Meta, SpriterError> {
    let varlines = meta
        .varlines
        .into_iter()
        .map(|line| -> Result<Varline, SpriterError> {
            let def = defs
                .iter()
                .find(|d| d.id == line.def)
                .ok_or_else(|| invalid(format!("varline {} uses undefined variable {}", line.id, line.def)))?;
            let kind = def.default.kind();
            let keys = line
                .keys
                .iter()
                .map(|k| -> Result<VarKey, SpriterError> {
                    Ok(VarKey {
                        id: k.id,
                        time: k.time,
                        curve: k.curve()?,
                        value: VarValue::parse(kind, &k.val).ok_or_else(|| {
                            invalid(format!("bad value '{}' for variable '{}'", k.val, def.name))
                        })?,
                    })
                })
                .collect::<Result<_, SpriterError>>()?;
            Ok(Varline {
                id: line.id,
                def: line.def,
                keys,
            })
        })
        .collect::<Result<_, SpriterError>>()?;
    let tagline = meta.tagline.map(|line| Tagline {
        keys: line
            .keys
            .into_iter()
            .map(|k| TagKey {
                id: k.id,
                time: k.time,
                tags: k.tags.iter().map(|t| t.t).collect(),
            })
            .collect(),
    });
    Ok(Meta { varlines, tagline })
}

fn key_object(raw: &RawObject) -> KeyObject {
    let pivot = match (raw.pivot_x, raw.pivot_y) {
        (None, None) => None,
        (x, y) => Some([x.unwrap_or(0.0), y.unwrap_or(1.0)]),
    };
    KeyObject {
        spatial: Spatial {
            x: raw.x,
            y: raw.y,
            angle: raw.angle,
            scale_x: raw.scale_x.unwrap_or(1.0),
            scale_y: raw.scale_y.unwrap_or(1.0),
            alpha: raw.alpha.unwrap_or(1.0),
        },
        folder: raw.folder,
        file: raw.file,
        pivot,
        entity: raw.entity,
        animation: raw.animation,
        t: raw.t,
    }
}

fn refs(raw: &[RawRef]) -> Vec<Ref> {
    raw.iter()
        .map(|r| Ref {
            id: r.id,
            parent: r.parent,
            timeline: r.timeline,
            z_index: r.z_index,
        })
        .collect()
}

impl RawAnimation {
    fn convert(self, entity: &Entity) -> Result<Animation, SpriterError> {
        let mainline = self
            .mainline
            .keys
            .iter()
            .map(|k| -> Result<MainlineKey, SpriterError> {
                Ok(MainlineKey {
                    id: k.id,
                    time: k.time,
                    curve: k.curve()?,
                    bone_refs: refs(&k.bone_refs),
                    object_refs: refs(&k.object_refs),
                })
            })
            .collect::<Result<_, SpriterError>>()?;

        let timelines = self
            .timelines
            .into_iter()
            .map(|tl| -> Result<Timeline, SpriterError> {
                let info = entity.object_info(tl.obj);
                let kind = match (tl.object_type.as_deref(), info) {
                    (Some(k), _) => object_kind(k)?,
                    (None, Some(info)) => info.kind,
                    (None, None) => ObjectKind::Sprite,
                };
                let keys = tl
                    .keys
                    .iter()
                    .map(|k| -> Result<TimelineKey, SpriterError> {
                        let object = k.object.as_ref().or(k.bone.as_ref()).map(key_object);
                        Ok(TimelineKey {
                            id: k.id,
                            time: k.time,
                            curve: k.curve()?,
                            object: object.unwrap_or_default(),
                        })
                    })
                    .collect::<Result<_, SpriterError>>()?;
                let defs = info.map(|i| i.variables.as_slice()).unwrap_or_default();
                let meta = tl.meta.map(|m| convert_meta(m, defs)).transpose()?;
                Ok(Timeline {
                    id: tl.id,
                    name: Name::from(tl.name),
                    kind,
                    obj: tl.obj,
                    keys,
                    meta,
                })
            })
            .collect::<Result<_, SpriterError>>()?;

        let eventlines = self
            .eventlines
            .into_iter()
            .map(|line| Eventline {
                id: line.id,
                name: Name::from(line.name),
                keys: line
                    .keys
                    .iter()
                    .map(|k| EventKey {
                        id: k.id,
                        time: k.time,
                    })
                    .collect(),
            })
            .collect();

        let soundlines = self
            .soundlines
            .into_iter()
            .map(|line| Soundline {
                id: line.id,
                name: Name::from(line.name),
                keys: line
                    .keys
                    .iter()
                    .map(|k| SoundKey {
                        id: k.id,
                        time: k.time,
                        sound: Sound {
                            folder: k.object.folder,
                            file: k.object.file,
                            trigger: k.object.trigger.unwrap_or(true),
                            volume: k.object.volume.unwrap_or(1.0),
                            panning: k.object.panning,
                        },
                    })
                    .collect(),
            })
            .collect();

        let meta = self
            .meta
            .map(|m| convert_meta(m, &entity.variables))
            .transpose()?;

        Ok(Animation {
            id: self.id,
            name: Name::from(self.name),
            length: self.length,
            looping: self.looping.unwrap_or(true),
            mainline,
            timelines,
            eventlines,
            soundlines,
            meta,
            timeline_index: Default::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<spriter_data scml_version="1.0" generator="BrashMonkey Spriter">
    <folder id="0">
        <file id="0" name="body.png" width="32" height="64" pivot_x="0.5" pivot_y="0"/>
    </folder>
    <entity id="0" name="e">
        <obj_info name="body" type="sprite">
            <var_defs>
                <i id="0" name="hp" type="int" default="10"/>
            </var_defs>
        </obj_info>
        <animation id="0" name="a" length="500" looping="false">
            <mainline>
                <key id="0" curve_type="quadratic" c1="0.25">
                    <object_ref id="0" timeline="0" key="0" z_index="0"/>
                </key>
            </mainline>
            <timeline id="0" name="body" obj="0">
                <key id="0" spin="0">
                    <object folder="0" file="0" x="3" a="0.5"/>
                </key>
                <meta>
                    <varline id="0" def="0">
                        <key id="0" time="0" val="7"/>
                    </varline>
                </meta>
            </timeline>
        </animation>
    </entity>
</spriter_data>"#;

    #[test]
    fn parses_structure_and_defaults() {
        assert!(ScmlParser.can_parse(SMALL));
        let doc = ScmlParser.parse(SMALL).unwrap();
        let file = doc.file(0, 0).unwrap();
        assert_eq!((file.width, file.pivot_x, file.pivot_y), (32.0, 0.5, 0.0));

        let anim = &doc.entities[0].animations[0];
        assert!(!anim.looping);
        assert_eq!(anim.mainline[0].time, 0.0);
        assert_eq!(anim.mainline[0].curve.kind, CurveKind::Quadratic);

        let key = &anim.timelines[0].keys[0].object;
        assert_eq!(key.spatial.x, 3.0);
        assert_eq!(key.spatial.alpha, 0.5);
        assert_eq!(key.spatial.scale_x, 1.0);
        assert_eq!(key.pivot, None);

        let meta = anim.timelines[0].meta.as_ref().unwrap();
        assert_eq!(meta.varlines[0].keys[0].value, VarValue::Int(7));
    }

    #[test]
    fn unknown_curve_is_a_parse_error() {
        let text = SMALL.replace("quadratic", "wobbly");
        let err = ScmlParser.parse(&text).unwrap_err();
        assert_eq!(err.category(), "parse");
    }

    #[test]
    fn curve_attributes_on_event_keys_are_ignored() {
        let text = SMALL.replace(
            "</animation>",
            r#"<eventline id="0" name="hit"><key id="0" time="5" curve_type="wobbly"/></eventline></animation>"#,
        );
        let doc = ScmlParser.parse(&text).unwrap();
        let line = &doc.entities[0].animations[0].eventlines[0];
        assert_eq!(line.keys[0].time, 5.0);
    }

    #[test]
    fn ignores_non_scml_markup() {
        assert!(!ScmlParser.can_parse("<html></html>"));
        assert!(!ScmlParser.can_parse("{\"spriter_data\":1}"));
    }
}
