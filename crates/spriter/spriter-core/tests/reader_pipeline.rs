use spriter_core::{
    read_document, Document, JsonParser, ScmlParser, SpriterError, SpriterReader,
};

fn basic_text() -> String {
    spriter_test_fixtures::documents::text("basic").expect("load basic fixture")
}

#[test]
fn default_reader_loads_and_initializes_fixture() {
    let doc = read_document(&basic_text()).expect("read basic");
    let hero = doc.entity("hero").expect("hero entity");
    assert_eq!(hero.animations.len(), 3);
    assert_eq!(doc.tag(1).map(|t| &**t), Some("armored"));

    let walk = hero.animation("walk").expect("walk");
    assert!(!walk.looping);
    assert_eq!(walk.length, 1000.0);
    assert_eq!(walk.timeline_index.len(), walk.timelines.len());

    // sprite pivots default to the file's pivot, box pivots to the object info
    let body = walk.timeline(0).unwrap();
    assert_eq!(body.keys[0].object.pivot, Some([0.5, 0.0]));
    let hitbox = walk.timeline(2).unwrap();
    assert_eq!(hitbox.keys[0].object.pivot, Some([0.0, 0.0]));

    // refs come out in z order
    let idle = hero.animation("idle").unwrap();
    let order: Vec<i32> = idle.mainline[0].object_refs.iter().map(|r| r.z_index).collect();
    assert_eq!(order, vec![0, 1]);
}

#[test]
fn every_fixture_reads_with_the_default_reader() {
    for key in spriter_test_fixtures::documents::keys() {
        let text = spriter_test_fixtures::documents::text(&key).unwrap();
        let doc = read_document(&text).unwrap_or_else(|e| panic!("fixture {key}: {e}"));
        assert!(!doc.entities.is_empty(), "fixture {key} has no entities");
    }
}

#[test]
fn json_cache_reads_back_identically() {
    let doc = read_document(&basic_text()).unwrap();
    let json = doc.to_json().expect("serialize");
    let back: Document = SpriterReader::default()
        .read(json.as_str())
        .expect("read json")
        .expect("json parser matched");
    assert_eq!(back, doc);
}

#[test]
fn parser_order_decides_the_format() {
    let text = basic_text();
    let json_only = SpriterReader::new().with_parser(JsonParser);
    assert_eq!(json_only.read(text.as_str()), Ok(None));

    let scml_only = SpriterReader::new().with_parser(ScmlParser);
    let doc = scml_only.read(text.as_str()).unwrap().unwrap();
    // no preprocessors registered, so no derived index either
    assert!(doc.entities[0].animations[0].timeline_index.is_empty());
}

#[test]
fn unrecognized_and_blank_input() {
    let reader = SpriterReader::default();
    assert_eq!(reader.read("   "), Ok(None));
    assert_eq!(reader.read("name,length\nwalk,1000"), Ok(None));
    assert_eq!(reader.read(None::<&str>), Err(SpriterError::MissingInput));
    assert_eq!(read_document("plain text").unwrap_err().category(), "parse");
}

#[test]
fn malformed_scml_is_a_parse_error() {
    let err = read_document("<spriter_data><entity id=\"x\" name=\"e\"/></spriter_data>").unwrap_err();
    assert!(matches!(err, SpriterError::Parse { format: "scml", .. }), "{err:?}");
}
