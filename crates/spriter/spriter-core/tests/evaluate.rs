use spriter_core::{
    read_document, Config, Curve, CurveKind, Document, Engine, FrameDataProvider, VarValue,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn load(name: &str) -> Document {
    let text = spriter_test_fixtures::documents::text(name).expect("load fixture");
    read_document(&text).expect("read fixture")
}

#[test]
fn key_times_reproduce_authored_values() {
    let doc = load("basic");
    let walk = doc.animation("hero", "walk").unwrap();
    let mut engine = Engine::new(Config::default());

    let frame = engine.evaluate(walk, 0.0, 0.0).unwrap();
    let body = frame.sprite("body").expect("body");
    assert_eq!(body.spatial.x, 0.0);
    assert_eq!(body.spatial.angle, 350.0);
    assert_eq!((body.folder, body.file), (0, 0));
    assert_eq!(body.size, [64.0, 128.0]);
    assert_eq!(body.pivot, [0.5, 0.0]);

    let frame = engine.evaluate(walk, 1000.0, 0.0).unwrap();
    let body = frame.sprite("body").unwrap();
    assert_eq!(body.spatial.x, 100.0);
    assert_eq!(body.spatial.angle, 10.0);
}

#[test]
fn non_looping_interpolates_then_clamps() {
    let doc = load("basic");
    let walk = doc.animation("hero", "walk").unwrap();
    let mut engine = Engine::new(Config::default());

    let x = engine.evaluate(walk, 500.0, 0.0).unwrap().sprite("body").unwrap().spatial.x;
    approx(x, 50.0, 1e-4);
    let x = engine.evaluate(walk, 1500.0, 0.0).unwrap().sprite("body").unwrap().spatial.x;
    approx(x, 100.0, 1e-4);

    // 350 -> 10 goes the short way through 0
    let angle = engine.evaluate(walk, 250.0, 0.0).unwrap().sprite("body").unwrap().spatial.angle;
    approx(angle, 355.0, 1e-3);
}

#[test]
fn looping_time_wraps() {
    let doc = load("basic");
    let run = doc.animation("hero", "run").unwrap();
    let mut engine = Engine::new(Config::default());

    for t in [0.0, 50.0, 100.0, 250.0, 300.0, 399.0] {
        let base = engine.evaluate(run, t, 0.0).unwrap().sprite("body").unwrap().spatial;
        for k in 1..4 {
            let wrapped = engine
                .evaluate(run, t + 400.0 * k as f32, 0.0)
                .unwrap()
                .sprite("body")
                .unwrap()
                .spatial;
            approx(wrapped.x, base.x, 1e-3);
        }
    }
    // past the last key the track heads back to the first one
    let x = engine.evaluate(run, 300.0, 0.0).unwrap().sprite("body").unwrap().spatial.x;
    approx(x, 100.0, 1e-4);
}

#[test]
fn points_and_boxes_are_keyed() {
    let doc = load("basic");
    let walk = doc.animation("hero", "walk").unwrap();
    let mut engine = Engine::new(Config::default());
    let frame = engine.evaluate(walk, 500.0, 0.0).unwrap();

    let hand = frame.point("hand").expect("hand point");
    approx(hand.spatial.x, 30.0, 1e-4);
    approx(hand.spatial.y, 30.0, 1e-4);
    assert_eq!(hand.size, [0.0, 0.0]);

    let hitbox = frame.collision_box(2).expect("hitbox by timeline id");
    assert_eq!(&*hitbox.name, "hitbox");
    assert_eq!(hitbox.size, [40.0, 100.0]);
    assert_eq!(hitbox.pivot, [0.0, 0.0]);
    assert_eq!(frame.sprites.len(), 1);
}

#[test]
fn variables_and_tags() {
    let doc = load("basic");
    let walk = doc.animation("hero", "walk").unwrap();
    let mut engine = Engine::new(Config::default());
    let frame = engine.evaluate(walk, 500.0, 0.0).unwrap();

    assert_eq!(frame.animation_vars.get("speed"), Some(&VarValue::Float(5.0)));
    assert_eq!(frame.object_vars["body"]["hp"], VarValue::Int(75));
    let tags: Vec<&str> = frame.animation_tags.iter().map(|t| &**t).collect();
    assert_eq!(tags, vec!["grounded"]);
    assert_eq!(&*frame.object_tags["body"][0], "armored");
}

#[test]
fn disabled_toggles_leave_collections_empty() {
    let doc = load("basic");
    let walk = doc.animation("hero", "walk").unwrap();

    let mut engine = Engine::new(Config {
        metadata_enabled: false,
        ..Config::default()
    });
    let frame = engine.evaluate(walk, 600.0, 500.0).unwrap();
    assert_eq!(frame.sprites.len(), 1);
    assert!(frame.animation_vars.is_empty() && frame.object_vars.is_empty());
    assert!(frame.animation_tags.is_empty() && frame.object_tags.is_empty());
    assert!(frame.events.is_empty() && frame.sounds.is_empty());

    let cfg = Config::from_json(r#"{ "events_enabled": false, "vars_enabled": false }"#).unwrap();
    let mut engine = Engine::new(cfg);
    let frame = engine.evaluate(walk, 600.0, 500.0).unwrap();
    assert!(frame.events.is_empty());
    assert_eq!(frame.sounds.len(), 1);
    assert!(frame.animation_vars.is_empty());
    assert!(!frame.animation_tags.is_empty());
}

#[test]
fn draw_order_follows_z_index() {
    let doc = load("basic");
    let idle = doc.animation("hero", "idle").unwrap();
    let mut engine = Engine::new(Config::default());
    let frame = engine.evaluate(idle, 0.0, 0.0).unwrap();
    let names: Vec<&str> = frame.sprites.iter().map(|s| &*s.name).collect();
    assert_eq!(names, vec!["shadow", "body"]);
    assert_eq!(frame.sprite("shadow").unwrap().size, [64.0, 16.0]);
}

#[test]
fn bones_parent_their_objects() {
    let doc = load("nested");
    let pose = doc.animation("rig", "pose").unwrap();
    let mut engine = Engine::new(Config::default());
    let frame = engine.evaluate(pose, 0.0, 0.0).unwrap();

    assert_eq!(frame.sprites.len(), 1);
    let arm = frame.sprite("arm").unwrap();
    approx(arm.spatial.x, 10.0, 1e-4);
    approx(arm.spatial.y, 5.0, 1e-4);
    approx(arm.spatial.angle, 90.0, 1e-4);
    assert!(arm.parent.is_none());
}

#[test]
fn nested_instances_compose_into_the_parent_frame() {
    let doc = load("nested");
    let carry = doc.animation("holder", "carry").unwrap();
    let mut engine = Engine::new(Config::default());
    let frame = engine.evaluate(carry, 0.0, 50.0).unwrap();

    assert!(frame.sprite("slot").is_none());
    let gem = frame.sprite("gem").expect("child sprite");
    approx(gem.spatial.x, 110.0, 1e-4);
    approx(gem.spatial.scale_x, 2.0, 1e-6);
    assert_eq!(gem.parent.as_deref(), Some("slot"));
    assert_eq!(gem.size, [8.0, 8.0]);
    // child metadata stays out of the root snapshot
    assert!(frame.events.is_empty());
}

#[test]
fn nested_boxes_and_points_keep_the_parent_ones() {
    let doc = load("nested");
    let guard = doc.animation("knight", "guard").unwrap();
    let mut engine = Engine::new(Config::default());
    let frame = engine.evaluate(guard, 0.0, 0.0).unwrap();

    // both boxes sit on timeline 0 of their own animation
    assert_eq!(frame.boxes.len(), 2);
    let body = frame.collision_box(0).expect("parent box");
    assert_eq!(&*body.name, "body_box");
    assert_eq!(body.size, [30.0, 60.0]);
    let sword = frame.collision_box_in(Some("hand_slot"), 0).expect("child box");
    assert_eq!(&*sword.name, "sword_box");
    approx(sword.spatial.x, 60.0, 1e-4);
    assert_eq!(sword.size, [80.0, 6.0]);

    assert_eq!(frame.points.len(), 2);
    approx(frame.point("grip").expect("parent grip").spatial.x, 40.0, 1e-4);
    approx(
        frame.point_in(Some("hand_slot"), "grip").expect("child grip").spatial.x,
        52.0,
        1e-4,
    );
}

#[test]
fn eased_keys_shape_the_mix() {
    let doc = load("curves");
    let anim = doc.animation("ease", "eased_keys").unwrap();
    let mut engine = Engine::new(Config::default());
    let frame = engine.evaluate(anim, 50.0, 0.0).unwrap();

    // quadratic with c1 = 0 turns 0.5 into 0.25
    approx(frame.sprite("dot").unwrap().spatial.x, 25.0, 1e-3);

    let bezier = Curve::new(CurveKind::Bezier, [0.42, 0.0, 1.0, 1.0]).apply(0.5);
    assert!(bezier < 0.5);
    approx(frame.sprite("puff").unwrap().spatial.x, 100.0 * bezier, 1e-3);
}

#[test]
fn mainline_curve_warps_timeline_time() {
    let doc = load("curves");
    let anim = doc.animation("ease", "warped_main").unwrap();
    let mut engine = Engine::new(Config::default());

    // the linear timeline is sampled at the warped time 25
    let x = engine.evaluate(anim, 50.0, 0.0).unwrap().sprite("dot").unwrap().spatial.x;
    approx(x, 25.0, 1e-3);
    let x = engine.evaluate(anim, 100.0, 0.0).unwrap().sprite("dot").unwrap().spatial.x;
    approx(x, 100.0, 1e-3);
}

#[test]
fn single_mainline_key_still_animates_timelines() {
    let doc = load("curves");
    let anim = doc.animation("ease", "eased_keys").unwrap();
    let mut engine = Engine::new(Config::default());
    let early = engine.evaluate(anim, 20.0, 0.0).unwrap().sprite("dot").unwrap().spatial.x;
    let late = engine.evaluate(anim, 80.0, 0.0).unwrap().sprite("dot").unwrap().spatial.x;
    assert!(late > early, "early={early} late={late}");
}

#[test]
fn self_instancing_entity_fails_fast() {
    let doc = load("cyclic");
    let anim = doc.animation("loop", "self").unwrap();
    let mut engine = Engine::new(Config::default());
    let err = engine.evaluate(anim, 0.0, 0.0).unwrap_err();
    assert_eq!(err, spriter_core::SpriterError::EntityCycle { entity: 0 });

    // the engine stays usable afterwards
    let basic = load("basic");
    let walk = basic.animation("hero", "walk").unwrap();
    assert_eq!(engine.evaluate(walk, 0.0, 0.0).unwrap().sprites.len(), 1);
}

#[test]
fn provider_without_second_animation_matches_evaluate() {
    let doc = load("basic");
    let walk = doc.animation("hero", "walk").unwrap();
    let mut engine = Engine::new(Config::default());
    let direct = engine.evaluate(walk, 420.0, 0.0).unwrap().sprites.clone();
    let via = engine
        .get_frame_data(420.0, 0.0, 0.7, walk, None, None)
        .unwrap()
        .sprites
        .clone();
    assert_eq!(direct, via);
}
