//! Integration tests: factories → scene model → layout → persisted shape.

use pretty_assertions::assert_eq;
use sd_core::geometry::{Point, rotate_point};
use sd_core::layout::{ApproxMeasure, LayoutContext, element_bounds, layout_text, to_local};
use sd_core::*;

fn phone_scene() -> SceneModel {
    let mut scene = SceneModel::new(GlobalSettings::default());
    for i in 0..3 {
        scene.add_canvas(CanvasInstance::new(
            CanvasId::new(format!("shot-{i}")),
            Some(format!("upload/{i}.png")),
            i,
        ));
    }
    scene
}

// ─── Scenario: Tap to edit ──────────────────────────────────────────────

#[test]
fn new_text_wraps_to_single_line() {
    let mut scene = phone_scene();
    let id = scene
        .add_element(0, create_text_element("Tap to edit", Point::new(100.0, 100.0)))
        .unwrap();
    let el = scene.element(0, id).unwrap();
    let text = el.as_text().unwrap();
    assert_eq!(text.font_size, 64.0);
    assert_eq!(text.weight, FontWeight::Bold);

    let ctx = LayoutContext {
        measure: &ApproxMeasure,
        canvas_width: 1000.0,
        text_width_fraction: 1.0,
    };
    let layout = layout_text(el, text, &ctx);
    assert_eq!(layout.lines, vec!["Tap to edit".to_string()]);
}

// ─── Copy-on-write snapshots ────────────────────────────────────────────

#[test]
fn clones_taken_before_an_update_stay_stable() {
    let mut scene = phone_scene();
    scene.add_element(0, create_text_element("other", Point::ZERO));
    let id = scene
        .add_element(
            1,
            create_visual_element("badge.png", 300.0, 120.0, Point::new(500.0, 500.0)),
        )
        .unwrap();
    let before = scene.clone();

    scene.update_element(
        1,
        id,
        &ElementPatch::transform(Point::new(10.0, 20.0), 2.0, 45.0),
    );
    assert_eq!(
        before.element(1, id).unwrap().position,
        Point::new(500.0, 500.0)
    );
    assert_eq!(scene.element(1, id).unwrap().position, Point::new(10.0, 20.0));
    assert!(scene.version() > before.version());

    // Untouched canvases share their element records.
    assert!(std::sync::Arc::ptr_eq(
        &before.canvas(0).unwrap().elements[0],
        &scene.canvas(0).unwrap().elements[0]
    ));
}

#[test]
fn deleted_element_is_gone_and_update_is_noop() {
    let mut scene = phone_scene();
    let id = scene
        .add_element(2, create_text_element("bye", Point::ZERO))
        .unwrap();
    assert!(scene.delete_element(2, id).is_some());
    assert!(scene.delete_element(2, id).is_none());
    assert!(!scene.update_element(2, id, &ElementPatch::default()));
}

// ─── Layout ─────────────────────────────────────────────────────────────

#[test]
fn rotated_point_inside_bounds_maps_back_inside() {
    let mut el = create_mockup_element("iphone-15-pro", None, Point::new(642.0, 1389.0));
    el.rotation = 30.0;
    el.scale = 0.5;
    let ctx = LayoutContext::new(&ApproxMeasure, 1284.0);
    let bounds = element_bounds(&el, &ctx);

    let local = Point::new(bounds.x + 10.0, bounds.y + 10.0);
    let world = rotate_point(local, bounds.center(), el.rotation);
    assert!(bounds.contains(to_local(world, &bounds, el.rotation)));
}

// ─── Persisted shape ────────────────────────────────────────────────────

#[test]
fn saved_config_round_trips_through_json() {
    let mut scene = phone_scene();
    scene.add_element(0, create_text_element("Headline", Point::new(642.0, 200.0)));
    scene.add_element(
        0,
        create_mockup_element("iphone-15-pro", Some("upload/0.png"), Point::new(642.0, 1600.0)),
    );
    scene.update_global_settings(SettingsPatch {
        background: Some(Background::Solid {
            color: Color::from_hex("#101010").unwrap(),
        }),
        ..Default::default()
    });

    let canvas = scene.canvas(0).unwrap();
    let config = SavedCanvasConfig::from_canvas(canvas, scene.settings());
    let json = config.to_json().unwrap();
    let back = SavedCanvasConfig::from_json(&json).unwrap();
    assert_eq!(back, config);
    assert_eq!(back.heading.unwrap().text, "Headline");
    assert_eq!(
        CanvasSnapshot::encode(&config).unwrap(),
        CanvasSnapshot::capture(canvas, scene.settings()).unwrap()
    );
}
