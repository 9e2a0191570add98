use std::io::Write;
use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use excavator_core::{load_config, ControlInput, JointId, NodeId, PartId, VehicleConfig};
use excavator_physics::{InputSources, PhysicsWorld, Vehicle, VehiclePlugin};

fn app_with_config(json: &str) -> App {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", json).unwrap();
    let config = load_config(file.path()).expect("Tuning file should load");

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
            1.0 / 60.0,
        )))
        .insert_resource(config)
        .add_plugins(VehiclePlugin);
    app
}

#[test]
fn test_tuned_joint_range_is_respected() {
    let mut app = app_with_config(
        r#"{ "joints": { "thumb": { "min": 0.0, "max": 0.5, "initial": 0.1 } } }"#,
    );
    app.update();
    assert!((app.world().resource::<Vehicle>().joints().get(JointId::Thumb).value() - 0.1).abs() < 1e-6);

    app.world_mut().resource_mut::<InputSources>().keyboard = ControlInput {
        button_y: true,
        ..Default::default()
    };
    for _ in 0..60 {
        app.update();
    }

    let thumb = app.world().resource::<Vehicle>().joints().get(JointId::Thumb);
    assert_eq!(thumb.value(), 0.5);
    assert!(thumb.at_limit());
}

#[test]
fn test_tuned_mass_is_shared_by_parts() {
    let mut app = app_with_config(r#"{ "total_mass": 1500.0 }"#);
    app.update();

    let vehicle = app.world().resource::<Vehicle>();
    let sum: f32 = PartId::ALL
        .iter()
        .map(|&part| vehicle.proxies().get(part).mass)
        .sum();
    assert!((sum - 1500.0).abs() < 1e-2, "Part masses sum to {}", sum);
    assert_eq!(app.world().resource::<PhysicsWorld>().dynamic_body_count(), 1);
}

#[test]
fn test_stronger_treads_drive_further() {
    let distance = |json: &str| {
        let mut app = app_with_config(json);
        app.update();
        app.world_mut().resource_mut::<InputSources>().gamepad = ControlInput {
            trigger_l: 1.0,
            trigger_r: 1.0,
            ..Default::default()
        };
        for _ in 0..90 {
            app.update();
        }
        let vehicle = app.world().resource::<Vehicle>();
        let world = app.world().resource::<PhysicsWorld>();
        -vehicle.chassis().pose(world).0.z
    };

    let stock = distance("{}");
    let strong = distance(r#"{ "chassis": { "force_gain": 12000.0 } }"#);
    assert!(stock > 0.0, "Stock vehicle should move forward");
    assert!(strong > stock, "{} should exceed {}", strong, stock);
}

#[test]
fn test_tuned_layout_moves_pivots() {
    let mut app = app_with_config(
        r#"{
            "parts": { "boom": { "size": [0.22, 0.26, 2.0], "center_offset": [0.0, 0.0, -1.0] } },
            "layout": { "stick": [0.0, 0.0, -2.0], "blade": [0.0, 0.2, -1.15] }
        }"#,
    );
    app.update();

    let vehicle = app.world().resource::<Vehicle>();
    let skeleton = vehicle.skeleton();
    let boom = skeleton.world(NodeId::Boom).translation;
    let stick = skeleton.world(NodeId::Stick).translation;
    assert!(
        ((stick - boom).length() - 2.0).abs() < 1e-4,
        "Stick pivot should sit at the end of the longer boom"
    );

    // Boom box centre is halfway along the tuned segment
    let boom_proxy = vehicle.proxies().get(PartId::Boom).position;
    assert!((boom_proxy - (boom + stick) * 0.5).length() < 1e-4, "Boom proxy at {:?}", boom_proxy);

    let root = skeleton.world(NodeId::Chassis);
    let blade = skeleton.world(NodeId::Blade).translation;
    let local = root.rotation.inverse() * (blade - root.translation);
    assert!((local.y - 0.2).abs() < 1e-4, "Blade pivot height {}", local.y);
}

#[test]
fn test_invalid_config_resource_falls_back_to_defaults() {
    let mut config = VehicleConfig::default();
    config.joints.boom.min = 2.0;
    config.stepping.max_frame_delta = -0.1;

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
            1.0 / 60.0,
        )))
        .insert_resource(config)
        .add_plugins(VehiclePlugin);
    for _ in 0..5 {
        app.update();
    }

    assert_eq!(*app.world().resource::<VehicleConfig>(), VehicleConfig::default());
    let boom = app.world().resource::<Vehicle>().joints().get(JointId::Boom);
    assert_eq!(boom.min(), VehicleConfig::default().joints.boom.min);
    assert!(app.world().resource::<Vehicle>().clock() > 0.0, "Vehicle should keep stepping");
}
