use bevy::prelude::*;
use excavator_core::{load_config, VehicleConfig};
use excavator_physics::{VehiclePlugin, VehicleSet};
use excavator_ui::TelemetryUiPlugin;

mod input;
mod scene;

/// Environment variable naming an optional JSON tuning file.
const CONFIG_ENV: &str = "EXCAVATOR_CONFIG";

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(VehiclePlugin)
        .add_plugins(TelemetryUiPlugin)
        .insert_resource(ClearColor(Color::srgb(0.55, 0.7, 0.85)))
        .add_systems(PreStartup, load_vehicle_config)
        .add_systems(
            Startup,
            (scene::setup_scene, scene::spawn_obstacles, scene::spawn_part_visuals)
                .after(excavator_physics::spawn_vehicle),
        )
        .add_systems(
            Update,
            (input::keyboard_input, input::gamepad_input, input::reset_key).in_set(VehicleSet::Input),
        )
        .add_systems(
            Update,
            (scene::sync_part_visuals, scene::sync_obstacle_visuals).after(VehicleSet::Simulate),
        )
        .run();
}

/// Replace the default tuning with the file named by `EXCAVATOR_CONFIG`, if set.
fn load_vehicle_config(mut config: ResMut<VehicleConfig>) {
    let Ok(path) = std::env::var(CONFIG_ENV) else {
        info!("Using default vehicle config");
        return;
    };

    match load_config(&path) {
        Ok(loaded) => {
            info!("Loaded vehicle config from {}", path);
            *config = loaded;
        }
        Err(e) => warn!("Ignoring vehicle config {}: {}", path, e),
    }
}
