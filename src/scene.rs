//! Camera, light, obstacles and box visuals for the vehicle parts.

use bevy::prelude::*;
use excavator_core::PartId;
use excavator_physics::{PhysicsWorld, Vehicle, GROUND_HALF_SIZE};
use rapier3d::prelude as rapier;

/// Links a mesh to one vehicle part's proxy.
#[derive(Component)]
pub struct PartVisual(pub PartId);

/// Links a mesh to a rapier obstacle body.
#[derive(Component)]
pub struct ObstacleLink(pub rapier::RigidBodyHandle);

fn part_color(part: PartId) -> Color {
    match part {
        PartId::Chassis => Color::srgb(0.2, 0.2, 0.22),
        PartId::Cab => Color::srgb(0.95, 0.7, 0.1),
        PartId::Boom | PartId::Stick => Color::srgb(0.9, 0.62, 0.08),
        PartId::Bucket | PartId::Thumb => Color::srgb(0.35, 0.35, 0.38),
        PartId::Blade => Color::srgb(0.5, 0.5, 0.52),
    }
}

pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let size = GROUND_HALF_SIZE * 2.0;
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(size, 1.0, size))),
        MeshMaterial3d(materials.add(Color::srgb(0.45, 0.38, 0.28))),
        Transform::from_xyz(0.0, -0.5, 0.0),
    ));

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(9.0, 7.0, 9.0).looking_at(Vec3::new(0.0, 0.5, -1.5), Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.8, 0.5, 0.0)),
    ));
}

/// A wall to dig into and a few crates to push around.
pub fn spawn_obstacles(
    mut commands: Commands,
    mut physics: ResMut<PhysicsWorld>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let obstacles = [
        (Vec3::new(0.0, 0.6, -7.0), Vec3::new(3.0, 0.6, 0.5), false),
        (Vec3::new(4.0, 0.4, -3.0), Vec3::new(0.8, 0.4, 0.8), false),
        (Vec3::new(-2.5, 0.3, -4.0), Vec3::splat(0.3), true),
        (Vec3::new(-1.5, 0.3, -5.0), Vec3::splat(0.3), true),
        (Vec3::new(1.5, 0.25, -4.5), Vec3::splat(0.25), true),
    ];

    for (position, half_extents, dynamic) in obstacles {
        let handle = physics.insert_obstacle(position, half_extents, dynamic);
        let color = if dynamic {
            Color::srgb(0.6, 0.3, 0.15)
        } else {
            Color::srgb(0.4, 0.4, 0.4)
        };

        commands.spawn((
            Mesh3d(meshes.add(Cuboid::from_size(half_extents * 2.0))),
            MeshMaterial3d(materials.add(color)),
            Transform::from_translation(position),
            ObstacleLink(handle),
        ));
    }
}

pub fn spawn_part_visuals(
    mut commands: Commands,
    vehicle: Res<Vehicle>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for proxy in vehicle.proxies().iter() {
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::from_size(proxy.half_extents * 2.0))),
            MeshMaterial3d(materials.add(part_color(proxy.part))),
            Transform::from_translation(proxy.position).with_rotation(proxy.rotation),
            PartVisual(proxy.part),
        ));
    }
}

pub fn sync_part_visuals(vehicle: Res<Vehicle>, mut query: Query<(&PartVisual, &mut Transform)>) {
    for (visual, mut transform) in query.iter_mut() {
        let proxy = vehicle.proxies().get(visual.0);
        transform.translation = proxy.position;
        transform.rotation = proxy.rotation;
    }
}

pub fn sync_obstacle_visuals(
    physics: Res<PhysicsWorld>,
    mut query: Query<(&ObstacleLink, &mut Transform)>,
) {
    for (link, mut transform) in query.iter_mut() {
        if let Some((position, rotation)) = physics.body_pose(link.0) {
            transform.translation = position;
            transform.rotation = rotation;
        }
    }
}
