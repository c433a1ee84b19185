use bevy::prelude::*;
use bevy::math::primitives::Sphere;

use crate::simulation::frames::FrameSource;
use crate::simulation::states::NVec3;

/// Read-only 3D frame source plus the playback cursor
#[derive(Resource)]
pub struct Replay3D {
    source: Box<dyn FrameSource<Point = NVec3> + Send + Sync>,
    frame: usize,
    scale: f32,
}

/// Component tagging each sphere with its body index in the current frame
#[derive(Component)]
struct BodyIndex3(pub usize);

#[derive(Component)]
struct TimeLabel3;

/// Half-width of the scene in world units; positions are scaled to fit it
const VIEW_HALF_EXTENT: f32 = 300.0;

/// Distance of the camera from the origin along +Z
const CAMERA_DISTANCE: f32 = 1000.0;

/// Physics frame is z-up, bevy is y-up: (x, y, z) -> (x, z, -y)
fn to_world(p: &NVec3, scale: f32) -> Vec3 {
    Vec3::new(p.x as f32, p.z as f32, -p.y as f32) * scale
}

/// Replay a precomputed 3D trajectory, one frame per update, looping
pub fn run_3d(source: Box<dyn FrameSource<Point = NVec3> + Send + Sync>, title: &str) {
    println!("run_3d: replaying {} frames", source.len());

    let extent = source.extent();
    let scale = if extent > 0.0 { VIEW_HALF_EXTENT / extent as f32 } else { 1.0 };

    App::new()
        .insert_resource(Replay3D { source, frame: 0, scale })
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: title.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .add_systems(Startup, setup_3d)
        .add_systems(Update, (advance_frame_3d, sync_transforms_3d, draw_paths_3d, update_label_3d).chain())
        .run();
}

/// Startup system: spawn camera, light, one sphere per body and the time label
fn setup_3d(mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    replay: Res<Replay3D>,
) {
    commands.spawn(Camera3dBundle {
        camera: Camera {
            clear_color: ClearColorConfig::Custom(Color::srgb(0.0, 0.0, 0.0)),
            ..Default::default()
        },
        transform: Transform::from_xyz(200.0, 150.0, CAMERA_DISTANCE)
            .looking_at(Vec3::ZERO, Vec3::Y),
        ..Default::default()
    });

    commands.spawn(PointLightBundle {
        point_light: PointLight {
            intensity: 1500.0,
            range: 2000.0,
            ..Default::default()
        },
        transform: Transform::from_xyz(100.0, 100.0, CAMERA_DISTANCE),
        ..Default::default()
    });

    let Some(first) = replay.source.frame(0) else {
        return;
    };

    for (i, p) in first.bodies.iter().enumerate() {
        // First body drawn larger (pendulum bob / central mass)
        let radius = if i == 0 { 12.0 } else { 7.0 };

        commands.spawn((
            PbrBundle {
                mesh: meshes.add(Sphere::new(radius).mesh()),
                material: materials.add(StandardMaterial {
                    base_color: Color::srgb(1.0, 1.0, 1.0),
                    unlit: true,
                    ..Default::default()
                }),
                transform: Transform::from_translation(to_world(p, replay.scale)),
                ..Default::default()
            },
            BodyIndex3(i),
        ));
    }

    commands.spawn((
        TextBundle::from_section("", TextStyle { font_size: 20.0, ..Default::default() })
            .with_style(Style {
                position_type: PositionType::Absolute,
                top: Val::Px(10.0),
                left: Val::Px(10.0),
                ..Default::default()
            }),
        TimeLabel3,
    ));
}

fn advance_frame_3d(mut replay: ResMut<Replay3D>) {
    let n = replay.source.len();
    if n > 0 {
        replay.frame = (replay.frame + 1) % n;
    }
}

fn sync_transforms_3d(replay: Res<Replay3D>, mut query: Query<(&BodyIndex3, &mut Transform)>) {
    let Some(frame) = replay.source.frame(replay.frame) else {
        return;
    };
    for (BodyIndex3(i), mut transform) in &mut query {
        if let Some(p) = frame.bodies.get(*i) {
            transform.translation = to_world(p, replay.scale);
        }
    }
}

/// Rod from the anchor to the first body, and the trail
fn draw_paths_3d(mut gizmos: Gizmos, replay: Res<Replay3D>) {
    let Some(frame) = replay.source.frame(replay.frame) else {
        return;
    };
    if let (Some(anchor), Some(body)) = (frame.anchor, frame.bodies.first()) {
        gizmos.line(to_world(&anchor, replay.scale), to_world(body, replay.scale), Color::srgb(0.6, 0.6, 0.6));
    }
    if frame.trail.len() > 1 {
        gizmos.linestrip(
            frame.trail.iter().map(|p| to_world(p, replay.scale)),
            Color::srgb(0.8, 0.2, 0.2),
        );
    }
}

fn update_label_3d(replay: Res<Replay3D>, mut query: Query<&mut Text, With<TimeLabel3>>) {
    let Some(t) = replay.source.time(replay.frame) else {
        return;
    };
    for mut text in &mut query {
        text.sections[0].value = format!("Time: {t:.3e} s");
    }
}
