use bevy::prelude::*;
use bevy::sprite::{MaterialMesh2dBundle, Mesh2dHandle};
use bevy::math::primitives::Circle;

use crate::simulation::frames::FrameSource;
use crate::simulation::states::NVec2;

/// Read-only 2D frame source plus the playback cursor
#[derive(Resource)]
pub struct Replay2D {
    source: Box<dyn FrameSource<Point = NVec2> + Send + Sync>,
    frame: usize,
    scale: f32,
}

#[derive(Component)]
struct BodyIndex(pub usize);

#[derive(Component)]
struct TimeLabel;

/// Half-width of the view in pixels; positions are scaled to fit it
const VIEW_HALF_EXTENT: f32 = 300.0;

fn to_screen(p: &NVec2, scale: f32) -> Vec2 {
    Vec2::new(p.x as f32, p.y as f32) * scale
}

/// Replay a precomputed planar trajectory, one frame per update, looping
pub fn run_2d(source: Box<dyn FrameSource<Point = NVec2> + Send + Sync>, title: &str) {
    println!("run_2d: replaying {} frames", source.len());

    let extent = source.extent();
    let scale = if extent > 0.0 { VIEW_HALF_EXTENT / extent as f32 } else { 1.0 };

    App::new()
        .insert_resource(Replay2D { source, frame: 0, scale })
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: title.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .add_systems(Startup, setup_bodies_system)
        .add_systems(Update, (advance_frame_system, sync_transforms_system, draw_trail_system, update_label_system).chain())
        .run();
}

fn setup_bodies_system(mut commands: Commands, replay: Res<Replay2D>, mut meshes: ResMut<Assets<Mesh>>, mut materials: ResMut<Assets<ColorMaterial>>) {
    // 2D camera
    commands.spawn(Camera2dBundle::default());

    let Some(first) = replay.source.frame(0) else {
        return;
    };

    for (i, p) in first.bodies.iter().enumerate() {
        let radius_screen = if i == 0 { 10.0 } else { 5.0 };
        let pos = to_screen(p, replay.scale);

        commands.spawn((
            MaterialMesh2dBundle {
                mesh: Mesh2dHandle(meshes.add(Circle::new(radius_screen))),
                material: materials.add(ColorMaterial::from(Color::WHITE)),
                transform: Transform::from_xyz(pos.x, pos.y, 0.0),
                ..Default::default()
            },
            BodyIndex(i),
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
        TimeLabel,
    ));
}

fn advance_frame_system(mut replay: ResMut<Replay2D>) {
    let n = replay.source.len();
    if n > 0 {
        replay.frame = (replay.frame + 1) % n;
    }
}

fn sync_transforms_system(replay: Res<Replay2D>, mut query: Query<(&BodyIndex, &mut Transform)>) {
    let Some(frame) = replay.source.frame(replay.frame) else {
        return;
    };
    for (BodyIndex(i), mut transform) in &mut query {
        if let Some(p) = frame.bodies.get(*i) {
            let pos = to_screen(p, replay.scale);
            transform.translation.x = pos.x;
            transform.translation.y = pos.y;
        }
    }
}

fn draw_trail_system(mut gizmos: Gizmos, replay: Res<Replay2D>) {
    let Some(frame) = replay.source.frame(replay.frame) else {
        return;
    };
    if frame.trail.len() > 1 {
        gizmos.linestrip_2d(frame.trail.iter().map(|p| to_screen(p, replay.scale)), Color::srgb(0.8, 0.2, 0.2));
    }
}

fn update_label_system(replay: Res<Replay2D>, mut query: Query<&mut Text, With<TimeLabel>>) {
    let Some(t) = replay.source.time(replay.frame) else {
        return;
    };
    for mut text in &mut query {
        text.sections[0].value = format!("Time: {t:.1e} s");
    }
}
