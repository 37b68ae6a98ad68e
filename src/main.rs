mod scene;

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use hz_config::{load_or_default, save_config, DEFAULT_CONFIG_PATH};
use hz_core::DrawMode;
use hz_stream::{draw_preview, ChunkManager, CommandBuffer};
use scene::{apply_presentation_commands, ChunkEntities};
use std::path::Path;

/// Ground speed of the viewer in world units per second.
const VIEWER_SPEED: f32 = 120.0;
const VIEWER_SPRINT_MULTIPLIER: f32 = 4.0;
const LOOK_SENSITIVITY: f32 = 0.003;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Horizon - Endless Terrain".into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.55, 0.7, 0.9)))
        .init_resource::<CommandBuffer>()
        .init_resource::<ChunkEntities>()
        .add_systems(Startup, (setup_scene, setup_terrain))
        .add_systems(
            Update,
            (
                move_viewer,
                look_viewer,
                handle_terrain_shortcuts,
                stream_chunks,
                apply_presentation_commands,
            )
                .chain()
                .run_if(resource_exists::<ChunkManager>),
        )
        .run();
}

/// The entity chunk streaming follows.
#[derive(Component)]
struct Viewer {
    yaw: f32,
    pitch: f32,
}

fn setup_scene(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 60.0, 0.0).looking_to(Vec3::NEG_Z, Vec3::Y),
        Viewer {
            yaw: 0.0,
            pitch: 0.0,
        },
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 10_000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(0.0, 100.0, 0.0).looking_at(Vec3::new(0.3, 0.0, -1.0), Vec3::Y),
    ));
}

/// Load the terrain config and start the chunk manager.
fn setup_terrain(mut commands: Commands) {
    let config = load_or_default(Path::new(DEFAULT_CONFIG_PATH));
    info!(
        "Terrain seed {}, chunk size {}, {} detail levels",
        config.seed,
        config.chunk_size(),
        config.detail_levels.len()
    );

    match ChunkManager::new(config) {
        Ok(manager) => commands.insert_resource(manager),
        Err(e) => error!("Terrain streaming disabled: {}", e),
    }
}

fn move_viewer(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut query: Query<&mut Transform, With<Viewer>>,
) {
    let Ok(mut transform) = query.get_single_mut() else {
        return;
    };

    let forward = transform.forward().with_y(0.0).normalize_or_zero();
    let right = transform.right().with_y(0.0).normalize_or_zero();
    let mut direction = Vec3::ZERO;

    if keyboard.pressed(KeyCode::KeyW) {
        direction += forward;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        direction -= forward;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        direction += right;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        direction -= right;
    }
    if keyboard.pressed(KeyCode::Space) {
        direction += Vec3::Y;
    }
    if keyboard.pressed(KeyCode::ControlLeft) {
        direction -= Vec3::Y;
    }

    if direction == Vec3::ZERO {
        return;
    }

    let mut speed = VIEWER_SPEED;
    if keyboard.pressed(KeyCode::ShiftLeft) {
        speed *= VIEWER_SPRINT_MULTIPLIER;
    }
    transform.translation += direction.normalize() * speed * time.delta_secs();
}

/// Right mouse drag turns the viewer.
fn look_viewer(
    mouse: Res<ButtonInput<MouseButton>>,
    mut motion_events: EventReader<MouseMotion>,
    mut query: Query<(&mut Transform, &mut Viewer)>,
) {
    if !mouse.pressed(MouseButton::Right) {
        motion_events.clear();
        return;
    }

    let delta: Vec2 = motion_events.read().map(|event| event.delta).sum();
    if delta == Vec2::ZERO {
        return;
    }

    for (mut transform, mut viewer) in &mut query {
        viewer.yaw -= delta.x * LOOK_SENSITIVITY;
        viewer.pitch = (viewer.pitch - delta.y * LOOK_SENSITIVITY).clamp(-1.5, 1.5);
        transform.rotation = Quat::from_euler(EulerRot::YXZ, viewer.yaw, viewer.pitch, 0.0);
    }
}

/// F5 draws a preview, F6 cycles the preview mode, F9 saves the config.
fn handle_terrain_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut manager: ResMut<ChunkManager>,
    mut buffer: ResMut<CommandBuffer>,
) {
    if keyboard.just_pressed(KeyCode::F6) {
        let mut config = manager.service().config().clone();
        config.draw_mode = match config.draw_mode {
            DrawMode::NoiseMap => DrawMode::ColorMap,
            DrawMode::ColorMap => DrawMode::Mesh,
            DrawMode::Mesh => DrawMode::FalloffMap,
            DrawMode::FalloffMap => DrawMode::NoiseMap,
        };
        info!("Preview mode: {:?}", config.draw_mode);
        manager.update_generation_config(config);
    }

    if keyboard.just_pressed(KeyCode::F5) || keyboard.just_pressed(KeyCode::F6) {
        draw_preview(manager.service().generator(), &mut *buffer);
    }

    if keyboard.just_pressed(KeyCode::F9) {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        match save_config(path, manager.service().config()) {
            Ok(()) => info!("Saved terrain config to {}", path.display()),
            Err(e) => warn!("Failed to save terrain config: {}", e),
        }
    }
}

fn stream_chunks(
    query: Query<&Transform, With<Viewer>>,
    mut manager: ResMut<ChunkManager>,
    mut buffer: ResMut<CommandBuffer>,
) {
    let Ok(transform) = query.get_single() else {
        return;
    };
    let viewer = Vec2::new(transform.translation.x, transform.translation.z);
    manager.update(viewer, &mut *buffer);
}
