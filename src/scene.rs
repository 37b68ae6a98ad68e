use bevy::image::{ImageFilterMode, ImageSampler, ImageSamplerDescriptor};
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use hz_core::ChunkCoord;
use hz_mesh::MeshData;
use hz_noise::{color_grid_to_rgba, height_grid_to_rgba};
use hz_stream::{CommandBuffer, PresentationCommand, TextureSource};
use std::collections::HashMap;
use std::sync::Arc;

/// Preview objects float above the origin chunk.
const PREVIEW_ORIGIN: Vec3 = Vec3::new(0.0, 80.0, 0.0);

/// Collision geometry assigned to a chunk.
#[derive(Component)]
pub struct TerrainCollider(pub Arc<MeshData>);

/// Marker for entities spawned by the preview command.
#[derive(Component)]
pub struct PreviewObject;

/// ECS side of streamed chunks.
#[derive(Resource, Default)]
pub struct ChunkEntities {
    entities: HashMap<ChunkCoord, Entity>,
    materials: HashMap<ChunkCoord, Handle<StandardMaterial>>,
    /// One uploaded mesh per (chunk, LOD slot); LOD swaps reuse them.
    meshes: HashMap<(ChunkCoord, usize), Handle<Mesh>>,
}

pub fn create_image(width: usize, height: usize, data: Vec<u8>) -> Image {
    let mut image = Image::new(
        Extent3d {
            width: width as u32,
            height: height as u32,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        data,
        TextureFormat::Rgba8UnormSrgb,
        default(),
    );

    // Nearest filtering keeps terrain bands crisp
    image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
        mag_filter: ImageFilterMode::Nearest,
        min_filter: ImageFilterMode::Nearest,
        ..default()
    });

    image
}

fn texture_image(texture: &TextureSource) -> Image {
    match texture {
        TextureSource::Heights(grid) => create_image(grid.width, grid.height, height_grid_to_rgba(grid)),
        TextureSource::Colors(grid) => create_image(grid.width, grid.height, color_grid_to_rgba(grid)),
    }
}

/// Apply everything the chunk manager and preview recorded this frame.
pub fn apply_presentation_commands(
    mut commands: Commands,
    mut buffer: ResMut<CommandBuffer>,
    mut chunk_entities: ResMut<ChunkEntities>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    previews: Query<Entity, With<PreviewObject>>,
) {
    if buffer.is_empty() {
        return;
    }

    let ChunkEntities {
        entities,
        materials: chunk_materials,
        meshes: mesh_handles,
    } = &mut *chunk_entities;

    for command in buffer.drain() {
        match command {
            PresentationCommand::SpawnChunk {
                coord,
                position,
                scale,
            } => {
                let material = materials.add(StandardMaterial {
                    perceptual_roughness: 1.0,
                    ..default()
                });
                let entity = commands
                    .spawn((
                        coord,
                        Name::new(format!("Terrain chunk ({}, {})", coord.x, coord.y)),
                        Transform::from_translation(position).with_scale(Vec3::splat(scale)),
                        MeshMaterial3d(material.clone()),
                        Visibility::Hidden,
                    ))
                    .id();
                entities.insert(coord, entity);
                chunk_materials.insert(coord, material);
            }
            PresentationCommand::ChunkTexture { coord, map_data } => {
                let colors = &map_data.color_map;
                let image = images.add(create_image(
                    colors.width,
                    colors.height,
                    color_grid_to_rgba(colors),
                ));
                if let Some(material) = chunk_materials
                    .get(&coord)
                    .and_then(|handle| materials.get_mut(handle))
                {
                    material.base_color_texture = Some(image);
                }
            }
            PresentationCommand::ChunkMesh {
                coord,
                lod_index,
                mesh,
            } => {
                let Some(&entity) = entities.get(&coord) else {
                    continue;
                };
                let handle = mesh_handles
                    .entry((coord, lod_index))
                    .or_insert_with(|| meshes.add(mesh.to_mesh()))
                    .clone();
                commands.entity(entity).insert(Mesh3d(handle));
            }
            PresentationCommand::ChunkCollider { coord, mesh } => {
                if let Some(&entity) = entities.get(&coord) {
                    commands.entity(entity).insert(TerrainCollider(mesh));
                }
            }
            PresentationCommand::ChunkVisibility { coord, visible } => {
                if let Some(&entity) = entities.get(&coord) {
                    let visibility = if visible {
                        Visibility::Visible
                    } else {
                        Visibility::Hidden
                    };
                    commands.entity(entity).insert(visibility);
                }
            }
            PresentationCommand::DrawTexture(texture) => {
                for entity in &previews {
                    commands.entity(entity).despawn_recursive();
                }
                let image = texture_image(&texture);
                let size = Vec2::new(image.width() as f32, image.height() as f32);
                let material = materials.add(StandardMaterial {
                    base_color_texture: Some(images.add(image)),
                    unlit: true,
                    ..default()
                });
                commands.spawn((
                    PreviewObject,
                    Name::new("Terrain preview"),
                    Mesh3d(meshes.add(Plane3d::default().mesh().size(size.x, size.y))),
                    MeshMaterial3d(material),
                    Transform::from_translation(PREVIEW_ORIGIN),
                ));
            }
            PresentationCommand::DrawMesh { mesh, colors } => {
                for entity in &previews {
                    commands.entity(entity).despawn_recursive();
                }
                let image = images.add(create_image(
                    colors.width,
                    colors.height,
                    color_grid_to_rgba(&colors),
                ));
                let material = materials.add(StandardMaterial {
                    base_color_texture: Some(image),
                    perceptual_roughness: 1.0,
                    ..default()
                });
                commands.spawn((
                    PreviewObject,
                    Name::new("Terrain mesh preview"),
                    Mesh3d(meshes.add(mesh.to_mesh())),
                    MeshMaterial3d(material),
                    Transform::from_translation(PREVIEW_ORIGIN),
                ));
            }
        }
    }
}
