use bevy::log::info;
use bevy::math::Vec2;
use hz_core::DrawMode;
use hz_mesh::build_terrain_mesh;
use hz_noise::MapGenerator;

use crate::presentation::{PresentationSink, TextureSource};

/// Render the origin chunk once, in the generator's configured draw mode.
pub fn draw_preview(generator: &MapGenerator, sink: &mut dyn PresentationSink) {
    let config = generator.config();
    info!("Drawing {:?} preview", config.draw_mode);

    match config.draw_mode {
        DrawMode::FalloffMap => {
            sink.draw_texture(TextureSource::Heights(generator.falloff().clone()));
        }
        DrawMode::NoiseMap => {
            let map_data = generator.generate(Vec2::ZERO);
            sink.draw_texture(TextureSource::Heights(map_data.height_map));
        }
        DrawMode::ColorMap => {
            let map_data = generator.generate(Vec2::ZERO);
            sink.draw_texture(TextureSource::Colors(map_data.color_map));
        }
        DrawMode::Mesh => {
            let map_data = generator.generate(Vec2::ZERO);
            let mesh = build_terrain_mesh(
                &map_data.height_map,
                config.height_multiplier,
                &config.height_curve,
                config.preview_lod,
            );
            sink.draw_mesh(mesh, map_data.color_map);
        }
    }
}
