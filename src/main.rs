use bevy::prelude::*;
use bevy_egui::EguiPlugin;

mod game;

use game::GamePlugin;
use terrain::{DEFAULT_CONFIG_PATH, SculptConfig};

fn main() {
    let config = SculptConfig::load_or_default(DEFAULT_CONFIG_PATH);

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.60, 0.80, 0.95)))
        .insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 80.0,
            affects_lightmapped_meshes: false,
        })
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Terrain Sculpt".to_string(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin::default())
        .add_plugins(GamePlugin { config })
        .run();
}
