pub mod camera;
pub mod input;
pub mod lighting;
pub mod sculpt;

use bevy::prelude::*;

use terrain::{SculptConfig, TerrainPlugin, TerrainSet};
use ui::UiPlugin;

pub struct GamePlugin {
    pub config: SculptConfig,
}

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(input::PointerInputRes::default())
            .add_plugins(TerrainPlugin {
                config: self.config.clone(),
            })
            .add_plugins(UiPlugin)
            .add_systems(
                Startup,
                (camera::setup_viewer, lighting::setup_sun_light).chain(),
            )
            .add_systems(
                Update,
                (
                    input::update_pointer_input,
                    camera::fly_camera,
                    sculpt::apply_brush_stroke.in_set(TerrainSet::Sculpt),
                )
                    .chain()
                    .after(ui::update_ui_input_capture),
            );
    }
}
