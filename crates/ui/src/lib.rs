pub mod brush_panel;
pub mod capture;

pub use brush_panel::{brush_panel_system, panel_lines};
pub use capture::{UiInputCaptureRes, update_ui_input_capture};

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(UiInputCaptureRes::default())
            .add_systems(Update, update_ui_input_capture)
            .add_systems(EguiPrimaryContextPass, brush_panel_system);
    }
}
