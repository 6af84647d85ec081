use bevy::prelude::*;
use bevy_egui::EguiContexts;

#[derive(Resource, Default, Clone, Copy, Debug)]
pub struct UiInputCaptureRes {
    /// True when the pointer is over the panel or egui is using it.
    pub pointer: bool,
    /// True when egui wants keyboard input (a focused slider value field).
    pub keyboard: bool,
}

pub fn update_ui_input_capture(
    mut contexts: EguiContexts,
    mut capture: ResMut<UiInputCaptureRes>,
) {
    let ctx = match contexts.ctx_mut() {
        Ok(ctx) => ctx,
        Err(_) => {
            *capture = UiInputCaptureRes::default();
            return;
        }
    };

    capture.pointer = ctx.wants_pointer_input() || ctx.is_pointer_over_area();
    capture.keyboard = ctx.wants_keyboard_input();
}
