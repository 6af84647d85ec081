use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;

use terrain::{PointerInput, PointerRay};
use ui::UiInputCaptureRes;

use super::camera::FlyCamera;

/// This frame's pointer and modifier state, shared by the camera and the brush.
#[derive(Resource, Default, Clone, Copy, Debug)]
pub struct PointerInputRes(pub PointerInput);

// Pixel scrolling (touchpads) is scaled to roughly one notch per 40 px.
const PIXELS_PER_NOTCH: f32 = 40.0;

pub fn update_pointer_input(
    windows: Query<&Window>,
    camera_q: Query<(&Camera, &GlobalTransform), With<FlyCamera>>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    ui_capture: Res<UiInputCaptureRes>,
    mut pointer: ResMut<PointerInputRes>,
) {
    let mut scroll = 0.0;
    for ev in mouse_wheel.read() {
        scroll += match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y / PIXELS_PER_NOTCH,
        };
    }

    let mut input = PointerInput {
        lower_modifier_held: keys.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]),
        precision_modifier_held: keys.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]),
        ..default()
    };

    // Over the panel the brush and camera get nothing from the pointer.
    if !ui_capture.pointer {
        input.primary_held = mouse_buttons.pressed(MouseButton::Left);
        input.scroll_delta = scroll;
        input.ray = cursor_ray(&windows, &camera_q);
    }

    pointer.0 = input;
}

fn cursor_ray(
    windows: &Query<&Window>,
    camera_q: &Query<(&Camera, &GlobalTransform), With<FlyCamera>>,
) -> Option<PointerRay> {
    let window = windows.single().ok()?;
    let (camera, camera_transform) = camera_q.single().ok()?;
    let cursor_pos = window.cursor_position()?;
    let ray = camera.viewport_to_world(camera_transform, cursor_pos).ok()?;

    Some(PointerRay {
        origin: ray.origin,
        direction: *ray.direction,
    })
}
