use bevy::prelude::*;

use terrain::{CameraConfig, SculptConfig};
use ui::UiInputCaptureRes;

use super::input::PointerInputRes;

#[derive(Component)]
pub struct FlyCamera;

/// Movement keys held this frame, as signed axes: `x` is D minus A, `y` is W minus S.
pub fn movement_axes(keys: &ButtonInput<KeyCode>) -> Vec2 {
    let mut axes = Vec2::ZERO;
    if keys.pressed(KeyCode::KeyA) {
        axes.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        axes.x += 1.0;
    }
    if keys.pressed(KeyCode::KeyW) {
        axes.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) {
        axes.y -= 1.0;
    }
    axes
}

/// World translation for one frame. Keys move on XZ (W towards +Z), scrolling
/// up lowers the camera.
pub fn fly_delta(axes: Vec2, scroll: f32, config: &CameraConfig, dt: f32) -> Vec3 {
    let step = Vec3::new(axes.x, -scroll * config.zoom_per_scroll, axes.y);
    step * config.move_speed * dt
}

pub fn setup_viewer(mut commands: Commands, config: Res<SculptConfig>) {
    let extent = config.terrain.terrain_size as f32 * config.terrain.cell_size;
    let focus = Vec3::new(extent * 0.5, 0.0, extent * 0.5);
    let eye = Vec3::new(focus.x, config.camera.start_height, -extent * 0.25);

    commands.spawn((
        FlyCamera,
        Camera3d::default(),
        Transform::from_translation(eye).looking_at(focus, Vec3::Y),
    ));
}

pub fn fly_camera(
    time: Res<Time>,
    keys: Res<ButtonInput<KeyCode>>,
    input: Res<PointerInputRes>,
    config: Res<SculptConfig>,
    ui_capture: Res<UiInputCaptureRes>,
    mut q_cam: Query<&mut Transform, With<FlyCamera>>,
) {
    let mut cam = match q_cam.single_mut() {
        Ok(c) => c,
        Err(_) => return,
    };

    let axes = if ui_capture.keyboard {
        Vec2::ZERO
    } else {
        movement_axes(&keys)
    };
    let delta = fly_delta(axes, input.0.camera_scroll(), &config.camera, time.delta_secs());
    cam.translation += delta;
}
