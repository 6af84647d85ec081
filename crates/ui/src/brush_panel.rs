use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};
use terrain::BrushDirection;
use terrain::BrushState;
use terrain::render::TerrainEditorRes;

const CONTROLS: &str = "LMB: sculpt   Ctrl: lower   Shift + wheel: radius\nWASD: move   wheel: height";

/// Read-only summary lines shown above the sliders.
pub fn panel_lines(brush: &BrushState) -> Vec<String> {
    let (min, max) = brush.radius_range();
    let direction = match brush.direction {
        BrushDirection::Raise => "raise",
        BrushDirection::Lower => "lower",
    };
    let max_height = if brush.max_height.is_finite() {
        format!("{:.2}", brush.max_height)
    } else {
        "none".to_string()
    };

    let mut lines = vec![
        format!("Direction: {direction}"),
        format!("Radius clamp: {min:.2} .. {max:.2}"),
        format!("Height cap: {max_height}"),
    ];
    match brush.center {
        Some(c) => lines.push(format!("Hit: ({:.2}, {:.2}, {:.2})", c.x, c.y, c.z)),
        None => lines.push("Hit: none".to_string()),
    }
    lines
}

pub fn brush_panel_system(mut contexts: EguiContexts, editor: Option<ResMut<TerrainEditorRes>>) {
    let Some(mut editor) = editor else {
        return;
    };
    let ctx = match contexts.ctx_mut() {
        Ok(ctx) => ctx,
        Err(_) => return,
    };

    let margin = 10.0;
    egui::Area::new("brush_panel".into())
        .fixed_pos(egui::pos2(margin, margin))
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            egui::Frame::new()
                .fill(egui::Color32::from_rgb(35, 35, 35))
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(90, 90, 90)))
                .corner_radius(6)
                .inner_margin(8)
                .show(ui, |ui| {
                    ui.set_min_width(260.0);
                    ui.strong("Brush");

                    let brush = editor.0.brush_mut();
                    for line in panel_lines(brush) {
                        ui.label(line);
                    }

                    let (min, max) = brush.radius_range();
                    let mut radius = brush.radius();
                    if ui
                        .add(egui::Slider::new(&mut radius, min..=max).text("radius"))
                        .changed()
                    {
                        brush.set_radius(radius);
                    }
                    ui.add(egui::Slider::new(&mut brush.strength, 0.0..=10.0).text("strength / s"));

                    ui.separator();
                    ui.small(CONTROLS);
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrain::BrushConfig;

    #[test]
    fn lines_describe_the_brush() {
        let mut brush = BrushState::from_config(&BrushConfig::default());
        brush.direction = BrushDirection::Lower;
        brush.center = Some(Vec3::new(1.0, 0.5, 2.0));

        let lines = panel_lines(&brush);
        assert_eq!(
            lines,
            vec![
                "Direction: lower".to_string(),
                "Radius clamp: 0.25 .. 10.00".to_string(),
                "Height cap: none".to_string(),
                "Hit: (1.00, 0.50, 2.00)".to_string(),
            ]
        );
    }
}
