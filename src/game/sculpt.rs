use bevy::prelude::*;

use terrain::HeightfieldQuery;
use terrain::render::{BrushHighlight, TerrainEditorRes};

use super::input::PointerInputRes;

/// Runs the editor for this frame against the built-in heightfield query.
pub fn apply_brush_stroke(
    time: Res<Time>,
    input: Res<PointerInputRes>,
    editor: Option<ResMut<TerrainEditorRes>>,
    mut highlight: ResMut<BrushHighlight>,
    query: Local<HeightfieldQuery>,
) {
    let Some(mut editor) = editor else {
        return;
    };

    match editor
        .0
        .tick(&input.0, time.delta_secs(), &*query, &mut *highlight)
    {
        Ok(report) => {
            if report.radius_changed {
                debug!("brush radius now {:.2}", editor.0.brush().radius());
            }
        }
        Err(err) => error!("brush stroke failed: {err}"),
    }
}
