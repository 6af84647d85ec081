pub mod brush;
pub mod chunk;
pub mod editor;
pub mod grid;
pub mod query;
pub mod render;
pub mod seams;
pub mod types;

pub use brush::{BrushDirection, BrushState, PointerInput};
pub use chunk::{ChunkBounds, HeightfieldChunk};
pub use editor::{BrushUniformSink, StrokeReport, TerrainEditor};
pub use grid::ChunkGrid;
pub use query::{HeightfieldQuery, PointerRay, TerrainSpatialQuery};
pub use types::*;

use bevy::prelude::*;

/// Frame order for terrain editing. Sculpting systems go in `Sculpt`; the mesh
/// upload runs after them.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TerrainSet {
    Sculpt,
    MeshSync,
}

pub struct TerrainPlugin {
    pub config: SculptConfig,
}

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .init_resource::<render::BrushHighlight>()
            .init_resource::<render::TerrainChunkMeshes>()
            .configure_sets(Update, (TerrainSet::Sculpt, TerrainSet::MeshSync).chain())
            .add_systems(Startup, render::setup_terrain)
            .add_systems(
                Update,
                (
                    render::sync_dirty_chunk_meshes.in_set(TerrainSet::MeshSync),
                    render::draw_brush_highlight.after(TerrainSet::Sculpt),
                ),
            );
    }
}
