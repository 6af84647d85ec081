use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::chunk::HeightfieldChunk;
use crate::editor::{BrushUniformSink, TerrainEditor};
use crate::types::{ChunkHandle, SculptConfig};

#[derive(Resource)]
pub struct TerrainEditorRes(pub TerrainEditor);

/// Mesh asset of every chunk, indexed by [`ChunkHandle`].
#[derive(Resource, Default)]
pub struct TerrainChunkMeshes(pub Vec<Handle<Mesh>>);

#[derive(Component, Clone, Copy, Debug)]
pub struct TerrainChunk(pub ChunkHandle);

/// Where the brush sits this frame. Drawn as a ring on the terrain.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct BrushHighlight {
    pub hit: Option<Vec3>,
    pub radius: f32,
}

impl BrushUniformSink for BrushHighlight {
    fn write_brush(&mut self, hit: Vec3, radius: f32) -> bool {
        self.hit = Some(hit);
        self.radius = radius;
        true
    }

    fn clear_brush(&mut self) {
        self.hit = None;
    }
}

pub fn setup_terrain(
    mut commands: Commands,
    config: Res<SculptConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut exit: MessageWriter<AppExit>,
) {
    let mut editor = match TerrainEditor::new(&config) {
        Ok(editor) => editor,
        Err(err) => {
            error!("cannot build terrain: {err}");
            exit.write(AppExit::error());
            return;
        }
    };

    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.42, 0.55, 0.33),
        perceptual_roughness: 1.0,
        ..default()
    });

    let grid = editor.grid();
    let mut handles = Vec::with_capacity(grid.len());
    for chunk_handle in grid.handles() {
        let Some(chunk) = grid.chunk(chunk_handle) else {
            continue;
        };
        let mesh_handle = meshes.add(mesh_from_chunk(chunk));
        handles.push(mesh_handle.clone());

        commands.spawn((
            TerrainChunk(chunk_handle),
            Mesh3d(mesh_handle),
            MeshMaterial3d(material.clone()),
            Transform::from_translation(chunk.origin()),
        ));
    }

    // Everything was just uploaded.
    editor.take_dirty();

    commands.insert_resource(TerrainChunkMeshes(handles));
    commands.insert_resource(TerrainEditorRes(editor));
}

/// Pushes positions and normals of edited chunks into their meshes.
pub fn sync_dirty_chunk_meshes(
    editor: Option<ResMut<TerrainEditorRes>>,
    chunk_meshes: Res<TerrainChunkMeshes>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    let Some(mut editor) = editor else {
        return;
    };

    let dirty = editor.0.take_dirty();
    if dirty.is_empty() {
        return;
    }

    let grid = editor.0.grid();
    for handle in &dirty {
        let (Some(chunk), Some(mesh_handle)) = (grid.chunk(*handle), chunk_meshes.0.get(handle.index()))
        else {
            continue;
        };
        if let Some(mesh) = meshes.get_mut(mesh_handle) {
            mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, to_arrays(chunk.positions()));
            mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, to_arrays(chunk.normals()));
        }
    }
    debug!("uploaded {} terrain chunk meshes", dirty.len());
}

pub fn draw_brush_highlight(mut gizmos: Gizmos, highlight: Res<BrushHighlight>) {
    let Some(hit) = highlight.hit else {
        return;
    };

    gizmos.circle(
        Isometry3d::new(
            hit + Vec3::Y * 0.05,
            Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
        ),
        highlight.radius,
        Color::WHITE,
    );
    gizmos.sphere(Isometry3d::from_translation(hit), 0.1, Color::srgb(1.0, 0.85, 0.2));
}

pub fn mesh_from_chunk(chunk: &HeightfieldChunk) -> Mesh {
    let uvs: Vec<[f32; 2]> = chunk.uvs().iter().map(|uv| uv.to_array()).collect();

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, to_arrays(chunk.positions()));
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, to_arrays(chunk.normals()));
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(chunk.indices().to_vec()));
    mesh
}

fn to_arrays(values: &[Vec3]) -> Vec<[f32; 3]> {
    values.iter().map(|v| v.to_array()).collect()
}
