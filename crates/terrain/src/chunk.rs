use glam::{UVec2, Vec2, Vec3};
use std::f32::consts::PI;

use crate::types::TerrainError;

/// Axis-aligned bounds of a chunk's vertices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl ChunkBounds {
    fn from_points(points: &[Vec3]) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        Self { min, max }
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

/// Which diagonal a quad is split along.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuadDiagonal {
    /// bottom-left to top-right
    Slash,
    /// top-left to bottom-right
    Backslash,
}

/// Quads alternate their split in a checkerboard so no diagonal direction dominates:
///
/// ```text
///  ____________
/// | /|\ || /|\ |
/// |/_|_\||/_|_\|
/// |\ | /||\ | /|
/// |_\|/_||_\|/_|
/// ```
pub fn quad_diagonal(x: u32, y: u32) -> QuadDiagonal {
    if (x + y) % 2 == 1 {
        QuadDiagonal::Slash
    } else {
        QuadDiagonal::Backslash
    }
}

/// Raised-cosine brush weight: 1 at the centre, 0 at (and beyond) the rim.
pub fn brush_falloff(distance: f32, radius: f32) -> f32 {
    if !(distance < radius) {
        return 0.0;
    }
    let t = 1.0 - distance / radius;
    (1.0 - (PI * t).cos()) * 0.5
}

/// How [`HeightfieldChunk::init`] obtains its buffers.
#[derive(Clone, Copy, Debug)]
pub enum ChunkTopology<'a> {
    /// Build a flat grid from scratch.
    Generate,
    /// Deep-copy the buffers of an existing chunk of the same shape.
    Adopt(&'a HeightfieldChunk),
}

/// One rectangular patch of the terrain with its own vertex buffer.
///
/// Positions are chunk-local; `origin` places the chunk in the world. Two normal
/// buffers are kept: `surface_normals` are what this chunk's own triangles produce,
/// `normals` are what gets rendered after seam reconciliation with neighbours.
#[derive(Clone, Debug)]
pub struct HeightfieldChunk {
    size_in_quads: UVec2,
    size_in_verts: UVec2,
    cell_size: f32,
    origin: Vec3,
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    indices: Vec<u32>,
    surface_normals: Vec<Vec3>,
    normals: Vec<Vec3>,
    bounds: ChunkBounds,
    dirty: bool,
}

impl HeightfieldChunk {
    pub fn init(
        width: u32,
        height: u32,
        cell_size: f32,
        topology: ChunkTopology<'_>,
    ) -> Result<Self, TerrainError> {
        if width == 0 || height == 0 {
            return Err(TerrainError::DegenerateChunk { width, height });
        }
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(TerrainError::InvalidCellSize(cell_size));
        }

        match topology {
            ChunkTopology::Generate => Ok(Self::generate(UVec2::new(width, height), cell_size)),
            ChunkTopology::Adopt(source) => {
                let expected = UVec2::new(width, height);
                if source.size_in_quads != expected {
                    return Err(TerrainError::ShapeMismatch {
                        expected,
                        found: source.size_in_quads,
                    });
                }
                if source.cell_size != cell_size {
                    return Err(TerrainError::CellSizeMismatch {
                        expected: cell_size,
                        found: source.cell_size,
                    });
                }
                let mut chunk = source.clone();
                chunk.origin = Vec3::ZERO;
                chunk.dirty = true;
                Ok(chunk)
            }
        }
    }

    fn generate(size_in_quads: UVec2, cell_size: f32) -> Self {
        let size_in_verts = size_in_quads + UVec2::ONE;
        let vertex_count = (size_in_verts.x * size_in_verts.y) as usize;

        let mut positions = Vec::with_capacity(vertex_count);
        let mut uvs = Vec::with_capacity(vertex_count);
        for y in 0..size_in_verts.y {
            for x in 0..size_in_verts.x {
                let fx = x as f32 * cell_size;
                let fy = y as f32 * cell_size;
                positions.push(Vec3::new(fx, 0.0, fy));
                uvs.push(Vec2::new(fx, fy));
            }
        }

        let stride = size_in_verts.x;
        let mut indices = Vec::with_capacity((size_in_quads.x * size_in_quads.y * 6) as usize);
        for y in 0..size_in_quads.y {
            for x in 0..size_in_quads.x {
                let bl = y * stride + x;
                let br = bl + 1;
                let tl = bl + stride;
                let tr = tl + 1;

                // Winding keeps the face normal pointing up (+Y).
                match quad_diagonal(x, y) {
                    QuadDiagonal::Slash => indices.extend_from_slice(&[bl, tl, tr, bl, tr, br]),
                    QuadDiagonal::Backslash => {
                        indices.extend_from_slice(&[bl, tl, br, br, tl, tr])
                    }
                }
            }
        }

        let mut chunk = Self {
            size_in_quads,
            size_in_verts,
            cell_size,
            origin: Vec3::ZERO,
            positions,
            uvs,
            indices,
            surface_normals: vec![Vec3::Y; vertex_count],
            normals: vec![Vec3::Y; vertex_count],
            bounds: ChunkBounds {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
            },
            dirty: true,
        };
        chunk.update_mesh();
        chunk
    }

    pub fn size_in_quads(&self) -> UVec2 {
        self.size_in_quads
    }

    pub fn size_in_verts(&self) -> UVec2 {
        self.size_in_verts
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub(crate) fn set_origin(&mut self, origin: Vec3) {
        self.origin = origin;
        self.dirty = true;
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn surface_normals(&self) -> &[Vec3] {
        &self.surface_normals
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Bounds in chunk-local space.
    pub fn bounds(&self) -> ChunkBounds {
        self.bounds
    }

    pub fn world_bounds(&self) -> ChunkBounds {
        self.bounds.translated(self.origin)
    }

    pub fn vertex_index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.size_in_verts.x || y >= self.size_in_verts.y {
            return None;
        }
        Some((y * self.size_in_verts.x + x) as usize)
    }

    pub fn height(&self, vertex_index: usize) -> Option<f32> {
        self.positions.get(vertex_index).map(|p| p.y)
    }

    /// Sets one vertex's height and refreshes normals and bounds.
    pub fn raise_height(&mut self, vertex_index: usize, new_height: f32) -> Result<(), TerrainError> {
        let len = self.positions.len();
        let Some(vertex) = self.positions.get_mut(vertex_index) else {
            return Err(TerrainError::VertexOutOfRange {
                index: vertex_index,
                len,
            });
        };
        vertex.y = new_height;
        self.update_mesh();
        Ok(())
    }

    /// Raises every vertex within `radius` (horizontally) of `world_center` by
    /// `height_delta` weighted with [`brush_falloff`], clamped to `max_height`.
    ///
    /// Returns how many vertices were inside the brush. Normals and bounds are
    /// refreshed once, and only if some height actually moved.
    pub fn apply_brush(
        &mut self,
        world_center: Vec3,
        radius: f32,
        height_delta: f32,
        max_height: f32,
    ) -> usize {
        let center = Vec2::new(world_center.x - self.origin.x, world_center.z - self.origin.z);

        let mut touched = 0;
        let mut moved = false;
        for vertex in &mut self.positions {
            let distance = Vec2::new(vertex.x, vertex.z).distance(center);
            if distance < radius {
                let factor = brush_falloff(distance, radius);
                let y = (vertex.y + height_delta * factor).min(max_height);
                moved |= y != vertex.y;
                vertex.y = y;
                touched += 1;
            }
        }

        if moved {
            self.update_mesh();
        }
        touched
    }

    /// Height of the surface at a chunk-local XZ position, following the
    /// triangle split of the containing quad. `None` outside the chunk.
    pub fn sample_local_height(&self, local_x: f32, local_z: f32) -> Option<f32> {
        let u = local_x / self.cell_size;
        let v = local_z / self.cell_size;
        if !(u >= 0.0 && v >= 0.0)
            || u > self.size_in_quads.x as f32
            || v > self.size_in_quads.y as f32
        {
            return None;
        }

        let qx = (u.floor() as u32).min(self.size_in_quads.x - 1);
        let qy = (v.floor() as u32).min(self.size_in_quads.y - 1);
        let fx = u - qx as f32;
        let fy = v - qy as f32;

        let stride = self.size_in_verts.x;
        let bl = (qy * stride + qx) as usize;
        let br = bl + 1;
        let tl = bl + stride as usize;
        let tr = tl + 1;
        let [h_bl, h_br, h_tl, h_tr] = [bl, br, tl, tr].map(|i| self.positions[i].y);

        let h = match quad_diagonal(qx, qy) {
            QuadDiagonal::Slash => {
                if fx >= fy {
                    h_bl + fx * (h_br - h_bl) + fy * (h_tr - h_br)
                } else {
                    h_bl + fy * (h_tl - h_bl) + fx * (h_tr - h_tl)
                }
            }
            QuadDiagonal::Backslash => {
                if fx + fy <= 1.0 {
                    h_bl + fx * (h_br - h_bl) + fy * (h_tl - h_bl)
                } else {
                    h_tr + (1.0 - fx) * (h_tl - h_tr) + (1.0 - fy) * (h_br - h_tr)
                }
            }
        };
        Some(h)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Writes a reconciled normal; returns whether the rendered value changed.
    pub(crate) fn set_normal(&mut self, vertex_index: usize, normal: Vec3) -> bool {
        let changed = self.write_normal(vertex_index, normal);
        self.dirty |= changed;
        changed
    }

    /// Like [`Self::set_normal`] but leaves the dirty flag alone.
    pub(crate) fn write_normal(&mut self, vertex_index: usize, normal: Vec3) -> bool {
        if self.normals[vertex_index] == normal {
            return false;
        }
        self.normals[vertex_index] = normal;
        true
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn update_mesh(&mut self) {
        self.recalculate_normals();
        self.bounds = ChunkBounds::from_points(&self.positions);
        self.dirty = true;
    }

    /// Area-weighted vertex normals from the chunk's own triangles.
    fn recalculate_normals(&mut self) {
        self.surface_normals.fill(Vec3::ZERO);
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let face = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            self.surface_normals[a] += face;
            self.surface_normals[b] += face;
            self.surface_normals[c] += face;
        }
        for n in &mut self.surface_normals {
            *n = n.normalize_or(Vec3::Y);
        }
        self.normals.copy_from_slice(&self.surface_normals);
    }
}
