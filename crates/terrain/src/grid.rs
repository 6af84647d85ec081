use bevy::log::info;
use glam::{UVec2, Vec3};

use crate::chunk::{ChunkTopology, HeightfieldChunk};
use crate::types::{ChunkHandle, ChunkShape, TerrainConfig, TerrainError};

/// First chunk built for each cacheable shape class. Later chunks of the same
/// class are deep copies of these.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CanonicalChunks {
    pub full: Option<ChunkHandle>,
    pub right_edge: Option<ChunkHandle>,
    pub top_edge: Option<ChunkHandle>,
}

impl CanonicalChunks {
    fn slot(&mut self, shape: ChunkShape) -> Option<&mut Option<ChunkHandle>> {
        match shape {
            ChunkShape::Full => Some(&mut self.full),
            ChunkShape::RightEdge => Some(&mut self.right_edge),
            ChunkShape::TopEdge => Some(&mut self.top_edge),
            // Only one corner exists, nothing to reuse.
            ChunkShape::Corner => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShapeCounts {
    pub full: usize,
    pub right_edge: usize,
    pub top_edge: usize,
    pub corner: usize,
}

/// A square terrain partitioned into chunks, stored row-major (`y * chunks_x + x`).
#[derive(Clone, Debug)]
pub struct ChunkGrid {
    config: TerrainConfig,
    chunks_x: u32,
    chunks_y: u32,
    chunks: Vec<HeightfieldChunk>,
    shapes: Vec<ChunkShape>,
    canonical: CanonicalChunks,
}

impl ChunkGrid {
    pub fn build(config: &TerrainConfig) -> Result<Self, TerrainError> {
        config.validate()?;

        let chunk_size = config.chunk_size;
        let chunks_x = config.chunks_per_axis();
        let chunks_y = config.chunks_per_axis();
        let count = (chunks_x * chunks_y) as usize;

        let mut chunks: Vec<HeightfieldChunk> = Vec::with_capacity(count);
        let mut shapes = Vec::with_capacity(count);
        let mut canonical = CanonicalChunks::default();

        for y in 0..chunks_y {
            for x in 0..chunks_x {
                // Full chunk, or whatever is left over at the right/top edge.
                let width = chunk_size.min(config.terrain_size - x * chunk_size);
                let height = chunk_size.min(config.terrain_size - y * chunk_size);
                let shape = ChunkShape::classify(width, height, chunk_size)?;
                let handle = ChunkHandle(chunks.len() as u32);

                let mut chunk = match canonical.slot(shape) {
                    Some(Some(source)) => HeightfieldChunk::init(
                        width,
                        height,
                        config.cell_size,
                        ChunkTopology::Adopt(&chunks[source.index()]),
                    )?,
                    Some(slot) => {
                        *slot = Some(handle);
                        HeightfieldChunk::init(width, height, config.cell_size, ChunkTopology::Generate)?
                    }
                    None => HeightfieldChunk::init(
                        width,
                        height,
                        config.cell_size,
                        ChunkTopology::Generate,
                    )?,
                };

                chunk.set_origin(chunk_origin(config, x, y));
                chunks.push(chunk);
                shapes.push(shape);
            }
        }

        let grid = Self {
            config: config.clone(),
            chunks_x,
            chunks_y,
            chunks,
            shapes,
            canonical,
        };

        let counts = grid.shape_counts();
        info!(
            "built {}x{} terrain chunk grid ({} full, {} right-edge, {} top-edge, {} corner, {} vertices)",
            chunks_x,
            chunks_y,
            counts.full,
            counts.right_edge,
            counts.top_edge,
            counts.corner,
            grid.chunks.iter().map(HeightfieldChunk::vertex_count).sum::<usize>(),
        );

        Ok(grid)
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn cell_size(&self) -> f32 {
        self.config.cell_size
    }

    pub fn chunks_x(&self) -> u32 {
        self.chunks_x
    }

    pub fn chunks_y(&self) -> u32 {
        self.chunks_y
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// World-space edge length of the whole terrain.
    pub fn world_extent(&self) -> f32 {
        self.config.terrain_size as f32 * self.config.cell_size
    }

    /// World-space edge length of a full chunk.
    pub fn chunk_world_size(&self) -> f32 {
        self.config.chunk_size as f32 * self.config.cell_size
    }

    pub fn canonical(&self) -> CanonicalChunks {
        self.canonical
    }

    pub fn handles(&self) -> impl Iterator<Item = ChunkHandle> + '_ {
        (0..self.chunks.len() as u32).map(ChunkHandle)
    }

    pub fn chunk(&self, handle: ChunkHandle) -> Option<&HeightfieldChunk> {
        self.chunks.get(handle.index())
    }

    pub(crate) fn chunks_mut(&mut self) -> &mut [HeightfieldChunk] {
        &mut self.chunks
    }

    pub fn shape(&self, handle: ChunkHandle) -> Option<ChunkShape> {
        self.shapes.get(handle.index()).copied()
    }

    pub fn shape_counts(&self) -> ShapeCounts {
        let mut counts = ShapeCounts::default();
        for shape in &self.shapes {
            match shape {
                ChunkShape::Full => counts.full += 1,
                ChunkShape::RightEdge => counts.right_edge += 1,
                ChunkShape::TopEdge => counts.top_edge += 1,
                ChunkShape::Corner => counts.corner += 1,
            }
        }
        counts
    }

    pub fn handle_at(&self, x: u32, y: u32) -> Option<ChunkHandle> {
        if x >= self.chunks_x || y >= self.chunks_y {
            return None;
        }
        Some(ChunkHandle(y * self.chunks_x + x))
    }

    pub fn coord_of(&self, handle: ChunkHandle) -> Option<UVec2> {
        if handle.index() >= self.chunks.len() {
            return None;
        }
        Some(UVec2::new(handle.0 % self.chunks_x, handle.0 / self.chunks_x))
    }

    fn checked(&self, handle: ChunkHandle) -> Result<usize, TerrainError> {
        let index = handle.index();
        if index >= self.chunks.len() {
            return Err(TerrainError::ChunkOutOfRange {
                index,
                len: self.chunks.len(),
            });
        }
        Ok(index)
    }

    /// Chunk containing a world position, ignoring height. Positions on the far
    /// terrain edge belong to the last row/column.
    pub fn world_to_chunk(&self, world: Vec3) -> Option<ChunkHandle> {
        let cell_x = self.world_to_cell(world.x)?;
        let cell_y = self.world_to_cell(world.z)?;
        self.handle_at(cell_x / self.config.chunk_size, cell_y / self.config.chunk_size)
    }

    fn world_to_cell(&self, coord: f32) -> Option<u32> {
        if !(coord >= 0.0) || coord > self.world_extent() {
            return None;
        }
        let cell = (coord / self.config.cell_size) as u32;
        Some(cell.min(self.config.terrain_size - 1))
    }

    /// Nearest vertex of `handle` to a world position, ignoring height.
    pub fn world_to_vertex(&self, handle: ChunkHandle, world: Vec3) -> Option<usize> {
        let chunk = self.chunk(handle)?;
        let origin = chunk.origin();
        let vx = ((world.x - origin.x) / chunk.cell_size()).round();
        let vy = ((world.z - origin.z) / chunk.cell_size()).round();
        if vx < 0.0 || vy < 0.0 {
            return None;
        }
        chunk.vertex_index(vx as u32, vy as u32)
    }

    /// Terrain surface height under a world XZ position.
    pub fn sample_height_at(&self, world_x: f32, world_z: f32) -> Option<f32> {
        let handle = self.world_to_chunk(Vec3::new(world_x, 0.0, world_z))?;
        let chunk = self.chunk(handle)?;
        let origin = chunk.origin();
        let local = chunk.sample_local_height(world_x - origin.x, world_z - origin.z)?;
        Some(origin.y + local)
    }

    /// Upper bound on how many chunks a sphere of `radius` can overlap.
    pub fn max_chunks_in_radius(&self, radius: f32) -> usize {
        let span = ((2.0 * radius.max(0.0)) / self.chunk_world_size()).ceil() as usize + 1;
        (span * span).min(self.chunks.len())
    }

    /// Sets a single vertex height and reconciles the seams around its chunk.
    pub fn set_vertex_height(
        &mut self,
        handle: ChunkHandle,
        vertex_index: usize,
        height: f32,
    ) -> Result<(), TerrainError> {
        let index = self.checked(handle)?;
        self.chunks[index].raise_height(vertex_index, height)?;
        self.reconcile_seams_around(&[handle]);
        Ok(())
    }

    /// Applies the brush to one chunk. Seams are left for the caller to reconcile
    /// once every chunk under the brush has been updated.
    pub fn apply_brush(
        &mut self,
        handle: ChunkHandle,
        world_center: Vec3,
        radius: f32,
        height_delta: f32,
        max_height: f32,
    ) -> Result<usize, TerrainError> {
        let index = self.checked(handle)?;
        Ok(self.chunks[index].apply_brush(world_center, radius, height_delta, max_height))
    }

    /// Chunks whose geometry changed since the last call, in handle order.
    pub fn take_dirty(&mut self) -> Vec<ChunkHandle> {
        let mut dirty = Vec::new();
        for (i, chunk) in self.chunks.iter_mut().enumerate() {
            if chunk.is_dirty() {
                chunk.mark_clean();
                dirty.push(ChunkHandle(i as u32));
            }
        }
        dirty
    }
}

fn chunk_origin(config: &TerrainConfig, x: u32, y: u32) -> Vec3 {
    let chunk_world_size = config.chunk_size as f32 * config.cell_size;
    Vec3::new(x as f32 * chunk_world_size, 0.0, y as f32 * chunk_world_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(terrain_size: u32, chunk_size: u32) -> ChunkGrid {
        ChunkGrid::build(&TerrainConfig {
            terrain_size,
            chunk_size,
            cell_size: 0.25,
        })
        .expect("grid")
    }

    #[test]
    fn zero_sizes_are_rejected_at_build_time() {
        let err = ChunkGrid::build(&TerrainConfig {
            terrain_size: 64,
            chunk_size: 0,
            cell_size: 0.25,
        })
        .unwrap_err();
        assert_eq!(err, TerrainError::ZeroChunkSize);

        let err = ChunkGrid::build(&TerrainConfig {
            terrain_size: 0,
            chunk_size: 9,
            cell_size: 0.25,
        })
        .unwrap_err();
        assert_eq!(err, TerrainError::ZeroTerrainSize);
    }

    #[test]
    fn evenly_divisible_terrain_has_only_full_chunks() {
        let g = grid(36, 9);
        assert_eq!(g.len(), 16);
        assert_eq!(
            g.shape_counts(),
            ShapeCounts {
                full: 16,
                ..Default::default()
            }
        );
        assert_eq!(g.canonical().full, Some(ChunkHandle(0)));
        assert_eq!(g.canonical().right_edge, None);
    }

    #[test]
    fn chunks_tile_without_gaps() {
        let g = grid(20, 9);
        assert_eq!((g.chunks_x(), g.chunks_y()), (3, 3));

        let mut covered = 0;
        for handle in g.handles() {
            let chunk = g.chunk(handle).unwrap();
            let coord = g.coord_of(handle).unwrap();
            let expected_origin = Vec3::new(coord.x as f32 * 2.25, 0.0, coord.y as f32 * 2.25);
            assert_eq!(chunk.origin(), expected_origin);
            covered += chunk.size_in_quads().x * chunk.size_in_quads().y;
        }
        assert_eq!(covered, 20 * 20);

        let corner = g.chunk(g.handle_at(2, 2).unwrap()).unwrap();
        assert_eq!(corner.size_in_quads(), UVec2::new(2, 2));
        assert_eq!(corner.world_bounds().max, Vec3::new(5.0, 0.0, 5.0));
    }

    #[test]
    fn partial_chunks_sit_on_the_last_column_and_row() {
        let g = grid(20, 9);
        assert_eq!(g.shape(g.handle_at(2, 0).unwrap()), Some(ChunkShape::RightEdge));
        assert_eq!(g.shape(g.handle_at(0, 2).unwrap()), Some(ChunkShape::TopEdge));
        assert_eq!(g.shape(g.handle_at(2, 2).unwrap()), Some(ChunkShape::Corner));
        assert_eq!(g.canonical().right_edge, g.handle_at(2, 0));
        assert_eq!(g.canonical().top_edge, g.handle_at(0, 2));
    }

    #[test]
    fn clones_match_their_canonical_chunk_modulo_translation() {
        let g = grid(40, 9);
        let canonical = g.canonical();
        for handle in g.handles() {
            let source = match g.shape(handle).unwrap() {
                ChunkShape::Full => canonical.full,
                ChunkShape::RightEdge => canonical.right_edge,
                ChunkShape::TopEdge => canonical.top_edge,
                ChunkShape::Corner => continue,
            }
            .unwrap();
            let a = g.chunk(handle).unwrap();
            let b = g.chunk(source).unwrap();
            assert_eq!(a.positions(), b.positions());
            assert_eq!(a.uvs(), b.uvs());
            assert_eq!(a.indices(), b.indices());
            if handle != source {
                assert_ne!(a.origin(), b.origin());
            }
        }
    }

    #[test]
    fn editing_a_clone_leaves_its_canonical_untouched() {
        let mut g = grid(27, 9);
        let clone = g.handle_at(1, 1).unwrap();
        g.set_vertex_height(clone, 40, 1.5).expect("set");
        assert_eq!(g.chunk(clone).unwrap().height(40), Some(1.5));
        assert_eq!(g.chunk(ChunkHandle(0)).unwrap().height(40), Some(0.0));
    }

    #[test]
    fn world_lookups() {
        let g = grid(20, 9);
        // Chunk world size is 2.25.
        assert_eq!(g.world_to_chunk(Vec3::new(0.1, 3.0, 0.1)), Some(ChunkHandle(0)));
        assert_eq!(g.world_to_chunk(Vec3::new(2.3, 0.0, 4.6)), g.handle_at(1, 2));
        assert_eq!(g.world_to_chunk(Vec3::new(5.0, 0.0, 5.0)), g.handle_at(2, 2));
        assert_eq!(g.world_to_chunk(Vec3::new(-0.1, 0.0, 1.0)), None);
        assert_eq!(g.world_to_chunk(Vec3::new(5.1, 0.0, 1.0)), None);

        let h = g.handle_at(1, 0).unwrap();
        // Local (0.26, 0.49) rounds to vertex (1, 2) of a 10-vertex-wide chunk.
        assert_eq!(g.world_to_vertex(h, Vec3::new(2.51, 0.0, 0.49)), Some(21));
        assert_eq!(g.world_to_vertex(h, Vec3::new(0.0, 0.0, 0.0)), None);
    }

    #[test]
    fn sampled_height_tracks_edits() {
        let mut g = grid(18, 9);
        assert_eq!(g.sample_height_at(1.0, 1.0), Some(0.0));
        let h = g.handle_at(1, 1).unwrap();
        let v = g.world_to_vertex(h, Vec3::new(3.0, 0.0, 3.0)).unwrap();
        g.set_vertex_height(h, v, 2.0).expect("set");
        assert_eq!(g.sample_height_at(3.0, 3.0), Some(2.0));
        assert_eq!(g.sample_height_at(-1.0, 3.0), None);
    }

    #[test]
    fn out_of_range_handles_are_errors() {
        let mut g = grid(9, 9);
        assert_eq!(
            g.apply_brush(ChunkHandle(3), Vec3::ZERO, 1.0, 1.0, f32::INFINITY),
            Err(TerrainError::ChunkOutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn take_dirty_drains() {
        let mut g = grid(18, 9);
        assert_eq!(g.take_dirty().len(), 4);
        assert!(g.take_dirty().is_empty());
        g.apply_brush(ChunkHandle(3), Vec3::new(3.0, 0.0, 3.0), 0.5, 1.0, f32::INFINITY)
            .expect("brush");
        assert_eq!(g.take_dirty(), vec![ChunkHandle(3)]);
    }

    #[test]
    fn capacity_estimate_covers_the_brush_footprint() {
        let g = grid(71, 9);
        assert_eq!(g.max_chunks_in_radius(0.5), 4);
        assert_eq!(g.max_chunks_in_radius(2.0), 9);
        assert_eq!(g.max_chunks_in_radius(100.0), 64);
    }
}
