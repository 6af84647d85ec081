use bevy::log::{debug, warn_once};
use glam::Vec3;

use crate::brush::{BrushState, PointerInput};
use crate::grid::ChunkGrid;
use crate::query::TerrainSpatialQuery;
use crate::types::{ChunkHandle, SculptConfig, TerrainError};

/// Receives the brush position and radius each frame, usually to feed a shader
/// or a highlight.
pub trait BrushUniformSink {
    /// Returns `false` when there was nothing to write to. The stroke goes ahead
    /// regardless.
    fn write_brush(&mut self, hit: Vec3, radius: f32) -> bool;

    /// Called on frames where the pointer is not over the terrain.
    fn clear_brush(&mut self) {}
}

/// What one call to [`TerrainEditor::tick`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StrokeReport {
    pub hit: Option<Vec3>,
    pub radius_changed: bool,
    pub chunks_touched: usize,
    pub vertices_touched: usize,
    pub seams_reconciled: usize,
}

impl StrokeReport {
    pub fn edited(&self) -> bool {
        self.vertices_touched > 0
    }
}

/// Owns the chunk grid and the brush, and runs one stroke step per frame.
#[derive(Clone, Debug)]
pub struct TerrainEditor {
    grid: ChunkGrid,
    brush: BrushState,
}

impl TerrainEditor {
    pub fn new(config: &SculptConfig) -> Result<Self, TerrainError> {
        let mut grid = ChunkGrid::build(&config.terrain)?;
        grid.reconcile_seams();

        let mut brush = BrushState::from_config(&config.brush);
        let capacity = grid.max_chunks_in_radius(brush.radius());
        brush.affected.reserve(capacity);

        Ok(Self { grid, brush })
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut ChunkGrid {
        &mut self.grid
    }

    pub fn brush(&self) -> &BrushState {
        &self.brush
    }

    pub fn brush_mut(&mut self) -> &mut BrushState {
        &mut self.brush
    }

    pub fn take_dirty(&mut self) -> Vec<ChunkHandle> {
        self.grid.take_dirty()
    }

    /// Runs one frame: radius and direction from `input`, the hit under the
    /// pointer, then, while the primary button is held, a stroke of `elapsed`
    /// seconds over every chunk the brush overlaps, followed by seam
    /// reconciliation around them.
    pub fn tick(
        &mut self,
        input: &PointerInput,
        elapsed: f32,
        query: &impl TerrainSpatialQuery,
        sink: &mut impl BrushUniformSink,
    ) -> Result<StrokeReport, TerrainError> {
        let mut report = StrokeReport {
            radius_changed: self.brush.apply_input(input),
            ..Default::default()
        };

        let hit = input.ray.and_then(|ray| query.raycast(&self.grid, ray));
        self.brush.center = hit;
        let Some(hit) = hit else {
            self.brush.affected.clear();
            sink.clear_brush();
            return Ok(report);
        };
        report.hit = Some(hit);

        let radius = self.brush.radius();
        if !sink.write_brush(hit, radius) {
            warn_once!("brush uniforms have no target; highlight disabled");
        }

        if !input.primary_held {
            return Ok(report);
        }
        let amount = self.brush.stroke_amount(elapsed);
        if amount == 0.0 {
            return Ok(report);
        }

        let needed = self.grid.max_chunks_in_radius(radius);
        let affected = &mut self.brush.affected;
        if affected.capacity() < needed {
            affected.reserve(needed - affected.len());
        }
        query.overlap_sphere(&self.grid, hit, radius, affected);

        for &handle in affected.iter() {
            let touched = self
                .grid
                .apply_brush(handle, hit, radius, amount, self.brush.max_height)?;
            if touched > 0 {
                report.chunks_touched += 1;
                report.vertices_touched += touched;
            }
        }
        report.seams_reconciled = self.grid.reconcile_seams_around(affected);

        debug!(
            "brush stroke at {:?} r={} amount={:.4}: {} chunks, {} vertices, {} seams",
            hit,
            radius,
            amount,
            report.chunks_touched,
            report.vertices_touched,
            report.seams_reconciled,
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{HeightfieldQuery, PointerRay};
    use crate::types::TerrainConfig;

    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<(Vec3, f32)>,
        clears: usize,
    }

    impl BrushUniformSink for RecordingSink {
        fn write_brush(&mut self, hit: Vec3, radius: f32) -> bool {
            self.writes.push((hit, radius));
            true
        }

        fn clear_brush(&mut self) {
            self.clears += 1;
        }
    }

    struct NoTarget;

    impl BrushUniformSink for NoTarget {
        fn write_brush(&mut self, _: Vec3, _: f32) -> bool {
            false
        }
    }

    /// Returns a fixed hit and a fixed set of chunks, whatever the ray.
    struct FixedQuery {
        hit: Vec3,
        chunks: Vec<ChunkHandle>,
    }

    impl TerrainSpatialQuery for FixedQuery {
        fn raycast(&self, _: &ChunkGrid, _: PointerRay) -> Option<Vec3> {
            Some(self.hit)
        }

        fn overlap_sphere(&self, _: &ChunkGrid, _: Vec3, _: f32, out: &mut Vec<ChunkHandle>) {
            out.clear();
            out.extend_from_slice(&self.chunks);
        }
    }

    fn config(terrain_size: u32) -> SculptConfig {
        SculptConfig {
            terrain: TerrainConfig {
                terrain_size,
                chunk_size: 9,
                cell_size: 0.25,
            },
            ..Default::default()
        }
    }

    fn pressing_down_at(x: f32, z: f32) -> PointerInput {
        PointerInput {
            ray: Some(PointerRay {
                origin: Vec3::new(x, 20.0, z),
                direction: Vec3::NEG_Y,
            }),
            primary_held: true,
            ..Default::default()
        }
    }

    fn height_at(editor: &TerrainEditor, x: f32, z: f32) -> f32 {
        editor.grid().sample_height_at(x, z).expect("on terrain")
    }

    #[test]
    fn one_second_stroke_raises_the_centre_by_strength() {
        let mut editor = TerrainEditor::new(&config(71)).expect("editor");
        let query = HeightfieldQuery::default();
        let mut sink = RecordingSink::default();
        let input = pressing_down_at(5.0, 5.0);

        for _ in 0..60 {
            editor
                .tick(&input, 1.0 / 60.0, &query, &mut sink)
                .expect("tick");
        }

        assert!((height_at(&editor, 5.0, 5.0) - 2.0).abs() < 1e-4);
        assert_eq!(sink.writes.len(), 60);
        assert!(sink.writes.iter().all(|(_, r)| *r == 2.0));
        // Far outside the radius nothing moved.
        assert_eq!(height_at(&editor, 10.0, 10.0), 0.0);
    }

    #[test]
    fn stroke_reconciles_seams_of_the_affected_region() {
        let mut editor = TerrainEditor::new(&config(27)).expect("editor");
        let report = editor
            .tick(&pressing_down_at(2.25, 2.25), 0.5, &HeightfieldQuery::default(), &mut NoTarget)
            .expect("tick");

        assert_eq!(report.chunks_touched, 4);
        assert!(report.seams_reconciled >= 4);

        let grid = editor.grid();
        let south = grid.chunk(grid.handle_at(0, 0).unwrap()).unwrap();
        let north = grid.chunk(grid.handle_at(0, 1).unwrap()).unwrap();
        // The last vertex is a four-way corner, averaged pairwise.
        for i in 0..9 {
            assert_eq!(south.normals()[90 + i], north.normals()[i]);
        }
    }

    #[test]
    fn brushing_a_peak_moves_the_flat_neighbour_with_it() {
        let mut editor = TerrainEditor::new(&config(18)).expect("editor");
        let west = editor.grid().handle_at(0, 0).unwrap();
        let east = editor.grid().handle_at(1, 0).unwrap();
        let peak = editor.grid().chunk(west).unwrap().vertex_index(6, 4).unwrap();
        editor
            .grid_mut()
            .set_vertex_height(west, peak, 10.0)
            .expect("raise");

        // The hit lands on top of the peak, 10 units above the east chunk.
        let report = editor
            .tick(&pressing_down_at(1.5, 1.0), 0.5, &HeightfieldQuery::default(), &mut NoTarget)
            .expect("tick");
        assert!(report.hit.is_some_and(|h| (h.y - 10.0).abs() < 1e-3));
        assert!(editor.brush().affected.contains(&east));

        let grid = editor.grid();
        let (w, e) = (grid.chunk(west).unwrap(), grid.chunk(east).unwrap());
        let mut raised = 0;
        for row in 0..10 {
            let shared_w = w.height(row * 10 + 9).unwrap();
            let shared_e = e.height(row * 10).unwrap();
            assert_eq!(shared_w, shared_e, "seam opened at row {row}");
            if shared_e > 0.0 {
                raised += 1;
            }
        }
        assert!(raised > 0);
    }

    #[test]
    fn lower_modifier_digs() {
        let mut editor = TerrainEditor::new(&config(27)).expect("editor");
        let query = HeightfieldQuery::default();
        let input = PointerInput {
            lower_modifier_held: true,
            ..pressing_down_at(3.0, 3.0)
        };

        editor.tick(&input, 0.25, &query, &mut NoTarget).expect("tick");
        assert!((height_at(&editor, 3.0, 3.0) + 0.5).abs() < 1e-4);
    }

    #[test]
    fn missing_hit_skips_the_frame() {
        let mut editor = TerrainEditor::new(&config(27)).expect("editor");
        editor.take_dirty();
        let mut sink = RecordingSink::default();

        let report = editor
            .tick(&pressing_down_at(-5.0, 3.0), 1.0, &HeightfieldQuery::default(), &mut sink)
            .expect("tick");

        assert_eq!(report, StrokeReport::default());
        assert!(sink.writes.is_empty());
        assert_eq!(sink.clears, 1);
        assert_eq!(editor.brush().center, None);
        assert!(editor.take_dirty().is_empty());
    }

    #[test]
    fn hovering_without_the_button_only_highlights() {
        let mut editor = TerrainEditor::new(&config(27)).expect("editor");
        editor.take_dirty();
        let mut sink = RecordingSink::default();
        let input = PointerInput {
            primary_held: false,
            ..pressing_down_at(3.0, 3.0)
        };

        let report = editor
            .tick(&input, 1.0, &HeightfieldQuery::default(), &mut sink)
            .expect("tick");

        assert_eq!(report.hit, Some(Vec3::new(3.0, 0.0, 3.0)));
        assert!(!report.edited());
        assert_eq!(sink.writes, vec![(Vec3::new(3.0, 0.0, 3.0), 2.0)]);
        assert!(editor.take_dirty().is_empty());
    }

    #[test]
    fn stale_handles_from_the_query_are_errors() {
        let mut editor = TerrainEditor::new(&config(27)).expect("editor");
        let query = FixedQuery {
            hit: Vec3::new(1.0, 0.0, 1.0),
            chunks: vec![ChunkHandle(0), ChunkHandle(42)],
        };

        let err = editor
            .tick(&pressing_down_at(1.0, 1.0), 0.1, &query, &mut NoTarget)
            .unwrap_err();
        assert_eq!(err, TerrainError::ChunkOutOfRange { index: 42, len: 9 });
    }

    #[test]
    fn affected_buffer_grows_with_the_radius() {
        let mut editor = TerrainEditor::new(&config(71)).expect("editor");
        let query = HeightfieldQuery::default();
        editor.brush_mut().set_radius(10.0);

        editor
            .tick(&pressing_down_at(8.875, 8.875), 0.01, &query, &mut NoTarget)
            .expect("tick");

        let brush = editor.brush();
        assert!(brush.affected.capacity() >= editor.grid().max_chunks_in_radius(10.0));
        // The whole 17.75-unit terrain fits within a 10-unit sphere around its middle.
        assert_eq!(brush.affected.len(), 64);
    }
}
