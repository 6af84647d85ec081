//! Normal averaging across chunk seams.
//!
//! Every chunk computes normals from its own triangles only, so a vertex on a
//! shared edge ends up with two different normals, one per chunk. Averaging them
//! hides the seam. The average is built from each chunk's surface normals, so a
//! pass only depends on geometry and repeating it changes nothing.
//!
//! Vertices shared by four chunks are only averaged pairwise, by whichever
//! adjacencies touch them last. Chunks are marked dirty by what a whole pass
//! leaves behind, not by those intermediate writes.

use glam::Vec3;

use crate::chunk::HeightfieldChunk;
use crate::grid::ChunkGrid;
use crate::types::ChunkHandle;

/// Unit-length average of two seam normals.
pub fn seam_normal(a: Vec3, b: Vec3) -> Vec3 {
    ((a + b) * 0.5).normalize_or(Vec3::Y)
}

/// Averages the top row of `south` with the bottom row of `north`.
/// Returns whether any rendered normal changed.
pub fn reconcile_north_pair(south: &mut HeightfieldChunk, north: &mut HeightfieldChunk) -> bool {
    let changed = average_north_row(south, north);
    if changed {
        south.mark_dirty();
        north.mark_dirty();
    }
    changed
}

/// Averages the right column of `west` with the left column of `east`.
/// Returns whether any rendered normal changed.
pub fn reconcile_east_pair(west: &mut HeightfieldChunk, east: &mut HeightfieldChunk) -> bool {
    let changed = average_east_column(west, east);
    if changed {
        west.mark_dirty();
        east.mark_dirty();
    }
    changed
}

fn average_north_row(south: &mut HeightfieldChunk, north: &mut HeightfieldChunk) -> bool {
    let sv = south.size_in_verts();
    let nv = north.size_in_verts();
    debug_assert_eq!(sv.x, nv.x, "north/south neighbours must share their width");

    let top_row = (sv.x * (sv.y - 1)) as usize;
    let mut changed = false;
    for i in 0..sv.x.min(nv.x) as usize {
        let avg = seam_normal(south.surface_normals()[top_row + i], north.surface_normals()[i]);
        changed |= south.write_normal(top_row + i, avg);
        changed |= north.write_normal(i, avg);
    }
    changed
}

fn average_east_column(west: &mut HeightfieldChunk, east: &mut HeightfieldChunk) -> bool {
    let wv = west.size_in_verts();
    let ev = east.size_in_verts();
    debug_assert_eq!(wv.y, ev.y, "east/west neighbours must share their height");

    let mut changed = false;
    for i in 0..wv.y.min(ev.y) {
        let w = (i * wv.x + (wv.x - 1)) as usize;
        let e = (i * ev.x) as usize;
        let avg = seam_normal(west.surface_normals()[w], east.surface_normals()[e]);
        changed |= west.write_normal(w, avg);
        changed |= east.write_normal(e, avg);
    }
    changed
}

/// One adjacency between two chunks, by chunk index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Seam {
    North { south: usize, north: usize },
    East { west: usize, east: usize },
}

impl Seam {
    fn chunks(self) -> [usize; 2] {
        match self {
            Seam::North { south, north } => [south, north],
            Seam::East { west, east } => [west, east],
        }
    }
}

// Inner chunks fix their north and east seams, the top row only east, the
// right column only north. That visits each adjacency once.
fn seams_in_sweep_order(cx: usize, cy: usize) -> Vec<Seam> {
    let mut seams = Vec::new();
    for y in 0..cy.saturating_sub(1) {
        for x in 0..cx.saturating_sub(1) {
            let i = y * cx + x;
            seams.push(Seam::North { south: i, north: i + cx });
            seams.push(Seam::East { west: i, east: i + 1 });
        }
    }
    if cy > 0 {
        for x in 0..cx.saturating_sub(1) {
            let i = (cy - 1) * cx + x;
            seams.push(Seam::East { west: i, east: i + 1 });
        }
    }
    if cx > 0 {
        for y in 0..cy.saturating_sub(1) {
            let i = y * cx + cx - 1;
            seams.push(Seam::North { south: i, north: i + cx });
        }
    }
    seams
}

impl ChunkGrid {
    /// Reconciles every seam in the grid. Returns how many adjacencies were visited.
    pub fn reconcile_seams(&mut self) -> usize {
        self.sweep_seams(|_, _| true)
    }

    /// Reconciles only the seams that touch at least one of `affected`.
    pub fn reconcile_seams_around(&mut self, affected: &[ChunkHandle]) -> usize {
        if affected.is_empty() {
            return 0;
        }
        let mut mask = vec![false; self.len()];
        for handle in affected {
            if let Some(slot) = mask.get_mut(handle.index()) {
                *slot = true;
            }
        }
        self.sweep_seams(|a, b| mask[a] || mask[b])
    }

    fn sweep_seams(&mut self, include: impl Fn(usize, usize) -> bool) -> usize {
        let seams: Vec<Seam> = seams_in_sweep_order(self.chunks_x() as usize, self.chunks_y() as usize)
            .into_iter()
            .filter(|seam| {
                let [a, b] = seam.chunks();
                include(a, b)
            })
            .collect();
        let chunks = self.chunks_mut();

        let mut before: Vec<Option<Vec<Vec3>>> = vec![None; chunks.len()];
        for seam in &seams {
            for i in seam.chunks() {
                if before[i].is_none() {
                    before[i] = Some(chunks[i].normals().to_vec());
                }
            }
        }

        for seam in &seams {
            match *seam {
                Seam::North { south, north } => {
                    let (s, n) = pair_mut(chunks, south, north);
                    average_north_row(s, n);
                }
                Seam::East { west, east } => {
                    let (w, e) = pair_mut(chunks, west, east);
                    average_east_column(w, e);
                }
            }
        }

        for (chunk, snapshot) in chunks.iter_mut().zip(before) {
            if snapshot.is_some_and(|old| chunk.normals() != old.as_slice()) {
                chunk.mark_dirty();
            }
        }

        seams.len()
    }
}

fn pair_mut<T>(items: &mut [T], lo: usize, hi: usize) -> (&mut T, &mut T) {
    debug_assert!(lo < hi);
    let (head, tail) = items.split_at_mut(hi);
    (&mut head[lo], &mut tail[0])
}
