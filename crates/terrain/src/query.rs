use glam::{Vec3, Vec3Swizzles};

use crate::grid::ChunkGrid;
use crate::types::ChunkHandle;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl PointerRay {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Spatial queries the editor needs against the terrain surface.
///
/// Implementations may ignore `grid` and query a physics world instead.
pub trait TerrainSpatialQuery {
    /// Nearest point where `ray` meets the terrain.
    fn raycast(&self, grid: &ChunkGrid, ray: PointerRay) -> Option<Vec3>;

    /// Clears `out` and fills it with every chunk the brush at `center` can
    /// reach, that is every chunk holding a vertex within `radius` of it
    /// horizontally. Callers reserve capacity beforehand.
    fn overlap_sphere(&self, grid: &ChunkGrid, center: Vec3, radius: f32, out: &mut Vec<ChunkHandle>);
}

/// Queries the heightfield directly: ray marching for the hit, chunk footprints
/// on the XZ plane for the overlap.
#[derive(Clone, Copy, Debug)]
pub struct HeightfieldQuery {
    pub max_distance: f32,
    /// Bisection steps once the ray has been bracketed.
    pub refine_steps: u32,
}

impl Default for HeightfieldQuery {
    fn default() -> Self {
        Self {
            max_distance: 1_000.0,
            refine_steps: 12,
        }
    }
}

impl TerrainSpatialQuery for HeightfieldQuery {
    fn raycast(&self, grid: &ChunkGrid, ray: PointerRay) -> Option<Vec3> {
        let direction = ray.direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }
        let ray = PointerRay {
            origin: ray.origin,
            direction,
        };

        // Only march the stretch of the ray that is over the terrain.
        let (t_enter, t_exit) = clip_to_extent(ray, grid.world_extent())?;
        let t_max = t_exit.min(self.max_distance);
        if t_enter > t_max {
            return None;
        }

        let below = |p: Vec3| grid.sample_height_at(p.x, p.z).filter(|h| p.y <= *h);

        let step = (grid.cell_size() * 0.5).clamp(0.01, 2.0);
        if below(ray.at(t_enter)).is_some() {
            // Started under the surface; report the point straight above.
            let p = ray.at(t_enter);
            return grid.sample_height_at(p.x, p.z).map(|h| Vec3::new(p.x, h, p.z));
        }

        let mut prev_t = t_enter;
        let mut t = t_enter;
        while t < t_max {
            t = (t + step).min(t_max);
            if below(ray.at(t)).is_none() {
                prev_t = t;
                continue;
            }

            // Bracketed: prev is above, current is below.
            let mut lo = prev_t;
            let mut hi = t;
            for _ in 0..self.refine_steps {
                let mid = 0.5 * (lo + hi);
                if below(ray.at(mid)).is_some() {
                    hi = mid;
                } else {
                    lo = mid;
                }
            }

            let p = ray.at(hi);
            let h = grid.sample_height_at(p.x, p.z)?;
            return Some(Vec3::new(p.x, h, p.z));
        }

        None
    }

    fn overlap_sphere(&self, grid: &ChunkGrid, center: Vec3, radius: f32, out: &mut Vec<ChunkHandle>) {
        out.clear();
        if !(radius > 0.0) {
            return;
        }

        let cs = grid.chunk_world_size();
        let last_x = grid.chunks_x().saturating_sub(1) as i64;
        let last_y = grid.chunks_y().saturating_sub(1) as i64;
        let lo = ((center.xz() - radius) / cs).floor();
        let hi = ((center.xz() + radius) / cs).floor();
        let (x0, x1) = ((lo.x as i64).max(0), (hi.x as i64).min(last_x));
        let (y0, y1) = ((lo.y as i64).max(0), (hi.y as i64).min(last_y));

        // Height is ignored: the brush picks vertices by horizontal distance,
        // and a neighbour left out here would tear away from the shared seam.
        let r2 = radius * radius;
        let center = center.xz();
        for y in y0..=y1 {
            for x in x0..=x1 {
                let Some(handle) = grid.handle_at(x as u32, y as u32) else {
                    continue;
                };
                let Some(chunk) = grid.chunk(handle) else {
                    continue;
                };
                let bounds = chunk.world_bounds();
                let nearest = center.clamp(bounds.min.xz(), bounds.max.xz());
                if nearest.distance_squared(center) < r2 {
                    out.push(handle);
                }
            }
        }
    }
}

/// Parameter range where the ray is above the terrain's XZ square.
fn clip_to_extent(ray: PointerRay, extent: f32) -> Option<(f32, f32)> {
    let mut t_enter = 0.0f32;
    let mut t_exit = f32::INFINITY;
    for (o, d) in [(ray.origin.x, ray.direction.x), (ray.origin.z, ray.direction.z)] {
        if d.abs() < 1e-8 {
            if o < 0.0 || o > extent {
                return None;
            }
            continue;
        }
        let a = (0.0 - o) / d;
        let b = (extent - o) / d;
        t_enter = t_enter.max(a.min(b));
        t_exit = t_exit.min(a.max(b));
    }
    if t_enter > t_exit {
        return None;
    }
    Some((t_enter, t_exit))
}
