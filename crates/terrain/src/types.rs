use bevy::prelude::*;
use glam::UVec2;
use serde::Deserialize;
use std::path::Path;

/// Where the app looks for its sculpt settings.
pub const DEFAULT_CONFIG_PATH: &str = "assets/sculpt.ron";

// --- Config ---

#[derive(Resource, Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SculptConfig {
    pub terrain: TerrainConfig,
    pub brush: BrushConfig,
    pub camera: CameraConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Terrain edge length in cells. The terrain is always square.
    pub terrain_size: u32,
    /// Quads per edge of a full chunk.
    pub chunk_size: u32,
    /// World-space edge length of one cell.
    pub cell_size: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            terrain_size: 64,
            chunk_size: 9,
            cell_size: 0.25,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrushConfig {
    pub initial_radius: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Height change per second at the brush centre.
    pub strength_per_second: f32,
    /// Heights above this are clamped while sculpting. `None` means unbounded.
    pub max_height: Option<f32>,
    /// Radius change per scroll notch while the precision modifier is held.
    pub radius_scroll_step: f32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            initial_radius: 2.0,
            min_radius: 0.25,
            max_radius: 10.0,
            strength_per_second: 2.0,
            max_height: None,
            radius_scroll_step: 0.25,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub move_speed: f32,
    pub zoom_per_scroll: f32,
    pub start_height: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            zoom_per_scroll: 0.1,
            start_height: 6.0,
        }
    }
}

impl TerrainConfig {
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.terrain_size == 0 {
            return Err(TerrainError::ZeroTerrainSize);
        }
        if self.chunk_size == 0 {
            return Err(TerrainError::ZeroChunkSize);
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(TerrainError::InvalidCellSize(self.cell_size));
        }
        Ok(())
    }

    /// Number of chunks along one axis (the terrain is square).
    pub fn chunks_per_axis(&self) -> u32 {
        self.terrain_size.div_ceil(self.chunk_size.max(1))
    }
}

impl BrushConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_radius.is_finite() || self.min_radius <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "brush min_radius must be positive, got {}",
                self.min_radius
            )));
        }
        if !self.max_radius.is_finite() || self.max_radius < self.min_radius {
            return Err(ConfigError::Invalid(format!(
                "brush max_radius ({}) must be >= min_radius ({})",
                self.max_radius, self.min_radius
            )));
        }
        if !(self.min_radius..=self.max_radius).contains(&self.initial_radius) {
            return Err(ConfigError::Invalid(format!(
                "brush initial_radius {} is outside [{}, {}]",
                self.initial_radius, self.min_radius, self.max_radius
            )));
        }
        if !self.strength_per_second.is_finite() {
            return Err(ConfigError::Invalid(
                "brush strength_per_second must be finite".to_string(),
            ));
        }
        if !self.radius_scroll_step.is_finite() || self.radius_scroll_step < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "brush radius_scroll_step must be >= 0, got {}",
                self.radius_scroll_step
            )));
        }
        if self.max_height.is_some_and(f32::is_nan) {
            return Err(ConfigError::Invalid("brush max_height is NaN".to_string()));
        }
        Ok(())
    }

    pub fn max_height_or_unbounded(&self) -> f32 {
        self.max_height.unwrap_or(f32::INFINITY)
    }
}

impl SculptConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.terrain.validate()?;
        self.brush.validate()?;
        if !self.camera.move_speed.is_finite() || !self.camera.zoom_per_scroll.is_finite() {
            return Err(ConfigError::Invalid(
                "camera speeds must be finite".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: SculptConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_ron_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Loads the config, falling back to defaults when the file is missing or broken.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_from_ron_file(path) {
            Ok(config) => {
                info!("loaded sculpt config from {}", path.display());
                config
            }
            Err(ConfigError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                warn!("{} not found, using default sculpt config", path.display());
                Self::default()
            }
            Err(e) => {
                error!("{e}; using default sculpt config");
                Self::default()
            }
        }
    }
}

// --- Errors ---

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TerrainError {
    #[error("terrain size must be at least one cell")]
    ZeroTerrainSize,
    #[error("chunk size must be at least one quad")]
    ZeroChunkSize,
    #[error("cell size must be finite and positive, got {0}")]
    InvalidCellSize(f32),
    #[error("cannot adopt a chunk with cell size {found} as one with cell size {expected}")]
    CellSizeMismatch { expected: f32, found: f32 },
    #[error("chunk of {width}x{height} quads has no area")]
    DegenerateChunk { width: u32, height: u32 },
    #[error("cannot adopt a {found}-quad chunk as a {expected}-quad chunk")]
    ShapeMismatch { expected: UVec2, found: UVec2 },
    #[error("vertex {index} out of range for chunk with {len} vertices")]
    VertexOutOfRange { index: usize, len: usize },
    #[error("chunk {index} out of range for grid with {len} chunks")]
    ChunkOutOfRange { index: usize, len: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse sculpt config ron: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("invalid sculpt config: {0}")]
    Invalid(String),
    #[error("invalid terrain config: {0}")]
    Terrain(#[from] TerrainError),
}

// --- Handles ---

/// Index of a chunk inside its [`crate::ChunkGrid`]; `y * chunks_x + x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkHandle(pub u32);

impl ChunkHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Shape class of a chunk. Chunks in the last column and row can be partial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkShape {
    Full,
    RightEdge,
    TopEdge,
    Corner,
}

impl ChunkShape {
    pub fn classify(width: u32, height: u32, chunk_size: u32) -> Result<Self, TerrainError> {
        if width == 0 || height == 0 || width > chunk_size || height > chunk_size {
            return Err(TerrainError::DegenerateChunk { width, height });
        }
        let full_w = width == chunk_size;
        let full_h = height == chunk_size;
        Ok(match (full_w, full_h) {
            (true, true) => ChunkShape::Full,
            (false, true) => ChunkShape::RightEdge,
            (true, false) => ChunkShape::TopEdge,
            (false, false) => ChunkShape::Corner,
        })
    }
}
