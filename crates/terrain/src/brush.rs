use glam::Vec3;

use crate::query::PointerRay;
use crate::types::{BrushConfig, ChunkHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BrushDirection {
    #[default]
    Raise,
    Lower,
}

impl BrushDirection {
    pub fn sign(self) -> f32 {
        match self {
            BrushDirection::Raise => 1.0,
            BrushDirection::Lower => -1.0,
        }
    }
}

/// Pointer and modifier state sampled once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerInput {
    pub ray: Option<PointerRay>,
    pub primary_held: bool,
    /// Flips the brush to lowering.
    pub lower_modifier_held: bool,
    /// Routes scrolling to the brush radius instead of the camera.
    pub precision_modifier_held: bool,
    pub scroll_delta: f32,
}

impl PointerInput {
    /// Scroll left over for the camera once the brush has had its share.
    pub fn camera_scroll(&self) -> f32 {
        if self.precision_modifier_held {
            0.0
        } else {
            self.scroll_delta
        }
    }
}

#[derive(Clone, Debug)]
pub struct BrushState {
    radius: f32,
    min_radius: f32,
    max_radius: f32,
    radius_scroll_step: f32,
    /// Height change per second at the brush centre.
    pub strength: f32,
    pub max_height: f32,
    pub direction: BrushDirection,
    /// Terrain point under the pointer this frame.
    pub center: Option<Vec3>,
    /// Chunks the last spatial query returned.
    pub affected: Vec<ChunkHandle>,
}

impl BrushState {
    pub fn from_config(config: &BrushConfig) -> Self {
        let mut brush = Self {
            radius: config.initial_radius,
            min_radius: config.min_radius,
            max_radius: config.max_radius,
            radius_scroll_step: config.radius_scroll_step,
            strength: config.strength_per_second,
            max_height: config.max_height_or_unbounded(),
            direction: BrushDirection::Raise,
            center: None,
            affected: Vec::new(),
        };
        brush.set_radius(config.initial_radius);
        brush
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn radius_range(&self) -> (f32, f32) {
        (self.min_radius, self.max_radius)
    }

    /// Clamps into the configured range. Returns whether the radius changed.
    pub fn set_radius(&mut self, radius: f32) -> bool {
        let clamped = if radius.is_nan() {
            self.radius
        } else {
            radius.clamp(self.min_radius, self.max_radius)
        };
        let changed = clamped != self.radius;
        self.radius = clamped;
        changed
    }

    /// Takes direction and radius changes from this frame's input.
    /// Returns whether the radius changed.
    pub fn apply_input(&mut self, input: &PointerInput) -> bool {
        self.direction = if input.lower_modifier_held {
            BrushDirection::Lower
        } else {
            BrushDirection::Raise
        };

        if input.precision_modifier_held && input.scroll_delta != 0.0 {
            return self.set_radius(self.radius + input.scroll_delta * self.radius_scroll_step);
        }
        false
    }

    /// Signed height change at the brush centre for a stroke lasting `elapsed` seconds.
    pub fn stroke_amount(&self, elapsed: f32) -> f32 {
        self.direction.sign() * self.strength * elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brush() -> BrushState {
        BrushState::from_config(&BrushConfig::default())
    }

    #[test]
    fn defaults_come_from_config() {
        let b = brush();
        assert_eq!(b.radius(), 2.0);
        assert_eq!(b.radius_range(), (0.25, 10.0));
        assert_eq!(b.max_height, f32::INFINITY);
        assert_eq!(b.direction, BrushDirection::Raise);
    }

    #[test]
    fn lower_modifier_inverts_the_stroke() {
        let mut b = brush();
        b.apply_input(&PointerInput {
            lower_modifier_held: true,
            ..Default::default()
        });
        assert_eq!(b.stroke_amount(0.5), -1.0);

        b.apply_input(&PointerInput::default());
        assert_eq!(b.stroke_amount(0.5), 1.0);
    }

    #[test]
    fn scroll_resizes_only_with_precision_modifier() {
        let mut b = brush();
        let plain = PointerInput {
            scroll_delta: 3.0,
            ..Default::default()
        };
        assert!(!b.apply_input(&plain));
        assert_eq!(b.radius(), 2.0);
        assert_eq!(plain.camera_scroll(), 3.0);

        let precise = PointerInput {
            scroll_delta: 2.0,
            precision_modifier_held: true,
            ..Default::default()
        };
        assert!(b.apply_input(&precise));
        assert_eq!(b.radius(), 2.5);
        assert_eq!(precise.camera_scroll(), 0.0);
    }

    #[test]
    fn radius_is_clamped() {
        let mut b = brush();
        b.set_radius(50.0);
        assert_eq!(b.radius(), 10.0);
        b.set_radius(0.0);
        assert_eq!(b.radius(), 0.25);
        assert!(!b.set_radius(f32::NAN));
        assert_eq!(b.radius(), 0.25);
    }
}
