pub mod logger;

use nalgebra::{Point2, Rotation2, Vector2};

/// Evenly spaced targets on a circle, starting at 0° and going counterclockwise
/// on screen (screen y grows downwards, hence the negated sine).
pub fn target_positions(count: usize, distance: f32, center: Point2<f32>) -> Vec<Point2<f32>> {
    let step = 360.0 / count as f32;
    (0..count)
        .map(|i| {
            let theta = (i as f32 * step).to_radians();
            center + Vector2::new(theta.cos(), -theta.sin()) * distance
        })
        .collect()
}

pub fn neighbours(index: usize, count: usize) -> [usize; 2] { [(index + count - 1) % count, (index + 1) % count] }

/// Rotates `point` about `center` by `angle_degrees`.
pub fn apply_rotation(point: Point2<f32>, angle_degrees: f32, center: Point2<f32>) -> Point2<f32> {
    let rot = Rotation2::new(angle_degrees.to_radians());
    center + rot * (point - center)
}

/// Absolute difference of the two `atan2` directions, in degrees. Not wrapped,
/// so it can exceed 180° when the directions straddle the ±180° seam.
pub fn raw_directional_error(target: Point2<f32>, reversal: Point2<f32>, center: Point2<f32>) -> f32 {
    let t = target - center;
    let r = reversal - center;
    (t.y.atan2(t.x) - r.y.atan2(r.x)).abs().to_degrees()
}

/// Same as [`raw_directional_error`] but reduced to `[0, 180]`.
pub fn directional_error(target: Point2<f32>, reversal: Point2<f32>, center: Point2<f32>) -> f32 {
    let raw = raw_directional_error(target, reversal, center);
    if raw > 180.0 { 360.0 - raw } else { raw }
}

/// Target layout, computed once per session.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetRing {
    pub center: Point2<f32>,
    pub distance: f32,
    positions: Vec<Point2<f32>>,
}

impl TargetRing {
    pub fn new(count: usize, distance: f32, center: Point2<f32>) -> Self {
        Self { center, distance, positions: target_positions(count, distance, center) }
    }

    pub fn len(&self) -> usize { self.positions.len() }

    pub fn position(&self, index: usize) -> Point2<f32> { self.positions[index] }

    pub fn positions(&self) -> &[Point2<f32>] { &self.positions }

    pub fn neighbours(&self, index: usize) -> [usize; 2] { neighbours(index, self.len()) }

    pub fn error(&self, target: usize, reversal: Point2<f32>, wrap: bool) -> f32 {
        if wrap {
            directional_error(self.position(target), reversal, self.center)
        } else {
            raw_directional_error(self.position(target), reversal, self.center)
        }
    }
}
