//! Axis-aligned bounds and quadrant classification shared by both quadtrees.
//!
//! A [`Bound`] is stored as center + half-extent. Containment is half-open
//! (`min` inclusive, `max` exclusive) so that a bound sitting exactly on a split
//! line lands in exactly one quadrant. Intersection is closed: touching edges
//! intersect.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle described by its center and half-extent.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Bound {
    /// Center of the rectangle.
    pub center: Vec2,
    /// Half of the width and height. Components are expected to be non-negative.
    pub half_extents: Vec2,
}

impl Bound {
    /// Creates a bound from center and half-extent.
    #[must_use]
    pub const fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self { center, half_extents }
    }

    /// Creates a square bound of half-extent `radius` around `center`.
    #[must_use]
    pub fn around(center: Vec2, radius: f32) -> Self {
        Self::new(center, Vec2::splat(radius))
    }

    /// Creates a bound spanning the two corners.
    #[must_use]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        let (lo, hi) = (min.min(max), min.max(max));
        Self::new((lo + hi) * 0.5, (hi - lo) * 0.5)
    }

    /// Lower-left corner.
    #[inline]
    #[must_use]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    /// Upper-right corner.
    #[inline]
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Full width and height.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.half_extents * 2.0
    }

    /// Whether `other` lies entirely inside this bound (half-open on the max side).
    #[inline]
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        let (min, max) = (self.min(), self.max());
        let (other_min, other_max) = (other.min(), other.max());
        other_min.x >= min.x && other_min.y >= min.y && other_max.x < max.x && other_max.y < max.y
    }

    /// Whether `point` lies inside this bound, edges included.
    #[inline]
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    /// Whether the two bounds overlap, edges included.
    #[inline]
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        let (min, max) = (self.min(), self.max());
        let (other_min, other_max) = (other.min(), other.max());
        min.x <= other_max.x && max.x >= other_min.x && min.y <= other_max.y && max.y >= other_min.y
    }

    /// Classifies `other` against this bound's center split.
    #[must_use]
    pub fn location(&self, other: &Self) -> Location {
        let (other_min, other_max) = (other.min(), other.max());
        let split = self.center;
        let right = other_min.x >= split.x;
        let left = other_max.x < split.x;
        if other_min.y >= split.y {
            if right {
                Location::Inside(Quadrant::UpperRight)
            } else if left {
                Location::Inside(Quadrant::UpperLeft)
            } else {
                Location::SpanningUpper
            }
        } else if other_max.y < split.y {
            if right {
                Location::Inside(Quadrant::LowerRight)
            } else if left {
                Location::Inside(Quadrant::LowerLeft)
            } else {
                Location::SpanningLower
            }
        } else if right {
            Location::SpanningRight
        } else if left {
            Location::SpanningLeft
        } else {
            Location::SpanningAll
        }
    }

    /// The sub-bound covering one quadrant of this bound.
    #[must_use]
    pub fn quadrant(&self, quadrant: Quadrant) -> Self {
        let half = self.half_extents * 0.5;
        Self::new(self.center + quadrant.sign() * half, half)
    }

    /// Returns this bound grown by `margin` on every side.
    #[must_use]
    pub fn inflated(&self, margin: f32) -> Self {
        Self::new(self.center, self.half_extents + Vec2::splat(margin))
    }
}

/// One of the four quadrants of a split node. Discriminants are child slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// `x >= split.x`, `y >= split.y`.
    UpperRight = 0,
    /// `x < split.x`, `y >= split.y`.
    UpperLeft = 1,
    /// `x < split.x`, `y < split.y`.
    LowerLeft = 2,
    /// `x >= split.x`, `y < split.y`.
    LowerRight = 3,
}

impl Quadrant {
    /// All quadrants in child slot order.
    pub const ALL: [Self; 4] = [Self::UpperRight, Self::UpperLeft, Self::LowerLeft, Self::LowerRight];

    /// Child slot of this quadrant.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Direction of the quadrant center from the parent center, per axis.
    #[must_use]
    pub const fn sign(self) -> Vec2 {
        match self {
            Self::UpperRight => Vec2::new(1.0, 1.0),
            Self::UpperLeft => Vec2::new(-1.0, 1.0),
            Self::LowerLeft => Vec2::new(-1.0, -1.0),
            Self::LowerRight => Vec2::new(1.0, -1.0),
        }
    }

    /// The diagonally opposite quadrant.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::UpperRight => Self::LowerLeft,
            Self::UpperLeft => Self::LowerRight,
            Self::LowerLeft => Self::UpperRight,
            Self::LowerRight => Self::UpperLeft,
        }
    }

    /// The quadrant on the side of `direction`, ties going to the upper/right side.
    #[must_use]
    pub fn toward(direction: Vec2) -> Self {
        match (direction.x >= 0.0, direction.y >= 0.0) {
            (true, true) => Self::UpperRight,
            (false, true) => Self::UpperLeft,
            (false, false) => Self::LowerLeft,
            (true, false) => Self::LowerRight,
        }
    }
}

/// Where a bound falls relative to a node's center split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// Entirely inside one quadrant.
    Inside(Quadrant),
    /// Crosses the vertical split, lies in the upper half.
    SpanningUpper,
    /// Crosses the vertical split, lies in the lower half.
    SpanningLower,
    /// Crosses the horizontal split, lies in the left half.
    SpanningLeft,
    /// Crosses the horizontal split, lies in the right half.
    SpanningRight,
    /// Crosses both splits.
    SpanningAll,
}

impl Location {
    /// The quadrant this bound fits in, or `None` when it spans the split.
    #[inline]
    #[must_use]
    pub const fn single(self) -> Option<Quadrant> {
        match self {
            Self::Inside(quadrant) => Some(quadrant),
            _ => None,
        }
    }

    /// Quadrants a bound with this location can touch.
    #[must_use]
    pub const fn quadrants(self) -> &'static [Quadrant] {
        match self {
            Self::Inside(Quadrant::UpperRight) => &[Quadrant::UpperRight],
            Self::Inside(Quadrant::UpperLeft) => &[Quadrant::UpperLeft],
            Self::Inside(Quadrant::LowerLeft) => &[Quadrant::LowerLeft],
            Self::Inside(Quadrant::LowerRight) => &[Quadrant::LowerRight],
            Self::SpanningUpper => &[Quadrant::UpperRight, Quadrant::UpperLeft],
            Self::SpanningLower => &[Quadrant::LowerLeft, Quadrant::LowerRight],
            Self::SpanningLeft => &[Quadrant::UpperLeft, Quadrant::LowerLeft],
            Self::SpanningRight => &[Quadrant::UpperRight, Quadrant::LowerRight],
            Self::SpanningAll => &Quadrant::ALL,
        }
    }
}

/// Rotates unit direction `from` toward the direction of `to` by fraction `t` of the angle between them.
///
/// Returns `from` unchanged when either vector has no direction.
#[must_use]
pub fn slerp_direction(from: Vec2, to: Vec2, t: f32) -> Vec2 {
    let from_dir = from.normalize_or_zero();
    let to_dir = to.normalize_or_zero();
    if from_dir == Vec2::ZERO || to_dir == Vec2::ZERO {
        return from;
    }
    let angle = from_dir.perp_dot(to_dir).atan2(from_dir.dot(to_dir));
    Vec2::from_angle(angle * t.clamp(0.0, 1.0)).rotate(from_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Bound {
        Bound::new(Vec2::ZERO, Vec2::splat(1.0))
    }

    #[test]
    fn test_containment_is_half_open() {
        let node = unit_box();
        assert!(node.contains(&Bound::from_min_max(Vec2::splat(-1.0), Vec2::splat(0.5))), "min edge is inside");
        assert!(!node.contains(&Bound::from_min_max(Vec2::splat(0.0), Vec2::splat(1.0))), "max edge is outside");
    }

    #[test]
    fn test_touching_bounds_intersect() {
        let a = Bound::from_min_max(Vec2::ZERO, Vec2::ONE);
        let b = Bound::from_min_max(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0));
        assert!(a.intersects(&b), "shared edge counts as intersection");
        let c = Bound::from_min_max(Vec2::new(1.5, 0.0), Vec2::new(2.0, 1.0));
        assert!(!a.intersects(&c), "disjoint bounds");
    }

    #[test]
    fn test_location_classification() {
        let node = unit_box();
        let at = |min: (f32, f32), max: (f32, f32)| {
            node.location(&Bound::from_min_max(Vec2::new(min.0, min.1), Vec2::new(max.0, max.1)))
        };
        assert_eq!(at((0.1, 0.1), (0.5, 0.5)), Location::Inside(Quadrant::UpperRight));
        assert_eq!(at((-0.5, 0.1), (-0.1, 0.5)), Location::Inside(Quadrant::UpperLeft));
        assert_eq!(at((-0.5, -0.5), (-0.1, -0.1)), Location::Inside(Quadrant::LowerLeft));
        assert_eq!(at((0.1, -0.5), (0.5, -0.1)), Location::Inside(Quadrant::LowerRight));
        assert_eq!(at((-0.5, 0.1), (0.5, 0.5)), Location::SpanningUpper);
        assert_eq!(at((-0.5, -0.5), (0.5, -0.1)), Location::SpanningLower);
        assert_eq!(at((-0.5, -0.5), (-0.1, 0.5)), Location::SpanningLeft);
        assert_eq!(at((0.1, -0.5), (0.5, 0.5)), Location::SpanningRight);
        assert_eq!(at((-0.5, -0.5), (0.5, 0.5)), Location::SpanningAll);
        // A bound starting exactly on the split belongs to the upper/right side.
        assert_eq!(at((0.0, 0.0), (0.2, 0.2)), Location::Inside(Quadrant::UpperRight));
    }

    #[test]
    fn test_quadrant_bounds_tile_parent() {
        let node = Bound::new(Vec2::new(4.0, -2.0), Vec2::new(2.0, 1.0));
        for quadrant in Quadrant::ALL {
            let child = node.quadrant(quadrant);
            assert_eq!(child.half_extents, Vec2::new(1.0, 0.5));
            assert_eq!(node.location(&Bound::around(child.center, 0.1)), Location::Inside(quadrant));
        }
    }

    #[test]
    fn test_slerp_direction() {
        let quarter = slerp_direction(Vec2::X, Vec2::Y, 0.5);
        let expected = Vec2::new(1.0, 1.0).normalize();
        assert!((quarter - expected).length() < 1e-5, "halfway between +x and +y");
        assert_eq!(slerp_direction(Vec2::X, Vec2::ZERO, 0.5), Vec2::X, "no target direction");
        let full = slerp_direction(Vec2::X, Vec2::new(0.0, -3.0), 2.0);
        assert!((full - Vec2::NEG_Y).length() < 1e-5, "fraction clamps to one");
    }
}
