//! Bulk-loaded point quadtree, rebuilt from a full snapshot.
//!
//! Entries are sorted along a Morton (Z-order) curve computed relative to the configured
//! bounds. Every quadtree node then covers one contiguous run of the sorted entries, so a
//! subdivision is just four binary searches over the codes of its run.
//!
//! Layout:
//! - `entries`: all points in Morton order
//! - `codes`: Morton code per entry, same order
//! - `nodes`: breadth-first; the four children of a node are stored consecutively
//!
//! Each node also records the tight extent of the points below it. Queries prune on that
//! extent rather than on the nominal quadrant, so points outside the configured bounds
//! (clamped onto its border when coded) are still found.

use glam::Vec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::IndexError;
use crate::geometry::{Bound, Quadrant};

/// Levels addressable by a 32-bit Morton code (16 bits per axis).
pub const MAX_LEVELS: u32 = 16;

const MAX_COORD: f32 = u16::MAX as f32;

/// A point with its payload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointEntry<T> {
    /// Location used for indexing.
    pub position: Vec2,
    /// Payload returned with the point.
    pub value: T,
}

impl<T> PointEntry<T> {
    /// Creates an entry.
    #[must_use]
    pub const fn new(position: Vec2, value: T) -> Self {
        Self { position, value }
    }
}

/// Shape of a [`StaticQuadtree`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StaticQuadtreeConfig {
    /// Region the Morton codes are computed over.
    pub bounds: Bound,
    /// Deepest level a node may be split to. Values above [`MAX_LEVELS`] are capped.
    pub max_depth: u32,
    /// Entries a leaf holds before it is split. Leaves at `max_depth` hold any number.
    pub leaf_capacity: usize,
}

impl Default for StaticQuadtreeConfig {
    fn default() -> Self {
        Self {
            bounds: Bound::new(Vec2::ZERO, Vec2::splat(80.0)),
            max_depth: 8,
            leaf_capacity: 128,
        }
    }
}

impl StaticQuadtreeConfig {
    /// Checks that the bounds are usable.
    ///
    /// # Errors
    /// Returns [`IndexError::InvalidConfig`] for non-finite or empty bounds.
    pub fn validate(&self) -> Result<(), IndexError> {
        if !self.bounds.center.is_finite() || !self.bounds.half_extents.is_finite() {
            return Err(IndexError::InvalidConfig("static bounds must be finite"));
        }
        if self.bounds.half_extents.min_element() <= 0.0 {
            return Err(IndexError::InvalidConfig("static bounds must have positive extent"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
struct StaticNode {
    /// Nominal quadrant region.
    bound: Bound,
    /// Tight extent of the entries below this node.
    min: Vec2,
    max: Vec2,
    start: usize,
    end: usize,
    /// Index of the first of four children; 0 for leaves (the root is never a child).
    first_child: usize,
    depth: u32,
}

impl StaticNode {
    fn is_leaf(&self) -> bool {
        self.first_child == 0
    }

    fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Point quadtree rebuilt from scratch by bulk load.
///
/// # Examples
/// ```
/// use glam::Vec2;
/// use quadflock::prelude::*;
///
/// let mut tree = StaticQuadtree::new(StaticQuadtreeConfig::default()).unwrap();
/// tree.rebuild(&[
///     PointEntry::new(Vec2::new(1.0, 1.0), 'a'),
///     PointEntry::new(Vec2::new(9.0, 9.0), 'b'),
/// ]);
///
/// let mut results = Vec::new();
/// tree.range_query(&Bound::around(Vec2::ZERO, 2.0), &mut results);
/// assert_eq!(results.len(), 1);
/// assert_eq!(results[0].value, 'a');
/// ```
#[derive(Clone, Debug)]
pub struct StaticQuadtree<T> {
    config: StaticQuadtreeConfig,
    entries: Vec<PointEntry<T>>,
    codes: Vec<u32>,
    nodes: Vec<StaticNode>,
}

impl<T: Copy + Send + Sync> StaticQuadtree<T> {
    /// Creates an empty tree.
    ///
    /// # Errors
    /// Returns [`IndexError::InvalidConfig`] when the configuration fails validation.
    pub fn new(config: StaticQuadtreeConfig) -> Result<Self, IndexError> {
        config.validate()?;
        Ok(Self {
            config: StaticQuadtreeConfig {
                max_depth: config.max_depth.min(MAX_LEVELS),
                ..config
            },
            entries: Vec::new(),
            codes: Vec::new(),
            nodes: Vec::new(),
        })
    }

    /// Configuration in effect (with `max_depth` capped).
    #[must_use]
    pub fn config(&self) -> &StaticQuadtreeConfig {
        &self.config
    }

    /// Number of indexed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the last snapshot was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of nodes, empty quadrants included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Indexed entries in Morton order.
    #[must_use]
    pub fn entries(&self) -> &[PointEntry<T>] {
        &self.entries
    }

    /// Replaces the contents with `snapshot`.
    pub fn rebuild(&mut self, snapshot: &[PointEntry<T>]) {
        let bounds = self.config.bounds;
        let mut coded: Vec<(u32, PointEntry<T>)> = snapshot
            .par_iter()
            .map(|entry| (morton_code(&bounds, entry.position), *entry))
            .collect();
        coded.par_sort_unstable_by_key(|(code, _)| *code);

        self.codes.clear();
        self.entries.clear();
        self.codes.extend(coded.iter().map(|(code, _)| *code));
        self.entries.extend(coded.into_iter().map(|(_, entry)| entry));
        self.build_nodes();
        debug!(entries = self.entries.len(), nodes = self.nodes.len(), "rebuilt static quadtree");
    }

    /// Collects every entry whose position lies inside `bound`, edges included.
    ///
    /// `results` is cleared first. Order is unspecified.
    pub fn range_query(&self, bound: &Bound, results: &mut Vec<PointEntry<T>>) {
        results.clear();
        self.for_each_in(bound, |entry| results.push(*entry));
    }

    /// Calls `visitor` for every entry whose position lies inside `bound`, edges included.
    pub fn for_each_in(&self, bound: &Bound, mut visitor: impl FnMut(&PointEntry<T>)) {
        if self.nodes.is_empty() {
            return;
        }
        let (query_min, query_max) = (bound.min(), bound.max());
        let mut stack = vec![0_usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if node.is_empty()
                || node.max.x < query_min.x
                || node.max.y < query_min.y
                || node.min.x > query_max.x
                || node.min.y > query_max.y
            {
                continue;
            }
            let inside = node.min.x >= query_min.x
                && node.min.y >= query_min.y
                && node.max.x <= query_max.x
                && node.max.y <= query_max.y;
            let run = &self.entries[node.start..node.end];
            if inside {
                run.iter().for_each(&mut visitor);
            } else if node.is_leaf() {
                run.iter()
                    .filter(|entry| bound.contains_point(entry.position))
                    .for_each(&mut visitor);
            } else {
                stack.extend(node.first_child..node.first_child + 4);
            }
        }
    }

    /// Collects every entry within `radius` of `center`.
    pub fn query_circle(&self, center: Vec2, radius: f32, results: &mut Vec<PointEntry<T>>) {
        self.range_query(&Bound::around(center, radius), results);
        let radius_sq = radius * radius;
        results.retain(|entry| entry.position.distance_squared(center) <= radius_sq);
    }

    /// Walks non-empty nodes depth-first, passing nominal bound, depth and entry count.
    /// Diagnostic only.
    pub fn visit_nodes(&self, mut visitor: impl FnMut(Bound, u32, usize)) {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = vec![0_usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if node.is_empty() {
                continue;
            }
            visitor(node.bound, node.depth, node.end - node.start);
            if !node.is_leaf() {
                stack.extend((node.first_child..node.first_child + 4).rev());
            }
        }
    }

    // --- Private helpers ---

    /// Splits the sorted runs breadth-first so that siblings end up adjacent.
    fn build_nodes(&mut self) {
        self.nodes.clear();
        let root = self.make_node(self.config.bounds, 0, 0, self.entries.len());
        self.nodes.push(root);

        let mut index = 0;
        while index < self.nodes.len() {
            let node = self.nodes[index];
            index += 1;
            if node.end - node.start <= self.config.leaf_capacity || node.depth >= self.config.max_depth {
                continue;
            }
            let shift = 2 * (MAX_LEVELS - 1 - node.depth);
            let codes = &self.codes[node.start..node.end];
            let mut splits = [node.start; 5];
            for digit in 1..4_u32 {
                splits[digit as usize] = node.start + codes.partition_point(|code| ((code >> shift) & 3) < digit);
            }
            splits[4] = node.end;

            self.nodes[index - 1].first_child = self.nodes.len();
            for digit in 0..4 {
                let child = self.make_node(
                    node.bound.quadrant(digit_quadrant(digit)),
                    node.depth + 1,
                    splits[digit],
                    splits[digit + 1],
                );
                self.nodes.push(child);
            }
        }
    }

    fn make_node(&self, bound: Bound, depth: u32, start: usize, end: usize) -> StaticNode {
        let (min, max) = self.entries[start..end].iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(min, max), entry| (min.min(entry.position), max.max(entry.position)),
        );
        StaticNode {
            bound,
            min,
            max,
            start,
            end,
            first_child: 0,
            depth,
        }
    }
}

/// Quadrant addressed by a two-bit Morton digit (`y` bit high, `x` bit low).
fn digit_quadrant(digit: usize) -> Quadrant {
    match digit {
        0 => Quadrant::LowerLeft,
        1 => Quadrant::LowerRight,
        2 => Quadrant::UpperLeft,
        _ => Quadrant::UpperRight,
    }
}

/// Morton code of `position` relative to `bounds`; points outside are clamped to its border.
fn morton_code(bounds: &Bound, position: Vec2) -> u32 {
    let scaled = (position - bounds.min()) / bounds.size() * (MAX_COORD + 1.0);
    let x = scaled.x.clamp(0.0, MAX_COORD) as u32;
    let y = scaled.y.clamp(0.0, MAX_COORD) as u32;
    interleave(x) | (interleave(y) << 1)
}

/// Spreads the low 16 bits of `x` over the even bit positions.
fn interleave(mut x: u32) -> u32 {
    x &= 0x0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333;
    x = (x | (x << 1)) & 0x5555_5555;
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave() {
        assert_eq!(interleave(0), 0);
        assert_eq!(interleave(1), 1);
        assert_eq!(interleave(0b11), 0b101);
        assert_eq!(interleave(0xFFFF), 0x5555_5555);
    }

    #[test]
    fn test_morton_code_quadrant_digits() {
        let bounds = Bound::new(Vec2::ZERO, Vec2::splat(10.0));
        let top_digit = |p: Vec2| morton_code(&bounds, p) >> 30;
        assert_eq!(digit_quadrant(top_digit(Vec2::new(-5.0, -5.0)) as usize), Quadrant::LowerLeft);
        assert_eq!(digit_quadrant(top_digit(Vec2::new(5.0, -5.0)) as usize), Quadrant::LowerRight);
        assert_eq!(digit_quadrant(top_digit(Vec2::new(-5.0, 5.0)) as usize), Quadrant::UpperLeft);
        assert_eq!(digit_quadrant(top_digit(Vec2::new(5.0, 5.0)) as usize), Quadrant::UpperRight);
    }

    #[test]
    fn test_morton_code_clamps_outside_points() {
        let bounds = Bound::new(Vec2::ZERO, Vec2::splat(1.0));
        assert_eq!(morton_code(&bounds, Vec2::splat(-100.0)), 0);
        assert_eq!(morton_code(&bounds, Vec2::splat(100.0)), u32::MAX);
    }
}
