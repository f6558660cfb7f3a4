//! Simulation parameters.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::dynamic_quadtree::DynamicQuadtreeConfig;
use crate::error::FlockError;
use crate::geometry::Bound;
use crate::static_quadtree::{MAX_LEVELS, StaticQuadtreeConfig};

/// Which spatial index answers neighborhood queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum IndexChoice {
    /// Bulk-loaded quadtree rebuilt every tick.
    Static {
        /// Deepest split level (capped at 16).
        max_depth: u32,
        /// Entries per leaf before a split.
        leaf_capacity: usize,
    },
    /// Persistent quadtree updated incrementally.
    Dynamic {
        /// Smallest child half-extent.
        min_node_size: f32,
        /// Items a leaf holds before it subdivides.
        leaf_capacity: usize,
        /// Half-size of the square bound tracked per agent.
        agent_half_size: f32,
    },
}

impl IndexChoice {
    /// Default static index: depth 8, 128 entries per leaf.
    pub const STATIC: Self = Self::Static {
        max_depth: 8,
        leaf_capacity: 128,
    };

    /// Default dynamic index: unit minimum node size, eager splits, quarter-unit agents.
    pub const DYNAMIC: Self = Self::Dynamic {
        min_node_size: 1.0,
        leaf_capacity: 0,
        agent_half_size: 0.25,
    };

    /// Static index configuration covering `world`.
    #[must_use]
    pub fn static_config(&self, world: &Bound) -> Option<StaticQuadtreeConfig> {
        match *self {
            Self::Static {
                max_depth,
                leaf_capacity,
            } => Some(StaticQuadtreeConfig {
                bounds: *world,
                max_depth,
                leaf_capacity,
            }),
            Self::Dynamic { .. } => None,
        }
    }

    /// Dynamic index configuration whose root holds every agent bound inside `world`.
    #[must_use]
    pub fn dynamic_config(&self, world: &Bound) -> Option<DynamicQuadtreeConfig> {
        match *self {
            Self::Dynamic {
                min_node_size,
                leaf_capacity,
                agent_half_size,
            } => {
                let root = world.inflated(2.0 * agent_half_size + min_node_size);
                Some(DynamicQuadtreeConfig {
                    root,
                    min_node_size,
                    leaf_capacity,
                    max_root_half_extent: root.half_extents.max_element() * 64.0,
                })
            }
            Self::Static { .. } => None,
        }
    }
}

/// Region an agent perceives neighbors in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NeighborhoodShape {
    /// Axis-aligned square of half-extent `sense_radius`.
    #[default]
    Square,
    /// Disc of radius `sense_radius`.
    Circle,
}

/// Parameters of a [`crate::FlockingSimulator`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Agents spawned at construction.
    pub agent_count: usize,
    /// Full size of the spawn area, centered on `world_center`.
    pub spawn_extents: Vec2,
    /// Center of the wrapping world.
    pub world_center: Vec2,
    /// Full size of the wrapping world.
    pub world_extents: Vec2,
    /// Neighbor perception radius.
    pub sense_radius: f32,
    /// Half of the vision cone angle in radians; `None` disables the cone.
    pub vision_half_angle: Option<f32>,
    /// Cruise speed.
    pub forward_speed: f32,
    /// Turn responsiveness; velocity blends at `turn_rate / 2` per second, heading at `turn_rate`.
    pub turn_rate: f32,
    /// Shape of the perception region.
    pub neighborhood: NeighborhoodShape,
    /// Spatial index and its parameters.
    pub index: IndexChoice,
    /// Seed for the spawn RNG; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agent_count: 500,
            spawn_extents: Vec2::new(120.0, 80.0),
            world_center: Vec2::ZERO,
            world_extents: Vec2::new(120.0, 80.0),
            sense_radius: 2.0,
            vision_half_angle: Some(135_f32.to_radians()),
            forward_speed: 5.0,
            turn_rate: 5.0,
            neighborhood: NeighborhoodShape::Square,
            index: IndexChoice::STATIC,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// The wrapping world as a bound.
    #[must_use]
    pub fn world(&self) -> Bound {
        Bound::new(self.world_center, self.world_extents * 0.5)
    }

    /// The spawn area as a bound.
    #[must_use]
    pub fn spawn_volume(&self) -> Bound {
        Bound::new(self.world_center, self.spawn_extents * 0.5)
    }

    /// Checks every parameter.
    ///
    /// # Errors
    /// Returns [`FlockError::InvalidConfig`] naming the first unusable value.
    pub fn validate(&self) -> Result<(), FlockError> {
        if !self.world_center.is_finite() || !self.world_extents.is_finite() {
            return Err(FlockError::InvalidConfig("world must be finite"));
        }
        if self.world_extents.min_element() <= 0.0 {
            return Err(FlockError::InvalidConfig("world_extents must be positive"));
        }
        if !self.spawn_extents.is_finite() || self.spawn_extents.min_element() < 0.0 {
            return Err(FlockError::InvalidConfig("spawn_extents must be finite and non-negative"));
        }
        if !self.sense_radius.is_finite() || self.sense_radius <= 0.0 {
            return Err(FlockError::InvalidConfig("sense_radius must be positive"));
        }
        if let Some(angle) = self.vision_half_angle
            && !(angle > 0.0 && angle <= std::f32::consts::PI)
        {
            return Err(FlockError::InvalidConfig("vision_half_angle must be in (0, pi]"));
        }
        if !self.forward_speed.is_finite() || self.forward_speed < 0.0 {
            return Err(FlockError::InvalidConfig("forward_speed must be finite and non-negative"));
        }
        if !self.turn_rate.is_finite() || self.turn_rate < 0.0 {
            return Err(FlockError::InvalidConfig("turn_rate must be finite and non-negative"));
        }
        match self.index {
            IndexChoice::Static { max_depth, .. } => {
                if max_depth > MAX_LEVELS {
                    return Err(FlockError::InvalidConfig("max_depth must not exceed 16"));
                }
            }
            IndexChoice::Dynamic {
                min_node_size,
                agent_half_size,
                ..
            } => {
                if !min_node_size.is_finite() || min_node_size <= 0.0 {
                    return Err(FlockError::InvalidConfig("min_node_size must be positive"));
                }
                if !agent_half_size.is_finite() || agent_half_size < 0.0 {
                    return Err(FlockError::InvalidConfig("agent_half_size must be finite and non-negative"));
                }
            }
        }
        Ok(())
    }
}
