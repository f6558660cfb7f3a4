//! Flocking rules and motion integration.
//!
//! Everything here is a pure function of one agent and its neighbor set, so the
//! simulator can run it from any worker without synchronization.

use glam::Vec2;

use crate::agent::{Agent, Neighbor};
use crate::geometry::{Bound, slerp_direction};

/// Weight of the alignment term in the desired heading.
pub const ALIGNMENT_WEIGHT: f32 = 0.2;

/// Per-tick steering inputs shared by every agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteeringParams {
    /// Neighbor perception radius.
    pub sense_radius: f32,
    /// Cosine of the half vision angle; `None` disables the cone.
    pub vision_cos: Option<f32>,
    /// Cruise speed.
    pub forward_speed: f32,
    /// Turn responsiveness.
    pub turn_rate: f32,
    /// Wrapping world.
    pub world: Bound,
}

/// The three flocking components for one agent.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Steering {
    /// Unit vector away from weighted neighbor offsets, or zero.
    pub separation: Vec2,
    /// Unit average neighbor heading, or the agent's own heading when alone.
    pub alignment: Vec2,
    /// Unit vector toward the neighbor centroid, or zero.
    pub cohesion: Vec2,
    /// Neighbors that passed the vision test.
    pub neighbors: usize,
}

/// Whether `target` lies within the cone of half-angle `acos(vision_cos)` around `heading`.
///
/// Zero-length inputs normalize to zero, so a neighbor at the agent's own position
/// scores a dot product of 0.
#[must_use]
pub fn in_vision(heading: Vec2, offset: Vec2, vision_cos: f32) -> bool {
    heading.normalize_or_zero().dot(offset.normalize_or_zero()) >= vision_cos
}

/// Computes separation, alignment and cohesion over the visible part of `neighbors`.
#[must_use]
pub fn steer(agent: &Agent, neighbors: &[Neighbor], params: &SteeringParams) -> Steering {
    let mut repel = Vec2::ZERO;
    let mut heading_sum = Vec2::ZERO;
    let mut position_sum = Vec2::ZERO;
    let mut count = 0_usize;

    for neighbor in neighbors {
        let offset = neighbor.position - agent.position;
        if let Some(vision_cos) = params.vision_cos
            && !in_vision(agent.heading, offset, vision_cos)
        {
            continue;
        }
        let weight = 1.0 - (offset.length() / params.sense_radius).clamp(0.0, 1.0);
        repel -= weight * offset;
        heading_sum += neighbor.heading;
        position_sum += neighbor.position;
        count += 1;
    }

    if count == 0 {
        return Steering {
            separation: Vec2::ZERO,
            alignment: agent.heading.normalize_or_zero(),
            cohesion: Vec2::ZERO,
            neighbors: 0,
        };
    }

    let inv = 1.0 / count as f32;
    Steering {
        separation: repel.normalize_or_zero(),
        alignment: (heading_sum * inv).normalize_or_zero(),
        cohesion: (position_sum * inv - agent.position).normalize_or_zero(),
        neighbors: count,
    }
}

/// Target velocity from the agent's heading and its steering.
#[must_use]
pub fn desired_velocity(heading: Vec2, steering: &Steering, speed: f32) -> Vec2 {
    (heading + steering.separation + ALIGNMENT_WEIGHT * steering.alignment + steering.cohesion).normalize_or_zero()
        * speed
}

/// Moves `position` back inside `world`, per axis, by teleporting to the opposite edge.
#[must_use]
pub fn wrap_position(position: Vec2, world: &Bound) -> Vec2 {
    let min = world.min();
    let max = world.max();
    let wrap_axis = |value: f32, lo: f32, hi: f32| {
        if value > hi {
            lo
        } else if value < lo {
            hi
        } else {
            value
        }
    };
    Vec2::new(wrap_axis(position.x, min.x, max.x), wrap_axis(position.y, min.y, max.y))
}

/// Applies one step of steering and integration to `agent` in place.
pub fn integrate(agent: &mut Agent, steering: &Steering, params: &SteeringParams, dt: f32) {
    let desired = desired_velocity(agent.heading, steering, params.forward_speed);
    let blend = (params.turn_rate * 0.5 * dt).clamp(0.0, 1.0);
    let velocity = agent.velocity.lerp(desired, blend);

    agent.position = wrap_position(agent.position + velocity * dt, &params.world);
    agent.velocity = velocity;
    if velocity != Vec2::ZERO {
        agent.heading = slerp_direction(agent.heading, velocity, params.turn_rate * dt).normalize_or_zero();
    }
}

/// Drops neighbors outside the disc of `radius` around `center`.
pub fn retain_within_radius(neighbors: &mut Vec<Neighbor>, center: Vec2, radius: f32) {
    let radius_sq = radius * radius;
    neighbors.retain(|neighbor| neighbor.position.distance_squared(center) <= radius_sq);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SteeringParams {
        SteeringParams {
            sense_radius: 5.0,
            vision_cos: None,
            forward_speed: 5.0,
            turn_rate: 5.0,
            world: Bound::new(Vec2::ZERO, Vec2::new(60.0, 40.0)),
        }
    }

    fn agent(position: Vec2, heading: Vec2) -> Agent {
        Agent {
            id: 0,
            position,
            velocity: heading,
            heading,
        }
    }

    #[test]
    fn test_alone_falls_back_to_own_heading() {
        let lone = agent(Vec2::ZERO, Vec2::new(0.0, 2.0));
        let steering = steer(&lone, &[], &params());
        assert_eq!(steering.separation, Vec2::ZERO);
        assert_eq!(steering.cohesion, Vec2::ZERO);
        assert_eq!(steering.alignment, Vec2::Y);
        assert_eq!(steering.neighbors, 0);
    }

    #[test]
    fn test_self_only_neighborhood_has_no_nan() {
        let lone = agent(Vec2::new(3.0, 3.0), Vec2::X);
        let steering = steer(&lone, &[Neighbor::from(&lone)], &params());
        assert_eq!(steering.separation, Vec2::ZERO, "zero offset adds no repulsion");
        assert_eq!(steering.cohesion, Vec2::ZERO, "centroid equals own position");
        assert_eq!(steering.alignment, Vec2::X);
        assert!(desired_velocity(lone.heading, &steering, 5.0).is_finite());
    }

    #[test]
    fn test_separation_points_away() {
        let me = agent(Vec2::ZERO, Vec2::X);
        let other = Neighbor {
            id: 1,
            position: Vec2::new(1.0, 0.0),
            heading: Vec2::X,
        };
        let steering = steer(&me, &[other], &params());
        assert!((steering.separation - Vec2::NEG_X).length() < 1e-6, "{:?}", steering.separation);
        assert!((steering.cohesion - Vec2::X).length() < 1e-6, "{:?}", steering.cohesion);
    }

    #[test]
    fn test_vision_cone_filters_behind() {
        let me = agent(Vec2::ZERO, Vec2::X);
        let behind = Neighbor {
            id: 1,
            position: Vec2::new(-1.0, 0.0),
            heading: Vec2::Y,
        };
        let ahead = Neighbor {
            id: 2,
            position: Vec2::new(1.0, 0.1),
            heading: Vec2::Y,
        };
        let narrow = SteeringParams {
            vision_cos: Some(std::f32::consts::FRAC_PI_4.cos()),
            ..params()
        };
        let steering = steer(&me, &[behind, ahead], &narrow);
        assert_eq!(steering.neighbors, 1, "only the neighbor ahead is visible");
        assert!(in_vision(Vec2::X, Vec2::new(1.0, 0.0), 0.5));
        assert!(!in_vision(Vec2::X, Vec2::new(-1.0, 0.0), 0.5));
    }

    #[test]
    fn test_wrap_teleports_per_axis() {
        let world = Bound::new(Vec2::new(10.0, 0.0), Vec2::new(5.0, 5.0));
        assert_eq!(wrap_position(Vec2::new(15.5, 1.0), &world), Vec2::new(5.0, 1.0));
        assert_eq!(wrap_position(Vec2::new(4.0, -6.0), &world), Vec2::new(15.0, 5.0));
        assert_eq!(wrap_position(Vec2::new(12.0, 2.0), &world), Vec2::new(12.0, 2.0));
    }

    #[test]
    fn test_integrate_zero_speed_keeps_heading() {
        let mut still = agent(Vec2::ZERO, Vec2::Y);
        still.velocity = Vec2::ZERO;
        let frozen = SteeringParams {
            forward_speed: 0.0,
            ..params()
        };
        integrate(&mut still, &Steering::default(), &frozen, 0.1);
        assert_eq!(still.velocity, Vec2::ZERO);
        assert_eq!(still.heading, Vec2::Y, "zero velocity leaves the heading alone");
        assert_eq!(still.position, Vec2::ZERO);
    }

    #[test]
    fn test_retain_within_radius() {
        let mut neighbors = vec![
            Neighbor {
                id: 0,
                position: Vec2::new(1.0, 1.0),
                heading: Vec2::X,
            },
            Neighbor {
                id: 1,
                position: Vec2::new(2.0, 2.0),
                heading: Vec2::X,
            },
        ];
        retain_within_radius(&mut neighbors, Vec2::ZERO, 2.0);
        assert_eq!(neighbors.len(), 1, "square corner lies outside the disc");
        assert_eq!(neighbors[0].id, 0);
    }
}
