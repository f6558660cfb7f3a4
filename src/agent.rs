//! Agent kinematic state.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geometry::Bound;

/// Kinematic state of one simulated agent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Stable, dense identifier; equal to the agent's slot in its [`AgentStore`].
    pub id: usize,
    /// World position.
    pub position: Vec2,
    /// Current velocity.
    pub velocity: Vec2,
    /// Unit facing direction.
    pub heading: Vec2,
}

/// Read-only view of another agent, as returned by a neighborhood query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Identifier of the neighboring agent.
    pub id: usize,
    /// Its position when the index was built.
    pub position: Vec2,
    /// Its heading when the index was built.
    pub heading: Vec2,
}

impl From<&Agent> for Neighbor {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            position: agent.position,
            heading: agent.heading,
        }
    }
}

/// Flat, id-indexed collection of agents.
#[derive(Clone, Debug, Default)]
pub struct AgentStore {
    agents: Vec<Agent>,
}

impl AgentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with room for `capacity` agents.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            agents: Vec::with_capacity(capacity),
        }
    }

    /// Spawns `count` agents uniformly inside `volume`, each with a random heading.
    /// Initial velocity equals the heading.
    pub fn spawn<R: Rng + ?Sized>(count: usize, volume: &Bound, rng: &mut R) -> Self {
        let mut store = Self::with_capacity(count);
        let half = volume.half_extents.abs();
        for _ in 0..count {
            let offset = Vec2::new(rng.random_range(-half.x..=half.x), rng.random_range(-half.y..=half.y));
            let heading = Vec2::from_angle(rng.random_range(0.0..std::f32::consts::TAU));
            let _ = store.push(volume.center + offset, heading);
        }
        store
    }

    /// Appends an agent and returns its id. A zero heading defaults to `+x`.
    pub fn push(&mut self, position: Vec2, heading: Vec2) -> usize {
        let id = self.agents.len();
        let heading = heading.try_normalize().unwrap_or(Vec2::X);
        self.agents.push(Agent {
            id,
            position,
            velocity: heading,
            heading,
        });
        id
    }

    /// Number of agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the store holds no agents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// The agent with `id`.
    #[must_use]
    pub fn get(&self, id: usize) -> Option<&Agent> {
        self.agents.get(id)
    }

    /// All agents, ordered by id.
    #[must_use]
    pub fn as_slice(&self) -> &[Agent] {
        &self.agents
    }

    /// All agents for in-place update. Ids must not be changed.
    pub fn as_mut_slice(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    /// `(position, heading)` per agent, for display.
    pub fn transforms(&self) -> impl ExactSizeIterator<Item = (Vec2, Vec2)> + '_ {
        self.agents.iter().map(|agent| (agent.position, agent.heading))
    }
}
