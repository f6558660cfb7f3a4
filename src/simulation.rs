//! Lockstep flocking simulator.
//!
//! Each [`FlockingSimulator::tick`] runs two phases separated by a barrier:
//! the neighbor index is brought up to date serially, then every agent is steered and
//! integrated in parallel with exclusive access to its own slot.

use glam::Vec2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::agent::{Agent, AgentStore, Neighbor};
use crate::config::{IndexChoice, NeighborhoodShape, SimulationConfig};
use crate::error::FlockError;
use crate::geometry::Bound;
use crate::neighbors::{DynamicAgentIndex, NeighborIndex, StaticAgentIndex};
use crate::steering::{SteeringParams, integrate, retain_within_radius, steer};

/// Outcome of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    /// Ticks completed so far, including this one.
    pub tick: u64,
    /// Agents whose index placement could not be refreshed this tick.
    pub deferred_updates: usize,
}

/// Owns the agents and the neighbor index, and advances them together.
pub struct FlockingSimulator {
    config: SimulationConfig,
    agents: AgentStore,
    index: Box<dyn NeighborIndex>,
    ticks: u64,
}

impl std::fmt::Debug for FlockingSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlockingSimulator")
            .field("config", &self.config)
            .field("agents", &self.agents.len())
            .field("index", &self.index.name())
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl FlockingSimulator {
    /// Validates `config` and spawns `agent_count` agents inside the spawn volume.
    ///
    /// # Errors
    /// Returns [`FlockError::InvalidConfig`] when a parameter is unusable.
    pub fn new(config: SimulationConfig) -> Result<Self, FlockError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let agents = AgentStore::spawn(config.agent_count, &config.spawn_volume(), &mut rng);
        Self::with_agents(config, agents)
    }

    /// Uses a caller-provided population instead of spawning; `agent_count` is ignored.
    ///
    /// # Errors
    /// Returns [`FlockError::InvalidConfig`] when a parameter is unusable.
    pub fn with_agents(config: SimulationConfig, agents: AgentStore) -> Result<Self, FlockError> {
        config.validate()?;
        let index = build_index(&config)?;
        info!(
            agents = agents.len(),
            index = index.name(),
            sense_radius = config.sense_radius,
            "flocking simulator ready"
        );
        Ok(Self {
            config,
            agents,
            index,
            ticks: 0,
        })
    }

    /// Advances every agent by `dt` seconds.
    ///
    /// # Errors
    /// Returns [`FlockError::InvalidConfig`] when `dt` is negative or not finite.
    pub fn tick(&mut self, dt: f32) -> Result<TickReport, FlockError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(FlockError::InvalidConfig("dt must be finite and non-negative"));
        }

        let deferred_updates = self.index.sync(self.agents.as_slice());
        if deferred_updates > 0 {
            warn!(deferred_updates, "some agents kept their previous index placement");
        }

        let params = self.steering_params();
        let shape = self.config.neighborhood;
        let index = self.index.as_ref();
        let capacity = self.agents.len().min(64);
        self.agents.as_mut_slice().par_iter_mut().for_each_init(
            || Vec::with_capacity(capacity),
            |scratch, agent| step_agent(agent, index, shape, &params, dt, scratch),
        );

        self.ticks += 1;
        debug!(tick = self.ticks, dt, "tick complete");
        Ok(TickReport {
            tick: self.ticks,
            deferred_updates,
        })
    }

    /// Neighbors of an arbitrary point under the current index, without the vision cone.
    /// Reflects the snapshot taken at the start of the last tick.
    pub fn neighbors_of(&self, position: Vec2, out: &mut Vec<Neighbor>) {
        self.index
            .neighbors(&Bound::around(position, self.config.sense_radius), out);
        if self.config.neighborhood == NeighborhoodShape::Circle {
            retain_within_radius(out, position, self.config.sense_radius);
        }
    }

    /// The simulation parameters.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// All agents, ordered by id.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        self.agents.as_slice()
    }

    /// `(position, heading)` per agent, for display.
    pub fn transforms(&self) -> impl ExactSizeIterator<Item = (Vec2, Vec2)> + '_ {
        self.agents.transforms()
    }

    /// The active neighbor index.
    #[must_use]
    pub fn index(&self) -> &dyn NeighborIndex {
        self.index.as_ref()
    }

    /// Ticks completed so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Walks the index nodes for debug drawing.
    pub fn visit_index_bounds(&self, mut visitor: impl FnMut(Bound, u32)) {
        self.index.visit_bounds(&mut visitor);
    }

    fn steering_params(&self) -> SteeringParams {
        SteeringParams {
            sense_radius: self.config.sense_radius,
            vision_cos: self.config.vision_half_angle.map(f32::cos),
            forward_speed: self.config.forward_speed,
            turn_rate: self.config.turn_rate,
            world: self.config.world(),
        }
    }
}

fn build_index(config: &SimulationConfig) -> Result<Box<dyn NeighborIndex>, FlockError> {
    let world = config.world();
    let index: Box<dyn NeighborIndex> = match config.index {
        IndexChoice::Static { .. } => match config.index.static_config(&world) {
            Some(tree) => Box::new(StaticAgentIndex::new(tree)?),
            None => return Err(FlockError::InvalidConfig("static index parameters missing")),
        },
        IndexChoice::Dynamic { agent_half_size, .. } => match config.index.dynamic_config(&world) {
            Some(tree) => Box::new(DynamicAgentIndex::new(tree, agent_half_size)?),
            None => return Err(FlockError::InvalidConfig("dynamic index parameters missing")),
        },
    };
    Ok(index)
}

fn step_agent(
    agent: &mut Agent,
    index: &dyn NeighborIndex,
    shape: NeighborhoodShape,
    params: &SteeringParams,
    dt: f32,
    scratch: &mut Vec<Neighbor>,
) {
    index.neighbors(&Bound::around(agent.position, params.sense_radius), scratch);
    if shape == NeighborhoodShape::Circle {
        retain_within_radius(scratch, agent.position, params.sense_radius);
    }
    let steering = steer(agent, scratch, params);
    integrate(agent, &steering, params, dt);
    scratch.clear();
}
