//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types from the crate.
//! Users can import everything they need with:
//!
//! ```
//! use quadflock::prelude::*;
//! ```

pub use crate::{
    Agent, AgentStore, Bound, DynamicQuadtree, DynamicQuadtreeConfig, FlockError, FlockingSimulator, IndexChoice,
    IndexError, ItemKey, Location, Neighbor, NeighborIndex, NeighborhoodShape, NodeId, PointEntry, QuadItem,
    Quadrant, SimulationConfig, StaticQuadtree, StaticQuadtreeConfig, TickReport, UpdateOutcome,
};
pub use glam::Vec2;
