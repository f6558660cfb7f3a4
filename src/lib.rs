//! # quadflock - Quadtree Spatial Indices for 2D Flocking
//!
//! A Rust library that drives a real-time 2D flocking simulation on top of two quadtree
//! spatial indices answering "which agents are near this point" every tick.
//!
//! ## Features
//!
//! - **Static Quadtree**: Bulk-loaded from a point snapshot along a Morton curve, rebuilt every tick
//! - **Dynamic Quadtree**: Persistent, generic over any [`QuadItem`], with incremental insert/update/remove
//! - **Root Growth**: Items escaping the dynamic root grow the tree upward, up to a configured limit
//! - **Parallel Tick**: Agents are steered and integrated in parallel, one writer per slot
//! - **Flocking Rules**: Separation, alignment and cohesion under an optional vision cone, with toroidal wrap
//!
//! ## Quick Start
//!
//! ```rust
//! use quadflock::prelude::*;
//!
//! // 200 agents in a 40 x 40 wrapping world, reproducible spawn
//! let config = SimulationConfig {
//!     agent_count: 200,
//!     spawn_extents: Vec2::splat(40.0),
//!     world_extents: Vec2::splat(40.0),
//!     seed: Some(42),
//!     ..SimulationConfig::default()
//! };
//! let mut sim = FlockingSimulator::new(config)?;
//!
//! // The caller owns the loop and the time step
//! for _ in 0..10 {
//!     let report = sim.tick(1.0 / 60.0)?;
//!     assert_eq!(report.deferred_updates, 0);
//! }
//!
//! // Read-only (position, heading) pairs for rendering
//! for (position, heading) in sim.transforms() {
//!     assert!(position.is_finite() && heading.is_finite());
//! }
//! # Ok::<(), FlockError>(())
//! ```
//!
//! ## How It Works
//!
//! A tick has two phases. First the chosen index catches up with the agents: the static
//! quadtree sorts a fresh snapshot by Morton code and lays out its nodes over the sorted
//! array, while the dynamic quadtree re-homes only the items whose bounds changed. Then
//! every agent queries the frozen index, computes its steering, and writes its own slot.
//!
//! The dynamic quadtree stores nodes in an arena addressed by [`NodeId`], so parent and
//! child links are plain indices. Items carry their owning node as a back-link through
//! [`QuadItem::set_owner`], which lets an update start from the node the item already sits in.

pub mod agent;
pub mod config;
pub mod dynamic_quadtree;
pub mod error;
pub mod geometry;
pub mod neighbors;
pub mod prelude;
pub mod simulation;
pub mod static_quadtree;
pub mod steering;

pub use agent::{Agent, AgentStore, Neighbor};
pub use config::{IndexChoice, NeighborhoodShape, SimulationConfig};
pub use dynamic_quadtree::{DynamicQuadtree, DynamicQuadtreeConfig, ItemKey, NodeId, NodeView, QuadItem, UpdateOutcome};
pub use error::{FlockError, IndexError};
pub use geometry::{Bound, Location, Quadrant};
pub use neighbors::{DynamicAgentIndex, NeighborIndex, StaticAgentIndex};
pub use simulation::{FlockingSimulator, TickReport};
pub use static_quadtree::{PointEntry, StaticQuadtree, StaticQuadtreeConfig};

#[cfg(test)]
mod comparison_tests;
