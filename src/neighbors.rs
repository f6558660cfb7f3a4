//! Neighborhood indices over agent snapshots.
//!
//! [`NeighborIndex`] is the seam between the simulator and the spatial structures: one
//! serial `sync` per tick, then any number of concurrent read-only `neighbors` calls.

use glam::Vec2;
use tracing::warn;

use crate::agent::{Agent, Neighbor};
use crate::dynamic_quadtree::{DynamicQuadtree, DynamicQuadtreeConfig, ItemKey, NodeId, QuadItem};
use crate::error::IndexError;
use crate::geometry::Bound;
use crate::static_quadtree::{PointEntry, StaticQuadtree, StaticQuadtreeConfig};

/// Common behaviour of neighborhood indices.
pub trait NeighborIndex: Send + Sync {
    /// Brings the index in line with `agents`. Returns how many agents could not be
    /// re-homed this tick; those are still answered from their previous placement.
    fn sync(&mut self, agents: &[Agent]) -> usize;

    /// Collects every agent whose position lies inside `region`. `out` is cleared first.
    fn neighbors(&self, region: &Bound, out: &mut Vec<Neighbor>);

    /// Walks the index nodes, passing each node's bound and depth. Diagnostic only.
    fn visit_bounds(&self, visitor: &mut dyn FnMut(Bound, u32));

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

/// Payload stored per point in the static index.
#[derive(Clone, Copy, Debug, PartialEq)]
struct AgentTag {
    id: usize,
    heading: Vec2,
}

/// Rebuilds a [`StaticQuadtree`] from the full snapshot every tick.
#[derive(Clone, Debug)]
pub struct StaticAgentIndex {
    tree: StaticQuadtree<AgentTag>,
    snapshot: Vec<PointEntry<AgentTag>>,
}

impl StaticAgentIndex {
    /// Creates an empty index.
    ///
    /// # Errors
    /// Returns [`IndexError::InvalidConfig`] when the configuration fails validation.
    pub fn new(config: StaticQuadtreeConfig) -> Result<Self, IndexError> {
        Ok(Self {
            tree: StaticQuadtree::new(config)?,
            snapshot: Vec::new(),
        })
    }

    /// Number of indexed agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether no agents are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

impl NeighborIndex for StaticAgentIndex {
    fn sync(&mut self, agents: &[Agent]) -> usize {
        self.snapshot.clear();
        self.snapshot.extend(agents.iter().map(|agent| {
            PointEntry::new(
                agent.position,
                AgentTag {
                    id: agent.id,
                    heading: agent.heading,
                },
            )
        }));
        self.tree.rebuild(&self.snapshot);
        0
    }

    fn neighbors(&self, region: &Bound, out: &mut Vec<Neighbor>) {
        out.clear();
        self.tree.for_each_in(region, |entry| {
            out.push(Neighbor {
                id: entry.value.id,
                position: entry.position,
                heading: entry.value.heading,
            });
        });
    }

    fn visit_bounds(&self, visitor: &mut dyn FnMut(Bound, u32)) {
        self.tree.visit_nodes(|bound, depth, _| visitor(bound, depth));
    }

    fn name(&self) -> &'static str {
        "static quadtree"
    }
}

/// An agent as tracked by the dynamic index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentItem {
    id: usize,
    position: Vec2,
    heading: Vec2,
    half_size: f32,
    owner: Option<NodeId>,
}

impl AgentItem {
    /// Creates an unplaced item for `agent`.
    #[must_use]
    pub fn new(agent: &Agent, half_size: f32) -> Self {
        Self {
            id: agent.id,
            position: agent.position,
            heading: agent.heading,
            half_size,
            owner: None,
        }
    }

    /// Agent id.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Position at the last sync.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Heading at the last sync.
    #[must_use]
    pub fn heading(&self) -> Vec2 {
        self.heading
    }

    /// Moves the item. The owning tree must be notified afterwards.
    pub fn move_to(&mut self, position: Vec2, heading: Vec2) {
        self.position = position;
        self.heading = heading;
    }
}

impl QuadItem for AgentItem {
    fn bound(&self) -> Bound {
        Bound::around(self.position, self.half_size)
    }

    fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    fn set_owner(&mut self, owner: Option<NodeId>) {
        self.owner = owner;
    }
}

/// Keeps one long-lived [`AgentItem`] per agent in a [`DynamicQuadtree`] and signals bound
/// changes as agents move.
#[derive(Clone, Debug)]
pub struct DynamicAgentIndex {
    tree: DynamicQuadtree<AgentItem>,
    keys: Vec<Option<ItemKey>>,
    agent_half_size: f32,
}

impl DynamicAgentIndex {
    /// Creates an empty index tracking agents as squares of half-size `agent_half_size`.
    ///
    /// # Errors
    /// Returns [`IndexError::InvalidConfig`] when the configuration fails validation.
    pub fn new(config: DynamicQuadtreeConfig, agent_half_size: f32) -> Result<Self, IndexError> {
        Ok(Self {
            tree: DynamicQuadtree::new(config)?,
            keys: Vec::new(),
            agent_half_size,
        })
    }

    /// The underlying tree.
    #[must_use]
    pub fn tree(&self) -> &DynamicQuadtree<AgentItem> {
        &self.tree
    }

    /// Key of the item tracking agent `id`, once registered.
    #[must_use]
    pub fn key(&self, id: usize) -> Option<ItemKey> {
        self.keys.get(id).copied().flatten()
    }
}

impl NeighborIndex for DynamicAgentIndex {
    fn sync(&mut self, agents: &[Agent]) -> usize {
        if self.keys.len() < agents.len() {
            self.keys.resize(agents.len(), None);
        }
        let mut deferred = 0;
        for agent in agents {
            let Some(slot) = self.keys.get_mut(agent.id) else {
                warn!(agent = agent.id, tracked = agents.len(), "agent id outside the store");
                deferred += 1;
                continue;
            };
            let Some(key) = *slot else {
                match self.tree.insert(AgentItem::new(agent, self.agent_half_size)) {
                    Ok(key) => *slot = Some(key),
                    Err(error) => {
                        warn!(agent = agent.id, %error, "agent could not be registered");
                        deferred += 1;
                    }
                }
                continue;
            };
            if let Some(item) = self.tree.get_mut(key) {
                item.move_to(agent.position, agent.heading);
            }
            if self.tree.notify_bound_changed(key).is_err() {
                deferred += 1;
            }
        }
        deferred
    }

    fn neighbors(&self, region: &Bound, out: &mut Vec<Neighbor>) {
        out.clear();
        self.tree.for_each_in(region, |_, item| {
            if region.contains_point(item.position) {
                out.push(Neighbor {
                    id: item.id,
                    position: item.position,
                    heading: item.heading,
                });
            }
        });
    }

    fn visit_bounds(&self, visitor: &mut dyn FnMut(Bound, u32)) {
        self.tree.visit_nodes(|node| visitor(node.bound, node.depth));
    }

    fn name(&self) -> &'static str {
        "dynamic quadtree"
    }
}
