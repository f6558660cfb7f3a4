//! Persistent loose quadtree for long-lived, independently moving bounded items.
//!
//! Nodes live in an arena (`Vec`) and refer to each other by [`NodeId`]; items live in a
//! generational slab owned by the tree and are addressed by [`ItemKey`]. Each item carries
//! a back-link to the node that stores it ([`QuadItem::owner`]), written only by the tree.
//!
//! An item is pushed down while its bound fits in a single quadrant. Items straddling a
//! node's split stay at that node, so a node's own items are not necessarily inside one
//! child. Children are created lazily and only ever dropped as a whole set, when the node
//! and all of its descendants hold no items.
//!
//! When an item leaves the root, the tree grows upward by doubling: the old root becomes
//! one quadrant of a new root. Growth stops at
//! [`DynamicQuadtreeConfig::max_root_half_extent`]; past that, inserts are rejected and
//! updates leave the item in its last valid node.

use glam::Vec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::IndexError;
use crate::geometry::{Bound, Quadrant};

/// Handle of a node inside a [`DynamicQuadtree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of an item stored in a [`DynamicQuadtree`]. Stale keys never alias a newer item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ItemKey {
    index: u32,
    generation: u32,
}

/// Capability an item needs to be tracked by a [`DynamicQuadtree`].
pub trait QuadItem {
    /// Region currently occupied by the item.
    fn bound(&self) -> Bound;

    /// Node that currently stores the item.
    fn owner(&self) -> Option<NodeId>;

    /// Back-link slot, written by the tree whenever the item changes node. Hosts should not
    /// call it; a cleared link is repaired by the next [`DynamicQuadtree::update`].
    fn set_owner(&mut self, owner: Option<NodeId>);
}

/// Sizing of a [`DynamicQuadtree`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DynamicQuadtreeConfig {
    /// Initial root region.
    pub root: Bound,
    /// Smallest half-extent a child node may have. Nodes whose children would be smaller stay leaves.
    pub min_node_size: f32,
    /// Items a leaf holds before it subdivides. Zero subdivides on the first insert.
    pub leaf_capacity: usize,
    /// Largest half-extent the root may grow to when items leave it.
    pub max_root_half_extent: f32,
}

impl Default for DynamicQuadtreeConfig {
    fn default() -> Self {
        Self {
            root: Bound::new(Vec2::ZERO, Vec2::splat(80.0)),
            min_node_size: 1.0,
            leaf_capacity: 0,
            max_root_half_extent: 5120.0,
        }
    }
}

impl DynamicQuadtreeConfig {
    /// Checks that the values describe a usable tree.
    ///
    /// # Errors
    /// Returns [`IndexError::InvalidConfig`] for non-finite or non-positive sizes.
    pub fn validate(&self) -> Result<(), IndexError> {
        if !self.root.center.is_finite() || !self.root.half_extents.is_finite() {
            return Err(IndexError::InvalidConfig("root bound must be finite"));
        }
        if self.root.half_extents.min_element() <= 0.0 {
            return Err(IndexError::InvalidConfig("root half extents must be positive"));
        }
        if !self.min_node_size.is_finite() || self.min_node_size <= 0.0 {
            return Err(IndexError::InvalidConfig("min_node_size must be positive"));
        }
        if !self.max_root_half_extent.is_finite()
            || self.max_root_half_extent < self.root.half_extents.max_element()
        {
            return Err(IndexError::InvalidConfig(
                "max_root_half_extent must be finite and cover the initial root",
            ));
        }
        Ok(())
    }
}

/// What [`DynamicQuadtree::update`] did with an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The item still fits its node and no reevaluation was requested.
    Unchanged,
    /// The item was removed and reinserted below its current node.
    Reinserted,
    /// The item moved to a node outside its previous node's subtree.
    Relocated,
}

/// Snapshot of one node handed to [`DynamicQuadtree::visit_nodes`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeView {
    /// Node handle.
    pub id: NodeId,
    /// Region covered by the node.
    pub bound: Bound,
    /// Distance from the current root.
    pub depth: u32,
    /// Items stored at this node, excluding descendants.
    pub items: usize,
    /// Items stored at this node and all descendants.
    pub subtree_items: usize,
    /// Whether the node currently has children.
    pub has_children: bool,
}

#[derive(Clone, Debug)]
struct QuadNode {
    bound: Bound,
    parent: Option<NodeId>,
    children: Option<[NodeId; 4]>,
    items: Vec<ItemKey>,
    subtree_items: usize,
    alive: bool,
}

impl QuadNode {
    fn new(bound: Bound, parent: Option<NodeId>) -> Self {
        Self {
            bound,
            parent,
            children: None,
            items: Vec::new(),
            subtree_items: 0,
            alive: true,
        }
    }
}

#[derive(Clone, Debug)]
struct Entry<T> {
    item: T,
    /// Bound seen at the last update.
    last_bound: Bound,
    /// Bound at the last forced reevaluation.
    safe_bound: Bound,
}

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    entry: Option<Entry<T>>,
}

/// Persistent quadtree over items implementing [`QuadItem`].
///
/// # Examples
/// ```
/// use glam::Vec2;
/// use quadflock::prelude::*;
///
/// #[derive(Debug)]
/// struct Marker { bound: Bound, owner: Option<NodeId> }
///
/// impl QuadItem for Marker {
///     fn bound(&self) -> Bound { self.bound }
///     fn owner(&self) -> Option<NodeId> { self.owner }
///     fn set_owner(&mut self, owner: Option<NodeId>) { self.owner = owner; }
/// }
///
/// let mut tree = DynamicQuadtree::new(DynamicQuadtreeConfig::default()).unwrap();
/// let key = tree.insert(Marker { bound: Bound::around(Vec2::new(3.0, 4.0), 0.5), owner: None }).unwrap();
///
/// let mut results = Vec::new();
/// tree.range_query(&Bound::around(Vec2::new(3.0, 4.0), 1.0), &mut results);
/// assert_eq!(results[0].0, key);
/// ```
#[derive(Clone, Debug)]
pub struct DynamicQuadtree<T> {
    config: DynamicQuadtreeConfig,
    nodes: Vec<QuadNode>,
    free_nodes: Vec<NodeId>,
    root: NodeId,
    slots: Vec<Slot<T>>,
    free_slots: Vec<u32>,
    len: usize,
}

impl<T: QuadItem> DynamicQuadtree<T> {
    /// Creates an empty tree.
    ///
    /// # Errors
    /// Returns [`IndexError::InvalidConfig`] when the configuration fails validation.
    pub fn new(config: DynamicQuadtreeConfig) -> Result<Self, IndexError> {
        config.validate()?;
        Ok(Self {
            config,
            nodes: vec![QuadNode::new(config.root, None)],
            free_nodes: Vec::new(),
            root: NodeId(0),
            slots: Vec::new(),
            free_slots: Vec::new(),
            len: 0,
        })
    }

    /// Configuration the tree was built with.
    #[must_use]
    pub fn config(&self) -> &DynamicQuadtreeConfig {
        &self.config
    }

    /// Current root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Region covered by the current root.
    #[must_use]
    pub fn root_bound(&self) -> Bound {
        self.nodes[self.root.index()].bound
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree stores no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of live nodes, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free_nodes.len()
    }

    /// Returns the item behind `key`.
    #[must_use]
    pub fn get(&self, key: ItemKey) -> Option<&T> {
        self.entry(key).ok().map(|entry| &entry.item)
    }

    /// Returns the item behind `key` for mutation. Call [`Self::notify_bound_changed`]
    /// (or [`Self::update`]) after changing its bound.
    #[must_use]
    pub fn get_mut(&mut self, key: ItemKey) -> Option<&mut T> {
        self.entry_mut(key).ok().map(|entry| &mut entry.item)
    }

    /// Iterates over all stored items in slab order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemKey, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entry.as_ref().map(|entry| {
                let key = ItemKey {
                    index: index as u32,
                    generation: slot.generation,
                };
                (key, &entry.item)
            })
        })
    }

    /// Registers `item` with the tree and stores it in the deepest node that holds its bound.
    ///
    /// # Errors
    /// Returns [`IndexError::OutsideRoot`] when the bound lies outside the root and the root
    /// cannot grow far enough; the item is not stored.
    pub fn insert(&mut self, mut item: T) -> Result<ItemKey, IndexError> {
        let bound = item.bound();
        if !self.grow_to_fit(&bound) {
            warn!(?bound, "rejecting item outside the index root");
            return Err(IndexError::OutsideRoot { bound });
        }
        item.set_owner(None);
        let key = self.alloc_slot(Entry {
            item,
            last_bound: bound,
            safe_bound: bound,
        });
        self.len += 1;
        self.insert_at(self.root, key, &bound);
        Ok(key)
    }

    /// Re-homes an item after its bound changed.
    ///
    /// If the item still fits its node, nothing happens unless `force_reevaluate` is set, in
    /// which case it is reinserted from that node (letting a shrunk item sink deeper).
    /// Otherwise it moves to the nearest ancestor that contains it, growing the root if needed.
    ///
    /// # Errors
    /// [`IndexError::UnknownItem`] for a stale key. [`IndexError::EscapedRoot`] when the item
    /// left the root and growth is capped; the item then stays in its current node and every
    /// later update or notification retries the move.
    pub fn update(&mut self, key: ItemKey, force_reevaluate: bool) -> Result<UpdateOutcome, IndexError> {
        let bound = self.entry(key)?.item.bound();
        let outcome = self.rehome(key, &bound, force_reevaluate)?;
        // Only a placement that holds `bound` counts as seen.
        if let Ok(entry) = self.entry_mut(key) {
            entry.last_bound = bound;
        }
        Ok(outcome)
    }

    /// Host signal that the bound of `key` may have changed.
    ///
    /// Compares against the bound seen at the previous successful update. Reevaluation is
    /// forced when the item no longer overlaps the bound it had at the last forced
    /// reevaluation, or when its size changed.
    ///
    /// # Errors
    /// Same as [`Self::update`].
    pub fn notify_bound_changed(&mut self, key: ItemKey) -> Result<UpdateOutcome, IndexError> {
        let entry = self.entry(key)?;
        let bound = entry.item.bound();
        if bound == entry.last_bound {
            return Ok(UpdateOutcome::Unchanged);
        }
        let force = !bound.intersects(&entry.safe_bound) || bound.size() != entry.last_bound.size();
        let outcome = self.update(key, force)?;
        if force && let Ok(entry) = self.entry_mut(key) {
            entry.safe_bound = bound;
        }
        Ok(outcome)
    }

    fn rehome(&mut self, key: ItemKey, bound: &Bound, force_reevaluate: bool) -> Result<UpdateOutcome, IndexError> {
        let bound = *bound;
        let owner = self.entry(key)?.item.owner();

        let Some(owner) = owner.filter(|node| self.is_live(*node)) else {
            // Lost its back-link; detach from wherever it is listed and start over from the root.
            let holder = self.find_holder(key);
            if !self.grow_to_fit(&bound) {
                if let Ok(entry) = self.entry_mut(key) {
                    entry.item.set_owner(holder);
                }
                warn!(?key, ?bound, "item outside the index root has no node");
                return Err(IndexError::EscapedRoot { key });
            }
            if let Some(holder) = holder {
                self.detach(holder, key);
                self.shrink(holder, self.root);
            }
            self.insert_at(self.root, key, &bound);
            return Ok(UpdateOutcome::Relocated);
        };

        if self.nodes[owner.index()].bound.contains(&bound) {
            if !force_reevaluate {
                return Ok(UpdateOutcome::Unchanged);
            }
            self.detach(owner, key);
            self.shrink(owner, owner);
            self.insert_at(owner, key, &bound);
            return Ok(UpdateOutcome::Reinserted);
        }

        let mut target = self.nodes[owner.index()].parent;
        while let Some(node) = target {
            if self.nodes[node.index()].bound.contains(&bound) {
                break;
            }
            target = self.nodes[node.index()].parent;
        }
        let target = match target {
            Some(node) => node,
            None => {
                if !self.grow_to_fit(&bound) {
                    warn!(?key, ?bound, "item escaped the index root; keeping its last node");
                    return Err(IndexError::EscapedRoot { key });
                }
                self.root
            }
        };

        self.detach(owner, key);
        self.shrink(owner, target);
        self.insert_at(target, key, &bound);
        Ok(UpdateOutcome::Relocated)
    }

    /// Detaches and returns the item behind `key`.
    pub fn remove(&mut self, key: ItemKey) -> Option<T> {
        let owner = self.entry(key).ok()?.item.owner();
        if let Some(owner) = owner.filter(|node| self.is_live(*node)) {
            self.detach(owner, key);
            self.shrink(owner, self.root);
        }
        let slot = &mut self.slots[key.index as usize];
        let mut entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(key.index);
        self.len -= 1;
        entry.item.set_owner(None);
        Some(entry.item)
    }

    /// Drops every item and resets the root to its configured region.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(QuadNode::new(self.config.root, None));
        self.free_nodes.clear();
        self.root = NodeId(0);
        for slot in &mut self.slots {
            if slot.entry.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.free_slots.clear();
        self.free_slots.extend((0..self.slots.len() as u32).rev());
        self.len = 0;
    }

    /// Collects every item whose bound intersects `bound`, with that bound.
    ///
    /// `results` is cleared first. Order is unspecified.
    pub fn range_query(&self, bound: &Bound, results: &mut Vec<(ItemKey, Bound)>) {
        results.clear();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            results.extend(self.own_matches(node, *bound));
            self.push_children(node, bound, &mut stack);
        }
    }

    /// Calls `visitor` for every item whose bound intersects `bound`.
    pub fn for_each_in(&self, bound: &Bound, mut visitor: impl FnMut(ItemKey, &T)) {
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            for &key in &self.nodes[node.index()].items {
                if let Ok(entry) = self.entry(key)
                    && entry.item.bound().intersects(bound)
                {
                    visitor(key, &entry.item);
                }
            }
            self.push_children(node, bound, &mut stack);
        }
    }

    /// Same result set as [`Self::range_query`], filtering each selected node's own items in
    /// parallel. Needs exclusive absence of writers, which `&self` guarantees.
    #[must_use]
    pub fn par_range_query(&self, bound: &Bound) -> Vec<(ItemKey, Bound)>
    where
        T: Sync,
    {
        let mut selected = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if !self.nodes[node.index()].items.is_empty() {
                selected.push(node);
            }
            self.push_children(node, bound, &mut stack);
        }
        let query = *bound;
        selected
            .par_iter()
            .flat_map_iter(|&node| self.own_matches(node, query))
            .collect()
    }

    /// Walks the node tree depth-first from the root. Diagnostic only.
    pub fn visit_nodes(&self, mut visitor: impl FnMut(NodeView)) {
        let mut stack = vec![(self.root, 0_u32)];
        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id.index()];
            visitor(NodeView {
                id,
                bound: node.bound,
                depth,
                items: node.items.len(),
                subtree_items: node.subtree_items,
                has_children: node.children.is_some(),
            });
            if let Some(children) = node.children {
                stack.extend(children.iter().rev().map(|&child| (child, depth + 1)));
            }
        }
    }

    /// Whether `node` and all its descendants hold no items. Unknown nodes count as empty.
    #[must_use]
    pub fn is_node_empty(&self, node: NodeId) -> bool {
        self.live_node(node).is_none_or(|node| node.subtree_items == 0)
    }

    /// Region of `node`.
    #[must_use]
    pub fn node_bound(&self, node: NodeId) -> Option<Bound> {
        self.live_node(node).map(|node| node.bound)
    }

    /// Parent of `node`, `None` for the root.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.live_node(node).and_then(|node| node.parent)
    }

    /// Children of `node` in [`Quadrant`] slot order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Option<[NodeId; 4]> {
        self.live_node(node).and_then(|node| node.children)
    }

    /// Items stored directly at `node`.
    #[must_use]
    pub fn node_items(&self, node: NodeId) -> &[ItemKey] {
        self.live_node(node).map_or(&[], |node| node.items.as_slice())
    }

    // --- Private helpers ---

    fn entry(&self, key: ItemKey) -> Result<&Entry<T>, IndexError> {
        self.slots
            .get(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(IndexError::UnknownItem(key))
    }

    fn entry_mut(&mut self, key: ItemKey) -> Result<&mut Entry<T>, IndexError> {
        self.slots
            .get_mut(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.entry.as_mut())
            .ok_or(IndexError::UnknownItem(key))
    }

    fn alloc_slot(&mut self, entry: Entry<T>) -> ItemKey {
        match self.free_slots.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                ItemKey {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                ItemKey { index, generation: 0 }
            }
        }
    }

    fn is_live(&self, node: NodeId) -> bool {
        self.live_node(node).is_some()
    }

    fn live_node(&self, node: NodeId) -> Option<&QuadNode> {
        self.nodes.get(node.index()).filter(|node| node.alive)
    }

    /// Live node listing `key`, found by a full scan.
    fn find_holder(&self, key: ItemKey) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.alive && node.items.contains(&key))
            .map(|index| NodeId(index as u32))
    }

    fn alloc_node(&mut self, bound: Bound, parent: Option<NodeId>) -> NodeId {
        match self.free_nodes.pop() {
            Some(id) => {
                self.nodes[id.index()] = QuadNode::new(bound, parent);
                id
            }
            None => {
                let id = NodeId(self.nodes.len() as u32);
                self.nodes.push(QuadNode::new(bound, parent));
                id
            }
        }
    }

    /// Walks down from `start` and stores `key` in the deepest node holding `bound`.
    fn insert_at(&mut self, start: NodeId, key: ItemKey, bound: &Bound) {
        let mut node = start;
        loop {
            let children = match self.nodes[node.index()].children {
                Some(children) => children,
                None if self.nodes[node.index()].items.len() < self.config.leaf_capacity => {
                    self.attach(node, key);
                    return;
                }
                None => match self.split(node) {
                    Some(children) => children,
                    None => {
                        self.attach(node, key);
                        return;
                    }
                },
            };
            match self.nodes[node.index()].bound.location(bound).single() {
                Some(quadrant) => node = children[quadrant.index()],
                None => {
                    self.attach(node, key);
                    return;
                }
            }
        }
    }

    /// Creates the four children of a leaf and pushes down the items that fit one of them.
    /// Returns `None` when the children would be smaller than the minimum node size.
    fn split(&mut self, node: NodeId) -> Option<[NodeId; 4]> {
        let bound = self.nodes[node.index()].bound;
        if (bound.half_extents * 0.5).min_element() < self.config.min_node_size {
            return None;
        }
        let children = Quadrant::ALL.map(|quadrant| self.alloc_node(bound.quadrant(quadrant), Some(node)));
        self.nodes[node.index()].children = Some(children);
        trace!(node = node.0, ?bound, "split node");

        let residents = std::mem::take(&mut self.nodes[node.index()].items);
        for key in residents {
            let Some(item_bound) = self.entry(key).ok().map(|entry| entry.item.bound()) else {
                continue;
            };
            match bound.location(&item_bound).single() {
                Some(quadrant) => {
                    self.adjust_counts(node, false);
                    self.insert_at(children[quadrant.index()], key, &item_bound);
                }
                None => self.nodes[node.index()].items.push(key),
            }
        }
        Some(children)
    }

    fn attach(&mut self, node: NodeId, key: ItemKey) {
        self.nodes[node.index()].items.push(key);
        if let Ok(entry) = self.entry_mut(key) {
            entry.item.set_owner(Some(node));
        }
        self.adjust_counts(node, true);
    }

    fn detach(&mut self, node: NodeId, key: ItemKey) {
        let items = &mut self.nodes[node.index()].items;
        if let Some(position) = items.iter().position(|&stored| stored == key) {
            let _ = items.swap_remove(position);
            self.adjust_counts(node, false);
        }
        if let Ok(entry) = self.entry_mut(key) {
            entry.item.set_owner(None);
        }
    }

    /// Adds or removes one item from the subtree counts of `node` and its ancestors.
    fn adjust_counts(&mut self, node: NodeId, added: bool) {
        let mut current = Some(node);
        while let Some(id) = current {
            let node = &mut self.nodes[id.index()];
            if added {
                node.subtree_items += 1;
            } else {
                node.subtree_items -= 1;
            }
            current = node.parent;
        }
    }

    /// Drops the child set of the highest empty node on the path from `from` up to `stop`.
    fn shrink(&mut self, from: NodeId, stop: NodeId) {
        let mut highest_empty = None;
        let mut current = Some(from);
        while let Some(id) = current {
            if self.nodes[id.index()].subtree_items != 0 {
                break;
            }
            highest_empty = Some(id);
            if id == stop {
                break;
            }
            current = self.nodes[id.index()].parent;
        }
        if let Some(node) = highest_empty {
            self.release_children(node);
        }
    }

    fn release_children(&mut self, node: NodeId) {
        let Some(children) = self.nodes[node.index()].children.take() else {
            return;
        };
        trace!(node = node.0, "dropping empty child set");
        let mut stack = children.to_vec();
        while let Some(id) = stack.pop() {
            let child = &mut self.nodes[id.index()];
            if let Some(grandchildren) = child.children.take() {
                stack.extend(grandchildren);
            }
            child.alive = false;
            child.items.clear();
            self.free_nodes.push(id);
        }
    }

    /// Grows the root by doubling toward `bound` until it contains it.
    /// Returns `false` when that would exceed the configured maximum root size.
    fn grow_to_fit(&mut self, bound: &Bound) -> bool {
        while !self.root_bound().contains(bound) {
            let old_root = self.root;
            let old_bound = self.root_bound();
            let half_extents = old_bound.half_extents * 2.0;
            if half_extents.max_element() > self.config.max_root_half_extent {
                // A failed growth may leave an empty root with fresh children behind.
                self.shrink(old_root, old_root);
                return false;
            }
            let direction = Quadrant::toward(bound.center - old_bound.center);
            let new_bound = Bound::new(old_bound.center + direction.sign() * old_bound.half_extents, half_extents);
            let new_root = self.alloc_node(new_bound, None);
            let old_slot = direction.opposite();
            let children = Quadrant::ALL.map(|quadrant| {
                if quadrant == old_slot {
                    old_root
                } else {
                    self.alloc_node(new_bound.quadrant(quadrant), Some(new_root))
                }
            });
            self.nodes[old_root.index()].parent = Some(new_root);
            let subtree_items = self.nodes[old_root.index()].subtree_items;
            let root = &mut self.nodes[new_root.index()];
            root.children = Some(children);
            root.subtree_items = subtree_items;
            self.root = new_root;
            debug!(?new_bound, "grew quadtree root");
        }
        true
    }

    fn own_matches(&self, node: NodeId, query: Bound) -> impl Iterator<Item = (ItemKey, Bound)> + '_ {
        self.nodes[node.index()].items.iter().filter_map(move |&key| {
            let bound = self.entry(key).ok()?.item.bound();
            bound.intersects(&query).then_some((key, bound))
        })
    }

    /// Pushes the non-empty children of `node` that `query` can touch.
    fn push_children(&self, node: NodeId, query: &Bound, stack: &mut Vec<NodeId>) {
        let node = &self.nodes[node.index()];
        let Some(children) = node.children else {
            return;
        };
        for quadrant in node.bound.location(query).quadrants() {
            let child = children[quadrant.index()];
            if self.nodes[child.index()].subtree_items > 0 {
                stack.push(child);
            }
        }
    }
}
