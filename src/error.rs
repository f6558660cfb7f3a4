//! Error types.

use thiserror::Error;

use crate::dynamic_quadtree::ItemKey;
use crate::geometry::Bound;

/// Errors reported by the dynamic quadtree.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum IndexError {
    /// Indicates configuration values that cannot be used (e.g., non-positive node size).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A new item lies outside the root and the root may not grow far enough to hold it.
    #[error("item bound {bound:?} lies outside the index root and growth is capped")]
    OutsideRoot {
        /// Bound of the rejected item.
        bound: Bound,
    },
    /// A tracked item moved outside the root; it stays in its last valid node.
    #[error("item {key:?} escaped the index root; kept in its last valid node")]
    EscapedRoot {
        /// Key of the item whose update was deferred.
        key: ItemKey,
    },
    /// The key does not refer to a live item.
    #[error("unknown item {0:?}")]
    UnknownItem(ItemKey),
}

/// Errors reported by the flocking simulation.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum FlockError {
    /// Indicates configuration values that cannot be used (e.g., non-positive sense radius).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// An index operation failed.
    #[error(transparent)]
    Index(#[from] IndexError),
}
