#![warn(missing_docs)]
//! `slategraph` is the document model behind a visual block-programming
//! editor.
//!
//! A slate document (as implemented by this library) consists of a collection
//! of blocks, each equipped with an ordered sequence of named, typed ports.
//! Every port can be flagged as an input, an output, or both. Directed links
//! connect an output attachment of one block to an input attachment of a
//! sibling block.
//!
//! The core data structure [`BlockGraph`] identifies nodes and links via
//! [`NodeIndex`] and [`LinkIndex`] handles. On top of the flat link topology
//! the graph maintains a [`Hierarchy`] of composite *group* nodes. Grouping a
//! selection synthesizes boundary ports on the new group and routes every
//! link crossing the group's border through them, so that links never join
//! nodes at different nesting depths. Ungrouping restores the original
//! wiring exactly.
//!
//! Groups can be described by [`GroupInfo`] records for persistence, and
//! rebuilt from them in any order with [`BlockGraph::create_group`] or
//! [`BlockGraph::restore_groups`].
//!
//! # Example
//!
//! ```
//! use slategraph::{BlockGraph, BlockId, LinkKind};
//!
//! let mut graph = BlockGraph::new();
//! let a = graph.add_block(BlockId(1), "Source", "a").unwrap();
//! let b = graph.add_block(BlockId(2), "Filter", "b").unwrap();
//! let c = graph.add_block(BlockId(3), "Sink", "c").unwrap();
//! graph.insert_port(a, 0, "p", 1, false, true).unwrap();
//! graph.insert_port(b, 0, "q", 1, true, false).unwrap();
//! graph.insert_port(b, 1, "r", 1, false, true).unwrap();
//! graph.insert_port(c, 0, "s", 1, true, false).unwrap();
//!
//! graph.connect_ports(a, "p", b, "q", LinkKind::Synchronous).unwrap();
//! let outside = graph.connect_ports(b, "r", c, "s", LinkKind::Synchronous).unwrap();
//!
//! // Group `a` and `b`. The link to `c` now leaves through a boundary port.
//! let group = graph.group([a, b]).unwrap();
//! assert_eq!(graph.ports(group).len(), 1);
//! assert_eq!(graph.link(outside).unwrap().from().node, group);
//!
//! // Ungrouping restores the original wiring.
//! graph.ungroup(group).unwrap();
//! assert_eq!(graph.link(outside).unwrap().from().node, b);
//! ```
//!
//! # Features
//!
//! - `serde` enables serialization of [`GroupInfo`] records and whole
//!   document [`serialize::Snapshot`]s.
//! - `proptest` exposes strategies generating random documents.
//!
use std::num::NonZeroU32;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod algorithms;
mod arena;
pub mod graph;
pub mod group;
pub mod group_info;
pub mod hierarchy;
pub mod link;
pub mod node;
pub mod ports;

#[cfg(feature = "serde")]
pub mod serialize;

#[cfg(feature = "proptest")]
pub mod proptest;

#[doc(inline)]
pub use crate::graph::{BlockError, BlockGraph};
#[doc(inline)]
pub use crate::group::{GroupError, ValidationError, NESTING_SCALE};
#[doc(inline)]
pub use crate::group_info::{BoundaryLink, GroupCreation, GroupInfo, RestoreReport};
#[doc(inline)]
pub use crate::hierarchy::Hierarchy;
#[doc(inline)]
pub use crate::link::{Endpoint, Link, LinkError, LinkKind};
#[doc(inline)]
pub use crate::node::{Node, NodeKind, Point, Size};
#[doc(inline)]
pub use crate::ports::{Port, PortError, PortSet};

/// Half of a node's point space.
///
/// A node with `n` ports exposes `2n` attachment points: points `0..n` are
/// the input attachments of each port, points `n..2n` its output attachments.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Direction {
    /// Input attachment of a port.
    #[default]
    Incoming = 0,
    /// Output attachment of a port.
    Outgoing = 1,
}

impl Direction {
    /// Incoming and outgoing directions.
    pub const BOTH: [Direction; 2] = [Direction::Incoming, Direction::Outgoing];

    /// Returns the opposite direction.
    #[inline(always)]
    pub fn reverse(self) -> Direction {
        match self {
            Direction::Incoming => Direction::Outgoing,
            Direction::Outgoing => Direction::Incoming,
        }
    }
}

macro_rules! handle_type {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        ///
        /// Restricted to be at most `2^31 - 1`. This type admits the *null
        /// pointer optimization* so that an `Option` of it takes as much space
        /// as the handle by itself.
        #[repr(transparent)]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Maximum allowed index.
            const MAX: usize = (u32::MAX / 2) as usize - 1;

            /// Creates a new handle from a `usize`.
            ///
            /// # Panics
            ///
            /// Panics if the index is greater than `2^31 - 2`.
            #[inline]
            pub fn new(index: usize) -> Self {
                match Self::try_from(index) {
                    Ok(handle) => handle,
                    Err(err) => panic!("{err}"),
                }
            }

            /// Returns the index as a `usize`.
            #[inline]
            pub fn index(self) -> usize {
                self.into()
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(handle: $name) -> Self {
                u32::from(handle.0) as usize - 1
            }
        }

        impl TryFrom<usize> for $name {
            type Error = IndexError;

            #[inline]
            fn try_from(index: usize) -> Result<Self, Self::Error> {
                if index > Self::MAX {
                    return Err(IndexError { index });
                }
                NonZeroU32::new(index as u32 + 1)
                    .map(Self)
                    .ok_or(IndexError { index })
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.index())
            }
        }

        impl crate::arena::ArenaIndex for $name {
            #[inline]
            fn from_index(index: usize) -> Self {
                Self::new(index)
            }

            #[inline]
            fn index(self) -> usize {
                self.into()
            }
        }
    };
}

handle_type!(
    /// Handle of a node (block or group) within a [`BlockGraph`].
    NodeIndex
);

handle_type!(
    /// Handle of a link within a [`BlockGraph`].
    LinkIndex
);

/// Error indicating a [`NodeIndex`] or [`LinkIndex`] is too large.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("the index {index} is too large.")]
pub struct IndexError {
    index: usize,
}

/// Persistent identity of a block, assigned by the owner of the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BlockId(pub u32);

/// Persistent identity of a group.
///
/// Group ids are drawn from their own namespace, independent of [`BlockId`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct GroupId(pub u32);

/// Persistent identity of any node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum NodeId {
    /// A leaf block.
    Block(BlockId),
    /// A composite group.
    Group(GroupId),
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn handle_roundtrip() {
        let node = NodeIndex::new(41);
        assert_eq!(node.index(), 41);
        assert_eq!(format!("{node:?}"), "NodeIndex(41)");
        assert_eq!(std::mem::size_of::<Option<LinkIndex>>(), 4);
        assert!(NodeIndex::try_from(usize::MAX).is_err());
    }

    #[test]
    fn direction_reverse() {
        for dir in Direction::BOTH {
            assert_eq!(dir.reverse().reverse(), dir);
            assert_ne!(dir.reverse(), dir);
        }
    }
}
