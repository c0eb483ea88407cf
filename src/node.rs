//! Nodes of a [`BlockGraph`] and their incident links.
//!
//! A node is either a leaf block or a composite group. Both carry a name, a
//! [`PortSet`] and the lists of links incident to them; groups additionally
//! own the proxy bookkeeping described in [`crate::group`].
//!
//! [`BlockGraph`]: crate::BlockGraph

use delegate::delegate;
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::group::GroupData;
use crate::ports::{Port, PortSet};
use crate::{BlockId, Direction, GroupId, LinkIndex, NodeId};

/// Inline storage for the links incident to a node in one direction.
pub type LinkList = SmallVec<[LinkIndex; 4]>;

/// A position in the frame of a node's parent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Point {
    #[allow(missing_docs)]
    pub x: f64,
    #[allow(missing_docs)]
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Scales both coordinates by `factor`.
    #[inline]
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// Extent of a node's bounding box, as reported by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Size {
    #[allow(missing_docs)]
    pub width: f64,
    #[allow(missing_docs)]
    pub height: f64,
}

impl Size {
    /// Creates a new size.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Scales both extents by `factor`.
    #[inline]
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(100.0, 40.0)
    }
}

/// Leaf or composite payload of a [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A processing block.
    Block {
        /// Identity assigned by the document owner.
        id: BlockId,
        /// Kind of processing the block performs.
        block_type: String,
    },
    /// A group of nodes.
    Group(GroupData),
}

/// A block or group in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) ports: PortSet,
    pub(crate) in_links: LinkList,
    pub(crate) out_links: LinkList,
    pub(crate) position: Point,
    pub(crate) size: Size,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            ports: PortSet::new(),
            in_links: LinkList::new(),
            out_links: LinkList::new(),
            position: Point::default(),
            size: Size::default(),
            kind,
        }
    }

    /// Display name of the node.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node's ports.
    #[inline]
    pub fn ports(&self) -> &PortSet {
        &self.ports
    }

    delegate! {
        to self.ports {
            /// Returns the position of the first port called `name`.
            #[call(index_of)]
            pub fn port_index(&self, name: &str) -> Option<usize>;
            /// Returns the first port called `name`.
            #[call(by_name)]
            pub fn port(&self, name: &str) -> Option<&Port>;
            /// Number of ports.
            #[call(len)]
            pub fn port_count(&self) -> usize;
            /// Width of the point index space.
            pub fn point_count(&self) -> usize;
            /// Resolves a point index into a port position and its half.
            pub fn resolve_point(&self, point: usize) -> Option<(usize, Direction)>;
            /// Returns the point index of a named port in a given half.
            pub fn point_of(&self, name: &str, direction: Direction) -> Option<usize>;
        }
    }

    /// Position in the frame of the node's parent.
    #[inline]
    pub fn position(&self) -> Point {
        self.position
    }

    /// Bounding box extent used for automatic layout.
    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Leaf or composite payload.
    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns whether the node is a group.
    #[inline]
    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group(_))
    }

    /// Persistent identity of the node.
    pub fn id(&self) -> NodeId {
        match &self.kind {
            NodeKind::Block { id, .. } => NodeId::Block(*id),
            NodeKind::Group(data) => NodeId::Group(data.id),
        }
    }

    /// Block id, if the node is a block.
    pub fn block_id(&self) -> Option<BlockId> {
        match &self.kind {
            NodeKind::Block { id, .. } => Some(*id),
            NodeKind::Group(_) => None,
        }
    }

    /// Group id, if the node is a group.
    pub fn group_id(&self) -> Option<GroupId> {
        self.group_data().map(|data| data.id)
    }

    /// Block type, if the node is a block.
    pub fn block_type(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Block { block_type, .. } => Some(block_type.as_str()),
            NodeKind::Group(_) => None,
        }
    }

    #[inline]
    pub(crate) fn group_data(&self) -> Option<&GroupData> {
        match &self.kind {
            NodeKind::Group(data) => Some(data),
            NodeKind::Block { .. } => None,
        }
    }

    #[inline]
    pub(crate) fn group_data_mut(&mut self) -> Option<&mut GroupData> {
        match &mut self.kind {
            NodeKind::Group(data) => Some(data),
            NodeKind::Block { .. } => None,
        }
    }

    /// Registers a link ending at this node.
    pub fn add_in_link(&mut self, link: LinkIndex) {
        self.in_links.push(link);
    }

    /// Registers a link starting at this node.
    pub fn add_out_link(&mut self, link: LinkIndex) {
        self.out_links.push(link);
    }

    /// Forgets a link in both directions. Does nothing if it is not incident.
    pub fn remove_link(&mut self, link: LinkIndex) {
        self.in_links.retain(|l| *l != link);
        self.out_links.retain(|l| *l != link);
    }

    /// Links ending at this node.
    #[inline]
    pub fn in_links(&self) -> &[LinkIndex] {
        &self.in_links
    }

    /// Links starting at this node.
    #[inline]
    pub fn out_links(&self) -> &[LinkIndex] {
        &self.out_links
    }

    /// Links in a given direction, [`Direction::Incoming`] being the links
    /// that end here.
    #[inline]
    pub fn links(&self, direction: Direction) -> &[LinkIndex] {
        match direction {
            Direction::Incoming => &self.in_links,
            Direction::Outgoing => &self.out_links,
        }
    }

    /// All incident links, incoming first.
    pub fn all_links(&self) -> impl Iterator<Item = LinkIndex> + '_ {
        self.in_links.iter().chain(self.out_links.iter()).copied()
    }

    /// Returns whether the node has no incident links.
    #[inline]
    pub fn is_isolated(&self) -> bool {
        self.in_links.is_empty() && self.out_links.is_empty()
    }
}
