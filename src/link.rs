//! Directed links between node ports.

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Direction, LinkIndex, NodeIndex};

/// Scheduling discipline drawn for a link.
///
/// The kind is carried for the presentation and execution layers only; it
/// never influences the topology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum LinkKind {
    /// The consumer waits for every new value of the producer.
    #[default]
    Synchronous,
    /// The consumer reads whatever value is current.
    Asynchronous,
    /// Producer and consumer run one after the other in the same thread.
    Sequential,
}

/// A `(node, port name)` pair at one end of a link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// The node the link is attached to.
    pub node: NodeIndex,
    /// Name of the port on that node.
    pub port: String,
}

impl Endpoint {
    /// Creates a new endpoint.
    pub fn new(node: NodeIndex, port: impl Into<String>) -> Self {
        Self {
            node,
            port: port.into(),
        }
    }
}

/// A directed edge from an output attachment to an input attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub(crate) from: Endpoint,
    pub(crate) to: Endpoint,
    pub(crate) kind: LinkKind,
    /// The group owning this link, when it is one of that group's proxies.
    pub(crate) owner: Option<NodeIndex>,
}

impl Link {
    pub(crate) fn new(from: Endpoint, to: Endpoint, kind: LinkKind) -> Self {
        Self {
            from,
            to,
            kind,
            owner: None,
        }
    }

    /// Source endpoint.
    #[inline]
    pub fn from(&self) -> &Endpoint {
        &self.from
    }

    /// Target endpoint.
    #[inline]
    pub fn to(&self) -> &Endpoint {
        &self.to
    }

    /// Endpoint at the given side, [`Direction::Outgoing`] being the source.
    #[inline]
    pub fn endpoint(&self, side: Direction) -> &Endpoint {
        match side {
            Direction::Outgoing => &self.from,
            Direction::Incoming => &self.to,
        }
    }

    #[inline]
    pub(crate) fn endpoint_mut(&mut self, side: Direction) -> &mut Endpoint {
        match side {
            Direction::Outgoing => &mut self.from,
            Direction::Incoming => &mut self.to,
        }
    }

    /// Scheduling discipline of the link.
    #[inline]
    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    /// The group this link is a proxy of, if any.
    #[inline]
    pub fn proxy_owner(&self) -> Option<NodeIndex> {
        self.owner
    }

    /// Returns whether the link is a group-internal proxy.
    #[inline]
    pub fn is_proxy(&self) -> bool {
        self.owner.is_some()
    }

    /// Returns the side at which the link touches `node`, the source side
    /// winning for links that touch it twice.
    pub fn side_of(&self, node: NodeIndex) -> Option<Direction> {
        if self.from.node == node {
            Some(Direction::Outgoing)
        } else if self.to.node == node {
            Some(Direction::Incoming)
        } else {
            None
        }
    }

    /// Returns whether the link has exactly these endpoints.
    pub fn connects(&self, from: NodeIndex, from_port: &str, to: NodeIndex, to_port: &str) -> bool {
        self.from.node == from
            && self.from.port == from_port
            && self.to.node == to
            && self.to.port == to_port
    }
}

/// Error generated when creating or removing a link.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum LinkError {
    /// The node does not exist.
    #[error("unknown node {node:?}")]
    UnknownNode { node: NodeIndex },
    /// The link does not exist.
    #[error("unknown link {link:?}")]
    UnknownLink { link: LinkIndex },
    /// The node has no port with this name.
    #[error("node {node:?} has no port named {port:?}")]
    UnknownPort { node: NodeIndex, port: String },
    /// The endpoints fail [`BlockGraph::is_valid_link`].
    ///
    /// [`BlockGraph::is_valid_link`]: crate::BlockGraph::is_valid_link
    #[error("can not link point {from_point} of {from:?} to point {to_point} of {to:?}")]
    Invalid {
        from: NodeIndex,
        from_point: usize,
        to: NodeIndex,
        to_point: usize,
    },
    /// The port at the chosen point is not flagged for that direction.
    #[error("port {port:?} of {node:?} can not be attached as {dir:?}")]
    PortDirection {
        node: NodeIndex,
        port: String,
        dir: Direction,
    },
    /// Proxy links are managed by their group.
    #[error("link {link:?} is a proxy of group {group:?}")]
    ProxyLink { link: LinkIndex, group: NodeIndex },
}
