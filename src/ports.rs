//! Ordered port lists attached to a node.
//!
//! A [`PortSet`] holds the named, typed attachment points of a single node.
//! Ports are addressed either by position or by *point index*: a node with
//! `n` ports exposes `2n` points, where points `0..n` are the input
//! attachments and points `n..2n` the output attachments of each port (see
//! [`Direction`]). A port flagged as both input and output is reachable at
//! both of its points.

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Direction, NodeIndex};

/// A named, typed attachment point of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Port {
    /// Name of the port, used to address links.
    pub name: String,
    /// Opaque type tag of the values flowing through the port.
    pub type_tag: i32,
    /// Whether the port accepts incoming links.
    pub input: bool,
    /// Whether the port emits outgoing links.
    pub output: bool,
}

impl Port {
    /// Creates a new port description.
    pub fn new(name: impl Into<String>, type_tag: i32, input: bool, output: bool) -> Self {
        Self {
            name: name.into(),
            type_tag,
            input,
            output,
        }
    }

    /// Returns whether the port can be attached in the given direction.
    #[inline]
    pub fn accepts(&self, direction: Direction) -> bool {
        match direction {
            Direction::Incoming => self.input,
            Direction::Outgoing => self.output,
        }
    }
}

/// Ordered collection of ports.
///
/// Lookups with out of range positions return `None` or `false` instead of
/// panicking, and deletions of missing ports are no-ops. Names are not
/// required to be unique; name lookups resolve to the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PortSet {
    ports: Vec<Port>,
}

impl PortSet {
    /// Creates an empty port set.
    pub const fn new() -> Self {
        Self { ports: Vec::new() }
    }

    /// Inserts a port at `position`, clamped to `0..=len`.
    ///
    /// Returns the position the port was inserted at.
    pub fn insert(
        &mut self,
        position: usize,
        name: impl Into<String>,
        type_tag: i32,
        input: bool,
        output: bool,
    ) -> usize {
        self.insert_port(position, Port::new(name, type_tag, input, output))
    }

    /// Inserts an already built port at `position`, clamped to `0..=len`.
    pub fn insert_port(&mut self, position: usize, port: Port) -> usize {
        let position = position.min(self.ports.len());
        self.ports.insert(position, port);
        position
    }

    /// Appends a port at the end of the list, returning its position.
    pub fn push(&mut self, port: Port) -> usize {
        self.ports.push(port);
        self.ports.len() - 1
    }

    /// Removes the port at `position`. Does nothing if out of range.
    pub fn delete_at(&mut self, position: usize) -> Option<Port> {
        (position < self.ports.len()).then(|| self.ports.remove(position))
    }

    /// Removes the first port called `name`. Does nothing if there is none.
    pub fn delete_by_name(&mut self, name: &str) -> Option<Port> {
        let position = self.index_of(name)?;
        self.delete_at(position)
    }

    /// Returns the position of the first port called `name`.
    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.ports.iter().position(|port| port.name == name)
    }

    /// Returns whether a port with this name exists.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Returns whether the port at `position` is flagged as an input.
    #[inline]
    pub fn is_input(&self, position: usize) -> bool {
        self.get(position).is_some_and(|port| port.input)
    }

    /// Returns whether the port at `position` is flagged as an output.
    #[inline]
    pub fn is_output(&self, position: usize) -> bool {
        self.get(position).is_some_and(|port| port.output)
    }

    /// Returns the type tag of the port at `position`.
    #[inline]
    pub fn type_tag(&self, position: usize) -> Option<i32> {
        self.get(position).map(|port| port.type_tag)
    }

    /// Returns the port at `position`.
    #[inline]
    pub fn get(&self, position: usize) -> Option<&Port> {
        self.ports.get(position)
    }

    /// Returns the first port called `name`.
    #[inline]
    pub fn by_name(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|port| port.name == name)
    }

    /// Number of ports.
    #[inline]
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Returns whether there are no ports.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Width of the point index space, always `2 * len`.
    #[inline]
    pub fn point_count(&self) -> usize {
        2 * self.ports.len()
    }

    /// Resolves a point index into a port position and the half it lies in.
    ///
    /// Returns `None` when the point is out of range.
    pub fn resolve_point(&self, point: usize) -> Option<(usize, Direction)> {
        let n = self.ports.len();
        match point {
            p if p < n => Some((p, Direction::Incoming)),
            p if p < 2 * n => Some((p - n, Direction::Outgoing)),
            _ => None,
        }
    }

    /// Returns the point index of the port at `position` in a given half.
    pub fn point(&self, position: usize, direction: Direction) -> Option<usize> {
        if position >= self.ports.len() {
            return None;
        }
        Some(match direction {
            Direction::Incoming => position,
            Direction::Outgoing => position + self.ports.len(),
        })
    }

    /// Returns the point index of the first port called `name` in a given half.
    pub fn point_of(&self, name: &str, direction: Direction) -> Option<usize> {
        self.point(self.index_of(name)?, direction)
    }

    /// Returns the name of the port a point index refers to.
    pub fn point_name(&self, point: usize) -> Option<&str> {
        let (position, _) = self.resolve_point(point)?;
        Some(self.ports[position].name.as_str())
    }

    /// Iterates over the ports in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Port> {
        self.ports.iter()
    }

    /// Iterates over the port names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.ports.iter().map(|port| port.name.as_str())
    }
}

impl<'a> IntoIterator for &'a PortSet {
    type Item = &'a Port;
    type IntoIter = std::slice::Iter<'a, Port>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for PortSet {
    type Item = Port;
    type IntoIter = std::vec::IntoIter<Port>;

    fn into_iter(self) -> Self::IntoIter {
        self.ports.into_iter()
    }
}

impl FromIterator<Port> for PortSet {
    fn from_iter<T: IntoIterator<Item = Port>>(iter: T) -> Self {
        Self {
            ports: iter.into_iter().collect(),
        }
    }
}

/// Error returned by port edits on a [`BlockGraph`].
///
/// [`BlockGraph`]: crate::BlockGraph
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PortError {
    /// The node does not exist.
    #[error("unknown node {node:?}")]
    UnknownNode { node: NodeIndex },
    /// A port with the same name already exists on the block.
    #[error("node {node:?} already has a port named {name:?}")]
    DuplicateName { node: NodeIndex, name: String },
    /// The node has no port with this name.
    #[error("node {node:?} has no port named {name:?}")]
    UnknownPort { node: NodeIndex, name: String },
    /// Group interfaces are synthesized by grouping and can not be edited.
    #[error("the ports of group {node:?} are managed by its boundary links")]
    GroupInterface { node: NodeIndex },
}
