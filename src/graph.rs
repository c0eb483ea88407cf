//! Main definition of the block graph document.
//!
//! This module defines [`BlockGraph`], the mutable document edited by a
//! block-programming front end. Blocks carry a [`PortSet`] and are connected
//! by directed links between named ports. Links are always stored between
//! structural siblings; the machinery keeping this true while nodes are
//! grouped lives in [`crate::group`].

use std::collections::HashMap;

use thiserror::Error;

use crate::arena::Arena;
use crate::hierarchy::Hierarchy;
use crate::link::{Endpoint, Link, LinkError, LinkKind};
use crate::node::{Node, NodeKind, Point, Size};
use crate::ports::{Port, PortError, PortSet};
use crate::{BlockId, Direction, GroupId, LinkIndex, NodeId, NodeIndex, NESTING_SCALE};

static EMPTY_PORTS: PortSet = PortSet::new();

/// A block-programming document.
///
/// Nodes and links are identified by [`NodeIndex`] and [`LinkIndex`]
/// handles. When a node or link is removed its index is reused on a best
/// effort basis by later insertions, the indices of unaffected entities
/// remain stable.
///
/// Blocks are registered under the [`BlockId`] chosen by the caller, groups
/// under a [`GroupId`] drawn from an independent counter.
#[derive(Debug, Clone)]
pub struct BlockGraph {
    pub(crate) nodes: Arena<NodeIndex, Node>,
    pub(crate) links: Arena<LinkIndex, Link>,
    pub(crate) hierarchy: Hierarchy,
    pub(crate) blocks: HashMap<BlockId, NodeIndex>,
    pub(crate) groups: HashMap<GroupId, NodeIndex>,
    /// Lowest group id never handed out.
    pub(crate) next_group_id: u32,
}

/// Error generated when adding a block to a [`BlockGraph`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum BlockError {
    /// A block with the same id is already registered.
    #[error("a block with id {id} already exists")]
    DuplicateId { id: BlockId },
}

impl BlockGraph {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
            links: Arena::new(),
            hierarchy: Hierarchy::new(),
            blocks: HashMap::new(),
            groups: HashMap::new(),
            next_group_id: 1,
        }
    }

    /// Adds a new top-level block without ports.
    ///
    /// # Errors
    ///
    /// [`BlockError::DuplicateId`] if a block with the same id already
    /// exists. The document is left unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// # use slategraph::{BlockGraph, BlockId};
    /// let mut graph = BlockGraph::new();
    /// let node = graph.add_block(BlockId(3), "Camera", "camera").unwrap();
    /// assert_eq!(graph.block_node(BlockId(3)), Some(node));
    /// assert_eq!(graph.node(node).unwrap().block_type(), Some("Camera"));
    /// ```
    pub fn add_block(
        &mut self,
        id: BlockId,
        block_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<NodeIndex, BlockError> {
        if self.blocks.contains_key(&id) {
            return Err(BlockError::DuplicateId { id });
        }
        let node = self.nodes.insert(Node::new(
            name,
            NodeKind::Block {
                id,
                block_type: block_type.into(),
            },
        ));
        self.blocks.insert(id, node);
        Ok(node)
    }

    /// Removes a node from the document.
    ///
    /// A block is removed together with every link attached to it, and with
    /// the boundary projections of those links. A group is dissolved as by
    /// [`BlockGraph::ungroup`], its members are kept.
    ///
    /// Returns `false` if the node does not exist.
    pub fn remove_node(&mut self, node: NodeIndex) -> bool {
        let Some(data) = self.nodes.get(node) else {
            return false;
        };
        if data.is_group() {
            return self.ungroup(node).is_ok();
        }

        let incident: Vec<LinkIndex> = data.all_links().collect();
        for link in incident {
            self.discard_link(link);
        }
        self.hierarchy.remove(node);
        if let Some(id) = self.nodes.remove(node).and_then(|data| data.block_id()) {
            self.blocks.remove(&id);
        }
        true
    }

    /// Inserts a port on a block at `position`, clamped to the port count.
    ///
    /// Returns the position the port ended up at.
    ///
    /// # Errors
    ///
    ///  - If the node does not exist.
    ///  - If the node is a group, whose ports are synthesized by grouping.
    ///  - If the block already has a port with the same name.
    pub fn insert_port(
        &mut self,
        node: NodeIndex,
        position: usize,
        name: impl Into<String>,
        type_tag: i32,
        input: bool,
        output: bool,
    ) -> Result<usize, PortError> {
        let name = name.into();
        let data = self.block_mut(node)?;
        if data.ports.contains(&name) {
            return Err(PortError::DuplicateName { node, name });
        }
        Ok(data.ports.insert(position, name, type_tag, input, output))
    }

    /// Removes a port from a block, together with every link attached to it.
    ///
    /// # Errors
    ///
    ///  - If the node does not exist.
    ///  - If the node is a group.
    ///  - If the block has no port with this name.
    pub fn remove_port(&mut self, node: NodeIndex, name: &str) -> Result<Port, PortError> {
        let data = self.block_mut(node)?;
        if !data.ports.contains(name) {
            return Err(PortError::UnknownPort {
                node,
                name: name.to_string(),
            });
        }

        let incident: Vec<LinkIndex> = data.all_links().collect();
        let attached: Vec<LinkIndex> = incident
            .into_iter()
            .filter(|&link| {
                self.links.get(link).is_some_and(|l| {
                    Direction::BOTH.iter().any(|&side| {
                        let end = l.endpoint(side);
                        end.node == node && end.port == name
                    })
                })
            })
            .collect();
        for link in attached {
            self.discard_link(link);
        }

        self.block_mut(node)?
            .ports
            .delete_by_name(name)
            .ok_or_else(|| PortError::UnknownPort {
                node,
                name: name.to_string(),
            })
    }

    fn block_mut(&mut self, node: NodeIndex) -> Result<&mut Node, PortError> {
        match self.nodes.get_mut(node) {
            None => Err(PortError::UnknownNode { node }),
            Some(data) if data.is_group() => Err(PortError::GroupInterface { node }),
            Some(data) => Ok(data),
        }
    }

    /// Returns whether a link could join the two points.
    ///
    /// Points address the doubled port space of each node: points `0..n`
    /// are the input attachments, `n..2n` the output attachments. The link
    /// is rejected when both points are on the same node, when the nodes are
    /// not structural siblings, when a point is out of range, and when both
    /// points lie in the same half.
    ///
    /// # Example
    ///
    /// ```
    /// # use slategraph::{BlockGraph, BlockId};
    /// let mut graph = BlockGraph::new();
    /// let a = graph.add_block(BlockId(1), "Source", "a").unwrap();
    /// let b = graph.add_block(BlockId(2), "Sink", "b").unwrap();
    /// graph.insert_port(a, 0, "out", 0, false, true).unwrap();
    /// graph.insert_port(b, 0, "in", 0, true, false).unwrap();
    ///
    /// assert!(graph.is_valid_link(a, 1, b, 0));
    /// assert!(!graph.is_valid_link(a, 1, b, 1)); // output to output
    /// assert!(!graph.is_valid_link(a, 2, b, 0)); // out of range
    /// ```
    pub fn is_valid_link(
        &self,
        from: NodeIndex,
        from_point: usize,
        to: NodeIndex,
        to_point: usize,
    ) -> bool {
        if from == to || !self.hierarchy.are_siblings(from, to) {
            return false;
        }
        let (Some(from_node), Some(to_node)) = (self.nodes.get(from), self.nodes.get(to)) else {
            return false;
        };
        match (
            from_node.resolve_point(from_point),
            to_node.resolve_point(to_point),
        ) {
            (Some((_, from_half)), Some((_, to_half))) => from_half != to_half,
            _ => false,
        }
    }

    /// Links two points, orienting the link from the output half to the
    /// input half regardless of argument order.
    ///
    /// Attaching to a boundary port of a group that is already in use gives
    /// the new link a boundary port of its own.
    ///
    /// # Errors
    ///
    ///  - If either node does not exist.
    ///  - If [`BlockGraph::is_valid_link`] rejects the points.
    ///  - If the port on the output half is not flagged as an output, or the
    ///    port on the input half is not flagged as an input.
    pub fn connect(
        &mut self,
        from: NodeIndex,
        from_point: usize,
        to: NodeIndex,
        to_point: usize,
        kind: LinkKind,
    ) -> Result<LinkIndex, LinkError> {
        for node in [from, to] {
            if !self.nodes.contains(node) {
                return Err(LinkError::UnknownNode { node });
            }
        }
        if !self.is_valid_link(from, from_point, to, to_point) {
            return Err(LinkError::Invalid {
                from,
                from_point,
                to,
                to_point,
            });
        }

        let from_is_output = self
            .nodes
            .get(from)
            .and_then(|node| node.resolve_point(from_point))
            .is_some_and(|(_, half)| half == Direction::Outgoing);
        let ((source, source_point), (target, target_point)) = if from_is_output {
            ((from, from_point), (to, to_point))
        } else {
            ((to, to_point), (from, from_point))
        };

        let source_port = self.attachable_port(source, source_point, Direction::Outgoing)?;
        let target_port = self.attachable_port(target, target_point, Direction::Incoming)?;
        Ok(self.attach_link(
            Endpoint::new(source, source_port),
            Endpoint::new(target, target_port),
            kind,
        ))
    }

    /// Links an output port to an input port, both addressed by name.
    ///
    /// # Errors
    ///
    /// As [`BlockGraph::connect`], plus [`LinkError::UnknownPort`] when a
    /// name does not resolve.
    pub fn connect_ports(
        &mut self,
        from: NodeIndex,
        from_port: &str,
        to: NodeIndex,
        to_port: &str,
        kind: LinkKind,
    ) -> Result<LinkIndex, LinkError> {
        let from_point = self.named_point(from, from_port, Direction::Outgoing)?;
        let to_point = self.named_point(to, to_port, Direction::Incoming)?;
        self.connect(from, from_point, to, to_point, kind)
    }

    fn named_point(
        &self,
        node: NodeIndex,
        port: &str,
        direction: Direction,
    ) -> Result<usize, LinkError> {
        self.nodes
            .get(node)
            .ok_or(LinkError::UnknownNode { node })?
            .point_of(port, direction)
            .ok_or_else(|| LinkError::UnknownPort {
                node,
                port: port.to_string(),
            })
    }

    fn attachable_port(
        &self,
        node: NodeIndex,
        point: usize,
        direction: Direction,
    ) -> Result<String, LinkError> {
        let data = self.nodes.get(node).ok_or(LinkError::UnknownNode { node })?;
        let port = data
            .resolve_point(point)
            .and_then(|(position, _)| data.ports.get(position))
            .ok_or_else(|| LinkError::UnknownPort {
                node,
                port: format!("#{point}"),
            })?;
        if !port.accepts(direction) {
            return Err(LinkError::PortDirection {
                node,
                port: port.name.clone(),
                dir: direction,
            });
        }
        Ok(port.name.clone())
    }

    /// Creates a link between two existing attachments, projecting through
    /// boundary ports as needed. The endpoints must already be validated.
    pub(crate) fn attach_link(
        &mut self,
        from: Endpoint,
        to: Endpoint,
        kind: LinkKind,
    ) -> LinkIndex {
        let (from, from_pending) = self.expose(from, Direction::Outgoing);
        let (to, to_pending) = self.expose(to, Direction::Incoming);
        let link = self.alloc_link(from, to, kind, None);
        for (group, proxy) in [from_pending, to_pending].into_iter().flatten() {
            self.bind_proxy(group, proxy, link);
        }
        link
    }

    /// Returns the link joining two named ports, if any.
    pub fn find_link(
        &self,
        from: NodeIndex,
        from_port: &str,
        to: NodeIndex,
        to_port: &str,
    ) -> Option<LinkIndex> {
        self.out_links(from).iter().copied().find(|&link| {
            self.links
                .get(link)
                .is_some_and(|l| l.connects(from, from_port, to, to_port))
        })
    }

    /// Removes a link.
    ///
    /// When the link enters or leaves a group through a boundary port, the
    /// boundary port and the proxy links behind it are removed as well.
    ///
    /// # Errors
    ///
    ///  - If the link does not exist.
    ///  - If the link is a proxy, which is managed by its group.
    pub fn remove_link(&mut self, link: LinkIndex) -> Result<(), LinkError> {
        let data = self.links.get(link).ok_or(LinkError::UnknownLink { link })?;
        if let Some(group) = data.proxy_owner() {
            return Err(LinkError::ProxyLink { link, group });
        }
        self.discard_link(link);
        Ok(())
    }

    /// Removes a link and every proxy pair it participates in.
    pub(crate) fn discard_link(&mut self, link: LinkIndex) {
        let Some(data) = self.free_link(link) else {
            return;
        };

        // A proxy takes its external link outward with it.
        if let Some(group) = data.owner {
            if let Some(external) = self.unbind_proxy(group, link) {
                if let Some(side) = data.side_of(group) {
                    self.delete_boundary_port(group, &data.endpoint(side).port);
                }
                self.discard_link(external);
            }
        }

        // An external link takes the proxies it was routed through inward.
        for side in Direction::BOTH {
            let end = data.endpoint(side);
            if Some(end.node) == data.owner {
                continue;
            }
            if let Some(proxy) = self.unbind_external(end.node, link) {
                self.delete_boundary_port(end.node, &end.port);
                self.discard_link(proxy);
            }
        }
    }

    /// Stores a new link and registers it with both endpoint nodes.
    pub(crate) fn alloc_link(
        &mut self,
        from: Endpoint,
        to: Endpoint,
        kind: LinkKind,
        owner: Option<NodeIndex>,
    ) -> LinkIndex {
        let (source, target) = (from.node, to.node);
        let mut data = Link::new(from, to, kind);
        data.owner = owner;
        let link = self.links.insert(data);
        if let Some(node) = self.nodes.get_mut(source) {
            node.add_out_link(link);
        }
        if let Some(node) = self.nodes.get_mut(target) {
            node.add_in_link(link);
        }
        link
    }

    /// Removes a link from storage and from its endpoints' adjacency,
    /// leaving any proxy bookkeeping untouched.
    pub(crate) fn free_link(&mut self, link: LinkIndex) -> Option<Link> {
        let data = self.links.remove(link)?;
        for side in Direction::BOTH {
            if let Some(node) = self.nodes.get_mut(data.endpoint(side).node) {
                node.remove_link(link);
            }
        }
        Some(data)
    }

    /// Moves one end of a link to a new attachment.
    pub(crate) fn retarget(&mut self, link: LinkIndex, side: Direction, end: Endpoint) {
        let Some(data) = self.links.get_mut(link) else {
            return;
        };
        let new_node = end.node;
        let old = std::mem::replace(data.endpoint_mut(side), end);
        if let Some(node) = self.nodes.get_mut(old.node) {
            node.remove_link(link);
        }
        if let Some(node) = self.nodes.get_mut(new_node) {
            match side {
                Direction::Outgoing => node.add_out_link(link),
                Direction::Incoming => node.add_in_link(link),
            }
        }
    }

    /// Renames a node. Does nothing if the node does not exist.
    pub fn set_name(&mut self, node: NodeIndex, name: impl Into<String>) {
        if let Some(data) = self.nodes.get_mut(node) {
            data.name = name.into();
        }
    }

    /// Moves a node, in the frame of its parent. Does nothing if the node does
    /// not exist.
    pub fn set_position(&mut self, node: NodeIndex, position: Point) {
        if let Some(data) = self.nodes.get_mut(node) {
            data.position = position;
        }
    }

    /// Records the extent of a node's drawing. Does nothing if the node does
    /// not exist.
    pub fn set_size(&mut self, node: NodeIndex, size: Size) {
        if let Some(data) = self.nodes.get_mut(node) {
            data.size = size;
        }
    }

    /// Drawing scale of a node, [`NESTING_SCALE`] per enclosing group.
    pub fn scale(&self, node: NodeIndex) -> f64 {
        let depth = self.hierarchy.depth(node);
        NESTING_SCALE.powi(depth.try_into().unwrap_or(i32::MAX))
    }

    /// Number of groups enclosing the node.
    #[inline]
    pub fn depth(&self, node: NodeIndex) -> usize {
        self.hierarchy.depth(node)
    }

    /// Returns the node data.
    #[inline]
    pub fn node(&self, node: NodeIndex) -> Option<&Node> {
        self.nodes.get(node)
    }

    /// Returns the link data.
    #[inline]
    pub fn link(&self, link: LinkIndex) -> Option<&Link> {
        self.links.get(link)
    }

    /// Ports of a node. Empty for nodes that do not exist.
    #[inline]
    pub fn ports(&self, node: NodeIndex) -> &PortSet {
        self.nodes.get(node).map_or(&EMPTY_PORTS, |data| &data.ports)
    }

    /// Links ending at a node.
    #[inline]
    pub fn in_links(&self, node: NodeIndex) -> &[LinkIndex] {
        self.nodes.get(node).map_or(&[][..], |data| data.in_links())
    }

    /// Links starting at a node.
    #[inline]
    pub fn out_links(&self, node: NodeIndex) -> &[LinkIndex] {
        self.nodes.get(node).map_or(&[][..], |data| data.out_links())
    }

    /// Links incident to a node in a given direction.
    #[inline]
    pub fn links(&self, node: NodeIndex, direction: Direction) -> &[LinkIndex] {
        match direction {
            Direction::Incoming => self.in_links(node),
            Direction::Outgoing => self.out_links(node),
        }
    }

    /// Structural parent of a node, `None` at the top level.
    #[inline]
    pub fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.hierarchy.parent(node)
    }

    /// Direct members of a group, in insertion order.
    #[inline]
    pub fn children(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.hierarchy.children(node)
    }

    /// Nodes at the top level of the document.
    pub fn roots(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes_iter()
            .filter(|&node| self.hierarchy.parent(node).is_none())
    }

    /// The structural nesting of the document.
    #[inline]
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Node holding the block with the given id.
    #[inline]
    pub fn block_node(&self, id: BlockId) -> Option<NodeIndex> {
        self.blocks.get(&id).copied()
    }

    /// Node holding the group with the given id.
    #[inline]
    pub fn group_node(&self, id: GroupId) -> Option<NodeIndex> {
        self.groups.get(&id).copied()
    }

    /// Node holding the block or group with the given id.
    pub fn node_by_id(&self, id: NodeId) -> Option<NodeIndex> {
        match id {
            NodeId::Block(id) => self.block_node(id),
            NodeId::Group(id) => self.group_node(id),
        }
    }

    /// Returns whether the node exists.
    #[inline]
    pub fn contains_node(&self, node: NodeIndex) -> bool {
        self.nodes.contains(node)
    }

    /// Returns whether the link exists.
    #[inline]
    pub fn contains_link(&self, link: LinkIndex) -> bool {
        self.links.contains(link)
    }

    /// Returns whether the document has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    /// Number of nodes, blocks and groups alike.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of links, proxies included.
    #[inline]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Upper bound of the node indices in use.
    #[inline]
    pub fn node_capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Iterates over the nodes in index order.
    pub fn nodes_iter(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes.iter().map(|(node, _)| node)
    }

    /// Iterates over the links in index order.
    pub fn links_iter(&self) -> impl Iterator<Item = LinkIndex> + '_ {
        self.links.iter().map(|(link, _)| link)
    }

    /// Iterates over the blocks, skipping groups.
    pub fn blocks_iter(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes
            .iter()
            .filter(|(_, data)| !data.is_group())
            .map(|(node, _)| node)
    }

    /// Removes every node and link.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.hierarchy.clear();
        self.blocks.clear();
        self.groups.clear();
        self.next_group_id = 1;
    }
}

impl Default for BlockGraph {
    fn default() -> Self {
        Self::new()
    }
}
