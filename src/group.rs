//! Composite nodes and boundary projection.
//!
//! A group node structurally owns a set of child nodes. Since links only
//! ever join siblings, every link crossing the border of a group is split in
//! two when its inner endpoint is added to the group:
//!
//! - the *external* link keeps its identity but now ends at a synthesized
//!   boundary port of the group, and
//! - a *proxy* link, owned by the group, joins that boundary port to the
//!   real port of the member.
//!
//! Each group keeps a bijection between its proxies and the external links
//! they stand for, with exactly one boundary port per pair. When both ends
//! of a link end up inside the same group the projection is retracted, and
//! dissolving a group rewires every external link back to the member it
//! originally pointed at.
//!
//! ```text
//!   a.p ──▶ b.q            group {b}           a.p ──▶ G.[2: q] ┄┄▶ b.q
//!                                                   external    proxy
//! ```

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, trace};

use crate::link::Endpoint;
use crate::node::{Node, NodeKind, Point};
use crate::ports::Port;
use crate::{BlockGraph, Direction, GroupId, LinkIndex, NodeIndex};

/// Drawing scale applied to the members of a group, per nesting level.
pub const NESTING_SCALE: f64 = 0.3;

/// Bookkeeping of a group node.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupData {
    pub(crate) id: GroupId,
    pub(crate) abstract_view: bool,
    /// Proxy link to the external link it stands for.
    proxies: BTreeMap<LinkIndex, LinkIndex>,
    /// Inverse of `proxies`.
    externals: BTreeMap<LinkIndex, LinkIndex>,
}

impl GroupData {
    pub(crate) fn new(id: GroupId) -> Self {
        Self {
            id,
            abstract_view: false,
            proxies: BTreeMap::new(),
            externals: BTreeMap::new(),
        }
    }

    /// Persistent id of the group.
    #[inline]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Whether the group is drawn collapsed, hiding its members.
    #[inline]
    pub fn is_abstract_view(&self) -> bool {
        self.abstract_view
    }

    /// Number of proxy pairs, equal to the number of boundary ports.
    #[inline]
    pub fn proxy_count(&self) -> usize {
        self.proxies.len()
    }

    /// Iterates over the `(proxy, external)` pairs in proxy order.
    pub fn proxies(&self) -> impl Iterator<Item = (LinkIndex, LinkIndex)> + '_ {
        self.proxies.iter().map(|(&proxy, &external)| (proxy, external))
    }

    /// External link a proxy stands for.
    #[inline]
    pub fn external_of(&self, proxy: LinkIndex) -> Option<LinkIndex> {
        self.proxies.get(&proxy).copied()
    }

    /// Proxy carrying an external link into the group.
    #[inline]
    pub fn proxy_of(&self, external: LinkIndex) -> Option<LinkIndex> {
        self.externals.get(&external).copied()
    }

    fn bind(&mut self, proxy: LinkIndex, external: LinkIndex) {
        self.proxies.insert(proxy, external);
        self.externals.insert(external, proxy);
    }

    fn unbind_proxy(&mut self, proxy: LinkIndex) -> Option<LinkIndex> {
        let external = self.proxies.remove(&proxy)?;
        self.externals.remove(&external);
        Some(external)
    }

    fn unbind_external(&mut self, external: LinkIndex) -> Option<LinkIndex> {
        let proxy = self.externals.remove(&external)?;
        self.proxies.remove(&proxy);
        Some(proxy)
    }
}

/// Error generated by grouping operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GroupError {
    /// The node does not exist.
    #[error("unknown node {node:?}")]
    UnknownNode { node: NodeIndex },
    /// The node exists but is a block.
    #[error("node {node:?} is not a group")]
    NotAGroup { node: NodeIndex },
    /// Nothing was selected.
    #[error("can not group an empty selection")]
    EmptySelection,
    /// Members of a group must share a parent.
    #[error("nodes {first:?} and {other:?} are not siblings")]
    NotSiblings { first: NodeIndex, other: NodeIndex },
    /// A group can not be nested within itself.
    #[error("adding {node:?} to group {group:?} would introduce a cycle")]
    Cycle { node: NodeIndex, group: NodeIndex },
}

/// Broken structural invariant found by [`BlockGraph::validate`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    /// A link ends at a node that does not exist.
    #[error("link {link:?} ends at missing node {node:?}")]
    DanglingEndpoint { link: LinkIndex, node: NodeIndex },
    /// A link ends at a port the node does not have.
    #[error("link {link:?} ends at missing port {port:?} of {node:?}")]
    UnknownPort {
        link: LinkIndex,
        node: NodeIndex,
        port: String,
    },
    /// Link storage and node adjacency disagree.
    #[error("link {link:?} is not registered with node {node:?}")]
    Unregistered { link: LinkIndex, node: NodeIndex },
    /// A plain link joins nodes with different parents.
    #[error("link {link:?} joins nodes that are not siblings")]
    NotSiblings { link: LinkIndex },
    /// A proxy does not join a boundary port to a member of its group.
    #[error("proxy {link:?} of group {group:?} is malformed")]
    ProxyEndpoint { group: NodeIndex, link: LinkIndex },
    /// An external link does not end at the boundary port of its proxy.
    #[error("external link {link:?} of group {group:?} misses its boundary port")]
    ExternalEndpoint { group: NodeIndex, link: LinkIndex },
    /// A link touching a group takes no part in its proxy bijection.
    #[error("link {link:?} touches group {group:?} without a proxy pair")]
    Unbound { group: NodeIndex, link: LinkIndex },
    /// Boundary ports and proxy pairs are not in one to one correspondence.
    #[error("group {group:?} has {ports} boundary ports but {proxies} proxies")]
    ProxyCount {
        group: NodeIndex,
        ports: usize,
        proxies: usize,
    },
}

impl BlockGraph {
    /// Adds a new empty group at the top level.
    ///
    /// Members are added with [`BlockGraph::add_to_group`].
    pub fn add_group(&mut self, name: impl Into<String>) -> NodeIndex {
        self.insert_group(None, name)
    }

    /// Adds a group node, keeping the requested id when it is still free.
    pub(crate) fn insert_group(
        &mut self,
        id: Option<GroupId>,
        name: impl Into<String>,
    ) -> NodeIndex {
        self.insert_group_avoiding(id, name, &BTreeSet::new())
    }

    /// As [`BlockGraph::insert_group`], but a fresh id is never drawn from
    /// `reserved`.
    pub(crate) fn insert_group_avoiding(
        &mut self,
        id: Option<GroupId>,
        name: impl Into<String>,
        reserved: &BTreeSet<GroupId>,
    ) -> NodeIndex {
        let id = match id {
            Some(id) if !self.groups.contains_key(&id) => id,
            _ => self.fresh_group_id(reserved),
        };
        self.next_group_id = self.next_group_id.max(id.0.saturating_add(1));
        let node = self
            .nodes
            .insert(Node::new(name, NodeKind::Group(GroupData::new(id))));
        self.groups.insert(id, node);
        node
    }

    fn fresh_group_id(&self, reserved: &BTreeSet<GroupId>) -> GroupId {
        let mut id = self.next_group_id;
        while self.groups.contains_key(&GroupId(id)) || reserved.contains(&GroupId(id)) {
            id += 1;
        }
        GroupId(id)
    }

    /// Group bookkeeping of a node, `None` for blocks.
    #[inline]
    pub fn group_data(&self, node: NodeIndex) -> Option<&GroupData> {
        self.nodes.get(node)?.group_data()
    }

    /// Returns whether the node is a group.
    #[inline]
    pub fn is_group(&self, node: NodeIndex) -> bool {
        self.group_data(node).is_some()
    }

    /// Moves `node` into `group`, projecting the links crossing the new
    /// border onto boundary ports of the group.
    ///
    /// The node must be a sibling of the group. Its position is scaled by
    /// [`NESTING_SCALE`] into the group's frame.
    ///
    /// For every link incident to the node:
    ///  - a proxy of the node itself (when it is a group) is left alone,
    ///  - a link to anything but the group is projected onto a new boundary
    ///    port,
    ///  - a link from one of the group's boundary ports, projected when its
    ///    other end joined the group earlier, is retracted back to that
    ///    member.
    ///
    /// # Errors
    ///
    ///  - If either node does not exist, or `group` is a block.
    ///  - If the node is the group or one of its ancestors.
    ///  - If the node and the group are not siblings.
    ///
    /// # Example
    ///
    /// ```
    /// # use slategraph::{BlockGraph, BlockId, LinkKind};
    /// let mut graph = BlockGraph::new();
    /// let a = graph.add_block(BlockId(1), "Source", "a").unwrap();
    /// let b = graph.add_block(BlockId(2), "Sink", "b").unwrap();
    /// graph.insert_port(a, 0, "out", 0, false, true).unwrap();
    /// graph.insert_port(b, 0, "in", 0, true, false).unwrap();
    /// let link = graph.connect_ports(a, "out", b, "in", LinkKind::Synchronous).unwrap();
    ///
    /// let group = graph.add_group("sinks");
    /// graph.add_to_group(group, b).unwrap();
    /// assert_eq!(graph.ports(group).names().collect::<Vec<_>>(), ["2: in"]);
    /// assert_eq!(graph.link(link).unwrap().to().node, group);
    /// ```
    pub fn add_to_group(&mut self, group: NodeIndex, node: NodeIndex) -> Result<(), GroupError> {
        if !self.nodes.get(group).ok_or(GroupError::UnknownNode { node: group })?.is_group() {
            return Err(GroupError::NotAGroup { node: group });
        }
        if !self.nodes.contains(node) {
            return Err(GroupError::UnknownNode { node });
        }
        if node == group || self.hierarchy.is_ancestor(node, group) {
            return Err(GroupError::Cycle { node, group });
        }
        if !self.hierarchy.are_siblings(node, group) {
            return Err(GroupError::NotSiblings {
                first: group,
                other: node,
            });
        }

        self.hierarchy.detach(node);
        self.hierarchy
            .attach_last(node, group)
            .map_err(|_| GroupError::Cycle { node, group })?;

        let Some(data) = self.nodes.get_mut(node) else {
            return Err(GroupError::UnknownNode { node });
        };
        data.position = data.position.scaled(NESTING_SCALE);
        let incoming = data.in_links.clone();
        let outgoing = data.out_links.clone();

        for link in incoming {
            self.project(group, link, Direction::Incoming);
        }
        for link in outgoing {
            self.project(group, link, Direction::Outgoing);
        }
        trace!(?group, ?node, "added node to group");
        Ok(())
    }

    /// Projects or retracts one link of a node just added to `group`. `side`
    /// is the side of the link at the added node.
    fn project(&mut self, group: NodeIndex, link: LinkIndex, side: Direction) {
        let Some(data) = self.links.get(link) else {
            return;
        };
        let added = data.endpoint(side).clone();
        let linked = data.endpoint(side.reverse()).clone();
        let kind = data.kind;

        // Already resolved inside the added subgroup.
        if data.owner == Some(added.node) {
            return;
        }

        if linked.node != group {
            let Some(port) = self.nodes.get(added.node).and_then(|n| n.port(&added.port)) else {
                panic!(
                    "link {link:?} is attached to missing port {:?} of {:?}",
                    added.port, added.node
                );
            };
            let type_tag = port.type_tag;
            let input = side == Direction::Incoming;
            let name = self.unique_port_name(group, self.boundary_name(&added));
            self.push_boundary_port(group, Port::new(name.clone(), type_tag, input, !input));

            let boundary = Endpoint::new(group, name);
            let proxy = if input {
                self.alloc_link(boundary.clone(), added.clone(), kind, Some(group))
            } else {
                self.alloc_link(added.clone(), boundary.clone(), kind, Some(group))
            };
            self.replace_external(added.node, link, proxy);
            self.bind_proxy(group, proxy, link);
            self.retarget(link, side, boundary);
            trace!(?group, ?link, ?proxy, "projected link onto boundary port");
        } else {
            let Some(proxy) = self.unbind_external(group, link) else {
                panic!("link {link:?} ends at group {group:?} without a proxy");
            };
            let Some(proxy_data) = self.free_link(proxy) else {
                panic!("proxy {proxy:?} of group {group:?} does not exist");
            };
            let inner = proxy_data.endpoint(side.reverse()).clone();
            self.retarget(link, side.reverse(), inner.clone());
            self.replace_external(inner.node, proxy, link);
            self.delete_boundary_port(group, &linked.port);
            trace!(?group, ?link, ?proxy, "retracted link from boundary port");
        }
    }

    /// Joins a selection of nodes into a new group named `"Group"`.
    ///
    /// Selected nodes nested within another selected node are dropped from
    /// the selection. The new group is created next to the members and
    /// placed at the mean of their positions.
    ///
    /// # Errors
    ///
    ///  - If a selected node does not exist.
    ///  - If the selection is empty.
    ///  - If the top-most selected nodes do not share a parent.
    pub fn group(
        &mut self,
        selection: impl IntoIterator<Item = NodeIndex>,
    ) -> Result<NodeIndex, GroupError> {
        let selection: Vec<NodeIndex> = selection.into_iter().unique().collect();
        if let Some(&node) = selection.iter().find(|&&n| !self.nodes.contains(n)) {
            return Err(GroupError::UnknownNode { node });
        }
        let members: Vec<NodeIndex> = selection
            .iter()
            .copied()
            .filter(|&n| !self.hierarchy.ancestors(n).any(|a| selection.contains(&a)))
            .collect();

        let Some(&first) = members.first() else {
            return Err(GroupError::EmptySelection);
        };
        let parent = self.hierarchy.parent(first);
        if let Some(&other) = members.iter().find(|&&m| self.hierarchy.parent(m) != parent) {
            return Err(GroupError::NotSiblings { first, other });
        }

        let (sum_x, sum_y) = members
            .iter()
            .filter_map(|&m| self.nodes.get(m))
            .fold((0.0, 0.0), |(x, y), n| (x + n.position.x, y + n.position.y));
        let count = members.len() as f64;

        let group = self.insert_group(None, "Group");
        self.place_group(group, parent);
        self.set_position(group, Point::new(sum_x / count, sum_y / count));
        for &member in &members {
            self.add_to_group(group, member)?;
        }
        debug!(?group, members = members.len(), "joined selection into group");
        Ok(group)
    }

    /// Nests a fresh, link-less group under `parent`.
    pub(crate) fn place_group(&mut self, group: NodeIndex, parent: Option<NodeIndex>) {
        if let Some(parent) = parent {
            let attached = self.hierarchy.attach_last(group, parent);
            debug_assert!(attached.is_ok(), "fresh group {group:?} was already attached");
        }
    }

    /// Dissolves a group, rewiring every external link to the member it
    /// stands for. The members move to the group's parent.
    ///
    /// Returns the former members.
    ///
    /// # Errors
    ///
    ///  - If the node does not exist or is a block.
    ///
    /// # Panics
    ///
    /// Panics if the proxy bookkeeping of the group is inconsistent.
    pub fn ungroup(&mut self, group: NodeIndex) -> Result<Vec<NodeIndex>, GroupError> {
        let data = self
            .nodes
            .get(group)
            .ok_or(GroupError::UnknownNode { node: group })?;
        let Some(group_data) = data.group_data() else {
            return Err(GroupError::NotAGroup { node: group });
        };
        let id = group_data.id;
        let pairs: Vec<(LinkIndex, LinkIndex)> = group_data.proxies().collect();

        for (proxy, external) in pairs {
            self.unbind_proxy(group, proxy);
            let Some(proxy_data) = self.free_link(proxy) else {
                panic!("proxy {proxy:?} of group {group:?} does not exist");
            };
            let Some(group_side) = proxy_data.side_of(group) else {
                panic!("proxy {proxy:?} does not touch its group {group:?}");
            };
            let inner = proxy_data.endpoint(group_side.reverse()).clone();
            let port = proxy_data.endpoint(group_side).port.clone();

            let Some(external_side) = self.links.get(external).and_then(|l| {
                let side = l.side_of(group)?;
                (l.endpoint(side).port == port).then_some(side)
            }) else {
                panic!(
                    "external link {external:?} does not end at boundary port {port:?} of {group:?}"
                );
            };
            self.retarget(external, external_side, inner.clone());
            self.replace_external(inner.node, proxy, external);
            self.delete_boundary_port(group, &port);
        }
        assert!(
            self.nodes.get(group).is_some_and(|n| n.is_isolated()),
            "group {group:?} has links outside of its proxy pairs"
        );

        let parent = self.hierarchy.parent(group);
        let members: Vec<NodeIndex> = self.hierarchy.children(group).collect();
        for &member in &members {
            self.hierarchy.detach(member);
            if parent.is_some() {
                let attached = self.hierarchy.attach_before(member, group);
                debug_assert!(attached.is_ok());
            }
            if let Some(data) = self.nodes.get_mut(member) {
                data.position = data.position.scaled(1.0 / NESTING_SCALE);
            }
        }
        self.hierarchy.remove(group);
        self.nodes.remove(group);
        self.groups.remove(&id);
        debug!(group = %id, members = members.len(), "dissolved group");
        Ok(members)
    }

    /// Switches a group between the collapsed and the detailed view.
    ///
    /// # Errors
    ///
    /// If the node does not exist or is a block.
    pub fn set_abstract_view(
        &mut self,
        group: NodeIndex,
        abstract_view: bool,
    ) -> Result<(), GroupError> {
        let data = self
            .nodes
            .get_mut(group)
            .ok_or(GroupError::UnknownNode { node: group })?;
        let group_data = data
            .group_data_mut()
            .ok_or(GroupError::NotAGroup { node: group })?;
        group_data.abstract_view = abstract_view;
        Ok(())
    }

    /// Returns whether the node is a group drawn in the collapsed view.
    pub fn is_abstract_view(&self, node: NodeIndex) -> bool {
        self.group_data(node).is_some_and(|data| data.abstract_view)
    }

    /// Returns whether a node is hidden by a collapsed ancestor group.
    pub fn is_hidden(&self, node: NodeIndex) -> bool {
        self.hierarchy
            .ancestors(node)
            .any(|ancestor| self.is_abstract_view(ancestor))
    }

    /// Returns the `(proxy, external)` pair behind a boundary port.
    pub fn boundary_link(&self, group: NodeIndex, port: &str) -> Option<(LinkIndex, LinkIndex)> {
        let data = self.group_data(group)?;
        data.proxies().find(|&(proxy, _)| {
            self.links.get(proxy).is_some_and(|l| {
                l.side_of(group)
                    .is_some_and(|side| l.endpoint(side).port == port)
            })
        })
    }

    /// Follows an endpoint through boundary ports down to the block port it
    /// stands for.
    pub fn resolve_endpoint(&self, end: &Endpoint) -> Endpoint {
        let mut end = end.clone();
        while let Some((proxy, _)) = self.boundary_link(end.node, &end.port) {
            let Some(inner) = self.links.get(proxy).and_then(|l| {
                let side = l.side_of(end.node)?;
                Some(l.endpoint(side.reverse()).clone())
            }) else {
                break;
            };
            end = inner;
        }
        end
    }

    /// Returns an attachment for a new link at `end`, `direction` being the
    /// side of the new link there.
    ///
    /// Block ports are returned as is. A boundary port of a group is already
    /// bound to a proxy pair, so the new link gets a fresh boundary port and
    /// proxy of its own, recursively through nested groups. The returned
    /// `(group, proxy)` must be bound to the new link once it exists.
    pub(crate) fn expose(
        &mut self,
        end: Endpoint,
        direction: Direction,
    ) -> (Endpoint, Option<(NodeIndex, LinkIndex)>) {
        if !self.is_group(end.node) {
            return (end, None);
        }
        let group = end.node;
        let Some((existing, _)) = self.boundary_link(group, &end.port) else {
            panic!("boundary port {:?} of group {group:?} has no proxy", end.port);
        };
        let Some(port) = self.nodes.get(group).and_then(|n| n.port(&end.port)).cloned() else {
            panic!("group {group:?} has no boundary port {:?}", end.port);
        };
        let Some((inner, kind)) = self.links.get(existing).and_then(|l| {
            let side = l.side_of(group)?;
            Some((l.endpoint(side.reverse()).clone(), l.kind))
        }) else {
            panic!("proxy {existing:?} does not touch its group {group:?}");
        };

        let name = self.unique_port_name(group, self.boundary_name(&inner));
        let (inner, pending) = self.expose(inner, direction);
        self.push_boundary_port(group, Port { name: name.clone(), ..port });

        let boundary = Endpoint::new(group, name);
        let proxy = match direction {
            Direction::Outgoing => self.alloc_link(inner, boundary.clone(), kind, Some(group)),
            Direction::Incoming => self.alloc_link(boundary.clone(), inner, kind, Some(group)),
        };
        if let Some((subgroup, sub_proxy)) = pending {
            self.bind_proxy(subgroup, sub_proxy, proxy);
        }
        trace!(?group, ?proxy, "exposed boundary port for a new link");
        (boundary, Some((group, proxy)))
    }

    /// Canonical boundary port name for a projected endpoint.
    fn boundary_name(&self, end: &Endpoint) -> String {
        match self.nodes.get(end.node).and_then(|n| n.block_id()) {
            Some(id) => format!("{id}: {}", end.port),
            None => end.port.clone(),
        }
    }

    fn unique_port_name(&self, node: NodeIndex, base: String) -> String {
        let ports = self.ports(node);
        if !ports.contains(&base) {
            return base;
        }
        let unique = (2..)
            .map(|k| format!("{base}#{k}"))
            .find(|name| !ports.contains(name));
        unique.unwrap_or(base)
    }

    fn push_boundary_port(&mut self, group: NodeIndex, port: Port) {
        if let Some(data) = self.nodes.get_mut(group) {
            data.ports.push(port);
        }
    }

    pub(crate) fn delete_boundary_port(&mut self, group: NodeIndex, name: &str) {
        if let Some(data) = self.nodes.get_mut(group) {
            data.ports.delete_by_name(name);
        }
    }

    pub(crate) fn bind_proxy(&mut self, group: NodeIndex, proxy: LinkIndex, external: LinkIndex) {
        if let Some(data) = self.nodes.get_mut(group).and_then(|n| n.group_data_mut()) {
            data.bind(proxy, external);
        }
    }

    pub(crate) fn unbind_proxy(&mut self, group: NodeIndex, proxy: LinkIndex) -> Option<LinkIndex> {
        self.nodes
            .get_mut(group)?
            .group_data_mut()?
            .unbind_proxy(proxy)
    }

    pub(crate) fn unbind_external(
        &mut self,
        node: NodeIndex,
        external: LinkIndex,
    ) -> Option<LinkIndex> {
        self.nodes
            .get_mut(node)?
            .group_data_mut()?
            .unbind_external(external)
    }

    /// Hands a subgroup's proxy pair over from one external link to another.
    fn replace_external(&mut self, node: NodeIndex, old: LinkIndex, new: LinkIndex) {
        if let Some(data) = self.nodes.get_mut(node).and_then(|n| n.group_data_mut()) {
            if let Some(proxy) = data.unbind_external(old) {
                data.bind(proxy, new);
            }
        }
    }

    /// Checks the structural invariants of the document.
    ///
    /// Every link must end at existing ports and be registered with its
    /// nodes. Plain links must join siblings. Each group must pair every
    /// boundary port with exactly one proxy to a member and one external link
    /// ending at that port, and every link touching the group must take part
    /// in such a pair.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (link, data) in self.links.iter() {
            for side in Direction::BOTH {
                let end = data.endpoint(side);
                let Some(node) = self.nodes.get(end.node) else {
                    return Err(ValidationError::DanglingEndpoint {
                        link,
                        node: end.node,
                    });
                };
                if !node.ports.contains(&end.port) {
                    return Err(ValidationError::UnknownPort {
                        link,
                        node: end.node,
                        port: end.port.clone(),
                    });
                }
                if !node.links(side).contains(&link) {
                    return Err(ValidationError::Unregistered {
                        link,
                        node: end.node,
                    });
                }
            }

            match data.owner {
                None if !self.hierarchy.are_siblings(data.from.node, data.to.node) => {
                    return Err(ValidationError::NotSiblings { link });
                }
                None => {}
                Some(group) => {
                    let bound = self
                        .group_data(group)
                        .is_some_and(|g| g.external_of(link).is_some());
                    let inner_is_member = data.side_of(group).is_some_and(|side| {
                        let inner = data.endpoint(side.reverse()).node;
                        self.hierarchy.parent(inner) == Some(group)
                    });
                    if !bound || !inner_is_member {
                        return Err(ValidationError::ProxyEndpoint { group, link });
                    }
                }
            }
        }

        for (index, node) in self.nodes.iter() {
            for link in node.all_links() {
                if !self.links.get(link).is_some_and(|l| l.side_of(index).is_some()) {
                    return Err(ValidationError::Unregistered { link, node: index });
                }
            }
            let group = index;
            let Some(data) = node.group_data() else {
                continue;
            };

            let ports = node.ports.len();
            let proxies = data.proxy_count();
            if ports != proxies || data.externals.len() != proxies {
                return Err(ValidationError::ProxyCount {
                    group,
                    ports,
                    proxies,
                });
            }
            for name in node.ports.names() {
                if self.boundary_link(group, name).is_none() {
                    return Err(ValidationError::ProxyCount {
                        group,
                        ports,
                        proxies,
                    });
                }
            }

            for (proxy, external) in data.proxies() {
                let port = self.links.get(proxy).and_then(|l| {
                    let side = l.side_of(group)?;
                    (l.owner == Some(group)).then(|| l.endpoint(side).port.as_str())
                });
                let Some(port) = port else {
                    return Err(ValidationError::ProxyEndpoint { group, link: proxy });
                };
                let ends_at_port = self.links.get(external).is_some_and(|l| {
                    l.owner != Some(group)
                        && l.side_of(group)
                            .is_some_and(|side| l.endpoint(side).port == port)
                });
                if !ends_at_port {
                    return Err(ValidationError::ExternalEndpoint {
                        group,
                        link: external,
                    });
                }
            }

            if let Some(link) = node
                .all_links()
                .find(|&l| data.external_of(l).is_none() && data.proxy_of(l).is_none())
            {
                return Err(ValidationError::Unbound { group, link });
            }
        }
        Ok(())
    }
}
