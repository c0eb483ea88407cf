//! Persistent descriptions of groups.
//!
//! A [`GroupInfo`] records what is needed to rebuild a group on top of a
//! document holding its members: the member ids, the boundary ports, the
//! position and the view mode. Groups nest, so records are rebuilt bottom
//! up. [`BlockGraph::create_group`] reports [`GroupCreation::NotReady`] for a
//! record whose members are missing, and [`BlockGraph::restore_groups`]
//! retries a batch of records until no more progress can be made.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::node::Point;
use crate::{BlockGraph, BlockId, GroupError, GroupId, NodeId, NodeIndex};

/// Boundary port of a group, described by the member port it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct BoundaryLink {
    /// Member of the group behind the boundary port.
    pub peer: NodeId,
    /// Port of the member.
    pub port: String,
    /// Whether the boundary port leads into the group.
    pub input: bool,
}

/// Snapshot of a group's membership and presentation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct GroupInfo {
    id: GroupId,
    name: String,
    nodes: BTreeSet<BlockId>,
    subgroups: BTreeSet<GroupId>,
    boundary: Vec<BoundaryLink>,
    /// Position in the frame of the top level.
    position: Point,
    abstract_view: bool,
}

impl GroupInfo {
    /// Creates an empty record.
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            nodes: BTreeSet::new(),
            subgroups: BTreeSet::new(),
            boundary: Vec::new(),
            position: Point::default(),
            abstract_view: false,
        }
    }

    /// Id of the group.
    #[inline]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Name of the group.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blocks directly within the group.
    #[inline]
    pub fn nodes(&self) -> &BTreeSet<BlockId> {
        &self.nodes
    }

    /// Groups directly within the group.
    #[inline]
    pub fn subgroups(&self) -> &BTreeSet<GroupId> {
        &self.subgroups
    }

    /// Boundary ports in port order.
    #[inline]
    pub fn boundary(&self) -> &[BoundaryLink] {
        &self.boundary
    }

    /// Position in the frame of the top level.
    #[inline]
    pub fn position(&self) -> Point {
        self.position
    }

    /// Whether the group is drawn collapsed.
    #[inline]
    pub fn is_abstract_view(&self) -> bool {
        self.abstract_view
    }

    /// Adds a member block.
    pub fn add_node(&mut self, id: BlockId) {
        self.nodes.insert(id);
    }

    /// Adds a member group.
    pub fn add_subgroup(&mut self, id: GroupId) {
        self.subgroups.insert(id);
    }

    /// Appends a boundary port description.
    pub fn add_boundary_link(&mut self, link: BoundaryLink) {
        self.boundary.push(link);
    }

    #[allow(missing_docs)]
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[allow(missing_docs)]
    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    #[allow(missing_docs)]
    pub fn set_abstract_view(&mut self, abstract_view: bool) {
        self.abstract_view = abstract_view;
    }

    /// Renumbers a member block, in the member set and the boundary.
    pub fn update_node_id(&mut self, old: BlockId, new: BlockId) {
        if self.nodes.remove(&old) {
            self.nodes.insert(new);
        }
        self.update_peer(NodeId::Block(old), NodeId::Block(new));
    }

    /// Renumbers a member group, in the member set and the boundary.
    pub fn update_subgroup_id(&mut self, old: GroupId, new: GroupId) {
        if self.subgroups.remove(&old) {
            self.subgroups.insert(new);
        }
        self.update_peer(NodeId::Group(old), NodeId::Group(new));
    }

    /// Copy of the record with its subgroup references to `batch` records
    /// replaced by the ids in `created`, each reference mapped once.
    ///
    /// Returns `None` while a subgroup is a `batch` record missing from
    /// `created`.
    fn resolve_subgroups(
        &self,
        batch: &BTreeSet<GroupId>,
        created: &BTreeMap<GroupId, GroupId>,
    ) -> Option<GroupInfo> {
        let resolve = |id: GroupId| match created.get(&id) {
            Some(&new) => Some(new),
            None if batch.contains(&id) => None,
            None => Some(id),
        };
        let subgroups = self
            .subgroups
            .iter()
            .map(|&id| resolve(id))
            .collect::<Option<BTreeSet<GroupId>>>()?;
        let boundary = self
            .boundary
            .iter()
            .map(|link| BoundaryLink {
                peer: match link.peer {
                    NodeId::Group(id) => NodeId::Group(resolve(id).unwrap_or(id)),
                    peer => peer,
                },
                ..link.clone()
            })
            .collect();
        Some(GroupInfo {
            subgroups,
            boundary,
            ..self.clone()
        })
    }

    fn update_peer(&mut self, old: NodeId, new: NodeId) {
        for link in self.boundary.iter_mut().filter(|link| link.peer == old) {
            link.peer = new;
        }
    }
}

/// Outcome of [`BlockGraph::create_group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupCreation {
    /// The group was created.
    Created {
        /// Id the group was registered under. Differs from the record's
        /// when that id was already taken.
        id: GroupId,
        /// The new group node.
        node: NodeIndex,
    },
    /// Some member of the record does not exist yet.
    NotReady,
}

/// Outcome of [`BlockGraph::restore_groups`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreReport {
    /// Recorded id to registered id of every created group.
    pub created: BTreeMap<GroupId, GroupId>,
    /// Records whose members never appeared.
    pub pending: Vec<GroupInfo>,
    /// Records that could not be applied.
    pub rejected: Vec<(GroupInfo, GroupError)>,
}

impl RestoreReport {
    /// Returns whether every record was turned into a group.
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty() && self.rejected.is_empty()
    }
}

impl BlockGraph {
    /// Describes a group from its current state.
    ///
    /// Returns `None` if the node is not a group.
    pub fn group_info(&self, group: NodeIndex) -> Option<GroupInfo> {
        let node = self.nodes.get(group)?;
        let data = node.group_data()?;

        let mut info = GroupInfo::new(data.id, node.name.clone());
        for member in self.hierarchy.children(group) {
            match self.nodes.get(member).map(|n| n.id()) {
                Some(NodeId::Block(id)) => info.add_node(id),
                Some(NodeId::Group(id)) => info.add_subgroup(id),
                None => {}
            }
        }
        for port in node.ports.iter() {
            let Some((proxy, _)) = self.boundary_link(group, &port.name) else {
                continue;
            };
            let Some(inner) = self.links.get(proxy).and_then(|l| {
                let side = l.side_of(group)?;
                Some(l.endpoint(side.reverse()))
            }) else {
                continue;
            };
            let Some(peer) = self.nodes.get(inner.node).map(|n| n.id()) else {
                continue;
            };
            info.add_boundary_link(BoundaryLink {
                peer,
                port: inner.port.clone(),
                input: port.input,
            });
        }
        info.set_position(node.position.scaled(1.0 / self.scale(group)));
        info.set_abstract_view(data.abstract_view);
        Some(info)
    }

    /// Describes every group, ordered by id.
    pub fn groups_info(&self) -> Vec<GroupInfo> {
        let mut groups: Vec<(GroupId, NodeIndex)> =
            self.groups.iter().map(|(&id, &node)| (id, node)).collect();
        groups.sort_unstable();
        groups
            .into_iter()
            .filter_map(|(_, node)| self.group_info(node))
            .collect()
    }

    /// Rebuilds a group from its record.
    ///
    /// Returns [`GroupCreation::NotReady`], leaving the document untouched,
    /// when a member block or subgroup does not exist yet. Otherwise the
    /// group is created next to its members, with the recorded id if it is
    /// still free and a fresh one if not, and the members are added to it.
    ///
    /// # Errors
    ///
    /// If the members do not share a parent. The document is left untouched.
    ///
    /// # Example
    ///
    /// ```
    /// # use slategraph::{BlockGraph, BlockId, GroupCreation, GroupId, GroupInfo};
    /// let mut graph = BlockGraph::new();
    /// let block = graph.add_block(BlockId(1), "Source", "a").unwrap();
    ///
    /// let mut outer = GroupInfo::new(GroupId(2), "outer");
    /// outer.add_subgroup(GroupId(1));
    /// let mut inner = GroupInfo::new(GroupId(1), "inner");
    /// inner.add_node(BlockId(1));
    ///
    /// assert_eq!(graph.create_group(&outer), Ok(GroupCreation::NotReady));
    /// assert!(matches!(graph.create_group(&inner), Ok(GroupCreation::Created { .. })));
    /// assert!(matches!(graph.create_group(&outer), Ok(GroupCreation::Created { .. })));
    /// assert_eq!(graph.depth(block), 2);
    /// ```
    pub fn create_group(&mut self, info: &GroupInfo) -> Result<GroupCreation, GroupError> {
        self.create_group_avoiding(info, &BTreeSet::new())
    }

    /// As [`BlockGraph::create_group`], but a fresh id is never drawn from
    /// `reserved`.
    fn create_group_avoiding(
        &mut self,
        info: &GroupInfo,
        reserved: &BTreeSet<GroupId>,
    ) -> Result<GroupCreation, GroupError> {
        let blocks = info.nodes.iter().map(|&id| self.block_node(id));
        let subgroups = info.subgroups.iter().map(|&id| self.group_node(id));
        let Some(members) = blocks.chain(subgroups).collect::<Option<Vec<NodeIndex>>>() else {
            return Ok(GroupCreation::NotReady);
        };

        let parent = members.first().and_then(|&first| self.hierarchy.parent(first));
        if let Some(&other) = members.iter().find(|&&m| self.hierarchy.parent(m) != parent) {
            return Err(GroupError::NotSiblings {
                first: members[0],
                other,
            });
        }

        let group = self.insert_group_avoiding(Some(info.id), info.name.clone(), reserved);
        self.place_group(group, parent);
        for &member in &members {
            self.add_to_group(group, member)?;
        }
        self.set_position(group, info.position.scaled(self.scale(group)));
        self.set_abstract_view(group, info.abstract_view)?;

        let id = self.group_data(group).map_or(info.id, |data| data.id);
        debug!(recorded = %info.id, %id, members = members.len(), "created group from record");
        Ok(GroupCreation::Created { id, node: group })
    }

    /// Rebuilds a batch of groups, in any order.
    ///
    /// Records are attempted in passes. A record waits while one of its
    /// subgroups is a record of the batch that has not been created yet, or
    /// while a member is missing from the document. Subgroup references to
    /// records of the batch follow the id each record was registered under,
    /// and fresh ids are never drawn from the ids of records still pending.
    /// Stops when a pass creates nothing.
    pub fn restore_groups(
        &mut self,
        records: impl IntoIterator<Item = GroupInfo>,
    ) -> RestoreReport {
        let mut pending: Vec<GroupInfo> = records.into_iter().collect();
        let recorded: BTreeSet<GroupId> = pending.iter().map(|info| info.id).collect();
        let mut report = RestoreReport::default();

        loop {
            let mut progress = false;
            let mut i = 0;
            while i < pending.len() {
                let Some(resolved) = pending[i].resolve_subgroups(&recorded, &report.created)
                else {
                    i += 1;
                    continue;
                };
                let reserved: BTreeSet<GroupId> = pending
                    .iter()
                    .map(|info| info.id)
                    .filter(|&id| id != resolved.id)
                    .collect();

                match self.create_group_avoiding(&resolved, &reserved) {
                    Ok(GroupCreation::NotReady) => i += 1,
                    Ok(GroupCreation::Created { id, .. }) => {
                        let info = pending.remove(i);
                        report.created.insert(info.id, id);
                        progress = true;
                    }
                    Err(err) => {
                        let info = pending.remove(i);
                        report.rejected.push((info, err));
                    }
                }
            }
            if !progress || pending.is_empty() {
                break;
            }
        }

        debug!(
            created = report.created.len(),
            pending = pending.len(),
            rejected = report.rejected.len(),
            "restored groups"
        );
        report.pending = pending;
        report
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Endpoint, LinkIndex, LinkKind};
    use itertools::Itertools;
    use rstest::{fixture, rstest};

    /// Blocks `a(p) -> b(q, r) -> c(s)` with `b` in `inner`, and `a` and
    /// `inner` in `outer`.
    #[fixture]
    fn nested() -> (BlockGraph, [NodeIndex; 3], [LinkIndex; 2]) {
        let mut graph = BlockGraph::new();
        let a = graph.add_block(BlockId(1), "Source", "a").unwrap();
        let b = graph.add_block(BlockId(2), "Filter", "b").unwrap();
        let c = graph.add_block(BlockId(3), "Sink", "c").unwrap();
        graph.insert_port(a, 0, "p", 1, false, true).unwrap();
        graph.insert_port(b, 0, "q", 1, true, false).unwrap();
        graph.insert_port(b, 1, "r", 1, false, true).unwrap();
        graph.insert_port(c, 0, "s", 1, true, false).unwrap();
        let ab = graph.connect_ports(a, "p", b, "q", LinkKind::Synchronous).unwrap();
        let bc = graph.connect_ports(b, "r", c, "s", LinkKind::Synchronous).unwrap();

        let inner = graph.group([b]).unwrap();
        graph.set_name(inner, "inner");
        let outer = graph.group([a, inner]).unwrap();
        graph.set_name(outer, "outer");
        (graph, [a, b, c], [ab, bc])
    }

    fn dissolve_all(graph: &mut BlockGraph) {
        loop {
            let next = graph.nodes_iter().find(|&n| graph.is_group(n));
            let Some(group) = next else { break };
            graph.ungroup(group).unwrap();
        }
    }

    #[rstest]
    fn describes_live_groups(nested: (BlockGraph, [NodeIndex; 3], [LinkIndex; 2])) {
        let (mut graph, _, _) = nested;
        let infos = graph.groups_info();
        assert_eq!(infos.len(), 2);

        let inner = &infos[0];
        assert_eq!((inner.id(), inner.name()), (GroupId(1), "inner"));
        assert_eq!(inner.nodes().iter().copied().collect_vec(), [BlockId(2)]);
        assert!(inner.subgroups().is_empty());
        assert_eq!(
            inner.boundary(),
            [
                BoundaryLink {
                    peer: NodeId::Block(BlockId(2)),
                    port: "q".into(),
                    input: true,
                },
                BoundaryLink {
                    peer: NodeId::Block(BlockId(2)),
                    port: "r".into(),
                    input: false,
                },
            ]
        );

        let outer = &infos[1];
        assert_eq!(outer.nodes().iter().copied().collect_vec(), [BlockId(1)]);
        assert_eq!(outer.subgroups().iter().copied().collect_vec(), [GroupId(1)]);
        assert_eq!(
            outer.boundary(),
            [BoundaryLink {
                peer: NodeId::Group(GroupId(1)),
                port: "2: r".into(),
                input: false,
            }]
        );

        let outer_node = graph.group_node(GroupId(2)).unwrap();
        graph.set_abstract_view(outer_node, true).unwrap();
        assert!(graph.group_info(outer_node).unwrap().is_abstract_view());
        assert_eq!(graph.group_info(NodeIndex::new(0)), None);
    }

    #[test]
    fn not_ready_until_subgroup_exists() {
        let mut graph = BlockGraph::new();
        let a = graph.add_block(BlockId(1), "Source", "a").unwrap();
        let b = graph.add_block(BlockId(2), "Sink", "b").unwrap();

        let mut waiting = GroupInfo::new(GroupId(8), "outer");
        waiting.add_subgroup(GroupId(7));
        waiting.add_node(BlockId(2));
        assert_eq!(graph.create_group(&waiting), Ok(GroupCreation::NotReady));
        assert_eq!(graph.node_count(), 2);

        let mut first = GroupInfo::new(GroupId(7), "inner");
        first.add_node(BlockId(1));
        first.set_position(Point::new(5.0, 5.0));
        let Ok(GroupCreation::Created { id, node }) = graph.create_group(&first) else {
            panic!("inner group should be created");
        };
        assert_eq!(id, GroupId(7));
        assert_eq!(graph.parent(a), Some(node));

        assert!(matches!(
            graph.create_group(&waiting),
            Ok(GroupCreation::Created { id: GroupId(8), .. })
        ));
        assert_eq!(graph.depth(a), 2);
        assert_eq!(graph.depth(b), 1);
        let restored = graph.group_info(node).unwrap().position();
        assert!((restored.x - 5.0).abs() < 1e-9 && (restored.y - 5.0).abs() < 1e-9);
        graph.validate().unwrap();
    }

    #[test]
    fn members_must_be_siblings() {
        let mut graph = BlockGraph::new();
        let a = graph.add_block(BlockId(1), "Source", "a").unwrap();
        let b = graph.add_block(BlockId(2), "Sink", "b").unwrap();
        let group = graph.group([a]).unwrap();

        let mut info = GroupInfo::new(GroupId(5), "bad");
        info.add_node(BlockId(1));
        info.add_node(BlockId(2));
        assert_eq!(
            graph.create_group(&info),
            Err(GroupError::NotSiblings { first: a, other: b })
        );
        assert_eq!(graph.group_node(GroupId(5)), None);
        assert_eq!(graph.parent(a), Some(group));
    }

    #[rstest]
    #[case::bottom_up(&[0, 1])]
    #[case::top_down(&[1, 0])]
    fn restore_in_any_order(
        nested: (BlockGraph, [NodeIndex; 3], [LinkIndex; 2]),
        #[case] order: &[usize],
    ) {
        let (mut graph, [a, b, c], [ab, bc]) = nested;
        let infos = graph.groups_info();
        dissolve_all(&mut graph);
        assert!(graph.link(bc).unwrap().connects(b, "r", c, "s"));

        let report = graph.restore_groups(order.iter().map(|&i| infos[i].clone()));
        assert!(report.is_complete());
        assert_eq!(
            report.created,
            BTreeMap::from([(GroupId(1), GroupId(1)), (GroupId(2), GroupId(2))])
        );
        graph.validate().unwrap();

        let outer = graph.group_node(GroupId(2)).unwrap();
        assert_eq!(graph.depth(b), 2);
        assert_eq!(graph.parent(a), Some(outer));
        assert_eq!(graph.link(bc).unwrap().from(), &Endpoint::new(outer, "2: r"));
        assert_eq!(graph.link(ab).unwrap().from(), &Endpoint::new(a, "p"));
        assert_eq!(graph.groups_info(), infos);
    }

    #[rstest]
    fn restore_renumbers_taken_ids(nested: (BlockGraph, [NodeIndex; 3], [LinkIndex; 2])) {
        let (mut graph, [_, b, c], _) = nested;
        let infos = graph.groups_info();
        dissolve_all(&mut graph);

        // Occupy the recorded id of the inner group.
        let squatter = graph.insert_group(Some(GroupId(1)), "squatter");
        let report = graph.restore_groups(infos.into_iter().rev());
        assert!(report.is_complete());

        let inner_id = report.created[&GroupId(1)];
        assert_ne!(inner_id, GroupId(1));
        let outer = graph.group_node(report.created[&GroupId(2)]).unwrap();
        let inner = graph.group_node(inner_id).unwrap();
        assert_eq!(graph.parent(inner), Some(outer));
        assert_eq!(graph.parent(b), Some(inner));
        assert!(graph.node(squatter).unwrap().is_isolated());
        assert!(graph.is_valid_link(outer, 1, c, 0));
        graph.validate().unwrap();
    }

    #[test]
    fn restore_keeps_nesting_when_fresh_ids_collide() {
        let mut graph = BlockGraph::new();
        let [a, b, c] = [1, 2, 3].map(|id| {
            graph.add_block(BlockId(id), "Filter", format!("n{id}")).unwrap()
        });
        let squatter = graph.insert_group(Some(GroupId(1)), "squatter");

        let mut inner = GroupInfo::new(GroupId(1), "inner");
        inner.add_node(BlockId(1));
        let mut other = GroupInfo::new(GroupId(2), "other");
        other.add_node(BlockId(2));
        let mut outer = GroupInfo::new(GroupId(3), "outer");
        outer.add_subgroup(GroupId(1));
        outer.add_node(BlockId(3));

        let report = graph.restore_groups([inner, other, outer]);
        assert!(report.is_complete());
        assert_eq!(
            report.created,
            BTreeMap::from([
                (GroupId(1), GroupId(4)),
                (GroupId(2), GroupId(2)),
                (GroupId(3), GroupId(3)),
            ])
        );

        let inner = graph.group_node(GroupId(4)).unwrap();
        let other = graph.group_node(GroupId(2)).unwrap();
        let outer = graph.group_node(GroupId(3)).unwrap();
        assert_eq!(graph.parent(a), Some(inner));
        assert_eq!(graph.parent(inner), Some(outer));
        assert_eq!(graph.parent(c), Some(outer));
        assert_eq!(graph.parent(b), Some(other));
        assert_eq!(graph.parent(other), None);
        assert_eq!(graph.group_data(squatter).map(|d| d.id()), Some(GroupId(1)));
        assert_eq!(
            graph.group_info(outer).unwrap().subgroups().iter().copied().collect_vec(),
            [GroupId(4)]
        );
        graph.validate().unwrap();
    }

    #[test]
    fn restore_waits_on_rejected_subgroups() {
        let mut graph = BlockGraph::new();
        let a = graph.add_block(BlockId(1), "Source", "a").unwrap();
        let b = graph.add_block(BlockId(2), "Sink", "b").unwrap();
        graph.add_block(BlockId(3), "Sink", "c").unwrap();
        graph.group([a]).unwrap();

        // Blocks in different scopes: this record is rejected.
        let mut split = GroupInfo::new(GroupId(5), "split");
        split.add_node(BlockId(1));
        split.add_node(BlockId(2));
        let mut outer = GroupInfo::new(GroupId(6), "outer");
        outer.add_subgroup(GroupId(5));
        outer.add_node(BlockId(3));

        let report = graph.restore_groups([split, outer.clone()]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.pending, [outer]);
        assert_eq!(graph.parent(b), None);
    }

    #[test]
    fn restore_reports_missing_members() {
        let mut graph = BlockGraph::new();
        graph.add_block(BlockId(1), "Source", "a").unwrap();

        let mut ok = GroupInfo::new(GroupId(1), "ok");
        ok.add_node(BlockId(1));
        let mut orphan = GroupInfo::new(GroupId(2), "orphan");
        orphan.add_node(BlockId(9));

        let report = graph.restore_groups([orphan.clone(), ok]);
        assert!(!report.is_complete());
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.pending, [orphan]);
    }

    #[test]
    fn renumbering_records() {
        let mut info = GroupInfo::new(GroupId(3), "g");
        info.add_node(BlockId(1));
        info.add_subgroup(GroupId(1));
        info.add_boundary_link(BoundaryLink {
            peer: NodeId::Block(BlockId(1)),
            port: "out".into(),
            input: false,
        });
        info.add_boundary_link(BoundaryLink {
            peer: NodeId::Group(GroupId(1)),
            port: "1: in".into(),
            input: true,
        });

        info.update_node_id(BlockId(1), BlockId(10));
        info.update_subgroup_id(GroupId(1), GroupId(4));
        info.update_subgroup_id(GroupId(99), GroupId(100));
        assert_eq!(info.nodes().iter().copied().collect_vec(), [BlockId(10)]);
        assert_eq!(info.subgroups().iter().copied().collect_vec(), [GroupId(4)]);
        assert_eq!(
            info.boundary().iter().map(|l| l.peer).collect_vec(),
            [NodeId::Block(BlockId(10)), NodeId::Group(GroupId(4))]
        );
    }
}
