//! Serialization of whole documents.
//!
//! A [`BlockGraph`] serializes as a [`Snapshot`]: its blocks, the logical
//! links between block ports and a [`GroupInfo`] record per group. Proxy
//! links and boundary ports are not stored; they are rebuilt by regrouping
//! the blocks when the document is deserialized.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::link::{Endpoint, LinkError, LinkKind};
use crate::node::{Point, Size};
use crate::ports::{PortError, PortSet};
use crate::{BlockError, BlockGraph, BlockId, GroupError, GroupId, GroupInfo};

/// Plain description of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Blocks in id order.
    pub blocks: Vec<BlockRecord>,
    /// Links between block ports.
    pub links: Vec<LinkRecord>,
    /// Groups in id order.
    pub groups: Vec<GroupInfo>,
}

/// A block of a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    #[allow(missing_docs)]
    pub id: BlockId,
    #[allow(missing_docs)]
    pub block_type: String,
    #[allow(missing_docs)]
    pub name: String,
    #[allow(missing_docs)]
    pub ports: PortSet,
    /// Position in the frame of the top level.
    pub position: Point,
    #[allow(missing_docs)]
    pub size: Size,
}

/// A link of a [`Snapshot`], from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    #[allow(missing_docs)]
    pub from: (BlockId, String),
    #[allow(missing_docs)]
    pub to: (BlockId, String),
    #[allow(missing_docs)]
    pub kind: LinkKind,
}

/// Error generated when rebuilding a document from a [`Snapshot`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotError {
    /// A block could not be added.
    #[error(transparent)]
    Block(#[from] BlockError),
    /// A link refers to a block that is not in the snapshot.
    #[error("link refers to unknown block {id}")]
    UnknownBlock { id: BlockId },
    /// A block's ports could not be inserted.
    #[error(transparent)]
    Port(#[from] PortError),
    /// A link could not be created.
    #[error(transparent)]
    Link(#[from] LinkError),
    /// A group record could not be applied.
    #[error("group {id} could not be restored: {source}")]
    Group { id: GroupId, source: GroupError },
    /// Group records refer to members that never appeared.
    #[error("groups {pending:?} refer to missing members")]
    Unresolved { pending: Vec<GroupId> },
}

impl BlockGraph {
    /// Describes the document.
    pub fn snapshot(&self) -> Snapshot {
        let mut blocks: Vec<BlockRecord> = self
            .blocks_iter()
            .filter_map(|node| {
                let data = self.node(node)?;
                Some(BlockRecord {
                    id: data.block_id()?,
                    block_type: data.block_type()?.to_string(),
                    name: data.name().to_string(),
                    ports: data.ports().clone(),
                    position: data.position().scaled(1.0 / self.scale(node)),
                    size: data.size(),
                })
            })
            .collect();
        blocks.sort_by_key(|block| block.id);

        let block_port = |end: &Endpoint| {
            let end = self.resolve_endpoint(end);
            Some((self.node(end.node)?.block_id()?, end.port))
        };
        let links = self
            .links_iter()
            .filter_map(|link| {
                let data = self.link(link)?;
                if data.is_proxy() {
                    return None;
                }
                Some(LinkRecord {
                    from: block_port(data.from())?,
                    to: block_port(data.to())?,
                    kind: data.kind(),
                })
            })
            .collect();

        Snapshot {
            blocks,
            links,
            groups: self.groups_info(),
        }
    }

    /// Rebuilds a document: blocks first, then links, then groups.
    ///
    /// # Errors
    ///
    /// If the snapshot is inconsistent, see [`SnapshotError`].
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, SnapshotError> {
        let mut graph = BlockGraph::new();
        for block in snapshot.blocks {
            let node = graph.add_block(block.id, block.block_type, block.name)?;
            for port in block.ports {
                graph.insert_port(
                    node,
                    usize::MAX,
                    port.name,
                    port.type_tag,
                    port.input,
                    port.output,
                )?;
            }
            graph.set_position(node, block.position);
            graph.set_size(node, block.size);
        }

        for link in snapshot.links {
            let resolve = |id: BlockId| {
                graph
                    .block_node(id)
                    .ok_or(SnapshotError::UnknownBlock { id })
            };
            let from = resolve(link.from.0)?;
            let to = resolve(link.to.0)?;
            graph.connect_ports(from, &link.from.1, to, &link.to.1, link.kind)?;
        }

        let report = graph.restore_groups(snapshot.groups);
        if let Some((info, err)) = report.rejected.into_iter().next() {
            return Err(SnapshotError::Group {
                id: info.id(),
                source: err,
            });
        }
        if !report.pending.is_empty() {
            return Err(SnapshotError::Unresolved {
                pending: report.pending.iter().map(GroupInfo::id).collect(),
            });
        }
        Ok(graph)
    }
}

impl Serialize for BlockGraph {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.snapshot().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BlockGraph {
    fn deserialize<D>(deserializer: D) -> Result<BlockGraph, D::Error>
    where
        D: Deserializer<'de>,
    {
        let snapshot = Snapshot::deserialize(deserializer)?;
        BlockGraph::from_snapshot(snapshot).map_err(serde::de::Error::custom)
    }
}
