//! Structural nesting of nodes.
//!
//! The hierarchy is kept apart from the link topology: it only records which
//! group a node is nested in. Nodes without a parent live at the top level of
//! the document.

use std::iter::FusedIterator;
use thiserror::Error;

use crate::NodeIndex;

/// Forest of nodes nested within groups.
///
/// Children keep their attachment order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hierarchy {
    data: Vec<NodeData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct NodeData {
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
}

impl Hierarchy {
    /// Creates a new empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn get(&self, node: NodeIndex) -> Option<&NodeData> {
        self.data.get(node.index())
    }

    #[inline]
    fn get_mut(&mut self, node: NodeIndex) -> &mut NodeData {
        let index = node.index();
        if index >= self.data.len() {
            self.data.resize_with(index + 1, NodeData::default);
        }
        &mut self.data[index]
    }

    /// Attaches a node as the last child of a parent node.
    ///
    /// # Errors
    ///
    ///  - When the attachment would introduce a cycle.
    ///  - When the node is already attached.
    pub fn attach_last(&mut self, node: NodeIndex, parent: NodeIndex) -> Result<(), AttachError> {
        self.check_attach(node, parent)?;
        self.get_mut(parent).children.push(node);
        self.get_mut(node).parent = Some(parent);
        Ok(())
    }

    /// Attaches a node before another node within the other node's parent.
    ///
    /// # Errors
    ///
    ///  - When the attachment would introduce a cycle.
    ///  - When the node is already attached.
    ///  - When the other node is a root.
    pub fn attach_before(&mut self, node: NodeIndex, before: NodeIndex) -> Result<(), AttachError> {
        let Some(parent) = self.parent(before) else {
            return Err(AttachError::RelativeToRoot);
        };
        self.check_attach(node, parent)?;

        let siblings = &mut self.get_mut(parent).children;
        let position = siblings
            .iter()
            .position(|&sibling| sibling == before)
            .unwrap_or(siblings.len());
        siblings.insert(position, node);
        self.get_mut(node).parent = Some(parent);
        Ok(())
    }

    fn check_attach(&self, node: NodeIndex, parent: NodeIndex) -> Result<(), AttachError> {
        if self.parent(node).is_some() {
            Err(AttachError::AlreadyAttached)
        } else if node == parent || self.is_ancestor(node, parent) {
            Err(AttachError::Cycle)
        } else {
            Ok(())
        }
    }

    /// Detaches a node from its parent, returning the former parent.
    ///
    /// Does nothing and returns `None` when the node is a root.
    pub fn detach(&mut self, node: NodeIndex) -> Option<NodeIndex> {
        let parent = self.get(node)?.parent?;
        self.get_mut(node).parent = None;
        self.get_mut(parent).children.retain(|&child| child != node);
        Some(parent)
    }

    /// Detaches a node from its parent and all of its children, forgetting
    /// the node entirely. Returns the former children.
    pub fn remove(&mut self, node: NodeIndex) -> Vec<NodeIndex> {
        self.detach(node);
        let Some(data) = self.data.get_mut(node.index()) else {
            return Vec::new();
        };
        let children = std::mem::take(&mut data.children);
        for &child in &children {
            self.get_mut(child).parent = None;
        }
        children
    }

    /// Returns a node's parent or `None` if it is a root.
    #[inline]
    pub fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.get(node)?.parent
    }

    /// Returns whether `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeIndex, node: NodeIndex) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// Number of groups enclosing the node.
    pub fn depth(&self, node: NodeIndex) -> usize {
        self.ancestors(node).count()
    }

    /// Iterates over the strict ancestors of a node, innermost first.
    pub fn ancestors(&self, node: NodeIndex) -> Ancestors<'_> {
        Ancestors {
            hierarchy: self,
            next: self.parent(node),
        }
    }

    /// Iterates over the node's children in attachment order.
    #[inline]
    pub fn children(&self, node: NodeIndex) -> std::iter::Copied<std::slice::Iter<'_, NodeIndex>> {
        self.get(node)
            .map_or(&[][..], |data| &data.children[..])
            .iter()
            .copied()
    }

    /// Returns the number of the node's children.
    #[inline]
    pub fn child_count(&self, node: NodeIndex) -> usize {
        self.get(node).map_or(0, |data| data.children.len())
    }

    /// Returns whether both nodes share the same parent, or are both roots.
    #[inline]
    pub fn are_siblings(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.parent(a) == self.parent(b)
    }

    /// Removes every node from the hierarchy.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

/// Iterator created by [`Hierarchy::ancestors`].
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    hierarchy: &'a Hierarchy,
    next: Option<NodeIndex>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.hierarchy.parent(current);
        Some(current)
    }
}

impl FusedIterator for Ancestors<'_> {}

/// Error generated when nesting a node.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttachError {
    #[error("the node is already attached")]
    AlreadyAttached,
    #[error("can not attach relative to a root node")]
    RelativeToRoot,
    #[error("attaching the node would introduce a cycle")]
    Cycle,
}
