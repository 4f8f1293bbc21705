//! Arena-backed tree nodes.
//!
//! Every node of one tree lives in a single [`TreeArena`]. Parent links are
//! [`NodeId`]s into the same arena, so there is no shared ownership between
//! nodes and nothing to break on teardown.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::traverse::{traverse, traverse_forest};

/// Stable identifier of a node inside one arena.
///
/// Each arena gets its own generation, so an id taken from a replaced tree
/// never resolves against its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    generation: u32,
    index: u32,
}

impl NodeId {
    /// The generation of the arena this id was issued by.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Insertion index within its arena.
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node-{}.{}", self.generation, self.index)
    }
}

fn next_generation() -> u32 {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A node with a parent link, ordered children and the object it stands for.
#[derive(Debug, Clone)]
pub struct TreeNode<T> {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    represented: T,
    is_selected: bool,
    is_expanded: bool,
}

impl<T> TreeNode<T> {
    fn new(parent: Option<NodeId>, represented: T) -> Self {
        Self {
            parent,
            children: Vec::new(),
            represented,
            is_selected: false,
            is_expanded: false,
        }
    }

    /// Parent node, `None` for roots.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The object this node represents; lookups match against it.
    pub fn represented_object(&self) -> &T {
        &self.represented
    }

    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.is_selected = selected;
    }

    pub fn is_expanded(&self) -> bool {
        self.is_expanded
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.is_expanded = expanded;
    }
}

/// Owning storage for every node of one tree.
#[derive(Debug, Clone)]
pub struct TreeArena<T> {
    generation: u32,
    nodes: Vec<TreeNode<T>>,
}

impl<T> Default for TreeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TreeArena<T> {
    /// Create an empty arena with a fresh generation.
    pub fn new() -> Self {
        Self {
            generation: next_generation(),
            nodes: Vec::new(),
        }
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a node, appending it to `parent`'s children when given.
    ///
    /// A parent id that does not belong to this arena is treated as absent.
    pub fn insert(&mut self, parent: Option<NodeId>, represented: T) -> NodeId {
        let parent = parent.filter(|id| self.contains(*id));
        let id = NodeId {
            generation: self.generation,
            index: self.nodes.len() as u32,
        };
        self.nodes.push(TreeNode::new(parent, represented));
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        id
    }

    /// Whether `id` was issued by this arena.
    pub fn contains(&self, id: NodeId) -> bool {
        id.generation == self.generation && id.index() < self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode<T>> {
        if self.contains(id) {
            self.nodes.get(id.index())
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode<T>> {
        if self.contains(id) {
            self.nodes.get_mut(id.index())
        } else {
            None
        }
    }

    /// Children of `id`, empty for unknown ids.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(TreeNode::children).unwrap_or(&[])
    }

    /// Walk up from `id` through its parents, nearest first. `id` itself is
    /// not yielded.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, T> {
        Ancestors {
            arena: self,
            next: self.get(id).and_then(TreeNode::parent),
        }
    }

    /// Pre-order ids of the subtree rooted at `root`.
    pub fn pre_order(&self, root: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        traverse(root, move |id: &NodeId| self.children_of(*id).iter().copied())
    }

    /// Pre-order ids of several subtrees, one after the other.
    pub fn pre_order_forest<'a>(
        &'a self,
        roots: &'a [NodeId],
    ) -> impl Iterator<Item = NodeId> + 'a {
        traverse_forest(roots.iter().copied(), move |id: &NodeId| {
            self.children_of(*id).iter().copied()
        })
    }

    /// First node in pre-order across `roots` whose represented object
    /// satisfies `predicate`.
    pub fn find_first(
        &self,
        roots: &[NodeId],
        mut predicate: impl FnMut(&T) -> bool,
    ) -> Option<NodeId> {
        self.pre_order_forest(roots)
            .find(|id| self.get(*id).is_some_and(|node| predicate(&node.represented)))
    }

    /// Depth of `id` below its topmost ancestor.
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }
}

/// Iterator over the parent chain of a node.
pub struct Ancestors<'a, T> {
    arena: &'a TreeArena<T>,
    next: Option<NodeId>,
}

impl<T> Iterator for Ancestors<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.arena.get(current).and_then(TreeNode::parent);
        Some(current)
    }
}
