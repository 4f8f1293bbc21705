//! Tree nodes wrapping inspected views.

use crate::node::{NodeId, TreeArena, TreeNode};
use crate::view::{InspectView, ViewHandle};

/// A [`TreeNode`] whose represented object is an inspected view.
///
/// The wrapped view is fixed at construction. Lookups compare its
/// [`ViewHandle`], never the node itself or the view's content.
pub type InspectTreeNode<V> = TreeNode<V>;

impl<V: InspectView> TreeNode<V> {
    pub fn view(&self) -> &V {
        self.represented_object()
    }

    /// Whether this node wraps the view identified by `handle`.
    pub fn wraps(&self, handle: ViewHandle) -> bool {
        self.view().handle() == handle
    }

    pub fn display_name(&self) -> String {
        self.view().display_name()
    }
}

/// Insert a node for `view` under `parent`, followed by nodes for every
/// descendant view. Returns the id of the node wrapping `view`.
///
/// Nodes are inserted in pre-order and each node's children keep the view's
/// subview order.
pub fn build_subtree<V: InspectView>(
    arena: &mut TreeArena<V>,
    parent: Option<NodeId>,
    view: V,
) -> NodeId {
    let subviews = view.subviews();
    let root = arena.insert(parent, view);

    let mut pending: Vec<(NodeId, V)> = subviews.into_iter().rev().map(|v| (root, v)).collect();
    while let Some((parent, view)) = pending.pop() {
        let subviews = view.subviews();
        let id = arena.insert(Some(parent), view);
        pending.extend(subviews.into_iter().rev().map(|v| (id, v)));
    }

    root
}
