//! Keeps an inspect tree in sync with a [`ViewInspectorModel`].
//!
//! Two one-directional paths share the "selected" value:
//! - model to tree: [`ModelChange`] notifications are mapped to a
//!   [`TreeUpdate`] and applied by [`InspectTreeRoot::update`];
//! - tree to model: [`InspectTreeRoot::set_selected_node`] writes the chosen
//!   view back into the model.
//!
//! Each path short-circuits when both sides already agree on identity, so a
//! change converges after at most one round trip.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::event::Subscription;
use crate::inspect_node::{InspectTreeNode, build_subtree};
use crate::model::{ModelChange, ViewInspectorModel, WeakModel};
use crate::node::{NodeId, TreeArena};
use crate::observable::{Deferred, Observable, ObservableVec};
use crate::view::{InspectView, ViewHandle};

/// What the tree has to do in response to a model change.
#[derive(Debug, Clone)]
pub enum TreeUpdate<V> {
    RootChanged(Option<V>),
    RepresentedChanged(Option<V>),
    SelectedChanged(Option<V>),
    /// Display-only change, handled by the rendering layer.
    Ignored,
}

impl<V: Clone> From<&ModelChange<V>> for TreeUpdate<V> {
    fn from(change: &ModelChange<V>) -> Self {
        match change {
            ModelChange::RootView(view) => Self::RootChanged(view.clone()),
            ModelChange::RepresentedView(view) => Self::RepresentedChanged(view.clone()),
            ModelChange::SelectedView(view) => Self::SelectedChanged(view.clone()),
            ModelChange::RenderingDepth(_)
            | ModelChange::DisplayMode(_)
            | ModelChange::ShowHidden(_) => Self::Ignored,
        }
    }
}

/// Synchronizer behaviour switches.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Show the children of a fake root instead of the fake root itself.
    pub unwrap_fake_roots: bool,

    /// Expand every ancestor of a newly selected node.
    pub reveal_selection: bool,

    /// After a root rebuild, resolve the model's current represented and
    /// selected views against the new tree.
    pub resync_after_rebuild: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            unwrap_fake_roots: true,
            reveal_selection: true,
            resync_after_rebuild: true,
        }
    }
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep fake roots as a single top-level node.
    pub fn keep_fake_roots(mut self) -> Self {
        self.unwrap_fake_roots = false;
        self
    }

    /// Leave expansion state alone when selecting.
    pub fn without_reveal(mut self) -> Self {
        self.reveal_selection = false;
        self
    }

    /// Do not re-resolve represented/selected after a rebuild.
    pub fn without_resync(mut self) -> Self {
        self.resync_after_rebuild = false;
        self
    }
}

struct TreeState<V> {
    arena: TreeArena<V>,
    root: Option<NodeId>,
}

impl<V> Default for TreeState<V> {
    fn default() -> Self {
        Self {
            arena: TreeArena::new(),
            root: None,
        }
    }
}

struct RootShared<V: InspectView> {
    config: SyncConfig,
    tree: RefCell<TreeState<V>>,
    top_level: ObservableVec<NodeId>,
    represented: Observable<Option<NodeId>>,
    selected: Observable<Option<NodeId>>,
    model: WeakModel<V>,
    subscription: RefCell<Option<Subscription>>,
}

/// The displayed inspect tree and its sync state machine.
///
/// `InspectTreeRoot` is a cheap, cloneable handle. The model subscription is
/// released when the last handle is dropped, or earlier via
/// [`InspectTreeRoot::detach`].
///
/// Node flags can be read while the tree's observables are notifying; all
/// mutation has finished by the time a listener runs. A listener may write
/// back into the model; the tree applies that write as soon as the
/// notification in progress has been delivered.
pub struct InspectTreeRoot<V: InspectView> {
    shared: Rc<RootShared<V>>,
}

impl<V: InspectView> Clone for InspectTreeRoot<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<V: InspectView> InspectTreeRoot<V> {
    /// Create a tree bound to `model` with the default configuration.
    pub fn create(model: &ViewInspectorModel<V>) -> Self {
        Self::with_config(model, SyncConfig::default())
    }

    /// Create a tree bound to `model`.
    ///
    /// If the model already has a root view the tree is built from it
    /// immediately.
    pub fn with_config(model: &ViewInspectorModel<V>, config: SyncConfig) -> Self {
        let tree = Self {
            shared: Rc::new(RootShared {
                config,
                tree: RefCell::new(TreeState::default()),
                top_level: ObservableVec::new(),
                represented: Observable::new(None),
                selected: Observable::new(None),
                model: model.downgrade(),
                subscription: RefCell::new(None),
            }),
        };

        let weak = Rc::downgrade(&tree.shared);
        let subscription = model.subscribe(move |change| {
            if let Some(shared) = weak.upgrade() {
                InspectTreeRoot { shared }.update(change.into());
            }
        });
        *tree.shared.subscription.borrow_mut() = Some(subscription);

        if let Some(root) = model.root_view() {
            tree.update(TreeUpdate::RootChanged(Some(root)));
        }
        tree
    }

    pub fn config(&self) -> &SyncConfig {
        &self.shared.config
    }

    /// Stop listening to the model. The tree keeps its current contents.
    pub fn detach(&self) {
        if self.shared.subscription.borrow_mut().take().is_some() {
            log::debug!("inspect tree detached from model");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.shared.subscription.borrow().is_some()
    }

    // -------------------------------------------------------------------------
    // Observables
    // -------------------------------------------------------------------------

    /// Top-level nodes as shown by the rendering layer.
    pub fn top_level(&self) -> &ObservableVec<NodeId> {
        &self.shared.top_level
    }

    pub fn top_level_nodes(&self) -> Vec<NodeId> {
        self.shared.top_level.to_vec()
    }

    /// Node whose view is shown in the detail panel.
    pub fn represented(&self) -> &Observable<Option<NodeId>> {
        &self.shared.represented
    }

    pub fn represented_node(&self) -> Option<NodeId> {
        self.shared.represented.get()
    }

    /// Highlighted node.
    pub fn selected(&self) -> &Observable<Option<NodeId>> {
        &self.shared.selected
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.shared.selected.get()
    }

    // -------------------------------------------------------------------------
    // Node access
    // -------------------------------------------------------------------------

    /// The node built from the model's root view. For an unwrapped fake
    /// root this node is not part of [`top_level_nodes`](Self::top_level_nodes).
    pub fn root_node(&self) -> Option<NodeId> {
        self.shared.tree.borrow().root
    }

    /// Run `f` against a node of the current tree.
    pub fn with_node<R>(&self, id: NodeId, f: impl FnOnce(&InspectTreeNode<V>) -> R) -> Option<R> {
        self.shared.tree.borrow().arena.get(id).map(f)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.shared.tree.borrow().arena.contains(id)
    }

    pub fn view(&self, id: NodeId) -> Option<V> {
        self.with_node(id, |node| node.view().clone())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.with_node(id, InspectTreeNode::parent).flatten()
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.with_node(id, |node| node.children().to_vec())
            .unwrap_or_default()
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.with_node(id, InspectTreeNode::is_selected)
            .unwrap_or(false)
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.with_node(id, InspectTreeNode::is_expanded)
            .unwrap_or(false)
    }

    /// Expand or collapse a node from the UI. Returns false for unknown ids.
    pub fn set_expanded(&self, id: NodeId, expanded: bool) -> bool {
        match self.shared.tree.borrow_mut().arena.get_mut(id) {
            Some(node) => {
                node.set_expanded(expanded);
                true
            }
            None => false,
        }
    }

    /// Every displayed node in pre-order, top-level nodes in order.
    pub fn displayed_nodes(&self) -> Vec<NodeId> {
        let roots = self.top_level_nodes();
        let tree = self.shared.tree.borrow();
        tree.arena.pre_order_forest(&roots).collect()
    }

    /// First displayed node wrapping `handle`, in pre-order.
    pub fn find_node(&self, handle: ViewHandle) -> Option<NodeId> {
        let roots = self.top_level_nodes();
        let tree = self.shared.tree.borrow();
        tree.arena.find_first(&roots, |view| view.handle() == handle)
    }

    // -------------------------------------------------------------------------
    // Model to tree
    // -------------------------------------------------------------------------

    /// Apply one model change.
    pub fn update(&self, update: TreeUpdate<V>) {
        match update {
            TreeUpdate::RootChanged(view) => self.on_root_changed(view),
            TreeUpdate::RepresentedChanged(view) => self.on_represented_changed(view),
            TreeUpdate::SelectedChanged(view) => self.on_selected_changed(view),
            TreeUpdate::Ignored => {}
        }
    }

    fn node_handle(&self, id: Option<NodeId>) -> Option<ViewHandle> {
        id.and_then(|id| self.with_node(id, |node| node.view().handle()))
    }

    fn on_root_changed(&self, view: Option<V>) {
        let current = {
            let tree = self.shared.tree.borrow();
            tree.root
                .and_then(|root| tree.arena.get(root))
                .map(|node| node.view().handle())
        };
        if current == view.as_ref().map(InspectView::handle) {
            log::trace!("root unchanged, skipping rebuild");
            return;
        }

        let mut state = TreeState::default();
        let mut top_level = Vec::new();
        if let Some(view) = view {
            let unwrap = self.shared.config.unwrap_fake_roots && view.is_fake_root();
            let root = build_subtree(&mut state.arena, None, view);
            if unwrap {
                top_level.extend_from_slice(state.arena.children_of(root));
            } else {
                top_level.push(root);
            }
            state.root = Some(root);
        }
        log::debug!(
            "rebuilt inspect tree: {} nodes, {} top-level",
            state.arena.len(),
            top_level.len()
        );

        // Store everything before any listener runs.
        *self.shared.tree.borrow_mut() = state;
        let top_level = self.shared.top_level.replace_deferred(top_level);
        let represented = self.shared.represented.set_deferred(None);
        let selected = self.shared.selected.set_deferred(None);
        top_level.emit();
        represented.into_iter().for_each(Deferred::emit);
        selected.into_iter().for_each(Deferred::emit);

        if self.shared.config.resync_after_rebuild
            && let Some(model) = self.shared.model.upgrade()
        {
            self.on_represented_changed(model.represented_view());
            self.on_selected_changed(model.selected_view());
        }
    }

    fn on_represented_changed(&self, view: Option<V>) {
        let target = view.as_ref().map(InspectView::handle);
        if self.node_handle(self.represented_node()) == target {
            log::trace!("represented node already wraps {:?}", target);
            return;
        }

        let found = target.and_then(|handle| self.find_node(handle));
        log::debug!("represented view {:?} resolved to {:?}", target, found);
        self.shared.represented.set(found);
    }

    fn on_selected_changed(&self, view: Option<V>) {
        let target = view.as_ref().map(InspectView::handle);
        if self.node_handle(self.selected_node()) == target {
            log::trace!("selected node already wraps {:?}", target);
            return;
        }

        let found = target.and_then(|handle| self.find_node(handle));
        log::debug!("selected view {:?} resolved to {:?}", target, found);
        self.mark_selected(found);
        self.shared.selected.set(found);
    }

    /// Set `is_selected` on `node` only, clearing it everywhere else in the
    /// displayed tree, then reveal `node`.
    fn mark_selected(&self, node: Option<NodeId>) {
        let roots = self.top_level_nodes();
        let mut guard = self.shared.tree.borrow_mut();
        let tree = &mut *guard;

        let order: Vec<NodeId> = tree.arena.pre_order_forest(&roots).collect();
        for id in order {
            if let Some(entry) = tree.arena.get_mut(id) {
                entry.set_selected(Some(id) == node);
            }
        }

        if self.shared.config.reveal_selection
            && let Some(node) = node
        {
            let ancestors: Vec<NodeId> = tree.arena.ancestors(node).collect();
            for id in ancestors {
                if let Some(entry) = tree.arena.get_mut(id) {
                    entry.set_expanded(true);
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Tree to model
    // -------------------------------------------------------------------------

    /// Select `node` from the UI and push its view into the model.
    ///
    /// Does nothing when `node` is already selected and the model already
    /// points at its view. Ids from a replaced tree are ignored.
    pub fn set_selected_node(&self, node: Option<NodeId>) {
        let view = match node {
            Some(id) => match self.view(id) {
                Some(view) => Some(view),
                None => {
                    log::warn!("ignoring selection of unknown node {}", id);
                    return;
                }
            },
            None => None,
        };
        let target = view.as_ref().map(InspectView::handle);

        let model = self.shared.model.upgrade();
        let model_agrees = model.as_ref().is_none_or(|model| {
            model.selected_view().as_ref().map(InspectView::handle) == target
        });
        if node == self.selected_node() && model_agrees {
            log::trace!("selection already in sync");
            return;
        }

        // Slot and flags first, so the model's echo is a no-op; the slot is
        // announced last, once the model holds the new view.
        let change = self.shared.selected.replace_deferred(node);
        self.mark_selected(node);
        if let Some(model) = model {
            model.set_selected_view(view);
        }
        change.emit();
    }
}

impl<V: InspectView> fmt::Debug for InspectTreeRoot<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InspectTreeRoot")
            .field("config", &self.shared.config)
            .field("top_level", &self.shared.top_level)
            .field("represented", &self.shared.represented.get())
            .field("selected", &self.shared.selected.get())
            .field("attached", &self.is_attached())
            .finish()
    }
}
