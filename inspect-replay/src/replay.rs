//! Drives a model and its inspect tree through a session.

use std::collections::BTreeMap;
use std::io::Write;

use inspect_tree::{
    CollectionChange, InspectTreeRoot, InspectView, NodeId, Subscription, SyncConfig, View,
    ViewHandle, ViewInspectorModel,
};

use crate::error::ReplayError;
use crate::render::{RenderOptions, render_tree};
use crate::session::{Session, Step};

/// A model, the tree synchronized with it, and the hierarchies steps refer
/// to.
pub struct Replay {
    hierarchies: BTreeMap<String, View>,
    model: ViewInspectorModel<View>,
    tree: InspectTreeRoot<View>,
    _listeners: Vec<Subscription>,
}

impl Replay {
    pub fn new(hierarchies: BTreeMap<String, View>, config: SyncConfig) -> Self {
        let model = ViewInspectorModel::new();
        let tree = InspectTreeRoot::with_config(&model, config);

        let listeners = vec![
            tree.top_level().subscribe(|change| match change {
                CollectionChange::Added { index, item } => {
                    log::debug!("top-level node {} added at {}", item, index)
                }
                CollectionChange::Removed { index, item } => {
                    log::debug!("top-level node {} removed from {}", item, index)
                }
                CollectionChange::Reset => log::debug!("top-level nodes reset"),
            }),
            tree.represented()
                .subscribe(|node| log::info!("represented node: {:?}", node)),
            tree.selected()
                .subscribe(|node| log::info!("selected node: {:?}", node)),
        ];

        Self {
            hierarchies,
            model,
            tree,
            _listeners: listeners,
        }
    }

    pub fn model(&self) -> &ViewInspectorModel<View> {
        &self.model
    }

    pub fn tree(&self) -> &InspectTreeRoot<View> {
        &self.tree
    }

    /// Apply step number `index` (1-based, used in errors).
    pub fn apply(&self, index: usize, step: &Step) -> Result<(), ReplayError> {
        log::debug!("step {}: {}", index, step);
        match step {
            Step::SetRoot(name) => {
                let view = match name {
                    Some(name) => Some(self.hierarchies.get(name).cloned().ok_or_else(|| {
                        ReplayError::UnknownHierarchy {
                            step: index,
                            name: name.clone(),
                        }
                    })?),
                    None => None,
                };
                self.model.set_root_view(view);
            }
            Step::SetRepresented(handle) => {
                let view = self.resolve_optional(index, *handle)?;
                self.model.set_represented_view(view);
            }
            Step::SetSelected(handle) => {
                let view = self.resolve_optional(index, *handle)?;
                self.model.set_selected_view(view);
            }
            Step::SelectNode(handle) => {
                let node = match handle {
                    Some(handle) => Some(self.displayed(index, *handle)?),
                    None => None,
                };
                self.tree.set_selected_node(node);
            }
            Step::Expand(handle) => {
                self.tree.set_expanded(self.displayed(index, *handle)?, true);
            }
            Step::Collapse(handle) => {
                self.tree.set_expanded(self.displayed(index, *handle)?, false);
            }
            Step::SetRenderingDepth(depth) => self.model.set_rendering_depth(*depth),
            Step::SetDisplayMode(mode) => self.model.set_display_mode(*mode),
            Step::SetShowHidden(show) => self.model.set_show_hidden(*show),
        }
        Ok(())
    }

    /// Find a view in any hierarchy. Hierarchies are searched in name order.
    fn resolve(&self, index: usize, handle: ViewHandle) -> Result<View, ReplayError> {
        self.hierarchies
            .values()
            .find_map(|root| root.find(handle))
            .ok_or(ReplayError::UnknownView {
                step: index,
                handle,
            })
    }

    fn resolve_optional(
        &self,
        index: usize,
        handle: Option<ViewHandle>,
    ) -> Result<Option<View>, ReplayError> {
        handle.map(|handle| self.resolve(index, handle)).transpose()
    }

    fn displayed(&self, index: usize, handle: ViewHandle) -> Result<NodeId, ReplayError> {
        self.tree
            .find_node(handle)
            .ok_or(ReplayError::NotDisplayed {
                step: index,
                handle,
            })
    }

    pub fn render(&self, options: &RenderOptions) -> String {
        render_tree(&self.tree, &self.model, options)
    }

    /// Model fields not drawn as part of the tree.
    pub fn status_line(&self) -> String {
        let represented = self
            .model
            .represented_view()
            .map(|view| view.display_name());
        format!(
            "mode={:?} depth={} hidden={} represented={}",
            self.model.display_mode(),
            self.model.rendering_depth(),
            self.model.show_hidden(),
            represented.as_deref().unwrap_or("none"),
        )
    }
}

/// Replay every step of `session`, writing the tree after each one.
pub fn run(
    session: Session,
    config: SyncConfig,
    options: &RenderOptions,
    out: &mut impl Write,
) -> Result<(), ReplayError> {
    let Session { hierarchies, steps } = session;
    let replay = Replay::new(hierarchies, config);

    for (i, step) in steps.iter().enumerate() {
        let index = i + 1;
        replay.apply(index, step)?;
        writeln!(out, "[{}] {}", index, step)?;
        writeln!(out, "{}", replay.status_line())?;
        write!(out, "{}", replay.render(options))?;
        writeln!(out)?;
    }
    log::info!("replayed {} steps", steps.len());
    Ok(())
}
