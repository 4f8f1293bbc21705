//! The view inspector model the tree is kept in sync with.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::event::{Listeners, Subscription};
use crate::view::{InspectView, same_view};

/// How views are drawn by the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Frames,
    Content,
    #[default]
    FramesAndContent,
}

/// A field of [`ViewInspectorModel`] changed. Carries the new value.
#[derive(Debug, Clone)]
pub enum ModelChange<V> {
    RootView(Option<V>),
    RepresentedView(Option<V>),
    SelectedView(Option<V>),
    RenderingDepth(u32),
    DisplayMode(DisplayMode),
    ShowHidden(bool),
}

impl<V> ModelChange<V> {
    /// Name of the changed field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::RootView(_) => "root_view",
            Self::RepresentedView(_) => "represented_view",
            Self::SelectedView(_) => "selected_view",
            Self::RenderingDepth(_) => "rendering_depth",
            Self::DisplayMode(_) => "display_mode",
            Self::ShowHidden(_) => "show_hidden",
        }
    }
}

#[derive(Debug)]
struct ModelState<V> {
    root_view: Option<V>,
    represented_view: Option<V>,
    selected_view: Option<V>,
    rendering_depth: u32,
    display_mode: DisplayMode,
    show_hidden: bool,
}

impl<V> Default for ModelState<V> {
    fn default() -> Self {
        Self {
            root_view: None,
            represented_view: None,
            selected_view: None,
            rendering_depth: 0,
            display_mode: DisplayMode::default(),
            show_hidden: false,
        }
    }
}

struct ModelShared<V: InspectView> {
    state: RefCell<ModelState<V>>,
    listeners: Listeners<ModelChange<V>>,
}

/// Shared handle to the inspector's view state.
///
/// Clones refer to the same model. Every setter notifies subscribers after
/// the new value is stored, and only when the value actually changed; views
/// are compared by identity.
pub struct ViewInspectorModel<V: InspectView> {
    shared: Rc<ModelShared<V>>,
}

impl<V: InspectView> Clone for ViewInspectorModel<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<V: InspectView> Default for ViewInspectorModel<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: InspectView> ViewInspectorModel<V> {
    pub fn new() -> Self {
        Self {
            shared: Rc::new(ModelShared {
                state: RefCell::new(ModelState::default()),
                listeners: Listeners::new(),
            }),
        }
    }

    /// A handle that does not keep the model alive.
    pub fn downgrade(&self) -> WeakModel<V> {
        WeakModel {
            shared: Rc::downgrade(&self.shared),
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&ModelChange<V>) + 'static,
    {
        self.shared.listeners.subscribe(callback)
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.shared.listeners.len()
    }

    pub fn root_view(&self) -> Option<V> {
        self.shared.state.borrow().root_view.clone()
    }

    pub fn set_root_view(&self, view: Option<V>) {
        self.set_view(|state| &mut state.root_view, view, ModelChange::RootView);
    }

    pub fn represented_view(&self) -> Option<V> {
        self.shared.state.borrow().represented_view.clone()
    }

    pub fn set_represented_view(&self, view: Option<V>) {
        self.set_view(
            |state| &mut state.represented_view,
            view,
            ModelChange::RepresentedView,
        );
    }

    pub fn selected_view(&self) -> Option<V> {
        self.shared.state.borrow().selected_view.clone()
    }

    pub fn set_selected_view(&self, view: Option<V>) {
        self.set_view(
            |state| &mut state.selected_view,
            view,
            ModelChange::SelectedView,
        );
    }

    pub fn rendering_depth(&self) -> u32 {
        self.shared.state.borrow().rendering_depth
    }

    pub fn set_rendering_depth(&self, depth: u32) {
        let changed = {
            let mut state = self.shared.state.borrow_mut();
            std::mem::replace(&mut state.rendering_depth, depth) != depth
        };
        if changed {
            self.notify(ModelChange::RenderingDepth(depth));
        }
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.shared.state.borrow().display_mode
    }

    pub fn set_display_mode(&self, mode: DisplayMode) {
        let changed = {
            let mut state = self.shared.state.borrow_mut();
            std::mem::replace(&mut state.display_mode, mode) != mode
        };
        if changed {
            self.notify(ModelChange::DisplayMode(mode));
        }
    }

    pub fn show_hidden(&self) -> bool {
        self.shared.state.borrow().show_hidden
    }

    pub fn set_show_hidden(&self, show: bool) {
        let changed = {
            let mut state = self.shared.state.borrow_mut();
            std::mem::replace(&mut state.show_hidden, show) != show
        };
        if changed {
            self.notify(ModelChange::ShowHidden(show));
        }
    }

    fn set_view(
        &self,
        field: fn(&mut ModelState<V>) -> &mut Option<V>,
        view: Option<V>,
        change: fn(Option<V>) -> ModelChange<V>,
    ) {
        {
            let mut state = self.shared.state.borrow_mut();
            let slot = field(&mut *state);
            if same_view(slot.as_ref(), view.as_ref()) {
                return;
            }
            *slot = view.clone();
        }
        self.notify(change(view));
    }

    fn notify(&self, change: ModelChange<V>) {
        log::trace!("model field changed: {}", change.field());
        self.shared.listeners.emit(&change);
    }
}

impl<V: InspectView> fmt::Debug for ViewInspectorModel<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewInspectorModel")
            .field("state", &*self.shared.state.borrow())
            .field("listeners", &self.shared.listeners)
            .finish()
    }
}

/// Non-owning reference to a [`ViewInspectorModel`].
pub struct WeakModel<V: InspectView> {
    shared: Weak<ModelShared<V>>,
}

impl<V: InspectView> WeakModel<V> {
    pub fn upgrade(&self) -> Option<ViewInspectorModel<V>> {
        self.shared
            .upgrade()
            .map(|shared| ViewInspectorModel { shared })
    }
}

impl<V: InspectView> Clone for WeakModel<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<V: InspectView> fmt::Debug for WeakModel<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakModel")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}
