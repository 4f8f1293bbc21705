//! Inspected views and their identity.
//!
//! Every comparison this crate makes between views is an identity
//! comparison on [`ViewHandle`]. Two views with equal content but different
//! handles are different views; two values carrying the same handle are the
//! same view.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::traverse::traverse;

/// Opaque identity of one inspected element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewHandle(u64);

impl ViewHandle {
    /// Allocate a process-unique handle.
    ///
    /// Handles allocated here share a number space with [`ViewHandle::from_raw`];
    /// hosts that supply their own handles should not mix the two.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// An element of the inspected application's UI that can be shown in the
/// inspect tree.
///
/// Implementations must return a stable handle: the same element always
/// reports the same handle for as long as it is alive.
pub trait InspectView: Clone + fmt::Debug + 'static {
    /// Identity of this view.
    fn handle(&self) -> ViewHandle;

    /// Synthetic aggregator grouping several top-level surfaces.
    fn is_fake_root(&self) -> bool {
        false
    }

    /// Immediate children, in display order.
    fn subviews(&self) -> Vec<Self>;

    /// Label shown for this view in the tree.
    fn display_name(&self) -> String {
        self.handle().to_string()
    }
}

/// Identity comparison of two optional views.
pub fn same_view<V: InspectView>(a: Option<&V>, b: Option<&V>) -> bool {
    a.map(InspectView::handle) == b.map(InspectView::handle)
}

/// Errors raised while loading a view hierarchy.
#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("invalid view hierarchy: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct ViewData {
    handle: ViewHandle,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    fake_root: bool,
    #[serde(default = "visible_by_default")]
    visible: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    subviews: Vec<View>,
}

fn visible_by_default() -> bool {
    true
}

/// Immutable, reference-counted snapshot of an inspected view subtree.
///
/// Cloning a `View` is cheap and keeps the same identity.
#[derive(Clone)]
pub struct View {
    inner: Rc<ViewData>,
}

impl View {
    /// Start building a view of the given type with a freshly allocated
    /// handle.
    pub fn builder(type_name: impl Into<String>) -> ViewBuilder {
        ViewBuilder::new(ViewHandle::next(), type_name)
    }

    /// An aggregator root grouping `surfaces` under one logical parent.
    pub fn fake_root(surfaces: Vec<View>) -> View {
        Self::builder("Root").fake_root().subviews(surfaces).build()
    }

    /// Parse a hierarchy from JSON.
    pub fn from_json(json: &str) -> Result<View, HierarchyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, HierarchyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.inner.visible
    }

    /// Children without cloning.
    pub fn subview_slice(&self) -> &[View] {
        &self.inner.subviews
    }

    /// Locate a view by handle in this subtree, first match in pre-order.
    pub fn find(&self, handle: ViewHandle) -> Option<View> {
        traverse(self.clone(), |view: &View| view.inner.subviews.clone())
            .find(|view| view.handle() == handle)
    }

    /// Number of views in this subtree, itself included.
    pub fn subtree_len(&self) -> usize {
        traverse(self.clone(), |view: &View| view.inner.subviews.clone()).count()
    }
}

impl InspectView for View {
    fn handle(&self) -> ViewHandle {
        self.inner.handle
    }

    fn is_fake_root(&self) -> bool {
        self.inner.fake_root
    }

    fn subviews(&self) -> Vec<Self> {
        self.inner.subviews.clone()
    }

    fn display_name(&self) -> String {
        match &self.inner.name {
            Some(name) => format!("{} \"{}\"", self.inner.type_name, name),
            None => self.inner.type_name.clone(),
        }
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "View({} {})", self.display_name(), self.inner.handle)
    }
}

impl Serialize for View {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for View {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ViewData::deserialize(deserializer).map(|data| View {
            inner: Rc::new(data),
        })
    }
}

/// Builder for [`View`].
#[derive(Debug)]
pub struct ViewBuilder {
    data: ViewData,
}

impl ViewBuilder {
    /// Start a view with an explicit handle.
    pub fn new(handle: ViewHandle, type_name: impl Into<String>) -> Self {
        Self {
            data: ViewData {
                handle,
                type_name: type_name.into(),
                name: None,
                fake_root: false,
                visible: true,
                subviews: Vec::new(),
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.data.name = Some(name.into());
        self
    }

    /// Mark as a synthetic aggregator root.
    pub fn fake_root(mut self) -> Self {
        self.data.fake_root = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.data.visible = false;
        self
    }

    pub fn subview(mut self, view: View) -> Self {
        self.data.subviews.push(view);
        self
    }

    pub fn subviews(mut self, views: impl IntoIterator<Item = View>) -> Self {
        self.data.subviews.extend(views);
        self
    }

    pub fn build(self) -> View {
        View {
            inner: Rc::new(self.data),
        }
    }
}
