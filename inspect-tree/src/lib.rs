pub mod event;
pub mod inspect_node;
pub mod model;
pub mod node;
pub mod observable;
pub mod sync;
pub mod traverse;
pub mod view;

pub use event::{Listeners, Subscription};
pub use inspect_node::{InspectTreeNode, build_subtree};
pub use model::{DisplayMode, ModelChange, ViewInspectorModel, WeakModel};
pub use node::{NodeId, TreeArena, TreeNode};
pub use observable::{CollectionChange, Deferred, Observable, ObservableVec};
pub use sync::{InspectTreeRoot, SyncConfig, TreeUpdate};
pub use traverse::{PreOrder, traverse, traverse_forest};
pub use view::{HierarchyError, InspectView, View, ViewBuilder, ViewHandle, same_view};
