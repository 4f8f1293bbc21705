//! Session files: named view hierarchies plus the steps to replay.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use inspect_tree::{DisplayMode, View, ViewHandle};
use serde::Deserialize;

use crate::error::ReplayError;

/// A recorded inspector session.
///
/// ```json
/// {
///   "hierarchies": { "main": { "handle": 1, "type": "UIWindow" } },
///   "steps": [ { "set_root": "main" }, { "set_selected": 1 } ]
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub hierarchies: BTreeMap<String, View>,
    pub steps: Vec<Step>,
}

impl Session {
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let json = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One change applied during a replay.
///
/// `set_*` steps write the model, as the inspected application would.
/// `select_node`, `expand` and `collapse` act on the tree, as a user would.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Show the named hierarchy, or nothing.
    SetRoot(Option<String>),
    SetRepresented(Option<ViewHandle>),
    SetSelected(Option<ViewHandle>),
    /// Click the node wrapping this view.
    SelectNode(Option<ViewHandle>),
    Expand(ViewHandle),
    Collapse(ViewHandle),
    SetRenderingDepth(u32),
    SetDisplayMode(DisplayMode),
    SetShowHidden(bool),
}

fn or_none<T: fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "none".to_string(),
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::SetRoot(name) => write!(f, "set root {}", or_none(name)),
            Step::SetRepresented(handle) => write!(f, "set represented {}", or_none(handle)),
            Step::SetSelected(handle) => write!(f, "set selected {}", or_none(handle)),
            Step::SelectNode(handle) => write!(f, "select node {}", or_none(handle)),
            Step::Expand(handle) => write!(f, "expand {}", handle),
            Step::Collapse(handle) => write!(f, "collapse {}", handle),
            Step::SetRenderingDepth(depth) => write!(f, "set rendering depth {}", depth),
            Step::SetDisplayMode(mode) => write!(f, "set display mode {:?}", mode),
            Step::SetShowHidden(show) => write!(f, "set show hidden {}", show),
        }
    }
}
