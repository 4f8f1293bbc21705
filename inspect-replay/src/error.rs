//! Replay errors

use std::path::PathBuf;

use inspect_tree::ViewHandle;
use thiserror::Error;

/// Errors that stop a replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read session '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid session: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("step {step}: unknown hierarchy '{name}'")]
    UnknownHierarchy { step: usize, name: String },

    #[error("step {step}: no view with handle {handle} in any hierarchy")]
    UnknownView { step: usize, handle: ViewHandle },

    #[error("step {step}: {handle} is not shown in the inspect tree")]
    NotDisplayed { step: usize, handle: ViewHandle },

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("failed to initialize logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}
