pub mod error;
pub mod render;
pub mod replay;
pub mod session;

pub use error::ReplayError;
pub use render::{RenderOptions, render_tree};
pub use replay::{Replay, run};
pub use session::{Session, Step};
