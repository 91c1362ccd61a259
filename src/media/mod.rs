//! Media-side collaborators: probing, window planning and chunk extraction.
//!
//! All external tool invocations go through [`CommandExecutor`].

pub mod chunk;
pub mod command;
pub mod extract;
pub mod probe;

pub use chunk::{TimeWindow, WindowPlan, plan};
pub use command::{CommandExecutor, SystemCommandExecutor};
pub use extract::{ChunkArtifact, ChunkExtractor};
pub use probe::DurationProbe;
