// Service exports
pub mod artifacts;

pub use artifacts::{ArtifactStore, MatchEngine};
