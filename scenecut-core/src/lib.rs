//! scenecut Core Library
//!
//! This library provides the value types shared by the scenecut crates:
//! frame-accurate timecodes and the half-open scene spans built from them.

pub mod scene;
pub mod timecode;

pub use scene::Scene;
pub use timecode::{Timecode, MIN_FPS_DELTA};

/// Result type for scenecut-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for scenecut-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid timecode string: {0}")]
    Parse(String),

    #[error("Incompatible frame rates: {left} fps vs {right} fps")]
    IncompatibleRate { left: f64, right: f64 },
}
