//! GPX Viewer Library - Core Track Management for a Desktop GPX Viewer
//!
//! This library keeps loaded GPX traces, their on-map overlays and the UI selection
//! state consistent, independently of the GUI toolkit that draws them.
//!
//! # Architecture
//!
//! - **[`Trace`]**: Immutable parsed GPX file with precomputed summary metadata
//! - **[`Overlay`]**: Styled polyline for one track segment of a trace
//! - **[`TrackRegistry`]**: Path-keyed store of traces and overlays with change notifications
//! - **[`LazyLoader`]**: Chunks large batches of files into one load per timer tick
//! - **[`TrackController`]**: Selection, emphasis styling and map synchronisation
//! - **[`summary`]**: Display formatting of a trace's statistics

mod controller;
mod loader;
mod overlay;
mod registry;
pub mod summary;
mod trace;
pub mod utils;

#[cfg(test)]
mod test_support;

// Public API exports
pub use controller::{ALPHA_SELECTED, ALPHA_UNSELECTED, MapView, TrackController};
pub use loader::{LAZY_LOAD_AFTER_N_FILES, LAZY_LOAD_TICK, LazyLoader, Schedule};
pub use overlay::{Color, DEFAULT_ALPHA, Overlay, OverlayId};
pub use registry::{DisplayRow, RegistryEvent, TrackRegistry};
pub use summary::TraceSummary;
pub use trace::Trace;

use std::path::PathBuf;

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Trace contains no points")]
    EmptyTrace,

    #[error("No trace loaded for {0}")]
    NotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, ViewerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        let _: fn() -> TrackRegistry = TrackRegistry::new;
        let _: fn() -> LazyLoader = LazyLoader::new;
    }

    #[test]
    fn test_not_found_message_names_path() {
        let err = ViewerError::NotFound(PathBuf::from("/tmp/missing.gpx"));
        assert!(err.to_string().contains("missing.gpx"));
    }
}
