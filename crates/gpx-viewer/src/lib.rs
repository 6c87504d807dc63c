//! GPX Viewer desktop application
//!
//! An eframe window with a walkers map, a track list sidebar and the summary
//! statistics of the selected trace. The track bookkeeping lives in
//! [`gpx_viewer_lib`]; this crate only wires it to the UI.

mod app;
mod entrypoints;

pub use app::GpxViewerApp;
pub use entrypoints::run_native;

/// Window and application name
pub const APP_NAME: &str = "GPX Viewer";
