use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// GPX Viewer - A desktop application for viewing GPS traces and their statistics
pub struct Settings {
    /// GPX files to load on startup
    #[clap(value_name = "FILE")]
    pub gpx_files: Vec<PathBuf>,

    /// Do not move the map to a trace when it is shown
    #[clap(long, default_value = "false")]
    pub no_auto_center: bool,

    /// Track line width in pixels (overrides the persisted value)
    #[clap(long)]
    pub line_width: Option<f32>,

    /// Ignore previously persisted state and start fresh
    #[clap(long, default_value = "false")]
    pub ignore_persisted: bool,
}

impl Settings {
    /// Parse the process arguments, exiting with usage on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }
}
