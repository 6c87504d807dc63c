//! Application state management
//!
//! Owns the track controller, the UI settings, the recent-files list and the
//! state of the dialogs.

use crate::APP_NAME;
use crate::app::map::MapState;
use crate::app::settings::Settings;
use crate::app::storage::{RecentFiles, StorageBackend};
use gpx_viewer_lib::{Color, TrackController};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Default track line width in pixels
pub const DEFAULT_LINE_WIDTH: f32 = 4.0;

/// Main application state
pub struct AppState {
    /// Registry, lazy loader and selection
    pub controller: TrackController,

    /// Current UI settings
    pub ui_settings: UiSettings,

    /// Recently opened files
    pub recent: RecentFiles,

    /// Where `recent` is persisted, if storage could be opened
    storage: Option<Box<dyn StorageBackend>>,

    /// Open dialogs
    pub dialogs: Dialogs,

    /// Show the file picker on the next frame
    pub show_picker: bool,

    /// Trace count seen after the last load
    track_count: usize,
}

/// UI-specific settings that can be adjusted at runtime
#[derive(Clone, Debug, PartialEq)]
pub struct UiSettings {
    /// Whether the track list sidebar is visible
    pub sidebar_open: bool,

    /// Track line width in pixels
    pub line_width: f32,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            line_width: DEFAULT_LINE_WIDTH,
        }
    }
}

#[derive(Default)]
pub struct Dialogs {
    pub show_about: bool,

    /// Failed loads waiting to be shown, as (path, reason)
    pub load_errors: Vec<(PathBuf, String)>,

    /// Trace whose color is being edited, with the color being edited
    pub color_edit: Option<(PathBuf, [u8; 3])>,
}

impl AppState {
    pub fn new(
        cli_args: &Settings,
        ui_settings: UiSettings,
        auto_center: bool,
        storage: Option<Box<dyn StorageBackend>>,
    ) -> Self {
        let recent = match storage.as_deref().map(|s| RecentFiles::load(s)) {
            Some(Ok(recent)) => recent,
            Some(Err(e)) => {
                tracing::warn!("Could not read recent files: {}", e);
                RecentFiles::default()
            }
            None => RecentFiles::default(),
        };

        let mut ui_settings = ui_settings;
        if let Some(width) = cli_args.line_width {
            ui_settings.line_width = width;
        }

        Self {
            controller: TrackController::new(auto_center && !cli_args.no_auto_center),
            ui_settings,
            recent,
            storage,
            dialogs: Dialogs::default(),
            show_picker: false,
            track_count: 0,
        }
    }

    /// Load files picked, dropped or given on the command line
    pub fn open_files(&mut self, paths: Vec<PathBuf>, map: &mut MapState) {
        if paths.is_empty() {
            return;
        }
        tracing::info!("Opening {} files", paths.len());
        self.controller.open(paths, Instant::now(), map);
        self.after_loads();
    }

    /// Run a lazy-load tick if one is due
    pub fn tick(&mut self, map: &mut MapState) {
        self.controller.tick(Instant::now(), map);
        self.after_loads();
    }

    /// Record finished loads as recent files and, once no batch is running,
    /// hand failures to the error dialog
    fn after_loads(&mut self) {
        let loaded = self.controller.take_loaded();
        let mut recent_changed = !loaded.is_empty();
        for path in loaded {
            self.recent.push(path);
        }

        if !self.controller.is_loading() && self.controller.has_errors() {
            let errors = self.controller.take_errors();
            for (path, _) in &errors {
                recent_changed |= self.recent.remove(path);
            }
            self.dialogs.load_errors.extend(errors);
        }

        if recent_changed {
            self.save_recent();
        }

        // The track list opens once there is more than one trace to pick from
        let count = self.controller.registry().count();
        if self.track_count <= 1 && count > 1 {
            self.ui_settings.sidebar_open = true;
        }
        self.track_count = count;
    }

    fn save_recent(&self) {
        if let Some(storage) = self.storage.as_deref()
            && let Err(e) = self.recent.save(storage)
        {
            tracing::warn!("Could not save recent files: {}", e);
        }
    }

    /// Select a row of the track list
    pub fn select(&mut self, path: &Path, map: &mut MapState) {
        if let Err(e) = self.controller.select(path, map) {
            tracing::error!("Could not select {}: {}", path.display(), e);
        }
    }

    /// Delete the selected trace
    pub fn remove_selected(&mut self, map: &mut MapState) {
        if let Err(e) = self.controller.remove_selected(map) {
            tracing::error!("Could not remove trace: {}", e);
        }
        self.track_count = self.controller.registry().count();
        if self
            .dialogs
            .color_edit
            .as_ref()
            .is_some_and(|(path, _)| !self.controller.registry().contains(path))
        {
            self.dialogs.color_edit = None;
        }
    }

    /// Open the color dialog for the selected trace
    pub fn edit_selected_color(&mut self) {
        let Some(path) = self.controller.selected() else {
            return;
        };
        match self.controller.color_of(path) {
            Ok(Some(color)) => {
                self.dialogs.color_edit = Some((path.to_path_buf(), [color.r, color.g, color.b]));
            }
            Ok(None) => tracing::debug!("{} has no overlays to color", path.display()),
            Err(e) => tracing::error!("Could not read color: {}", e),
        }
    }

    /// Apply the color currently in the color dialog
    pub fn apply_color(&mut self, map: &mut MapState) {
        let Some((path, [r, g, b])) = self.dialogs.color_edit.clone() else {
            return;
        };
        if let Err(e) = self.controller.set_color(&path, Color::rgb(r, g, b), map) {
            tracing::error!("Could not set color: {}", e);
            self.dialogs.color_edit = None;
        }
    }

    /// Window title for the trace whose statistics are shown
    pub fn title(&self) -> String {
        match self.controller.current_trace() {
            Some(trace) => format!("{} - {}", APP_NAME, trace.file_name()),
            None => APP_NAME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::storage::{FileStorage, temp_storage_path};
    use clap::Parser;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
<trk><trkseg>
<trkpt lat="51.5" lon="-0.12"><time>2024-05-01T10:00:00Z</time></trkpt>
<trkpt lat="51.51" lon="-0.11"><time>2024-05-01T10:02:05Z</time></trkpt>
</trkseg></trk>
</gpx>"#;

    fn write_gpx(name: &str, contents: &str) -> PathBuf {
        let dir = temp_storage_path(name);
        let path = dir.with_extension("gpx");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn state_with(args: &[&str], storage: Option<Box<dyn StorageBackend>>) -> AppState {
        let cli = Settings::try_parse_from(args).unwrap();
        AppState::new(&cli, UiSettings::default(), true, storage)
    }

    #[test]
    fn test_cli_overrides() {
        let state = state_with(&["gpx-viewer", "--no-auto-center", "--line-width", "7"], None);
        assert!(!state.controller.auto_center());
        assert_eq!(state.ui_settings.line_width, 7.0);

        let state = state_with(&["gpx-viewer"], None);
        assert!(state.controller.auto_center());
        assert_eq!(state.ui_settings.line_width, DEFAULT_LINE_WIDTH);
    }

    #[test]
    fn test_open_records_recent_files_and_title() {
        let storage_path = temp_storage_path("state-recent");
        let storage = FileStorage::new_with_path(Some(storage_path.clone())).unwrap();
        let mut state = state_with(&["gpx-viewer"], Some(Box::new(storage)));
        let mut map = MapState::default();
        let file = write_gpx("state-good", SAMPLE);

        assert_eq!(state.title(), "GPX Viewer");
        state.open_files(vec![file.clone()], &mut map);

        assert_eq!(state.controller.registry().count(), 1);
        assert_eq!(state.recent.iter().next(), Some(file.as_path()));
        let file_name = file.file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(state.title(), format!("GPX Viewer - {file_name}"));

        let reopened = FileStorage::new_with_path(Some(storage_path.clone())).unwrap();
        assert_eq!(RecentFiles::load(&reopened).unwrap(), state.recent);
        let _ = std::fs::remove_file(file);
        let _ = std::fs::remove_file(storage_path);
    }

    #[test]
    fn test_invalid_file_opens_error_dialog() {
        let mut state = state_with(&["gpx-viewer"], None);
        let mut map = MapState::default();
        let bad = write_gpx("state-bad", "not a gpx file");

        state.open_files(vec![bad.clone()], &mut map);

        assert_eq!(state.controller.registry().count(), 0);
        assert_eq!(state.dialogs.load_errors.len(), 1);
        assert_eq!(state.dialogs.load_errors[0].0, bad);
        assert_eq!(state.recent.iter().count(), 0);
        let _ = std::fs::remove_file(bad);
    }

    #[test]
    fn test_failed_recent_file_is_dropped_from_storage() {
        let storage_path = temp_storage_path("state-stale");
        let bad = write_gpx("state-stale", "<gpx>truncated");
        {
            let storage = FileStorage::new_with_path(Some(storage_path.clone())).unwrap();
            let mut recent = RecentFiles::default();
            recent.push(bad.clone());
            recent.save(&storage).unwrap();
        }

        let storage = FileStorage::new_with_path(Some(storage_path.clone())).unwrap();
        let mut state = state_with(&["gpx-viewer"], Some(Box::new(storage)));
        let mut map = MapState::default();
        assert_eq!(state.recent.iter().next(), Some(bad.as_path()));

        state.open_files(vec![bad.clone()], &mut map);

        assert_eq!(state.recent.iter().count(), 0);
        let reopened = FileStorage::new_with_path(Some(storage_path.clone())).unwrap();
        assert_eq!(RecentFiles::load(&reopened).unwrap().iter().count(), 0);
        let _ = std::fs::remove_file(bad);
        let _ = std::fs::remove_file(storage_path);
    }

    #[test]
    fn test_second_trace_opens_sidebar() {
        let mut state = state_with(&["gpx-viewer"], None);
        state.ui_settings.sidebar_open = false;
        let mut map = MapState::default();
        let first = write_gpx("state-sidebar-1", SAMPLE);
        let second = write_gpx("state-sidebar-2", SAMPLE);
        let third = write_gpx("state-sidebar-3", SAMPLE);

        state.open_files(vec![first.clone()], &mut map);
        assert!(!state.ui_settings.sidebar_open);

        state.open_files(vec![second.clone()], &mut map);
        assert_eq!(state.controller.registry().count(), 2);
        assert!(state.ui_settings.sidebar_open);

        // Closing it again sticks until the count drops back to one
        state.ui_settings.sidebar_open = false;
        state.open_files(vec![third.clone()], &mut map);
        assert!(!state.ui_settings.sidebar_open);

        for file in [first, second, third] {
            let _ = std::fs::remove_file(file);
        }
    }

    #[test]
    fn test_color_dialog_applies_to_selected() {
        let mut state = state_with(&["gpx-viewer"], None);
        let mut map = MapState::default();
        let file = write_gpx("state-color", SAMPLE);
        state.open_files(vec![file.clone()], &mut map);

        state.edit_selected_color();
        let Some((path, _)) = state.dialogs.color_edit.as_ref() else {
            panic!("color dialog should be open");
        };
        assert_eq!(path, &file);
        state.dialogs.color_edit.as_mut().unwrap().1 = [10, 20, 30];
        state.apply_color(&mut map);

        assert_eq!(
            state.controller.color_of(&file).unwrap(),
            Some(Color::rgb(10, 20, 30))
        );

        state.remove_selected(&mut map);
        assert!(state.dialogs.color_edit.is_none());
        assert_eq!(state.title(), "GPX Viewer");
        let _ = std::fs::remove_file(file);
    }
}
