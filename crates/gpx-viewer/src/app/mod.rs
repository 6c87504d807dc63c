//! Application module
//!
//! Main window layout:
//! - Menu bar (File, View, Help)
//! - Track list sidebar with the summary of the shown trace
//! - Full-size map view with zoom controls
//! - Drag-and-drop support for GPX files

mod external;
mod map;
pub(crate) mod settings;
mod state;
mod storage;
mod ui_panels;

use crate::app::map::{MapState, TrackPlugin};
use crate::app::settings::Settings;
use crate::app::state::{AppState, UiSettings};
use eframe::egui;
use std::time::Instant;
use walkers::{HttpTiles, Map, sources::OpenStreetMap};

/// Persisted settings (no track data; files come back through Open Recent)
#[derive(serde::Serialize, serde::Deserialize)]
struct PersistedSettings {
    sidebar_open: bool,
    auto_center: bool,
    line_width: f32,
}

const PERSISTED_SETTINGS_KEY: &str = "persisted_settings";

/// Main application structure
pub struct GpxViewerApp {
    /// Application state (tracks, UI settings, dialogs)
    state: AppState,

    /// Map tiles provider (OpenStreetMap)
    tiles: HttpTiles,

    /// Map camera and displayed overlays
    map: MapState,

    /// Title last sent to the window
    title: String,
}

impl GpxViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let cli_args = Settings::from_cli();

        let persisted = if cli_args.ignore_persisted {
            tracing::info!("Ignoring persisted state (--ignore-persisted flag)");
            None
        } else {
            cc.storage.and_then(|s| Self::load_persisted_settings(s))
        };
        let (ui_settings, auto_center) = match persisted {
            Some(settings) => (
                UiSettings {
                    sidebar_open: settings.sidebar_open,
                    line_width: settings.line_width,
                },
                settings.auto_center,
            ),
            None => (UiSettings::default(), true),
        };

        let storage = match storage::default_storage_backend() {
            Ok(storage) => Some(storage),
            Err(e) => {
                tracing::warn!("Recent files will not be remembered: {}", e);
                None
            }
        };

        let mut state = AppState::new(&cli_args, ui_settings, auto_center, storage);
        let mut map = MapState::default();
        state.open_files(cli_args.gpx_files.clone(), &mut map);

        Self {
            state,
            tiles: HttpTiles::new(OpenStreetMap, cc.egui_ctx.clone()),
            map,
            title: crate::APP_NAME.to_string(),
        }
    }

    /// Load persisted settings from eframe storage
    fn load_persisted_settings(storage: &dyn eframe::Storage) -> Option<PersistedSettings> {
        if let Some(json) = storage.get_string(PERSISTED_SETTINGS_KEY)
            && !json.is_empty()
        {
            match serde_json::from_str::<PersistedSettings>(&json) {
                Ok(settings) => {
                    tracing::info!("Restored settings");
                    return Some(settings);
                }
                Err(e) => tracing::warn!("Discarding unreadable settings: {}", e),
            }
        }

        tracing::info!("No persisted settings found, starting fresh");
        None
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        ctx.input(|i| {
            if i.key_pressed(egui::Key::F1) {
                self.state.dialogs.show_about = !self.state.dialogs.show_about;
            }
            if i.key_pressed(egui::Key::O) && i.modifiers.command {
                self.state.show_picker = true;
            }
        });
    }

    fn update_title(&mut self, ctx: &egui::Context) {
        let title = self.state.title();
        if title != self.title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.title = title;
        }
    }
}

#[profiling::all_functions]
impl eframe::App for GpxViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_shortcuts(ctx);

        // Lazy loading runs on the UI loop, one file per tick
        self.state.tick(&mut self.map);

        ui_panels::handle_drag_and_drop(ctx, &mut self.state, &mut self.map);
        ui_panels::show_file_picker(&mut self.state, &mut self.map);

        ui_panels::menu_bar(ctx, &mut self.state, &mut self.map);
        ui_panels::render_sidebar(ctx, &mut self.state, &mut self.map);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                profiling::scope!("map_panel");

                let track_plugin = TrackPlugin::new(
                    self.state.controller.registry(),
                    &self.map,
                    self.state.ui_settings.line_width,
                );

                let map = Map::new(
                    Some(&mut self.tiles),
                    &mut self.map.memory,
                    walkers::lat_lon(0.0, 0.0),
                )
                .with_plugin(track_plugin);
                ui.add(map);
                let tiles_in_progress = self.tiles.stats().in_progress;

                ui_panels::zoom_controls(ui, &mut self.map);
                ui_panels::tile_download_indicator(ui, tiles_in_progress);

                let painter = ui.painter();
                let screen_rect = ui.max_rect();
                painter.text(
                    screen_rect.center_bottom() + egui::vec2(0.0, -5.0),
                    egui::Align2::CENTER_BOTTOM,
                    "© OpenStreetMap contributors",
                    egui::FontId::proportional(10.0),
                    egui::Color32::from_black_alpha(180),
                );
            });

        ui_panels::error_dialog(ctx, &mut self.state);
        ui_panels::color_dialog(ctx, &mut self.state, &mut self.map);
        if self.state.dialogs.show_about {
            ui_panels::about_window(ctx, &mut self.state.dialogs.show_about);
        }

        self.update_title(ctx);

        // Keep polling until the pending tiles arrive
        if self.tiles.stats().in_progress > 0 {
            ctx.request_repaint();
        }
        if self.map.take_repaint() {
            ctx.request_repaint();
        }
        if let Some(delay) = self.state.controller.next_tick_in(Instant::now()) {
            ctx.request_repaint_after(delay);
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedSettings {
            sidebar_open: self.state.ui_settings.sidebar_open,
            auto_center: self.state.controller.auto_center(),
            line_width: self.state.ui_settings.line_width,
        };

        if let Ok(json) = serde_json::to_string(&settings) {
            storage.set_string(PERSISTED_SETTINGS_KEY, json);
            tracing::debug!("Saved settings");
        }
    }
}
