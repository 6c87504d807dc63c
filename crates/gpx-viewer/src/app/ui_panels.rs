//! UI panels for the application
//!
//! Menu bar, track list sidebar with the summary labels, map zoom controls,
//! dialogs and drag-and-drop.

use crate::APP_NAME;
use crate::app::external::EXTERNAL_EDITORS;
use crate::app::map::{MapState, ZOOM_RANGE};
use crate::app::state::AppState;
use egui::{Color32, RichText, Ui};
use gpx_viewer_lib::MapView;
use std::path::{Path, PathBuf};

/// Render the menu bar (File, View, Help)
pub fn menu_bar(ctx: &egui::Context, state: &mut AppState, map: &mut MapState) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| file_menu(ui, state, map));
            ui.menu_button("View", |ui| view_menu(ui, state, map));
            ui.menu_button("Help", |ui| {
                if ui.button("About").clicked() {
                    state.dialogs.show_about = true;
                }
            });
        });
    });
}

fn file_menu(ui: &mut Ui, state: &mut AppState, map: &mut MapState) {
    if ui.button("📂 Open...").clicked() {
        state.show_picker = true;
    }

    ui.add_enabled_ui(!state.recent.is_empty(), |ui| {
        ui.menu_button("Open Recent", |ui| {
            let recent: Vec<PathBuf> = state.recent.iter().map(Path::to_path_buf).collect();
            for path in recent {
                let label = path.file_name().unwrap_or_default().to_string_lossy();
                if ui
                    .button(label.as_ref())
                    .on_hover_text(path.display().to_string())
                    .clicked()
                {
                    state.open_files(vec![path.clone()], map);
                }
            }
        });
    });

    let current = state
        .controller
        .current_trace()
        .map(|trace| trace.full_path().to_path_buf());
    ui.add_enabled_ui(current.is_some(), |ui| {
        ui.menu_button("Open With", |ui| {
            for editor in EXTERNAL_EDITORS {
                if ui.button(editor.label).clicked()
                    && let Some(path) = &current
                {
                    editor.open(path);
                }
            }
        });
    });

    ui.separator();
    if ui.button("Quit").clicked() {
        ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
    }
}

fn view_menu(ui: &mut Ui, state: &mut AppState, map: &mut MapState) {
    ui.checkbox(&mut state.ui_settings.sidebar_open, "Show Sidebar");

    let mut auto_center = state.controller.auto_center();
    if ui.checkbox(&mut auto_center, "Auto Center").changed() {
        state.controller.set_auto_center(auto_center);
    }

    ui.separator();
    if ui.button("Zoom In").clicked() {
        map.zoom_in();
    }
    if ui.button("Zoom Out").clicked() {
        map.zoom_out();
    }
}

/// Render the track list sidebar
pub fn render_sidebar(ctx: &egui::Context, state: &mut AppState, map: &mut MapState) {
    if !state.ui_settings.sidebar_open {
        return;
    }

    egui::SidePanel::left("main_sidebar")
        .default_width(280.0)
        .min_width(220.0)
        .max_width(450.0)
        .resizable(true)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("➕ Add").clicked() {
                    state.show_picker = true;
                }
                let has_selection = state.controller.selected().is_some();
                if ui
                    .add_enabled(has_selection, egui::Button::new("🗑 Delete"))
                    .clicked()
                {
                    state.remove_selected(map);
                }
                if ui
                    .add_enabled(has_selection, egui::Button::new("🎨 Color"))
                    .clicked()
                {
                    state.edit_selected_color();
                }
            });

            if state.controller.is_loading() {
                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(
                        RichText::new(format!(
                            "Loading files... ({} remaining)",
                            state.controller.pending()
                        ))
                        .color(ui.visuals().warn_fg_color),
                    );
                });
            }

            ui.separator();

            // Summary stays at the bottom, the list takes the rest
            egui::TopBottomPanel::bottom("summary_panel")
                .resizable(false)
                .show_inside(ui, |ui| render_summary(ui, state));

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| render_track_list(ui, state, map));
        });
}

fn render_track_list(ui: &mut Ui, state: &mut AppState, map: &mut MapState) {
    let rows = state.controller.registry().rows().to_vec();
    if rows.is_empty() {
        ui.label(
            RichText::new("Open or drop GPX files to show them on the map")
                .small()
                .weak(),
        );
        return;
    }

    let selected = state.controller.selected().map(Path::to_path_buf);
    for row in rows {
        let is_selected = selected.as_deref() == Some(row.path.as_path());
        if ui
            .selectable_label(is_selected, format!("📄 {}", row.name))
            .on_hover_text(row.path.display().to_string())
            .clicked()
        {
            state.select(&row.path, map);
        }
    }
}

/// Summary labels of the trace being shown
fn render_summary(ui: &mut Ui, state: &AppState) {
    let summary = state.controller.summary();
    ui.add_space(4.0);
    egui::Grid::new("summary_grid")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            for (label, value) in [
                ("Distance:", &summary.distance),
                ("Average Speed:", &summary.average_speed),
                ("Maximum Speed:", &summary.maximum_speed),
                ("Duration:", &summary.duration),
                ("Logging Date:", &summary.logging_date),
                ("Logging Time:", &summary.logging_time),
            ] {
                ui.label(label);
                ui.label(RichText::new(value.as_str()).strong());
                ui.end_row();
            }
        });
    ui.add_space(4.0);
}

/// Zoom buttons and slider overlaid on the top-left of the map
pub fn zoom_controls(ui: &mut Ui, map: &mut MapState) {
    let origin = ui.max_rect().left_top() + egui::vec2(10.0, 10.0);
    egui::Area::new(egui::Id::new("zoom_controls"))
        .fixed_pos(origin)
        .show(ui.ctx(), |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    if ui.button("➕").clicked() {
                        map.zoom_in();
                    }
                    let mut zoom = map.zoom();
                    if ui
                        .add(
                            egui::Slider::new(&mut zoom, ZOOM_RANGE)
                                .vertical()
                                .step_by(1.0)
                                .show_value(false),
                        )
                        .changed()
                    {
                        map.set_zoom(zoom);
                    }
                    if ui.button("➖").clicked() {
                        map.zoom_out();
                    }
                });
            });
        });
}

/// Hover text of the tile download indicator, if it should be shown
fn tile_download_status(in_progress: usize) -> Option<&'static str> {
    (in_progress > 0).then_some("Downloading Map")
}

/// Spinner in the top-right corner of the map while tiles are being fetched
pub fn tile_download_indicator(ui: &mut Ui, in_progress: usize) {
    let Some(status) = tile_download_status(in_progress) else {
        return;
    };
    let origin = ui.max_rect().right_top() + egui::vec2(-10.0, 10.0);
    egui::Area::new(egui::Id::new("tile_download_indicator"))
        .pivot(egui::Align2::RIGHT_TOP)
        .fixed_pos(origin)
        .show(ui.ctx(), |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.add(egui::Spinner::new()).on_hover_text(status);
            });
        });
}

/// Aggregated report of files that failed to load
pub fn error_dialog(ctx: &egui::Context, state: &mut AppState) {
    if state.dialogs.load_errors.is_empty() {
        return;
    }

    let mut close = false;
    egui::Window::new("Invalid GPX file")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label("You selected an invalid GPX file.\nPlease try again");
            ui.add_space(8.0);
            egui::ScrollArea::vertical()
                .max_height(160.0)
                .show(ui, |ui| {
                    for (path, error) in &state.dialogs.load_errors {
                        ui.label(
                            RichText::new(format!(
                                "• {}: {}",
                                path.file_name().unwrap_or_default().to_string_lossy(),
                                error
                            ))
                            .small()
                            .color(Color32::RED),
                        );
                    }
                });
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                close = true;
            }
        });

    if close {
        state.dialogs.load_errors.clear();
    }
}

/// Color picker for the trace being recolored
pub fn color_dialog(ctx: &egui::Context, state: &mut AppState, map: &mut MapState) {
    let Some((path, rgb)) = state.dialogs.color_edit.as_mut() else {
        return;
    };

    let title = path.file_name().unwrap_or_default().to_string_lossy().to_string();
    let mut changed = false;
    let mut close = false;
    egui::Window::new("Track Color")
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(title);
            ui.horizontal(|ui| {
                ui.label("Color:");
                changed = ui.color_edit_button_srgb(rgb).changed();
            });
            if ui.button("Close").clicked() {
                close = true;
            }
        });

    if changed {
        state.apply_color(map);
    }
    if close {
        state.dialogs.color_edit = None;
    }
}

/// About dialog
pub fn about_window(ctx: &egui::Context, show_about: &mut bool) {
    egui::Window::new("About")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.heading(APP_NAME);
            ui.label(RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION"))).small());
            ui.add_space(8.0);

            ui.label("View GPS traces on a map together with their statistics.");
            ui.add_space(8.0);

            ui.label(RichText::new("Loading Tracks").strong());
            ui.label("• File > Open... or Ctrl+O");
            ui.label("• Or drag and drop GPX files onto the window");
            ui.add_space(12.0);

            if ui.button("Close").clicked() {
                *show_about = false;
            }
        });
}

/// Show file picker dialog
pub fn show_file_picker(state: &mut AppState, map: &mut MapState) {
    if !state.show_picker {
        return;
    }
    state.show_picker = false;

    if let Some(paths) = rfd::FileDialog::new()
        .add_filter("GPX Files", &["gpx"])
        .set_title("Select GPX Files")
        .pick_files()
    {
        state.open_files(paths, map);
    }
}

fn is_gpx(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("gpx"))
}

/// Handle drag and drop of GPX files
pub fn handle_drag_and_drop(ctx: &egui::Context, state: &mut AppState, map: &mut MapState) {
    let hovered_files = ctx.input(|i| !i.raw.hovered_files.is_empty());
    let dropped_files: Vec<_> = ctx.input(|i| i.raw.dropped_files.clone());

    if hovered_files {
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("drop_preview"),
        ));
        let screen_rect = ctx.content_rect();
        let bg_rect = egui::Rect::from_center_size(screen_rect.center(), egui::vec2(340.0, 80.0));
        painter.rect_filled(bg_rect, 16.0, Color32::from_black_alpha(180));
        painter.text(
            screen_rect.center(),
            egui::Align2::CENTER_CENTER,
            "📂 Drop GPX files here",
            egui::FontId::proportional(32.0),
            Color32::WHITE,
        );
    }

    let paths: Vec<PathBuf> = dropped_files
        .into_iter()
        .filter_map(|file| file.path)
        .filter(|path| is_gpx(path))
        .collect();
    state.open_files(paths, map);
}
