//! Map widget state and the walkers plugin that draws track overlays
//!
//! `MapState` is the [`MapView`] the controller talks to: it owns the walkers
//! camera and the set of overlay ids currently on display. The overlay data
//! itself stays in the registry and is read by [`TrackPlugin`] every frame.

use egui::{Color32, Stroke};
use geo::Point;
use gpx_viewer_lib::{MapView, OverlayId, TrackRegistry};
use std::collections::HashSet;
use std::sync::Arc;
use walkers::{MapMemory, Plugin, Projector};

/// Zoom level the map starts at
pub const INITIAL_ZOOM: f64 = 3.0;

/// Range offered by the zoom slider
pub const ZOOM_RANGE: std::ops::RangeInclusive<f64> = 2.0..=19.0;

/// Camera and displayed overlays of the map widget
pub struct MapState {
    pub memory: MapMemory,
    shown: HashSet<OverlayId>,
    needs_repaint: bool,
}

impl Default for MapState {
    fn default() -> Self {
        let mut memory = MapMemory::default();
        let _ = memory.set_zoom(INITIAL_ZOOM);
        Self {
            memory,
            shown: HashSet::new(),
            needs_repaint: false,
        }
    }
}

impl MapState {
    pub fn is_shown(&self, id: OverlayId) -> bool {
        self.shown.contains(&id)
    }

    /// Jump to an absolute zoom level, e.g. from the zoom slider
    pub fn set_zoom(&mut self, zoom: f64) {
        if self.memory.set_zoom(zoom).is_err() {
            tracing::warn!("Invalid zoom level {}", zoom);
        }
        self.needs_repaint = true;
    }

    /// Whether a redraw was requested since the last call
    pub fn take_repaint(&mut self) -> bool {
        std::mem::take(&mut self.needs_repaint)
    }
}

impl MapView for MapState {
    fn add_overlay(&mut self, id: OverlayId) {
        self.shown.insert(id);
    }

    fn remove_overlay(&mut self, id: OverlayId) {
        self.shown.remove(&id);
    }

    fn redraw(&mut self) {
        self.needs_repaint = true;
    }

    fn zoom(&self) -> f64 {
        self.memory.zoom()
    }

    fn zoom_in(&mut self) {
        if self.memory.zoom_in().is_err() {
            tracing::debug!("Already at maximum zoom");
        }
        self.needs_repaint = true;
    }

    fn zoom_out(&mut self) {
        if self.memory.zoom_out().is_err() {
            tracing::debug!("Already at minimum zoom");
        }
        self.needs_repaint = true;
    }

    fn set_center_and_zoom(&mut self, lat: f64, lon: f64, zoom: f64) {
        self.memory.center_at(walkers::lat_lon(lat, lon));
        self.set_zoom(zoom);
    }
}

/// One polyline to draw, in degrees
struct TrackLine {
    points: Arc<[Point<f64>]>,
    color: Color32,
}

/// Plugin for rendering the displayed overlays on the map
pub struct TrackPlugin {
    lines: Vec<TrackLine>,
    /// Line width in pixels
    width: f32,
}

impl TrackPlugin {
    /// Snapshot the overlays of `registry` that `map` currently displays
    pub fn new(registry: &TrackRegistry, map: &MapState, width: f32) -> Self {
        profiling::scope!("TrackPlugin::new");
        let lines = registry
            .overlays()
            .filter(|overlay| map.is_shown(overlay.id()))
            .map(|overlay| {
                let color = overlay.color();
                TrackLine {
                    points: overlay.shared_points(),
                    color: Color32::from_rgba_unmultiplied(
                        color.r,
                        color.g,
                        color.b,
                        (overlay.alpha() * 255.0).round() as u8,
                    ),
                }
            })
            .collect();
        Self { lines, width }
    }
}

impl Plugin for TrackPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        _response: &egui::Response,
        projector: &Projector,
        _map_memory: &MapMemory,
    ) {
        profiling::scope!("TrackPlugin::run");

        let painter = ui.painter();
        for line in &self.lines {
            if line.points.len() < 2 {
                continue;
            }

            let screen_points: Vec<egui::Pos2> = line
                .points
                .iter()
                .map(|point| {
                    let screen_vec = projector.project(walkers::lat_lon(point.y(), point.x()));
                    egui::Pos2::new(screen_vec.x, screen_vec.y)
                })
                .collect();

            painter.add(egui::Shape::line(
                screen_points,
                Stroke::new(self.width, line.color),
            ));
        }
    }
}
