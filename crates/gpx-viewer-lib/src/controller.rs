//! Selection and styling controller
//!
//! `TrackController` owns the registry and the lazy loader and keeps the map and
//! the summary labels in step with them. The map itself is an external widget
//! reached through the [`MapView`] trait and only ever holds overlay ids.

use crate::{
    Color, LazyLoader, OverlayId, RegistryEvent, Result, Schedule, Trace, TraceSummary,
    TrackRegistry,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

/// Opacity of the selected trace's overlays
pub const ALPHA_SELECTED: f32 = 0.8;

/// Opacity of every other overlay while a trace is selected
pub const ALPHA_UNSELECTED: f32 = 0.5;

/// Zoom level used when centering the map on a trace
pub const CENTER_ZOOM: f64 = 12.0;

/// Operations the controller needs from the map widget
pub trait MapView {
    /// Start drawing an overlay
    fn add_overlay(&mut self, id: OverlayId);

    /// Stop drawing an overlay
    fn remove_overlay(&mut self, id: OverlayId);

    /// Request a repaint after overlay styling changed
    fn redraw(&mut self);

    fn zoom(&self) -> f64;

    fn zoom_in(&mut self);

    fn zoom_out(&mut self);

    /// Move the camera to `(lat, lon)` in degrees at `zoom`
    fn set_center_and_zoom(&mut self, lat: f64, lon: f64, zoom: f64);
}

/// Keeps registry, map overlays, selection and summary labels consistent
pub struct TrackController {
    registry: TrackRegistry,
    events: UnboundedReceiver<RegistryEvent>,
    loader: LazyLoader,
    /// Row selected in the track list
    selected: Option<PathBuf>,
    /// Trace whose statistics are currently shown
    current: Option<Arc<Trace>>,
    summary: TraceSummary,
    auto_center: bool,
    /// Failed loads not yet reported to the user
    errors: Vec<(PathBuf, String)>,
    /// Successful loads not yet recorded as recent files
    loaded: Vec<PathBuf>,
    /// Last successful load of the running lazy batch
    batch_last: Option<Arc<Trace>>,
}

impl TrackController {
    pub fn new(auto_center: bool) -> Self {
        Self::with_loader(LazyLoader::new(), auto_center)
    }

    pub fn with_loader(loader: LazyLoader, auto_center: bool) -> Self {
        let mut registry = TrackRegistry::new();
        let events = registry.subscribe();
        Self {
            registry,
            events,
            loader,
            selected: None,
            current: None,
            summary: TraceSummary::empty(),
            auto_center,
            errors: Vec::new(),
            loaded: Vec::new(),
            batch_last: None,
        }
    }

    /// Load a batch of files, synchronously for small batches and one per
    /// tick otherwise
    pub fn open(&mut self, paths: Vec<PathBuf>, now: Instant, map: &mut impl MapView) {
        match self.loader.schedule(paths, now) {
            Schedule::Nothing => {}
            Schedule::Deferred => {}
            Schedule::Immediate(paths) => {
                let mut last = None;
                for path in paths {
                    if let Ok(trace) = self.load(&path) {
                        last = Some(trace);
                    }
                }
                self.process_events(map);
                if let Some(trace) = last {
                    let _ = self.select(trace.full_path(), map);
                }
            }
        }
    }

    /// Load one file into the registry, recording failures for the user
    pub fn load(&mut self, path: &Path) -> Result<Arc<Trace>> {
        profiling::scope!("load_gpx");
        match self.registry.add(path) {
            Ok(trace) => {
                self.loaded.push(path.to_path_buf());
                Ok(trace)
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", path.display(), e);
                self.errors.push((path.to_path_buf(), e.to_string()));
                Err(e)
            }
        }
    }

    /// Run one lazy-load tick if it is due
    ///
    /// When the last file of a batch has been attempted, the last successfully
    /// loaded trace becomes selected.
    pub fn tick(&mut self, now: Instant, map: &mut impl MapView) {
        let Some(path) = self.loader.poll(now) else {
            return;
        };

        if let Ok(trace) = self.load(&path) {
            self.batch_last = Some(trace);
        }
        self.process_events(map);
        self.loader.finish_one();

        if !self.loader.is_loading()
            && let Some(trace) = self.batch_last.take()
        {
            let _ = self.select(trace.full_path(), map);
        }
    }

    /// Apply pending registry notifications to the map
    pub fn process_events(&mut self, map: &mut impl MapView) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                RegistryEvent::Added { trace, overlays } => {
                    for id in overlays {
                        map.add_overlay(id);
                    }
                    map.redraw();
                    self.show_trace(&trace, map);
                }
                RegistryEvent::Removed { trace, overlays } => {
                    for id in overlays {
                        map.remove_overlay(id);
                    }
                    map.redraw();
                    if self
                        .current
                        .as_ref()
                        .is_some_and(|c| c.full_path() == trace.full_path())
                    {
                        self.current = None;
                        self.summary = TraceSummary::empty();
                    }
                }
            }
        }
    }

    /// Select the trace at `path`: emphasise its overlays, dim all others and
    /// show its statistics
    pub fn select(&mut self, path: &Path, map: &mut impl MapView) -> Result<()> {
        let trace = match self.registry.get(path) {
            Ok((trace, _)) => trace.clone(),
            Err(e) => {
                tracing::error!("Selected trace is not in the registry: {}", e);
                return Err(e);
            }
        };

        for overlay in self.registry.overlays_mut(path)? {
            overlay.set_alpha(ALPHA_SELECTED);
        }
        self.registry
            .for_each_other_overlay_mut(path, |overlay| overlay.set_alpha(ALPHA_UNSELECTED));
        map.redraw();

        self.selected = Some(path.to_path_buf());
        self.show_trace(&trace, map);
        Ok(())
    }

    /// Make `trace` the one whose statistics are shown, centering on it if
    /// auto-center is enabled. Does nothing while a batch is loading.
    pub fn show_trace(&mut self, trace: &Arc<Trace>, map: &mut impl MapView) {
        if self.loader.is_loading() {
            return;
        }

        self.summary = TraceSummary::local(trace);
        self.current = Some(trace.clone());

        if self.auto_center {
            let (lat, lon) = trace.centre();
            map.set_center_and_zoom(lat, lon, CENTER_ZOOM);
        }
    }

    /// Remove the selected trace from the registry and the map
    pub fn remove_selected(&mut self, map: &mut impl MapView) -> Result<()> {
        let Some(path) = self.selected.take() else {
            return Ok(());
        };
        self.registry.remove(&path)?;
        self.process_events(map);
        Ok(())
    }

    /// Recolor every overlay of the trace at `path`
    pub fn set_color(&mut self, path: &Path, color: Color, map: &mut impl MapView) -> Result<()> {
        for overlay in self.registry.overlays_mut(path)? {
            overlay.set_color(color);
        }
        map.redraw();
        Ok(())
    }

    /// Color of the trace at `path`, taken from its first overlay
    pub fn color_of(&self, path: &Path) -> Result<Option<Color>> {
        let (_, overlays) = self.registry.get(path)?;
        Ok(overlays.first().map(|o| o.color()))
    }

    #[inline]
    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    #[inline]
    pub fn selected(&self) -> Option<&Path> {
        self.selected.as_deref()
    }

    #[inline]
    pub fn current_trace(&self) -> Option<&Arc<Trace>> {
        self.current.as_ref()
    }

    #[inline]
    pub fn summary(&self) -> &TraceSummary {
        &self.summary
    }

    #[inline]
    pub fn auto_center(&self) -> bool {
        self.auto_center
    }

    pub fn set_auto_center(&mut self, enabled: bool) {
        self.auto_center = enabled;
    }

    /// Whether a lazy batch still has loads outstanding
    #[inline]
    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.loader.pending()
    }

    /// Delay until the next lazy-load tick, if one is scheduled
    pub fn next_tick_in(&self, now: Instant) -> Option<Duration> {
        self.loader.next_tick_in(now)
    }

    #[inline]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take the failed loads collected so far
    pub fn take_errors(&mut self) -> Vec<(PathBuf, String)> {
        std::mem::take(&mut self.errors)
    }

    /// Take the successfully loaded paths collected so far
    pub fn take_loaded(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.loaded)
    }
}
