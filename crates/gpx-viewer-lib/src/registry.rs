//! TrackRegistry - authoritative store of loaded traces and their overlays
//!
//! Entries are keyed by the trace's full path. Every insertion and removal is
//! announced on the subscribers' notification channels so the map and the
//! selection controller can follow along without owning registry data.

use crate::{Color, Overlay, OverlayId, Result, Trace, ViewerError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Change notification emitted by the registry
#[derive(Clone, Debug)]
pub enum RegistryEvent {
    /// A new trace was stored together with its overlays
    Added {
        trace: Arc<Trace>,
        overlays: Vec<OverlayId>,
    },
    /// A trace is being removed; its overlays are no longer valid afterwards
    Removed {
        trace: Arc<Trace>,
        overlays: Vec<OverlayId>,
    },
}

/// Row of the track list, in load order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayRow {
    pub name: String,
    pub path: PathBuf,
}

struct Entry {
    trace: Arc<Trace>,
    overlays: Vec<Overlay>,
}

impl Entry {
    fn overlay_ids(&self) -> Vec<OverlayId> {
        self.overlays.iter().map(Overlay::id).collect()
    }
}

/// Path-keyed store of `(Trace, [Overlay])` with a parallel list of display rows
#[derive(Default)]
pub struct TrackRegistry {
    entries: HashMap<PathBuf, Entry>,
    rows: Vec<DisplayRow>,
    subscribers: Vec<UnboundedSender<RegistryEvent>>,
    /// Number of traces ever added, used to pick default colors
    added_total: usize,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new listener for added/removed notifications
    pub fn subscribe(&mut self) -> UnboundedReceiver<RegistryEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: RegistryEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Load the GPX file at `path` unless it is already present
    ///
    /// Returns the stored trace. Parse failures are propagated and leave the
    /// registry untouched.
    pub fn add(&mut self, path: impl AsRef<Path>) -> Result<Arc<Trace>> {
        let path = path.as_ref();
        if let Some(entry) = self.entries.get(path) {
            return Ok(entry.trace.clone());
        }
        let trace = Trace::open(path)?;
        Ok(self.add_trace(trace))
    }

    /// Store an already parsed trace, keyed by its full path
    ///
    /// Adding a path that is already present returns the existing trace and
    /// emits nothing.
    pub fn add_trace(&mut self, trace: Trace) -> Arc<Trace> {
        let path = trace.full_path().to_path_buf();
        if let Some(entry) = self.entries.get(&path) {
            tracing::debug!("{} already loaded", path.display());
            return entry.trace.clone();
        }

        let color = Color::for_index(self.added_total);
        self.added_total += 1;

        let overlays = Overlay::from_trace(&trace, color);
        let trace = Arc::new(trace);
        let entry = Entry {
            trace: trace.clone(),
            overlays,
        };
        let ids = entry.overlay_ids();

        self.rows.push(DisplayRow {
            name: trace.display_name().to_string(),
            path: path.clone(),
        });
        self.entries.insert(path, entry);

        tracing::info!(
            "Added trace {} ({} overlays)",
            trace.display_name(),
            ids.len()
        );
        self.emit(RegistryEvent::Added {
            trace: trace.clone(),
            overlays: ids,
        });
        trace
    }

    /// Remove the entry for `path` together with its display row
    ///
    /// The `Removed` notification is sent before the entry disappears.
    pub fn remove(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let event = match self.entries.get(path) {
            Some(entry) => RegistryEvent::Removed {
                trace: entry.trace.clone(),
                overlays: entry.overlay_ids(),
            },
            None => return Err(ViewerError::NotFound(path.to_path_buf())),
        };
        self.emit(event);

        self.entries.remove(path);
        self.rows.retain(|row| row.path != path);
        tracing::info!("Removed trace {}", path.display());
        Ok(())
    }

    /// Look up the trace and overlays stored for `path`
    pub fn get(&self, path: impl AsRef<Path>) -> Result<(&Arc<Trace>, &[Overlay])> {
        let path = path.as_ref();
        self.entries
            .get(path)
            .map(|entry| (&entry.trace, entry.overlays.as_slice()))
            .ok_or_else(|| ViewerError::NotFound(path.to_path_buf()))
    }

    /// Mutable access to the overlays of `path`, for restyling
    pub fn overlays_mut(&mut self, path: impl AsRef<Path>) -> Result<&mut [Overlay]> {
        let path = path.as_ref();
        self.entries
            .get_mut(path)
            .map(|entry| entry.overlays.as_mut_slice())
            .ok_or_else(|| ViewerError::NotFound(path.to_path_buf()))
    }

    /// Overlays of every entry except the one holding `trace`
    pub fn other_overlays(&self, trace: &Trace) -> Vec<OverlayId> {
        self.entries
            .iter()
            .filter(|(path, _)| path.as_path() != trace.full_path())
            .flat_map(|(_, entry)| entry.overlays.iter().map(Overlay::id))
            .collect()
    }

    /// Apply `f` to the overlays of every entry except the one at `path`
    pub fn for_each_other_overlay_mut(&mut self, path: &Path, mut f: impl FnMut(&mut Overlay)) {
        for (entry_path, entry) in self.entries.iter_mut() {
            if entry_path.as_path() != path {
                entry.overlays.iter_mut().for_each(&mut f);
            }
        }
    }

    /// Find an overlay by id
    pub fn overlay(&self, id: OverlayId) -> Option<&Overlay> {
        self.entries
            .values()
            .flat_map(|entry| entry.overlays.iter())
            .find(|overlay| overlay.id() == id)
    }

    /// All overlays in load order
    pub fn overlays(&self) -> impl Iterator<Item = &Overlay> {
        self.rows
            .iter()
            .filter_map(|row| self.entries.get(&row.path))
            .flat_map(|entry| entry.overlays.iter())
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.entries.contains_key(path.as_ref())
    }

    /// All traces in load order
    pub fn all_traces(&self) -> Vec<Arc<Trace>> {
        self.rows
            .iter()
            .filter_map(|row| self.entries.get(&row.path))
            .map(|entry| entry.trace.clone())
            .collect()
    }

    /// Display rows in load order
    #[inline]
    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_ALPHA;
    use crate::test_support::*;

    fn drain(rx: &mut UnboundedReceiver<RegistryEvent>) -> Vec<RegistryEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_add_twice_yields_one_entry_and_one_event() {
        let mut registry = TrackRegistry::new();
        let mut rx = registry.subscribe();

        let first = registry.add_trace(sample_trace("/x/a.gpx", 2));
        let second = registry.add_trace(sample_trace("/x/a.gpx", 2));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.rows().len(), 1);
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], RegistryEvent::Added { overlays, .. } if overlays.len() == 2));
    }

    #[test]
    fn test_add_from_path_is_idempotent() {
        let path = write_temp_gpx("idempotent", &sample_xml(1));
        let mut registry = TrackRegistry::new();
        let mut rx = registry.subscribe();

        registry.add(&path).unwrap();
        registry.add(&path).unwrap();

        assert_eq!(registry.count(), 1);
        assert_eq!(drain(&mut rx).len(), 1);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_invalid_path_leaves_registry_unchanged() {
        let path = write_temp_gpx("invalid", "<gpx>this is not valid");
        let mut registry = TrackRegistry::new();
        let mut rx = registry.subscribe();

        assert!(registry.add(&path).is_err());
        assert!(registry.add("/no/such/file.gpx").is_err());

        assert_eq!(registry.count(), 0);
        assert!(registry.rows().is_empty());
        assert!(drain(&mut rx).is_empty());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_overlay_count_matches_segments() {
        let mut registry = TrackRegistry::new();
        registry.add_trace(sample_trace("/x/a.gpx", 4));
        let (trace, overlays) = registry.get("/x/a.gpx").unwrap();
        assert_eq!(overlays.len(), trace.segment_count());
        assert!(overlays.iter().all(|o| o.alpha() == DEFAULT_ALPHA));
    }

    #[test]
    fn test_count_and_other_overlays() {
        let mut registry = TrackRegistry::new();
        let paths = ["/x/a.gpx", "/x/b.gpx", "/x/c.gpx"];
        for (i, path) in paths.iter().enumerate() {
            registry.add_trace(sample_trace(path, i + 1));
        }
        assert_eq!(registry.count(), 3);

        let (b, b_overlays) = registry.get("/x/b.gpx").unwrap();
        let b = b.clone();
        let own: Vec<OverlayId> = b_overlays.iter().map(Overlay::id).collect();
        let others = registry.other_overlays(&b);
        assert_eq!(others.len(), 1 + 3);
        assert!(own.iter().all(|id| !others.contains(id)));

        registry.remove("/x/a.gpx").unwrap();
        assert_eq!(registry.count(), 2);
        let others = registry.other_overlays(&b);
        assert_eq!(others.len(), 3);
        let (_, c_overlays) = registry.get("/x/c.gpx").unwrap();
        assert!(c_overlays.iter().all(|o| others.contains(&o.id())));
    }

    #[test]
    fn test_remove_emits_entry_contents_then_deletes() {
        let mut registry = TrackRegistry::new();
        registry.add_trace(sample_trace("/x/a.gpx", 2));
        let mut rx = registry.subscribe();
        let expected: Vec<OverlayId> = registry
            .get("/x/a.gpx")
            .unwrap()
            .1
            .iter()
            .map(Overlay::id)
            .collect();

        registry.remove("/x/a.gpx").unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            RegistryEvent::Removed { trace, overlays } => {
                assert_eq!(trace.full_path(), Path::new("/x/a.gpx"));
                assert_eq!(overlays, &expected);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(registry.is_empty());
        assert!(registry.rows().is_empty());
    }

    #[test]
    fn test_remove_missing_path_is_not_found() {
        let mut registry = TrackRegistry::new();
        registry.add_trace(sample_trace("/x/a.gpx", 1));
        let mut rx = registry.subscribe();

        let result = registry.remove("/x/missing.gpx");

        assert!(matches!(result, Err(ViewerError::NotFound(_))));
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.rows().len(), 1);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let registry = TrackRegistry::new();
        assert!(matches!(
            registry.get("/x/none.gpx"),
            Err(ViewerError::NotFound(_))
        ));
    }

    #[test]
    fn test_all_traces_and_rows_in_load_order() {
        let mut registry = TrackRegistry::new();
        for path in ["/x/c.gpx", "/x/a.gpx", "/x/b.gpx"] {
            registry.add_trace(sample_trace(path, 1));
        }
        registry.remove("/x/a.gpx").unwrap();
        registry.add_trace(sample_trace("/x/d.gpx", 1));

        let names: Vec<String> = registry.all_traces().iter().map(|t| t.file_name()).collect();
        assert_eq!(names, ["c.gpx", "b.gpx", "d.gpx"]);
        let row_paths: Vec<&Path> = registry.rows().iter().map(|r| r.path.as_path()).collect();
        assert_eq!(
            row_paths,
            [Path::new("/x/c.gpx"), Path::new("/x/b.gpx"), Path::new("/x/d.gpx")]
        );
        assert_eq!(registry.overlays().count(), 3);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut registry = TrackRegistry::new();
        let rx = registry.subscribe();
        let mut kept = registry.subscribe();
        drop(rx);

        registry.add_trace(sample_trace("/x/a.gpx", 1));

        assert_eq!(registry.subscribers.len(), 1);
        assert_eq!(drain(&mut kept).len(), 1);
    }

    #[test]
    fn test_overlay_lookup_and_restyle() {
        let mut registry = TrackRegistry::new();
        registry.add_trace(sample_trace("/x/a.gpx", 1));
        let id = registry.get("/x/a.gpx").unwrap().1[0].id();

        registry.overlays_mut("/x/a.gpx").unwrap()[0].set_alpha(0.3);

        assert_eq!(registry.overlay(id).map(Overlay::alpha), Some(0.3));
        assert!(registry.overlays_mut("/x/none.gpx").is_err());
    }
}
