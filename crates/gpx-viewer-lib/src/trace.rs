//! Trace storage and parsing module
//!
//! This module provides the `Trace` struct for storing a parsed GPX file
//! with precomputed summary metadata like distance, speeds and time span.

use crate::{Result, ViewerError, utils};
use chrono::{DateTime, Utc};
use geo::Rect;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Geometry of one segment: `(lat, lon)` pairs in radians
pub type SegmentPoints = Vec<(f64, f64)>;

/// Represents a single loaded GPX file with precomputed metadata
#[derive(Clone, Debug)]
pub struct Trace {
    /// Full path the trace was loaded from
    path: PathBuf,
    /// Human readable name shown in the track list
    display_name: String,
    /// Tracks -> segments -> points, in radians
    tracks: Vec<Vec<SegmentPoints>>,
    /// Bounding box in degrees (x = lon, y = lat)
    bounding_box: Rect<f64>,
    /// Total distance in meters
    distance: f64,
    /// Fastest speed between two consecutive timed points, in m/s
    maximum_speed: f64,
    /// Sum of the segments' timed spans, in seconds
    duration: f64,
    /// Earliest timestamp in the file
    start: Option<DateTime<Utc>>,
    /// Latest timestamp in the file
    end: Option<DateTime<Utc>>,
}

/// Metadata accumulated while walking one segment
#[derive(Default)]
struct SegmentStats {
    distance: f64,
    maximum_speed: f64,
    first_time: Option<DateTime<Utc>>,
    last_time: Option<DateTime<Utc>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Trace {
    /// Read and parse a GPX file from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        profiling::scope!("trace::open");
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        Self::from_reader(path.to_path_buf(), std::io::BufReader::new(file))
    }

    /// Parse GPX content from any reader, recording `path` as its origin
    pub fn from_reader<R: Read>(path: PathBuf, reader: R) -> Result<Self> {
        let gpx = gpx::read(reader)?;
        Self::from_gpx(path, gpx)
    }

    /// Build a trace from already parsed GPX data
    ///
    /// # Returns
    /// The trace on success, or `EmptyTrace` if the file holds no track points
    pub fn from_gpx(path: PathBuf, gpx: gpx::Gpx) -> Result<Self> {
        let mut tracks = Vec::with_capacity(gpx.tracks.len());
        let mut min_lat = f64::INFINITY;
        let mut min_lon = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut max_lon = f64::NEG_INFINITY;
        let mut total_points = 0usize;
        let mut distance = 0.0;
        let mut maximum_speed: f64 = 0.0;
        let mut duration = 0.0;
        let mut start: Option<DateTime<Utc>> = None;
        let mut end: Option<DateTime<Utc>> = None;

        for track in &gpx.tracks {
            let mut segments = Vec::with_capacity(track.segments.len());
            for segment in &track.segments {
                total_points += segment.points.len();
                for waypoint in &segment.points {
                    let point = waypoint.point();
                    min_lat = min_lat.min(point.y());
                    max_lat = max_lat.max(point.y());
                    min_lon = min_lon.min(point.x());
                    max_lon = max_lon.max(point.x());
                }

                let stats = Self::segment_stats(&segment.points);
                distance += stats.distance;
                maximum_speed = maximum_speed.max(stats.maximum_speed);
                if let (Some(first), Some(last)) = (stats.first_time, stats.last_time) {
                    duration += (last - first).num_milliseconds() as f64 / 1000.0;
                    start = Some(start.map_or(first, |s| s.min(first)));
                    end = Some(end.map_or(last, |e| e.max(last)));
                }

                segments.push(
                    segment
                        .points
                        .iter()
                        .map(utils::waypoint_to_radians)
                        .collect(),
                );
            }
            tracks.push(segments);
        }

        if total_points == 0 {
            return Err(ViewerError::EmptyTrace);
        }

        let display_name = Self::pick_display_name(&path, &gpx);
        tracing::debug!(
            "Parsed {} ({} points, {:.0} m)",
            path.display(),
            total_points,
            distance
        );

        Ok(Trace {
            path,
            display_name,
            tracks,
            bounding_box: Rect::new(
                geo::Coord {
                    x: min_lon,
                    y: min_lat,
                },
                geo::Coord {
                    x: max_lon,
                    y: max_lat,
                },
            ),
            distance,
            maximum_speed,
            duration,
            start,
            end,
        })
    }

    /// Walk consecutive points of a segment, accumulating distance and speeds
    fn segment_stats(points: &[gpx::Waypoint]) -> SegmentStats {
        let mut stats = SegmentStats::default();
        let mut prev: Option<(f64, f64, Option<DateTime<Utc>>)> = None;

        for waypoint in points {
            let (lat, lon) = utils::waypoint_to_radians(waypoint);
            let time = waypoint.time.as_ref().and_then(utils::gpx_time_to_utc);

            if let Some(t) = time {
                stats.first_time.get_or_insert(t);
                stats.last_time = Some(t);
            }

            if let Some((prev_lat, prev_lon, prev_time)) = prev {
                let step = utils::haversine_distance(prev_lat, prev_lon, lat, lon);
                stats.distance += step;

                if let (Some(t0), Some(t1)) = (prev_time, time) {
                    let dt = (t1 - t0).num_milliseconds() as f64 / 1000.0;
                    if dt > 0.0 {
                        stats.maximum_speed = stats.maximum_speed.max(step / dt);
                    }
                }
            }
            prev = Some((lat, lon, time));
        }

        stats
    }

    fn pick_display_name(path: &Path, gpx: &gpx::Gpx) -> String {
        gpx.metadata
            .as_ref()
            .and_then(|m| m.name.clone())
            .or_else(|| gpx.tracks.iter().find_map(|t| t.name.clone()))
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            })
    }

    /// Full path the trace was loaded from
    #[inline]
    pub fn full_path(&self) -> &Path {
        &self.path
    }

    /// File name component of the path
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    #[inline]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Tracks -> segments -> `(lat, lon)` points in radians
    #[inline]
    pub fn points(&self) -> &[Vec<SegmentPoints>] {
        &self.tracks
    }

    /// Total number of segments across all tracks
    pub fn segment_count(&self) -> usize {
        self.tracks.iter().map(Vec::len).sum()
    }

    /// Total distance in meters
    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Average speed over the timed part of the trace, in m/s
    ///
    /// Zero when the trace carries no usable timestamps.
    pub fn average_speed(&self) -> f64 {
        if self.duration > 0.0 {
            self.distance / self.duration
        } else {
            0.0
        }
    }

    /// Maximum speed between two consecutive points, in m/s
    #[inline]
    pub fn maximum_speed(&self) -> f64 {
        self.maximum_speed
    }

    /// Duration in seconds
    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[inline]
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    #[inline]
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// Centre of the bounding box as `(lat, lon)` in degrees
    pub fn centre(&self) -> (f64, f64) {
        let c = self.bounding_box.center();
        (c.y, c.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[test]
    fn test_trace_creation() {
        let trace = sample_trace("/data/ride.gpx", 2);

        assert_eq!(trace.points().len(), 1);
        assert_eq!(trace.segment_count(), 2);
        assert_eq!(trace.full_path(), Path::new("/data/ride.gpx"));
        assert_eq!(trace.file_name(), "ride.gpx");
    }

    #[test]
    fn test_points_are_radians() {
        let trace = sample_trace("/data/ride.gpx", 1);
        let (lat, lon) = trace.points()[0][0][0];
        assert!((lat - 51.5_f64.to_radians()).abs() < 1e-12);
        assert!((lon - (-0.12_f64).to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_empty_trace_fails() {
        let xml = gpx_xml(Some("nothing"), &[]);
        let result = Trace::from_reader(PathBuf::from("empty.gpx"), xml.as_bytes());
        assert!(matches!(result, Err(ViewerError::EmptyTrace)));
    }

    #[test]
    fn test_invalid_xml_fails() {
        let result = Trace::from_reader(PathBuf::from("bad.gpx"), "not a gpx file".as_bytes());
        assert!(matches!(result, Err(ViewerError::GpxParse(_))));
    }

    #[test]
    fn test_missing_file_fails() {
        let result = Trace::open("/definitely/not/here.gpx");
        assert!(matches!(result, Err(ViewerError::Io(_))));
    }

    #[test]
    fn test_open_from_disk() {
        let path = write_temp_gpx("open", &sample_xml(1));
        let trace = Trace::open(&path).unwrap();
        assert_eq!(trace.full_path(), path.as_path());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_display_name_prefers_metadata() {
        let seg: &[Pt<'_>] = &[(1.0, 1.0, None)];
        let xml = gpx_xml(Some("Morning Ride"), &[&[seg]]);
        let trace = trace_from_xml("/x/file.gpx", &xml);
        assert_eq!(trace.display_name(), "Morning Ride");
    }

    #[test]
    fn test_display_name_falls_back_to_file_stem() {
        let trace = sample_trace("/x/evening-run.gpx", 1);
        assert_eq!(trace.display_name(), "evening-run");
    }

    #[test]
    fn test_duration_and_time_span() {
        // Each sample segment spans 125 seconds
        let trace = sample_trace("/x/a.gpx", 1);
        assert!((trace.duration() - 125.0).abs() < 1e-9);
        let start = trace.start_time().unwrap();
        let end = trace.end_time().unwrap();
        assert_eq!((end - start).num_seconds(), 125);
    }

    #[test]
    fn test_duration_sums_segments() {
        let trace = sample_trace("/x/a.gpx", 3);
        assert!((trace.duration() - 375.0).abs() < 1e-9);
    }

    #[test]
    fn test_speeds() {
        // Two points 1/1000 degree of latitude apart (~111 m) in 10 seconds,
        // then the same distance in 100 seconds
        let seg: &[Pt<'_>] = &[
            (10.000, 0.0, Some("2024-01-01T00:00:00Z")),
            (10.001, 0.0, Some("2024-01-01T00:00:10Z")),
            (10.002, 0.0, Some("2024-01-01T00:01:50Z")),
        ];
        let trace = trace_from_xml("/x/s.gpx", &gpx_xml(None, &[&[seg]]));

        let step = 111.195;
        assert!((trace.distance() - 2.0 * step).abs() < 0.5);
        assert!((trace.maximum_speed() - step / 10.0).abs() < 0.05);
        assert!((trace.average_speed() - 2.0 * step / 110.0).abs() < 0.01);
    }

    #[test]
    fn test_untimed_trace_has_zero_speeds() {
        let seg: &[Pt<'_>] = &[(10.0, 0.0, None), (10.1, 0.0, None)];
        let trace = trace_from_xml("/x/u.gpx", &gpx_xml(None, &[&[seg]]));
        assert!(trace.distance() > 0.0);
        assert_eq!(trace.duration(), 0.0);
        assert_eq!(trace.average_speed(), 0.0);
        assert_eq!(trace.maximum_speed(), 0.0);
        assert!(trace.start_time().is_none());
    }

    #[test]
    fn test_centre() {
        let seg: &[Pt<'_>] = &[(10.0, 20.0, None), (12.0, 24.0, None)];
        let trace = trace_from_xml("/x/c.gpx", &gpx_xml(None, &[&[seg]]));
        let (lat, lon) = trace.centre();
        assert!((lat - 11.0).abs() < 1e-9);
        assert!((lon - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_not_bridged_across_segments() {
        let a: &[Pt<'_>] = &[(0.0, 0.0, None), (0.0, 0.001, None)];
        let b: &[Pt<'_>] = &[(10.0, 10.0, None), (10.0, 10.001, None)];
        let trace = trace_from_xml("/x/g.gpx", &gpx_xml(None, &[&[a, b]]));
        // Two short hops, not the ~1500 km jump between the segments
        assert!(trace.distance() < 1000.0);
    }
}
