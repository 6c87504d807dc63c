//! Shared GPX fixtures for unit tests

use crate::Trace;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A track point: (lat, lon, optional RFC 3339 time)
pub type Pt<'a> = (f64, f64, Option<&'a str>);

/// Build a GPX 1.1 document with one track per entry of `tracks`,
/// each track being a list of segments.
pub fn gpx_xml(name: Option<&str>, tracks: &[&[&[Pt<'_>]]]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="gpx-viewer-tests" xmlns="http://www.topografix.com/GPX/1/1">
"#,
    );
    if let Some(name) = name {
        xml.push_str(&format!("<metadata><name>{name}</name></metadata>\n"));
    }
    for segments in tracks {
        xml.push_str("<trk>\n");
        for segment in segments.iter() {
            xml.push_str("<trkseg>\n");
            for (lat, lon, time) in segment.iter() {
                match time {
                    Some(t) => xml.push_str(&format!(
                        "<trkpt lat=\"{lat}\" lon=\"{lon}\"><time>{t}</time></trkpt>\n"
                    )),
                    None => xml.push_str(&format!("<trkpt lat=\"{lat}\" lon=\"{lon}\"></trkpt>\n")),
                }
            }
            xml.push_str("</trkseg>\n");
        }
        xml.push_str("</trk>\n");
    }
    xml.push_str("</gpx>\n");
    xml
}

/// A small timed track around London with `segments` segments of three points each
pub fn sample_xml(segments: usize) -> String {
    const TIMES: [&str; 3] = [
        "2024-05-01T10:00:00Z",
        "2024-05-01T10:01:00Z",
        "2024-05-01T10:02:05Z",
    ];
    let segs: Vec<Vec<Pt<'_>>> = (0..segments)
        .map(|s| {
            let offset = s as f64 * 0.01;
            (0..3)
                .map(|i| {
                    (
                        51.5 + offset + i as f64 * 0.001,
                        -0.12 + i as f64 * 0.001,
                        Some(TIMES[i]),
                    )
                })
                .collect()
        })
        .collect();
    let seg_refs: Vec<&[Pt<'_>]> = segs.iter().map(|s| s.as_slice()).collect();
    gpx_xml(None, &[seg_refs.as_slice()])
}

/// Parse a fixture document as if it had been read from `path`
pub fn trace_from_xml(path: &str, xml: &str) -> Trace {
    Trace::from_reader(PathBuf::from(path), xml.as_bytes()).expect("fixture should parse")
}

/// Parse a sample trace with the given number of segments
pub fn sample_trace(path: &str, segments: usize) -> Trace {
    trace_from_xml(path, &sample_xml(segments))
}

/// Write a fixture to a unique file in the system temp directory
pub fn write_temp_gpx(stem: &str, xml: &str) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!(
        "gpx-viewer-test-{}-{n}-{stem}.gpx",
        std::process::id()
    ));
    std::fs::write(&path, xml).expect("temp file should be writable");
    path
}
