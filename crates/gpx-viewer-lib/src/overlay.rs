//! Map overlays derived from trace geometry
//!
//! One overlay is created per track segment. The registry owns overlays; the map
//! and the UI only refer to them by [`OverlayId`].

use crate::Trace;
use geo::Point;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opacity given to freshly created overlays
pub const DEFAULT_ALPHA: f32 = 0.8;

static NEXT_OVERLAY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique handle of an overlay
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(u64);

impl OverlayId {
    fn next() -> Self {
        OverlayId(NEXT_OVERLAY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Opaque RGB color of an overlay
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Generate a distinct color for the trace loaded at position `index`
    pub fn for_index(index: usize) -> Self {
        let hue = (index as f32 * 137.508) % 360.0; // Golden angle for better distribution
        let saturation = 0.7;
        let value = 0.9;

        let c = value * saturation;
        let x = c * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
        let m = value - c;

        let (r, g, b) = if hue < 60.0 {
            (c, x, 0.0)
        } else if hue < 120.0 {
            (x, c, 0.0)
        } else if hue < 180.0 {
            (0.0, c, x)
        } else if hue < 240.0 {
            (0.0, x, c)
        } else if hue < 300.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };

        Color::rgb(
            ((r + m) * 255.0) as u8,
            ((g + m) * 255.0) as u8,
            ((b + m) * 255.0) as u8,
        )
    }
}

/// Renderable polyline for one segment of a trace
#[derive(Clone, Debug)]
pub struct Overlay {
    id: OverlayId,
    /// Points in degrees (x = lon, y = lat)
    points: Arc<[Point<f64>]>,
    color: Color,
    alpha: f32,
}

impl Overlay {
    /// Build a polyline from `(lat, lon)` radians
    pub fn new(segment: &[(f64, f64)], color: Color) -> Self {
        Self {
            id: OverlayId::next(),
            points: segment
                .iter()
                .map(|&(lat, lon)| Point::new(lon.to_degrees(), lat.to_degrees()))
                .collect(),
            color,
            alpha: DEFAULT_ALPHA,
        }
    }

    /// Derive one overlay per segment, in track/segment order
    pub fn from_trace(trace: &Trace, color: Color) -> Vec<Overlay> {
        trace
            .points()
            .iter()
            .flatten()
            .map(|segment| Overlay::new(segment, color))
            .collect()
    }

    #[inline]
    pub fn id(&self) -> OverlayId {
        self.id
    }

    #[inline]
    pub fn points(&self) -> &[Point<f64>] {
        &self.points
    }

    /// Shared handle to the geometry, for renderers that outlive a borrow
    pub fn shared_points(&self) -> Arc<[Point<f64>]> {
        self.points.clone()
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    #[inline]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }
}
