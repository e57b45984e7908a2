//! Selection-marker confirmation.
//!
//! When a target is selected the client floats a marker over it. The marker
//! is the only trustworthy "the click actually took" signal, so it gates the
//! attack states. Its centroid also gives a rough on-screen distance to the
//! target.

use crate::frame::{Color, Frame};
use crate::geometry::{Bounds, Point};
use crate::scan::scan_matches;

/// Marker colors in priority order; the first family with enough pixels wins.
const MARKER_COLORS: [Color; 2] = [Color::new(131, 148, 205), Color::new(246, 90, 106)];
const MARKER_TOLERANCE: u8 = 5;

/// Fewer matches than this is glare or a stray sprite, not the marker.
const MIN_MARKER_PIXELS: usize = 20;

/// A confirmed marker detection.
#[derive(Debug, Clone, Copy)]
pub struct Marker {
    pub centroid: Point,
    pub pixels: usize,
}

/// Look for the selection marker. `None` means no target is selected.
pub fn detect_marker(frame: &Frame) -> Option<Marker> {
    let region = marker_region(frame);
    for color in MARKER_COLORS {
        let points = scan_matches(frame, region, &[color], MARKER_TOLERANCE, None);
        if points.len() > MIN_MARKER_PIXELS {
            let bounds = Bounds::enclosing(&points)?;
            return Some(Marker {
                centroid: bounds.center(),
                pixels: points.len(),
            });
        }
    }
    None
}

/// Markers only ever float over the middle of the view: the center half of
/// the width, one third of the height starting a sixth of the way down.
fn marker_region(frame: &Frame) -> Bounds {
    let w = frame.width() as i32;
    let h = frame.height() as i32;
    Bounds::new(w / 4, h / 6, w / 2, h / 3)
}
