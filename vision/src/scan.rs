//! Region scanning for tolerance-matched pixels.

use crate::frame::{Color, Frame};
use crate::geometry::{Bounds, Point};

/// Collect every pixel in `region` (clamped to the frame) matching any of the
/// target colors within `tolerance`, in row-major scan order.
///
/// Pixels below the frame's opacity floor never match. When `exclude` is
/// given, pixels inside it are skipped; detectors sharing a color family with
/// a UI element carve that element out here.
pub fn scan_matches(
    frame: &Frame,
    region: Bounds,
    colors: &[Color],
    tolerance: u8,
    exclude: Option<Bounds>,
) -> Vec<Point> {
    let mut found = Vec::new();
    if frame.width() == 0 || frame.height() == 0 {
        return found;
    }

    let x0 = region.x.max(0);
    let y0 = region.y.max(0);
    let x1 = (region.x + region.w).min(frame.width() as i32 - 1);
    let y1 = (region.y + region.h).min(frame.height() as i32 - 1);
    if x1 < x0 || y1 < y0 {
        return found;
    }

    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = Point::new(x, y);
            if exclude.is_some_and(|ex| ex.contains(p)) {
                continue;
            }
            if !frame.is_opaque(x as u32, y as u32) {
                continue;
            }
            let c = frame.pixel(x as u32, y as u32);
            if colors.iter().any(|target| c.matches(*target, tolerance)) {
                found.push(p);
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Color = Color::new(200, 40, 40);

    fn scene() -> Frame {
        let mut frame = Frame::filled(20, 20, Color::BLACK);
        frame.fill_rect(Bounds::new(4, 4, 2, 0), INK);
        frame.fill_rect(Bounds::new(15, 10, 0, 0), INK);
        frame
    }

    #[test]
    fn finds_matches_in_row_major_order() {
        let frame = scene();
        let hits = scan_matches(&frame, Bounds::new(0, 0, 19, 19), &[INK], 0, None);
        assert_eq!(
            hits,
            vec![
                Point::new(4, 4),
                Point::new(5, 4),
                Point::new(6, 4),
                Point::new(15, 10),
            ]
        );
    }

    #[test]
    fn tolerance_widens_the_match() {
        let frame = scene();
        let near = Color::new(204, 36, 44);
        assert!(scan_matches(&frame, Bounds::new(0, 0, 19, 19), &[near], 3, None).is_empty());
        let hits = scan_matches(&frame, Bounds::new(0, 0, 19, 19), &[near], 4, None);
        assert_eq!(hits.len(), 4);
    }

    #[test]
    fn region_is_clamped_to_the_frame() {
        let frame = scene();
        let hits = scan_matches(&frame, Bounds::new(-50, -50, 500, 500), &[INK], 0, None);
        assert_eq!(hits.len(), 4);
        assert!(scan_matches(&frame, Bounds::new(30, 30, 10, 10), &[INK], 0, None).is_empty());
    }

    #[test]
    fn region_limits_the_scan() {
        let frame = scene();
        let hits = scan_matches(&frame, Bounds::new(10, 5, 9, 14), &[INK], 0, None);
        assert_eq!(hits, vec![Point::new(15, 10)]);
    }

    #[test]
    fn exclusion_rect_is_carved_out() {
        let frame = scene();
        let hits = scan_matches(
            &frame,
            Bounds::new(0, 0, 19, 19),
            &[INK],
            0,
            Some(Bounds::new(0, 0, 10, 10)),
        );
        assert_eq!(hits, vec![Point::new(15, 10)]);
    }

    #[test]
    fn transparent_pixels_never_match() {
        let mut frame = scene();
        frame.clear_rect(Bounds::new(4, 4, 2, 0));
        let hits = scan_matches(&frame, Bounds::new(0, 0, 19, 19), &[INK], 0, None);
        assert_eq!(hits, vec![Point::new(15, 10)]);
    }
}
