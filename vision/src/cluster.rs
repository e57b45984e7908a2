//! Sort-then-threshold spatial clustering.
//!
//! Two passes: sort the points by X and split wherever consecutive points are
//! further apart than the X gap, then repeat on Y inside each X run. Each
//! surviving group collapses to its min/max envelope. This trades true
//! density clustering for O(n log n) and is enough when clusters are spaced
//! further apart than the thresholds; two labels closer than the gap merge
//! into one box.

use crate::geometry::{Bounds, Point};

/// Group `points` into bounding boxes. The result does not depend on the
/// input order; an empty input yields an empty output.
pub fn cluster(points: &[Point], x_gap: i32, y_gap: i32) -> Vec<Bounds> {
    if points.is_empty() {
        return Vec::new();
    }

    let mut sorted = points.to_vec();
    sorted.sort_unstable_by_key(|p| p.x);

    let mut out = Vec::new();
    let mut start = 0usize;
    for i in 1..=sorted.len() {
        if i < sorted.len() && sorted[i].x - sorted[i - 1].x <= x_gap {
            continue;
        }
        split_by_y(&mut sorted[start..i], y_gap, &mut out);
        start = i;
    }

    out
}

fn split_by_y(run: &mut [Point], y_gap: i32, out: &mut Vec<Bounds>) {
    run.sort_unstable_by_key(|p| p.y);

    let mut start = 0usize;
    for i in 1..=run.len() {
        if i < run.len() && run[i].y - run[i - 1].y <= y_gap {
            continue;
        }
        if let Some(bounds) = Bounds::enclosing(&run[start..i]) {
            out.push(bounds);
        }
        start = i;
    }
}
