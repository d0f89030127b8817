//! Douglas-Peucker line simplification and coordinate rounding.
//!
//! Distances are planar Euclidean on raw (longitude, latitude) values. With
//! tolerances around 1e-4 degrees the error versus a geodesic distance is
//! irrelevant at world-map scale.

use super::MAX_PRECISION_DIGITS;
use crate::geo::Position;

/// Perpendicular distance from `point` to the line through `start` and `end`.
///
/// When the chord is degenerate (`start == end`, as for a closed ring) this is
/// the distance from `point` to `start`.
pub fn perpendicular_distance(point: Position, start: Position, end: Position) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let chord = dx.hypot(dy);
    if chord == 0.0 {
        return (point.x - start.x).hypot(point.y - start.y);
    }
    ((point.x - start.x) * dy - (point.y - start.y) * dx).abs() / chord
}

/// Simplify a coordinate sequence with the Douglas-Peucker algorithm.
///
/// For each span, the interior point farthest from the span's chord is kept
/// when its distance exceeds `tolerance`, and both halves are processed in
/// turn; otherwise every interior point of the span is dropped. When several
/// points tie for the maximum distance, the first one wins.
///
/// The first and last positions are always kept. Sequences with two or fewer
/// positions are returned unchanged.
pub fn simplify_line(points: &[Position], tolerance: f64) -> Vec<Position> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    // Explicit work stack instead of recursion: long borders can have tens of
    // thousands of vertices.
    let mut spans = vec![(0usize, last)];
    while let Some((start, end)) = spans.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_distance = -1.0;
        let mut max_index = start;
        for (index, point) in points.iter().enumerate().take(end).skip(start + 1) {
            let distance = perpendicular_distance(*point, points[start], points[end]);
            if distance > max_distance {
                max_distance = distance;
                max_index = index;
            }
        }

        if max_distance > tolerance {
            keep[max_index] = true;
            spans.push((max_index, end));
            spans.push((start, max_index));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(point, kept)| kept.then_some(*point))
        .collect()
}

/// Round a single ordinate to `digits` decimal places, at most
/// [`MAX_PRECISION_DIGITS`].
pub fn round_ordinate(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits.min(MAX_PRECISION_DIGITS) as i32);
    (value * factor).round() / factor
}

/// Round both ordinates of a position.
pub fn round_position(position: Position, digits: u32) -> Position {
    Position::new(
        round_ordinate(position.x, digits),
        round_ordinate(position.y, digits),
    )
}

/// Simplify then round a line or ring.
pub fn optimize_line(points: &[Position], digits: u32, tolerance: f64) -> Vec<Position> {
    simplify_line(points, tolerance)
        .into_iter()
        .map(|p| round_position(p, digits))
        .collect()
}
