//! Collision tests used by the server to resolve hits and by clients for
//! cosmetic local effects.

use crate::LASER_RANGE;

/// Point-in-box test against an axis-aligned square.
///
/// The inequalities are strict: a point exactly on an edge does not count as
/// a hit. Wire-compatible clients rely on this, so it is part of the
/// protocol contract rather than a tunable.
pub fn point_in_box(px: f32, py: f32, bx: f32, by: f32, size: f32) -> bool {
    bx < px && px < bx + size && by < py && py < by + size
}

/// End point of a beam fired from `start` at `angle` radians.
pub fn beam_end_point(start: [f32; 2], angle: f32) -> [f32; 2] {
    [
        start[0] + angle.cos() * LASER_RANGE,
        start[1] + angle.sin() * LASER_RANGE,
    ]
}

/// Whether `point` lies within `threshold` of the line through `start` and
/// `end`.
///
/// This projects onto the infinite line, not the clipped segment: a point
/// behind the start or past the end can still register as a hit if it sits
/// close to the line. That matches the shipped behavior and is deliberately
/// not tightened here.
///
/// A degenerate beam (`start == end`) reports no hit rather than dividing
/// by zero.
pub fn beam_hits_point(start: [f32; 2], end: [f32; 2], point: [f32; 2], threshold: f32) -> bool {
    let [x1, y1] = start;
    let [x2, y2] = end;
    let [x0, y0] = point;

    let dd = (x1 - x2) * (x1 - x2) + (y1 - y2) * (y1 - y2);
    if dd == 0.0 {
        return false;
    }

    let dn = (x0 - x2) * (x1 - x2) + (y0 - y2) * (y1 - y2);
    let cx = (dn / dd) * (x1 - x2);
    let cy = (dn / dd) * (y1 - y2);
    let ex = (x0 - x2) - cx;
    let ey = (y0 - y2) - cy;

    let distance = (ex * ex + ey * ey).sqrt();
    distance < threshold
}
