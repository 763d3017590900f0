//! Hit tests and steering helpers
//!
//! Every combat body is a circle with a fixed radius per class, so contact is
//! a squared-distance comparison.

use glam::Vec2;

/// True when two circles touch or overlap
#[inline]
pub fn circles_overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    a.distance_squared(b) <= reach * reach
}

/// Unit vector from `from` toward `to`, or `None` when they coincide
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Option<Vec2> {
    (to - from).try_normalize()
}

/// Move `pos` toward `target` by `step` pixels without overshooting.
/// A negative step backs away from the target.
pub fn step_toward(pos: Vec2, target: Vec2, step: f32) -> Vec2 {
    let Some(dir) = direction_to(pos, target) else {
        return pos;
    };
    let dist = pos.distance(target);
    pos + dir * step.min(dist)
}

/// Stop point on the attack arc: the anchor pulled back toward the attacker by
/// `range` pixels along the attacker's bearing
pub fn arc_stop_point(attacker: Vec2, anchor: Vec2, range: f32) -> Option<Vec2> {
    direction_to(attacker, anchor).map(|dir| anchor - dir * range)
}

/// True when `pos` lies outside `[-margin, size + margin]` on either axis
#[inline]
pub fn outside_area(pos: Vec2, size: Vec2, margin: f32) -> bool {
    pos.x < -margin || pos.x > size.x + margin || pos.y < -margin || pos.y > size.y + margin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circles_overlap_edges() {
        let a = Vec2::new(0.0, 0.0);
        assert!(circles_overlap(a, 2.0, Vec2::new(14.0, 0.0), 12.0));
        assert!(!circles_overlap(a, 2.0, Vec2::new(14.1, 0.0), 12.0));
        assert!(circles_overlap(a, 0.0, a, 0.0));
    }

    #[test]
    fn test_step_toward_does_not_overshoot() {
        let pos = Vec2::new(100.0, 0.0);
        let target = Vec2::new(90.0, 0.0);
        assert_eq!(step_toward(pos, target, 4.0), Vec2::new(96.0, 0.0));
        assert_eq!(step_toward(pos, target, 50.0), target);
        assert_eq!(step_toward(pos, target, -5.0), Vec2::new(105.0, 0.0));
        assert_eq!(step_toward(target, target, 5.0), target);
    }

    #[test]
    fn test_arc_stop_point_follows_bearing() {
        let anchor = Vec2::new(100.0, 200.0);

        // Straight from the right: stop point sits on the same row
        let stop = arc_stop_point(Vec2::new(900.0, 200.0), anchor, 50.0).unwrap();
        assert!((stop - Vec2::new(150.0, 200.0)).length() < 1e-4);

        // From above-right: stop point keeps the range but shifts up
        let stop = arc_stop_point(Vec2::new(400.0, -100.0), anchor, 50.0).unwrap();
        assert!((stop.distance(anchor) - 50.0).abs() < 1e-3);
        assert!(stop.x > anchor.x && stop.y < anchor.y);

        assert!(arc_stop_point(anchor, anchor, 50.0).is_none());
    }

    #[test]
    fn test_outside_area_margins() {
        let size = Vec2::new(800.0, 600.0);
        assert!(!outside_area(Vec2::new(-99.0, 300.0), size, 100.0));
        assert!(outside_area(Vec2::new(-101.0, 300.0), size, 100.0));
        assert!(outside_area(Vec2::new(400.0, 633.0), size, 32.0));
        assert!(!outside_area(Vec2::new(832.0, 0.0), size, 32.0));
    }
}
