use glam::DVec2;

use crate::api::NarrowphaseApi;
use crate::types::*;

/// Narrowphase primitive tests on axis-aligned rects.
pub struct Narrowphase;

/// Pick whichever of `a`/`b` is closer to `x`; ties go to `b`.
fn nearest(x: f64, a: f64, b: f64) -> f64 {
    if (a - x).abs() < (b - x).abs() { a } else { b }
}

/// Sign that maps both zeros to zero (unlike `f64::signum`).
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl NarrowphaseApi for Narrowphase {
    fn nearest_corner(rect: Rect, p: DVec2) -> DVec2 {
        DVec2::new(nearest(p.x, rect.x, rect.right()), nearest(p.y, rect.y, rect.bottom()))
    }

    fn segment_intersection(
        rect: Rect,
        p1: DVec2,
        p2: DVec2,
        mut ti1: f64,
        mut ti2: f64,
    ) -> Option<SegmentIntersection> {
        let d = p2 - p1;
        let mut normal1 = DVec2::ZERO;
        let mut normal2 = DVec2::ZERO;

        // (side normal, p, q) for left, right, top, bottom.
        let sides = [
            (DVec2::new(-1.0, 0.0), -d.x, p1.x - rect.x),
            (DVec2::new(1.0, 0.0), d.x, rect.right() - p1.x),
            (DVec2::new(0.0, -1.0), -d.y, p1.y - rect.y),
            (DVec2::new(0.0, 1.0), d.y, rect.bottom() - p1.y),
        ];

        for (n, p, q) in sides {
            if p == 0.0 {
                // Parallel to this side: reject when outside (or on) its half-plane.
                if q <= 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > ti2 {
                    return None;
                }
                if r > ti1 {
                    ti1 = r;
                    normal1 = n;
                }
            } else {
                if r < ti1 {
                    return None;
                }
                if r < ti2 {
                    ti2 = r;
                    normal2 = n;
                }
            }
        }

        Some(SegmentIntersection { ti1, ti2, normal1, normal2 })
    }

    fn minkowski_diff(rect: Rect, other: Rect) -> Rect {
        Rect::new(
            other.x - rect.x - rect.w,
            other.y - rect.y - rect.h,
            rect.w + other.w,
            rect.h + other.h,
        )
    }

    fn contains_point(rect: Rect, p: DVec2) -> bool {
        p.x - rect.x > DELTA
            && p.y - rect.y > DELTA
            && rect.right() - p.x > DELTA
            && rect.bottom() - p.y > DELTA
    }

    fn is_intersecting(a: Rect, b: Rect) -> bool {
        a.x < b.right() && b.x < a.right() && a.y < b.bottom() && b.y < a.bottom()
    }

    fn square_distance(a: Rect, b: Rect) -> f64 {
        (a.center() - b.center()).length_squared()
    }

    fn detect_collision(rect: Rect, other: Rect, goal: DVec2) -> Option<Contact> {
        let movement = goal - rect.origin();
        let diff = Self::minkowski_diff(rect, other);

        let (overlaps, ti, normal, touch) = if Self::contains_point(diff, DVec2::ZERO) {
            // Already intersecting: ti is minus the overlap area, only used for sorting.
            let corner = Self::nearest_corner(diff, DVec2::ZERO);
            let wi = rect.w.min(corner.x.abs());
            let hi = rect.h.min(corner.y.abs());
            let ti = -wi * hi;

            if movement == DVec2::ZERO {
                // Not moving: push out along the minimum displacement axis.
                let mut p = corner;
                if p.x.abs() < p.y.abs() {
                    p.y = 0.0;
                } else {
                    p.x = 0.0;
                }
                (true, ti, DVec2::new(sign(p.x), sign(p.y)), rect.origin() + p)
            } else {
                // Moving: back out against the direction of travel.
                let hit = Self::segment_intersection(diff, DVec2::ZERO, movement, f64::NEG_INFINITY, 1.0)?;
                (true, ti, hit.normal1, rect.origin() + movement * hit.ti1)
            }
        } else {
            let hit = Self::segment_intersection(
                diff,
                DVec2::ZERO,
                movement,
                f64::NEG_INFINITY,
                f64::INFINITY,
            )?;
            let tunnels = hit.ti1 < 1.0
                // entering and leaving at once means grazing a corner
                && (hit.ti1 - hit.ti2).abs() >= DELTA
                && (0.0 < hit.ti1 + DELTA || (hit.ti1 == 0.0 && hit.ti2 > 0.0));
            if !tunnels {
                return None;
            }
            (false, hit.ti1, hit.normal1, rect.origin() + movement * hit.ti1)
        };

        Some(Contact {
            overlaps,
            ti,
            movement,
            normal,
            touch,
            item_rect: rect,
            other_rect: other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::new(x, y, w, h)
    }

    fn v(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    /// (touch.x, touch.y, normal.x, normal.y) of a detected collision.
    fn touch(item: Rect, other: Rect, goal: Option<DVec2>) -> [f64; 4] {
        let goal = goal.unwrap_or(item.origin());
        let c = Narrowphase::detect_collision(item, other, goal).unwrap();
        [c.touch.x, c.touch.y, c.normal.x, c.normal.y]
    }

    #[test]
    fn test_nearest_corner_per_axis() {
        let rect = r(-2.0, -1.0, 8.0, 7.0);
        assert_eq!(Narrowphase::nearest_corner(rect, DVec2::ZERO), v(-2.0, -1.0));
        assert_eq!(Narrowphase::nearest_corner(rect, v(5.0, 5.0)), v(6.0, 6.0));
        // equidistant: the far edge wins
        assert_eq!(Narrowphase::nearest_corner(r(-5.0, -5.0, 10.0, 10.0), DVec2::ZERO), v(5.0, 5.0));
    }

    #[test]
    fn test_minkowski_diff_contains_origin_iff_overlap() {
        let a = r(0.0, 0.0, 7.0, 6.0);
        let b = r(5.0, 5.0, 1.0, 1.0);
        let d = Narrowphase::minkowski_diff(a, b);
        assert_eq!(d, r(-2.0, -1.0, 8.0, 7.0));
        assert!(Narrowphase::contains_point(d, DVec2::ZERO));

        let far = r(20.0, 0.0, 1.0, 1.0);
        assert!(!Narrowphase::contains_point(Narrowphase::minkowski_diff(a, far), DVec2::ZERO));
    }

    #[test]
    fn test_contains_point_excludes_boundary() {
        let rect = r(0.0, 0.0, 4.0, 4.0);
        assert!(Narrowphase::contains_point(rect, v(2.0, 2.0)));
        assert!(!Narrowphase::contains_point(rect, v(0.0, 2.0)));
        assert!(!Narrowphase::contains_point(rect, v(4.0, 4.0)));
        assert!(!Narrowphase::contains_point(rect, v(2.0, 4.0 - 1e-12)));
    }

    #[test]
    fn test_is_intersecting_and_square_distance() {
        let a = r(0.0, 0.0, 2.0, 2.0);
        assert!(Narrowphase::is_intersecting(a, r(1.0, 1.0, 2.0, 2.0)));
        assert!(!Narrowphase::is_intersecting(a, r(2.0, 0.0, 2.0, 2.0)));
        assert_eq!(Narrowphase::square_distance(a, r(3.0, 4.0, 2.0, 2.0)), 25.0);
        assert_eq!(Narrowphase::square_distance(a, r(0.0, 0.0, 4.0, 4.0)), 2.0);
    }

    #[test]
    fn test_segment_intersection_clipped_and_infinite() {
        let rect = r(2.0, -1.0, 2.0, 2.0);
        let hit = Narrowphase::segment_intersection(rect, v(0.0, 0.0), v(8.0, 0.0), 0.0, 1.0).unwrap();
        assert_eq!(hit.ti1, 0.25);
        assert_eq!(hit.ti2, 0.5);
        assert_eq!(hit.normal1, v(-1.0, 0.0));
        assert_eq!(hit.normal2, v(1.0, 0.0));

        // the segment stops short, but the infinite line still hits
        assert!(Narrowphase::segment_intersection(rect, v(0.0, 0.0), v(1.0, 0.0), 0.0, 1.0).is_none());
        let line = Narrowphase::segment_intersection(
            rect,
            v(0.0, 0.0),
            v(1.0, 0.0),
            f64::NEG_INFINITY,
            f64::INFINITY,
        )
        .unwrap();
        assert_eq!(line.ti1, 2.0);
        assert_eq!(line.ti2, 4.0);

        // parallel and outside
        assert!(Narrowphase::segment_intersection(rect, v(0.0, 5.0), v(8.0, 5.0), 0.0, 1.0).is_none());
    }

    #[test]
    fn test_detect_no_collision_when_apart() {
        let a = r(0.0, 1.0, 1.0, 1.0);
        let b = r(5.0, 5.0, 1.0, 1.0);
        assert!(Narrowphase::detect_collision(a, b, a.origin()).is_none());
        assert!(Narrowphase::detect_collision(a, b, v(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_detect_stationary_overlap() {
        let item = r(0.0, 0.0, 7.0, 6.0);
        let other = r(5.0, 5.0, 1.0, 1.0);
        let c = Narrowphase::detect_collision(item, other, v(0.0, 0.0)).unwrap();
        assert!(c.overlaps);
        assert_eq!(c.ti, -2.0);
        assert_eq!(c.movement, DVec2::ZERO);
        assert_eq!(c.item_rect, item);
        assert_eq!(c.other_rect, other);
        assert_eq!(c.normal, v(0.0, -1.0));
        assert_eq!(c.touch, v(0.0, -1.0));
    }

    #[test]
    fn test_detect_tunnel_from_each_side() {
        let left = Narrowphase::detect_collision(r(1.0, 1.0, 1.0, 1.0), r(5.0, 0.0, 1.0, 1.0), v(6.0, 0.0)).unwrap();
        assert_eq!(left.ti, 0.6);
        assert_eq!(left.normal, v(-1.0, 0.0));

        let right = Narrowphase::detect_collision(r(6.0, 0.0, 1.0, 1.0), r(1.0, 0.0, 1.0, 1.0), v(1.0, 1.0)).unwrap();
        assert!(!right.overlaps);
        assert_eq!(right.ti, 0.8);
        assert_eq!(right.normal, v(1.0, 0.0));

        let top = Narrowphase::detect_collision(r(0.0, 0.0, 1.0, 1.0), r(0.0, 4.0, 1.0, 1.0), v(0.0, 5.0)).unwrap();
        assert!(!top.overlaps);
        assert_eq!(top.ti, 0.6);
        assert_eq!(top.normal, v(0.0, -1.0));

        let bottom = Narrowphase::detect_collision(r(0.0, 4.0, 1.0, 1.0), r(0.0, 0.0, 1.0, 1.0), v(0.0, -1.0)).unwrap();
        assert!(!bottom.overlaps);
        assert_eq!(bottom.ti, 0.6);
        assert_eq!(bottom.normal, v(0.0, 1.0));
    }

    #[test]
    fn test_detect_ignores_corner_graze() {
        let item = r(0.0, 16.0, 16.0, 16.0);
        let other = r(16.0, 0.0, 16.0, 16.0);
        assert!(Narrowphase::detect_collision(item, other, v(-1.0, 15.0)).is_none());
    }

    #[test]
    fn test_detect_touching_edge_moving_in() {
        // flush against the obstacle: contact at ti == 0
        let c = Narrowphase::detect_collision(r(0.0, 4.0, 2.0, 2.0), r(2.0, 4.0, 2.0, 2.0), v(4.0, 4.0)).unwrap();
        assert!(!c.overlaps);
        assert_eq!(c.ti, 0.0);
        assert_eq!(c.normal, v(-1.0, 0.0));
        assert_eq!(c.touch, v(0.0, 4.0));
        // moving away from it is not a collision
        assert!(Narrowphase::detect_collision(r(0.0, 4.0, 2.0, 2.0), r(2.0, 4.0, 2.0, 2.0), v(-4.0, 4.0)).is_none());
    }

    #[test]
    fn test_touch_minimum_displacement_on_static_overlaps() {
        let other = r(0.0, 0.0, 8.0, 8.0);
        let cases = [
            ((-1.0, -1.0), [-1.0, -2.0, 0.0, -1.0]),
            ((3.0, -1.0), [3.0, -2.0, 0.0, -1.0]),
            ((7.0, -1.0), [7.0, -2.0, 0.0, -1.0]),
            ((-1.0, 3.0), [-2.0, 3.0, -1.0, 0.0]),
            ((3.0, 3.0), [3.0, 8.0, 0.0, 1.0]),
            ((7.0, 3.0), [8.0, 3.0, 1.0, 0.0]),
            ((-1.0, 7.0), [-1.0, 8.0, 0.0, 1.0]),
            ((3.0, 7.0), [3.0, 8.0, 0.0, 1.0]),
            ((7.0, 7.0), [7.0, 8.0, 0.0, 1.0]),
        ];
        for ((x, y), expected) in cases {
            assert_eq!(touch(r(x, y, 2.0, 2.0), other, None), expected, "item at ({x}, {y})");
        }
    }

    #[test]
    fn test_touch_moving_overlap_backs_out() {
        let item = r(3.0, 3.0, 2.0, 2.0);
        let other = r(0.0, 0.0, 8.0, 8.0);
        assert_eq!(touch(item, other, Some(v(4.0, 3.0))), [-2.0, 3.0, -1.0, 0.0]);
        assert_eq!(touch(item, other, Some(v(2.0, 3.0))), [8.0, 3.0, 1.0, 0.0]);
        assert_eq!(touch(item, other, Some(v(3.0, 4.0))), [3.0, -2.0, 0.0, -1.0]);
        assert_eq!(touch(item, other, Some(v(3.0, 2.0))), [3.0, 8.0, 0.0, 1.0]);
    }

    #[test]
    fn test_touch_on_tunnels() {
        let other = r(0.0, 0.0, 8.0, 8.0);
        let goal = Some(v(3.0, 3.0));
        assert_eq!(touch(r(-3.0, 3.0, 2.0, 2.0), other, goal), [-2.0, 3.0, -1.0, 0.0]);
        assert_eq!(touch(r(9.0, 3.0, 2.0, 2.0), other, goal), [8.0, 3.0, 1.0, 0.0]);
        assert_eq!(touch(r(3.0, -3.0, 2.0, 2.0), other, goal), [3.0, -2.0, 0.0, -1.0]);
        assert_eq!(touch(r(3.0, 9.0, 2.0, 2.0), other, goal), [3.0, 8.0, 0.0, 1.0]);
    }
}
