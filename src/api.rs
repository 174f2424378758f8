use glam::DVec2;

use crate::error::Result;
use crate::types::*;

/// Pair filter: decides whether `item` may collide with `other`, and how.
/// Returning `None` lets the pair pass without a collision. `item` is `None`
/// when projecting a free-standing rect.
pub type Filter<'a, I> = dyn Fn(Option<&I>, &I) -> Option<ResponseKind> + 'a;

/// Per-item filter used by the query methods.
pub type ItemFilter<'a, I> = dyn Fn(&I) -> bool + 'a;

/// Public API contract for the collision world.
///
/// Filters and response callbacks must not mutate the world they are invoked from.
pub trait WorldApi<I> {
    /// Construct an empty world. Fails with `InvalidCellSize`.
    fn new(cfg: WorldConfig) -> Result<Self>
    where
        Self: Sized;

    // --- Items -------------------------------------------------------------

    /// Register `id` with the given rect.
    fn add(&mut self, id: I, x: f64, y: f64, w: f64, h: f64) -> Result<()>;

    /// Unregister `id`, returning its last rect.
    fn remove(&mut self, id: &I) -> Result<Rect>;

    /// Replace the rect of `id`. Missing width/height keep the current value.
    fn update(&mut self, id: &I, x: f64, y: f64, w: Option<f64>, h: Option<f64>) -> Result<()>;

    // --- Movement ----------------------------------------------------------

    /// Every collision `rect` would meet on its way to the goal, nearest first.
    fn project(
        &self,
        item: Option<&I>,
        rect: Rect,
        goal_x: f64,
        goal_y: f64,
        filter: Option<&Filter<'_, I>>,
    ) -> Result<Vec<Collision<I>>>;

    /// Resolve a movement of `id` towards the goal without committing it.
    fn check(
        &self,
        id: &I,
        goal_x: f64,
        goal_y: f64,
        filter: Option<&Filter<'_, I>>,
    ) -> Result<Movement<I>>;

    /// Resolve a movement of `id` and commit the resulting position.
    fn move_item(
        &mut self,
        id: &I,
        goal_x: f64,
        goal_y: f64,
        filter: Option<&Filter<'_, I>>,
    ) -> Result<Movement<I>>;

    // --- Queries -----------------------------------------------------------

    /// Items whose rect intersects the given rect.
    fn query_rect(
        &self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        filter: Option<&ItemFilter<'_, I>>,
    ) -> Result<Vec<I>>;

    /// Items strictly containing the point.
    fn query_point(&self, x: f64, y: f64, filter: Option<&ItemFilter<'_, I>>) -> Vec<I>;

    /// Items struck by the segment, in the order the segment reaches them.
    fn query_segment(
        &self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        filter: Option<&ItemFilter<'_, I>>,
    ) -> Vec<I>;

    /// Like `query_segment`, with entry/exit fractions and points.
    fn query_segment_with_coords(
        &self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        filter: Option<&ItemFilter<'_, I>>,
    ) -> Vec<SegmentHit<I>>;

    // --- Introspection -----------------------------------------------------

    fn get_rect(&self, id: &I) -> Result<Rect>;
    fn has_item(&self, id: &I) -> bool;
    /// Every registered item with its rect, ordered by id.
    fn items(&self) -> Vec<(I, Rect)>;
    fn count_items(&self) -> usize;
    /// Number of non-empty grid cells.
    fn count_cells(&self) -> usize;
    fn to_cell(&self, x: f64, y: f64) -> Cell;
    fn to_world(&self, cx: i32, cy: i32) -> DVec2;
}

/// Rectangle geometry kernel. No state; every function is pure.
pub trait NarrowphaseApi {
    /// Corner of `rect` nearest to `p`, chosen per axis.
    fn nearest_corner(rect: Rect, p: DVec2) -> DVec2;

    /// Liang-Barsky clip of `p1 -> p2` against `rect`, seeded with `[ti1, ti2]`.
    fn segment_intersection(
        rect: Rect,
        p1: DVec2,
        p2: DVec2,
        ti1: f64,
        ti2: f64,
    ) -> Option<SegmentIntersection>;

    /// Minkowski difference; contains the origin iff the rects overlap.
    fn minkowski_diff(rect: Rect, other: Rect) -> Rect;

    /// Strict containment with a `DELTA` margin on every side.
    fn contains_point(rect: Rect, p: DVec2) -> bool;

    fn is_intersecting(a: Rect, b: Rect) -> bool;

    /// Squared distance between the rect centers.
    fn square_distance(a: Rect, b: Rect) -> f64;

    /// Swept test of `rect` moving to `goal` against a static `other`.
    fn detect_collision(rect: Rect, other: Rect, goal: DVec2) -> Option<Contact>;
}
