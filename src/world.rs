use glam::DVec2;
use tracing::{debug, instrument, trace};

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use crate::api::{Filter, ItemFilter, NarrowphaseApi, WorldApi};
use crate::cells::CellIndex;
use crate::error::{CollisionError, Result};
use crate::grid;
use crate::narrowphase::Narrowphase;
use crate::response::{Bounce, Cross, Response, Slide, Touch};
use crate::types::*;

/// Bounds required of item identifiers. Implemented for every qualifying type.
pub trait ItemKey: Clone + Eq + Hash + Ord + Debug {}

impl<T: Clone + Eq + Hash + Ord + Debug> ItemKey for T {}

/// Filter used when the caller passes none: every pair slides.
fn default_filter<I>(_item: Option<&I>, _other: &I) -> Option<ResponseKind> {
    Some(ResponseKind::Slide)
}

/// Collision world: item rects, the cell index over them, and response policies.
pub struct World<I> {
    cfg: WorldConfig,
    rects: HashMap<I, Rect>,
    cells: CellIndex<I>,
    responses: HashMap<&'static str, Box<dyn Response<I>>>,
}

impl<I: ItemKey> WorldApi<I> for World<I> {
    fn new(cfg: WorldConfig) -> Result<Self> {
        cfg.validate()?;
        let mut world = Self {
            cfg,
            rects: HashMap::new(),
            cells: CellIndex::new(),
            responses: HashMap::new(),
        };
        world.add_response(ResponseKind::Touch.name(), Touch);
        world.add_response(ResponseKind::Cross.name(), Cross);
        world.add_response(ResponseKind::Slide.name(), Slide);
        world.add_response(ResponseKind::Bounce.name(), Bounce);
        Ok(world)
    }

    fn add(&mut self, id: I, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        if self.rects.contains_key(&id) {
            return Err(CollisionError::duplicate(&id));
        }
        let rect = Rect::try_new(x, y, w, h)?;
        let cr = self.cell_rect(rect)?;
        self.cells.insert_rect(&id, cr);
        debug!(item = ?id, ?rect, ?cr, "add");
        self.rects.insert(id, rect);
        Ok(())
    }

    fn remove(&mut self, id: &I) -> Result<Rect> {
        let rect = self.get_rect(id)?;
        let cr = self.cell_rect(rect)?;
        self.rects.remove(id);
        self.cells.remove_rect(id, cr);
        debug!(item = ?id, ?rect, "remove");
        Ok(rect)
    }

    fn update(&mut self, id: &I, x: f64, y: f64, w: Option<f64>, h: Option<f64>) -> Result<()> {
        let old = self.get_rect(id)?;
        let new = Rect::try_new(x, y, w.unwrap_or(old.w), h.unwrap_or(old.h))?;
        if old == new {
            return Ok(());
        }

        let old_cr = self.cell_rect(old)?;
        let new_cr = self.cell_rect(new)?;
        if old_cr != new_cr {
            self.cells.move_rect(id, old_cr, new_cr);
            debug!(item = ?id, from = ?old_cr, to = ?new_cr, "cells changed");
        }
        if let Some(rect) = self.rects.get_mut(id) {
            *rect = new;
        }
        Ok(())
    }

    fn project(
        &self,
        item: Option<&I>,
        rect: Rect,
        goal_x: f64,
        goal_y: f64,
        filter: Option<&Filter<'_, I>>,
    ) -> Result<Vec<Collision<I>>> {
        rect.validate()?;
        rect.at(DVec2::new(goal_x, goal_y)).validate()?;
        let filter: &Filter<'_, I> = match filter {
            Some(f) => f,
            None => &default_filter::<I>,
        };
        let goal = DVec2::new(goal_x, goal_y);

        // Broadphase over the bounding box of the whole movement.
        let tl = rect.origin().min(goal);
        let br = (rect.origin() + rect.size()).max(goal + rect.size());
        let span = Rect::new(tl.x, tl.y, br.x - tl.x, br.y - tl.y);
        let cr = self.cell_rect(span)?;

        let mut collisions = Vec::new();
        for other in self.cells.items_in_rect(cr) {
            if item == Some(other) {
                continue;
            }
            let Some(kind) = filter(item, other) else {
                continue;
            };
            let Some(other_rect) = self.rects.get(other) else {
                continue;
            };
            if let Some(contact) = Narrowphase::detect_collision(rect, *other_rect, goal) {
                collisions.push(Collision::from_contact(contact, item.cloned(), other.clone(), kind));
            }
        }

        sort_by_ti_and_distance(&mut collisions);
        Ok(collisions)
    }

    #[instrument(level = "debug", skip(self, filter))]
    fn check(
        &self,
        id: &I,
        goal_x: f64,
        goal_y: f64,
        filter: Option<&Filter<'_, I>>,
    ) -> Result<Movement<I>> {
        let filter: &Filter<'_, I> = match filter {
            Some(f) => f,
            None => &default_filter::<I>,
        };
        let rect = self.get_rect(id)?;
        let mut goal = DVec2::new(goal_x, goal_y);
        let mut visited: HashSet<I> = HashSet::from([id.clone()]);
        let mut resolved = Vec::new();

        let mut projected = {
            let visited_filter = |item: Option<&I>, other: &I| {
                if visited.contains(other) { None } else { filter(item, other) }
            };
            self.project(Some(id), rect, goal.x, goal.y, Some(&visited_filter))?
        };

        // Each pass resolves one not-yet-visited item, so the loop ends after
        // at most `count_items()` passes.
        while let Some(mut col) = projected.into_iter().next() {
            visited.insert(col.other.clone());
            let response = self.response(col.kind)?;

            let visited_filter = |item: Option<&I>, other: &I| {
                if visited.contains(other) { None } else { filter(item, other) }
            };
            let next = response.respond(self, &mut col, rect, goal, &visited_filter)?;
            trace!(other = ?col.other, kind = col.kind.name(), ti = col.ti, goal = ?next.position(), "resolved");

            goal = next.position();
            projected = next.collisions;
            projected.retain(|c| !visited.contains(&c.other));
            resolved.push(col);
        }

        Ok(Movement { x: goal.x, y: goal.y, collisions: resolved })
    }

    #[instrument(level = "debug", skip(self, filter))]
    fn move_item(
        &mut self,
        id: &I,
        goal_x: f64,
        goal_y: f64,
        filter: Option<&Filter<'_, I>>,
    ) -> Result<Movement<I>> {
        let movement = self.check(id, goal_x, goal_y, filter)?;
        self.update(id, movement.x, movement.y, None, None)?;
        Ok(movement)
    }

    fn query_rect(
        &self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        filter: Option<&ItemFilter<'_, I>>,
    ) -> Result<Vec<I>> {
        let query = Rect::try_new(x, y, w, h)?;
        let cr = self.cell_rect(query)?;
        Ok(self
            .cells
            .items_in_rect(cr)
            .into_iter()
            .filter(|id| filter.is_none_or(|f| f(*id)))
            .filter(|id| self.rects.get(*id).is_some_and(|r| Narrowphase::is_intersecting(query, *r)))
            .cloned()
            .collect())
    }

    fn query_point(&self, x: f64, y: f64, filter: Option<&ItemFilter<'_, I>>) -> Vec<I> {
        let p = DVec2::new(x, y);
        let Some(items) = self.cells.items_in(self.to_cell(x, y)) else {
            return Vec::new();
        };
        let candidates: BTreeSet<&I> = items.iter().collect();
        candidates
            .into_iter()
            .filter(|id| filter.is_none_or(|f| f(*id)))
            .filter(|id| self.rects.get(*id).is_some_and(|r| Narrowphase::contains_point(*r, p)))
            .cloned()
            .collect()
    }

    fn query_segment(
        &self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        filter: Option<&ItemFilter<'_, I>>,
    ) -> Vec<I> {
        self.segment_hits(DVec2::new(x1, y1), DVec2::new(x2, y2), filter)
            .into_iter()
            .map(|hit| hit.item)
            .collect()
    }

    fn query_segment_with_coords(
        &self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        filter: Option<&ItemFilter<'_, I>>,
    ) -> Vec<SegmentHit<I>> {
        self.segment_hits(DVec2::new(x1, y1), DVec2::new(x2, y2), filter)
    }

    fn get_rect(&self, id: &I) -> Result<Rect> {
        self.rects.get(id).copied().ok_or_else(|| CollisionError::unknown(id))
    }

    fn has_item(&self, id: &I) -> bool {
        self.rects.contains_key(id)
    }

    fn items(&self) -> Vec<(I, Rect)> {
        let mut out: Vec<(I, Rect)> = self.rects.iter().map(|(id, r)| (id.clone(), *r)).collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    fn count_items(&self) -> usize {
        self.rects.len()
    }

    fn count_cells(&self) -> usize {
        self.cells.len()
    }

    fn to_cell(&self, x: f64, y: f64) -> Cell {
        grid::to_cell(self.cfg.cell_size, x, y)
    }

    fn to_world(&self, cx: i32, cy: i32) -> DVec2 {
        grid::to_world(self.cfg.cell_size, cx, cy)
    }
}

impl<I: ItemKey> World<I> {
    /// Convenience: a world with the given cell size.
    pub fn with_cell_size(cell_size: f64) -> Result<Self> {
        <Self as WorldApi<I>>::new(WorldConfig { cell_size })
    }

    pub fn cell_size(&self) -> f64 {
        self.cfg.cell_size
    }

    /// Register (or replace) the policy selected by `ResponseKind::Custom(name)`.
    /// Registering a built-in name replaces the built-in.
    pub fn add_response(&mut self, name: &'static str, response: impl Response<I> + 'static) {
        self.responses.insert(name, Box::new(response));
    }

    /// Policy registered for `kind`.
    pub fn response(&self, kind: ResponseKind) -> Result<&dyn Response<I>> {
        self.responses
            .get(kind.name())
            .map(|r| r.as_ref())
            .ok_or_else(|| CollisionError::UnknownResponse(kind.name().to_owned()))
    }

    /// Cells currently holding `id`.
    pub fn cells_of(&self, id: &I) -> Vec<Cell> {
        self.cells.cells_of(id)
    }

    /// Index summary for diagnostics.
    pub fn debug_stats(&self) -> WorldStats {
        WorldStats {
            items: self.rects.len(),
            cells: self.cells.len(),
            memberships: self.cells.memberships(),
        }
    }

    fn cell_rect(&self, rect: Rect) -> Result<CellRect> {
        grid::to_cell_rect(self.cfg.cell_size, rect)
    }

    /// Items struck by `p1 -> p2`, ordered by where the infinite line enters them.
    fn segment_hits(&self, p1: DVec2, p2: DVec2, filter: Option<&ItemFilter<'_, I>>) -> Vec<SegmentHit<I>> {
        let mut candidates: BTreeSet<&I> = BTreeSet::new();
        grid::traverse(self.cfg.cell_size, p1, p2, |cell| {
            if let Some(items) = self.cells.items_in(cell) {
                candidates.extend(items.iter());
            }
        });

        let d = p2 - p1;
        let mut weighted = Vec::new();
        for id in candidates {
            if !filter.is_none_or(|f| f(id)) {
                continue;
            }
            let Some(rect) = self.rects.get(id) else {
                continue;
            };
            let Some(seg) = Narrowphase::segment_intersection(*rect, p1, p2, 0.0, 1.0) else {
                continue;
            };
            let crosses = (0.0 < seg.ti1 && seg.ti1 < 1.0) || (0.0 < seg.ti2 && seg.ti2 < 1.0);
            if !crosses {
                continue;
            }
            // Order by the infinite line, not the clipped segment.
            let weight = Narrowphase::segment_intersection(*rect, p1, p2, f64::NEG_INFINITY, f64::INFINITY)
                .map_or(seg.ti1, |line| line.ti1.min(line.ti2));
            weighted.push((
                weight,
                SegmentHit {
                    item: id.clone(),
                    ti1: seg.ti1,
                    ti2: seg.ti2,
                    p1: p1 + d * seg.ti1,
                    p2: p1 + d * seg.ti2,
                },
            ));
        }

        weighted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        weighted.into_iter().map(|(_, hit)| hit).collect()
    }
}

/// Nearest first: ascending `ti`, then ascending squared center distance.
/// Stable, so remaining ties keep candidate (id) order.
fn sort_by_ti_and_distance<I>(collisions: &mut [Collision<I>]) {
    collisions.sort_by(|a, b| {
        a.ti.partial_cmp(&b.ti).unwrap_or(Ordering::Equal).then_with(|| {
            let da = Narrowphase::square_distance(a.item_rect, a.other_rect);
            let db = Narrowphase::square_distance(b.item_rect, b.other_rect);
            da.partial_cmp(&db).unwrap_or(Ordering::Equal)
        })
    });
}
