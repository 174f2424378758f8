//! Collision response policies.
//!
//! A response receives the collision being resolved, the mover's rect at the
//! start of the movement and the current goal. It returns the next goal plus the
//! collisions found on the way there, which `World::check` keeps resolving.

use glam::DVec2;

use crate::api::{Filter, WorldApi};
use crate::error::Result;
use crate::types::*;
use crate::world::{ItemKey, World};

/// Strategy deciding where a mover goes after a collision.
pub trait Response<I> {
    /// `filter` already excludes every item resolved so far; pass it on to any
    /// further `project` call.
    fn respond(
        &self,
        world: &World<I>,
        col: &mut Collision<I>,
        rect: Rect,
        goal: DVec2,
        filter: &Filter<'_, I>,
    ) -> Result<Movement<I>>;
}

/// Stop at the contact point.
#[derive(Copy, Clone, Debug, Default)]
pub struct Touch;

/// Ignore the obstacle and keep going.
#[derive(Copy, Clone, Debug, Default)]
pub struct Cross;

/// Continue along the contact side.
#[derive(Copy, Clone, Debug, Default)]
pub struct Slide;

/// Mirror the remaining motion off the contact side.
#[derive(Copy, Clone, Debug, Default)]
pub struct Bounce;

impl<I: ItemKey> Response<I> for Touch {
    fn respond(
        &self,
        _world: &World<I>,
        col: &mut Collision<I>,
        _rect: Rect,
        _goal: DVec2,
        _filter: &Filter<'_, I>,
    ) -> Result<Movement<I>> {
        Ok(Movement { x: col.touch.x, y: col.touch.y, collisions: Vec::new() })
    }
}

impl<I: ItemKey> Response<I> for Cross {
    fn respond(
        &self,
        world: &World<I>,
        col: &mut Collision<I>,
        rect: Rect,
        goal: DVec2,
        filter: &Filter<'_, I>,
    ) -> Result<Movement<I>> {
        let collisions = world.project(col.item.as_ref(), rect, goal.x, goal.y, Some(filter))?;
        Ok(Movement { x: goal.x, y: goal.y, collisions })
    }
}

impl<I: ItemKey> Response<I> for Slide {
    fn respond(
        &self,
        world: &World<I>,
        col: &mut Collision<I>,
        rect: Rect,
        goal: DVec2,
        filter: &Filter<'_, I>,
    ) -> Result<Movement<I>> {
        let mut goal = goal;
        if col.movement != DVec2::ZERO {
            if col.normal.x != 0.0 {
                goal.x = col.touch.x;
            } else {
                goal.y = col.touch.y;
            }
        }
        col.slide = Some(goal);

        let from = rect.at(col.touch);
        let collisions = world.project(col.item.as_ref(), from, goal.x, goal.y, Some(filter))?;
        Ok(Movement { x: goal.x, y: goal.y, collisions })
    }
}

impl<I: ItemKey> Response<I> for Bounce {
    fn respond(
        &self,
        world: &World<I>,
        col: &mut Collision<I>,
        rect: Rect,
        goal: DVec2,
        filter: &Filter<'_, I>,
    ) -> Result<Movement<I>> {
        let touch = col.touch;
        let mut target = touch;
        if col.movement != DVec2::ZERO {
            let mut rest = goal - touch;
            if col.normal.x == 0.0 {
                rest.y = -rest.y;
            } else {
                rest.x = -rest.x;
            }
            target = touch + rest;
        }
        col.bounce = Some(target);

        let from = rect.at(touch);
        let collisions = world.project(col.item.as_ref(), from, target.x, target.y, Some(filter))?;
        Ok(Movement { x: target.x, y: target.y, collisions })
    }
}
