//! bumpbox: axis-aligned box collision detection and resolution over a uniform grid.
//!
//! Items are rects in a [`World`]. Moving one with [`WorldApi::move_item`] sweeps it
//! toward a goal, resolves every collision on the way with a [`Response`] policy
//! (touch, cross, slide, bounce or a registered custom one), and commits the result.

pub mod api;
pub mod cells;
pub mod error;
pub mod grid;
pub mod narrowphase;
pub mod response;
pub mod types;
pub mod world;

pub use crate::api::*;
pub use crate::error::{CollisionError, Result};
pub use crate::narrowphase::Narrowphase;
pub use crate::response::{Bounce, Cross, Response, Slide, Touch};
pub use crate::types::*;
pub use crate::world::{ItemKey, World};
