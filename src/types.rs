use glam::DVec2;

use crate::error::{CollisionError, Result};

/// Floating-point margin used by every comparison against zero.
pub const DELTA: f64 = 1e-10;

/// Axis-aligned rectangle. Origin is the top-left corner; axes grow right/down.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    /// Unchecked constructor; use [`Rect::try_new`] for caller-supplied values.
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Build a rect, rejecting non-finite coordinates and non-positive extents.
    pub fn try_new(x: f64, y: f64, w: f64, h: f64) -> Result<Self> {
        let rect = Self { x, y, w, h };
        rect.validate()?;
        Ok(rect)
    }

    /// `InvalidRect` unless `x`/`y` are finite and `w`/`h` finite and > 0.
    pub fn validate(&self) -> Result<()> {
        let coords_ok = self.x.is_finite() && self.y.is_finite();
        let extents_ok = self.w.is_finite() && self.h.is_finite() && self.w > 0.0 && self.h > 0.0;
        if coords_ok && extents_ok {
            Ok(())
        } else {
            Err(CollisionError::InvalidRect { x: self.x, y: self.y, w: self.w, h: self.h })
        }
    }

    pub fn origin(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    pub fn size(&self) -> DVec2 {
        DVec2::new(self.w, self.h)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn center(&self) -> DVec2 {
        self.origin() + self.size() * 0.5
    }

    /// Same extents, moved so the top-left corner sits at `pos`.
    pub fn at(&self, pos: DVec2) -> Self {
        Self { x: pos.x, y: pos.y, w: self.w, h: self.h }
    }
}

/// 1-based grid cell coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub cx: i32,
    pub cy: i32,
}

impl Cell {
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }
}

/// Rectangle of grid cells: `left..left+width`, `top..top+height`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellRect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl CellRect {
    /// Rightmost column (inclusive).
    pub fn right(&self) -> i32 {
        self.left + self.width - 1
    }

    /// Bottom row (inclusive).
    pub fn bottom(&self) -> i32 {
        self.top + self.height - 1
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.cx >= self.left && cell.cx <= self.right() && cell.cy >= self.top && cell.cy <= self.bottom()
    }

    /// Row-major iteration over every covered cell.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (self.top..=self.bottom())
            .flat_map(move |cy| (self.left..=self.right()).map(move |cx| Cell::new(cx, cy)))
    }
}

/// How a detected collision is resolved.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    /// Stop at the point of first contact.
    Touch,
    /// Pass through, reporting the contact.
    Cross,
    /// Keep the motion tangent to the contact side.
    Slide,
    /// Reflect the remaining motion off the contact side.
    Bounce,
    /// A policy registered with `World::add_response`.
    Custom(&'static str),
}

impl ResponseKind {
    pub fn name(&self) -> &'static str {
        match self {
            ResponseKind::Touch => "touch",
            ResponseKind::Cross => "cross",
            ResponseKind::Slide => "slide",
            ResponseKind::Bounce => "bounce",
            ResponseKind::Custom(name) => *name,
        }
    }

    /// Parse one of the four built-in names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "touch" => Some(ResponseKind::Touch),
            "cross" => Some(ResponseKind::Cross),
            "slide" => Some(ResponseKind::Slide),
            "bounce" => Some(ResponseKind::Bounce),
            _ => None,
        }
    }
}

/// Result of clipping a segment against a rectangle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SegmentIntersection {
    /// Entry fraction along the segment.
    pub ti1: f64,
    /// Exit fraction along the segment.
    pub ti2: f64,
    /// Normal of the side crossed on entry (zero if the seed bound was kept).
    pub normal1: DVec2,
    /// Normal of the side crossed on exit (zero if the seed bound was kept).
    pub normal2: DVec2,
}

/// Swept contact between a moving rect and a static one (narrowphase output).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Contact {
    /// The rects already overlapped before moving.
    pub overlaps: bool,
    /// Time of impact in `[0,1)`, or minus the overlap area when `overlaps`.
    pub ti: f64,
    /// Requested displacement.
    pub movement: DVec2,
    /// Outward normal of the side that was hit.
    pub normal: DVec2,
    /// Top-left position of the mover at first contact.
    pub touch: DVec2,
    pub item_rect: Rect,
    pub other_rect: Rect,
}

/// A contact enriched with the pair identities and the response chosen for it.
#[derive(Clone, Debug, PartialEq)]
pub struct Collision<I> {
    /// The mover; `None` when projecting a rect that is not in the world.
    pub item: Option<I>,
    pub other: I,
    pub kind: ResponseKind,
    pub overlaps: bool,
    pub ti: f64,
    pub movement: DVec2,
    pub normal: DVec2,
    pub touch: DVec2,
    pub item_rect: Rect,
    pub other_rect: Rect,
    /// Goal picked by the slide response.
    pub slide: Option<DVec2>,
    /// Goal picked by the bounce response.
    pub bounce: Option<DVec2>,
}

impl<I> Collision<I> {
    pub fn from_contact(contact: Contact, item: Option<I>, other: I, kind: ResponseKind) -> Self {
        Self {
            item,
            other,
            kind,
            overlaps: contact.overlaps,
            ti: contact.ti,
            movement: contact.movement,
            normal: contact.normal,
            touch: contact.touch,
            item_rect: contact.item_rect,
            other_rect: contact.other_rect,
            slide: None,
            bounce: None,
        }
    }
}

/// Outcome of `check`/`move_item`: resolved position and the collisions acted on.
#[derive(Clone, Debug, PartialEq)]
pub struct Movement<I> {
    pub x: f64,
    pub y: f64,
    pub collisions: Vec<Collision<I>>,
}

impl<I> Movement<I> {
    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

/// One item struck by a segment query.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentHit<I> {
    pub item: I,
    /// Entry fraction, clipped to the segment.
    pub ti1: f64,
    /// Exit fraction, clipped to the segment.
    pub ti2: f64,
    /// Entry point.
    pub p1: DVec2,
    /// Exit point.
    pub p2: DVec2,
}

/// World-level configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    /// Grid cell size in world units (typ. a few times the common item size).
    pub cell_size: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self { cell_size: 64.0 }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cell_size.is_finite() && self.cell_size > 0.0 {
            Ok(())
        } else {
            Err(CollisionError::InvalidCellSize(self.cell_size))
        }
    }
}

/// Debug statistics for the spatial index.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub items: usize,
    /// Non-empty cells.
    pub cells: usize,
    /// Sum over cells of the items they hold (an item spanning 4 cells counts 4).
    pub memberships: usize,
}
