use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = CollisionError> = core::result::Result<T, E>;

/// Precondition violations reported by the world and its helpers.
///
/// Every error is fatal to the call in progress; the world is left exactly as it
/// was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollisionError {
    /// Non-finite coordinates, or a width/height that is not strictly positive.
    #[error("invalid rect: x={x} y={y} w={w} h={h}")]
    InvalidRect { x: f64, y: f64, w: f64, h: f64 },
    /// Grid cell size must be finite and strictly positive.
    #[error("cell size must be a positive number, got {0}")]
    InvalidCellSize(f64),
    /// `add` was called twice with the same identifier.
    #[error("item {0} added to the world twice")]
    DuplicateItem(String),
    /// The identifier was never added (or was already removed).
    #[error("item {0} is not in the world")]
    UnknownItem(String),
    /// A filter selected a response policy that is not registered.
    #[error("unknown collision response: {0}")]
    UnknownResponse(String),
}

impl CollisionError {
    pub(crate) fn duplicate<I: core::fmt::Debug>(id: &I) -> Self {
        Self::DuplicateItem(format!("{id:?}"))
    }

    pub(crate) fn unknown<I: core::fmt::Debug>(id: &I) -> Self {
        Self::UnknownItem(format!("{id:?}"))
    }
}
