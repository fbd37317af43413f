//! Error types shared across the toolkit
//!
//! Contract violations (bad geometry, mismatched property types, arranging a
//! node outside a view) are surfaced as typed errors and propagated with `?`.
//! Only the frame pump catches them, logs, and carries on with the next frame.

use thiserror_no_std::Error;

use crate::geometry::{Rect, Size};
use crate::ui::ElementId;

/// Failures raised by measure and arrange.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum LayoutError {
    #[error("measure of {element:?} was given an invalid constraint {available:?}")]
    InvalidConstraint { element: ElementId, available: Size },

    #[error("measure of {element:?} produced invalid size {size:?}")]
    InvalidMeasure { element: ElementId, size: Size },

    #[error("arrange of {element:?} was given invalid rect {rect:?}")]
    InvalidArrange { element: ElementId, rect: Rect },

    #[error("{0:?} is not attached to a view root")]
    Detached(ElementId),

    #[error("{0:?} does not refer to a live element")]
    UnknownElement(ElementId),

    #[error("{0:?} is already attached to a parent")]
    AlreadyParented(ElementId),

    #[error("{0:?} is an ancestor of its new parent")]
    Cycle(ElementId),

    #[error("{0:?} cannot hold children")]
    NotAContainer(ElementId),

    #[error("attached property read failed: {0}")]
    Property(#[from] PropertyError),
}

/// Failures raised by the named property bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PropertyError {
    #[error("property `{name}` is bound to a different value type")]
    TypeMismatch { name: &'static str },

    #[error("property `{name}` is already registered with another instance")]
    Duplicate { name: &'static str },
}

/// Failure reported by a drawing target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("display target rejected a draw call")]
    Target,

    #[error("pixel buffer access out of range")]
    OutOfRange,
}

/// Failures raised while switching views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("no view registered for `{0}`")]
    NotRegistered(&'static str),

    #[error("navigation stack is full")]
    StackFull,

    #[error("no view is loaded")]
    NoCurrentView,
}

/// Umbrella error returned by the view manager.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum UiError {
    #[error("layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("property failed: {0}")]
    Property(#[from] PropertyError),

    #[error("drawing failed: {0}")]
    Draw(#[from] DrawError),

    #[error("view failed: {0}")]
    View(#[from] ViewError),
}

pub type LayoutResult<T> = Result<T, LayoutError>;
pub type PropertyResult<T> = Result<T, PropertyError>;
pub type DrawResult<T> = Result<T, DrawError>;
pub type UiResult<T> = Result<T, UiError>;
