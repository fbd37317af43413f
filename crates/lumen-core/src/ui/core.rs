//! Core UI traits and types shared by elements, the renderer and the view manager

use crate::geometry::Point;
use crate::ui::element::{ElementBase, ElementId};
use crate::view::ViewKey;

/// Represents a 2D touch point on the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
}

impl TouchPoint {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    pub fn to_point(&self) -> Point {
        Point::new(self.x as f32, self.y as f32)
    }
}

/// Touch events delivered by the input driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    /// Initial touch press at a point
    Press(TouchPoint),
    /// Touch drag to a new point
    Drag(TouchPoint),
    /// Finger lifted at a point
    Release(TouchPoint),
}

impl TouchEvent {
    pub fn point(&self) -> TouchPoint {
        match self {
            TouchEvent::Press(p) | TouchEvent::Drag(p) | TouchEvent::Release(p) => *p,
        }
    }
}

/// Actions that clickable elements can hand back to the view manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Navigate to the view registered under this key
    Navigate(ViewKey),
    /// Go back to the previous view
    GoBack,
    /// Move focus forward
    FocusNext,
    /// Move focus backward
    FocusPrevious,
    /// Custom action with ID
    Custom(u16),
}

/// Placement of an element inside the slot its parent gives it.
///
/// The same enum is used for both axes: `Start` is left or top, `End` is
/// right or bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Fill the slot after margins
    #[default]
    Stretch,
    /// Align to start (left for horizontal, top for vertical)
    Start,
    /// Center within the slot
    Center,
    /// Align to end (right for horizontal, bottom for vertical)
    End,
}

/// Stacking direction for panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Left to right
    Horizontal,
    /// Top to bottom
    #[default]
    Vertical,
}

/// Outcome of a hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTestResult {
    /// Innermost element under the point
    pub element: ElementId,
    /// The point as it was tested, in view coordinates
    pub point: Point,
    /// The point relative to the hit element's top left corner
    pub local_point: Point,
}

/// Capability of elements that can take keyboard-style focus.
pub trait Focusable {
    /// Ordering key used by the focus manager. Ties are resolved by moving
    /// later elements to the next free index.
    fn tab_index(&self) -> i32 {
        0
    }

    fn is_focused(&self) -> bool;

    fn focus(&mut self, base: &ElementBase);

    fn unfocus(&mut self, base: &ElementBase);
}

/// Capability of elements that react to being tapped.
pub trait Clickable {
    /// Activate the element. The returned action, if any, is carried out by
    /// the view manager after dispatch completes.
    fn click(&mut self, base: &ElementBase, hit: &HitTestResult) -> Option<Action>;
}
