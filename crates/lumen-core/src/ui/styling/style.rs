//! Named property setters that can be applied to an element and reverted
//!
//! A [`Style`] is a list of `(property name, value)` pairs. Applying it to an
//! element's property bag remembers the values it overwrote; the returned
//! [`AppliedStyle`] puts them back. There is no cascade: a style only touches
//! properties the element already has.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::binding::ObservableObject;
use crate::error::PropertyResult;

type Restore = Box<dyn FnOnce()>;

trait Setter {
    fn apply(&self, object: &ObservableObject) -> PropertyResult<Option<Restore>>;
}

struct ValueSetter<T> {
    name: &'static str,
    value: T,
}

impl<T: Clone + 'static> Setter for ValueSetter<T> {
    fn apply(&self, object: &ObservableObject) -> PropertyResult<Option<Restore>> {
        let Some(property) = object.get_property::<T>(self.name)? else {
            return Ok(None);
        };
        let previous = property.get();
        property.set(self.value.clone());
        Ok(Some(Box::new(move || property.set(previous))))
    }
}

/// Reusable set of property values.
///
/// # Examples
/// ```ignore
/// let focus = Style::new()
///     .with("background", Brush::rounded(COLOR_ACCENT, 3, true))
///     .with("foreground", BLACK);
/// let applied = focus.apply(base.object())?;
/// // ...
/// applied.revert();
/// ```
#[derive(Clone, Default)]
pub struct Style {
    setters: Vec<Rc<dyn Setter>>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a setter for the property called `name`.
    pub fn with<T: Clone + 'static>(mut self, name: &'static str, value: T) -> Self {
        self.setters.push(Rc::new(ValueSetter { name, value }));
        self
    }

    pub fn len(&self) -> usize {
        self.setters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.setters.is_empty()
    }

    /// Apply every setter to `object`. Names the object does not have are
    /// skipped; a name bound to a different value type is an error, in which
    /// case setters already applied are reverted.
    pub fn apply(&self, object: &ObservableObject) -> PropertyResult<AppliedStyle> {
        let mut applied = AppliedStyle {
            restore: Vec::with_capacity(self.setters.len()),
        };
        for setter in &self.setters {
            match setter.apply(object) {
                Ok(Some(restore)) => applied.restore.push(restore),
                Ok(None) => {}
                Err(e) => {
                    applied.revert();
                    return Err(e);
                }
            }
        }
        Ok(applied)
    }
}

impl core::fmt::Debug for Style {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Style")
            .field("setters", &self.setters.len())
            .finish()
    }
}

/// Values overwritten by [`Style::apply`].
#[must_use = "dropping an applied style keeps its values; call `revert` to restore"]
pub struct AppliedStyle {
    restore: Vec<Restore>,
}

impl AppliedStyle {
    /// Restore the overwritten values, last applied first.
    pub fn revert(self) {
        for restore in self.restore.into_iter().rev() {
            restore();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PropertyError;

    #[test]
    fn apply_then_revert_restores_previous_values() {
        let object = ObservableObject::new();
        let size = object.property("size", 10u32).unwrap();
        let label = object.property("label", "idle").unwrap();

        let style = Style::new().with("size", 20u32).with("label", "busy");
        let applied = style.apply(&object).unwrap();
        assert_eq!((size.get(), label.get()), (20, "busy"));

        applied.revert();
        assert_eq!((size.get(), label.get()), (10, "idle"));
    }

    #[test]
    fn unknown_names_are_skipped() {
        let object = ObservableObject::new();
        let applied = Style::new().with("missing", 1u8).apply(&object).unwrap();
        assert!(!object.contains("missing"));
        applied.revert();
    }

    #[test]
    fn type_mismatch_rolls_back() {
        let object = ObservableObject::new();
        let size = object.property("size", 10u32).unwrap();
        object.property("label", "idle").unwrap();

        let result = Style::new()
            .with("size", 20u32)
            .with("label", 5i32)
            .apply(&object);

        assert!(matches!(result, Err(PropertyError::TypeMismatch { name: "label" })));
        assert_eq!(size.get(), 10);
    }
}
