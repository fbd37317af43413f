//! Reactive properties and the observable objects that own them
//!
//! Property changes are the only way layout learns that something moved:
//! elements link their geometry properties to their own invalidation flags,
//! and containers link child-owned attached properties to the parent.

mod object;
mod property;
mod subject;

pub use object::ObservableObject;
pub use property::{PropertyChange, PropertyChanged, ReactiveProperty};
pub use subject::{Subject, Subscription};
