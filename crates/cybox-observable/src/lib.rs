//! # cybox-observable
//!
//! The Observable aggregate and its document root.
//!
//! - [`Observable`] holds at most one [`Payload`]: an Object, an Event or a
//!   boolean [`ObservableComposition`] of further Observables
//! - [`Observables`] is the versioned root container
//! - [`Event`] is the minimal event payload

pub mod composition;
pub mod event;
pub mod observable;
pub mod observables;

pub use composition::{ObservableComposition, Operator};
pub use event::Event;
pub use observable::{Observable, Payload};
pub use observables::Observables;
