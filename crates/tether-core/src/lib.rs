//! # Scopes, Cells, and Bindings
//!
//! Tether is a small observable-state layer for view-models. There are three
//! main pieces:
//!
//! - `StateScope`: a disposable container of observers and teardown actions.
//! - Cells (`ValueCell`, `ListCell`, `MapCell`): state bound to a scope;
//!   every mutation notifies it.
//! - Bindings: feed a cell from a push notifier, a stream, or a future and
//!   tear the subscription down when the scope is disposed.
//!
//! ## Cells
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use tether_core::*;
//!
//! let scope = StateScope::new();
//! let renders = Rc::new(Cell::new(0));
//! scope
//!     .add_observer(Callback::new({
//!         let renders = renders.clone();
//!         move || renders.set(renders.get() + 1)
//!     }))
//!     .unwrap();
//!
//! let count = scope.create_value(0);
//! count.set(1).unwrap();
//! count.update(|v| *v += 1).unwrap();
//! assert_eq!(count.get(), 2);
//! assert_eq!(renders.get(), 2);
//! ```
//!
//! Writes never compare old and new values: setting the same value twice
//! notifies twice. Observers receive no arguments and are expected to re-read
//! whatever they care about.
//!
//! ## Bindings and disposal
//!
//! ```rust
//! use tether_core::*;
//!
//! let scope = StateScope::new();
//! let source = Notifier::new(String::from("draft"));
//! let title = scope.bind_notifier(source.clone()).unwrap();
//!
//! source.set("published".into());
//! assert_eq!(title.get(), "published");
//!
//! scope.dispose().unwrap();
//! assert!(!source.has_listeners());
//! assert!(matches!(scope.dispose(), Err(ScopeError::DisposedTwice { .. })));
//! ```
//!
//! - Disposal runs every teardown action once, in registration order, then
//!   drops all observers. It never notifies.
//! - After disposal, cell writes fail with `ScopeError::UseAfterDispose`
//!   unless the scope was built with `AfterDispose::Ignore`.
//!
//! ## View-models
//!
//! Owners hold a scope by composition and implement `Reactive` to expose the
//! observer/dispose surface:
//!
//! ```rust
//! use tether_core::*;
//!
//! struct Counter {
//!     scope: StateScope,
//!     count: ValueCell<u32>,
//! }
//!
//! impl Reactive for Counter {
//!     fn state_scope(&self) -> &StateScope {
//!         &self.scope
//!     }
//! }
//!
//! let scope = StateScope::with_config(ScopeConfig::new().label("counter"));
//! let count = scope.create_value(0);
//! let vm = Counter { scope, count };
//! vm.count.update(|c| *c += 1).unwrap();
//! vm.dispose().unwrap();
//! ```
//!
//! Streams and futures driven by an executor are bridged by the
//! `tether-futures` crate.

pub mod bind;
pub mod callback;
pub mod cell;
pub mod consumer;
pub mod error;
pub mod list;
pub mod map;
pub mod prelude;
pub mod scope;
pub mod source;

pub use prelude::*;
