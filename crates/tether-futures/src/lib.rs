//! # Executor-backed sources
//!
//! Adapts `futures` streams and futures to `tether_core`'s `StreamSource` and
//! `FutureSource` by spawning them on a local executor. Each binding runs as
//! one abortable task; disposing the owning scope aborts it, which drops the
//! underlying stream or future the next time the executor polls it.
//!
//! ```rust
//! use futures::executor::LocalPool;
//! use futures::stream;
//! use tether_core::StateScope;
//! use tether_futures::SpawnBindExt;
//!
//! let mut pool = LocalPool::new();
//! let scope = StateScope::new();
//! let cell = scope
//!     .bind_stream_on(pool.spawner(), stream::iter([10, 20, 30]), 0)
//!     .unwrap();
//!
//! assert_eq!(cell.get(), 0);
//! pool.run_until_stalled();
//! assert_eq!(cell.get(), 30);
//! ```

pub mod spawned;
pub mod tests;

pub use spawned::{SpawnBindExt, SpawnedFuture, SpawnedStream};
