//! External sources a [`StateScope`](crate::StateScope) can bind cells to.
//!
//! The set is closed: push sources ([`Listenable`] / [`PushSource`]), streams
//! ([`StreamSource`]) and one-shot futures ([`FutureSource`]). Runtime-backed
//! implementations live in `tether-futures`; this module ships the
//! synchronous ones.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::callback::{Callback, Dispose};
use crate::error::SourceError;

pub trait Disposable {
    fn dispose(&self);
}

/// Something observers can subscribe to with a zero-argument listener.
pub trait Listenable {
    fn add_listener(&self, listener: Callback);
    fn remove_listener(&self, listener: &Callback);

    /// Returned when the listenable also owns resources that whoever
    /// registers it should release on teardown.
    fn as_disposable(&self) -> Option<&dyn Disposable> {
        None
    }
}

/// A listenable that also exposes its current value.
pub trait PushSource<T>: Listenable {
    fn value(&self) -> T;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent<T> {
    Value(T),
    Error(SourceError),
    Done,
}

/// Handle to an active stream or future subscription.
pub trait Subscription {
    fn cancel(self: Box<Self>);
}

impl Subscription for Dispose {
    fn cancel(self: Box<Self>) {
        self.run()
    }
}

/// A subscription whose source has already finished.
#[derive(Debug, Clone, Copy, Default)]
pub struct Finished;

impl Subscription for Finished {
    fn cancel(self: Box<Self>) {}
}

pub type EventSink<T> = Box<dyn FnMut(SourceEvent<T>)>;
pub type SettleSink<T> = Box<dyn FnOnce(Result<T, SourceError>)>;

pub trait StreamSource<T> {
    fn subscribe(self, sink: EventSink<T>) -> Result<Box<dyn Subscription>, SourceError>;
}

pub trait FutureSource<T> {
    fn then(self, on_settled: SettleSink<T>) -> Result<Box<dyn Subscription>, SourceError>;
}

/// A value holder that calls its listeners on every write.
///
/// Clones share the same value and listeners.
pub struct Notifier<T> {
    inner: Rc<NotifierInner<T>>,
}

struct NotifierInner<T> {
    value: RefCell<T>,
    listeners: RefCell<SmallVec<[Callback; 2]>>,
    disposed: Cell<bool>,
}

impl<T> Clone for Notifier<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Notifier<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(NotifierInner {
                value: RefCell::new(value),
                listeners: RefCell::new(SmallVec::new()),
                disposed: Cell::new(false),
            }),
        }
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.notify_listeners();
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.notify_listeners();
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    pub fn has_listeners(&self) -> bool {
        self.listener_count() > 0
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    fn notify_listeners(&self) {
        let listeners = self.inner.listeners.borrow().clone();
        for listener in &listeners {
            listener.call();
        }
    }
}

impl<T> Listenable for Notifier<T> {
    fn add_listener(&self, listener: Callback) {
        if self.inner.disposed.get() {
            log::warn!("listener added to a disposed notifier; ignoring");
            return;
        }
        self.inner.listeners.borrow_mut().push(listener);
    }

    fn remove_listener(&self, listener: &Callback) {
        let mut listeners = self.inner.listeners.borrow_mut();
        if let Some(pos) = listeners.iter().position(|l| l == listener) {
            listeners.remove(pos);
        }
    }

    fn as_disposable(&self) -> Option<&dyn Disposable> {
        Some(self)
    }
}

impl<T> Disposable for Notifier<T> {
    fn dispose(&self) {
        self.inner.disposed.set(true);
        self.inner.listeners.borrow_mut().clear();
    }
}

impl<T: Clone> PushSource<T> for Notifier<T> {
    fn value(&self) -> T {
        self.get()
    }
}

impl<T: fmt::Debug> fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("value", &*self.inner.value.borrow())
            .field("listeners", &self.listener_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A stream that emits every item of an iterator as soon as it is subscribed.
#[derive(Debug, Clone)]
pub struct Iter<I>(I);

pub fn iter<I: IntoIterator>(items: I) -> Iter<I::IntoIter> {
    Iter(items.into_iter())
}

impl<I: Iterator> StreamSource<I::Item> for Iter<I> {
    fn subscribe(self, mut sink: EventSink<I::Item>) -> Result<Box<dyn Subscription>, SourceError> {
        for item in self.0 {
            sink(SourceEvent::Value(item));
        }
        sink(SourceEvent::Done);
        Ok(Box::new(Finished))
    }
}

/// A future that is already settled.
#[derive(Debug, Clone)]
pub struct Ready<T>(Result<T, SourceError>);

pub fn ready<T>(value: T) -> Ready<T> {
    Ready(Ok(value))
}

pub fn failed<T>(err: SourceError) -> Ready<T> {
    Ready(Err(err))
}

impl<T> FutureSource<T> for Ready<T> {
    fn then(self, on_settled: SettleSink<T>) -> Result<Box<dyn Subscription>, SourceError> {
        on_settled(self.0);
        Ok(Box::new(Finished))
    }
}
