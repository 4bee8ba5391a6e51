//! Binding factories: each one owns a cell, feeds it from an external source
//! and registers the source's teardown on the scope.

use std::rc::Rc;

use crate::callback::{Callback, Dispose};
use crate::cell::ReadCell;
use crate::error::{Result, SourceError};
use crate::scope::StateScope;
use crate::source::{FutureSource, Listenable, PushSource, SourceEvent, StreamSource};

impl StateScope {
    /// Seeds a cell with the source's current value and writes every later
    /// change into it. The listener is removed on dispose.
    ///
    /// A change that arrives while the scope is notifying is written once
    /// that notification has finished.
    pub fn bind_notifier<T, S>(&self, source: S) -> Result<ReadCell<T>>
    where
        T: 'static,
        S: PushSource<T> + Clone + 'static,
    {
        self.ensure_live("bind_notifier")?;
        let cell = self.create_value(source.value());

        let listener = Callback::new({
            let source = source.clone();
            let cell = cell.clone();
            move || cell.set_when_idle(source.value(), "push-source")
        });
        source.add_listener(listener.clone());
        self.add_disposer(Dispose::new(move || source.remove_listener(&listener)))?;

        Ok(cell.read_only())
    }

    /// Like [`StateScope::bind_stream_with_errors`], logging source errors.
    pub fn bind_stream<T, S>(&self, source: S, initial: T) -> Result<ReadCell<T>>
    where
        T: 'static,
        S: StreamSource<T>,
    {
        let on_error = source_error_logger("stream", self.label().map(Rc::from));
        self.bind_stream_with_errors(source, initial, on_error)
    }

    /// Writes every value the stream emits into a cell seeded with `initial`.
    ///
    /// Stream errors go to `on_error`; the cell keeps its last value and the
    /// subscription stays open. The subscription is cancelled on dispose.
    pub fn bind_stream_with_errors<T, S>(
        &self,
        source: S,
        initial: T,
        mut on_error: impl FnMut(SourceError) + 'static,
    ) -> Result<ReadCell<T>>
    where
        T: 'static,
        S: StreamSource<T>,
    {
        self.ensure_live("bind_stream")?;
        let cell = self.create_value(initial);

        let sink = Box::new({
            let cell = cell.clone();
            move |event: SourceEvent<T>| match event {
                SourceEvent::Value(value) => cell.set_when_idle(value, "stream"),
                SourceEvent::Error(err) => on_error(err),
                SourceEvent::Done => log::trace!("bound stream finished"),
            }
        });
        let subscription = source.subscribe(sink)?;
        self.add_disposer(Dispose::new(move || subscription.cancel()))?;

        Ok(cell.read_only())
    }

    /// Like [`StateScope::bind_future_with_errors`], logging a rejection.
    pub fn bind_future<T, F>(&self, source: F, initial: T) -> Result<ReadCell<T>>
    where
        T: 'static,
        F: FutureSource<T>,
    {
        let on_error = source_error_logger("future", self.label().map(Rc::from));
        self.bind_future_with_errors(source, initial, on_error)
    }

    /// Writes the future's value into a cell seeded with `initial` once it
    /// resolves. A rejection goes to `on_error` and leaves `initial` in place.
    pub fn bind_future_with_errors<T, F>(
        &self,
        source: F,
        initial: T,
        on_error: impl FnOnce(SourceError) + 'static,
    ) -> Result<ReadCell<T>>
    where
        T: 'static,
        F: FutureSource<T>,
    {
        self.ensure_live("bind_future")?;
        let cell = self.create_value(initial);

        let on_settled = Box::new({
            let cell = cell.clone();
            move |settled: std::result::Result<T, SourceError>| match settled {
                Ok(value) => cell.set_when_idle(value, "future"),
                Err(err) => on_error(err),
            }
        });
        let subscription = source.then(on_settled)?;
        self.add_disposer(Dispose::new(move || subscription.cancel()))?;

        Ok(cell.read_only())
    }

    /// Subscribes this scope's `update` to an externally owned listenable.
    ///
    /// On dispose the listener is removed and, if the listenable is itself
    /// disposable, it is disposed too. Returns `observable` for chaining.
    pub fn register<L>(&self, observable: L) -> Result<L>
    where
        L: Listenable + Clone + 'static,
    {
        self.ensure_live("register")?;
        let scope = self.downgrade();
        let listener = Callback::new(move || {
            if let Some(live) = scope.upgrade() {
                let scope = scope.clone();
                live.when_idle(move || {
                    if let Some(scope) = scope.upgrade()
                        && let Err(err) = scope.update()
                    {
                        log::warn!("registered listenable could not update scope: {err}");
                    }
                });
            }
        });
        observable.add_listener(listener.clone());

        let handle = observable.clone();
        self.add_disposer(Dispose::new(move || {
            handle.remove_listener(&listener);
            if let Some(disposable) = handle.as_disposable() {
                disposable.dispose();
            }
        }))?;

        Ok(observable)
    }
}

fn source_error_logger(kind: &'static str, label: Option<Rc<str>>) -> impl FnMut(SourceError) {
    move |err| {
        log::warn!(
            "{kind} bound to scope `{}` failed: {err}",
            label.as_deref().unwrap_or("<unnamed>")
        )
    }
}
