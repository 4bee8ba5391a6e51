use std::fmt::Display;
use std::future::Future;

use futures::future::{AbortHandle, LocalBoxFuture, abortable};
use futures::stream::LocalBoxStream;
use futures::task::{LocalSpawn, LocalSpawnExt};
use futures::{FutureExt, Stream, StreamExt, TryFutureExt, TryStreamExt};

use tether_core::{
    EventSink, FutureSource, ReadCell, Result, SettleSink, SourceError, SourceEvent, StateScope,
    StreamSource, Subscription,
};

/// A stream that is polled on `Sp` once subscribed.
pub struct SpawnedStream<Sp, T> {
    spawner: Sp,
    stream: LocalBoxStream<'static, std::result::Result<T, SourceError>>,
}

impl<Sp: LocalSpawn, T: 'static> SpawnedStream<Sp, T> {
    pub fn new(spawner: Sp, stream: impl Stream<Item = T> + 'static) -> Self {
        Self {
            spawner,
            stream: stream.map(Ok).boxed_local(),
        }
    }

    /// Item errors are forwarded to the binding's error callback; the stream
    /// keeps being polled afterwards.
    pub fn try_new<E: Display + 'static>(
        spawner: Sp,
        stream: impl Stream<Item = std::result::Result<T, E>> + 'static,
    ) -> Self {
        Self {
            spawner,
            stream: stream.map_err(SourceError::new).boxed_local(),
        }
    }
}

impl<Sp: LocalSpawn, T: 'static> StreamSource<T> for SpawnedStream<Sp, T> {
    fn subscribe(
        self,
        mut sink: EventSink<T>,
    ) -> std::result::Result<Box<dyn Subscription>, SourceError> {
        let mut stream = self.stream;
        let (task, handle) = abortable(async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(value) => sink(SourceEvent::Value(value)),
                    Err(err) => sink(SourceEvent::Error(err)),
                }
            }
            sink(SourceEvent::Done);
        });
        self.spawner
            .spawn_local(task.map(drop))
            .map_err(SourceError::spawn)?;
        Ok(Box::new(TaskSubscription(handle)))
    }
}

/// A future that is polled on `Sp` once subscribed.
pub struct SpawnedFuture<Sp, T> {
    spawner: Sp,
    future: LocalBoxFuture<'static, std::result::Result<T, SourceError>>,
}

impl<Sp: LocalSpawn, T: 'static> SpawnedFuture<Sp, T> {
    pub fn new(spawner: Sp, future: impl Future<Output = T> + 'static) -> Self {
        Self {
            spawner,
            future: future.map(Ok).boxed_local(),
        }
    }

    pub fn try_new<E: Display + 'static>(
        spawner: Sp,
        future: impl Future<Output = std::result::Result<T, E>> + 'static,
    ) -> Self {
        Self {
            spawner,
            future: future.map_err(SourceError::new).boxed_local(),
        }
    }
}

impl<Sp: LocalSpawn, T: 'static> FutureSource<T> for SpawnedFuture<Sp, T> {
    fn then(
        self,
        on_settled: SettleSink<T>,
    ) -> std::result::Result<Box<dyn Subscription>, SourceError> {
        let future = self.future;
        let (task, handle) = abortable(async move { on_settled(future.await) });
        self.spawner
            .spawn_local(task.map(drop))
            .map_err(SourceError::spawn)?;
        Ok(Box::new(TaskSubscription(handle)))
    }
}

struct TaskSubscription(AbortHandle);

impl Subscription for TaskSubscription {
    fn cancel(self: Box<Self>) {
        log::trace!("aborting bound source task");
        self.0.abort();
    }
}

/// Binding shortcuts that wrap `futures` values for a spawner.
pub trait SpawnBindExt {
    fn bind_stream_on<Sp, T>(
        &self,
        spawner: Sp,
        stream: impl Stream<Item = T> + 'static,
        initial: T,
    ) -> Result<ReadCell<T>>
    where
        Sp: LocalSpawn,
        T: 'static;

    fn bind_future_on<Sp, T>(
        &self,
        spawner: Sp,
        future: impl Future<Output = T> + 'static,
        initial: T,
    ) -> Result<ReadCell<T>>
    where
        Sp: LocalSpawn,
        T: 'static;
}

impl SpawnBindExt for StateScope {
    fn bind_stream_on<Sp, T>(
        &self,
        spawner: Sp,
        stream: impl Stream<Item = T> + 'static,
        initial: T,
    ) -> Result<ReadCell<T>>
    where
        Sp: LocalSpawn,
        T: 'static,
    {
        self.bind_stream(SpawnedStream::new(spawner, stream), initial)
    }

    fn bind_future_on<Sp, T>(
        &self,
        spawner: Sp,
        future: impl Future<Output = T> + 'static,
        initial: T,
    ) -> Result<ReadCell<T>>
    where
        Sp: LocalSpawn,
        T: 'static,
    {
        self.bind_future(SpawnedFuture::new(spawner, future), initial)
    }
}
