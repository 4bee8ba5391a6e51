#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use futures::channel::{mpsc, oneshot};
    use futures::executor::LocalPool;
    use futures::future::{self, LocalFutureObj};
    use futures::stream;
    use futures::task::{LocalSpawn, SpawnError};

    use tether_core::{Callback, ScopeError, SourceError, StateScope};

    use crate::{SpawnBindExt, SpawnedFuture, SpawnedStream};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn counter(scope: &StateScope) -> Rc<Cell<usize>> {
        let hits = Rc::new(Cell::new(0));
        let hits_clone = hits.clone();
        scope
            .add_observer(Callback::new(move || hits_clone.set(hits_clone.get() + 1)))
            .unwrap();
        hits
    }

    struct ShutDown;

    impl LocalSpawn for ShutDown {
        fn spawn_local_obj(&self, _future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
            Err(SpawnError::shutdown())
        }
    }

    #[test]
    fn test_stream_values_arrive_in_order() {
        let mut pool = LocalPool::new();
        let scope = StateScope::new();
        let hits = counter(&scope);
        let cell = scope
            .bind_stream_on(pool.spawner(), stream::iter([10, 20, 30]), 0)
            .unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        scope
            .add_observer(Callback::new({
                let seen = seen.clone();
                let cell = cell.clone();
                move || seen.borrow_mut().push(cell.get())
            }))
            .unwrap();

        assert_eq!(cell.get(), 0);
        assert_eq!(hits.get(), 0);

        pool.run_until_stalled();
        assert_eq!(cell.get(), 30);
        assert_eq!(hits.get(), 3);
        assert_eq!(*seen.borrow(), vec![10, 20, 30]);
        scope.dispose().unwrap();
    }

    #[test]
    fn test_future_resolves_after_poll() {
        let mut pool = LocalPool::new();
        let scope = StateScope::new();
        let hits = counter(&scope);
        let (tx, rx) = oneshot::channel();
        let cell = scope
            .bind_future(SpawnedFuture::try_new(pool.spawner(), rx), 0)
            .unwrap();

        pool.run_until_stalled();
        assert_eq!(cell.get(), 0);

        tx.send(42).unwrap();
        assert_eq!(cell.get(), 0);
        pool.run_until_stalled();
        assert_eq!(cell.get(), 42);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_ready_future_binding() {
        let mut pool = LocalPool::new();
        let scope = StateScope::new();
        let cell = scope
            .bind_future_on(pool.spawner(), future::ready("loaded"), "loading")
            .unwrap();
        assert_eq!(cell.get(), "loading");
        pool.run_until_stalled();
        assert_eq!(cell.get(), "loaded");
    }

    #[test]
    fn test_dispose_releases_sources() {
        init_logging();
        let mut pool = LocalPool::new();
        let scope = StateScope::new();
        let hits = counter(&scope);
        let (stream_tx, stream_rx) = mpsc::unbounded::<u32>();
        let (future_tx, future_rx) = oneshot::channel::<u32>();

        let streamed = scope
            .bind_stream_on(pool.spawner(), stream_rx, 0)
            .unwrap();
        let resolved = scope
            .bind_future(SpawnedFuture::try_new(pool.spawner(), future_rx), 0)
            .unwrap();

        stream_tx.unbounded_send(1).unwrap();
        pool.run_until_stalled();
        assert_eq!(streamed.get(), 1);

        scope.dispose().unwrap();
        pool.run_until_stalled();
        assert!(stream_tx.is_closed());
        assert!(future_tx.is_canceled());

        assert!(stream_tx.unbounded_send(2).is_err());
        pool.run_until_stalled();
        assert_eq!(streamed.get(), 1);
        assert_eq!(resolved.get(), 0);
        assert_eq!(hits.get(), 1);
        assert!(matches!(
            scope.dispose(),
            Err(ScopeError::DisposedTwice { .. })
        ));
    }

    #[test]
    fn test_stream_that_never_emits_keeps_initial() {
        let mut pool = LocalPool::new();
        let scope = StateScope::new();
        let cell = scope
            .bind_stream_on(pool.spawner(), stream::pending::<u8>(), 5)
            .unwrap();
        pool.run_until_stalled();
        scope.dispose().unwrap();
        pool.run_until_stalled();
        assert_eq!(cell.get(), 5);
    }

    #[test]
    fn test_stream_errors_are_isolated() {
        init_logging();
        let mut pool = LocalPool::new();
        let scope = StateScope::new();
        let hits = counter(&scope);
        let errors = Rc::new(RefCell::new(Vec::new()));
        let items: Vec<Result<i32, String>> = vec![Ok(1), Err("bad frame".into()), Ok(2)];

        let cell = scope
            .bind_stream_with_errors(
                SpawnedStream::try_new(pool.spawner(), stream::iter(items)),
                0,
                {
                    let errors = errors.clone();
                    move |err| errors.borrow_mut().push(err)
                },
            )
            .unwrap();
        let other = scope.create_value('a');

        pool.run_until_stalled();
        assert_eq!(cell.get(), 2);
        assert_eq!(hits.get(), 2);
        assert_eq!(
            *errors.borrow(),
            vec![SourceError::Failed("bad frame".into())]
        );

        other.set('b').unwrap();
        assert_eq!(hits.get(), 3);
        assert_eq!(scope.dispose_action_count(), 1);
    }

    #[test]
    fn test_rejected_future_keeps_initial() {
        let mut pool = LocalPool::new();
        let scope = StateScope::new();
        let error = Rc::new(RefCell::new(None));
        let (tx, rx) = oneshot::channel::<u32>();
        let cell = scope
            .bind_future_with_errors(SpawnedFuture::try_new(pool.spawner(), rx), 9, {
                let error = error.clone();
                move |err| *error.borrow_mut() = Some(err)
            })
            .unwrap();

        drop(tx);
        pool.run_until_stalled();
        assert_eq!(cell.get(), 9);
        assert!(matches!(*error.borrow(), Some(SourceError::Failed(_))));
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let scope = StateScope::new();
        let result = scope.bind_stream_on(ShutDown, stream::iter([1]), 0);
        assert!(matches!(
            result,
            Err(ScopeError::Source(SourceError::Spawn(_)))
        ));
        assert_eq!(scope.dispose_action_count(), 0);
        scope.dispose().unwrap();
    }
}
