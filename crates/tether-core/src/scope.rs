use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::callback::{Callback, Dispose};
use crate::error::{Result, ScopeError};

type Panic = Box<dyn Any + Send + 'static>;

/// What a disposed scope does when one of its cells is written or `notify()`
/// is called on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AfterDispose {
    /// Fail with [`ScopeError::UseAfterDispose`].
    #[default]
    Error,
    /// Apply the write to the cell and skip the notification.
    Ignore,
}

/// Construction options for a [`StateScope`].
#[derive(Clone, Debug, Default)]
pub struct ScopeConfig {
    pub label: Option<String>,
    pub after_dispose: AfterDispose,
}

impl ScopeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn after_dispose(mut self, policy: AfterDispose) -> Self {
        self.after_dispose = policy;
        self
    }
}

/// Override points for scope owners. Both hooks default to doing nothing.
pub trait ScopeHooks: 'static {
    /// Runs once per notification, before any observer.
    fn before_update(&self) {}
    /// Runs once, at the start of a successful `dispose()`.
    fn before_dispose(&self) {}
}

struct NoHooks;

impl ScopeHooks for NoHooks {}

/// A disposable container of observers and teardown actions.
///
/// Cloning a `StateScope` yields another handle to the same scope. Cells hold
/// only a weak reference back to it.
#[derive(Clone)]
pub struct StateScope {
    pub(crate) inner: Rc<ScopeInner>,
}

pub(crate) struct ScopeInner {
    label: Option<Rc<str>>,
    after_dispose: AfterDispose,
    hooks: Box<dyn ScopeHooks>,
    observers: RefCell<SmallVec<[Callback; 4]>>,
    disposers: RefCell<Vec<Dispose>>,
    deferred: RefCell<VecDeque<Box<dyn FnOnce()>>>,
    disposed: Cell<bool>,
    notifying: Cell<bool>,
}

impl ScopeInner {
    fn label(&self) -> Option<String> {
        self.label.as_deref().map(str::to_owned)
    }

    fn name(&self) -> &str {
        self.label.as_deref().unwrap_or("<unnamed>")
    }
}

impl Default for StateScope {
    fn default() -> Self {
        Self::new()
    }
}

impl StateScope {
    pub fn new() -> Self {
        Self::with_config(ScopeConfig::default())
    }

    pub fn with_config(config: ScopeConfig) -> Self {
        Self::with_hooks(config, NoHooks)
    }

    pub fn with_hooks(config: ScopeConfig, hooks: impl ScopeHooks) -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                label: config.label.map(Rc::from),
                after_dispose: config.after_dispose,
                hooks: Box::new(hooks),
                observers: RefCell::new(SmallVec::new()),
                disposers: RefCell::new(Vec::new()),
                deferred: RefCell::new(VecDeque::new()),
                disposed: Cell::new(false),
                notifying: Cell::new(false),
            }),
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.inner.label.as_deref()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Registers an observer. The same callback may be registered more than once.
    pub fn add_observer(&self, observer: Callback) -> Result<()> {
        self.ensure_live("add_observer")?;
        self.inner.observers.borrow_mut().push(observer);
        Ok(())
    }

    /// Removes the first registration of `observer`; unknown callbacks are ignored.
    pub fn remove_observer(&self, observer: &Callback) {
        let mut observers = self.inner.observers.borrow_mut();
        if let Some(pos) = observers.iter().position(|o| o == observer) {
            observers.remove(pos);
        }
    }

    pub fn has_observers(&self) -> bool {
        !self.inner.observers.borrow().is_empty()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// Runs the `before_update` hook, then every observer in registration
    /// order. Observers added meanwhile wait for the next notification, and
    /// the round stops as soon as the scope is disposed.
    ///
    /// A panicking observer does not stop the rest; the first panic is
    /// resumed once all of them have run. Binding writes queued during the
    /// round are applied after it.
    pub fn notify(&self) -> Result<()> {
        let inner = &self.inner;
        if inner.disposed.get() {
            return self.after_dispose("notify");
        }
        if inner.notifying.replace(true) {
            return Err(ScopeError::ReentrantNotify {
                label: inner.label(),
            });
        }
        let reset = ResetOnDrop(&inner.notifying);
        inner.hooks.before_update();

        // Snapshot: observers may add or remove observers while running.
        let observers = inner.observers.borrow().clone();
        let panicked = run_isolated(
            inner.name(),
            "observer",
            observers
                .iter()
                .take_while(|_| !inner.disposed.get())
                .map(|o| move || o.call()),
        );
        drop(reset);
        self.run_deferred();

        if let Some(payload) = panicked {
            panic::resume_unwind(payload);
        }
        Ok(())
    }

    /// Runs `f` now, or once the notification in progress has finished.
    ///
    /// Bindings use this for source values that arrive while observers are
    /// running, so the value is written late instead of being rejected.
    pub(crate) fn when_idle(&self, f: impl FnOnce() + 'static) {
        if self.inner.notifying.get() && !self.inner.disposed.get() {
            self.inner.deferred.borrow_mut().push_back(Box::new(f));
        } else {
            f();
        }
    }

    fn run_deferred(&self) {
        loop {
            let next = self.inner.deferred.borrow_mut().pop_front();
            let Some(f) = next else { break };
            f();
        }
    }

    /// Entry point used by cells and bindings after a mutation.
    pub fn update(&self) -> Result<()> {
        self.notify()
    }

    /// Appends a teardown action, run once when the scope is disposed.
    pub fn add_dispose_action(&self, action: impl FnOnce() + 'static) -> Result<()> {
        self.add_disposer(Dispose::new(action))
    }

    pub fn add_disposer(&self, disposer: Dispose) -> Result<()> {
        self.ensure_live("add_dispose_action")?;
        self.inner.disposers.borrow_mut().push(disposer);
        Ok(())
    }

    pub fn dispose_action_count(&self) -> usize {
        self.inner.disposers.borrow().len()
    }

    /// Runs `before_dispose`, then every teardown action in registration
    /// order, then drops all observers.
    ///
    /// The scope counts as disposed as soon as the hook returns, so cell writes
    /// made by teardown actions do not reach observers. Every action runs even
    /// if an earlier one panics; the first panic is resumed afterwards.
    pub fn dispose(&self) -> Result<()> {
        let inner = &self.inner;
        if inner.disposed.get() {
            return Err(ScopeError::DisposedTwice {
                label: inner.label(),
            });
        }
        inner.hooks.before_dispose();
        inner.disposed.set(true);
        let dropped = std::mem::take(&mut *inner.deferred.borrow_mut());
        if !dropped.is_empty() {
            log::debug!(
                "scope `{}` disposed with {} deferred writes pending; dropping them",
                inner.name(),
                dropped.len()
            );
        }
        drop(dropped);

        let disposers = std::mem::take(&mut *inner.disposers.borrow_mut());
        log::debug!(
            "disposing scope `{}` ({} actions)",
            inner.name(),
            disposers.len()
        );
        let panicked = run_isolated(
            inner.name(),
            "dispose action",
            disposers.iter().map(|d| move || d.run()),
        );
        inner.observers.borrow_mut().clear();

        if let Some(payload) = panicked {
            panic::resume_unwind(payload);
        }
        Ok(())
    }

    pub(crate) fn downgrade(&self) -> ScopeRef {
        ScopeRef {
            inner: Rc::downgrade(&self.inner),
            after_dispose: self.inner.after_dispose,
            label: self.inner.label.clone(),
        }
    }

    /// Registrations always fail on a disposed scope, whatever the
    /// [`AfterDispose`] policy: nothing would ever tear them down.
    pub(crate) fn ensure_live(&self, op: &'static str) -> Result<()> {
        if self.inner.disposed.get() {
            return Err(ScopeError::UseAfterDispose {
                op,
                label: self.inner.label(),
            });
        }
        Ok(())
    }

    fn after_dispose(&self, op: &'static str) -> Result<()> {
        match self.inner.after_dispose {
            AfterDispose::Error => Err(ScopeError::UseAfterDispose {
                op,
                label: self.inner.label(),
            }),
            AfterDispose::Ignore => {
                log::trace!("ignoring `{op}` on disposed scope `{}`", self.inner.name());
                Ok(())
            }
        }
    }
}

impl fmt::Debug for StateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateScope")
            .field("label", &self.label())
            .field("disposed", &self.is_disposed())
            .field("observers", &self.observer_count())
            .field("dispose_actions", &self.dispose_action_count())
            .finish()
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        if self.disposed.get() {
            return;
        }
        let disposers = std::mem::take(self.disposers.get_mut());
        if disposers.is_empty() {
            return;
        }
        log::warn!(
            "scope `{}` dropped without dispose(); running {} pending actions",
            self.name(),
            disposers.len()
        );
        // Never resume a panic from drop.
        if run_isolated(
            self.name(),
            "dispose action",
            disposers.iter().map(|d| move || d.run()),
        )
        .is_some()
        {
            log::error!(
                "scope `{}`: discarding dispose-action panic raised while dropping",
                self.name()
            );
        }
    }
}

/// Weak back-reference from a cell or binding to its owning scope.
#[derive(Clone)]
pub(crate) struct ScopeRef {
    inner: Weak<ScopeInner>,
    after_dispose: AfterDispose,
    label: Option<Rc<str>>,
}

impl ScopeRef {
    pub(crate) fn upgrade(&self) -> Option<StateScope> {
        self.inner.upgrade().map(|inner| StateScope { inner })
    }

    /// Resolves the scope a cell write must notify. `Ok(None)` means the
    /// write goes ahead silently under [`AfterDispose::Ignore`].
    pub(crate) fn begin_write(&self, op: &'static str) -> Result<Option<StateScope>> {
        match self.upgrade() {
            Some(scope) if !scope.is_disposed() => {
                if scope.inner.notifying.get() {
                    return Err(ScopeError::ReentrantNotify {
                        label: scope.inner.label(),
                    });
                }
                Ok(Some(scope))
            }
            _ => match self.after_dispose {
                AfterDispose::Error => Err(ScopeError::UseAfterDispose {
                    op,
                    label: self.label.as_deref().map(str::to_owned),
                }),
                AfterDispose::Ignore => Ok(None),
            },
        }
    }
}

pub(crate) fn finish_write(scope: Option<StateScope>) -> Result<()> {
    match scope {
        Some(scope) => scope.update(),
        None => Ok(()),
    }
}

struct ResetOnDrop<'a>(&'a Cell<bool>);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

fn run_isolated<F: FnOnce()>(
    scope: &str,
    what: &str,
    calls: impl IntoIterator<Item = F>,
) -> Option<Panic> {
    let mut first = None;
    for call in calls {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(call)) {
            log::error!("{what} panicked in scope `{scope}`");
            first.get_or_insert(payload);
        }
    }
    first
}

/// The scope capability for owners that hold a [`StateScope`] by composition,
/// such as view-models.
pub trait Reactive {
    fn state_scope(&self) -> &StateScope;

    fn add_observer(&self, observer: Callback) -> Result<()> {
        self.state_scope().add_observer(observer)
    }

    fn remove_observer(&self, observer: &Callback) {
        self.state_scope().remove_observer(observer)
    }

    fn has_observers(&self) -> bool {
        self.state_scope().has_observers()
    }

    fn notify(&self) -> Result<()> {
        self.state_scope().notify()
    }

    fn update(&self) -> Result<()> {
        self.state_scope().update()
    }

    fn add_dispose_action(&self, action: impl FnOnce() + 'static) -> Result<()>
    where
        Self: Sized,
    {
        self.state_scope().add_dispose_action(action)
    }

    fn dispose(&self) -> Result<()> {
        self.state_scope().dispose()
    }

    fn is_disposed(&self) -> bool {
        self.state_scope().is_disposed()
    }
}

impl Reactive for StateScope {
    fn state_scope(&self) -> &StateScope {
        self
    }
}
