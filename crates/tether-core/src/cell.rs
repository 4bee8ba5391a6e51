use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{Result, ScopeError};
use crate::scope::{ScopeRef, StateScope, finish_write};

/// A single value bound to a [`StateScope`].
///
/// Reads never notify. Every write notifies the scope exactly once, even when
/// the new value equals the old one.
pub struct ValueCell<T> {
    value: Rc<RefCell<T>>,
    scope: ScopeRef,
}

impl<T> Clone for ValueCell<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            scope: self.scope.clone(),
        }
    }
}

impl<T> ValueCell<T> {
    pub(crate) fn new(scope: &StateScope, value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
            scope: scope.downgrade(),
        }
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    pub fn set(&self, value: T) -> Result<()> {
        self.replace(value).map(drop)
    }

    /// Writes `value` and returns the previous one.
    pub fn replace(&self, value: T) -> Result<T> {
        let scope = self.scope.begin_write("ValueCell::set")?;
        let old = self.value.replace(value);
        finish_write(scope)?;
        Ok(old)
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let scope = self.scope.begin_write("ValueCell::update")?;
        let out = f(&mut self.value.borrow_mut());
        finish_write(scope)?;
        Ok(out)
    }

    /// Writes `value`, postponing the write until the scope's current
    /// notification has finished if one is running.
    pub(crate) fn set_when_idle(&self, value: T, kind: &'static str)
    where
        T: 'static,
    {
        match self.scope.upgrade() {
            Some(scope) => {
                let cell = self.clone();
                scope.when_idle(move || report_write(kind, cell.set(value)));
            }
            None => report_write(kind, self.set(value)),
        }
    }

    pub fn read_only(&self) -> ReadCell<T> {
        ReadCell {
            value: Rc::clone(&self.value),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ValueCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueCell").field(&*self.value.borrow()).finish()
    }
}

/// Read-only view of a cell written by a source binding.
pub struct ReadCell<T> {
    value: Rc<RefCell<T>>,
}

impl<T> Clone for ReadCell<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
        }
    }
}

impl<T> ReadCell<T> {
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadCell").field(&*self.value.borrow()).finish()
    }
}

impl StateScope {
    pub fn create_value<T>(&self, initial: T) -> ValueCell<T> {
        ValueCell::new(self, initial)
    }
}

fn report_write(kind: &str, result: Result<()>) {
    match result {
        Ok(()) => {}
        Err(err @ ScopeError::UseAfterDispose { .. }) => {
            log::debug!("dropping {kind} value: {err}")
        }
        Err(err) => log::warn!("{kind} value was not written: {err}"),
    }
}
