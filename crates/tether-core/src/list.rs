use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{Result, ScopeError};
use crate::scope::{ScopeRef, StateScope, finish_write};

/// An ordered list bound to a [`StateScope`].
///
/// Each operation that changes the list notifies once. Operations that leave
/// it unchanged (popping or clearing an empty list, growing via `set_len`)
/// stay silent. `extend` notifies once per pushed element; use `update` to
/// batch several edits behind a single notification.
pub struct ListCell<T> {
    items: Rc<RefCell<Vec<T>>>,
    scope: ScopeRef,
}

impl<T> Clone for ListCell<T> {
    fn clone(&self) -> Self {
        Self {
            items: Rc::clone(&self.items),
            scope: self.scope.clone(),
        }
    }
}

impl<T> ListCell<T> {
    pub(crate) fn new(scope: &StateScope, items: Vec<T>) -> Self {
        Self {
            items: Rc::new(RefCell::new(items)),
            scope: scope.downgrade(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.items.borrow().get(index).cloned()
    }

    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.items.borrow())
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.borrow().clone()
    }

    /// Overwrites the element at `index`, returning the old one.
    pub fn set(&self, index: usize, value: T) -> Result<T> {
        let scope = self.scope.begin_write("ListCell::set")?;
        let old = {
            let mut items = self.items.borrow_mut();
            let len = items.len();
            let slot = items
                .get_mut(index)
                .ok_or(ScopeError::IndexOutOfBounds { index, len })?;
            std::mem::replace(slot, value)
        };
        finish_write(scope)?;
        Ok(old)
    }

    pub fn push(&self, value: T) -> Result<()> {
        let scope = self.scope.begin_write("ListCell::push")?;
        self.items.borrow_mut().push(value);
        finish_write(scope)
    }

    pub fn extend(&self, values: impl IntoIterator<Item = T>) -> Result<()> {
        for value in values {
            self.push(value)?;
        }
        Ok(())
    }

    pub fn insert(&self, index: usize, value: T) -> Result<()> {
        let scope = self.scope.begin_write("ListCell::insert")?;
        {
            let mut items = self.items.borrow_mut();
            let len = items.len();
            if index > len {
                return Err(ScopeError::IndexOutOfBounds { index, len });
            }
            items.insert(index, value);
        }
        finish_write(scope)
    }

    /// Removes the first element equal to `value`. Returns whether one was found.
    pub fn remove(&self, value: &T) -> Result<bool>
    where
        T: PartialEq,
    {
        let scope = self.scope.begin_write("ListCell::remove")?;
        let removed = {
            let mut items = self.items.borrow_mut();
            items
                .iter()
                .position(|item| item == value)
                .map(|pos| items.remove(pos))
        };
        match removed {
            Some(_) => finish_write(scope).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn remove_at(&self, index: usize) -> Result<T> {
        let scope = self.scope.begin_write("ListCell::remove_at")?;
        let removed = {
            let mut items = self.items.borrow_mut();
            let len = items.len();
            if index >= len {
                return Err(ScopeError::IndexOutOfBounds { index, len });
            }
            items.remove(index)
        };
        finish_write(scope)?;
        Ok(removed)
    }

    pub fn pop(&self) -> Result<Option<T>> {
        let scope = self.scope.begin_write("ListCell::pop")?;
        let popped = self.items.borrow_mut().pop();
        if popped.is_some() {
            finish_write(scope)?;
        }
        Ok(popped)
    }

    pub fn clear(&self) -> Result<()> {
        let scope = self.scope.begin_write("ListCell::clear")?;
        let was_empty = {
            let mut items = self.items.borrow_mut();
            let was_empty = items.is_empty();
            items.clear();
            was_empty
        };
        if was_empty {
            return Ok(());
        }
        finish_write(scope)
    }

    /// Shrinking notifies once. Growing pads with `T::default()` silently;
    /// the new slots notify when they are written with [`ListCell::set`].
    pub fn set_len(&self, len: usize) -> Result<()>
    where
        T: Default,
    {
        let scope = self.scope.begin_write("ListCell::set_len")?;
        let shrunk = {
            let mut items = self.items.borrow_mut();
            let shrunk = len < items.len();
            items.resize_with(len, T::default);
            shrunk
        };
        if shrunk {
            finish_write(scope)?;
        }
        Ok(())
    }

    /// Applies an arbitrary edit and notifies once.
    pub fn update<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> Result<R> {
        let scope = self.scope.begin_write("ListCell::update")?;
        let out = f(&mut self.items.borrow_mut());
        finish_write(scope)?;
        Ok(out)
    }
}

impl<T: fmt::Debug> fmt::Debug for ListCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.borrow().iter()).finish()
    }
}

impl StateScope {
    pub fn create_list<T>(&self, initial: impl IntoIterator<Item = T>) -> ListCell<T> {
        ListCell::new(self, initial.into_iter().collect())
    }
}
