use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::{Equivalent, IndexMap};

use crate::error::Result;
use crate::scope::{ScopeRef, StateScope, finish_write};

/// An insertion-ordered map bound to a [`StateScope`].
///
/// `insert` always notifies. `remove` notifies only when the key was present
/// and `clear` only when the map was non-empty.
pub struct MapCell<K, V> {
    entries: Rc<RefCell<IndexMap<K, V>>>,
    scope: ScopeRef,
}

impl<K, V> Clone for MapCell<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
            scope: self.scope.clone(),
        }
    }
}

impl<K: Hash + Eq, V> MapCell<K, V> {
    pub(crate) fn new(scope: &StateScope, entries: IndexMap<K, V>) -> Self {
        Self {
            entries: Rc::new(RefCell::new(entries)),
            scope: scope.downgrade(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
        V: Clone,
    {
        self.entries.borrow().get(key).cloned()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.entries.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.entries.borrow().keys().cloned().collect()
    }

    pub fn with<R>(&self, f: impl FnOnce(&IndexMap<K, V>) -> R) -> R {
        f(&self.entries.borrow())
    }

    /// Inserts or overwrites `key`, returning the previous value.
    pub fn insert(&self, key: K, value: V) -> Result<Option<V>> {
        let scope = self.scope.begin_write("MapCell::insert")?;
        let old = self.entries.borrow_mut().insert(key, value);
        finish_write(scope)?;
        Ok(old)
    }

    pub fn extend(&self, entries: impl IntoIterator<Item = (K, V)>) -> Result<()> {
        for (key, value) in entries {
            self.insert(key, value)?;
        }
        Ok(())
    }

    /// Removes `key`, keeping the order of the remaining entries. `Ok(None)`
    /// means the key was absent and nothing was notified.
    pub fn remove<Q>(&self, key: &Q) -> Result<Option<V>>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let scope = self.scope.begin_write("MapCell::remove")?;
        let removed = self.entries.borrow_mut().shift_remove(key);
        if removed.is_some() {
            finish_write(scope)?;
        }
        Ok(removed)
    }

    pub fn clear(&self) -> Result<()> {
        let scope = self.scope.begin_write("MapCell::clear")?;
        let was_empty = {
            let mut entries = self.entries.borrow_mut();
            let was_empty = entries.is_empty();
            entries.clear();
            was_empty
        };
        if was_empty {
            return Ok(());
        }
        finish_write(scope)
    }

    /// Applies an arbitrary edit and notifies once.
    pub fn update<R>(&self, f: impl FnOnce(&mut IndexMap<K, V>) -> R) -> Result<R> {
        let scope = self.scope.begin_write("MapCell::update")?;
        let out = f(&mut self.entries.borrow_mut());
        finish_write(scope)?;
        Ok(out)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MapCell<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.borrow().iter()).finish()
    }
}

impl StateScope {
    pub fn create_map<K: Hash + Eq, V>(
        &self,
        initial: impl IntoIterator<Item = (K, V)>,
    ) -> MapCell<K, V> {
        MapCell::new(self, initial.into_iter().collect())
    }
}
