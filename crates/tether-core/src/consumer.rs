use std::fmt;
use std::rc::Rc;

use crate::callback::Callback;
use crate::error::Result;
use crate::scope::{Reactive, ScopeRef};

/// Anything that re-reads scope state on notification, e.g. a widget rebuild
/// trigger. Notifications carry no change details.
pub trait ObservableConsumer {
    fn rebuild(&self);
}

/// Keeps a consumer subscribed to a scope until detached or dropped.
///
/// The attachment holds the consumer weakly: once the consumer is gone, the
/// observer does nothing.
pub struct Attachment {
    scope: ScopeRef,
    observer: Option<Callback>,
}

pub fn attach<C>(owner: &impl Reactive, consumer: &Rc<C>) -> Result<Attachment>
where
    C: ObservableConsumer + 'static,
{
    let scope = owner.state_scope();
    let weak = Rc::downgrade(consumer);
    let observer = Callback::new(move || {
        if let Some(consumer) = weak.upgrade() {
            consumer.rebuild();
        }
    });
    scope.add_observer(observer.clone())?;
    Ok(Attachment {
        scope: scope.downgrade(),
        observer: Some(observer),
    })
}

impl Attachment {
    pub fn detach(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(observer) = self.observer.take()
            && let Some(scope) = self.scope.upgrade()
        {
            scope.remove_observer(&observer);
        }
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("attached", &self.observer.is_some())
            .finish()
    }
}
