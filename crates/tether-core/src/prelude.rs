pub use crate::callback::{Callback, Dispose};
pub use crate::cell::{ReadCell, ValueCell};
pub use crate::consumer::{Attachment, ObservableConsumer, attach};
pub use crate::error::{Result, ScopeError, SourceError};
pub use crate::list::ListCell;
pub use crate::map::MapCell;
pub use crate::scope::{AfterDispose, Reactive, ScopeConfig, ScopeHooks, StateScope};
pub use crate::source::{
    Disposable, EventSink, Finished, FutureSource, Iter, Listenable, Notifier, PushSource, Ready,
    SettleSink, SourceEvent, StreamSource, Subscription,
};
