//! Dispatch Module - Poll-Loop und Zustellung an die Anwendung
//!
//! Dieses Modul verbindet die native Bridge mit der Anwendung:
//! - Poll-Worker, der Events von der nativen Seite abholt
//! - Serialisierte Zustellung über einen Delivery-Executor
//! - Austauschbarer Listener pro Dispatcher
//!

mod dispatcher;
mod executor;
mod listener;

pub use dispatcher::{DispatchContext, DispatchError, Dispatcher, ListeningHandle, NO_EVENT_DATA};
pub use executor::{DeliveryExecutor, DeliveryTask, ExecutorLoop, SerialExecutor};
pub use listener::{EventListener, ListenerSlot};
