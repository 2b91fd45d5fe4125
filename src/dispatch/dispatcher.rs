//! Event Dispatcher - Poll-Loop und Zustellung
//!
//! Ein dedizierter Worker-Thread holt fortlaufend Events von der nativen
//! Bridge ab und reicht sie über den Delivery-Executor an den Listener
//! weiter:
//! - Jeder Poll-Zyklus erzeugt genau eine Zustellung (Event oder Fehler)
//! - Der Listener wird nie direkt vom Worker aufgerufen
//! - Die Loop ist über das [`ListeningHandle`] stoppbar

use super::executor::DeliveryExecutor;
use super::listener::{EventListener, ListenerSlot};
use crate::config::BridgeConfig;
use crate::signaling::{Event, NativeBridge, RawEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

/// Fehlermeldung wenn ein Poll-Zyklus keine Daten geliefert hat
pub const NO_EVENT_DATA: &str = "No event data available";

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Dispatcher is already listening")]
    AlreadyListening,

    #[error("Failed to spawn poll worker: {0}")]
    WorkerSpawn(String),
}

// ============================================================================
// DISPATCH CONTEXT
// ============================================================================

/// Zustellungs-Kontext: Executor plus Listener-Platz
///
/// Ersetzt einen prozessweiten Callback; jeder Dispatcher hat seinen eigenen.
#[derive(Clone)]
pub struct DispatchContext {
    executor: Arc<dyn DeliveryExecutor>,
    listener: ListenerSlot,
}

impl DispatchContext {
    pub fn new(executor: Arc<dyn DeliveryExecutor>) -> Self {
        Self {
            executor,
            listener: ListenerSlot::new(),
        }
    }

    /// Kontext mit bereits registriertem Listener
    pub fn with_listener(self, listener: Arc<dyn EventListener>) -> Self {
        self.listener.set(Some(listener));
        self
    }

    /// Plant genau einen Listener-Aufruf auf dem Executor ein
    ///
    /// Ohne Listener passiert nichts. Der Listener wird erst bei der
    /// Ausführung gelesen, ein zwischenzeitlich ersetzter Listener bekommt
    /// also die Zustellung.
    fn deliver<F>(&self, call: F)
    where
        F: FnOnce(&dyn EventListener) + Send + 'static,
    {
        if !self.listener.is_set() {
            return;
        }

        let slot = self.listener.clone();
        self.executor.post(Box::new(move || match slot.get() {
            Some(listener) => call(listener.as_ref()),
            None => tracing::debug!("Listener removed before delivery, dropping notification"),
        }));
    }
}

impl std::fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchContext")
            .field("listener", &self.listener)
            .finish()
    }
}

// ============================================================================
// DISPATCHER
// ============================================================================

struct Shared {
    bridge: Arc<dyn NativeBridge>,
    context: DispatchContext,
    running: AtomicBool,
}

impl Shared {
    /// Verarbeitet das Ergebnis eines Polls; `true` wenn ein Event zugestellt wurde
    fn relay(&self, polled: Option<RawEvent>) -> bool {
        match polled.map(RawEvent::decode) {
            Some(Ok(event)) => {
                tracing::debug!(
                    "Relaying {} event ({} bytes)",
                    event.kind(),
                    event.payload().len()
                );
                self.notify_event_received(event);
                true
            }
            Some(Err(e)) => {
                tracing::warn!("Undecodable native event: {}", e);
                self.notify_error_occurred(e.to_string());
                false
            }
            None => {
                self.notify_error_occurred(NO_EVENT_DATA.to_string());
                false
            }
        }
    }

    fn notify_event_received(&self, event: Event) {
        self.context
            .deliver(move |listener| listener.on_event_received(event));
    }

    fn notify_error_occurred(&self, message: String) {
        self.context
            .deliver(move |listener| listener.on_error_occurred(message));
    }

    fn notify_status_update(&self, status: String) {
        self.context
            .deliver(move |listener| listener.on_status_update(status));
    }
}

/// Relay zwischen nativer Bridge und Anwendungs-Listener
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
    config: BridgeConfig,
}

impl Dispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn new(
        bridge: Arc<dyn NativeBridge>,
        context: DispatchContext,
        config: BridgeConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                bridge,
                context,
                running: AtomicBool::new(false),
            }),
            config,
        }
    }

    /// Registriert den Listener (ersetzt einen vorhandenen)
    pub fn register_listener(&self, listener: Arc<dyn EventListener>) {
        self.shared.context.listener.set(Some(listener));
    }

    /// Entfernt den Listener; folgende Zustellungen werden verworfen
    pub fn clear_listener(&self) {
        self.shared.context.listener.set(None);
    }

    pub fn has_listener(&self) -> bool {
        self.shared.context.listener.is_set()
    }

    /// Prüft ob ein Poll-Worker läuft
    pub fn is_listening(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Startet den Poll-Worker
    ///
    /// Es läuft immer höchstens ein Worker pro Dispatcher. Nach
    /// [`ListeningHandle::join`] kann erneut gestartet werden.
    pub fn start_listening(&self) -> Result<ListeningHandle, DispatchError> {
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DispatchError::AlreadyListening);
        }

        // Stop-Wake einer früheren Sitzung, den kein Poll mehr abgeholt hat
        self.shared.bridge.clear_wake();

        let stop = Arc::new(AtomicBool::new(false));
        let shared = Arc::clone(&self.shared);
        let stop_flag = Arc::clone(&stop);
        let idle_backoff = self.config.idle_backoff;

        let spawned = thread::Builder::new()
            .name(self.config.worker_name.clone())
            .spawn(move || poll_loop(shared, stop_flag, idle_backoff));

        match spawned {
            Ok(worker) => {
                tracing::info!("Poll worker '{}' started", self.config.worker_name);
                Ok(ListeningHandle {
                    stop,
                    bridge: Arc::clone(&self.shared.bridge),
                    worker: Some(worker),
                })
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                Err(DispatchError::WorkerSpawn(e.to_string()))
            }
        }
    }

    /// Führt genau einen Poll-Zyklus auf dem aktuellen Thread aus
    ///
    /// Für Hosts, die ihre eigene Loop treiben. Gibt `true` zurück, wenn
    /// ein Event (und kein Fehler) zugestellt wurde.
    pub fn poll_once(&self) -> bool {
        let polled = self.shared.bridge.poll_event();
        self.shared.relay(polled)
    }

    /// Reicht ein ausgehendes Event an die native Seite weiter (fire-and-forget)
    pub fn push_event(&self, event: &Event) {
        tracing::debug!("Pushing {} event to native side", event.kind());
        self.shared
            .bridge
            .push_event(event.kind().ordinal(), event.payload());
    }

    pub fn notify_event_received(&self, event: Event) {
        self.shared.notify_event_received(event);
    }

    pub fn notify_error_occurred(&self, message: impl Into<String>) {
        self.shared.notify_error_occurred(message.into());
    }

    /// Statusmeldung an den Listener (derzeit ohne nativen Produzenten)
    pub fn notify_status_update(&self, status: impl Into<String>) {
        self.shared.notify_status_update(status.into());
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("worker_name", &self.config.worker_name)
            .field("is_listening", &self.is_listening())
            .field("context", &self.shared.context)
            .finish()
    }
}

/// Setzt das Running-Flag auch bei einem Panic in der Bridge zurück
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn poll_loop(shared: Arc<Shared>, stop: Arc<AtomicBool>, idle_backoff: Option<Duration>) {
    let _running = RunningGuard(&shared.running);

    while !stop.load(Ordering::Acquire) {
        let polled = shared.bridge.poll_event();

        // Ein Wake beim Stoppen ist kein "keine Daten"-Zyklus
        if polled.is_none() && stop.load(Ordering::Acquire) {
            break;
        }

        if !shared.relay(polled) {
            if let Some(backoff) = idle_backoff {
                thread::sleep(backoff);
            }
        }
    }

    tracing::info!("Poll worker stopped");
}

// ============================================================================
// LISTENING HANDLE
// ============================================================================

/// Handle auf einen laufenden Poll-Worker
///
/// Droppen stoppt den Worker, wartet aber nicht auf ihn.
pub struct ListeningHandle {
    stop: Arc<AtomicBool>,
    bridge: Arc<dyn NativeBridge>,
    worker: Option<JoinHandle<()>>,
}

impl ListeningHandle {
    /// Signalisiert dem Worker, nach dem aktuellen Zyklus aufzuhören
    pub fn stop(&self) {
        if !self.stop.swap(true, Ordering::AcqRel) {
            tracing::info!("Stopping poll worker");
            self.bridge.wake();
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stoppt den Worker und wartet auf sein Ende
    pub fn join(mut self) {
        self.stop();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Poll worker panicked");
            }
        }
    }
}

impl Drop for ListeningHandle {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.stop();
        }
    }
}

impl std::fmt::Debug for ListeningHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListeningHandle")
            .field("is_running", &self.is_running())
            .field("stop_requested", &self.stop.load(Ordering::Acquire))
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
