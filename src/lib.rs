//! Native Event Bridge
//!
//! Reicht Events einer nativen Signaling-Schicht an die Anwendung weiter:
//! - Poll-Worker holt SDP-, ICE- und Status-Events von der nativen Seite
//! - Zustellung in Reihenfolge auf einen Single-Threaded Delivery-Kontext
//! - Ausgehende Events werden fire-and-forget an die native Seite gereicht

pub mod config;
pub mod dispatch;
pub mod signaling;

use config::BridgeConfig;
use dispatch::{DispatchContext, Dispatcher, EventListener, ExecutorLoop, SerialExecutor};
use once_cell::sync::OnceCell;
use signaling::EventQueue;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ============================================================================
// LOGGING
// ============================================================================

static TRACING: OnceCell<()> = OnceCell::new();

/// Initialisiert das Logging (mehrfacher Aufruf ist harmlos)
///
/// `RUST_LOG` hat Vorrang vor den Default-Direktiven.
pub fn init_tracing() {
    TRACING.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("event_bridge_lib=debug,event_bridge=info"));

        if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already installed");
        }
    });
}

// ============================================================================
// EVENT BRIDGE
// ============================================================================

/// Fertig verdrahtete Bridge: In-Process Queue, Dispatcher und Executor
pub struct EventBridge {
    queue: Arc<EventQueue>,
    dispatcher: Dispatcher,
}

impl EventBridge {
    /// Baut Queue, Executor und Dispatcher aus der Konfiguration
    ///
    /// Die zurückgegebene [`ExecutorLoop`] muss auf dem Thread laufen, auf dem
    /// der Listener aufgerufen werden soll.
    pub fn init(config: BridgeConfig) -> (Self, ExecutorLoop) {
        let queue = Arc::new(EventQueue::with_poll_timeout(config.poll_timeout));
        let (executor, delivery) = SerialExecutor::new();
        let context = DispatchContext::new(Arc::new(executor));
        let dispatcher = Dispatcher::new(queue.clone(), context, config);

        tracing::info!("Event bridge initialized: {:?}", dispatcher);

        (Self { queue, dispatcher }, delivery)
    }

    /// Wie [`EventBridge::init`], mit bereits registriertem Listener
    pub fn with_listener(
        config: BridgeConfig,
        listener: Arc<dyn EventListener>,
    ) -> (Self, ExecutorLoop) {
        let (bridge, delivery) = Self::init(config);
        bridge.dispatcher.register_listener(listener);
        (bridge, delivery)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Die native Event-Queue (Quelle der eingehenden Events)
    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }
}

impl std::fmt::Debug for EventBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBridge")
            .field("queued", &self.queue.len())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
