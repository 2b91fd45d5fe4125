//! Demo: spielt einen kurzen Signaling-Austausch durch die Bridge
//!
//! Die native Seite wird durch die In-Process Event-Queue ersetzt; der
//! Main-Thread übernimmt die Rolle des UI-Threads.

use anyhow::Context;
use event_bridge_lib::config::BridgeConfig;
use event_bridge_lib::dispatch::EventListener;
use event_bridge_lib::signaling::{Event, EventKind};
use event_bridge_lib::{init_tracing, EventBridge};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Listener, der alles loggt
#[derive(Default)]
struct LoggingListener {
    received: AtomicUsize,
}

impl EventListener for LoggingListener {
    fn on_event_received(&self, event: Event) {
        self.received.fetch_add(1, Ordering::SeqCst);
        match serde_json::to_string(&event) {
            Ok(json) => tracing::info!("Event received: {}", json),
            Err(e) => tracing::warn!("Event received but not serializable: {}", e),
        }
    }

    fn on_error_occurred(&self, message: String) {
        tracing::warn!("Bridge error: {}", message);
    }

    fn on_status_update(&self, status: String) {
        tracing::info!("Bridge status: {}", status);
    }
}

fn script() -> Vec<Event> {
    vec![
        Event::new(EventKind::GatheringStateChange, "InProgress"),
        Event::new(EventKind::LocalDescription, "v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\ns=-"),
        Event::new(EventKind::LocalCandidate, "candidate:1 1 UDP 2122252543 192.168.1.2 50000 typ host"),
        Event::new(EventKind::GatheringStateChange, "Complete"),
        Event::new(EventKind::StateChange, "Connected"),
    ]
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = BridgeConfig::from_env().context("Failed to load bridge configuration")?;
    let listener = Arc::new(LoggingListener::default());
    let (bridge, mut delivery) = EventBridge::with_listener(config, listener.clone());

    let events = script();
    let expected = events.len();
    for event in &events {
        bridge.dispatcher().push_event(event);
    }

    let handle = bridge
        .dispatcher()
        .start_listening()
        .context("Failed to start poll worker")?;

    bridge.dispatcher().notify_status_update("relaying scripted exchange");
    let done = delivery.run_until(|| listener.received.load(Ordering::SeqCst) >= expected);

    handle.join();
    delivery.run_pending();

    anyhow::ensure!(done, "delivery loop closed before all events arrived");
    tracing::info!("Relayed {} events", expected);
    Ok(())
}
