//! Event Listener - Callback-Schnittstelle der Anwendung
//!
//! Die Anwendung implementiert [`EventListener`] und registriert ihn am
//! Dispatcher. Es gibt höchstens einen aktiven Listener pro Dispatcher.

use crate::signaling::Event;
use parking_lot::RwLock;
use std::sync::Arc;

// ============================================================================
// EVENT LISTENER
// ============================================================================

/// Reaktion der Anwendung auf Events, Fehler und Statusmeldungen
///
/// Alle Methoden laufen auf dem Delivery-Kontext. Sie dürfen nicht
/// unbegrenzt blockieren, sonst stauen sich alle folgenden Zustellungen.
pub trait EventListener: Send + Sync {
    /// Ein dekodiertes Event ist angekommen
    fn on_event_received(&self, event: Event);

    /// Lesbare Fehlerbeschreibung (z.B. "No event data available")
    fn on_error_occurred(&self, message: String);

    /// Freier Status-Text
    fn on_status_update(&self, status: String);
}

// ============================================================================
// LISTENER SLOT
// ============================================================================

/// Einzelner, austauschbarer Listener-Platz
///
/// Wird selten geschrieben (Registrierung) und bei jeder Zustellung gelesen.
#[derive(Clone, Default)]
pub struct ListenerSlot {
    inner: Arc<RwLock<Option<Arc<dyn EventListener>>>>,
}

impl ListenerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Setzt oder entfernt den Listener (last writer wins)
    pub fn set(&self, listener: Option<Arc<dyn EventListener>>) {
        *self.inner.write() = listener;
    }

    /// Gibt den aktuell registrierten Listener zurück
    pub fn get(&self) -> Option<Arc<dyn EventListener>> {
        self.inner.read().clone()
    }

    pub fn is_set(&self) -> bool {
        self.inner.read().is_some()
    }
}

impl std::fmt::Debug for ListenerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSlot")
            .field("is_set", &self.is_set())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl EventListener for Noop {
        fn on_event_received(&self, _event: Event) {}
        fn on_error_occurred(&self, _message: String) {}
        fn on_status_update(&self, _status: String) {}
    }

    fn same(a: &Arc<dyn EventListener>, b: &Arc<dyn EventListener>) -> bool {
        Arc::as_ptr(a) as *const u8 == Arc::as_ptr(b) as *const u8
    }

    #[test]
    fn test_slot_starts_empty() {
        let slot = ListenerSlot::new();
        assert!(!slot.is_set());
        assert!(slot.get().is_none());
    }

    #[test]
    fn test_last_writer_wins() {
        let slot = ListenerSlot::new();
        let a: Arc<dyn EventListener> = Arc::new(Noop);
        let b: Arc<dyn EventListener> = Arc::new(Noop);
        slot.set(Some(Arc::clone(&a)));
        slot.set(Some(Arc::clone(&b)));

        let current = slot.get().unwrap();
        assert!(same(&current, &b));
        assert!(!same(&current, &a));

        slot.set(None);
        assert!(!slot.is_set());
    }

    #[test]
    fn test_clones_share_the_slot() {
        let slot = ListenerSlot::new();
        let shared = slot.clone();
        shared.set(Some(Arc::new(Noop)));

        assert!(slot.is_set());
    }
}
