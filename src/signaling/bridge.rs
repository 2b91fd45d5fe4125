//! Native Bridge - Grenze zur nativen Signaling-Schicht
//!
//! Die native Seite ist für diese Crate eine Blackbox mit zwei Operationen:
//! - Nächstes Event abholen (blockierend oder nicht)
//! - Ausgehendes Event einreihen (fire-and-forget)
//!
//! [`EventQueue`] ist eine In-Process-Implementierung derselben Queue, die
//! auf der nativen Seite die Callbacks der Peer Connection puffert.

use super::event::RawEvent;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

// ============================================================================
// NATIVE BRIDGE
// ============================================================================

/// Schnittstelle zur nativen Signaling-Implementierung
pub trait NativeBridge: Send + Sync {
    /// Holt das nächste Event ab
    ///
    /// `None` bedeutet "keine Daten in diesem Zyklus" und ist kein Fehler.
    fn poll_event(&self) -> Option<RawEvent>;

    /// Reiht ein ausgehendes Event ein; Fehler der nativen Seite werden verschluckt
    fn push_event(&self, kind: i32, payload: &str);

    /// Weckt einen blockierenden `poll_event`-Aufruf auf
    ///
    /// Wird beim Stoppen des Poll-Workers aufgerufen. Ein Wake, der vor dem
    /// nächsten Poll ankommt, darf nicht verloren gehen: dieser Poll muss
    /// dann ohne zu blockieren `None` liefern. Bridges, die nie unbegrenzt
    /// blockieren, brauchen nichts zu tun.
    fn wake(&self) {}

    /// Verwirft einen noch nicht abgeholten Wake
    ///
    /// Wird vor dem Start eines neuen Poll-Workers aufgerufen, damit ein
    /// Wake aus der vorigen Sitzung keinen leeren Zyklus auslöst.
    fn clear_wake(&self) {}
}

// ============================================================================
// EVENT QUEUE
// ============================================================================

#[derive(Debug, Default)]
struct QueueState {
    events: VecDeque<RawEvent>,
    /// Gesetzt von `wake()`, verbraucht vom nächsten Poll
    woken: bool,
}

/// Thread-sichere FIFO-Queue für native Events
///
/// `poll_event` wartet auf das nächste Event. Ohne `poll_timeout` wartet es
/// bis ein Event ankommt oder die Queue geweckt wird. Ein Wake bleibt stehen,
/// bis ihn ein Poll verbraucht hat, auch wenn gerade niemand wartet. Ein
/// Event mit leerem Payload wird verworfen und als "keine Daten" gemeldet.
#[derive(Debug, Default)]
pub struct EventQueue {
    state: Mutex<QueueState>,
    available: Condvar,
    poll_timeout: Option<Duration>,
}

impl EventQueue {
    /// Erstellt eine Queue, deren Poll unbegrenzt blockiert
    pub fn new() -> Self {
        Self::default()
    }

    /// Erstellt eine Queue, deren Poll höchstens `timeout` wartet
    pub fn with_poll_timeout(timeout: Option<Duration>) -> Self {
        Self {
            poll_timeout: timeout,
            ..Self::default()
        }
    }

    /// Reiht ein Event ein und weckt einen wartenden Poll
    pub fn push(&self, event: RawEvent) {
        self.state.lock().events.push_back(event);
        self.available.notify_one();
    }

    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().events.is_empty()
    }

    fn take_next(state: &mut QueueState) -> Option<RawEvent> {
        let event = state.events.pop_front()?;
        if event.payload.is_empty() {
            tracing::debug!("Dropping event with empty payload (kind={})", event.kind);
            return None;
        }
        Some(event)
    }
}

impl NativeBridge for EventQueue {
    fn poll_event(&self) -> Option<RawEvent> {
        let deadline = self.poll_timeout.map(|timeout| Instant::now() + timeout);
        let mut state = self.state.lock();

        loop {
            // Wake hat Vorrang, wartende Events bleiben für den nächsten Poll
            if std::mem::take(&mut state.woken) {
                return None;
            }
            if !state.events.is_empty() {
                return Self::take_next(&mut state);
            }

            match deadline {
                None => self.available.wait(&mut state),
                Some(deadline) => {
                    if self.available.wait_until(&mut state, deadline).timed_out() {
                        return Self::take_next(&mut state);
                    }
                }
            }
        }
    }

    fn push_event(&self, kind: i32, payload: &str) {
        self.push(RawEvent::new(kind, payload));
        tracing::debug!("Event pushed: kind={}, payload={}", kind, payload);
    }

    fn wake(&self) {
        self.state.lock().woken = true;
        self.available.notify_all();
    }

    fn clear_wake(&self) {
        self.state.lock().woken = false;
    }
}

// ============================================================================
// TESTS
// ============================================================================
