//! Signaling Module - Grenze zur nativen Transport-Schicht
//!
//! Dieses Modul beschreibt, was über die native Grenze fließt:
//! - Event-Typen (SDP, ICE Candidates, Statusänderungen)
//! - Die `NativeBridge`-Schnittstelle (poll / push)
//! - Eine In-Process Event-Queue als Referenz-Implementierung
//!

mod bridge;
mod event;

pub use bridge::{EventQueue, NativeBridge};
pub use event::{Event, EventError, EventKind, RawEvent};
