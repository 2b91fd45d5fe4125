//! Event-Typen der nativen Signaling-Schicht
//!
//! Diese Strukturen spiegeln die Event-Definitionen der nativen Seite wider.
//! Die Reihenfolge von [`EventKind`] ist ein binärer Vertrag: der Ordinalwert
//! wird als Integer über die Bridge übertragen und muss exakt mit der
//! nativen Enum übereinstimmen.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("Invalid event kind: {0}")]
    InvalidKind(i32),
}

// ============================================================================
// EVENT KIND
// ============================================================================

/// Art eines nativen Events
///
/// Ordinalwerte: 0=LocalDescription, 1=LocalCandidate, 2=StateChange,
/// 3=GatheringStateChange, 4=SetLocalDescription, 5=SetLocalCandidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Lokale Session Description (SDP) wurde erzeugt
    LocalDescription,
    /// Lokaler ICE Candidate wurde gefunden
    LocalCandidate,
    /// Verbindungsstatus hat sich geändert
    StateChange,
    /// ICE Gathering-Status hat sich geändert
    GatheringStateChange,
    /// Anfrage: Local Description setzen
    SetLocalDescription,
    /// Anfrage: Local Candidate setzen
    SetLocalCandidate,
}

impl EventKind {
    /// Alle Varianten in Ordinal-Reihenfolge
    pub const ALL: [EventKind; 6] = [
        EventKind::LocalDescription,
        EventKind::LocalCandidate,
        EventKind::StateChange,
        EventKind::GatheringStateChange,
        EventKind::SetLocalDescription,
        EventKind::SetLocalCandidate,
    ];

    /// Dekodiert einen Ordinalwert der nativen Seite
    pub fn from_ordinal(ordinal: i32) -> Result<Self, EventError> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or(EventError::InvalidKind(ordinal))
    }

    /// Gibt den Ordinalwert für die native Seite zurück
    pub fn ordinal(self) -> i32 {
        self as i32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::LocalDescription => "local_description",
            EventKind::LocalCandidate => "local_candidate",
            EventKind::StateChange => "state_change",
            EventKind::GatheringStateChange => "gathering_state_change",
            EventKind::SetLocalDescription => "set_local_description",
            EventKind::SetLocalCandidate => "set_local_candidate",
        }
    }
}

impl TryFrom<i32> for EventKind {
    type Error = EventError;

    fn try_from(ordinal: i32) -> Result<Self, Self::Error> {
        Self::from_ordinal(ordinal)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// EVENT
// ============================================================================

/// Ein einzelnes Event der nativen Seite
///
/// Der Payload wird nicht interpretiert; seine Bedeutung hängt von `kind` ab
/// (SDP-Text, Candidate-String, Statusname, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    kind: EventKind,
    payload: String,
}

impl Event {
    pub fn new(kind: EventKind, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }
}

// ============================================================================
// RAW EVENT
// ============================================================================

/// Undekodiertes Event, wie es die native Seite liefert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: i32,
    pub payload: String,
}

impl RawEvent {
    pub fn new(kind: i32, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Dekodiert das Event; ungültige Kind-Werte schlagen fehl
    pub fn decode(self) -> Result<Event, EventError> {
        let kind = EventKind::from_ordinal(self.kind)?;
        Ok(Event {
            kind,
            payload: self.payload,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_round_trip() {
        for (index, kind) in EventKind::ALL.iter().enumerate() {
            assert_eq!(kind.ordinal(), index as i32);
            assert_eq!(EventKind::from_ordinal(kind.ordinal()), Ok(*kind));
        }
    }

    #[test]
    fn test_ordinal_mapping_matches_native_enum() {
        assert_eq!(EventKind::try_from(0), Ok(EventKind::LocalDescription));
        assert_eq!(EventKind::try_from(1), Ok(EventKind::LocalCandidate));
        assert_eq!(EventKind::try_from(2), Ok(EventKind::StateChange));
        assert_eq!(EventKind::try_from(3), Ok(EventKind::GatheringStateChange));
        assert_eq!(EventKind::try_from(4), Ok(EventKind::SetLocalDescription));
        assert_eq!(EventKind::try_from(5), Ok(EventKind::SetLocalCandidate));
    }

    #[test]
    fn test_out_of_range_kind_is_rejected() {
        for ordinal in [-1, 6, 7, i32::MAX, i32::MIN] {
            assert_eq!(
                EventKind::from_ordinal(ordinal),
                Err(EventError::InvalidKind(ordinal))
            );
        }
    }

    #[test]
    fn test_raw_event_decode() {
        let event = RawEvent::new(2, "connected").decode().unwrap();
        assert_eq!(event, Event::new(EventKind::StateChange, "connected"));

        let err = RawEvent::new(9, "x").decode().unwrap_err();
        assert_eq!(err.to_string(), "Invalid event kind: 9");
    }

    #[test]
    fn test_event_serializes_as_json() {
        let event = Event::new(EventKind::LocalCandidate, "cand:1");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "kind": "local_candidate", "payload": "cand:1" })
        );
    }
}
