//! Backend connectivity state machine.
//!
//! `Unknown → Connected ⇄ Reconnecting → Disabled`. `Disabled` is terminal:
//! once the reconnect budget is exhausted the cache stays off for the rest of
//! the process. The state is a single atomic value, written only by the cache
//! layer's own error paths and reconnect supervisor; request handlers only
//! read it.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Unknown,
    Connected,
    Reconnecting,
    Disabled,
}

impl Connectivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connectivity::Unknown => "unknown",
            Connectivity::Connected => "connected",
            Connectivity::Reconnecting => "reconnecting",
            Connectivity::Disabled => "disabled",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Connectivity::Connected,
            2 => Connectivity::Reconnecting,
            3 => Connectivity::Disabled,
            _ => Connectivity::Unknown,
        }
    }
}

#[derive(Debug, Default)]
pub struct ConnectivityState(AtomicU8);

impl ConnectivityState {
    pub fn new() -> Self {
        Self(AtomicU8::new(Connectivity::Unknown as u8))
    }

    pub fn current(&self) -> Connectivity {
        Connectivity::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn is_available(&self) -> bool {
        self.current() == Connectivity::Connected
    }

    /// Mark the backend reachable. No-op once disabled.
    pub fn mark_connected(&self) -> bool {
        self.transition(Connectivity::Connected)
    }

    /// Mark the backend unreachable. No-op once disabled.
    pub fn mark_reconnecting(&self) -> bool {
        self.transition(Connectivity::Reconnecting)
    }

    /// Terminal transition after the reconnect budget is exhausted.
    pub fn disable(&self) {
        self.transition(Connectivity::Disabled);
    }

    fn transition(&self, target: Connectivity) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                if Connectivity::from_u8(current) == Connectivity::Disabled {
                    None
                } else {
                    Some(target as u8)
                }
            })
            .is_ok()
    }
}
