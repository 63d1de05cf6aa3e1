//! Orchestrator lifecycle
//!
//! The loop starts idle, scans the bus once on start and then serves
//! commands and refreshes. A topology change or the periodic rescan sends
//! it back through a scan.

/// Orchestrator phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Not started; nothing is polled
    #[default]
    Idle,
    /// Probing every slot address
    Scanning,
    /// Servicing commands and refreshing known consoles
    Serving,
}

/// Events that move the orchestrator between phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhaseEvent {
    Start,
    ScanComplete,
    /// Link change or rescan countdown expired
    Rescan,
    Stop,
}

impl Phase {
    /// Process an event and return the next phase
    pub fn transition(self, event: PhaseEvent) -> Self {
        use Phase::*;
        use PhaseEvent::*;

        match (self, event) {
            (Idle, Start) => Scanning,
            (Scanning, ScanComplete) => Serving,
            (Serving, Rescan) => Scanning,
            (_, Stop) => Idle,

            // Default: stay in current phase
            _ => self,
        }
    }

    /// Commands and refreshes are only handled while serving
    pub fn is_serving(&self) -> bool {
        matches!(self, Phase::Serving)
    }
}
