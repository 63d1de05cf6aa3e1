//! Console aggregation
//!
//! The [`Orchestrator`] owns the [`AggregatorState`] and drives everything
//! else: bus scans and refreshes, command lines from the receive buffer,
//! the demo simulation and tournament tracking.

pub mod demo;
pub mod orchestrator;
pub mod phase;
pub mod state;

pub use demo::{DemoSimulator, DemoTick, Lcg, Probability};
pub use orchestrator::{
    Board, Fault, Hardware, LineOutcome, Orchestrator, RefreshOutcome, RefreshReport, ScanReport,
    StartReport, StepReport, TransmitReport, LINE_CAPACITY, LINE_TERMINATOR,
};
pub use phase::{Phase, PhaseEvent};
pub use state::{
    snake_name, AggregatorState, DeviceSlot, OutputMode, FIRST_ADDRESS, SLOT_COUNT, SNAKE_NAMES,
};
