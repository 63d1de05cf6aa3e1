//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod heartbeat;
pub mod indicator;
pub mod link_monitor;
pub mod scoreboard;
pub mod serial_rx;
pub mod serial_tx;

pub use heartbeat::heartbeat_task;
pub use indicator::indicator_task;
pub use link_monitor::link_monitor_task;
pub use scoreboard::scoreboard_task;
pub use serial_rx::serial_rx_task;
pub use serial_tx::serial_tx_task;
