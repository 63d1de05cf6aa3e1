//! Scoreboard loop task
//!
//! Owns the orchestrator and runs one step per quantum. Everything the
//! core reports is logged here.

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Timer};

use tally_core::config::ScoreboardConfig;
use tally_core::scoreboard::{
    Hardware, LineOutcome, Orchestrator, RefreshOutcome, ScanReport, StepReport, TransmitReport,
};

use crate::board::TallyBoard;
use crate::channels::{LINK_CHANGED, RX_BUFFER, RX_BUFFER_SIZE};

type TallyOrchestrator =
    Orchestrator<'static, TallyBoard, CriticalSectionRawMutex, RX_BUFFER_SIZE>;

/// Scoreboard task - polls consoles and serves operator commands
#[embassy_executor::task]
pub async fn scoreboard_task(hw: Hardware<TallyBoard>, config: ScoreboardConfig) {
    info!("Scoreboard task started");

    let mut orchestrator: TallyOrchestrator = Orchestrator::new(hw, &RX_BUFFER, config);

    let report = orchestrator.start();
    if let Err(e) = report.clock {
        warn!("Failed to set baseline clock: {:?}", e);
    }
    log_scan(&report.scan);
    info!(
        "Serving in {} mode",
        orchestrator.state().mode.label()
    );

    let quantum = Duration::from_millis(config.quantum_ms as u64);

    loop {
        Timer::after(quantum).await;

        if LINK_CHANGED.try_take().is_some() {
            debug!("Link change, rescan scheduled");
            orchestrator.notify_topology_change();
        }

        match orchestrator.step() {
            Ok(report) => log_step(&report),
            Err(fault) => {
                error!("Receive buffer fault: {:?}", fault);
                panic!("Scoreboard fault: {:?}", fault);
            }
        }
    }
}

fn log_scan(scan: &ScanReport) {
    if scan.simulated {
        debug!("Scan skipped, {} demo consoles", scan.found);
        return;
    }
    info!("Scan: {} consoles found, {} lost", scan.found, scan.lost);
    if scan.refresh.failed > 0 {
        warn!("{} consoles failed their first refresh", scan.refresh.failed);
    }
}

fn log_transmit(transmit: &TransmitReport) {
    debug!(
        "Sent {:?} to {} consoles",
        transmit.command, transmit.delivered
    );
    if transmit.failed > 0 {
        warn!("{} consoles did not take {:?}", transmit.failed, transmit.command);
    }
}

fn log_step(report: &StepReport) {
    if let Some(scan) = &report.scan {
        log_scan(scan);
    }

    match &report.line {
        Some(LineOutcome::Executed) => trace!("Command executed"),
        Some(LineOutcome::Failed(e)) => debug!("Command failed: {:?}", e),
        Some(LineOutcome::Overflow) => warn!("Input line overflowed the receive buffer"),
        None => {}
    }

    if let Some(transmit) = &report.transmit {
        log_transmit(transmit);
    }

    match &report.refresh {
        Some(RefreshOutcome::Bus(refresh)) if refresh.failed > 0 => {
            warn!(
                "Refresh: {} consoles dropped, {} live",
                refresh.failed, refresh.refreshed
            );
        }
        Some(RefreshOutcome::Bus(refresh)) => trace!("Refresh: {} live", refresh.refreshed),
        Some(RefreshOutcome::Demo(tick)) => trace!("Demo tick: {:?}", tick),
        None => {}
    }

    if let Some(end) = &report.tournament_end {
        info!("Tournament ended");
        log_transmit(end);
    }

    if let Some(e) = report.serial_error {
        warn!("Operator output lost: {:?}", e);
    }
}
