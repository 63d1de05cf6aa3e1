//! Scoreboard loop
//!
//! [`Orchestrator::step`] runs once per quantum and does, in order:
//!
//! 1. a bus scan, if the topology changed or the rescan countdown expired
//! 2. at most one complete input line: parse, execute, answer, transmit
//! 3. on the refresh tick: re-read every live console (or advance the demo
//!    simulation), blink their indicators, and emit scores when polling
//! 4. the tournament check
//!
//! Nothing here blocks beyond a single bus transaction, and nothing logs;
//! every step returns a [`StepReport`] for the caller to log.

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::Vec;
use tally_protocol::{decode, ConsoleInfo, DeviceCommand, GameStatus, RegisterImage, COMMAND_OFFSET};

use super::demo::{DemoSimulator, DemoTick};
use super::phase::{Phase, PhaseEvent};
use super::state::{AggregatorState, OutputMode, SLOT_COUNT};
use crate::buffer::{BufferError, SharedRingBuffer};
use crate::command::{
    dispatch_line, reject_line, respond, CommandError, Effect, Response, TournamentReply,
};
use crate::config::ScoreboardConfig;
use crate::traits::{
    Clock, ClockError, DeviceBus, FreeRunningCounter, Indicator, SerialError, SerialTx,
};

/// Longest command line, terminator excluded
pub const LINE_CAPACITY: usize = 128;

/// Ends every command line
pub const LINE_TERMINATOR: u8 = b'\r';

/// Hardware a board provides to the orchestrator
pub trait Board {
    type Bus: DeviceBus;
    type Clock: Clock;
    type Serial: SerialTx;
    type Indicator: Indicator;
    type Counter: FreeRunningCounter;
}

/// Owned hardware handles
pub struct Hardware<P: Board> {
    pub bus: P::Bus,
    pub clock: P::Clock,
    pub serial: P::Serial,
    pub indicator: P::Indicator,
    pub counter: P::Counter,
}

/// Unrecoverable loop failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// A peek reached outside the stored bytes during line extraction
    BufferOffset,
    /// The buffer ran dry while draining a line it had just measured
    BufferUnderflow,
}

impl From<BufferError> for Fault {
    fn from(e: BufferError) -> Self {
        match e {
            BufferError::OffsetOutOfBounds => Fault::BufferOffset,
            BufferError::Empty | BufferError::Full => Fault::BufferUnderflow,
        }
    }
}

/// Result of re-reading the live consoles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RefreshReport {
    pub refreshed: usize,
    /// Consoles that failed to answer and were dropped
    pub failed: usize,
}

/// Result of a bus scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanReport {
    /// Addresses that answered with a valid signature
    pub found: usize,
    /// Previously known consoles that disappeared
    pub lost: usize,
    /// The scan was skipped because demo consoles own the slots
    pub simulated: bool,
    pub refresh: RefreshReport,
}

/// Result of [`Orchestrator::start`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StartReport {
    /// Setting the baseline date and time
    pub clock: Result<(), ClockError>,
    pub scan: ScanReport,
}

/// Result of writing a command word to the live consoles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransmitReport {
    pub command: DeviceCommand,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RefreshOutcome {
    Bus(RefreshReport),
    Demo(DemoTick),
}

/// What happened to an input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineOutcome {
    Executed,
    Failed(CommandError),
    /// The buffer filled without a terminator and was discarded
    Overflow,
}

/// Everything one step did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepReport {
    pub scan: Option<ScanReport>,
    pub line: Option<LineOutcome>,
    /// Command word sent on behalf of the line
    pub transmit: Option<TransmitReport>,
    pub refresh: Option<RefreshOutcome>,
    /// Set when this step ended the tournament
    pub tournament_end: Option<TransmitReport>,
    /// First error writing to the operator link
    pub serial_error: Option<SerialError>,
}

impl StepReport {
    fn note_serial(&mut self, error: Option<SerialError>) {
        self.serial_error = self.serial_error.or(error);
    }
}

enum Extract {
    Nothing,
    Line { truncated: bool },
    Overflow,
}

/// Bus and command orchestration for the scoreboard
pub struct Orchestrator<'a, P: Board, M: RawMutex, const N: usize> {
    hw: Hardware<P>,
    rx: &'a SharedRingBuffer<M, N>,
    config: ScoreboardConfig,
    state: AggregatorState,
    phase: Phase,
    demo: DemoSimulator,
    /// Quanta until the next refresh
    refresh_countdown: u16,
    /// Refreshes until the next periodic scan
    refreshes_until_rescan: u16,
    topology_changed: bool,
    rescan_due: bool,
}

impl<'a, P: Board, M: RawMutex, const N: usize> Orchestrator<'a, P, M, N> {
    pub fn new(hw: Hardware<P>, rx: &'a SharedRingBuffer<M, N>, config: ScoreboardConfig) -> Self {
        let seed = hw.counter.now();
        Self {
            hw,
            rx,
            config,
            state: AggregatorState::new(config.default_mode),
            phase: Phase::Idle,
            demo: DemoSimulator::new(seed),
            refresh_countdown: config.first_refresh_quanta,
            refreshes_until_rescan: config.rescan_refreshes,
            topology_changed: false,
            rescan_due: false,
        }
    }

    pub fn state(&self) -> &AggregatorState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &ScoreboardConfig {
        &self.config
    }

    pub fn hardware(&self) -> &Hardware<P> {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut Hardware<P> {
        &mut self.hw
    }

    /// Reset state, set the clock baseline and scan the bus
    pub fn start(&mut self) -> StartReport {
        self.state = AggregatorState::new(self.config.default_mode);
        let clock = self
            .hw
            .clock
            .set_date(self.config.baseline_date)
            .and_then(|()| self.hw.clock.set_time(self.config.baseline_time));

        self.refresh_countdown = self.config.first_refresh_quanta.max(1);
        self.refreshes_until_rescan = self.config.rescan_refreshes;
        self.phase = self.phase.transition(PhaseEvent::Start);

        let scan = self.scan();
        StartReport { clock, scan }
    }

    /// Stop serving; [`start`](Self::start) begins afresh
    pub fn stop(&mut self) {
        self.phase = self.phase.transition(PhaseEvent::Stop);
    }

    /// A console link came or went; rescan on the next step
    pub fn notify_topology_change(&mut self) {
        self.topology_changed = true;
    }

    /// Probe every slot address and refresh what answered
    pub fn scan(&mut self) -> ScanReport {
        self.phase = self.phase.transition(PhaseEvent::Rescan);
        self.topology_changed = false;
        self.rescan_due = false;

        let mut report = ScanReport::default();

        if self.state.demo_mode || self.state.demo_initialized {
            report.simulated = true;
            report.found = self.state.active_count();
        } else {
            for index in 0..SLOT_COUNT {
                let address = self.state.slots[index].address;
                let mut info = [0u8; 1];
                let answered = self.hw.bus.is_device_ready(address)
                    && self.hw.bus.read_registers(address, 0, &mut info).is_ok();
                let info = ConsoleInfo(info[0]);

                if answered && info.has_signature() {
                    let slot = &mut self.state.slots[index];
                    slot.device_id = info.identity();
                    slot.is_active = true;
                    report.found += 1;
                } else if self.state.slots[index].is_active {
                    self.state.clear_slot(index);
                    report.lost += 1;
                }
            }
            report.refresh = self.refresh_slots();
        }

        self.phase = self.phase.transition(PhaseEvent::ScanComplete);
        report
    }

    /// Run one quantum
    ///
    /// Does nothing until [`start`](Self::start) has run.
    pub fn step(&mut self) -> Result<StepReport, Fault> {
        let mut report = StepReport::default();
        if !self.phase.is_serving() {
            return Ok(report);
        }

        if self.topology_changed || self.rescan_due {
            report.scan = Some(self.scan());
        }

        self.service_line(&mut report)?;

        self.refresh_countdown = self.refresh_countdown.saturating_sub(1);
        if self.refresh_countdown == 0 {
            self.refresh_countdown = self.config.refresh_quanta.max(1);
            report.refresh = Some(self.periodic_refresh(&mut report));
        }

        report.tournament_end = self.check_tournament(&mut report);
        Ok(report)
    }

    /// Extract and handle at most one complete line
    fn service_line(&mut self, report: &mut StepReport) -> Result<(), Fault> {
        let echo_enabled = self.state.mode == OutputMode::Terminal;
        let mut echo: Vec<u8, N> = Vec::new();
        let mut line: Vec<u8, LINE_CAPACITY> = Vec::new();

        let extract = self.rx.with(|buf| -> Result<Extract, BufferError> {
            let fresh = buf.take_new_data();
            if echo_enabled {
                for offset in (0..fresh).rev() {
                    let byte = buf.peek(offset)?;
                    if byte != LINE_TERMINATOR {
                        // Never more fresh bytes than capacity
                        let _ = echo.push(byte);
                    }
                }
            }

            // Oldest terminator wins; peek offsets count back from the newest byte
            let len = buf.len();
            let mut terminator = None;
            for offset in (0..len).rev() {
                if buf.peek(offset)? == LINE_TERMINATOR {
                    terminator = Some(offset);
                    break;
                }
            }

            let mut truncated = false;
            match terminator {
                None if buf.is_full() => {
                    buf.flush();
                    Ok(Extract::Overflow)
                }
                None => Ok(Extract::Nothing),
                Some(0) => {
                    buf.pop()?;
                    while !buf.is_empty() {
                        truncated |= line.push(buf.dequeue()?).is_err();
                    }
                    buf.flush();
                    Ok(Extract::Line { truncated })
                }
                Some(behind) => {
                    for _ in 0..len - 1 - behind {
                        truncated |= line.push(buf.dequeue()?).is_err();
                    }
                    buf.dequeue()?;
                    Ok(Extract::Line { truncated })
                }
            }
        })?;

        if !echo.is_empty() {
            report.note_serial(self.hw.serial.write(&echo).err());
        }

        let outcome = match extract {
            Extract::Nothing => return Ok(()),
            Extract::Overflow => {
                let mut out = self.hw.serial.writer();
                reject_line(&self.state, &mut out, CommandError::LineTooLong);
                report.note_serial(out.error());
                LineOutcome::Overflow
            }
            Extract::Line { truncated: true } => {
                let mut out = self.hw.serial.writer();
                let error = reject_line(&self.state, &mut out, CommandError::LineTooLong);
                report.note_serial(out.error());
                LineOutcome::Failed(error)
            }
            Extract::Line { truncated: false } => {
                let Ok(text) = core::str::from_utf8(&line) else {
                    let mut out = self.hw.serial.writer();
                    let error = reject_line(&self.state, &mut out, CommandError::InvalidEncoding);
                    report.note_serial(out.error());
                    report.line = Some(LineOutcome::Failed(error));
                    return Ok(());
                };
                let mut out = self.hw.serial.writer();
                let result = dispatch_line(&mut self.state, text, &mut self.hw.clock, &mut out);
                report.note_serial(out.error());

                match result {
                    Ok(Effect::None) => LineOutcome::Executed,
                    Ok(Effect::Transmit(command)) => {
                        report.transmit = Some(self.transmit(command));
                        LineOutcome::Executed
                    }
                    Err(error) => LineOutcome::Failed(error),
                }
            }
        };

        report.line = Some(outcome);
        Ok(())
    }

    /// Re-read every active console; failures drop the slot
    fn refresh_slots(&mut self) -> RefreshReport {
        let mut report = RefreshReport::default();

        for index in 0..SLOT_COUNT {
            let slot = self.state.slots[index];
            if !slot.is_active {
                continue;
            }

            let mut image = RegisterImage::new();
            let file = self
                .hw
                .bus
                .read_registers(slot.address, 0, &mut image.0)
                .ok()
                .and_then(|()| decode(&image).ok());

            match file {
                Some(file) => {
                    self.state.states[index] = file.state;
                    self.state.stats[index] = file.stats;
                    self.state.slots[index].is_connected = true;
                    report.refreshed += 1;
                }
                None => {
                    self.state.clear_slot(index);
                    report.failed += 1;
                }
            }
        }

        report
    }

    fn periodic_refresh(&mut self, report: &mut StepReport) -> RefreshOutcome {
        let outcome = if self.state.demo_mode || self.state.demo_initialized {
            let tick = self.demo.tick(&mut self.state, &self.hw.counter);
            if tick == DemoTick::Cleared {
                self.topology_changed = true;
            }
            RefreshOutcome::Demo(tick)
        } else {
            RefreshOutcome::Bus(self.refresh_slots())
        };

        for index in self.state.active() {
            self.hw.indicator.set_blink(
                index,
                self.config.blink_period_ms,
                self.config.blink_count,
            );
        }

        if self.state.polling {
            let mut out = self.hw.serial.writer();
            respond(&self.state, &mut out, Response::Scores(&self.state));
            report.note_serial(out.error());
        }

        if self.config.rescan_refreshes > 0 {
            self.refreshes_until_rescan = self.refreshes_until_rescan.saturating_sub(1);
            if self.refreshes_until_rescan == 0 {
                self.refreshes_until_rescan = self.config.rescan_refreshes;
                self.rescan_due = true;
            }
        }

        outcome
    }

    /// End the tournament once every live console reports game over
    fn check_tournament(&mut self, report: &mut StepReport) -> Option<TransmitReport> {
        if !self.state.tournament_active || self.state.active_count() == 0 {
            return None;
        }
        let all_over = self
            .state
            .active()
            .all(|index| self.state.states[index].status == GameStatus::Over);
        if !all_over {
            return None;
        }

        self.state.tournament_active = false;
        let mut out = self.hw.serial.writer();
        respond(&self.state, &mut out, Response::Tournament(TournamentReply::Ended));
        report.note_serial(out.error());

        Some(self.transmit(DeviceCommand::TournamentEnd))
    }

    /// Send a command to every active console
    ///
    /// Demo consoles take the command directly, including the ones still
    /// waiting to be cleared after demo mode was turned off.
    fn transmit(&mut self, command: DeviceCommand) -> TransmitReport {
        let mut report = TransmitReport {
            command,
            delivered: 0,
            failed: 0,
        };

        if self.state.demo_mode || self.state.demo_initialized {
            self.demo.apply(&mut self.state, command);
            report.delivered = self.state.active_count();
            return report;
        }

        let word = command.to_word().to_be_bytes();
        for index in 0..SLOT_COUNT {
            let slot = self.state.slots[index];
            if !slot.is_active {
                continue;
            }
            match self
                .hw
                .bus
                .write_registers(slot.address, COMMAND_OFFSET as u8, &word)
            {
                Ok(()) => report.delivered += 1,
                Err(_) => report.failed += 1,
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::command::ParseError;
    use crate::scoreboard::state::FIRST_ADDRESS;
    use crate::traits::BusError;
    use core::cell::Cell;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use std::string::String;
    use std::vec::Vec as StdVec;
    use tally_protocol::{encode, Date, RegisterFile, Time};

    const RX_SIZE: usize = 64;
    type Rx = SharedRingBuffer<NoopRawMutex, RX_SIZE>;

    /// Mock bus backed by register images
    struct MockBus {
        consoles: [Option<RegisterImage>; SLOT_COUNT],
        writes: StdVec<(u8, u8, StdVec<u8>)>,
    }

    impl MockBus {
        fn console(&self, address: u8) -> Option<&RegisterImage> {
            let index = address.checked_sub(FIRST_ADDRESS)? as usize;
            self.consoles.get(index)?.as_ref()
        }
    }

    impl DeviceBus for MockBus {
        fn is_device_ready(&mut self, address: u8) -> bool {
            self.console(address).is_some()
        }

        fn read_registers(&mut self, address: u8, offset: u8, buf: &mut [u8]) -> Result<(), BusError> {
            let image = self.console(address).ok_or(BusError::Nack)?;
            let start = offset as usize;
            buf.copy_from_slice(&image.0[start..start + buf.len()]);
            Ok(())
        }

        fn write_registers(&mut self, address: u8, offset: u8, data: &[u8]) -> Result<(), BusError> {
            self.console(address).ok_or(BusError::Nack)?;
            self.writes.push((address, offset, data.to_vec()));
            Ok(())
        }
    }

    /// Mock clock for testing
    struct MockClock {
        date: Date,
        time: Time,
    }

    impl Clock for MockClock {
        fn date(&mut self) -> Date {
            self.date
        }

        fn time(&mut self) -> Time {
            self.time
        }

        fn set_date(&mut self, date: Date) -> Result<(), ClockError> {
            self.date = date;
            Ok(())
        }

        fn set_time(&mut self, time: Time) -> Result<(), ClockError> {
            self.time = time;
            Ok(())
        }
    }

    struct MockSerial {
        out: StdVec<u8>,
    }

    impl SerialTx for MockSerial {
        fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
            self.out.extend_from_slice(bytes);
            Ok(())
        }
    }

    struct MockIndicator {
        blinks: StdVec<(usize, u16, u8)>,
    }

    impl Indicator for MockIndicator {
        fn set_blink(&mut self, channel: usize, period_ms: u16, count: u8) {
            self.blinks.push((channel, period_ms, count));
        }
    }

    struct MockCounter {
        value: Cell<u32>,
    }

    impl FreeRunningCounter for MockCounter {
        fn now(&self) -> u32 {
            let v = self.value.get();
            self.value.set(v.wrapping_add(104_729));
            v
        }
    }

    struct MockBoard;

    impl Board for MockBoard {
        type Bus = MockBus;
        type Clock = MockClock;
        type Serial = MockSerial;
        type Indicator = MockIndicator;
        type Counter = MockCounter;
    }

    type TestOrchestrator<'a> = Orchestrator<'a, MockBoard, NoopRawMutex, RX_SIZE>;

    fn console_image(id: u8, status: GameStatus, score: u16) -> RegisterImage {
        let mut file = RegisterFile::default();
        file.state.console_id = id;
        file.state.status = status;
        file.state.level = 1;
        file.state.score1 = score;
        encode(&file)
    }

    fn test_config() -> ScoreboardConfig {
        ScoreboardConfig {
            first_refresh_quanta: 3,
            refresh_quanta: 3,
            rescan_refreshes: 0,
            ..ScoreboardConfig::new()
        }
    }

    fn orchestrator(rx: &Rx, consoles: [Option<RegisterImage>; SLOT_COUNT]) -> TestOrchestrator<'_> {
        let hw = Hardware {
            bus: MockBus {
                consoles,
                writes: StdVec::new(),
            },
            clock: MockClock {
                date: Date::new(2030, 6, 1).unwrap(),
                time: Time::default(),
            },
            serial: MockSerial { out: StdVec::new() },
            indicator: MockIndicator {
                blinks: StdVec::new(),
            },
            counter: MockCounter {
                value: Cell::new(17),
            },
        };
        Orchestrator::new(hw, rx, test_config())
    }

    fn two_consoles() -> [Option<RegisterImage>; SLOT_COUNT] {
        [
            Some(console_image(1, GameStatus::Running, 10)),
            None,
            None,
            Some(console_image(4, GameStatus::Running, 42)),
            None,
        ]
    }

    fn feed(rx: &Rx, text: &str) {
        for b in text.bytes() {
            rx.enqueue(b).unwrap();
        }
    }

    fn take_output(orch: &mut TestOrchestrator<'_>) -> String {
        let out = core::mem::take(&mut orch.hardware_mut().serial.out);
        String::from_utf8(out).unwrap()
    }

    fn run_until_refresh(orch: &mut TestOrchestrator<'_>) -> StepReport {
        for _ in 0..100 {
            let report = orch.step().unwrap();
            if report.refresh.is_some() {
                return report;
            }
        }
        panic!("no refresh within 100 steps");
    }

    #[test]
    fn test_step_before_start_does_nothing() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, two_consoles());
        feed(&rx, "@devices\r");
        assert_eq!(orch.step(), Ok(StepReport::default()));
        assert_eq!(rx.len(), 9);
    }

    #[test]
    fn test_start_scans_and_sets_clock() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, two_consoles());
        let report = orch.start();

        assert_eq!(report.clock, Ok(()));
        assert_eq!(report.scan.found, 2);
        assert_eq!(report.scan.refresh.refreshed, 2);
        assert_eq!(orch.phase(), Phase::Serving);

        let state = orch.state();
        assert_eq!(state.active_count(), 2);
        assert_eq!(state.connected_count(), 2);
        assert_eq!(state.slots[3].device_id, 4);
        assert_eq!(state.states[3].score1, 42);
        assert_eq!(orch.hardware().clock.date, Date::new(2024, 1, 1).unwrap());
        assert_eq!(orch.hardware().clock.time, Time::new(23, 59, 30).unwrap());
    }

    #[test]
    fn test_command_forwarded_to_active_consoles() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, two_consoles());
        orch.start();

        feed(&rx, "@set_level 3\r");
        let report = orch.step().unwrap();
        assert_eq!(report.line, Some(LineOutcome::Executed));
        let transmit = report.transmit.unwrap();
        assert_eq!(transmit.delivered, 2);
        assert_eq!(transmit.failed, 0);

        let word = ((2u32 << 23) | 3).to_be_bytes();
        let writes = &orch.hardware().bus.writes;
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], (0x10, 0x30, word.to_vec()));
        assert_eq!(writes[1], (0x13, 0x30, word.to_vec()));
        assert_eq!(
            take_output(&mut orch),
            "{'command': 'set_level', 'targets': 2, 'status': 1}\n"
        );
    }

    #[test]
    fn test_rejected_command_not_transmitted() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, two_consoles());
        orch.start();

        feed(&rx, "@set_level 9\r");
        let report = orch.step().unwrap();
        assert_eq!(
            report.line,
            Some(LineOutcome::Failed(CommandError::Rejected))
        );
        assert!(report.transmit.is_none());
        assert!(orch.hardware().bus.writes.is_empty());
    }

    #[test]
    fn test_terminator_mid_burst_keeps_tail() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, two_consoles());
        orch.start();

        feed(&rx, "@poll on\r@sco");
        let report = orch.step().unwrap();
        assert_eq!(report.line, Some(LineOutcome::Executed));
        assert!(orch.state().polling);
        assert_eq!(rx.len(), 4);
        take_output(&mut orch);

        feed(&rx, "res\r");
        let report = orch.step().unwrap();
        assert_eq!(report.line, Some(LineOutcome::Executed));
        assert!(rx.is_empty());
        assert!(take_output(&mut orch).starts_with("\r\n{\"consoles\": {\"console\":["));
    }

    #[test]
    fn test_two_lines_take_two_steps() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, two_consoles());
        orch.start();

        feed(&rx, "@pc_console\r@poll on\r");
        orch.step().unwrap();
        assert_eq!(orch.state().mode, OutputMode::Pc);
        assert!(!orch.state().polling);

        orch.step().unwrap();
        assert!(orch.state().polling);
        assert_eq!(take_output(&mut orch), "OK\nOK\ton\n");
    }

    #[test]
    fn test_full_buffer_without_terminator_is_flushed() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, two_consoles());
        orch.start();

        for _ in 0..RX_SIZE {
            rx.enqueue(b'a').unwrap();
        }
        let report = orch.step().unwrap();
        assert_eq!(report.line, Some(LineOutcome::Overflow));
        assert!(rx.is_empty());
        assert_eq!(
            take_output(&mut orch),
            "{'error': 'Line too long', 'status': 0}\n"
        );
    }

    #[test]
    fn test_blank_line_answered_as_invalid() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, two_consoles());
        orch.start();

        feed(&rx, "  \r");
        let report = orch.step().unwrap();
        assert_eq!(
            report.line,
            Some(LineOutcome::Failed(CommandError::Parse(ParseError::UnknownCommand)))
        );
        assert!(rx.is_empty());
        assert_eq!(
            take_output(&mut orch),
            "{'error': 'Invalid command: ', 'status': 0}\n"
        );

        feed(&rx, "\r");
        let report = orch.step().unwrap();
        assert!(matches!(report.line, Some(LineOutcome::Failed(_))));
        assert!(!take_output(&mut orch).is_empty());
    }

    #[test]
    fn test_terminal_mode_echoes_input() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, two_consoles());
        orch.start();

        feed(&rx, "@terminal\r");
        orch.step().unwrap();
        take_output(&mut orch);

        feed(&rx, "@get_date\r");
        orch.step().unwrap();
        assert_eq!(
            take_output(&mut orch),
            "@get_date\r\nCurrent date: 2024-01-01\r\n"
        );
    }

    #[test]
    fn test_terminal_echo_skips_terminator_across_steps() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, two_consoles());
        orch.start();

        feed(&rx, "@terminal\r");
        orch.step().unwrap();
        take_output(&mut orch);

        feed(&rx, "@get_");
        orch.step().unwrap();
        assert_eq!(take_output(&mut orch), "@get_");

        feed(&rx, "time\r");
        orch.step().unwrap();
        assert!(take_output(&mut orch).starts_with("time\r\nCurrent time: "));
    }

    #[test]
    fn test_refresh_drops_missing_console() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, two_consoles());
        orch.start();

        orch.hardware_mut().bus.consoles[3] = None;
        let report = run_until_refresh(&mut orch);
        assert_eq!(
            report.refresh,
            Some(RefreshOutcome::Bus(RefreshReport {
                refreshed: 1,
                failed: 1
            }))
        );
        assert!(!orch.state().slots[3].is_active);
        assert_eq!(orch.state().states[3].score1, 0);
        assert_eq!(orch.hardware().indicator.blinks, [(0, 400, 6)]);
    }

    #[test]
    fn test_polling_emits_scores_on_refresh() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, two_consoles());
        orch.start();

        feed(&rx, "@pc_console\r");
        orch.step().unwrap();
        feed(&rx, "@poll on\r");
        orch.step().unwrap();
        take_output(&mut orch);

        run_until_refresh(&mut orch);
        assert!(take_output(&mut orch).starts_with("OK\t2\nCONSOLE 1\t10\t"));
    }

    #[test]
    fn test_tournament_ends_when_all_over() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, two_consoles());
        orch.start();

        feed(&rx, "@tournament start\r");
        orch.step().unwrap();
        assert!(orch.state().tournament_active);

        orch.hardware_mut().bus.consoles[0] = Some(console_image(1, GameStatus::Over, 10));
        let report = run_until_refresh(&mut orch);
        assert!(report.tournament_end.is_none());
        assert!(orch.state().tournament_active);

        orch.hardware_mut().bus.consoles[3] = Some(console_image(4, GameStatus::Over, 50));
        let report = run_until_refresh(&mut orch);
        let end = report.tournament_end.unwrap();
        assert_eq!(end.command, DeviceCommand::TournamentEnd);
        assert_eq!(end.delivered, 2);
        assert!(!orch.state().tournament_active);

        let word = (9u32 << 23).to_be_bytes().to_vec();
        assert!(orch
            .hardware()
            .bus
            .writes
            .iter()
            .all(|(_, offset, data)| *offset == 0x30 && *data == word));
    }

    #[test]
    fn test_tournament_without_consoles_stays_active() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, [None; SLOT_COUNT]);
        orch.start();

        feed(&rx, "@tournament start\r");
        orch.step().unwrap();
        let report = run_until_refresh(&mut orch);
        assert!(report.tournament_end.is_none());
        assert!(orch.state().tournament_active);
    }

    #[test]
    fn test_topology_change_triggers_scan() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, [None; SLOT_COUNT]);
        assert_eq!(orch.start().scan.found, 0);

        orch.hardware_mut().bus.consoles[2] = Some(console_image(3, GameStatus::Stopped, 0));
        orch.notify_topology_change();
        let report = orch.step().unwrap();
        let scan = report.scan.unwrap();
        assert_eq!(scan.found, 1);
        assert_eq!(orch.state().slots[2].device_id, 3);

        assert!(orch.step().unwrap().scan.is_none());
    }

    #[test]
    fn test_periodic_rescan() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, [None; SLOT_COUNT]);
        orch.config.rescan_refreshes = 2;
        orch.start();

        orch.hardware_mut().bus.consoles[0] = Some(console_image(1, GameStatus::Running, 0));
        run_until_refresh(&mut orch);
        run_until_refresh(&mut orch);
        let report = orch.step().unwrap();
        assert_eq!(report.scan.map(|s| s.found), Some(1));
    }

    #[test]
    fn test_demo_mode_lifecycle() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, [None; SLOT_COUNT]);
        orch.start();

        feed(&rx, "@demo on\r");
        orch.step().unwrap();
        let report = run_until_refresh(&mut orch);
        assert_eq!(report.refresh, Some(RefreshOutcome::Demo(DemoTick::Initialized)));
        assert_eq!(orch.state().active_count(), SLOT_COUNT);
        let initials = orch.state().stats[4].records[0].initials;

        // Enabling again changes nothing
        feed(&rx, "@demo on\r");
        orch.step().unwrap();
        let report = run_until_refresh(&mut orch);
        assert!(matches!(
            report.refresh,
            Some(RefreshOutcome::Demo(DemoTick::Advanced { .. }))
        ));
        assert_eq!(orch.state().stats[4].records[0].initials, initials);

        // Commands go to the simulated consoles, not the bus
        feed(&rx, "@pause_game\r");
        let report = orch.step().unwrap();
        assert_eq!(report.transmit.map(|t| t.delivered), Some(SLOT_COUNT));
        assert!(orch.hardware().bus.writes.is_empty());

        feed(&rx, "@demo off\r");
        orch.step().unwrap();
        let report = run_until_refresh(&mut orch);
        assert_eq!(report.refresh, Some(RefreshOutcome::Demo(DemoTick::Cleared)));
        assert_eq!(orch.state().active_count(), 0);

        let report = orch.step().unwrap();
        let scan = report.scan.unwrap();
        assert!(!scan.simulated);
        assert_eq!(scan.found, 0);
    }

    #[test]
    fn test_demo_consoles_take_commands_until_cleared() {
        let rx = Rx::new();
        let mut orch = orchestrator(&rx, [None; SLOT_COUNT]);
        orch.start();

        feed(&rx, "@demo on\r");
        orch.step().unwrap();
        run_until_refresh(&mut orch);

        feed(&rx, "@demo off\r");
        let report = orch.step().unwrap();
        assert_eq!(report.refresh, None);

        feed(&rx, "@end_game\r");
        let report = orch.step().unwrap();
        assert_eq!(report.refresh, None);
        let transmit = report.transmit.unwrap();
        assert_eq!(transmit.delivered, SLOT_COUNT);
        assert_eq!(transmit.failed, 0);
        assert!(orch.hardware().bus.writes.is_empty());

        let report = run_until_refresh(&mut orch);
        assert_eq!(report.refresh, Some(RefreshOutcome::Demo(DemoTick::Cleared)));
    }

    #[test]
    fn test_fault_from_buffer_error() {
        assert_eq!(Fault::from(BufferError::OffsetOutOfBounds), Fault::BufferOffset);
        assert_eq!(Fault::from(BufferError::Empty), Fault::BufferUnderflow);
    }
}
