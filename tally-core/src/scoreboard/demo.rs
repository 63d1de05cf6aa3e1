//! Demo simulation
//!
//! Stands in for real consoles when none are attached. Every slot gets a
//! synthesized game on the first tick after demo mode is enabled; later
//! ticks move those games along at random. Turning demo mode off wipes
//! the slots on the next tick so the next scan starts clean.

use tally_protocol::{
    CauseOfDeath, DeviceCommand, DeviceState, DeviceStats, Difficulty, GameStatus, GridSize,
};

use super::state::{AggregatorState, SLOT_COUNT};
use crate::traits::FreeRunningCounter;

/// Fixed-point probability `num / den`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Probability {
    pub num: u32,
    pub den: u32,
}

impl Probability {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }
}

/// A running snake eats an apple this tick
pub const SCORE_GAIN: Probability = Probability::new(35, 50);
/// A running game ends this tick
pub const GAME_OVER: Probability = Probability::new(1, 20);
/// A finished game is restarted this tick
pub const RESTART: Probability = Probability::new(7, 20);
/// A poisoned game loses points this tick
pub const POISON_SCORE_LOSS: Probability = Probability::new(7, 20);
/// A death is a wall hit rather than a self collision
pub const WALL_DEATH: Probability = Probability::new(35, 50);
/// A synthesized game has two players
pub const TWO_PLAYERS: Probability = Probability::new(1, 4);
/// A synthesized game has poisoned food
pub const POISON_ENABLED: Probability = Probability::new(1, 3);

/// Points per apple, multiplied by the level
const POINTS_PER_APPLE: u16 = 10;
/// Points lost to a poisoned apple
const POISON_PENALTY: u16 = 5;
/// Fastest speed a console reports
const MAX_SPEED: u8 = 60;
const MIN_SYNTH_SPEED: u32 = 10;
const MAX_LEVEL: u8 = 4;

/// Linear congruential generator (Numerical Recipes constants)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    const MULTIPLIER: u32 = 1_664_525;
    const INCREMENT: u32 = 1_013_904_223;

    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Fold fresh entropy into the state
    pub fn reseed(&mut self, salt: u32) {
        self.state ^= salt;
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        self.state
    }

    /// Uniform value in `0..bound`; a zero bound behaves as one
    pub fn below(&mut self, bound: u32) -> u32 {
        // High bits of an LCG are the well-mixed ones
        (self.next_u32() >> 8) % bound.max(1)
    }

    /// Uniform value in `lo..=hi`
    pub fn between(&mut self, lo: u32, hi: u32) -> u32 {
        lo + self.below(hi - lo + 1)
    }

    pub fn chance(&mut self, p: Probability) -> bool {
        self.below(p.den) < p.num
    }
}

/// What a demo tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DemoTick {
    /// Demo mode is off and nothing was left to clear
    Idle,
    /// Every slot received a synthesized game
    Initialized,
    /// Games advanced; carries the number of games that ended this tick
    Advanced { finished: usize },
    /// Demo mode was turned off; all slots were wiped
    Cleared,
}

/// Simulated consoles
#[derive(Debug, Clone)]
pub struct DemoSimulator {
    rng: Lcg,
}

impl DemoSimulator {
    pub const fn new(seed: u32) -> Self {
        Self {
            rng: Lcg::new(seed),
        }
    }

    /// Run one periodic tick
    pub fn tick<C: FreeRunningCounter>(
        &mut self,
        state: &mut AggregatorState,
        counter: &C,
    ) -> DemoTick {
        self.rng.reseed(counter.now());

        match (state.demo_mode, state.demo_initialized) {
            (true, false) => {
                self.init(state);
                DemoTick::Initialized
            }
            (true, true) => DemoTick::Advanced {
                finished: self.advance(state),
            },
            (false, true) => {
                state.clear_all_slots();
                state.demo_initialized = false;
                DemoTick::Cleared
            }
            (false, false) => DemoTick::Idle,
        }
    }

    /// Synthesize a game and records for every slot
    fn init(&mut self, state: &mut AggregatorState) {
        for index in 0..SLOT_COUNT {
            let slot = &mut state.slots[index];
            slot.device_id = index as u8 + 1;
            slot.is_active = true;
            slot.is_connected = true;

            state.states[index] = self.synthesize_game(slot.device_id);
            state.stats[index] = self.synthesize_stats();
        }
        state.demo_initialized = true;
    }

    /// Move every game one tick forward; returns the number of games that ended
    fn advance(&mut self, state: &mut AggregatorState) -> usize {
        let mut finished = 0;

        for index in 0..SLOT_COUNT {
            if !state.slots[index].is_active {
                continue;
            }
            let game = &mut state.states[index];
            match game.status {
                GameStatus::Running => {
                    self.play(game);
                    if self.rng.chance(GAME_OVER) {
                        self.finish(game, &mut state.stats[index]);
                        finished += 1;
                    }
                }
                GameStatus::Over => {
                    if self.rng.chance(RESTART) {
                        *game = self.synthesize_game(game.console_id);
                    }
                }
                GameStatus::Stopped | GameStatus::Paused => {}
            }
        }

        finished
    }

    fn play(&mut self, game: &mut DeviceState) {
        game.playing_time = game.playing_time.saturating_add(1);
        let points = POINTS_PER_APPLE * game.level.max(1) as u16;

        if self.rng.chance(SCORE_GAIN) {
            game.apples1 = game.apples1.saturating_add(1);
            game.score1 = game.score1.saturating_add(points);
        }
        if game.two_players && self.rng.chance(SCORE_GAIN) {
            game.apples2 = game.apples2.saturating_add(1);
            game.score2 = game.score2.saturating_add(points);
        }
        if game.poison && self.rng.chance(POISON_SCORE_LOSS) {
            game.score1 = game.score1.saturating_sub(POISON_PENALTY);
        }
        game.high_score = game.high_score.max(game.score1).max(game.score2);
    }

    /// End a game and fold its result into the records
    fn finish(&mut self, game: &mut DeviceState, stats: &mut DeviceStats) {
        game.status = GameStatus::Over;
        game.cause_of_death = if self.rng.chance(WALL_DEATH) {
            CauseOfDeath::Wall
        } else {
            CauseOfDeath::SelfCollision
        };

        let record = stats.record_mut(game.difficulty);
        record.apples = record.apples.max(game.apples1.max(game.apples2));
        record.high_score = record.high_score.max(game.score1.max(game.score2));
    }

    fn synthesize_game(&mut self, console_id: u8) -> DeviceState {
        let difficulty = Difficulty::ALL[self.rng.below(Difficulty::ALL.len() as u32) as usize];
        let grid_size = match self.rng.below(3) {
            0 => GridSize::Small,
            1 => GridSize::Wide,
            _ => GridSize::Large,
        };
        let level = self.rng.between(1, MAX_LEVEL as u32) as u8;
        let two_players = self.rng.chance(TWO_PLAYERS);

        let apples1 = self.rng.below(20) as u16;
        let apples2 = if two_players {
            self.rng.below(20) as u16
        } else {
            0
        };
        let points = POINTS_PER_APPLE * level as u16;
        let score1 = apples1 * points;
        let score2 = apples2 * points;

        DeviceState {
            console_id,
            clock_sync: true,
            difficulty,
            status: GameStatus::Running,
            level,
            two_players,
            poison: self.rng.chance(POISON_ENABLED),
            speed: self.rng.between(MIN_SYNTH_SPEED, MAX_SPEED as u32) as u8,
            cause_of_death: CauseOfDeath::None,
            grid_size,
            score1,
            score2,
            apples1,
            apples2,
            high_score: score1.max(score2),
            playing_time: self.rng.below(120) as u16,
        }
    }

    fn synthesize_stats(&mut self) -> DeviceStats {
        let mut stats = DeviceStats::default();
        for record in stats.records.iter_mut() {
            record.apples = self.rng.between(1, 60) as u16;
            record.high_score = self.rng.between(100, 2000) as u16;
            for letter in record.initials.iter_mut() {
                *letter = b'A' + self.rng.below(26) as u8;
            }
        }
        stats
    }

    /// Apply a console command to the simulated slots
    pub fn apply(&mut self, state: &mut AggregatorState, command: DeviceCommand) {
        if let DeviceCommand::RandomSeed(seed) = command {
            self.rng = Lcg::new(seed as u32);
            return;
        }

        for (slot, game) in state.slots.iter().zip(state.states.iter_mut()) {
            if !slot.is_active {
                continue;
            }
            match command {
                DeviceCommand::SetSpeed(speed) => game.speed = speed.min(MAX_SPEED),
                DeviceCommand::SetLevel(level) => game.level = level,
                DeviceCommand::SetPoison(poison) => game.poison = poison,
                DeviceCommand::PrepareGame { level, poison } => {
                    *game = DeviceState {
                        console_id: game.console_id,
                        clock_sync: game.clock_sync,
                        difficulty: game.difficulty,
                        grid_size: game.grid_size,
                        two_players: game.two_players,
                        speed: game.speed,
                        high_score: game.high_score,
                        // Prepared levels count from zero
                        level: level + 1,
                        poison,
                        status: GameStatus::Stopped,
                        ..DeviceState::default()
                    };
                }
                DeviceCommand::StartGame { speed } => {
                    if speed > 0 {
                        game.speed = speed.min(MAX_SPEED);
                    }
                    game.status = GameStatus::Running;
                }
                DeviceCommand::PauseGame => {
                    game.status = match game.status {
                        GameStatus::Running => GameStatus::Paused,
                        GameStatus::Paused => GameStatus::Running,
                        other => other,
                    };
                }
                DeviceCommand::EndGame => {
                    if matches!(game.status, GameStatus::Running | GameStatus::Paused) {
                        game.status = GameStatus::Over;
                    }
                }
                DeviceCommand::RandomSeed(_) | DeviceCommand::TournamentEnd => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use proptest::prelude::*;

    /// Mock counter for testing
    struct MockCounter {
        value: Cell<u32>,
    }

    impl MockCounter {
        fn new() -> Self {
            Self {
                value: Cell::new(0x1234),
            }
        }
    }

    impl FreeRunningCounter for MockCounter {
        fn now(&self) -> u32 {
            let v = self.value.get();
            self.value.set(v.wrapping_add(7919));
            v
        }
    }

    fn demo_state() -> AggregatorState {
        let mut state = AggregatorState::default();
        state.demo_mode = true;
        state
    }

    #[test]
    fn test_lcg_sequence() {
        let mut rng = Lcg::new(0);
        assert_eq!(rng.next_u32(), 1_013_904_223);
        assert_eq!(rng.next_u32(), 1_196_435_762);
    }

    #[test]
    fn test_init_fills_every_slot() {
        let mut sim = DemoSimulator::new(1);
        let counter = MockCounter::new();
        let mut state = demo_state();

        assert_eq!(sim.tick(&mut state, &counter), DemoTick::Initialized);
        assert!(state.demo_initialized);
        for i in 0..SLOT_COUNT {
            assert!(state.slots[i].is_active);
            assert!(state.slots[i].is_connected);
            assert_eq!(state.states[i].console_id, i as u8 + 1);
            assert_eq!(state.states[i].status, GameStatus::Running);
            assert!(state.states[i].level >= 1);
            assert!(state.stats[i].records.iter().all(|r| r.high_score >= 100));
            assert!(state.stats[i].records[0]
                .initials
                .iter()
                .all(|c| c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_repeated_enable_does_not_resynthesize() {
        let mut sim = DemoSimulator::new(1);
        let counter = MockCounter::new();
        let mut state = demo_state();

        sim.tick(&mut state, &counter);
        let initials = state.stats[2].records[1].initials;

        // `@demo on` again while already on
        state.demo_mode = true;
        let tick = sim.tick(&mut state, &counter);
        assert!(matches!(tick, DemoTick::Advanced { .. }));
        assert_eq!(state.stats[2].records[1].initials, initials);
    }

    #[test]
    fn test_disable_clears_on_next_tick() {
        let mut sim = DemoSimulator::new(9);
        let counter = MockCounter::new();
        let mut state = demo_state();

        sim.tick(&mut state, &counter);
        state.demo_mode = false;
        assert_eq!(sim.tick(&mut state, &counter), DemoTick::Cleared);
        assert!(!state.demo_initialized);
        assert_eq!(state.active_count(), 0);
        assert!(state.states.iter().all(|s| *s == DeviceState::default()));

        assert_eq!(sim.tick(&mut state, &counter), DemoTick::Idle);
    }

    #[test]
    fn test_apply_commands() {
        let mut sim = DemoSimulator::new(3);
        let counter = MockCounter::new();
        let mut state = demo_state();
        sim.tick(&mut state, &counter);

        sim.apply(&mut state, DeviceCommand::PrepareGame { level: 2, poison: true });
        for s in &state.states {
            assert_eq!(s.status, GameStatus::Stopped);
            assert_eq!(s.level, 3);
            assert!(s.poison);
            assert_eq!(s.score1, 0);
        }

        sim.apply(&mut state, DeviceCommand::StartGame { speed: 90 });
        assert!(state.states.iter().all(|s| s.status == GameStatus::Running));
        assert!(state.states.iter().all(|s| s.speed == MAX_SPEED));

        sim.apply(&mut state, DeviceCommand::PauseGame);
        assert!(state.states.iter().all(|s| s.status == GameStatus::Paused));

        sim.apply(&mut state, DeviceCommand::EndGame);
        assert!(state.states.iter().all(|s| s.status == GameStatus::Over));
    }

    #[test]
    fn test_games_eventually_finish() {
        let mut sim = DemoSimulator::new(42);
        let counter = MockCounter::new();
        let mut state = demo_state();
        sim.tick(&mut state, &counter);

        let mut finished = 0;
        for _ in 0..1000 {
            if let DemoTick::Advanced { finished: n } = sim.tick(&mut state, &counter) {
                finished += n;
            }
        }
        assert!(finished > 0);
    }

    proptest! {
        #[test]
        fn prop_chance_bounds(seed: u32) {
            let mut rng = Lcg::new(seed);
            prop_assert!(!rng.chance(Probability::new(0, 10)));
            prop_assert!(rng.chance(Probability::new(10, 10)));
            let v = rng.between(10, 60);
            prop_assert!((10..=60).contains(&v));
        }

        #[test]
        fn prop_records_never_shrink(seed: u32, ticks in 1usize..200) {
            let mut sim = DemoSimulator::new(seed);
            let counter = MockCounter::new();
            let mut state = demo_state();
            sim.tick(&mut state, &counter);
            let before = state.stats;

            for _ in 0..ticks {
                sim.tick(&mut state, &counter);
            }
            for i in 0..SLOT_COUNT {
                for d in 0..4 {
                    prop_assert!(state.stats[i].records[d].high_score >= before[i].records[d].high_score);
                    prop_assert_eq!(state.stats[i].records[d].initials, before[i].records[d].initials);
                }
            }
        }
    }
}
