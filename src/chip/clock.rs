use std::time::Duration;

use crate::chip::chip8::constants::{
    CHIP8_DEFAULT_CYCLES_PER_SECOND, CHIP8_REFRESH_FREQUENCY, CHIP8_TIMER_FREQUENCY,
};

/// Backlog beyond this is dropped rather than caught up on, so that a host
/// which stalled (e.g. a suspended terminal) does not burst through thousands
/// of cycles afterwards.
const MAX_CATCH_UP: Duration = Duration::from_millis(250);

/// Number of cycles handed out per `advance` when the pace is unlimited.
const UNLIMITED_BATCH: u32 = 1024;

/// Highest frequency any of the clocks accepts.
pub const MAX_FREQUENCY: u32 = 1_000_000;

/// How fast instructions are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// At most this many cycles per second.
    Capped(u32),

    /// As fast as the host can go.
    Unlimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    pub pace: Pace,

    /// Ticks per second of the delay and sound timers.
    pub timer_hz: u32,

    /// Display refreshes per second.
    pub refresh_hz: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            pace: Pace::Capped(CHIP8_DEFAULT_CYCLES_PER_SECOND),
            timer_hz: CHIP8_TIMER_FREQUENCY,
            refresh_hz: CHIP8_REFRESH_FREQUENCY,
        }
    }
}

/// Work that became due during an `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ticks {
    /// Instruction cycles to run.
    pub cycles: u32,

    /// Timer ticks to apply.
    pub timer_ticks: u32,

    /// Whether the display should be sampled.
    pub refresh: bool,
}

/// Turns elapsed wall-clock time into cycles, timer ticks and display
/// refreshes. Each of the three clocks keeps its own accumulator, so the
/// timers run at their rate no matter how fast instructions execute.
#[derive(Debug, Clone)]
pub struct Clock {
    cycle_period: Option<Duration>,
    timer_period: Duration,
    refresh_period: Duration,
    cycle_elapsed: Duration,
    timer_elapsed: Duration,
    refresh_elapsed: Duration,
}

impl Clock {
    /// # Panics
    /// If any of the configured frequencies is zero or above `MAX_FREQUENCY`.
    pub fn new(config: ClockConfig) -> Self {
        let cycle_period = match config.pace {
            Pace::Capped(hz) => Some(period(hz, "cycle")),
            Pace::Unlimited => None,
        };

        Clock {
            cycle_period,
            timer_period: period(config.timer_hz, "timer"),
            refresh_period: period(config.refresh_hz, "refresh"),
            cycle_elapsed: Duration::ZERO,
            timer_elapsed: Duration::ZERO,
            refresh_elapsed: Duration::ZERO,
        }
    }

    /// Accounts for `elapsed` wall-clock time and returns what became due.
    pub fn advance(&mut self, elapsed: Duration) -> Ticks {
        let cycles = match self.cycle_period {
            Some(cycle_period) => drain(&mut self.cycle_elapsed, elapsed, cycle_period),
            None => UNLIMITED_BATCH,
        };
        let timer_ticks = drain(&mut self.timer_elapsed, elapsed, self.timer_period);
        let refresh = drain(&mut self.refresh_elapsed, elapsed, self.refresh_period) > 0;

        Ticks {
            cycles,
            timer_ticks,
            refresh,
        }
    }
}

fn period(hz: u32, clock: &str) -> Duration {
    assert!(
        (1..=MAX_FREQUENCY).contains(&hz),
        "{} frequency must be between 1 and {} Hz, got {}",
        clock,
        MAX_FREQUENCY,
        hz
    );
    Duration::from_secs(1) / hz
}

/// Adds `elapsed` to the accumulator and takes out as many whole periods as
/// fit. The backlog is capped, but never below one period, so slow clocks
/// still get to fire.
fn drain(accumulator: &mut Duration, elapsed: Duration, period: Duration) -> u32 {
    *accumulator = (*accumulator + elapsed).min(MAX_CATCH_UP.max(period));
    let count = (accumulator.as_nanos() / period.as_nanos()) as u32;
    *accumulator -= period * count;
    count
}
