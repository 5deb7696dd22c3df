//! Authoritative simulation clock.
//!
//! [`GameTime`] is an integer microsecond timestamp on the host's
//! simulation clock. Cooldown arithmetic is done in integers so that a skill
//! becomes ready on exactly the tick where `now - last == cooldown`.
//! [`TickSchedule`] turns elapsed wall time into whole fixed-rate ticks.

use std::ops::Add;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default simulation tick rate in Hz.
pub const DEFAULT_TICK_RATE: u32 = 60;

// ---------------------------------------------------------------------------
// GameTime
// ---------------------------------------------------------------------------

/// A point on the simulation clock, in microseconds since the host started.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GameTime(pub u64);

impl GameTime {
    /// The clock origin.
    pub const ZERO: GameTime = GameTime(0);

    /// Builds a timestamp from whole seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1_000_000))
    }

    /// Builds a timestamp from fractional seconds (negative values clamp to zero).
    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs.max(0.0) * 1_000_000.0).round() as u64)
    }

    /// Builds a timestamp from milliseconds.
    pub fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000))
    }

    /// Microseconds since the clock origin.
    pub fn as_micros(self) -> u64 {
        self.0
    }

    /// Seconds since the clock origin.
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Time elapsed since `earlier`, or zero if `earlier` is in the future.
    pub fn saturating_since(self, earlier: GameTime) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for GameTime {
    type Output = GameTime;

    fn add(self, rhs: Duration) -> GameTime {
        let micros = u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX);
        GameTime(self.0.saturating_add(micros))
    }
}

// ---------------------------------------------------------------------------
// TickSchedule
// ---------------------------------------------------------------------------

/// Fixed-rate tick scheduler for the simulation loop.
///
/// Accumulates real elapsed time and yields discrete ticks. Every session
/// derives its [`GameTime`] from the tick counter so that all sessions agree
/// on the time of a given tick.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    accumulator: Duration,
    tick_duration: Duration,
    total_ticks: u64,
}

impl TickSchedule {
    /// Creates a schedule at the default 60 Hz tick rate.
    pub fn new() -> Self {
        Self::with_tick_rate(DEFAULT_TICK_RATE)
    }

    /// Creates a schedule with a custom tick rate (clamped to at least 1 Hz).
    pub fn with_tick_rate(hz: u32) -> Self {
        Self {
            accumulator: Duration::ZERO,
            tick_duration: Duration::from_micros(1_000_000 / u64::from(hz.max(1))),
            total_ticks: 0,
        }
    }

    /// Accumulates elapsed time and returns the number of ticks to process.
    pub fn accumulate(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;
        let mut ticks = 0u32;
        while self.accumulator >= self.tick_duration {
            self.accumulator -= self.tick_duration;
            self.total_ticks += 1;
            ticks += 1;
        }
        ticks
    }

    /// Advances exactly one tick, ignoring the accumulator.
    pub fn step(&mut self) -> GameTime {
        self.total_ticks += 1;
        self.now()
    }

    /// Total ticks processed since creation.
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Duration of a single tick.
    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Simulation time of the current tick.
    pub fn now(&self) -> GameTime {
        self.time_of_tick(self.total_ticks)
    }

    /// Simulation time of tick `tick`.
    pub fn time_of_tick(&self, tick: u64) -> GameTime {
        let per_tick = u64::try_from(self.tick_duration.as_micros()).unwrap_or(u64::MAX);
        GameTime(tick.saturating_mul(per_tick))
    }
}

impl Default for TickSchedule {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_since_is_exact() {
        let last = GameTime::from_secs(10);
        let now = GameTime::from_secs(15);
        assert_eq!(now.saturating_since(last), Duration::from_secs(5));
        assert_eq!(last.saturating_since(now), Duration::ZERO);
    }

    #[test]
    fn test_add_duration() {
        let t = GameTime::from_millis(1500) + Duration::from_millis(250);
        assert_eq!(t, GameTime::from_millis(1750));
        assert!((t.as_secs_f64() - 1.75).abs() < 1e-9);
    }

    #[test]
    fn test_from_secs_f64_clamps_negative() {
        assert_eq!(GameTime::from_secs_f64(-3.0), GameTime::ZERO);
        assert_eq!(GameTime::from_secs_f64(0.5), GameTime(500_000));
    }

    #[test]
    fn test_tick_schedule_accumulates() {
        let mut schedule = TickSchedule::with_tick_rate(50);
        assert_eq!(schedule.tick_duration(), Duration::from_millis(20));

        assert_eq!(schedule.accumulate(Duration::from_millis(10)), 0);
        assert_eq!(schedule.accumulate(Duration::from_millis(15)), 1);
        assert_eq!(schedule.accumulate(Duration::from_millis(40)), 2);
        assert_eq!(schedule.total_ticks(), 3);
        assert_eq!(schedule.now(), GameTime::from_millis(60));
    }

    #[test]
    fn test_tick_schedule_step() {
        let mut schedule = TickSchedule::with_tick_rate(10);
        assert_eq!(schedule.step(), GameTime::from_millis(100));
        assert_eq!(schedule.step(), GameTime::from_millis(200));
        assert_eq!(schedule.time_of_tick(50), GameTime::from_secs(5));
    }
}
