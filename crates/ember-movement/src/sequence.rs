//! Bounded interpolation as plain data.

use std::time::Duration;

use ember_core::EntityId;
use glam::Vec3;

/// Easing curves for sequence interpolation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    /// Constant speed.
    Linear,
    /// Fast start, slow end.
    #[default]
    EaseOut,
}

impl Easing {
    /// Map linear progress (0.0..=1.0) to eased progress.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

/// Where a sequence is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencePhase {
    NotStarted,
    Running { elapsed: Duration },
    Done,
}

/// A dash/roll from `from` to `to` over `duration`.
#[derive(Clone, Debug, PartialEq)]
pub struct MovementSequence {
    pub entity: EntityId,
    pub from: Vec3,
    pub to: Vec3,
    pub duration: Duration,
    pub easing: Easing,
    phase: SequencePhase,
}

impl MovementSequence {
    pub fn new(entity: EntityId, from: Vec3, to: Vec3, duration: Duration) -> Self {
        Self {
            entity,
            from,
            to,
            duration,
            easing: Easing::default(),
            phase: SequencePhase::NotStarted,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn phase(&self) -> SequencePhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == SequencePhase::Done
    }

    /// Linear progress in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        match self.phase {
            SequencePhase::NotStarted => 0.0,
            SequencePhase::Running { elapsed } => {
                if self.duration.is_zero() {
                    1.0
                } else {
                    (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
                }
            }
            SequencePhase::Done => 1.0,
        }
    }

    /// Interpolated position at the current phase.
    pub fn position(&self) -> Vec3 {
        self.from.lerp(self.to, self.easing.apply(self.progress()))
    }

    /// Advances by one tick and returns the new position. Reaching the
    /// duration moves the sequence to `Done` and yields exactly `to`.
    pub fn advance(&mut self, dt: Duration) -> Vec3 {
        let elapsed = match self.phase {
            SequencePhase::NotStarted => dt,
            SequencePhase::Running { elapsed } => elapsed + dt,
            SequencePhase::Done => return self.to,
        };
        if elapsed >= self.duration {
            self.phase = SequencePhase::Done;
            return self.to;
        }
        self.phase = SequencePhase::Running { elapsed };
        self.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dash() -> MovementSequence {
        MovementSequence::new(
            EntityId(1),
            Vec3::ZERO,
            Vec3::new(10.0, 0.0, 0.0),
            Duration::from_millis(100),
        )
    }

    #[test]
    fn test_phases_advance_to_done() {
        let mut seq = dash();
        assert_eq!(seq.phase(), SequencePhase::NotStarted);
        seq.advance(Duration::from_millis(40));
        assert_eq!(
            seq.phase(),
            SequencePhase::Running {
                elapsed: Duration::from_millis(40)
            }
        );
        seq.advance(Duration::from_millis(40));
        let end = seq.advance(Duration::from_millis(40));
        assert!(seq.is_done());
        assert_eq!(end, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_ease_out_front_loads_motion() {
        let mut seq = dash();
        let halfway = seq.advance(Duration::from_millis(50));
        assert!(halfway.x > 5.0 && halfway.x < 10.0);

        let mut linear = dash().with_easing(Easing::Linear);
        let halfway = linear.advance(Duration::from_millis(50));
        assert!((halfway.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_duration_finishes_on_first_tick() {
        let mut seq = MovementSequence::new(EntityId(1), Vec3::ZERO, Vec3::Y, Duration::ZERO);
        assert_eq!(seq.advance(Duration::from_millis(16)), Vec3::Y);
        assert!(seq.is_done());
    }

    #[test]
    fn test_positions_monotonic() {
        let mut seq = dash();
        let mut last = 0.0;
        while !seq.is_done() {
            let x = seq.advance(Duration::from_millis(7)).x;
            assert!(x >= last);
            last = x;
        }
        assert_eq!(last, 10.0);
    }
}
