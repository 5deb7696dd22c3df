//! Host-side behaviour for hostile actors.
//!
//! A taunted hostile closes on whoever taunted it and strikes on a timer.
//! Walk speed follows the hostile's `movement_speed` modifier and the strike
//! interval follows its `attack_speed`. Untaunted hostiles stand still.

use std::time::Duration;

use ember_core::{EntityId, GameTime, Side};
use ember_movement::MovementBody;
use rustc_hash::FxHashMap;

use crate::arena::ArenaWorld;
use crate::world::CombatWorld;

/// Walk speed in m/s at `movement_speed` 1.0.
pub const WALK_SPEED: f32 = 3.0;
pub const STRIKE_RANGE: f32 = 1.5;
pub const STRIKE_DAMAGE: f32 = 6.0;
/// Time between strikes at `attack_speed` 1.0.
pub const STRIKE_INTERVAL: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Idle,
    Chase,
    Strike,
    Recover,
}

/// What a hostile does this tick, given the distance to its forced target.
pub fn decide(distance: Option<f32>, strike_ready: bool) -> Behavior {
    match distance {
        None => Behavior::Idle,
        Some(d) if d > STRIKE_RANGE => Behavior::Chase,
        Some(_) if strike_ready => Behavior::Strike,
        Some(_) => Behavior::Recover,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    pub attacker: EntityId,
    pub target: EntityId,
    pub dealt: f32,
}

/// What one [`HostileBrain::tick`] changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostileReport {
    pub moved: Vec<EntityId>,
    pub strikes: Vec<Strike>,
}

impl HostileReport {
    pub fn is_empty(&self) -> bool {
        self.moved.is_empty() && self.strikes.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct HostileBrain {
    last_strike: FxHashMap<EntityId, GameTime>,
}

impl HostileBrain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every live hostile once, in id order.
    pub fn tick(&mut self, world: &mut ArenaWorld, dt: Duration, now: GameTime) -> HostileReport {
        let mut report = HostileReport::default();
        for id in world.ids() {
            if world.side(id) != Some(Side::Hostile) || !world.is_alive(id) {
                continue;
            }
            let Some(mods) = world.modifiers(id, now) else {
                continue;
            };
            let Some(target) = mods.taunted_by.filter(|t| world.is_alive(*t)) else {
                continue;
            };
            let (Some(from), Some(goal)) = (world.position(id), world.position(target)) else {
                continue;
            };
            let offset = goal - from;
            let distance = offset.length();
            let interval = strike_interval(mods.attack_speed);
            let ready = self
                .last_strike
                .get(&id)
                .is_none_or(|last| now.saturating_since(*last) >= interval);

            match decide(Some(distance), ready) {
                Behavior::Chase => {
                    // A movement sequence owns the body while input is off.
                    let free = MovementBody::movement_state(&*world, id)
                        .is_some_and(|state| state.input_enabled);
                    let stride = (WALK_SPEED * mods.movement_speed * dt.as_secs_f32())
                        .min(distance - STRIKE_RANGE);
                    if free && stride > 0.0 {
                        let heading = offset / distance;
                        world.set_position(id, from + heading * stride);
                        world.set_facing(id, heading);
                        report.moved.push(id);
                    }
                }
                Behavior::Strike => {
                    let dealt = world.apply_damage(id, target, STRIKE_DAMAGE, now);
                    self.last_strike.insert(id, now);
                    tracing::debug!(attacker = %id, %target, dealt, "hostile strike");
                    report.strikes.push(Strike {
                        attacker: id,
                        target,
                        dealt,
                    });
                }
                Behavior::Recover | Behavior::Idle => {}
            }
        }
        self.last_strike.retain(|id, _| world.contains(*id));
        report
    }
}

fn strike_interval(attack_speed: f32) -> Duration {
    STRIKE_INTERVAL.div_f32(attack_speed.max(0.1))
}
