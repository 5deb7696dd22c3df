//! Built-in abilities.

mod charge;
mod cleave;
mod dash;
mod lance;
mod provoke;
mod rally;
mod sanctuary;
mod shockwave;

use ember_core::SkillId;

pub use charge::ChargeExecutor;
pub use cleave::CleaveExecutor;
pub use dash::DashExecutor;
pub use lance::LanceExecutor;
pub use provoke::ProvokeExecutor;
pub use rally::RallyExecutor;
pub use sanctuary::SanctuaryExecutor;
pub use shockwave::ShockwaveExecutor;

use crate::ExecutorRegistry;

pub const CLEAVE: SkillId = SkillId(1);
pub const DASH: SkillId = SkillId(2);
pub const EVASIVE_ROLL: SkillId = SkillId(3);
pub const CHARGE: SkillId = SkillId(4);
pub const RALLYING_CRY: SkillId = SkillId(5);
pub const PROVOKE: SkillId = SkillId(6);
pub const SHOCKWAVE: SkillId = SkillId(7);
pub const SANCTUARY: SkillId = SkillId(8);
pub const PIERCING_LANCE: SkillId = SkillId(9);
/// Passive; has no executor.
pub const IRON_SKIN: SkillId = SkillId(10);

/// Gap kept between a dashing body and the obstacle that stops it.
pub(crate) const DASH_SKIN: f32 = 0.5;

pub(crate) fn register_standard(registry: &mut ExecutorRegistry) {
    registry.register(CLEAVE, Box::new(CleaveExecutor));
    registry.register(DASH, Box::new(DashExecutor::dash()));
    registry.register(EVASIVE_ROLL, Box::new(DashExecutor::roll()));
    registry.register(CHARGE, Box::new(ChargeExecutor));
    registry.register(RALLYING_CRY, Box::new(RallyExecutor));
    registry.register(PROVOKE, Box::new(ProvokeExecutor));
    registry.register(SHOCKWAVE, Box::new(ShockwaveExecutor));
    registry.register(SANCTUARY, Box::new(SanctuaryExecutor));
    registry.register(PIERCING_LANCE, Box::new(LanceExecutor));
}

/// Duration in whole milliseconds, saturating.
pub(crate) fn millis_u32(duration: std::time::Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
