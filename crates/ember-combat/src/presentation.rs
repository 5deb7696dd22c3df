//! Interface to the rendering/animation collaborator.
//!
//! Predict and replay phases only ever talk to a [`Presentation`]; they never
//! see render primitives.

use ember_core::EntityId;
use glam::Vec3;

/// Cosmetic output of predict and replay phases.
pub trait Presentation {
    /// Play animation state `name` on `entity`.
    fn play_animation(&mut self, entity: EntityId, name: &str);

    /// Spawn visual effect `name` at a pose. `scale` is ability-specific
    /// (area radius, heal size).
    fn spawn_effect(&mut self, name: &str, position: Vec3, facing: Vec3, scale: f32);

    /// Local-only feedback for the owning player ("not ready", "wrong class").
    fn local_message(&mut self, entity: EntityId, text: &str);
}

/// Discards everything. Used by the host when it runs headless.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresentation;

impl Presentation for NullPresentation {
    fn play_animation(&mut self, _entity: EntityId, _name: &str) {}

    fn spawn_effect(&mut self, _name: &str, _position: Vec3, _facing: Vec3, _scale: f32) {}

    fn local_message(&mut self, _entity: EntityId, _text: &str) {}
}

// ---------------------------------------------------------------------------
// PresentationLog
// ---------------------------------------------------------------------------

/// One recorded presentation call.
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationEvent {
    Animation {
        entity: EntityId,
        name: String,
    },
    Effect {
        name: String,
        position: Vec3,
        facing: Vec3,
        scale: f32,
    },
    Message {
        entity: EntityId,
        text: String,
    },
}

/// Records every call, in order. The simulation binary and tests inspect it.
#[derive(Debug, Clone, Default)]
pub struct PresentationLog {
    events: Vec<PresentationEvent>,
}

impl PresentationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[PresentationEvent] {
        &self.events
    }

    /// Drains the recorded events.
    pub fn take(&mut self) -> Vec<PresentationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of effects named `name`.
    pub fn effect_count(&self, name: &str) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, PresentationEvent::Effect { name: n, .. } if n == name))
            .count()
    }

    /// Number of times `name` was played on `entity`.
    pub fn animation_count(&self, entity: EntityId, name: &str) -> usize {
        self.events
            .iter()
            .filter(|e| {
                matches!(e, PresentationEvent::Animation { entity: who, name: n } if *who == entity && n == name)
            })
            .count()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            PresentationEvent::Message { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Presentation for PresentationLog {
    fn play_animation(&mut self, entity: EntityId, name: &str) {
        self.events.push(PresentationEvent::Animation {
            entity,
            name: name.to_owned(),
        });
    }

    fn spawn_effect(&mut self, name: &str, position: Vec3, facing: Vec3, scale: f32) {
        self.events.push(PresentationEvent::Effect {
            name: name.to_owned(),
            position,
            facing,
            scale,
        });
    }

    fn local_message(&mut self, entity: EntityId, text: &str) {
        self.events.push(PresentationEvent::Message {
            entity,
            text: text.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_records_in_order() {
        let mut log = PresentationLog::new();
        log.play_animation(EntityId(1), "swing");
        log.spawn_effect("slash", Vec3::ZERO, Vec3::Z, 1.0);
        log.spawn_effect("slash", Vec3::X, Vec3::Z, 1.0);
        log.local_message(EntityId(1), "not ready");

        assert_eq!(log.events().len(), 4);
        assert_eq!(log.effect_count("slash"), 2);
        assert_eq!(log.animation_count(EntityId(1), "swing"), 1);
        assert_eq!(log.messages().collect::<Vec<_>>(), vec!["not ready"]);
        assert_eq!(log.take().len(), 4);
        assert!(log.events().is_empty());
    }
}
