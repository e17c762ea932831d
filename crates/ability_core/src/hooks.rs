//! Collaborator seams the engine calls outward on.
//!
//! All three are invoked synchronously from `activate`/`cancel`/`tick` and
//! must not re-enter the engine during the call.

use crate::actor::{ActorId, TargetSnapshot};
use crate::effect::{EffectHandle, EffectPhase, ResolvedEffect};

/// Source of fresh combat-entity snapshots.
pub trait TargetProvider {
    fn snapshot(&self) -> Vec<TargetSnapshot>;
}

/// Outcome of handing one resolved effect to the game-state sink.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The target no longer exists; the engine treats this single
    /// application as a no-op and moves on.
    TargetGone,
}

/// Game-state sink that mutates health/status on a target.
pub trait EffectApplier {
    fn apply(&mut self, target: ActorId, effect: &ResolvedEffect) -> ApplyOutcome;
}

/// Rendering/audio hook. Called, never awaited; correctness never depends
/// on what it does.
pub trait NotificationSink {
    fn effect_lifecycle(&mut self, handle: EffectHandle, phase: EffectPhase);
}

/// Collaborator borrows threaded through one engine call.
pub struct Hooks<'a> {
    pub targets: &'a dyn TargetProvider,
    pub applier: &'a mut dyn EffectApplier,
    pub notify: &'a mut dyn NotificationSink,
}
