//! Shared scenario harness: a scripted snapshot world, a recording applier
//! and a lifecycle recorder.
#![allow(dead_code, clippy::unwrap_used)]

use ability_core::{
    ActorId, ApplyOutcome, EffectApplier, EffectHandle, EffectPhase, Engine, Hooks,
    NotificationSink, ResolvedEffect, TargetProvider, TargetSnapshot, Team,
};
use data_runtime::ability::{AbilityKind, AbilitySpec, EffectSpec};
use data_runtime::specdb::AbilityDb;
use glam::Vec3;

pub struct World {
    pub snaps: Vec<TargetSnapshot>,
}

impl World {
    pub fn new(snaps: Vec<TargetSnapshot>) -> Self {
        Self { snaps }
    }

    pub fn move_to(&mut self, id: ActorId, pos: Vec3) {
        if let Some(s) = self.snaps.iter_mut().find(|s| s.id == id) {
            s.pos = pos;
        }
    }

    pub fn kill(&mut self, id: ActorId) {
        if let Some(s) = self.snaps.iter_mut().find(|s| s.id == id) {
            s.alive = false;
        }
    }

    pub fn remove(&mut self, id: ActorId) {
        self.snaps.retain(|s| s.id != id);
    }
}

impl TargetProvider for World {
    fn snapshot(&self) -> Vec<TargetSnapshot> {
        self.snaps.clone()
    }
}

#[derive(Default)]
pub struct Recorder {
    pub applied: Vec<(ActorId, ResolvedEffect)>,
}

impl Recorder {
    pub fn damage_to(&self, id: ActorId) -> Vec<f32> {
        self.applied
            .iter()
            .filter_map(|(t, fx)| match fx {
                ResolvedEffect::Damage { amount } if *t == id => Some(*amount),
                _ => None,
            })
            .collect()
    }

    pub fn heals_to(&self, id: ActorId) -> Vec<f32> {
        self.applied
            .iter()
            .filter_map(|(t, fx)| match fx {
                ResolvedEffect::Heal { amount } if *t == id => Some(*amount),
                _ => None,
            })
            .collect()
    }

    pub fn statuses_to(&self, id: ActorId) -> Vec<&ResolvedEffect> {
        self.applied
            .iter()
            .filter(|(t, fx)| {
                *t == id
                    && matches!(
                        fx,
                        ResolvedEffect::Status { .. } | ResolvedEffect::ClearStatus { .. }
                    )
            })
            .map(|(_, fx)| fx)
            .collect()
    }
}

impl EffectApplier for Recorder {
    fn apply(&mut self, target: ActorId, fx: &ResolvedEffect) -> ApplyOutcome {
        self.applied.push((target, fx.clone()));
        ApplyOutcome::Applied
    }
}

#[derive(Default)]
pub struct Events {
    pub seen: Vec<(EffectHandle, EffectPhase)>,
}

impl Events {
    /// Terminal (cleanup) notifications recorded for one handle.
    pub fn cleanups_for(&self, handle: EffectHandle) -> usize {
        self.seen
            .iter()
            .filter(|(h, p)| *h == handle && p.terminal())
            .count()
    }
}

impl NotificationSink for Events {
    fn effect_lifecycle(&mut self, handle: EffectHandle, phase: EffectPhase) {
        self.seen.push((handle, phase));
    }
}

pub fn snap(id: u32, team: u8, pos: Vec3) -> TargetSnapshot {
    TargetSnapshot {
        id: ActorId(id),
        team: Team(team),
        pos,
        alive: true,
    }
}

pub fn mk_ability(id: &str, kind: AbilityKind, effects: Vec<EffectSpec>) -> AbilitySpec {
    AbilitySpec {
        id: id.into(),
        name: id.into(),
        kind,
        cooldown_s: 0.0,
        max_charges: 1,
        charge_required: 0.0,
        charge_from_damage: 0.0,
        charge_from_kills: 0.0,
        charge_over_time_per_s: 0.0,
        requires_target: false,
        effects,
    }
}

pub fn mk_engine(specs: Vec<AbilitySpec>) -> Engine {
    Engine::new(AbilityDb::from_specs(specs).unwrap())
}

/// Step the engine `steps` times at 1s per tick.
pub fn run_seconds(
    engine: &mut Engine,
    world: &World,
    rec: &mut Recorder,
    ev: &mut Events,
    steps: u32,
) {
    for _ in 0..steps {
        engine.tick(
            1.0,
            &mut Hooks {
                targets: world,
                applier: rec,
                notify: ev,
            },
        );
    }
}
