//! EffectScheduler: the table of in-flight effects and the per-tick state
//! machine that advances them.
//!
//! Tick order: liveness checks, Pending delay expiries, Active periodic
//! fires, expiry transitions, terminal sweep. An entry can never be swept
//! and re-applied within the same tick. Terminal transitions go through
//! `finish`, which is the single place the cleanup notification fires.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use data_runtime::ability::EffectSpec;
use data_runtime::ids::Id;
use glam::Vec3;

use crate::actor::{ActorId, TargetSnapshot, Team};
use crate::effect::{
    EffectHandle, EffectId, EffectPhase, EffectState, ResolvedEffect, ScheduledEffect, StatusKind,
};
use crate::hooks::{ApplyOutcome, Hooks};
use crate::targeting::{Affinity, Shape, resolve, resolve_capped};

/// A collaborator callback panicked while this effect was applying.
struct Panicked;

fn snapshot_guarded(hooks: &Hooks) -> Vec<TargetSnapshot> {
    match catch_unwind(AssertUnwindSafe(|| hooks.targets.snapshot())) {
        Ok(snap) => snap,
        Err(_) => {
            log::warn!("target provider panicked; resolving against an empty snapshot");
            Vec::new()
        }
    }
}

fn apply_guarded(
    hooks: &mut Hooks,
    target: ActorId,
    fx: &ResolvedEffect,
) -> Result<ApplyOutcome, Panicked> {
    match catch_unwind(AssertUnwindSafe(|| hooks.applier.apply(target, fx))) {
        Ok(outcome) => Ok(outcome),
        Err(_) => {
            log::warn!("effect applier panicked on {target:?}; cancelling the offending effect");
            Err(Panicked)
        }
    }
}

fn notify_guarded(hooks: &mut Hooks, handle: EffectHandle, phase: EffectPhase) {
    if catch_unwind(AssertUnwindSafe(|| {
        hooks.notify.effect_lifecycle(handle, phase);
    }))
    .is_err()
    {
        log::warn!("notification sink panicked for {handle:?}");
    }
}

/// True when at least one area effect of this list would currently land on
/// somebody other than the owner. Used for `requires_target` abilities.
pub(crate) fn any_area_target(
    effects: &[EffectSpec],
    origin: Vec3,
    owner: ActorId,
    owner_team: Team,
    snap: &[TargetSnapshot],
) -> bool {
    effects.iter().any(|fx| {
        let (radius, affinity) = match *fx {
            EffectSpec::Damage { radius, .. }
            | EffectSpec::Stun { radius, .. }
            | EffectSpec::Scan { radius, .. }
            | EffectSpec::Airstrike { radius, .. } => (radius, Affinity::Hostile),
            EffectSpec::Heal { radius, .. } | EffectSpec::Shield { radius, .. } if radius > 0.0 => {
                (radius, Affinity::Allied)
            }
            _ => return false,
        };
        resolve(origin, Shape::Sphere { radius }, owner_team, affinity, snap)
            .iter()
            .any(|id| *id != owner)
    })
}

/// Initial schedule derived from a spec.
enum Schedule {
    /// Applies once during activation, then completes.
    Instant,
    /// Waits out `delay_s`, then applies/arms.
    Delayed { delay_s: f32 },
    /// Active window of `duration_s` with a periodic cycle of `interval_s`.
    Durational { duration_s: f32, interval_s: f32 },
}

fn schedule_of(spec: &EffectSpec) -> Schedule {
    match *spec {
        EffectSpec::Airstrike { delay_s, .. } if delay_s > 0.0 => Schedule::Delayed { delay_s },
        EffectSpec::SupplyDrop { delay_s, .. } if delay_s > 0.0 => Schedule::Delayed { delay_s },
        EffectSpec::SupplyDrop {
            duration_s,
            interval_s,
            ..
        } => Schedule::Durational {
            duration_s,
            interval_s,
        },
        EffectSpec::Heal { duration_s, .. } if duration_s > 0.0 => Schedule::Durational {
            duration_s,
            interval_s: 1.0,
        },
        EffectSpec::Turret {
            duration_s,
            fire_period_s,
            ..
        } => Schedule::Durational {
            duration_s,
            interval_s: fire_period_s,
        },
        EffectSpec::HealingField { duration_s, .. } | EffectSpec::DomeShield { duration_s, .. } => {
            Schedule::Durational {
                duration_s,
                interval_s: 1.0,
            }
        }
        EffectSpec::Damage { .. }
        | EffectSpec::Stun { .. }
        | EffectSpec::Heal { .. }
        | EffectSpec::Shield { .. }
        | EffectSpec::SpeedBoost { .. }
        | EffectSpec::Dash { .. }
        | EffectSpec::Teleport { .. }
        | EffectSpec::Wallhack { .. }
        | EffectSpec::Scan { .. }
        | EffectSpec::Airstrike { .. }
        | EffectSpec::Fortify { .. } => Schedule::Instant,
    }
}

#[derive(Default)]
pub struct EffectScheduler {
    next_id: u32,
    /// Insertion-ordered; iteration stays deterministic.
    entries: Vec<ScheduledEffect>,
    /// Live durational status per (target, kind), for refresh policies.
    statuses: HashMap<(ActorId, StatusKind), EffectId>,
}

impl EffectScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(&mut self) -> EffectId {
        let id = EffectId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn index_of(&self, id: EffectId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Phase of a handle still in the table (terminal entries linger until
    /// the end-of-tick sweep).
    pub fn phase(&self, handle: EffectHandle) -> Option<EffectPhase> {
        self.entries
            .iter()
            .find(|e| e.id == handle)
            .map(|e| e.phase)
    }

    /// Number of non-terminal entries in flight.
    pub fn in_flight(&self) -> usize {
        self.entries.iter().filter(|e| !e.phase.terminal()).count()
    }

    /// Ability that spawned a handle, for HUD/debug surfaces.
    pub fn ability_of(&self, handle: EffectHandle) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.id == handle)
            .map(|e| e.ability.as_str())
    }

    /// Register (and for instants, apply) every effect of one activation.
    /// The first entry's id is the activation's handle; the rest cascade
    /// from it on cancellation.
    pub fn activate_effects(
        &mut self,
        owner: ActorId,
        owner_team: Team,
        ability: &Id,
        effects: &[EffectSpec],
        origin: Vec3,
        dir: Vec3,
        hooks: &mut Hooks,
    ) -> Option<EffectHandle> {
        let mut root: Option<EffectId> = None;
        for spec in effects {
            let id = self.spawn_spec(owner, owner_team, ability, spec.clone(), origin, dir, root, hooks);
            root = root.or(Some(id));
        }
        self.sweep();
        root
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_spec(
        &mut self,
        owner: ActorId,
        owner_team: Team,
        ability: &Id,
        spec: EffectSpec,
        origin: Vec3,
        dir: Vec3,
        parent: Option<EffectId>,
        hooks: &mut Hooks,
    ) -> EffectId {
        let id = self.alloc_id();
        let (phase, delay_s, duration_s, period_s) = match schedule_of(&spec) {
            Schedule::Instant => (EffectPhase::Active, 0.0, 0.0, 0.0),
            Schedule::Delayed { delay_s } => (EffectPhase::Pending, delay_s, 0.0, 0.0),
            Schedule::Durational {
                duration_s,
                interval_s,
            } => (EffectPhase::Active, 0.0, duration_s, interval_s),
        };
        let instant = matches!(schedule_of(&spec), Schedule::Instant);
        self.entries.push(ScheduledEffect {
            id,
            owner,
            owner_team,
            parent,
            ability: Id(ability.0.clone()),
            state: EffectState::Spec(spec),
            origin,
            dir,
            phase,
            elapsed_s: 0.0,
            delay_s,
            period_s,
            duration_s,
            inside: Vec::new(),
        });
        notify_guarded(hooks, id, phase);
        if instant {
            let idx = self.entries.len() - 1;
            match self.fire_spec(idx, hooks) {
                Ok(()) => self.finish(idx, EffectPhase::Completed, hooks),
                Err(Panicked) => self.finish(idx, EffectPhase::Cancelled, hooks),
            }
        }
        id
    }

    /// One-shot application of an entry's spec: activation time for
    /// instants, delay expiry for an airstrike.
    fn fire_spec(&mut self, idx: usize, hooks: &mut Hooks) -> Result<(), Panicked> {
        let entry = &self.entries[idx];
        let (owner, owner_team, origin, dir) = (
            entry.owner,
            entry.owner_team,
            entry.origin,
            entry.dir,
        );
        // Holds always hang off the activation root so cascade cancellation
        // still reaches them after intermediate entries are swept.
        let link = entry.parent.unwrap_or(entry.id);
        let ability = entry.ability.clone();
        let EffectState::Spec(spec) = entry.state.clone() else {
            return Ok(());
        };
        let snap = snapshot_guarded(hooks);
        match spec {
            EffectSpec::Damage { amount, radius }
            | EffectSpec::Airstrike { amount, radius, .. } => {
                for target in resolve(
                    origin,
                    Shape::Sphere { radius },
                    owner_team,
                    Affinity::Hostile,
                    &snap,
                ) {
                    apply_guarded(hooks, target, &ResolvedEffect::Damage { amount })?;
                }
            }
            EffectSpec::Stun { radius, duration_s } => {
                for target in resolve(
                    origin,
                    Shape::Sphere { radius },
                    owner_team,
                    Affinity::Hostile,
                    &snap,
                ) {
                    self.spawn_status(
                        owner, owner_team, &ability, link, target,
                        StatusKind::Stunned, 0.0, duration_s, hooks,
                    )?;
                }
            }
            EffectSpec::Heal { amount, radius, duration_s } if duration_s == 0.0 => {
                for target in allied_or_self(origin, radius, owner, owner_team, &snap) {
                    apply_guarded(hooks, target, &ResolvedEffect::Heal { amount })?;
                }
            }
            EffectSpec::Shield {
                health,
                duration_s,
                radius,
            } => {
                for target in allied_or_self(origin, radius, owner, owner_team, &snap) {
                    self.spawn_status(
                        owner, owner_team, &ability, link, target,
                        StatusKind::Shielded, health, duration_s, hooks,
                    )?;
                }
            }
            EffectSpec::Scan {
                radius,
                reveal_duration_s,
            } => {
                for target in resolve(
                    origin,
                    Shape::Sphere { radius },
                    owner_team,
                    Affinity::Hostile,
                    &snap,
                ) {
                    self.spawn_status(
                        owner, owner_team, &ability, link, target,
                        StatusKind::Revealed, 0.0, reveal_duration_s, hooks,
                    )?;
                }
            }
            EffectSpec::SpeedBoost {
                multiplier,
                duration_s,
            } => {
                self.spawn_status(
                    owner, owner_team, &ability, link, owner,
                    StatusKind::SpeedBoost, multiplier, duration_s, hooks,
                )?;
            }
            EffectSpec::Fortify {
                multiplier,
                duration_s,
            } => {
                self.spawn_status(
                    owner, owner_team, &ability, link, owner,
                    StatusKind::Fortified, multiplier, duration_s, hooks,
                )?;
            }
            EffectSpec::Wallhack { duration_s } => {
                self.spawn_status(
                    owner, owner_team, &ability, link, owner,
                    StatusKind::Wallhack, 0.0, duration_s, hooks,
                )?;
            }
            EffectSpec::Dash { distance, speed } => {
                apply_guarded(
                    hooks,
                    owner,
                    &ResolvedEffect::Dash {
                        dir,
                        distance,
                        speed,
                    },
                )?;
            }
            EffectSpec::Teleport { range } => {
                apply_guarded(
                    hooks,
                    owner,
                    &ResolvedEffect::Teleport {
                        to: origin + dir * range,
                    },
                )?;
            }
            // Durational drivers apply through their periodic cycle.
            EffectSpec::Heal { .. }
            | EffectSpec::Turret { .. }
            | EffectSpec::DomeShield { .. }
            | EffectSpec::HealingField { .. }
            | EffectSpec::SupplyDrop { .. } => {}
        }
        Ok(())
    }

    /// One periodic cycle of an Active entry, re-resolving on a fresh
    /// snapshot.
    fn fire_periodic(&mut self, idx: usize, hooks: &mut Hooks) -> Result<(), Panicked> {
        let entry = &self.entries[idx];
        let (origin, owner_team, remaining) = (
            entry.origin,
            entry.owner_team,
            entry.duration_s - entry.elapsed_s,
        );
        let owner = entry.owner;
        let EffectState::Spec(spec) = entry.state.clone() else {
            return Ok(());
        };
        let snap = snapshot_guarded(hooks);
        match spec {
            EffectSpec::Heal {
                amount,
                radius,
                duration_s,
            } if duration_s > 0.0 => {
                let per_pulse = amount / duration_s;
                for target in allied_or_self(origin, radius, owner, owner_team, &snap) {
                    apply_guarded(hooks, target, &ResolvedEffect::Heal { amount: per_pulse })?;
                }
            }
            EffectSpec::Turret {
                range,
                damage_per_shot,
                ..
            } => {
                for target in resolve_capped(
                    origin,
                    Shape::Sphere { radius: range },
                    owner_team,
                    Affinity::Hostile,
                    &snap,
                    1,
                ) {
                    apply_guarded(
                        hooks,
                        target,
                        &ResolvedEffect::Damage {
                            amount: damage_per_shot,
                        },
                    )?;
                }
            }
            EffectSpec::HealingField {
                radius,
                heal_per_second,
                ..
            } => {
                for target in resolve(
                    origin,
                    Shape::Sphere { radius },
                    owner_team,
                    Affinity::Allied,
                    &snap,
                ) {
                    apply_guarded(
                        hooks,
                        target,
                        &ResolvedEffect::Heal {
                            amount: heal_per_second,
                        },
                    )?;
                }
            }
            EffectSpec::SupplyDrop {
                radius,
                heal_per_interval,
                ..
            } => {
                for target in resolve(
                    origin,
                    Shape::Sphere { radius },
                    owner_team,
                    Affinity::Allied,
                    &snap,
                ) {
                    apply_guarded(
                        hooks,
                        target,
                        &ResolvedEffect::Heal {
                            amount: heal_per_interval,
                        },
                    )?;
                }
            }
            EffectSpec::DomeShield { radius, .. } => {
                let now = resolve(
                    origin,
                    Shape::Sphere { radius },
                    owner_team,
                    Affinity::Allied,
                    &snap,
                );
                let before = self.entries[idx].inside.clone();
                for target in now.iter().filter(|t| !before.contains(t)) {
                    apply_guarded(
                        hooks,
                        *target,
                        &ResolvedEffect::Status {
                            kind: StatusKind::Guarded,
                            strength: 0.0,
                            duration_s: remaining,
                        },
                    )?;
                }
                for target in before.iter().filter(|t| !now.contains(t)) {
                    apply_guarded(
                        hooks,
                        *target,
                        &ResolvedEffect::ClearStatus {
                            kind: StatusKind::Guarded,
                        },
                    )?;
                }
                self.entries[idx].inside = now;
            }
            // Aperiodic kinds never reach the periodic cycle.
            EffectSpec::Damage { .. }
            | EffectSpec::Stun { .. }
            | EffectSpec::Heal { .. }
            | EffectSpec::Shield { .. }
            | EffectSpec::SpeedBoost { .. }
            | EffectSpec::Dash { .. }
            | EffectSpec::Teleport { .. }
            | EffectSpec::Wallhack { .. }
            | EffectSpec::Scan { .. }
            | EffectSpec::Airstrike { .. }
            | EffectSpec::Fortify { .. } => {}
        }
        Ok(())
    }

    /// Apply a durational status to one target and pin it to its own table
    /// entry so the matching `ClearStatus` fires exactly once.
    #[allow(clippy::too_many_arguments)]
    fn spawn_status(
        &mut self,
        owner: ActorId,
        owner_team: Team,
        ability: &Id,
        parent: EffectId,
        target: ActorId,
        kind: StatusKind,
        strength: f32,
        duration_s: f32,
        hooks: &mut Hooks,
    ) -> Result<Option<EffectId>, Panicked> {
        if let Some(&old_id) = self.statuses.get(&(target, kind)) {
            let old_strength = self
                .index_of(old_id)
                .and_then(|i| match self.entries[i].state {
                    EffectState::Status { strength, .. } => Some(strength),
                    _ => None,
                })
                .unwrap_or(0.0);
            let highest_wins = matches!(kind, StatusKind::SpeedBoost | StatusKind::Fortified);
            if highest_wins && strength < old_strength {
                // Weaker modifier loses outright; the stronger one keeps
                // running untouched.
                return Ok(None);
            }
            self.supersede(old_id, hooks);
        }
        match apply_guarded(
            hooks,
            target,
            &ResolvedEffect::Status {
                kind,
                strength,
                duration_s,
            },
        )? {
            ApplyOutcome::TargetGone => return Ok(None),
            ApplyOutcome::Applied => {}
        }
        let id = self.alloc_id();
        self.entries.push(ScheduledEffect {
            id,
            owner,
            owner_team,
            parent: Some(parent),
            ability: Id(ability.0.clone()),
            state: EffectState::Status {
                target,
                kind,
                strength,
                superseded: false,
            },
            origin: Vec3::ZERO,
            dir: Vec3::ZERO,
            phase: EffectPhase::Active,
            elapsed_s: 0.0,
            delay_s: 0.0,
            period_s: 0.0,
            duration_s,
            inside: Vec::new(),
        });
        self.statuses.insert((target, kind), id);
        notify_guarded(hooks, id, EffectPhase::Active);
        Ok(Some(id))
    }

    /// Retire a status entry that a fresh application replaces. The
    /// replacement re-applies immediately, so no `ClearStatus` is emitted.
    fn supersede(&mut self, id: EffectId, hooks: &mut Hooks) {
        if let Some(idx) = self.index_of(id) {
            if let EffectState::Status { superseded, .. } = &mut self.entries[idx].state {
                *superseded = true;
            }
            self.finish(idx, EffectPhase::Cancelled, hooks);
        }
    }

    /// The only place terminal transitions happen: cleanup side effects,
    /// then exactly one lifecycle notification. Idempotent.
    fn finish(&mut self, idx: usize, phase: EffectPhase, hooks: &mut Hooks) {
        if self.entries[idx].phase.terminal() {
            return;
        }
        let id = self.entries[idx].id;
        match self.entries[idx].state.clone() {
            EffectState::Status {
                target,
                kind,
                superseded,
                ..
            } => {
                if self.statuses.get(&(target, kind)) == Some(&id) {
                    self.statuses.remove(&(target, kind));
                }
                if !superseded {
                    let _ = apply_guarded(
                        hooks,
                        target,
                        &ResolvedEffect::ClearStatus { kind },
                    );
                }
            }
            EffectState::Spec(EffectSpec::DomeShield { .. }) => {
                for target in self.entries[idx].inside.clone() {
                    let _ = apply_guarded(
                        hooks,
                        target,
                        &ResolvedEffect::ClearStatus {
                            kind: StatusKind::Guarded,
                        },
                    );
                }
                self.entries[idx].inside.clear();
            }
            EffectState::Spec(_) => {}
        }
        self.entries[idx].phase = phase;
        notify_guarded(hooks, id, phase);
    }

    /// Cancel a handle and everything it spawned. Idempotent; unknown or
    /// already-terminal handles are a no-op.
    pub fn cancel(&mut self, handle: EffectHandle, hooks: &mut Hooks) {
        let mut stack = vec![handle];
        while let Some(id) = stack.pop() {
            for e in &self.entries {
                if e.parent == Some(id) && !e.phase.terminal() {
                    stack.push(e.id);
                }
            }
            if let Some(idx) = self.index_of(id) {
                self.finish(idx, EffectPhase::Cancelled, hooks);
            }
        }
    }

    /// Cancel everything an actor owns or is the pinned target of. Called
    /// when the actor leaves the simulation.
    pub fn actor_leave(&mut self, actor: ActorId, hooks: &mut Hooks) {
        let owned: Vec<EffectId> = self
            .entries
            .iter()
            .filter(|e| !e.phase.terminal())
            .filter(|e| {
                e.owner == actor
                    || matches!(e.state, EffectState::Status { target, .. } if target == actor)
            })
            .map(|e| e.id)
            .collect();
        for id in owned {
            self.cancel(id, hooks);
        }
        self.sweep();
    }

    /// Advance every entry by `dt`.
    pub fn tick(&mut self, dt: f32, hooks: &mut Hooks) {
        let snap = snapshot_guarded(hooks);

        // Liveness first: deployables fold with their owner, pinned
        // statuses with their target.
        let ids: Vec<EffectId> = self
            .entries
            .iter()
            .filter(|e| !e.phase.terminal())
            .map(|e| e.id)
            .collect();
        for &id in &ids {
            let Some(idx) = self.index_of(id) else { continue };
            if self.entries[idx].phase.terminal() {
                continue;
            }
            let gone = match &self.entries[idx].state {
                EffectState::Status { target, .. } => !alive_in(&snap, *target),
                EffectState::Spec(_) => {
                    self.entries[idx].requires_live_owner()
                        && !alive_in(&snap, self.entries[idx].owner)
                }
            };
            if gone {
                self.finish(idx, EffectPhase::Cancelled, hooks);
            }
        }

        // Pending delay expiries, before any periodic work.
        let mut just_armed: Vec<EffectId> = Vec::new();
        for &id in &ids {
            let Some(idx) = self.index_of(id) else { continue };
            if self.entries[idx].phase != EffectPhase::Pending {
                continue;
            }
            self.entries[idx].delay_s -= dt;
            if self.entries[idx].delay_s > 0.0 {
                continue;
            }
            match &self.entries[idx].state {
                EffectState::Spec(EffectSpec::SupplyDrop {
                    duration_s,
                    interval_s,
                    ..
                }) => {
                    let duration_s = *duration_s;
                    let interval_s = *interval_s;
                    self.entries[idx].duration_s = duration_s;
                    self.entries[idx].period_s = interval_s;
                    self.entries[idx].phase = EffectPhase::Active;
                    notify_guarded(hooks, id, EffectPhase::Active);
                    just_armed.push(id);
                }
                _ => {
                    // One-shot delayed application (airstrike landing).
                    match self.fire_spec(idx, hooks) {
                        Ok(()) => self.finish(idx, EffectPhase::Completed, hooks),
                        Err(Panicked) => self.finish(idx, EffectPhase::Cancelled, hooks),
                    }
                }
            }
        }

        // Active windows: periodic fires, then expiry.
        for &id in &ids {
            let Some(idx) = self.index_of(id) else { continue };
            if self.entries[idx].phase != EffectPhase::Active || just_armed.contains(&id) {
                continue;
            }
            self.entries[idx].elapsed_s += dt;
            if let Some(interval) = self.entries[idx].period_interval() {
                self.entries[idx].period_s -= dt;
                while !self.entries[idx].phase.terminal() && self.entries[idx].period_s <= 0.0 {
                    self.entries[idx].period_s += interval;
                    if self.fire_periodic(idx, hooks).is_err() {
                        self.finish(idx, EffectPhase::Cancelled, hooks);
                    }
                }
            }
            if !self.entries[idx].phase.terminal()
                && self.entries[idx].duration_s > 0.0
                && self.entries[idx].elapsed_s >= self.entries[idx].duration_s
            {
                self.finish(idx, EffectPhase::Completed, hooks);
            }
        }

        self.sweep();
    }

    fn sweep(&mut self) {
        self.entries.retain(|e| !e.phase.terminal());
    }
}

fn alive_in(snap: &[TargetSnapshot], id: ActorId) -> bool {
    snap.iter().any(|t| t.id == id && t.alive)
}

/// Allied resolution, or just the caster when the effect has no area.
fn allied_or_self(
    origin: Vec3,
    radius: f32,
    owner: ActorId,
    owner_team: Team,
    snap: &[TargetSnapshot],
) -> Vec<ActorId> {
    if radius > 0.0 {
        resolve(
            origin,
            Shape::Sphere { radius },
            owner_team,
            Affinity::Allied,
            snap,
        )
    } else if alive_in(snap, owner) {
        vec![owner]
    } else {
        Vec::new()
    }
}
