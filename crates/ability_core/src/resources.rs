//! Per-actor cooldown timers and ultimate-charge accounting.
//!
//! State is keyed by canonical ability id and created lazily on first
//! touch, so entering the simulation is cheap and the tracker never holds
//! entries for abilities an actor never used.

use std::collections::{HashMap, VecDeque};

use data_runtime::ability::{AbilityKind, AbilitySpec};
use data_runtime::specdb::AbilityDb;

use crate::actor::ActorId;
use crate::error::AbilityError;

#[derive(Debug, Clone, Default)]
struct AbilityResource {
    /// Active: charges ready to spend.
    charges: u8,
    /// Refill timers for consumed charges, oldest first. Timers run
    /// concurrently and complete in FIFO order.
    refills: VecDeque<f32>,
    /// Ultimate meter, clamped to `charge_required`.
    charge: f32,
    /// Ultimate re-charge lockout after use; accrual is ignored while it
    /// runs.
    lockout_s: f32,
}

impl AbilityResource {
    fn fresh(spec: &AbilitySpec) -> Self {
        Self {
            charges: spec.max_charges,
            refills: VecDeque::new(),
            charge: 0.0,
            lockout_s: 0.0,
        }
    }

    fn accrue(&mut self, spec: &AbilitySpec, amount: f32) {
        if self.lockout_s > 0.0 {
            return;
        }
        self.charge = (self.charge + amount).min(spec.charge_required);
    }
}

#[derive(Default)]
pub struct ResourceTracker {
    actors: HashMap<ActorId, HashMap<String, AbilityResource>>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actor_enter(&mut self, actor: ActorId) {
        self.actors.entry(actor).or_default();
    }

    pub fn actor_leave(&mut self, actor: ActorId) {
        self.actors.remove(&actor);
    }

    pub fn contains(&self, actor: ActorId) -> bool {
        self.actors.contains_key(&actor)
    }

    fn res(&self, actor: ActorId, ability: &str) -> Option<&AbilityResource> {
        self.actors.get(&actor).and_then(|m| m.get(ability))
    }

    fn res_mut(&mut self, actor: ActorId, spec: &AbilitySpec) -> Option<&mut AbilityResource> {
        self.actors.get_mut(&actor).map(|m| {
            m.entry(spec.id.clone())
                .or_insert_with(|| AbilityResource::fresh(spec))
        })
    }

    /// Whether an activation would be allowed, with the failure reason kept.
    pub fn check_activate(&self, actor: ActorId, spec: &AbilitySpec) -> Result<(), AbilityError> {
        if !self.contains(actor) {
            return Err(AbilityError::NotFound);
        }
        match spec.kind {
            AbilityKind::Passive => Err(AbilityError::NotActivatable),
            AbilityKind::Active => {
                let charges = self
                    .res(actor, &spec.id)
                    .map(|r| r.charges)
                    .unwrap_or(spec.max_charges);
                if charges == 0 {
                    Err(AbilityError::OnCooldown)
                } else {
                    Ok(())
                }
            }
            AbilityKind::Ultimate => {
                let (charge, lockout) = self
                    .res(actor, &spec.id)
                    .map(|r| (r.charge, r.lockout_s))
                    .unwrap_or((0.0, 0.0));
                if lockout > 0.0 {
                    Err(AbilityError::OnCooldown)
                } else if charge < spec.charge_required {
                    Err(AbilityError::InsufficientCharge)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Consume the resource for a validated activation.
    pub fn on_activated(&mut self, actor: ActorId, spec: &AbilitySpec) {
        let cooldown = spec.cooldown_s;
        let kind = spec.kind;
        let Some(res) = self.res_mut(actor, spec) else {
            return;
        };
        match kind {
            AbilityKind::Passive => {}
            AbilityKind::Active => {
                res.charges = res.charges.saturating_sub(1);
                if cooldown > 0.0 {
                    res.refills.push_back(cooldown);
                } else {
                    res.charges = res.charges.saturating_add(1);
                }
            }
            AbilityKind::Ultimate => {
                res.charge = 0.0;
                res.lockout_s = cooldown;
            }
        }
    }

    /// Credit ultimate charge for damage dealt by `actor`.
    pub fn on_damage_dealt(&mut self, actor: ActorId, amount: f32, catalog: &AbilityDb) {
        self.accrue_ultimates(actor, catalog, |spec| amount * spec.charge_from_damage);
    }

    /// Credit ultimate charge for a kill by `actor`.
    pub fn on_kill(&mut self, actor: ActorId, catalog: &AbilityDb) {
        self.accrue_ultimates(actor, catalog, |spec| spec.charge_from_kills);
    }

    fn accrue_ultimates(
        &mut self,
        actor: ActorId,
        catalog: &AbilityDb,
        gain: impl Fn(&AbilitySpec) -> f32,
    ) {
        if !self.contains(actor) {
            log::debug!("charge credit for unknown actor {actor:?} dropped");
            return;
        }
        for id in catalog.ids() {
            let Some(spec) = catalog.get(id) else {
                continue;
            };
            if !matches!(spec.kind, AbilityKind::Ultimate) {
                continue;
            }
            let amount = gain(spec);
            if amount <= 0.0 {
                continue;
            }
            if let Some(res) = self.res_mut(actor, spec) {
                res.accrue(spec, amount);
            }
        }
    }

    /// Advance every cooldown, refill timer and passive regen by `dt`.
    pub fn tick(&mut self, dt: f32, catalog: &AbilityDb) {
        if dt <= 0.0 {
            return;
        }
        for by_ability in self.actors.values_mut() {
            for (id, res) in by_ability.iter_mut() {
                for t in res.refills.iter_mut() {
                    *t -= dt;
                }
                while res.refills.front().is_some_and(|t| *t <= 0.0) {
                    res.refills.pop_front();
                    res.charges = res.charges.saturating_add(1);
                }
                res.lockout_s = (res.lockout_s - dt).max(0.0);
                if let Some(spec) = catalog.get(id) {
                    res.charges = res.charges.min(spec.max_charges);
                }
            }
        }
        // Passive regen touches every registered actor, including abilities
        // with no state yet.
        let actors: Vec<ActorId> = self.actors.keys().copied().collect();
        for id in catalog.ids() {
            let Some(spec) = catalog.get(id) else {
                continue;
            };
            if !matches!(spec.kind, AbilityKind::Ultimate) || spec.charge_over_time_per_s <= 0.0 {
                continue;
            }
            for &actor in &actors {
                if let Some(res) = self.res_mut(actor, spec) {
                    res.accrue(spec, spec.charge_over_time_per_s * dt);
                }
            }
        }
    }

    /// HUD query: 0 when a charge is ready, else time until the next one.
    pub fn cooldown_remaining_s(&self, actor: ActorId, spec: &AbilitySpec) -> f32 {
        let Some(res) = self.res(actor, &spec.id) else {
            return 0.0;
        };
        match spec.kind {
            AbilityKind::Ultimate => res.lockout_s,
            _ => {
                if res.charges > 0 {
                    0.0
                } else {
                    res.refills.front().copied().unwrap_or(0.0).max(0.0)
                }
            }
        }
    }

    /// HUD query: ultimate meter as 0..=100; non-ultimates report 0.
    pub fn charge_percent(&self, actor: ActorId, spec: &AbilitySpec) -> f32 {
        if !matches!(spec.kind, AbilityKind::Ultimate) || spec.charge_required <= 0.0 {
            return 0.0;
        }
        let charge = self.res(actor, &spec.id).map(|r| r.charge).unwrap_or(0.0);
        (charge / spec.charge_required * 100.0).clamp(0.0, 100.0)
    }
}
