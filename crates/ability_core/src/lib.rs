//! ability_core: ability activation, resource accounting and timed-effect
//! scheduling for the authoritative combat loop.
//!
//! Single-threaded and cooperative: every mutation happens inside
//! `activate`/`cancel`/`tick`, all driven from one simulation loop, so the
//! whole engine is deterministic and replay-safe given the same call
//! sequence and `dt` values. Collaborators (target snapshots, the
//! game-state applier, the notification sink) are called synchronously
//! through the `hooks` seams and must not re-enter the engine.

use glam::Vec3;

pub mod actor;
pub mod effect;
pub mod error;
pub mod hooks;
pub mod resources;
pub mod scheduler;
pub mod targeting;

pub use actor::{ActorId, TargetSnapshot, Team};
pub use effect::{EffectHandle, EffectId, EffectPhase, ResolvedEffect, StatusKind};
pub use error::AbilityError;
pub use hooks::{ApplyOutcome, EffectApplier, Hooks, NotificationSink, TargetProvider};

use data_runtime::ids::Id;
use data_runtime::specdb::AbilityDb;
use resources::ResourceTracker;
use scheduler::EffectScheduler;

/// The engine instance: owns the catalog, every actor's resource state and
/// the effect table. Everything else holds opaque handles.
pub struct Engine {
    catalog: AbilityDb,
    resources: ResourceTracker,
    scheduler: EffectScheduler,
}

impl Engine {
    pub fn new(catalog: AbilityDb) -> Self {
        Self {
            catalog,
            resources: ResourceTracker::new(),
            scheduler: EffectScheduler::new(),
        }
    }

    pub fn catalog(&self) -> &AbilityDb {
        &self.catalog
    }

    /// Create resource state for an actor entering the simulation.
    pub fn actor_enter(&mut self, actor: ActorId) {
        self.resources.actor_enter(actor);
    }

    /// Remove an actor: drops its resource state and cancels every effect
    /// it owns or is pinned by, with the usual cleanup notifications.
    pub fn actor_leave(&mut self, actor: ActorId, hooks: &mut Hooks) {
        self.scheduler.actor_leave(actor, hooks);
        self.resources.actor_leave(actor);
    }

    /// Validate, consume the resource, and register (or apply) the
    /// ability's effects. Returns the handle of the activation's root
    /// effect.
    pub fn activate(
        &mut self,
        actor: ActorId,
        ability: &str,
        origin: Vec3,
        dir: Option<Vec3>,
        hooks: &mut Hooks,
    ) -> Result<EffectHandle, AbilityError> {
        let spec = self
            .catalog
            .get(ability)
            .ok_or(AbilityError::NotFound)?
            .clone();
        if !self.resources.contains(actor) {
            return Err(AbilityError::NotFound);
        }
        let snap = hooks.targets.snapshot();
        let me = snap
            .iter()
            .find(|t| t.id == actor)
            .copied()
            .ok_or(AbilityError::ActorDead)?;
        if !me.alive {
            return Err(AbilityError::ActorDead);
        }
        self.resources.check_activate(actor, &spec)?;
        if spec.requires_target
            && !scheduler::any_area_target(&spec.effects, origin, actor, me.team, &snap)
        {
            return Err(AbilityError::NoValidTargets);
        }
        if spec.effects.is_empty() {
            return Err(AbilityError::NotActivatable);
        }
        self.resources.on_activated(actor, &spec);
        let dir = dir
            .map(Vec3::normalize_or_zero)
            .filter(|d| *d != Vec3::ZERO)
            .unwrap_or(Vec3::X);
        let handle = self.scheduler.activate_effects(
            actor,
            me.team,
            &Id(spec.id.clone()),
            &spec.effects,
            origin,
            dir,
            hooks,
        );
        if let Some(h) = handle {
            log::debug!("activated {} by {actor:?} -> {h:?}", spec.id);
        }
        handle.ok_or(AbilityError::NotActivatable)
    }

    /// Cancel a handle and everything it spawned. Idempotent: unknown,
    /// completed or already-cancelled handles are a no-op.
    pub fn cancel(&mut self, handle: EffectHandle, hooks: &mut Hooks) {
        self.scheduler.cancel(handle, hooks);
    }

    /// Advance the whole engine by one frame of `dt` seconds. Pausing the
    /// game is simply not calling this.
    pub fn tick(&mut self, dt: f32, hooks: &mut Hooks) {
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }
        self.resources.tick(dt, &self.catalog);
        self.scheduler.tick(dt, hooks);
    }

    /// Feed ultimate charge for damage dealt by `actor`.
    pub fn on_damage_dealt(&mut self, actor: ActorId, amount: f32) {
        self.resources.on_damage_dealt(actor, amount, &self.catalog);
    }

    /// Feed ultimate charge for a kill by `actor`.
    pub fn on_kill(&mut self, actor: ActorId) {
        self.resources.on_kill(actor, &self.catalog);
    }

    /// HUD query: seconds until `ability` is usable again (0 = ready).
    pub fn cooldown_remaining_s(&self, actor: ActorId, ability: &str) -> f32 {
        self.catalog
            .get(ability)
            .map(|spec| self.resources.cooldown_remaining_s(actor, spec))
            .unwrap_or(0.0)
    }

    /// HUD query: ultimate meter as 0..=100.
    pub fn charge_percent(&self, actor: ActorId, ability: &str) -> f32 {
        self.catalog
            .get(ability)
            .map(|spec| self.resources.charge_percent(actor, spec))
            .unwrap_or(0.0)
    }

    /// Phase of an in-flight handle; `None` once it has been swept.
    pub fn effect_phase(&self, handle: EffectHandle) -> Option<EffectPhase> {
        self.scheduler.phase(handle)
    }

    /// Ability an in-flight handle belongs to.
    pub fn effect_ability(&self, handle: EffectHandle) -> Option<&str> {
        self.scheduler.ability_of(handle)
    }

    /// Number of effects currently in flight.
    pub fn effects_in_flight(&self) -> usize {
        self.scheduler.in_flight()
    }
}
