//! Scheduled effect instances and the resolved payloads handed to the
//! applier.
//!
//! Entries live only in the scheduler's table and are referenced elsewhere
//! by `EffectHandle`; removal of an owner or target mid-effect can never
//! leave a dangling reference.

use data_runtime::ability::EffectSpec;
use data_runtime::ids::Id;
use glam::Vec3;

use crate::actor::{ActorId, Team};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(pub u32);

/// Opaque handle callers hold onto.
pub type EffectHandle = EffectId;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EffectPhase {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl EffectPhase {
    #[inline]
    pub fn terminal(self) -> bool {
        matches!(self, EffectPhase::Completed | EffectPhase::Cancelled)
    }
}

/// Timed status families the applier tracks on targets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Stunned,
    Shielded,
    SpeedBoost,
    Fortified,
    Wallhack,
    Revealed,
    Guarded,
}

/// One concrete application handed to the `EffectApplier`.
///
/// Durational statuses arrive as `Status` and are later removed with an
/// explicit `ClearStatus`; the applier never keeps time on its own.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedEffect {
    Damage { amount: f32 },
    Heal { amount: f32 },
    Status {
        kind: StatusKind,
        strength: f32,
        duration_s: f32,
    },
    ClearStatus { kind: StatusKind },
    Dash {
        dir: Vec3,
        distance: f32,
        speed: f32,
    },
    Teleport { to: Vec3 },
}

/// What one table entry is driving.
#[derive(Clone, Debug)]
pub enum EffectState {
    /// Root entry advancing one catalog `EffectSpec` (instant, delayed or
    /// periodic).
    Spec(EffectSpec),
    /// Durational status pinned to a single target, cleared exactly once on
    /// expiry or cancellation.
    Status {
        target: ActorId,
        kind: StatusKind,
        strength: f32,
        /// Replaced by a fresh application; skip the `ClearStatus` on the
        /// way out so the refresh isn't wiped.
        superseded: bool,
    },
}

/// A live effect instance, owned exclusively by the scheduler.
#[derive(Clone, Debug)]
pub struct ScheduledEffect {
    pub id: EffectId,
    pub owner: ActorId,
    /// Team captured at activation; used for every later resolution even if
    /// the owner is gone by then (e.g. an inbound airstrike).
    pub owner_team: Team,
    pub parent: Option<EffectId>,
    pub ability: Id,
    pub state: EffectState,
    /// Origin captured at activation. Candidate snapshots are always fresh;
    /// only the anchor point is frozen.
    pub origin: Vec3,
    pub dir: Vec3,
    pub phase: EffectPhase,
    /// Seconds spent in `Active`.
    pub elapsed_s: f32,
    /// Remaining pending delay.
    pub delay_s: f32,
    /// Remaining time until the next periodic fire; unused when aperiodic.
    pub period_s: f32,
    /// Total active duration; 0 for one-shot entries.
    pub duration_s: f32,
    /// Current members, for area effects that track who is inside.
    pub inside: Vec<ActorId>,
}

impl ScheduledEffect {
    /// Periodic fire interval, read off the driving spec.
    pub fn period_interval(&self) -> Option<f32> {
        match &self.state {
            EffectState::Spec(spec) => match *spec {
                EffectSpec::Heal { duration_s, .. } if duration_s > 0.0 => Some(1.0),
                EffectSpec::Turret { fire_period_s, .. } => Some(fire_period_s),
                EffectSpec::HealingField { .. } | EffectSpec::DomeShield { .. } => Some(1.0),
                EffectSpec::SupplyDrop { interval_s, .. } => Some(interval_s),
                _ => None,
            },
            EffectState::Status { .. } => None,
        }
    }

    /// Deployables and fields fold when their owner dies or leaves.
    pub fn requires_live_owner(&self) -> bool {
        matches!(
            &self.state,
            EffectState::Spec(
                EffectSpec::Turret { .. }
                    | EffectSpec::DomeShield { .. }
                    | EffectSpec::HealingField { .. }
                    | EffectSpec::SupplyDrop { .. }
            )
        )
    }
}
