//! Ability and effect schemas.
//!
//! An `AbilitySpec` is immutable once loaded; the engine clones effect specs
//! into scheduled instances and never writes back. Effects are a closed
//! tagged enum so every resolution site can match exhaustively.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    Passive,
    Active,
    Ultimate,
}

/// One concrete game-state change an ability can cause.
///
/// Durations and delays are in seconds; radii and distances in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectSpec {
    /// Flat damage to every hostile inside `radius`, no falloff.
    Damage { amount: f32, radius: f32 },
    /// Timed stun on every hostile inside `radius`. Re-application refreshes
    /// the remaining duration; it never stacks.
    Stun { radius: f32, duration_s: f32 },
    /// `duration_s == 0.0` heals once; otherwise the amount is split into
    /// one sub-heal per second over the duration.
    Heal {
        amount: f32,
        radius: f32,
        #[serde(default)]
        duration_s: f32,
    },
    /// Absorption pool consumed before health, expiring even if unconsumed.
    /// `radius == 0.0` shields the caster only.
    Shield {
        health: f32,
        duration_s: f32,
        #[serde(default)]
        radius: f32,
    },
    /// Multiplicative move-speed modifier on the caster; highest active
    /// multiplier wins.
    SpeedBoost { multiplier: f32, duration_s: f32 },
    /// Burst of movement along the aim direction.
    Dash { distance: f32, speed: f32 },
    /// Instant relocation `range` meters along the aim direction.
    Teleport { range: f32 },
    /// Caster sees hostiles through geometry for the duration.
    Wallhack { duration_s: f32 },
    /// Marks every hostile inside `radius` as revealed for a while.
    Scan { radius: f32, reveal_duration_s: f32 },
    /// Warning window of `delay_s`, then one damage application over
    /// `radius` against whoever is in the zone when it lands.
    Airstrike {
        delay_s: f32,
        radius: f32,
        amount: f32,
    },
    /// Deployable that fires at the nearest in-range hostile every
    /// `fire_period_s` until its duration elapses or its owner is gone.
    Turret {
        duration_s: f32,
        range: f32,
        fire_period_s: f32,
        damage_per_shot: f32,
    },
    /// Area dome; allies currently inside are guarded, and lose the guard
    /// the moment they step out or the dome ends.
    DomeShield { radius: f32, duration_s: f32 },
    /// Heals whoever is inside the area on each one-second pulse.
    HealingField {
        radius: f32,
        heal_per_second: f32,
        duration_s: f32,
    },
    /// Falls for `delay_s`, then periodically resupplies allies in `radius`.
    SupplyDrop {
        delay_s: f32,
        duration_s: f32,
        radius: f32,
        heal_per_interval: f32,
        interval_s: f32,
    },
    /// Multiplicative damage-resistance modifier on the caster; highest
    /// active multiplier wins.
    Fortify { multiplier: f32, duration_s: f32 },
}

impl EffectSpec {
    /// Schema checks the loader runs once per catalog entry.
    pub fn validate(&self) -> Result<()> {
        match *self {
            EffectSpec::Damage { amount, radius } => {
                non_negative("damage.amount", amount)?;
                non_negative("damage.radius", radius)
            }
            EffectSpec::Stun { radius, duration_s } => {
                non_negative("stun.radius", radius)?;
                positive("stun.duration_s", duration_s)
            }
            EffectSpec::Heal {
                amount,
                radius,
                duration_s,
            } => {
                non_negative("heal.amount", amount)?;
                non_negative("heal.radius", radius)?;
                non_negative("heal.duration_s", duration_s)
            }
            EffectSpec::Shield {
                health,
                duration_s,
                radius,
            } => {
                positive("shield.health", health)?;
                positive("shield.duration_s", duration_s)?;
                non_negative("shield.radius", radius)
            }
            EffectSpec::SpeedBoost {
                multiplier,
                duration_s,
            } => {
                positive("speed_boost.multiplier", multiplier)?;
                positive("speed_boost.duration_s", duration_s)
            }
            EffectSpec::Dash { distance, speed } => {
                positive("dash.distance", distance)?;
                positive("dash.speed", speed)
            }
            EffectSpec::Teleport { range } => positive("teleport.range", range),
            EffectSpec::Wallhack { duration_s } => positive("wallhack.duration_s", duration_s),
            EffectSpec::Scan {
                radius,
                reveal_duration_s,
            } => {
                positive("scan.radius", radius)?;
                positive("scan.reveal_duration_s", reveal_duration_s)
            }
            EffectSpec::Airstrike {
                delay_s,
                radius,
                amount,
            } => {
                non_negative("airstrike.delay_s", delay_s)?;
                positive("airstrike.radius", radius)?;
                non_negative("airstrike.amount", amount)
            }
            EffectSpec::Turret {
                duration_s,
                range,
                fire_period_s,
                damage_per_shot,
            } => {
                positive("turret.duration_s", duration_s)?;
                positive("turret.range", range)?;
                positive("turret.fire_period_s", fire_period_s)?;
                non_negative("turret.damage_per_shot", damage_per_shot)
            }
            EffectSpec::DomeShield { radius, duration_s } => {
                positive("dome_shield.radius", radius)?;
                positive("dome_shield.duration_s", duration_s)
            }
            EffectSpec::HealingField {
                radius,
                heal_per_second,
                duration_s,
            } => {
                positive("healing_field.radius", radius)?;
                non_negative("healing_field.heal_per_second", heal_per_second)?;
                positive("healing_field.duration_s", duration_s)
            }
            EffectSpec::SupplyDrop {
                delay_s,
                duration_s,
                radius,
                heal_per_interval,
                interval_s,
            } => {
                non_negative("supply_drop.delay_s", delay_s)?;
                positive("supply_drop.duration_s", duration_s)?;
                positive("supply_drop.radius", radius)?;
                non_negative("supply_drop.heal_per_interval", heal_per_interval)?;
                positive("supply_drop.interval_s", interval_s)
            }
            EffectSpec::Fortify {
                multiplier,
                duration_s,
            } => {
                positive("fortify.multiplier", multiplier)?;
                positive("fortify.duration_s", duration_s)
            }
        }
    }
}

fn non_negative(field: &str, v: f32) -> Result<()> {
    if !v.is_finite() || v < 0.0 {
        bail!("{field} must be finite and >= 0 (got {v})");
    }
    Ok(())
}

fn positive(field: &str, v: f32) -> Result<()> {
    if !v.is_finite() || v <= 0.0 {
        bail!("{field} must be finite and > 0 (got {v})");
    }
    Ok(())
}

fn default_max_charges() -> u8 {
    1
}

/// Complete definition of one ability. Loaded once at startup and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilitySpec {
    pub id: String,
    pub name: String,
    pub kind: AbilityKind,
    /// Active: refill time per consumed charge. Ultimate: re-charge lockout
    /// after use.
    #[serde(default)]
    pub cooldown_s: f32,
    #[serde(default = "default_max_charges")]
    pub max_charges: u8,
    /// Ultimate only: charge needed before activation is allowed.
    #[serde(default)]
    pub charge_required: f32,
    /// Ultimate charge gained per point of damage dealt.
    #[serde(default)]
    pub charge_from_damage: f32,
    /// Ultimate charge gained per kill.
    #[serde(default)]
    pub charge_from_kills: f32,
    /// Ultimate charge gained per second of passive regen.
    #[serde(default)]
    pub charge_over_time_per_s: f32,
    /// When set, activation whiffs into `NoValidTargets` instead of
    /// consuming the resource on an empty resolution.
    #[serde(default)]
    pub requires_target: bool,
    pub effects: Vec<EffectSpec>,
}

impl AbilitySpec {
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            bail!("ability id must not be empty");
        }
        if self.effects.is_empty() && !matches!(self.kind, AbilityKind::Passive) {
            bail!("ability {} has no effects", self.id);
        }
        non_negative("cooldown_s", self.cooldown_s)?;
        if self.max_charges == 0 {
            bail!("ability {}: max_charges must be >= 1", self.id);
        }
        match self.kind {
            AbilityKind::Ultimate => {
                positive("charge_required", self.charge_required)?;
                non_negative("charge_from_damage", self.charge_from_damage)?;
                non_negative("charge_from_kills", self.charge_from_kills)?;
                non_negative("charge_over_time_per_s", self.charge_over_time_per_s)?;
            }
            AbilityKind::Active | AbilityKind::Passive => {
                if self.charge_required != 0.0 {
                    bail!("ability {}: charge_required is ultimate-only", self.id);
                }
            }
        }
        for fx in &self.effects {
            fx.validate()?;
        }
        Ok(())
    }
}
