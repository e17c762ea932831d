//! Typed activation failures. Returned, never thrown; the caller decides
//! what feedback to surface.

use thiserror::Error;

#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum AbilityError {
    #[error("unknown ability or actor")]
    NotFound,
    #[error("ability is on cooldown")]
    OnCooldown,
    #[error("ultimate charge not full")]
    InsufficientCharge,
    #[error("actor is dead or gone")]
    ActorDead,
    #[error("no valid targets")]
    NoValidTargets,
    #[error("ability cannot be activated directly")]
    NotActivatable,
}
