//! Actor identity and the read-only view collaborators hand the engine.

use glam::Vec3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u32);

/// Faction tag; actors on different teams are hostile to each other.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Team(pub u8);

impl Team {
    #[inline]
    pub fn allied_with(self, other: Team) -> bool {
        self == other
    }

    #[inline]
    pub fn hostile_to(self, other: Team) -> bool {
        self != other
    }
}

/// Frozen per-resolution view of one entity. Supplied fresh by the
/// `TargetProvider` on every resolution; never cached across ticks.
#[derive(Copy, Clone, Debug)]
pub struct TargetSnapshot {
    pub id: ActorId,
    pub team: Team,
    pub pos: Vec3,
    pub alive: bool,
}
