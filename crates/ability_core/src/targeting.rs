//! Deterministic target selection over frozen snapshots.
//!
//! Pure functions: the same origin, shape and candidate list always select
//! the same targets, in the same order (ascending distance, then id).

use glam::Vec3;

use crate::actor::{ActorId, TargetSnapshot, Team};

/// Area a resolution sweeps. Cones and lines use the same inclusion
/// contract as spheres: a point-in-shape test against candidate positions.
#[derive(Copy, Clone, Debug)]
pub enum Shape {
    Sphere { radius: f32 },
    Cone {
        radius: f32,
        dir: Vec3,
        half_angle_rad: f32,
    },
    Line {
        length: f32,
        width: f32,
        dir: Vec3,
    },
}

/// Which side of the owner's team a resolution selects.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Affinity {
    Hostile,
    Allied,
    Any,
}

#[inline]
fn affinity_matches(affinity: Affinity, owner_team: Team, candidate: Team) -> bool {
    match affinity {
        Affinity::Hostile => owner_team.hostile_to(candidate),
        Affinity::Allied => owner_team.allied_with(candidate),
        Affinity::Any => true,
    }
}

#[inline]
fn in_shape(origin: Vec3, shape: Shape, pos: Vec3) -> bool {
    let to = pos - origin;
    match shape {
        Shape::Sphere { radius } => to.length_squared() <= radius * radius,
        Shape::Cone {
            radius,
            dir,
            half_angle_rad,
        } => {
            if to.length_squared() > radius * radius {
                return false;
            }
            let d = to.length();
            if d <= 1e-6 {
                return true;
            }
            let dirn = dir.normalize_or_zero();
            let cos = to.dot(dirn) / d;
            cos >= half_angle_rad.cos()
        }
        Shape::Line { length, width, dir } => {
            let dirn = dir.normalize_or_zero();
            let t = to.dot(dirn);
            if t < 0.0 || t > length {
                return false;
            }
            let closest = dirn * t;
            (to - closest).length_squared() <= (width * 0.5) * (width * 0.5)
        }
    }
}

/// Select every live candidate matching `affinity` inside `shape`, ordered
/// by ascending distance from `origin`, then by id.
pub fn resolve(
    origin: Vec3,
    shape: Shape,
    owner_team: Team,
    affinity: Affinity,
    candidates: &[TargetSnapshot],
) -> Vec<ActorId> {
    let mut hits: Vec<(f32, ActorId)> = candidates
        .iter()
        .filter(|c| c.alive)
        .filter(|c| affinity_matches(affinity, owner_team, c.team))
        .filter(|c| in_shape(origin, shape, c.pos))
        .map(|c| ((c.pos - origin).length_squared(), c.id))
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    hits.into_iter().map(|(_, id)| id).collect()
}

/// `resolve` with a target cap: the nearest `cap` candidates win, ties
/// broken by id so selection is reproducible.
pub fn resolve_capped(
    origin: Vec3,
    shape: Shape,
    owner_team: Team,
    affinity: Affinity,
    candidates: &[TargetSnapshot],
    cap: usize,
) -> Vec<ActorId> {
    let mut hits = resolve(origin, shape, owner_team, affinity, candidates);
    hits.truncate(cap);
    hits
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snap(id: u32, team: u8, pos: Vec3, alive: bool) -> TargetSnapshot {
        TargetSnapshot {
            id: ActorId(id),
            team: Team(team),
            pos,
            alive,
        }
    }

    #[test]
    fn sphere_includes_by_euclidean_distance() {
        let cands = [
            snap(1, 1, Vec3::new(10.0, 0.0, 0.0), true),
            snap(2, 1, Vec3::new(30.0, 0.0, 0.0), true),
        ];
        let hit = resolve(
            Vec3::ZERO,
            Shape::Sphere { radius: 25.0 },
            Team(0),
            Affinity::Hostile,
            &cands,
        );
        assert_eq!(hit, vec![ActorId(1)]);
    }

    #[test]
    fn dead_candidates_never_selected() {
        let cands = [snap(1, 1, Vec3::new(1.0, 0.0, 0.0), false)];
        let hit = resolve(
            Vec3::ZERO,
            Shape::Sphere { radius: 5.0 },
            Team(0),
            Affinity::Any,
            &cands,
        );
        assert!(hit.is_empty());
    }

    #[test]
    fn affinity_splits_teams() {
        let cands = [
            snap(1, 0, Vec3::new(1.0, 0.0, 0.0), true),
            snap(2, 1, Vec3::new(1.0, 0.0, 1.0), true),
        ];
        let allies = resolve(
            Vec3::ZERO,
            Shape::Sphere { radius: 5.0 },
            Team(0),
            Affinity::Allied,
            &cands,
        );
        let hostiles = resolve(
            Vec3::ZERO,
            Shape::Sphere { radius: 5.0 },
            Team(0),
            Affinity::Hostile,
            &cands,
        );
        assert_eq!(allies, vec![ActorId(1)]);
        assert_eq!(hostiles, vec![ActorId(2)]);
    }

    #[test]
    fn cap_orders_by_distance_then_id() {
        let cands = [
            snap(7, 1, Vec3::new(2.0, 0.0, 0.0), true),
            snap(3, 1, Vec3::new(2.0, 0.0, 0.0), true),
            snap(5, 1, Vec3::new(1.0, 0.0, 0.0), true),
        ];
        let hit = resolve_capped(
            Vec3::ZERO,
            Shape::Sphere { radius: 10.0 },
            Team(0),
            Affinity::Hostile,
            &cands,
            2,
        );
        assert_eq!(hit, vec![ActorId(5), ActorId(3)]);
    }

    #[test]
    fn cone_respects_half_angle() {
        let cands = [
            snap(1, 1, Vec3::new(5.0, 0.0, 0.2), true),
            snap(2, 1, Vec3::new(0.0, 0.0, 5.0), true),
        ];
        let hit = resolve(
            Vec3::ZERO,
            Shape::Cone {
                radius: 10.0,
                dir: Vec3::X,
                half_angle_rad: 0.5,
            },
            Team(0),
            Affinity::Hostile,
            &cands,
        );
        assert_eq!(hit, vec![ActorId(1)]);
    }

    #[test]
    fn line_needs_forward_projection_and_width() {
        let cands = [
            snap(1, 1, Vec3::new(4.0, 0.0, 0.3), true),
            snap(2, 1, Vec3::new(-2.0, 0.0, 0.0), true),
            snap(3, 1, Vec3::new(4.0, 0.0, 3.0), true),
        ];
        let hit = resolve(
            Vec3::ZERO,
            Shape::Line {
                length: 10.0,
                width: 1.0,
                dir: Vec3::X,
            },
            Team(0),
            Affinity::Hostile,
            &cands,
        );
        assert_eq!(hit, vec![ActorId(1)]);
    }
}
