#![allow(clippy::unwrap_used)]

mod common;

use ability_core::{ActorId, Hooks};
use common::*;
use data_runtime::ability::{AbilityKind, EffectSpec};
use glam::Vec3;

fn field_kit() -> data_runtime::ability::AbilitySpec {
    mk_ability(
        "kit.heal_field",
        AbilityKind::Active,
        vec![EffectSpec::HealingField {
            radius: 8.0,
            heal_per_second: 5.0,
            duration_s: 6.0,
        }],
    )
}

#[test]
fn double_cancel_notifies_once() {
    let mut engine = mk_engine(vec![field_kit()]);
    let world = World::new(vec![snap(1, 0, Vec3::ZERO)]);
    let (mut rec, mut ev) = (Recorder::default(), Events::default());
    engine.actor_enter(ActorId(1));

    let handle = engine
        .activate(
            ActorId(1),
            "kit.heal_field",
            Vec3::ZERO,
            None,
            &mut Hooks {
                targets: &world,
                applier: &mut rec,
                notify: &mut ev,
            },
        )
        .unwrap();

    for _ in 0..2 {
        engine.cancel(
            handle,
            &mut Hooks {
                targets: &world,
                applier: &mut rec,
                notify: &mut ev,
            },
        );
    }
    run_seconds(&mut engine, &world, &mut rec, &mut ev, 1);
    engine.cancel(
        handle,
        &mut Hooks {
            targets: &world,
            applier: &mut rec,
            notify: &mut ev,
        },
    );

    assert_eq!(ev.cleanups_for(handle), 1);
}

#[test]
fn cancel_after_natural_expiry_is_a_no_op() {
    let mut engine = mk_engine(vec![field_kit()]);
    let world = World::new(vec![snap(1, 0, Vec3::ZERO)]);
    let (mut rec, mut ev) = (Recorder::default(), Events::default());
    engine.actor_enter(ActorId(1));

    let handle = engine
        .activate(
            ActorId(1),
            "kit.heal_field",
            Vec3::ZERO,
            None,
            &mut Hooks {
                targets: &world,
                applier: &mut rec,
                notify: &mut ev,
            },
        )
        .unwrap();
    run_seconds(&mut engine, &world, &mut rec, &mut ev, 7);
    assert_eq!(ev.cleanups_for(handle), 1);
    assert_eq!(engine.effect_phase(handle), None);

    engine.cancel(
        handle,
        &mut Hooks {
            targets: &world,
            applier: &mut rec,
            notify: &mut ev,
        },
    );
    assert_eq!(ev.cleanups_for(handle), 1);
}

#[test]
fn actor_leave_cancels_everything_it_owns() {
    let mut engine = mk_engine(vec![
        field_kit(),
        mk_ability(
            "kit.barrier",
            AbilityKind::Active,
            vec![EffectSpec::Shield {
                health: 50.0,
                duration_s: 20.0,
                radius: 0.0,
            }],
        ),
    ]);
    let world = World::new(vec![snap(1, 0, Vec3::ZERO), snap(2, 0, Vec3::new(2.0, 0.0, 0.0))]);
    let (mut rec, mut ev) = (Recorder::default(), Events::default());
    engine.actor_enter(ActorId(1));

    let field = engine
        .activate(
            ActorId(1),
            "kit.heal_field",
            Vec3::ZERO,
            None,
            &mut Hooks {
                targets: &world,
                applier: &mut rec,
                notify: &mut ev,
            },
        )
        .unwrap();
    let barrier = engine
        .activate(
            ActorId(1),
            "kit.barrier",
            Vec3::ZERO,
            None,
            &mut Hooks {
                targets: &world,
                applier: &mut rec,
                notify: &mut ev,
            },
        )
        .unwrap();

    engine.actor_leave(
        ActorId(1),
        &mut Hooks {
            targets: &world,
            applier: &mut rec,
            notify: &mut ev,
        },
    );

    assert_eq!(engine.effects_in_flight(), 0);
    assert_eq!(ev.cleanups_for(field), 1);
    assert_eq!(ev.cleanups_for(barrier), 1);
    // Resource state is gone with the actor.
    assert_eq!(engine.cooldown_remaining_s(ActorId(1), "kit.heal_field"), 0.0);
}

#[test]
fn every_handle_gets_exactly_one_cleanup_over_a_busy_fight() {
    let mut engine = mk_engine(vec![
        field_kit(),
        mk_ability(
            "kit.concussion",
            AbilityKind::Active,
            vec![EffectSpec::Stun {
                radius: 10.0,
                duration_s: 3.0,
            }],
        ),
        mk_ability(
            "kit.ordnance",
            AbilityKind::Active,
            vec![EffectSpec::Airstrike {
                delay_s: 2.0,
                radius: 6.0,
                amount: 90.0,
            }],
        ),
    ]);
    let mut world = World::new(vec![
        snap(1, 0, Vec3::ZERO),
        snap(2, 1, Vec3::new(4.0, 0.0, 0.0)),
    ]);
    let (mut rec, mut ev) = (Recorder::default(), Events::default());
    engine.actor_enter(ActorId(1));

    let mut handles = Vec::new();
    for ability in ["kit.heal_field", "kit.concussion", "kit.ordnance"] {
        handles.push(
            engine
                .activate(
                    ActorId(1),
                    ability,
                    Vec3::ZERO,
                    None,
                    &mut Hooks {
                        targets: &world,
                        applier: &mut rec,
                        notify: &mut ev,
                    },
                )
                .unwrap(),
        );
    }

    run_seconds(&mut engine, &world, &mut rec, &mut ev, 4);
    world.kill(ActorId(2));
    run_seconds(&mut engine, &world, &mut rec, &mut ev, 10);

    for handle in handles {
        assert_eq!(ev.cleanups_for(handle), 1);
    }
    assert_eq!(engine.effects_in_flight(), 0);
}
