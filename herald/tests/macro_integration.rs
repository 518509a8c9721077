//! Integration tests for herald macros.

#![cfg(feature = "macros")]

use herald::{Behavior, Node, NodeExt, Scheduler, Steps, registry::handlers};
use std::time::Duration;

mod common;
use common::{Armor, Weapon};

#[derive(Behavior)]
#[behavior(capabilities(Armor, Weapon))]
struct Tank {
    health: i32,
    rounds: u32,
}

impl Armor for Tank {
    fn apply_damage(&mut self, damage: i32) -> Steps {
        self.health -= damage;
        Steps::done()
    }

    fn health(&self) -> i32 {
        self.health
    }
}

impl Weapon for Tank {
    fn reload(&mut self) -> Steps {
        self.rounds = 5;
        Steps::done()
    }

    fn rounds(&self) -> u32 {
        self.rounds
    }
}

#[derive(Behavior)]
struct Marker;

trait Label {
    fn label(&self) -> String;
}

#[derive(Behavior)]
#[behavior(capabilities(Label))]
struct Named<T: Send + 'static> {
    value: T,
}

impl<T: Send + 'static> Label for Named<T> {
    fn label(&self) -> String {
        std::any::type_name::<T>().to_string()
    }
}

#[test]
fn test_derive_registers_every_capability() {
    let node = Node::new("tank");
    node.attach(Tank {
        health: 50,
        rounds: 0,
    });

    assert_eq!(handlers::<dyn Armor>(&node).len(), 1);
    assert_eq!(handlers::<dyn Weapon>(&node).len(), 1);
    assert_eq!(
        handlers::<dyn Armor>(&node)[0].capability_names().len(),
        2
    );
}

#[test]
fn test_derived_behavior_receives_sequences() {
    let mut scheduler = Scheduler::new();
    let handle = scheduler.handle();
    let node = Node::new("tank");
    node.attach(Tank {
        health: 50,
        rounds: 0,
    });

    let running = handle
        .sequence()
        .send::<dyn Armor, _>(&node, |armor| armor.apply_damage(20))
        .send::<dyn Weapon, _>(&node, |weapon| weapon.reload())
        .run()
        .unwrap();
    scheduler.tick(Duration::ZERO);

    assert!(running.is_finished());
    assert_eq!(node.request::<dyn Armor, i32, _>(|armor| armor.health()), 30);
    assert_eq!(node.request::<dyn Weapon, u32, _>(|weapon| weapon.rounds()), 5);
}

#[test]
fn test_derive_without_capabilities() {
    let node = Node::new("node");
    node.attach(Marker);
    assert_eq!(node.behavior_count(), 1);
    assert!(!node.can_handle::<dyn Armor>());
}

#[test]
fn test_derive_on_generic_type() {
    let node = Node::new("node");
    node.attach(Named { value: 7u8 });
    assert_eq!(
        node.request::<dyn Label, String, _>(|label| label.label()),
        "u8"
    );
    assert_eq!(node.with_behavior::<Named<u8>, _>(|named| named.value), Some(7));
}
