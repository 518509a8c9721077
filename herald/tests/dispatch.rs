use futures::executor::block_on;
use herald::{
    Node, NodeExt, ObjectPool, PoolError, Steps, execute, execute_hierarchy, execute_steps,
    registry::handlers,
    testing::{CallLog, Probe, ProbeBehavior},
};
use std::sync::{Arc, Mutex};

mod common;
use common::{Armor, Plate};

#[test]
fn test_disabled_behaviors_never_match() {
    let log = CallLog::new();
    let node = Node::new("tank");
    node.attach(Plate::new(100, &log)).disable();
    let live = node.attach(Plate::new(50, &log));

    let found = handlers::<dyn Armor>(&node);
    assert_eq!(found.len(), 1);

    live.disable();
    assert!(handlers::<dyn Armor>(&node).is_empty());
    assert!(!node.execute::<dyn Armor, _>(|armor| drop(armor.apply_damage(1))));
    assert!(log.is_empty());
}

#[test]
fn test_inactive_node_matches_nothing() {
    let log = CallLog::new();
    let parent = Node::new("parent");
    let child = parent.spawn_child("child").unwrap();
    child.attach(Plate::new(100, &log));

    parent.set_active(false);
    assert!(handlers::<dyn Armor>(&child).is_empty());
    assert!(!child.can_handle::<dyn Armor>());

    parent.set_active(true);
    assert!(child.can_handle::<dyn Armor>());
}

#[test]
fn test_destroyed_node_is_inert() {
    let log = CallLog::new();
    let node = Node::new("ghost");
    node.attach(ProbeBehavior::new("ghost", &log));
    node.destroy();

    assert!(!execute::<dyn Probe, _>(&node, |p| p.touch("x")));
    assert_eq!(node.event_handler::<dyn Probe>(), None);
    assert!(log.is_empty());
}

#[test]
fn test_failures_do_not_stop_other_handlers() {
    let log = CallLog::new();
    let node = Node::new("node");
    node.attach(ProbeBehavior::new("first", &log).panicking());
    node.attach(ProbeBehavior::new("second", &log).failing());
    node.attach(ProbeBehavior::new("third", &log));

    assert!(execute::<dyn Probe, _>(&node, |p| p.touch("sync")));
    assert_eq!(log.entries(), ["first:sync", "second:sync", "third:sync"]);

    log.clear();
    assert!(block_on(execute_steps::<dyn Probe, _>(&node, &|p| p.ping("async"))));
    assert_eq!(
        log.entries(),
        ["first:async", "second:async", "third:async", "third:async:done"]
    );
}

#[test]
fn test_hierarchy_bubbling_stops_at_first_handler() {
    let log = CallLog::new();
    let world = Node::new("world");
    let squad = world.spawn_child("squad").unwrap();
    let soldier = squad.spawn_child("soldier").unwrap();
    world.attach(ProbeBehavior::new("world", &log));
    squad.attach(ProbeBehavior::new("squad", &log));

    assert_eq!(
        execute_hierarchy::<dyn Probe, _>(&soldier, |p| p.touch("report")),
        Some(squad.clone())
    );
    assert_eq!(log.entries(), ["squad:report"]);
    assert_eq!(soldier.event_handler::<dyn Probe>(), Some(squad));
}

#[test]
fn test_behavior_can_dispatch_to_siblings() {
    struct Relay {
        node: Node,
        log: CallLog,
    }

    trait Trigger {
        fn fire(&mut self);
    }

    impl Trigger for Relay {
        fn fire(&mut self) {
            self.log.record("relay");
            self.node.execute::<dyn Probe, _>(|p| p.touch("relayed"));
        }
    }

    impl herald::Behavior for Relay {
        fn register_capabilities(capabilities: &mut herald::Capabilities<Self>) {
            capabilities.add::<dyn Trigger>(|relay| relay);
        }
    }

    let log = CallLog::new();
    let node = Node::new("node");
    node.attach(Relay {
        node: node.clone(),
        log: log.clone(),
    });
    node.attach(ProbeBehavior::new("probe", &log));

    assert!(node.execute::<dyn Trigger, _>(|t| t.fire()));
    assert_eq!(log.entries(), ["relay", "probe:relayed"]);
}

#[test]
fn test_pool_detects_double_release() {
    let mut pool = ObjectPool::<Arc<Mutex<Vec<i32>>>>::new()
        .on_release(|shared| shared.lock().unwrap().clear());

    let shared = pool.get();
    shared.lock().unwrap().push(1);
    assert_eq!(pool.count_active(), 1);

    pool.release(Arc::clone(&shared)).unwrap();
    assert_eq!(pool.release(shared), Err(PoolError::DoubleRelease));
    assert_eq!(pool.count_inactive(), 1);
    assert_eq!(pool.count_all(), 1);

    let reused = pool.get();
    assert!(reused.lock().unwrap().is_empty());
    assert_eq!(pool.count_all(), 1);
}

#[test]
fn test_steps_helper_is_default_done() {
    assert!(block_on(Steps::default()).is_ok());
}
