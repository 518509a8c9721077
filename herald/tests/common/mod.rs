#![allow(dead_code)]

use herald::{Behavior, Capabilities, SchedulerHandle, Steps, testing::CallLog};
use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

// ============================================================================
// Test Capabilities
// ============================================================================

pub trait Armor {
    fn apply_damage(&mut self, damage: i32) -> Steps;
    fn health(&self) -> i32;
}

pub trait Weapon {
    fn reload(&mut self) -> Steps;
    fn rounds(&self) -> u32;
}

// ============================================================================
// Test Behaviors
// ============================================================================

pub struct Plate {
    pub health: i32,
    pub log: CallLog,
}

impl Plate {
    pub fn new(health: i32, log: &CallLog) -> Self {
        Self {
            health,
            log: log.clone(),
        }
    }
}

impl Armor for Plate {
    fn apply_damage(&mut self, damage: i32) -> Steps {
        self.health -= damage;
        self.log.record(format!("damage:{damage}"));
        Steps::done()
    }

    fn health(&self) -> i32 {
        self.log.record("health");
        self.health
    }
}

impl Behavior for Plate {
    fn register_capabilities(capabilities: &mut Capabilities<Self>) {
        capabilities.add::<dyn Armor>(|plate| plate);
    }
}

pub struct Rifle {
    pub rounds: Arc<AtomicU32>,
    pub capacity: u32,
    pub reload_time: Duration,
    pub scheduler: SchedulerHandle,
    pub log: CallLog,
}

impl Rifle {
    pub fn new(scheduler: &SchedulerHandle, log: &CallLog) -> Self {
        Self {
            rounds: Arc::new(AtomicU32::new(0)),
            capacity: 30,
            reload_time: Duration::from_millis(500),
            scheduler: scheduler.clone(),
            log: log.clone(),
        }
    }
}

impl Weapon for Rifle {
    fn reload(&mut self) -> Steps {
        let started = self.scheduler.clock().game_time();
        self.log.record(format!("reload@{}ms", started.as_millis()));

        let wait = self.scheduler.wait(self.reload_time);
        let rounds = Arc::clone(&self.rounds);
        let capacity = self.capacity;
        let log = self.log.clone();
        let scheduler = self.scheduler.clone();
        Steps::new(async move {
            wait.await;
            rounds.store(capacity, Ordering::Release);
            log.record(format!(
                "reloaded@{}ms",
                scheduler.clock().game_time().as_millis()
            ));
            Ok(())
        })
    }

    fn rounds(&self) -> u32 {
        self.rounds.load(Ordering::Acquire)
    }
}

impl Behavior for Rifle {
    fn register_capabilities(capabilities: &mut Capabilities<Self>) {
        capabilities.add::<dyn Weapon>(|rifle| rifle);
    }
}
