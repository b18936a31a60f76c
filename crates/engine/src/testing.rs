//! In-memory collaborators shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use serde_json::Value;

use crate::app::{
    ActorControl, ActorParams, CollisionPolicy, EngineActor, FloorParams, MagicTrick,
    ObjectParams, OccluderParams, PartDescriptor, Rotator, Saver, Scenario, ScenarioFactory,
    SceneError, SceneParams, SceneStatus, Validity, Vec3, World, WorldError,
};
use crate::content::SceneDescriptor;

#[derive(Debug, Default)]
struct FakeWorldState {
    live: Cell<usize>,
    spawned: Cell<usize>,
    rotation_drift: Cell<f32>,
    reject_locations: Cell<bool>,
    fail_spawn_after: Cell<Option<usize>>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeWorld {
    state: Rc<FakeWorldState>,
    quit_requests: usize,
}

impl FakeWorld {
    pub(crate) fn live_actor_count(&self) -> usize {
        self.state.live.get()
    }

    pub(crate) fn spawned_count(&self) -> usize {
        self.state.spawned.get()
    }

    pub(crate) fn quit_requests(&self) -> usize {
        self.quit_requests
    }

    pub(crate) fn set_rotation_drift(&mut self, drift: f32) {
        self.state.rotation_drift.set(drift);
    }

    pub(crate) fn set_reject_locations(&mut self, reject: bool) {
        self.state.reject_locations.set(reject);
    }

    pub(crate) fn fail_spawn_after(&mut self, successful_spawns: usize) {
        self.state
            .fail_spawn_after
            .set(Some(self.state.spawned.get() + successful_spawns));
    }
}

impl World for FakeWorld {
    type Actor = FakeActor;

    fn spawn_actor(&mut self, part: &PartDescriptor) -> Result<FakeActor, WorldError> {
        let index = self.state.spawned.get();
        if self
            .state
            .fail_spawn_after
            .get()
            .is_some_and(|limit| index >= limit)
        {
            return Err(WorldError::SpawnFailed {
                class_path: part.class_path,
                reason: "spawn budget exhausted".to_string(),
            });
        }
        self.state.spawned.set(index + 1);
        self.state.live.set(self.state.live.get() + 1);
        Ok(FakeActor {
            name: format!("{}_{index}", part.label),
            location: part.location,
            rotation: part.rotation,
            hidden: false,
            destroyed: false,
            world: Rc::clone(&self.state),
        })
    }

    fn quit_game(&mut self) {
        self.quit_requests += 1;
    }
}

#[derive(Debug)]
pub(crate) struct FakeActor {
    name: String,
    location: Vec3,
    rotation: Rotator,
    hidden: bool,
    destroyed: bool,
    world: Rc<FakeWorldState>,
}

impl EngineActor for FakeActor {
    fn engine_name(&self) -> &str {
        &self.name
    }

    fn set_actor_location(&mut self, location: Vec3) -> bool {
        if self.world.reject_locations.get() {
            return false;
        }
        self.location = location;
        true
    }

    fn set_actor_rotation(&mut self, rotation: Rotator) -> bool {
        let drift = self.world.rotation_drift.get();
        self.rotation = Rotator {
            yaw: rotation.yaw + drift,
            ..rotation
        };
        drift == 0.0
    }

    fn actor_rotation(&self) -> Rotator {
        self.rotation
    }

    fn set_hidden_in_game(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.world.live.set(self.world.live.get() - 1);
        }
    }
}

/// Saver that keeps annotations in memory.
#[derive(Debug, Default)]
pub(crate) struct MemorySaver {
    pub(crate) annotations: Vec<(String, Value)>,
}

impl Saver for MemorySaver {
    fn annotate(&mut self, key: &str, value: Value) {
        self.annotations.push((key.to_string(), value));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TrickCall {
    Setup { actor: String, run: u32 },
    Apply { actor: String, run: u32 },
}

/// Shared log of calls made by a [`ScriptedScenario`].
#[derive(Debug, Default, Clone)]
pub(crate) struct CallLog {
    calls: Rc<RefCell<Vec<TrickCall>>>,
    generations: Rc<Cell<usize>>,
}

impl CallLog {
    pub(crate) fn calls(&self) -> Vec<TrickCall> {
        self.calls.borrow().clone()
    }

    pub(crate) fn apply_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, TrickCall::Apply { .. }))
            .count()
    }

    pub(crate) fn generations(&self) -> usize {
        self.generations.get()
    }
}

/// Scenario with fixed parameters: floor, one occluder, one object.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedScenario {
    pub(crate) train: bool,
    pub(crate) nruns: u32,
    pub(crate) nchecks: u32,
    pub(crate) magic_tick: Option<u32>,
    pub(crate) invalid: bool,
    pub(crate) log: CallLog,
}

impl ScriptedScenario {
    pub(crate) fn train() -> Self {
        Self {
            train: true,
            nruns: 1,
            nchecks: 0,
            magic_tick: None,
            invalid: false,
            log: CallLog::default(),
        }
    }

    pub(crate) fn test(nruns: u32, nchecks: u32, magic_tick: u32) -> Self {
        Self {
            train: false,
            nruns,
            nchecks,
            magic_tick: Some(magic_tick),
            invalid: false,
            log: CallLog::default(),
        }
    }
}

impl Scenario for ScriptedScenario {
    fn generate_parameters(&mut self) -> Result<SceneParams, SceneError> {
        self.log.generations.set(self.log.generations.get() + 1);
        let mut params = SceneParams::new();
        params.insert("floor", ActorParams::Floor(FloorParams::default()))?;
        params.insert(
            "object_1",
            ActorParams::Object(ObjectParams {
                location: Vec3::new(500.0, 0.0, 50.0),
                rotation: Rotator::new(0.0, 30.0, 0.0),
                collision: CollisionPolicy {
                    overlap: false,
                    warning: true,
                },
                ..ObjectParams::default()
            }),
        )?;
        params.insert(
            "occluder_1",
            ActorParams::Occluder(OccluderParams {
                location: Vec3::new(300.0, 0.0, 0.0),
                ..OccluderParams::default()
            }),
        )?;
        if let Some(tick) = self.magic_tick {
            params.set_magic(MagicTrick {
                actor: "object_1".to_string(),
                tick,
            });
        }
        Ok(params)
    }

    fn description(&self) -> String {
        if self.train {
            "scripted train".to_string()
        } else {
            "scripted test".to_string()
        }
    }

    fn nruns(&self) -> u32 {
        self.nruns
    }

    fn nchecks(&self) -> u32 {
        self.nchecks
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn setup_magic_trick(&mut self, saver: &mut dyn Saver, actor: &mut dyn ActorControl, run: u32) {
        actor.set_hidden(false);
        saver.annotate("run", Value::from(run));
        self.log.calls.borrow_mut().push(TrickCall::Setup {
            actor: actor.name().to_string(),
            run,
        });
    }

    fn apply_magic_trick(&mut self, actor: &mut dyn ActorControl, run: u32) {
        actor.set_hidden(true);
        self.log.calls.borrow_mut().push(TrickCall::Apply {
            actor: actor.name().to_string(),
            run,
        });
    }

    fn validate(&self, _status: &SceneStatus) -> Validity {
        if self.invalid {
            Validity::Invalid {
                reason: "scripted failure".to_string(),
            }
        } else {
            Validity::Valid
        }
    }
}

/// Factory handing out queued scenarios in order, then falling back to id lookup.
#[derive(Debug, Default)]
pub(crate) struct ScriptedFactory {
    pub(crate) queued: VecDeque<ScriptedScenario>,
    pub(crate) train_template: Option<ScriptedScenario>,
    pub(crate) test_template: Option<ScriptedScenario>,
}

impl ScriptedFactory {
    pub(crate) fn from_queue(scenarios: Vec<ScriptedScenario>) -> Self {
        Self {
            queued: scenarios.into(),
            ..Self::default()
        }
    }

    pub(crate) fn templates(train: ScriptedScenario, test: ScriptedScenario) -> Self {
        Self {
            queued: VecDeque::new(),
            train_template: Some(train),
            test_template: Some(test),
        }
    }
}

impl ScenarioFactory for ScriptedFactory {
    fn create(&mut self, descriptor: &SceneDescriptor) -> Option<Box<dyn Scenario>> {
        if descriptor.scenario_id == "unknown" {
            return None;
        }
        if let Some(scenario) = self.queued.pop_front() {
            return Some(Box::new(scenario));
        }
        let template = if descriptor.is_train {
            self.train_template.clone()
        } else {
            self.test_template.clone()
        };
        template.map(|scenario| Box::new(scenario) as Box<dyn Scenario>)
    }
}
