use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, warn};

use super::actor::{ActorControl, ActorDescriptor, ActorKind, ActorStatus, SceneActor};
use super::scenario::{MagicTrick, Saver, Scenario, SceneParams, Validity};
use super::world::{EngineActor, World, WorldError};

/// Observable state of every actor of a scene, keyed by actor name.
pub type SceneStatus = BTreeMap<String, ActorStatus>;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("actor class unknown for {name}")]
    UnknownActorClass { name: String },
    #[error("actor {name} is named as a {named} but its parameters describe a {described}")]
    ActorKindMismatch {
        name: String,
        named: ActorKind,
        described: ActorKind,
    },
    #[error("actor {name} is defined twice")]
    DuplicateActor { name: String },
    #[error("magic trick targets unknown actor {actor}")]
    UnknownMagicActor { actor: String },
    #[error("failed to spawn actor {actor}: {source}")]
    Spawn {
        actor: String,
        #[source]
        source: WorldError,
    },
    #[error("scene has been cleared")]
    Cleared,
}

/// One schedulable unit: a scenario, its generated parameters and its live actors.
///
/// Parameters are generated once at construction and replayed by every run.
/// The scene owns its actors; dropping it releases them.
pub struct Scene<A: EngineActor> {
    scenario: Box<dyn Scenario>,
    params: SceneParams,
    actors: BTreeMap<String, SceneActor<A>>,
    current_run: u32,
    magic_fired_run: Option<u32>,
    cleared: bool,
}

impl<A: EngineActor> Scene<A> {
    pub fn new<W>(world: &mut W, mut scenario: Box<dyn Scenario>) -> Result<Self, SceneError>
    where
        W: World<Actor = A>,
    {
        let params = scenario.generate_parameters()?;
        if let Some(magic) = params.magic() {
            if params.actor(&magic.actor).is_none() {
                return Err(SceneError::UnknownMagicActor {
                    actor: magic.actor.clone(),
                });
            }
        }

        let mut actors = BTreeMap::new();
        for (name, actor_params) in params.actors() {
            let descriptor = ActorDescriptor::describe(name, actor_params);
            match SceneActor::spawn(world, descriptor) {
                Ok(actor) => {
                    actors.insert(name.clone(), actor);
                }
                Err(error) => {
                    for actor in actors.values_mut() {
                        actor.destroy();
                    }
                    return Err(error);
                }
            }
        }
        debug!(
            scenario = %scenario.description(),
            actor_count = actors.len(),
            "scene_spawned"
        );

        Ok(Self {
            scenario,
            params,
            actors,
            current_run: 0,
            magic_fired_run: None,
            cleared: false,
        })
    }

    pub fn current_run(&self) -> u32 {
        self.current_run
    }

    pub fn nruns(&self) -> u32 {
        self.scenario.nruns()
    }

    pub fn nruns_remaining(&self) -> u32 {
        self.scenario.nruns().saturating_sub(self.current_run)
    }

    pub fn is_train(&self) -> bool {
        self.scenario.is_train()
    }

    pub fn params(&self) -> &SceneParams {
        &self.params
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Rewinds the run counter, as done when the scheduler begins this scene.
    pub fn rewind(&mut self) {
        self.current_run = 0;
        self.magic_fired_run = None;
    }

    /// Starts the next run: reset poses, bump the run index, prime the trick.
    pub fn render(&mut self, saver: &mut dyn Saver) -> Result<(), SceneError> {
        if self.cleared {
            return Err(SceneError::Cleared);
        }
        self.reset();
        self.current_run += 1;

        if let Some(MagicTrick { actor, .. }) = self.params.magic() {
            if let Some(target) = self.actors.get_mut(actor) {
                self.scenario
                    .setup_magic_trick(saver, target, self.current_run);
            }
        }
        Ok(())
    }

    /// Fires the trick when `tick` is the trick tick, at most once per run.
    pub fn run_magic(&mut self, tick: u32) -> bool {
        let Some(magic) = self.params.magic() else {
            return false;
        };
        if tick != magic.tick || self.magic_fired_run == Some(self.current_run) {
            return false;
        }
        let Some(target) = self.actors.get_mut(&magic.actor) else {
            return false;
        };
        self.scenario.apply_magic_trick(target, self.current_run);
        self.magic_fired_run = Some(self.current_run);
        debug!(actor = %magic.actor, tick, run = self.current_run, "magic_trick_applied");
        true
    }

    /// Snaps moving actors back to their generated pose.
    pub fn reset(&mut self) {
        for (name, actor) in self.actors.iter_mut() {
            if !actor.kind().is_moving() {
                continue;
            }
            let Some((location, rotation)) = self
                .params
                .actor(name)
                .and_then(|params| params.initial_pose())
            else {
                continue;
            };
            actor.set_location(location);
            actor.set_rotation(rotation);
        }
    }

    /// Destroys every actor. Calling it again is a no-op.
    pub fn clear(&mut self) {
        for actor in self.actors.values_mut() {
            actor.destroy();
        }
        self.actors.clear();
        self.cleared = true;
    }

    pub fn get_status(&self) -> SceneStatus {
        self.actors
            .iter()
            .map(|(name, actor)| (name.clone(), actor.status()))
            .collect()
    }

    pub fn actor(&self, name: &str) -> Option<&SceneActor<A>> {
        self.actors.get(name)
    }

    pub fn is_check_run(&self) -> bool {
        if self.scenario.is_train() {
            return false;
        }
        self.current_run <= self.scenario.nchecks()
    }

    pub fn description(&self) -> String {
        let mut description = self.scenario.description();
        let nruns = self.scenario.nruns();
        if nruns > 1 {
            let check = if self.is_check_run() { ", check" } else { "" };
            description.push_str(&format!(" (run {}/{nruns}{check})", self.current_run));
        }
        description
    }

    pub fn validity(&self) -> Validity {
        self.scenario.validate(&self.get_status())
    }

    pub fn is_valid(&self) -> bool {
        self.validity().is_valid()
    }
}

impl<A: EngineActor> Drop for Scene<A> {
    fn drop(&mut self) {
        if !self.actors.is_empty() {
            warn!(actor_count = self.actors.len(), "scene_dropped_without_clear");
            self.clear();
        }
    }
}
