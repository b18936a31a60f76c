use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::scenario::{Saver, Scenario, ScenarioFactory, Validity};
use super::scene::{Scene, SceneError, SceneStatus};
use super::tick::{Milestone, TickHook};
use super::world::World;
use crate::content::{build_scene_list, SceneDescriptor, ScenesConfig};

pub const DEFAULT_TICKS_PER_RUN: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub ticks_per_run: u32,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            ticks_per_run: DEFAULT_TICKS_PER_RUN,
        }
    }
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("ticks per run must be at least 1")]
    ZeroTicksPerRun,
    #[error("no scenario registered for id {scenario_id}")]
    UnknownScenario { scenario_id: String },
    #[error("scenario {scenario_id} declares zero runs")]
    EmptyScenario { scenario_id: String },
    #[error("scene {scene_index} schedules its magic trick at tick {tick}, past the {ticks_per_run} ticks of a run")]
    MagicTickOutOfRange {
        scene_index: usize,
        tick: u32,
        ticks_per_run: u32,
    },
    #[error("scene {scene_index} failed: {source}")]
    Scene {
        scene_index: usize,
        #[source]
        source: SceneError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedulerEvent {
    ScheduleNext,
}

/// Identity of the run currently being played, 1-based for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunInfo {
    pub scene_index: usize,
    pub scene_count: usize,
    pub scenario_id: String,
    pub run: u32,
    pub nruns: u32,
    pub is_train: bool,
    pub is_check: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The active run went on; `tick` is the index handed to the magic trick.
    Continue { tick: u32 },
    /// The previous run ended and this one was rendered in its place.
    RunStarted(RunInfo),
    Exhausted,
}

/// Sequences the scene list: every run of a scene, then the next scene, then exit.
///
/// The scheduler is driven once per host frame through [`Scheduler::tick`] and
/// never blocks. Scenarios are created up front so configuration errors
/// surface before any actor is spawned; scenes are built only when reached.
pub struct Scheduler<W: World, S: Saver> {
    world: W,
    saver: S,
    descriptors: Vec<SceneDescriptor>,
    pending: Vec<Option<Box<dyn Scenario>>>,
    scene: Option<Scene<W::Actor>>,
    scene_index: Option<usize>,
    ticker: TickHook<SchedulerEvent>,
    total_runs: u32,
    exhausted: bool,
}

impl<W: World, S: Saver> Scheduler<W, S> {
    pub fn new(
        world: W,
        saver: S,
        config: &ScenesConfig,
        factory: &mut dyn ScenarioFactory,
        settings: SchedulerSettings,
    ) -> Result<Self, SchedulerError> {
        Self::from_descriptors(world, saver, build_scene_list(config), factory, settings)
    }

    pub fn from_descriptors(
        world: W,
        saver: S,
        descriptors: Vec<SceneDescriptor>,
        factory: &mut dyn ScenarioFactory,
        settings: SchedulerSettings,
    ) -> Result<Self, SchedulerError> {
        if settings.ticks_per_run == 0 {
            return Err(SchedulerError::ZeroTicksPerRun);
        }

        let mut pending = Vec::with_capacity(descriptors.len());
        let mut total_runs = 0_u32;
        for descriptor in &descriptors {
            let scenario =
                factory
                    .create(descriptor)
                    .ok_or_else(|| SchedulerError::UnknownScenario {
                        scenario_id: descriptor.scenario_id.clone(),
                    })?;
            if scenario.nruns() == 0 {
                return Err(SchedulerError::EmptyScenario {
                    scenario_id: descriptor.scenario_id.clone(),
                });
            }
            total_runs = total_runs.saturating_add(scenario.nruns());
            pending.push(Some(scenario));
        }

        let train_count = descriptors.iter().filter(|scene| scene.is_train).count();
        info!(
            scene_count = descriptors.len(),
            test_count = descriptors.len() - train_count,
            train_count,
            total_runs,
            ticks_per_run = settings.ticks_per_run,
            "scenes_scheduled"
        );

        let mut ticker = TickHook::new(settings.ticks_per_run);
        ticker.add_hook(SchedulerEvent::ScheduleNext, Milestone::Final);

        let mut scheduler = Self {
            world,
            saver,
            descriptors,
            pending,
            scene: None,
            scene_index: None,
            ticker,
            total_runs,
            exhausted: false,
        };
        scheduler.schedule_next()?;
        Ok(scheduler)
    }

    /// Advances one host frame.
    ///
    /// A scheduling error is returned once; the scheduler is terminal afterwards
    /// and later calls report `Exhausted`.
    pub fn tick(&mut self, dt: f64) -> Result<TickOutcome, SchedulerError> {
        if self.exhausted {
            return Ok(TickOutcome::Exhausted);
        }

        let tick = self.ticker.elapsed();
        if let Some(scene) = self.scene.as_mut() {
            scene.run_magic(tick);
        }

        let mut outcome = TickOutcome::Continue { tick };
        for event in self.ticker.tick(dt) {
            match event {
                SchedulerEvent::ScheduleNext => {
                    let next = match self.schedule_next() {
                        Ok(next) => next,
                        Err(error) => {
                            self.abort(&error);
                            return Err(error);
                        }
                    };
                    outcome = match next {
                        Some(run) => TickOutcome::RunStarted(run),
                        None => TickOutcome::Exhausted,
                    };
                }
            }
        }
        Ok(outcome)
    }

    /// Moves to the next run, building the next scene when the current one is done.
    /// Returns `None` once the scene list is exhausted.
    fn schedule_next(&mut self) -> Result<Option<RunInfo>, SchedulerError> {
        if self.exhausted {
            return Ok(None);
        }

        let has_runs_left = self
            .scene
            .as_ref()
            .is_some_and(|scene| scene.nruns_remaining() > 0);
        if !has_runs_left {
            self.finish_scene();
            let next_index = self.scene_index.map_or(0, |index| index + 1);
            self.scene_index = Some(next_index);
            if next_index >= self.descriptors.len() {
                self.exhaust();
                return Ok(None);
            }
            self.scene = Some(self.build_scene(next_index)?);
        }

        self.start_run().map(Some)
    }

    fn finish_scene(&mut self) {
        let Some(mut scene) = self.scene.take() else {
            return;
        };
        if let Validity::Invalid { reason } = scene.validity() {
            warn!(
                scene_index = self.scene_index.map_or(0, |index| index + 1),
                reason = %reason,
                "scene_invalid"
            );
        }
        scene.clear();
    }

    fn build_scene(&mut self, index: usize) -> Result<Scene<W::Actor>, SchedulerError> {
        let scenario = self
            .pending
            .get_mut(index)
            .and_then(Option::take)
            .ok_or_else(|| SchedulerError::UnknownScenario {
                scenario_id: self
                    .descriptors
                    .get(index)
                    .map(|descriptor| descriptor.scenario_id.clone())
                    .unwrap_or_default(),
            })?;
        let mut scene = Scene::new(&mut self.world, scenario).map_err(|source| {
            SchedulerError::Scene {
                scene_index: index + 1,
                source,
            }
        })?;
        let ticks_per_run = self.ticker.nticks();
        if let Some(tick) = scene.params().magic().map(|magic| magic.tick) {
            if tick >= ticks_per_run {
                scene.clear();
                return Err(SchedulerError::MagicTickOutOfRange {
                    scene_index: index + 1,
                    tick,
                    ticks_per_run,
                });
            }
        }
        scene.rewind();
        Ok(scene)
    }

    fn start_run(&mut self) -> Result<RunInfo, SchedulerError> {
        let scene_index = self.scene_index.unwrap_or(0);
        let scene_count = self.descriptors.len();
        let Some(scene) = self.scene.as_mut() else {
            return Err(SchedulerError::Scene {
                scene_index: scene_index + 1,
                source: SceneError::Cleared,
            });
        };

        let mut progress = format!("rendering scene {}/{scene_count}", scene_index + 1);
        if !scene.is_train() {
            progress.push_str(&format!(
                ", run {}/{}",
                scene.current_run() + 1,
                scene.nruns()
            ));
        }
        info!(progress = %progress, "run_scheduled");

        self.ticker.reset();
        scene
            .render(&mut self.saver)
            .map_err(|source| SchedulerError::Scene {
                scene_index: scene_index + 1,
                source,
            })?;
        self.ticker.run();

        Ok(RunInfo {
            scene_index,
            scene_count,
            scenario_id: self
                .descriptors
                .get(scene_index)
                .map(|descriptor| descriptor.scenario_id.clone())
                .unwrap_or_default(),
            run: scene.current_run(),
            nruns: scene.nruns(),
            is_train: scene.is_train(),
            is_check: scene.is_check_run(),
            description: scene.description(),
        })
    }

    fn exhaust(&mut self) {
        info!(
            scene_count = self.descriptors.len(),
            total_runs = self.total_runs,
            "all_scenes_rendered"
        );
        self.ticker.reset();
        self.exhausted = true;
        self.world.quit_game();
    }

    fn abort(&mut self, error: &SchedulerError) {
        warn!(
            scene_index = self.scene_index.map_or(0, |index| index + 1),
            error = %error,
            "scheduler_aborted"
        );
        if let Some(mut scene) = self.scene.take() {
            scene.clear();
        }
        self.ticker.reset();
        self.exhausted = true;
        self.world.quit_game();
    }

    pub fn active_run(&self) -> Option<RunInfo> {
        let scene = self.scene.as_ref()?;
        let scene_index = self.scene_index?;
        Some(RunInfo {
            scene_index,
            scene_count: self.descriptors.len(),
            scenario_id: self.descriptors.get(scene_index)?.scenario_id.clone(),
            run: scene.current_run(),
            nruns: scene.nruns(),
            is_train: scene.is_train(),
            is_check: scene.is_check_run(),
            description: scene.description(),
        })
    }

    /// Index the next `tick()` call will hand to the magic trick.
    pub fn current_tick(&self) -> u32 {
        self.ticker.elapsed()
    }

    pub fn scene_status(&self) -> Option<SceneStatus> {
        self.scene.as_ref().map(Scene::get_status)
    }

    pub fn active_scene(&self) -> Option<&Scene<W::Actor>> {
        self.scene.as_ref()
    }

    pub fn exit_requested(&self) -> bool {
        self.exhausted
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn saver(&self) -> &S {
        &self.saver
    }

    pub fn saver_mut(&mut self) -> &mut S {
        &mut self.saver
    }

    pub fn descriptors(&self) -> &[SceneDescriptor] {
        &self.descriptors
    }

    pub fn scene_count(&self) -> usize {
        self.descriptors.len()
    }

    pub fn total_runs(&self) -> u32 {
        self.total_runs
    }

    pub fn ticks_per_run(&self) -> u32 {
        self.ticker.nticks()
    }
}
