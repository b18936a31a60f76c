mod actor;
mod scenario;
mod scene;
mod scheduler;
mod tick;
mod world;

pub use actor::{
    ActorControl, ActorDescriptor, ActorKind, ActorParams, ActorStatus, CollisionPolicy,
    FloorParams, LightParams, ObjectParams, ObjectShape, OccluderParams, SceneActor, WallsParams,
};
pub use scenario::{MagicTrick, Saver, Scenario, ScenarioFactory, SceneParams, Validity};
pub use scene::{Scene, SceneError, SceneStatus};
pub use scheduler::{
    RunInfo, Scheduler, SchedulerError, SchedulerSettings, TickOutcome, DEFAULT_TICKS_PER_RUN,
};
pub use tick::{Milestone, MilestoneParseError, TickHook};
pub use world::{
    EngineActor, PartDescriptor, Rotator, Vec3, World, WorldError, ROTATION_TOLERANCE_DEGREES,
};
