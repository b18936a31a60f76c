use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::actor::{ActorControl, ActorKind, ActorParams};
use super::scene::{SceneError, SceneStatus};
use crate::content::SceneDescriptor;

/// The one-shot scripted event of a scene: `actor` changes at `tick` of every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicTrick {
    pub actor: String,
    pub tick: u32,
}

/// Parameters generated once per scene: one entry per actor plus the optional trick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneParams {
    actors: BTreeMap<String, ActorParams>,
    magic: Option<MagicTrick>,
}

impl SceneParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an actor. Its name prefix must agree with the parameter variant.
    pub fn insert(&mut self, name: impl Into<String>, params: ActorParams) -> Result<(), SceneError> {
        let name = name.into();
        let named = ActorKind::from_name(&name)?;
        let described = params.kind();
        if named != described {
            return Err(SceneError::ActorKindMismatch {
                name,
                named,
                described,
            });
        }
        if self.actors.contains_key(&name) {
            return Err(SceneError::DuplicateActor { name });
        }
        self.actors.insert(name, params);
        Ok(())
    }

    pub fn set_magic(&mut self, magic: MagicTrick) {
        self.magic = Some(magic);
    }

    pub fn magic(&self) -> Option<&MagicTrick> {
        self.magic.as_ref()
    }

    pub fn actors(&self) -> &BTreeMap<String, ActorParams> {
        &self.actors
    }

    pub fn actor(&self, name: &str) -> Option<&ActorParams> {
        self.actors.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid { reason: String },
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Output sink handed through to scenarios while a run is set up.
pub trait Saver {
    fn annotate(&mut self, key: &str, value: Value);
}

/// A scenario generates a scene's parameters and implements its magic trick.
///
/// Train scenarios render a single run. Test scenarios render several runs of the
/// same parameters, the first `nchecks` of which are check runs.
pub trait Scenario {
    fn generate_parameters(&mut self) -> Result<SceneParams, SceneError>;
    fn description(&self) -> String;
    fn nruns(&self) -> u32;
    fn nchecks(&self) -> u32;
    fn is_train(&self) -> bool;

    /// Primes the trick actor at the start of `run`.
    fn setup_magic_trick(&mut self, saver: &mut dyn Saver, actor: &mut dyn ActorControl, run: u32);

    /// Performs the scripted change. Called once per run, at the trick tick.
    fn apply_magic_trick(&mut self, actor: &mut dyn ActorControl, run: u32);

    /// Judges whether the scene is still usable, e.g. no forbidden overlap
    /// happened or a check run went as expected. Scenarios without such rules
    /// keep the default.
    fn validate(&self, _status: &SceneStatus) -> Validity {
        Validity::Valid
    }
}

/// Builds the scenario for a scene descriptor, `None` when the id is unknown.
pub trait ScenarioFactory {
    fn create(&mut self, descriptor: &SceneDescriptor) -> Option<Box<dyn Scenario>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{FloorParams, ObjectParams};

    #[test]
    fn insert_rejects_name_and_kind_mismatch() {
        let mut params = SceneParams::new();
        let error = params
            .insert("floor", ActorParams::Object(ObjectParams::default()))
            .expect_err("mismatch");
        assert!(matches!(
            error,
            SceneError::ActorKindMismatch {
                named: ActorKind::Floor,
                described: ActorKind::Object,
                ..
            }
        ));
    }

    #[test]
    fn insert_rejects_unknown_prefix_and_duplicates() {
        let mut params = SceneParams::new();
        assert!(matches!(
            params.insert("camera", ActorParams::Floor(FloorParams::default())),
            Err(SceneError::UnknownActorClass { .. })
        ));

        params
            .insert("floor", ActorParams::Floor(FloorParams::default()))
            .expect("first floor");
        assert!(matches!(
            params.insert("floor", ActorParams::Floor(FloorParams::default())),
            Err(SceneError::DuplicateActor { .. })
        ));
        assert_eq!(params.actors().len(), 1);
    }

    #[test]
    fn magic_is_separate_from_actors() {
        let mut params = SceneParams::new();
        params
            .insert("object_1", ActorParams::Object(ObjectParams::default()))
            .expect("object");
        params.set_magic(MagicTrick {
            actor: "object_1".to_string(),
            tick: 42,
        });

        assert_eq!(params.actors().len(), 1);
        assert_eq!(params.magic().map(|magic| magic.tick), Some(42));
    }
}
