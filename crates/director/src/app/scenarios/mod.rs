mod continuity;
mod layout;
mod object_permanence;

use std::str::FromStr;

use intphys_engine::{Scenario, ScenarioFactory, SceneDescriptor};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use continuity::SpatiotemporalContinuity;
use layout::Variant;
use object_permanence::ObjectPermanence;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScenarioId {
    O1,
    O3,
}

impl FromStr for ScenarioId {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "O1" => Ok(Self::O1),
            "O3" => Ok(Self::O3),
            other => Err(format!("unknown scenario id '{other}' (expected O1 or O3)")),
        }
    }
}

/// Builds scenarios for scene descriptors.
///
/// Scene `n` draws from stream `n` of a ChaCha8 generator seeded with the base
/// seed, so a scene's parameters only depend on the seed and its position.
/// Magic tricks are placed inside the run budget the scheduler plays.
#[derive(Debug)]
pub(crate) struct DirectorScenarioFactory {
    base_seed: u64,
    ticks_per_run: u32,
    created: u64,
}

impl DirectorScenarioFactory {
    pub(crate) fn new(base_seed: u64, ticks_per_run: u32) -> Self {
        Self {
            base_seed,
            ticks_per_run,
            created: 0,
        }
    }

    fn next_rng(&mut self) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.base_seed);
        rng.set_stream(self.created);
        self.created += 1;
        rng
    }
}

impl ScenarioFactory for DirectorScenarioFactory {
    fn create(&mut self, descriptor: &SceneDescriptor) -> Option<Box<dyn Scenario>> {
        let id = match descriptor.scenario_id.parse::<ScenarioId>() {
            Ok(id) => id,
            Err(reason) => {
                debug!(reason = %reason, "scenario_lookup_failed");
                return None;
            }
        };
        let variant = Variant::from(descriptor);
        let rng = self.next_rng();
        let scenario: Box<dyn Scenario> = match id {
            ScenarioId::O1 => Box::new(ObjectPermanence::new(variant, rng, self.ticks_per_run)),
            ScenarioId::O3 => Box::new(SpatiotemporalContinuity::new(
                variant,
                rng,
                self.ticks_per_run,
            )),
        };
        Some(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occluded(scenario_id: &str, n_tricks: u8) -> SceneDescriptor {
        SceneDescriptor {
            scenario_id: scenario_id.to_string(),
            is_train: false,
            is_occluded: true,
            is_static: false,
            n_tricks,
        }
    }

    #[test]
    fn known_ids_resolve_and_unknown_ids_do_not() {
        let mut factory = DirectorScenarioFactory::new(1, 100);
        assert!(factory.create(&SceneDescriptor::train("O1")).is_some());
        assert!(factory.create(&SceneDescriptor::train("O3")).is_some());
        assert!(factory.create(&SceneDescriptor::train("O2")).is_none());
        assert_eq!("O1".parse::<ScenarioId>(), Ok(ScenarioId::O1));
    }

    #[test]
    fn run_counts_follow_the_descriptor() {
        let mut factory = DirectorScenarioFactory::new(1, 100);
        let train = factory.create(&SceneDescriptor::train("O1")).expect("train");
        let test = factory.create(&occluded("O3", 2)).expect("test");

        assert_eq!((train.nruns(), train.nchecks(), train.is_train()), (1, 0, true));
        assert_eq!((test.nruns(), test.nchecks(), test.is_train()), (6, 2, false));
    }

    #[test]
    fn parameters_depend_on_seed_and_position() {
        let generate = |seed: u64, skip: usize| {
            let mut factory = DirectorScenarioFactory::new(seed, 100);
            for _ in 0..skip {
                factory.create(&occluded("O1", 1)).expect("skipped scene");
            }
            factory
                .create(&occluded("O1", 1))
                .expect("scene")
                .generate_parameters()
                .expect("params")
        };

        assert_eq!(generate(7, 0), generate(7, 0));
        assert_ne!(generate(7, 0), generate(8, 0));
        assert_ne!(generate(7, 0), generate(7, 1));
    }

    #[test]
    fn magic_tick_fits_a_short_run() {
        for ticks_per_run in [1, 2, 5, 12] {
            let mut factory = DirectorScenarioFactory::new(3, ticks_per_run);
            for descriptor in [occluded("O1", 1), occluded("O3", 2)] {
                let params = factory
                    .create(&descriptor)
                    .expect("scenario")
                    .generate_parameters()
                    .expect("params");
                let magic = params.magic().expect("test scenes have a trick");
                assert!(
                    magic.tick < ticks_per_run,
                    "tick {} in a run of {ticks_per_run}",
                    magic.tick
                );
            }
        }
    }
}
