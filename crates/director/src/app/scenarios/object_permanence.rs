use intphys_engine::{ActorControl, MagicTrick, Saver, Scenario, SceneError, SceneParams};
use rand_chacha::ChaCha8Rng;
use serde_json::json;

use super::layout::{generate_layout, pick_magic_tick, LayoutSpec, RunKind, Variant};

const MAGIC_ACTOR: &str = "object_1";

/// O1: an object should not vanish or pop into existence.
///
/// Possible runs keep the object visible (first) or absent (second) all run
/// long. Impossible runs start the same way and flip visibility at the trick.
pub(crate) struct ObjectPermanence {
    variant: Variant,
    rng: ChaCha8Rng,
    ticks_per_run: u32,
    magic_tick: Option<u32>,
}

impl ObjectPermanence {
    pub(crate) fn new(variant: Variant, rng: ChaCha8Rng, ticks_per_run: u32) -> Self {
        Self {
            variant,
            rng,
            ticks_per_run,
            magic_tick: None,
        }
    }
}

impl Scenario for ObjectPermanence {
    fn generate_parameters(&mut self) -> Result<SceneParams, SceneError> {
        if self.variant.is_train {
            let spec = LayoutSpec::random_train(&mut self.rng, self.ticks_per_run);
            return generate_layout(&mut self.rng, &spec);
        }

        let spec = LayoutSpec::for_test(&self.variant, self.ticks_per_run);
        let mut params = generate_layout(&mut self.rng, &spec)?;
        let tick = pick_magic_tick(&mut self.rng, self.ticks_per_run);
        params.set_magic(MagicTrick {
            actor: MAGIC_ACTOR.to_string(),
            tick,
        });
        self.magic_tick = Some(tick);
        Ok(params)
    }

    fn description(&self) -> String {
        format!("O1 object permanence, {}", self.variant.label())
    }

    fn nruns(&self) -> u32 {
        self.variant.nruns()
    }

    fn nchecks(&self) -> u32 {
        self.variant.nchecks()
    }

    fn is_train(&self) -> bool {
        self.variant.is_train
    }

    fn setup_magic_trick(&mut self, saver: &mut dyn Saver, actor: &mut dyn ActorControl, run: u32) {
        let kind = self.variant.run_kind(run);
        let visible_at_start = !kind.starts_altered();
        actor.set_hidden(!visible_at_start);
        saver.annotate(
            "magic",
            json!({
                "scenario": "O1",
                "actor": actor.name(),
                "tick": self.magic_tick,
                "run": run,
                "kind": kind.as_token(),
                "visible_at_start": visible_at_start,
            }),
        );
    }

    fn apply_magic_trick(&mut self, actor: &mut dyn ActorControl, run: u32) {
        if let RunKind::Impossible { .. } = self.variant.run_kind(run) {
            let hidden = actor.is_hidden();
            actor.set_hidden(!hidden);
        }
    }
}

#[cfg(test)]
mod tests {
    use intphys_engine::{Rotator, Vec3};
    use rand::SeedableRng;
    use serde_json::Value;

    use super::*;

    #[derive(Default)]
    struct Probe {
        hidden: bool,
    }

    impl ActorControl for Probe {
        fn name(&self) -> &str {
            "Object_0"
        }
        fn location(&self) -> Vec3 {
            Vec3::ZERO
        }
        fn rotation(&self) -> Rotator {
            Rotator::ZERO
        }
        fn is_hidden(&self) -> bool {
            self.hidden
        }
        fn set_location(&mut self, _location: Vec3) -> bool {
            true
        }
        fn set_rotation(&mut self, _rotation: Rotator) -> bool {
            true
        }
        fn set_hidden(&mut self, hidden: bool) {
            self.hidden = hidden;
        }
    }

    #[derive(Default)]
    struct Notes(Vec<(String, Value)>);

    impl Saver for Notes {
        fn annotate(&mut self, key: &str, value: Value) {
            self.0.push((key.to_string(), value));
        }
    }

    fn occluded_test() -> ObjectPermanence {
        ObjectPermanence::new(
            Variant {
                is_train: false,
                is_occluded: true,
                is_static: true,
                n_tricks: 1,
            },
            ChaCha8Rng::seed_from_u64(4),
            100,
        )
    }

    #[test]
    fn test_scene_targets_first_object() {
        let mut scenario = occluded_test();
        let params = scenario.generate_parameters().expect("params");
        let magic = params.magic().expect("magic trick");

        assert_eq!(magic.actor, MAGIC_ACTOR);
        assert!(params.actor(MAGIC_ACTOR).is_some());
        assert!(params.actor("occluder_1").is_some());
        assert_eq!(scenario.nruns(), 5);
    }

    #[test]
    fn visibility_per_run_kind() {
        let mut scenario = occluded_test();
        scenario.generate_parameters().expect("params");
        let mut saver = Notes::default();

        let mut timeline = Vec::new();
        for run in 1..=scenario.nruns() {
            let mut probe = Probe::default();
            scenario.setup_magic_trick(&mut saver, &mut probe, run);
            let at_start = probe.hidden;
            scenario.apply_magic_trick(&mut probe, run);
            timeline.push((at_start, probe.hidden));
        }

        assert_eq!(
            timeline,
            vec![
                (false, false),
                (false, false),
                (true, true),
                (false, true),
                (true, false),
            ]
        );
        assert_eq!(saver.0.len(), 5);
        assert_eq!(saver.0[0].1["kind"], "check");
        assert_eq!(saver.0[4].1["kind"], "impossible");
    }

    #[test]
    fn train_scene_has_no_trick() {
        let mut scenario = ObjectPermanence::new(
            Variant {
                is_train: true,
                is_occluded: false,
                is_static: false,
                n_tricks: 0,
            },
            ChaCha8Rng::seed_from_u64(4),
            100,
        );
        let params = scenario.generate_parameters().expect("params");

        assert!(params.magic().is_none());
        assert_eq!(scenario.nruns(), 1);
        assert_eq!(scenario.description(), "O1 object permanence, train");
    }
}
