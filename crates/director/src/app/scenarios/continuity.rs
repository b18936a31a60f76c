use intphys_engine::{ActorControl, MagicTrick, Saver, Scenario, SceneError, SceneParams, Vec3};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;

use super::layout::{generate_layout, pick_magic_tick, LayoutSpec, RunKind, Variant};

const MAGIC_ACTOR: &str = "object_1";

/// O3: an object should not jump from one place to another.
///
/// The second possible run starts the object at the teleport destination.
/// Impossible runs start like the possible ones and jump at the trick.
pub(crate) struct SpatiotemporalContinuity {
    variant: Variant,
    rng: ChaCha8Rng,
    ticks_per_run: u32,
    magic_tick: Option<u32>,
    teleport: Vec3,
}

impl SpatiotemporalContinuity {
    pub(crate) fn new(variant: Variant, rng: ChaCha8Rng, ticks_per_run: u32) -> Self {
        Self {
            variant,
            rng,
            ticks_per_run,
            magic_tick: None,
            teleport: Vec3::ZERO,
        }
    }

    fn reversed_teleport(&self) -> Vec3 {
        Vec3::new(-self.teleport.x, -self.teleport.y, -self.teleport.z)
    }
}

impl Scenario for SpatiotemporalContinuity {
    fn generate_parameters(&mut self) -> Result<SceneParams, SceneError> {
        if self.variant.is_train {
            let spec = LayoutSpec::random_train(&mut self.rng, self.ticks_per_run);
            return generate_layout(&mut self.rng, &spec);
        }

        let spec = LayoutSpec::for_test(&self.variant, self.ticks_per_run);
        let mut params = generate_layout(&mut self.rng, &spec)?;
        let tick = pick_magic_tick(&mut self.rng, self.ticks_per_run);
        let distance: f32 = self.rng.gen_range(150.0..300.0);
        let side = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        self.teleport = Vec3::new(0.0, distance * side, 0.0);
        self.magic_tick = Some(tick);
        params.set_magic(MagicTrick {
            actor: MAGIC_ACTOR.to_string(),
            tick,
        });
        Ok(params)
    }

    fn description(&self) -> String {
        format!("O3 spatiotemporal continuity, {}", self.variant.label())
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
        actor.set_hidden(false);
        if kind.starts_altered() {
            let start = actor.location().offset(self.teleport);
            actor.set_location(start);
        }
        let start = actor.location();
        saver.annotate(
            "magic",
            json!({
                "scenario": "O3",
                "actor": actor.name(),
                "tick": self.magic_tick,
                "run": run,
                "kind": kind.as_token(),
                "start": start,
                "teleport": self.teleport,
            }),
        );
    }

    fn apply_magic_trick(&mut self, actor: &mut dyn ActorControl, run: u32) {
        let delta = match self.variant.run_kind(run) {
            RunKind::Impossible { first: true } => self.teleport,
            RunKind::Impossible { first: false } => self.reversed_teleport(),
            RunKind::Check | RunKind::Possible { .. } => return,
        };
        let destination = actor.location().offset(delta);
        actor.set_location(destination);
    }
}

#[cfg(test)]
mod tests {
    use intphys_engine::Rotator;
    use rand::SeedableRng;
    use serde_json::Value;

    use super::*;

    struct Probe {
        location: Vec3,
    }

    impl ActorControl for Probe {
        fn name(&self) -> &str {
            "Object_0"
        }
        fn location(&self) -> Vec3 {
            self.location
        }
        fn rotation(&self) -> Rotator {
            Rotator::ZERO
        }
        fn is_hidden(&self) -> bool {
            false
        }
        fn set_location(&mut self, location: Vec3) -> bool {
            self.location = location;
            true
        }
        fn set_rotation(&mut self, _rotation: Rotator) -> bool {
            true
        }
        fn set_hidden(&mut self, _hidden: bool) {}
    }

    struct Discard;

    impl Saver for Discard {
        fn annotate(&mut self, _key: &str, _value: Value) {}
    }

    #[test]
    fn impossible_runs_jump_at_the_trick() {
        let mut scenario = SpatiotemporalContinuity::new(
            Variant {
                is_train: false,
                is_occluded: false,
                is_static: true,
                n_tricks: 1,
            },
            ChaCha8Rng::seed_from_u64(11),
            100,
        );
        scenario.generate_parameters().expect("params");
        let origin = Vec3::new(600.0, 0.0, 50.0);
        let moved = origin.offset(scenario.teleport);
        assert!(scenario.teleport.y.abs() >= 150.0);

        let mut journeys = Vec::new();
        for run in 1..=scenario.nruns() {
            let mut probe = Probe { location: origin };
            scenario.setup_magic_trick(&mut Discard, &mut probe, run);
            let start = probe.location;
            scenario.apply_magic_trick(&mut probe, run);
            journeys.push((start, probe.location));
        }

        assert_eq!(
            journeys,
            vec![
                (origin, origin),
                (moved, moved),
                (origin, moved),
                (moved, origin),
            ]
        );
    }

    #[test]
    fn description_names_the_variant() {
        let scenario = SpatiotemporalContinuity::new(
            Variant {
                is_train: false,
                is_occluded: true,
                is_static: false,
                n_tricks: 2,
            },
            ChaCha8Rng::seed_from_u64(0),
            100,
        );
        assert_eq!(
            scenario.description(),
            "O3 spatiotemporal continuity, test, occluded, dynamic, 2 tricks"
        );
        assert_eq!(scenario.nruns(), 6);
        assert_eq!(scenario.nchecks(), 2);
    }
}
