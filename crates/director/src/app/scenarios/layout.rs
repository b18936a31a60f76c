use std::ops::RangeInclusive;

use intphys_engine::{
    ActorParams, CollisionPolicy, FloorParams, LightParams, ObjectParams, ObjectShape,
    OccluderParams, Rotator, SceneDescriptor, SceneError, SceneParams, Vec3, WallsParams,
};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Runs of a test scene after its check runs: two possible, two impossible.
pub(crate) const TEST_RUNS: u32 = 4;

const MATERIALS: [&str; 5] = [
    "/Game/Materials/Wood",
    "/Game/Materials/Marble",
    "/Game/Materials/Metal",
    "/Game/Materials/Ceramic",
    "/Game/Materials/Fabric",
];
const SHAPES: [ObjectShape; 3] = [ObjectShape::Sphere, ObjectShape::Cube, ObjectShape::Cone];
const OBJECT_REST_HEIGHT: f32 = 50.0;
const OCCLUDER_GAP: f32 = 250.0;
const OCCLUDER_FIRST_MOVE_TICK: u32 = 5;

/// Scene flags a scenario needs from its descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Variant {
    pub(crate) is_train: bool,
    pub(crate) is_occluded: bool,
    pub(crate) is_static: bool,
    pub(crate) n_tricks: u8,
}

impl From<&SceneDescriptor> for Variant {
    fn from(descriptor: &SceneDescriptor) -> Self {
        Self {
            is_train: descriptor.is_train,
            is_occluded: descriptor.is_occluded,
            is_static: descriptor.is_static,
            n_tricks: descriptor.n_tricks,
        }
    }
}

/// Role of one run of a test scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunKind {
    Check,
    Possible { first: bool },
    Impossible { first: bool },
}

impl RunKind {
    pub(crate) fn as_token(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Possible { .. } => "possible",
            Self::Impossible { .. } => "impossible",
        }
    }

    /// Whether the trick actor starts the run in its alternate state.
    pub(crate) fn starts_altered(self) -> bool {
        matches!(
            self,
            Self::Possible { first: false } | Self::Impossible { first: false }
        )
    }
}

impl Variant {
    /// Occluded test scenes need one check run per trick to see the hidden events.
    pub(crate) fn nchecks(&self) -> u32 {
        if !self.is_train && self.is_occluded {
            u32::from(self.n_tricks)
        } else {
            0
        }
    }

    pub(crate) fn nruns(&self) -> u32 {
        if self.is_train {
            1
        } else {
            TEST_RUNS + self.nchecks()
        }
    }

    pub(crate) fn run_kind(&self, run: u32) -> RunKind {
        let nchecks = self.nchecks();
        if run <= nchecks {
            return RunKind::Check;
        }
        match run - nchecks {
            1 => RunKind::Possible { first: true },
            2 => RunKind::Possible { first: false },
            3 => RunKind::Impossible { first: true },
            _ => RunKind::Impossible { first: false },
        }
    }

    pub(crate) fn label(&self) -> String {
        if self.is_train {
            return "train".to_string();
        }
        let visibility = if self.is_occluded { "occluded" } else { "visible" };
        let motion = if self.is_static { "static" } else { "dynamic" };
        let tricks = if self.n_tricks == 2 { "2 tricks" } else { "1 trick" };
        format!("test, {visibility}, {motion}, {tricks}")
    }
}

/// What to put in a scene besides the floor, light and walls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LayoutSpec {
    pub(crate) object_count: u32,
    pub(crate) occluder_count: u32,
    pub(crate) is_static: bool,
    pub(crate) ticks_per_run: u32,
}

impl LayoutSpec {
    /// Train scenes mix object and occluder counts freely.
    pub(crate) fn random_train(rng: &mut ChaCha8Rng, ticks_per_run: u32) -> Self {
        Self {
            object_count: rng.gen_range(1..=3),
            occluder_count: rng.gen_range(0..=2),
            is_static: rng.gen_bool(0.5),
            ticks_per_run,
        }
    }

    /// Test scenes have a single object, hidden behind one occluder when occluded.
    pub(crate) fn for_test(variant: &Variant, ticks_per_run: u32) -> Self {
        Self {
            object_count: 1,
            occluder_count: u32::from(variant.is_occluded),
            is_static: variant.is_static,
            ticks_per_run,
        }
    }
}

/// Ticks at which a magic trick may happen in a run of `ticks_per_run` ticks.
///
/// The middle three fifths of the run, so the trick has frames on both sides.
/// Never reaches the last tick, whose outcome no frame records.
pub(crate) fn magic_tick_range(ticks_per_run: u32) -> RangeInclusive<u32> {
    let start = ticks_per_run / 5;
    let end = (ticks_per_run - start)
        .min(ticks_per_run.saturating_sub(2))
        .max(start);
    start..=end
}

pub(crate) fn generate_layout(
    rng: &mut ChaCha8Rng,
    spec: &LayoutSpec,
) -> Result<SceneParams, SceneError> {
    let mut params = SceneParams::new();
    params.insert(
        "floor",
        ActorParams::Floor(FloorParams {
            material: Some(pick_material(rng)),
        }),
    )?;
    params.insert(
        "light",
        ActorParams::Light(LightParams {
            location: Vec3::new(
                rng.gen_range(-200.0..200.0),
                rng.gen_range(-200.0..200.0),
                rng.gen_range(800.0..1200.0),
            ),
        }),
    )?;
    params.insert(
        "walls",
        ActorParams::Walls(WallsParams {
            depth: rng.gen_range(1000.0..1500.0),
            length: rng.gen_range(1500.0..2500.0),
            height: rng.gen_range(1.0..3.0),
            material: Some(pick_material(rng)),
        }),
    )?;

    let mut object_locations = Vec::new();
    for index in 1..=spec.object_count {
        let object = random_object(rng, spec.is_static);
        object_locations.push(object.location);
        params.insert(format!("object_{index}"), ActorParams::Object(object))?;
    }
    for index in 1..=spec.occluder_count {
        let target = object_locations
            .get(index as usize - 1)
            .copied()
            .unwrap_or_else(|| Vec3::new(rng.gen_range(500.0..900.0), 0.0, 0.0));
        let occluder = occluder_in_front_of(rng, target, spec);
        params.insert(format!("occluder_{index}"), ActorParams::Occluder(occluder))?;
    }
    Ok(params)
}

pub(crate) fn pick_magic_tick(rng: &mut ChaCha8Rng, ticks_per_run: u32) -> u32 {
    rng.gen_range(magic_tick_range(ticks_per_run))
}

fn pick_material(rng: &mut ChaCha8Rng) -> String {
    MATERIALS
        .choose(rng)
        .copied()
        .unwrap_or(MATERIALS[0])
        .to_string()
}

fn random_object(rng: &mut ChaCha8Rng, is_static: bool) -> ObjectParams {
    let scale = rng.gen_range(0.8..1.5);
    let initial_force = if is_static {
        Vec3::ZERO
    } else {
        let push: f32 = rng.gen_range(5.0e4..1.0e5);
        let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        Vec3::new(0.0, push * direction, 0.0)
    };

    ObjectParams {
        shape: SHAPES.choose(rng).copied().unwrap_or_default(),
        location: Vec3::new(
            rng.gen_range(500.0..900.0),
            rng.gen_range(-400.0..400.0),
            OBJECT_REST_HEIGHT,
        ),
        rotation: Rotator::new(0.0, rng.gen_range(-179.0..179.0), 0.0),
        scale: Vec3::new(scale, scale, scale),
        material: Some(pick_material(rng)),
        mass: rng.gen_range(1.0..5.0),
        initial_force,
        collision: CollisionPolicy {
            overlap: false,
            warning: true,
        },
    }
}

fn occluder_in_front_of(rng: &mut ChaCha8Rng, target: Vec3, spec: &LayoutSpec) -> OccluderParams {
    let moves = if spec.is_static {
        Vec::new()
    } else {
        let last_trick = *magic_tick_range(spec.ticks_per_run).end();
        vec![
            OCCLUDER_FIRST_MOVE_TICK.min(last_trick),
            rng.gen_range(last_trick + 1..=last_trick + 10),
        ]
    };

    OccluderParams {
        location: Vec3::new(target.x - OCCLUDER_GAP, target.y, 0.0),
        rotation: Rotator::new(0.0, 90.0, 0.0),
        scale: Vec3::new(rng.gen_range(1.0..2.0), 1.0, rng.gen_range(1.0..2.0)),
        material: Some(pick_material(rng)),
        speed: rng.gen_range(1.0..2.0),
        moves,
        collision: CollisionPolicy {
            overlap: true,
            warning: true,
        },
    }
}
