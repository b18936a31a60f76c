use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{error, warn};

use super::scene::SceneError;
use super::world::{EngineActor, PartDescriptor, Rotator, Vec3, World};

const FLOOR_CLASS_PATH: &str = "/Game/Floor.Floor_C";
const LIGHT_CLASS_PATH: &str = "/Game/Light.Light_C";
const WALL_CLASS_PATH: &str = "/Game/Wall.Wall_C";
const OBJECT_CLASS_PATH: &str = "/Game/Object.Object_C";
const OCCLUDER_CLASS_PATH: &str = "/Game/Occluder.Occluder_C";

/// Edge length of the wall mesh the wall scale is computed against.
const WALL_MESH_SIZE: f32 = 400.0;
const FLOOR_SCALE: Vec3 = Vec3::new(100.0, 100.0, 1.0);
const BENIGN_HIT_PREFIX: &str = "Floor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Floor,
    Light,
    Walls,
    Object,
    Occluder,
}

impl ActorKind {
    const PREFIXES: [(&'static str, ActorKind); 5] = [
        ("floor", ActorKind::Floor),
        ("light", ActorKind::Light),
        ("object", ActorKind::Object),
        ("occluder", ActorKind::Occluder),
        ("walls", ActorKind::Walls),
    ];

    /// Resolves the actor class from a scene actor name such as `object_2`.
    pub fn from_name(name: &str) -> Result<Self, SceneError> {
        let lowered = name.to_ascii_lowercase();
        Self::PREFIXES
            .iter()
            .find(|(prefix, _)| lowered.starts_with(prefix))
            .map(|(_, kind)| *kind)
            .ok_or_else(|| SceneError::UnknownActorClass {
                name: name.to_string(),
            })
    }

    /// Objects and occluders move during a run and are snapped back on reset.
    pub fn is_moving(self) -> bool {
        matches!(self, Self::Object | Self::Occluder)
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Floor => "floor",
            Self::Light => "light",
            Self::Walls => "walls",
            Self::Object => "object",
            Self::Occluder => "occluder",
        }
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Which collision events the host should report for an actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionPolicy {
    pub overlap: bool,
    pub warning: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectShape {
    #[default]
    Sphere,
    Cube,
    Cone,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorParams {
    pub material: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightParams {
    pub location: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallsParams {
    pub depth: f32,
    pub length: f32,
    pub height: f32,
    pub material: Option<String>,
}

impl Default for WallsParams {
    fn default() -> Self {
        Self {
            depth: 1000.0,
            length: 2000.0,
            height: 1.0,
            material: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectParams {
    pub shape: ObjectShape,
    pub location: Vec3,
    pub rotation: Rotator,
    pub scale: Vec3,
    pub material: Option<String>,
    pub mass: f32,
    pub initial_force: Vec3,
    pub collision: CollisionPolicy,
}

impl Default for ObjectParams {
    fn default() -> Self {
        Self {
            shape: ObjectShape::default(),
            location: Vec3::ZERO,
            rotation: Rotator::ZERO,
            scale: Vec3::ONE,
            material: None,
            mass: 1.0,
            initial_force: Vec3::ZERO,
            collision: CollisionPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccluderParams {
    pub location: Vec3,
    pub rotation: Rotator,
    pub scale: Vec3,
    pub material: Option<String>,
    pub speed: f32,
    /// Ticks at which the occluder starts a fall or rise.
    pub moves: Vec<u32>,
    pub collision: CollisionPolicy,
}

impl Default for OccluderParams {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            rotation: Rotator::ZERO,
            scale: Vec3::ONE,
            material: None,
            speed: 1.0,
            moves: Vec::new(),
            collision: CollisionPolicy::default(),
        }
    }
}

/// Generated parameters of one scene actor, tagged by actor class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActorParams {
    Floor(FloorParams),
    Light(LightParams),
    Walls(WallsParams),
    Object(ObjectParams),
    Occluder(OccluderParams),
}

impl ActorParams {
    pub fn kind(&self) -> ActorKind {
        match self {
            Self::Floor(_) => ActorKind::Floor,
            Self::Light(_) => ActorKind::Light,
            Self::Walls(_) => ActorKind::Walls,
            Self::Object(_) => ActorKind::Object,
            Self::Occluder(_) => ActorKind::Occluder,
        }
    }

    /// Generated pose of a moving actor; static actors have none.
    pub fn initial_pose(&self) -> Option<(Vec3, Rotator)> {
        match self {
            Self::Object(params) => Some((params.location, params.rotation)),
            Self::Occluder(params) => Some((params.location, params.rotation)),
            Self::Floor(_) | Self::Light(_) | Self::Walls(_) => None,
        }
    }

    fn collision(&self) -> CollisionPolicy {
        match self {
            Self::Object(params) => params.collision,
            Self::Occluder(params) => params.collision,
            Self::Floor(_) | Self::Light(_) | Self::Walls(_) => CollisionPolicy::default(),
        }
    }

    fn details(&self) -> Map<String, Value> {
        let value = match self {
            Self::Floor(params) => json!({ "material": params.material }),
            Self::Light(_) => json!({}),
            Self::Walls(params) => json!({
                "depth": params.depth,
                "length": params.length,
                "height": params.height,
                "material": params.material,
            }),
            Self::Object(params) => json!({
                "shape": params.shape,
                "scale": params.scale,
                "material": params.material,
                "mass": params.mass,
                "initial_force": params.initial_force,
            }),
            Self::Occluder(params) => json!({
                "scale": params.scale,
                "material": params.material,
                "speed": params.speed,
                "moves": params.moves,
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// Pure description of everything needed to spawn a scene actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorDescriptor {
    pub name: String,
    pub kind: ActorKind,
    pub parts: Vec<PartDescriptor>,
    pub collision: CollisionPolicy,
    pub details: Map<String, Value>,
}

impl ActorDescriptor {
    pub fn describe(name: &str, params: &ActorParams) -> Self {
        let parts = match params {
            ActorParams::Floor(floor) => vec![PartDescriptor {
                class_path: FLOOR_CLASS_PATH,
                label: "Floor".to_string(),
                location: Vec3::ZERO,
                rotation: Rotator::ZERO,
                scale: FLOOR_SCALE,
                material: floor.material.clone(),
            }],
            ActorParams::Light(light) => vec![PartDescriptor {
                class_path: LIGHT_CLASS_PATH,
                label: "Light".to_string(),
                location: light.location,
                rotation: Rotator::ZERO,
                scale: Vec3::ONE,
                material: None,
            }],
            ActorParams::Walls(walls) => describe_walls(walls),
            ActorParams::Object(object) => vec![PartDescriptor {
                class_path: OBJECT_CLASS_PATH,
                label: "Object".to_string(),
                location: object.location,
                rotation: object.rotation,
                scale: object.scale,
                material: object.material.clone(),
            }],
            ActorParams::Occluder(occluder) => vec![PartDescriptor {
                class_path: OCCLUDER_CLASS_PATH,
                label: "Occluder".to_string(),
                location: occluder.location,
                rotation: occluder.rotation,
                scale: occluder.scale,
                material: occluder.material.clone(),
            }],
        };

        Self {
            name: name.to_string(),
            kind: params.kind(),
            parts,
            collision: params.collision(),
            details: params.details(),
        }
    }
}

fn describe_walls(walls: &WallsParams) -> Vec<PartDescriptor> {
    let half_length = walls.length / 2.0;
    let side_scale = Vec3::new(walls.depth / WALL_MESH_SIZE, 1.0, walls.height);
    let wall = |side: &str, location: Vec3, rotation: Rotator, scale: Vec3| PartDescriptor {
        class_path: WALL_CLASS_PATH,
        label: format!("Wall_{side}"),
        location,
        rotation,
        scale,
        material: walls.material.clone(),
    };

    vec![
        wall(
            "Front",
            Vec3::new(walls.depth, -half_length, 0.0),
            Rotator::new(0.0, 90.0, 0.0),
            Vec3::new(walls.length / WALL_MESH_SIZE, 1.0, walls.height),
        ),
        wall(
            "Left",
            Vec3::new(0.0, -half_length, 0.0),
            Rotator::ZERO,
            side_scale,
        ),
        wall(
            "Right",
            Vec3::new(0.0, half_length, 0.0),
            Rotator::ZERO,
            side_scale,
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorStatus {
    pub name: String,
    pub kind: ActorKind,
    pub location: Vec3,
    pub rotation: Rotator,
    pub hidden: bool,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// What a scenario may do to the actor its magic trick targets.
pub trait ActorControl {
    fn name(&self) -> &str;
    fn location(&self) -> Vec3;
    fn rotation(&self) -> Rotator;
    fn is_hidden(&self) -> bool;
    fn set_location(&mut self, location: Vec3) -> bool;
    fn set_rotation(&mut self, rotation: Rotator) -> bool;
    fn set_hidden(&mut self, hidden: bool);
}

/// A spawned scene actor: one or more engine actors plus the state the scene tracks.
#[derive(Debug)]
pub struct SceneActor<A: EngineActor> {
    name: String,
    engine_name: String,
    kind: ActorKind,
    parts: Vec<A>,
    location: Vec3,
    rotation: Rotator,
    hidden: bool,
    collision: CollisionPolicy,
    details: Map<String, Value>,
}

impl<A: EngineActor> SceneActor<A> {
    pub fn spawn<W>(world: &mut W, descriptor: ActorDescriptor) -> Result<Self, SceneError>
    where
        W: World<Actor = A>,
    {
        let mut parts = Vec::with_capacity(descriptor.parts.len());
        for part in &descriptor.parts {
            match world.spawn_actor(part) {
                Ok(actor) => parts.push(actor),
                Err(source) => {
                    for mut spawned in parts {
                        spawned.destroy();
                    }
                    return Err(SceneError::Spawn {
                        actor: descriptor.name,
                        source,
                    });
                }
            }
        }

        let engine_name = parts
            .first()
            .map(|part| part.engine_name().to_string())
            .unwrap_or_else(|| descriptor.name.clone());
        for (actor, part) in parts.iter_mut().zip(&descriptor.parts) {
            place_location(actor, part.location);
            place_rotation(actor, part.rotation);
            actor.set_hidden_in_game(false);
        }
        let (location, rotation) = descriptor
            .parts
            .first()
            .map(|part| (part.location, part.rotation))
            .unwrap_or((Vec3::ZERO, Rotator::ZERO));
        let rotation = parts
            .first()
            .map(EngineActor::actor_rotation)
            .unwrap_or(rotation);

        Ok(Self {
            name: descriptor.name,
            engine_name,
            kind: descriptor.kind,
            parts,
            location,
            rotation,
            hidden: false,
            collision: descriptor.collision,
            details: descriptor.details,
        })
    }

    pub fn kind(&self) -> ActorKind {
        self.kind
    }

    pub fn engine_name(&self) -> &str {
        &self.engine_name
    }

    pub fn is_destroyed(&self) -> bool {
        self.parts.is_empty()
    }

    /// Destroys the engine actors. Safe to call more than once.
    pub fn destroy(&mut self) {
        for mut part in self.parts.drain(..) {
            part.destroy();
        }
    }

    pub fn status(&self) -> ActorStatus {
        ActorStatus {
            name: self.engine_name.clone(),
            kind: self.kind,
            location: self.location,
            rotation: self.rotation,
            hidden: self.hidden,
            details: self.details.clone(),
        }
    }

    /// Host callback for a begin-overlap event. Returns whether it was reported.
    pub fn on_overlap(&self, other: &str) -> bool {
        if !(self.collision.warning && self.collision.overlap) {
            return false;
        }
        if other == self.engine_name {
            return false;
        }
        error!(actor = %self.engine_name, other, "actor_overlap");
        true
    }

    /// Host callback for a hit event. Hits against the floor are expected.
    pub fn on_hit(&self, other: &str) -> bool {
        if !(self.collision.warning && !self.collision.overlap) {
            return false;
        }
        if other == self.engine_name || other.starts_with(BENIGN_HIT_PREFIX) {
            return false;
        }
        error!(actor = %self.engine_name, other, "actor_hit");
        true
    }
}

impl<A: EngineActor> ActorControl for SceneActor<A> {
    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> Vec3 {
        self.location
    }

    fn rotation(&self) -> Rotator {
        self.rotation
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn set_location(&mut self, location: Vec3) -> bool {
        self.location = location;
        match self.parts.first_mut() {
            Some(part) => place_location(part, location),
            None => {
                warn!(actor = %self.name, "set_location_on_destroyed_actor");
                false
            }
        }
    }

    fn set_rotation(&mut self, rotation: Rotator) -> bool {
        let Some(part) = self.parts.first_mut() else {
            warn!(actor = %self.name, "set_rotation_on_destroyed_actor");
            return false;
        };
        let applied = place_rotation(part, rotation);
        self.rotation = part.actor_rotation();
        applied
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
        for part in &mut self.parts {
            part.set_hidden_in_game(hidden);
        }
    }
}

fn place_location<A: EngineActor>(actor: &mut A, location: Vec3) -> bool {
    if actor.set_actor_location(location) {
        return true;
    }
    warn!(
        actor = actor.engine_name(),
        x = location.x,
        y = location.y,
        z = location.z,
        "set_location_failed"
    );
    false
}

fn place_rotation<A: EngineActor>(actor: &mut A, rotation: Rotator) -> bool {
    if actor.set_actor_rotation(rotation) {
        return true;
    }
    let applied = actor.actor_rotation();
    if rotation.approx_eq(&applied) {
        return true;
    }
    warn!(
        actor = actor.engine_name(),
        asked = ?rotation,
        applied = ?applied,
        "set_rotation_failed"
    );
    false
}
