use std::cell::Cell;
use std::rc::Rc;

use intphys_engine::{EngineActor, PartDescriptor, Rotator, Vec3, World, WorldError};
use tracing::{debug, info};

/// In-memory stand-in for the simulation host.
///
/// Spawned actors share a live counter with the world so leaks show up once
/// every scene has been cleared.
#[derive(Debug, Default)]
pub(crate) struct HeadlessWorld {
    live: Rc<Cell<usize>>,
    next_id: u64,
    quit_requested: bool,
}

impl HeadlessWorld {
    pub(crate) fn live_actor_count(&self) -> usize {
        self.live.get()
    }

    pub(crate) fn spawned_count(&self) -> u64 {
        self.next_id
    }

    pub(crate) fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}

impl World for HeadlessWorld {
    type Actor = HeadlessActor;

    fn spawn_actor(&mut self, part: &PartDescriptor) -> Result<HeadlessActor, WorldError> {
        let class = class_name(part.class_path).ok_or_else(|| WorldError::SpawnFailed {
            class_path: part.class_path,
            reason: "class path does not name a blueprint class".to_string(),
        })?;
        let name = format!("{class}_{}", self.next_id);
        self.next_id += 1;
        self.live.set(self.live.get() + 1);
        debug!(actor = %name, label = %part.label, "actor_spawned");

        Ok(HeadlessActor {
            name,
            location: part.location,
            rotation: normalize_rotator(part.rotation),
            hidden: true,
            live: Some(Rc::clone(&self.live)),
        })
    }

    fn quit_game(&mut self) {
        if !self.quit_requested {
            info!(live_actors = self.live.get(), "quit_requested");
        }
        self.quit_requested = true;
    }
}

#[derive(Debug)]
pub(crate) struct HeadlessActor {
    name: String,
    location: Vec3,
    rotation: Rotator,
    hidden: bool,
    live: Option<Rc<Cell<usize>>>,
}

#[cfg(test)]
impl HeadlessActor {
    pub(crate) fn location(&self) -> Vec3 {
        self.location
    }

    pub(crate) fn is_hidden(&self) -> bool {
        self.hidden
    }
}

impl EngineActor for HeadlessActor {
    fn engine_name(&self) -> &str {
        &self.name
    }

    fn set_actor_location(&mut self, location: Vec3) -> bool {
        if self.live.is_none() {
            return false;
        }
        self.location = location;
        true
    }

    /// Stores the rotation the way the host does, with every axis in (-180, 180].
    /// Reports failure whenever that differs from the request.
    fn set_actor_rotation(&mut self, rotation: Rotator) -> bool {
        if self.live.is_none() {
            return false;
        }
        self.rotation = normalize_rotator(rotation);
        self.rotation == rotation
    }

    fn actor_rotation(&self) -> Rotator {
        self.rotation
    }

    fn set_hidden_in_game(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    fn destroy(&mut self) {
        if let Some(live) = self.live.take() {
            live.set(live.get().saturating_sub(1));
        }
    }
}

/// `/Game/Object.Object_C` -> `Object`
fn class_name(class_path: &str) -> Option<&str> {
    let (_, asset) = class_path.rsplit_once('.')?;
    let class = asset.strip_suffix("_C")?;
    (!class.is_empty()).then_some(class)
}

fn normalize_rotator(rotation: Rotator) -> Rotator {
    Rotator::new(
        normalize_axis(rotation.pitch),
        normalize_axis(rotation.yaw),
        normalize_axis(rotation.roll),
    )
}

fn normalize_axis(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}
