use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rotation tolerance accepted when the engine refuses an exact rotation.
pub const ROTATION_TOLERANCE_DEGREES: f32 = 1e-3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const ONE: Vec3 = Vec3 {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, delta: Vec3) -> Self {
        Self {
            x: self.x + delta.x,
            y: self.y + delta.y,
            z: self.z + delta.z,
        }
    }
}

/// Euler rotation in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Rotator = Rotator {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn max_axis_delta(&self, other: &Rotator) -> f32 {
        (self.pitch - other.pitch)
            .abs()
            .max((self.yaw - other.yaw).abs())
            .max((self.roll - other.roll).abs())
    }

    pub fn approx_eq(&self, other: &Rotator) -> bool {
        self.max_axis_delta(other) <= ROTATION_TOLERANCE_DEGREES
    }
}

/// One engine-side actor to spawn. Composite scene actors (walls) spawn several.
#[derive(Debug, Clone, PartialEq)]
pub struct PartDescriptor {
    pub class_path: &'static str,
    pub label: String,
    pub location: Vec3,
    pub rotation: Rotator,
    pub scale: Vec3,
    pub material: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("failed to spawn actor of class {class_path}: {reason}")]
    SpawnFailed {
        class_path: &'static str,
        reason: String,
    },
}

/// Raw binding to an actor living inside the host engine.
///
/// Setters report the engine's own verdict. `set_actor_rotation` is strict:
/// it fails whenever the applied rotation differs from the request at all.
pub trait EngineActor {
    fn engine_name(&self) -> &str;
    fn set_actor_location(&mut self, location: Vec3) -> bool;
    fn set_actor_rotation(&mut self, rotation: Rotator) -> bool;
    fn actor_rotation(&self) -> Rotator;
    fn set_hidden_in_game(&mut self, hidden: bool);
    fn destroy(&mut self);
}

/// Handle to the host world. Scenes use it to spawn actors and never own it.
pub trait World {
    type Actor: EngineActor;

    fn spawn_actor(&mut self, part: &PartDescriptor) -> Result<Self::Actor, WorldError>;
    fn quit_game(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotator_tolerance_is_per_axis() {
        let asked = Rotator::new(10.0, 20.0, 30.0);
        assert!(asked.approx_eq(&Rotator::new(10.0005, 19.9995, 30.0)));
        assert!(!asked.approx_eq(&Rotator::new(10.0, 20.0, 30.01)));
    }

    #[test]
    fn vec3_offset_adds_componentwise() {
        let moved = Vec3::new(1.0, 2.0, 3.0).offset(Vec3::new(0.5, -2.0, 1.0));
        assert_eq!(moved, Vec3::new(1.5, 0.0, 4.0));
    }
}
