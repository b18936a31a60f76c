use serde::{Deserialize, Serialize};

use super::config::{CaseSpec, ScenesConfig};

const OCCLUDED_MARKER: &str = "occluded";
const STATIC_MARKER: &str = "static";

/// What to build for one scene. Immutable once the scene list exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub scenario_id: String,
    pub is_train: bool,
    pub is_occluded: bool,
    pub is_static: bool,
    /// 0 for train scenes, 1 or 2 for test scenes.
    pub n_tricks: u8,
}

impl SceneDescriptor {
    pub fn train(scenario_id: impl Into<String>) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            is_train: true,
            is_occluded: false,
            is_static: false,
            n_tricks: 0,
        }
    }

    fn test(scenario_id: &str, case: &str, condition: &str) -> Self {
        Self {
            scenario_id: scenario_id.to_string(),
            is_train: false,
            is_occluded: case.contains(OCCLUDED_MARKER),
            is_static: condition.contains(STATIC_MARKER),
            n_tricks: if condition.ends_with('2') { 2 } else { 1 },
        }
    }
}

/// Expands the configuration into the ordered scene list, one descriptor per scene.
pub fn build_scene_list(config: &ScenesConfig) -> Vec<SceneDescriptor> {
    let mut scenes = Vec::new();
    for scenario in config.scenarios() {
        let scenario_id = scenario.scenario_id();
        for (case, spec) in scenario.cases() {
            match spec {
                CaseSpec::Count(count) => {
                    scenes.extend((0..*count).map(|_| SceneDescriptor::train(scenario_id)));
                }
                CaseSpec::Conditions(conditions) => {
                    for (condition, count) in conditions {
                        let descriptor = SceneDescriptor::test(scenario_id, case, condition);
                        scenes.extend((0..*count).map(|_| descriptor.clone()));
                    }
                }
            }
        }
    }
    scenes
}
