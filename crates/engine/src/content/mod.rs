mod config;
mod scene_list;

pub use config::{CaseSpec, ConfigError, ScenarioConfig, ScenesConfig};
pub use scene_list::{build_scene_list, SceneDescriptor};
