use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod content;
pub mod output;
#[cfg(test)]
mod testing;

pub use app::{
    ActorControl, ActorDescriptor, ActorKind, ActorParams, ActorStatus, CollisionPolicy,
    EngineActor, FloorParams, LightParams, MagicTrick, Milestone, MilestoneParseError,
    ObjectParams, ObjectShape, OccluderParams, PartDescriptor, Rotator, RunInfo, Saver, Scenario,
    ScenarioFactory, Scene, SceneActor, SceneError, SceneParams, SceneStatus, Scheduler,
    SchedulerError, SchedulerSettings, TickHook, TickOutcome, Validity, Vec3, WallsParams, World,
    WorldError, DEFAULT_TICKS_PER_RUN, ROTATION_TOLERANCE_DEGREES,
};
pub use content::{
    build_scene_list, CaseSpec, ConfigError, ScenarioConfig, SceneDescriptor, ScenesConfig,
};
pub use output::{
    hash_scene_list, OutputError, RunManifest, StatusRecorder, MANIFEST_FILE_NAME,
    STATUS_FILE_NAME,
};

pub const ROOT_ENV_VAR: &str = "INTPHYS_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("{var} is set but {path} is not a project root (expected Cargo.toml and crates/)")]
    InvalidEnvRoot { var: &'static str, path: PathBuf },
    #[error(
        "no project root above {start_dir} (expected Cargo.toml and crates/); set {env_var} to the checkout"
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

/// Root-relative paths used when the command line does not override them.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let output_dir = root.join("output");
    Ok(AppPaths { root, output_dir })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let candidate = normalize_path(Path::new(&value));
            if is_project_root(&candidate) {
                Ok(candidate)
            } else {
                Err(StartupError::InvalidEnvRoot {
                    var: ROOT_ENV_VAR,
                    path: candidate,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            exe_dir
                .ancestors()
                .find(|candidate| is_project_root(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(&exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_project_root(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && path.join("crates").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_root_needs_manifest_and_crates_dir() {
        let temp = tempfile::tempdir().expect("temp dir");
        assert!(!is_project_root(temp.path()));

        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("manifest");
        assert!(!is_project_root(temp.path()));

        fs::create_dir(temp.path().join("crates")).expect("crates dir");
        assert!(is_project_root(temp.path()));
    }
}
