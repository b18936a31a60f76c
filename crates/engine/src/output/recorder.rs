use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::atomic_io::write_json_atomic;
use super::OutputError;
use crate::app::{RunInfo, Saver, SceneStatus};

pub const STATUS_FILE_NAME: &str = "status.json";

#[derive(Debug, Serialize)]
struct StatusFrame {
    tick: u32,
    actors: SceneStatus,
}

#[derive(Debug)]
struct ActiveRun {
    info: RunInfo,
    annotations: Map<String, Value>,
    frames: Vec<StatusFrame>,
    frame_count: usize,
}

#[derive(Serialize)]
struct RunRecord<'a> {
    header: &'a RunInfo,
    annotations: &'a Map<String, Value>,
    frames: &'a [StatusFrame],
}

/// Collects per-tick actor status and writes one `status.json` per run.
///
/// Scenarios annotate while the scheduler sets a run up, which happens before
/// the host learns the run started. Those annotations are held until the next
/// [`StatusRecorder::begin_run`].
#[derive(Debug)]
pub struct StatusRecorder {
    output_dir: PathBuf,
    dry: bool,
    pending_annotations: Map<String, Value>,
    active: Option<ActiveRun>,
    runs_finished: usize,
}

impl StatusRecorder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            dry: false,
            pending_annotations: Map::new(),
            active: None,
            runs_finished: 0,
        }
    }

    /// A recorder that tracks runs but never touches the disk.
    pub fn dry() -> Self {
        Self {
            dry: true,
            ..Self::new(PathBuf::new())
        }
    }

    pub fn is_dry(&self) -> bool {
        self.dry
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn runs_finished(&self) -> usize {
        self.runs_finished
    }

    pub fn active_run(&self) -> Option<&RunInfo> {
        self.active.as_ref().map(|run| &run.info)
    }

    /// Starts recording `info`. A run still open is finished first so its
    /// frames reach the disk.
    pub fn begin_run(&mut self, info: &RunInfo) -> Result<(), OutputError> {
        if let Some(previous) = &self.active {
            warn!(
                scene_index = previous.info.scene_index,
                run = previous.info.run,
                "run_finished_implicitly"
            );
            self.finish_run()?;
        }
        self.active = Some(ActiveRun {
            info: info.clone(),
            annotations: std::mem::take(&mut self.pending_annotations),
            frames: Vec::new(),
            frame_count: 0,
        });
        Ok(())
    }

    pub fn capture(&mut self, tick: u32, status: &SceneStatus) {
        let Some(run) = self.active.as_mut() else {
            return;
        };
        run.frame_count += 1;
        if !self.dry {
            run.frames.push(StatusFrame {
                tick,
                actors: status.clone(),
            });
        }
    }

    /// Ends the active run. Returns the written file, if any.
    pub fn finish_run(&mut self) -> Result<Option<PathBuf>, OutputError> {
        let Some(run) = self.active.take() else {
            return Ok(None);
        };
        self.runs_finished += 1;
        if self.dry {
            debug!(
                scene_index = run.info.scene_index,
                run = run.info.run,
                frames = run.frame_count,
                "run_finished_dry"
            );
            return Ok(None);
        }

        let path = self.run_dir(&run.info).join(STATUS_FILE_NAME);
        let record = RunRecord {
            header: &run.info,
            annotations: &run.annotations,
            frames: &run.frames,
        };
        write_json_atomic(&path, &record)?;
        debug!(
            path = %path.display(),
            frames = run.frame_count,
            "run_status_written"
        );
        Ok(Some(path))
    }

    pub fn run_dir(&self, info: &RunInfo) -> PathBuf {
        self.output_dir
            .join(format!("{:03}_{}", info.scene_index + 1, info.scenario_id))
            .join(format!("run_{}", info.run))
    }
}

impl Saver for StatusRecorder {
    fn annotate(&mut self, key: &str, value: Value) {
        self.pending_annotations.insert(key.to_string(), value);
    }
}
