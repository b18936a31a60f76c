use std::process::ExitCode;
use std::time::{Duration, Instant};

use intphys_engine::{
    ConfigError, OutputError, RunInfo, RunManifest, SchedulerError, StartupError, TickOutcome,
};
use thiserror::Error;
use tracing::{error, info, warn};

use super::bootstrap::{AppWiring, DirectorScheduler};
use super::metrics::MetricsAccumulator;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("invalid scenes configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("scheduling failed: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("failed to record output: {0}")]
    Output(#[from] OutputError),
    #[error("{count} actors still alive after the last scene")]
    LeakedActors { count: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RunSummary {
    pub(crate) scene_count: usize,
    pub(crate) runs_recorded: usize,
    pub(crate) ticks: u64,
    pub(crate) elapsed: Duration,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match run_director(app) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "director_failed");
            ExitCode::FAILURE
        }
    }
}

/// Plays every scheduled run as fast as possible with a fixed `dt`.
pub(crate) fn run_director(app: AppWiring) -> Result<RunSummary, AppError> {
    let AppWiring {
        config,
        mut scheduler,
    } = app;
    let tps = config.tps.max(1);
    let dt = 1.0 / f64::from(tps);

    if !scheduler.saver().is_dry() {
        let manifest = RunManifest::new(
            scheduler.descriptors(),
            scheduler.total_runs(),
            scheduler.ticks_per_run(),
            config.seed,
        );
        let path = manifest.write(scheduler.saver().output_dir())?;
        info!(
            path = %path.display(),
            scene_list_sha256 = %manifest.scene_list_sha256_hex,
            "manifest_written"
        );
    }
    info!(
        tps,
        ticks_per_run = scheduler.ticks_per_run(),
        scene_count = scheduler.scene_count(),
        total_runs = scheduler.total_runs(),
        dry = scheduler.saver().is_dry(),
        "loop_config"
    );

    if let Some(run) = scheduler.active_run() {
        begin_run(&mut scheduler, &run)?;
    }

    let started = Instant::now();
    let mut metrics = MetricsAccumulator::new(config.metrics_log_interval, started);
    let mut ticks = 0_u64;
    loop {
        if let Some(status) = scheduler.scene_status() {
            let tick = scheduler.current_tick();
            scheduler.saver_mut().capture(tick, &status);
        }

        let tick_started = Instant::now();
        let outcome = scheduler.tick(dt)?;
        metrics.record_tick(tick_started.elapsed());
        ticks += 1;

        match outcome {
            TickOutcome::Continue { .. } => {}
            TickOutcome::RunStarted(run) => {
                scheduler.saver_mut().finish_run()?;
                metrics.record_run();
                begin_run(&mut scheduler, &run)?;
            }
            TickOutcome::Exhausted => {
                scheduler.saver_mut().finish_run()?;
                break;
            }
        }

        if let Some(snapshot) = metrics.maybe_snapshot(Instant::now()) {
            info!(
                tps = snapshot.tps,
                runs_per_second = snapshot.runs_per_second,
                tick_time_us = snapshot.tick_time_us,
                "loop_metrics"
            );
        }
    }

    let live = scheduler.world().live_actor_count();
    if live != 0 {
        return Err(AppError::LeakedActors { count: live });
    }
    if !scheduler.world().quit_requested() {
        warn!("scheduler_exhausted_without_quit");
    }

    let summary = RunSummary {
        scene_count: scheduler.scene_count(),
        runs_recorded: scheduler.saver().runs_finished(),
        ticks,
        elapsed: started.elapsed(),
    };
    info!(
        scene_count = summary.scene_count,
        runs = summary.runs_recorded,
        ticks = summary.ticks,
        spawned_actors = scheduler.world().spawned_count(),
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "director_finished"
    );
    Ok(summary)
}

fn begin_run(scheduler: &mut DirectorScheduler, run: &RunInfo) -> Result<(), AppError> {
    info!(
        scene = run.scene_index + 1,
        scene_count = run.scene_count,
        run = run.run,
        nruns = run.nruns,
        check = run.is_check,
        description = %run.description,
        "run_started"
    );
    scheduler.saver_mut().begin_run(run)?;
    Ok(())
}
