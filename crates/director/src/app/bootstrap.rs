use std::path::PathBuf;
use std::time::Duration;

use intphys_engine::{
    resolve_app_paths, Scheduler, SchedulerSettings, ScenesConfig, StatusRecorder,
    DEFAULT_TICKS_PER_RUN,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::headless::HeadlessWorld;
use super::loop_runner::AppError;
use super::scenarios::DirectorScenarioFactory;

pub(crate) type DirectorScheduler = Scheduler<HeadlessWorld, StatusRecorder>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DirectorConfig {
    pub(crate) scenes_path: PathBuf,
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) seed: u64,
    pub(crate) ticks_per_run: u32,
    pub(crate) tps: u32,
    pub(crate) dry: bool,
    pub(crate) metrics_log_interval: Duration,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            scenes_path: PathBuf::new(),
            output_dir: None,
            seed: 0,
            ticks_per_run: DEFAULT_TICKS_PER_RUN,
            tps: 60,
            dry: false,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CliCommand {
    Run(DirectorConfig),
    Help,
}

pub(crate) struct AppWiring {
    pub(crate) config: DirectorConfig,
    pub(crate) scheduler: DirectorScheduler,
}

pub(crate) fn parse_args(args: &[String]) -> Result<CliCommand, String> {
    if args.is_empty() {
        return Err("missing scenes configuration path".to_string());
    }

    let mut config = DirectorConfig::default();
    let mut scenes_path = None;
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "--output-dir" => {
                let value = flag_value(args, index, "--output-dir")?;
                config.output_dir = Some(PathBuf::from(value));
                index += 2;
            }
            "--seed" => {
                let value = flag_value(args, index, "--seed")?;
                config.seed = value
                    .parse::<u64>()
                    .map_err(|_| format!("invalid --seed value '{value}' (expected u64)"))?;
                index += 2;
            }
            "--ticks-per-run" => {
                let value = flag_value(args, index, "--ticks-per-run")?;
                config.ticks_per_run = parse_positive(value, "--ticks-per-run")?;
                index += 2;
            }
            "--tps" => {
                let value = flag_value(args, index, "--tps")?;
                config.tps = parse_positive(value, "--tps")?;
                index += 2;
            }
            "--dry" => {
                config.dry = true;
                index += 1;
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option '{flag}'")),
            path => {
                if scenes_path.is_some() {
                    return Err(format!("unexpected argument '{path}'"));
                }
                scenes_path = Some(PathBuf::from(path));
                index += 1;
            }
        }
    }

    config.scenes_path =
        scenes_path.ok_or_else(|| "missing scenes configuration path".to_string())?;
    Ok(CliCommand::Run(config))
}

fn flag_value<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str, String> {
    args.get(index + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("missing value for {flag}"))
}

fn parse_positive(value: &str, flag: &str) -> Result<u32, String> {
    match value.parse::<u32>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(format!("invalid {flag} value '{value}' (expected u32 >= 1)")),
    }
}

pub(crate) fn usage_text() -> String {
    [
        "usage:",
        "  intphys_director <scenes.json> [--output-dir DIR] [--seed N] [--ticks-per-run N] [--tps N] [--dry]",
        "",
        "defaults:",
        "  --output-dir <project root>/output (project root from INTPHYS_ROOT or the executable path)",
        "  --seed 0",
        "  --ticks-per-run 100",
        "  --tps 60",
        "",
        "--dry schedules and plays every run without writing anything to disk.",
    ]
    .join("\n")
}

pub(crate) fn build_app(config: DirectorConfig) -> Result<AppWiring, AppError> {
    info!("=== intphys director startup ===");
    let scenes = ScenesConfig::load(&config.scenes_path)?;
    info!(
        path = %config.scenes_path.display(),
        scenarios = scenes.scenarios().len(),
        "scenes_config_loaded"
    );
    build_wiring(&scenes, config)
}

pub(crate) fn build_wiring(scenes: &ScenesConfig, config: DirectorConfig) -> Result<AppWiring, AppError> {
    let recorder = if config.dry {
        StatusRecorder::dry()
    } else {
        let output_dir = match &config.output_dir {
            Some(dir) => dir.clone(),
            None => resolve_app_paths()?.output_dir,
        };
        StatusRecorder::new(output_dir)
    };
    info!(
        seed = config.seed,
        dry = config.dry,
        output_dir = %recorder.output_dir().display(),
        "director_config"
    );

    let mut factory = DirectorScenarioFactory::new(config.seed, config.ticks_per_run);
    let scheduler = Scheduler::new(
        HeadlessWorld::default(),
        recorder,
        scenes,
        &mut factory,
        SchedulerSettings {
            ticks_per_run: config.ticks_per_run,
        },
    )?;
    Ok(AppWiring { config, scheduler })
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
