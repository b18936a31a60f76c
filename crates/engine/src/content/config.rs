use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

const TRAIN_CASE_MARKER: &str = "train";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scenes config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenes config {path}: {message}")]
    Parse { path: String, message: String },
    #[error("scenario {scenario} must map case labels to cases")]
    NotAnObject { scenario: String },
    #[error("scenario label '{label}' must look like scenario_<ID>")]
    MalformedScenarioLabel { label: String },
    #[error("train case {scenario}.{case} must be a scene count")]
    ExpectedCount { scenario: String, case: String },
    #[error("test case {scenario}.{case} must map conditions to scene counts")]
    ExpectedConditions { scenario: String, case: String },
    #[error("invalid scene count at {location}: {value}")]
    InvalidCount { location: String, value: String },
}

/// One case of a scenario: a train repeat count or per-condition test counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseSpec {
    Count(u32),
    Conditions(Vec<(String, u32)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioConfig {
    label: String,
    scenario_id: String,
    cases: Vec<(String, CaseSpec)>,
}

impl ScenarioConfig {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Everything after the first `_` of the label.
    pub fn scenario_id(&self) -> &str {
        &self.scenario_id
    }

    pub fn cases(&self) -> &[(String, CaseSpec)] {
        &self.cases
    }
}

/// Scenes configuration, kept in file order.
///
/// ```json
/// {
///   "scenario_O1": {
///     "train": 2,
///     "test_visible": { "static": 1, "dynamic_1": 1 },
///     "test_occluded": { "dynamic_2": 1 }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct ScenesConfig {
    scenarios: Vec<ScenarioConfig>,
}

impl ScenesConfig {
    pub fn scenarios(&self) -> &[ScenarioConfig] {
        &self.scenarios
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, &path.display().to_string())
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Self::parse(raw, "<inline>")
    }

    fn parse(raw: &str, origin: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize::<_, ScenesConfig>(&mut deserializer).map_err(|error| {
            let location = error.path().to_string();
            let source = error.into_inner();
            let message = if location.is_empty() || location == "." {
                source.to_string()
            } else {
                format!("at {location}: {source}")
            };
            ConfigError::Parse {
                path: origin.to_string(),
                message,
            }
        })
    }
}

impl TryFrom<Map<String, Value>> for ScenesConfig {
    type Error = ConfigError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut scenarios = Vec::with_capacity(map.len());
        for (label, cases) in map {
            let scenario_id = scenario_id_from_label(&label)?;
            let Value::Object(cases) = cases else {
                return Err(ConfigError::NotAnObject { scenario: label });
            };
            let mut parsed = Vec::with_capacity(cases.len());
            for (case, value) in cases {
                let spec = parse_case(&label, &case, value)?;
                parsed.push((case, spec));
            }
            scenarios.push(ScenarioConfig {
                label,
                scenario_id,
                cases: parsed,
            });
        }
        Ok(Self { scenarios })
    }
}

fn scenario_id_from_label(label: &str) -> Result<String, ConfigError> {
    match label.split_once('_') {
        Some((_, id)) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ConfigError::MalformedScenarioLabel {
            label: label.to_string(),
        }),
    }
}

fn parse_case(scenario: &str, case: &str, value: Value) -> Result<CaseSpec, ConfigError> {
    if case.contains(TRAIN_CASE_MARKER) {
        if !value.is_number() {
            return Err(ConfigError::ExpectedCount {
                scenario: scenario.to_string(),
                case: case.to_string(),
            });
        }
        return parse_count(&format!("{scenario}.{case}"), &value).map(CaseSpec::Count);
    }

    let Value::Object(conditions) = value else {
        return Err(ConfigError::ExpectedConditions {
            scenario: scenario.to_string(),
            case: case.to_string(),
        });
    };
    conditions
        .into_iter()
        .map(|(condition, count)| {
            let count = parse_count(&format!("{scenario}.{case}.{condition}"), &count)?;
            Ok((condition, count))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(CaseSpec::Conditions)
}

fn parse_count(location: &str, value: &Value) -> Result<u32, ConfigError> {
    value
        .as_u64()
        .and_then(|count| u32::try_from(count).ok())
        .ok_or_else(|| ConfigError::InvalidCount {
            location: location.to_string(),
            value: value.to_string(),
        })
}
