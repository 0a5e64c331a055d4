//! Job/task data model: [`JobDescriptor`] expands into [`TaskList`]s made of
//! [`ConcreteTask`]s. Mirrors spec.md §3.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Declarative description of a grid of work, before iteration expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub job_name: String,
    #[serde(default = "default_clean_up")]
    pub clean_up: bool,
    #[serde(default)]
    pub iterations: Vec<IterationAxis>,
    #[serde(default)]
    pub task_list: Vec<serde_json::Value>,
    #[serde(default)]
    pub nested_tasks: Vec<String>,
}

fn default_clean_up() -> bool {
    true
}

/// One axis of the iteration grid. `start`/`stop`/`count` are expressions,
/// evaluated against the identifier table in [`crate::expr`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationAxis {
    Values {
        name: String,
        values: Vec<String>,
    },
    LinearRange {
        name: String,
        start: String,
        stop: String,
        count: String,
    },
    LogRange {
        name: String,
        start: String,
        stop: String,
        count: String,
    },
}

impl IterationAxis {
    pub fn name(&self) -> &str {
        match self {
            IterationAxis::Values { name, .. } => name,
            IterationAxis::LinearRange { name, .. } => name,
            IterationAxis::LogRange { name, .. } => name,
        }
    }
}

/// A source (memory) or destination (memory/archive) for a light-curve
/// product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactSource {
    Memory,
    Archive,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ArtifactHandle {
    pub source: ArtifactSource,
    pub directory: String,
    pub filename: String,
}

/// One fully-substituted task, tagged by its verb. Unknown verbs are kept as
/// `Unknown` so a bad message can be classified without failing to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum ConcreteTask {
    Null,
    Error,
    PslsSynthesise {
        target: ArtifactHandle,
        specs: SynthesisSpecs,
    },
    BatmanSynthesise {
        target: ArtifactHandle,
        specs: SynthesisSpecs,
    },
    Multiplication {
        input_1: ArtifactHandle,
        input_2: ArtifactHandle,
        output: ArtifactHandle,
    },
    Binning {
        source: ArtifactHandle,
        target: ArtifactHandle,
        cadence: f64,
    },
    Verify {
        source: ArtifactHandle,
    },
    TransitSearch {
        source: ArtifactHandle,
        lc_duration: f64,
        tda_name: String,
        #[serde(default)]
        search_settings: SearchSettings,
    },
    Delete {
        source: ArtifactHandle,
    },
    #[serde(other)]
    Unknown,
}

impl ConcreteTask {
    /// The verb name, used for `task_name` in telemetry records.
    pub fn verb(&self) -> &'static str {
        match self {
            ConcreteTask::Null => "null",
            ConcreteTask::Error => "error",
            ConcreteTask::PslsSynthesise { .. } => "psls_synthesise",
            ConcreteTask::BatmanSynthesise { .. } => "batman_synthesise",
            ConcreteTask::Multiplication { .. } => "multiplication",
            ConcreteTask::Binning { .. } => "binning",
            ConcreteTask::Verify { .. } => "verify",
            ConcreteTask::TransitSearch { .. } => "transit_search",
            ConcreteTask::Delete { .. } => "delete",
            ConcreteTask::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthesisSpecs {
    pub duration: f64,
    pub planet_radius: f64,
    pub orbital_period: f64,
    pub semi_major_axis: f64,
    pub orbital_angle: f64,
    #[serde(default)]
    pub impact_parameter: Option<f64>,
    #[serde(default)]
    pub eccentricity: Option<f64>,
    #[serde(default)]
    pub noise: Option<f64>,
    #[serde(default)]
    pub sampling_cadence: Option<f64>,
    #[serde(default = "default_true")]
    pub enable_transits: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default)]
    pub period_min: Option<f64>,
    #[serde(default)]
    pub period_max: Option<f64>,
}

/// A fully expanded, ordered pipeline sharing one iteration point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskList {
    pub job_name: String,
    pub job_parameters: HashMap<String, String>,
    pub clean_up: bool,
    pub task_list: Vec<ConcreteTask>,
}
