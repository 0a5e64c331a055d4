//! Telemetry record shapes shared by the Task Timer, Task Runner, brokered
//! sinks, and the Metadata Store (spec.md §3/§4.1/§4.2).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Submitted by [`crate`]'s Task Timer on every exit path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTimeRecord {
    pub job_name: String,
    pub tda_code: String,
    pub target_name: String,
    pub task_name: String,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    pub timestamp: f64,
    pub wall: f64,
    pub cpu_self: f64,
    pub cpu_with_children: f64,
}

/// Submitted by the Task Runner after `verify`/`transit_search`, and on task
/// failure (`task_name = "error_message"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub job_name: String,
    pub tda_code: String,
    pub target_name: String,
    pub task_name: String,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    pub timestamp: f64,
    pub result_summary_json: serde_json::Value,
    #[serde(default)]
    pub extended_artifact_name: Option<String>,
}

impl ResultRecord {
    /// An error record for a task that threw (spec.md §4.6 / §9).
    pub fn error(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        ResultRecord {
            job_name: job_name.into(),
            tda_code: String::new(),
            target_name: String::new(),
            task_name: "error_message".to_string(),
            parameters: HashMap::new(),
            timestamp: 0.0,
            result_summary_json: serde_json::json!({ "message": message.into() }),
            extended_artifact_name: None,
        }
    }

    /// The bad-message record described in spec.md §9: an envelope that
    /// isn't a JSON object, or lacks `task_list`.
    pub fn bad_message(raw: impl Into<String>) -> Self {
        ResultRecord::error("untitled", raw)
    }
}
