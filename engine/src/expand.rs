//! Iteration Expander (spec.md §4.7): expands a `JobDescriptor` into a flat,
//! ordered sequence of `TaskList`s by taking the Cartesian product of its
//! iteration axes and text-substituting `${name}`/`${index}` placeholders
//! into each task template before re-parsing it as JSON.

use crate::error::{EngineError, EngineResult};
use eas_lib::expr;
use eas_lib::model::{ConcreteTask, IterationAxis, JobDescriptor, TaskList};
use std::collections::HashMap;

fn axis_values(axis: &IterationAxis) -> EngineResult<Vec<String>> {
    match axis {
        IterationAxis::Values { values, .. } => Ok(values.clone()),
        IterationAxis::LinearRange {
            start, stop, count, ..
        } => {
            let start = expr::eval(start)?;
            let stop = expr::eval(stop)?;
            let count = expr::eval(count)?.round() as usize;
            Ok(linear_space(start, stop, count)
                .into_iter()
                .map(format_value)
                .collect())
        }
        IterationAxis::LogRange {
            start, stop, count, ..
        } => {
            let start = expr::eval(start)?;
            let stop = expr::eval(stop)?;
            let count = expr::eval(count)?.round() as usize;
            Ok(log_space(start, stop, count)
                .into_iter()
                .map(format_value)
                .collect())
        }
    }
}

fn linear_space(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count <= 1 {
        return vec![start];
    }
    let step = (stop - start) / (count as f64 - 1.0);
    (0..count).map(|i| start + step * i as f64).collect()
}

fn log_space(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count <= 1 {
        return vec![start];
    }
    let log_start = start.ln();
    let log_stop = stop.ln();
    let step = (log_stop - log_start) / (count as f64 - 1.0);
    (0..count)
        .map(|i| (log_start + step * i as f64).exp())
        .collect()
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Cartesian product over axes in declaration order; the leftmost axis
/// varies slowest in the returned substitution maps, matching spec.md §4.7
/// step 2 (iteration order itself is not externally observable).
fn cartesian(axes: &[(String, Vec<String>)]) -> Vec<HashMap<String, String>> {
    let mut combos: Vec<HashMap<String, String>> = vec![HashMap::new()];
    for (name, values) in axes {
        let mut next = Vec::with_capacity(combos.len() * values.len());
        for combo in &combos {
            for value in values {
                let mut extended = combo.clone();
                extended.insert(name.clone(), value.clone());
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

fn substitute(template: &str, substitutions: &HashMap<String, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in substitutions {
        out = out.replace(&format!("${{{key}}}"), value);
    }
    out
}

/// Expand one `JobDescriptor` (not following `nested_tasks` — the caller
/// recurses over those, since each is loaded from a separate file).
pub fn expand(descriptor: &JobDescriptor) -> EngineResult<Vec<TaskList>> {
    let axes: Vec<(String, Vec<String>)> = if descriptor.iterations.is_empty() {
        vec![("null".to_string(), vec!["0".to_string()])]
    } else {
        descriptor
            .iterations
            .iter()
            .map(|axis| Ok((axis.name().to_string(), axis_values(axis)?)))
            .collect::<EngineResult<Vec<_>>>()?
    };

    let combos = cartesian(&axes);
    let mut task_lists = Vec::with_capacity(combos.len());

    for (counter, mut substitutions) in combos.into_iter().enumerate() {
        substitutions.insert("index".to_string(), format!("{counter:06}"));

        let mut tasks = Vec::with_capacity(descriptor.task_list.len());
        for template in &descriptor.task_list {
            let raw = serde_json::to_string(template).map_err(eas_lib::EasError::from)?;
            let substituted = substitute(&raw, &substitutions);
            let value: serde_json::Value =
                serde_json::from_str(&substituted).map_err(eas_lib::EasError::from)?;
            let task: ConcreteTask =
                serde_json::from_value(value).map_err(eas_lib::EasError::from)?;
            tasks.push(task);
        }

        task_lists.push(TaskList {
            job_name: descriptor.job_name.clone(),
            job_parameters: substitutions,
            clean_up: descriptor.clean_up,
            task_list: tasks,
        });
    }

    Ok(task_lists)
}
