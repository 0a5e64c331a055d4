//! Loads a `JobDescriptor` from disk and recursively pulls in any
//! `nested_tasks` it references (spec.md §4.7 "recurse over each referenced
//! descriptor file and concatenate outputs").

use crate::error::HostResult;
use eas_engine::expand;
use eas_lib::model::{JobDescriptor, TaskList};
use std::path::Path;

pub fn expand_from_file(path: impl AsRef<Path>) -> HostResult<Vec<TaskList>> {
    expand_recursive(path.as_ref())
}

fn expand_recursive(path: &Path) -> HostResult<Vec<TaskList>> {
    let text = std::fs::read_to_string(path)?;
    let descriptor: JobDescriptor = serde_json::from_str(&text)?;

    let mut task_lists = expand::expand(&descriptor)?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for nested in &descriptor.nested_tasks {
        let nested_path = base.join(nested);
        task_lists.extend(expand_recursive(&nested_path)?);
    }

    Ok(task_lists)
}
