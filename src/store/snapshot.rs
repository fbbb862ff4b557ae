//! Snapshot file I/O

use crate::error::{Error, Result};
use crate::types::{Task, TaskId};
use std::collections::HashMap;
use std::path::Path;

/// Read every record from the snapshot, or nothing if the file is absent
pub(super) async fn load(path: &Path) -> Result<Vec<Task>> {
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::Io(e)),
    };

    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    serde_json::from_slice(&data).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Task snapshot is corrupt");
        Error::Serialization(e)
    })
}

/// Rewrite the snapshot with all records, oldest first
///
/// Writes to `<file>.tmp` and renames it over the snapshot so a crash never
/// leaves a half-written file behind.
pub(super) async fn write(path: &Path, tasks: &HashMap<TaskId, Task>) -> Result<()> {
    let mut records: Vec<&Task> = tasks.values().collect();
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    let data = serde_json::to_vec_pretty(&records)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    tokio::fs::write(&tmp, &data).await?;
    tokio::fs::rename(&tmp, path).await?;

    Ok(())
}
