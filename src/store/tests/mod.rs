use super::*;
use tempfile::TempDir;


async fn open_temp_store() -> (TaskStore, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::open(dir.path().join("tasks.json")).await.unwrap();
    (store, dir)
}
