// Manages local file storage for tasks.
//
// ⚠️ VERSION BUMP REQUIRED:
// Changes to the Task struct serialization require incrementing
// LOCAL_STORAGE_VERSION below.
use crate::context::AppContext;
use crate::model::Task;
use crate::model::validator::check_import_data;
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// Version history:
// - v0: bare JSON array of tasks (browser export layout)
// - v1: versioned wrapper
const LOCAL_STORAGE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct LocalStorageData {
    #[serde(default)]
    version: u32,
    tasks: Vec<Task>,
}

pub struct LocalStorage;

impl LocalStorage {
    /// Helper to get a sidecar lock file path
    fn get_lock_path(file_path: &Path) -> PathBuf {
        let mut lock_path = file_path.to_path_buf();
        if let Some(ext) = lock_path.extension() {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".lock");
            lock_path.set_extension(new_ext);
        } else {
            lock_path.set_extension("lock");
        }
        lock_path
    }

    /// Runs `f` while holding an exclusive lock on `file_path`'s sidecar.
    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let lock_path = Self::get_lock_path(file_path);
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        file.lock_exclusive()?;
        let result = f();
        file.unlock()?;
        result
    }

    /// Atomic write: Write to .tmp file then rename
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }

    fn parse(json: &str) -> Result<(Vec<Task>, bool)> {
        if let Ok(data) = serde_json::from_str::<LocalStorageData>(json) {
            return Ok((data.tasks, data.version < LOCAL_STORAGE_VERSION));
        }
        // Legacy layout: a bare array.
        let tasks: Vec<Task> = serde_json::from_str(json)?;
        Ok((tasks, true))
    }

    pub fn load(ctx: &dyn AppContext) -> Result<Vec<Task>> {
        let path = ctx.get_tasks_path()?;
        if !path.exists() {
            return Ok(vec![]);
        }

        let (tasks, needs_upgrade) = Self::with_lock(&path, || {
            let json = fs::read_to_string(&path)?;
            Self::parse(&json)
                .with_context(|| format!("Failed to parse task file '{}'", path.display()))
        })?;

        if needs_upgrade {
            log::info!(
                "Migrating {} to storage v{}",
                path.display(),
                LOCAL_STORAGE_VERSION
            );
            Self::save(ctx, &tasks)?;
        }
        Ok(tasks)
    }

    pub fn save(ctx: &dyn AppContext, tasks: &[Task]) -> Result<()> {
        let path = ctx.get_tasks_path()?;
        Self::with_lock(&path, || {
            let data = LocalStorageData {
                version: LOCAL_STORAGE_VERSION,
                tasks: tasks.to_vec(),
            };
            let json = serde_json::to_string_pretty(&data)?;
            Self::atomic_write(&path, json)?;
            Ok(())
        })
    }

    /// Reads an exported JSON file, checks its structure and replaces the
    /// stored tasks with it. Nothing is written if any record is malformed.
    /// Returns the number of imported tasks.
    pub fn import_file(ctx: &dyn AppContext, file: &Path) -> Result<usize> {
        let content = fs::read_to_string(file)
            .with_context(|| format!("Failed to read import file '{}'", file.display()))?;
        let tasks = Self::parse_import(&content)?;
        Self::save(ctx, &tasks)?;
        log::info!("Imported {} task(s) from {}", tasks.len(), file.display());
        Ok(tasks.len())
    }

    /// Validates and decodes an import payload.
    pub fn parse_import(content: &str) -> Result<Vec<Task>> {
        let value: serde_json::Value =
            serde_json::from_str(content).context("Import file is not valid JSON")?;
        check_import_data(&value)?;
        let tasks: Vec<Task> =
            serde_json::from_value(value).context("Import records have unexpected types")?;
        Ok(tasks)
    }

    pub fn to_json_string(tasks: &[Task]) -> Result<String> {
        Ok(serde_json::to_string_pretty(tasks)?)
    }

    /// Removes the task file and the settings file.
    pub fn clear_all(ctx: &dyn AppContext) -> Result<()> {
        for path in [ctx.get_tasks_path()?, ctx.get_config_file_path()?] {
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove '{}'", path.display()))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;
    use crate::model::TaskInput;

    fn sample(title: &str) -> Task {
        Task::from_input(&TaskInput {
            title: title.to_string(),
            date: "2024-05-01".to_string(),
            duration: "30".to_string(),
            tag: "study".to_string(),
            notes: None,
        })
    }

    #[test]
    fn test_save_and_load() {
        let ctx = TestContext::new();
        let tasks = vec![sample("One"), sample("Two")];
        LocalStorage::save(&ctx, &tasks).unwrap();
        assert_eq!(LocalStorage::load(&ctx).unwrap(), tasks);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let ctx = TestContext::new();
        assert!(LocalStorage::load(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_legacy_array_is_upgraded() {
        let ctx = TestContext::new();
        let tasks = vec![sample("Legacy")];
        let path = ctx.get_tasks_path().unwrap();
        fs::write(&path, serde_json::to_string(&tasks).unwrap()).unwrap();

        assert_eq!(LocalStorage::load(&ctx).unwrap(), tasks);
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], LOCAL_STORAGE_VERSION);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let ctx = TestContext::new();
        fs::write(ctx.get_tasks_path().unwrap(), "{ not json").unwrap();
        assert!(LocalStorage::load(&ctx).is_err());
    }

    #[test]
    fn test_lock_path_keeps_extension() {
        assert_eq!(
            LocalStorage::get_lock_path(Path::new("/tmp/tasks.json")),
            PathBuf::from("/tmp/tasks.json.lock")
        );
    }
}
