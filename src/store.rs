//! Persistence backends for merged reports.
//!
//! Reports are persisted in their nested JSON form (statement -> column ->
//! row -> value, numbers as numbers, missing as null). Two [`ReportStore`]
//! implementations are provided: an in-memory store used throughout the test
//! suite, and a directory-backed store that lays reports out one JSON
//! document per `(owner, name)` pair with a sidecar id index.

use crate::error::{ReportError, Result};
use crate::nested::NestedReport;
use crate::traits::ReportStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Identifier assigned by a store when a report is first created.
pub type ReportId = u64;

#[derive(Debug, Clone)]
struct Record {
    id: ReportId,
    owner: String,
    name: String,
    json: String,
}

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: ReportId,
    records: Vec<Record>,
}

/// In-memory report store.
///
/// Cheap to clone (clones share the same backing map) and enforces the
/// create-time uniqueness constraint under a single lock, which is what
/// serializes concurrent name claims.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().expect("store lock poisoned")
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn create_report(
        &self,
        owner: &str,
        name: &str,
        report: &NestedReport,
    ) -> Result<ReportId> {
        let json = serde_json::to_string(report)?;
        let mut inner = self.lock();
        if inner
            .records
            .iter()
            .any(|r| r.owner == owner && r.name == name)
        {
            return Err(ReportError::DuplicateReportName {
                owner: owner.to_string(),
                name: name.to_string(),
            });
        }
        inner.next_id += 1;
        let id = inner.next_id;
        inner.records.push(Record {
            id,
            owner: owner.to_string(),
            name: name.to_string(),
            json,
        });
        Ok(id)
    }

    async fn update_report(
        &self,
        owner: &str,
        name: &str,
        report: &NestedReport,
    ) -> Result<ReportId> {
        let json = serde_json::to_string(report)?;
        let mut inner = self.lock();
        if let Some(record) = inner
            .records
            .iter_mut()
            .find(|r| r.owner == owner && r.name == name)
        {
            record.json = json;
            return Ok(record.id);
        }
        inner.next_id += 1;
        let id = inner.next_id;
        inner.records.push(Record {
            id,
            owner: owner.to_string(),
            name: name.to_string(),
            json,
        });
        Ok(id)
    }

    async fn load_report(&self, owner: &str, name: &str) -> Result<NestedReport> {
        let inner = self.lock();
        let record = inner
            .records
            .iter()
            .find(|r| r.owner == owner && r.name == name)
            .ok_or_else(|| ReportError::ReportNotFound {
                owner: owner.to_string(),
                name: name.to_string(),
            })?;
        Ok(serde_json::from_str(&record.json)?)
    }

    async fn load_by_id(&self, id: ReportId) -> Result<NestedReport> {
        let inner = self.lock();
        let record = inner
            .records
            .iter()
            .find(|r| r.id == id)
            .ok_or(ReportError::ReportIdNotFound(id))?;
        Ok(serde_json::from_str(&record.json)?)
    }

    async fn update_by_id(&self, id: ReportId, report: &NestedReport) -> Result<()> {
        let json = serde_json::to_string(report)?;
        let mut inner = self.lock();
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ReportError::ReportIdNotFound(id))?;
        record.json = json;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct FileIndex {
    next_id: ReportId,
    entries: Vec<IndexEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexEntry {
    id: ReportId,
    owner: String,
    name: String,
    created_at: DateTime<Utc>,
}

/// Directory-backed report store: `<root>/<owner>/<name>.json` per report
/// plus a `reports.json` id index at the root.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("reports.json")
    }

    fn report_path(&self, owner: &str, name: &str) -> Result<PathBuf> {
        validate_component(owner)?;
        validate_component(name)?;
        Ok(self.root.join(owner).join(format!("{name}.json")))
    }

    fn read_index(&self) -> Result<FileIndex> {
        match std::fs::read_to_string(self.index_path()) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileIndex::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_index(&self, index: &FileIndex) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(self.index_path(), serde_json::to_vec_pretty(index)?)?;
        Ok(())
    }

    fn write_report(&self, path: &Path, report: &NestedReport) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec(report)?)?;
        Ok(())
    }

    /// Creates the report file with create-new semantics, so two concurrent
    /// claims for the same name cannot both succeed.
    fn write_fresh_report(
        &self,
        path: &Path,
        owner: &str,
        name: &str,
        report: &NestedReport,
    ) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(ReportError::DuplicateReportName {
                    owner: owner.to_string(),
                    name: name.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::to_writer(file, report)?;
        Ok(())
    }
}

// Report names become file names; keep them to the same character set the
// front end accepts so an owner cannot escape their directory.
fn validate_component(value: &str) -> Result<()> {
    let ok = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' ' | '.'))
        && !value.contains("..");
    if ok {
        Ok(())
    } else {
        Err(ReportError::ConfigError(format!(
            "invalid report key component '{value}'"
        )))
    }
}

#[async_trait]
impl ReportStore for FileStore {
    async fn create_report(
        &self,
        owner: &str,
        name: &str,
        report: &NestedReport,
    ) -> Result<ReportId> {
        let path = self.report_path(owner, name)?;
        let mut index = self.read_index()?;
        if index
            .entries
            .iter()
            .any(|e| e.owner == owner && e.name == name)
        {
            return Err(ReportError::DuplicateReportName {
                owner: owner.to_string(),
                name: name.to_string(),
            });
        }
        self.write_fresh_report(&path, owner, name, report)?;
        index.next_id += 1;
        let id = index.next_id;
        index.entries.push(IndexEntry {
            id,
            owner: owner.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        });
        self.write_index(&index)?;
        Ok(id)
    }

    async fn update_report(
        &self,
        owner: &str,
        name: &str,
        report: &NestedReport,
    ) -> Result<ReportId> {
        let path = self.report_path(owner, name)?;
        let mut index = self.read_index()?;
        let id = match index
            .entries
            .iter()
            .find(|e| e.owner == owner && e.name == name)
        {
            Some(entry) => entry.id,
            None => {
                index.next_id += 1;
                let id = index.next_id;
                index.entries.push(IndexEntry {
                    id,
                    owner: owner.to_string(),
                    name: name.to_string(),
                    created_at: Utc::now(),
                });
                self.write_index(&index)?;
                id
            }
        };
        self.write_report(&path, report)?;
        Ok(id)
    }

    async fn load_report(&self, owner: &str, name: &str) -> Result<NestedReport> {
        let path = self.report_path(owner, name)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ReportError::ReportNotFound {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn load_by_id(&self, id: ReportId) -> Result<NestedReport> {
        let index = self.read_index()?;
        let entry = index
            .entries
            .iter()
            .find(|e| e.id == id)
            .ok_or(ReportError::ReportIdNotFound(id))?;
        self.load_report(&entry.owner, &entry.name).await
    }

    async fn update_by_id(&self, id: ReportId, report: &NestedReport) -> Result<()> {
        let index = self.read_index()?;
        let entry = index
            .entries
            .iter()
            .find(|e| e.id == id)
            .ok_or(ReportError::ReportIdNotFound(id))?;
        let path = self.report_path(&entry.owner, &entry.name)?;
        self.write_report(&path, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nested::OrderedMap;
    use crate::statement::Cell;

    fn sample_report() -> NestedReport {
        let mut rows = OrderedMap::new();
        rows.insert("Revenue", Cell::Number(100.0));
        let mut table = OrderedMap::new();
        table.insert("Q4", rows);
        let mut report = NestedReport::new();
        report.insert("Income", table);
        report
    }

    #[tokio::test]
    async fn memory_store_enforces_unique_names_per_owner() {
        let store = MemoryStore::new();
        let report = sample_report();

        store.create_report("alice", "fy16", &report).await.unwrap();
        // Same name, different owner: fine.
        store.create_report("bob", "fy16", &report).await.unwrap();

        assert!(matches!(
            store.create_report("alice", "fy16", &report).await,
            Err(ReportError::DuplicateReportName { .. })
        ));
    }

    #[tokio::test]
    async fn memory_store_update_keeps_id_and_overwrites() {
        let store = MemoryStore::new();
        let report = sample_report();
        let id = store.create_report("alice", "fy16", &report).await.unwrap();

        let mut filtered = NestedReport::new();
        filtered.insert("Income", report.get("Income").unwrap().clone());
        let id2 = store
            .update_report("alice", "fy16", &filtered)
            .await
            .unwrap();
        assert_eq!(id, id2);

        let loaded = store.load_by_id(id).await.unwrap();
        assert_eq!(loaded, filtered);
    }

    #[tokio::test]
    async fn memory_store_missing_report_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.load_report("alice", "nope").await,
            Err(ReportError::ReportNotFound { .. })
        ));
        assert!(matches!(
            store.load_by_id(42).await,
            Err(ReportError::ReportIdNotFound(42))
        ));
    }

    #[tokio::test]
    async fn file_store_round_trips_reports() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let report = sample_report();

        let id = store
            .create_report("alice", "test report", &report)
            .await
            .unwrap();
        let loaded = store.load_report("alice", "test report").await.unwrap();
        assert_eq!(loaded, report);
        let by_id = store.load_by_id(id).await.unwrap();
        assert_eq!(by_id, report);

        assert!(matches!(
            store.create_report("alice", "test report", &report).await,
            Err(ReportError::DuplicateReportName { .. })
        ));
    }

    #[tokio::test]
    async fn file_store_rejects_path_escapes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(
            store
                .create_report("../evil", "name", &sample_report())
                .await
                .is_err()
        );
    }
}
