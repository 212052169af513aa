//! Corpus store collaborator
//!
//! The core only needs two things from the store: insert a classified record
//! and fetch the whole corpus. Filtering and grouping always happen in
//! process after a full fetch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::record::{read_corpus, NewRecord, SequenceRecord};
use crate::seed::{random_id, SeedGenerator};
use crate::service::config::{StoreBackend, StoreConfig};
use crate::service::types::{health_check::HealthCheckResult, ServiceError};

/// Document collection holding the reference corpus
#[async_trait::async_trait]
pub trait CorpusStore: Send + Sync {
    /// Fetch every stored record
    async fn fetch_all(&self) -> Result<Vec<SequenceRecord>, ServiceError>;

    /// Store a classified submission, assigning an id and timestamp
    async fn insert(&self, record: NewRecord) -> Result<SequenceRecord, ServiceError>;

    /// Number of stored records
    async fn count(&self) -> Result<usize, ServiceError>;

    /// Check the store can serve requests
    async fn health_check(&self) -> HealthCheckResult;

    /// Backend name for logs and health output
    fn backend_name(&self) -> &'static str;
}

fn new_document(record: NewRecord) -> SequenceRecord {
    let id = random_id(&mut rand::thread_rng());
    record.into_record(id, Utc::now())
}

/// In-process corpus, reset on restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<SequenceRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with records
    pub fn with_records(records: Vec<SequenceRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait::async_trait]
impl CorpusStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<SequenceRecord>, ServiceError> {
        Ok(self.records.read().await.clone())
    }

    async fn insert(&self, record: NewRecord) -> Result<SequenceRecord, ServiceError> {
        let stored = new_document(record);
        self.records.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn count(&self) -> Result<usize, ServiceError> {
        Ok(self.records.read().await.len())
    }

    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::Healthy
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Corpus persisted as a JSON array file
///
/// The file is loaded once when the store is opened; the in-memory copy is
/// authoritative afterwards. Every insert rewrites the whole file through a
/// temporary file and a rename, so the file on disk is always a complete
/// corpus.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: RwLock<Vec<SequenceRecord>>,
}

impl JsonFileStore {
    /// Open a corpus file; a missing file is an empty corpus
    ///
    /// Missing parent directories are created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ServiceError> {
        let path = path.into();
        let records = if path.exists() {
            read_corpus(&path).map_err(|e| {
                ServiceError::StoreUnavailable(format!(
                    "Failed to load corpus from {}: {}",
                    path.display(),
                    e
                ))
            })?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ServiceError::StoreUnavailable(format!(
                        "Failed to create corpus directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
            Vec::new()
        };
        tracing::info!(
            "Opened corpus file {} with {} records",
            path.display(),
            records.len()
        );
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append records and persist them in one write
    ///
    /// The write guard is held until the file is replaced, so writers are
    /// serialized. If the write fails the appended records are dropped again.
    pub async fn extend(&self, new_records: Vec<SequenceRecord>) -> Result<(), ServiceError> {
        let mut records = self.records.write().await;
        let previous_len = records.len();
        records.extend(new_records);

        let persisted = match serde_json::to_string_pretty(&*records) {
            Ok(content) => {
                let path = self.path.clone();
                tokio::task::spawn_blocking(move || write_atomically(&path, &content))
                    .await
                    .unwrap_or_else(|e| {
                        Err(ServiceError::InternalError(format!(
                            "Corpus write task failed: {}",
                            e
                        )))
                    })
            }
            Err(e) => Err(ServiceError::InternalError(format!(
                "Failed to encode corpus: {}",
                e
            ))),
        };

        if let Err(e) = persisted {
            records.truncate(previous_len);
            return Err(e);
        }
        Ok(())
    }
}

/// Write encoded corpus content to `path` via a sibling temporary file
fn write_atomically(path: &Path, content: &str) -> Result<(), ServiceError> {
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    std::fs::write(&tmp_path, content)
        .and_then(|_| std::fs::rename(&tmp_path, path))
        .map_err(|e| {
            tracing::error!("Failed to write corpus {}: {}", path.display(), e);
            ServiceError::StoreUnavailable(format!("Failed to write corpus: {}", e))
        })
}

#[async_trait::async_trait]
impl CorpusStore for JsonFileStore {
    async fn fetch_all(&self) -> Result<Vec<SequenceRecord>, ServiceError> {
        Ok(self.records.read().await.clone())
    }

    async fn insert(&self, record: NewRecord) -> Result<SequenceRecord, ServiceError> {
        let stored = new_document(record);
        self.extend(vec![stored.clone()]).await?;
        Ok(stored)
    }

    async fn count(&self) -> Result<usize, ServiceError> {
        Ok(self.records.read().await.len())
    }

    async fn health_check(&self) -> HealthCheckResult {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        match tokio::fs::metadata(dir).await {
            Ok(meta) if meta.permissions().readonly() => HealthCheckResult::Degraded {
                reason: format!("Corpus directory {} is read-only", dir.display()),
            },
            Ok(_) => HealthCheckResult::Healthy,
            Err(e) => HealthCheckResult::Unhealthy {
                reason: format!("Corpus directory {} unavailable: {}", dir.display(), e),
            },
        }
    }

    fn backend_name(&self) -> &'static str {
        "json-file"
    }
}

/// Build the configured store, seeding it with random records if requested
///
/// A JSON-file corpus is only seeded when it is empty, so restarting with
/// the same configuration does not keep growing the file.
pub async fn build_store(config: &StoreConfig) -> Result<Arc<dyn CorpusStore>, ServiceError> {
    let seed = |count: usize| SeedGenerator::new().records(count);

    match config.backend {
        StoreBackend::Memory => {
            let records = seed(config.seed_records);
            if !records.is_empty() {
                tracing::info!("Seeded memory store with {} records", records.len());
            }
            Ok(Arc::new(MemoryStore::with_records(records)))
        }
        StoreBackend::JsonFile => {
            let path = config.path.as_ref().ok_or_else(|| {
                ServiceError::ConfigError("json-file store requires store.path".to_string())
            })?;
            let store = JsonFileStore::open(path)?;
            if config.seed_records > 0 && store.count().await? == 0 {
                store.extend(seed(config.seed_records)).await?;
                tracing::info!(
                    "Seeded {} with {} records",
                    path.display(),
                    config.seed_records
                );
            }
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phenotype::{Criteria, Phenotype};

    fn submission(gene: &str, sequence: &str) -> NewRecord {
        NewRecord::classify(gene, sequence, Criteria::new(true, true, true)).unwrap()
    }

    #[tokio::test]
    async fn test_memory_store_insert_and_fetch() {
        let store = MemoryStore::new();
        let stored = store.insert(submission("FSHR", "atgc")).await.unwrap();
        assert_eq!(stored.id.len(), 20);
        assert_eq!(stored.sequence, "ATGC");
        assert_eq!(stored.phenotype, Phenotype::TypeA);

        let all = store.fetch_all().await.unwrap();
        assert_eq!(all, vec![stored]);
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_memory_store_ids_are_unique() {
        let store = MemoryStore::new();
        let a = store.insert(submission("INS", "AT")).await.unwrap();
        let b = store.insert(submission("INS", "AT")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_json_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        let stored = store.insert(submission("AMH", "GGCC")).await.unwrap();
        assert!(path.exists());

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.fetch_all().await.unwrap(), vec![stored]);
        assert!(reopened.health_check().await.is_available());
    }

    #[tokio::test]
    async fn test_json_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(ServiceError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_json_file_store_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("corpus.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.insert(submission("AMH", "GGCC")).await.unwrap();
        assert!(path.exists());
        assert!(store.health_check().await.is_available());
    }

    #[tokio::test]
    async fn test_json_file_store_rolls_back_failed_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        let store = JsonFileStore::open(&path).unwrap();
        let kept = store.insert(submission("AMH", "GGCC")).await.unwrap();

        // A directory at the target path makes the rename fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), "x").unwrap();

        let err = store.insert(submission("FSHR", "ATGC")).await.unwrap_err();
        assert!(matches!(err, ServiceError::StoreUnavailable(_)));
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.fetch_all().await.unwrap(), vec![kept]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_json_file_store_concurrent_inserts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        let store = Arc::new(JsonFileStore::open(&path).unwrap());

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let sequence = if i % 2 == 0 { "ATGC" } else { "GGCC" };
                store.insert(submission("FSHR", sequence)).await.unwrap();
                store.fetch_all().await.unwrap().len()
            }));
        }
        for handle in handles {
            let seen = handle.await.unwrap();
            assert!((1..=16).contains(&seen));
        }

        assert_eq!(store.count().await.unwrap(), 16);
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.count().await.unwrap(), 16);
    }

    #[tokio::test]
    async fn test_build_store_seeds_empty_corpus_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            backend: StoreBackend::JsonFile,
            path: Some(dir.path().join("corpus.json")),
            seed_records: 5,
        };
        let store = build_store(&config).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 5);

        let store = build_store(&config).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_build_memory_store() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            path: None,
            seed_records: 3,
        };
        let store = build_store(&config).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 3);
        assert_eq!(store.backend_name(), "memory");
    }
}
