//! Append-only file store
//!
//! All collections share `<data_dir>/data/documents.dat`. On open the file is
//! scanned front to back, every checksum is verified, and the latest record
//! per `(collection, id)` is loaded into memory. Writes append one record and
//! fsync on the blocking pool before the in-memory view is updated. A write
//! that fails partway is truncated back off the file.
//!
//! Corruption anywhere in the file aborts the open; a store that cannot prove
//! its metadata intact is not used.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, warn};

use super::errors::{StoreError, StoreResult};
use super::record::{DocumentRecord, MIN_RECORD_SIZE};
use super::{find_or_insert, list_collection, Collection, DocumentStore};

const DATA_SUBDIR: &str = "data";
const STORE_FILE: &str = "documents.dat";

/// Append target for framed records.
trait RecordSink: Write {
    fn end_offset(&self) -> io::Result<u64>;
    fn sync(&mut self) -> io::Result<()>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl RecordSink for &File {
    fn end_offset(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Writes one framed record and fsyncs it, returning the new end offset.
///
/// On failure the sink is cut back to its length before the write, so a
/// later append never lands behind a partial record.
fn append_record<S: RecordSink>(sink: &mut S, bytes: &[u8]) -> io::Result<u64> {
    let start = sink.end_offset()?;
    match sink.write_all(bytes).and_then(|()| sink.sync()) {
        Ok(()) => Ok(start + bytes.len() as u64),
        Err(e) => {
            if let Err(rewind) = sink.truncate(start) {
                warn!(offset = start, error = %rewind, "partial record left in store file");
            }
            Err(e)
        }
    }
}

#[derive(Debug)]
struct Inner {
    file: Arc<File>,
    current_offset: u64,
    collections: BTreeMap<String, Collection>,
}

impl Inner {
    /// Appends off the async workers. The caller holds the store lock for
    /// the whole write, so appends never interleave.
    async fn append(&mut self, collection: &str, id: &str, document: &Value) -> StoreResult<()> {
        let serialized = DocumentRecord::from_document(collection, id, document)?.serialize();
        let file = Arc::clone(&self.file);

        let written = task::spawn_blocking(move || {
            let mut sink: &File = &file;
            append_record(&mut sink, &serialized)
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
        .and_then(|result| result);

        self.current_offset =
            written.map_err(|e| StoreError::io(format!("append to {}/{}", collection, id), e))?;
        Ok(())
    }
}

/// Durable document store backed by a single record file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl FileStore {
    /// Opens or creates the store under `data_dir`.
    ///
    /// # Errors
    ///
    /// - `Unavailable` if the directory or file cannot be created or opened
    /// - `Corruption` if any existing record fails verification
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        let data_subdir = data_dir.join(DATA_SUBDIR);
        let path = data_subdir.join(STORE_FILE);

        fs::create_dir_all(&data_subdir).map_err(|e| {
            StoreError::Unavailable(format!(
                "cannot create data directory {}: {}",
                data_subdir.display(),
                e
            ))
        })?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                StoreError::Unavailable(format!("cannot open {}: {}", path.display(), e))
            })?;

        let (collections, current_offset) = Self::replay(&path)?;
        debug!(
            path = %path.display(),
            collections = collections.len(),
            bytes = current_offset,
            "store file replayed"
        );

        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                file: Arc::new(file),
                current_offset,
                collections,
            }),
        })
    }

    /// Path of the record file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written so far, including records replayed at open.
    pub async fn current_offset(&self) -> u64 {
        self.inner.lock().await.current_offset
    }

    /// Scans the record file and rebuilds the latest-wins document map.
    fn replay(path: &Path) -> StoreResult<(BTreeMap<String, Collection>, u64)> {
        let data = fs::read(path).map_err(|e| StoreError::io("read store file", e))?;
        let mut collections: BTreeMap<String, Collection> = BTreeMap::new();
        let mut offset = 0usize;

        while offset < data.len() {
            let remaining = data.len() - offset;
            if remaining < MIN_RECORD_SIZE {
                return Err(StoreError::corruption(
                    offset as u64,
                    format!(
                        "truncated store: {} bytes remaining, minimum record size is {}",
                        remaining, MIN_RECORD_SIZE
                    ),
                ));
            }

            let (record, consumed) = DocumentRecord::deserialize(&data[offset..])
                .map_err(|e| StoreError::corruption(offset as u64, e.to_string()))?;

            let document = record.document().map_err(|e| {
                StoreError::corruption(offset as u64, format!("invalid document body: {}", e))
            })?;

            collections
                .entry(record.collection)
                .or_default()
                .insert(record.document_id, document);

            offset += consumed;
        }

        Ok((collections, offset as u64))
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn find_or_create(
        &self,
        collection: &str,
        id: &str,
        default: Value,
    ) -> StoreResult<(Value, bool)> {
        let mut inner = self.inner.lock().await;

        if let Some(existing) = inner.collections.get(collection).and_then(|c| c.get(id)) {
            return Ok((existing.clone(), false));
        }

        inner.append(collection, id, &default).await?;
        Ok(find_or_insert(&mut inner.collections, collection, id, default))
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn put(&self, collection: &str, id: &str, document: Value) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.append(collection, id, &document).await?;
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<(String, Value)>> {
        let inner = self.inner.lock().await;
        Ok(list_collection(&inner.collections, collection))
    }
}
