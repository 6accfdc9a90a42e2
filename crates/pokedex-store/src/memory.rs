use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use arc_swap::ArcSwap;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use imbl::{HashMap, OrdMap};

use crate::error::StoreError;
use crate::filter::Filter;
use crate::query::FindQuery;
use crate::snapshot;
use crate::sort::apply_sort;
use crate::store::DocumentStore;
use crate::update::Update;
use crate::validate::validate_document;

/// One published version of the collection.
///
/// Documents are keyed by insertion sequence, so iteration order is natural
/// order. `ids` maps the normalized `_id` to its sequence for the uniqueness
/// check. Cloning is cheap thanks to imbl structural sharing.
#[derive(Clone, Debug, Default)]
struct Collection {
    docs: OrdMap<u64, Document>,
    ids: HashMap<String, u64>,
}

impl Collection {
    fn insert(&mut self, next_seq: &mut u64, doc: Document) -> Result<Document, StoreError> {
        validate_document(&doc)?;

        let doc = match doc.get("_id") {
            Some(_) => doc,
            None => {
                // _id leads the document, as the store would lay it out
                let mut with_id = Document::new();
                with_id.insert("_id", ObjectId::new().to_hex());
                for (key, value) in doc {
                    with_id.insert(key, value);
                }
                with_id
            }
        };

        let id = doc.get("_id").cloned().unwrap_or(Bson::Null);
        let key = id_key(&id);
        if self.ids.contains_key(&key) {
            return Err(StoreError::DuplicateKey(id.to_string()));
        }

        let seq = *next_seq;
        *next_seq += 1;
        self.ids.insert(key, seq);
        self.docs.insert(seq, doc.clone());
        Ok(doc)
    }

    fn first_match(&self, filter: &Filter) -> Option<(u64, &Document)> {
        self.docs
            .iter()
            .find(|(_, doc)| filter.matches(doc))
            .map(|(seq, doc)| (*seq, doc))
    }

    fn remove(&mut self, seq: u64) -> Option<Document> {
        let doc = self.docs.remove(&seq)?;
        if let Some(id) = doc.get("_id") {
            self.ids.remove(&id_key(id));
        }
        Some(doc)
    }
}

/// Uniqueness key for `_id`. Numerically equal ids collide regardless of width.
fn id_key(id: &Bson) -> String {
    match id {
        Bson::Int32(v) => format!("n:{v}"),
        Bson::Int64(v) => format!("n:{v}"),
        Bson::Double(v) if v.is_finite() && v.fract() == 0.0 => format!("n:{}", *v as i64),
        other => format!("{:?}:{other}", other.element_type()),
    }
}

/// In-memory document collection.
///
/// Readers load the current version lock-free; writers serialize on
/// `write_lock`, build a new version and publish it with a single swap. A
/// reader never observes a half-applied write.
#[derive(Debug)]
pub struct MemoryStore {
    current: ArcSwap<Collection>,
    /// Guards the next insertion sequence. Held for the duration of a write.
    write_lock: Mutex<u64>,
    data_file: Option<PathBuf>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_data_file(None)
    }

    /// Open a store backed by a JSON data file.
    ///
    /// A missing file starts an empty collection; the file is (re)written
    /// when the store is closed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let store = Self::with_data_file(Some(path.clone()));
        if path.exists() {
            let docs = snapshot::load_documents(&path)?;
            let loaded = store.insert_many(docs)?;
            tracing::info!(path = %path.display(), documents = loaded, "loaded data file");
        } else {
            tracing::info!(path = %path.display(), "data file not found, starting empty");
        }
        Ok(store)
    }

    fn with_data_file(data_file: Option<PathBuf>) -> Self {
        Self {
            current: ArcSwap::from_pointee(Collection::default()),
            write_lock: Mutex::new(0),
            data_file,
            closed: AtomicBool::new(false),
        }
    }

    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    pub fn len(&self) -> usize {
        self.current.load().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, u64>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|e| StoreError::Storage(format!("write lock poisoned: {e}")))
    }

    /// Run `f` against a private copy of the collection and publish the
    /// copy only if `f` succeeds.
    fn write<T>(
        &self,
        f: impl FnOnce(&mut Collection, &mut u64) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut next_seq = self.lock_writes()?;
        self.check_open()?;

        let mut data = Collection::clone(&self.current.load());
        let result = f(&mut data, &mut next_seq)?;
        self.current.store(Arc::new(data));
        Ok(result)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn insert_one(&self, doc: Document) -> Result<Document, StoreError> {
        self.write(|data, next_seq| data.insert(next_seq, doc))
    }

    fn insert_many(&self, docs: Vec<Document>) -> Result<usize, StoreError> {
        self.write(|data, next_seq| {
            let count = docs.len();
            for doc in docs {
                data.insert(next_seq, doc)?;
            }
            Ok(count)
        })
    }

    fn find(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        self.check_open()?;

        let skip = match query.skip {
            Some(skip) if skip < 0 => {
                return Err(StoreError::InvalidQuery(format!(
                    "skip must be non-negative, got {skip}"
                )));
            }
            Some(skip) => usize::try_from(skip).unwrap_or(usize::MAX),
            None => 0,
        };
        let limit = query
            .limit
            .map(i64::unsigned_abs)
            .filter(|limit| *limit > 0)
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX));

        let snapshot = self.current.load();
        let mut docs: Vec<Document> = snapshot
            .docs
            .values()
            .filter(|doc| query.filter.matches(doc))
            .cloned()
            .collect();
        apply_sort(&mut docs, &query.sort);

        let page = docs.into_iter().skip(skip);
        Ok(match limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        })
    }

    fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        self.check_open()?;
        let snapshot = self.current.load();
        Ok(snapshot.first_match(filter).map(|(_, doc)| doc.clone()))
    }

    fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.check_open()?;
        let snapshot = self.current.load();
        Ok(snapshot.docs.values().filter(|doc| filter.matches(doc)).count() as u64)
    }

    fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &Update,
    ) -> Result<Option<Document>, StoreError> {
        self.write(|data, _| {
            let Some((seq, doc)) = data.first_match(filter) else {
                return Ok(None);
            };
            let updated = update.apply(doc)?;
            validate_document(&updated)?;
            data.docs.insert(seq, updated.clone());
            Ok(Some(updated))
        })
    }

    fn find_one_and_delete(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        self.write(|data, _| {
            let Some((seq, _)) = data.first_match(filter) else {
                return Ok(None);
            };
            Ok(data.remove(seq))
        })
    }

    fn close(&self) -> Result<(), StoreError> {
        let _guard = self.lock_writes()?;
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }

        if let Some(path) = &self.data_file {
            let snapshot = self.current.load();
            snapshot::write_documents(path, snapshot.docs.values())?;
            tracing::info!(
                path = %path.display(),
                documents = snapshot.docs.len(),
                "flushed data file"
            );
        }

        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
