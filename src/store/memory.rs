// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};

use super::filter::order_documents;
use super::{Document, Filter, RecordStore, ID_FIELD};

type Collection = IndexMap<String, Document>;

/// In-process document store.
/// Collections keep insertion order; documents are keyed by the JSON text of their `_id`.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self, collection: &str) -> StoreResult<usize> {
        let guard = self.collections.read().map_err(|_| poisoned(collection))?;
        Ok(guard.get(collection).map_or(0, IndexMap::len))
    }

    pub fn snapshot(&self) -> StoreResult<Vec<u8>> {
        let guard = self.collections.read().map_err(|_| poisoned("*"))?;
        let dump: HashMap<&String, Vec<&Document>> = guard
            .iter()
            .map(|(name, docs)| (name, docs.values().collect()))
            .collect();
        Ok(serde_json::to_vec(&dump)?)
    }

    pub fn restore(&self, data: &[u8]) -> StoreResult<()> {
        let dump: HashMap<String, Vec<Document>> = serde_json::from_slice(data)?;
        let mut rebuilt = HashMap::with_capacity(dump.len());
        for (name, docs) in dump {
            let mut collection = Collection::with_capacity(docs.len());
            for doc in docs {
                let key = key_of(&name, &doc)?;
                collection.insert(key, doc);
            }
            rebuilt.insert(name, collection);
        }

        let mut guard = self.collections.write().map_err(|_| poisoned("*"))?;
        *guard = rebuilt;
        Ok(())
    }

    fn write<R>(&self, collection: &str, f: impl FnOnce(&mut Collection) -> R) -> StoreResult<R> {
        let mut guard = self.collections.write().map_err(|_| poisoned(collection))?;
        Ok(f(guard.entry(collection.to_string()).or_default()))
    }
}

impl RecordStore for MemoryStore {
    fn find(&self, collection: &str, filter: &Filter, sort: Option<&str>) -> StoreResult<Vec<Document>> {
        let mut docs: Vec<Document> = {
            let guard = self.collections.read().map_err(|_| poisoned(collection))?;
            match guard.get(collection) {
                Some(docs) => docs.values().filter(|d| filter.matches(d)).cloned().collect(),
                None => Vec::new(),
            }
        };
        order_documents(&mut docs, filter, sort);
        Ok(docs)
    }

    fn get(&self, collection: &str, id: &Value) -> StoreResult<Option<Document>> {
        let guard = self.collections.read().map_err(|_| poisoned(collection))?;
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.get(&id.to_string()))
            .cloned())
    }

    fn replace(&self, collection: &str, doc: Document) -> StoreResult<()> {
        let key = key_of(collection, &doc)?;
        self.write(collection, |docs| {
            docs.insert(key, doc);
        })
    }

    fn merge(&self, collection: &str, doc: Document) -> StoreResult<()> {
        let key = key_of(collection, &doc)?;
        self.write(collection, |docs| match docs.get_mut(&key) {
            Some(existing) => existing.extend(doc),
            None => {
                docs.insert(key, doc);
            }
        })
    }

    fn update_many(&self, collection: &str, filter: &Filter, fields: &Document) -> StoreResult<usize> {
        self.write(collection, |docs| {
            let mut touched = 0;
            for doc in docs.values_mut().filter(|d| filter.matches(d)) {
                doc.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                touched += 1;
            }
            touched
        })
    }
}

fn key_of(collection: &str, doc: &Document) -> StoreResult<String> {
    doc.get(ID_FIELD)
        .map(Value::to_string)
        .ok_or_else(|| StoreError::MissingId(collection.to_string()))
}

fn poisoned(collection: &str) -> StoreError {
    StoreError::Poisoned(collection.to_string())
}
