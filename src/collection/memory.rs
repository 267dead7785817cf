//! # In-Memory Document Engine
//!
//! [`MemoryDatabase`] owns one document store per registered collection.
//! [`MemoryCollection`] is the typed front of a store: it validates writes
//! through the collection's [`Model`] and runs queries through the store.
//!
//! Each store keeps documents in insertion order behind its own `RwLock`.
//! Locks are never held while related collections are read for
//! population.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use futures_util::future::BoxFuture;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::errors::{CollectionError, CollectionResult};
use super::matcher::{sort_documents, FilterSet};
use super::record::{lookup_path, Record, ID_FIELD, VERSION_FIELD};
use super::Collection;
use crate::models::{Model, Relation, RelationKind};
use crate::query::{DocumentQuery, Projection, ProjectionMode};

/// Registry of collection stores
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    stores: Arc<RwLock<HashMap<&'static str, Arc<Store>>>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed handle on the collection of `M`, registering it on first use
    pub fn collection<M: Model>(&self) -> CollectionResult<MemoryCollection<M>> {
        let mut stores = self
            .stores
            .write()
            .map_err(|_| CollectionError::lock_poisoned())?;

        let store = stores
            .entry(M::COLLECTION)
            .or_insert_with(|| Arc::new(Store::for_model::<M>()))
            .clone();

        Ok(MemoryCollection {
            store,
            database: self.clone(),
            _model: PhantomData,
        })
    }

    /// Names of registered collections
    pub fn collection_names(&self) -> CollectionResult<Vec<&'static str>> {
        let stores = self
            .stores
            .read()
            .map_err(|_| CollectionError::lock_poisoned())?;
        let mut names: Vec<&'static str> = stores.keys().copied().collect();
        names.sort_unstable();
        Ok(names)
    }

    fn store(&self, name: &str) -> CollectionResult<Arc<Store>> {
        let stores = self
            .stores
            .read()
            .map_err(|_| CollectionError::lock_poisoned())?;
        stores
            .get(name)
            .cloned()
            .ok_or_else(|| CollectionError::UnknownCollection(name.to_string()))
    }
}

/// Documents of one collection plus what the engine needs to query them
struct Store {
    name: &'static str,
    documents: RwLock<Vec<Map<String, Value>>>,
    scope: fn(DocumentQuery) -> DocumentQuery,
    hidden: &'static [&'static str],
    relations: Vec<Relation>,
    computed: fn(&Map<String, Value>) -> Map<String, Value>,
}

impl Store {
    fn for_model<M: Model>() -> Self {
        Self {
            name: M::COLLECTION,
            documents: RwLock::new(Vec::new()),
            scope: M::scope_query,
            hidden: M::HIDDEN_FIELDS,
            relations: M::relations(),
            computed: M::computed_fields,
        }
    }

    /// Document as readers see it, with computed fields added
    fn present(&self, mut doc: Map<String, Value>) -> Map<String, Value> {
        let computed = (self.computed)(&doc);
        doc.extend(computed);
        doc
    }

    /// Filter that every read and write on this store must satisfy
    fn scope_filter(&self) -> CollectionResult<FilterSet> {
        let scoped = (self.scope)(DocumentQuery::new());
        FilterSet::compile(scoped.filter_document())
    }

    /// Execute a query: scope, filter, sort, page, project, populate
    fn run(&self, query: DocumentQuery, database: &MemoryDatabase) -> CollectionResult<Vec<Map<String, Value>>> {
        let query = (self.scope)(query);
        let filter = FilterSet::compile(query.filter_document())?;
        let projection = query.projection().cloned().unwrap_or_default();
        let mode = projection
            .mode()
            .map_err(|e| CollectionError::malformed(e.to_string()))?;

        let mut matched: Vec<Map<String, Value>> = {
            let documents = self
                .documents
                .read()
                .map_err(|_| CollectionError::lock_poisoned())?;
            documents.iter().filter(|doc| filter.matches(doc)).cloned().collect()
        };

        if let Some(sort) = query.sort_spec() {
            sort_documents(&mut matched, sort);
        }

        let skip = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let take = query
            .page_size()
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        let mut page: Vec<Map<String, Value>> = matched
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|doc| self.project(self.present(doc), &mode))
            .collect();

        for path in query.populate_paths() {
            let relation = self
                .relations
                .iter()
                .find(|r| r.path == path)
                .ok_or_else(|| {
                    CollectionError::malformed(format!(
                        "'{}' is not a relation of {}",
                        path, self.name
                    ))
                })?;

            for doc in page.iter_mut() {
                populate(doc, relation, database)?;
            }
        }

        Ok(page)
    }

    fn project(&self, doc: Map<String, Value>, mode: &ProjectionMode<'_>) -> Map<String, Value> {
        match mode {
            ProjectionMode::Include { fields, with_id } => doc
                .into_iter()
                .filter(|(key, _)| {
                    fields.contains(&key.as_str()) || (*with_id && key == ID_FIELD)
                })
                .collect(),
            ProjectionMode::Exclude(excluded) => doc
                .into_iter()
                .filter(|(key, _)| {
                    !excluded.contains(&key.as_str()) && !self.hidden.contains(&key.as_str())
                })
                .collect(),
        }
    }

    fn check_unique(
        &self,
        documents: &[Map<String, Value>],
        candidate: &Map<String, Value>,
        unique_fields: &[&str],
        skip_id: Option<&str>,
    ) -> CollectionResult<()> {
        for field in unique_fields {
            let Some(value) = candidate.get(*field) else {
                continue;
            };

            let clash = documents.iter().any(|doc| {
                doc.get(ID_FIELD).and_then(Value::as_str) != skip_id && doc.get(*field) == Some(value)
            });

            if clash {
                return Err(CollectionError::DuplicateKey {
                    field: field.to_string(),
                    value: value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string()),
                });
            }
        }
        Ok(())
    }
}

/// Replace the relation field of `doc` with the related documents
fn populate(doc: &mut Map<String, Value>, relation: &Relation, database: &MemoryDatabase) -> CollectionResult<()> {
    let target = database.store(relation.target)?;
    let select = Projection::parse(relation.select);

    match relation.kind {
        RelationKind::Reference => {
            let Some(current) = doc.get(relation.path).cloned() else {
                return Ok(());
            };

            let ids: Vec<Value> = match &current {
                Value::Array(items) => items.clone(),
                Value::Null => return Ok(()),
                single => vec![single.clone()],
            };

            let query = DocumentQuery::new()
                .where_field(ID_FIELD, json!({ "$in": ids }))
                .select(select);
            let found = target.run(query, database)?;

            let by_id = |id: &Value| {
                found
                    .iter()
                    .find(|candidate| candidate.get(ID_FIELD) == Some(id))
                    .cloned()
                    .map(Value::Object)
            };

            let expanded = match current {
                Value::Array(items) => Value::Array(items.iter().filter_map(by_id).collect()),
                single => by_id(&single).unwrap_or(Value::Null),
            };
            doc.insert(relation.path.to_string(), expanded);
        }
        RelationKind::Virtual { foreign_field } => {
            let Some(id) = doc.get(ID_FIELD).cloned() else {
                return Ok(());
            };

            let query = DocumentQuery::new()
                .where_field(foreign_field, id)
                .select(select);
            let found = target.run(query, database)?;

            doc.insert(
                relation.path.to_string(),
                Value::Array(found.into_iter().map(Value::Object).collect()),
            );
        }
    }

    Ok(())
}

/// Typed handle on one collection of a [`MemoryDatabase`]
pub struct MemoryCollection<M: Model> {
    store: Arc<Store>,
    database: MemoryDatabase,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Clone for MemoryCollection<M> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            database: self.database.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> MemoryCollection<M> {
    /// Number of stored documents, ignoring the collection scope
    pub fn len(&self) -> CollectionResult<usize> {
        let documents = self
            .store
            .documents
            .read()
            .map_err(|_| CollectionError::lock_poisoned())?;
        Ok(documents.len())
    }

    pub fn is_empty(&self) -> CollectionResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Validate a payload through the model and return the stored form
    fn materialize(payload: Map<String, Value>, first_write: bool) -> CollectionResult<Map<String, Value>> {
        let mut model: M = serde_json::from_value(Value::Object(payload))
            .map_err(|e| CollectionError::validation(e.to_string()))?;

        model.normalize();
        if first_write {
            model.before_insert();
        }
        model
            .validate()
            .map_err(|e| CollectionError::validation(e.to_string()))?;

        match serde_json::to_value(&model) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => Err(CollectionError::internal(format!(
                "{} documents must serialize to objects",
                M::COLLECTION
            ))),
            Err(e) => Err(CollectionError::internal(e.to_string())),
        }
    }

    fn insert_sync(&self, mut payload: Map<String, Value>) -> CollectionResult<Record> {
        let id = match payload.remove(ID_FIELD) {
            Some(Value::String(id)) if !id.is_empty() => id,
            _ => Uuid::new_v4().to_string(),
        };
        payload.remove(VERSION_FIELD);

        let mut document = Self::materialize(payload, true)?;
        document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        document.insert(VERSION_FIELD.to_string(), json!(0));

        let mut documents = self
            .store
            .documents
            .write()
            .map_err(|_| CollectionError::lock_poisoned())?;

        if documents
            .iter()
            .any(|doc| doc.get(ID_FIELD).and_then(Value::as_str) == Some(id.as_str()))
        {
            return Err(CollectionError::DuplicateKey {
                field: ID_FIELD.to_string(),
                value: id,
            });
        }
        self.store
            .check_unique(&documents, &document, M::UNIQUE_FIELDS, None)?;

        documents.push(document.clone());
        Ok(Record::from_document(self.store.present(document)))
    }

    fn update_sync(&self, id: &str, patch: Map<String, Value>) -> CollectionResult<Option<Record>> {
        let scope = self.store.scope_filter()?;
        let mut documents = self
            .store
            .documents
            .write()
            .map_err(|_| CollectionError::lock_poisoned())?;

        let Some(position) = find_position(&documents, id, &scope) else {
            return Ok(None);
        };

        let existing = &documents[position];
        let version = existing
            .get(VERSION_FIELD)
            .and_then(Value::as_u64)
            .unwrap_or(0);

        let mut merged = existing.clone();
        for (key, value) in patch {
            if key != ID_FIELD && key != VERSION_FIELD {
                merged.insert(key, value);
            }
        }

        let mut document = Self::materialize(merged, false)?;
        document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        document.insert(VERSION_FIELD.to_string(), json!(version + 1));

        self.store
            .check_unique(&documents, &document, M::UNIQUE_FIELDS, Some(id))?;

        documents[position] = document.clone();
        Ok(Some(Record::from_document(document)))
    }

    /// Read one document through the scoped query path
    fn read_by_id(&self, id: &str, populate: &[String]) -> CollectionResult<Option<Record>> {
        let query = populate.iter().fold(
            DocumentQuery::new()
                .where_field(ID_FIELD, Value::String(id.to_string()))
                .limit(1),
            |query, path| query.populate(path.clone()),
        );
        let mut documents = self.store.run(query, &self.database)?;
        Ok(documents.pop().map(Record::from_document))
    }

    fn delete_sync(&self, id: &str) -> CollectionResult<Option<Record>> {
        let scope = self.store.scope_filter()?;
        let mut documents = self
            .store
            .documents
            .write()
            .map_err(|_| CollectionError::lock_poisoned())?;

        Ok(find_position(&documents, id, &scope)
            .map(|position| Record::from_document(documents.remove(position))))
    }
}

fn find_position(documents: &[Map<String, Value>], id: &str, scope: &FilterSet) -> Option<usize> {
    documents.iter().position(|doc| {
        lookup_path(doc, ID_FIELD).and_then(Value::as_str) == Some(id) && scope.matches(doc)
    })
}

impl<M: Model> Collection for MemoryCollection<M> {
    type Model = M;

    fn exec(&self, query: DocumentQuery) -> BoxFuture<'_, CollectionResult<Vec<Record>>> {
        Box::pin(async move {
            let documents = self.store.run(query, &self.database)?;
            Ok(documents.into_iter().map(Record::from_document).collect())
        })
    }

    fn find_by_id<'a>(
        &'a self,
        id: &'a str,
        populate: &'a [String],
    ) -> BoxFuture<'a, CollectionResult<Option<Record>>> {
        Box::pin(async move { self.read_by_id(id, populate) })
    }

    fn insert(&self, payload: Map<String, Value>) -> BoxFuture<'_, CollectionResult<Record>> {
        Box::pin(async move { self.insert_sync(payload) })
    }

    fn update_by_id<'a>(
        &'a self,
        id: &'a str,
        patch: Map<String, Value>,
    ) -> BoxFuture<'a, CollectionResult<Option<Record>>> {
        Box::pin(async move {
            // The updated document is returned the way reads return it
            match self.update_sync(id, patch)? {
                Some(_) => self.read_by_id(id, &[]),
                None => Ok(None),
            }
        })
    }

    fn delete_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CollectionResult<Option<Record>>> {
        Box::pin(async move { self.delete_sync(id) })
    }
}
