use crate::collection::{Document, Identifier, IndexOptions, UpdateResult};
use crate::common::{Atomic, Guarded, ProjectionSpec, Value, DEFAULT_INDEX_NAME, DOC_ID};
use crate::errors::{ErrorKind, MongoKitError, MongoKitResult};
use crate::options::CollectionSettings;
use crate::store::memory::aggregation::run_pipeline;
use crate::store::memory::matcher::Matcher;
use crate::store::memory::query::{execute_find, project};
use crate::store::memory::store::InMemoryStoreInner;
use crate::store::memory::updater::{apply_update, upsert_seed};
use crate::store::{FindQuery, ResultStream, StoreCollectionProvider, VecResultStream};
use indexmap::IndexMap;
use itertools::Itertools;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct IndexEntry {
    keys: Document,
    unique: bool,
}

impl IndexEntry {
    fn key_of(&self, document: &Document) -> Vec<Value> {
        self.keys
            .iter()
            .map(|(field, _)| document.get(field).cloned().unwrap_or(Value::Null))
            .collect()
    }
}

/// Documents of one collection in insertion order plus its indexes.
#[derive(Debug)]
pub(crate) struct CollectionData {
    documents: Vec<Document>,
    indexes: IndexMap<String, IndexEntry>,
}

impl CollectionData {
    pub(crate) fn new() -> Self {
        let mut indexes = IndexMap::new();
        let mut keys = Document::new();
        keys.put_literal(DOC_ID, Value::I64(1));
        indexes.insert(DEFAULT_INDEX_NAME.to_string(), IndexEntry { keys, unique: true });
        CollectionData {
            documents: Vec::new(),
            indexes,
        }
    }

    /// Fails when `candidate` collides with another document on a unique
    /// index. `position` is the candidate's own slot, if it already has one.
    fn check_unique(&self, candidate: &Document, position: Option<usize>) -> MongoKitResult<()> {
        for (name, index) in self.indexes.iter().filter(|(_, index)| index.unique) {
            let key = index.key_of(candidate);
            let collides = self
                .documents
                .iter()
                .enumerate()
                .any(|(i, existing)| Some(i) != position && index.key_of(existing) == key);
            if collides {
                log::error!("Duplicate key error on index {} for key {:?}", name, key);
                return Err(MongoKitError::new(
                    &format!("E11000 duplicate key error index: {} dup key: {:?}", name, key),
                    ErrorKind::DuplicateKey,
                ));
            }
        }
        Ok(())
    }

    fn insert(&mut self, document: &Document) -> MongoKitResult<Value> {
        let stored = match document.get(DOC_ID) {
            Some(_) => document.clone(),
            None => {
                let mut stored = Document::new();
                stored.put_literal(DOC_ID, Value::Identifier(Identifier::new()));
                for (key, value) in document.iter() {
                    stored.put_literal(key, value.clone());
                }
                stored
            }
        };

        self.check_unique(&stored, None)?;
        let id = stored.get(DOC_ID).cloned().unwrap_or(Value::Null);
        self.documents.push(stored);
        Ok(id)
    }

    fn update(&mut self, matcher: &Matcher, filter: &Document, update: &Document, upsert: bool, multi: bool) -> MongoKitResult<UpdateResult> {
        let positions: Vec<usize> = self
            .documents
            .iter()
            .positions(|d| matcher.matches(d))
            .take(if multi { usize::MAX } else { 1 })
            .collect();

        if positions.is_empty() {
            if !upsert {
                return Ok(UpdateResult::new(0, 0, None));
            }
            let mut seed = upsert_seed(filter)?;
            apply_update(&mut seed, update, true)?;
            let id = self.insert(&seed)?;
            return Ok(UpdateResult::new(0, 0, Some(id)));
        }

        let mut modified = 0;
        for position in &positions {
            let mut updated = self.documents[*position].clone();
            apply_update(&mut updated, update, false)?;
            if updated != self.documents[*position] {
                self.check_unique(&updated, Some(*position))?;
                self.documents[*position] = updated;
                modified += 1;
            }
        }
        Ok(UpdateResult::new(positions.len() as u64, modified, None))
    }

    fn index_documents(&self) -> Vec<Document> {
        self.indexes
            .iter()
            .map(|(name, index)| {
                let mut description = Document::new();
                description.put_literal("v", Value::I64(2));
                description.put_literal("key", Value::Document(index.keys.clone()));
                description.put_literal("name", Value::from(name));
                if index.unique && name != DEFAULT_INDEX_NAME {
                    description.put_literal("unique", Value::Bool(true));
                }
                description
            })
            .collect()
    }
}

fn generated_index_name(keys: &Document) -> MongoKitResult<String> {
    let mut parts = Vec::with_capacity(keys.len());
    for (field, direction) in keys.iter() {
        let direction = match direction.as_f64() {
            Some(d) if d == 1.0 || d == -1.0 => d as i64,
            _ => {
                log::error!("Invalid index direction {} for field {}", direction, field);
                return Err(MongoKitError::new(
                    &format!("Invalid index direction {} for field {}", direction, field),
                    ErrorKind::StoreError,
                ));
            }
        };
        parts.push(format!("{}_{}", field, direction));
    }
    Ok(parts.join("_"))
}

/// A collection of an [InMemoryStore](crate::store::memory::InMemoryStore).
///
/// Data is created on the first write; reads of a collection that was never
/// written see no documents.
pub struct InMemoryCollection {
    store: Arc<InMemoryStoreInner>,
    database: String,
    name: String,
    settings: CollectionSettings,
}

impl InMemoryCollection {
    pub(crate) fn new(store: Arc<InMemoryStoreInner>, database: &str, name: &str, settings: CollectionSettings) -> Self {
        InMemoryCollection {
            store,
            database: database.to_string(),
            name: name.to_string(),
            settings,
        }
    }

    pub fn settings(&self) -> &CollectionSettings {
        &self.settings
    }

    fn existing(&self) -> MongoKitResult<Option<Atomic<CollectionData>>> {
        self.store.ensure_open()?;
        Ok(self.store.data(&self.database, &self.name))
    }

    fn created(&self) -> MongoKitResult<Atomic<CollectionData>> {
        self.store.ensure_open()?;
        Ok(self.store.data_or_create(&self.database, &self.name))
    }

    fn snapshot(&self) -> MongoKitResult<Vec<Document>> {
        Ok(match self.existing()? {
            Some(data) => data.read_with(|data| data.documents.clone()),
            None => Vec::new(),
        })
    }

    fn stream(&self, documents: Vec<Document>) -> Box<dyn ResultStream> {
        Box::new(VecResultStream::tracked(documents, self.store.tracker()))
    }

    fn delete(&self, filter: &Document, multi: bool) -> MongoKitResult<u64> {
        let matcher = Matcher::parse(filter)?;
        let Some(data) = self.existing()? else {
            return Ok(0);
        };

        Ok(data.write_with(|data| {
            let before = data.documents.len();
            if multi {
                data.documents.retain(|d| !matcher.matches(d));
            } else if let Some(position) = data.documents.iter().position(|d| matcher.matches(d)) {
                data.documents.remove(position);
            }
            (before - data.documents.len()) as u64
        }))
    }

    fn update(&self, filter: &Document, update: &Document, upsert: bool, multi: bool) -> MongoKitResult<UpdateResult> {
        let matcher = Matcher::parse(filter)?;
        let data = if upsert {
            self.created()?
        } else {
            match self.existing()? {
                Some(data) => data,
                None => return Ok(UpdateResult::new(0, 0, None)),
            }
        };
        let result = data.write_with(|data| data.update(&matcher, filter, update, upsert, multi))?;
        log::debug!(
            "Updated {}.{}: matched {}, modified {}",
            self.database,
            self.name,
            result.matched_count(),
            result.modified_count()
        );
        Ok(result)
    }
}

impl StoreCollectionProvider for InMemoryCollection {
    fn database_name(&self) -> &str {
        &self.database
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn count(&self, filter: &Document) -> MongoKitResult<u64> {
        let matcher = Matcher::parse(filter)?;
        let documents = self.snapshot()?;
        Ok(documents.iter().filter(|d| matcher.matches(d)).count() as u64)
    }

    fn find(&self, query: &FindQuery) -> MongoKitResult<Box<dyn ResultStream>> {
        let found = execute_find(self.snapshot()?, query)?;
        Ok(self.stream(found))
    }

    fn aggregate(&self, pipeline: &[Document]) -> MongoKitResult<Box<dyn ResultStream>> {
        let results = run_pipeline(self.snapshot()?, pipeline)?;
        Ok(self.stream(results))
    }

    fn list_indexes(&self) -> MongoKitResult<Box<dyn ResultStream>> {
        let indexes = match self.existing()? {
            Some(data) => data.read_with(|data| data.index_documents()),
            None => CollectionData::new().index_documents(),
        };
        Ok(self.stream(indexes))
    }

    fn insert_one(&self, document: &Document) -> MongoKitResult<Value> {
        let data = self.created()?;
        data.write_with(|data| data.insert(document))
    }

    fn insert_many(&self, documents: &[Document]) -> MongoKitResult<Vec<Value>> {
        let data = self.created()?;
        // ordered: documents before a failure stay inserted
        data.write_with(|data| documents.iter().map(|d| data.insert(d)).collect())
    }

    fn update_one(&self, filter: &Document, update: &Document, upsert: bool) -> MongoKitResult<UpdateResult> {
        self.update(filter, update, upsert, false)
    }

    fn update_many(&self, filter: &Document, update: &Document, upsert: bool) -> MongoKitResult<UpdateResult> {
        self.update(filter, update, upsert, true)
    }

    fn find_and_update(
        &self,
        filter: &Document,
        update: &Document,
        multi: bool,
        projection: Option<&ProjectionSpec>,
    ) -> MongoKitResult<Option<Document>> {
        let matcher = Matcher::parse(filter)?;
        let Some(data) = self.existing()? else {
            return Ok(None);
        };

        let updated = data.write_with(|data| -> MongoKitResult<Option<Document>> {
            let positions: Vec<usize> = data
                .documents
                .iter()
                .positions(|d| matcher.matches(d))
                .take(if multi { usize::MAX } else { 1 })
                .collect();

            let mut first = None;
            for position in positions {
                let mut updated = data.documents[position].clone();
                apply_update(&mut updated, update, false)?;
                data.check_unique(&updated, Some(position))?;
                data.documents[position] = updated.clone();
                first.get_or_insert(updated);
            }
            Ok(first)
        })?;

        match (updated, projection) {
            (Some(document), Some(projection)) => Ok(Some(project(&document, projection)?)),
            (updated, _) => Ok(updated),
        }
    }

    fn delete_one(&self, filter: &Document) -> MongoKitResult<u64> {
        self.delete(filter, false)
    }

    fn delete_many(&self, filter: &Document) -> MongoKitResult<u64> {
        self.delete(filter, true)
    }

    fn distinct(&self, field: &str, filter: &Document) -> MongoKitResult<Vec<Value>> {
        let matcher = Matcher::parse(filter)?;
        let mut values: Vec<Value> = Vec::new();
        for document in self.snapshot()?.iter().filter(|d| matcher.matches(d)) {
            let candidates = match document.get(field) {
                Some(Value::Array(items)) => items.clone(),
                Some(value) => vec![value.clone()],
                None => continue,
            };
            for candidate in candidates {
                if !values.contains(&candidate) {
                    values.push(candidate);
                }
            }
        }
        Ok(values)
    }

    fn create_index(&self, keys: &Document, options: &IndexOptions) -> MongoKitResult<String> {
        if keys.is_empty() {
            log::error!("Index keys cannot be empty");
            return Err(MongoKitError::new("Index keys cannot be empty", ErrorKind::StoreError));
        }
        let name = match options.index_name() {
            Some(name) => name.to_string(),
            None => generated_index_name(keys)?,
        };
        let entry = IndexEntry {
            keys: keys.clone(),
            unique: options.is_unique(),
        };

        let data = self.created()?;
        data.write_with(|data| {
            if let Some(existing) = data.indexes.get(&name) {
                if *existing == entry {
                    return Ok(name.clone());
                }
                log::error!("Index {} already exists with different options", name);
                return Err(MongoKitError::new(
                    &format!("Index {} already exists with different options", name),
                    ErrorKind::StoreError,
                ));
            }
            if let Some((other, _)) = data.indexes.iter().find(|(_, index)| index.keys == entry.keys) {
                log::error!("Index with keys {} already exists as {}", keys, other);
                return Err(MongoKitError::new(
                    &format!("Index with keys {} already exists as {}", keys, other),
                    ErrorKind::StoreError,
                ));
            }

            if entry.unique {
                let mut seen = Vec::with_capacity(data.documents.len());
                for document in &data.documents {
                    let key = entry.key_of(document);
                    if seen.contains(&key) {
                        log::error!("Cannot create unique index {}: duplicate key {:?}", name, key);
                        return Err(MongoKitError::new(
                            &format!("E11000 duplicate key error index: {} dup key: {:?}", name, key),
                            ErrorKind::DuplicateKey,
                        ));
                    }
                    seen.push(key);
                }
            }

            data.indexes.insert(name.clone(), entry.clone());
            Ok(name.clone())
        })
    }

    fn drop_index(&self, name: &str) -> MongoKitResult<()> {
        if name == DEFAULT_INDEX_NAME {
            log::error!("Cannot drop the {} index", DEFAULT_INDEX_NAME);
            return Err(MongoKitError::new(
                &format!("Cannot drop the {} index", DEFAULT_INDEX_NAME),
                ErrorKind::StoreError,
            ));
        }

        let removed = match self.existing()? {
            Some(data) => data.write_with(|data| data.indexes.shift_remove(name).is_some()),
            None => false,
        };
        if !removed {
            log::error!("Index {} not found in {}.{}", name, self.database, self.name);
            return Err(MongoKitError::new(
                &format!("Index {} not found in {}.{}", name, self.database, self.name),
                ErrorKind::NotFound,
            ));
        }
        Ok(())
    }

    fn drop_indexes(&self) -> MongoKitResult<()> {
        if let Some(data) = self.existing()? {
            data.write_with(|data| data.indexes.retain(|name, _| name == DEFAULT_INDEX_NAME));
        }
        Ok(())
    }

    fn drop_collection(&self) -> MongoKitResult<()> {
        self.store.ensure_open()?;
        self.store.remove(&self.database, &self.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::collection::{Document, IndexOptions};
    use crate::common::Value;
    use crate::doc;
    use crate::errors::ErrorKind;
    use crate::store::memory::InMemoryStore;
    use crate::store::{DocumentStoreProvider, FindQuery, StoreCollection};

    fn collection() -> (InMemoryStore, StoreCollection) {
        let store = InMemoryStore::new();
        let collection = store.collection("db", "people", &Default::default()).unwrap();
        (store, collection)
    }

    fn drain(collection: &StoreCollection, query: &FindQuery) -> Vec<Document> {
        let mut stream = collection.find(query).unwrap();
        let mut documents = Vec::new();
        while let Some(document) = stream.next_document().unwrap() {
            documents.push(document);
        }
        stream.close().unwrap();
        documents
    }

    #[test]
    fn insert_assigns_identifier_first() {
        let (_store, people) = collection();
        let document = doc! { name: "a" };
        let id = people.insert_one(&document).unwrap();
        assert!(matches!(id, Value::Identifier(_)));
        assert!(!document.contains_key("_id"));

        let stored = drain(&people, &FindQuery::new(Document::new()));
        assert_eq!(stored[0].fields(), vec!["_id", "name"]);
        assert_eq!(stored[0].get("_id"), Some(&id));
    }

    #[test]
    fn duplicate_identifiers_are_rejected() {
        let (_store, people) = collection();
        people.insert_one(&doc! { "_id": 1 }).unwrap();
        let err = people
            .insert_many(&[doc! { "_id": 2 }, doc! { "_id": 1 }, doc! { "_id": 3 }])
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
        assert_eq!(people.count(&Document::new()).unwrap(), 2);
    }

    #[test]
    fn update_counts_and_upserts() {
        let (_store, people) = collection();
        people
            .insert_many(&[doc! { name: "a", n: 1 }, doc! { name: "b", n: 1 }])
            .unwrap();

        let result = people.update_many(&Document::new(), &doc! { "$set": { n: 1 } }, false).unwrap();
        assert_eq!((result.matched_count(), result.modified_count()), (2, 0));

        let result = people.update_one(&Document::new(), &doc! { "$inc": { n: 1 } }, false).unwrap();
        assert_eq!((result.matched_count(), result.modified_count()), (1, 1));

        let result = people
            .update_one(&doc! { name: "c" }, &doc! { "$set": { n: 5 } }, true)
            .unwrap();
        assert_eq!(result.matched_count(), 0);
        assert!(result.upserted_id().is_some());
        assert_eq!(people.count(&doc! { name: "c", n: 5 }).unwrap(), 1);
    }

    #[test]
    fn find_and_update_returns_first_modified() {
        let (_store, people) = collection();
        people
            .insert_many(&[doc! { name: "a", n: 1 }, doc! { name: "b", n: 1 }])
            .unwrap();
        let updated = people
            .find_and_update(
                &doc! { n: 1 },
                &doc! { "$inc": { n: 1 } },
                false,
                Some(&crate::common::ProjectionSpec::excluding_identifier()),
            )
            .unwrap();
        assert_eq!(updated, Some(doc! { name: "a", n: 2 }));
        assert_eq!(people.count(&doc! { n: 2 }).unwrap(), 1);

        let updated = people
            .find_and_update(&Document::new(), &doc! { "$inc": { n: 1 } }, true, None)
            .unwrap()
            .unwrap();
        assert_eq!(updated.get("n"), Some(&Value::I64(3)));
        assert_eq!(people.count(&doc! { n: 2 }).unwrap(), 1);
        assert_eq!(people.count(&doc! { n: 3 }).unwrap(), 1);

        assert_eq!(
            people.find_and_update(&doc! { name: "z" }, &doc! { "$inc": { n: 1 } }, true, None).unwrap(),
            None
        );
        assert_eq!(people.count(&Document::new()).unwrap(), 2);
    }

    #[test]
    fn update_without_match_leaves_collection_absent() {
        let store = InMemoryStore::new();
        let ghost = store.collection("db", "ghost", &Default::default()).unwrap();
        let result = ghost.update_many(&doc! { n: 1 }, &doc! { "$set": { n: 2 } }, false).unwrap();
        assert_eq!((result.matched_count(), result.modified_count()), (0, 0));
        assert!(result.upserted_id().is_none());
        assert!(store.list_collection_names("db").unwrap().is_empty());

        ghost.update_one(&doc! { n: 1 }, &doc! { "$set": { n: 2 } }, true).unwrap();
        assert_eq!(store.list_collection_names("db").unwrap(), vec!["ghost"]);
    }

    #[test]
    fn delete_and_distinct() {
        let (_store, people) = collection();
        people
            .insert_many(&[
                doc! { tags: ["x", "y"], n: 1 },
                doc! { tags: "z", n: 1 },
                doc! { tags: ["y"], n: 2 },
            ])
            .unwrap();
        assert_eq!(
            people.distinct("tags", &Document::new()).unwrap(),
            vec![Value::from("x"), Value::from("y"), Value::from("z")]
        );

        assert_eq!(people.delete_one(&doc! { n: 1 }).unwrap(), 1);
        assert_eq!(people.delete_many(&doc! { n: { "$gte": 1 } }).unwrap(), 2);
        assert_eq!(people.delete_many(&Document::new()).unwrap(), 0);
    }

    #[test]
    fn index_lifecycle() {
        let (_store, people) = collection();
        people.insert_many(&[doc! { a: 1 }, doc! { a: 1 }]).unwrap();

        let keys = doc! { a: 1, b: (-1) };
        assert_eq!(people.create_index(&keys, &IndexOptions::new()).unwrap(), "a_1_b_-1");
        assert_eq!(people.create_index(&keys, &IndexOptions::new()).unwrap(), "a_1_b_-1");

        let err = people
            .create_index(&doc! { a: 1 }, &IndexOptions::new().unique(true))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::DuplicateKey);

        let mut stream = people.list_indexes().unwrap();
        let mut names = Vec::new();
        while let Some(index) = stream.next_document().unwrap() {
            names.push(index.get_string("name").unwrap_or_default().to_string());
        }
        stream.close().unwrap();
        assert_eq!(names, vec!["_id_", "a_1_b_-1"]);

        assert!(people.drop_index("_id_").is_err());
        assert_eq!(people.drop_index("nope").unwrap_err().kind(), &ErrorKind::NotFound);
        people.drop_index("a_1_b_-1").unwrap();
        people.drop_indexes().unwrap();
    }

    #[test]
    fn unique_index_guards_updates() {
        let (_store, people) = collection();
        people
            .create_index(&doc! { email: 1 }, &IndexOptions::new().unique(true))
            .unwrap();
        people.insert_one(&doc! { email: "a" }).unwrap();
        people.insert_one(&doc! { email: "b" }).unwrap();
        let err = people
            .update_one(&doc! { email: "b" }, &doc! { "$set": { email: "a" } }, false)
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
    }

    #[test]
    fn closed_store_rejects_calls() {
        let (store, people) = collection();
        store.close().unwrap();
        let err = people.count(&Document::new()).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ConnectionError);
    }
}
