use crate::aggregate::Pipeline;
use crate::collection::{
    Document, FindOptions, IdentifierPolicy, IndexOptions, UpdateOptions, UpdateResult,
};
use crate::common::{require_non_blank, CursorSource, DocumentCursor, ProjectionSpec, SortSpec, Value};
use crate::errors::{ErrorKind, MongoKitError, MongoKitResult};
use crate::filter::{all, Filter};
use crate::options::CollectionSettings;
use crate::store::{FindQuery, StoreCollection};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

fn require_update(update: &Document) -> MongoKitResult<()> {
    if update.is_empty() {
        log::error!("Update document cannot be empty");
        return Err(MongoKitError::new(
            "Update document cannot be empty",
            ErrorKind::InvalidArgument,
        ));
    }
    Ok(())
}

/// A typed handle to one collection.
///
/// Filters, sorts, projections and pipelines are rendered into native
/// documents here and handed to the store; store errors reach the caller
/// unchanged. Arguments are validated before any store call.
///
/// The handle applies the collection's [IdentifierPolicy] on insert and, by
/// default, leaves `_id` out of query results.
///
/// Cloning is cheap; clones share the same store collection.
#[derive(Clone)]
pub struct CollectionHandle {
    inner: Arc<CollectionHandleInner>,
}

impl CollectionHandle {
    pub(crate) fn new(collection: StoreCollection, settings: CollectionSettings) -> Self {
        CollectionHandle {
            inner: Arc::new(CollectionHandleInner {
                policy: IdentifierPolicy::from_flag(settings.create_id),
                collection,
                settings,
            }),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.collection.name()
    }

    pub fn database_name(&self) -> &str {
        self.inner.collection.database_name()
    }

    /// `database.collection`
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database_name(), self.name())
    }

    pub fn settings(&self) -> &CollectionSettings {
        &self.inner.settings
    }

    pub fn identifier_policy(&self) -> IdentifierPolicy {
        self.inner.policy
    }

    pub fn count(&self) -> MongoKitResult<u64> {
        self.inner.count(&all())
    }

    pub fn count_matching(&self, filter: &Filter) -> MongoKitResult<u64> {
        self.inner.count(filter)
    }

    pub fn find_all(&self) -> MongoKitResult<DocumentCursor> {
        self.inner.find(&all(), &FindOptions::new())
    }

    pub fn find(&self, filter: &Filter) -> MongoKitResult<DocumentCursor> {
        self.inner.find(filter, &FindOptions::new())
    }

    pub fn find_with_options(&self, filter: &Filter, options: &FindOptions) -> MongoKitResult<DocumentCursor> {
        self.inner.find(filter, options)
    }

    /// The first match without `_id`, or `None`.
    pub fn find_one(&self, filter: &Filter) -> MongoKitResult<Option<Document>> {
        self.inner.find_one(filter)
    }

    /// Inserts `document` and returns it, carrying a generated `id` when the
    /// identifier policy assigned one.
    pub fn insert_one(&self, document: Document) -> MongoKitResult<Document> {
        self.inner.insert_one(document)
    }

    /// Inserts every document in one store call.
    pub fn insert_many(&self, documents: Vec<Document>) -> MongoKitResult<Vec<Document>> {
        self.inner.insert_many(documents)
    }

    pub fn update(&self, filter: &Filter, update: &Document, options: &UpdateOptions) -> MongoKitResult<UpdateResult> {
        self.inner.update(filter, update, options)
    }

    /// Updates the first match; `true` when exactly one document changed.
    pub fn update_one(&self, filter: &Filter, update: &Document) -> MongoKitResult<bool> {
        let result = self.inner.update(filter, update, &UpdateOptions::just_once())?;
        Ok(result.modified_count() == 1)
    }

    /// Updates every match and returns how many documents changed.
    pub fn update_many(&self, filter: &Filter, update: &Document) -> MongoKitResult<u64> {
        let result = self.inner.update(filter, update, &UpdateOptions::new(false, true))?;
        Ok(result.modified_count())
    }

    /// Updates every match, inserting a document when nothing matches.
    pub fn upsert(&self, filter: &Filter, update: &Document) -> MongoKitResult<UpdateResult> {
        self.inner.update(filter, update, &UpdateOptions::insert_if_absent())
    }

    /// Updates every match without upserting and returns the first one as
    /// modified, without `_id`.
    pub fn find_and_modify(&self, filter: &Filter, update: &Document) -> MongoKitResult<Option<Document>> {
        self.inner.find_and_modify(filter, update)
    }

    pub fn delete_one(&self, filter: &Filter) -> MongoKitResult<&Self> {
        self.inner.delete(filter, false)?;
        Ok(self)
    }

    pub fn delete_many(&self, filter: &Filter) -> MongoKitResult<&Self> {
        self.inner.delete(filter, true)?;
        Ok(self)
    }

    /// Distinct values of `field` among the documents matching `filter`, or
    /// among all documents.
    pub fn distinct(&self, field: &str, filter: Option<&Filter>) -> MongoKitResult<Vec<Value>> {
        self.inner.distinct(field, filter)
    }

    /// Creates an index with the keys and directions of `keys`.
    pub fn create_index(&self, keys: &SortSpec, options: &IndexOptions) -> MongoKitResult<&Self> {
        self.inner.create_index(keys, options)?;
        Ok(self)
    }

    pub fn drop_index(&self, name: &str) -> MongoKitResult<&Self> {
        self.inner.drop_index(name)?;
        Ok(self)
    }

    /// Drops every index but the one on `_id`.
    pub fn drop_indexes(&self) -> MongoKitResult<&Self> {
        log::debug!("Dropping indexes of {}", self.namespace());
        self.inner.collection.drop_indexes()?;
        Ok(self)
    }

    pub fn list_indexes(&self) -> MongoKitResult<DocumentCursor> {
        DocumentCursor::open(&self.inner.collection, CursorSource::ListIndexes)
    }

    pub fn aggregate(&self, pipeline: &Pipeline) -> MongoKitResult<DocumentCursor> {
        log::debug!("Aggregating {} with {}", self.namespace(), pipeline);
        DocumentCursor::open(
            &self.inner.collection,
            CursorSource::Aggregate(pipeline.to_documents()),
        )
    }

    /// Removes the collection with its documents and indexes.
    pub fn drop(&self) -> MongoKitResult<()> {
        log::info!("Dropping collection {}", self.namespace());
        self.inner.collection.drop_collection()
    }
}

impl Debug for CollectionHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionHandle")
            .field("namespace", &self.namespace())
            .field("settings", &self.inner.settings)
            .finish()
    }
}

struct CollectionHandleInner {
    collection: StoreCollection,
    settings: CollectionSettings,
    policy: IdentifierPolicy,
}

impl CollectionHandleInner {
    fn count(&self, filter: &Filter) -> MongoKitResult<u64> {
        self.collection.count(&filter.to_document())
    }

    fn find(&self, filter: &Filter, options: &FindOptions) -> MongoKitResult<DocumentCursor> {
        let mut query = FindQuery::new(filter.to_document());
        query.projection = options.effective_projection();
        query.sort = options.sort_spec().cloned();
        query.skip = options.skip_count();
        query.limit = options.limit_count();

        log::debug!("Finding {} in {}", query.filter, self.collection.name());
        DocumentCursor::open(&self.collection, CursorSource::Find(query))
    }

    fn find_one(&self, filter: &Filter) -> MongoKitResult<Option<Document>> {
        let mut cursor = self.find(filter, &FindOptions::new().limit(1))?;
        let found = if cursor.has_next()? {
            Some(cursor.next_document()?)
        } else {
            None
        };
        cursor.close()?;
        Ok(found)
    }

    fn insert_one(&self, mut document: Document) -> MongoKitResult<Document> {
        if self.policy.apply(&mut document) {
            log::debug!("Assigned identifier to document inserted into {}", self.collection.name());
        }
        self.collection.insert_one(&document)?;
        Ok(document)
    }

    fn insert_many(&self, mut documents: Vec<Document>) -> MongoKitResult<Vec<Document>> {
        match documents.len() {
            0 => {
                log::warn!("Ignoring empty batch insert into {}", self.collection.name());
                Ok(documents)
            }
            1 => {
                let document = documents.remove(0);
                Ok(vec![self.insert_one(document)?])
            }
            _ => {
                for document in documents.iter_mut() {
                    self.policy.apply(document);
                }
                let ids = self.collection.insert_many(&documents)?;
                log::debug!("Inserted {} documents into {}", ids.len(), self.collection.name());
                Ok(documents)
            }
        }
    }

    fn update(&self, filter: &Filter, update: &Document, options: &UpdateOptions) -> MongoKitResult<UpdateResult> {
        require_update(update)?;
        let filter = filter.to_document();
        if options.is_multi() {
            self.collection.update_many(&filter, update, options.is_upsert())
        } else {
            self.collection.update_one(&filter, update, options.is_upsert())
        }
    }

    fn find_and_modify(&self, filter: &Filter, update: &Document) -> MongoKitResult<Option<Document>> {
        require_update(update)?;
        self.collection.find_and_update(
            &filter.to_document(),
            update,
            true,
            Some(&ProjectionSpec::excluding_identifier()),
        )
    }

    fn delete(&self, filter: &Filter, multi: bool) -> MongoKitResult<u64> {
        let filter = filter.to_document();
        let deleted = if multi {
            self.collection.delete_many(&filter)?
        } else {
            self.collection.delete_one(&filter)?
        };
        log::debug!("Deleted {} documents from {}", deleted, self.collection.name());
        Ok(deleted)
    }

    fn distinct(&self, field: &str, filter: Option<&Filter>) -> MongoKitResult<Vec<Value>> {
        let field = require_non_blank(field, "distinct field name")?;
        let filter = filter.map(Filter::to_document).unwrap_or_default();
        self.collection.distinct(field, &filter)
    }

    fn create_index(&self, keys: &SortSpec, options: &IndexOptions) -> MongoKitResult<String> {
        if keys.is_empty() {
            log::error!("Index keys cannot be empty");
            return Err(MongoKitError::new(
                "Index keys cannot be empty",
                ErrorKind::InvalidArgument,
            ));
        }
        if let Some(name) = options.index_name() {
            require_non_blank(name, "index name")?;
        }

        let name = self.collection.create_index(&keys.to_document(), options)?;
        log::debug!("Created index {} on {}", name, self.collection.name());
        Ok(name)
    }

    fn drop_index(&self, name: &str) -> MongoKitResult<()> {
        let name = require_non_blank(name, "index name")?;
        self.collection.drop_index(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Stage;
    use crate::common::{Projection, SortOrder, ID_FIELD};
    use crate::doc;
    use crate::filter::{and, field};
    use crate::store::memory::InMemoryStore;
    use crate::store::DocumentStoreProvider;

    fn open_handle(create_id: bool) -> (InMemoryStore, CollectionHandle) {
        let store = InMemoryStore::new();
        let settings = CollectionSettings {
            create_id,
            ..CollectionSettings::default()
        };
        let collection = store.collection("db", "people", &settings).unwrap();
        (store, CollectionHandle::new(collection, settings))
    }

    fn people(handle: &CollectionHandle) {
        handle
            .insert_many(vec![
                doc! { name: "ann", age: 31, city: "NYC" },
                doc! { name: "bob", age: 25, city: "LA" },
                doc! { name: "cid", age: 40, city: "NYC" },
            ])
            .unwrap();
    }

    fn names(cursor: DocumentCursor) -> Vec<String> {
        cursor
            .map(|d| d.unwrap().get_string("name").unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn names_and_settings() {
        let (_store, handle) = open_handle(true);
        assert_eq!(handle.name(), "people");
        assert_eq!(handle.database_name(), "db");
        assert_eq!(handle.namespace(), "db.people");
        assert_eq!(handle.identifier_policy(), IdentifierPolicy::Create);
        assert!(handle.settings().create_id);
    }

    #[test]
    fn insert_one_assigns_identifier() {
        let (_store, handle) = open_handle(true);
        let inserted = handle.insert_one(doc! { name: "ann" }).unwrap();
        let id = inserted.get_string(ID_FIELD).unwrap();
        assert_eq!(id.len(), 24);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(!inserted.contains_key("_id"));

        let stored = handle.find_one(&field("name").eq("ann").unwrap()).unwrap().unwrap();
        assert_eq!(stored, inserted);
    }

    #[test]
    fn insert_one_preserves_document() {
        let (_store, handle) = open_handle(false);
        let document = doc! { name: "ann" };
        assert_eq!(handle.insert_one(document.clone()).unwrap(), document);

        let (_store, handle) = open_handle(true);
        let document = doc! { name: "ann", id: "mine" };
        assert_eq!(handle.insert_one(document.clone()).unwrap(), document);
    }

    #[test]
    fn insert_many_edge_cases() {
        let (store, handle) = open_handle(true);
        assert!(handle.insert_many(Vec::new()).unwrap().is_empty());
        assert_eq!(handle.count().unwrap(), 0);
        assert!(store.list_collection_names("db").unwrap().is_empty());

        let inserted = handle.insert_many(vec![doc! { n: 1 }]).unwrap();
        assert!(inserted[0].contains_key(ID_FIELD));

        let inserted = handle.insert_many(vec![doc! { n: 2 }, doc! { n: 3 }]).unwrap();
        assert!(inserted.iter().all(|d| d.contains_key(ID_FIELD)));
        assert_eq!(handle.count().unwrap(), 3);
    }

    #[test]
    fn find_excludes_identifier_by_default() {
        let (_store, handle) = open_handle(false);
        people(&handle);

        let first = handle.find_all().unwrap().next().unwrap().unwrap();
        assert!(!first.contains_key("_id"));

        let options = FindOptions::new().include_id(true);
        let first = handle.find_with_options(&all(), &options).unwrap().next().unwrap().unwrap();
        assert!(first.contains_key("_id"));

        let projection = ProjectionSpec::with_fields(&["_id", "name"], Projection::Include);
        let options = FindOptions::new().projection(&projection);
        let first = handle.find_with_options(&all(), &options).unwrap().next().unwrap().unwrap();
        assert_eq!(first.fields(), vec!["_id", "name"]);
    }

    #[test]
    fn find_with_sort_skip_limit() {
        let (_store, handle) = open_handle(false);
        people(&handle);

        let options = FindOptions::new()
            .sort_by("age", SortOrder::Descending)
            .skip(1)
            .limit(1);
        assert_eq!(names(handle.find_with_options(&all(), &options).unwrap()), vec!["ann"]);

        let filter = and(vec![field("city").eq("NYC").unwrap(), field("age").gt(35).unwrap()]);
        assert_eq!(names(handle.find(&filter).unwrap()), vec!["cid"]);
        assert_eq!(handle.count_matching(&filter).unwrap(), 1);
        assert_eq!(handle.find_one(&field("age").gt(99).unwrap()).unwrap(), None);
    }

    #[test]
    fn updates() {
        let (_store, handle) = open_handle(false);
        people(&handle);

        let nyc = field("city").eq("NYC").unwrap();
        assert!(handle.update_one(&nyc, &doc! { "$inc": { age: 1 } }).unwrap());
        assert_eq!(handle.update_many(&nyc, &doc! { "$set": { state: "NY" } }).unwrap(), 2);

        let result = handle
            .upsert(&field("name").eq("dan").unwrap(), &doc! { "$set": { age: 50 } })
            .unwrap();
        assert!(result.upserted_id().is_some());
        assert_eq!(handle.count().unwrap(), 4);

        let modified = handle
            .find_and_modify(&field("name").eq("bob").unwrap(), &doc! { "$set": { city: "SF" } })
            .unwrap();
        assert_eq!(modified, Some(doc! { name: "bob", age: 25, city: "SF" }));

        let first = handle
            .find_and_modify(&nyc, &doc! { "$set": { flag: true } })
            .unwrap()
            .unwrap();
        assert_eq!(first.get_string("name"), Some("ann"));
        assert_eq!(handle.count_matching(&field("flag").eq(true).unwrap()).unwrap(), 2);
        assert_eq!(
            handle.find_and_modify(&field("name").eq("zed").unwrap(), &doc! { "$set": { a: 1 } }).unwrap(),
            None
        );
        assert_eq!(handle.count().unwrap(), 4);

        let err = handle.update(&nyc, &Document::new(), &UpdateOptions::default()).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
    }

    #[test]
    fn deletes_chain() {
        let (_store, handle) = open_handle(false);
        people(&handle);
        let count = handle
            .delete_one(&field("city").eq("NYC").unwrap())
            .unwrap()
            .delete_many(&field("age").lt(30).unwrap())
            .unwrap()
            .count()
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn distinct_values() {
        let (_store, handle) = open_handle(false);
        people(&handle);
        assert_eq!(
            handle.distinct("city", None).unwrap(),
            vec![Value::from("NYC"), Value::from("LA")]
        );
        let filter = field("age").gt(30).unwrap();
        assert_eq!(handle.distinct("city", Some(&filter)).unwrap(), vec![Value::from("NYC")]);
        assert_eq!(
            handle.distinct(" ", None).unwrap_err().kind(),
            &ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn index_management() {
        let (_store, handle) = open_handle(false);
        handle
            .create_index(&SortSpec::ascending_by(&["name"]), &IndexOptions::new().unique(true))
            .unwrap()
            .create_index(&SortSpec::descending_by(&["age"]), &IndexOptions::new().name("by_age"))
            .unwrap();

        let names: Vec<String> = handle
            .list_indexes()
            .unwrap()
            .map(|d| d.unwrap().get_string("name").unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["_id_", "name_1", "by_age"]);

        handle.drop_index("by_age").unwrap().drop_indexes().unwrap();
        assert_eq!(handle.list_indexes().unwrap().count(), 1);

        let err = handle.create_index(&SortSpec::new(), &IndexOptions::new()).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
        let err = handle
            .create_index(&SortSpec::ascending_by(&["a"]), &IndexOptions::new().name(" "))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
        assert_eq!(handle.drop_index("").unwrap_err().kind(), &ErrorKind::InvalidArgument);
    }

    #[test]
    fn aggregate_pipeline() {
        let (_store, handle) = open_handle(false);
        people(&handle);
        let pipeline = crate::aggregate::Pipeline::new()
            .then(Stage::matching(doc! { city: "NYC" }))
            .then(Stage::group(doc! { "_id": "$city", total: { "$sum": "$age" } }));
        let results: Vec<Document> = handle.aggregate(&pipeline).unwrap().map(|d| d.unwrap()).collect();
        assert_eq!(results, vec![doc! { "_id": "NYC", total: 71 }]);
    }

    #[test]
    fn drop_removes_collection() {
        let (store, handle) = open_handle(false);
        people(&handle);
        handle.drop().unwrap();
        assert!(store.list_collection_names("db").unwrap().is_empty());
        assert_eq!(handle.count().unwrap(), 0);
    }
}
