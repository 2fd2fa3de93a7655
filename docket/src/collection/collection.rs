use crate::collection::{CollectionOperations, Record};
use crate::errors::DocketResult;
use crate::filter::Filter;

/// Handle to a named collection of a database.
///
/// Handles are cheap to clone and hold no state of their own; the
/// collection itself is created on the first insert (or by
/// [crate::docket::Docket::create_collection]).
///
/// # Usage
/// ```text
/// let users = db.collection("users")?;
/// let id = users.insert(record! { "name": "Foo", "age": 10 })?;
/// let admins = users.find(&Filter::new().eq("isAdmin", true))?;
/// users.update(&all(), &record! { "age": 11 })?;
/// ```
#[derive(Clone)]
pub struct DocketCollection {
    name: String,
    operations: CollectionOperations,
}

impl DocketCollection {
    pub(crate) fn new(name: &str, operations: CollectionOperations) -> Self {
        DocketCollection {
            name: name.to_string(),
            operations,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts `record` and returns its assigned id.
    pub fn insert(&self, record: Record) -> DocketResult<u64> {
        self.operations.insert(&self.name, record)
    }

    /// Returns the records matching `filter`.
    pub fn find(&self, filter: &Filter) -> DocketResult<Vec<Record>> {
        self.operations.find(&self.name, filter)
    }

    /// Patches the records matching `filter` and returns them.
    pub fn update(&self, filter: &Filter, patch: &Record) -> DocketResult<Vec<Record>> {
        self.operations.update(&self.name, filter, patch)
    }

    /// Returns `true` once the collection exists in the store.
    pub fn exists(&self) -> DocketResult<bool> {
        self.operations.has_collection(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecKind, RecordCodec};
    use crate::docket_config::DocketConfig;
    use crate::filter::all;
    use crate::record;
    use crate::store::memory::InMemoryStore;
    use crate::store::DocketStore;

    fn collection(name: &str) -> DocketCollection {
        let store = DocketStore::new(InMemoryStore::new());
        let config = DocketConfig::new("coll", "db", CodecKind::TypedField).unwrap();
        store.open_or_create(&config).unwrap();
        let operations = CollectionOperations::new(store, RecordCodec::for_kind(config.codec()));
        DocketCollection::new(name, operations)
    }

    #[test]
    fn handle_routes_to_its_collection() {
        let users = collection("users");
        assert_eq!(users.name(), "users");
        assert!(!users.exists().unwrap());

        let id = users.insert(record! { "name": "Foo" }).unwrap();
        assert_eq!(id, 1);
        assert!(users.exists().unwrap());

        let updated = users.update(&all(), &record! { "name": "Bar" }).unwrap();
        assert_eq!(updated, vec![record! { "id": 1, "name": "Bar" }]);
        assert_eq!(users.find(&all()).unwrap(), updated);
    }

    #[test]
    fn clones_share_the_store() {
        let users = collection("users");
        let other = users.clone();
        users.insert(record! { "name": "Foo" }).unwrap();
        assert_eq!(other.find(&all()).unwrap().len(), 1);
    }
}
