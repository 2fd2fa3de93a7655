use crate::errors::{DocketError, DocketResult, ErrorKind};
use crate::store::Bucket;

/// The two key spaces of a bucket.
///
/// `Records` holds whole record values keyed by record key. `Fields` holds
/// per-record sub-namespaces whose keys are the record key followed by a
/// field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySpace {
    Records,
    Fields,
}

/// Visitor called for each key/value pair of a key space, in ascending key
/// order. Returning an error stops the iteration.
pub type EntryVisitor<'a> = dyn FnMut(&[u8], &[u8]) -> DocketResult<()> + 'a;

/// Low-level transaction contract every substrate implements.
///
/// A writable transaction is the only writer in the system while it lives.
/// Reads observe the transaction's own uncommitted writes. `commit` makes all
/// writes visible atomically and durably; `rollback` discards them.
pub trait TransactionProvider: Send {
    fn is_writable(&self) -> bool;

    /// Names of all buckets visible to this transaction, in ascending order.
    fn bucket_names(&self) -> DocketResult<Vec<String>>;

    fn has_bucket(&self, name: &str) -> DocketResult<bool>;

    /// Creates `name` if it does not exist. Only valid on writable transactions.
    fn create_bucket_if_not_exists(&mut self, name: &str) -> DocketResult<()>;

    /// Returns the next value of the bucket's sequence, starting at 1.
    /// Values are never reused, even across restarts.
    fn next_sequence(&mut self, bucket: &str) -> DocketResult<u64>;

    fn put(&mut self, bucket: &str, space: KeySpace, key: &[u8], value: &[u8]) -> DocketResult<()>;

    fn get(&self, bucket: &str, space: KeySpace, key: &[u8]) -> DocketResult<Option<Vec<u8>>>;

    fn for_each(&self, bucket: &str, space: KeySpace, visit: &mut EntryVisitor) -> DocketResult<()>;

    fn commit(self: Box<Self>) -> DocketResult<()>;

    fn rollback(self: Box<Self>) -> DocketResult<()>;
}

/// A substrate transaction scoped to one document operation.
///
/// `commit` and `rollback` consume the transaction. Dropping a transaction
/// that was neither committed nor rolled back rolls it back, so a transaction
/// is released on every exit path, errors included.
pub struct Transaction {
    inner: Option<Box<dyn TransactionProvider>>,
}

impl Transaction {
    pub fn new<T: TransactionProvider + 'static>(inner: T) -> Self {
        Transaction {
            inner: Some(Box::new(inner)),
        }
    }

    pub fn is_writable(&self) -> bool {
        self.inner
            .as_ref()
            .map(|provider| provider.is_writable())
            .unwrap_or(false)
    }

    /// Returns a handle to the bucket `name`, or `None` if it does not exist.
    pub fn bucket(&mut self, name: &str) -> DocketResult<Option<Bucket<'_>>> {
        if !self.provider()?.has_bucket(name)? {
            return Ok(None);
        }
        Ok(Some(Bucket::new(self, name)))
    }

    /// Returns a handle to the bucket `name`, creating it first if needed.
    pub fn create_bucket_if_not_exists(&mut self, name: &str) -> DocketResult<Bucket<'_>> {
        if !self.is_writable() {
            log::error!("Cannot create bucket {} in a read-only transaction", name);
            return Err(DocketError::new(
                &format!("cannot create bucket ({}) in a read-only transaction", name),
                ErrorKind::TransactionError,
            ));
        }
        self.provider_mut()?.create_bucket_if_not_exists(name)?;
        Ok(Bucket::new(self, name))
    }

    pub fn has_bucket(&self, name: &str) -> DocketResult<bool> {
        self.provider()?.has_bucket(name)
    }

    pub fn bucket_names(&self) -> DocketResult<Vec<String>> {
        self.provider()?.bucket_names()
    }

    pub fn commit(mut self) -> DocketResult<()> {
        match self.inner.take() {
            Some(provider) => provider.commit(),
            None => Err(finished()),
        }
    }

    pub fn rollback(mut self) -> DocketResult<()> {
        match self.inner.take() {
            Some(provider) => provider.rollback(),
            None => Err(finished()),
        }
    }

    pub(crate) fn provider(&self) -> DocketResult<&dyn TransactionProvider> {
        match self.inner.as_deref() {
            Some(provider) => Ok(provider),
            None => Err(finished()),
        }
    }

    pub(crate) fn provider_mut(&mut self) -> DocketResult<&mut dyn TransactionProvider> {
        match self.inner.as_deref_mut() {
            Some(provider) => Ok(provider),
            None => Err(finished()),
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let Some(provider) = self.inner.take() {
            if let Err(err) = provider.rollback() {
                log::warn!("Failed to roll back abandoned transaction: {}", err);
            }
        }
    }
}

fn finished() -> DocketError {
    log::error!("Transaction has already been committed or rolled back");
    DocketError::new(
        "transaction has already been committed or rolled back",
        ErrorKind::TransactionError,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct Outcome {
        committed: bool,
        rolled_back: bool,
    }

    struct RecordingTransaction {
        writable: bool,
        buckets: Vec<String>,
        outcome: Arc<Mutex<Outcome>>,
    }

    impl TransactionProvider for RecordingTransaction {
        fn is_writable(&self) -> bool {
            self.writable
        }

        fn bucket_names(&self) -> DocketResult<Vec<String>> {
            Ok(self.buckets.clone())
        }

        fn has_bucket(&self, name: &str) -> DocketResult<bool> {
            Ok(self.buckets.iter().any(|b| b == name))
        }

        fn create_bucket_if_not_exists(&mut self, name: &str) -> DocketResult<()> {
            if !self.buckets.iter().any(|b| b == name) {
                self.buckets.push(name.to_string());
            }
            Ok(())
        }

        fn next_sequence(&mut self, _bucket: &str) -> DocketResult<u64> {
            Ok(1)
        }

        fn put(&mut self, _: &str, _: KeySpace, _: &[u8], _: &[u8]) -> DocketResult<()> {
            Ok(())
        }

        fn get(&self, _: &str, _: KeySpace, _: &[u8]) -> DocketResult<Option<Vec<u8>>> {
            Ok(None)
        }

        fn for_each(&self, _: &str, _: KeySpace, _: &mut EntryVisitor) -> DocketResult<()> {
            Ok(())
        }

        fn commit(self: Box<Self>) -> DocketResult<()> {
            self.outcome.lock().committed = true;
            Ok(())
        }

        fn rollback(self: Box<Self>) -> DocketResult<()> {
            self.outcome.lock().rolled_back = true;
            Ok(())
        }
    }

    fn transaction(writable: bool) -> (Transaction, Arc<Mutex<Outcome>>) {
        let outcome = Arc::new(Mutex::new(Outcome::default()));
        let tx = Transaction::new(RecordingTransaction {
            writable,
            buckets: vec!["users".to_string()],
            outcome: outcome.clone(),
        });
        (tx, outcome)
    }

    #[test]
    fn drop_rolls_back() {
        let (tx, outcome) = transaction(true);
        drop(tx);
        assert!(outcome.lock().rolled_back);
        assert!(!outcome.lock().committed);
    }

    #[test]
    fn commit_does_not_roll_back() {
        let (tx, outcome) = transaction(true);
        tx.commit().unwrap();
        assert!(outcome.lock().committed);
        assert!(!outcome.lock().rolled_back);
    }

    #[test]
    fn bucket_lookup() {
        let (mut tx, _) = transaction(false);
        assert!(tx.bucket("users").unwrap().is_some());
        assert!(tx.bucket("orders").unwrap().is_none());
        assert_eq!(tx.bucket_names().unwrap(), vec!["users".to_string()]);
    }

    #[test]
    fn read_only_cannot_create_bucket() {
        let (mut tx, _) = transaction(false);
        let err = tx.create_bucket_if_not_exists("orders").err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::TransactionError);
    }

    #[test]
    fn writable_creates_bucket() {
        let (mut tx, _) = transaction(true);
        let bucket = tx.create_bucket_if_not_exists("orders").unwrap();
        assert_eq!(bucket.name(), "orders");
        assert!(tx.has_bucket("orders").unwrap());
    }
}
