//! Fjall substrate for Docket.
//!
//! Load [FjallModule] into a database builder to keep its collections in a
//! fjall keyspace on disk instead of memory.

mod config;
mod error;
mod module;
mod store;
mod transaction;

pub use config::*;
pub use error::FjallStoreError;
pub use module::*;
pub use store::FjallStore;

#[cfg(test)]
mod tests {
    use docket::codec::CodecKind;
    use docket::docket_config::DocketConfig;
    use docket::store::DocketStore;
    use std::fs;
    use std::mem;
    use std::path::PathBuf;
    use std::thread;
    use std::time::Duration;

    // Setup only one time throughout the project.
    // It will take effect during test, project wide
    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    #[derive(Clone)]
    pub struct Context {
        path: PathBuf,
        store: Option<DocketStore>,
    }

    impl Context {
        pub fn new(path: PathBuf, store: Option<DocketStore>) -> Self {
            Context { path, store }
        }

        pub fn path(&self) -> PathBuf {
            self.path.clone()
        }

        pub fn store(&self) -> DocketStore {
            self.store.clone().expect("DocketStore not available")
        }
    }

    impl Drop for Context {
        fn drop(&mut self) {
            if let Some(store) = mem::replace(&mut self.store, None) {
                if let Err(e) = store.close() {
                    log::error!("Failed to close store during cleanup: {}", e);
                }
            }
        }
    }

    pub fn random_dir() -> PathBuf {
        let id = uuid::Uuid::new_v4();
        std::env::temp_dir().join("docket-test-data").join(id.to_string())
    }

    pub fn create_test_config() -> DocketConfig {
        DocketConfig::new("test", "db", CodecKind::WholeRecord).unwrap()
    }

    fn cleanup(path: PathBuf) {
        let mut retry = 0;
        while path.exists() && fs::remove_dir_all(&path).is_err() && retry < 2 {
            thread::sleep(Duration::from_millis(100));
            retry += 1;
        }
    }

    pub fn run_test<T, B, A>(before: B, test: T, after: A)
    where
        T: FnOnce(Context) + std::panic::UnwindSafe,
        B: FnOnce() -> Context + std::panic::UnwindSafe,
        A: FnOnce(Context) + std::panic::UnwindSafe,
    {
        let mut path = None;
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let ctx = before();
            path = Some(ctx.path());
            test(ctx.clone());
            after(ctx.clone());
            drop(ctx);
        }));

        if let Some(path) = path {
            cleanup(path);
        }

        if let Err(e) = result {
            let panic_msg = if let Some(msg) = e.downcast_ref::<String>() {
                msg.clone()
            } else if let Some(msg) = e.downcast_ref::<&str>() {
                msg.to_string()
            } else {
                format!("{:?}", e)
            };
            panic!("Test execution failed with panic: {}", panic_msg);
        }
    }

    #[test]
    fn test_context_without_store() {
        let ctx = Context::new(random_dir(), None);
        assert!(!ctx.path().exists());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| ctx.store()));
        assert!(result.is_err());
    }
}
