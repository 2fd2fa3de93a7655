use docket::codec::CodecKind;
use docket::collection::Record;
use docket::docket::Docket;
use docket::errors::DocketResult;
use docket::record;
use std::backtrace::Backtrace;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use std::{env, fs, thread};

pub const CODECS: [CodecKind; 2] = [CodecKind::WholeRecord, CodecKind::TypedField];

/// Runs a test between `before` and `after`, reporting failures with their
/// backtrace. `after` runs even when the test fails.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: FnOnce(TestContext) -> DocketResult<()> + std::panic::UnwindSafe,
    B: FnOnce() -> DocketResult<TestContext> + std::panic::UnwindSafe,
    A: FnOnce(TestContext) -> DocketResult<()> + std::panic::UnwindSafe,
{
    let start_time = Instant::now();

    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        let ctx = match before() {
            Ok(ctx) => ctx,
            Err(e) => return Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        };

        let test_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            test(ctx.clone())
        }));

        let after_result = after(ctx);
        match test_result {
            Ok(Ok(_)) => match after_result {
                Ok(_) => Ok(()),
                Err(e) => Err((format!("After run failed: {:?}", e), backtrace.to_string())),
            },
            Ok(Err(e)) => Err((format!("Test failed: {:?}", e), backtrace.to_string())),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    });

    let elapsed = start_time.elapsed();
    match result {
        Ok(Ok(_)) => {}
        Ok(Err((e, bt))) => {
            eprintln!("\n==================== TEST FAILED ====================");
            eprintln!("Failed after {:?}", elapsed);
            eprintln!("Error: {}", e);
            if !bt.is_empty() && !bt.contains("disabled") {
                eprintln!("\nBacktrace:\n{}", bt);
            }
            eprintln!("=====================================================\n");
            panic!("Test failed: {}", e);
        }
        Err(panic_err) => {
            let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", panic_err.type_id())
            };
            panic!("Test panicked after {:?}: {}", elapsed, err_msg);
        }
    }
}

/// Runs `test` once per codec, each time on a fresh database.
pub fn run_with_each_codec<T>(test: T)
where
    T: Fn(TestContext) -> DocketResult<()> + std::panic::RefUnwindSafe,
{
    for codec in CODECS {
        run_test(|| create_test_context(codec), |ctx| test(ctx), cleanup);
    }
}

#[derive(Clone)]
pub struct TestContext {
    path: PathBuf,
    codec: CodecKind,
    db: Docket,
}

impl TestContext {
    pub fn new(path: PathBuf, codec: CodecKind, db: Docket) -> Self {
        Self { path, codec, db }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn codec(&self) -> CodecKind {
        self.codec
    }

    pub fn db(&self) -> Docket {
        self.db.clone()
    }
}

pub fn random_path() -> PathBuf {
    let id = uuid::Uuid::new_v4();
    env::temp_dir().join("docket-int-test").join(id.to_string())
}

/// Opens the database `test.db` under `path`.
#[cfg(feature = "fjall")]
pub fn open_at(path: &Path, codec: CodecKind) -> DocketResult<Docket> {
    use docket_fjall_adapter::FjallModule;

    // one flush and one compaction worker per database
    let storage_module = FjallModule::with_config()
        .db_dir(path)
        .low_memory_preset()
        .build();

    Docket::builder()
        .name("test")
        .extension("db")
        .codec(codec)
        .load_module(storage_module)
        .open_or_create()
}

#[cfg(feature = "fjall")]
pub fn create_test_context(codec: CodecKind) -> DocketResult<TestContext> {
    let path = random_path();
    if path.exists() {
        remove_dir(&path);
    }

    match open_at(&path, codec) {
        Ok(db) => Ok(TestContext::new(path, codec, db)),
        Err(e) => {
            remove_dir(&path);
            Err(e)
        }
    }
}

#[cfg(all(feature = "memory", not(feature = "fjall")))]
pub fn create_test_context(codec: CodecKind) -> DocketResult<TestContext> {
    let path = random_path();
    let db = Docket::builder()
        .name("test")
        .extension("db")
        .codec(codec)
        .open_or_create()?;
    Ok(TestContext::new(path, codec, db))
}

pub fn create_whole_record_context() -> DocketResult<TestContext> {
    create_test_context(CodecKind::WholeRecord)
}

pub fn create_typed_field_context() -> DocketResult<TestContext> {
    create_test_context(CodecKind::TypedField)
}

pub fn cleanup(ctx: TestContext) -> DocketResult<()> {
    let result = ctx.db().close();
    remove_dir(ctx.path());
    result
}

fn remove_dir(path: &Path) {
    let mut delay_ms = 50u64;
    for retry in 0..5 {
        if !path.exists() {
            return;
        }
        match fs::remove_dir_all(path) {
            Ok(_) => return,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                if retry == 4 {
                    eprintln!(
                        "Warning: Failed to remove test directory {}: {:?}",
                        path.display(),
                        e
                    );
                    return;
                }
                thread::sleep(Duration::from_millis(delay_ms));
                delay_ms = (delay_ms * 2).min(500);
            }
        }
    }
}

/// The three users every scenario starts from.
pub fn create_test_records() -> Vec<Record> {
    vec![
        record! { "name": "Foo", "age": 10 },
        record! { "name": "Bar", "age": 88.3 },
        record! { "name": "Baz", "age": 10 },
    ]
}

pub fn insert_test_records(db: &Docket, collection: &str) -> DocketResult<Vec<u64>> {
    create_test_records()
        .into_iter()
        .map(|record| db.insert(collection, record))
        .collect()
}
