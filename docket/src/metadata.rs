use crate::codec::CodecKind;
use crate::common::{FORMAT_VERSION, META_BUCKET_NAME, META_KEY};
use crate::docket_config::DocketConfig;
use crate::errors::{DocketError, DocketResult, ErrorKind};
use crate::store::DocketStore;
use serde::{Deserialize, Serialize};

/// Database-level metadata kept in the reserved metadata bucket.
///
/// Written the first time a database is opened and checked on every later
/// open, so a database is never read with a codec other than the one that
/// wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocketMetadata {
    pub codec: CodecKind,
    pub format_version: u32,
    pub store_version: String,
    pub docket_version: String,
}

impl DocketMetadata {
    pub fn new(codec: CodecKind, store_version: &str) -> DocketMetadata {
        DocketMetadata {
            codec,
            format_version: FORMAT_VERSION,
            store_version: store_version.to_string(),
            docket_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> DocketResult<DocketMetadata> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_bytes(&self) -> DocketResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|err| {
            log::error!("Failed to serialize database metadata: {}", err);
            DocketError::new(
                &format!("failed to serialize database metadata: {}", err),
                ErrorKind::EncodingError,
            )
        })
    }

    /// Checks that a database with this metadata can be opened with `config`.
    pub fn check_compatible(&self, config: &DocketConfig) -> DocketResult<()> {
        if self.codec != config.codec() {
            log::error!(
                "Database {} was written with codec {}, not {}",
                config.file_name(),
                self.codec,
                config.codec()
            );
            return Err(DocketError::new(
                &format!(
                    "database {} uses codec {}, cannot open it with {}",
                    config.file_name(),
                    self.codec,
                    config.codec()
                ),
                ErrorKind::ValidationError,
            ));
        }
        if self.format_version > FORMAT_VERSION {
            log::error!(
                "Database {} has format version {}, newer than {}",
                config.file_name(),
                self.format_version,
                FORMAT_VERSION
            );
            return Err(DocketError::new(
                &format!(
                    "database format version {} is not supported",
                    self.format_version
                ),
                ErrorKind::ValidationError,
            ));
        }
        Ok(())
    }
}

/// Reads the metadata of the database, writing it first if the database is
/// new. Fails with a validation error when `config` does not match.
pub(crate) fn load_or_init(store: &DocketStore, config: &DocketConfig) -> DocketResult<DocketMetadata> {
    let mut tx = store.begin(true)?;
    let mut bucket = tx.create_bucket_if_not_exists(META_BUCKET_NAME)?;

    if let Some(bytes) = bucket.get(META_KEY.as_bytes())? {
        let metadata = DocketMetadata::from_bytes(&bytes)?;
        metadata.check_compatible(config)?;
        tx.rollback()?;
        return Ok(metadata);
    }

    let metadata = DocketMetadata::new(config.codec(), &store.store_version()?);
    bucket.put(META_KEY.as_bytes(), &metadata.to_bytes()?)?;
    tx.commit()?;
    log::debug!("Initialized metadata of {}", config.file_name());
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    fn open_store(config: &DocketConfig) -> DocketStore {
        let store = DocketStore::new(InMemoryStore::new());
        store.open_or_create(config).unwrap();
        store
    }

    #[test]
    fn initializes_then_reloads() {
        let config = DocketConfig::new("meta", "db", CodecKind::TypedField).unwrap();
        let store = open_store(&config);

        let first = load_or_init(&store, &config).unwrap();
        assert_eq!(first.codec, CodecKind::TypedField);
        assert_eq!(first.format_version, FORMAT_VERSION);
        assert!(first.store_version.starts_with("InMemory/"));

        let second = load_or_init(&store, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_codec_mismatch() {
        let config = DocketConfig::new("meta", "db", CodecKind::TypedField).unwrap();
        let store = open_store(&config);
        load_or_init(&store, &config).unwrap();

        let other = DocketConfig::new("meta", "db", CodecKind::WholeRecord).unwrap();
        let err = load_or_init(&store, &other).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn rejects_newer_format() {
        let config = DocketConfig::new("meta", "db", CodecKind::WholeRecord).unwrap();
        let mut metadata = DocketMetadata::new(CodecKind::WholeRecord, "test");
        metadata.format_version = FORMAT_VERSION + 1;
        assert!(metadata.check_compatible(&config).is_err());
    }

    #[test]
    fn bytes_round_trip() {
        let metadata = DocketMetadata::new(CodecKind::WholeRecord, "InMemory/0.1.0");
        let bytes = metadata.to_bytes().unwrap();
        assert_eq!(DocketMetadata::from_bytes(&bytes).unwrap(), metadata);
        let err = DocketMetadata::from_bytes(b"{}").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::DecodingError);
    }
}
