use crate::codec::CodecKind;
use crate::docket::Docket;
use crate::docket_config::DocketConfig;
use crate::errors::{DocketError, DocketResult, ErrorKind};
use crate::store::memory::InMemoryModule;
use crate::store::StoreModule;

/// Fluent builder for opening a [Docket] database.
///
/// Errors raised by any builder step are captured and reported by
/// [DocketBuilder::open_or_create], so calls can be chained freely.
///
/// Name, extension and codec have no defaults and must be supplied, either
/// one by one or together through [DocketBuilder::config]. Without a loaded
/// store module the database runs on the in-memory substrate.
///
/// # Examples
///
/// ```rust,ignore
/// let db = Docket::builder()
///     .name("webbr")
///     .extension("db")
///     .codec(CodecKind::WholeRecord)
///     .load_module(FjallModule::with_config().db_dir("/var/lib/webbr").build())
///     .open_or_create()?;
/// ```
#[derive(Default)]
pub struct DocketBuilder {
    error: Option<DocketError>,
    name: Option<String>,
    extension: Option<String>,
    codec: Option<CodecKind>,
    config: Option<DocketConfig>,
    store_module: Option<Box<dyn StoreModule>>,
}

impl DocketBuilder {
    pub fn new() -> Self {
        DocketBuilder::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = Some(extension.to_string());
        self
    }

    pub fn codec(mut self, codec: CodecKind) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Uses a complete configuration instead of the individual parts.
    /// Supplying both is an [ErrorKind::InvalidOperation] error.
    pub fn config(mut self, config: DocketConfig) -> Self {
        if self.error.is_none() {
            if let Err(e) = config.validate() {
                self.error = Some(e);
            }
        }
        self.config = Some(config);
        self
    }

    /// Loads the store module providing the substrate. Only one module can
    /// be loaded.
    pub fn load_module<T: StoreModule + 'static>(mut self, module: T) -> Self {
        if self.error.is_none() && self.store_module.is_some() {
            log::error!("A store module is already loaded");
            self.error = Some(DocketError::new(
                "a store module is already loaded",
                ErrorKind::InvalidOperation,
            ));
        }
        if self.store_module.is_none() {
            self.store_module = Some(Box::new(module));
        }
        self
    }

    /// Opens the database, creating it if it does not exist.
    pub fn open_or_create(self) -> DocketResult<Docket> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let has_parts = self.name.is_some() || self.extension.is_some() || self.codec.is_some();
        let config = match self.config {
            Some(_) if has_parts => {
                log::error!("A configuration cannot be combined with name, extension or codec");
                return Err(DocketError::new(
                    "a configuration cannot be combined with name, extension or codec",
                    ErrorKind::InvalidOperation,
                ));
            }
            Some(config) => config,
            None => {
                let name = required(self.name, "database name")?;
                let extension = required(self.extension, "file extension")?;
                let codec = required(self.codec, "codec")?;
                DocketConfig::new(&name, &extension, codec)?
            }
        };

        let store = match self.store_module {
            Some(module) => module.get_store()?,
            None => InMemoryModule::new().get_store()?,
        };
        Docket::open(config, store)
    }
}

fn required<T>(value: Option<T>, label: &str) -> DocketResult<T> {
    match value {
        Some(value) => Ok(value),
        None => {
            log::error!("The {} is required", label);
            Err(DocketError::new(
                &format!("{} is required", label),
                ErrorKind::ValidationError,
            ))
        }
    }
}
