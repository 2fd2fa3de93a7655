use crate::codec::CodecKind;
use crate::errors::{DocketError, DocketResult, ErrorKind};
use serde::{Deserialize, Serialize};

/// Immutable configuration of a database.
///
/// A configuration names the database file (`<name>.<extension>`) and
/// selects its record codec. There are no defaults: every part is supplied
/// by the caller and validated on construction.
///
/// # Examples
///
/// ```rust,ignore
/// use docket::codec::CodecKind;
/// use docket::docket_config::DocketConfig;
///
/// let config = DocketConfig::new("webbr", "db", CodecKind::WholeRecord)?;
/// assert_eq!(config.file_name(), "webbr.db");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocketConfig {
    name: String,
    extension: String,
    codec: CodecKind,
}

impl DocketConfig {
    /// Creates a validated configuration.
    ///
    /// Name and extension must be non-empty and free of whitespace and path
    /// separators; the extension is given without its leading dot.
    pub fn new(name: &str, extension: &str, codec: CodecKind) -> DocketResult<DocketConfig> {
        let config = DocketConfig {
            name: name.to_string(),
            extension: extension.to_string(),
            codec,
        };
        config.validate()?;
        Ok(config)
    }

    /// Re-checks the configuration, e.g. after deserializing it.
    pub fn validate(&self) -> DocketResult<()> {
        validate_part("database name", &self.name)?;
        validate_part("file extension", &self.extension)?;
        if self.extension.starts_with('.') {
            log::error!("File extension {} starts with a dot", self.extension);
            return Err(DocketError::new(
                "file extension must not start with a dot",
                ErrorKind::ValidationError,
            ));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn codec(&self) -> CodecKind {
        self.codec
    }

    /// The database file name, `<name>.<extension>`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }
}

fn validate_part(label: &str, value: &str) -> DocketResult<()> {
    if value.is_empty() {
        log::error!("The {} cannot be empty", label);
        return Err(DocketError::new(
            &format!("{} cannot be empty", label),
            ErrorKind::ValidationError,
        ));
    }
    if value.chars().any(|c| c == '/' || c == '\\' || c.is_whitespace()) {
        log::error!("The {} {:?} contains a path separator or whitespace", label, value);
        return Err(DocketError::new(
            &format!("{} cannot contain path separators or whitespace", label),
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_file_name() {
        let config = DocketConfig::new("webbr", "db", CodecKind::TypedField).unwrap();
        assert_eq!(config.name(), "webbr");
        assert_eq!(config.extension(), "db");
        assert_eq!(config.codec(), CodecKind::TypedField);
        assert_eq!(config.file_name(), "webbr.db");
    }

    #[test]
    fn rejects_invalid_parts() {
        for (name, ext) in [
            ("", "db"),
            ("webbr", ""),
            ("we bbr", "db"),
            ("a/b", "db"),
            ("a\\b", "db"),
            ("webbr", ".db"),
            ("webbr", "d\tb"),
        ] {
            let err = DocketConfig::new(name, ext, CodecKind::WholeRecord).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ValidationError, "{}.{}", name, ext);
        }
    }

    #[test]
    fn serde_round_trip_and_revalidation() {
        let config = DocketConfig::new("webbr", "db", CodecKind::WholeRecord).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"name":"webbr","extension":"db","codec":"whole-record"}"#);
        let back: DocketConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let bad: DocketConfig =
            serde_json::from_str(r#"{"name":"","extension":"db","codec":"typed-field"}"#).unwrap();
        assert!(bad.validate().is_err());
    }
}
