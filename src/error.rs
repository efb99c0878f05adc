// src/error.rs

//! Error types for the chaincode registry

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by packaging and registry operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed install input (empty name/version, nothing to install)
    #[error("validation error: {0}")]
    Validation(String),

    /// Source could not be resolved, read or serialized into a package
    #[error("packaging error: {0}")]
    Packaging(String),

    /// The (name, version) slot is already occupied
    ///
    /// Rendered so that the name, the word "install" and the version appear
    /// in that order, which string-matching callers rely on.
    #[error("chaincode {name} already installed with version {version}")]
    DuplicateInstall { name: String, version: String },

    /// Requested record or object does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid configuration value or file
    #[error("configuration error: {0}")]
    Config(String),

    /// Stored data no longer matches what was written
    #[error("store corruption: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Build a duplicate-install error for a key
    pub fn duplicate(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::DuplicateInstall {
            name: name.into(),
            version: version.into(),
        }
    }

    /// True when the install target was already occupied
    ///
    /// Callers that only want a chaincode to be present can treat this as success.
    pub fn is_duplicate_install(&self) -> bool {
        matches!(self, Self::DuplicateInstall { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_packaging(&self) -> bool {
        matches!(self, Self::Packaging(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_message_order() {
        let err = Error::duplicate("install", "v01234");
        let msg = err.to_string();

        let name_at = msg.find("install").unwrap();
        let after_name = name_at + "install".len();
        let token_at = msg[after_name..].find("install").unwrap() + after_name;
        let version_at = msg.find("v01234").unwrap();

        assert!(name_at < token_at);
        assert!(token_at < version_at);
        assert!(msg.contains("already installed"));
    }

    #[test]
    fn test_kind_helpers() {
        assert!(Error::duplicate("a", "1").is_duplicate_install());
        assert!(!Error::Validation("x".into()).is_duplicate_install());
        assert!(Error::Validation("x".into()).is_validation());
        assert!(Error::Packaging("x".into()).is_packaging());
    }
}
