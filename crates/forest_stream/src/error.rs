//! Error types and result alias for the crate.
//!
//! Only configuration that cannot be normalised produces an [`enum@crate::error::Error`].
//! Everything at runtime degrades to fewer placements instead of failing.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn invalid_config_formats_message() {
        let err = Error::InvalidConfig("chunk_size must be > 0".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: chunk_size must be > 0"
        );
    }
}
