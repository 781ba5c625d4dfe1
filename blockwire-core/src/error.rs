use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Row width or column length does not match the expected shape
    #[error("Shape error: {0}")]
    Shape(String),

    /// Unsupported row container, mixed row kinds or a cell of the wrong type
    #[error("Type error: {0}")]
    Type(String),

    /// Mapping row is missing a column named in the schema
    #[error("Key error: {0}")]
    Key(String),

    /// Truncated or malformed binary input
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unknown field tag: {0}")]
    UnknownTag(u64),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// True for errors raised while decoding wire input.
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode(_) | Error::UnknownTag(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Shape("Expected 2 columns, got 1".to_string());
        assert_eq!(err.to_string(), "Shape error: Expected 2 columns, got 1");
        assert_eq!(Error::UnknownTag(7).to_string(), "Unknown field tag: 7");
    }

    #[test]
    fn test_is_decode() {
        assert!(Error::Decode("eof".to_string()).is_decode());
        assert!(Error::UnknownTag(3).is_decode());
        assert!(!Error::Key("b".to_string()).is_decode());
    }
}
