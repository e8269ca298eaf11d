//! Core error types for the Frost pipeline.

/// A specialized Result type for Frost operations.
pub type FrostResult<T> = Result<T, FrostError>;

/// Top-level error type encompassing all Frost subsystems.
#[derive(Debug, thiserror::Error)]
pub enum FrostError {
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("pixel data length {actual} does not match {width}x{height} ({expected} expected)")]
    PixelDataLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("render graph error: {0}")]
    Graph(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

impl FrostError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        FrostError::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_error_display() {
        let err = FrostError::InvalidDimensions {
            width: 0,
            height: 12,
        };
        assert_eq!(err.to_string(), "invalid image dimensions 0x12");
    }

    #[test]
    fn test_config_error_display() {
        let err = FrostError::config("blur_offset out of range");
        assert_eq!(err.to_string(), "configuration error: blur_offset out of range");
    }

    #[test]
    fn test_toml_parse_error_converts() {
        let err: FrostError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert!(matches!(err, FrostError::TomlParse(_)));
    }
}
