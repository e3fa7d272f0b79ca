//! Configuration types for reading, writing and loading pages.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Decoder limits and policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Largest text buffer accepted, in characters.
    pub max_text_chars: usize,
    /// Whether `http`/`https`/`ftp` locations may be fetched.
    pub allow_remote: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_text_chars: 4_000_000,
            allow_remote: false,
        }
    }
}

/// Encoder output options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Indent width for pretty output; `None` writes one line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent: Option<usize>,
    /// Copy images, audio and archives next to the written page.
    pub copy_resources: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            indent: None,
            copy_resources: true,
        }
    }
}

/// Background worker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Loads that may wait for the parser before `load` blocks.
    pub queue_depth: usize,
    pub parser_thread: String,
    pub resource_thread: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            queue_depth: 4,
            parser_thread: "page-parser".to_string(),
            resource_thread: "page-resources".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub decoder: DecoderConfig,
    pub encoder: EncoderConfig,
    pub loader: LoaderConfig,
}

impl PageConfig {
    /// Read a JSON configuration file; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Config`] when the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|error| CodecError::Config {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|error| CodecError::Config {
            path: path.to_path_buf(),
            message: error.to_string(),
        })
    }

    /// Pretty JSON rendering, e.g. for `--print-config`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = PageConfig::default();
        assert!(!config.decoder.allow_remote);
        assert_eq!(config.encoder.indent, None);
        assert!(config.encoder.copy_resources);
        assert_eq!(config.loader.parser_thread, "page-parser");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"encoder": {{"indent": 2}}}}"#).unwrap();
        let config = PageConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.encoder.indent, Some(2));
        assert!(config.encoder.copy_resources);
        assert_eq!(config.decoder, DecoderConfig::default());
    }

    #[test]
    fn test_invalid_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let error = PageConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(error, CodecError::Config { .. }));
        assert!(error.is_recoverable());
    }
}
