//! Dead-letter routing settings.
//!
//! Settings are loaded once at startup and shared read-only by every
//! recovery engine in the process.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Process-wide routing configuration.
///
/// # Examples
///
/// ```ron
/// (
///     max_retries: 5,
///     require_annotation: true,
///     dead_letter_suffix: ".DLT",
///     error_topic: "orders-errors",
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetterSettings {
    /// Retry count at which a message is considered exhausted.
    ///
    /// The threshold is inclusive: a message that has been retried exactly
    /// `max_retries` times goes to the error topic.
    ///
    /// Default: 3
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Only route messages that carry the dead-letter marker.
    ///
    /// Default: false
    #[serde(default)]
    pub require_annotation: bool,

    /// Suffix appended to a topic to form its dead-letter topic.
    ///
    /// Default: `-dlt`
    #[serde(default = "defaults::dead_letter_suffix")]
    pub dead_letter_suffix: String,

    /// Topic that receives messages whose retries are exhausted.
    ///
    /// Default: `error`
    #[serde(default = "defaults::error_topic")]
    pub error_topic: String,
}

impl Default for DeadLetterSettings {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            require_annotation: false,
            dead_letter_suffix: defaults::dead_letter_suffix(),
            error_topic: defaults::error_topic(),
        }
    }
}

impl DeadLetterSettings {
    /// Parse settings from a RON document and validate them.
    ///
    /// # Errors
    /// Returns an error if the document is malformed or a value is unusable
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = ron::Options::default()
            .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
            .from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a RON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or fails [`Self::from_ron_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_ron_str(&content)
    }

    /// Check that the settings can produce a working topology.
    ///
    /// An empty suffix would name every dead-letter topic after its source.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dead_letter_suffix.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "dead_letter_suffix",
                reason: "must not be empty".to_string(),
            });
        }

        if self.error_topic.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "error_topic",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

mod defaults {
    pub const fn max_retries() -> u32 {
        3
    }

    pub fn dead_letter_suffix() -> String {
        "-dlt".to_string()
    }

    pub fn error_topic() -> String {
        "error".to_string()
    }
}
