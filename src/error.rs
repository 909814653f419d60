//! Error types for the type layer.

use crate::descriptor::Family;
use crate::type_token::OutputShape;

/// Opaque data did not match the shape a converter expects.
///
/// Carries the declared type, what was expected and what was found. The
/// engine attaches the stage name with [`ConversionError::in_stage`] before
/// deciding whether to abort the task or skip the record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot convert {found} into {type_name}{}: expected {expected}", stage_suffix(.stage.as_deref()))]
pub struct ConversionError {
    pub type_name: String,
    pub expected: String,
    pub found: String,
    pub stage: Option<String>,
}

fn stage_suffix(stage: Option<&str>) -> String {
    stage.map(|s| format!(" in stage '{s}'")).unwrap_or_default()
}

impl ConversionError {
    pub fn new(
        type_name: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            expected: expected.into(),
            found: found.into(),
            stage: None,
        }
    }

    /// Attach the name of the stage that was running the conversion.
    #[must_use]
    pub fn in_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }
}

/// Errors produced while declaring or configuring typed pipeline stages.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    /// The shape cannot be written, or a target does not recognize it.
    #[error("unsupported shape {type_name}: {reason}")]
    UnsupportedShape { type_name: String, reason: String },

    /// Runtime data did not conform to the declared type.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// A composite was assembled from descriptors of different families.
    #[error("cannot combine {left:?} and {right:?} family descriptors")]
    FamilyMismatch { left: Family, right: Family },

    /// The converter's output shape does not fit where it was used.
    #[error("{type_name} produces {found:?} records, expected {expected:?}")]
    ShapeMismatch {
        type_name: String,
        expected: OutputShape,
        found: OutputShape,
    },

    /// Wiring engine resources failed; nothing was applied.
    #[error("configuration failed: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl TypeError {
    pub fn unsupported(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedShape {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    pub fn configuration_from(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(source),
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, TypeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_error_mentions_stage() {
        let err = ConversionError::new("i64", "int", "text").in_stage("parse");
        let msg = err.to_string();
        assert!(msg.contains("i64"), "got: {msg}");
        assert!(msg.contains("stage 'parse'"), "got: {msg}");
    }

    #[test]
    fn conversion_error_without_stage() {
        let err = ConversionError::new("bool", "bool", "int");
        assert_eq!(err.to_string(), "cannot convert int into bool: expected bool");
    }

    #[test]
    fn configuration_keeps_source() {
        let err = TypeError::configuration_from("wire kvstore", anyhow::anyhow!("missing"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
