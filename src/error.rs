//! Custom error types for the decoder.
//!
//! This module defines the primary error type, `DecodeError`, for the whole crate.
//! Using the `thiserror` crate, it provides a centralized and consistent way to handle
//! the failures that can occur while turning a layout file and a settings file into
//! a structured document.
//!
//! ## Error Hierarchy
//!
//! `DecodeError` consolidates three kinds of failure:
//!
//! - **Configuration errors** (`Layout`, `EmptyLayout`, `LayoutOverflow`,
//!   `LayoutMismatch`, `ClassificationConflict`, `Settings`, `Config`): the layout
//!   file or the decoder settings are unusable. These are raised before any record
//!   is decoded and require a corrected input.
//! - **Truncation** (`Truncated`): the settings file ends in the middle of a record.
//!   No partial document is produced.
//! - **I/O** (`Io`, `MissingInput`, `Serialization`): the filesystem or the output
//!   encoder failed.
//!
//! Filename tags that fail to match and fields that no namespace recognises are not
//! errors; they are absorbed where they occur.

use crate::classifier::FieldCategory;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the decoder error type.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Layout line {line}: {reason}")]
    Layout { line: usize, reason: String },

    #[error("Layout file declares no fields")]
    EmptyLayout,

    #[error("Layout spans {declared} words but a record only holds {capacity}")]
    LayoutOverflow { declared: u64, capacity: u32 },

    #[error("Layout covers {layout_words} words but a record holds {capacity}")]
    LayoutMismatch { layout_words: u64, capacity: u32 },

    #[error("Field '{field}' is listed as both {first} and {second}")]
    ClassificationConflict {
        field: String,
        first: FieldCategory,
        second: FieldCategory,
    },

    #[error("Record {record} is truncated: expected {expected} bytes, found {actual}")]
    Truncated {
        record: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Could not access {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Configuration validation error: {0}")]
    Settings(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DecodeError {
    pub(crate) fn layout(line: usize, reason: impl Into<String>) -> Self {
        DecodeError::Layout {
            line,
            reason: reason.into(),
        }
    }

    /// Whether the error was caused by the layout or decoder configuration
    /// rather than by the settings data itself.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DecodeError::Layout { .. }
                | DecodeError::EmptyLayout
                | DecodeError::LayoutOverflow { .. }
                | DecodeError::LayoutMismatch { .. }
                | DecodeError::ClassificationConflict { .. }
                | DecodeError::Config(_)
                | DecodeError::Settings(_)
        )
    }
}

impl From<figment::Error> for DecodeError {
    fn from(value: figment::Error) -> Self {
        DecodeError::Config(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_error_names_the_line() {
        let err = DecodeError::layout(7, "address 'zz' is not hexadecimal");
        assert_eq!(
            err.to_string(),
            "Layout line 7: address 'zz' is not hexadecimal"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn truncation_is_not_a_configuration_error() {
        let err = DecodeError::Truncated {
            record: 2,
            expected: 5120,
            actual: 12,
        };
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("expected 5120 bytes, found 12"));
    }

    #[test]
    fn io_errors_convert_with_question_mark() {
        fn open() -> DecodeResult<()> {
            Err(std::io::Error::from(std::io::ErrorKind::NotFound))?;
            Ok(())
        }
        match open() {
            Err(DecodeError::Io(err)) => assert_eq!(err.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_input_displays_path() {
        let err = DecodeError::MissingInput(PathBuf::from("/data/crate.set"));
        assert_eq!(err.to_string(), "Could not access /data/crate.set");
    }
}
