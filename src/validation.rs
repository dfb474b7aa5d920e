use crate::error::{DecodeError, DecodeResult};
use std::ops::RangeInclusive;
use std::path::Path;

/// Validates that an input path names an existing regular file.
///
/// # Arguments
///
/// * `path` - The path to check.
///
/// # Returns
///
/// * `Ok(())` if the file exists.
/// * `Err(DecodeError::MissingInput)` if it does not, or is not a regular file.
pub fn ensure_file(path: &Path) -> DecodeResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(DecodeError::MissingInput(path.to_path_buf()))
    }
}

/// Validates if a given value is within a specified numeric range.
///
/// # Arguments
///
/// * `value` - The value to validate.
/// * `range` - The inclusive range to validate against.
///
/// # Returns
///
/// * `Ok(())` if the value is within the range.
/// * `Err(&'static str)` if the value is outside the range.
pub fn is_in_range<T: PartialOrd>(value: T, range: RangeInclusive<T>) -> Result<(), &'static str> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err("Value is outside the specified range")
    }
}

/// Validates if a given string is not empty.
///
/// # Arguments
///
/// * `value` - The string to validate.
///
/// # Returns
///
/// * `Ok(())` if the string is not empty.
/// * `Err(&'static str)` if the string is empty.
pub fn is_not_empty(value: &str) -> Result<(), &'static str> {
    if !value.is_empty() {
        Ok(())
    } else {
        Err("Value cannot be empty")
    }
}
