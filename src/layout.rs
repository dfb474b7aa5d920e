//! DSP variable layout resolution.
//!
//! A layout ("var") file lists the DSP parameters of one module in address order:
//!
//! ```text
//! 0x0004a000  ModNum
//! 0x0004a001  ModCSRA
//! 0x0004a002  ModCSRB
//! ```
//!
//! Each field's length is the distance to the next address. The file never states
//! the length of its last field; that field owns whatever is left of the record.

use crate::config::LayoutConfig;
use crate::error::{DecodeError, DecodeResult};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Number of 32-bit words in one module's DSP parameter block.
pub const RECORD_CAPACITY: u32 = 1280;

/// Size in bytes of one storage word.
pub const WORD_SIZE: usize = 4;

const SEPARATOR: &str = "  ";

/// A named field and its length in storage words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutEntry {
    pub name: String,
    pub length: u32,
}

impl LayoutEntry {
    pub fn new(name: impl Into<String>, length: u32) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }

    /// Number of bytes the field occupies in a record.
    pub fn byte_len(&self) -> usize {
        self.length as usize * WORD_SIZE
    }
}

/// Ordered mapping from field name to field length.
///
/// Names are unique and the lengths always add up to the record capacity, so
/// decoding a record with this map consumes it exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressMap {
    entries: Vec<LayoutEntry>,
    capacity: u32,
}

impl AddressMap {
    /// Builds a map from explicit entries.
    pub fn new(entries: Vec<LayoutEntry>, capacity: u32) -> DecodeResult<Self> {
        if entries.is_empty() {
            return Err(DecodeError::EmptyLayout);
        }

        let mut seen = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            if !seen.insert(entry.name.as_str()) {
                return Err(DecodeError::layout(
                    index + 1,
                    format!("duplicate field name '{}'", entry.name),
                ));
            }
        }

        let layout_words: u64 = entries.iter().map(|e| u64::from(e.length)).sum();
        if layout_words != u64::from(capacity) {
            return Err(DecodeError::LayoutMismatch {
                layout_words,
                capacity,
            });
        }

        Ok(Self { entries, capacity })
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    /// Iterates `(name, length)` pairs in layout order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.entries.iter().map(|e| (e.name.as_str(), e.length))
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.length)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record size in words.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Record size in bytes.
    pub fn record_bytes(&self) -> usize {
        self.capacity as usize * WORD_SIZE
    }
}

/// Parses layout files into [`AddressMap`]s.
#[derive(Debug, Clone, Copy)]
pub struct LayoutResolver {
    record_capacity: u32,
    address_stride: u32,
}

impl Default for LayoutResolver {
    fn default() -> Self {
        Self {
            record_capacity: RECORD_CAPACITY,
            address_stride: 1,
        }
    }
}

impl LayoutResolver {
    /// `address_stride` is the number of layout address units per storage word.
    /// Hardware var files use word addresses, i.e. a stride of 1.
    pub fn new(record_capacity: u32, address_stride: u32) -> Self {
        Self {
            record_capacity,
            address_stride: address_stride.max(1),
        }
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new(config.record_capacity, config.address_stride)
    }

    pub fn record_capacity(&self) -> u32 {
        self.record_capacity
    }

    pub fn resolve_file(&self, path: impl AsRef<Path>) -> DecodeResult<AddressMap> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let map = self.resolve_str(&text)?;
        tracing::debug!(
            layout = %path.display(),
            fields = map.len(),
            "Resolved layout file"
        );
        Ok(map)
    }

    pub fn resolve_str(&self, text: &str) -> DecodeResult<AddressMap> {
        let mut rows: Vec<(usize, u64, &str)> = Vec::new();
        let mut names = HashSet::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.trim().is_empty() {
                continue;
            }
            let (address, name) = parse_line(index + 1, line)?;
            if !names.insert(name) {
                return Err(DecodeError::layout(
                    index + 1,
                    format!("duplicate field name '{}'", name),
                ));
            }
            rows.push((index + 1, address, name));
        }

        if rows.is_empty() {
            return Err(DecodeError::EmptyLayout);
        }

        let mut entries = Vec::with_capacity(rows.len());
        let mut declared: u64 = 0;
        for pair in rows.windows(2) {
            let (line, address, name) = pair[0];
            let (next_line, next_address, _) = pair[1];
            if next_address <= address {
                return Err(DecodeError::layout(
                    next_line,
                    format!(
                        "address {:#x} does not follow {:#x} of line {}",
                        next_address, address, line
                    ),
                ));
            }
            let length = self.words_between(line, address, next_address)?;
            declared += u64::from(length);
            entries.push(LayoutEntry::new(name, length));
        }

        let capacity = u64::from(self.record_capacity);
        if declared > capacity {
            return Err(DecodeError::LayoutOverflow {
                declared,
                capacity: self.record_capacity,
            });
        }

        // The last field takes the rest of the record.
        if let Some(&(_, _, name)) = rows.last() {
            let remainder = capacity - declared;
            entries.push(LayoutEntry::new(name, remainder as u32));
        }

        AddressMap::new(entries, self.record_capacity)
    }

    fn words_between(&self, line: usize, start: u64, end: u64) -> DecodeResult<u32> {
        let delta = end - start;
        let stride = u64::from(self.address_stride);
        if delta % stride != 0 {
            return Err(DecodeError::layout(
                line,
                format!(
                    "field spans {} address units, not a multiple of the {}-unit word",
                    delta, stride
                ),
            ));
        }
        u32::try_from(delta / stride).map_err(|_| {
            DecodeError::layout(line, format!("field spans {} words", delta / stride))
        })
    }
}

fn parse_line(line_no: usize, line: &str) -> DecodeResult<(u64, &str)> {
    let (address, name) = line.split_once(SEPARATOR).ok_or_else(|| {
        DecodeError::layout(
            line_no,
            format!("expected '<address>  <name>', found '{}'", line),
        )
    })?;

    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(DecodeError::layout(
            line_no,
            format!("invalid field name '{}'", name),
        ));
    }

    let digits = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    let address = u64::from_str_radix(digits, 16).map_err(|_| {
        DecodeError::layout(
            line_no,
            format!("address '{}' is not hexadecimal", address),
        )
    })?;

    Ok((address, name))
}
