//! Settings file decoding pipeline.
//!
//! [`SettingsDecoder`] ties the stages together: the layout and its metadata are
//! resolved once, then every record of the settings file is decoded and
//! classified into a [`Document`].
//!
//! # Example
//! ```no_run
//! use set_decoder::config::LayoutConfig;
//! use set_decoder::settings::{write_document, SettingsDecoder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let decoder = SettingsDecoder::from_layout_file(
//!     "firmware/pixie16_revf_14b500m_r33450.var",
//!     &LayoutConfig::default(),
//! )?;
//! let document = decoder.decode_file("crate.set")?;
//! write_document(&document, "crate.json", true)?;
//! # Ok(())
//! # }
//! ```

use crate::classifier::{self, Record};
use crate::config::LayoutConfig;
use crate::decoder::RecordDecoder;
use crate::error::DecodeResult;
use crate::layout::{AddressMap, LayoutResolver};
use crate::metadata::Metadata;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Decoded records in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document {
    records: Vec<Record>,
}

impl Document {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn to_json(&self, pretty: bool) -> DecodeResult<String> {
        let text = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(text)
    }
}

impl IntoIterator for Document {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Decodes settings files against one layout.
#[derive(Debug, Clone)]
pub struct SettingsDecoder {
    map: AddressMap,
    metadata: Arc<Metadata>,
}

impl SettingsDecoder {
    /// Fails if the classification lists overlap.
    pub fn new(map: AddressMap, metadata: Metadata) -> DecodeResult<Self> {
        classifier::verify_exclusive()?;
        Ok(Self {
            map,
            metadata: Arc::new(metadata),
        })
    }

    /// Resolves the layout file and derives metadata from its name.
    pub fn from_layout_file(path: impl AsRef<Path>, config: &LayoutConfig) -> DecodeResult<Self> {
        let path = path.as_ref();
        let map = LayoutResolver::from_config(config).resolve_file(path)?;
        let metadata = Metadata::from_layout_path(&path.to_string_lossy());
        tracing::info!(
            layout = %path.display(),
            fields = map.len(),
            firmware = %metadata.firmware_revision,
            hardware = %metadata.hardware_revision,
            "Loaded layout"
        );
        Self::new(map, metadata)
    }

    pub fn address_map(&self) -> &AddressMap {
        &self.map
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Decodes every record in `reader`. A truncated trailing record fails the
    /// whole decode.
    pub fn decode<R: Read>(&self, reader: R) -> DecodeResult<Document> {
        let mut records = Vec::new();
        for flat in RecordDecoder::new(reader, &self.map) {
            let record = classifier::classify(flat?, &self.metadata);
            tracing::debug!(
                record = records.len(),
                channel_inputs = record.channel.input.len(),
                module_inputs = record.module.input.len(),
                "Classified record"
            );
            records.push(record);
        }
        Ok(Document { records })
    }

    pub fn decode_file(&self, path: impl AsRef<Path>) -> DecodeResult<Document> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let document = self.decode(BufReader::new(file))?;
        if document.is_empty() {
            tracing::warn!(settings = %path.display(), "Settings file holds no records");
        } else {
            tracing::info!(
                settings = %path.display(),
                records = document.len(),
                "Decoded settings file"
            );
        }
        Ok(document)
    }
}

/// Output path next to the settings file, with its extension replaced.
pub fn output_path(input: impl AsRef<Path>, extension: &str) -> PathBuf {
    input.as_ref().with_extension(extension)
}

/// Writes the document as JSON with sorted keys.
pub fn write_document(
    document: &Document,
    path: impl AsRef<Path>,
    pretty: bool,
) -> DecodeResult<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, document)?;
    } else {
        serde_json::to_writer(&mut writer, document)?;
    }
    writer.flush()?;
    tracing::info!(output = %path.display(), records = document.len(), "Wrote document");
    Ok(())
}
