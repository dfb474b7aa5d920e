//! Descriptive tags inferred from a layout file's name.
//!
//! Firmware builds ship their var files under names such as
//! `pixie16_revf_14b500m_r33450.var`. The revision and ADC tags are read from that
//! name only; the file contents play no part. Every tag is optional and a name
//! without any of them still yields usable [`Metadata`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static FIRMWARE_REVISION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"r\d{5}").expect("Invalid firmware revision regex"));
static HARDWARE_REVISION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rev([abcdf])").expect("Invalid hardware revision regex"));
static ADC_DESCRIPTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2})b(\d{3})m").expect("Invalid ADC descriptor regex"));

/// ADC resolution and sampling rate, e.g. `14b500m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcDescriptor {
    pub bit_resolution: u32,
    /// Sampling frequency in MHz.
    pub sampling_frequency: u32,
}

/// Raw per-tag extraction result. `None` means the tag is absent from the name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilenameTags {
    pub firmware_revision: Option<String>,
    pub hardware_revision: Option<char>,
    pub adc: Option<AdcDescriptor>,
}

impl FilenameTags {
    pub fn extract(path: &str) -> Self {
        let firmware_revision = FIRMWARE_REVISION
            .find(path)
            .map(|m| m.as_str().to_string());

        let hardware_revision = HARDWARE_REVISION
            .captures(path)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().chars().next())
            .map(|letter| letter.to_ascii_uppercase());

        let adc = ADC_DESCRIPTOR.captures(path).and_then(|caps| {
            let bits = caps.get(1)?.as_str().parse().ok()?;
            let frequency = caps.get(2)?.as_str().parse().ok()?;
            Some(AdcDescriptor {
                bit_resolution: bits,
                sampling_frequency: frequency,
            })
        });

        Self {
            firmware_revision,
            hardware_revision,
            adc,
        }
    }
}

/// Tags attached to every decoded record.
///
/// Fields are declared in the order of their serialized keys so the JSON output
/// is key-sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub adc_bit_resolution: u32,
    pub adc_sampling_frequency: u32,
    /// Single uppercase letter, or empty.
    pub hardware_revision: String,
    /// Name of the paired DSP image (`<base>.ldr`).
    #[serde(rename = "ldr")]
    pub ldr_file_name: String,
    /// Firmware revision such as `r33450`, or empty.
    #[serde(rename = "rev")]
    pub firmware_revision: String,
    /// Name of the layout file itself (`<base>.var`).
    #[serde(rename = "var")]
    pub layout_file_name: String,
}

impl Metadata {
    /// Derives metadata from the layout file path. Never fails.
    pub fn from_layout_path(path: &str) -> Self {
        let tags = FilenameTags::extract(path);
        let base = base_name(path);
        let adc = tags.adc.unwrap_or(AdcDescriptor {
            bit_resolution: 0,
            sampling_frequency: 0,
        });

        Self {
            adc_bit_resolution: adc.bit_resolution,
            adc_sampling_frequency: adc.sampling_frequency,
            hardware_revision: tags
                .hardware_revision
                .map(String::from)
                .unwrap_or_default(),
            ldr_file_name: format!("{base}.ldr"),
            firmware_revision: tags.firmware_revision.unwrap_or_default(),
            layout_file_name: format!("{base}.var"),
        }
    }
}

/// File name without directory and without its last extension.
fn base_name(path: &str) -> &str {
    let file_name = Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => file_name,
    }
}
