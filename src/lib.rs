//! # Legacy Settings File Decoder
//!
//! This crate decodes the binary DSP settings files (`.set`) saved by Pixie-16 style
//! data acquisition modules into structured documents. A settings file is an opaque
//! run of 32-bit words; its meaning comes from a separate DSP variable layout file
//! (`.var`) and, for descriptive tags, from that layout file's name.
//!
//! ## Crate Structure
//!
//! The decoding pipeline runs leaves first:
//!
//! - **`layout`**: Parses the layout file into an ordered `AddressMap` of field lengths.
//! - **`metadata`**: Derives firmware, hardware and ADC tags from the layout file name.
//! - **`decoder`**: Slices each fixed-size record of the settings file into named fields.
//! - **`classifier`**: Sorts decoded fields into channel/module input/output namespaces.
//! - **`settings`**: Drives the pipeline over a whole file and writes the JSON document.
//!
//! Supporting modules:
//!
//! - **`config`**: Figment-based configuration (defaults, TOML file, environment).
//! - **`error`**: The `DecodeError` enum shared by every stage.
//! - **`logging`**: `tracing-subscriber` initialisation for the binary.
//! - **`validation`**: Small input validation helpers.

pub mod classifier;
pub mod config;
pub mod decoder;
pub mod error;
pub mod layout;
pub mod logging;
pub mod metadata;
pub mod settings;
pub mod validation;

pub use classifier::{FieldCategory, Record};
pub use decoder::FieldValue;
pub use error::{DecodeError, DecodeResult};
pub use layout::{AddressMap, LayoutEntry, LayoutResolver, RECORD_CAPACITY, WORD_SIZE};
pub use metadata::Metadata;
pub use settings::{Document, SettingsDecoder};
