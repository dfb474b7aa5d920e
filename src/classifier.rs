//! Field classification.
//!
//! Decoded fields are sorted into four namespaces according to the register
//! semantics of the DSP: per-channel inputs and outputs, and per-module inputs and
//! outputs. The membership lists are closed; any other field is dropped from the
//! structured record.

use crate::decoder::{FieldValue, FlatRecord};
use crate::error::{DecodeError, DecodeResult};
use crate::metadata::Metadata;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, LazyLock};

pub const CHANNEL_INPUT_FIELDS: &[&str] = &[
    "ChanCSRa",
    "ChanCSRb",
    "GainDAC",
    "OffsetDAC",
    "DigGain",
    "SlowLength",
    "SlowGap",
    "FastLength",
    "FastGap",
    "PeakSample",
    "PeakSep",
    "CFDThresh",
    "FastThresh",
    "ThreshWidth",
    "PAFlength",
    "TriggerDelay",
    "ResetDelay",
    "ChanTrigStretch",
    "TraceLength",
    "Xwait",
    "TrigOutLen",
    "EnergyLow",
    "Log2Ebin",
    "MultiplicityMaskL",
    "PSAoffset",
    "PSAlength",
    "Integrator",
    "BLcut",
    "BaselinePercent",
    "FtrigoutDelay",
    "Log2Bweight",
    "PreampTau",
    "Xavg",
    "MultiplicityMaskH",
    "FastTrigBackLen",
    "CFDDelay",
    "CFDScale",
    "ExtTrigStretch",
    "VetoStretch",
    "ExternDelayLen",
    "QDCLen0",
    "QDCLen1",
    "QDCLen2",
    "QDCLen3",
    "QDCLen4",
    "QDCLen5",
    "QDCLen6",
    "QDCLen7",
];

pub const CHANNEL_OUTPUT_FIELDS: &[&str] = &[
    "LiveTimeA",
    "LiveTimeB",
    "FastPeaksA",
    "FastPeaksB",
    "OverflowA",
    "OverflowB",
    "InSpecA",
    "InSpecB",
    "UnderflowA",
    "UnderflowB",
    "ChanEventsA",
    "ChanEventsB",
    "AutoTau",
    "U30",
];

pub const MODULE_INPUT_FIELDS: &[&str] = &[
    "ModNum",
    "ModCSRA",
    "ModCSRB",
    "ModFormat",
    "RunTask",
    "ControlTask",
    "MaxEvents",
    "CoincPattern",
    "CoincWait",
    "SynchWait",
    "InSynch",
    "Resume",
    "SlowFilterRange",
    "FastFilterRange",
    "ChanNum",
    "HostIO",
    "UserIn",
    "FastTrigBackplaneEna",
    "CrateID",
    "SlotID",
    "ModID",
    "TrigConfig",
    "U00",
    "HostRunTimePreset",
    "PowerUpInitDone",
];

pub const MODULE_OUTPUT_FIELDS: &[&str] = &[
    "RealTimeA",
    "RealTimeB",
    "RunTimeA",
    "RunTimeB",
    "GSLTtime",
    "NumEventsA",
    "NumEventsB",
    "DSPerror",
    "SynchDone",
    "BufHeadLen",
    "EventHeadLen",
    "ChanHeadLen",
    "UserOut",
    "AOutBuffer",
    "LOutBuffer",
    "AECorr",
    "LECorr",
    "HardwareID",
    "HardVariant",
    "FIFOLength",
    "FippiID",
    "FippiVariant",
    "DSPrelease",
    "DSPbuild",
    "DSPVariant",
    "U20",
];

/// The namespace a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    ChannelInput,
    ChannelOutput,
    ModuleInput,
    ModuleOutput,
}

impl FieldCategory {
    pub const ALL: [FieldCategory; 4] = [
        FieldCategory::ChannelInput,
        FieldCategory::ChannelOutput,
        FieldCategory::ModuleInput,
        FieldCategory::ModuleOutput,
    ];

    /// Membership list for this category.
    pub fn members(self) -> &'static [&'static str] {
        match self {
            FieldCategory::ChannelInput => CHANNEL_INPUT_FIELDS,
            FieldCategory::ChannelOutput => CHANNEL_OUTPUT_FIELDS,
            FieldCategory::ModuleInput => MODULE_INPUT_FIELDS,
            FieldCategory::ModuleOutput => MODULE_OUTPUT_FIELDS,
        }
    }

    /// Looks up the category of a field name.
    pub fn of(name: &str) -> Option<FieldCategory> {
        CATEGORIES.get(name).copied()
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FieldCategory::ChannelInput => "channel input",
            FieldCategory::ChannelOutput => "channel output",
            FieldCategory::ModuleInput => "module input",
            FieldCategory::ModuleOutput => "module output",
        };
        write!(f, "{}", label)
    }
}

static CATEGORIES: LazyLock<HashMap<&'static str, FieldCategory>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    for category in FieldCategory::ALL {
        for &name in category.members() {
            table.entry(name).or_insert(category);
        }
    }
    table
});

/// Checks that no field name appears in more than one membership list.
pub fn verify_exclusive() -> DecodeResult<()> {
    check_exclusive(FieldCategory::ALL.map(|category| (category, category.members())))
}

fn check_exclusive<'a>(
    lists: impl IntoIterator<Item = (FieldCategory, &'a [&'a str])>,
) -> DecodeResult<()> {
    let mut owners: HashMap<&str, FieldCategory> = HashMap::new();
    for (category, names) in lists {
        for &name in names {
            if let Some(&first) = owners.get(name) {
                if first != category {
                    return Err(DecodeError::ClassificationConflict {
                        field: name.to_string(),
                        first,
                        second: category,
                    });
                }
            }
            owners.insert(name, category);
        }
    }
    Ok(())
}

/// Input and output fields of one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Namespace {
    pub input: BTreeMap<String, FieldValue>,
    pub output: BTreeMap<String, FieldValue>,
}

/// One module's decoded, classified settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub channel: Namespace,
    pub metadata: Arc<Metadata>,
    pub module: Namespace,
}

impl Record {
    pub fn new(metadata: Arc<Metadata>) -> Self {
        Self {
            channel: Namespace::default(),
            metadata,
            module: Namespace::default(),
        }
    }

    pub fn fields(&self, category: FieldCategory) -> &BTreeMap<String, FieldValue> {
        match category {
            FieldCategory::ChannelInput => &self.channel.input,
            FieldCategory::ChannelOutput => &self.channel.output,
            FieldCategory::ModuleInput => &self.module.input,
            FieldCategory::ModuleOutput => &self.module.output,
        }
    }

    fn fields_mut(&mut self, category: FieldCategory) -> &mut BTreeMap<String, FieldValue> {
        match category {
            FieldCategory::ChannelInput => &mut self.channel.input,
            FieldCategory::ChannelOutput => &mut self.channel.output,
            FieldCategory::ModuleInput => &mut self.module.input,
            FieldCategory::ModuleOutput => &mut self.module.output,
        }
    }

    /// Finds a field in whichever namespace holds it.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        FieldCategory::of(name).and_then(|category| self.fields(category).get(name))
    }
}

/// Sorts a flat record into namespaces, dropping unrecognised fields.
pub fn classify(flat: FlatRecord, metadata: &Arc<Metadata>) -> Record {
    let mut record = Record::new(Arc::clone(metadata));
    for (name, value) in flat {
        match FieldCategory::of(&name) {
            Some(category) => {
                record.fields_mut(category).insert(name, value);
            }
            None => tracing::debug!(field = %name, "Dropping unclassified field"),
        }
    }
    record
}
