//! Reader, writer and validator for PADS library part type records.
//!
//! A part type record describes the pin-out and metadata of one component:
//! its PCB decals, free-text attributes, gates and the pins in each gate.
//!
//! ```
//! let text = "\
//! 24LC256-I_SN SOIC127P600X175-8N I UND 1 1 0 0 0
//! \"Manufacturer_Name\" Microchip
//! GATE 1 2 0
//! 24LC256-I_SN
//! 4 0 U VSS
//! 8 0 U VCC
//!
//! *END*
//! ";
//! let library = pads_parttype::Library::parse(text).unwrap();
//! let part = library.part("24LC256-I_SN").unwrap();
//! assert_eq!(part.manufacturer(), Some("Microchip"));
//! assert_eq!(part.pins().count(), 2);
//! assert_eq!(library.to_string(), text);
//! ```

use std::fmt::Display;

use chrono::NaiveDateTime;
use serde::Serialize;

pub mod builder;
mod error;
mod parse;
pub mod raw;
pub mod validate;
mod write;

pub use builder::PartTypeBuilder;
pub use error::{line_col, BuildError, ConfigError, ParseError, Span};
pub use validate::{Issue, Rule, Severity, ValidationOptions, ValidationReport, Validator};

/// A part type library file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Library<'a> {
    pub format: Option<&'a str>,
    pub parts: Vec<PartType<'a>>,
    pub remark: Option<Remark<'a>>,
    #[serde(skip)]
    pub line_ending: LineEnding,
}

impl<'a> Library<'a> {
    pub fn parse(input: &'a str) -> Result<Self, ParseError> {
        Library::try_from(input)
    }

    pub fn part(&self, name: &str) -> Option<&PartType<'a>> {
        self.parts.iter().find(|part| part.name == name)
    }
}

impl<'a> TryFrom<&'a str> for Library<'a> {
    type Error = ParseError;

    fn try_from(input: &'a str) -> Result<Self, Self::Error> {
        raw::Library::try_from(input)?.try_into()
    }
}

impl<'a> Default for Library<'a> {
    fn default() -> Self {
        Self {
            format: Some(Library::FORMAT_V9),
            parts: vec![],
            remark: None,
            line_ending: LineEnding::Lf,
        }
    }
}

impl Library<'_> {
    pub const FORMAT_V9: &'static str = "PADS-LIBRARY-PART-TYPES-V9";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// A single component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartType<'a> {
    pub name: &'a str,
    /// PCB decals, the first one being the default
    pub decals: Vec<&'a str>,
    pub units: Units,
    pub logic_family: &'a str,
    pub header: HeaderCounts,
    pub timestamp: Option<Timestamp>,
    pub attributes: Vec<Attribute<'a>>,
    pub gates: Vec<Gate<'a>>,
    pub signal_pins: Vec<SignalPin<'a>>,
}

impl<'a> PartType<'a> {
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value)
    }

    pub fn manufacturer(&self) -> Option<&'a str> {
        self.attribute("Manufacturer_Name")
    }

    pub fn part_number(&self) -> Option<&'a str> {
        self.attribute("Manufacturer_Part_Number")
    }

    pub fn description(&self) -> Option<&'a str> {
        self.attribute("Description")
    }

    pub fn datasheet(&self) -> Option<&'a str> {
        self.attribute("Datasheet Link")
    }

    /// All gate pins, in file order
    pub fn pins(&self) -> impl Iterator<Item = &Pin<'a>> {
        self.gates.iter().flat_map(|gate| gate.pins.iter())
    }

    pub fn pin(&self, num: &str) -> Option<&Pin<'a>> {
        self.pins().find(|pin| pin.num.0 == num)
    }

    /// Number of pin lines across all gates
    pub fn pin_line_count(&self) -> usize {
        self.gates.iter().map(|gate| gate.pins.len()).sum()
    }

    /// Gate and signal pin numbers that are not plain integers, e.g. BGA balls
    pub fn alphanumeric_pin_count(&self) -> usize {
        self.pins()
            .map(|pin| pin.num)
            .chain(self.signal_pins.iter().map(|pin| pin.num))
            .filter(|num| !num.is_numeric())
            .count()
    }
}

/// The counts declared on the part type header line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HeaderCounts {
    pub attributes: u32,
    pub gates: u32,
    pub signal_pins: u32,
    pub alphanumeric_pins: Option<u32>,
    pub flags: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
pub enum Units {
    #[default]
    Imperial,
    Metric,
}

impl Units {
    pub fn code(&self) -> char {
        match self {
            Units::Imperial => 'I',
            Units::Metric => 'M',
        }
    }
}

/// Export time of a record, written as `YYYY.MM.DD.hh.mm.ss`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Timestamp(pub NaiveDateTime);

impl Timestamp {
    pub const FORMAT: &'static str = "%Y.%m.%d.%H.%M.%S";
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(Timestamp::FORMAT))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Attribute<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gate<'a> {
    /// Number of decal name lines declared on the GATE line
    pub decal_count: u32,
    /// Number of pin lines declared on the GATE line
    pub pin_count: u32,
    pub swap: u32,
    pub decals: Vec<&'a str>,
    pub pins: Vec<Pin<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PinNum<'a>(pub &'a str);

impl PinNum<'_> {
    pub fn is_numeric(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl Display for PinNum<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pin<'a> {
    pub num: PinNum<'a>,
    pub swap_group: u32,
    pub typ: PinType,
    pub name: &'a str,
}

impl<'a> Pin<'a> {
    pub fn new(num: &'a str, typ: PinType, name: &'a str) -> Self {
        Self {
            num: PinNum(num),
            swap_group: 0,
            typ,
            name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PinType {
    Source,
    Bidirectional,
    OpenCollector,
    OrTieable,
    TriState,
    Load,
    Terminator,
    Power,
    Ground,
    Undefined,
}

impl PinType {
    pub fn code(&self) -> char {
        match self {
            PinType::Source => 'S',
            PinType::Bidirectional => 'B',
            PinType::OpenCollector => 'C',
            PinType::OrTieable => 'O',
            PinType::TriState => 'T',
            PinType::Load => 'L',
            PinType::Terminator => 'Z',
            PinType::Power => 'P',
            PinType::Ground => 'G',
            PinType::Undefined => 'U',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalPin<'a> {
    pub num: PinNum<'a>,
    pub width: u32,
    pub signal: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Remark<'a> {
    pub text: &'a str,
    pub lines: Vec<&'a str>,
}

impl<'a> Remark<'a> {
    /// The tool or library the record was exported from
    pub fn provenance(&self) -> Option<&'a str> {
        if self.text.is_empty() {
            self.lines.iter().copied().find(|line| !line.is_empty())
        } else {
            Some(self.text)
        }
    }
}
