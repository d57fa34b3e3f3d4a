//! Generating part type records from component data.

use crate::{
    Attribute, BuildError, Gate, HeaderCounts, PartType, Pin, PinNum, SignalPin, Timestamp, Units,
};

/// Checks that `value` reads back as the same single bare word
fn word(field: &'static str, value: &str) -> Result<(), BuildError> {
    let keyword = value.len() >= 2 && value.starts_with('*') && value.ends_with('*');
    if value.is_empty() || keyword || value.chars().any(|c| c.is_whitespace() || c == '"') {
        return Err(BuildError::InvalidToken {
            field,
            value: value.to_owned(),
        });
    }
    Ok(())
}

fn attribute(attr: &Attribute) -> Result<(), BuildError> {
    if attr.name.contains(['"', '\r', '\n']) {
        return Err(BuildError::InvalidAttributeName {
            name: attr.name.to_owned(),
        });
    }
    if attr.value.contains(['\r', '\n']) || attr.value.trim() != attr.value {
        return Err(BuildError::InvalidAttributeValue {
            name: attr.name.to_owned(),
            value: attr.value.to_owned(),
        });
    }
    Ok(())
}

fn pin_number(num: PinNum) -> Result<(), BuildError> {
    word("pin number", num.0)?;
    if matches!(num.0, "GATE" | "SIGPIN") {
        return Err(BuildError::InvalidToken {
            field: "pin number",
            value: num.0.to_owned(),
        });
    }
    Ok(())
}

/// Assembles a [`PartType`] whose header and gate counts match its contents
///
/// [`build`](PartTypeBuilder::build) refuses names and values that would not
/// read back unchanged, such as pin names with spaces.
///
/// ```
/// use pads_parttype::{Pin, PinType, PartTypeBuilder};
///
/// let part = PartTypeBuilder::new("24LC256-I_SN", "SOIC127P600X175-8N")
///     .attribute("Manufacturer_Name", "Microchip")
///     .gate(
///         "24LC256-I_SN",
///         [Pin::new("4", PinType::Ground, "VSS"), Pin::new("8", PinType::Power, "VCC")],
///     )
///     .build()
///     .unwrap();
/// assert_eq!(part.header.attributes, 1);
/// assert_eq!(part.gates[0].pin_count, 2);
/// ```
#[derive(Debug, Clone)]
pub struct PartTypeBuilder<'a> {
    name: &'a str,
    decals: Vec<&'a str>,
    units: Units,
    logic_family: &'a str,
    timestamp: Option<Timestamp>,
    attributes: Vec<Attribute<'a>>,
    gates: Vec<Gate<'a>>,
    signal_pins: Vec<SignalPin<'a>>,
    flags: u32,
}

impl<'a> PartTypeBuilder<'a> {
    pub fn new(name: &'a str, decal: &'a str) -> Self {
        Self {
            name,
            decals: vec![decal],
            units: Units::Imperial,
            logic_family: "UND",
            timestamp: None,
            attributes: vec![],
            gates: vec![],
            signal_pins: vec![],
            flags: 0,
        }
    }

    pub fn alternate_decal(mut self, decal: &'a str) -> Self {
        self.decals.push(decal);
        self
    }

    pub fn units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn logic_family(mut self, logic_family: &'a str) -> Self {
        self.logic_family = logic_family;
        self
    }

    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Appends an attribute; an existing attribute of the same name is replaced in place
    pub fn attribute(mut self, name: &'a str, value: &'a str) -> Self {
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
        self
    }

    pub fn gate(self, decal: &'a str, pins: impl IntoIterator<Item = Pin<'a>>) -> Self {
        self.swappable_gate(decal, 0, pins)
    }

    pub fn swappable_gate(
        mut self,
        decal: &'a str,
        swap: u32,
        pins: impl IntoIterator<Item = Pin<'a>>,
    ) -> Self {
        let pins: Vec<_> = pins.into_iter().collect();
        self.gates.push(Gate {
            decal_count: 1,
            pin_count: pins.len() as u32,
            swap,
            decals: vec![decal],
            pins,
        });
        self
    }

    pub fn signal_pin(mut self, num: &'a str, width: u32, signal: &'a str) -> Self {
        self.signal_pins.push(SignalPin {
            num: PinNum(num),
            width,
            signal,
        });
        self
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn build(self) -> Result<PartType<'a>, BuildError> {
        word("part name", self.name)?;
        for decal in &self.decals {
            word("decal", decal)?;
            if decal.contains(':') {
                return Err(BuildError::InvalidToken {
                    field: "decal",
                    value: decal.to_string(),
                });
            }
        }
        word("logic family", self.logic_family)?;
        for attr in &self.attributes {
            attribute(attr)?;
        }
        for gate in &self.gates {
            for decal in &gate.decals {
                word("gate decal", decal)?;
            }
            for pin in &gate.pins {
                pin_number(pin.num)?;
                word("pin name", pin.name)?;
            }
        }
        for pin in &self.signal_pins {
            pin_number(pin.num)?;
            word("signal name", pin.signal)?;
        }

        let mut part = PartType {
            name: self.name,
            decals: self.decals,
            units: self.units,
            logic_family: self.logic_family,
            header: HeaderCounts::default(),
            timestamp: self.timestamp,
            attributes: self.attributes,
            gates: self.gates,
            signal_pins: self.signal_pins,
        };
        part.header = HeaderCounts {
            attributes: part.attributes.len() as u32,
            gates: part.gates.len() as u32,
            signal_pins: part.signal_pins.len() as u32,
            alphanumeric_pins: Some(part.alphanumeric_pin_count() as u32),
            flags: Some(self.flags),
        };
        Ok(part)
    }
}
