use chrono::NaiveDateTime;

use crate::{
    raw, Attribute, Gate, HeaderCounts, LineEnding, Library, ParseError, PartType, Pin, PinNum,
    PinType, Remark, SignalPin, Timestamp, Units,
};

fn number(value: &str) -> Result<u32, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        found: value.to_owned(),
        at: None,
    })
}

impl TryFrom<&str> for PinType {
    type Error = ParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "S" => Ok(Self::Source),
            "B" => Ok(Self::Bidirectional),
            "C" => Ok(Self::OpenCollector),
            "O" => Ok(Self::OrTieable),
            "T" => Ok(Self::TriState),
            "L" => Ok(Self::Load),
            "Z" => Ok(Self::Terminator),
            "P" => Ok(Self::Power),
            "G" => Ok(Self::Ground),
            "U" => Ok(Self::Undefined),
            s => Err(ParseError::UnknownPinType {
                found: s.to_owned(),
                at: None,
            }),
        }
    }
}

impl TryFrom<&str> for Units {
    type Error = ParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "I" => Ok(Self::Imperial),
            "M" => Ok(Self::Metric),
            s => Err(ParseError::UnknownUnits {
                found: s.to_owned(),
                at: None,
            }),
        }
    }
}

impl TryFrom<&str> for Timestamp {
    type Error = ParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        NaiveDateTime::parse_from_str(value, Timestamp::FORMAT)
            .map(Timestamp)
            .map_err(|_| ParseError::InvalidTimestamp {
                found: value.to_owned(),
                at: None,
            })
    }
}

impl<'a> TryFrom<raw::Pin<'a>> for Pin<'a> {
    type Error = ParseError;

    fn try_from(value: raw::Pin<'a>) -> Result<Self, Self::Error> {
        let raw::Pin {
            num,
            group,
            typ,
            name,
            span,
        } = value;
        let num = PinNum(num);
        let swap_group = number(group).map_err(|e| e.with_span(&span))?;
        let typ = PinType::try_from(typ).map_err(|e| e.with_span(&span))?;
        Ok(Pin {
            num,
            swap_group,
            typ,
            name,
        })
    }
}

impl<'a> TryFrom<raw::SignalPin<'a>> for SignalPin<'a> {
    type Error = ParseError;

    fn try_from(value: raw::SignalPin<'a>) -> Result<Self, Self::Error> {
        let raw::SignalPin {
            num,
            width,
            signal,
            span,
        } = value;
        Ok(SignalPin {
            num: PinNum(num),
            width: number(width).map_err(|e| e.with_span(&span))?,
            signal,
        })
    }
}

impl<'a> TryFrom<raw::Gate<'a>> for Gate<'a> {
    type Error = ParseError;

    fn try_from(value: raw::Gate<'a>) -> Result<Self, Self::Error> {
        let raw::Gate {
            decal_count,
            pin_count,
            swap,
            decals,
            pins,
            span,
        } = value;
        let pins = pins
            .into_iter()
            .map(|pin| pin.try_into())
            .collect::<Result<_, _>>()?;
        let count = |value| number(value).map_err(|e| e.with_span(&span));
        Ok(Gate {
            decal_count: count(decal_count)?,
            pin_count: count(pin_count)?,
            swap: count(swap)?,
            decals,
            pins,
        })
    }
}

impl TryFrom<&[&str]> for HeaderCounts {
    type Error = ParseError;

    fn try_from(value: &[&str]) -> Result<Self, Self::Error> {
        let count = |i: usize| value.get(i).map(|v| number(v)).transpose();
        let required = |i: usize| {
            count(i)?.ok_or_else(|| ParseError::InvalidNumber {
                found: String::new(),
                at: None,
            })
        };
        Ok(HeaderCounts {
            attributes: required(0)?,
            gates: required(1)?,
            signal_pins: required(2)?,
            alphanumeric_pins: count(3)?,
            flags: count(4)?,
        })
    }
}

impl<'a> TryFrom<raw::PartType<'a>> for PartType<'a> {
    type Error = ParseError;

    fn try_from(value: raw::PartType<'a>) -> Result<Self, Self::Error> {
        let raw::PartType {
            name,
            decals,
            units,
            logic_family,
            counts,
            timestamp,
            attributes,
            gates,
            signal_pins,
            span,
        } = value;

        let decals = decals.split(':').collect();
        let units = Units::try_from(units).map_err(|e| e.with_span(&span))?;
        let header =
            HeaderCounts::try_from(counts.as_slice()).map_err(|e| e.with_span(&span))?;
        let timestamp = timestamp
            .map(|(ts, span)| Timestamp::try_from(ts).map_err(|e| e.with_span(&span)))
            .transpose()?;
        let attributes = attributes
            .into_iter()
            .map(|(name, value)| Attribute { name, value })
            .collect();
        let gates = gates
            .into_iter()
            .map(|gate| gate.try_into())
            .collect::<Result<_, _>>()?;
        let signal_pins = signal_pins
            .into_iter()
            .map(|pin| pin.try_into())
            .collect::<Result<_, _>>()?;

        Ok(PartType {
            name,
            decals,
            units,
            logic_family,
            header,
            timestamp,
            attributes,
            gates,
            signal_pins,
        })
    }
}

impl<'a> From<raw::Remark<'a>> for Remark<'a> {
    fn from(value: raw::Remark<'a>) -> Self {
        let raw::Remark { text, lines } = value;
        Remark { text, lines }
    }
}

impl<'a> TryFrom<raw::Library<'a>> for Library<'a> {
    type Error = ParseError;

    fn try_from(value: raw::Library<'a>) -> Result<Self, Self::Error> {
        let raw::Library {
            format,
            parts,
            remark,
            line_ending,
        } = value;

        let parts = parts
            .into_iter()
            .map(|part| part.try_into())
            .collect::<Result<_, _>>()?;
        let line_ending = if line_ending == "\r\n" {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        };

        Ok(Library {
            format,
            parts,
            remark: remark.map(Remark::from),
            line_ending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("S", PinType::Source)]
    #[case("B", PinType::Bidirectional)]
    #[case("C", PinType::OpenCollector)]
    #[case("O", PinType::OrTieable)]
    #[case("T", PinType::TriState)]
    #[case("L", PinType::Load)]
    #[case("Z", PinType::Terminator)]
    #[case("P", PinType::Power)]
    #[case("G", PinType::Ground)]
    #[case("U", PinType::Undefined)]
    fn pin_type_codes(#[case] code: &str, #[case] expected: PinType) {
        assert_eq!(PinType::try_from(code).unwrap(), expected);
        assert_eq!(expected.code().to_string(), code);
    }

    #[rstest]
    #[case("X")]
    #[case("u")]
    #[case("")]
    fn unknown_pin_type(#[case] code: &str) {
        assert_eq!(
            PinType::try_from(code),
            Err(ParseError::UnknownPinType {
                found: code.to_owned(),
                at: None
            })
        );
    }

    #[test]
    fn header_counts_with_and_without_optional_fields() {
        let full = HeaderCounts::try_from(&["9", "1", "0", "0", "0"][..]).unwrap();
        assert_eq!(full.alphanumeric_pins, Some(0));
        assert_eq!(full.flags, Some(0));

        let short = HeaderCounts::try_from(&["3", "2", "2"][..]).unwrap();
        assert_eq!(short.attributes, 3);
        assert_eq!(short.gates, 2);
        assert_eq!(short.signal_pins, 2);
        assert_eq!(short.alphanumeric_pins, None);
        assert_eq!(short.flags, None);
    }

    #[test]
    fn header_counts_must_be_numbers() {
        assert_eq!(
            HeaderCounts::try_from(&["9", "one", "0"][..]),
            Err(ParseError::InvalidNumber {
                found: "one".to_owned(),
                at: None
            })
        );
    }

    #[rstest]
    #[case("2024.03.05.14.22.31", true)]
    #[case("2024.13.05.14.22.31", false)]
    #[case("2024-03-05 14:22:31", false)]
    fn timestamps(#[case] value: &str, #[case] valid: bool) {
        let ts = Timestamp::try_from(value);
        assert_eq!(ts.is_ok(), valid);
        if let Ok(ts) = ts {
            assert_eq!(ts.to_string(), value);
        }
    }

    #[rstest]
    #[case::units(
        "P DECAL X UND 0 1 0\nGATE 1 1 0\nP\n1 0 U A\n\n*END*\n",
        "Unknown units X",
        "P DECAL X UND 0 1 0"
    )]
    #[case::pin_type(
        "P DECAL I UND 0 1 0\nGATE 1 1 0\nP\n1 0 Q A\n\n*END*\n",
        "Unknown pin type Q",
        "1 0 Q A"
    )]
    #[case::gate_count(
        "P DECAL I UND 0 1 0\nGATE 1 x 0\nP\n1 0 U A\n\n*END*\n",
        "Invalid number x",
        "GATE 1 x 0"
    )]
    #[case::signal_width(
        "P DECAL I UND 0 1 1\nGATE 1 1 0\nP\n1 0 U A\nSIGPIN 2 w VCC\n\n*END*\n",
        "Invalid number w",
        "SIGPIN 2 w VCC"
    )]
    #[case::timestamp(
        "P DECAL I UND 0 1 0\nTIMESTAMP yesterday\nGATE 1 1 0\nP\n1 0 U A\n\n*END*\n",
        "Invalid timestamp yesterday",
        "TIMESTAMP yesterday"
    )]
    fn typed_errors_point_at_their_line(
        #[case] input: &str,
        #[case] message: &str,
        #[case] line: &str,
    ) {
        let err = Library::parse(input).unwrap_err();
        assert_eq!(err.to_string(), message);
        assert_eq!(&input[err.span().unwrap()], line);
    }

    #[test]
    fn typed_error_in_second_part_of_library() {
        let input = "A DECAL I UND 0 1 0\nGATE 1 1 0\nA\n1 0 U X\n\nB DECAL I UND 0 1 0\nGATE 1 1 0\nB\n1 0 K Y\n\n*END*\n";
        let err = Library::parse(input).unwrap_err();
        let (line, col) = crate::line_col(input, err.span().unwrap().start);
        assert_eq!((line, col), (9, 1));
    }
}
