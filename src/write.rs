use std::fmt::{Display, Formatter, Result};

use crate::{Gate, Library, PartType, Remark};

fn write_part(f: &mut Formatter<'_>, part: &PartType, eol: &str) -> Result {
    let header = &part.header;
    write!(
        f,
        "{} {} {} {} {} {} {}",
        part.name,
        part.decals.join(":"),
        part.units.code(),
        part.logic_family,
        header.attributes,
        header.gates,
        header.signal_pins
    )?;
    if let Some(alpha) = header.alphanumeric_pins {
        write!(f, " {}", alpha)?;
        if let Some(flags) = header.flags {
            write!(f, " {}", flags)?;
        }
    }
    f.write_str(eol)?;

    if let Some(ts) = part.timestamp {
        write!(f, "TIMESTAMP {}{}", ts, eol)?;
    }
    for attr in &part.attributes {
        if attr.value.is_empty() {
            write!(f, "\"{}\"{}", attr.name, eol)?;
        } else {
            write!(f, "\"{}\" {}{}", attr.name, attr.value, eol)?;
        }
    }
    for gate in &part.gates {
        write_gate(f, gate, eol)?;
    }
    for pin in &part.signal_pins {
        write!(f, "SIGPIN {} {} {}{}", pin.num, pin.width, pin.signal, eol)?;
    }
    Ok(())
}

fn write_gate(f: &mut Formatter<'_>, gate: &Gate, eol: &str) -> Result {
    write!(
        f,
        "GATE {} {} {}{}",
        gate.decal_count, gate.pin_count, gate.swap, eol
    )?;
    for decal in &gate.decals {
        write!(f, "{}{}", decal, eol)?;
    }
    for pin in &gate.pins {
        write!(
            f,
            "{} {} {} {}{}",
            pin.num,
            pin.swap_group,
            pin.typ.code(),
            pin.name,
            eol
        )?;
    }
    Ok(())
}

fn write_remark(f: &mut Formatter<'_>, remark: &Remark, eol: &str) -> Result {
    f.write_str("*REMARK*")?;
    if !remark.text.is_empty() {
        write!(f, " {}", remark.text)?;
    }
    f.write_str(eol)?;
    for line in &remark.lines {
        write!(f, "{}{}", line, eol)?;
    }
    Ok(())
}

impl<'a> Display for PartType<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write_part(f, self, "\n")
    }
}

impl<'a> Display for Library<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let eol = self.line_ending.as_str();
        if let Some(format) = self.format {
            write!(f, "*{}*{}{}", format, eol, eol)?;
        }
        for part in &self.parts {
            write_part(f, part, eol)?;
            f.write_str(eol)?;
        }
        write!(f, "*END*{}", eol)?;
        if let Some(remark) = &self.remark {
            write_remark(f, remark, eol)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    macro_rules! test_data {
        ($fname:expr) => {
            std::fs::read_to_string(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/resources/test/",
                $fname
            ))
            .unwrap()
        };
    }

    #[rstest]
    #[case(test_data!("24LC256-I_SN.p"))]
    #[case(test_data!("library.p"))]
    #[case(test_data!("24LC256-I_SN.p").replace('\n', "\r\n"))]
    fn canonical_files_are_written_back_unchanged(#[case] input: String) {
        let lib = Library::parse(&input).unwrap();
        assert_eq!(lib.to_string(), input);
    }

    #[test]
    fn remark_trailer_is_written_back_verbatim() {
        let input = format!(
            "{}  810563/105269/2.49/8/4/Integrated Circuit\t\n\n\tSamacSys  2024\n",
            test_data!("24LC256-I_SN.p")
        );
        let lib = Library::parse(&input).unwrap();
        assert_eq!(lib.to_string(), input);
    }

    #[test]
    fn free_text_attribute_is_written_back_verbatim() {
        let input = test_data!("24LC256-I_SN.p").replace(
            "\"Geometry.Height\" 1.75mm",
            "\"Geometry.Height\" 0.069\" \"approx",
        );
        let lib = Library::parse(&input).unwrap();
        assert_eq!(
            lib.parts[0].attribute("Geometry.Height"),
            Some("0.069\" \"approx")
        );
        assert_eq!(lib.to_string(), input);
    }

    #[test]
    fn loose_spacing_is_normalized() {
        let input = "\n\nP  DECAL\tI UND 1 1 0\n\"Key\"   some  value\nGATE 1 1 0\nP\n1 0 P VCC  \n\n\n*END*\n*REMARK*\n";
        let lib = Library::parse(input).unwrap();
        assert_eq!(
            lib.to_string(),
            "P DECAL I UND 1 1 0\n\"Key\" some  value\nGATE 1 1 0\nP\n1 0 P VCC\n\n*END*\n*REMARK*\n"
        );
    }

    #[test]
    fn empty_attribute_value() {
        let input = "P DECAL I UND 1 1 0\n\"Key\"\nGATE 1 1 0\nP\n1 0 P VCC\n\n*END*\n";
        let lib = Library::parse(input).unwrap();
        assert_eq!(lib.parts[0].attributes[0].value, "");
        assert_eq!(lib.to_string(), input);
    }

    #[test]
    fn part_display_uses_lf() {
        let input = test_data!("24LC256-I_SN.p").replace('\n', "\r\n");
        let lib = Library::parse(&input).unwrap();
        let text = lib.parts[0].to_string();
        assert!(text.starts_with("24LC256-I_SN SOIC127P600X175-8N I UND 9 1 0 0 0\n"));
        assert!(!text.contains('\r'));
        assert!(text.ends_with("8 0 U VCC\n"));
    }
}
