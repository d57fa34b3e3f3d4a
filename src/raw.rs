//! Untyped part type records borrowed straight from the input text.

mod lexer;
mod parser;

use crate::error::Span;

/// A full part type library file
#[derive(Debug, Clone)]
pub struct Library<'a> {
    /// Format line without its asterisks, e.g. `PADS-LIBRARY-PART-TYPES-V9`
    pub format: Option<&'a str>,
    pub parts: Vec<PartType<'a>>,
    pub remark: Option<Remark<'a>>,
    /// `"\n"` or `"\r\n"`, taken from the first line break of the input
    pub line_ending: &'static str,
}

/// One part type record
#[derive(Debug, Clone)]
pub struct PartType<'a> {
    pub name: &'a str,
    /// Colon separated list of PCB decals
    pub decals: &'a str,
    pub units: &'a str,
    pub logic_family: &'a str,
    /// Attribute, gate, signal pin, alphanumeric pin and flag counts; the last two may be absent
    pub counts: Vec<&'a str>,
    /// Timestamp text and the span of its line
    pub timestamp: Option<(&'a str, Span)>,
    pub attributes: Vec<(&'a str, &'a str)>,
    pub gates: Vec<Gate<'a>>,
    pub signal_pins: Vec<SignalPin<'a>>,
    /// Header line
    pub span: Span,
}

/// A gate and the pins listed under it
#[derive(Debug, Clone)]
pub struct Gate<'a> {
    pub decal_count: &'a str,
    pub pin_count: &'a str,
    pub swap: &'a str,
    pub decals: Vec<&'a str>,
    pub pins: Vec<Pin<'a>>,
    /// GATE line
    pub span: Span,
}

/// An individual pin line
#[derive(Debug, Clone)]
pub struct Pin<'a> {
    pub num: &'a str,
    pub group: &'a str,
    pub typ: &'a str,
    pub name: &'a str,
    pub span: Span,
}

/// A pin tied to a named signal outside of any gate
#[derive(Debug, Clone)]
pub struct SignalPin<'a> {
    pub num: &'a str,
    pub width: &'a str,
    pub signal: &'a str,
    pub span: Span,
}

/// The `*REMARK*` trailer
#[derive(Debug, Clone)]
pub struct Remark<'a> {
    /// Text on the `*REMARK*` line itself
    pub text: &'a str,
    /// Any following lines, verbatim
    pub lines: Vec<&'a str>,
}
