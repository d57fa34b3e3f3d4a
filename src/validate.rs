//! Structural checks on parsed part type records.
//!
//! The parser accepts anything that has the shape of a part type library;
//! whether the declared counts agree with what is actually listed, pin numbers
//! are unique and the expected metadata is filled in is decided here.

use std::collections::HashSet;
use std::fmt::Display;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{ConfigError, Library, PartType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    GatePinCount,
    GateDecalCount,
    GateCount,
    SignalPinCount,
    AttributeCount,
    UniquePinNumber,
    RequiredAttribute,
    DuplicateAttribute,
    AlphanumericPinCount,
    MissingTimestamp,
    LinkAttribute,
    FormatLine,
    EmptyLibrary,
}

impl Rule {
    pub const ALL: [Rule; 13] = [
        Rule::GatePinCount,
        Rule::GateDecalCount,
        Rule::GateCount,
        Rule::SignalPinCount,
        Rule::AttributeCount,
        Rule::UniquePinNumber,
        Rule::RequiredAttribute,
        Rule::DuplicateAttribute,
        Rule::AlphanumericPinCount,
        Rule::MissingTimestamp,
        Rule::LinkAttribute,
        Rule::FormatLine,
        Rule::EmptyLibrary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Rule::GatePinCount => "gate-pin-count",
            Rule::GateDecalCount => "gate-decal-count",
            Rule::GateCount => "gate-count",
            Rule::SignalPinCount => "signal-pin-count",
            Rule::AttributeCount => "attribute-count",
            Rule::UniquePinNumber => "unique-pin-number",
            Rule::RequiredAttribute => "required-attribute",
            Rule::DuplicateAttribute => "duplicate-attribute",
            Rule::AlphanumericPinCount => "alphanumeric-pin-count",
            Rule::MissingTimestamp => "missing-timestamp",
            Rule::LinkAttribute => "link-attribute",
            Rule::FormatLine => "format-line",
            Rule::EmptyLibrary => "empty-library",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Rule::GatePinCount => "GATE pin count equals the number of pin lines under it",
            Rule::GateDecalCount => "GATE decal count equals the number of decal name lines",
            Rule::GateCount => "Header gate count equals the number of GATE sections",
            Rule::SignalPinCount => "Header signal pin count equals the number of SIGPIN lines",
            Rule::AttributeCount => "Header attribute count equals the number of attribute lines",
            Rule::UniquePinNumber => "Every pin number appears once per part",
            Rule::RequiredAttribute => "Configured attributes are present and non-empty",
            Rule::DuplicateAttribute => "Attribute names appear once per part",
            Rule::AlphanumericPinCount => {
                "Header alphanumeric pin count equals the number of non-numeric pin numbers"
            }
            Rule::MissingTimestamp => "Part carries a TIMESTAMP line",
            Rule::LinkAttribute => "Link and Price/Stock attributes hold http(s) URLs",
            Rule::FormatLine => "File starts with a PADS-LIBRARY-PART-TYPES format line",
            Rule::EmptyLibrary => "Library holds at least one part type",
        }
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub rule: Rule,
    /// Part type the issue belongs to, `None` for library level issues
    pub part: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ValidationStats {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
    pub stats: ValidationStats,
}

impl ValidationReport {
    fn new(issues: Vec<Issue>) -> Self {
        let mut stats = ValidationStats::default();
        for issue in &issues {
            match issue.severity {
                Severity::Error => stats.errors += 1,
                Severity::Warning => stats.warnings += 1,
                Severity::Info => stats.infos += 1,
            }
        }
        Self { issues, stats }
    }

    pub fn has_errors(&self) -> bool {
        self.stats.errors > 0
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.issues.iter().map(|issue| issue.severity).max()
    }

    pub fn by_rule(&self, rule: Rule) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |issue| issue.rule == rule)
    }
}

/// Options for validation runs, loadable from a JSON file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    pub required_attributes: Vec<String>,
    /// Treat attribute count mismatches as errors
    pub strict: bool,
    pub disabled_rules: Vec<Rule>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            required_attributes: vec![
                "Manufacturer_Name".to_owned(),
                "Manufacturer_Part_Number".to_owned(),
                "Description".to_owned(),
            ],
            strict: false,
            disabled_rules: vec![],
        }
    }
}

impl ValidationOptions {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Validator {
    options: ValidationOptions,
}

struct Issues<'o> {
    options: &'o ValidationOptions,
    part: Option<String>,
    issues: Vec<Issue>,
}

impl Issues<'_> {
    fn push(&mut self, rule: Rule, severity: Severity, message: String) {
        if self.options.disabled_rules.contains(&rule) {
            return;
        }
        trace!(%rule, %severity, %message, "issue");
        self.issues.push(Issue {
            severity,
            rule,
            part: self.part.clone(),
            message,
        });
    }
}

impl Validator {
    pub fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    pub fn validate(&self, library: &Library) -> ValidationReport {
        let mut issues = Issues {
            options: &self.options,
            part: None,
            issues: vec![],
        };

        match library.format {
            Some(format) if format.starts_with("PADS-LIBRARY-PART-TYPES") => {}
            Some(format) => issues.push(
                Rule::FormatLine,
                Severity::Info,
                format!("Format line *{}* is not a part type library header", format),
            ),
            None => issues.push(
                Rule::FormatLine,
                Severity::Info,
                "No format line".to_owned(),
            ),
        }
        if library.parts.is_empty() {
            issues.push(
                Rule::EmptyLibrary,
                Severity::Error,
                "Library holds no part types".to_owned(),
            );
        }

        for part in &library.parts {
            issues.part = Some(part.name.to_owned());
            self.check_part(part, &mut issues);
        }

        let report = ValidationReport::new(issues.issues);
        debug!(
            parts = library.parts.len(),
            errors = report.stats.errors,
            warnings = report.stats.warnings,
            "validated library"
        );
        report
    }

    fn check_part(&self, part: &PartType, issues: &mut Issues) {
        self.check_counts(part, issues);
        self.check_pins(part, issues);
        self.check_attributes(part, issues);

        if part.timestamp.is_none() {
            issues.push(
                Rule::MissingTimestamp,
                Severity::Warning,
                "No TIMESTAMP line".to_owned(),
            );
        }
    }

    fn check_counts(&self, part: &PartType, issues: &mut Issues) {
        let header = &part.header;

        for (i, gate) in part.gates.iter().enumerate() {
            let index = i + 1;
            if gate.pin_count as usize != gate.pins.len() {
                issues.push(
                    Rule::GatePinCount,
                    Severity::Error,
                    format!(
                        "Gate {} declares {} pins but lists {}",
                        index,
                        gate.pin_count,
                        gate.pins.len()
                    ),
                );
            }
            if gate.decal_count as usize != gate.decals.len() {
                issues.push(
                    Rule::GateDecalCount,
                    Severity::Error,
                    format!(
                        "Gate {} declares {} decals but lists {}",
                        index,
                        gate.decal_count,
                        gate.decals.len()
                    ),
                );
            }
        }

        if header.gates as usize != part.gates.len() {
            issues.push(
                Rule::GateCount,
                Severity::Error,
                format!(
                    "Header declares {} gates but {} are listed",
                    header.gates,
                    part.gates.len()
                ),
            );
        }
        if header.signal_pins as usize != part.signal_pins.len() {
            issues.push(
                Rule::SignalPinCount,
                Severity::Error,
                format!(
                    "Header declares {} signal pins but {} are listed",
                    header.signal_pins,
                    part.signal_pins.len()
                ),
            );
        }
        if header.attributes as usize != part.attributes.len() {
            let severity = if self.options.strict {
                Severity::Error
            } else {
                Severity::Warning
            };
            issues.push(
                Rule::AttributeCount,
                severity,
                format!(
                    "Header declares {} attributes but {} are listed",
                    header.attributes,
                    part.attributes.len()
                ),
            );
        }
        if let Some(alpha) = header.alphanumeric_pins {
            let found = part.alphanumeric_pin_count();
            if alpha as usize != found {
                issues.push(
                    Rule::AlphanumericPinCount,
                    Severity::Warning,
                    format!(
                        "Header declares {} alphanumeric pins but {} are listed",
                        alpha, found
                    ),
                );
            }
        }
    }

    fn check_pins(&self, part: &PartType, issues: &mut Issues) {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let nums = part
            .pins()
            .map(|pin| pin.num)
            .chain(part.signal_pins.iter().map(|pin| pin.num));
        for num in nums {
            if !seen.insert(num) && reported.insert(num) {
                issues.push(
                    Rule::UniquePinNumber,
                    Severity::Error,
                    format!("Pin number {} is used more than once", num),
                );
            }
        }
    }

    fn check_attributes(&self, part: &PartType, issues: &mut Issues) {
        for name in &self.options.required_attributes {
            match part.attribute(name) {
                None => issues.push(
                    Rule::RequiredAttribute,
                    Severity::Error,
                    format!("Missing attribute \"{}\"", name),
                ),
                Some(value) if value.trim().is_empty() => issues.push(
                    Rule::RequiredAttribute,
                    Severity::Error,
                    format!("Attribute \"{}\" is empty", name),
                ),
                Some(_) => {}
            }
        }

        let mut seen = HashSet::new();
        for attr in &part.attributes {
            if !seen.insert(attr.name) {
                issues.push(
                    Rule::DuplicateAttribute,
                    Severity::Warning,
                    format!("Attribute \"{}\" is listed more than once", attr.name),
                );
            }
            let is_link = attr.name.ends_with("Link") || attr.name.ends_with("Price/Stock");
            if is_link
                && !attr.value.is_empty()
                && !(attr.value.starts_with("http://") || attr.value.starts_with("https://"))
            {
                issues.push(
                    Rule::LinkAttribute,
                    Severity::Warning,
                    format!("Attribute \"{}\" is not an http(s) URL", attr.name),
                );
            }
        }
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

    fn validate(input: &str, options: ValidationOptions) -> ValidationReport {
        let lib = Library::parse(input).unwrap();
        Validator::new(options).validate(&lib)
    }

    #[test]
    fn eeprom_is_clean() {
        let report = validate(&test_data!("24LC256-I_SN.p"), ValidationOptions::default());
        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(report.max_severity(), None);
    }

    #[test]
    fn library_only_misses_a_timestamp() {
        let report = validate(&test_data!("library.p"), ValidationOptions::default());
        assert_eq!(report.issues.len(), 1);
        let issue = &report.issues[0];
        assert_eq!(issue.rule, Rule::MissingTimestamp);
        assert_eq!(issue.part.as_deref(), Some("TPS62840YBGR"));
        assert_eq!(report.max_severity(), Some(Severity::Warning));
    }

    #[rstest]
    #[case(Rule::AttributeCount, Severity::Warning, "Header declares 4 attributes but 5 are listed")]
    #[case(Rule::GateCount, Severity::Error, "Header declares 2 gates but 1 are listed")]
    #[case(Rule::SignalPinCount, Severity::Error, "Header declares 1 signal pins but 0 are listed")]
    #[case(Rule::GatePinCount, Severity::Error, "Gate 1 declares 8 pins but lists 7")]
    #[case(Rule::UniquePinNumber, Severity::Error, "Pin number 6 is used more than once")]
    #[case(Rule::RequiredAttribute, Severity::Error, "Attribute \"Description\" is empty")]
    #[case(Rule::DuplicateAttribute, Severity::Warning, "Attribute \"Manufacturer_Name\" is listed more than once")]
    #[case(Rule::LinkAttribute, Severity::Warning, "Attribute \"Datasheet Link\" is not an http(s) URL")]
    #[case(Rule::MissingTimestamp, Severity::Warning, "No TIMESTAMP line")]
    fn bad_counts_issues(#[case] rule: Rule, #[case] severity: Severity, #[case] message: &str) {
        let report = validate(&test_data!("bad_counts.p"), ValidationOptions::default());
        let issues: Vec<_> = report.by_rule(rule).collect();
        assert_eq!(issues.len(), 1, "{:?}", report.issues);
        assert_eq!(issues[0].severity, severity);
        assert_eq!(issues[0].message, message);
        assert_eq!(issues[0].part.as_deref(), Some("24LC256-I_SN"));
    }

    #[test]
    fn bad_counts_stats() {
        let report = validate(&test_data!("bad_counts.p"), ValidationOptions::default());
        assert_eq!(
            report.stats,
            ValidationStats {
                errors: 5,
                warnings: 4,
                infos: 0
            }
        );
        assert!(report.has_errors());
    }

    #[test]
    fn strict_mode_promotes_attribute_count() {
        let options = ValidationOptions {
            strict: true,
            ..Default::default()
        };
        let report = validate(&test_data!("bad_counts.p"), options);
        let issue = report.by_rule(Rule::AttributeCount).next().unwrap();
        assert_eq!(issue.severity, Severity::Error);
    }

    #[test]
    fn disabled_rules_are_skipped() {
        let options = ValidationOptions {
            disabled_rules: vec![Rule::UniquePinNumber, Rule::MissingTimestamp],
            ..Default::default()
        };
        let report = validate(&test_data!("bad_counts.p"), options);
        assert_eq!(report.by_rule(Rule::UniquePinNumber).count(), 0);
        assert_eq!(report.by_rule(Rule::MissingTimestamp).count(), 0);
        assert_eq!(report.stats.errors, 4);
    }

    #[test]
    fn missing_required_attribute() {
        let options = ValidationOptions {
            required_attributes: vec!["Datasheet Link".to_owned()],
            ..Default::default()
        };
        let report = validate(&test_data!("library.p"), options);
        let issues: Vec<_> = report.by_rule(Rule::RequiredAttribute).collect();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].message, "Missing attribute \"Datasheet Link\"");
    }

    #[test]
    fn signal_pins_share_the_pin_number_space() {
        let input = "P DECAL I UND 0 1 1 0 0\nTIMESTAMP 2024.01.01.00.00.00\nGATE 1 1 0\nP\n1 0 L IN\nSIGPIN 1 12 VCC\n\n*END*\n";
        let options = ValidationOptions {
            required_attributes: vec![],
            ..Default::default()
        };
        let report = validate(input, options);
        let issues: Vec<_> = report.by_rule(Rule::UniquePinNumber).collect();
        assert_eq!(issues.len(), 1);
        assert_eq!(report.by_rule(Rule::FormatLine).count(), 1);
    }

    #[test]
    fn alphanumeric_and_decal_counts() {
        let input = "*PADS-LIBRARY-PART-TYPES-V9*\n\nP DECAL I UND 0 1 0 0 0\nTIMESTAMP 2024.01.01.00.00.00\nGATE 2 2 0\nP\nA1 0 L IN\nA2 0 S OUT\n\n*END*\n";
        let options = ValidationOptions {
            required_attributes: vec![],
            ..Default::default()
        };
        let report = validate(input, options);
        assert_eq!(report.issues.len(), 2, "{:?}", report.issues);
        assert_eq!(
            report.by_rule(Rule::AlphanumericPinCount).next().unwrap().message,
            "Header declares 0 alphanumeric pins but 2 are listed"
        );
        assert_eq!(
            report.by_rule(Rule::GateDecalCount).next().unwrap().message,
            "Gate 1 declares 2 decals but lists 1"
        );
    }

    #[test]
    fn empty_library() {
        let report = validate("*PADS-LIBRARY-PART-TYPES-V9*\n\n*END*\n", ValidationOptions::default());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].rule, Rule::EmptyLibrary);
        assert_eq!(report.issues[0].part, None);
    }

    #[test]
    fn options_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(
            &path,
            r#"{"required_attributes": ["Description"], "disabled_rules": ["missing-timestamp"]}"#,
        )
        .unwrap();
        let options = ValidationOptions::from_json_file(&path).unwrap();
        assert_eq!(options.required_attributes, vec!["Description"]);
        assert!(!options.strict);
        assert_eq!(options.disabled_rules, vec![Rule::MissingTimestamp]);
    }

    #[test]
    fn options_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            ValidationOptions::from_json_file(&missing),
            Err(ConfigError::Read { .. })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"strict": "yes"}"#).unwrap();
        assert!(matches!(
            ValidationOptions::from_json_file(&bad),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn rule_names_match_serde_names() {
        for rule in Rule::ALL {
            let json = serde_json::to_string(&rule).unwrap();
            assert_eq!(json, format!("\"{}\"", rule.name()));
        }
    }
}
