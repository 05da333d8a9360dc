use crate::model::{Field, PlaceholderMap};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

// Priority order matters: the first syntax that matches a field wins.
static SYNTAX_PATTERNS: Lazy<Vec<(Field, Regex)>> = Lazy::new(|| {
    let specs: &[(Field, &str)] = &[
        // {{name}}
        (Field::FirstName, r"\{\{(firstName|first_name|prenom|prénom)\}\}"),
        (Field::LastName, r"\{\{(lastName|last_name|nom)\}\}"),
        (Field::Title, r"\{\{(title|jobTitle|job_title|titre|position)\}\}"),
        (
            Field::Company,
            r"\{\{(company|organization|organisation|société|societe|entreprise)\}\}",
        ),
        (Field::Location, r"\{\{(location|lieu|city|ville|country|pays)\}\}"),
        (Field::BadgeType, r"\{\{(badgeType|badge_type|type|role|category)\}\}"),
        // ${name}
        (Field::FirstName, r"\$\{(firstName|first_name)\}"),
        (Field::LastName, r"\$\{(lastName|last_name)\}"),
        (Field::Title, r"\$\{(title|jobTitle|job_title)\}"),
        (Field::Company, r"\$\{(company|organization)\}"),
        (Field::Location, r"\$\{(location|city|country)\}"),
        (Field::BadgeType, r"\$\{(badgeType|badge_type|type)\}"),
        // %name%
        (Field::FirstName, r"%(firstName|first_name)%"),
        (Field::LastName, r"%(lastName|last_name)%"),
        (Field::Title, r"%(title|jobTitle|job_title)%"),
        (Field::Company, r"%(company|organization)%"),
        (Field::Location, r"%(location|city|country)%"),
        (Field::BadgeType, r"%(badgeType|badge_type|type)%"),
        // [NAME]
        (Field::FirstName, r"\[(FIRSTNAME|FIRST_NAME|PRENOM)\]"),
        (Field::LastName, r"\[(LASTNAME|LAST_NAME|NOM)\]"),
        (Field::Title, r"\[(TITLE|JOB_TITLE|TITRE)\]"),
        (Field::Company, r"\[(COMPANY|ORGANIZATION|ORGANISATION)\]"),
        (Field::Location, r"\[(LOCATION|LIEU|CITY|VILLE)\]"),
        (Field::BadgeType, r"\[(BADGE_TYPE|TYPE|ROLE)\]"),
    ];
    specs
        .iter()
        .map(|(field, pattern)| (*field, Regex::new(&format!("(?i){pattern}")).unwrap()))
        .collect()
});

// Bare label text sitting alone inside an element, e.g. `<tspan>First Name</tspan>`.
static LABEL_PATTERNS: Lazy<Vec<(Field, Regex)>> = Lazy::new(|| {
    let specs: &[(Field, &str)] = &[
        (Field::FirstName, r">(First\s*Name)<"),
        (Field::LastName, r">(Last\s*Name)<"),
        (Field::FirstName, r">(Your\s*Name)<"),
        (Field::FirstName, r">(Full\s*Name)<"),
        (Field::Title, r">(Job\s*Title)<"),
        (Field::Title, r">(Title)<"),
        (Field::Company, r">(Company)<"),
        (Field::Company, r">(Organization)<"),
        (Field::Location, r">(Location)<"),
        (Field::BadgeType, r">(Badge\s*Type)<"),
        (Field::BadgeType, r">(Type)<"),
    ];
    specs
        .iter()
        .map(|(field, pattern)| (*field, Regex::new(&format!("(?i){pattern}")).unwrap()))
        .collect()
});

/// Scans a custom template for placeholders. Always starts from an empty map, so
/// running it twice on the same body gives the same result.
pub fn detect(template: &str) -> PlaceholderMap {
    let mut map = PlaceholderMap::default();

    for (field, re) in SYNTAX_PATTERNS.iter() {
        if !map.get(*field).is_empty() {
            continue;
        }
        if let Some(found) = re.find(template) {
            map.set(*field, found.as_str());
        }
    }

    for (field, re) in LABEL_PATTERNS.iter() {
        if !map.get(*field).is_empty() {
            continue;
        }
        if let Some(caps) = re.captures(template) {
            map.set(*field, &caps[1]);
        }
    }

    debug!("detected placeholders: {map:?}");
    map
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    NoneDefined,
    NoneFound,
    Partial,
    AllFound,
}

/// Which defined placeholders actually occur in a template body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub found: Vec<Field>,
    pub missing: Vec<Field>,
}

impl ValidationReport {
    pub fn defined(&self) -> usize {
        self.found.len() + self.missing.len()
    }

    pub fn status(&self) -> ValidationStatus {
        match (self.found.len(), self.missing.len()) {
            (0, 0) => ValidationStatus::NoneDefined,
            (0, _) => ValidationStatus::NoneFound,
            (_, 0) => ValidationStatus::AllFound,
            _ => ValidationStatus::Partial,
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status() {
            ValidationStatus::NoneDefined => write!(
                f,
                "No placeholders defined. Enter the text to replace from your SVG."
            ),
            ValidationStatus::NoneFound => write!(
                f,
                "None of the placeholders were found in the SVG. Check the text values."
            ),
            ValidationStatus::Partial => write!(
                f,
                "{} placeholder(s) applied. {} not found in SVG.",
                self.found.len(),
                self.missing.len()
            ),
            ValidationStatus::AllFound => {
                write!(f, "{} placeholder(s) applied successfully!", self.defined())
            }
        }
    }
}

/// Checks each non-empty placeholder for literal containment in `template`.
pub fn validate(map: &PlaceholderMap, template: &str) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (field, placeholder) in map.defined() {
        if template.contains(placeholder) {
            report.found.push(field);
        } else {
            report.missing.push(field);
        }
    }
    report
}
