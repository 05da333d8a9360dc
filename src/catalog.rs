use crate::error::ImportError;
use crate::model::AttendeeRecord;
use serde_json::{Map, Value};

/// One imported row, keyed by whatever headers the source file used.
pub type RawRow = Map<String, Value>;

pub const SEARCH_LIMIT: usize = 10;

const FIRST_NAME_KEYS: &[&str] = &[
    "First Name", "FirstName", "first_name", "firstname", "First", "Prénom", "prenom",
];
const LAST_NAME_KEYS: &[&str] = &[
    "Last Name", "LastName", "last_name", "lastname", "Last", "Nom", "nom",
];
const TITLE_KEYS: &[&str] = &[
    "Title", "title", "Job Title", "job_title", "Position", "position", "Titre", "titre",
];
const COMPANY_KEYS: &[&str] = &[
    "Company",
    "company",
    "Organization",
    "organization",
    "Organisation",
    "Société",
    "societe",
    "Entreprise",
];
const TICKET_KEYS: &[&str] = &["Ticket title", "Ticket", "ticket", "Badge Type", "badge_type"];
const TYPE_KEYS: &[&str] = &[
    "Type",
    "type",
    "Template",
    "template",
    "Category",
    "category",
    "Participant Type",
    "participant_type",
];

/// Value of the first alias present in `row`, or an empty string.
fn lookup(row: &RawRow, aliases: &[&str]) -> String {
    aliases
        .iter()
        .find_map(|alias| row.get(*alias))
        .map(value_to_string)
        .unwrap_or_default()
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn normalize_row(row: &RawRow) -> AttendeeRecord {
    AttendeeRecord {
        first_name: lookup(row, FIRST_NAME_KEYS),
        last_name: lookup(row, LAST_NAME_KEYS),
        title: lookup(row, TITLE_KEYS),
        company: lookup(row, COMPANY_KEYS),
        ticket_title: lookup(row, TICKET_KEYS),
        attendee_type: lookup(row, TYPE_KEYS),
    }
}

/// Normalizes rows and drops those without a first or last name.
pub fn normalize(rows: &[RawRow]) -> Vec<AttendeeRecord> {
    rows.iter()
        .map(normalize_row)
        .filter(|record| !record.first_name.is_empty() || !record.last_name.is_empty())
        .collect()
}

/// The attendees of the current import. Replaced wholesale by the next import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceCatalog {
    records: Vec<AttendeeRecord>,
}

impl AttendanceCatalog {
    pub fn new(records: Vec<AttendeeRecord>) -> Self {
        Self { records }
    }

    /// Builds a catalog from raw rows; zero surviving records is an import error.
    pub fn from_rows(rows: &[RawRow]) -> Result<Self, ImportError> {
        let records = normalize(rows);
        if records.is_empty() {
            return Err(ImportError::NoValidRows);
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[AttendeeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the picker should list everyone as soon as the search box gains focus.
    pub fn shows_all_on_focus(&self) -> bool {
        self.records.len() <= SEARCH_LIMIT
    }

    pub fn search(&self, query: &str) -> Vec<&AttendeeRecord> {
        search(&self.records, query)
    }
}

/// Case-insensitive substring search over names, title and company. Results keep
/// catalog order and are capped at [`SEARCH_LIMIT`].
pub fn search<'a>(records: &'a [AttendeeRecord], query: &str) -> Vec<&'a AttendeeRecord> {
    let query = query.trim().to_lowercase();
    records
        .iter()
        .filter(|record| query.is_empty() || matches_query(record, &query))
        .take(SEARCH_LIMIT)
        .collect()
}

fn matches_query(record: &AttendeeRecord, query: &str) -> bool {
    let first = record.first_name.to_lowercase();
    let last = record.last_name.to_lowercase();
    let full = format!("{first} {last}");
    let title = record.title.to_lowercase();
    let company = record.company.to_lowercase();
    [first, last, full, title, company]
        .iter()
        .any(|haystack| haystack.contains(query))
}
