use crate::registry::TypeResolution;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The canonical field set a badge template can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    FirstName,
    LastName,
    Title,
    Company,
    Location,
    BadgeType,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::FirstName,
        Field::LastName,
        Field::Title,
        Field::Company,
        Field::Location,
        Field::BadgeType,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::Title => "title",
            Field::Company => "company",
            Field::Location => "location",
            Field::BadgeType => "badgeType",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Field::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown field '{wanted}'"))
    }
}

/// A normalized attendee row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeRecord {
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub company: String,
    pub ticket_title: String,
    #[serde(rename = "type")]
    pub attendee_type: String,
}

impl AttendeeRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// "Title • Company", skipping whichever part is empty.
    pub fn details(&self) -> String {
        [self.title.as_str(), self.company.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" • ")
    }
}

/// Raw (unescaped) values substituted into a badge template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BadgeFields {
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub badge_type: String,
}

impl BadgeFields {
    /// Badge values for an attendee; the badge type text is the label of `resolution`,
    /// the same resolution that picked the template.
    pub fn for_attendee(record: &AttendeeRecord, resolution: &TypeResolution, location: &str) -> Self {
        Self {
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            title: record.title.clone(),
            company: record.company.clone(),
            location: location.to_string(),
            badge_type: resolution.label.as_str().to_string(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Title => &self.title,
            Field::Company => &self.company,
            Field::Location => &self.location,
            Field::BadgeType => &self.badge_type,
        }
    }
}

/// Field → literal placeholder text. An empty string disables the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaceholderMap {
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub badge_type: String,
}

impl PlaceholderMap {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Title => &self.title,
            Field::Company => &self.company,
            Field::Location => &self.location,
            Field::BadgeType => &self.badge_type,
        }
    }

    pub fn set(&mut self, field: Field, placeholder: impl Into<String>) {
        let slot = match field {
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::Title => &mut self.title,
            Field::Company => &mut self.company,
            Field::Location => &mut self.location,
            Field::BadgeType => &mut self.badge_type,
        };
        *slot = placeholder.into();
    }

    /// Non-empty entries in canonical field order.
    pub fn defined(&self) -> impl Iterator<Item = (Field, &str)> {
        Field::ALL
            .into_iter()
            .map(|field| (field, self.get(field)))
            .filter(|(_, placeholder)| !placeholder.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_parses_case_insensitively() {
        assert_eq!("firstname".parse::<Field>(), Ok(Field::FirstName));
        assert_eq!(" badgeType ".parse::<Field>(), Ok(Field::BadgeType));
        assert!("nickname".parse::<Field>().is_err());
    }

    #[test]
    fn attendee_serializes_type_key() {
        let record = AttendeeRecord {
            first_name: "Ana".into(),
            attendee_type: "3".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["firstName"], "Ana");
        assert_eq!(json["type"], "3");
    }

    #[test]
    fn fields_for_attendee_use_resolved_label() {
        let record = AttendeeRecord {
            first_name: "Ana".into(),
            company: "Acme".into(),
            attendee_type: " VIP ".into(),
            ..Default::default()
        };
        let resolution = crate::registry::resolve_type(&record.attendee_type);
        let fields = BadgeFields::for_attendee(&record, &resolution, "Brussels");
        assert_eq!(fields.badge_type, "VIP");
        assert_eq!(fields.location, "Brussels");
        assert_eq!(fields.get(Field::Company), "Acme");
    }

    #[test]
    fn details_skips_empty_parts() {
        let record = AttendeeRecord {
            title: "CTO".into(),
            ..Default::default()
        };
        assert_eq!(record.details(), "CTO");
        let record = AttendeeRecord {
            title: "CTO".into(),
            company: "Acme".into(),
            ..Default::default()
        };
        assert_eq!(record.details(), "CTO • Acme");
    }

    #[test]
    fn placeholder_map_lists_defined_fields_in_order() {
        let mut map = PlaceholderMap::default();
        map.set(Field::Company, "{{company}}");
        map.set(Field::FirstName, "First Name");
        let defined: Vec<_> = map.defined().collect();
        assert_eq!(
            defined,
            vec![(Field::FirstName, "First Name"), (Field::Company, "{{company}}")]
        );
    }
}
