//! Report rendering.
//!
//! A pure transform from a [`MergedRecord`] to what the user sees:
//! compliance rows with a clean/listed tone, the owner card and the
//! related persons. This is the only place absent fields become "N/A".

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::types::{MergedRecord, Owner};

/// Shown for every field a source did not report.
pub const NOT_AVAILABLE: &str = "N/A";

/// Format ten digits as `(555) 123-4567`.
///
/// Separators in the input are ignored; anything that does not come down
/// to exactly ten digits yields [`NOT_AVAILABLE`].
pub fn format_phone(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 10 {
        return NOT_AVAILABLE.to_string();
    }
    let part = |range: std::ops::Range<usize>| digits[range].iter().collect::<String>();
    format!("({}) {}-{}", part(0..3), part(3..6), part(6..10))
}

/// Colour hint for a status row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Clean,
    Listed,
    /// The source did not report this flag.
    Unknown,
}

impl Tone {
    /// Tone of a reported value. Absent flags are [`Tone::Unknown`].
    pub fn for_value(value: &str) -> Self {
        if value.to_lowercase().contains("clean") {
            Tone::Clean
        } else {
            Tone::Listed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRow {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<Tone>,
}

impl StatusRow {
    fn plain(label: &str, value: String) -> Self {
        Self {
            label: label.to_string(),
            value,
            tone: None,
        }
    }

    fn status(label: &str, field: &Option<Value>) -> Self {
        let (value, tone) = match field.as_ref().and_then(display_value) {
            Some(value) => {
                let tone = Tone::for_value(&value);
                (value, tone)
            }
            None => (NOT_AVAILABLE.to_string(), Tone::Unknown),
        };
        Self {
            label: label.to_string(),
            value,
            tone: Some(tone),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerCard {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_address: Option<String>,
    pub previous_addresses: Vec<String>,
}

impl OwnerCard {
    fn from_owner(owner: &Owner) -> Self {
        Self {
            name: owner.name.as_ref().and_then(display_value).unwrap_or_else(|| "Unknown".to_string()),
            age: owner.age.as_ref().and_then(display_value),
            dob: owner.dob.as_ref().and_then(display_value),
            current_address: owner.address.as_ref().and_then(format_address),
            previous_addresses: owner
                .addresses
                .iter()
                .flatten()
                .filter_map(format_address)
                .collect(),
        }
    }
}

/// Everything the presentation area shows for one successful lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub compliance: Vec<StatusRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerCard>,
    pub related_persons: Vec<String>,
}

impl Report {
    pub fn from_record(record: &MergedRecord) -> Self {
        let text = |field: &Option<Value>| {
            field
                .as_ref()
                .and_then(display_value)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };

        let phone = record
            .phone
            .as_ref()
            .and_then(display_value)
            .map_or_else(|| NOT_AVAILABLE.to_string(), |p| format_phone(&p));

        let compliance = vec![
            StatusRow::plain("Phone", phone),
            StatusRow::plain("State", text(&record.state)),
            StatusRow::status("DNC National", &record.ndnc),
            StatusRow::status("DNC State", &record.sdnc),
            StatusRow::status("Litigator", &record.litigator),
            StatusRow::status("Blacklist", &record.blacklist),
        ];

        Self {
            compliance,
            owner: record.primary_owner().map(|owner| OwnerCard::from_owner(&owner)),
            related_persons: record.related_names().iter().filter_map(display_value).collect(),
        }
    }

    pub fn row(&self, label: &str) -> Option<&StatusRow> {
        self.compliance.iter().find(|r| r.label == label)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compliance Status")?;
        for row in &self.compliance {
            let marker = match row.tone {
                Some(Tone::Clean) => " [ok]",
                Some(Tone::Listed) => " [!]",
                _ => "",
            };
            writeln!(f, "  {:<14}{}{}", format!("{}:", row.label), row.value, marker)?;
        }

        if let Some(owner) = &self.owner {
            writeln!(f)?;
            writeln!(f, "Owner Information")?;
            let mut meta = Vec::new();
            if let Some(age) = &owner.age {
                meta.push(format!("Age: {age}"));
            }
            if let Some(dob) = &owner.dob {
                meta.push(format!("DOB: {dob}"));
            }
            if meta.is_empty() {
                writeln!(f, "  {}", owner.name)?;
            } else {
                writeln!(f, "  {} ({})", owner.name, meta.join(", "))?;
            }
            if let Some(address) = &owner.current_address {
                writeln!(f, "  Current Address:  {address}")?;
            }
            for address in &owner.previous_addresses {
                writeln!(f, "  Previous Address: {address}")?;
            }
        }

        if !self.related_persons.is_empty() {
            writeln!(f)?;
            writeln!(f, "Related Persons")?;
            writeln!(f, "  {}", self.related_persons.join(" : "))?;
        }

        Ok(())
    }
}

/// Text for a scalar field. Falsy values (`""`, `false`, `0`) render as
/// absent, matching what the lookup page always showed.
fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(display_value).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Object(_) => format_address(value),
    }
}

/// Addresses arrive either as one line or as an object.
fn format_address(value: &Value) -> Option<String> {
    let Value::Object(fields) = value else {
        return display_value(value);
    };

    let get = |keys: &[&str]| {
        keys.iter()
            .filter_map(|k| fields.get(*k))
            .find_map(display_value)
    };

    let street = get(&["street", "address", "line1", "address1"]);
    let city = get(&["city"]);
    let region = [get(&["state"]), get(&["zip", "zipCode", "postalCode"])]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    let parts: Vec<String> = [street, city, (!region.is_empty()).then_some(region)]
        .into_iter()
        .flatten()
        .collect();

    if parts.is_empty() {
        (!fields.is_empty()).then(|| value.to_string())
    } else {
        Some(parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
