//! Shared types for the lookup pipeline.
//!
//! These types form the data model used across all modules: the
//! validated phone number, the raw per-source payload, the typed
//! merged record and the error taxonomy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

// ---------------------------------------------------------------------------
// Phone number
// ---------------------------------------------------------------------------

/// A validated US phone number: exactly ten ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validate a string that must already be exactly ten digits.
    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        if raw.is_empty() {
            return Err(LookupError::InvalidInput(InputProblem::Empty));
        }
        if raw.len() != 10 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LookupError::InvalidInput(InputProblem::NotTenDigits));
        }
        Ok(Self(raw.to_string()))
    }

    /// Accept free-form user input: strip every non-digit, then validate.
    ///
    /// `"(555) 123-4567"` and `" 555.123.4567 "` both yield `5551234567`.
    pub fn from_input(raw: &str) -> Result<Self, LookupError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LookupError::InvalidInput(InputProblem::Empty));
        }
        let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
        Self::parse(&digits).map_err(|_| LookupError::InvalidInput(InputProblem::NotTenDigits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Strategy and roles
// ---------------------------------------------------------------------------

/// How the orchestrator combines its sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Premium source first; on an unusable answer, merge the standard sources.
    #[default]
    PremiumFirst,
    /// Query every source at once and keep each answer in its own section.
    AllParallel,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::PremiumFirst => write!(f, "premium_first"),
            Strategy::AllParallel => write!(f, "all_parallel"),
        }
    }
}

/// What a source is consulted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRole {
    /// Higher-priority provider consulted before the standard ones.
    Premium,
    /// DNC / litigator / blacklist flags.
    Compliance,
    /// Owner details and related persons.
    Person,
}

impl SourceRole {
    pub fn is_standard(self) -> bool {
        matches!(self, SourceRole::Compliance | SourceRole::Person)
    }
}

impl fmt::Display for SourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRole::Premium => write!(f, "premium"),
            SourceRole::Compliance => write!(f, "compliance"),
            SourceRole::Person => write!(f, "person"),
        }
    }
}

// ---------------------------------------------------------------------------
// Source payloads
// ---------------------------------------------------------------------------

/// The JSON object one source answered with. Keys are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SourcePayload(Map<String, Value>);

impl SourcePayload {
    /// Interpret a decoded response body.
    ///
    /// `null` means the source answered but had nothing (`Ok(None)`);
    /// anything that is neither `null` nor an object is an error.
    pub fn from_value(value: Value) -> Result<Option<Self>, SourceError> {
        match value {
            Value::Null => Ok(None),
            Value::Object(map) => Ok(Some(Self(map))),
            other => Err(SourceError::NotAnObject(json_kind(&other))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of keys whose value is not `null`.
    pub fn populated_fields(&self) -> usize {
        self.0.values().filter(|v| !v.is_null()).count()
    }

    /// The source flagged its own answer as an error (truthy `error` key).
    pub fn has_error(&self) -> bool {
        self.0.get("error").is_some_and(is_truthy)
    }

    /// Non-empty and not flagged as an error.
    pub fn is_usable(&self) -> bool {
        !self.has_error() && self.populated_fields() > 0
    }

    /// Populated fields other than a truthy `error` marker.
    pub fn content_fields(&self) -> usize {
        self.populated_fields() - usize::from(self.has_error())
    }

    /// Shallow merge: every key in `other` overwrites the same key here.
    pub fn absorb(&mut self, other: SourcePayload) {
        self.0.extend(other.0);
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// JavaScript-style truthiness, used for the `error` marker.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// How a single source call ended, after retries.
#[derive(Debug, Clone)]
pub enum SourceOutcome {
    /// Retries exhausted.
    Unavailable(SourceError),
    /// The source answered JSON `null`.
    Null,
    Payload(SourcePayload),
}

impl SourceOutcome {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SourceOutcome::Unavailable(_))
    }

    pub fn into_payload(self) -> Option<SourcePayload> {
        match self {
            SourceOutcome::Payload(p) => Some(p),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Merged record
// ---------------------------------------------------------------------------

/// Typed view over a merged payload.
///
/// Every field is present-or-absent. Scalar values are kept as raw JSON
/// so that an absent field and a falsy one (`""`, `false`, `0`) stay
/// distinguishable; defaulting to "N/A" is left to [`crate::report`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
    /// National do-not-call status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ndnc: Option<Value>,
    /// State do-not-call status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdnc: Option<Value>,
    /// Litigator classification.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub litigator: Option<Value>,
    /// Blacklist status.
    #[serde(rename = "listed", skip_serializing_if = "Option::is_none")]
    pub blacklist: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owners: Option<Vec<OwnerEntry>>,
    #[serde(rename = "relatedPersons", skip_serializing_if = "Option::is_none")]
    pub related_persons: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<Vec<Value>>,
    /// Keys with no dedicated field, preserved untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MergedRecord {
    /// Split a payload into the typed fields. `null` values count as absent.
    ///
    /// Values with an unexpected shape (an `owner` that is not an object,
    /// `owners` that is not a list) stay in `extra` instead of being lost.
    /// Entries of `owners` are kept whatever their shape.
    pub fn from_payload(payload: SourcePayload) -> Self {
        let mut fields = payload.into_map();
        fields.retain(|_, v| !v.is_null());

        let owner = take_if(&mut fields, "owner", Value::is_object).and_then(Owner::from_value);
        let owners = take_if(&mut fields, "owners", Value::is_array)
            .map(|v| into_vec(v).into_iter().map(OwnerEntry::from_value).collect());
        let related_persons = take_if(&mut fields, "relatedPersons", Value::is_array).map(into_vec);
        let related = take_if(&mut fields, "related", Value::is_array).map(into_vec);

        Self {
            phone: fields.remove("phone"),
            state: fields.remove("state"),
            ndnc: fields.remove("ndnc"),
            sdnc: fields.remove("sdnc"),
            litigator: fields.remove("type"),
            blacklist: fields.remove("listed"),
            owner,
            owners,
            related_persons,
            related,
            extra: fields,
        }
    }

    /// `owner` if present, otherwise the first entry of `owners`.
    ///
    /// A truthy first entry that is not an object still counts as an
    /// owner, just one with no known fields.
    pub fn primary_owner(&self) -> Option<Cow<'_, Owner>> {
        if let Some(owner) = &self.owner {
            return Some(Cow::Borrowed(owner));
        }
        match self.owners.as_ref()?.first()? {
            OwnerEntry::Shaped(owner) => Some(Cow::Borrowed(owner)),
            OwnerEntry::Unshaped(value) if is_truthy(value) => Some(Cow::Owned(Owner::default())),
            OwnerEntry::Unshaped(_) => None,
        }
    }

    /// `relatedPersons` if non-empty, otherwise `related`.
    pub fn related_names(&self) -> &[Value] {
        match (&self.related_persons, &self.related) {
            (Some(p), _) if !p.is_empty() => p,
            (_, Some(r)) => r,
            _ => &[],
        }
    }

    /// The record as a JSON object with its wire keys.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn take_if(fields: &mut Map<String, Value>, key: &str, shape: fn(&Value) -> bool) -> Option<Value> {
    if fields.get(key).is_some_and(shape) {
        fields.remove(key)
    } else {
        None
    }
}

fn into_vec(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

/// Primary owner sub-record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Owner {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<Value>,
    /// Current address: a plain string or a structured object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Value>,
    /// Previous addresses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Owner {
    /// Build from a JSON object; anything else is not an owner.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::from_map(fields)),
            _ => None,
        }
    }

    fn from_map(mut fields: Map<String, Value>) -> Self {
        fields.retain(|_, v| !v.is_null());
        let addresses = take_if(&mut fields, "addresses", Value::is_array).map(into_vec);
        Self {
            name: fields.remove("name"),
            age: fields.remove("age"),
            dob: fields.remove("dob"),
            address: fields.remove("address"),
            addresses,
            extra: fields,
        }
    }
}

/// One entry of an `owners` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OwnerEntry {
    Shaped(Owner),
    /// Anything that is not an object, kept verbatim.
    Unshaped(Value),
}

impl OwnerEntry {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => OwnerEntry::Shaped(Owner::from_map(fields)),
            other => OwnerEntry::Unshaped(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// One source's answer under the all-parallel strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSection {
    pub source: String,
    pub role: SourceRole,
    pub rank: u32,
    /// `None` when the source failed or answered `null`.
    pub record: Option<MergedRecord>,
}

/// All-parallel result: one independent section per source, in
/// ascending precedence order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartitionedRecord {
    pub sections: Vec<SourceSection>,
}

impl PartitionedRecord {
    pub fn section(&self, source: &str) -> Option<&SourceSection> {
        self.sections.iter().find(|s| s.source == source)
    }
}

/// What a successful resolution produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", content = "data", rename_all = "snake_case")]
pub enum Resolution {
    /// Single record: the usable premium answer or the merged standard answers.
    Merged(MergedRecord),
    /// One record per source.
    Partitioned(PartitionedRecord),
}

impl Resolution {
    /// The single record the presentation layer reads from.
    pub fn view(&self) -> MergedRecord {
        match self {
            Resolution::Merged(record) => record.clone(),
            Resolution::Partitioned(parts) => crate::engine::merge::compose_view(parts),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Why an input was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputProblem {
    Empty,
    NotTenDigits,
}

impl fmt::Display for InputProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputProblem::Empty => write!(f, "Please enter a phone number"),
            InputProblem::NotTenDigits => write!(f, "Please enter a valid 10-digit USA number"),
        }
    }
}

/// Whole-resolution failures. These are the only errors a caller sees.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LookupError {
    #[error("{0}")]
    InvalidInput(InputProblem),

    #[error("No data available for this number")]
    NoData,

    #[error("All lookup sources failed ({attempted} queried). Please try again later.")]
    AllSourcesFailed { attempted: usize },
}

impl LookupError {
    /// Transient failures where retrying the whole lookup may help.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LookupError::AllSourcesFailed { .. })
    }
}

/// Failure of one call to one source. Logged and swallowed by the orchestrator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("invalid JSON body: {0}")]
    Decode(String),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

impl SourceError {
    /// Transport failures and non-success statuses are worth another attempt;
    /// a body that does not parse will not parse next time either.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Transport(_) | SourceError::Status { .. })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
