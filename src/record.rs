// 🗂️ Record Model - one tracked event (expense / activity / habit / work)
// Persisted as a flat JSON object: `type` + `date` + the per-type fields side by side

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// RECORD TYPE
// ============================================================================

/// Record type tag (the `type` discriminator in persisted JSON)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    Expense,
    Activity,
    Habit,
    Work,

    /// Tag no form produces. Kept verbatim so foreign data round-trips.
    Other(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown record type: {0} (expected expense, activity, habit or work)")]
pub struct UnknownRecordType(pub String);

impl RecordType {
    /// The four types a form can produce, in navigation order
    pub fn tracked() -> [RecordType; 4] {
        [
            RecordType::Expense,
            RecordType::Activity,
            RecordType::Habit,
            RecordType::Work,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            RecordType::Expense => "expense",
            RecordType::Activity => "activity",
            RecordType::Habit => "habit",
            RecordType::Work => "work",
            RecordType::Other(tag) => tag.as_str(),
        }
    }

    /// Plural card label used by the summary view
    pub fn label(&self) -> &str {
        match self {
            RecordType::Expense => "Expenses",
            RecordType::Activity => "Activities",
            RecordType::Habit => "Health",
            RecordType::Work => "Work",
            RecordType::Other(tag) => tag.as_str(),
        }
    }

    pub fn is_tracked(&self) -> bool {
        !matches!(self, RecordType::Other(_))
    }
}

impl From<String> for RecordType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "expense" => RecordType::Expense,
            "activity" => RecordType::Activity,
            "habit" => RecordType::Habit,
            "work" => RecordType::Work,
            _ => RecordType::Other(tag),
        }
    }
}

impl From<RecordType> for String {
    fn from(record_type: RecordType) -> Self {
        match record_type {
            RecordType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse: only the four tracked tags are accepted from user input
impl FromStr for RecordType {
    type Err = UnknownRecordType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match RecordType::from(s.trim().to_lowercase()) {
            RecordType::Other(_) => Err(UnknownRecordType(s.to_string())),
            known => Ok(known),
        }
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// One tracked event. Never updated once stored; the store only appends and removes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "type")]
    pub record_type: RecordType,

    /// `YYYY-MM-DD` for records created here; older data may carry a locale date
    #[serde(default)]
    pub date: String,

    /// Per-type fields keyed by form field name (string or number values).
    /// Never holds `type` or `date`; those live in the named fields above.
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(record_type: RecordType, date: impl Into<String>) -> Self {
        Self {
            record_type,
            date: date.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    /// Set a per-type field. `date` updates the record date; `type` is ignored.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match name.as_str() {
            "date" => self.date = display_value(Some(&value)),
            "type" => {}
            _ => {
                self.fields.insert(name, value);
            }
        }
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Display text of a field ("" when missing)
    pub fn field_text(&self, name: &str) -> String {
        display_value(self.field(name))
    }

    /// Numeric value of `amount`; non-numeric or missing counts as zero
    pub fn amount(&self) -> f64 {
        coerce_number(self.field("amount"))
    }

    /// Short per-type summary shown in the history table
    pub fn primary_info(&self) -> String {
        match self.record_type {
            RecordType::Expense => format!(
                "${} • {}",
                self.field_text("amount"),
                self.field_text("category")
            ),
            RecordType::Activity => format!(
                "{} • {} min",
                self.field_text("activity"),
                self.field_text("duration")
            ),
            RecordType::Habit => format!(
                "{} • {}",
                self.field_text("habit"),
                self.field_text("status")
            ),
            RecordType::Work => format!(
                "{} • {} hrs",
                self.field_text("task"),
                self.field_text("hours")
            ),
            RecordType::Other(_) => String::new(),
        }
    }

    /// Labeled detail lines for the detail panel and exports
    pub fn details(&self) -> Vec<(&'static str, String)> {
        match self.record_type {
            RecordType::Expense => vec![
                ("Amount", format!("${}", self.field_text("amount"))),
                ("Category", self.field_text("category")),
                ("Method", self.field_text("method")),
                ("Note", self.field_text("note")),
            ],
            RecordType::Activity => vec![
                ("Activity", self.field_text("activity")),
                ("Duration", format!("{} min", self.field_text("duration"))),
                ("Intensity", self.field_text("intensity")),
                ("Location", self.field_text("location")),
            ],
            RecordType::Habit => {
                let hours = self.field_text("hours");
                vec![
                    ("Habit", self.field_text("habit")),
                    ("Status", self.field_text("status")),
                    ("Mood", self.field_text("mood")),
                    ("Hours", if hours.is_empty() { "-".to_string() } else { hours }),
                ]
            }
            RecordType::Work => vec![
                ("Task", self.field_text("task")),
                ("Category", self.field_text("category")),
                ("Focus Level", self.field_text("focus")),
                ("Hours", self.field_text("hours")),
            ],
            RecordType::Other(_) => Vec::new(),
        }
    }
}

// ============================================================================
// VALUE HELPERS
// ============================================================================

/// Render a stored value the way the history table shows it
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() => format_number(f),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

/// Integral values print without a decimal point (`20`, not `20.0`)
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Numeric coercion for aggregates: numbers as-is, numeric strings parsed, anything else 0
pub fn coerce_number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    };

    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}
