// 📝 Form Builder - field schemas for the four trackers and record construction on submit

use crate::record::{Record, RecordType};
use crate::storage::KeyValueStorage;
use crate::store::{RecordStore, StoreError};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Name of the optional date field every form carries
pub const DATE_FIELD: &str = "date";

const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// FIELD DESCRIPTORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Number,
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Placeholder text shown to the user
    pub label: &'static str,

    /// Key the value is stored under in the record
    pub name: &'static str,

    pub input_type: InputType,

    /// Blank required fields reject the submission; blank optional ones are omitted
    pub required: bool,
}

impl FieldDescriptor {
    const fn required(label: &'static str, name: &'static str, input_type: InputType) -> Self {
        Self {
            label,
            name,
            input_type,
            required: true,
        }
    }

    const fn optional(label: &'static str, name: &'static str, input_type: InputType) -> Self {
        Self {
            label,
            name,
            input_type,
            required: false,
        }
    }

    const fn date() -> Self {
        Self::optional("Date", DATE_FIELD, InputType::Date)
    }
}

// ============================================================================
// FORM SCHEMA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSchema {
    pub title: &'static str,
    pub record_type: RecordType,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("{label} is required")]
    Missing { label: &'static str },

    #[error("{label} must be a number (got {value:?})")]
    InvalidNumber { label: &'static str, value: String },

    #[error("date must look like YYYY-MM-DD (got {value:?})")]
    InvalidDate { value: String },

    #[error("unknown field {0:?} for this form")]
    UnknownField(String),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FormSchema {
    /// Canonical form for a record type; `None` for tags no form produces
    pub fn for_type(record_type: &RecordType) -> Option<FormSchema> {
        match record_type {
            RecordType::Expense => Some(expense_form()),
            RecordType::Activity => Some(activity_form()),
            RecordType::Habit => Some(habit_form()),
            RecordType::Work => Some(work_study_form()),
            RecordType::Other(_) => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Merge type tag, date (blank = `today`) and every field value into a record
    pub fn build_record(&self, state: &FormState, today: NaiveDate) -> Result<Record, FormError> {
        if let Some(unknown) = state.values.keys().find(|name| self.field(name).is_none()) {
            return Err(FormError::UnknownField(unknown.clone()));
        }

        let mut record = Record::new(
            self.record_type.clone(),
            today.format(DATE_FORMAT).to_string(),
        );

        for field in &self.fields {
            let raw = state.get(field.name).trim();

            if raw.is_empty() {
                if field.required {
                    return Err(FormError::Missing { label: field.label });
                }
                continue;
            }

            if field.name == DATE_FIELD {
                record.date = parse_date(raw)?;
                continue;
            }

            let value = match field.input_type {
                InputType::Text => Value::String(raw.to_string()),
                InputType::Number => parse_number(field.label, raw)?,
                InputType::Date => Value::String(parse_date(raw)?),
            };
            record.set_field(field.name, value);
        }

        Ok(record)
    }
}

fn parse_number(label: &'static str, raw: &str) -> Result<Value, FormError> {
    let invalid = || FormError::InvalidNumber {
        label,
        value: raw.to_string(),
    };

    let n = raw.parse::<f64>().map_err(|_| invalid())?;
    if !n.is_finite() {
        return Err(invalid());
    }

    if n.fract() == 0.0 && n.abs() < 1e15 {
        Ok(Value::from(n as i64))
    } else {
        Ok(Value::from(n))
    }
}

fn parse_date(raw: &str) -> Result<String, FormError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(|d| d.format(DATE_FORMAT).to_string())
        .map_err(|_| FormError::InvalidDate {
            value: raw.to_string(),
        })
}

pub fn expense_form() -> FormSchema {
    FormSchema {
        title: "Expense Tracking",
        record_type: RecordType::Expense,
        fields: vec![
            FieldDescriptor::required("Amount", "amount", InputType::Number),
            FieldDescriptor::required("Category", "category", InputType::Text),
            FieldDescriptor::required("Payment Method", "method", InputType::Text),
            FieldDescriptor::required("Note", "note", InputType::Text),
            FieldDescriptor::date(),
        ],
    }
}

pub fn activity_form() -> FormSchema {
    FormSchema {
        title: "Activity Tracking",
        record_type: RecordType::Activity,
        fields: vec![
            FieldDescriptor::required("Activity Name", "activity", InputType::Text),
            FieldDescriptor::required("Duration (minutes)", "duration", InputType::Number),
            FieldDescriptor::required("Intensity", "intensity", InputType::Text),
            FieldDescriptor::required("Location", "location", InputType::Text),
            FieldDescriptor::date(),
        ],
    }
}

pub fn habit_form() -> FormSchema {
    FormSchema {
        title: "Health Tracking",
        record_type: RecordType::Habit,
        fields: vec![
            FieldDescriptor::required("Habit Name", "habit", InputType::Text),
            FieldDescriptor::required("Status (Done / Missed)", "status", InputType::Text),
            FieldDescriptor::required("Mood", "mood", InputType::Text),
            FieldDescriptor::optional("Hours (if applicable)", "hours", InputType::Number),
            FieldDescriptor::date(),
        ],
    }
}

pub fn work_study_form() -> FormSchema {
    FormSchema {
        title: "Work & Study Tracking",
        record_type: RecordType::Work,
        fields: vec![
            FieldDescriptor::required("Task / Subject", "task", InputType::Text),
            FieldDescriptor::required("Category (Work / Study)", "category", InputType::Text),
            FieldDescriptor::required("Focus Level (1-5)", "focus", InputType::Number),
            FieldDescriptor::required("Hours Spent", "hours", InputType::Number),
            FieldDescriptor::date(),
        ],
    }
}

// ============================================================================
// FORM STATE
// ============================================================================

/// Current input values of a mounted form, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    values: BTreeMap<String, String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn value_mut(&mut self, name: &str) -> &mut String {
        self.values.entry(name.to_string()).or_default()
    }

    pub fn is_blank(&self) -> bool {
        self.values.values().all(|v| v.trim().is_empty())
    }

    /// Clear every input so the form can be reused
    pub fn reset(&mut self) {
        self.values.clear();
    }
}

/// Build, store, then clear the form. On error the input is left untouched.
pub fn submit<S: KeyValueStorage>(
    schema: &FormSchema,
    state: &mut FormState,
    store: &mut RecordStore<S>,
    today: NaiveDate,
) -> Result<Record, SubmitError> {
    let record = schema.build_record(state, today)?;
    store.add(record.clone())?;
    state.reset();
    Ok(record)
}

/// Local calendar date used when a form leaves the date blank
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
