// Field validation for task forms and bulk imports.
//
// Each field has one pure rule returning `Result<(), FieldValidationError>`.
// Rules are addressed through the `Field` enum so a form can re-check a single
// field on every keystroke, while `validate_all` composes them for submit.
//
// `check_import_data` is a separate, purely structural gate for imported JSON:
// it keeps malformed records out of storage but does not re-run the business
// rules above.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use strum::{AsRefStr, Display};
use thiserror::Error;

use crate::model::item::TaskInput;

pub const MAX_DURATION_MINUTES: f64 = 1440.0;
pub const MAX_TAG_LENGTH: usize = 30;

// `.` in a browser excludes every line terminator, not only `\n`.
static TITLE_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\S(?:[^\n\r\x{2028}\x{2029}]*\S)?$").expect("title pattern")
});
static CONSECUTIVE_SPACES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("spacing pattern"));
static DATE_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$").expect("date pattern")
});
static DURATION_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0|[1-9][0-9]*)(\.[0-9]{1,2})?$").expect("duration pattern"));
static TAG_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]+(?:[ -][A-Za-z]+)*$").expect("tag pattern"));
static DUPLICATE_WORD: Lazy<fancy_regex::Regex> = Lazy::new(|| {
    fancy_regex::Regex::new(r"(?i)\b(\w+)\s+\1\b").expect("duplicate word pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldValidationError {
    #[error("Title is required")]
    TitleRequired,
    #[error("Title cannot have leading or trailing spaces, and must not be empty")]
    TitleUntrimmed,
    #[error("Title cannot contain consecutive spaces")]
    TitleConsecutiveSpaces,

    #[error("Date is required")]
    DateRequired,
    #[error("Date must be in YYYY-MM-DD format")]
    DateFormat,
    #[error("Invalid date")]
    DateUnparseable,
    #[error("Invalid date (e.g., February 30th)")]
    DateNotOnCalendar,

    #[error("Duration is required")]
    DurationRequired,
    #[error("Duration must be a positive number with up to 2 decimal places")]
    DurationFormat,
    #[error("Duration must be positive")]
    DurationNegative,
    #[error("Duration cannot exceed 1440 minutes (24 hours)")]
    DurationTooLong,

    #[error("Tag is required")]
    TagRequired,
    #[error("Tag can only contain letters, spaces, and hyphens")]
    TagFormat,
    #[error("Tag cannot exceed 30 characters")]
    TagTooLong,

    #[error("Duplicate word detected: \"{0}\"")]
    DuplicateWord(String),
}

/// Outcome of checking one field. `message` is empty when valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValidationResult {
    pub valid: bool,
    pub message: String,
}

impl From<Result<(), FieldValidationError>> for FieldValidationResult {
    fn from(result: Result<(), FieldValidationError>) -> Self {
        match result {
            Ok(()) => Self {
                valid: true,
                message: String::new(),
            },
            Err(e) => Self {
                valid: false,
                message: e.to_string(),
            },
        }
    }
}

/// Validation rules, one per checked attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum Field {
    Title,
    Date,
    Duration,
    Tag,
    DuplicateWords,
}

impl Field {
    pub fn check(self, value: &str) -> Result<(), FieldValidationError> {
        match self {
            Field::Title => validate_title(value),
            Field::Date => validate_date(value),
            Field::Duration => validate_duration(value),
            Field::Tag => validate_tag(value),
            Field::DuplicateWords => validate_duplicate_words(value),
        }
    }

    pub fn validate(self, value: &str) -> FieldValidationResult {
        self.check(value).into()
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn validate_title(value: &str) -> Result<(), FieldValidationError> {
    if is_blank(value) {
        return Err(FieldValidationError::TitleRequired);
    }
    if !TITLE_SHAPE.is_match(value) {
        return Err(FieldValidationError::TitleUntrimmed);
    }
    if CONSECUTIVE_SPACES.is_match(value) {
        return Err(FieldValidationError::TitleConsecutiveSpaces);
    }
    Ok(())
}

pub fn validate_date(value: &str) -> Result<(), FieldValidationError> {
    if is_blank(value) {
        return Err(FieldValidationError::DateRequired);
    }
    if !DATE_SHAPE.is_match(value) {
        return Err(FieldValidationError::DateFormat);
    }

    // The shape pins the layout to ASCII digits, so only the year can
    // overflow here.
    let mut parts = value.split('-');
    let year = parts.next().and_then(|y| y.parse::<i32>().ok());
    let month = parts.next().and_then(|m| m.parse::<u32>().ok());
    let day = parts.next().and_then(|d| d.parse::<u32>().ok());
    let (Some(year), Some(month), Some(day)) = (year, month, day) else {
        return Err(FieldValidationError::DateUnparseable);
    };

    if NaiveDate::from_ymd_opt(year, month, day).is_none() {
        return Err(FieldValidationError::DateNotOnCalendar);
    }
    Ok(())
}

pub fn validate_duration(value: &str) -> Result<(), FieldValidationError> {
    if is_blank(value) {
        return Err(FieldValidationError::DurationRequired);
    }
    if !DURATION_SHAPE.is_match(value) {
        return Err(FieldValidationError::DurationFormat);
    }

    let minutes: f64 = value
        .parse()
        .map_err(|_| FieldValidationError::DurationFormat)?;
    // Unreachable through the shape above; kept as a guard for callers that
    // relax the shape.
    if minutes < 0.0 {
        return Err(FieldValidationError::DurationNegative);
    }
    if minutes > MAX_DURATION_MINUTES {
        return Err(FieldValidationError::DurationTooLong);
    }
    Ok(())
}

pub fn validate_tag(value: &str) -> Result<(), FieldValidationError> {
    if is_blank(value) {
        return Err(FieldValidationError::TagRequired);
    }
    if !TAG_SHAPE.is_match(value) {
        return Err(FieldValidationError::TagFormat);
    }
    if value.chars().count() > MAX_TAG_LENGTH {
        return Err(FieldValidationError::TagTooLong);
    }
    Ok(())
}

/// Rejects a word immediately repeated after whitespace ("the the"),
/// ignoring case. The reported word keeps the spelling of its first
/// occurrence. A scan that exceeds the backtracking limit passes.
pub fn validate_duplicate_words(value: &str) -> Result<(), FieldValidationError> {
    match DUPLICATE_WORD.captures(value) {
        Ok(Some(caps)) => match caps.get(1) {
            Some(word) => Err(FieldValidationError::DuplicateWord(
                word.as_str().to_string(),
            )),
            None => Ok(()),
        },
        Ok(None) => Ok(()),
        Err(e) => {
            log::debug!("Duplicate word scan gave up: {}", e);
            Ok(())
        }
    }
}

/// Keys of the form-level error map.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FormField {
    Title,
    Date,
    Duration,
    Tag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormValidationResult {
    pub valid: bool,
    pub errors: BTreeMap<FormField, String>,
}

impl FormValidationResult {
    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }
}

/// Checks every form field. Fields are independent: a bad title does not
/// stop the date from being checked. The duplicate-word rule only runs once
/// the title itself is well formed and reports under `title`.
pub fn validate_all(data: &TaskInput) -> FormValidationResult {
    let mut errors = BTreeMap::new();

    let title = validate_title(&data.title).and_then(|()| validate_duplicate_words(&data.title));
    if let Err(e) = title {
        errors.insert(FormField::Title, e.to_string());
    }
    if let Err(e) = validate_date(&data.date) {
        errors.insert(FormField::Date, e.to_string());
    }
    if let Err(e) = validate_duration(&data.duration) {
        errors.insert(FormField::Duration, e.to_string());
    }
    if let Err(e) = validate_tag(&data.tag) {
        errors.insert(FormField::Tag, e.to_string());
    }

    FormValidationResult {
        valid: errors.is_empty(),
        errors,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportStructureError {
    #[error("Data must be an array")]
    NotAnArray,
    #[error("Task at index {0} is missing valid id")]
    MissingId(usize),
    #[error("Task at index {0} is missing valid title")]
    MissingTitle(usize),
    #[error("Task at index {0} is missing valid dueDate")]
    MissingDueDate(usize),
    #[error("Task at index {0} has invalid duration")]
    InvalidDuration(usize),
    #[error("Task at index {0} is missing valid tag")]
    MissingTag(usize),
    #[error("Task at index {0} is missing timestamps")]
    MissingTimestamps(usize),
}

impl ImportStructureError {
    /// Index of the offending record, if the error is about one.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::NotAnArray => None,
            Self::MissingId(i)
            | Self::MissingTitle(i)
            | Self::MissingDueDate(i)
            | Self::InvalidDuration(i)
            | Self::MissingTag(i)
            | Self::MissingTimestamps(i) => Some(*i),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportValidation {
    pub valid: bool,
    pub message: String,
}

pub const IMPORT_VALID_MESSAGE: &str = "Data is valid";

fn non_empty_str(record: &Value, key: &str) -> bool {
    record
        .get(key)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}

/// Loose presence test used for timestamps: anything but null, false, zero
/// or an empty string counts.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Structural gate for imported task arrays. Stops at the first problem.
pub fn check_import_data(data: &Value) -> Result<(), ImportStructureError> {
    let records = data.as_array().ok_or(ImportStructureError::NotAnArray)?;

    for (i, record) in records.iter().enumerate() {
        if !non_empty_str(record, "id") {
            return Err(ImportStructureError::MissingId(i));
        }
        if !non_empty_str(record, "title") {
            return Err(ImportStructureError::MissingTitle(i));
        }
        if !non_empty_str(record, "dueDate") {
            return Err(ImportStructureError::MissingDueDate(i));
        }
        let duration_ok = record
            .get("duration")
            .and_then(Value::as_f64)
            .is_some_and(|d| d >= 0.0);
        if !duration_ok {
            return Err(ImportStructureError::InvalidDuration(i));
        }
        if !non_empty_str(record, "tag") {
            return Err(ImportStructureError::MissingTag(i));
        }
        if !is_present(record.get("createdAt")) || !is_present(record.get("updatedAt")) {
            return Err(ImportStructureError::MissingTimestamps(i));
        }
    }
    Ok(())
}

pub fn validate_import_data(data: &Value) -> ImportValidation {
    match check_import_data(data) {
        Ok(()) => ImportValidation {
            valid: true,
            message: IMPORT_VALID_MESSAGE.to_string(),
        },
        Err(e) => ImportValidation {
            valid: false,
            message: e.to_string(),
        },
    }
}
