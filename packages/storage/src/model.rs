//! Input shapes for sales records and the validation that produces them.
//!
//! Request bodies are decoded as raw JSON first and then checked field by
//! field, so a single [`StoreError::Validation`] can list every problem in
//! the payload instead of stopping at the first one.

use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::Sales;
use crate::store::{StoreError, StoreResult};

/// Every property a sales record may carry.
pub const FIELDS: [&str; 5] = ["id", "description", "date", "country", "total"];

/// A complete record without its id (create and replace bodies).
#[derive(Debug, Clone, PartialEq)]
pub struct SalesData {
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub country: String,
    pub total: f64,
}

/// A partial record. `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesPatch {
    pub description: Option<Option<String>>,
    pub date: Option<DateTime<Utc>>,
    pub country: Option<String>,
    pub total: Option<f64>,
}

/// Years a stored date may fall in. Every backend stores dates so that they
/// compare in calendar order only inside four-digit, non-negative years.
pub const DATE_YEARS: RangeInclusive<i32> = 0..=9999;

/// Parses the date forms accepted on input.
///
/// Date-only and naive values are taken as UTC. The `Tue Jan 01 2019` form is
/// what older seed data was written with. Dates whose UTC year falls outside
/// [`DATE_YEARS`] are rejected.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    parse_any_date(input.trim()).filter(|date| DATE_YEARS.contains(&date.year()))
}

fn parse_any_date(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Some(date.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(date.and_utc());
    }

    ["%Y-%m-%d", "%a %b %d %Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

impl SalesData {
    pub fn new(
        description: Option<String>,
        date: DateTime<Utc>,
        country: impl Into<String>,
        total: f64,
    ) -> Self {
        Self {
            description,
            date,
            country: country.into(),
            total,
        }
    }

    /// Validates a create body. Ids are store-generated, so `id` is rejected.
    pub fn from_json(value: &Value) -> StoreResult<Self> {
        Self::parse(value, None)
    }

    /// Validates a replace body for record `id`. An `id` property is tolerated
    /// only when it names the same record.
    pub fn from_json_for(id: i32, value: &Value) -> StoreResult<Self> {
        Self::parse(value, Some(id))
    }

    fn parse(value: &Value, path_id: Option<i32>) -> StoreResult<Self> {
        let object = as_object(value)?;
        let mut errors = unknown_properties(object);

        match (object.get("id"), path_id) {
            (None, _) => {}
            (Some(_), None) => errors.push("`id` is generated by the store".to_string()),
            (Some(id), Some(expected)) => {
                if id.as_i64() != Some(expected as i64) {
                    errors.push(format!("`id` must match the record id {}", expected));
                }
            }
        }

        let description = match object.get("description") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(_) => {
                errors.push("`description` must be a string".to_string());
                None
            }
        };

        let date = required(object, "date", &mut errors, date_value);
        let country = required(object, "country", &mut errors, string_value);
        let total = required(object, "total", &mut errors, number_value);

        match (date, country, total) {
            (Some(date), Some(country), Some(total)) if errors.is_empty() => Ok(Self {
                description,
                date,
                country,
                total,
            }),
            _ => Err(StoreError::Validation(errors)),
        }
    }

    pub fn into_record(self, id: i32) -> Sales {
        Sales {
            id,
            description: self.description,
            date: self.date,
            country: self.country,
            total: self.total,
        }
    }
}

impl From<Sales> for SalesData {
    fn from(record: Sales) -> Self {
        Self {
            description: record.description,
            date: record.date,
            country: record.country,
            total: record.total,
        }
    }
}

impl SalesPatch {
    /// Validates a partial body. Primary keys cannot be patched.
    pub fn from_json(value: &Value) -> StoreResult<Self> {
        let object = as_object(value)?;
        let mut errors = unknown_properties(object);
        let mut patch = SalesPatch::default();

        if object.contains_key("id") {
            errors.push("`id` cannot be modified".to_string());
        }

        match object.get("description") {
            None => {}
            Some(Value::Null) => patch.description = Some(None),
            Some(Value::String(text)) => patch.description = Some(Some(text.clone())),
            Some(_) => errors.push("`description` must be a string".to_string()),
        }

        patch.date = optional(object, "date", &mut errors, date_value);
        patch.country = optional(object, "country", &mut errors, string_value);
        patch.total = optional(object, "total", &mut errors, number_value);

        if errors.is_empty() {
            Ok(patch)
        } else {
            Err(StoreError::Validation(errors))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.date.is_none()
            && self.country.is_none()
            && self.total.is_none()
    }

    pub fn apply(&self, record: &mut Sales) {
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(country) = &self.country {
            record.country = country.clone();
        }
        if let Some(total) = self.total {
            record.total = total;
        }
    }
}

fn as_object(value: &Value) -> StoreResult<&Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        StoreError::Validation(vec!["request body must be a JSON object".to_string()])
    })
}

fn unknown_properties(object: &Map<String, Value>) -> Vec<String> {
    object
        .keys()
        .filter(|key| !FIELDS.contains(&key.as_str()))
        .map(|key| format!("unknown property `{}`", key))
        .collect()
}

fn required<T>(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<String>,
    convert: fn(&Value) -> Option<T>,
) -> Option<T> {
    match object.get(field) {
        None | Some(Value::Null) => {
            errors.push(format!("`{}` is required", field));
            None
        }
        Some(value) => convert_or_report(value, field, errors, convert),
    }
}

fn optional<T>(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<String>,
    convert: fn(&Value) -> Option<T>,
) -> Option<T> {
    match object.get(field) {
        None => None,
        Some(Value::Null) => {
            errors.push(format!("`{}` cannot be null", field));
            None
        }
        Some(value) => convert_or_report(value, field, errors, convert),
    }
}

fn convert_or_report<T>(
    value: &Value,
    field: &str,
    errors: &mut Vec<String>,
    convert: fn(&Value) -> Option<T>,
) -> Option<T> {
    let converted = convert(value);
    if converted.is_none() {
        let expected = match field {
            "date" => "a date string",
            "total" => "a number",
            _ => "a string",
        };
        errors.push(format!("`{}` must be {}", field, expected));
    }
    converted
}

fn date_value(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(parse_date)
}

fn string_value(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn number_value(value: &Value) -> Option<f64> {
    value.as_f64()
}
