//! JSON query filters for sales records.
//!
//! Filters follow the shape clients already send to the service:
//!
//! ```json
//! {
//!   "where": { "country": "Canada", "date": { "between": ["2019-01-01", "2019-02-01"] } },
//!   "order": ["date DESC"],
//!   "limit": 10,
//!   "skip": 20
//! }
//! ```
//!
//! `between` is half-open: the lower bound is included, the upper bound is not.
//! Backends must reproduce this exactly so that calendar-period counts never
//! pick up a record stamped at the first instant of the next period.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::Sales;
use crate::model::parse_date;
use crate::store::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Description,
    Date,
    Country,
    Total,
}

impl Field {
    pub fn parse(name: &str) -> StoreResult<Self> {
        match name {
            "id" => Ok(Field::Id),
            "description" => Ok(Field::Description),
            "date" => Ok(Field::Date),
            "country" => Ok(Field::Country),
            "total" => Ok(Field::Total),
            other => Err(StoreError::InvalidFilter(format!("unknown field `{}`", other))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Description => "description",
            Field::Date => "date",
            Field::Country => "country",
            Field::Total => "total",
        }
    }

    pub fn read(&self, record: &Sales) -> FieldValue {
        match self {
            Field::Id => FieldValue::Int(record.id),
            Field::Description => record
                .description
                .clone()
                .map(FieldValue::Text)
                .unwrap_or(FieldValue::Null),
            Field::Date => FieldValue::Date(record.date),
            Field::Country => FieldValue::Text(record.country.clone()),
            Field::Total => FieldValue::Number(record.total),
        }
    }

    /// Converts a JSON operand to this field's type. Numeric strings are
    /// accepted for numeric fields since query strings often carry them.
    pub fn coerce(&self, value: &Value) -> StoreResult<FieldValue> {
        if value.is_null() {
            return Ok(FieldValue::Null);
        }

        let coerced = match self {
            Field::Id => value
                .as_i64()
                .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
                .and_then(|id| i32::try_from(id).ok())
                .map(FieldValue::Int),
            Field::Total => value
                .as_f64()
                .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
                .map(FieldValue::Number),
            Field::Date => value.as_str().and_then(parse_date).map(FieldValue::Date),
            Field::Description | Field::Country => {
                value.as_str().map(|s| FieldValue::Text(s.to_string()))
            }
        };

        coerced.ok_or_else(|| {
            StoreError::InvalidFilter(format!(
                "invalid value {} for field `{}`",
                value,
                self.name()
            ))
        })
    }
}

/// A typed operand in a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Int(i32),
    Number(f64),
    Text(String),
    Date(DateTime<Utc>),
}

impl FieldValue {
    /// SQL-style comparison: anything involving `Null` is unordered.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => Some(a.cmp(b)),
            (FieldValue::Number(a), FieldValue::Number(b)) => a.partial_cmp(b),
            (FieldValue::Int(a), FieldValue::Number(b)) => (*a as f64).partial_cmp(b),
            (FieldValue::Number(a), FieldValue::Int(b)) => a.partial_cmp(&(*b as f64)),
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Date(a), FieldValue::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Date(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(FieldValue),
    Neq(FieldValue),
    Gt(FieldValue),
    Gte(FieldValue),
    Lt(FieldValue),
    Lte(FieldValue),
    /// `lower <= field < upper`
    Between(FieldValue, FieldValue),
    Inq(Vec<FieldValue>),
    Nin(Vec<FieldValue>),
}

impl Predicate {
    fn parse(field: Field, operator: &str, operand: &Value) -> StoreResult<Self> {
        let list = |operand: &Value| -> StoreResult<Vec<FieldValue>> {
            operand
                .as_array()
                .ok_or_else(|| {
                    StoreError::InvalidFilter(format!("`{}` expects an array", operator))
                })?
                .iter()
                .map(|item| field.coerce(item))
                .collect()
        };

        match operator {
            "eq" => Ok(Predicate::Eq(field.coerce(operand)?)),
            "neq" => Ok(Predicate::Neq(field.coerce(operand)?)),
            "gt" => Ok(Predicate::Gt(field.coerce(operand)?)),
            "gte" => Ok(Predicate::Gte(field.coerce(operand)?)),
            "lt" => Ok(Predicate::Lt(field.coerce(operand)?)),
            "lte" => Ok(Predicate::Lte(field.coerce(operand)?)),
            "inq" => Ok(Predicate::Inq(list(operand)?)),
            "nin" => Ok(Predicate::Nin(list(operand)?)),
            "between" => match list(operand)?.as_slice() {
                [lower, upper] => Ok(Predicate::Between(lower.clone(), upper.clone())),
                _ => Err(StoreError::InvalidFilter(
                    "`between` expects exactly two bounds".to_string(),
                )),
            },
            other => Err(StoreError::InvalidFilter(format!(
                "unsupported operator `{}`",
                other
            ))),
        }
    }

    pub fn matches(&self, value: &FieldValue) -> bool {
        let ordering = |operand: &FieldValue| value.compare(operand);

        match self {
            Predicate::Eq(FieldValue::Null) => *value == FieldValue::Null,
            Predicate::Neq(FieldValue::Null) => *value != FieldValue::Null,
            Predicate::Eq(operand) => ordering(operand) == Some(Ordering::Equal),
            Predicate::Neq(operand) => {
                matches!(ordering(operand), Some(Ordering::Less | Ordering::Greater))
            }
            Predicate::Gt(operand) => ordering(operand) == Some(Ordering::Greater),
            Predicate::Gte(operand) => {
                matches!(ordering(operand), Some(Ordering::Greater | Ordering::Equal))
            }
            Predicate::Lt(operand) => ordering(operand) == Some(Ordering::Less),
            Predicate::Lte(operand) => {
                matches!(ordering(operand), Some(Ordering::Less | Ordering::Equal))
            }
            Predicate::Between(lower, upper) => {
                matches!(ordering(lower), Some(Ordering::Greater | Ordering::Equal))
                    && ordering(upper) == Some(Ordering::Less)
            }
            Predicate::Inq(options) => options
                .iter()
                .any(|option| value.compare(option) == Some(Ordering::Equal)),
            Predicate::Nin(options) => {
                *value != FieldValue::Null
                    && options
                        .iter()
                        .all(|option| value.compare(option) != Some(Ordering::Equal))
            }
        }
    }
}

/// A where clause. An empty `All` matches every record.
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    All(Vec<Where>),
    Any(Vec<Where>),
    Field(Field, Predicate),
}

impl Where {
    pub fn eq(field: Field, value: impl Into<FieldValue>) -> Self {
        Where::Field(field, Predicate::Eq(value.into()))
    }

    pub fn between(field: Field, lower: impl Into<FieldValue>, upper: impl Into<FieldValue>) -> Self {
        Where::Field(field, Predicate::Between(lower.into(), upper.into()))
    }

    pub fn and(self, other: Where) -> Self {
        match self {
            Where::All(mut clauses) => {
                clauses.push(other);
                Where::All(clauses)
            }
            clause => Where::All(vec![clause, other]),
        }
    }

    /// Parses a where clause passed as a JSON string (`?where=`).
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| StoreError::InvalidFilter(format!("where is not valid JSON: {}", e)))?;
        Self::from_json(&value)
    }

    pub fn from_json(value: &Value) -> StoreResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| StoreError::InvalidFilter("where must be an object".to_string()))?;

        let clauses = object
            .iter()
            .map(|(key, operand)| match key.as_str() {
                "and" => Ok(Where::All(Self::nested(key, operand)?)),
                "or" => Ok(Where::Any(Self::nested(key, operand)?)),
                name => Self::field_clause(Field::parse(name)?, operand),
            })
            .collect::<StoreResult<Vec<_>>>()?;

        if clauses.len() == 1 {
            Ok(clauses.into_iter().next().unwrap_or(Where::All(Vec::new())))
        } else {
            Ok(Where::All(clauses))
        }
    }

    fn nested(key: &str, operand: &Value) -> StoreResult<Vec<Where>> {
        let items = operand
            .as_array()
            .filter(|items| !items.is_empty())
            .ok_or_else(|| {
                StoreError::InvalidFilter(format!("`{}` expects a non-empty array", key))
            })?;
        items.iter().map(Self::from_json).collect()
    }

    fn field_clause(field: Field, operand: &Value) -> StoreResult<Self> {
        let Some(operators) = operand.as_object() else {
            return Ok(Where::Field(field, Predicate::Eq(field.coerce(operand)?)));
        };

        let mut clauses = operators
            .iter()
            .map(|(operator, value)| {
                Predicate::parse(field, operator, value).map(|p| Where::Field(field, p))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        match clauses.len() {
            0 => Err(StoreError::InvalidFilter(format!(
                "no operator given for field `{}`",
                field.name()
            ))),
            1 => Ok(clauses.remove(0)),
            _ => Ok(Where::All(clauses)),
        }
    }

    pub fn matches(&self, record: &Sales) -> bool {
        match self {
            Where::All(clauses) => clauses.iter().all(|clause| clause.matches(record)),
            Where::Any(clauses) => clauses.iter().any(|clause| clause.matches(record)),
            Where::Field(field, predicate) => predicate.matches(&field.read(record)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub field: Field,
    pub direction: Direction,
}

impl Order {
    /// Parses `"date"`, `"date ASC"` or `"date DESC"`.
    pub fn parse(spec: &str) -> StoreResult<Self> {
        let mut parts = spec.split_whitespace();
        let field = Field::parse(parts.next().unwrap_or_default())?;
        let direction = match parts.next().map(|d| d.to_ascii_uppercase()).as_deref() {
            None | Some("ASC") => Direction::Asc,
            Some("DESC") => Direction::Desc,
            Some(other) => {
                return Err(StoreError::InvalidFilter(format!(
                    "invalid sort direction `{}`",
                    other
                )));
            }
        };
        if parts.next().is_some() {
            return Err(StoreError::InvalidFilter(format!("invalid order `{}`", spec)));
        }
        Ok(Self { field, direction })
    }

    fn compare(&self, a: &Sales, b: &Sales) -> Ordering {
        let ordering = match (self.field.read(a), self.field.read(b)) {
            (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
            (FieldValue::Null, _) => Ordering::Less,
            (_, FieldValue::Null) => Ordering::Greater,
            (left, right) => left.compare(&right).unwrap_or(Ordering::Equal),
        };
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub where_clause: Option<Where>,
    pub order: Vec<Order>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

impl Filter {
    pub fn with_where(where_clause: Where) -> Self {
        Self {
            where_clause: Some(where_clause),
            ..Default::default()
        }
    }

    /// Parses a filter passed as a JSON string (`?filter=`).
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| StoreError::InvalidFilter(format!("filter is not valid JSON: {}", e)))?;
        Self::from_json(&value)
    }

    pub fn from_json(value: &Value) -> StoreResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| StoreError::InvalidFilter("filter must be an object".to_string()))?;

        let mut filter = Filter::default();
        for (key, value) in object {
            match key.as_str() {
                "where" => filter.where_clause = Some(Where::from_json(value)?),
                "order" => filter.order = Self::parse_order(value)?,
                "limit" => filter.limit = Self::parse_count(key, value)?,
                "skip" | "offset" => filter.skip = Self::parse_count(key, value)?,
                other => {
                    return Err(StoreError::InvalidFilter(format!(
                        "unsupported filter key `{}`",
                        other
                    )));
                }
            }
        }
        Ok(filter)
    }

    fn parse_order(value: &Value) -> StoreResult<Vec<Order>> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::String(spec) => Ok(vec![Order::parse(spec)?]),
            Value::Array(specs) => specs
                .iter()
                .map(|spec| {
                    spec.as_str().ok_or_else(|| {
                        StoreError::InvalidFilter("order entries must be strings".to_string())
                    })
                })
                .map(|spec| spec.and_then(Order::parse))
                .collect(),
            _ => Err(StoreError::InvalidFilter(
                "order must be a string or an array of strings".to_string(),
            )),
        }
    }

    /// `limit`/`skip` are bound as signed 64-bit SQL integers.
    fn parse_count(key: &str, value: &Value) -> StoreResult<Option<u64>> {
        match value {
            Value::Null => Ok(None),
            value => value
                .as_u64()
                .filter(|count| i64::try_from(*count).is_ok())
                .map(Some)
                .ok_or_else(|| {
                    StoreError::InvalidFilter(format!(
                        "`{}` must be an integer between 0 and {}",
                        key,
                        i64::MAX
                    ))
                }),
        }
    }

    /// Applies the whole filter in process. `records` must be in id order.
    pub fn apply<'a>(&self, records: impl Iterator<Item = &'a Sales>) -> Vec<Sales> {
        let mut matched: Vec<Sales> = records
            .filter(|record| self.where_clause.as_ref().is_none_or(|w| w.matches(record)))
            .cloned()
            .collect();

        if !self.order.is_empty() {
            matched.sort_by(|a, b| {
                self.order
                    .iter()
                    .map(|order| order.compare(a, b))
                    .find(|ordering| *ordering != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let skip = self.skip.unwrap_or(0) as usize;
        let limit = self.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        matched.into_iter().skip(skip).take(limit).collect()
    }
}
