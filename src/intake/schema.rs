//! Declarative form schemas and the generic validator that interprets them.
//!
//! # Responsibilities
//! - Describe each form as a list of typed field specs plus cross-field rules
//! - Validate a raw payload against a schema, collecting every violation
//! - Coerce multipart text values into the types the schema expects
//!
//! # Design Decisions
//! - One interpreter for every form; forms differ only in data (see `forms.rs`)
//! - Undeclared fields never reach the output record
//! - Optional fields that are absent, `null` or empty count as not supplied
//! - "Today" is injected through `ValidationContext` so date rules are testable

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;

use crate::storage::Record;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+\d{10,15}$").expect("static regex"));
static PERSON_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\s.'-]+$").expect("static regex"));
static TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("static regex"));
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static regex"));

const EMAIL_MAX: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Email,
    /// `+` followed by 10 to 15 digits.
    Phone,
    /// Absolute http or https URL.
    Url,
    PersonName,
    /// 24h `HH:MM`.
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRule {
    Any,
    NotPast,
    NotFuture,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Text {
        min: usize,
        max: usize,
        format: Option<TextFormat>,
    },
    Enum(&'static [&'static str]),
    Integer {
        min: i64,
        max: Option<i64>,
    },
    Date(DateRule),
    Flag {
        must_be_true: bool,
    },
    TextList {
        min_items: usize,
        max_items: usize,
        item_max: usize,
    },
}

impl FieldType {
    pub fn text(min: usize, max: usize) -> Self {
        FieldType::Text { min, max, format: None }
    }

    pub fn formatted(min: usize, max: usize, format: TextFormat) -> Self {
        FieldType::Text {
            min,
            max,
            format: Some(format),
        }
    }

    pub fn email() -> Self {
        Self::formatted(0, EMAIL_MAX, TextFormat::Email)
    }

    pub fn phone() -> Self {
        Self::formatted(0, 16, TextFormat::Phone)
    }

    pub fn url() -> Self {
        Self::formatted(0, 2048, TextFormat::Url)
    }

    pub fn person_name() -> Self {
        Self::formatted(2, 100, TextFormat::PersonName)
    }

    pub fn time() -> Self {
        Self::formatted(0, 5, TextFormat::Time)
    }

    pub fn range(min: i64, max: i64) -> Self {
        FieldType::Integer { min, max: Some(max) }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, FieldType::Enum(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub ty: FieldType,
}

impl FieldSpec {
    pub fn required(name: &'static str, ty: FieldType) -> Self {
        Self { name, required: true, ty }
    }

    pub fn optional(name: &'static str, ty: FieldType) -> Self {
        Self { name, required: false, ty }
    }
}

/// Constraints spanning more than one field. Checked only when the
/// fields involved passed their own checks.
#[derive(Debug, Clone, PartialEq)]
pub enum CrossFieldRule {
    /// `field`, when present, must differ from `other`.
    DistinctFrom {
        field: &'static str,
        other: &'static str,
    },
    /// `field` becomes required with at least `min` characters when
    /// `when` equals `equals`.
    RequiredWhen {
        field: &'static str,
        when: &'static str,
        equals: &'static str,
        min: usize,
    },
}

/// One violation, reported to the caller under `error.details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Per-request inputs to validation.
#[derive(Debug, Clone)]
pub struct ValidationContext<'a> {
    pub today: NaiveDate,
    /// Required fields whose value is filled in later by the pipeline.
    pub deferred: &'a [&'static str],
}

impl ValidationContext<'static> {
    /// Context dated to the server's local calendar day.
    pub fn today() -> Self {
        Self {
            today: chrono::Local::now().date_naive(),
            deferred: &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub fields: Vec<FieldSpec>,
    pub rules: Vec<CrossFieldRule>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: CrossFieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check `payload` against every field and rule.
    ///
    /// Returns the record of declared fields with normalized values, or
    /// every violation found.
    pub fn validate(&self, payload: &Record, ctx: &ValidationContext<'_>) -> Result<Record, Vec<FieldError>> {
        let mut record = Record::new();
        let mut errors = Vec::new();

        for spec in &self.fields {
            let Some(value) = supplied(payload.get(spec.name), spec.required) else {
                if spec.required && !ctx.deferred.contains(&spec.name) {
                    errors.push(FieldError::new(spec.name, "is required"));
                }
                continue;
            };

            match check(&spec.ty, value, ctx.today) {
                Ok(normalized) => {
                    record.insert(spec.name.to_string(), normalized);
                }
                Err(message) => errors.push(FieldError::new(spec.name, message)),
            }
        }

        for rule in &self.rules {
            if let Some(error) = check_rule(rule, &record, payload, &errors) {
                errors.push(error);
            }
        }

        if errors.is_empty() {
            Ok(record)
        } else {
            Err(errors)
        }
    }

    /// Convert multipart text values to the JSON types the schema expects.
    ///
    /// Values that cannot be converted are left as strings for `validate`
    /// to report.
    pub fn coerce_form_fields(&self, fields: &mut Record) {
        fields.retain(|_, v| !matches!(v, Value::String(s) if s.is_empty()));

        for spec in &self.fields {
            let Some(Value::String(raw)) = fields.get(spec.name) else {
                continue;
            };
            let coerced = match &spec.ty {
                FieldType::Integer { .. } => raw.trim().parse::<i64>().ok().map(Value::from),
                FieldType::Flag { .. } => match raw.trim().to_ascii_lowercase().as_str() {
                    "true" | "on" | "1" | "yes" => Some(Value::Bool(true)),
                    "false" | "off" | "0" | "no" => Some(Value::Bool(false)),
                    _ => None,
                },
                FieldType::TextList { .. } => Some(Value::Array(vec![Value::String(raw.clone())])),
                _ => None,
            };
            if let Some(coerced) = coerced {
                fields.insert(spec.name.to_string(), coerced);
            }
        }
    }
}

/// The value to validate, or `None` when the field counts as not supplied.
fn supplied(value: Option<&Value>, required: bool) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if !required && s.trim().is_empty() => None,
        Some(v) => Some(v),
    }
}

fn check(ty: &FieldType, value: &Value, today: NaiveDate) -> Result<Value, String> {
    match ty {
        FieldType::Text { min, max, format } => {
            let s = value.as_str().ok_or("must be text")?;
            check_length(s, *min, *max)?;
            if let Some(format) = format {
                check_format(s, *format)?;
            }
            Ok(value.clone())
        }
        FieldType::Enum(allowed) => match value.as_str() {
            Some(s) if allowed.contains(&s) => Ok(value.clone()),
            _ => Err(format!("must be one of: {}", allowed.join(", "))),
        },
        FieldType::Integer { min, max } => {
            let n = as_integer(value).ok_or("must be a whole number")?;
            if n < *min {
                return Err(format!("must be at least {min}"));
            }
            if let Some(max) = max {
                if n > *max {
                    return Err(format!("must be at most {max}"));
                }
            }
            Ok(Value::from(n))
        }
        FieldType::Date(rule) => {
            let date = value
                .as_str()
                .filter(|s| ISO_DATE.is_match(s))
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .ok_or("must be a date in YYYY-MM-DD format")?;
            match rule {
                DateRule::NotPast if date < today => Err("must be today or later".into()),
                DateRule::NotFuture if date > today => Err("cannot be in the future".into()),
                _ => Ok(value.clone()),
            }
        }
        FieldType::Flag { must_be_true } => match value.as_bool() {
            Some(false) if *must_be_true => Err("must be accepted".into()),
            Some(_) => Ok(value.clone()),
            None => Err("must be true or false".into()),
        },
        FieldType::TextList {
            min_items,
            max_items,
            item_max,
        } => {
            let items = value.as_array().ok_or("must be a list")?;
            if items.len() < *min_items {
                return Err(format!("must include at least {min_items} item(s)"));
            }
            if items.len() > *max_items {
                return Err(format!("must include at most {max_items} items"));
            }
            for item in items {
                let s = item.as_str().ok_or("items must be text")?;
                if s.trim().is_empty() {
                    return Err("items must not be empty".into());
                }
                if s.chars().count() > *item_max {
                    return Err(format!("items must be at most {item_max} characters"));
                }
            }
            Ok(value.clone())
        }
    }
}

fn check_length(s: &str, min: usize, max: usize) -> Result<(), String> {
    let len = s.chars().count();
    if len < min {
        return Err(format!("must be at least {min} characters"));
    }
    if len > max {
        return Err(format!("must be at most {max} characters"));
    }
    Ok(())
}

fn check_format(s: &str, format: TextFormat) -> Result<(), String> {
    let ok = match format {
        TextFormat::Email => EMAIL.is_match(s),
        TextFormat::Phone => PHONE.is_match(s),
        TextFormat::PersonName => PERSON_NAME.is_match(s),
        TextFormat::Time => TIME.is_match(s),
        TextFormat::Url => url::Url::parse(s)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
            .unwrap_or(false),
    };
    if ok {
        return Ok(());
    }
    Err(match format {
        TextFormat::Email => "must be a valid email address",
        TextFormat::Phone => "must start with + followed by 10 to 15 digits",
        TextFormat::PersonName => "may only contain letters, spaces, dots, apostrophes and hyphens",
        TextFormat::Time => "must be a time in HH:MM format",
        TextFormat::Url => "must be a valid http(s) URL",
    }
    .to_string())
}

fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then_some(f as i64)
}

fn check_rule(rule: &CrossFieldRule, record: &Record, payload: &Record, errors: &[FieldError]) -> Option<FieldError> {
    let failed = |name: &str| errors.iter().any(|e| e.field == name);

    match rule {
        CrossFieldRule::DistinctFrom { field, other } => {
            let a = record.get(*field)?;
            let b = record.get(*other)?;
            (a == b).then(|| FieldError::new(field, format!("must be different from {other}")))
        }
        CrossFieldRule::RequiredWhen {
            field,
            when,
            equals,
            min,
        } => {
            if record.get(*when).and_then(Value::as_str) != Some(*equals) || failed(*field) {
                return None;
            }
            let len = payload
                .get(*field)
                .and_then(Value::as_str)
                .map(|s| s.trim().chars().count())
                .unwrap_or(0);
            (len < *min).then(|| {
                FieldError::new(
                    field,
                    format!("is required with at least {min} characters when {when} is {equals}"),
                )
            })
        }
    }
}
