//! Request-body validation.
//!
//! Each entity has a [`FieldRules`] table describing the columns a request may
//! set. Checking a body against it guarantees that every non-reserved field
//! names a known column and carries a value of the right kind, which is what
//! makes body keys safe to hand to
//! [`sql_for_partial_update`](crate::sql_for_partial_update).

use crate::changeset::{ValidationCode, ValidationError, ValidationErrors};
use crate::error::{JoblyError, JoblyResult};
use crate::value::{UpdateFields, Value};
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

/// Best-effort email validation.
///
/// Not RFC-complete: one `@`, no whitespace, a dot in the domain.
pub fn is_email(s: &str) -> bool {
    static EMAIL_RE: OnceLock<regex::Regex> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| {
            regex::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid built-in email regex")
        })
        .is_match(s)
}

pub fn is_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

/// The JSON kind a field must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    /// Integer or float
    Number,
    Boolean,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldKind::Text, Value::Text(_))
                | (FieldKind::Integer, Value::Int(_))
                | (FieldKind::Number, Value::Int(_) | Value::Float(_))
                | (FieldKind::Boolean, Value::Bool(_))
        )
    }

    fn name(self) -> &'static str {
        match self {
            FieldKind::Text => "a string",
            FieldKind::Integer => "an integer",
            FieldKind::Number => "a number",
            FieldKind::Boolean => "a boolean",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Email,
    Url,
}

/// Rules for a single column.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Must be present (and non-null) when creating.
    pub required: bool,
    pub nullable: bool,
    pub format: Option<Format>,
    pub min_len: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl FieldRule {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            nullable: false,
            format: None,
            min_len: None,
            min: None,
            max: None,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub const fn number(name: &'static str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub const fn min_len(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }

    pub const fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub const fn at_least(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    fn check(&self, value: &Value, errors: &mut ValidationErrors) {
        let field = self.name;
        if value.is_null() {
            if !self.nullable {
                errors.push(ValidationError::new(
                    field,
                    ValidationCode::Type,
                    format!("{field} must not be null"),
                ));
            }
            return;
        }

        if !self.kind.matches(value) {
            errors.push(ValidationError::new(
                field,
                ValidationCode::Type,
                format!("{field} must be {}, got {}", self.kind.name(), value.kind()),
            ));
            return;
        }

        if let Some(s) = value.as_str() {
            if let Some(min_len) = self.min_len {
                if s.chars().count() < min_len {
                    errors.push(ValidationError::new(
                        field,
                        ValidationCode::Range,
                        format!("{field} must be at least {min_len} characters"),
                    ));
                }
            }
            match self.format {
                Some(Format::Email) if !is_email(s) => errors.push(ValidationError::new(
                    field,
                    ValidationCode::Email,
                    format!("{field} must be a valid email address"),
                )),
                Some(Format::Url) if !is_url(s) => errors.push(ValidationError::new(
                    field,
                    ValidationCode::Url,
                    format!("{field} must be a valid URL"),
                )),
                _ => {}
            }
        }

        if let Some(n) = value.as_f64() {
            let below = self.min.is_some_and(|min| n < min);
            let above = self.max.is_some_and(|max| n > max);
            if below || above {
                let message = match (self.min, self.max) {
                    (Some(min), Some(max)) => format!("{field} must be between {min} and {max}"),
                    (Some(min), None) => format!("{field} must be at least {min}"),
                    (None, Some(max)) => format!("{field} must be at most {max}"),
                    (None, None) => unreachable!("range violation without bounds"),
                };
                errors.push(ValidationError::new(field, ValidationCode::Range, message));
            }
        }
    }
}

/// Whether a body creates a row or patches one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// The set of columns an entity accepts in request bodies.
#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub entity: &'static str,
    pub rules: &'static [FieldRule],
}

pub const COMPANY_RULES: FieldRules = FieldRules {
    entity: "company",
    rules: &[
        FieldRule::text("handle").required().min_len(1),
        FieldRule::text("name").required().min_len(1),
        FieldRule::integer("num_employees").nullable().range(0.0, i32::MAX as f64),
        FieldRule::text("description").nullable(),
        FieldRule::text("logo_url").nullable().format(Format::Url),
    ],
};

pub const JOB_RULES: FieldRules = FieldRules {
    entity: "job",
    rules: &[
        FieldRule::text("title").required().min_len(1),
        FieldRule::number("salary").required().at_least(0.0),
        FieldRule::number("equity").required().range(0.0, 1.0),
        FieldRule::text("company_handle").required().min_len(1),
    ],
};

pub const USER_RULES: FieldRules = FieldRules {
    entity: "user",
    rules: &[
        FieldRule::text("username").required().min_len(1),
        FieldRule::text("password").required().min_len(1),
        FieldRule::text("first_name").required().min_len(1),
        FieldRule::text("last_name").required().min_len(1),
        FieldRule::text("email").required().format(Format::Email),
        FieldRule::text("photo_url").nullable().format(Format::Url),
    ],
};

impl FieldRules {
    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Validate a request body. Reserved (`_`-prefixed) fields are ignored.
    pub fn check(&self, fields: &UpdateFields, mode: Mode) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        for (name, value) in fields.columns() {
            match self.rule(name) {
                Some(rule) => rule.check(value, &mut errors),
                None => errors.push(ValidationError::new(
                    name,
                    ValidationCode::Unknown,
                    format!("{} does not have a field named {name:?}", self.entity),
                )),
            }
        }

        match mode {
            Mode::Create => {
                for rule in self.rules.iter().filter(|r| r.required) {
                    if !fields.contains(rule.name) {
                        errors.push(ValidationError::new(
                            rule.name,
                            ValidationCode::Required,
                            format!("{} is required", rule.name),
                        ));
                    }
                }
            }
            Mode::Update => {
                if fields.columns().next().is_none() {
                    errors.push(ValidationError::new(
                        "",
                        ValidationCode::Empty,
                        "Update request does not contain any data.",
                    ));
                }
            }
        }

        errors.into_result()
    }

    /// Validate a body for creation and deserialize its columns into `T`.
    pub fn parse_create<T: DeserializeOwned>(&self, fields: &UpdateFields) -> JoblyResult<T> {
        self.check(fields, Mode::Create)?;
        let object: serde_json::Map<String, serde_json::Value> = fields
            .columns()
            .map(|(name, value)| {
                serde_json::to_value(value).map(|v| (name.to_string(), v))
            })
            .collect::<Result<_, _>>()
            .map_err(|e| JoblyError::Other(format!("{} body: {e}", self.entity)))?;
        serde_json::from_value(serde_json::Value::Object(object))
            .map_err(|e| JoblyError::invalid_argument(format!("{} body: {e}", self.entity)))
    }
}
