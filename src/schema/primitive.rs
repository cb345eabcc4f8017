//! FHIR primitive datatype checks.
//!
//! Formats follow the FHIR regular expressions; calendar validity of dates and
//! timestamps is confirmed with chrono.

use chrono::{DateTime, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

// FHIR ID pattern: [A-Za-z0-9\-\.]{1,64}
static ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9\-\.]{1,64}$").unwrap());
// FHIR code pattern: [^\s]+(\s[^\s]+)*
static CODE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s]+(\s[^\s]+)*$").unwrap());
static URI_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S+$").unwrap());
static BASE64_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*[0-9a-zA-Z+/=]{4}\s*)+$").unwrap());
static INTEGER64_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(0|[-+]?[1-9][0-9]*)$").unwrap());
static DATE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}(-(0[1-9]|1[0-2])(-(0[1-9]|[12]\d|3[01]))?)?$").unwrap());
// Partial dates, or a full timestamp with a mandatory offset
static DATE_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\d{4}(-(0[1-9]|1[0-2])(-(0[1-9]|[12]\d|3[01])(T([01]\d|2[0-3]):[0-5]\d:([0-5]\d|60)(\.\d{1,9})?(Z|[+-]((0\d|1[0-3]):[0-5]\d|14:00)))?)?)?$",
    )
    .unwrap()
});
static TIME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d:([0-5]\d|60)(\.\d{1,9})?$").unwrap());

/// Why a primitive value was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The JSON kind does not match (e.g. a number where a string is expected)
    Type(String),
    /// The JSON kind matches but the content is malformed
    Format(String),
}

impl Violation {
    pub fn code(&self) -> &'static str {
        match self {
            Violation::Type(_) => "type",
            Violation::Format(_) => "value",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Violation::Type(m) | Violation::Format(m) => m,
        }
    }
}

pub fn is_primitive(type_name: &str) -> bool {
    type_name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase())
}

/// Check a value against a primitive type
pub fn check(type_name: &str, value: &Value) -> Result<(), Violation> {
    match type_name {
        "boolean" => value
            .as_bool()
            .map(|_| ())
            .ok_or_else(|| expected("a valid boolean", value)),
        "integer" => integer_in(value, i64::from(i32::MIN), "a valid integer"),
        "unsignedInt" => integer_in(value, 0, "a non-negative integer"),
        "positiveInt" => integer_in(value, 1, "a positive integer"),
        "integer64" => match value {
            Value::Number(n) if n.is_i64() => Ok(()),
            Value::String(s) if INTEGER64_REGEX.is_match(s) => Ok(()),
            Value::String(s) => Err(invalid("a valid integer64", s)),
            _ => Err(expected("a valid integer64", value)),
        },
        "decimal" => match value {
            Value::Number(_) => Ok(()),
            _ => Err(expected("a valid decimal", value)),
        },
        "string" | "markdown" | "xhtml" => {
            let s = string(value)?;
            if s.trim().is_empty() {
                Err(Violation::Format("String should have at least 1 character".to_string()))
            } else {
                Ok(())
            }
        }
        "id" => matching(value, &ID_REGEX, "a valid id"),
        "code" => matching(value, &CODE_REGEX, "a valid code"),
        "uri" | "url" | "canonical" | "oid" | "uuid" => {
            matching(value, &URI_REGEX, "a valid uri")
        }
        "base64Binary" => matching(value, &BASE64_REGEX, "valid base64"),
        "date" => {
            let s = string(value)?;
            if DATE_REGEX.is_match(s) && calendar_date_ok(s) {
                Ok(())
            } else {
                Err(invalid("a valid date", s))
            }
        }
        "dateTime" => {
            let s = string(value)?;
            if !DATE_TIME_REGEX.is_match(s) {
                return Err(invalid("a valid dateTime with timezone", s));
            }
            let ok = if s.contains('T') {
                DateTime::parse_from_rfc3339(s).is_ok()
            } else {
                calendar_date_ok(s)
            };
            if ok { Ok(()) } else { Err(invalid("a valid dateTime", s)) }
        }
        "instant" => {
            let s = string(value)?;
            if DateTime::parse_from_rfc3339(s).is_ok() && s.contains('T') {
                Ok(())
            } else {
                Err(invalid("a valid instant with timezone", s))
            }
        }
        "time" => {
            let s = string(value)?;
            if TIME_REGEX.is_match(s) && NaiveTime::parse_from_str(s, "%H:%M:%S%.f").is_ok() {
                Ok(())
            } else {
                Err(invalid("a valid time", s))
            }
        }
        _ => string(value).map(|_| ()),
    }
}

fn calendar_date_ok(s: &str) -> bool {
    // Year and year-month precision carry no day to check
    s.len() < 10 || NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d").is_ok()
}

fn string(value: &Value) -> Result<&str, Violation> {
    value
        .as_str()
        .ok_or_else(|| expected("a valid string", value))
}

fn matching(value: &Value, regex: &Regex, what: &str) -> Result<(), Violation> {
    let s = string(value)?;
    if regex.is_match(s) {
        Ok(())
    } else {
        Err(invalid(what, s))
    }
}

fn integer_in(value: &Value, min: i64, what: &str) -> Result<(), Violation> {
    match value.as_i64() {
        Some(n) if n >= min && n <= i64::from(i32::MAX) => Ok(()),
        Some(n) => Err(Violation::Format(format!("Input should be {what}, got {n}"))),
        None => Err(expected(what, value)),
    }
}

fn expected(what: &str, value: &Value) -> Violation {
    Violation::Type(format!("Input should be {what}, got {}", kind_of(value)))
}

fn invalid(what: &str, s: &str) -> Violation {
    Violation::Format(format!("Input should be {what}, got '{s}'"))
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
