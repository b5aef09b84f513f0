//! The named type registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use url::Url;

use crate::cast::{Caster, FnCaster};
use crate::conversation::Message;
use crate::error::Result;
use crate::flag::Outcome;
use crate::value::Value;

/// A built-in type: a pure function of the phrase.
struct Builtin(fn(&str) -> Value);

#[async_trait]
impl Caster for Builtin {
    async fn cast(&self, _: &TypeResolver, _: &Message, phrase: &str) -> Result<Outcome> {
        Ok((self.0)(phrase).into())
    }
}

const BUILTINS: &[(&str, fn(&str) -> Value)] = &[
    ("string", cast_string),
    ("lowercase", cast_lowercase),
    ("uppercase", cast_uppercase),
    ("charCodes", cast_char_codes),
    ("number", cast_number),
    ("integer", cast_integer),
    ("bigint", cast_bigint),
    ("emojint", cast_emojint),
    ("url", cast_url),
    ("date", cast_date),
    ("color", cast_color),
];

/// Maps type names to casters.
///
/// Cloning is cheap; casters are shared.
#[derive(Clone)]
pub struct TypeResolver {
    types: HashMap<String, Arc<dyn Caster>>,
}

impl TypeResolver {
    /// A resolver holding the built-in types.
    pub fn new() -> Self {
        let mut resolver = Self::empty();
        for (name, f) in BUILTINS {
            resolver.add_type(*name, Builtin(*f));
        }
        resolver
    }

    /// A resolver with no types at all.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Caster>> {
        self.types.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Register a type, replacing any type of the same name.
    pub fn add_type(
        &mut self,
        name: impl Into<String>,
        caster: impl Caster + 'static,
    ) -> &mut Self {
        self.types.insert(name.into(), Arc::new(caster));
        self
    }

    pub fn add_type_fn<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Message, &str) -> Outcome + Send + Sync + 'static,
    {
        self.add_type(name, FnCaster(f))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(phrase: &str) -> Option<&str> {
    (!phrase.is_empty()).then_some(phrase)
}

fn cast_string(phrase: &str) -> Value {
    non_empty(phrase).map_or(Value::Null, Value::from)
}

fn cast_lowercase(phrase: &str) -> Value {
    non_empty(phrase).map_or(Value::Null, |p| Value::from(p.to_lowercase()))
}

fn cast_uppercase(phrase: &str) -> Value {
    non_empty(phrase).map_or(Value::Null, |p| Value::from(p.to_uppercase()))
}

fn cast_char_codes(phrase: &str) -> Value {
    let Some(phrase) = non_empty(phrase) else {
        return Value::Null;
    };
    Value::Array(phrase.chars().map(|c| Value::Integer(c as i64)).collect())
}

fn parse_number(phrase: &str) -> Option<f64> {
    let trimmed = phrase.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
}

fn cast_number(phrase: &str) -> Value {
    parse_number(phrase).map_or(Value::Null, Value::Number)
}

fn cast_integer(phrase: &str) -> Value {
    parse_number(phrase)
        .filter(|n| n.is_finite() && n.abs() < i64::MAX as f64)
        .map_or(Value::Null, |n| Value::Integer(n.trunc() as i64))
}

fn cast_bigint(phrase: &str) -> Value {
    phrase
        .trim()
        .parse::<i64>()
        .map_or(Value::Null, Value::Integer)
}

fn cast_emojint(phrase: &str) -> Value {
    let digits: String = phrase
        .replace('\u{1F51F}', "10")
        .chars()
        .filter(|c| *c != '\u{FE0F}' && *c != '\u{20E3}')
        .collect();
    cast_integer(&digits)
}

fn cast_url(phrase: &str) -> Value {
    let phrase = phrase
        .strip_prefix('<')
        .and_then(|p| p.strip_suffix('>'))
        .filter(|p| !p.is_empty())
        .unwrap_or(phrase);
    Url::parse(phrase).map_or(Value::Null, |url| Value::from(url.to_string()))
}

fn cast_date(phrase: &str) -> Value {
    let phrase = phrase.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(phrase) {
        return Value::Date(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(phrase, format) {
            return Value::Date(date.and_utc());
        }
    }
    NaiveDate::parse_from_str(phrase, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map_or(Value::Null, |date| Value::Date(date.and_utc()))
}

fn cast_color(phrase: &str) -> Value {
    let hex = phrase.strip_prefix('#').unwrap_or(phrase);
    if hex.is_empty() || hex.len() > 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Value::Null;
    }
    i64::from_str_radix(hex, 16).map_or(Value::Null, Value::Integer)
}
