//! Casting phrases into values.
//!
//! An [`ArgumentType`] says how to turn a phrase into a [`Value`]. Casting
//! never errors on bad input: a cast fails by producing `Null` or a `Fail`
//! flag. Errors are reserved for casters that cannot do their job at all.
//!
//! The combinators in this module build new types from existing ones and all
//! share that failure definition.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use crate::conversation::Message;
use crate::error::Result;
use crate::flag::{Flag, Outcome};
use crate::types::TypeResolver;
use crate::value::Value;

/// Something that casts a phrase.
#[async_trait]
pub trait Caster: Send + Sync {
    async fn cast(&self, resolver: &TypeResolver, message: &Message, phrase: &str)
        -> Result<Outcome>;
}

/// A caster built from a plain function.
pub struct FnCaster<F>(pub F);

#[async_trait]
impl<F> Caster for FnCaster<F>
where
    F: Fn(&Message, &str) -> Outcome + Send + Sync,
{
    async fn cast(&self, _: &TypeResolver, message: &Message, phrase: &str) -> Result<Outcome> {
        Ok((self.0)(message, phrase))
    }
}

/// A caster built from an async function taking owned inputs.
pub struct AsyncFnCaster<F>(pub F);

#[async_trait]
impl<F, Fut> Caster for AsyncFnCaster<F>
where
    F: Fn(Message, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Outcome>> + Send,
{
    async fn cast(&self, _: &TypeResolver, message: &Message, phrase: &str) -> Result<Outcome> {
        (self.0)(message.clone(), phrase.to_string()).await
    }
}

/// How an argument turns a phrase into a value.
#[derive(Clone)]
pub enum ArgumentType {
    /// A type registered in the [`TypeResolver`].
    Named(String),
    /// An inline caster.
    Caster(Arc<dyn Caster>),
    /// Accepted words, each entry being a list of aliases whose first alias
    /// is the canonical value.
    Choices(Vec<Vec<String>>),
    /// A regular expression.
    Pattern(Regex),
}

impl ArgumentType {
    pub fn named(name: impl Into<String>) -> Self {
        ArgumentType::Named(name.into())
    }

    /// Single-word choices.
    pub fn choices<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ArgumentType::Choices(choices.into_iter().map(|c| vec![c.into()]).collect())
    }

    /// Choices with aliases. The first alias of each entry is returned.
    pub fn aliases<I, A, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ArgumentType::Choices(
            entries
                .into_iter()
                .map(|aliases| aliases.into_iter().map(Into::into).collect())
                .filter(|aliases: &Vec<String>| !aliases.is_empty())
                .collect(),
        )
    }

    pub fn caster(caster: impl Caster + 'static) -> Self {
        ArgumentType::Caster(Arc::new(caster))
    }

    /// An inline caster from a function.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Message, &str) -> Outcome + Send + Sync + 'static,
    {
        ArgumentType::caster(FnCaster(f))
    }

    /// An inline caster from an async function.
    pub fn from_async_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Message, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Outcome>> + Send + 'static,
    {
        ArgumentType::caster(AsyncFnCaster(f))
    }

    /// Default tag used by the tagging combinators.
    pub fn tag(&self) -> String {
        match self {
            ArgumentType::Named(name) => name.clone(),
            ArgumentType::Caster(_) => "caster".to_string(),
            ArgumentType::Choices(entries) => entries
                .first()
                .and_then(|aliases| aliases.first())
                .cloned()
                .unwrap_or_default(),
            ArgumentType::Pattern(regex) => regex.as_str().to_string(),
        }
    }
}

impl Default for ArgumentType {
    fn default() -> Self {
        ArgumentType::Named("string".to_string())
    }
}

impl fmt::Debug for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentType::Named(name) => f.debug_tuple("Named").field(name).finish(),
            ArgumentType::Caster(_) => f.write_str("Caster(..)"),
            ArgumentType::Choices(entries) => f.debug_tuple("Choices").field(entries).finish(),
            ArgumentType::Pattern(regex) => {
                f.debug_tuple("Pattern").field(&regex.as_str()).finish()
            }
        }
    }
}

impl From<&str> for ArgumentType {
    fn from(name: &str) -> Self {
        ArgumentType::Named(name.to_string())
    }
}

impl From<String> for ArgumentType {
    fn from(name: String) -> Self {
        ArgumentType::Named(name)
    }
}

impl From<Regex> for ArgumentType {
    fn from(regex: Regex) -> Self {
        ArgumentType::Pattern(regex)
    }
}

/// Cast `phrase` with `kind`.
pub async fn cast(
    kind: &ArgumentType,
    resolver: &TypeResolver,
    message: &Message,
    phrase: &str,
) -> Result<Outcome> {
    match kind {
        ArgumentType::Choices(entries) => Ok(cast_choice(entries, phrase)),
        ArgumentType::Caster(caster) => caster.cast(resolver, message, phrase).await,
        ArgumentType::Pattern(regex) => Ok(cast_pattern(regex, phrase)),
        ArgumentType::Named(name) => match resolver.get(name) {
            Some(caster) => caster.cast(resolver, message, phrase).await,
            None => Ok(phrase_or_null(phrase)),
        },
    }
}

pub(crate) fn phrase_or_null(phrase: &str) -> Outcome {
    if phrase.is_empty() {
        Outcome::null()
    } else {
        Value::from(phrase).into()
    }
}

fn cast_choice(entries: &[Vec<String>], phrase: &str) -> Outcome {
    if phrase.is_empty() {
        return Outcome::null();
    }
    let phrase = phrase.to_lowercase();
    entries
        .iter()
        .find(|aliases| aliases.iter().any(|alias| alias.to_lowercase() == phrase))
        .and_then(|aliases| aliases.first())
        .map_or_else(Outcome::null, |canonical| Value::from(canonical.as_str()).into())
}

fn captures_to_value(captures: &regex::Captures<'_>) -> Value {
    Value::Array(
        captures
            .iter()
            .map(|group| group.map_or(Value::Null, |m| Value::from(m.as_str())))
            .collect(),
    )
}

fn cast_pattern(regex: &Regex, phrase: &str) -> Outcome {
    let Some(first) = regex.captures(phrase) else {
        return Outcome::null();
    };
    let matches = regex
        .captures_iter(phrase)
        .map(|captures| captures_to_value(&captures))
        .collect();
    Value::object([
        ("match", captures_to_value(&first)),
        ("matches", Value::Array(matches)),
    ])
    .into()
}

struct Compose {
    types: Vec<ArgumentType>,
    stop_on_failure: bool,
}

#[async_trait]
impl Caster for Compose {
    async fn cast(
        &self,
        resolver: &TypeResolver,
        message: &Message,
        phrase: &str,
    ) -> Result<Outcome> {
        let mut acc = Outcome::from(Value::from(phrase));
        for kind in &self.types {
            let input = acc.as_input();
            acc = cast(kind, resolver, message, &input).await?;
            if self.stop_on_failure && acc.is_failure() {
                return Ok(acc);
            }
        }
        Ok(acc)
    }
}

struct Union {
    types: Vec<ArgumentType>,
}

#[async_trait]
impl Caster for Union {
    async fn cast(
        &self,
        resolver: &TypeResolver,
        message: &Message,
        phrase: &str,
    ) -> Result<Outcome> {
        for kind in &self.types {
            let res = cast(kind, resolver, message, phrase).await?;
            if !res.is_failure() {
                return Ok(res);
            }
        }
        Ok(Outcome::null())
    }
}

struct Product {
    types: Vec<ArgumentType>,
}

#[async_trait]
impl Caster for Product {
    async fn cast(
        &self,
        resolver: &TypeResolver,
        message: &Message,
        phrase: &str,
    ) -> Result<Outcome> {
        let mut results = Vec::with_capacity(self.types.len());
        for kind in &self.types {
            let res = cast(kind, resolver, message, phrase).await?;
            if res.is_failure() {
                return Ok(res);
            }
            results.push(res.into_value());
        }
        Ok(Value::Array(results).into())
    }
}

type Predicate = Arc<dyn Fn(&Message, &str, &Value) -> bool + Send + Sync>;

struct Validate {
    kind: ArgumentType,
    predicate: Predicate,
}

#[async_trait]
impl Caster for Validate {
    async fn cast(
        &self,
        resolver: &TypeResolver,
        message: &Message,
        phrase: &str,
    ) -> Result<Outcome> {
        let res = cast(&self.kind, resolver, message, phrase).await?;
        match &res {
            Outcome::Value(value) if !value.is_null() => {
                if (self.predicate)(message, phrase, value) {
                    Ok(res)
                } else {
                    Ok(Outcome::null())
                }
            }
            _ => Ok(res),
        }
    }
}

struct Tagged {
    kind: ArgumentType,
    tag: Option<String>,
    with_input: bool,
}

#[async_trait]
impl Caster for Tagged {
    async fn cast(
        &self,
        resolver: &TypeResolver,
        message: &Message,
        phrase: &str,
    ) -> Result<Outcome> {
        let res = cast(&self.kind, resolver, message, phrase).await?;
        let failed = res.is_failure();
        let value = match res {
            Outcome::Flag(Flag::Fail(reason)) => reason,
            Outcome::Value(value) => value,
            flag @ Outcome::Flag(_) => return Ok(flag),
        };

        let mut fields = Vec::with_capacity(3);
        if let Some(tag) = &self.tag {
            fields.push(("tag", Value::from(tag.as_str())));
        }
        if self.with_input {
            fields.push(("input", Value::from(phrase)));
        }
        fields.push(("value", value));
        let tagged = Value::object(fields);

        if failed {
            Ok(Flag::fail(tagged).into())
        } else {
            Ok(tagged.into())
        }
    }
}

/// Pipe the phrase through each type in turn, stopping at the first failure.
pub fn compose(types: impl IntoIterator<Item = ArgumentType>) -> ArgumentType {
    ArgumentType::caster(Compose {
        types: types.into_iter().collect(),
        stop_on_failure: true,
    })
}

/// Pipe the phrase through each type in turn, failures included.
pub fn compose_with_failure(types: impl IntoIterator<Item = ArgumentType>) -> ArgumentType {
    ArgumentType::caster(Compose {
        types: types.into_iter().collect(),
        stop_on_failure: false,
    })
}

/// The first type that casts successfully.
pub fn union(types: impl IntoIterator<Item = ArgumentType>) -> ArgumentType {
    ArgumentType::caster(Union {
        types: types.into_iter().collect(),
    })
}

/// Cast the phrase with every type; all must succeed.
pub fn product(types: impl IntoIterator<Item = ArgumentType>) -> ArgumentType {
    ArgumentType::caster(Product {
        types: types.into_iter().collect(),
    })
}

/// Cast, then check the value with `predicate`.
pub fn validate<P>(kind: ArgumentType, predicate: P) -> ArgumentType
where
    P: Fn(&Message, &str, &Value) -> bool + Send + Sync + 'static,
{
    ArgumentType::caster(Validate {
        kind,
        predicate: Arc::new(predicate),
    })
}

/// Cast, then require `min <= size < max` (`<= max` when inclusive).
///
/// Numbers are compared by value, strings by character count and arrays or
/// objects by length.
pub fn range(kind: ArgumentType, min: f64, max: f64, inclusive: bool) -> ArgumentType {
    validate(kind, move |_, _, value| {
        value.measure().is_some_and(|size| {
            size >= min && if inclusive { size <= max } else { size < max }
        })
    })
}

/// Wrap the result as `{tag, value}`; failures become `Fail({tag, value})`.
pub fn tagged(kind: ArgumentType, tag: Option<String>) -> ArgumentType {
    let tag = tag.unwrap_or_else(|| kind.tag());
    ArgumentType::caster(Tagged {
        kind,
        tag: Some(tag),
        with_input: false,
    })
}

/// Union of tagged types, so the result tells which type matched.
pub fn tagged_union(types: impl IntoIterator<Item = ArgumentType>) -> ArgumentType {
    union(types.into_iter().map(|kind| tagged(kind, None)))
}

/// Wrap the result as `{input, value}`; failures become `Fail({input, value})`.
pub fn with_input(kind: ArgumentType) -> ArgumentType {
    ArgumentType::caster(Tagged {
        kind,
        tag: None,
        with_input: true,
    })
}

/// Wrap the result as `{tag, input, value}`.
pub fn tagged_with_input(kind: ArgumentType, tag: Option<String>) -> ArgumentType {
    let tag = tag.unwrap_or_else(|| kind.tag());
    ArgumentType::caster(Tagged {
        kind,
        tag: Some(tag),
        with_input: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> Message {
        Message::new("general", "alice", "")
    }

    async fn run(kind: &ArgumentType, phrase: &str) -> Outcome {
        cast(kind, &TypeResolver::new(), &message(), phrase).await.unwrap()
    }

    #[tokio::test]
    async fn test_choices_return_canonical_alias() {
        let kind = ArgumentType::aliases([vec!["red", "r"], vec!["blue", "b"]]);
        assert_eq!(run(&kind, "R").await, Value::from("red").into());
        assert_eq!(run(&kind, "BLUE").await, Value::from("blue").into());
        assert!(run(&kind, "green").await.is_failure());
        assert!(run(&kind, "").await.is_failure());
    }

    #[tokio::test]
    async fn test_pattern() {
        let kind = ArgumentType::from(Regex::new(r"(\d+)-(\d+)").unwrap());
        let res = run(&kind, "1-2 and 30-40").await.into_value();
        let first = res.get("match").unwrap().as_array().unwrap();
        assert_eq!(first[0], Value::from("1-2"));
        assert_eq!(first[2], Value::from("2"));
        assert_eq!(res.get("matches").unwrap().as_array().unwrap().len(), 2);
        assert!(run(&kind, "nope").await.is_failure());
    }

    #[tokio::test]
    async fn test_unknown_named_type_falls_back_to_phrase() {
        let kind = ArgumentType::named("no-such-type");
        assert_eq!(run(&kind, "x").await, Value::from("x").into());
        assert!(run(&kind, "").await.is_failure());
    }

    #[tokio::test]
    async fn test_inline_casters() {
        let sync = ArgumentType::from_fn(|_, phrase| Value::Integer(phrase.len() as i64).into());
        assert_eq!(run(&sync, "abc").await, Value::Integer(3).into());

        let asynchronous = ArgumentType::from_async_fn(|_, phrase| async move {
            Ok(Value::from(phrase.repeat(2)).into())
        });
        assert_eq!(run(&asynchronous, "ab").await, Value::from("abab").into());
    }

    #[tokio::test]
    async fn test_compose_stops_at_failure() {
        let kind = compose(["integer".into(), ArgumentType::choices(["1", "2"])]);
        assert_eq!(run(&kind, "2").await, Value::from("2").into());
        assert!(run(&kind, "x").await.is_failure());
        assert!(run(&kind, "3").await.is_failure());
    }

    #[tokio::test]
    async fn test_compose_with_failure_continues() {
        let fallback = ArgumentType::from_fn(|_, phrase| {
            Value::from(if phrase.is_empty() { "empty" } else { phrase }).into()
        });
        let kind = compose_with_failure(["integer".into(), fallback]);
        assert_eq!(run(&kind, "x").await, Value::from("empty").into());
    }

    #[tokio::test]
    async fn test_union_and_product() {
        let either = union(["integer".into(), ArgumentType::choices(["all"])]);
        assert_eq!(run(&either, "5").await, Value::Integer(5).into());
        assert_eq!(run(&either, "ALL").await, Value::from("all").into());
        assert!(run(&either, "none").await.is_failure());

        let both = product(["integer".into(), "string".into()]);
        assert_eq!(
            run(&both, "7").await,
            Value::Array(vec![Value::Integer(7), Value::from("7")]).into()
        );
        assert!(run(&both, "x").await.is_failure());
    }

    #[tokio::test]
    async fn test_range() {
        let exclusive = range("integer".into(), 1.0, 10.0, false);
        assert!(!run(&exclusive, "1").await.is_failure());
        assert!(run(&exclusive, "10").await.is_failure());

        let inclusive = range("integer".into(), 1.0, 10.0, true);
        assert!(!run(&inclusive, "10").await.is_failure());

        let length = range("string".into(), 0.0, 3.0, false);
        assert!(!run(&length, "ab").await.is_failure());
        assert!(run(&length, "abcd").await.is_failure());
    }

    #[tokio::test]
    async fn test_validate() {
        let even = validate("integer".into(), |_, _, value| {
            value.as_i64().is_some_and(|n| n % 2 == 0)
        });
        assert_eq!(run(&even, "4").await, Value::Integer(4).into());
        assert!(run(&even, "3").await.is_failure());
    }

    #[tokio::test]
    async fn test_tagged_failure_is_structured() {
        let kind = tagged("integer".into(), None);
        let ok = run(&kind, "3").await.into_value();
        assert_eq!(ok.get("tag"), Some(&Value::from("integer")));
        assert_eq!(ok.get("value"), Some(&Value::Integer(3)));

        match run(&kind, "x").await {
            Outcome::Flag(Flag::Fail(reason)) => {
                assert_eq!(reason.get("tag"), Some(&Value::from("integer")));
                assert_eq!(reason.get("value"), Some(&Value::Null));
            }
            other => panic!("expected fail flag, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tagged_union() {
        let kind = tagged_union(["integer".into(), "string".into()]);
        let res = run(&kind, "abc").await.into_value();
        assert_eq!(res.get("tag"), Some(&Value::from("string")));
    }

    #[tokio::test]
    async fn test_with_input() {
        let kind = with_input("integer".into());
        let res = run(&kind, "12").await.into_value();
        assert_eq!(res.get("input"), Some(&Value::from("12")));
        assert_eq!(res.get("tag"), None);

        let kind = tagged_with_input("integer".into(), Some("count".into()));
        match run(&kind, "x").await {
            Outcome::Flag(Flag::Fail(reason)) => {
                assert_eq!(reason.get("tag"), Some(&Value::from("count")));
                assert_eq!(reason.get("input"), Some(&Value::from("x")));
            }
            other => panic!("expected fail flag, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cast_is_idempotent() {
        let kind = tagged_union(["integer".into(), "url".into(), "string".into()]);
        for phrase in ["1", "https://example.com", "word", ""] {
            assert_eq!(run(&kind, phrase).await, run(&kind, phrase).await);
        }
    }
}
