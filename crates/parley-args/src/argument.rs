//! Argument descriptors and per-argument processing.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::cast::{self, ArgumentType};
use crate::command::Handler;
use crate::conversation::Message;
use crate::error::{Error, Result};
use crate::flag::{Flag, Outcome};
use crate::prompt::{Collector, PromptOptions};
use crate::value::Value;

/// How an argument takes its input from the parsed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Match {
    /// One phrase, by position or unordered.
    #[default]
    Phrase,
    /// Presence of a flag word.
    Flag,
    /// The value after an option flag word.
    Option,
    /// The remaining phrases, joined by their raw text.
    Rest,
    /// Each remaining phrase cast on its own.
    Separate,
    /// All phrases, ignoring flags.
    Text,
    /// All content, flags included.
    Content,
    /// All content from the cursor on, flags included.
    RestContent,
    /// No input at all.
    None,
}

impl Match {
    pub fn as_str(&self) -> &'static str {
        match self {
            Match::Phrase => "phrase",
            Match::Flag => "flag",
            Match::Option => "option",
            Match::Rest => "rest",
            Match::Separate => "separate",
            Match::Text => "text",
            Match::Content => "content",
            Match::RestContent => "restContent",
            Match::None => "none",
        }
    }
}

impl FromStr for Match {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "phrase" => Ok(Match::Phrase),
            "flag" => Ok(Match::Flag),
            "option" => Ok(Match::Option),
            "rest" => Ok(Match::Rest),
            "separate" => Ok(Match::Separate),
            "text" => Ok(Match::Text),
            "content" => Ok(Match::Content),
            "restContent" | "rest_content" => Ok(Match::RestContent),
            "none" => Ok(Match::None),
            other => Err(Error::UnknownMatch(other.to_string())),
        }
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which phrases an unordered argument may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unordered {
    /// Any phrase.
    All,
    /// Any phrase from this index on.
    From(usize),
    /// Only these phrase indices, tried in order.
    Indices(Vec<usize>),
}

/// What default and otherwise suppliers receive.
#[derive(Debug, Clone, Copy)]
pub struct FailureData<'a> {
    pub phrase: &'a str,
    /// The failed cast, absent when the phrase was simply missing.
    pub failure: Option<&'a Outcome>,
}

type DefaultSupplier = Arc<dyn Fn(&Message, &FailureData<'_>) -> Outcome + Send + Sync>;

/// Value used when an argument is missing or fails.
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Supplier(DefaultSupplier),
}

impl DefaultValue {
    pub fn supplier<F>(f: F) -> Self
    where
        F: Fn(&Message, &FailureData<'_>) -> Outcome + Send + Sync + 'static,
    {
        DefaultValue::Supplier(Arc::new(f))
    }

    pub fn get(&self, message: &Message, data: &FailureData<'_>) -> Outcome {
        match self {
            DefaultValue::Value(value) => value.clone().into(),
            DefaultValue::Supplier(f) => f(message, data),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            DefaultValue::Supplier(_) => f.write_str("Supplier(..)"),
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        DefaultValue::Value(value)
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        DefaultValue::Value(value.into())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        DefaultValue::Value(value.into())
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        DefaultValue::Value(value.into())
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        DefaultValue::Value(value.into())
    }
}

type OtherwiseSupplier = Arc<dyn Fn(&Message, &FailureData<'_>) -> String + Send + Sync>;

/// Text sent instead of prompting when an argument fails.
#[derive(Clone)]
pub enum Otherwise {
    Text(String),
    Supplier(OtherwiseSupplier),
}

impl Otherwise {
    pub fn supplier<F>(f: F) -> Self
    where
        F: Fn(&Message, &FailureData<'_>) -> String + Send + Sync + 'static,
    {
        Otherwise::Supplier(Arc::new(f))
    }

    fn text(&self, message: &Message, data: &FailureData<'_>) -> String {
        match self {
            Otherwise::Text(text) => text.clone(),
            Otherwise::Supplier(f) => f(message, data),
        }
    }
}

impl fmt::Debug for Otherwise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Otherwise::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Otherwise::Supplier(_) => f.write_str("Supplier(..)"),
        }
    }
}

impl From<&str> for Otherwise {
    fn from(text: &str) -> Self {
        Otherwise::Text(text.to_string())
    }
}

impl From<String> for Otherwise {
    fn from(text: String) -> Self {
        Otherwise::Text(text)
    }
}

/// Rewrites an otherwise text.
pub type OtherwiseModifier =
    Arc<dyn Fn(&Message, String, &FailureData<'_>) -> String + Send + Sync>;

/// Defaults shared by the arguments of a command or a whole handler.
#[derive(Clone, Default)]
pub struct ArgumentDefaults {
    pub prompt: PromptOptions,
    pub otherwise: Option<Otherwise>,
    pub modify_otherwise: Option<OtherwiseModifier>,
}

impl ArgumentDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(mut self, prompt: PromptOptions) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn otherwise(mut self, otherwise: impl Into<Otherwise>) -> Self {
        self.otherwise = Some(otherwise.into());
        self
    }

    pub fn modify_otherwise<F>(mut self, f: F) -> Self
    where
        F: Fn(&Message, String, &FailureData<'_>) -> String + Send + Sync + 'static,
    {
        self.modify_otherwise = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for ArgumentDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentDefaults")
            .field("prompt", &self.prompt)
            .field("otherwise", &self.otherwise)
            .field("modify_otherwise", &self.modify_otherwise.is_some())
            .finish()
    }
}

/// Describes one argument.
#[derive(Clone)]
pub struct ArgumentOptions {
    pub id: String,
    pub kind: ArgumentType,
    pub matching: Match,
    /// Flag words for `flag` and `option` matches.
    pub flag: Vec<String>,
    pub multiple_flags: bool,
    /// Explicit position. Unset means the runner's cursor.
    pub index: Option<usize>,
    pub limit: usize,
    pub unordered: Option<Unordered>,
    pub default: Option<DefaultValue>,
    pub otherwise: Option<Otherwise>,
    pub modify_otherwise: Option<OtherwiseModifier>,
    /// Prompt settings. Setting this enables prompting.
    pub prompt: Option<PromptOptions>,
}

impl ArgumentOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ArgumentType::default(),
            matching: Match::Phrase,
            flag: Vec::new(),
            multiple_flags: false,
            index: None,
            limit: usize::MAX,
            unordered: None,
            default: None,
            otherwise: None,
            modify_otherwise: None,
            prompt: None,
        }
    }

    pub fn kind(mut self, kind: impl Into<ArgumentType>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn matching(mut self, matching: Match) -> Self {
        self.matching = matching;
        self
    }

    pub fn flag<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flag = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn multiple_flags(mut self, multiple: bool) -> Self {
        self.multiple_flags = multiple;
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn unordered(mut self, unordered: Unordered) -> Self {
        self.unordered = Some(unordered);
        self
    }

    pub fn default_value(mut self, default: impl Into<DefaultValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn otherwise(mut self, otherwise: impl Into<Otherwise>) -> Self {
        self.otherwise = Some(otherwise.into());
        self
    }

    pub fn modify_otherwise<F>(mut self, f: F) -> Self
    where
        F: Fn(&Message, String, &FailureData<'_>) -> String + Send + Sync + 'static,
    {
        self.modify_otherwise = Some(Arc::new(f));
        self
    }

    pub fn prompt(mut self, prompt: PromptOptions) -> Self {
        self.prompt = Some(prompt);
        self
    }
}

impl fmt::Debug for ArgumentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentOptions")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("matching", &self.matching)
            .field("flag", &self.flag)
            .field("multiple_flags", &self.multiple_flags)
            .field("index", &self.index)
            .field("limit", &self.limit)
            .field("unordered", &self.unordered)
            .field("default", &self.default)
            .field("otherwise", &self.otherwise)
            .field("prompt", &self.prompt)
            .finish()
    }
}

/// An argument bound to the handler and command it runs under.
pub struct Argument<'a> {
    pub options: &'a ArgumentOptions,
    pub handler: &'a Handler,
    /// Command-level defaults.
    pub defaults: &'a ArgumentDefaults,
}

impl<'a> Argument<'a> {
    pub fn new(
        options: &'a ArgumentOptions,
        handler: &'a Handler,
        defaults: &'a ArgumentDefaults,
    ) -> Self {
        Self {
            options,
            handler,
            defaults,
        }
    }

    /// Cast without any recovery.
    pub async fn cast(&self, message: &Message, phrase: &str) -> Result<Outcome> {
        cast::cast(&self.options.kind, &self.handler.resolver, message, phrase).await
    }

    /// Whether a missing phrase is acceptable. The argument's own prompt
    /// setting wins over the command's, which wins over the handler's.
    pub fn is_optional(&self) -> bool {
        self.options
            .prompt
            .as_ref()
            .and_then(|prompt| prompt.optional)
            .or(self.defaults.prompt.optional)
            .or(self.handler.defaults.prompt.optional)
            .unwrap_or(false)
    }

    /// Cast `phrase`, recovering from failure through otherwise, prompting
    /// or the default, in that order.
    pub async fn process(&self, message: &Message, phrase: &str) -> Result<Outcome> {
        if phrase.is_empty() && self.is_optional() {
            let data = FailureData {
                phrase,
                failure: None,
            };
            if self.options.otherwise.is_some() {
                return self.do_otherwise(message, &data).await;
            }
            return Ok(self.default_or_null(message, &data));
        }

        let res = self.cast(message, phrase).await?;
        if !res.is_failure() {
            return Ok(res);
        }

        tracing::debug!(id = %self.options.id, phrase, "cast failed");
        let data = FailureData {
            phrase,
            failure: Some(&res),
        };
        if self.options.otherwise.is_some() {
            return self.do_otherwise(message, &data).await;
        }
        if self.options.prompt.is_some() {
            return self.collect(message, phrase, Some(&res)).await;
        }
        match &self.options.default {
            Some(default) => Ok(default.get(message, &data)),
            None => Ok(res),
        }
    }

    fn default_or_null(&self, message: &Message, data: &FailureData<'_>) -> Outcome {
        self.options
            .default
            .as_ref()
            .map_or_else(Outcome::null, |default| default.get(message, data))
    }

    /// Send the otherwise text, if any, and cancel.
    pub async fn do_otherwise(&self, message: &Message, data: &FailureData<'_>) -> Result<Outcome> {
        let otherwise = self
            .options
            .otherwise
            .as_ref()
            .or(self.defaults.otherwise.as_ref())
            .or(self.handler.defaults.otherwise.as_ref());
        let modify = self
            .options
            .modify_otherwise
            .as_ref()
            .or(self.defaults.modify_otherwise.as_ref())
            .or(self.handler.defaults.modify_otherwise.as_ref());

        let mut text = otherwise
            .map(|otherwise| otherwise.text(message, data))
            .unwrap_or_default();
        if let Some(modify) = modify {
            text = modify(message, text, data);
        }
        if !text.is_empty() {
            self.handler.conversation.send(&message.channel, &text).await?;
        }
        Ok(Flag::cancel().into())
    }

    /// Prompt the user for this argument.
    pub async fn collect(
        &self,
        message: &Message,
        command_input: &str,
        failure: Option<&Outcome>,
    ) -> Result<Outcome> {
        let mut merged = self.handler.defaults.prompt.merge(&self.defaults.prompt);
        if let Some(prompt) = &self.options.prompt {
            merged = merged.merge(prompt);
        }
        let prompt = merged.resolve();
        let separate_from_empty =
            self.options.matching == Match::Separate && command_input.is_empty();
        let infinite = prompt.infinite || separate_from_empty;

        let collector = Collector {
            conversation: self.handler.conversation.as_ref(),
            detector: self.handler.detector.as_deref(),
            registry: &self.handler.prompts,
            resolver: &self.handler.resolver,
            kind: &self.options.kind,
            prompt,
            infinite,
        };
        collector.collect(message, command_input, failure).await
    }
}
