//! Declarative command configuration.
//!
//! Commands can be described in JSON and converted into runtime
//! descriptors. Conversion validates eagerly: an unknown match kind, a bad
//! pattern or a flag argument without flag words is reported before any
//! input is parsed.

use std::fs;
use std::path::Path;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::argument::{ArgumentDefaults, ArgumentOptions, DefaultValue, Match, Unordered};
use crate::cast::ArgumentType;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::prompt::{PromptOptions, Prompter};
use crate::value::Value;

/// A single string or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(one) => vec![one],
            OneOrMany::Many(many) => many,
        }
    }
}

/// Text given as one string or as lines.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TextConfig {
    Text(String),
    Lines(Vec<String>),
}

impl TextConfig {
    fn into_string(self) -> String {
        match self {
            TextConfig::Text(text) => text,
            TextConfig::Lines(lines) => lines.join("\n"),
        }
    }
}

impl From<TextConfig> for Prompter {
    fn from(text: TextConfig) -> Self {
        match text {
            TextConfig::Text(text) => Prompter::Text(text),
            TextConfig::Lines(lines) => Prompter::Lines(lines),
        }
    }
}

/// A type name, or a list of choices where each choice may carry aliases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TypeConfig {
    Name(String),
    Choices(Vec<OneOrMany>),
}

impl From<TypeConfig> for ArgumentType {
    fn from(kind: TypeConfig) -> Self {
        match kind {
            TypeConfig::Name(name) => ArgumentType::Named(name),
            TypeConfig::Choices(choices) => {
                ArgumentType::aliases(choices.into_iter().map(OneOrMany::into_vec))
            }
        }
    }
}

/// `true` for every phrase, an offset, or explicit indices.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UnorderedConfig {
    Enabled(bool),
    From(usize),
    Indices(Vec<usize>),
}

impl From<UnorderedConfig> for Option<Unordered> {
    fn from(unordered: UnorderedConfig) -> Self {
        match unordered {
            UnorderedConfig::Enabled(true) => Some(Unordered::All),
            UnorderedConfig::Enabled(false) => None,
            UnorderedConfig::From(offset) => Some(Unordered::From(offset)),
            UnorderedConfig::Indices(indices) => Some(Unordered::Indices(indices)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromptConfig {
    pub retries: Option<usize>,
    /// Milliseconds to wait for each reply.
    pub time: Option<u64>,
    pub cancel_word: Option<String>,
    pub stop_word: Option<String>,
    pub optional: Option<bool>,
    pub infinite: Option<bool>,
    pub limit: Option<usize>,
    pub breakout: Option<bool>,
    pub start: Option<TextConfig>,
    pub retry: Option<TextConfig>,
    pub timeout: Option<TextConfig>,
    pub ended: Option<TextConfig>,
    pub cancel: Option<TextConfig>,
}

impl From<PromptConfig> for PromptOptions {
    fn from(config: PromptConfig) -> Self {
        let mut options = PromptOptions {
            retries: config.retries,
            time: config.time.map(Duration::from_millis),
            cancel_word: config.cancel_word,
            stop_word: config.stop_word,
            optional: config.optional,
            infinite: config.infinite,
            limit: config.limit,
            breakout: config.breakout,
            ..PromptOptions::default()
        };
        if let Some(text) = config.start {
            options = options.start(text);
        }
        if let Some(text) = config.retry {
            options = options.retry(text);
        }
        if let Some(text) = config.timeout {
            options = options.timeout(text);
        }
        if let Some(text) = config.ended {
            options = options.ended(text);
        }
        if let Some(text) = config.cancel {
            options = options.cancel(text);
        }
        options
    }
}

/// `true` to prompt with the inherited settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PromptSetting {
    Enabled(bool),
    Options(PromptConfig),
}

impl From<PromptSetting> for Option<PromptOptions> {
    fn from(setting: PromptSetting) -> Self {
        match setting {
            PromptSetting::Enabled(true) => Some(PromptOptions::default()),
            PromptSetting::Enabled(false) => None,
            PromptSetting::Options(config) => Some(config.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub prompt: PromptConfig,
    pub otherwise: Option<TextConfig>,
}

impl From<DefaultsConfig> for ArgumentDefaults {
    fn from(config: DefaultsConfig) -> Self {
        ArgumentDefaults {
            prompt: config.prompt.into(),
            otherwise: config.otherwise.map(|text| text.into_string().into()),
            modify_otherwise: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArgumentConfig {
    pub id: String,
    #[serde(rename = "match")]
    pub matching: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<TypeConfig>,
    /// A regular expression, used instead of `type`.
    pub pattern: Option<String>,
    pub flag: Option<OneOrMany>,
    #[serde(default)]
    pub multiple_flags: bool,
    pub index: Option<usize>,
    pub limit: Option<usize>,
    pub unordered: Option<UnorderedConfig>,
    pub default: Option<serde_json::Value>,
    pub otherwise: Option<TextConfig>,
    pub prompt: Option<PromptSetting>,
}

impl TryFrom<ArgumentConfig> for ArgumentOptions {
    type Error = Error;

    fn try_from(config: ArgumentConfig) -> Result<Self> {
        let matching = match &config.matching {
            Some(name) => name.parse::<Match>()?,
            None => Match::Phrase,
        };

        let kind = match (config.kind, config.pattern) {
            (Some(_), Some(_)) => {
                return Err(Error::config(format!(
                    "argument {:?} sets both a type and a pattern",
                    config.id
                )));
            }
            (Some(kind), None) => kind.into(),
            (None, Some(pattern)) => Regex::new(&pattern)
                .map_err(|e| {
                    Error::config(format!("argument {:?} has an invalid pattern: {}", config.id, e))
                })?
                .into(),
            (None, None) => ArgumentType::default(),
        };

        let flag = config.flag.map(OneOrMany::into_vec).unwrap_or_default();
        if matches!(matching, Match::Flag | Match::Option) && flag.is_empty() {
            return Err(Error::config(format!(
                "argument {:?} matches a {} but names no flag",
                config.id, matching
            )));
        }

        let mut options = ArgumentOptions::new(config.id)
            .kind(kind)
            .matching(matching)
            .flag(flag)
            .multiple_flags(config.multiple_flags);
        options.index = config.index;
        if let Some(limit) = config.limit {
            options.limit = limit;
        }
        options.unordered = config.unordered.and_then(Into::into);
        options.default = config
            .default
            .map(|default| DefaultValue::Value(Value::from(default)));
        options.otherwise = config.otherwise.map(|text| text.into_string().into());
        options.prompt = config.prompt.and_then(Into::into);
        Ok(options)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandConfig {
    pub id: String,
    #[serde(default = "default_quoted")]
    pub quoted: bool,
    pub separator: Option<String>,
    #[serde(default)]
    pub flag_words: Vec<String>,
    #[serde(default)]
    pub option_flag_words: Vec<String>,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub args: Vec<ArgumentConfig>,
}

fn default_quoted() -> bool {
    true
}

impl CommandConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn into_command(self) -> Result<Command> {
        self.try_into()
    }
}

impl TryFrom<CommandConfig> for Command {
    type Error = Error;

    fn try_from(config: CommandConfig) -> Result<Self> {
        let args = config
            .args
            .into_iter()
            .map(ArgumentOptions::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Command::new(config.id)
            .quoted(config.quoted)
            .separator(config.separator)
            .flag_words(config.flag_words)
            .option_flag_words(config.option_flag_words)
            .defaults(config.defaults.into())
            .args(args))
    }
}
