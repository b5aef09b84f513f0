//! Commands and the handler context they run in.

use std::fmt;
use std::sync::Arc;

use parley_parser::ContentParser;

use crate::argument::{ArgumentDefaults, ArgumentOptions, Match};
use crate::conversation::{CommandDetector, Conversation, Message};
use crate::error::Result;
use crate::flag::Outcome;
use crate::prompt::PromptRegistry;
use crate::runner::{ArgumentGenerator, ArgumentList, ArgumentRunner};
use crate::types::TypeResolver;

/// Shared context for every command of one dispatcher.
#[derive(Clone)]
pub struct Handler {
    pub resolver: TypeResolver,
    pub conversation: Arc<dyn Conversation>,
    /// Handler-level defaults, the least specific.
    pub defaults: ArgumentDefaults,
    pub prompts: PromptRegistry,
    /// Recognizes replies that are new commands. Needed for breakout.
    pub detector: Option<Arc<dyn CommandDetector>>,
}

impl Handler {
    pub fn new(conversation: Arc<dyn Conversation>) -> Self {
        Self {
            resolver: TypeResolver::new(),
            conversation,
            defaults: ArgumentDefaults::default(),
            prompts: PromptRegistry::new(),
            detector: None,
        }
    }

    pub fn with_resolver(mut self, resolver: TypeResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_defaults(mut self, defaults: ArgumentDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_detector(mut self, detector: impl CommandDetector + 'static) -> Self {
        self.detector = Some(Arc::new(detector));
        self
    }

    /// Whether the user is in the middle of answering a prompt.
    pub fn has_prompt(&self, channel: &str, user: &str) -> bool {
        self.prompts.has_prompt(channel, user)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("defaults", &self.defaults)
            .field("prompts", &self.prompts)
            .field("detector", &self.detector.is_some())
            .finish_non_exhaustive()
    }
}

type GeneratorFactory = Arc<dyn Fn() -> Box<dyn ArgumentGenerator> + Send + Sync>;

/// How a command describes its arguments.
#[derive(Clone)]
pub enum CommandArgs {
    List(ArgumentList),
    /// Builds a fresh generator for every run.
    Generator(GeneratorFactory),
}

impl fmt::Debug for CommandArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandArgs::List(list) => f.debug_tuple("List").field(list).finish(),
            CommandArgs::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

/// One command's argument setup.
#[derive(Debug, Clone)]
pub struct Command {
    pub id: String,
    pub quoted: bool,
    pub separator: Option<String>,
    pub flag_words: Vec<String>,
    pub option_flag_words: Vec<String>,
    /// Command-level defaults.
    pub defaults: ArgumentDefaults,
    pub args: CommandArgs,
}

impl Command {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            quoted: true,
            separator: None,
            flag_words: Vec::new(),
            option_flag_words: Vec::new(),
            defaults: ArgumentDefaults::default(),
            args: CommandArgs::List(ArgumentList::default()),
        }
    }

    pub fn quoted(mut self, quoted: bool) -> Self {
        self.quoted = quoted;
        self
    }

    pub fn separator(mut self, separator: Option<impl Into<String>>) -> Self {
        self.separator = separator.map(Into::into);
        self
    }

    pub fn flag_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flag_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn option_flag_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.option_flag_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn defaults(mut self, defaults: ArgumentDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = ArgumentOptions>) -> Self {
        self.args = CommandArgs::List(ArgumentList::new(args));
        self
    }

    pub fn generator<F, G>(mut self, factory: F) -> Self
    where
        F: Fn() -> G + Send + Sync + 'static,
        G: ArgumentGenerator + 'static,
    {
        self.args = CommandArgs::Generator(Arc::new(move || {
            Box::new(factory()) as Box<dyn ArgumentGenerator>
        }));
        self
    }

    /// The content parser for this command.
    ///
    /// List-form commands also pick up the flag words of their `flag` and
    /// `option` arguments.
    pub fn content_parser(&self) -> ContentParser {
        let mut flag_words = self.flag_words.clone();
        let mut option_flag_words = self.option_flag_words.clone();
        if let CommandArgs::List(list) = &self.args {
            for arg in list.args() {
                match arg.matching {
                    Match::Flag => flag_words.extend(arg.flag.iter().cloned()),
                    Match::Option => option_flag_words.extend(arg.flag.iter().cloned()),
                    _ => {}
                }
            }
        }

        ContentParser::new()
            .quoted(self.quoted)
            .separator(self.separator.clone())
            .flag_words(flag_words)
            .option_flag_words(option_flag_words)
    }

    /// Parse `content` and run this command's arguments over it.
    pub async fn parse(
        &self,
        handler: &Handler,
        message: &Message,
        content: &str,
    ) -> Result<Outcome> {
        let parsed = self.content_parser().parse(content);
        tracing::debug!(
            command = %self.id,
            entries = parsed.all.len(),
            "running command arguments"
        );

        let runner = ArgumentRunner::new(handler, &self.defaults);
        match &self.args {
            CommandArgs::List(list) => {
                let mut generator = list.restart();
                runner.run(message, &parsed, &mut generator).await
            }
            CommandArgs::Generator(factory) => {
                let mut generator = factory();
                runner.run(message, &parsed, generator.as_mut()).await
            }
        }
    }
}
