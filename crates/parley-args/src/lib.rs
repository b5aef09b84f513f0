//! Typed arguments for chat commands.
//!
//! Text after a command name is parsed by [`parley_parser`] into phrases and
//! flags. This crate turns those into typed values:
//!
//! - [`ArgumentType`] and [`TypeResolver`] cast phrases into [`Value`]s;
//! - [`Argument`] recovers from failed casts with defaults, otherwise texts
//!   or interactive prompts over a [`Conversation`];
//! - [`ArgumentRunner`] drives an [`ArgumentGenerator`] step by step,
//!   tracking the cursor into the parsed content;
//! - [`Flag`] carries control flow (cancel, retry, continue) back out to the
//!   command dispatcher.
//!
//! Commands can also be described in JSON with [`CommandConfig`].

pub mod argument;
pub mod cast;
pub mod command;
pub mod config;
pub mod conversation;
pub mod error;
pub mod flag;
pub mod prompt;
pub mod runner;
pub mod types;
pub mod value;

pub use argument::{
    Argument, ArgumentDefaults, ArgumentOptions, DefaultValue, FailureData, Match, Otherwise,
    OtherwiseModifier, Unordered,
};
pub use cast::{
    cast, compose, compose_with_failure, product, range, tagged, tagged_union, tagged_with_input,
    union, validate, with_input, ArgumentType, AsyncFnCaster, Caster, FnCaster,
};
pub use command::{Command, CommandArgs, Handler};
pub use config::{ArgumentConfig, CommandConfig, DefaultsConfig, PromptConfig};
pub use conversation::{ChannelConversation, CommandDetector, Conversation, Message};
pub use error::{Error, Result};
pub use flag::{Flag, FlagKind, Outcome};
pub use prompt::{
    PromptData, PromptEvent, PromptGuard, PromptModifier, PromptOptions, PromptRegistry, Prompter,
    ResolvedPrompt,
};
pub use runner::{
    generator_fn, increase_index, ArgumentGenerator, ArgumentList, ArgumentRunner, FnGenerator,
    GeneratorContext, RunnerState, Step,
};
pub use types::TypeResolver;
pub use value::Value;

pub use parley_parser::{ContentParser, ParseResult, ParsedEntry};
