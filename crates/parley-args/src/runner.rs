//! The argument runner.
//!
//! A command describes its arguments with an [`ArgumentGenerator`]: the
//! runner pulls one [`Step`] at a time, runs the yielded argument against
//! the parsed content and feeds the outcome back. This lets later arguments
//! depend on earlier results while the runner owns the cursor, casting,
//! prompting and control-flow handling.

use std::collections::{BTreeMap, HashSet};

use parley_parser::{join_raw, window, ParseResult};

use crate::argument::{Argument, ArgumentDefaults, ArgumentOptions, Match, Unordered};
use crate::command::Handler;
use crate::conversation::Message;
use crate::error::Result;
use crate::flag::{Flag, Outcome};
use crate::value::Value;

/// Cursor state shared by the arguments of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerState {
    /// Index into `ParseResult::all`.
    pub index: usize,
    /// Index into `ParseResult::phrases`.
    pub phrase_index: usize,
    /// Phrase indices taken by unordered arguments.
    pub used_indices: HashSet<usize>,
}

/// What a generator asks the runner to do next.
#[derive(Debug, Clone)]
pub enum Step {
    /// Run this argument and feed back its outcome.
    Argument(ArgumentOptions),
    /// Stop with this flag. Failures are fed back instead.
    Flag(Flag),
    /// The run is over.
    Done(Outcome),
}

/// Read-only view handed to generators.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorContext<'a> {
    pub message: &'a Message,
    pub parsed: &'a ParseResult,
    pub state: &'a RunnerState,
}

/// A pull-based argument description.
pub trait ArgumentGenerator: Send {
    /// Produce the next step. `feedback` is the outcome of the previous step,
    /// `None` on the first call.
    fn next(&mut self, context: &GeneratorContext<'_>, feedback: Option<Outcome>) -> Step;
}

/// A generator backed by a closure.
pub struct FnGenerator<F>(F);

impl<F> ArgumentGenerator for FnGenerator<F>
where
    F: FnMut(&GeneratorContext<'_>, Option<Outcome>) -> Step + Send,
{
    fn next(&mut self, context: &GeneratorContext<'_>, feedback: Option<Outcome>) -> Step {
        (self.0)(context, feedback)
    }
}

pub fn generator_fn<F>(f: F) -> FnGenerator<F>
where
    F: FnMut(&GeneratorContext<'_>, Option<Outcome>) -> Step + Send,
{
    FnGenerator(f)
}

/// A fixed list of arguments, producing an object keyed by argument id.
///
/// Failed arguments are stored as `Null`.
#[derive(Debug, Clone, Default)]
pub struct ArgumentList {
    args: Vec<ArgumentOptions>,
    cursor: usize,
    values: BTreeMap<String, Value>,
}

impl ArgumentList {
    pub fn new(args: impl IntoIterator<Item = ArgumentOptions>) -> Self {
        Self {
            args: args.into_iter().collect(),
            cursor: 0,
            values: BTreeMap::new(),
        }
    }

    pub fn args(&self) -> &[ArgumentOptions] {
        &self.args
    }

    /// A fresh copy, ready for a new run.
    pub fn restart(&self) -> Self {
        Self::new(self.args.iter().cloned())
    }
}

impl ArgumentGenerator for ArgumentList {
    fn next(&mut self, _: &GeneratorContext<'_>, feedback: Option<Outcome>) -> Step {
        if let (Some(outcome), Some(prev)) = (feedback, self.cursor.checked_sub(1)) {
            if let Some(arg) = self.args.get(prev) {
                self.values.insert(arg.id.clone(), outcome.into_value());
            }
        }

        match self.args.get(self.cursor) {
            Some(arg) => {
                self.cursor += 1;
                Step::Argument(arg.clone())
            }
            None => Step::Done(Value::Object(std::mem::take(&mut self.values)).into()),
        }
    }
}

/// Runs a generator against parsed content.
pub struct ArgumentRunner<'a> {
    handler: &'a Handler,
    /// Command-level defaults.
    defaults: &'a ArgumentDefaults,
}

impl<'a> ArgumentRunner<'a> {
    pub fn new(handler: &'a Handler, defaults: &'a ArgumentDefaults) -> Self {
        Self { handler, defaults }
    }

    /// Drive `generator` to completion.
    ///
    /// Returns the generator's final outcome, or the first short-circuit
    /// flag. A `Continue` flag without input of its own gets the rest of
    /// the content from the cursor on.
    pub async fn run(
        &self,
        message: &Message,
        parsed: &ParseResult,
        generator: &mut dyn ArgumentGenerator,
    ) -> Result<Outcome> {
        let mut state = RunnerState::default();
        let mut feedback = None;

        loop {
            let step = {
                let context = GeneratorContext {
                    message,
                    parsed,
                    state: &state,
                };
                generator.next(&context, feedback.take())
            };

            let res = match step {
                Step::Done(outcome) => return Ok(augment_rest(outcome, parsed, &state)),
                Step::Flag(flag) => Outcome::Flag(flag),
                Step::Argument(options) => {
                    tracing::debug!(
                        id = %options.id,
                        matching = %options.matching,
                        index = state.index,
                        phrase_index = state.phrase_index,
                        "running argument"
                    );
                    let arg = Argument::new(&options, self.handler, self.defaults);
                    self.run_one(message, parsed, &mut state, &arg).await?
                }
            };

            if res.is_short_circuit() {
                tracing::debug!(flag = ?res.flag().map(Flag::kind), "argument run short-circuited");
                return Ok(augment_rest(res, parsed, &state));
            }
            feedback = Some(res);
        }
    }

    async fn run_one(
        &self,
        message: &Message,
        parsed: &ParseResult,
        state: &mut RunnerState,
        arg: &Argument<'_>,
    ) -> Result<Outcome> {
        match arg.options.matching {
            Match::Phrase => self.run_phrase(message, parsed, state, arg).await,
            Match::Flag => Ok(self.run_flag(parsed, arg)),
            Match::Option => self.run_option(message, parsed, arg).await,
            Match::Rest => self.run_rest(message, parsed, state, arg).await,
            Match::Separate => self.run_separate(message, parsed, state, arg).await,
            Match::Text => self.run_text(message, parsed, arg).await,
            Match::Content => self.run_content(message, parsed, arg).await,
            Match::RestContent => self.run_rest_content(message, parsed, state, arg).await,
            Match::None => arg.process(message, "").await,
        }
    }

    async fn run_phrase(
        &self,
        message: &Message,
        parsed: &ParseResult,
        state: &mut RunnerState,
        arg: &Argument<'_>,
    ) -> Result<Outcome> {
        if let Some(unordered) = &arg.options.unordered {
            let len = parsed.phrases.len();
            let candidates: Vec<usize> = match unordered {
                Unordered::All => (0..len).collect(),
                Unordered::From(offset) => (*offset..len).collect(),
                Unordered::Indices(indices) => indices.clone(),
            };

            for i in candidates {
                if state.used_indices.contains(&i) {
                    continue;
                }
                let res = arg.cast(message, parsed.phrase_value(i)).await?;
                if !res.is_failure() {
                    state.used_indices.insert(i);
                    return Ok(res);
                }
            }
            return arg.process(message, "").await;
        }

        let index = arg.options.index.unwrap_or(state.phrase_index);
        let res = arg.process(message, parsed.phrase_value(index)).await?;
        if arg.options.index.is_none() {
            increase_index(parsed, state, 1);
        }
        Ok(res)
    }

    fn run_flag(&self, parsed: &ParseResult, arg: &Argument<'_>) -> Outcome {
        let names = &arg.options.flag;
        if arg.options.multiple_flags {
            let amount = parsed.flags.iter().filter(|entry| entry.has_key(names)).count();
            return Value::Integer(amount as i64).into();
        }
        let found = parsed.flags.iter().any(|entry| entry.has_key(names));
        Value::Boolean(found != arg.options.default.is_some()).into()
    }

    async fn run_option(
        &self,
        message: &Message,
        parsed: &ParseResult,
        arg: &Argument<'_>,
    ) -> Result<Outcome> {
        let names = &arg.options.flag;
        if arg.options.multiple_flags {
            let found = parsed
                .option_flags
                .iter()
                .filter(|entry| entry.has_key(names))
                .take(arg.options.limit);
            let mut values = Vec::new();
            for entry in found {
                let res = arg.process(message, entry.value()).await?;
                if res.is_short_circuit() {
                    return Ok(res);
                }
                values.push(res.into_value());
            }
            return Ok(Value::Array(values).into());
        }

        let phrase = parsed
            .option_flags
            .iter()
            .find(|entry| entry.has_key(names))
            .map_or("", |entry| entry.value());
        arg.process(message, phrase).await
    }

    async fn run_rest(
        &self,
        message: &Message,
        parsed: &ParseResult,
        state: &mut RunnerState,
        arg: &Argument<'_>,
    ) -> Result<Outcome> {
        let index = arg.options.index.unwrap_or(state.phrase_index);
        let range = window(parsed.phrases.len(), index, arg.options.limit);
        let rest = join_raw(&parsed.phrases[range]);
        let res = arg.process(message, rest.trim()).await?;
        if arg.options.index.is_none() {
            increase_index(parsed, state, 1);
        }
        Ok(res)
    }

    async fn run_separate(
        &self,
        message: &Message,
        parsed: &ParseResult,
        state: &mut RunnerState,
        arg: &Argument<'_>,
    ) -> Result<Outcome> {
        let index = arg.options.index.unwrap_or(state.phrase_index);
        let range = window(parsed.phrases.len(), index, arg.options.limit);
        let phrases = &parsed.phrases[range];

        if phrases.is_empty() {
            let res = arg.process(message, "").await?;
            if arg.options.index.is_none() {
                increase_index(parsed, state, 1);
            }
            return Ok(res);
        }

        let mut values = Vec::with_capacity(phrases.len());
        for entry in phrases {
            let res = arg.process(message, entry.value()).await?;
            if res.is_short_circuit() {
                return Ok(res);
            }
            values.push(res.into_value());
        }
        if arg.options.index.is_none() {
            increase_index(parsed, state, phrases.len());
        }
        Ok(Value::Array(values).into())
    }

    async fn run_text(
        &self,
        message: &Message,
        parsed: &ParseResult,
        arg: &Argument<'_>,
    ) -> Result<Outcome> {
        let index = arg.options.index.unwrap_or(0);
        let range = window(parsed.phrases.len(), index, arg.options.limit);
        let text = join_raw(&parsed.phrases[range]);
        arg.process(message, text.trim()).await
    }

    async fn run_content(
        &self,
        message: &Message,
        parsed: &ParseResult,
        arg: &Argument<'_>,
    ) -> Result<Outcome> {
        let index = arg.options.index.unwrap_or(0);
        let range = window(parsed.all.len(), index, arg.options.limit);
        let content = join_raw(&parsed.all[range]);
        arg.process(message, content.trim()).await
    }

    async fn run_rest_content(
        &self,
        message: &Message,
        parsed: &ParseResult,
        state: &mut RunnerState,
        arg: &Argument<'_>,
    ) -> Result<Outcome> {
        let index = arg.options.index.unwrap_or(state.index);
        let range = window(parsed.all.len(), index, arg.options.limit);
        let rest = join_raw(&parsed.all[range]);
        let res = arg.process(message, rest.trim()).await?;
        if arg.options.index.is_none() {
            increase_index(parsed, state, 1);
        }
        Ok(res)
    }
}

/// Advance the cursors past `n` phrases.
///
/// `index` always moves at least once per phrase, then skips any flag
/// entries so it rests on the next phrase.
pub fn increase_index(parsed: &ParseResult, state: &mut RunnerState, n: usize) {
    state.phrase_index += n;
    for _ in 0..n {
        state.index += 1;
        while parsed.all.get(state.index).is_some_and(|entry| !entry.is_phrase()) {
            state.index += 1;
        }
    }
}

/// Give a `Continue` flag without input the rest of the content.
pub fn augment_rest(outcome: Outcome, parsed: &ParseResult, state: &RunnerState) -> Outcome {
    match outcome {
        Outcome::Flag(Flag::Continue {
            command,
            ignore_checks,
            rest: None,
        }) => {
            let rest = parsed.raw_from(state.index);
            Flag::continue_with(command, ignore_checks, Some(rest)).into()
        }
        other => other,
    }
}
