//! Interactive prompting.
//!
//! When an argument cannot be cast from the command input, it may ask the
//! user for it instead. A prompt is a small state machine: send a start or
//! retry text, wait for one reply from the same user in the same channel,
//! then cancel, stop, retry or accept depending on the reply.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::cast::{self, ArgumentType};
use crate::conversation::{CommandDetector, Conversation, Message};
use crate::error::Result;
use crate::flag::{Flag, Outcome};
use crate::types::TypeResolver;
use crate::value::Value;

/// The moment a prompt text is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptEvent {
    /// First prompt.
    Start,
    /// The previous reply was invalid.
    Retry,
    /// No reply in time.
    Timeout,
    /// Retries ran out.
    Ended,
    /// The user typed the cancel word.
    Cancel,
}

/// What text suppliers get to look at.
#[derive(Debug, Clone, Copy)]
pub struct PromptData<'a> {
    pub event: PromptEvent,
    /// Retry count so far, starting at 1.
    pub retries: usize,
    pub infinite: bool,
    /// The message that led to this text.
    pub message: &'a Message,
    pub phrase: &'a str,
    pub failure: Option<&'a Outcome>,
}

type TextSupplier = Arc<dyn Fn(&PromptData<'_>) -> String + Send + Sync>;

/// Produces prompt text.
#[derive(Clone)]
pub enum Prompter {
    Text(String),
    /// Lines sent as one message.
    Lines(Vec<String>),
    Supplier(TextSupplier),
}

impl Prompter {
    pub fn supplier<F>(f: F) -> Self
    where
        F: Fn(&PromptData<'_>) -> String + Send + Sync + 'static,
    {
        Prompter::Supplier(Arc::new(f))
    }

    fn text(&self, data: &PromptData<'_>) -> String {
        match self {
            Prompter::Text(text) => text.clone(),
            Prompter::Lines(lines) => lines.join("\n"),
            Prompter::Supplier(f) => f(data),
        }
    }
}

impl fmt::Debug for Prompter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prompter::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Prompter::Lines(lines) => f.debug_tuple("Lines").field(lines).finish(),
            Prompter::Supplier(_) => f.write_str("Supplier(..)"),
        }
    }
}

impl From<&str> for Prompter {
    fn from(text: &str) -> Self {
        Prompter::Text(text.to_string())
    }
}

impl From<String> for Prompter {
    fn from(text: String) -> Self {
        Prompter::Text(text)
    }
}

impl From<Vec<String>> for Prompter {
    fn from(lines: Vec<String>) -> Self {
        Prompter::Lines(lines)
    }
}

/// Rewrites a prompt text after it is produced.
pub type PromptModifier = Arc<dyn Fn(&PromptData<'_>, String) -> String + Send + Sync>;

/// Prompt settings. Unset fields fall through to less specific settings.
#[derive(Clone, Default)]
pub struct PromptOptions {
    pub retries: Option<usize>,
    pub time: Option<Duration>,
    pub cancel_word: Option<String>,
    pub stop_word: Option<String>,
    pub optional: Option<bool>,
    pub infinite: Option<bool>,
    pub limit: Option<usize>,
    pub breakout: Option<bool>,
    pub texts: HashMap<PromptEvent, Prompter>,
    pub modifiers: HashMap<PromptEvent, PromptModifier>,
}

impl PromptOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retries(mut self, retries: usize) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn time(mut self, time: Duration) -> Self {
        self.time = Some(time);
        self
    }

    pub fn cancel_word(mut self, word: impl Into<String>) -> Self {
        self.cancel_word = Some(word.into());
        self
    }

    pub fn stop_word(mut self, word: impl Into<String>) -> Self {
        self.stop_word = Some(word.into());
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }

    pub fn infinite(mut self, infinite: bool) -> Self {
        self.infinite = Some(infinite);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn breakout(mut self, breakout: bool) -> Self {
        self.breakout = Some(breakout);
        self
    }

    pub fn text(mut self, event: PromptEvent, prompter: impl Into<Prompter>) -> Self {
        self.texts.insert(event, prompter.into());
        self
    }

    pub fn start(self, prompter: impl Into<Prompter>) -> Self {
        self.text(PromptEvent::Start, prompter)
    }

    pub fn retry(self, prompter: impl Into<Prompter>) -> Self {
        self.text(PromptEvent::Retry, prompter)
    }

    pub fn timeout(self, prompter: impl Into<Prompter>) -> Self {
        self.text(PromptEvent::Timeout, prompter)
    }

    pub fn ended(self, prompter: impl Into<Prompter>) -> Self {
        self.text(PromptEvent::Ended, prompter)
    }

    pub fn cancel(self, prompter: impl Into<Prompter>) -> Self {
        self.text(PromptEvent::Cancel, prompter)
    }

    pub fn modify<F>(mut self, event: PromptEvent, f: F) -> Self
    where
        F: Fn(&PromptData<'_>, String) -> String + Send + Sync + 'static,
    {
        self.modifiers.insert(event, Arc::new(f));
        self
    }

    /// Layer `other` on top of these options. Fields set in `other` win.
    pub fn merge(&self, other: &PromptOptions) -> PromptOptions {
        let mut texts = self.texts.clone();
        texts.extend(other.texts.iter().map(|(k, v)| (*k, v.clone())));
        let mut modifiers = self.modifiers.clone();
        modifiers.extend(other.modifiers.iter().map(|(k, v)| (*k, v.clone())));

        PromptOptions {
            retries: other.retries.or(self.retries),
            time: other.time.or(self.time),
            cancel_word: other.cancel_word.clone().or_else(|| self.cancel_word.clone()),
            stop_word: other.stop_word.clone().or_else(|| self.stop_word.clone()),
            optional: other.optional.or(self.optional),
            infinite: other.infinite.or(self.infinite),
            limit: other.limit.or(self.limit),
            breakout: other.breakout.or(self.breakout),
            texts,
            modifiers,
        }
    }

    /// Fill unset fields with the defaults.
    pub fn resolve(&self) -> ResolvedPrompt {
        ResolvedPrompt {
            retries: self.retries.unwrap_or(1),
            time: self.time.unwrap_or(Duration::from_secs(30)),
            cancel_word: self.cancel_word.clone().unwrap_or_else(|| "cancel".to_string()),
            stop_word: self.stop_word.clone().unwrap_or_else(|| "stop".to_string()),
            infinite: self.infinite.unwrap_or(false),
            limit: self.limit.unwrap_or(usize::MAX),
            breakout: self.breakout.unwrap_or(true),
            texts: self.texts.clone(),
            modifiers: self.modifiers.clone(),
        }
    }
}

impl fmt::Debug for PromptOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptOptions")
            .field("retries", &self.retries)
            .field("time", &self.time)
            .field("cancel_word", &self.cancel_word)
            .field("stop_word", &self.stop_word)
            .field("optional", &self.optional)
            .field("infinite", &self.infinite)
            .field("limit", &self.limit)
            .field("breakout", &self.breakout)
            .field("texts", &self.texts)
            .field("modifiers", &self.modifiers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Prompt settings with every field decided.
#[derive(Clone)]
pub struct ResolvedPrompt {
    pub retries: usize,
    pub time: Duration,
    pub cancel_word: String,
    pub stop_word: String,
    pub infinite: bool,
    pub limit: usize,
    pub breakout: bool,
    texts: HashMap<PromptEvent, Prompter>,
    modifiers: HashMap<PromptEvent, PromptModifier>,
}

impl ResolvedPrompt {
    /// Text for `data.event`, empty when none is configured.
    pub fn text_for(&self, data: &PromptData<'_>) -> String {
        let text = self
            .texts
            .get(&data.event)
            .map(|prompter| prompter.text(data))
            .unwrap_or_default();
        match self.modifiers.get(&data.event) {
            Some(modify) => modify(data, text),
            None => text,
        }
    }
}

type PromptKey = (String, String);

/// Tracks which (channel, user) pairs are currently being prompted.
///
/// Dispatchers consult it to avoid treating prompt replies as commands.
#[derive(Debug, Clone, Default)]
pub struct PromptRegistry {
    active: Arc<Mutex<HashSet<PromptKey>>>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<PromptKey>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn has_prompt(&self, channel: &str, user: &str) -> bool {
        self.lock().contains(&(channel.to_string(), user.to_string()))
    }

    /// Mark the pair as prompted until the guard drops.
    pub fn acquire(&self, channel: &str, user: &str) -> PromptGuard {
        let key = (channel.to_string(), user.to_string());
        self.lock().insert(key.clone());
        PromptGuard {
            registry: self.clone(),
            key,
        }
    }
}

/// Releases a prompt marker on drop.
#[derive(Debug)]
pub struct PromptGuard {
    registry: PromptRegistry,
    key: PromptKey,
}

impl Drop for PromptGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.key);
    }
}

/// Everything one prompt collection needs.
pub(crate) struct Collector<'a> {
    pub conversation: &'a dyn Conversation,
    pub detector: Option<&'a dyn CommandDetector>,
    pub registry: &'a PromptRegistry,
    pub resolver: &'a TypeResolver,
    pub kind: &'a ArgumentType,
    pub prompt: ResolvedPrompt,
    pub infinite: bool,
}

impl Collector<'_> {
    async fn say(&self, origin: &Message, data: PromptData<'_>) -> Result<()> {
        let text = self.prompt.text_for(&data);
        if text.is_empty() {
            return Ok(());
        }
        tracing::debug!(event = ?data.event, retries = data.retries, "sending prompt text");
        self.conversation.send(&origin.channel, &text).await?;
        Ok(())
    }

    fn data<'d>(
        &self,
        event: PromptEvent,
        retries: usize,
        message: &'d Message,
        phrase: &'d str,
        failure: Option<&'d Outcome>,
    ) -> PromptData<'d> {
        PromptData {
            event,
            retries,
            infinite: self.infinite,
            message,
            phrase,
            failure,
        }
    }

    /// Prompt `origin`'s author until a value is collected or the prompt ends.
    ///
    /// A non-empty `command_input` already failed once, so the first text is a
    /// retry text.
    pub async fn collect(
        &self,
        origin: &Message,
        command_input: &str,
        failure: Option<&Outcome>,
    ) -> Result<Outcome> {
        let _guard = self.registry.acquire(&origin.channel, &origin.author);

        let mut retry_count = if command_input.is_empty() { 1 } else { 2 };
        let mut values: Vec<Value> = Vec::new();
        let mut prev_message = origin.clone();
        let mut prev_phrase = command_input.to_string();
        let mut prev_failure = failure.cloned();

        loop {
            if retry_count != 1 || !self.infinite || values.is_empty() {
                let event = if retry_count == 1 {
                    PromptEvent::Start
                } else {
                    PromptEvent::Retry
                };
                let data = self.data(
                    event,
                    retry_count,
                    &prev_message,
                    &prev_phrase,
                    prev_failure.as_ref(),
                );
                self.say(origin, data).await?;
            }

            let reply = self
                .conversation
                .await_reply(&origin.channel, &origin.author, self.prompt.time)
                .await?;
            let Some(reply) = reply else {
                tracing::debug!(retries = retry_count, "prompt timed out");
                let data = self.data(
                    PromptEvent::Timeout,
                    retry_count,
                    &prev_message,
                    &prev_phrase,
                    None,
                );
                self.say(origin, data).await?;
                return Ok(Flag::cancel().into());
            };

            if self.prompt.breakout && self.detector.is_some_and(|d| d.is_command(&reply)) {
                tracing::debug!("prompt broken out of by a new command");
                return Ok(Flag::retry(reply).into());
            }

            let content = reply.content.to_lowercase();
            if content == self.prompt.cancel_word.to_lowercase() {
                tracing::debug!("prompt cancelled");
                let data =
                    self.data(PromptEvent::Cancel, retry_count, &reply, &reply.content, None);
                self.say(origin, data).await?;
                return Ok(Flag::cancel().into());
            }

            if self.infinite && content == self.prompt.stop_word.to_lowercase() {
                if values.is_empty() {
                    retry_count += 1;
                    prev_phrase = reply.content.clone();
                    prev_message = reply;
                    prev_failure = None;
                    continue;
                }
                return Ok(Value::Array(values).into());
            }

            let res = cast::cast(self.kind, self.resolver, &reply, &reply.content).await?;
            if res.is_failure() {
                if retry_count <= self.prompt.retries {
                    retry_count += 1;
                    prev_phrase = reply.content.clone();
                    prev_message = reply;
                    prev_failure = Some(res);
                    continue;
                }
                tracing::debug!(retries = retry_count, "prompt retries exhausted");
                let data = self.data(
                    PromptEvent::Ended,
                    retry_count,
                    &reply,
                    &reply.content,
                    Some(&res),
                );
                self.say(origin, data).await?;
                return Ok(Flag::cancel().into());
            }

            if res.is_short_circuit() {
                return Ok(res);
            }

            if !self.infinite {
                return Ok(res);
            }

            values.push(res.into_value());
            if values.len() >= self.prompt.limit {
                return Ok(Value::Array(values).into());
            }
            retry_count = 1;
            prev_phrase = reply.content;
            prev_message = origin.clone();
            prev_failure = None;
        }
    }
}
