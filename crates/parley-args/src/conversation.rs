//! The conversation capability: sending prompts and awaiting replies.
//!
//! ## Channel Architecture
//!
//! [`ChannelConversation`] bridges the argument engine to whatever transport
//! actually talks to users:
//!
//! - Sent messages go out on a `tokio::sync::mpsc::UnboundedSender`, so
//!   sending never blocks on the transport.
//! - Replies come in on an `UnboundedReceiver`. One waiter at a time drains
//!   it; messages meant for another (channel, author) are parked in a
//!   per-key queue and the other waiters are woken to look for theirs. Many
//!   prompts can wait on the same conversation at once.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::PoisonError;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Mutex, MutexGuard, Notify};
use tokio::time::{sleep_until, timeout_at, Instant};

use crate::error::{Error, Result};

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub channel: String,
    pub author: String,
    pub content: String,
}

impl Message {
    pub fn new(
        channel: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            author: author.into(),
            content: content.into(),
        }
    }
}

/// Sends messages and waits for replies.
#[async_trait]
pub trait Conversation: Send + Sync {
    /// Send `content` to `channel`, returning the sent message.
    async fn send(&self, channel: &str, content: &str) -> Result<Message>;

    /// Wait up to `time` for one message from `author` in `channel`.
    ///
    /// Returns `Ok(None)` when the time runs out.
    async fn await_reply(
        &self,
        channel: &str,
        author: &str,
        time: Duration,
    ) -> Result<Option<Message>>;
}

/// Tells whether a message is itself a command invocation.
///
/// Prompts use this to let a user break out of a prompt by typing a new
/// command.
pub trait CommandDetector: Send + Sync {
    fn is_command(&self, message: &Message) -> bool;
}

impl<F> CommandDetector for F
where
    F: Fn(&Message) -> bool + Send + Sync,
{
    fn is_command(&self, message: &Message) -> bool {
        self(message)
    }
}

/// A [`Conversation`] over tokio channels.
pub struct ChannelConversation {
    /// Author id stamped on sent messages.
    name: String,
    outgoing: UnboundedSender<Message>,
    incoming: Mutex<UnboundedReceiver<Message>>,
    /// Replies received by one waiter on behalf of another, by (channel, author).
    parked: std::sync::Mutex<HashMap<(String, String), VecDeque<Message>>>,
    arrived: Notify,
    closed: AtomicBool,
}

impl ChannelConversation {
    /// Create a conversation speaking as `name`.
    ///
    /// Returns:
    /// - the conversation
    /// - `UnboundedSender<Message>` - push user replies here
    /// - `UnboundedReceiver<Message>` - every message the conversation sent
    pub fn new(
        name: impl Into<String>,
    ) -> (Self, UnboundedSender<Message>, UnboundedReceiver<Message>) {
        let (reply_tx, reply_rx) = unbounded_channel();
        let (sent_tx, sent_rx) = unbounded_channel();
        let conversation = Self {
            name: name.into(),
            outgoing: sent_tx,
            incoming: Mutex::new(reply_rx),
            parked: std::sync::Mutex::new(HashMap::new()),
            arrived: Notify::new(),
            closed: AtomicBool::new(false),
        };
        (conversation, reply_tx, sent_rx)
    }

    fn take_parked(&self, channel: &str, author: &str) -> Option<Message> {
        let mut parked = self.parked.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (channel.to_string(), author.to_string());
        let queue = parked.get_mut(&key)?;
        let message = queue.pop_front();
        if queue.is_empty() {
            parked.remove(&key);
        }
        message
    }

    fn park(&self, message: Message) {
        tracing::trace!(
            channel = %message.channel,
            author = %message.author,
            "parking message for another waiter"
        );
        self.parked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((message.channel.clone(), message.author.clone()))
            .or_default()
            .push_back(message);
        self.arrived.notify_waiters();
    }

    /// Drain the receiver until a message for (channel, author) shows up.
    async fn receive(
        &self,
        mut incoming: MutexGuard<'_, UnboundedReceiver<Message>>,
        channel: &str,
        author: &str,
        deadline: Option<Instant>,
    ) -> Result<Option<Message>> {
        // The previous holder may have parked ours just before letting go.
        if let Some(message) = self.take_parked(channel, author) {
            return Ok(Some(message));
        }

        loop {
            let next = match deadline {
                Some(deadline) => match timeout_at(deadline, incoming.recv()).await {
                    Ok(next) => next,
                    Err(_) => return Ok(None),
                },
                None => incoming.recv().await,
            };

            match next {
                Some(message) if message.channel == channel && message.author == author => {
                    return Ok(Some(message));
                }
                Some(message) => self.park(message),
                None => {
                    self.closed.store(true, Ordering::Release);
                    self.arrived.notify_waiters();
                    return Err(Error::transport("reply channel closed"));
                }
            }
        }
    }
}

#[async_trait]
impl Conversation for ChannelConversation {
    async fn send(&self, channel: &str, content: &str) -> Result<Message> {
        let message = Message::new(channel, self.name.clone(), content);
        self.outgoing
            .send(message.clone())
            .map_err(|e| Error::transport(format!("Failed to send message: {}", e)))?;
        Ok(message)
    }

    async fn await_reply(
        &self,
        channel: &str,
        author: &str,
        time: Duration,
    ) -> Result<Option<Message>> {
        // A time too large to represent means no deadline.
        let deadline = Instant::now().checked_add(time);

        loop {
            // Register for wake-ups before looking, so a park in between is not missed.
            let arrived = self.arrived.notified();
            tokio::pin!(arrived);
            arrived.as_mut().enable();

            if let Some(message) = self.take_parked(channel, author) {
                return Ok(Some(message));
            }
            if self.closed.load(Ordering::Acquire) {
                return Err(Error::transport("reply channel closed"));
            }

            tokio::select! {
                incoming = self.incoming.lock() => {
                    return self.receive(incoming, channel, author, deadline).await;
                }
                _ = &mut arrived => {}
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    return Ok(None);
                }
            }
        }
    }
}
