//! Shared harness for argument integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use parley_args::{ChannelConversation, Handler, Message};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub const CHANNEL: &str = "general";
pub const USER: &str = "alice";

pub struct Harness {
    pub handler: Handler,
    replies: UnboundedSender<Message>,
    sent: UnboundedReceiver<Message>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(|handler| handler)
    }

    /// Build a harness, letting the test adjust the handler.
    pub fn with(configure: impl FnOnce(Handler) -> Handler) -> Self {
        let (conversation, replies, sent) = ChannelConversation::new("bot");
        let handler = configure(Handler::new(Arc::new(conversation)));
        Self {
            handler,
            replies,
            sent,
        }
    }

    /// The message that invoked the command.
    pub fn message(&self, content: &str) -> Message {
        Message::new(CHANNEL, USER, content)
    }

    /// Queue replies from the invoking user.
    pub fn reply(&self, contents: &[&str]) {
        for content in contents {
            self.replies
                .send(Message::new(CHANNEL, USER, *content))
                .expect("conversation dropped");
        }
    }

    pub fn reply_as(&self, author: &str, channel: &str, content: &str) {
        self.replies
            .send(Message::new(channel, author, content))
            .expect("conversation dropped");
    }

    /// Everything the bot has sent so far.
    pub fn sent(&mut self) -> Vec<String> {
        let mut texts = Vec::new();
        while let Ok(message) = self.sent.try_recv() {
            texts.push(message.content);
        }
        texts
    }
}
