use crate::models::ChatMessage;

const GREETING: &str = "Hi! I'm your Technical Researcher agent. Ask me about the current \
setups, what a confidence score means, or how to manage risk on a trade.";

/// Conversation shown in the chat panel, oldest first.
#[derive(Debug, Clone)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatLog {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Assistant-role entry standing in for a failed reply.
    pub fn push_failure(&mut self, error: impl std::fmt::Display) -> ChatMessage {
        let message = ChatMessage::assistant(format!("Error: {error}"));
        self.messages.push(message.clone());
        message
    }
}
