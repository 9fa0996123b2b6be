use async_trait::async_trait;
use std::sync::Arc;
use teloxide::RequestError;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub const TRIGGER: &str = "/hi";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub chat_id: i64,
    pub user_id: Option<u64>,
    pub first_name: String,
    pub text: String,
}

#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: String) -> Result<(), RequestError>;
}

/// Reply to [`TRIGGER`].
pub fn greeting(first_name: &str) -> String {
    format!("Hello, {first_name}!")
}

/// Answers the trigger phrase with a greeting, ignores everything else.
pub struct MessageResponder {
    sender: Arc<dyn ChatSender>,
}

impl MessageResponder {
    pub fn new(sender: Arc<dyn ChatSender>) -> Self {
        Self { sender }
    }

    pub async fn handle(&self, event: MessageEvent) {
        info!(chat_id = event.chat_id, sender = ?event.user_id, text = %event.text, "new message");
        if event.text != TRIGGER {
            return;
        }
        if let Err(e) = self
            .sender
            .send_text(event.chat_id, greeting(&event.first_name))
            .await
        {
            warn!(chat_id = event.chat_id, error = %e, "failed to send greeting");
        }
    }

    pub async fn run(self, mut messages: mpsc::Receiver<MessageEvent>) {
        while let Some(event) = messages.recv().await {
            self.handle(event).await;
        }
        info!("message queue closed");
    }
}
