pub mod telegram;

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::types::Notification;

pub use telegram::TelegramNotifier;

/// Delivers text to a user-facing channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, user_id: i64, text: &str) -> Result<()>;
}

/// Keeps every delivered message; used by tests and dry runs.
#[derive(Clone, Debug, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, user_id: i64, text: &str) -> Result<()> {
        if self.failing.load(Ordering::Acquire) {
            bail!("notifier unavailable");
        }
        self.sent.lock().await.push(Notification {
            user_id,
            text: text.to_string(),
        });
        Ok(())
    }
}

/// Split `message` into chunks of at most `chunk_size` bytes, breaking at the
/// last space inside each chunk when there is one.
pub fn split_message(message: &str, chunk_size: usize) -> Vec<String> {
    if chunk_size == 0 || message.len() <= chunk_size {
        return vec![message.to_string()];
    }

    let mut parts = Vec::new();
    let mut rest = message;
    while rest.len() > chunk_size {
        let mut end = chunk_size;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let cut = match rest[..end].rfind(' ') {
            Some(i) if i > 0 => i,
            _ => end,
        };
        // A multi-byte char wider than chunk_size; emit it whole.
        let cut = if cut == 0 {
            rest.chars().next().map_or(rest.len(), char::len_utf8)
        } else {
            cut
        };
        parts.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }
    if !rest.is_empty() {
        parts.push(rest.to_string());
    }
    parts
}
