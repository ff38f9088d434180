//! Simulated typing: replays an already complete answer one character at a
//! time so the page can animate it. Purely presentational; the answer is
//! never fetched incrementally.

use std::time::Duration;

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Typewriter {
    delay: Duration,
}

impl Typewriter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// No waiting between frames.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Send the cumulative text after each character. Stops early, without
    /// error, once the receiver is gone. Returns the number of frames sent.
    pub async fn replay(&self, text: &str, frames: &mpsc::Sender<String>) -> usize {
        let mut shown = String::with_capacity(text.len());
        let mut sent = 0;
        for c in text.chars() {
            shown.push(c);
            if frames.send(shown.clone()).await.is_err() {
                tracing::debug!(sent, "typing receiver closed, stopping replay");
                break;
            }
            sent += 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
        sent
    }
}

impl Default for Typewriter {
    fn default() -> Self {
        Self::new(Duration::from_millis(ivy_chat_client::config::DEFAULT_TYPING_DELAY_MS))
    }
}
