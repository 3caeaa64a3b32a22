//! Producer loop shared by the queue and topic producers.
//!
//! Each iteration generates a fresh payload, encodes it and hands it to a
//! `MessageSink`. Successful sends are paced by `send_interval`; failures are
//! logged and retried according to the `RetryPolicy`. The loop ends when the
//! shutdown future resolves or the retry policy gives up.

pub mod retry;

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::bus::{OutgoingMessage, Publishable};

pub use retry::{Backoff, RetryPolicy};

/// Destination for encoded messages.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<()>;
}

/// Pacing and retry behavior of a producer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    /// Pause after a successful send
    pub send_interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            send_interval: Duration::from_secs(3),
            retry: RetryPolicy::default(),
        }
    }
}

/// Totals reported when a producer stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerSummary {
    pub sent: u64,
    pub failed: u64,
}

/// Run a producer until `shutdown` resolves.
///
/// `next` is called once per iteration, including after a failure, so every
/// attempt publishes a freshly generated payload.
///
/// Returns the totals on shutdown, or the last send error once the retry
/// policy is exhausted.
pub async fn run<S, P, G, F>(
    sink: &S,
    mut next: G,
    settings: &LoopSettings,
    shutdown: F,
) -> Result<ProducerSummary>
where
    S: MessageSink + ?Sized,
    P: Publishable,
    G: FnMut() -> P,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut summary = ProducerSummary::default();
    let mut consecutive_failures = 0u32;

    loop {
        // Generate a fresh payload for every attempt
        let payload = next();

        // Publish unless shutdown was requested first
        let outcome = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            outcome = publish(sink, &payload) => outcome,
        };

        let pause = match outcome {
            Ok(()) => {
                summary.sent += 1;
                consecutive_failures = 0;
                info!("✅ Sent {}", payload.summary());
                info!(sent = summary.sent, "📊 Total messages sent: {}", summary.sent);
                settings.send_interval
            }
            Err(e) => {
                summary.failed += 1;
                consecutive_failures += 1;
                error!(
                    error = %e,
                    attempt = consecutive_failures,
                    "❌ Error in main loop: {e:#}"
                );

                // Give up once the retry policy is exhausted
                if settings.retry.is_exhausted(consecutive_failures) {
                    error!(
                        attempts = consecutive_failures,
                        sent = summary.sent,
                        "producer_retries_exhausted"
                    );
                    return Err(e).with_context(|| {
                        format!("Giving up after {consecutive_failures} consecutive failures")
                    });
                }

                let delay = settings.retry.delay_for(consecutive_failures);
                warn!(
                    delay_ms = delay.as_millis() as u64,
                    "⏳ Retrying in {:.1} seconds...",
                    delay.as_secs_f64()
                );
                delay
            }
        };

        // Wait for the next send, or stop early on shutdown
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = sleep(pause) => {}
        }
    }

    info!(
        sent = summary.sent,
        failed = summary.failed,
        "🛑 Stopped by user. Total messages sent: {}",
        summary.sent
    );

    Ok(summary)
}

async fn publish<S, P>(sink: &S, payload: &P) -> Result<()>
where
    S: MessageSink + ?Sized,
    P: Publishable,
{
    let message = OutgoingMessage::encode(payload).context("Failed to serialize payload")?;
    sink.send(&message).await
}
