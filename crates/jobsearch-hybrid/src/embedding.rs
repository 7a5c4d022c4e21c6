//! Query embedding with bounded retry.
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};

use jobsearch_core::config::EmbeddingSettings;
use jobsearch_core::traits::Embedder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): backoff doubles each time.
    pub fn delay(&self, attempt: usize) -> Duration {
        let exp = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX).min(16);
        self.backoff.saturating_mul(1u32 << exp)
    }
}

impl From<&EmbeddingSettings> for RetryPolicy {
    fn from(s: &EmbeddingSettings) -> Self {
        Self { max_attempts: s.max_attempts.max(1), backoff: Duration::from_millis(s.retry_backoff_ms) }
    }
}

async fn embed_once(embedder: Arc<dyn Embedder>, text: String) -> Result<Vec<f32>> {
    let dim = embedder.dim();
    let mut vectors = tokio::task::spawn_blocking(move || embedder.embed_batch(&[text]))
        .await
        .map_err(|e| anyhow!("embedding task failed: {e}"))??;
    let Some(vector) = vectors.pop() else {
        bail!("embedder returned no vector");
    };
    if vector.len() != dim {
        bail!("embedder returned {} dimensions, expected {dim}", vector.len());
    }
    Ok(vector)
}

/// Embeds `text` on the blocking pool, retrying failures with exponential
/// backoff. The last error is returned once attempts are exhausted.
pub async fn embed_query(embedder: &Arc<dyn Embedder>, text: &str, policy: RetryPolicy) -> Result<Vec<f32>> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match embed_once(Arc::clone(embedder), text.to_string()).await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < attempts => {
                let delay = policy.delay(attempt);
                tracing::warn!(attempt, max_attempts = attempts, delay_ms = delay.as_millis() as u64, error = %e, "query embedding failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e.context(format!("query embedding failed after {attempts} attempts"))),
        }
    }
}
