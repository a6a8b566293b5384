//! Unified client: one primary provider plus an optional backup.
//!
//! On any primary failure the identical request is sent once to the
//! backup, under a fresh deadline. If both fail, the primary's error is
//! reported so error messages do not depend on whether a backup exists.
//! Retrying the same provider is the circuit breaker's concern, not this
//! module's.

use std::time::{Duration, Instant};

use llmgate_types::error::ProviderError;
use llmgate_types::llm::{ChatOptions, ChatRequest, Response};

use super::box_provider::BoxLlmProvider;

/// Routes calls to the primary provider and fails over to the backup.
#[derive(Debug)]
pub struct UnifiedClient {
    primary: BoxLlmProvider,
    backup: Option<BoxLlmProvider>,
    /// Deadline applied independently to every provider call.
    deadline: Duration,
}

impl UnifiedClient {
    pub fn new(primary: BoxLlmProvider, deadline: Duration) -> Self {
        Self {
            primary,
            backup: None,
            deadline,
        }
    }

    pub fn with_backup(mut self, backup: BoxLlmProvider) -> Self {
        self.backup = Some(backup);
        self
    }

    pub fn primary(&self) -> &BoxLlmProvider {
        &self.primary
    }

    pub fn backup(&self) -> Option<&BoxLlmProvider> {
        self.backup.as_ref()
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// The backup to use for this call, if failover is allowed.
    fn fallback_for(&self, options: &ChatOptions) -> Option<&BoxLlmProvider> {
        if options.primary_only {
            None
        } else {
            self.backup.as_ref()
        }
    }

    /// Send a chat request, falling back to the backup on primary failure.
    pub async fn chat(
        &self,
        request: &ChatRequest,
        options: &ChatOptions,
    ) -> Result<Response, ProviderError> {
        let start = Instant::now();
        let primary_err = match self.primary.chat(request, self.deadline).await {
            Ok(response) => {
                tracing::debug!(
                    provider = %self.primary.name(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Primary provider answered"
                );
                return Ok(response);
            }
            Err(err) => err,
        };

        let Some(backup) = self.fallback_for(options) else {
            return Err(primary_err);
        };

        tracing::warn!(
            primary = %self.primary.name(),
            backup = %backup.name(),
            error = %primary_err,
            "Primary provider failed, trying backup"
        );

        match backup.chat(request, self.deadline).await {
            Ok(response) => Ok(response),
            Err(backup_err) => {
                tracing::error!(
                    primary_error = %primary_err,
                    backup_error = %backup_err,
                    "Primary and backup providers both failed"
                );
                Err(primary_err)
            }
        }
    }

    /// Embed texts, with the same failover policy as [`Self::chat`].
    pub async fn embed(
        &self,
        texts: &[String],
        options: &ChatOptions,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        let primary_err = match self.primary.embed(texts, self.deadline).await {
            Ok(vectors) => return Ok(vectors),
            Err(err) => err,
        };

        let Some(backup) = self.fallback_for(options) else {
            return Err(primary_err);
        };

        tracing::warn!(
            primary = %self.primary.name(),
            backup = %backup.name(),
            error = %primary_err,
            "Primary embed failed, trying backup"
        );

        backup
            .embed(texts, self.deadline)
            .await
            .map_err(|backup_err| {
                tracing::error!(
                    primary_error = %primary_err,
                    backup_error = %backup_err,
                    "Primary and backup embeddings both failed"
                );
                primary_err
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockProvider, call_count};
    use llmgate_types::error::ProviderErrorKind;

    const DEADLINE: Duration = Duration::from_secs(5);

    fn opts() -> ChatOptions {
        ChatOptions::new("test")
    }

    #[tokio::test]
    async fn test_primary_succeeds_backup_untouched() {
        let backup = MockProvider::ok("backup", "from backup");
        let backup_calls = backup.calls();
        let client = UnifiedClient::new(MockProvider::ok("primary", "from primary").boxed(), DEADLINE)
            .with_backup(backup.boxed());

        let response = client.chat(&ChatRequest::new("hi"), &opts()).await.unwrap();
        assert_eq!(response.text, "from primary");
        assert_eq!(response.provider, "primary");
        assert_eq!(call_count(&backup_calls), 0);
    }

    #[tokio::test]
    async fn test_failover_returns_backup_response() {
        let client = UnifiedClient::new(MockProvider::failing("primary").boxed(), DEADLINE)
            .with_backup(MockProvider::ok("backup", "from backup").boxed());

        let response = client.chat(&ChatRequest::new("hi"), &opts()).await.unwrap();
        assert_eq!(response.text, "from backup");
        assert_eq!(response.provider, "backup");
    }

    #[tokio::test]
    async fn test_both_fail_reports_primary_error() {
        let client = UnifiedClient::new(MockProvider::failing("primary").boxed(), DEADLINE)
            .with_backup(MockProvider::failing("backup").boxed());

        let err = client.chat(&ChatRequest::new("hi"), &opts()).await.unwrap_err();
        assert_eq!(err.provider, "primary");
    }

    #[tokio::test]
    async fn test_no_backup_reports_primary_error() {
        let primary = MockProvider::failing("primary");
        let calls = primary.calls();
        let client = UnifiedClient::new(primary.boxed(), DEADLINE);

        let err = client.chat(&ChatRequest::new("hi"), &opts()).await.unwrap_err();
        assert_eq!(err.provider, "primary");
        // The same adapter is never retried here.
        assert_eq!(call_count(&calls), 1);
    }

    #[tokio::test]
    async fn test_primary_only_skips_backup() {
        let backup = MockProvider::ok("backup", "from backup");
        let backup_calls = backup.calls();
        let client = UnifiedClient::new(MockProvider::failing("primary").boxed(), DEADLINE)
            .with_backup(backup.boxed());

        let err = client
            .chat(&ChatRequest::new("hi"), &opts().primary_only())
            .await
            .unwrap_err();
        assert_eq!(err.provider, "primary");
        assert_eq!(call_count(&backup_calls), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backup_gets_its_own_deadline() {
        // Primary burns its whole deadline; backup must still get a full one.
        let primary = MockProvider::ok("primary", "late").with_delay(Duration::from_secs(10));
        let backup = MockProvider::ok("backup", "on time").with_delay(Duration::from_millis(900));
        let client = UnifiedClient::new(primary.boxed(), Duration::from_secs(1))
            .with_backup(backup.boxed());

        let response = client.chat(&ChatRequest::new("hi"), &opts()).await.unwrap();
        assert_eq!(response.text, "on time");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_provider_error() {
        let primary = MockProvider::ok("primary", "late").with_delay(Duration::from_secs(10));
        let client = UnifiedClient::new(primary.boxed(), Duration::from_secs(1));

        let err = client.chat(&ChatRequest::new("hi"), &opts()).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_embed_falls_back_when_primary_unsupported() {
        let client = UnifiedClient::new(MockProvider::ok("primary", "x").boxed(), DEADLINE)
            .with_backup(MockProvider::ok("backup", "x").with_embeddings().boxed());

        let vectors = client
            .embed(&["ab".to_string(), "abc".to_string()], &opts())
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![2.0], vec![3.0]]);
    }

    #[tokio::test]
    async fn test_embed_unsupported_everywhere_reports_primary() {
        let client = UnifiedClient::new(MockProvider::ok("primary", "x").boxed(), DEADLINE);
        let err = client.embed(&["a".to_string()], &opts()).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Unsupported);
        assert_eq!(err.provider, "primary");
    }
}
