//! The resilient gateway pipeline.
//!
//! Per request: cache lookup → token-bucket admission → breaker-wrapped
//! unified client call → optional JSON extraction → cache store.
//!
//! A single [`Gateway`] is built at startup and shared by reference
//! (typically `Arc<Gateway>`); it owns all breaker, bucket and cache state.

pub mod breaker;
pub mod cache;
pub mod json_extract;
pub mod rate_limit;

use tracing::Instrument;

use llmgate_types::config::{CacheConfig, GatewayConfig};
use llmgate_types::error::GatewayError;
use llmgate_types::llm::{BreakerStatus, ChatOptions, ChatRequest, Response, StructuredOutput};

use crate::llm::client::UnifiedClient;

use self::breaker::BreakerRegistry;
use self::cache::{ResponseCache, cache_key};
use self::json_extract::extract_json;
use self::rate_limit::RateLimiter;

/// Resilient front door to the configured LLM providers.
#[derive(Debug)]
pub struct Gateway {
    client: UnifiedClient,
    breakers: BreakerRegistry,
    limiter: RateLimiter,
    cache: ResponseCache<Response>,
    cache_config: CacheConfig,
}

impl Gateway {
    pub fn new(client: UnifiedClient, config: &GatewayConfig) -> Self {
        Self {
            client,
            breakers: BreakerRegistry::new(config.breaker.clone()),
            limiter: RateLimiter::new(config.bucket.clone()),
            cache: ResponseCache::new(),
            cache_config: config.cache.clone(),
        }
    }

    pub fn cache(&self) -> &ResponseCache<Response> {
        &self.cache
    }

    /// Send a chat request through the full pipeline.
    ///
    /// A cache hit returns immediately without charging the caller's
    /// bucket or touching the breaker. Rate-limit and circuit-open
    /// rejections are returned as-is and never retried here.
    pub async fn chat(
        &self,
        request: &ChatRequest,
        options: &ChatOptions,
    ) -> Result<Response, GatewayError> {
        let caller = options.caller();
        let span = tracing::info_span!("gateway.chat", route = %options.route, caller = %caller);

        async move {
            let use_cache = self.cache_config.enabled && !options.bypass_cache;
            let key = cache_key(&options.route, caller, &request.prompt);

            if use_cache {
                if let Some(mut hit) = self.cache.get(&key) {
                    tracing::debug!("Cache hit");
                    // Stored by a plain request; the key ignores json_mode.
                    if request.json_mode && hit.structured.is_none() {
                        attach_structured(&mut hit);
                    }
                    return Ok(hit);
                }
            }

            if !self.limiter.allow(caller, options.cost) {
                tracing::debug!(cost = options.cost, "Caller over budget, rejecting");
                return Err(GatewayError::RateLimited {
                    caller: caller.to_string(),
                });
            }

            let mut response = self
                .breakers
                .call(&options.route, || self.client.chat(request, options))
                .await?;

            if request.json_mode {
                attach_structured(&mut response);
            }

            if use_cache {
                self.cache.set(key, response.clone(), self.cache_config.ttl());
            }

            Ok(response)
        }
        .instrument(span)
        .await
    }

    /// Embed texts through admission control and the route's breaker.
    ///
    /// Embeddings are not cached.
    pub async fn embed(
        &self,
        texts: &[String],
        options: &ChatOptions,
    ) -> Result<Vec<Vec<f32>>, GatewayError> {
        let caller = options.caller();
        if !self.limiter.allow(caller, options.cost) {
            return Err(GatewayError::RateLimited {
                caller: caller.to_string(),
            });
        }

        self.breakers
            .call(&options.route, || self.client.embed(texts, options))
            .await
    }

    /// Breaker status of every route seen so far.
    pub fn breaker_status(&self) -> Vec<BreakerStatus> {
        self.breakers.status()
    }

    /// Tokens currently available to `caller`, or `None` if unseen.
    pub fn bucket_tokens(&self, caller: &str) -> Option<f64> {
        self.limiter.available(caller)
    }

    pub fn bucket_capacity(&self) -> f64 {
        self.limiter.capacity()
    }
}

fn attach_structured(response: &mut Response) {
    let structured = StructuredOutput::from(extract_json(&response.text));
    if let StructuredOutput::Failed { error } = &structured {
        tracing::debug!(%error, "No JSON object recovered from reply");
    }
    response.structured = Some(structured);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::test_support::{MockOutcome, MockProvider, call_count, set_outcome};
    use llmgate_types::config::{BreakerConfig, BucketConfig};
    use llmgate_types::error::{JsonExtractionError, ProviderErrorKind};

    fn config() -> GatewayConfig {
        GatewayConfig {
            breaker: BreakerConfig {
                threshold: 3,
                cooldown_ms: 15_000,
            },
            bucket: BucketConfig {
                capacity: 10.0,
                refill_per_second: 2.0,
            },
            ..GatewayConfig::default()
        }
    }

    fn gateway(primary: MockProvider) -> Gateway {
        let client = UnifiedClient::new(primary.boxed(), Duration::from_secs(5));
        Gateway::new(client, &config())
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_skips_bucket_and_provider() {
        let primary = MockProvider::ok("primary", "pong");
        let calls = primary.calls();
        let gw = gateway(primary);
        let request = ChatRequest::new("ping");
        let options = ChatOptions::new("vasily").with_caller("u1");

        let first = gw.chat(&request, &options).await.unwrap();
        let tokens_after_first = gw.bucket_tokens("u1").unwrap();
        let second = gw.chat(&request, &options).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(call_count(&calls), 1);
        assert!((gw.bucket_tokens("u1").unwrap() - tokens_after_first).abs() < 1e-9);
        assert!((tokens_after_first - 9.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expires_after_ttl() {
        let primary = MockProvider::ok("primary", "pong");
        let calls = primary.calls();
        let gw = gateway(primary);
        let request = ChatRequest::new("ping");
        let options = ChatOptions::new("vasily").with_caller("u1");

        gw.chat(&request, &options).await.unwrap();
        tokio::time::advance(Duration::from_secs(120)).await;
        gw.chat(&request, &options).await.unwrap();
        assert_eq!(call_count(&calls), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_is_partitioned_by_caller() {
        let primary = MockProvider::ok("primary", "pong");
        let calls = primary.calls();
        let gw = gateway(primary);
        let request = ChatRequest::new("ping");

        gw.chat(&request, &ChatOptions::new("vasily").with_caller("u1")).await.unwrap();
        gw.chat(&request, &ChatOptions::new("vasily").with_caller("u2")).await.unwrap();
        gw.chat(&request, &ChatOptions::new("vasily")).await.unwrap();
        assert_eq!(call_count(&calls), 3);
        assert!(gw.bucket_tokens("anon").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bypass_cache_always_calls_provider() {
        let primary = MockProvider::ok("primary", "pong");
        let calls = primary.calls();
        let gw = gateway(primary);
        let request = ChatRequest::new("ping");
        let options = ChatOptions::new("vasily").bypass_cache();

        gw.chat(&request, &options).await.unwrap();
        gw.chat(&request, &options).await.unwrap();
        assert_eq!(call_count(&calls), 2);
        assert!(gw.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_before_breaker_and_network() {
        let primary = MockProvider::ok("primary", "pong");
        let calls = primary.calls();
        let gw = gateway(primary);
        let options = ChatOptions::new("vasily").with_caller("u1").bypass_cache();

        for _ in 0..10 {
            gw.chat(&ChatRequest::new("ping"), &options).await.unwrap();
        }
        let err = gw.chat(&ChatRequest::new("ping"), &options).await.unwrap_err();
        assert!(matches!(err, GatewayError::RateLimited { ref caller } if caller == "u1"));
        assert_eq!(call_count(&calls), 10);
        // Rejected call never reached the breaker.
        assert_eq!(gw.breaker_status()[0].total_calls, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_breaker_opens_then_recovers() {
        let primary = MockProvider::failing("primary");
        let calls = primary.calls();
        let outcome = primary.outcome();
        let gw = gateway(primary);
        let options = ChatOptions::new("vasily").bypass_cache();

        for i in 0..3 {
            let err = gw.chat(&ChatRequest::new(format!("q{i}")), &options).await.unwrap_err();
            assert!(matches!(err, GatewayError::Provider(_)));
        }
        let err = gw.chat(&ChatRequest::new("q3"), &options).await.unwrap_err();
        assert!(matches!(err, GatewayError::CircuitOpen { .. }));
        assert_eq!(call_count(&calls), 3);

        set_outcome(&outcome, MockOutcome::Reply("back".into()));
        tokio::time::advance(Duration::from_secs(15)).await;
        let response = gw.chat(&ChatRequest::new("q4"), &options).await.unwrap();
        assert_eq!(response.text, "back");
        assert_eq!(gw.breaker_status()[0].state, "closed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_calls_are_not_cached() {
        let primary = MockProvider::failing("primary");
        let calls = primary.calls();
        let outcome = primary.outcome();
        let gw = gateway(primary);
        let options = ChatOptions::new("vasily");

        assert!(gw.chat(&ChatRequest::new("ping"), &options).await.is_err());
        set_outcome(&outcome, MockOutcome::Reply("pong".into()));
        let response = gw.chat(&ChatRequest::new("ping"), &options).await.unwrap();
        assert_eq!(response.text, "pong");
        assert_eq!(call_count(&calls), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_through_gateway() {
        let client = UnifiedClient::new(MockProvider::failing("primary").boxed(), Duration::from_secs(5))
            .with_backup(MockProvider::ok("backup", "from backup").boxed());
        let gw = Gateway::new(client, &config());

        let response = gw
            .chat(&ChatRequest::new("ping"), &ChatOptions::new("r"))
            .await
            .unwrap();
        assert_eq!(response.provider, "backup");
        // Successful failover is a success for the route's breaker.
        assert_eq!(gw.breaker_status()[0].total_failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_json_mode_attaches_structured_output() {
        let gw = gateway(MockProvider::ok("primary", r#"Sure! {"a":1} hope that helps"#));
        let request = ChatRequest::new("give me json").with_json_mode(true);

        let response = gw.chat(&request, &ChatOptions::new("r")).await.unwrap();
        let structured = response.structured.unwrap();
        assert_eq!(structured.value().unwrap()["a"], 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_json_mode_failure_is_tagged_not_thrown() {
        let gw = gateway(MockProvider::ok("primary", "no braces at all"));
        let request = ChatRequest::new("give me json").with_json_mode(true);

        let response = gw.chat(&request, &ChatOptions::new("r")).await.unwrap();
        assert_eq!(response.text, "no braces at all");
        assert_eq!(
            response.structured,
            Some(StructuredOutput::Failed {
                error: JsonExtractionError::NoOpeningBrace
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_plain_request_has_no_structured_output() {
        let gw = gateway(MockProvider::ok("primary", r#"{"a":1}"#));
        let response = gw.chat(&ChatRequest::new("hi"), &ChatOptions::new("r")).await.unwrap();
        assert!(response.structured.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_toward_breaker() {
        let primary = MockProvider::ok("primary", "late").with_delay(Duration::from_secs(60));
        let gw = gateway(primary);
        let options = ChatOptions::new("slow").bypass_cache();

        for _ in 0..3 {
            match gw.chat(&ChatRequest::new("x"), &options).await {
                Err(GatewayError::Provider(err)) => assert_eq!(err.kind, ProviderErrorKind::Timeout),
                other => panic!("expected timeout, got {other:?}"),
            }
        }
        assert!(matches!(
            gw.chat(&ChatRequest::new("x"), &options).await,
            Err(GatewayError::CircuitOpen { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_json_mode_cache_hit_from_plain_request_gets_structured_output() {
        let primary = MockProvider::ok("primary", r#"Here: {"mood":"ok"}"#);
        let calls = primary.calls();
        let gw = gateway(primary);
        let options = ChatOptions::new("r").with_caller("u1");

        let plain = gw.chat(&ChatRequest::new("status?"), &options).await.unwrap();
        assert!(plain.structured.is_none());

        let json = gw
            .chat(&ChatRequest::new("status?").with_json_mode(true), &options)
            .await
            .unwrap();
        assert_eq!(call_count(&calls), 1);
        assert_eq!(json.structured.unwrap().value().unwrap()["mood"], "ok");
    }

    #[tokio::test(start_paused = true)]
    async fn test_negative_cost_is_rejected_and_mints_nothing() {
        let primary = MockProvider::ok("primary", "pong");
        let calls = primary.calls();
        let gw = gateway(primary);
        let options = ChatOptions::new("r").with_caller("u1").with_cost(-100.0);

        let err = gw.chat(&ChatRequest::new("ping"), &options).await.unwrap_err();
        assert!(matches!(err, GatewayError::RateLimited { .. }));
        assert_eq!(call_count(&calls), 0);
        assert!((gw.bucket_tokens("u1").unwrap() - 10.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_for_distinct_prompts_are_reclaimed() {
        let client = UnifiedClient::new(MockProvider::ok("primary", "pong").boxed(), Duration::from_secs(5));
        let config = GatewayConfig {
            bucket: BucketConfig {
                capacity: 1000.0,
                refill_per_second: 2.0,
            },
            ..config()
        };
        let gw = Gateway::new(client, &config);
        let options = ChatOptions::new("r").with_caller("u1");

        for i in 0..64 {
            gw.chat(&ChatRequest::new(format!("first {i}")), &options).await.unwrap();
        }
        assert_eq!(gw.cache().len(), 64);

        tokio::time::advance(Duration::from_secs(121)).await;
        for i in 0..64 {
            gw.chat(&ChatRequest::new(format!("second {i}")), &options).await.unwrap();
        }
        // The first batch was never read again but is gone.
        assert_eq!(gw.cache().len(), 64);
    }

    #[tokio::test(start_paused = true)]
    async fn test_embed_goes_through_admission_and_breaker() {
        let gw = gateway(MockProvider::ok("primary", "x").with_embeddings());
        let options = ChatOptions::new("embed").with_caller("u1");

        let vectors = gw.embed(&["abcd".to_string()], &options).await.unwrap();
        assert_eq!(vectors, vec![vec![4.0]]);
        assert!((gw.bucket_tokens("u1").unwrap() - 9.0).abs() < 1e-9);
        assert_eq!(gw.breaker_status()[0].route, "embed");
    }
}
