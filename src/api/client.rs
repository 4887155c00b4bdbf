use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use moka::future::Cache;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::api::errors::ApiError;
use crate::api::retry::RetryHandler;
use crate::config::ApiConfig;
use crate::observability::api_metrics;

#[derive(Serialize)]
struct GraphqlRequest<'a, V: Serialize> {
    query: &'a str,
    #[serde(rename = "operationName")]
    operation_name: &'a str,
    variables: V,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<serde_json::Value>,
    errors: Option<Vec<GraphqlErrorEntry>>,
}

#[derive(Deserialize)]
struct GraphqlErrorEntry {
    message: String,
}

/// Rate-limited GraphQL transport for the application backend.
///
/// Read queries can be cached; mutations always hit the wire. The client
/// enforces a local request budget so bursts of workflow activity cannot
/// hammer the endpoint.
pub struct ApiClient {
    http: reqwest::Client,
    endpoint: Url,
    session_token: Option<String>,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    cache: Cache<String, serde_json::Value>,
    retry: RetryHandler,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("authenticated", &self.session_token.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            ApiError::Config(format!("invalid endpoint '{}': {}", config.endpoint, e))
        })?;

        let per_second = NonZeroU32::new(config.rate_limit.requests_per_second)
            .ok_or_else(|| ApiError::Config("rate limit must be nonzero".to_string()))?;
        let burst = NonZeroU32::new(config.rate_limit.burst_capacity)
            .ok_or_else(|| ApiError::Config("burst capacity must be nonzero".to_string()))?;
        let quota = Quota::per_second(per_second).allow_burst(burst);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(config.cache.max_entries)
            .time_to_live(Duration::from_secs(config.cache.ttl_seconds))
            .build();

        Ok(Self {
            http,
            endpoint,
            session_token: config.session_token.clone(),
            rate_limiter,
            cache,
            retry: RetryHandler::new(config.retry.clone()),
        })
    }

    /// Retry handler for idempotent read queries
    pub fn retry(&self) -> &RetryHandler {
        &self.retry
    }

    /// Execute an operation and deserialize its `data` payload.
    pub async fn execute<V, T>(
        &self,
        operation: &str,
        query: &str,
        variables: V,
    ) -> Result<T, ApiError>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let data = self.execute_raw(operation, query, variables).await?;
        serde_json::from_value(data)
            .map_err(|e| ApiError::MalformedResponse(format!("{operation}: {e}")))
    }

    /// Execute a read query, consulting the response cache first.
    pub async fn execute_cached<V, T>(
        &self,
        cache_key: &str,
        operation: &str,
        query: &str,
        variables: V,
    ) -> Result<T, ApiError>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        if let Some(cached) = self.cache.get(cache_key).await {
            api_metrics().record_cache_hit();
            debug!(cache_key, "query served from cache");
            return serde_json::from_value(cached)
                .map_err(|e| ApiError::MalformedResponse(format!("{operation}: {e}")));
        }
        api_metrics().record_cache_miss();

        let data = self.execute_raw(operation, query, variables).await?;
        self.cache.insert(cache_key.to_string(), data.clone()).await;
        serde_json::from_value(data)
            .map_err(|e| ApiError::MalformedResponse(format!("{operation}: {e}")))
    }

    /// Drop cached query responses whose key starts with `prefix`.
    ///
    /// Called after mutations that invalidate previously fetched state, so
    /// the next read observes the backend's view.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        let keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.as_ref().clone())
            .collect();

        for key in keys {
            self.cache.invalidate(&key).await;
        }

        debug!(prefix, "invalidated cached queries");
    }

    async fn execute_raw<V: Serialize>(
        &self,
        operation: &str,
        query: &str,
        variables: V,
    ) -> Result<serde_json::Value, ApiError> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
            .await;
        api_metrics().record_request();
        debug!(operation, "executing backend operation");

        let body = GraphqlRequest {
            query,
            operation_name: operation,
            variables,
        };

        let mut request = self.http.post(self.endpoint.clone()).json(&body);
        if let Some(token) = &self.session_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                api_metrics().record_error();
                ApiError::Transport(e)
            })?;

        let envelope: GraphqlResponse = response.json().await.map_err(|e| {
            api_metrics().record_error();
            ApiError::Transport(e)
        })?;

        if let Some(errors) = envelope.errors {
            if !errors.is_empty() {
                api_metrics().record_error();
                return Err(ApiError::Graphql(
                    errors.into_iter().map(|e| e.message).collect(),
                ));
            }
        }

        envelope.data.ok_or_else(|| {
            api_metrics().record_error();
            ApiError::MalformedResponse(format!("{operation}: response carried no data"))
        })
    }
}
