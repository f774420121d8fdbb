//! REST database adapter
//!
//! Talks to any service following the usual resource conventions:
//!
//! | operation | request                       |
//! |-----------|-------------------------------|
//! | get       | `GET {base}/{collection}/{id}`    |
//! | create    | `POST {base}/{collection}/{id}`   |
//! | update    | `PUT {base}/{collection}/{id}`    |
//! | delete    | `DELETE {base}/{collection}/{id}` |
//! | get_all   | `GET {base}/{collection}`         |
//!
//! REST has no push channel, so subscriptions poll `get` on a fixed interval
//! from a tokio task and emit every result, changed or not.

use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use harvest_config::RestSettings;
use harvest_core::{AdminError, AdminResult, DatabaseAdapter, Document, DocumentCallback, Subscription};
use parking_lot::ReentrantMutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Shortest interval subscriptions will poll at
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

fn poll_period(requested: Duration) -> Duration {
    if requested < MIN_POLL_INTERVAL {
        warn!(?requested, min = ?MIN_POLL_INTERVAL, "Poll interval too short, clamping");
        return MIN_POLL_INTERVAL;
    }
    requested
}

fn transport(err: reqwest::Error) -> AdminError {
    AdminError::transport(err.to_string())
}

struct RestInner {
    client: Client,
    base_url: Url,
}

impl RestInner {
    fn url(&self, segments: &[&str]) -> AdminResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AdminError::not_configured(format!("{} cannot be a base url", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> AdminResult<RequestBuilder> {
        Ok(self.client.request(method, self.url(segments)?))
    }

    async fn get(&self, collection: &str, id: &str) -> AdminResult<Option<Document>> {
        let response = self
            .request(Method::GET, &[collection, id])?
            .send()
            .await
            .map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response, "GET", collection, id).await?;
        match response.json::<Value>().await.map_err(transport)? {
            Value::Object(doc) => Ok(Some(doc)),
            Value::Null => Ok(None),
            other => Err(AdminError::transport(format!(
                "expected a JSON object for {collection}/{id}, got {}",
                type_name(&other)
            ))),
        }
    }
}

async fn ensure_success(
    response: Response,
    verb: &str,
    collection: &str,
    id: &str,
) -> AdminResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = body.trim();
    Err(AdminError::transport(if detail.is_empty() {
        format!("{verb} {collection}/{id} failed: {status}")
    } else {
        format!("{verb} {collection}/{id} failed: {status}: {detail}")
    }))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Database adapter over a REST service
#[derive(Clone)]
pub struct RestApiAdapter {
    inner: Arc<RestInner>,
    poll_interval: Duration,
}

impl RestApiAdapter {
    /// Build the adapter and its HTTP client
    ///
    /// The bearer token and extra headers are sent with every request.
    pub fn new(settings: &RestSettings) -> AdminResult<Self> {
        let base_url = Url::parse(settings.base_url.trim())
            .map_err(|e| AdminError::not_configured(format!("invalid base url: {e}")))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &settings.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AdminError::not_configured(format!("invalid header {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| AdminError::not_configured(format!("invalid value for {name}: {e}")))?;
            headers.insert(name, value);
        }
        if let Some(token) = &settings.auth_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| AdminError::not_configured(format!("invalid auth token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AdminError::not_configured(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner: Arc::new(RestInner { client, base_url }),
            poll_interval: poll_period(Duration::from_millis(settings.poll_interval_ms)),
        })
    }

    /// Shorthand for an adapter with default settings
    pub fn from_base_url(base_url: impl Into<String>) -> AdminResult<Self> {
        Self::new(&RestSettings::new(base_url))
    }

    /// Builder-style: override the subscription poll interval, clamped to
    /// [`MIN_POLL_INTERVAL`]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = poll_period(interval);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    async fn write(
        &self,
        method: Method,
        collection: &str,
        id: &str,
        data: Option<&Document>,
    ) -> AdminResult<Response> {
        let mut request = self.inner.request(method, &[collection, id])?;
        if let Some(data) = data {
            request = request.json(data);
        }
        request.send().await.map_err(transport)
    }
}

#[async_trait]
impl DatabaseAdapter for RestApiAdapter {
    async fn get(&self, collection: &str, id: &str) -> AdminResult<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn create(&self, collection: &str, id: &str, data: Document) -> AdminResult<()> {
        let response = self.write(Method::POST, collection, id, Some(&data)).await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(AdminError::document_exists(collection, id));
        }
        ensure_success(response, "POST", collection, id).await?;
        debug!(collection, id, "Document created");
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, data: Document) -> AdminResult<()> {
        let response = self.write(Method::PUT, collection, id, Some(&data)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AdminError::document_not_found(collection, id));
        }
        ensure_success(response, "PUT", collection, id).await?;
        debug!(collection, id, "Document updated");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AdminResult<()> {
        let response = self.write(Method::DELETE, collection, id, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AdminError::document_not_found(collection, id));
        }
        ensure_success(response, "DELETE", collection, id).await?;
        debug!(collection, id, "Document deleted");
        Ok(())
    }

    async fn get_all(&self, collection: &str) -> AdminResult<Vec<Document>> {
        let response = self
            .inner
            .request(Method::GET, &[collection])?
            .send()
            .await
            .map_err(transport)?;
        let response = ensure_success(response, "GET", collection, "*").await?;

        let Value::Array(items) = response.json::<Value>().await.map_err(transport)? else {
            return Err(AdminError::transport(format!(
                "expected a JSON array for {collection}"
            )));
        };
        Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(doc) => Some(doc),
                other => {
                    warn!(collection, kind = type_name(&other), "Skipping non-object item");
                    None
                }
            })
            .collect())
    }

    /// Poll `get` every `poll_interval`, starting one interval from now
    ///
    /// Failed polls are logged and skipped. Must be called inside a tokio
    /// runtime. Releasing the guard waits for a callback already running on
    /// the poller and no callback starts afterwards.
    fn subscribe(
        &self,
        collection: &str,
        id: &str,
        callback: DocumentCallback,
    ) -> AdminResult<Subscription> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| AdminError::not_configured("REST subscriptions need a tokio runtime"))?;

        let cancel = CancellationToken::new();
        let released = Arc::new(ReentrantMutex::new(Cell::new(false)));

        let inner = self.inner.clone();
        let period = self.poll_interval;
        let collection = collection.to_string();
        let id = id.to_string();
        let task_cancel = cancel.clone();
        let task_released = released.clone();

        handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let result = tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    result = inner.get(&collection, &id) => result,
                };
                {
                    let released = task_released.lock();
                    if released.get() {
                        break;
                    }
                    match result {
                        Ok(snapshot) => callback(snapshot),
                        Err(e) => warn!(collection = %collection, id = %id, error = %e, "Subscription poll failed"),
                    }
                }
            }
            debug!(collection = %collection, id = %id, "Subscription poller stopped");
        });

        Ok(Subscription::new(move || {
            released.lock().set(true);
            cancel.cancel();
        }))
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}

impl std::fmt::Debug for RestApiAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestApiAdapter")
            .field("base_url", &self.inner.base_url.as_str())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
