//! HTTP transport shared by every Shilp client.
//!
//! Three exchange shapes are supported:
//! - JSON request, JSON response ([`HttpTransport::exchange`])
//! - JSON request, streamed binary response ([`HttpTransport::exchange_for_stream`])
//! - multipart file upload ([`HttpTransport::upload_file`])
//!
//! plus newline-delimited server push ([`HttpTransport::subscribe`]).
//!
//! A status >= 400 always becomes [`Error::Api`] carrying the raw body text,
//! and an empty success body is read as an empty JSON object.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use shilp_core::defaults;
use shilp_core::{Error, Result};

use crate::config::ClientConfig;
use crate::streaming::{ByteStream, EventSubscription};

/// Query parameters as ordered key/value pairs.
pub type Query<'a> = [(&'a str, String)];

/// Marker for exchanges without a request body.
pub const NO_BODY: Option<&()> = None;

/// Decode a JSON value into a typed response.
pub fn decode<T: DeserializeOwned>(value: JsonValue) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))
}

/// Percent-encode one path segment.
pub fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// HTTP transport bound to one server.
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport with its own connection pool.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config))
    }

    /// Build a transport around a caller-supplied client.
    ///
    /// Connect timeout and user agent are whatever `client` was built with;
    /// the per-call timeout still comes from `config`.
    pub fn with_client(client: Client, config: &ClientConfig) -> Self {
        debug!(
            base_url = %config.base_url,
            timeout_secs = config.timeout_secs,
            "Initializing Shilp transport"
        );
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request<B>(&self, method: Method, path: &str, body: Option<&B>, query: &Query<'_>) -> RequestBuilder
    where
        B: Serialize + ?Sized,
    {
        let mut req = self.client.request(method, self.url(path));
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        req
    }

    /// Send a JSON request and return the decoded JSON response.
    pub async fn exchange<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: &Query<'_>,
    ) -> Result<JsonValue>
    where
        B: Serialize + ?Sized,
    {
        let req = self
            .request(method.clone(), path, body, query)
            .timeout(self.timeout);

        let response = timed(&method, path, req.send()).await?;
        let response = check_status(response).await?;
        read_json(response).await
    }

    /// [`exchange`](Self::exchange) followed by a typed decode.
    pub async fn exchange_json<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: &Query<'_>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        decode(self.exchange(method, path, body, query).await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &Query<'_>) -> Result<T> {
        self.exchange_json(Method::GET, path, NO_BODY, query).await
    }

    /// Send a JSON request whose response body is consumed as a byte stream.
    ///
    /// The configured timeout bounds the wait for response headers and then
    /// each gap between body chunks.
    pub async fn exchange_for_stream<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: &Query<'_>,
    ) -> Result<ByteStream>
    where
        B: Serialize + ?Sized,
    {
        let req = self.request(method.clone(), path, body, query);
        let response = self.send_with_deadline(&method, path, req).await?;
        let response = check_status(response).await?;
        Ok(ByteStream::new(response, self.timeout))
    }

    /// Upload a local file as multipart field `file`, streaming it from disk.
    pub async fn upload_file(&self, path: &str, local_file: &Path) -> Result<JsonValue> {
        let file = tokio::fs::File::open(local_file).await?;
        let len = file.metadata().await?.len();
        let file_name = local_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        debug!(path, file = %local_file.display(), bytes = len, "Uploading file");

        let part = Part::stream_with_length(reqwest::Body::from(file), len)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;
        let form = Form::new().part(defaults::UPLOAD_FIELD, part);

        let req = self
            .client
            .post(self.url(path))
            .multipart(form)
            .timeout(self.timeout);

        let response = timed(&Method::POST, path, req.send()).await?;
        let response = check_status(response).await?;
        read_json(response).await
    }

    /// Open a newline-delimited event stream.
    ///
    /// Only the wait for response headers is bounded by the timeout; the
    /// stream itself stays open until the server closes it or the
    /// subscription is cancelled.
    pub async fn subscribe(&self, path: &str, query: &Query<'_>) -> Result<EventSubscription> {
        let req = self.request(Method::GET, path, NO_BODY, query);
        let response = self.send_with_deadline(&Method::GET, path, req).await?;
        let response = check_status(response).await?;
        debug!(path, "Event subscription opened");
        Ok(EventSubscription::spawn(response))
    }

    /// Feed every event of a subscription to `on_line` until the server
    /// closes the stream. Dropping the returned future cancels the reader.
    pub async fn subscribe_events<F>(
        &self,
        path: &str,
        query: &Query<'_>,
        mut on_line: F,
    ) -> Result<()>
    where
        F: FnMut(String),
    {
        let mut subscription = self.subscribe(path, query).await?;
        while let Some(event) = subscription.next().await {
            on_line(event?);
        }
        Ok(())
    }

    async fn send_with_deadline(
        &self,
        method: &Method,
        path: &str,
        req: RequestBuilder,
    ) -> Result<Response> {
        match tokio::time::timeout(self.timeout, timed(method, path, req.send())).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "{} {} sent no response within {:?}",
                method, path, self.timeout
            ))),
        }
    }
}

/// Await a send, logging its latency.
async fn timed<F>(method: &Method, path: &str, send: F) -> Result<Response>
where
    F: Future<Output = reqwest::Result<Response>>,
{
    let start = Instant::now();
    let result = send.await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match &result {
        Ok(resp) if elapsed_ms > defaults::SLOW_REQUEST_MS => warn!(
            method = %method,
            path,
            status = resp.status().as_u16(),
            elapsed_ms,
            slow = true,
            "Slow Shilp request"
        ),
        Ok(resp) => debug!(
            method = %method,
            path,
            status = resp.status().as_u16(),
            elapsed_ms,
            "Shilp request"
        ),
        Err(e) => warn!(method = %method, path, elapsed_ms, error = %e, "Shilp request failed"),
    }

    result.map_err(Error::from)
}

/// Turn a status >= 400 into [`Error::Api`] with the body verbatim.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.as_u16() < 400 {
        return Ok(response);
    }
    let body = response.bytes().await?;
    Err(Error::Api {
        status: status.as_u16(),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn read_json(response: Response) -> Result<JsonValue> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(JsonValue::Object(Default::default()));
    }
    serde_json::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))
}
