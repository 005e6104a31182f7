//! Shared HTTP facility.
//!
//! One pooled client serves every repository client and the download engine.
//! Each request declares a purpose which selects its timeout tier, and an
//! optional tracer can be injected to record request outcomes for
//! diagnostics. Proxy environment variables and redirects are handled by
//! the underlying client; the final URL after redirects is available on the
//! response.

use crate::libs::config::GlobalConfig;
use crate::libs::error::UpdateError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::{Client, RequestBuilder, Response};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a request is for; selects the timeout tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// HEAD probes and existence checks.
    Probe,
    /// HTML scraping.
    Scrape,
    /// Forge API requests.
    Api,
    /// Artifact downloads.
    Download,
    /// Anything else.
    Fallback,
}

/// One recorded request, exposed post-hoc by the tracer.
#[derive(Debug, Clone)]
pub struct TraceRecord {
    pub method: String,
    pub url: String,
    pub started_at: DateTime<Utc>,
    pub status: Option<u16>,
    pub duration: Duration,
    pub error: Option<String>,
}

/// Records every request passing through the facility.
///
/// Injected rather than patched in: the facility accepts a tracer at
/// construction and the rest of the system stays unaware of it.
#[derive(Debug, Default)]
pub struct RequestTracer {
    records: Mutex<Vec<TraceRecord>>,
}

impl RequestTracer {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, record: TraceRecord) {
        self.records.lock().push(record);
    }

    /// Snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().clone()
    }
}

/// Pooled HTTP client with per-purpose timeouts.
pub struct HttpFacility {
    client: Client,
    download_timeout: Duration,
    tracer: Option<Arc<RequestTracer>>,
}

impl HttpFacility {
    /// Builds the shared client from the global transport settings.
    pub fn new(global: &GlobalConfig) -> Result<Self, UpdateError> {
        Self::with_tracer(global, None)
    }

    /// Builds the shared client with an injected request tracer.
    pub fn with_tracer(
        global: &GlobalConfig,
        tracer: Option<Arc<RequestTracer>>,
    ) -> Result<Self, UpdateError> {
        let client = Client::builder()
            .user_agent(global.user_agent.clone())
            .build()
            .map_err(|err| UpdateError::Transport(err.to_string()))?;
        // Download tier scales with the configured timeout, capped at 300s.
        let download_timeout = Duration::from_secs((global.timeout_seconds * 10).min(300));
        Ok(Self {
            client,
            download_timeout,
            tracer,
        })
    }

    fn timeout_for(&self, purpose: Purpose) -> Duration {
        match purpose {
            Purpose::Probe => Duration::from_secs(5),
            Purpose::Scrape => Duration::from_secs(10),
            Purpose::Api => Duration::from_secs(15),
            Purpose::Download => self.download_timeout,
            Purpose::Fallback => Duration::from_secs(30),
        }
    }

    /// Starts a GET request; finish it with [`HttpFacility::execute`].
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    /// Starts a HEAD request; finish it with [`HttpFacility::execute`].
    pub fn head(&self, url: &str) -> RequestBuilder {
        self.client.head(url)
    }

    /// Executes a request with the timeout tier for its purpose, recording
    /// the outcome when a tracer is installed.
    pub async fn execute(
        &self,
        builder: RequestBuilder,
        purpose: Purpose,
    ) -> Result<Response, UpdateError> {
        let request = builder
            .timeout(self.timeout_for(purpose))
            .build()
            .map_err(|err| UpdateError::Transport(err.to_string()))?;
        let method = request.method().to_string();
        let url = request.url().to_string();
        let started_at = Utc::now();
        let clock = Instant::now();

        let result = self.client.execute(request).await;

        if let Some(tracer) = &self.tracer {
            tracer.record(TraceRecord {
                method,
                url,
                started_at,
                status: result.as_ref().ok().map(|r| r.status().as_u16()),
                duration: clock.elapsed(),
                error: result.as_ref().err().map(|e| e.to_string()),
            });
        }

        result.map_err(|err| UpdateError::Transport(err.to_string()))
    }

    /// GET and execute in one step.
    pub async fn fetch(&self, url: &str, purpose: Purpose) -> Result<Response, UpdateError> {
        self.execute(self.get(url), purpose).await
    }

    /// HEAD and execute in one step.
    pub async fn probe(&self, url: &str) -> Result<Response, UpdateError> {
        self.execute(self.head(url), Purpose::Probe).await
    }
}
