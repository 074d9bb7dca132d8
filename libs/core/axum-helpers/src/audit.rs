//! Request audit records.
//!
//! Every completed request under the audited router produces one
//! [`RequestAuditRecord`]. Records are handed to an [`AuditDispatcher`], a
//! bounded queue drained by a detached task that forwards them to an
//! [`AuditSink`]. Dispatching never blocks the request and never fails it:
//! a full queue, a stopped worker and sink errors are only logged.
//!
//! # Example
//! ```ignore
//! use axum::middleware;
//! use axum_helpers::audit::{AuditDispatcher, AuditState, TracingAuditSink, request_audit};
//!
//! let dispatcher = AuditDispatcher::start(TracingAuditSink, 1024);
//! let state = AuditState::new(dispatcher, describe_operation);
//! let api = Router::new()
//!     .merge(users_router)
//!     .layer(middleware::from_fn_with_state(state, request_audit));
//! ```

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, OriginalUri, Query, Request, State},
    http::{HeaderMap, Method, Uri},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc;

pub const USER_ID_HEADER: &str = "x-user-id";
const UNKNOWN: &str = "unknown";

/// One audited request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAuditRecord {
    /// Caller supplied through `X-User-Id`, when numeric
    pub user_id: Option<i64>,
    /// Human-readable description of the operation
    pub operation: String,
    /// `"METHOD /path"`
    pub method_and_path: String,
    /// Query parameters as a JSON object of `name -> [values]`
    pub params_json: String,
    pub client_ip: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit queue is full")]
    QueueFull,

    #[error("Audit worker has stopped")]
    Closed,

    #[error("Audit sink failed: {0}")]
    Sink(String),
}

/// Destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
    async fn record(&self, record: &RequestAuditRecord) -> Result<(), AuditError>;
}

/// Writes each record as a structured event on the `audit` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, record: &RequestAuditRecord) -> Result<(), AuditError> {
        let json = serde_json::to_string(record).map_err(|e| AuditError::Sink(e.to_string()))?;
        tracing::info!(
            target: "audit",
            user_id = record.user_id,
            operation = %record.operation,
            method_and_path = %record.method_and_path,
            params = %record.params_json,
            ip = %record.client_ip,
            timestamp = %record.timestamp,
            "{}",
            json
        );
        Ok(())
    }
}

/// Handle to the audit queue. Cloning shares the same queue and worker.
#[derive(Clone, Debug)]
pub struct AuditDispatcher {
    tx: mpsc::Sender<RequestAuditRecord>,
}

impl AuditDispatcher {
    /// Spawns the worker that drains the queue into `sink`.
    ///
    /// Must be called inside a tokio runtime. The worker exits once every
    /// dispatcher handle has been dropped and the queue is empty.
    pub fn start<S: AuditSink>(sink: S, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<RequestAuditRecord>(capacity.max(1));

        tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                if let Err(e) = sink.record(&record).await {
                    tracing::error!(
                        "Failed to record audit entry for {}: {}",
                        record.method_and_path,
                        e
                    );
                }
            }
            tracing::debug!("Audit worker stopped");
        });

        Self { tx }
    }

    /// Enqueues without waiting, reporting why a record was not accepted.
    pub fn try_dispatch(&self, record: RequestAuditRecord) -> Result<(), AuditError> {
        self.tx.try_send(record).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => AuditError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => AuditError::Closed,
        })
    }

    /// Fire-and-forget enqueue; a rejected record is logged and dropped.
    pub fn dispatch(&self, record: RequestAuditRecord) {
        let method_and_path = record.method_and_path.clone();
        if let Err(e) = self.try_dispatch(record) {
            tracing::warn!("Dropping audit record for {}: {}", method_and_path, e);
        }
    }
}

/// Maps a request to its operation description.
pub type DescribeOperation = fn(&Method, &str) -> String;

/// State for the [`request_audit`] middleware.
#[derive(Clone)]
pub struct AuditState {
    dispatcher: Arc<AuditDispatcher>,
    describe: DescribeOperation,
}

impl AuditState {
    pub fn new(dispatcher: AuditDispatcher, describe: DescribeOperation) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            describe,
        }
    }
}

/// Middleware recording one audit entry per completed request.
///
/// Layer it with `axum::middleware::from_fn_with_state`. The full request
/// path is used even when the router is nested.
pub async fn request_audit(
    State(state): State<AuditState>,
    req: Request,
    next: Next,
) -> Response {
    let started = Instant::now();

    let method = req.method().clone();
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|original| original.0.clone())
        .unwrap_or_else(|| req.uri().clone());
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let client_ip = extract_client_ip(req.headers(), peer);
    let user_id = extract_user_id(req.headers());

    let response = next.run(req).await;

    let path = uri.path();
    let record = RequestAuditRecord {
        user_id,
        operation: (state.describe)(&method, path),
        method_and_path: format!("{} {}", method, path),
        params_json: params_json(&uri),
        client_ip,
        timestamp: Utc::now(),
    };
    state.dispatcher.dispatch(record);

    tracing::info!(
        "Request completed: {} {} - {}ms",
        method,
        path,
        started.elapsed().as_millis()
    );

    response
}

/// Client address: first `X-Forwarded-For` entry, then `X-Real-IP`, then
/// the socket peer. Header values equal to `unknown` are ignored.
pub fn extract_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(UNKNOWN))
    };

    header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| header("x-real-ip").map(str::to_string))
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Numeric user id from `X-User-Id`; anything else is logged and ignored.
pub fn extract_user_id(headers: &HeaderMap) -> Option<i64> {
    let raw = headers.get(USER_ID_HEADER)?;
    let parsed = raw
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<i64>());

    match parsed {
        Some(Ok(id)) => Some(id),
        Some(Err(_)) => {
            tracing::warn!("Invalid user ID in header: {:?}", raw);
            None
        }
        None => None,
    }
}

fn params_json(uri: &Uri) -> String {
    let pairs = match Query::<Vec<(String, String)>>::try_from_uri(uri) {
        Ok(Query(pairs)) => pairs,
        Err(e) => {
            tracing::warn!("Error parsing request parameters: {}", e);
            return "{}".to_string();
        }
    };

    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in pairs {
        grouped.entry(name).or_default().push(value);
    }

    serde_json::to_string(&grouped).unwrap_or_else(|e| {
        tracing::warn!("Error serializing request parameters: {}", e);
        "{}".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::HeaderValue, routing::get};
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Clone, Default)]
    struct CollectingSink {
        records: Arc<Mutex<Vec<RequestAuditRecord>>>,
    }

    #[async_trait]
    impl AuditSink for CollectingSink {
        async fn record(&self, record: &RequestAuditRecord) -> Result<(), AuditError> {
            self.records.lock().await.push(record.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn record(&self, _record: &RequestAuditRecord) -> Result<(), AuditError> {
            Err(AuditError::Sink("disk full".into()))
        }
    }

    fn describe(method: &Method, path: &str) -> String {
        format!("{} on {}", method, path)
    }

    fn sample_record() -> RequestAuditRecord {
        RequestAuditRecord {
            user_id: None,
            operation: "op".into(),
            method_and_path: "GET /".into(),
            params_json: "{}".into(),
            client_ip: "127.0.0.1".into(),
            timestamp: Utc::now(),
        }
    }

    async fn wait_for(sink: &CollectingSink, count: usize) -> Vec<RequestAuditRecord> {
        for _ in 0..100 {
            let records = sink.records.lock().await;
            if records.len() >= count {
                return records.clone();
            }
            drop(records);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("audit records never arrived");
    }

    fn audited_app(sink: CollectingSink) -> Router {
        let state = AuditState::new(AuditDispatcher::start(sink, 16), describe);
        let inner = Router::new()
            .route("/users", get(|| async { "list" }))
            .layer(axum::middleware::from_fn_with_state(state, request_audit));
        Router::new().nest("/api", inner)
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(extract_client_ip(&headers, None), "10.0.0.1");
    }

    #[test]
    fn test_client_ip_skips_unknown_and_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("unknown"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(extract_client_ip(&headers, None), "10.0.0.9");

        let peer: SocketAddr = "192.168.1.5:4000".parse().unwrap();
        assert_eq!(extract_client_ip(&HeaderMap::new(), Some(peer)), "192.168.1.5");
        assert_eq!(extract_client_ip(&HeaderMap::new(), None), "unknown");
    }

    #[test]
    fn test_user_id_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_user_id(&headers), None);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("42"));
        assert_eq!(extract_user_id(&headers), Some(42));

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("abc"));
        assert_eq!(extract_user_id(&headers), None);
    }

    #[test]
    fn test_params_json_groups_repeated_names() {
        let uri: Uri = "/api/users?page=2&tag=a&tag=b".parse().unwrap();
        assert_eq!(params_json(&uri), r#"{"page":["2"],"tag":["a","b"]}"#);

        let bare: Uri = "/api/users".parse().unwrap();
        assert_eq!(params_json(&bare), "{}");
    }

    #[tokio::test]
    async fn test_middleware_records_full_path() {
        let sink = CollectingSink::default();
        let app = audited_app(sink.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/users?size=5")
                    .header("x-user-id", "7")
                    .header("x-real-ip", "10.1.1.1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_success());

        let records = wait_for(&sink, 1).await;
        let record = &records[0];
        assert_eq!(record.user_id, Some(7));
        assert_eq!(record.method_and_path, "GET /api/users");
        assert_eq!(record.operation, "GET on /api/users");
        assert_eq!(record.params_json, r#"{"size":["5"]}"#);
        assert_eq!(record.client_ip, "10.1.1.1");
    }

    #[tokio::test]
    async fn test_full_queue_does_not_fail_caller() {
        let (tx, _rx) = mpsc::channel(1);
        let dispatcher = AuditDispatcher { tx };

        assert!(dispatcher.try_dispatch(sample_record()).is_ok());
        assert!(matches!(
            dispatcher.try_dispatch(sample_record()),
            Err(AuditError::QueueFull)
        ));
        dispatcher.dispatch(sample_record());
    }

    #[tokio::test]
    async fn test_closed_queue_is_reported() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let dispatcher = AuditDispatcher { tx };
        assert!(matches!(
            dispatcher.try_dispatch(sample_record()),
            Err(AuditError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_sink_errors_are_swallowed() {
        let dispatcher = AuditDispatcher::start(FailingSink, 4);
        dispatcher.dispatch(sample_record());
        dispatcher.dispatch(sample_record());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(dispatcher.try_dispatch(sample_record()).is_ok());
    }
}
