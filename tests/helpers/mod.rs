#![allow(dead_code)]

use std::fmt::Debug;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use job_monitor::storage::BackendError;
use job_monitor::{BackendSource, JobStorage, MonitoringApi, StatisticsSnapshot};
use parking_lot::Mutex;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

pub const NAME: &str = "TestApp";

pub fn sample_statistics() -> StatisticsSnapshot {
    StatisticsSnapshot {
        deleted: 1,
        enqueued: 2,
        failed: 3,
        processing: 4,
        queues: 5,
        recurring: 6,
        scheduled: 7,
        servers: 8,
        succeeded: 9,
    }
}

// =============================================================================
// Log capture
// =============================================================================

#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub has_error: bool,
}

/// Layer that keeps every event emitted by this crate.
#[derive(Clone, Default)]
pub struct LogCapture {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl LogCapture {
    /// Capture events on the current thread until the guard is dropped.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn warnings(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == Level::WARN && r.target.starts_with("job_monitor"))
            .cloned()
            .collect()
    }

    /// Asserts exactly one warning was logged and returns it.
    pub fn single_warning(&self) -> LogRecord {
        let warnings = self.warnings();
        assert_eq!(warnings.len(), 1, "expected exactly one warning, got {:?}", warnings);
        warnings.into_iter().next().unwrap()
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: String,
    has_error: bool,
}

impl Visit for RecordVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        match field.name() {
            "message" => self.message = format!("{:?}", value),
            "error" => self.has_error = true,
            _ => {}
        }
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        self.records.lock().push(LogRecord {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message,
            has_error: visitor.has_error,
        });
    }
}

// =============================================================================
// Fake collector
// =============================================================================

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub api_key: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct CollectorState {
    status: StatusCode,
    delay: Duration,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct Collector {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Collector {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

async fn record_statistics(
    State(state): State<CollectorState>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);

    state.requests.lock().push(RecordedRequest {
        api_key: header("x-api-key"),
        content_type: header("content-type"),
        body,
    });

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    state.status
}

/// Collector answering `POST /api/statistics` with `status`.
pub async fn start_collector(status: StatusCode) -> Collector {
    start_collector_with_delay(status, Duration::ZERO).await
}

/// Collector that records the request, then holds the response for `delay`.
pub async fn start_collector_with_delay(status: StatusCode, delay: Duration) -> Collector {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = CollectorState {
        status,
        delay,
        requests: requests.clone(),
    };

    let router = Router::new()
        .route("/api/statistics", post(record_statistics))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Collector {
        base_url: format!("http://{}", addr),
        requests,
    }
}

/// Endpoint that accepts connections and drops them without answering.
pub struct BrokenCollector {
    pub base_url: String,
    connections: Arc<AtomicUsize>,
}

impl BrokenCollector {
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

pub async fn start_broken_collector() -> BrokenCollector {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr: SocketAddr = listener.local_addr().expect("Failed to get local addr");
    let connections = Arc::new(AtomicUsize::new(0));

    let counter = connections.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            drop(socket);
        }
    });

    BrokenCollector {
        base_url: format!("http://{}", addr),
        connections,
    }
}

// =============================================================================
// Backend stubs
// =============================================================================

/// No backend configured.
pub struct NoBackend;

impl BackendSource for NoBackend {
    fn current(&self) -> Option<Arc<dyn JobStorage>> {
        None
    }
}

type ApiResult = Result<Option<Arc<dyn MonitoringApi>>, BackendError>;
type StatisticsResult = Result<Option<StatisticsSnapshot>, BackendError>;

pub struct JobStorageStub(Box<dyn Fn() -> ApiResult + Send + Sync>);

impl JobStorageStub {
    pub fn new(f: impl Fn() -> ApiResult + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self(Box::new(f)))
    }
}

impl JobStorage for JobStorageStub {
    fn monitoring_api(&self) -> ApiResult {
        (self.0)()
    }
}

pub struct MonitoringApiStub(Box<dyn Fn() -> StatisticsResult + Send + Sync>);

impl MonitoringApiStub {
    pub fn new(f: impl Fn() -> StatisticsResult + Send + Sync + 'static) -> Arc<dyn MonitoringApi> {
        Arc::new(Self(Box::new(f)))
    }
}

impl MonitoringApi for MonitoringApiStub {
    fn statistics(&self) -> StatisticsResult {
        (self.0)()
    }
}

/// Backend whose monitoring API returns `statistics`.
pub fn storage_with(statistics: StatisticsSnapshot) -> Arc<JobStorageStub> {
    JobStorageStub::new(move || Ok(Some(MonitoringApiStub::new(move || Ok(Some(statistics))))))
}
