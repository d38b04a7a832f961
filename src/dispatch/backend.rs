//! Handler backends with their concurrency contracts.
//!
//! # Responsibilities
//! - Wrap thread-safe handlers so they run on the calling request task
//! - Wrap single-threaded handlers behind their own affinity queue
//! - Turn every handler fault into a 500 at the invoke boundary
//!
//! # Design Decisions
//! - Closed enum: a backend is concurrent or affine, nothing else
//! - Cloning a backend clones a handle; an affine backend still has exactly
//!   one queue and one worker
//! - Affine mode (blocking or deferred) is fixed per backend at startup

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dispatch::error::{panic_message, HandlerError};
use crate::dispatch::queue::AffinityQueue;
use crate::http::exchange::{ServerRequest, ServerResponse};
use crate::observability::metrics;

/// A handler that may run on any number of threads at once.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, req: &ServerRequest, res: &mut ServerResponse) -> Result<(), HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&ServerRequest, &mut ServerResponse) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    fn handle(&self, req: &ServerRequest, res: &mut ServerResponse) -> Result<(), HandlerError> {
        self(req, res)
    }
}

/// A handler that must only ever run on its own worker, one call at a time.
///
/// No `Send` or `Sync` bound: the handler is built on the worker thread and
/// stays there.
pub trait AffineHandler: 'static {
    fn handle(&mut self, req: &ServerRequest, res: &mut ServerResponse)
        -> Result<(), HandlerError>;
}

impl<F> AffineHandler for F
where
    F: FnMut(&ServerRequest, &mut ServerResponse) -> Result<(), HandlerError> + 'static,
{
    fn handle(
        &mut self,
        req: &ServerRequest,
        res: &mut ServerResponse,
    ) -> Result<(), HandlerError> {
        self(req, res)
    }
}

/// How an affine invoke relates to the calling request task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AffineMode {
    /// The caller waits until the worker has finished the task.
    #[default]
    Blocking,
    /// The caller returns at once; the worker completes the response later.
    Deferred,
}

/// Backend running its handler directly on the calling task.
#[derive(Clone)]
pub struct ConcurrentBackend {
    name: Arc<str>,
    handler: Arc<dyn Handler>,
}

impl ConcurrentBackend {
    /// Wrap a thread-safe handler under `name`.
    pub fn new(name: impl Into<String>, handler: impl Handler) -> Self {
        Self {
            name: Arc::from(name.into()),
            handler: Arc::new(handler),
        }
    }

    /// Run the handler on the calling task and complete `res`.
    pub fn invoke(&self, req: ServerRequest, mut res: ServerResponse) {
        run_guarded(&self.name, &req, &mut res, |req, res| {
            self.handler.handle(req, res)
        });
        res.complete();
    }
}

type BoxedAffine = Box<dyn AffineHandler>;

/// Backend funnelling every call through its own affinity queue.
#[derive(Clone)]
pub struct AffineBackend {
    name: Arc<str>,
    queue: Arc<AffinityQueue<BoxedAffine>>,
    mode: AffineMode,
}

impl AffineBackend {
    /// Start the backend's worker. `factory` runs on the worker to build the handler.
    pub fn spawn<F, H>(name: impl Into<String>, mode: AffineMode, factory: F) -> std::io::Result<Self>
    where
        F: FnOnce() -> H + Send + 'static,
        H: AffineHandler,
    {
        let name: String = name.into();
        let queue = AffinityQueue::spawn(name.clone(), move || Box::new(factory()) as BoxedAffine)?;

        tracing::info!(backend = %name, mode = ?mode, "Affine backend started");

        Ok(Self {
            name: Arc::from(name),
            queue: Arc::new(queue),
            mode,
        })
    }

    /// Whether `invoke` waits for the worker.
    pub fn mode(&self) -> AffineMode {
        self.mode
    }

    /// Tasks waiting on or running in this backend's worker.
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Queue the call on this backend's worker.
    ///
    /// In blocking mode this returns once the worker has completed `res`;
    /// in deferred mode it returns as soon as the task is queued.
    pub async fn invoke(&self, req: ServerRequest, res: ServerResponse) {
        let name = self.name.clone();
        let request_id = req.request_id().to_string();

        let submitted = self.queue.submit(move |handler: &mut BoxedAffine| {
            let mut res = res;
            run_guarded(&name, &req, &mut res, |req, res| handler.handle(req, res));
            res.complete();
        });

        let handle = match submitted {
            Ok(handle) => handle,
            Err(e) => {
                // The rejected task owned the response; dropping it answered 500.
                tracing::error!(backend = %self.name, request_id = %request_id, error = %e, "Affine backend unavailable");
                metrics::record_fault(&self.name);
                return;
            }
        };

        match self.mode {
            AffineMode::Blocking => {
                if let Err(e) = handle.join().await {
                    tracing::error!(backend = %self.name, request_id = %request_id, error = %e, "Affine task failed");
                }
            }
            AffineMode::Deferred => {
                tracing::trace!(backend = %self.name, request_id = %request_id, "Affine task deferred");
            }
        }
    }
}

/// A handler bound to a route.
#[derive(Clone)]
pub enum HandlerBackend {
    Concurrent(ConcurrentBackend),
    Affine(AffineBackend),
}

impl HandlerBackend {
    /// Run the handler under this backend's concurrency contract.
    ///
    /// Completes `res` in every case, including handler faults.
    pub async fn invoke(&self, req: ServerRequest, res: ServerResponse) {
        match self {
            HandlerBackend::Concurrent(backend) => backend.invoke(req, res),
            HandlerBackend::Affine(backend) => backend.invoke(req, res).await,
        }
    }

    /// Backend name used in logs and metrics.
    pub fn name(&self) -> &str {
        match self {
            HandlerBackend::Concurrent(backend) => &backend.name,
            HandlerBackend::Affine(backend) => &backend.name,
        }
    }

    /// `"concurrent"` or `"affine"`.
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerBackend::Concurrent(_) => "concurrent",
            HandlerBackend::Affine(_) => "affine",
        }
    }
}

impl From<ConcurrentBackend> for HandlerBackend {
    fn from(backend: ConcurrentBackend) -> Self {
        HandlerBackend::Concurrent(backend)
    }
}

impl From<AffineBackend> for HandlerBackend {
    fn from(backend: AffineBackend) -> Self {
        HandlerBackend::Affine(backend)
    }
}

impl std::fmt::Debug for HandlerBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerBackend")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

/// Run a handler, replacing its output with the generic 500 if it errors or panics.
fn run_guarded<F>(backend: &str, req: &ServerRequest, res: &mut ServerResponse, f: F)
where
    F: FnOnce(&ServerRequest, &mut ServerResponse) -> Result<(), HandlerError>,
{
    let fault = match panic::catch_unwind(AssertUnwindSafe(|| f(req, &mut *res))) {
        Ok(Ok(())) => return,
        Ok(Err(e)) => e.to_string(),
        Err(payload) => format!("panic: {}", panic_message(payload.as_ref())),
    };

    tracing::error!(
        backend = %backend,
        request_id = %req.request_id(),
        method = %req.method(),
        path = %req.path(),
        error = %fault,
        "Handler fault"
    );
    metrics::record_fault(backend);
    res.fail();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::exchange::{Reply, ReplyBody};
    use axum::http::{Method, StatusCode};
    use std::cell::Cell;
    use std::sync::mpsc;
    use std::time::Duration;

    fn ok_text(text: &'static str) -> impl Handler {
        move |_req: &ServerRequest, res: &mut ServerResponse| -> Result<(), HandlerError> {
            res.send_text(text);
            Ok(())
        }
    }

    async fn call(backend: &HandlerBackend) -> Reply {
        let (res, pending) = ServerResponse::channel();
        backend.invoke(ServerRequest::bare(Method::GET, "/"), res).await;
        pending.wait().await
    }

    #[tokio::test]
    async fn test_concurrent_backend_runs_handler() {
        let backend: HandlerBackend = ConcurrentBackend::new("plain", ok_text("hi")).into();
        let reply = call(&backend).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, ReplyBody::Text("hi".into()));
        assert_eq!(backend.kind(), "concurrent");
    }

    #[tokio::test]
    async fn test_concurrent_error_becomes_500() {
        let backend: HandlerBackend = ConcurrentBackend::new(
            "broken",
            |_req: &ServerRequest, res: &mut ServerResponse| -> Result<(), HandlerError> {
                res.status(StatusCode::CREATED);
                res.send_text("partial");
                Err(HandlerError::fault("database on fire"))
            },
        )
        .into();

        assert_eq!(call(&backend).await, Reply::fault());
    }

    #[tokio::test]
    async fn test_concurrent_panic_becomes_500() {
        let backend: HandlerBackend = ConcurrentBackend::new(
            "panicky",
            |_req: &ServerRequest, _res: &mut ServerResponse| -> Result<(), HandlerError> {
                panic!("unexpected")
            },
        )
        .into();

        assert_eq!(call(&backend).await, Reply::fault());
    }

    #[tokio::test]
    async fn test_affine_handler_keeps_state_on_worker() {
        // Cell makes the handler !Sync; it is only ever touched by its worker.
        let backend: HandlerBackend = AffineBackend::spawn("counter", AffineMode::Blocking, || {
            let calls = Cell::new(0u32);
            move |_req: &ServerRequest, res: &mut ServerResponse| -> Result<(), HandlerError> {
                calls.set(calls.get() + 1);
                res.send_text(format!(
                    "{}:{}",
                    calls.get(),
                    std::thread::current().name().unwrap_or("?")
                ));
                Ok(())
            }
        })
        .unwrap()
        .into();

        for expected in 1..=3 {
            let reply = call(&backend).await;
            assert_eq!(
                reply.body,
                ReplyBody::Text(format!("{expected}:affinity-counter"))
            );
        }
        assert_eq!(backend.kind(), "affine");
    }

    #[tokio::test]
    async fn test_affine_panic_isolated_from_next_call() {
        let backend: HandlerBackend = AffineBackend::spawn("flaky", AffineMode::Blocking, || {
            let mut first = true;
            move |_req: &ServerRequest, res: &mut ServerResponse| -> Result<(), HandlerError> {
                if std::mem::take(&mut first) {
                    panic!("first call explodes");
                }
                res.send_text("recovered");
                Ok(())
            }
        })
        .unwrap()
        .into();

        assert_eq!(call(&backend).await, Reply::fault());
        assert_eq!(call(&backend).await.body, ReplyBody::Text("recovered".into()));
    }

    #[tokio::test]
    async fn test_blocking_mode_waits_for_completion() {
        let backend = AffineBackend::spawn("slow", AffineMode::Blocking, || {
            |_req: &ServerRequest, res: &mut ServerResponse| -> Result<(), HandlerError> {
                std::thread::sleep(Duration::from_millis(20));
                res.send_text("done");
                Ok(())
            }
        })
        .unwrap();

        assert_eq!(backend.mode(), AffineMode::Blocking);

        let (res, pending) = ServerResponse::channel();
        backend.invoke(ServerRequest::bare(Method::GET, "/"), res).await;
        assert_eq!(pending.wait().await.body, ReplyBody::Text("done".into()));
    }

    #[tokio::test]
    async fn test_deferred_mode_returns_before_completion() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let backend = AffineBackend::spawn("gated", AffineMode::Deferred, move || {
            move |_req: &ServerRequest, res: &mut ServerResponse| -> Result<(), HandlerError> {
                release_rx
                    .recv()
                    .map_err(|_| HandlerError::fault("gate dropped"))?;
                res.send_text("released");
                Ok(())
            }
        })
        .unwrap();
        assert_eq!(backend.mode(), AffineMode::Deferred);

        let (res, pending) = ServerResponse::channel();
        backend.invoke(ServerRequest::bare(Method::GET, "/"), res).await;

        // invoke returned while the worker is still parked on the gate.
        assert_eq!(backend.pending(), 1);
        release_tx.send(()).unwrap();
        assert_eq!(pending.wait().await.body, ReplyBody::Text("released".into()));
    }
}
