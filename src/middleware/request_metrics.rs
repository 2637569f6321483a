//! Per-request metrics middleware.
//!
//! Every request passing through the router is counted, counted again as an
//! error when its status is `>= 400`, and timed. Labels are `method`, `route`
//! (the matched route pattern, or the raw path when nothing matched) and
//! `status_code`.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request, State};
use axum::http::StatusCode;
use axum::middleware::{from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{debug, error, info_span, warn, Instrument};
use uuid::Uuid;

use crate::metrics::MetricsRecorder;
use crate::utils::http_helpers::HTTPError;
use crate::utils::log_throttle::LogThrottle;

/// Minimum time between two warnings for the same kind of recording failure.
const ERROR_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// State of the middleware: where to record, and how often to complain.
#[derive(Clone)]
pub struct Instrumentation<R> {
    recorder: R,
    throttle: Arc<LogThrottle>,
}

impl<R: MetricsRecorder> Instrumentation<R> {
    pub fn new(recorder: R) -> Self {
        Instrumentation {
            recorder,
            throttle: Arc::new(LogThrottle::new(ERROR_LOG_INTERVAL)),
        }
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }
}

/// Records a request exactly once.
///
/// `complete` consumes the guard. A guard dropped without being completed
/// means the request future was cancelled before a response existed (the
/// client went away); that observation is skipped. Handler panics never get
/// here when the router is built with [`instrument`]: they become 500s first.
pub struct CompletionGuard<R: MetricsRecorder> {
    instrumentation: Instrumentation<R>,
    method: String,
    route: String,
    start: Instant,
    completed: bool,
}

impl<R: MetricsRecorder> CompletionGuard<R> {
    pub fn start(instrumentation: Instrumentation<R>, method: String, route: String) -> Self {
        CompletionGuard {
            instrumentation,
            method,
            route,
            start: Instant::now(),
            completed: false,
        }
    }

    /// Records the request with its final status and returns the duration in seconds.
    pub fn complete(mut self, status: StatusCode) -> f64 {
        self.completed = true;
        let duration = self.start.elapsed().as_secs_f64();

        let Instrumentation { recorder, throttle } = &self.instrumentation;
        if let Err(e) =
            recorder.record_request(&self.method, &self.route, status.as_u16(), duration)
        {
            if let Some(suppressed) = throttle.should_emit(e.kind()) {
                warn!(error = %e, suppressed, "Failed to record request metrics");
            }
        }
        duration
    }
}

impl<R: MetricsRecorder> Drop for CompletionGuard<R> {
    fn drop(&mut self) {
        if !self.completed {
            debug!(
                method = %self.method,
                route = %self.route,
                "Request aborted before completion, metrics not recorded"
            );
        }
    }
}

/// Axum middleware recording request metrics.
///
/// Install it through [`instrument`], which also turns handler panics into
/// responses the middleware can record.
pub async fn track_http_metrics<R: MetricsRecorder>(
    State(instrumentation): State<Instrumentation<R>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().as_str().to_uppercase();

    // The route pattern, not the raw path, keeps label cardinality bounded.
    // Unmatched requests fall back to the raw path.
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let span = info_span!(
        "http_request",
        request_id = %Uuid::new_v4(),
        method = %method,
        route = %route,
    );

    async move {
        let guard = CompletionGuard::start(instrumentation, method, route);
        let response = next.run(request).await;
        let duration = guard.complete(response.status());
        debug!(
            status = response.status().as_u16(),
            duration_secs = duration,
            "Request completed"
        );
        response
    }
    .instrument(span)
    .await
}

/// Wraps every route of `router`, and its fallback, with request metrics.
///
/// Panics are caught inside the metrics layer and answered with a JSON 500,
/// so they are counted like any other server error.
pub fn instrument<S, R>(router: Router<S>, recorder: R) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    R: MetricsRecorder,
{
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn_with_state(
            Instrumentation::new(recorder),
            track_http_metrics::<R>,
        ))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };
    error!(panic = %detail, "Handler panicked");
    HTTPError::internal("Internal server error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricsConfig;
    use crate::metrics::Metrics;

    fn instrumentation() -> Instrumentation<Metrics> {
        Instrumentation::new(Metrics::new(&MetricsConfig::default()).unwrap())
    }

    #[test]
    fn completed_guard_records_once() {
        let instr = instrumentation();
        let guard = CompletionGuard::start(instr.clone(), "GET".into(), "/a".into());
        guard.complete(StatusCode::OK);

        let labels = [("method", "GET"), ("route", "/a"), ("status_code", "200")];
        let metrics = instr.recorder();
        assert_eq!(metrics.http_requests_total().get(&labels).unwrap(), Some(1.0));
        let state = metrics
            .http_request_duration_seconds()
            .get(&labels)
            .unwrap()
            .unwrap();
        assert_eq!(state.count, 1);
    }

    #[test]
    fn dropped_guard_records_nothing() {
        let instr = instrumentation();
        drop(CompletionGuard::start(instr.clone(), "GET".into(), "/a".into()));

        let labels = [("method", "GET"), ("route", "/a"), ("status_code", "200")];
        assert_eq!(
            instr.recorder().http_requests_total().get(&labels).unwrap(),
            None
        );
    }

    #[test]
    fn recording_failure_does_not_panic() {
        #[derive(Clone)]
        struct Failing;

        impl MetricsRecorder for Failing {
            fn record_request(&self, _: &str, _: &str, _: u16, v: f64) -> crate::metrics::Result<()> {
                Err(crate::metrics::MetricsError::InvalidValue {
                    metric: "test".into(),
                    value: v,
                    reason: "always fails",
                })
            }

            fn set_active_users(&self, _: f64) -> crate::metrics::Result<()> {
                Ok(())
            }
        }

        let instr = Instrumentation::new(Failing);
        for _ in 0..3 {
            let guard = CompletionGuard::start(instr.clone(), "GET".into(), "/".into());
            assert!(guard.complete(StatusCode::INTERNAL_SERVER_ERROR) >= 0.0);
        }
    }

    #[test]
    fn panic_payloads_become_json_500() {
        let payloads: Vec<Box<dyn Any + Send>> =
            vec![Box::new("static"), Box::new(String::from("owned")), Box::new(7u8)];
        for payload in payloads {
            let response = panic_response(payload);
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                response.headers()[axum::http::header::CONTENT_TYPE],
                "application/json"
            );
        }
    }
}
