use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use restbench_core::runner::{
    self, FailureEvent, FlowSpec, RequestTemplate, RunHandle, RunOptions, hooks,
};
use restbench_core::{HttpRequest, HttpResponse, HttpResult, Transport};

#[derive(Debug, Clone)]
struct SeenRequest {
    method: String,
    url: String,
    body: String,
    headers: Vec<(String, String)>,
}

/// In-memory transport double: records every request in arrival order and
/// answers like the canonical test server (401 for /makeError, a token for
/// /auth/login, 200 "Hello World" otherwise).
#[derive(Debug, Clone, Default)]
struct MockTransport {
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    active: Arc<AtomicU64>,
    max_active: Arc<AtomicU64>,
    delay: Option<Duration>,
}

impl MockTransport {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn seen(&self) -> Vec<SeenRequest> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn max_active(&self) -> u64 {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    async fn execute(&self, req: HttpRequest) -> HttpResult<HttpResponse> {
        {
            let mut seen = self
                .seen
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            seen.push(SeenRequest {
                method: req.method.to_string(),
                url: req.url.clone(),
                body: String::from_utf8_lossy(&req.body).to_string(),
                headers: req.headers.clone(),
            });
        }

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let res = if req.url.contains("/makeError") {
            HttpResponse {
                status: 401,
                body: Bytes::from_static(b"Unauthorized"),
            }
        } else if req.url.contains("/auth/login") {
            HttpResponse {
                status: 200,
                body: Bytes::from_static(br#"{"data":{"access_token":"tok-1"}}"#),
            }
        } else {
            HttpResponse {
                status: 200,
                body: Bytes::from_static(b"Hello World"),
            }
        };
        Ok(res)
    }
}

fn drain_failures(handle: &mut RunHandle) -> tokio::task::JoinHandle<Vec<FailureEvent>> {
    let mut rx = match handle.take_failures() {
        Some(rx) => rx,
        None => panic!("failure receiver already taken"),
    };
    tokio::spawn(async move {
        let mut out = Vec::new();
        while let Some(ev) = rx.recv().await {
            out.push(ev);
        }
        out
    })
}

#[tokio::test]
async fn total_requests_match_stage_formula() {
    let flow = FlowSpec {
        before: vec![RequestTemplate::head("http://localhost:8000/beforeEverything")],
        before_main: vec![RequestTemplate::head(
            "http://localhost:8000/foo_#{INDEX}?beforeEachIteration",
        )],
        main: vec![
            RequestTemplate::put("http://localhost:8000/foo_#{INDEX}", "mydata_#{INDEX}"),
            RequestTemplate::get("http://localhost:8000/foo_#{INDEX}"),
        ],
        after_main: vec![RequestTemplate::delete(
            "http://localhost:8000/foo_#{INDEX}?afterEachIteration",
        )],
        after: vec![RequestTemplate::head("http://localhost:8000/afterEverything")],
    };
    let transport = MockTransport::default();

    let handle = match runner::start(flow, RunOptions::new(5, 3), transport.clone()) {
        Ok(h) => h,
        Err(err) => panic!("start failed: {err}"),
    };
    let result = match handle.wait().await {
        Ok(r) => r,
        Err(err) => panic!("run failed: {err}"),
    };

    // before + requests*(beforeMain + main + afterMain) + after
    assert_eq!(transport.seen().len(), 1 + 5 * (1 + 2 + 1) + 1);
    assert_eq!(result.failed_requests_total, 0);

    assert_eq!(result.before.meter.count, 1);
    assert_eq!(result.before_main.meter.count, 5);
    assert_eq!(result.main.meter.count, 10);
    assert_eq!(result.after_main.meter.count, 5);
    assert_eq!(result.after.meter.count, 1);

    // Non-empty buckets report a numeric percentile and ordered stats.
    let h = result.main.histogram;
    assert!(h.p95_ms.is_some());
    match (h.min_ms, h.mean_ms, h.max_ms) {
        (Some(min), Some(mean), Some(max)) => assert!(min <= mean && mean <= max),
        other => panic!("expected populated histogram, got {other:?}"),
    }
}

#[tokio::test]
async fn limit_one_executes_in_strict_program_order() {
    let flow = FlowSpec {
        main: vec![
            RequestTemplate::put("http://localhost:8000/foo_#{INDEX}", "mydata_#{INDEX}"),
            RequestTemplate::get("http://localhost:8000/foo_#{INDEX}"),
        ],
        ..FlowSpec::default()
    };
    let transport = MockTransport::default();

    let handle = match runner::start(flow, RunOptions::new(2, 1), transport.clone()) {
        Ok(h) => h,
        Err(err) => panic!("start failed: {err}"),
    };
    let result = match handle.wait().await {
        Ok(r) => r,
        Err(err) => panic!("run failed: {err}"),
    };
    assert_eq!(result.failed_requests_total, 0);

    let seen = transport.seen();
    let got: Vec<(String, String, String)> = seen
        .iter()
        .map(|r| (r.method.clone(), r.url.clone(), r.body.clone()))
        .collect();

    assert_eq!(
        got,
        vec![
            (
                "PUT".to_string(),
                "http://localhost:8000/foo_0".to_string(),
                "\"mydata_0\"".to_string()
            ),
            (
                "GET".to_string(),
                "http://localhost:8000/foo_0".to_string(),
                String::new()
            ),
            (
                "PUT".to_string(),
                "http://localhost:8000/foo_1".to_string(),
                "\"mydata_1\"".to_string()
            ),
            (
                "GET".to_string(),
                "http://localhost:8000/foo_1".to_string(),
                String::new()
            ),
        ]
    );
}

#[tokio::test]
async fn failures_are_counted_per_request_and_streamed() {
    let flow = FlowSpec {
        main: vec![
            RequestTemplate::get("http://localhost:8000/foo"),
            RequestTemplate::put("http://localhost:8000/makeError", "mydata"),
        ],
        ..FlowSpec::default()
    };
    let transport = MockTransport::default();

    let mut handle = match runner::start(flow, RunOptions::new(2, 2), transport.clone()) {
        Ok(h) => h,
        Err(err) => panic!("start failed: {err}"),
    };
    let failures = drain_failures(&mut handle);

    let result = match handle.wait().await {
        Ok(r) => r,
        Err(err) => panic!("run failed: {err}"),
    };
    let failures = match failures.await {
        Ok(f) => f,
        Err(err) => panic!("failure collector panicked: {err}"),
    };

    assert_eq!(failures.len(), 2);
    for ev in &failures {
        assert!(ev.error.contains("401"), "error should mention 401: {}", ev.error);
    }
    assert_eq!(result.failed_requests_total, 2);

    // Every request still ran: the iteration continues past a failure.
    assert_eq!(transport.seen().len(), 4);
    assert_eq!(result.main.meter.count, 4);
}

#[tokio::test]
async fn concurrency_never_exceeds_limit() {
    let flow = FlowSpec {
        main: vec![RequestTemplate::get("http://localhost:8000/foo")],
        ..FlowSpec::default()
    };
    let transport = MockTransport::with_delay(Duration::from_millis(20));

    let handle = match runner::start(flow, RunOptions::new(10, 3), transport.clone()) {
        Ok(h) => h,
        Err(err) => panic!("start failed: {err}"),
    };
    if let Err(err) = handle.wait().await {
        panic!("run failed: {err}");
    }

    assert_eq!(transport.seen().len(), 10);
    assert!(
        transport.max_active() <= 3,
        "max in-flight was {}",
        transport.max_active()
    );

    let serial = MockTransport::with_delay(Duration::from_millis(5));
    let flow = FlowSpec {
        main: vec![RequestTemplate::get("http://localhost:8000/foo")],
        ..FlowSpec::default()
    };
    let handle = match runner::start(flow, RunOptions::new(5, 1), serial.clone()) {
        Ok(h) => h,
        Err(err) => panic!("start failed: {err}"),
    };
    if let Err(err) = handle.wait().await {
        panic!("run failed: {err}");
    }
    assert_eq!(serial.max_active(), 1);
}

#[tokio::test]
async fn hooks_thread_context_within_an_iteration() {
    let flow = FlowSpec {
        main: vec![
            RequestTemplate::post("http://localhost:8000/auth/login", "credentials")
                .with_after_hook(hooks::capture_access_token()),
            RequestTemplate::get("http://localhost:8000/private")
                .with_before_hook(hooks::provide_access_token()),
        ],
        ..FlowSpec::default()
    };
    let transport = MockTransport::default();

    let handle = match runner::start(flow, RunOptions::new(2, 1), transport.clone()) {
        Ok(h) => h,
        Err(err) => panic!("start failed: {err}"),
    };
    if let Err(err) = handle.wait().await {
        panic!("run failed: {err}");
    }

    let seen = transport.seen();
    assert_eq!(seen.len(), 4);
    for private in [&seen[1], &seen[3]] {
        assert!(private.url.ends_with("/private"));
        let auth = private
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("authorization"))
            .map(|(_, v)| v.as_str());
        assert_eq!(auth, Some("Bearer tok-1"));
    }
}

#[tokio::test]
async fn validation_fails_before_any_transport_call() {
    let transport = MockTransport::default();

    let missing_requests = RunOptions {
        requests: None,
        limit: Some(10),
    };
    let flow = FlowSpec {
        main: vec![RequestTemplate::get("http://localhost:8000")],
        ..FlowSpec::default()
    };
    let err = match runner::start(flow.clone(), missing_requests, transport.clone()) {
        Err(err) => err,
        Ok(_) => panic!("expected config error"),
    };
    assert!(
        err.to_string()
            .contains("requires requests and limit properties")
    );

    let missing_limit = RunOptions {
        requests: Some(100),
        limit: None,
    };
    assert!(runner::start(flow, missing_limit, transport.clone()).is_err());

    let no_main = FlowSpec::default();
    let err = match runner::start(no_main, RunOptions::new(100, 10), transport.clone()) {
        Err(err) => err,
        Ok(_) => panic!("expected config error"),
    };
    assert!(
        err.to_string()
            .contains("requires an array of operations as property main")
    );

    assert!(transport.seen().is_empty());
}
