//! URL engine stress tests

use std::time::{Duration, Instant};
use stress_injector_core::CancellationToken;
use stress_injector_url::{CallKind, RequestError, Termination, UrlStress};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test: Ten thousand real HTTP calls against a local server
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn stress_http_flood() {
    super::init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let engine = UrlStress::builder(server.uri())
        .rate(10_000)
        .max_concurrency(512)
        .retry_limit(100_000)
        .backoff(Duration::from_millis(1))
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap();

    let start = Instant::now();
    let report = engine.run(&CancellationToken::new()).await.unwrap();
    println!("{report}");
    println!("Elapsed: {:?}", start.elapsed());

    assert_eq!(report.termination, Termination::Completed);
    assert_eq!(report.result.scheduled, 10_000);
    assert!(report.result.verify().is_ok());
}

/// Test: A hundred thousand in-process calls with a small pool
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn stress_in_process_flood() {
    let engine = UrlStress::builder("http://localhost")
        .rate(100_000)
        .max_concurrency(64)
        .retry_limit(1_000_000)
        .backoff(Duration::from_micros(100))
        .build_with_executor(tower::service_fn(|call: CallKind| async move {
            match call {
                CallKind::Bulk { index } if index % 10 == 0 => Err(RequestError::Status(500)),
                _ => Ok::<u16, RequestError>(200),
            }
        }))
        .unwrap();

    let report = engine.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(report.result.success, 90_000);
    assert_eq!(report.result.error, 10_000);
    assert_eq!(report.result.abandoned, 0);
}
