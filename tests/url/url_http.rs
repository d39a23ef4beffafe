use std::time::Duration;
use stress_injector_core::CancellationToken;
use stress_injector_url::{HttpMethod, LoadResult, RequestError, Termination, UrlStress};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn healthy_target_counts_every_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .expect(26)
        .mount(&server)
        .await;

    let engine = UrlStress::builder(format!("{}/health", server.uri()))
        .rate(25)
        .build()
        .unwrap();
    let report = engine.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(
        report.result,
        LoadResult {
            requested: 25,
            scheduled: 25,
            success: 25,
            error: 0,
            abandoned: 0
        }
    );
    assert_eq!(report.termination, Termination::Completed);
}

#[tokio::test]
async fn failing_preflight_sends_only_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let engine = UrlStress::builder(server.uri()).rate(40).build().unwrap();
    let report = engine.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(report.result, LoadResult::all_abandoned(40));
    assert_eq!(
        report.termination,
        Termination::PreflightFailed {
            cause: RequestError::Status(500)
        }
    );
    assert!(report.to_string().contains("40"));
}

#[tokio::test]
async fn error_statuses_after_preflight_are_counted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let engine = UrlStress::builder(server.uri()).rate(10).build().unwrap();
    let report = engine.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(report.result.success, 0);
    assert_eq!(report.result.error, 10);
    assert_eq!(report.result.abandoned, 0);
}

#[tokio::test]
async fn slow_bulk_calls_time_out_but_preflight_waits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let engine = UrlStress::builder(server.uri())
        .rate(4)
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let report = engine.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(report.termination, Termination::Completed);
    assert_eq!(report.result.error, 4);
    assert_eq!(report.result.success, 0);
}

#[tokio::test]
async fn method_headers_and_body_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ingest"))
        .and(header("x-api-key", "secret"))
        .and(body_string("{\"ping\":true}"))
        .respond_with(ResponseTemplate::new(201))
        .expect(6)
        .mount(&server)
        .await;

    let engine = UrlStress::builder(format!("{}/ingest", server.uri()))
        .method(HttpMethod::Post)
        .header("X-Api-Key", "secret")
        .body("{\"ping\":true}")
        .rate(5)
        .build()
        .unwrap();
    let report = engine.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(report.result.success, 5);
}

#[tokio::test]
async fn unreachable_target_fails_preflight() {
    let engine = UrlStress::builder("http://127.0.0.1:9/")
        .rate(3)
        .build()
        .unwrap();
    let report = engine.run(&CancellationToken::new()).await.unwrap();

    assert!(matches!(
        report.termination,
        Termination::PreflightFailed {
            cause: RequestError::Transport(_) | RequestError::Timeout
        }
    ));
    assert_eq!(report.result.abandoned, 3);
}
