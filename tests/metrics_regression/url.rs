//! URL engine metrics regression tests

use super::helpers::*;
use serial_test::serial;
use std::time::Duration;
use stress_injector_core::CancellationToken;
use stress_injector_url::{CallKind, RequestError, UrlStress};

#[tokio::test]
#[serial]
async fn url_metrics_exist() {
    init_recorder();

    let service = tower::service_fn(|call: CallKind| async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        match call {
            CallKind::Bulk { index } if index % 2 == 1 => Err(RequestError::Status(500)),
            _ => Ok::<u16, RequestError>(200),
        }
    });

    let engine = UrlStress::builder("http://localhost")
        .name("test_url")
        .rate(10)
        .max_concurrency(2)
        .retry_limit(1_000)
        .backoff(Duration::from_millis(1))
        .build_with_executor(service)
        .unwrap();
    engine.run(&CancellationToken::new()).await.unwrap();

    assert_counter_exists("url_preflight_total");
    assert_counter_exists("url_calls_total");
    assert_counter_exists("url_admission_retries_total");
    assert_histogram_exists("url_injection_duration_seconds");
    assert_metric_has_label("url_preflight_total", "outcome", "success");
    assert_metric_has_label("url_calls_total", "engine", "test_url");
    assert_metric_has_label("url_calls_total", "outcome", "success");
    assert_metric_has_label("url_calls_total", "outcome", "error");
    assert_metric_has_label("url_calls_total", "outcome", "abandoned");
}
