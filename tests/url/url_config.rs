use std::time::Duration;
use stress_injector_url::{HttpMethod, UrlError, UrlStress};

#[test]
fn unparseable_url_rejected() {
    let err = UrlStress::builder("not a url").build().err().unwrap();
    assert!(matches!(err, UrlError::InvalidUrl { .. }));
}

#[test]
fn unknown_scheme_rejected() {
    let err = UrlStress::builder("gemini://example.com").build().err().unwrap();
    assert!(matches!(err, UrlError::UnsupportedScheme { scheme } if scheme == "gemini"));
}

#[test]
fn unsupported_method_rejected() {
    let err = UrlStress::builder("http://localhost")
        .method_name("PATCH")
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, UrlError::UnsupportedMethod { .. }));
}

#[test]
fn method_names_are_case_insensitive() {
    let engine = UrlStress::builder("http://localhost")
        .method_name("delete")
        .build()
        .unwrap();
    assert_eq!(engine.config().target().method(), HttpMethod::Delete);
}

#[test]
fn zero_rate_and_timeout_rejected() {
    assert!(matches!(
        UrlStress::builder("http://localhost").rate(0).build().err(),
        Some(UrlError::NonPositive { field: "rate" })
    ));
    assert!(matches!(
        UrlStress::builder("http://localhost")
            .timeout(Duration::ZERO)
            .build()
            .err(),
        Some(UrlError::NonPositive { field: "timeout" })
    ));
}

#[test]
fn invalid_header_rejected() {
    let err = UrlStress::builder("http://localhost")
        .header("bad header", "v")
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, UrlError::InvalidHeader { .. }));
}

#[test]
fn pool_defaults_to_rate() {
    let engine = UrlStress::builder("https://example.com")
        .rate(250)
        .build()
        .unwrap();
    assert_eq!(engine.config().max_concurrency(), 250);
    assert_eq!(engine.config().target().netloc(), "example.com");
}

#[test]
fn url_errors_convert_to_invalid_input() {
    let err: stress_injector_core::StressError = UrlError::NonPositive { field: "rate" }.into();
    assert!(err.is_invalid_input());
}
