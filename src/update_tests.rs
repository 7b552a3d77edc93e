// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `update.rs`

use super::*;

fn credentials(api_url: &str) -> ResolvedCredentials {
    ResolvedCredentials {
        api_url: api_url.to_string(),
        password: "s3cr3t".to_string(),
    }
}

fn sample_request() -> UpdateRequest {
    build_update_request(
        &credentials("https://dyn.dns.he.net"),
        "_acme-challenge.example.com.",
        "token",
    )
    .unwrap()
}

fn response(status: u16, body: &str) -> ProviderResponse {
    ProviderResponse {
        status,
        body: body.to_string(),
    }
}

// ============================================================================
// Hostname and URL
// ============================================================================

#[test]
fn test_hostname_strips_trailing_dot() {
    assert_eq!(
        hostname_from_fqdn("_acme-challenge.example.com."),
        "_acme-challenge.example.com"
    );
}

#[test]
fn test_hostname_strips_repeated_trailing_dots() {
    assert_eq!(hostname_from_fqdn("example.com.."), "example.com");
}

#[test]
fn test_hostname_without_trailing_dot_unchanged() {
    assert_eq!(hostname_from_fqdn("example.com"), "example.com");
}

#[test]
fn test_update_url() {
    assert_eq!(
        update_url("https://dyn.dns.he.net"),
        "https://dyn.dns.he.net/nic/update"
    );
}

#[test]
fn test_update_url_trailing_slash() {
    assert_eq!(
        update_url("https://dyn.dns.he.net/"),
        "https://dyn.dns.he.net/nic/update"
    );
}

#[test]
fn test_update_url_keeps_base_path() {
    assert_eq!(
        update_url("http://proxy.internal:8080/he"),
        "http://proxy.internal:8080/he/nic/update"
    );
}

// ============================================================================
// Request Building
// ============================================================================

#[test]
fn test_build_update_request_parameters() {
    let request = sample_request();

    assert_eq!(request.url.as_str(), "https://dyn.dns.he.net/nic/update");
    assert_eq!(request.param("hostname"), Some("_acme-challenge.example.com"));
    assert_eq!(request.param("password"), Some("s3cr3t"));
    assert_eq!(request.param("txt"), Some("token"));
}

#[test]
fn test_build_update_request_parameter_order() {
    let request = sample_request();
    let names: Vec<&str> = request.form.iter().map(|(k, _)| k.as_str()).collect();

    assert_eq!(names, vec!["hostname", "password", "txt"]);
}

#[test]
fn test_build_update_request_empty_api_url() {
    let err = build_update_request(&credentials(""), "example.com.", "token").unwrap_err();

    match err {
        SolverError::RequestBuild { method, url, .. } => {
            assert_eq!(method, "POST");
            assert_eq!(url, "/nic/update");
        }
        other => panic!("expected request build error, got {other:?}"),
    }
}

#[test]
fn test_build_update_request_rejects_non_http_scheme() {
    let err = build_update_request(&credentials("ftp://dyn.dns.he.net"), "example.com.", "t")
        .unwrap_err();

    assert!(matches!(err, SolverError::RequestBuild { .. }));
    assert!(err.to_string().contains("ftp"));
}

#[test]
fn test_build_update_request_rejects_garbage_url() {
    assert!(matches!(
        build_update_request(&credentials("not a url"), "example.com.", "t"),
        Err(SolverError::RequestBuild { .. })
    ));
}

#[test]
fn test_build_update_request_rejects_query() {
    let err = build_update_request(
        &credentials("https://dyn.dns.he.net/?v=1"),
        "example.com.",
        "t",
    )
    .unwrap_err();

    match err {
        SolverError::RequestBuild { reason, .. } => assert!(reason.contains("query")),
        other => panic!("expected request build error, got {other:?}"),
    }
}

#[test]
fn test_build_update_request_rejects_fragment() {
    assert!(matches!(
        build_update_request(
            &credentials("https://dyn.dns.he.net#frag"),
            "example.com.",
            "t"
        ),
        Err(SolverError::RequestBuild { .. })
    ));
}

#[test]
fn test_build_update_request_appends_to_base_path() {
    let request = build_update_request(
        &credentials("http://proxy.internal:8080/he/"),
        "example.com.",
        "t",
    )
    .unwrap();

    assert_eq!(request.url.as_str(), "http://proxy.internal:8080/he/nic/update");
    assert_eq!(request.url.query(), None);
}

#[test]
fn test_credentials_debug_redacts_password() {
    let rendered = format!("{:?}", credentials("https://dyn.dns.he.net"));

    assert!(rendered.contains("dyn.dns.he.net"));
    assert!(!rendered.contains("s3cr3t"));
}

// ============================================================================
// Response Classification
// ============================================================================

#[test]
fn test_classify_good() {
    assert_eq!(
        classify_response(&sample_request(), &response(200, "good")).unwrap(),
        UpdateOutcome::Good
    );
}

#[test]
fn test_classify_good_with_trailing_newline() {
    assert_eq!(
        classify_response(&sample_request(), &response(200, "good \"token\"\n")).unwrap(),
        UpdateOutcome::Good
    );
}

#[test]
fn test_classify_nochg() {
    assert_eq!(
        classify_response(&sample_request(), &response(200, "nochg")).unwrap(),
        UpdateOutcome::NoChange
    );
}

#[test]
fn test_classify_badauth() {
    let err = classify_response(&sample_request(), &response(200, "badauth")).unwrap_err();

    match err {
        SolverError::Authentication { hostname, url, .. } => {
            assert_eq!(hostname, "_acme-challenge.example.com");
            assert_eq!(url, "https://dyn.dns.he.net/nic/update");
        }
        other => panic!("expected authentication error, got {other:?}"),
    }
}

#[test]
fn test_classify_badauth_takes_precedence_over_good() {
    assert!(matches!(
        classify_response(&sample_request(), &response(200, "good badauth")),
        Err(SolverError::Authentication { .. })
    ));
}

#[test]
fn test_classify_unknown_body() {
    let err = classify_response(&sample_request(), &response(200, "weird-response")).unwrap_err();

    match err {
        SolverError::UnexpectedResponse { body, .. } => assert_eq!(body, "weird-response"),
        other => panic!("expected unexpected response error, got {other:?}"),
    }
}

#[test]
fn test_classify_empty_body() {
    assert!(matches!(
        classify_response(&sample_request(), &response(200, "")),
        Err(SolverError::UnexpectedResponse { .. })
    ));
}

#[test]
fn test_classify_server_error_ignores_body() {
    let err = classify_response(&sample_request(), &response(500, "good")).unwrap_err();

    match err {
        SolverError::Transport {
            status, url, method, ..
        } => {
            assert_eq!(status, Some(500));
            assert_eq!(url, "https://dyn.dns.he.net/nic/update");
            assert_eq!(method, "POST");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[test]
fn test_classify_client_error() {
    assert!(matches!(
        classify_response(&sample_request(), &response(404, "")),
        Err(SolverError::Transport {
            status: Some(404),
            ..
        })
    ));
}

#[test]
fn test_classify_accepts_other_2xx() {
    assert_eq!(
        classify_response(&sample_request(), &response(201, "nochg")).unwrap(),
        UpdateOutcome::NoChange
    );
}

// ============================================================================
// Log Truncation
// ============================================================================

#[test]
fn test_truncate_short_body_unchanged() {
    assert_eq!(truncate_body("  good\n"), "good");
}

#[test]
fn test_truncate_long_body() {
    let body = "x".repeat(MAX_LOGGED_BODY_CHARS + 50);

    let truncated = truncate_body(&body);

    assert!(truncated.ends_with("..."));
    assert_eq!(truncated.len(), MAX_LOGGED_BODY_CHARS + 3);
}

#[test]
fn test_truncate_respects_char_boundaries() {
    let body = "é".repeat(MAX_LOGGED_BODY_CHARS + 1);

    let truncated = truncate_body(&body);

    assert_eq!(truncated.chars().count(), MAX_LOGGED_BODY_CHARS + 3);
}

#[test]
fn test_outcome_labels() {
    assert_eq!(UpdateOutcome::Good.as_str(), "good");
    assert_eq!(UpdateOutcome::NoChange.as_str(), "nochg");
}
