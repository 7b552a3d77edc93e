// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `challenge.rs`

use super::*;
use serde_json::json;

fn present_payload() -> serde_json::Value {
    json!({
        "apiVersion": "webhook.acme.cert-manager.io/v1alpha1",
        "kind": "ChallengePayload",
        "request": {
            "uid": "6b6f1d9e-0000-4000-8000-000000000001",
            "action": "Present",
            "type": "dns-01",
            "dnsName": "example.com",
            "key": "abc123",
            "resourceNamespace": "cert-manager",
            "fqdn": "_acme-challenge.example.com.",
            "zone": "example.com.",
            "allowAmbientCredentials": false,
            "config": {
                "apiUrl": "https://dyn.dns.he.net",
                "secretName": "henet-credentials"
            }
        }
    })
}

#[test]
fn test_decode_present_request() {
    let payload: ChallengePayload = serde_json::from_value(present_payload()).unwrap();
    let request = payload.request.expect("request should be present");

    assert_eq!(request.uid, "6b6f1d9e-0000-4000-8000-000000000001");
    assert_eq!(request.action, ChallengeAction::Present);
    assert_eq!(request.challenge_type, "dns-01");
    assert_eq!(request.key, "abc123");
    assert_eq!(request.resource_namespace, "cert-manager");
    assert_eq!(request.resolved_fqdn, "_acme-challenge.example.com.");
    assert_eq!(request.resolved_zone, "example.com.");
    assert_eq!(
        request.config.unwrap()["secretName"],
        json!("henet-credentials")
    );
}

#[test]
fn test_decode_cleanup_action() {
    let mut value = present_payload();
    value["request"]["action"] = json!("CleanUp");

    let payload: ChallengePayload = serde_json::from_value(value).unwrap();
    assert_eq!(payload.request.unwrap().action, ChallengeAction::CleanUp);
}

#[test]
fn test_decode_unknown_action_fails() {
    let mut value = present_payload();
    value["request"]["action"] = json!("Refresh");

    assert!(serde_json::from_value::<ChallengePayload>(value).is_err());
}

#[test]
fn test_decode_without_config() {
    let mut value = present_payload();
    value["request"]
        .as_object_mut()
        .unwrap()
        .remove("config");

    let payload: ChallengePayload = serde_json::from_value(value).unwrap();
    assert!(payload.request.unwrap().config.is_none());
}

#[test]
fn test_action_labels() {
    assert_eq!(ChallengeAction::Present.as_str(), "present");
    assert_eq!(ChallengeAction::CleanUp.as_str(), "cleanup");
}

#[test]
fn test_success_response_has_no_status() {
    let response = ChallengeResponse::success("uid-1");
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["uid"], json!("uid-1"));
    assert_eq!(value["success"], json!(true));
    assert!(value.get("status").is_none());
}

#[test]
fn test_failure_response_carries_reason_and_message() {
    let response = ChallengeResponse::failure("uid-2", &SolverError::NotInitialized);
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["success"], json!(false));
    assert_eq!(value["status"]["status"], json!("Failure"));
    assert_eq!(value["status"]["reason"], json!("SolverNotInitialized"));
    assert_eq!(value["status"]["code"], json!(503));
    assert!(value["status"]["message"]
        .as_str()
        .unwrap()
        .contains("not been initialized"));
}

#[test]
fn test_failure_code_follows_error_kind() {
    let auth = SolverError::Authentication {
        hostname: "_acme-challenge.example.com".to_string(),
        method: "POST".to_string(),
        url: "https://dyn.dns.he.net/nic/update".to_string(),
    };

    let response = ChallengeResponse::failure("uid-3", &auth);

    assert_eq!(response.result.unwrap().code, Some(403));
}

#[test]
fn test_from_result() {
    assert!(ChallengeResponse::from_result("a", &Ok(())).success);

    let failed = ChallengeResponse::from_result("b", &Err(SolverError::AlreadyInitialized));
    assert!(!failed.success);
    assert_eq!(failed.uid, "b");
}

#[test]
fn test_respond_fills_envelope() {
    let payload: ChallengePayload = serde_json::from_value(json!({
        "request": { "uid": "u", "action": "Present" }
    }))
    .unwrap();

    let answered = payload.respond(ChallengeResponse::success("u"));

    assert_eq!(answered.api_version, CHALLENGE_PAYLOAD_API_VERSION);
    assert_eq!(answered.kind, KIND_CHALLENGE_PAYLOAD);
    assert!(answered.request.is_some());
    assert!(answered.response.unwrap().success);
}
