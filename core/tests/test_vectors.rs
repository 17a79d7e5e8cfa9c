//! Verify request building and response parsing against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Comparing parsed JSON (not raw strings) avoids false negatives from
//! field-ordering differences.

use scalebox_core::{ApiError, HttpMethod, HttpRequest, HttpResponse, Sandbox, ScaleboxClient};

const BASE_URL: &str = "http://localhost:3000";

fn client() -> ScaleboxClient {
    ScaleboxClient::new(BASE_URL, "test-key").unwrap()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let response = HttpResponse {
            status: case["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: case["body"].as_str().unwrap().to_string(),
        };
        let result = c.parse_response::<Sandbox>(&response);

        if let Some(expected) = case.get("expected_error") {
            match result {
                Err(ApiError::Api { status, message }) => {
                    assert_eq!(u64::from(status), expected["status"].as_u64().unwrap(), "{name}: status");
                    assert_eq!(message, expected["message"].as_str().unwrap(), "{name}: message");
                }
                other => panic!("{name}: expected Api error, got {other:?}"),
            }
        } else {
            let sandbox = result.unwrap_or_else(|e| panic!("{name}: {e}"));
            let expected = &case["expected_result"];
            assert_eq!(sandbox.sandbox_id, expected["sandbox_id"].as_str().unwrap(), "{name}: sandbox_id");
            assert_eq!(sandbox.status.as_str(), expected["status"].as_str().unwrap(), "{name}: status");
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

fn build(c: &ScaleboxClient, case: &serde_json::Value) -> HttpRequest {
    let id = case["sandbox_id"].as_str().unwrap();
    let force = case["force"].as_bool();
    match case["operation"].as_str().unwrap() {
        "get" => c.build_get_sandbox(id),
        "get_status" => c.build_get_sandbox_status(id),
        "pause" => c.build_pause_sandbox(id),
        "resume" => c.build_resume_sandbox(id),
        "connect" => c.build_connect_sandbox(id, None),
        "delete" => c.build_delete_sandbox(id, force),
        "terminate" => c.build_terminate_sandbox(id, force),
        other => panic!("unknown operation: {other}"),
    }
    .unwrap()
}

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected_req = &case["expected_request"];

        let req = build(&c, case);
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: url");
        assert_eq!(req.header("content-type"), Some("application/json"), "{name}: content-type");
        assert_eq!(req.header("x-api-key"), Some("test-key"), "{name}: api key");

        match (&req.body, &expected_req["body"]) {
            (None, serde_json::Value::Null) => {}
            (Some(body), expected) => {
                let body: serde_json::Value = serde_json::from_str(body).unwrap();
                assert_eq!(&body, expected, "{name}: body");
            }
            (None, expected) => panic!("{name}: expected body {expected}, got none"),
        }
    }
}
