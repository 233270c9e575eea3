//! Verify envelope classification against the JSON vectors in `test-vectors/`.
//!
//! Each vector carries a raw body and the expected disposition. The same
//! body is also pushed through `ApiClient::parse` as a 200 response to check
//! that the gateway path agrees with the decoder.

use serde_json::Value;
use warranty_core::{decode, ApiClient, Decoded, ErrorKind, HttpResponse};

fn cases() -> Vec<Value> {
    let raw = include_str!("../../test-vectors/envelopes.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

#[test]
fn envelope_test_vectors() {
    for case in cases() {
        let name = case["name"].as_str().unwrap();
        let body = &case["body"];
        let expected = &case["expected"];

        match (expected["kind"].as_str().unwrap(), decode(body)) {
            ("success", Decoded::Success(data)) => {
                let want = expected.get("data").cloned();
                assert_eq!(data, want, "{name}: data");
            }
            ("fail", Decoded::Fail(err)) => {
                assert_eq!(err.kind, ErrorKind::BusinessFail, "{name}: kind");
                assert_eq!(err.code.as_deref(), expected["code"].as_str(), "{name}: code");
                assert_eq!(err.message, expected["message"].as_str().unwrap(), "{name}: message");
                assert_eq!(&err.raw, body, "{name}: raw");
            }
            ("malformed", Decoded::Malformed(err)) => {
                assert_eq!(err.kind, ErrorKind::MalformedEnvelope, "{name}: kind");
                assert_eq!(&err.raw, body, "{name}: raw");
            }
            (kind, other) => panic!("{name}: expected {kind}, got {other:?}"),
        }
    }
}

#[test]
fn parse_agrees_with_decode() {
    let client = ApiClient::new("http://localhost:3000");
    for case in cases() {
        let name = case["name"].as_str().unwrap();
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: case["body"].to_string(),
        };
        let parsed = client.parse::<Value>(&response);
        let decoded = decode(&case["body"]).into_result();
        match (parsed, decoded) {
            (Ok(got), Ok(data)) => assert_eq!(got, data.unwrap_or(Value::Null), "{name}"),
            (Err(got), Err(want)) => assert_eq!(got, want, "{name}"),
            (got, want) => panic!("{name}: parse gave {got:?}, decode gave {want:?}"),
        }
    }
}

#[test]
fn decoding_twice_is_structurally_equal() {
    for case in cases() {
        assert_eq!(decode(&case["body"]), decode(&case["body"]));
    }
}
