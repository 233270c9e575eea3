use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, DEMO_PASSWORD, DEMO_USERNAME, UNAUTHORIZED_CODE, WRONG_PASSWORD_CODE};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(String::new()).unwrap()
}

async fn login(app: &Router) -> String {
    let body = json!({"username": DEMO_USERNAME, "password": DEMO_PASSWORD}).to_string();
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/auth/login", &body, None))
        .await
        .unwrap();
    let json = body_json(resp).await;
    json["data"]["token"].as_str().unwrap().to_string()
}

// --- auth ---

#[tokio::test]
async fn login_success_returns_envelope_with_token() {
    let app = app();
    let body = json!({"username": DEMO_USERNAME, "password": DEMO_PASSWORD}).to_string();
    let resp = app
        .oneshot(json_request("POST", "/auth/login", &body, None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["result"], "success");
    assert_eq!(json["data"]["type"], "Bearer");
    assert!(!json["data"]["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn wrong_password_is_fail_envelope_under_200() {
    let app = app();
    let body = json!({"username": DEMO_USERNAME, "password": "nope"}).to_string();
    let resp = app
        .oneshot(json_request("POST", "/auth/login", &body, None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["code"], WRONG_PASSWORD_CODE);
    assert_eq!(json["messages"]["vn"], "Sai mật khẩu");
    assert!(json.get("result").is_none());
}

#[tokio::test]
async fn short_register_password_is_legacy_error() {
    let app = app();
    let body = json!({"industryId": "1", "phone": "0900", "password": "123"}).to_string();
    let resp = app
        .oneshot(json_request("POST", "/auth/register", &body, None))
        .await
        .unwrap();

    let json = body_json(resp).await;
    assert_eq!(json["result"], "error");
    assert_eq!(json["errorCode"], "RG001");
}

// --- stores ---

#[tokio::test]
async fn stores_require_a_known_token() {
    let app = app();
    let resp = app
        .oneshot(get_request("/stores/1", Some("forged")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(resp).await;
    assert_eq!(json["code"], UNAUTHORIZED_CODE);
}

#[tokio::test]
async fn store_create_get_delete() {
    let app = app();
    let token = login(&app).await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/stores",
            r#"{"name":"Main","code":"S1"}"#,
            Some(&token),
        ))
        .await
        .unwrap();
    let created = body_json(resp).await;
    assert_eq!(created["data"]["status"], "ACTIVE");
    let id = created["data"]["id"].as_i64().unwrap();

    let resp = app
        .clone()
        .oneshot(get_request(&format!("/stores/{id}"), Some(&token)))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["data"]["name"], "Main");

    let resp = app
        .clone()
        .oneshot(json_request("DELETE", &format!("/stores/{id}"), "", Some(&token)))
        .await
        .unwrap();
    let deleted = body_json(resp).await;
    assert_eq!(deleted["result"], "success");
    assert!(deleted.get("data").is_none());

    let resp = app
        .oneshot(get_request(&format!("/stores/{id}"), Some(&token)))
        .await
        .unwrap();
    let missing = body_json(resp).await;
    assert_eq!(missing["result"], "error");
    assert_eq!(missing["errorCode"], "ST404");
}

#[tokio::test]
async fn duplicate_store_code_is_409_fail() {
    let app = app();
    let token = login(&app).await;
    let body = r#"{"name":"Main","code":"S1"}"#;
    app.clone()
        .oneshot(json_request("POST", "/stores", body, Some(&token)))
        .await
        .unwrap();
    let resp = app
        .oneshot(json_request("POST", "/stores", body, Some(&token)))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(resp).await["code"], "ST409");
}

#[tokio::test]
async fn store_search_pages() {
    let app = app();
    let token = login(&app).await;
    for i in 0..3 {
        let body = json!({"name": format!("Shop {i}"), "code": format!("C{i}")}).to_string();
        app.clone()
            .oneshot(json_request("POST", "/stores", &body, Some(&token)))
            .await
            .unwrap();
    }

    let resp = app
        .oneshot(json_request(
            "POST",
            "/stores/search",
            r#"{"page":1,"size":2}"#,
            Some(&token),
        ))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["totalElements"], 3);
    assert_eq!(json["data"]["totalPages"], 2);
    assert_eq!(json["data"]["content"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn far_page_is_empty_not_a_crash() {
    let app = app();
    let token = login(&app).await;
    let last = usize::MAX;

    let body = json!({"page": last, "size": 50}).to_string();
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/stores/search", &body, Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["result"], "success");
    assert!(json["data"]["content"].as_array().unwrap().is_empty());

    let resp = app
        .oneshot(get_request(&format!("/users/list?page={last}&size=50"), Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert!(json["data"]["items"].as_array().unwrap().is_empty());
}

// --- debug shapes ---

#[tokio::test]
async fn malformed_route_has_no_envelope_fields() {
    let resp = app().oneshot(get_request("/debug/malformed", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"foo": "bar"}));
}

#[tokio::test]
async fn plain_error_route_is_not_json() {
    let resp = app().oneshot(get_request("/debug/plain-error", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_bytes(resp).await, "upstream unavailable");
}

#[tokio::test]
async fn headers_route_echoes_client_headers() {
    let req = Request::builder()
        .uri("/debug/headers")
        .header("x-skip-error-toast", "1")
        .header(http::header::AUTHORIZATION, "Bearer t")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["skipErrorToast"], "1");
    assert_eq!(json["data"]["authorization"], "Bearer t");
    assert_eq!(json["data"]["contentType"], Value::Null);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let resp = app().oneshot(get_request("/nope", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
