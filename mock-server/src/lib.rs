//! In-memory stand-in for the warranty backend.
//!
//! Speaks every envelope shape the real backend has used: success envelopes,
//! new-style `{code, messages}` failures, old-style `result: "error"`
//! envelopes, and a few deliberately broken responses under `/debug`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEMO_USERNAME: &str = "admin";
pub const DEMO_PASSWORD: &str = "secret";

/// Backend code for a wrong username/password pair.
pub const WRONG_PASSWORD_CODE: &str = "SS004";
/// Backend code for a missing or unknown bearer token.
pub const UNAUTHORIZED_CODE: &str = "AU001";

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    time_stamp: String,
    security_version: String,
    result: &'static str,
    message: String,
    error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

fn success(data: impl Serialize) -> Response {
    match serde_json::to_value(data) {
        Ok(data) => Json(Envelope {
            time_stamp: timestamp(),
            security_version: "1".to_string(),
            result: "success",
            message: "OK".to_string(),
            error_code: String::new(),
            data: Some(data),
        })
        .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

fn success_empty() -> Response {
    Json(Envelope {
        time_stamp: timestamp(),
        security_version: "1".to_string(),
        result: "success",
        message: "OK".to_string(),
        error_code: String::new(),
        data: None,
    })
    .into_response()
}

/// Old-style failure delivered with HTTP 200.
fn legacy_error(error_code: &str, message: &str) -> Response {
    Json(Envelope {
        time_stamp: timestamp(),
        security_version: "1".to_string(),
        result: "error",
        message: message.to_string(),
        error_code: error_code.to_string(),
        data: None,
    })
    .into_response()
}

/// New-style failure.
fn fail(status: StatusCode, code: &str, vn: &str, en: &str) -> Response {
    let mut messages = BTreeMap::new();
    messages.insert("vn", vn);
    messages.insert("en", en);
    (status, Json(json!({ "code": code, "messages": messages }))).into_response()
}

fn unauthorized() -> Response {
    fail(
        StatusCode::UNAUTHORIZED,
        UNAUTHORIZED_CODE,
        "Phiên đăng nhập không hợp lệ",
        "Invalid session",
    )
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis().to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: String,
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoreInput {
    pub name: Option<String>,
    pub code: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct StoreSearch {
    pub page: usize,
    pub size: usize,
    pub keyword: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Deserialize)]
pub struct UserQuery {
    pub page: usize,
    pub size: usize,
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub industry_id: String,
    pub phone: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub license_package_id: i64,
    pub transaction_code: String,
}

#[derive(Deserialize)]
pub struct QrRequest {
    pub price: f64,
    pub content: String,
}

#[derive(Default)]
pub struct Backend {
    tokens: HashSet<String>,
    stores: HashMap<i64, Store>,
    users: HashMap<i64, User>,
    next_id: i64,
}

impl Backend {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub type Db = Arc<RwLock<Backend>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Backend::default()));
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/industries", get(industries))
        .route("/orders", get(orders))
        .route("/stores", post(create_store))
        .route("/stores/search", post(search_stores))
        .route("/stores/{id}", get(get_store).put(update_store).delete(delete_store))
        .route("/users/list", get(list_users))
        .route("/users/create", post(create_user))
        .route("/users/update/{id}", put(update_user))
        .route("/users/delete/{id}", axum::routing::delete(delete_user))
        .route("/license-packages", get(license_plans))
        .route("/license-packages/qr", post(license_qr))
        .route("/license-packages/confirm", post(license_confirm))
        .route("/debug/success", get(debug_success))
        .route("/debug/fail", get(debug_fail))
        .route("/debug/legacy-error", get(debug_legacy_error))
        .route("/debug/malformed", get(debug_malformed))
        .route("/debug/plain-error", get(debug_plain_error))
        .route("/debug/headers", get(debug_headers).post(debug_headers))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn authorized(db: &Db, headers: &HeaderMap) -> bool {
    let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    else {
        return false;
    };
    db.read().await.tokens.contains(token)
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

async fn login(State(db): State<Db>, Json(input): Json<LoginRequest>) -> Response {
    if input.username != DEMO_USERNAME || input.password != DEMO_PASSWORD {
        tracing::debug!(username = %input.username, "login rejected");
        return fail(
            StatusCode::OK,
            WRONG_PASSWORD_CODE,
            "Sai mật khẩu",
            "Wrong password",
        );
    }
    let token = Uuid::new_v4().simple().to_string();
    db.write().await.tokens.insert(token.clone());
    success(json!({
        "id": 1,
        "token": token,
        "type": "Bearer",
        "refreshToken": Uuid::new_v4().simple().to_string(),
        "userName": input.username,
        "roles": ["ADMIN"],
    }))
}

async fn register(State(db): State<Db>, Json(input): Json<RegisterRequest>) -> Response {
    if input.password.len() < 6 {
        return legacy_error("RG001", "Mật khẩu phải có ít nhất 6 ký tự");
    }
    let token = Uuid::new_v4().simple().to_string();
    db.write().await.tokens.insert(token.clone());
    success(json!({
        "token": token,
        "type": "Bearer",
        "userName": input.phone,
        "roles": ["OWNER"],
        "industryId": input.industry_id,
    }))
}

async fn industries() -> Response {
    success(json!([
        {"id": 1, "code": "ELEC", "name": "Điện tử"},
        {"id": "2", "name": "Xe máy"},
    ]))
}

async fn orders(State(db): State<Db>, headers: HeaderMap) -> Response {
    if !authorized(&db, &headers).await {
        return unauthorized();
    }
    success(json!({
        "items": [],
        "authorization": header_text(&headers, "authorization"),
    }))
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

async fn create_store(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<StoreInput>,
) -> Response {
    if !authorized(&db, &headers).await {
        return unauthorized();
    }
    let (Some(name), Some(code)) = (input.name, input.code) else {
        return legacy_error("ST400", "Tên và mã cửa hàng là bắt buộc");
    };
    let mut backend = db.write().await;
    if backend.stores.values().any(|s| s.code == code) {
        return fail(
            StatusCode::CONFLICT,
            "ST409",
            "Mã cửa hàng đã tồn tại",
            "Store code already exists",
        );
    }
    let id = backend.next_id();
    let store = Store {
        id,
        name,
        code,
        address: input.address,
        phone: input.phone,
        email: input.email,
        status: input.status.unwrap_or_else(|| "ACTIVE".to_string()),
        note: input.note,
        created_at: timestamp(),
        updated_at: None,
    };
    backend.stores.insert(id, store.clone());
    success(store)
}

async fn search_stores(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<StoreSearch>,
) -> Response {
    if !authorized(&db, &headers).await {
        return unauthorized();
    }
    let backend = db.read().await;
    let keyword = input.keyword.unwrap_or_default().to_lowercase();
    let mut matches: Vec<Store> = backend
        .stores
        .values()
        .filter(|s| keyword.is_empty() || s.name.to_lowercase().contains(&keyword))
        .cloned()
        .collect();
    matches.sort_by_key(|s| s.id);
    let total = matches.len();
    let size = input.size.max(1);
    let content: Vec<Store> = matches
        .into_iter()
        .skip(input.page.saturating_mul(size))
        .take(size)
        .collect();
    success(json!({
        "content": content,
        "totalElements": total,
        "totalPages": total.div_ceil(size),
        "number": input.page,
        "size": size,
    }))
}

async fn get_store(State(db): State<Db>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !authorized(&db, &headers).await {
        return unauthorized();
    }
    match db.read().await.stores.get(&id) {
        Some(store) => success(store),
        None => legacy_error("ST404", "Không tìm thấy cửa hàng"),
    }
}

async fn update_store(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<StoreInput>,
) -> Response {
    if !authorized(&db, &headers).await {
        return unauthorized();
    }
    let mut backend = db.write().await;
    let Some(store) = backend.stores.get_mut(&id) else {
        return legacy_error("ST404", "Không tìm thấy cửa hàng");
    };
    if let Some(name) = input.name {
        store.name = name;
    }
    if let Some(code) = input.code {
        store.code = code;
    }
    if let Some(address) = input.address {
        store.address = Some(address);
    }
    if let Some(phone) = input.phone {
        store.phone = Some(phone);
    }
    if let Some(email) = input.email {
        store.email = Some(email);
    }
    if let Some(status) = input.status {
        store.status = status;
    }
    if let Some(note) = input.note {
        store.note = Some(note);
    }
    store.updated_at = Some(timestamp());
    success(store.clone())
}

async fn delete_store(State(db): State<Db>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !authorized(&db, &headers).await {
        return unauthorized();
    }
    match db.write().await.stores.remove(&id) {
        Some(_) => success_empty(),
        None => legacy_error("ST404", "Không tìm thấy cửa hàng"),
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

async fn list_users(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> Response {
    if !authorized(&db, &headers).await {
        return unauthorized();
    }
    let backend = db.read().await;
    let needle = query.q.unwrap_or_default().to_lowercase();
    let mut users: Vec<User> = backend
        .users
        .values()
        .filter(|u| needle.is_empty() || u.username.to_lowercase().contains(&needle))
        .cloned()
        .collect();
    users.sort_by_key(|u| u.id);
    let total = users.len();
    let size = query.size.max(1);
    let items: Vec<User> = users
        .into_iter()
        .skip(query.page.saturating_mul(size))
        .take(size)
        .collect();
    success(json!({ "items": items, "total": total }))
}

async fn create_user(State(db): State<Db>, headers: HeaderMap, mut form: Multipart) -> Response {
    if !authorized(&db, &headers).await {
        return unauthorized();
    }
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut avatar = None;
    loop {
        let field = match form.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        };
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name().map(str::to_string) {
            match field.bytes().await {
                Ok(bytes) => avatar = Some(format!("{file_name}:{}", bytes.len())),
                Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            }
        } else {
            match field.text().await {
                Ok(text) => {
                    fields.insert(name, text);
                }
                Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            }
        }
    }

    let Some(username) = fields.remove("username") else {
        return fail(
            StatusCode::OK,
            "US400",
            "Tên đăng nhập là bắt buộc",
            "Username is required",
        );
    };
    let mut backend = db.write().await;
    let id = backend.next_id();
    let user = User {
        id,
        username,
        full_name: fields.remove("fullName"),
        email: fields.remove("email"),
        phone: fields.remove("phone"),
        role: fields.remove("role"),
        status: Some("ACTIVE".to_string()),
        avatar,
    };
    backend.users.insert(id, user.clone());
    success(user)
}

async fn update_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<Value>,
) -> Response {
    if !authorized(&db, &headers).await {
        return unauthorized();
    }
    let mut backend = db.write().await;
    let Some(user) = backend.users.get_mut(&id) else {
        return legacy_error("US404", "Không tìm thấy người dùng");
    };
    let text = |key: &str| input.get(key).and_then(Value::as_str).map(str::to_string);
    if let Some(full_name) = text("fullName") {
        user.full_name = Some(full_name);
    }
    if let Some(email) = text("email") {
        user.email = Some(email);
    }
    if let Some(role) = text("role") {
        user.role = Some(role);
    }
    if let Some(status) = text("status") {
        user.status = Some(status);
    }
    success(user.clone())
}

async fn delete_user(State(db): State<Db>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !authorized(&db, &headers).await {
        return unauthorized();
    }
    match db.write().await.users.remove(&id) {
        Some(_) => success_empty(),
        None => legacy_error("US404", "Không tìm thấy người dùng"),
    }
}

// ---------------------------------------------------------------------------
// Licenses
// ---------------------------------------------------------------------------

async fn license_plans() -> Response {
    success(json!([
        {
            "id": 1, "name": "Basic", "description": null, "maxStore": 1,
            "maxUserPerStore": 3, "price": 199000.0, "discount": 0.0, "durationDays": 30
        },
        {
            "id": 2, "name": "Pro", "description": "Nhiều cửa hàng", "maxStore": 5,
            "maxUserPerStore": 10, "price": 499000.0, "discount": 10.0, "durationDays": 30
        },
    ]))
}

async fn license_qr(State(db): State<Db>, headers: HeaderMap, Json(input): Json<QrRequest>) -> Response {
    if !authorized(&db, &headers).await {
        return unauthorized();
    }
    if input.price <= 0.0 {
        return legacy_error("LC400", "Số tiền không hợp lệ");
    }
    success(json!({ "base64Data": format!("QR:{}:{}", input.price, input.content) }))
}

async fn license_confirm(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ConfirmRequest>,
) -> Response {
    if !authorized(&db, &headers).await {
        return unauthorized();
    }
    if input.transaction_code.trim().is_empty() {
        return legacy_error("LC404", "Không tìm thấy giao dịch");
    }
    success(json!({
        "success": true,
        "message": format!("License {} activated", input.license_package_id),
    }))
}

// ---------------------------------------------------------------------------
// Debug responses
// ---------------------------------------------------------------------------

async fn debug_success() -> Response {
    success(json!({ "id": 1 }))
}

async fn debug_fail() -> Response {
    (
        StatusCode::OK,
        Json(json!({ "code": WRONG_PASSWORD_CODE, "messages": { "vn": "Sai mật khẩu" } })),
    )
        .into_response()
}

async fn debug_legacy_error() -> Response {
    legacy_error("LIC001", "Giấy phép đã hết hạn")
}

async fn debug_malformed() -> Response {
    Json(json!({ "foo": "bar" })).into_response()
}

async fn debug_plain_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream unavailable").into_response()
}

/// Echo the request headers the client is responsible for.
async fn debug_headers(headers: HeaderMap) -> Response {
    success(json!({
        "authorization": header_text(&headers, "authorization"),
        "skipErrorToast": header_text(&headers, "x-skip-error-toast"),
        "contentType": header_text(&headers, "content-type"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_has_all_fields() {
        let env = Envelope {
            time_stamp: "1".to_string(),
            security_version: "1".to_string(),
            result: "success",
            message: "OK".to_string(),
            error_code: String::new(),
            data: Some(json!({"id": 1})),
        };
        let json = serde_json::to_value(env).unwrap();
        assert_eq!(json["result"], "success");
        assert_eq!(json["data"]["id"], 1);
        assert_eq!(json["errorCode"], "");
        assert!(json.get("timeStamp").is_some());
        assert!(json.get("securityVersion").is_some());
    }

    #[test]
    fn empty_envelope_omits_data() {
        let env = Envelope {
            time_stamp: String::new(),
            security_version: String::new(),
            result: "error",
            message: "m".to_string(),
            error_code: "E".to_string(),
            data: None,
        };
        let json = serde_json::to_value(env).unwrap();
        assert!(json.get("data").is_none());
    }

    #[test]
    fn store_input_all_fields_optional() {
        let input: StoreInput = serde_json::from_str("{}").unwrap();
        assert!(input.name.is_none());
        assert!(input.status.is_none());
    }

    #[test]
    fn confirm_request_reads_camel_case() {
        let input: ConfirmRequest =
            serde_json::from_str(r#"{"licensePackageId":2,"transactionCode":"TX"}"#).unwrap();
        assert_eq!(input.license_package_id, 2);
        assert_eq!(input.transaction_code, "TX");
    }
}
