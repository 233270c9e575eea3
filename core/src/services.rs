//! Typed wrappers for the backend endpoints the application calls.

use crate::client::RequestOptions;
use crate::error::NormalizedError;
use crate::gateway::Gateway;
use crate::multipart::MultipartForm;
use crate::types::{
    ConfirmPayment, Industry, LicensePlan, LoginData, LoginRequest, Page, PaymentConfirmation,
    QrCode, QrRequest, RegisterRequest, Store, StoreInput, StoreSearch, User, UserList, UserQuery,
};

type ApiResult<T> = Result<T, NormalizedError>;

pub struct AuthApi<'a> {
    gateway: &'a Gateway,
}

impl<'a> AuthApi<'a> {
    pub fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    /// Silent: the login form renders the failure inline.
    pub async fn login(&self, body: &LoginRequest) -> ApiResult<LoginData> {
        self.gateway
            .post_json("auth/login", body, &RequestOptions::silent())
            .await
    }

    pub async fn register(&self, body: &RegisterRequest) -> ApiResult<LoginData> {
        self.gateway
            .post_json("auth/register", body, &RequestOptions::default())
            .await
    }

    pub async fn industries(&self) -> ApiResult<Vec<Industry>> {
        self.gateway
            .get_json::<_, ()>("industries", None, &RequestOptions::default())
            .await
    }
}

pub struct StoreApi<'a> {
    gateway: &'a Gateway,
}

impl<'a> StoreApi<'a> {
    pub fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    pub async fn search(&self, body: &StoreSearch) -> ApiResult<Page<Store>> {
        self.gateway
            .post_json("stores/search", body, &RequestOptions::default())
            .await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Store> {
        self.gateway
            .get_json::<_, ()>(&format!("stores/{id}"), None, &RequestOptions::default())
            .await
    }

    pub async fn create(&self, body: &StoreInput) -> ApiResult<Store> {
        self.gateway
            .post_json("stores", body, &RequestOptions::default())
            .await
    }

    pub async fn update(&self, id: i64, body: &StoreInput) -> ApiResult<Store> {
        self.gateway
            .put_json(&format!("stores/{id}"), body, &RequestOptions::default())
            .await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.gateway
            .delete_json::<_, ()>(&format!("stores/{id}"), None, &RequestOptions::default())
            .await
    }
}

pub struct UserApi<'a> {
    gateway: &'a Gateway,
}

impl<'a> UserApi<'a> {
    pub fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, query: &UserQuery) -> ApiResult<UserList> {
        self.gateway
            .get_json("users/list", Some(query), &RequestOptions::default())
            .await
    }

    /// Create with an avatar or other file parts.
    pub async fn create(&self, form: MultipartForm) -> ApiResult<User> {
        self.gateway
            .post_multipart("users/create", form, &RequestOptions::default())
            .await
    }

    pub async fn update(&self, id: i64, body: &serde_json::Value) -> ApiResult<User> {
        self.gateway
            .put_json(&format!("users/update/{id}"), body, &RequestOptions::default())
            .await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.gateway
            .delete_json::<_, ()>(&format!("users/delete/{id}"), None, &RequestOptions::default())
            .await
    }
}

pub struct LicenseApi<'a> {
    gateway: &'a Gateway,
}

impl<'a> LicenseApi<'a> {
    pub fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    pub async fn plans(&self) -> ApiResult<Vec<LicensePlan>> {
        self.gateway
            .get_json::<_, ()>("license-packages", None, &RequestOptions::default())
            .await
    }

    pub async fn create_qr(&self, price: f64, content: &str) -> ApiResult<QrCode> {
        let body = QrRequest {
            price,
            content: content.to_string(),
        };
        self.gateway
            .post_json("license-packages/qr", &body, &RequestOptions::default())
            .await
    }

    pub async fn confirm(&self, body: &ConfirmPayment) -> ApiResult<PaymentConfirmation> {
        self.gateway
            .post_json("license-packages/confirm", body, &RequestOptions::default())
            .await
    }
}
