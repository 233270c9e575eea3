//! Async request gateway.
//!
//! # Design
//! One call is one exchange:
//! `build -> on_request hooks -> transport -> parse -> on_failure hooks`.
//! The transport await is the only suspension point. Every call settles
//! exactly once with the unwrapped payload or a `NormalizedError`; nothing is
//! retried and no hook can turn a failure into a success.
//!
//! A request that fails to build skips straight to the failure hooks, which
//! see a `RequestInfo` describing the call instead of the request itself.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::{ApiClient, RequestOptions};
use crate::config::ClientConfig;
use crate::error::{ConfigError, NormalizedError};
use crate::http::{HttpMethod, HttpRequest, RequestInfo};
use crate::interceptor::{
    AuthInterceptor, Interceptor, Notifier, NotifyInterceptor, TracingNotifier,
};
use crate::multipart::MultipartForm;
use crate::token::TokenStore;
use crate::transport::{ReqwestTransport, Transport};

/// Async entry point for every backend call.
///
/// Builds the request, runs the interceptor chain around one transport
/// exchange and settles with the unwrapped payload or a `NormalizedError`.
/// Cheap to share behind an `Arc`; it holds no per-call state.
pub struct Gateway {
    client: ApiClient,
    transport: Arc<dyn Transport>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl Gateway {
    pub fn builder(base_url: &str) -> GatewayBuilder {
        GatewayBuilder::new(base_url)
    }

    /// Gateway over a reqwest transport configured from `config`.
    pub fn from_config(
        config: &ClientConfig,
        tokens: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        let transport = match config.timeout {
            Some(timeout) => ReqwestTransport::with_timeout(timeout)?,
            None => ReqwestTransport::new(),
        };
        Ok(Self::builder(&config.base_url)
            .transport(Arc::new(transport))
            .tokens(tokens)
            .auth_exempt_paths(config.auth_exempt_paths.clone())
            .notifier(notifier)
            .build())
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn get_json<T, Q>(
        &self,
        path: &str,
        query: Option<&Q>,
        options: &RequestOptions,
    ) -> Result<T, NormalizedError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.client.build_query(HttpMethod::Get, path, query, options);
        self.dispatch(HttpMethod::Get, path, options, request).await
    }

    pub async fn delete_json<T, Q>(
        &self,
        path: &str,
        query: Option<&Q>,
        options: &RequestOptions,
    ) -> Result<T, NormalizedError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.client.build_query(HttpMethod::Delete, path, query, options);
        self.dispatch(HttpMethod::Delete, path, options, request).await
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B, options: &RequestOptions) -> Result<T, NormalizedError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(HttpMethod::Post, path, body, options).await
    }

    pub async fn put_json<T, B>(&self, path: &str, body: &B, options: &RequestOptions) -> Result<T, NormalizedError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(HttpMethod::Put, path, body, options).await
    }

    pub async fn patch_json<T, B>(&self, path: &str, body: &B, options: &RequestOptions) -> Result<T, NormalizedError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(HttpMethod::Patch, path, body, options).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
        options: &RequestOptions,
    ) -> Result<T, NormalizedError> {
        let request = self.client.build_multipart(HttpMethod::Post, path, form, options);
        self.dispatch(HttpMethod::Post, path, options, Ok(request)).await
    }

    pub async fn put_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
        options: &RequestOptions,
    ) -> Result<T, NormalizedError> {
        let request = self.client.build_multipart(HttpMethod::Put, path, form, options);
        self.dispatch(HttpMethod::Put, path, options, Ok(request)).await
    }

    pub async fn patch_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
        options: &RequestOptions,
    ) -> Result<T, NormalizedError> {
        let request = self.client.build_multipart(HttpMethod::Patch, path, form, options);
        self.dispatch(HttpMethod::Patch, path, options, Ok(request)).await
    }

    async fn send_json<T, B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<T, NormalizedError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.client.build_json(method, path, body, options);
        self.dispatch(method, path, options, request).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        options: &RequestOptions,
        request: Result<HttpRequest, NormalizedError>,
    ) -> Result<T, NormalizedError> {
        let (info, outcome) = match request {
            Ok(request) => self.exchange(request).await,
            Err(err) => (self.client.describe(method, path, options), Err(err)),
        };

        if let Err(err) = &outcome {
            tracing::debug!(
                url = %info.url,
                kind = ?err.kind,
                code = ?err.code,
                "API request failed"
            );
            for interceptor in &self.interceptors {
                interceptor.on_failure(&info, err);
            }
        }
        outcome
    }

    async fn exchange<T: DeserializeOwned>(
        &self,
        mut request: HttpRequest,
    ) -> (RequestInfo, Result<T, NormalizedError>) {
        for interceptor in &self.interceptors {
            interceptor.on_request(&mut request);
        }
        let info = request.info();
        tracing::debug!(
            method = info.method.as_str(),
            url = %info.url,
            silent = info.meta.silent,
            "dispatching API request"
        );

        let outcome = match self.transport.execute(request).await {
            Ok(response) => {
                tracing::debug!(status = response.status, url = %info.url, "API response received");
                self.client.parse(&response)
            }
            Err(err) => Err(err.into()),
        };
        (info, outcome)
    }
}

/// Assembles a `Gateway` and its interceptor chain.
///
/// Built-in hooks run first: auth (only when a token store is set), then the
/// failure notifier. Extra interceptors follow in insertion order.
pub struct GatewayBuilder {
    base_url: String,
    transport: Option<Arc<dyn Transport>>,
    tokens: Option<Arc<dyn TokenStore>>,
    auth_exempt_paths: Option<Vec<String>>,
    notifier: Option<Arc<dyn Notifier>>,
    extra: Vec<Arc<dyn Interceptor>>,
}

impl GatewayBuilder {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            transport: None,
            tokens: None,
            auth_exempt_paths: None,
            notifier: None,
            extra: Vec::new(),
        }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Token accessor read by the auth interceptor on every request.
    pub fn tokens(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn auth_exempt_paths(mut self, paths: Vec<String>) -> Self {
        self.auth_exempt_paths = Some(paths);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Additional hook, run after the built-in ones.
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.extra.push(interceptor);
        self
    }

    /// Defaults: reqwest transport, no token, tracing notifier.
    pub fn build(self) -> Gateway {
        let mut interceptors: Vec<Arc<dyn Interceptor>> = Vec::new();
        if let Some(tokens) = self.tokens {
            let auth = match self.auth_exempt_paths {
                Some(paths) => AuthInterceptor::with_exempt_paths(tokens, paths),
                None => AuthInterceptor::new(tokens),
            };
            interceptors.push(Arc::new(auth));
        }
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier));
        interceptors.push(Arc::new(NotifyInterceptor::new(notifier)));
        interceptors.extend(self.extra);

        Gateway {
            client: ApiClient::new(&self.base_url),
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(ReqwestTransport::new())),
            interceptors,
        }
    }
}
