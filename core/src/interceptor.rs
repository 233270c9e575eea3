//! Cross-cutting request/response hooks.
//!
//! # Design
//! Interceptors see only plain data and never reach into the gateway.
//! `on_request` may edit the outgoing `HttpRequest`. `on_failure` gets a
//! `RequestInfo` and the `NormalizedError`; it observes a rejection and
//! cannot change it. It also runs for calls whose request never got built.

use std::sync::{Arc, Mutex};

use crate::error::NormalizedError;
use crate::http::{HttpRequest, RequestInfo, AUTHORIZATION_HEADER};
use crate::token::TokenStore;

/// Path fragments that never receive a bearer token.
pub const DEFAULT_AUTH_EXEMPT_PATHS: [&str; 3] = ["auth/login", "auth/register", "auth/refresh"];

pub trait Interceptor: Send + Sync {
    fn on_request(&self, _request: &mut HttpRequest) {}

    fn on_failure(&self, _request: &RequestInfo, _error: &NormalizedError) {}
}

/// Attaches `Authorization: Bearer <token>` to every non-auth request.
pub struct AuthInterceptor {
    tokens: Arc<dyn TokenStore>,
    exempt_paths: Vec<String>,
}

impl AuthInterceptor {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self::with_exempt_paths(
            tokens,
            DEFAULT_AUTH_EXEMPT_PATHS.iter().map(|p| p.to_string()).collect(),
        )
    }

    pub fn with_exempt_paths(tokens: Arc<dyn TokenStore>, exempt_paths: Vec<String>) -> Self {
        Self {
            tokens,
            exempt_paths,
        }
    }

    fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|p| path.contains(p.as_str()))
    }
}

impl Interceptor for AuthInterceptor {
    fn on_request(&self, request: &mut HttpRequest) {
        if self.is_exempt(&request.path) {
            return;
        }
        if let Some(token) = self.tokens.access_token() {
            request.set_header(AUTHORIZATION_HEADER, format!("Bearer {token}"));
        }
    }
}

/// Sink for user-facing failure messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Logs failure messages at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(%message, "API call failed");
    }
}

/// Keeps failure messages in memory until drained.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    messages: Mutex<Vec<String>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every message recorded so far.
    pub fn drain(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, message: &str) {
        match self.messages.lock() {
            Ok(mut guard) => guard.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}

/// Raises one notification per failure unless the request was silent.
pub struct NotifyInterceptor {
    notifier: Arc<dyn Notifier>,
}

impl NotifyInterceptor {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

impl Interceptor for NotifyInterceptor {
    fn on_failure(&self, request: &RequestInfo, error: &NormalizedError) {
        if request.meta.silent {
            tracing::debug!(url = %request.url, "failure notification skipped for silent request");
            return;
        }
        self.notifier.notify(&error.message);
    }
}
