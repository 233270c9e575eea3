//! Typed API envelope client for the warranty backend.
//!
//! # Overview
//! Every backend response is wrapped in one of several envelope shapes. This
//! crate sends requests, attaches the bearer token, decodes whichever
//! envelope comes back and hands callers either the unwrapped payload or a
//! single `NormalizedError`.
//!
//! # Design
//! - `envelope::decode` is a pure classifier over `serde_json::Value`.
//! - `ApiClient` builds `HttpRequest` values and parses `HttpResponse` values
//!   without touching the network (host-does-IO), so the I/O boundary is
//!   explicit.
//! - `Gateway` drives one exchange per call through a `Transport` and the
//!   configured `Interceptor`s (bearer token, failure notification).
//! - The silent flag travels as request metadata; the wire header is only
//!   there for the backend.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod http;
pub mod interceptor;
pub mod multipart;
pub mod services;
pub mod token;
pub mod transport;
pub mod types;

pub use client::{ApiClient, RequestOptions};
pub use config::ClientConfig;
pub use envelope::{decode, decode_as, Decoded, FailEnvelope, SuccessEnvelope};
pub use error::{ConfigError, ErrorKind, NormalizedError, TransportError};
pub use gateway::{Gateway, GatewayBuilder};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestBody, RequestInfo, RequestMeta};
pub use interceptor::{
    AuthInterceptor, CollectingNotifier, Interceptor, Notifier, NotifyInterceptor, TracingNotifier,
};
pub use multipart::{ArrayKeyStyle, MultipartForm};
pub use services::{AuthApi, LicenseApi, StoreApi, UserApi};
pub use token::{MemoryTokenStore, TokenStore};
pub use transport::{ReqwestTransport, Transport};
