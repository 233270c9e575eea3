//! Stateless request builder and response parser for the warranty API.
//!
//! # Design
//! `ApiClient` holds only a `base_url`. Each exchange is split into a
//! `build_*` method that produces an `HttpRequest` and `parse` which turns an
//! `HttpResponse` into the unwrapped payload or a `NormalizedError`. The
//! `Gateway` drives the I/O in between; the split keeps this part
//! deterministic and testable without a network.
//!
//! HTTP success and envelope success are independent conditions: a 2xx
//! response carrying a fail envelope is still an error.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::envelope::{decode, decode_as, Decoded};
use crate::error::NormalizedError;
use crate::http::{
    HttpMethod, HttpRequest, HttpResponse, RequestBody, RequestInfo, RequestMeta,
    CONTENT_TYPE_HEADER, SKIP_ERROR_TOAST_HEADER,
};
use crate::multipart::{scalar_text, MultipartForm};

/// Caller-supplied options for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Suppress the failure notification; the error is still returned.
    pub silent: bool,
    /// Extra headers sent as-is.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Stateless builder and parser for envelope-speaking API calls.
///
/// Knows only the base URL; it never performs I/O.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Describe a call without building it, for reporting build failures.
    pub fn describe(&self, method: HttpMethod, path: &str, options: &RequestOptions) -> RequestInfo {
        RequestInfo {
            method,
            path: path.to_string(),
            url: self.url(path),
            meta: RequestMeta {
                silent: options.silent,
            },
        }
    }

    /// Build a body-less request; `query` must serialize to a JSON object.
    pub fn build_query<Q: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        query: Option<&Q>,
        options: &RequestOptions,
    ) -> Result<HttpRequest, NormalizedError> {
        let query = match query {
            Some(q) => query_pairs(q)?,
            None => Vec::new(),
        };
        Ok(self.request(method, path, query, RequestBody::Empty, options))
    }

    pub fn build_json<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<HttpRequest, NormalizedError> {
        let body = serde_json::to_string(body).map_err(|e| {
            NormalizedError::invalid_request(format!("request body serialization failed: {e}"))
        })?;
        let mut req = self.request(method, path, Vec::new(), RequestBody::Json(body), options);
        req.set_header(CONTENT_TYPE_HEADER, "application/json");
        Ok(req)
    }

    /// Multipart requests never carry an explicit content type.
    pub fn build_multipart(
        &self,
        method: HttpMethod,
        path: &str,
        form: MultipartForm,
        options: &RequestOptions,
    ) -> HttpRequest {
        let mut req = self.request(method, path, Vec::new(), RequestBody::Multipart(form), options);
        req.headers
            .retain(|(k, _)| !k.eq_ignore_ascii_case(CONTENT_TYPE_HEADER));
        req
    }

    fn request(
        &self,
        method: HttpMethod,
        path: &str,
        query: Vec<(String, String)>,
        body: RequestBody,
        options: &RequestOptions,
    ) -> HttpRequest {
        let mut req = HttpRequest {
            method,
            path: path.to_string(),
            url: self.url(path),
            query,
            headers: options.headers.clone(),
            body,
            meta: RequestMeta {
                silent: options.silent,
            },
        };
        if options.silent {
            req.set_header(SKIP_ERROR_TOAST_HEADER, "1");
        }
        req
    }

    /// Turn a response into the unwrapped payload or a `NormalizedError`.
    pub fn parse<T: DeserializeOwned>(&self, response: &HttpResponse) -> Result<T, NormalizedError> {
        let parsed = serde_json::from_str::<Value>(&response.body);

        if response.is_success() {
            let body = parsed.map_err(|e| {
                NormalizedError::transport(
                    format!("response body is not valid JSON: {e}"),
                    Some(response.status),
                    Value::String(response.body.clone()),
                )
            })?;
            return decode_as(&body);
        }

        match parsed {
            Ok(body) => match decode(&body) {
                Decoded::Fail(err) => Err(err.with_status(response.status)),
                Decoded::Success(_) | Decoded::Malformed(_) => Err(NormalizedError::transport(
                    format!("HTTP {}", response.status),
                    Some(response.status),
                    body,
                )),
            },
            Err(_) => {
                let text = response.body.trim();
                let message = if text.is_empty() {
                    format!("HTTP {}", response.status)
                } else {
                    text.to_string()
                };
                Err(NormalizedError::transport(
                    message,
                    Some(response.status),
                    Value::String(response.body.clone()),
                ))
            }
        }
    }
}

/// Flatten a query object into key/value pairs.
///
/// `null` entries are dropped, arrays repeat the key, nested objects are
/// JSON-encoded.
fn query_pairs<Q: Serialize + ?Sized>(query: &Q) -> Result<Vec<(String, String)>, NormalizedError> {
    let value = serde_json::to_value(query).map_err(|e| {
        NormalizedError::invalid_request(format!("query serialization failed: {e}"))
    })?;
    let Value::Object(fields) = value else {
        return Err(NormalizedError::invalid_request(
            "query parameters must serialize to an object",
        ));
    };

    let mut pairs = Vec::new();
    for (key, value) in fields {
        match value {
            Value::Null => {}
            Value::Array(items) => pairs.extend(
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| (key.clone(), scalar_text(item))),
            ),
            other => pairs.push((key, scalar_text(&other))),
        }
    }
    Ok(pairs)
}
