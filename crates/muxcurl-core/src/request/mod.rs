//! Work items: what to fetch, how, and who to tell when it is done.
//!
//! A `Request` is built by the caller, handed to the scheduler with
//! `add_request`, and turned into a `TransferSpec` each time it is
//! dispatched.

mod body;
mod headers;
mod options;

pub use body::Body;
pub use headers::Headers;
pub use options::TransferOptions;

use std::fmt;

use serde::Serialize;
use url::Url;

use crate::response::Response;

/// Callback invoked once with the final response of a request.
pub type RequestCallback = Box<dyn FnMut(&Response, &Request) -> anyhow::Result<()>>;

/// Error building a request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("serialize body: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Methods whose semantics carry a request body.
const BODY_METHODS: [&str; 3] = ["POST", "PUT", "PATCH"];

/// One HTTP request to be scheduled.
pub struct Request {
    url: Url,
    method: String,
    body: Body,
    options: TransferOptions,
    headers: Headers,
    callback: Option<RequestCallback>,
}

impl Request {
    /// Creates a request; `method` is normalized to uppercase.
    pub fn new(url: &str, method: &str) -> Result<Self, RequestError> {
        Ok(Self::from_url(Url::parse(url)?, method))
    }

    pub fn get(url: &str) -> Result<Self, RequestError> {
        Self::new(url, "GET")
    }

    pub fn from_url(url: Url, method: &str) -> Self {
        Self {
            url,
            method: method.to_ascii_uppercase(),
            body: Body::Empty,
            options: TransferOptions::default(),
            headers: Headers::new(),
            callback: None,
        }
    }

    /// Sets method, body and `Content-Type`/`Content-Length` in one go.
    ///
    /// `Content-Length` is the byte length of `body`.
    pub fn post_as_type(
        self,
        body: impl Into<String>,
        content_type: &str,
        method: &str,
    ) -> Self {
        let body = body.into();
        let length = body.len();
        self.set_method(method)
            .set_body(body)
            .add_headers([
                ("Content-Type", format!("{}; charset=UTF-8", content_type)),
                ("Content-Length", length.to_string()),
            ])
    }

    /// Serializes `payload` as JSON and sends it with `method`.
    pub fn post_as_json<T: Serialize + ?Sized>(
        self,
        payload: &T,
        method: &str,
    ) -> Result<Self, RequestError> {
        let body = serde_json::to_string(payload)?;
        Ok(self.post_as_type(body, "application/json", method))
    }

    /// Sends an already serialized XML document with `method`.
    pub fn post_as_xml(self, body: impl Into<String>, method: &str) -> Self {
        self.post_as_type(body, "text/xml", method)
    }

    /// Sets the `Accept` header.
    pub fn expect_type(self, content_type: &str) -> Self {
        self.add_headers([("Accept", content_type)])
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn set_url(mut self, url: &str) -> Result<Self, RequestError> {
        self.url = Url::parse(url)?;
        Ok(self)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn set_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn set_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    /// Merges `options` over the ones already set on this request.
    pub fn add_options(mut self, options: &TransferOptions) -> Self {
        self.options.merge(options);
        self
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Adds headers; existing names are overwritten in place.
    pub fn add_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.headers.replace_with(headers);
        self
    }

    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&Response, &Request) -> anyhow::Result<()> + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    /// Builder form of `set_callback`.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Response, &Request) -> anyhow::Result<()> + 'static,
    {
        self.set_callback(callback);
        self
    }

    /// Runs the completion callback, if any.
    pub fn complete(&mut self, response: &Response) -> anyhow::Result<()> {
        let Some(mut callback) = self.callback.take() else {
            return Ok(());
        };
        let result = callback(response, self);
        self.callback = Some(callback);
        result
    }

    /// Builds the per-transfer configuration: `base_options` and
    /// `base_headers` are the scheduler-wide defaults, overridden by this
    /// request's own values.
    pub fn to_transfer(
        &self,
        base_options: &TransferOptions,
        base_headers: &Headers,
    ) -> TransferSpec {
        let body = if BODY_METHODS.contains(&self.method.as_str()) {
            self.body.encode()
        } else {
            None
        };
        let mut headers = self.headers.merged_over(base_headers);
        if body.is_none() {
            // A length with nothing behind it stalls the server until timeout.
            headers.remove("Content-Length");
        }
        TransferSpec {
            url: self.url.to_string(),
            method: self.method.clone(),
            headers,
            body,
            no_body: self.method == "HEAD",
            options: self.options.merged_over(base_options),
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("url", &self.url.as_str())
            .field("method", &self.method)
            .field("body", &self.body)
            .field("options", &self.options)
            .field("headers", &self.headers)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Everything a transport needs to start one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSpec {
    pub url: String,
    pub method: String,
    pub headers: Headers,
    /// Body to send; only present for POST, PUT and PATCH.
    pub body: Option<Vec<u8>>,
    /// True for HEAD: the response body is not retrieved.
    pub no_body: bool,
    pub options: TransferOptions,
}
