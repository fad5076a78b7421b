//! Mock request building.

use crate::error::HarnessError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Uri};
use lms_testkit_input::RequestData;
use serde::Serialize;

/// Builder for an HTTP request that tests turn into [`RequestData`].
///
/// Invalid headers or bodies do not panic while chaining; the first problem
/// is reported by [`build`](Self::build).
///
/// # Example
///
/// ```
/// use lms_testkit_harness::MockRequest;
/// use lms_testkit_input::InputSource;
///
/// let data = MockRequest::post("/lesson/3/complete?redirect=1")
///     .form(&[("lesson_id", "3"), ("nonce", "abc")])
///     .cookie("lms_session", "s1")
///     .into_request_data()
///     .unwrap();
///
/// assert_eq!(data.get(InputSource::Get, "redirect").unwrap(), "1");
/// assert_eq!(data.get(InputSource::Post, "lesson_id").unwrap(), "3");
/// assert_eq!(data.get(InputSource::Cookie, "lms_session").unwrap(), "s1");
/// ```
#[must_use]
#[derive(Debug)]
pub struct MockRequest {
    method: Method,
    uri: String,
    headers: HeaderMap,
    cookies: Vec<(String, String)>,
    body: Option<Bytes>,
    error: Option<HarnessError>,
}

impl MockRequest {
    /// Creates a new request builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            cookies: Vec::new(),
            body: None,
            error: None,
        }
    }

    /// Creates a new GET request.
    pub fn get(uri: impl AsRef<str>) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Creates a new POST request.
    pub fn post(uri: impl AsRef<str>) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Creates a new PUT request.
    pub fn put(uri: impl AsRef<str>) -> Self {
        Self::new(Method::PUT, uri)
    }

    /// Creates a new DELETE request.
    pub fn delete(uri: impl AsRef<str>) -> Self {
        Self::new(Method::DELETE, uri)
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref());
        let value = HeaderValue::try_from(value.as_ref());
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) => self.fail(HarnessError::InvalidHeader(e.to_string())),
            (_, Err(e)) => self.fail(HarnessError::InvalidHeader(e.to_string())),
        }
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Adds a cookie. Values are percent-encoded into the `Cookie` header.
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the request body as JSON.
    ///
    /// This also sets the `Content-Type` header to `application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Some(Bytes::from(bytes)),
            Err(e) => self.fail(HarnessError::Json(e)),
        }
        self.content_type("application/json")
    }

    /// Sets the request body as form-urlencoded.
    ///
    /// This also sets the `Content-Type` header to
    /// `application/x-www-form-urlencoded`.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => self.body = Some(Bytes::from(encoded)),
            Err(e) => self.fail(HarnessError::BodyEncode(e.to_string())),
        }
        self.content_type("application/x-www-form-urlencoded")
    }

    fn fail(&mut self, error: HarnessError) {
        self.error.get_or_insert(error);
    }

    /// Builds the HTTP request.
    ///
    /// # Errors
    ///
    /// Returns the first header or body error recorded while chaining, or
    /// `HarnessError::RequestBuild` for an invalid URI.
    pub fn build(self) -> Result<Request<Bytes>, HarnessError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let uri: Uri = self
            .uri
            .parse()
            .map_err(|e| HarnessError::RequestBuild(format!("Invalid URI: {e}")))?;

        let mut headers = self.headers;
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
                .collect::<Vec<_>>()
                .join("; ");
            let value = HeaderValue::try_from(cookie).map_err(|e| HarnessError::InvalidHeader(e.to_string()))?;
            headers.insert(header::COOKIE, value);
        }

        let mut request = Request::new(self.body.unwrap_or_default());
        *request.method_mut() = self.method;
        *request.uri_mut() = uri;
        *request.headers_mut() = headers;
        Ok(request)
    }

    /// Builds the request and converts it into request data.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built.
    pub fn into_request_data(self) -> Result<RequestData, HarnessError> {
        self.build().map(|request| RequestData::from_http(&request))
    }
}
