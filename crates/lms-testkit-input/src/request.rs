//! Injectable request data.
//!
//! [`RequestData`] replaces ambient process-global request state. Tests
//! build one directly, or convert an `http::Request` with
//! [`RequestData::from_http`].

use crate::filter::{filter_value, Filter};
use crate::outcome::FilterOutcome;
use crate::source::InputSource;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, COOKIE};
use http::Request;
use indexmap::IndexMap;
use serde_json::Value;

/// One categorized map of request inputs, in insertion order.
pub type InputMap = IndexMap<String, Value>;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Reads named inputs through a filter.
///
/// Code under test takes this instead of reaching for global request
/// state, so tests can hand it whatever data they need.
pub trait InputReader {
    /// Reads `name` from `source` and applies `filter`.
    fn filter_input(&self, source: InputSource, name: &str, filter: &Filter) -> FilterOutcome;

    /// Same as [`filter_input`](Self::filter_input) with a legacy numeric
    /// source code. Unknown codes read from nothing.
    fn filter_input_code(&self, code: i32, name: &str, filter: &Filter) -> FilterOutcome {
        match InputSource::from_code(code) {
            Some(source) => self.filter_input(source, name, filter),
            None => {
                tracing::debug!(code, input = name, "unknown input source code");
                FilterOutcome::Absent
            }
        }
    }
}

/// The five request-data maps.
///
/// # Example
///
/// ```
/// use lms_testkit_input::{Filter, FilterKind, InputSource, RequestData};
///
/// let data = RequestData::new().with_get([("course_id", "42"), ("page", "abc")]);
/// let int = Filter::new(FilterKind::ValidateInt);
///
/// assert_eq!(data.filter_input(InputSource::Get, "course_id", &int).as_i64(), Some(42));
/// assert!(data.filter_input(InputSource::Get, "page", &int).is_invalid());
/// assert!(data.filter_input(InputSource::Get, "missing", &int).is_absent());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestData {
    get: InputMap,
    post: InputMap,
    server: InputMap,
    env: InputMap,
    cookie: InputMap,
}

impl RequestData {
    /// Creates request data with every source empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds query-string entries.
    #[must_use]
    pub fn with_get<I, K, V>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.with(InputSource::Get, entries)
    }

    /// Adds form-body entries.
    #[must_use]
    pub fn with_post<I, K, V>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.with(InputSource::Post, entries)
    }

    /// Adds server metadata entries.
    #[must_use]
    pub fn with_server<I, K, V>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.with(InputSource::Server, entries)
    }

    /// Adds environment entries.
    #[must_use]
    pub fn with_env<I, K, V>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.with(InputSource::Env, entries)
    }

    /// Adds cookies.
    #[must_use]
    pub fn with_cookie<I, K, V>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.with(InputSource::Cookie, entries)
    }

    fn with<I, K, V>(mut self, source: InputSource, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let map = self.source_mut(source);
        for (key, value) in entries {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Copies the process environment into the env map.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    #[must_use]
    pub fn with_process_env(mut self) -> Self {
        for (key, value) in std::env::vars_os() {
            if let (Some(key), Some(value)) = (key.to_str(), value.to_str()) {
                self.env.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
        self
    }

    /// Sets one entry, returning the previous value.
    pub fn insert(
        &mut self,
        source: InputSource,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        self.source_mut(source).insert(name.into(), value.into())
    }

    /// Removes one entry, returning it.
    pub fn remove(&mut self, source: InputSource, name: &str) -> Option<Value> {
        self.source_mut(source).shift_remove(name)
    }

    /// Empties one source.
    pub fn clear(&mut self, source: InputSource) {
        self.source_mut(source).clear();
    }

    /// Empties every source.
    pub fn clear_all(&mut self) {
        for source in InputSource::ALL {
            self.clear(source);
        }
    }

    /// Replaces one source wholesale.
    pub fn set_source(&mut self, source: InputSource, map: InputMap) {
        *self.source_mut(source) = map;
    }

    /// Returns one source's map.
    #[must_use]
    pub fn source(&self, source: InputSource) -> &InputMap {
        match source {
            InputSource::Get => &self.get,
            InputSource::Post => &self.post,
            InputSource::Server => &self.server,
            InputSource::Env => &self.env,
            InputSource::Cookie => &self.cookie,
        }
    }

    /// Returns one source's map mutably.
    pub fn source_mut(&mut self, source: InputSource) -> &mut InputMap {
        match source {
            InputSource::Get => &mut self.get,
            InputSource::Post => &mut self.post,
            InputSource::Server => &mut self.server,
            InputSource::Env => &mut self.env,
            InputSource::Cookie => &mut self.cookie,
        }
    }

    /// Returns the raw, unfiltered value.
    #[must_use]
    pub fn get(&self, source: InputSource, name: &str) -> Option<&Value> {
        self.source(source).get(name)
    }

    /// Reads `name` from `source` and applies `filter`.
    ///
    /// A missing name, or one mapped to `null`, is [`FilterOutcome::Absent`].
    #[must_use]
    pub fn filter_input(&self, source: InputSource, name: &str, filter: &Filter) -> FilterOutcome {
        match self.get(source, name) {
            None | Some(Value::Null) => {
                tracing::trace!(%source, input = name, "input absent");
                FilterOutcome::Absent
            }
            Some(value) => {
                let outcome = filter_value(value, filter);
                tracing::trace!(%source, input = name, filter = filter.kind().name(), ?outcome, "input filtered");
                outcome
            }
        }
    }

    /// Reads with a legacy numeric source code.
    #[must_use]
    pub fn filter_input_code(&self, code: i32, name: &str, filter: &Filter) -> FilterOutcome {
        InputReader::filter_input_code(self, code, name, filter)
    }

    /// Builds request data from an HTTP request.
    ///
    /// The query string fills the get map and a urlencoded body fills the
    /// post map. `Cookie` headers fill the cookie map. Server metadata gets
    /// `REQUEST_METHOD`, `REQUEST_URI`, `QUERY_STRING`, `CONTENT_TYPE`,
    /// `CONTENT_LENGTH` and one `HTTP_*` entry per other header.
    #[must_use]
    pub fn from_http<B: AsRef<[u8]>>(request: &Request<B>) -> Self {
        let mut data = Self::new();
        let uri = request.uri();
        let query = uri.query().unwrap_or("");

        data.get = parse_form(query.as_bytes());

        let content_type = header_str(request, CONTENT_TYPE);
        if content_type
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
        {
            data.post = parse_form(request.body().as_ref());
        }

        for header in request.headers().get_all(COOKIE) {
            if let Ok(value) = header.to_str() {
                parse_cookies(value, &mut data.cookie);
            }
        }

        let server = &mut data.server;
        server.insert("REQUEST_METHOD".into(), request.method().as_str().into());
        server.insert(
            "REQUEST_URI".into(),
            uri.path_and_query().map_or("/", |pq| pq.as_str()).into(),
        );
        server.insert("QUERY_STRING".into(), query.into());
        if let Some(ct) = content_type {
            server.insert("CONTENT_TYPE".into(), ct.into());
        }
        if let Some(len) = header_str(request, CONTENT_LENGTH) {
            server.insert("CONTENT_LENGTH".into(), len.into());
        }

        for (name, value) in request.headers() {
            if name == CONTENT_TYPE || name == CONTENT_LENGTH {
                continue;
            }
            let Ok(value) = value.to_str() else {
                continue;
            };
            let key = format!("HTTP_{}", name.as_str().to_ascii_uppercase().replace('-', "_"));
            // Repeated headers are joined the way a CGI gateway does.
            match server.get_mut(&key) {
                Some(Value::String(existing)) => {
                    let sep = if name == COOKIE { "; " } else { ", " };
                    existing.push_str(sep);
                    existing.push_str(value);
                }
                _ => {
                    server.insert(key, value.into());
                }
            }
        }

        tracing::debug!(
            method = %request.method(),
            uri = %uri,
            get = data.get.len(),
            post = data.post.len(),
            cookies = data.cookie.len(),
            "request data built from http request"
        );
        data
    }
}

impl InputReader for RequestData {
    fn filter_input(&self, source: InputSource, name: &str, filter: &Filter) -> FilterOutcome {
        Self::filter_input(self, source, name, filter)
    }
}

fn header_str<B>(request: &Request<B>, name: http::header::HeaderName) -> Option<&str> {
    request.headers().get(name).and_then(|v| v.to_str().ok())
}

fn parse_cookies(header_value: &str, cookies: &mut InputMap) {
    for cookie in header_value.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let value = value.trim().trim_matches('"');
            let value = urlencoding::decode(value).map_or_else(|_| value.to_string(), |v| v.into_owned());
            // First occurrence wins.
            cookies.entry(name.to_string()).or_insert(Value::String(value));
        }
    }
}

/// Parses urlencoded pairs with bracket-array keys.
///
/// `tags[]=a&tags[]=b` becomes an array, `meta[k]=v` an object. Dots and
/// spaces in the base name become underscores.
fn parse_form(bytes: &[u8]) -> InputMap {
    let mut map = InputMap::new();
    let pairs: Vec<(String, String)> = match serde_urlencoded::from_bytes(bytes) {
        Ok(pairs) => pairs,
        Err(e) => {
            tracing::debug!(error = %e, "urlencoded data could not be parsed");
            return map;
        }
    };

    for (raw_key, value) in pairs {
        let (base, index) = split_key(&raw_key);
        if base.is_empty() {
            continue;
        }
        let value = Value::String(value);

        match index {
            None => {
                map.insert(base, value);
            }
            Some(index) if index.is_empty() => {
                let slot = map.entry(base).or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(items) = slot {
                    items.push(value);
                } else {
                    *slot = Value::Array(vec![value]);
                }
            }
            Some(index) => {
                let slot = map
                    .entry(base)
                    .or_insert_with(|| Value::Object(serde_json::Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(serde_json::Map::new());
                }
                if let Value::Object(fields) = slot {
                    fields.insert(index.to_string(), value);
                }
            }
        }
    }
    map
}

fn split_key(raw: &str) -> (String, Option<&str>) {
    let normalize = |base: &str| base.replace(['.', ' '], "_");

    match raw.split_once('[') {
        Some((base, rest)) => match rest.split_once(']') {
            Some((index, _)) => (normalize(base), Some(index)),
            None => (normalize(raw), None),
        },
        None => (normalize(raw), None),
    }
}
