//! Filter definitions and the `filter_var`-style dispatcher.
//!
//! A [`Filter`] pairs a [`FilterKind`] with [`FilterFlags`] and
//! [`FilterOptions`]. [`filter_value`] applies it to one raw input value.
//!
//! Scalars are filtered as text (numbers by their decimal form, `true` as
//! `"1"`, `false` as `""`). Arrays and objects are rejected unless
//! [`FilterFlags::REQUIRE_ARRAY`] or [`FilterFlags::FORCE_ARRAY`] is set, in
//! which case every element is filtered and failing elements become `false`
//! (or `null` with [`FilterFlags::NULL_ON_FAILURE`]).

use crate::outcome::FilterOutcome;
use crate::{sanitize, validate};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

/// User-supplied filter function.
pub type FilterCallback = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

/// Which transform or check to apply.
#[derive(Clone, Default)]
pub enum FilterKind {
    /// Pass-through; scalars become strings.
    #[default]
    Default,
    /// Same as [`FilterKind::Default`], honoring the strip/encode flags.
    UnsafeRaw,
    /// Integer, optionally range-checked.
    ValidateInt,
    /// Floating point number.
    ValidateFloat,
    /// Boolean words (`yes`/`no`, `on`/`off`, `1`/`0`, `true`/`false`).
    ValidateBool,
    /// Email address.
    ValidateEmail,
    /// Absolute URL.
    ValidateUrl,
    /// IPv4 or IPv6 address.
    ValidateIp,
    /// Must match the `regexp` option.
    ValidateRegexp,
    /// Domain name.
    ValidateDomain,
    /// HTML-encode `'"<>&` and control characters as numeric entities.
    SanitizeSpecialChars,
    /// HTML-encode `&"'<>` as named entities.
    SanitizeFullSpecialChars,
    /// Drop characters not allowed in an email address.
    SanitizeEmail,
    /// Drop characters not allowed in a URL.
    SanitizeUrl,
    /// Keep digits and signs.
    SanitizeNumberInt,
    /// Keep digits and signs, plus separators allowed by flags.
    SanitizeNumberFloat,
    /// Backslash-escape quotes, backslashes and NUL.
    SanitizeAddSlashes,
    /// URL-encode.
    SanitizeEncoded,
    /// Custom function; `None` rejects the value.
    Callback(FilterCallback),
}

impl FilterKind {
    /// Maps the host's numeric filter id.
    ///
    /// # Example
    ///
    /// ```
    /// use lms_testkit_input::FilterKind;
    ///
    /// assert!(matches!(FilterKind::from_id(257), Some(FilterKind::ValidateInt)));
    /// assert!(FilterKind::from_id(1).is_none());
    /// ```
    pub fn from_id(id: i32) -> Option<Self> {
        let kind = match id {
            257 => Self::ValidateInt,
            258 => Self::ValidateBool,
            259 => Self::ValidateFloat,
            272 => Self::ValidateRegexp,
            273 => Self::ValidateUrl,
            274 => Self::ValidateEmail,
            275 => Self::ValidateIp,
            277 => Self::ValidateDomain,
            514 => Self::SanitizeEncoded,
            515 => Self::SanitizeSpecialChars,
            516 => Self::UnsafeRaw,
            517 => Self::SanitizeEmail,
            518 => Self::SanitizeUrl,
            519 => Self::SanitizeNumberInt,
            520 => Self::SanitizeNumberFloat,
            522 => Self::SanitizeFullSpecialChars,
            523 => Self::SanitizeAddSlashes,
            _ => return None,
        };
        Some(kind)
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::UnsafeRaw => "unsafe_raw",
            Self::ValidateInt => "int",
            Self::ValidateFloat => "float",
            Self::ValidateBool => "boolean",
            Self::ValidateEmail => "validate_email",
            Self::ValidateUrl => "validate_url",
            Self::ValidateIp => "validate_ip",
            Self::ValidateRegexp => "validate_regexp",
            Self::ValidateDomain => "validate_domain",
            Self::SanitizeSpecialChars => "special_chars",
            Self::SanitizeFullSpecialChars => "full_special_chars",
            Self::SanitizeEmail => "email",
            Self::SanitizeUrl => "url",
            Self::SanitizeNumberInt => "number_int",
            Self::SanitizeNumberFloat => "number_float",
            Self::SanitizeAddSlashes => "add_slashes",
            Self::SanitizeEncoded => "encoded",
            Self::Callback(_) => "callback",
        }
    }
}

impl fmt::Debug for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bit flags modifying a filter. Values match the host's constants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FilterFlags(u32);

impl FilterFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Accept octal integers (`0755`, `0o755`).
    pub const ALLOW_OCTAL: Self = Self(1);
    /// Accept hexadecimal integers (`0x1f`).
    pub const ALLOW_HEX: Self = Self(2);
    /// Remove characters below ASCII 32.
    pub const STRIP_LOW: Self = Self(4);
    /// Remove characters above ASCII 127.
    pub const STRIP_HIGH: Self = Self(8);
    /// Encode characters below ASCII 32.
    pub const ENCODE_LOW: Self = Self(16);
    /// Encode characters above ASCII 127.
    pub const ENCODE_HIGH: Self = Self(32);
    /// Encode `&`.
    pub const ENCODE_AMP: Self = Self(64);
    /// Leave quotes alone when encoding.
    pub const NO_ENCODE_QUOTES: Self = Self(128);
    /// Keep `.` in float sanitizing.
    pub const ALLOW_FRACTION: Self = Self(4_096);
    /// Accept thousands separators.
    pub const ALLOW_THOUSAND: Self = Self(8_192);
    /// Keep `e`/`E` in float sanitizing.
    pub const ALLOW_SCIENTIFIC: Self = Self(16_384);
    /// URL must have a path.
    pub const PATH_REQUIRED: Self = Self(262_144);
    /// URL must have a query string.
    pub const QUERY_REQUIRED: Self = Self(524_288);
    /// Only IPv4 addresses.
    pub const IPV4: Self = Self(1_048_576);
    /// Only IPv6 addresses.
    pub const IPV6: Self = Self(2_097_152);
    /// Reject reserved IP ranges.
    pub const NO_RES_RANGE: Self = Self(4_194_304);
    /// Reject private IP ranges.
    pub const NO_PRIV_RANGE: Self = Self(8_388_608);
    /// Domain labels must be valid host names. Shares its bit with `IPV4`.
    pub const HOSTNAME: Self = Self(1_048_576);
    /// Value must be an array.
    pub const REQUIRE_ARRAY: Self = Self(16_777_216);
    /// Value must be a scalar.
    pub const REQUIRE_SCALAR: Self = Self(33_554_432);
    /// Wrap scalars into an array.
    pub const FORCE_ARRAY: Self = Self(67_108_864);
    /// Booleans reject unknown words instead of reading them as `false`.
    pub const NULL_ON_FAILURE: Self = Self(134_217_728);

    /// Builds flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for FilterFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FilterFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Named options for a filter.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    /// Returned in place of a rejection.
    pub default: Option<Value>,
    /// Inclusive lower bound for numbers.
    pub min_range: Option<f64>,
    /// Inclusive upper bound for numbers.
    pub max_range: Option<f64>,
    /// Decimal separator for floats.
    pub decimal: Option<char>,
    /// Pattern for [`FilterKind::ValidateRegexp`].
    pub regexp: Option<Regex>,
}

/// A complete filter: kind, flags and options.
///
/// # Example
///
/// ```
/// use lms_testkit_input::{filter_value, Filter, FilterKind, FilterOutcome};
/// use serde_json::json;
///
/// let percent = Filter::new(FilterKind::ValidateInt).min_range(0).max_range(100);
///
/// assert_eq!(filter_value(&json!("42"), &percent), FilterOutcome::Value(json!(42)));
/// assert_eq!(filter_value(&json!("420"), &percent), FilterOutcome::Invalid);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Filter {
    kind: FilterKind,
    flags: FilterFlags,
    options: FilterOptions,
}

impl Filter {
    /// Creates a filter with no flags or options.
    #[must_use]
    pub fn new(kind: FilterKind) -> Self {
        Self {
            kind,
            flags: FilterFlags::NONE,
            options: FilterOptions::default(),
        }
    }

    /// Creates a filter from a plain function.
    #[must_use]
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&str) -> Option<Value> + Send + Sync + 'static,
    {
        Self::new(FilterKind::Callback(Arc::new(f)))
    }

    /// Adds flags.
    #[must_use]
    pub fn flags(mut self, flags: FilterFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Sets the value returned instead of a rejection.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.options.default = Some(value.into());
        self
    }

    /// Sets the inclusive lower bound.
    #[must_use]
    pub fn min_range(mut self, min: impl Into<f64>) -> Self {
        self.options.min_range = Some(min.into());
        self
    }

    /// Sets the inclusive upper bound.
    #[must_use]
    pub fn max_range(mut self, max: impl Into<f64>) -> Self {
        self.options.max_range = Some(max.into());
        self
    }

    /// Sets the decimal separator for floats.
    #[must_use]
    pub fn decimal(mut self, separator: char) -> Self {
        self.options.decimal = Some(separator);
        self
    }

    /// Sets the pattern for [`FilterKind::ValidateRegexp`].
    #[must_use]
    pub fn regexp(mut self, regex: Regex) -> Self {
        self.options.regexp = Some(regex);
        self
    }

    /// Sets the pattern from a delimited expression such as `/^\d+$/i`.
    ///
    /// Trailing `i`, `m`, `s`, `x` and `u` modifiers are honored.
    pub fn regexp_pattern(self, pattern: &str) -> Result<Self, regex::Error> {
        Ok(self.regexp(compile_delimited(pattern)?))
    }

    /// Returns the kind.
    #[must_use]
    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    /// Returns the flags.
    #[must_use]
    pub fn flag_set(&self) -> FilterFlags {
        self.flags
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub(crate) fn has(&self, flag: FilterFlags) -> bool {
        self.flags.contains(flag)
    }
}

impl From<FilterKind> for Filter {
    fn from(kind: FilterKind) -> Self {
        Self::new(kind)
    }
}

/// Applies `filter` to one raw value.
pub fn filter_value(value: &Value, filter: &Filter) -> FilterOutcome {
    let wants_array = filter.has(FilterFlags::REQUIRE_ARRAY) || filter.has(FilterFlags::FORCE_ARRAY);

    let result = match value {
        Value::Array(_) | Value::Object(_) if filter.has(FilterFlags::REQUIRE_SCALAR) => None,
        Value::Array(items) if wants_array => Some(Value::Array(
            items.iter().map(|item| filter_element(item, filter)).collect(),
        )),
        Value::Object(map) if wants_array => Some(Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), filter_element(v, filter)))
                .collect(),
        )),
        Value::Array(_) | Value::Object(_) => None,
        _ if filter.has(FilterFlags::REQUIRE_ARRAY) => None,
        scalar if filter.has(FilterFlags::FORCE_ARRAY) => {
            Some(Value::Array(vec![filter_element(scalar, filter)]))
        }
        scalar => filter_scalar(scalar, filter),
    };

    match result {
        Some(v) => FilterOutcome::Value(v),
        None => match &filter.options.default {
            Some(default) => FilterOutcome::Value(default.clone()),
            None => FilterOutcome::Invalid,
        },
    }
}

fn filter_element(value: &Value, filter: &Filter) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|v| filter_element(v, filter)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), filter_element(v, filter)))
                .collect(),
        ),
        scalar => filter_scalar(scalar, filter).unwrap_or_else(|| {
            if filter.has(FilterFlags::NULL_ON_FAILURE) {
                Value::Null
            } else {
                Value::Bool(false)
            }
        }),
    }
}

fn filter_scalar(value: &Value, filter: &Filter) -> Option<Value> {
    let text = scalar_text(value);

    match &filter.kind {
        FilterKind::Default | FilterKind::UnsafeRaw => {
            Some(Value::String(sanitize::string_flags(&text, filter.flags)))
        }
        FilterKind::ValidateInt => validate::int(&text, filter),
        FilterKind::ValidateFloat => validate::float(&text, filter),
        FilterKind::ValidateBool => validate::boolean(&text, filter),
        FilterKind::ValidateEmail => validate::email(&text).then(|| Value::String(text)),
        FilterKind::ValidateUrl => validate::url(&text, filter).then(|| Value::String(text)),
        FilterKind::ValidateIp => validate::ip(&text, filter).then(|| Value::String(text)),
        FilterKind::ValidateDomain => validate::domain(&text, filter).then(|| Value::String(text)),
        FilterKind::ValidateRegexp => {
            let regex = filter.options.regexp.as_ref()?;
            regex.is_match(&text).then(|| Value::String(text))
        }
        FilterKind::SanitizeSpecialChars => Some(Value::String(sanitize::special_chars(&text, filter.flags))),
        FilterKind::SanitizeFullSpecialChars => {
            Some(Value::String(sanitize::full_special_chars(&text, filter.flags)))
        }
        FilterKind::SanitizeEmail => Some(Value::String(sanitize::email(&text))),
        FilterKind::SanitizeUrl => Some(Value::String(sanitize::url(&text))),
        FilterKind::SanitizeNumberInt => Some(Value::String(sanitize::number_int(&text))),
        FilterKind::SanitizeNumberFloat => Some(Value::String(sanitize::number_float(&text, filter.flags))),
        FilterKind::SanitizeAddSlashes => Some(Value::String(sanitize::add_slashes(&text))),
        FilterKind::SanitizeEncoded => Some(Value::String(sanitize::encoded(&text, filter.flags))),
        FilterKind::Callback(f) => f(&text),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn compile_delimited(pattern: &str) -> Result<Regex, regex::Error> {
    let mut chars = pattern.chars();
    let Some(open) = chars
        .next()
        .filter(|c| matches!(c, '/' | '#' | '~' | '!' | '@' | '%' | '|' | '+' | '(' | '{' | '[' | '<'))
    else {
        return Regex::new(pattern);
    };
    let close = match open {
        '(' => ')',
        '{' => '}',
        '[' => ']',
        '<' => '>',
        c => c,
    };

    let body = chars.as_str();
    let Some(end) = body.rfind(close) else {
        return Regex::new(pattern);
    };

    let modifiers: String = body[end + close.len_utf8()..]
        .chars()
        .filter(|m| matches!(m, 'i' | 'm' | 's' | 'x'))
        .collect();
    let expr = &body[..end];

    if modifiers.is_empty() {
        Regex::new(expr)
    } else {
        Regex::new(&format!("(?{modifiers}){expr}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(value: Value, filter: Filter) -> FilterOutcome {
        filter_value(&value, &filter)
    }

    #[test]
    fn test_default_stringifies_scalars() {
        let f = Filter::default;
        assert_eq!(run(json!("abc"), f()), FilterOutcome::Value(json!("abc")));
        assert_eq!(run(json!(5), f()), FilterOutcome::Value(json!("5")));
        assert_eq!(run(json!(true), f()), FilterOutcome::Value(json!("1")));
        assert_eq!(run(json!(false), f()), FilterOutcome::Value(json!("")));
    }

    #[test]
    fn test_arrays_rejected_without_flags() {
        assert_eq!(run(json!(["a"]), Filter::default()), FilterOutcome::Invalid);
        assert_eq!(run(json!({"a": 1}), Filter::default()), FilterOutcome::Invalid);
    }

    #[test]
    fn test_require_array() {
        let filter = Filter::new(FilterKind::ValidateInt).flags(FilterFlags::REQUIRE_ARRAY);
        assert_eq!(
            run(json!(["1", "x", "3"]), filter.clone()),
            FilterOutcome::Value(json!([1, false, 3]))
        );
        assert_eq!(run(json!("1"), filter), FilterOutcome::Invalid);
    }

    #[test]
    fn test_require_array_null_on_failure() {
        let filter = Filter::new(FilterKind::ValidateInt)
            .flags(FilterFlags::REQUIRE_ARRAY | FilterFlags::NULL_ON_FAILURE);
        assert_eq!(run(json!(["x"]), filter), FilterOutcome::Value(json!([null])));
    }

    #[test]
    fn test_force_array_wraps_scalars() {
        let filter = Filter::new(FilterKind::ValidateInt).flags(FilterFlags::FORCE_ARRAY);
        assert_eq!(run(json!("7"), filter.clone()), FilterOutcome::Value(json!([7])));
        assert_eq!(
            run(json!({"a": "1", "b": ["2"]}), filter),
            FilterOutcome::Value(json!({"a": 1, "b": [2]}))
        );
    }

    #[test]
    fn test_default_option_replaces_rejection() {
        let filter = Filter::new(FilterKind::ValidateInt).default_value(10);
        assert_eq!(run(json!("nope"), filter), FilterOutcome::Value(json!(10)));
    }

    #[test]
    fn test_regexp() {
        let filter = Filter::new(FilterKind::ValidateRegexp)
            .regexp_pattern(r"/^course-\d+$/i")
            .unwrap();
        assert_eq!(run(json!("COURSE-12"), filter.clone()), FilterOutcome::Value(json!("COURSE-12")));
        assert_eq!(run(json!("lesson-12"), filter), FilterOutcome::Invalid);
    }

    #[test]
    fn test_regexp_without_pattern_is_invalid() {
        assert_eq!(run(json!("x"), Filter::new(FilterKind::ValidateRegexp)), FilterOutcome::Invalid);
    }

    #[test]
    fn test_compile_delimited_variants() {
        assert!(compile_delimited("#^a+$#").unwrap().is_match("aaa"));
        assert!(compile_delimited("{^b$}").unwrap().is_match("b"));
        assert!(compile_delimited("^plain$").unwrap().is_match("plain"));
    }

    #[test]
    fn test_callback() {
        let upper = Filter::callback(|s| (!s.is_empty()).then(|| Value::String(s.to_uppercase())));
        assert_eq!(run(json!("abc"), upper.clone()), FilterOutcome::Value(json!("ABC")));
        assert_eq!(run(json!(""), upper), FilterOutcome::Invalid);
    }

    #[test]
    fn test_from_id() {
        assert!(matches!(FilterKind::from_id(516), Some(FilterKind::UnsafeRaw)));
        assert!(matches!(FilterKind::from_id(274), Some(FilterKind::ValidateEmail)));
        assert!(matches!(FilterKind::from_id(517), Some(FilterKind::SanitizeEmail)));
        assert!(FilterKind::from_id(0).is_none());
    }

    #[test]
    fn test_flags() {
        let flags = FilterFlags::ALLOW_HEX | FilterFlags::ALLOW_OCTAL;
        assert!(flags.contains(FilterFlags::ALLOW_HEX));
        assert!(!flags.contains(FilterFlags::NULL_ON_FAILURE));
        assert_eq!(flags.bits(), 3);
        assert_eq!(FilterFlags::from_bits(3), flags);
    }
}
