//! Text grammars shared by the format rules (`numeric`, `integer`, `ip`,
//! `email`, `url`, `alpha*`, `match`, `before`/`after`).

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use url::{Host, Url};
use validator::{ValidateEmail, ValidateIp, ValidateUrl};

/// Numeric strings: optional sign, digits with an optional fraction (or a
/// leading-dot fraction), optional exponent. Surrounding whitespace allowed.
pub const NUMERIC_PATTERN: &str = r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$";

/// Integer strings: optional sign, `0` or digits without a leading zero.
pub const INTEGER_PATTERN: &str = r"^\s*[+-]?(0|[1-9]\d*)\s*$";

static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NUMERIC_PATTERN).expect("valid regex"));

static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(INTEGER_PATTERN).expect("valid regex"));

static ALPHA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\p{L}+$").expect("valid regex"));

static ALPHA_NUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{N}]+$").expect("valid regex"));

static ALPHA_DASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{N}_-]+$").expect("valid regex"));

/// Largest magnitude an integral `f64` may have and still count as an integer.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// Parse a numeric string, rejecting trailing garbage such as `"1.2a"`.
pub fn parse_numeric(text: &str) -> Option<f64> {
    if !NUMERIC_RE.is_match(text) {
        return None;
    }
    text.trim().parse::<f64>().ok()
}

/// Numeric value of a JSON scalar (numbers as-is, strings parsed).
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric(s),
        _ => None,
    }
}

pub fn is_numeric(value: &Value) -> bool {
    numeric_value(value).is_some()
}

/// Integer check: JSON integers (or integral floats), or integer strings
/// that fit an `i64`.
pub fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => true,
        Value::Number(n) => n
            .as_f64()
            .is_some_and(|f| f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER),
        Value::String(s) => INTEGER_RE.is_match(s) && s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Network-ish grammars
// ---------------------------------------------------------------------------

pub fn is_ip(text: &str) -> bool {
    text.validate_ip()
}

pub fn is_email(text: &str) -> bool {
    text.validate_email()
}

/// Absolute URL with a scheme and a host (`mailto:` style URLs are rejected).
pub fn is_url(text: &str) -> bool {
    text.validate_url() && Url::parse(text).is_ok_and(|url| url.has_host())
}

/// Host part of a URL. Values without a scheme are read as `http://` URLs so
/// that bare domains can be probed too. IPv6 hosts come back without
/// brackets so they can be handed to a resolver as-is.
pub fn url_host(text: &str) -> Option<String> {
    let text = text.trim();
    let parsed = if text.contains("://") {
        Url::parse(text)
    } else {
        Url::parse(&format!("http://{text}"))
    };
    match parsed.ok()?.host()? {
        Host::Domain(domain) if domain.is_empty() => None,
        Host::Domain(domain) => Some(domain.to_owned()),
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Character classes
// ---------------------------------------------------------------------------

pub fn is_alpha(text: &str) -> bool {
    ALPHA_RE.is_match(text)
}

pub fn is_alpha_num(text: &str) -> bool {
    ALPHA_NUM_RE.is_match(text)
}

pub fn is_alpha_dash(text: &str) -> bool {
    ALPHA_DASH_RE.is_match(text)
}

// ---------------------------------------------------------------------------
// Patterns and dates
// ---------------------------------------------------------------------------

/// Compile a `match` rule pattern.
///
/// Accepts either a bare pattern or a delimited one such as `/^[a-z]+$/i`.
/// Supported flags: `i`, `m`, `s`, `x` (and `u`, which is a no-op).
pub fn compile_pattern(raw: &str) -> Result<Regex, String> {
    let (pattern, flags) = match raw.strip_prefix('/').and_then(|rest| rest.rsplit_once('/')) {
        Some((body, flags)) => (body, flags),
        None => (raw, ""),
    };

    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'u' => &mut builder,
            other => return Err(format!("unsupported pattern flag '{other}'")),
        };
    }
    builder.build().map_err(|err| err.to_string())
}

/// Parse a date or date-time. Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` and plain `YYYY-MM-DD` (midnight).
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
