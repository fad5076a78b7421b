//! Validating filters. Each returns the accepted value or `None`.

use crate::filter::{Filter, FilterFlags};
use serde_json::{Number, Value};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const TRIM: &[char] = &[' ', '\t', '\n', '\r', '\x0b', '\0'];

pub(crate) fn int(text: &str, filter: &Filter) -> Option<Value> {
    let text = text.trim_matches(TRIM);
    let value = parse_int(text, filter.flag_set())?;

    let options = filter.options();
    let as_float = value as f64;
    if options.min_range.is_some_and(|min| as_float < min)
        || options.max_range.is_some_and(|max| as_float > max)
    {
        return None;
    }

    Some(Value::Number(Number::from(value)))
}

fn parse_int(text: &str, flags: FilterFlags) -> Option<i64> {
    let lower = text.to_ascii_lowercase();

    if flags.contains(FilterFlags::ALLOW_HEX) {
        if let Some(hex) = lower.strip_prefix("0x") {
            return digits_only(hex, 16).and_then(|h| i64::from_str_radix(h, 16).ok());
        }
    }

    if flags.contains(FilterFlags::ALLOW_OCTAL) {
        if let Some(oct) = lower.strip_prefix("0o") {
            return digits_only(oct, 8).and_then(|o| i64::from_str_radix(o, 8).ok());
        }
        if lower.len() > 1 && lower.starts_with('0') {
            return digits_only(&lower[1..], 8).and_then(|o| i64::from_str_radix(o, 8).ok());
        }
    }

    let (sign, digits) = match text.as_bytes().first() {
        Some(b'-') => ("-", &text[1..]),
        Some(b'+') => ("", &text[1..]),
        _ => ("", text),
    };

    // No leading zeros except a lone "0".
    if digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
        || (digits.len() > 1 && digits.starts_with('0'))
    {
        return None;
    }

    format!("{sign}{digits}").parse().ok()
}

fn digits_only(text: &str, radix: u32) -> Option<&str> {
    (!text.is_empty() && text.chars().all(|c| c.is_digit(radix))).then_some(text)
}

pub(crate) fn float(text: &str, filter: &Filter) -> Option<Value> {
    let text = text.trim_matches(TRIM);
    let options = filter.options();
    let decimal = options.decimal.unwrap_or('.');
    let allow_thousand = filter.flag_set().contains(FilterFlags::ALLOW_THOUSAND);

    let mut normalized = String::with_capacity(text.len());
    let mut seen_decimal = false;
    let mut seen_exponent = false;
    let mut seen_thousand = false;

    for (i, c) in text.char_indices() {
        match c {
            '0'..='9' => normalized.push(c),
            '+' | '-' if i == 0 || text[..i].ends_with(['e', 'E']) => normalized.push(c),
            'e' | 'E' if !seen_exponent && !normalized.is_empty() => {
                seen_exponent = true;
                normalized.push('e');
            }
            c if c == decimal && !seen_decimal && !seen_exponent => {
                seen_decimal = true;
                normalized.push('.');
            }
            ',' | '\'' | '.' if allow_thousand && !seen_decimal && !seen_exponent => {
                // Thousands separators must sit between digit groups of three,
                // after a leading group of one to three digits.
                if !seen_thousand {
                    let lead = normalized.trim_start_matches(['+', '-']).len();
                    if !(1..=3).contains(&lead) {
                        return None;
                    }
                    seen_thousand = true;
                }
                let rest = &text[i + 1..];
                let group = rest.chars().take_while(char::is_ascii_digit).count();
                if group != 3 {
                    return None;
                }
            }
            _ => return None,
        }
    }

    if !normalized.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite()
        || options.min_range.is_some_and(|min| value < min)
        || options.max_range.is_some_and(|max| value > max)
    {
        return None;
    }

    Number::from_f64(value).map(Value::Number)
}

pub(crate) fn boolean(text: &str, filter: &Filter) -> Option<Value> {
    match text.trim_matches(TRIM).to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(Value::Bool(true)),
        "0" | "false" | "off" | "no" | "" => Some(Value::Bool(false)),
        _ if filter.flag_set().contains(FilterFlags::NULL_ON_FAILURE) => None,
        _ => Some(Value::Bool(false)),
    }
}

pub(crate) fn email(text: &str) -> bool {
    if text.len() > 320 {
        return false;
    }
    let Some((local, domain)) = text.rsplit_once('@') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(c));

    local_ok && domain.contains('.') && hostname(domain)
}

pub(crate) fn url(text: &str, filter: &Filter) -> bool {
    if text.is_empty() || text.chars().any(|c| c.is_whitespace() || !c.is_ascii() || c.is_control()) {
        return false;
    }

    let Some((scheme, rest)) = text.split_once(':') else {
        return false;
    };

    let scheme_ok = scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !scheme_ok {
        return false;
    }

    let (path, query) = if let Some(after) = rest.strip_prefix("//") {
        let end = after.find(['/', '?', '#']).unwrap_or(after.len());
        let (authority, tail) = after.split_at(end);

        let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
        let host = if let Some(v6) = host_port.strip_prefix('[') {
            match v6.split_once(']') {
                Some((addr, _)) if addr.parse::<Ipv6Addr>().is_ok() => addr,
                _ => return false,
            }
        } else {
            let (host, port) = host_port.split_once(':').unwrap_or((host_port, ""));
            if !port.is_empty() && port.parse::<u16>().is_err() {
                return false;
            }
            if !hostname(host) && host.parse::<Ipv4Addr>().is_err() {
                return false;
            }
            host
        };
        if host.is_empty() {
            return false;
        }

        split_path_query(tail)
    } else if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") {
        return false;
    } else {
        split_path_query(rest)
    };

    if filter.flag_set().contains(FilterFlags::PATH_REQUIRED) && path.is_empty() {
        return false;
    }
    if filter.flag_set().contains(FilterFlags::QUERY_REQUIRED) && query.is_none() {
        return false;
    }

    true
}

fn split_path_query(tail: &str) -> (&str, Option<&str>) {
    let tail = tail.split_once('#').map_or(tail, |(before, _)| before);
    match tail.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (tail, None),
    }
}

pub(crate) fn ip(text: &str, filter: &Filter) -> bool {
    let flags = filter.flag_set();
    let Ok(addr) = text.parse::<IpAddr>() else {
        return false;
    };

    let want_v4 = flags.contains(FilterFlags::IPV4);
    let want_v6 = flags.contains(FilterFlags::IPV6);
    if want_v4 != want_v6 && addr.is_ipv4() != want_v4 {
        return false;
    }

    if flags.contains(FilterFlags::NO_PRIV_RANGE) && is_private(&addr) {
        return false;
    }
    if flags.contains(FilterFlags::NO_RES_RANGE) && is_reserved(&addr) {
        return false;
    }

    true
}

fn is_private(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => v4.is_private(),
        IpAddr::V6(v6) => (v6.segments()[0] & 0xfe00) == 0xfc00,
    }
}

fn is_reserved(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            a == 0 || a == 127 || (a == 169 && b == 254) || a >= 240
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || v6.to_ipv4_mapped().is_some()
                || (first & 0xffc0) == 0xfe80
        }
    }
}

pub(crate) fn domain(text: &str, filter: &Filter) -> bool {
    let trimmed = text.strip_suffix('.').unwrap_or(text);
    if trimmed.is_empty() || trimmed.len() > 253 {
        return false;
    }

    if filter.flag_set().contains(FilterFlags::HOSTNAME) {
        return hostname(trimmed);
    }

    trimmed.split('.').all(|label| !label.is_empty() && label.len() <= 63)
}

fn hostname(host: &str) -> bool {
    !host.is_empty()
        && host.len() <= 253
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}
