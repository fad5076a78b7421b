//! Sanitizing filters. These never fail; they only rewrite the text.

use crate::filter::FilterFlags;
use std::fmt::Write;

const EMAIL_EXTRA: &str = "!#$%&'*+-=?^_`{|}~@.[]";
const URL_EXTRA: &str = "$-_.+!*'(),{}|\\^~[]`<>#%\";/?:@&=";

/// Applies the low/high strip and encode flags shared by the string filters.
pub(crate) fn string_flags(text: &str, flags: FilterFlags) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '&' && flags.contains(FilterFlags::ENCODE_AMP) {
            out.push_str("&#38;");
        } else {
            push_ranged(&mut out, c, flags);
        }
    }
    out
}

fn push_ranged(out: &mut String, c: char, flags: FilterFlags) {
    if is_low(c) {
        if flags.contains(FilterFlags::STRIP_LOW) {
            return;
        }
        if flags.contains(FilterFlags::ENCODE_LOW) {
            push_entity(out, c as u32);
            return;
        }
    } else if !c.is_ascii() {
        if flags.contains(FilterFlags::STRIP_HIGH) {
            return;
        }
        if flags.contains(FilterFlags::ENCODE_HIGH) {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                push_entity(out, u32::from(byte));
            }
            return;
        }
    }
    out.push(c);
}

fn is_low(c: char) -> bool {
    (c as u32) < 32
}

fn push_entity(out: &mut String, code: u32) {
    let _ = write!(out, "&#{code};");
}

pub(crate) fn special_chars(text: &str, flags: FilterFlags) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' | '\'' | '<' | '>' | '&' => push_entity(&mut out, c as u32),
            c if is_low(c) && !flags.contains(FilterFlags::STRIP_LOW) => {
                push_entity(&mut out, c as u32);
            }
            c => push_ranged(&mut out, c, flags),
        }
    }
    out
}

pub(crate) fn full_special_chars(text: &str, flags: FilterFlags) -> String {
    let keep_quotes = flags.contains(FilterFlags::NO_ENCODE_QUOTES);
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if !keep_quotes => out.push_str("&quot;"),
            '\'' if !keep_quotes => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

pub(crate) fn email(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || EMAIL_EXTRA.contains(*c))
        .collect()
}

pub(crate) fn url(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || URL_EXTRA.contains(*c))
        .collect()
}

pub(crate) fn number_int(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-'))
        .collect()
}

pub(crate) fn number_float(text: &str, flags: FilterFlags) -> String {
    let fraction = flags.contains(FilterFlags::ALLOW_FRACTION);
    let thousand = flags.contains(FilterFlags::ALLOW_THOUSAND);
    let scientific = flags.contains(FilterFlags::ALLOW_SCIENTIFIC);

    text.chars()
        .filter(|c| match c {
            '0'..='9' | '+' | '-' => true,
            '.' => fraction,
            ',' | '\'' => thousand,
            'e' | 'E' => scientific,
            _ => false,
        })
        .collect()
}

pub(crate) fn add_slashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\'' | '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}

pub(crate) fn encoded(text: &str, flags: FilterFlags) -> String {
    let ranged: String = text
        .chars()
        .filter(|c| {
            let strip_low = is_low(*c) && flags.contains(FilterFlags::STRIP_LOW);
            let strip_high = !c.is_ascii() && flags.contains(FilterFlags::STRIP_HIGH);
            !(strip_low || strip_high)
        })
        .collect();
    urlencoding::encode(&ranged).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_flags_passthrough() {
        assert_eq!(string_flags("<b>Intro & Setup</b>", FilterFlags::NONE), "<b>Intro & Setup</b>");
    }

    #[test]
    fn test_string_flags_low_and_high() {
        assert_eq!(string_flags("a\tb\u{7}", FilterFlags::STRIP_LOW), "ab");
        assert_eq!(string_flags("a\tb", FilterFlags::ENCODE_LOW), "a&#9;b");
        assert_eq!(string_flags("café", FilterFlags::STRIP_HIGH), "caf");
        assert_eq!(string_flags("é", FilterFlags::ENCODE_HIGH), "&#195;&#169;");
        assert_eq!(string_flags("a&b", FilterFlags::ENCODE_AMP), "a&#38;b");
    }

    #[test]
    fn test_special_chars() {
        assert_eq!(
            special_chars("<a href=\"x\">it's</a>", FilterFlags::NONE),
            "&#60;a href=&#34;x&#34;&#62;it&#39;s&#60;/a&#62;"
        );
        assert_eq!(special_chars("a\nb", FilterFlags::NONE), "a&#10;b");
        assert_eq!(special_chars("a\nb", FilterFlags::STRIP_LOW), "ab");
    }

    #[test]
    fn test_full_special_chars() {
        assert_eq!(
            full_special_chars("<p class='x'>\"Q&A\"</p>", FilterFlags::NONE),
            "&lt;p class=&#039;x&#039;&gt;&quot;Q&amp;A&quot;&lt;/p&gt;"
        );
        assert_eq!(
            full_special_chars("'quoted' & \"kept\"", FilterFlags::NO_ENCODE_QUOTES),
            "'quoted' &amp; \"kept\""
        );
    }

    #[test]
    fn test_email_and_url() {
        assert_eq!(email("stu(dent)@exam ple.com"), "student@example.com");
        assert_eq!(url("https://exa mple.com/ä?x=1"), "https://example.com/?x=1");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(number_int("abc-12.5"), "-125");
        assert_eq!(number_float("1,234.5e3", FilterFlags::NONE), "123453");
        assert_eq!(
            number_float("1,234.5e3", FilterFlags::ALLOW_FRACTION | FilterFlags::ALLOW_THOUSAND),
            "1,234.53"
        );
        assert_eq!(number_float("2.5E-3x", FilterFlags::ALLOW_FRACTION | FilterFlags::ALLOW_SCIENTIFIC), "2.5E-3");
    }

    #[test]
    fn test_add_slashes() {
        assert_eq!(add_slashes(r#"O'Reilly "quote" \ end"#), r#"O\'Reilly \"quote\" \\ end"#);
        assert_eq!(add_slashes("a\0b"), "a\\0b");
    }

    #[test]
    fn test_encoded() {
        assert_eq!(encoded("a b&c", FilterFlags::NONE), "a%20b%26c");
        assert_eq!(encoded("a\tb", FilterFlags::STRIP_LOW), "ab");
        assert_eq!(encoded("né", FilterFlags::STRIP_HIGH), "n");
    }
}
