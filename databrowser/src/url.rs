//! Percent-encoding for query URLs.

// Characters that never need escaping.
fn is_unreserved(ch: char) -> bool {
    matches!(ch, 'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~')
}

// Characters allowed to appear unescaped within a single path segment.
fn is_path_safe(ch: char) -> bool {
    is_unreserved(ch)
        || matches!(
            ch,
            '!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ',' | ';' | '=' | ':' | '@'
        )
}

fn encode(s: &str, is_safe: fn(char) -> bool, plus_for_space: bool) -> String {
    let mut result = String::with_capacity(s.len());
    for ch in s.chars() {
        if is_safe(ch) {
            result.push(ch);
        } else if ch == ' ' && plus_for_space {
            result.push('+');
        } else {
            let mut buf = [0u8; 4];
            for byte in ch.encode_utf8(&mut buf).bytes() {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

/// Encode a value for use within a query string, with spaces as `+`.
pub fn quote_plus(s: &str) -> String {
    encode(s, is_unreserved, true)
}

/// Encode a single path segment. Commas and plus signs are left as-is so that
/// field specifications remain readable.
pub fn quote_path_segment(s: &str) -> String {
    encode(s, is_path_safe, false)
}

/// Encode one part of a path segment whose parts are delimited by `.`, so
/// that the part itself never contains a literal `.`.
pub fn quote_segment_part(s: &str) -> String {
    encode(s, |ch| ch != '.' && is_path_safe(ch), false)
}

/// Decode a percent-encoded string, optionally treating `+` as a space.
///
/// Returns `None` if an escape sequence is truncated or not hexadecimal, or if
/// the decoded bytes are not valid UTF-8.
pub fn unquote(s: &str, plus_as_space: bool) -> Option<String> {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = s
                    .get(i + 1..i + 3)
                    .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))?;
                decoded.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b'+' if plus_as_space => {
                decoded.push(b' ');
                i += 1;
            }
            b => {
                decoded.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(decoded).ok()
}

/// Encode the given key/value pairs as a query string, in order.
pub fn encode_query_string<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", quote_plus(k), quote_plus(v)))
        .collect::<Vec<String>>()
        .join("&")
}

/// Decode a query string into its key/value pairs, in order. Keys without a
/// value are given an empty value.
pub fn decode_query_string(qs: &str) -> Option<Vec<(String, String)>> {
    qs.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            Some((unquote(k, true)?, unquote(v, true)?))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quoting() {
        const TEST_CASES: &[(&str, &str)] = &[
            ("fred", "fred"),
            ("fred smith", "fred+smith"),
            ("1+1=2", "1%2B1%3D2"),
            ("a&b", "a%26b"),
            ("café", "caf%C3%A9"),
            ("2018-03-20T22:31:23", "2018-03-20T22%3A31%3A23"),
        ];
        for (i, (raw, encoded)) in TEST_CASES.iter().enumerate() {
            assert_eq!(quote_plus(raw), *encoded, "test case {}", i);
            assert_eq!(unquote(encoded, true).unwrap(), *raw, "test case {}", i);
        }
    }

    #[test]
    fn path_segments_keep_sort_prefixes() {
        assert_eq!(quote_path_segment("+fa,-fd,fn.html"), "+fa,-fd,fn.html");
        assert_eq!(quote_path_segment("a b/c"), "a%20b%2Fc");
        assert_eq!(unquote("+fa,-fd", false).unwrap(), "+fa,-fd");
    }

    #[test]
    fn bad_escapes() {
        assert_eq!(unquote("%", true), None);
        assert_eq!(unquote("%4", true), None);
        assert_eq!(unquote("%zz", true), None);
        assert_eq!(unquote("%FF", true), None);
    }

    #[test]
    fn query_strings() {
        let qs = encode_query_string(vec![("bob__equals", "fred"), ("bob__equals", "a b")]);
        assert_eq!(qs, "bob__equals=fred&bob__equals=a+b");
        assert_eq!(
            decode_query_string(&qs).unwrap(),
            vec![
                ("bob__equals".to_string(), "fred".to_string()),
                ("bob__equals".to_string(), "a b".to_string()),
            ]
        );
        assert_eq!(
            decode_query_string("a__is_null&&b__equals=").unwrap(),
            vec![
                ("a__is_null".to_string(), "".to_string()),
                ("b__equals".to_string(), "".to_string()),
            ]
        );
    }
}
