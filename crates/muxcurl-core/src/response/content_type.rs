//! Parse a `Content-Type` header value into media type and charset.

/// Extracts `(media_type, charset)` from a `Content-Type` value, both
/// lower-cased. Returns `None` when no `type/subtype` token is present.
///
/// `"text/HTML; Charset=UTF-8"` → `("text/html", Some("utf-8"))`
pub fn parse_content_type(value: &str) -> Option<(String, Option<String>)> {
    let mut parts = value.split(';');
    let media = parts.next()?.trim();
    let (kind, sub) = media.split_once('/')?;
    if !is_token(kind) || !is_token(sub) {
        return None;
    }
    let charset = parts.find_map(|param| {
        let (name, val) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let val = val.trim().trim_matches('"');
        if val.is_empty() {
            None
        } else {
            Some(val.to_ascii_lowercase())
        }
    });
    Some((media.to_ascii_lowercase(), charset))
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_and_charset_lowercased() {
        assert_eq!(
            parse_content_type("text/HTML; Charset=UTF-8"),
            Some(("text/html".to_string(), Some("utf-8".to_string())))
        );
    }

    #[test]
    fn charset_is_optional() {
        assert_eq!(
            parse_content_type("application/json"),
            Some(("application/json".to_string(), None))
        );
        assert_eq!(
            parse_content_type("multipart/form-data; boundary=xyz"),
            Some(("multipart/form-data".to_string(), None))
        );
    }

    #[test]
    fn quoted_charset_and_extra_params() {
        assert_eq!(
            parse_content_type("application/xml; q=0.9; charset=\"ISO-8859-1\""),
            Some(("application/xml".to_string(), Some("iso-8859-1".to_string())))
        );
    }

    #[test]
    fn rejects_values_without_media_type() {
        assert_eq!(parse_content_type(""), None);
        assert_eq!(parse_content_type("garbage"), None);
        assert_eq!(parse_content_type("/json"), None);
    }
}
