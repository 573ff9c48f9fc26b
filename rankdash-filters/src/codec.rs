//! Percent codecs matching form encoding (`+` for space).

/// Percent-encode everything except ASCII alphanumerics and `-._~`,
/// writing spaces as `+`.
pub fn quote_plus(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

/// Percent-encode everything except ASCII alphanumerics and `-._~`,
/// writing spaces as `%20`.
pub fn quote(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Percent-decode, leaving `+` untouched. Invalid UTF-8 is replaced.
pub fn unquote(value: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(value.as_bytes())).into_owned()
}

/// Percent-decode after turning `+` into a space.
pub fn unquote_plus(value: &str) -> String {
    unquote(&value.replace('+', " "))
}

/// `key=v1,v2,...` with every component encoded and literal commas between
/// values.
pub(crate) fn quote_key_values<'a, I>(key: &str, values: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let values = values
        .into_iter()
        .map(quote_plus)
        .collect::<Vec<_>>()
        .join(",");
    format!("{}={}", quote_plus(key), values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plus() {
        assert_eq!(quote_plus("Palestine, State of"), "Palestine%2C+State+of");
        assert_eq!(quote_plus("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(quote_plus("a+b/c"), "a%2Bb%2Fc");
        assert_eq!(quote_plus("Côte"), "C%C3%B4te");
    }

    #[test]
    fn test_quote_keeps_space_distinct_from_plus() {
        assert_eq!(quote("light arms"), "light%20arms");
        assert_eq!(quote("a+b"), "a%2Bb");
        assert_eq!(unquote(&quote("light arms+")), "light arms+");
    }

    #[test]
    fn test_unquote_keeps_plus() {
        assert_eq!(unquote("a+b%2C"), "a+b,");
        assert_eq!(unquote_plus("a+b%2Bc"), "a b+c");
        assert_eq!(unquote("%ZZ"), "%ZZ");
        assert_eq!(unquote("C%C3%B4te"), "Côte");
    }

    #[test]
    fn test_quote_key_values() {
        assert_eq!(quote_key_values("country", ["France", "UK"]), "country=France,UK");
        assert_eq!(quote_key_values("q", ["a b"]), "q=a+b");
    }
}
