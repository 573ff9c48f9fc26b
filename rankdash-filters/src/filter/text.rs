use rankdash_core::{ArgValue, RawParams, RequestArgs, TextFilterConfig, ValidationError};

use super::{Filter, ParseOptions, ParsedArgs};
use crate::codec::{quote, quote_plus};

/// Free-text filter. The last supplied instance wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFilter {
    key: String,
    text: Option<String>,
    codec_plus: bool,
}

impl TextFilter {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: None,
            codec_plus: false,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Treat a literal `+` in the raw value as a space.
    pub fn with_codec_plus(mut self, codec_plus: bool) -> Self {
        self.codec_plus = codec_plus;
        self
    }

    pub fn from_config(config: &TextFilterConfig) -> Self {
        Self {
            key: config.key.clone(),
            text: config.text.clone(),
            codec_plus: config.codec_plus,
        }
    }

    fn parse_value(&self, raw: &RawParams) -> Option<String> {
        let value = raw.get(&self.key).last()?.as_deref()?;
        let value = if self.codec_plus {
            value.replace('+', " ")
        } else {
            value.to_string()
        };
        let value = value.trim();

        (!value.is_empty()).then(|| value.to_string())
    }
}

impl Filter for TextFilter {
    fn key(&self) -> &str {
        &self.key
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn request_args(
        &self,
        raw: &RawParams,
        _options: &ParseOptions,
    ) -> Result<ParsedArgs, ValidationError> {
        let value = ArgValue::from(self.parse_value(raw));
        Ok(ParsedArgs::new(
            RequestArgs::from([(self.key.clone(), value)]),
            false,
        ))
    }

    /// A literal `+` only reads back as a space under `codec_plus`, so
    /// spaces are written as `%20` otherwise.
    fn query_params(&self, args: &RequestArgs) -> Vec<String> {
        let Some(value) = args.get(&self.key).and_then(ArgValue::as_text) else {
            return Vec::new();
        };
        if value.is_empty() {
            return Vec::new();
        }

        let encoded = if self.codec_plus {
            quote_plus(value)
        } else {
            quote(value)
        };
        vec![format!("{}={}", quote_plus(&self.key), encoded)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::FilterContext;
    use crate::params::decode;
    use rankdash_core::FilterValue;

    fn parse(filter: &TextFilter, uri: &str) -> ArgValue {
        let parsed = filter
            .request_args(&decode(uri), &ParseOptions::default())
            .unwrap();
        assert!(!parsed.redirect);
        parsed.args[filter.key()].clone()
    }

    #[test]
    fn test_last_value_wins() {
        let filter = TextFilter::new("q");
        assert_eq!(parse(&filter, "/?q=first&q=second"), ArgValue::text("second"));
    }

    #[test]
    fn test_whitespace_collapses_to_null() {
        let filter = TextFilter::new("q");
        assert_eq!(parse(&filter, "/?q=%20%20"), ArgValue::Null);
        assert_eq!(parse(&filter, "/?q="), ArgValue::Null);
        assert_eq!(parse(&filter, "/?q"), ArgValue::Null);
        assert_eq!(parse(&filter, "/"), ArgValue::Null);
        assert_eq!(parse(&filter, "/?q=%20arms%20"), ArgValue::text("arms"));
    }

    #[test]
    fn test_codec_plus() {
        let plain = TextFilter::new("q");
        let plus = TextFilter::new("q").with_codec_plus(true);
        assert_eq!(parse(&plain, "/?q=light+arms"), ArgValue::text("light+arms"));
        assert_eq!(parse(&plus, "/?q=light+arms+"), ArgValue::text("light arms"));
    }

    #[test]
    fn test_space_survives_without_codec_plus() {
        let filter = TextFilter::new("q");
        let first = parse(&filter, "/rank?q=light%20arms");
        assert_eq!(first, ArgValue::text("light arms"));

        let args = RequestArgs::from([("q".to_string(), first.clone())]);
        let query = format!("/rank?{}", filter.query_params(&args).join("&"));
        assert_eq!(query, "/rank?q=light%20arms");
        assert_eq!(parse(&filter, &query), first);

        let args = RequestArgs::from([("q".to_string(), ArgValue::text("light+arms"))]);
        let query = format!("/rank?{}", filter.query_params(&args).join("&"));
        assert_eq!(parse(&filter, &query), ArgValue::text("light+arms"));
    }

    #[test]
    fn test_filter_dict_passes_through() {
        let filter = TextFilter::new("q");
        let args = RequestArgs::from([("q".to_string(), ArgValue::text("arms"))]);
        let output = filter.filter_dict(&args, &FilterContext::untranslated());
        assert_eq!(output.filter_dict["q"], FilterValue::Text("arms".to_string()));
        assert!(output.labels.is_empty());
        assert!(output.errors.is_empty());
    }

    #[test]
    fn test_query_params() {
        let filter = TextFilter::new("q");
        let args = RequestArgs::from([("q".to_string(), ArgValue::text("a b&c"))]);
        assert_eq!(filter.query_params(&args), vec!["q=a%20b%26c"]);

        let plus = TextFilter::new("q").with_codec_plus(true);
        assert_eq!(plus.query_params(&args), vec!["q=a+b%26c"]);

        let args = RequestArgs::from([("q".to_string(), ArgValue::Null)]);
        assert!(filter.query_params(&args).is_empty());
        assert!(filter.query_params(&RequestArgs::new()).is_empty());
    }

    #[test]
    fn test_keys_and_defaults() {
        let filter = TextFilter::new("q").with_text("Search");
        assert_eq!(filter.text(), Some("Search"));
        assert_eq!(filter.keys().into_iter().collect::<Vec<_>>(), vec!["q"]);
        assert_eq!(filter.default_request_args()["q"], ArgValue::Null);
    }
}
