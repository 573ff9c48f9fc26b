//! Text and JSON helpers shared by widget producers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::FormatError;

static TITLE_BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\[\]]").expect("valid regex"));
static TITLE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(.+?)\]").expect("valid regex"));

/// Remove the square brackets used to mark bold runs in a title.
///
/// `the [UK]'s list of “[Countries of Concern]”` becomes
/// `the UK's list of “Countries of Concern”`.
pub fn format_title_plain(title: &str) -> String {
    TITLE_BRACKETS.replace_all(title, "").into_owned()
}

/// Concatenate the bold runs of a title.
///
/// `the [UK]'s list of “[Countries of Concern]”` becomes
/// `UK Countries of Concern`.
pub fn format_title_bold_only(title: &str) -> String {
    TITLE_BOLD
        .captures_iter(title)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Substitute `<{name}>` (or bare `{name}`) placeholders in a translated
/// template. `{{` and `}}` are literal braces.
pub fn format_i18n(template: &str, values: &BTreeMap<String, String>) -> Result<String, FormatError> {
    let original = template;
    let template = template.replace("<{", "{").replace("}>", "}");
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let name: String = chars.by_ref().take_while(|&c| c != '}').collect();
                let value = values
                    .get(&name)
                    .ok_or_else(|| FormatError::MissingPlaceholder {
                        name: name.clone(),
                        template: original.to_string(),
                    })?;
                out.push_str(value);
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

/// Recursively drop nulls, empty strings and empty containers.
///
/// Returns `None` when nothing is left.
pub fn prune(value: Value) -> Option<Value> {
    let value = match value {
        Value::Null => return None,
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter_map(|(k, v)| prune(v).map(|v| (k, v)))
                .collect(),
        ),
        other => other,
    };

    let empty = match &value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    };

    (!empty).then_some(value)
}
