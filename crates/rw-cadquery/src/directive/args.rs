//! Directive argument parsing.
//!
//! Parses the `[argument]{key="value" flag}` part of a directive opening.

use std::collections::BTreeMap;

/// Bracket argument and attributes of a directive opening.
///
/// Attributes without `=` are bare flags and map to `None`:
///
/// ```
/// use rw_cadquery::directive::DirectiveArgs;
///
/// let args = DirectiveArgs::parse("models/bracket.py", r#"height="300px" inline-uri"#);
/// assert_eq!(args.argument, "models/bracket.py");
/// assert_eq!(args.get("height"), Some("300px"));
/// assert!(args.has_flag("inline-uri"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveArgs {
    /// Content from brackets (empty if not provided).
    pub argument: String,
    /// Attributes from braces, keyed by option name.
    pub attrs: BTreeMap<String, Option<String>>,
}

impl DirectiveArgs {
    /// Parse the bracket content and the attribute string (without braces).
    #[must_use]
    pub fn parse(argument: &str, attrs_str: &str) -> Self {
        let mut args = Self {
            argument: argument.trim().to_owned(),
            ..Self::default()
        };

        let mut remaining = attrs_str.trim();
        while !remaining.is_empty() {
            let (key, rest) = split_key(remaining);
            if key.is_empty() {
                // Skip a stray character such as a lone `=` or quote
                let mut chars = remaining.chars();
                chars.next();
                remaining = chars.as_str().trim_start();
                continue;
            }

            if let Some(after_eq) = rest.strip_prefix('=') {
                let (value, rest) = parse_value(after_eq);
                args.attrs.insert(key.to_owned(), Some(value.to_owned()));
                remaining = rest.trim_start();
            } else {
                args.attrs.insert(key.to_owned(), None);
                remaining = rest.trim_start();
            }
        }

        args
    }

    /// Get an attribute value by key (`None` for flags and missing keys).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Option::as_deref)
    }

    /// Whether `key` is present, with or without a value.
    #[must_use]
    pub fn has_flag(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }
}

/// Split a leading attribute key off `s`.
fn split_key(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| c == '=' || c.is_whitespace() || c == '"' || c == '\'')
        .unwrap_or(s.len());
    (&s[..end], &s[end..])
}

/// Parse `"value"`, `'value'` or a bare value up to whitespace.
///
/// An unterminated quote takes the rest of the string.
fn parse_value(s: &str) -> (&str, &str) {
    for quote in ['"', '\''] {
        if let Some(stripped) = s.strip_prefix(quote) {
            return match stripped.find(quote) {
                Some(end) => (&stripped[..end], &stripped[end + 1..]),
                None => (stripped, ""),
            };
        }
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    (&s[..end], &s[end..])
}
