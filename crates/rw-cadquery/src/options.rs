//! Directive option converters.
//!
//! Each converter validates one option string and returns a typed value, or
//! an [`OptionError`] describing why the value was rejected.

use std::collections::BTreeMap;
use std::fmt;

use crate::geometry::Rgba;

/// Units accepted by length options.
const LENGTH_UNITS: &[&str] = &["em", "ex", "px", "in", "cm", "mm", "pt", "pc"];

/// Option validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionError {
    /// Value outside the option's accepted domain.
    #[error("invalid option value for \"{option}\": {message}")]
    InvalidValue {
        /// Option key.
        option: String,
        /// Why the value was rejected.
        message: String,
    },
    /// Option key the directive does not recognize.
    #[error("unknown option: \"{0}\"")]
    Unknown(String),
    /// Option that takes a value was given none.
    #[error("option \"{0}\" requires a value")]
    MissingValue(String),
}

impl OptionError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            option: String::new(),
            message: message.into(),
        }
    }

    /// Attach the option key to a value error raised by a bare converter.
    fn for_option(self, key: &str) -> Self {
        match self {
            Self::InvalidValue { message, .. } => Self::InvalidValue {
                option: key.to_owned(),
                message,
            },
            other => other,
        }
    }
}

/// Horizontal alignment of a rendered model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    /// CSS class suffix and attribute value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse an `align` option value.
pub fn horizontal_align(argument: &str) -> Result<Align, OptionError> {
    match argument.trim() {
        "left" => Ok(Align::Left),
        "center" => Ok(Align::Center),
        "right" => Ok(Align::Right),
        other => Err(OptionError::invalid(format!(
            "\"{other}\" unknown; choose from \"left\", \"center\" or \"right\""
        ))),
    }
}

/// Parse a `yes`/`no` option value.
pub fn yes_no(argument: &str) -> Result<bool, OptionError> {
    match argument.trim() {
        "yes" => Ok(true),
        "no" => Ok(false),
        other => Err(OptionError::invalid(format!(
            "\"{other}\" unknown; choose from \"yes\" or \"no\""
        ))),
    }
}

/// Parse a single color channel: a number from 0 to 1 inclusive.
pub fn color_channel_value(argument: &str) -> Result<f64, OptionError> {
    let value: f64 = argument
        .trim()
        .parse()
        .map_err(|_| OptionError::invalid(format!("\"{argument}\" is not a number")))?;

    if !(0.0..=1.0).contains(&value) {
        return Err(OptionError::invalid(
            "must be from 0 to 1, with any fractional value in between",
        ));
    }

    Ok(value)
}

/// Parse an RGBA quadruplet separated by commas or whitespace.
///
/// Channels are returned in input order.
pub fn rgba(argument: &str) -> Result<Rgba, OptionError> {
    let entries: Vec<&str> = if argument.contains(',') {
        argument.split(',').collect()
    } else {
        argument.split_whitespace().collect()
    };

    let [r, g, b, a] = entries.as_slice() else {
        return Err(OptionError::invalid("RGBA color must consist of 4 values"));
    };

    Ok(Rgba::new(
        color_channel_value(r)?,
        color_channel_value(g)?,
        color_channel_value(b)?,
        color_channel_value(a)?,
    ))
}

/// Parse a length with an optional CSS unit.
pub fn length_or_unitless(argument: &str) -> Result<String, OptionError> {
    parse_length(argument, false)
}

/// Parse a length with an optional CSS unit or a percentage.
pub fn length_or_percentage_or_unitless(argument: &str) -> Result<String, OptionError> {
    parse_length(argument, true)
}

fn parse_length(argument: &str, allow_percent: bool) -> Result<String, OptionError> {
    let trimmed = argument.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    let unit = unit.trim();

    if number.is_empty() || number.parse::<f64>().is_err() {
        return Err(OptionError::invalid(format!(
            "\"{trimmed}\" is not a valid length"
        )));
    }

    let unit_ok = unit.is_empty() || LENGTH_UNITS.contains(&unit) || (allow_percent && unit == "%");
    if !unit_ok {
        let valid = if allow_percent {
            format!("{}, %", LENGTH_UNITS.join(", "))
        } else {
            LENGTH_UNITS.join(", ")
        };
        return Err(OptionError::invalid(format!(
            "unknown unit \"{unit}\" (valid: {valid})"
        )));
    }

    Ok(format!("{number}{unit}"))
}

/// Parse a whitespace-separated list of CSS class names.
///
/// Names are lowercased and every run of characters outside `[a-z0-9]`
/// becomes a single hyphen.
pub fn class_option(argument: &str) -> Result<Vec<String>, OptionError> {
    let mut classes = Vec::new();

    for word in argument.split_whitespace() {
        let class = normalize_class(word);
        if class.is_empty() {
            return Err(OptionError::invalid(format!(
                "cannot make \"{word}\" into a class name"
            )));
        }
        classes.push(class);
    }

    if classes.is_empty() {
        return Err(OptionError::invalid("argument required but none supplied"));
    }

    Ok(classes)
}

fn normalize_class(word: &str) -> String {
    let mut class = String::with_capacity(word.len());
    let mut pending_hyphen = false;

    for c in word.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !class.is_empty() {
                class.push('-');
            }
            pending_hyphen = false;
            class.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    class
}

/// Option keys a directive accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKey {
    Align,
    Alt,
    Color,
    FigClass,
    FigWidth,
    Height,
    IncludeSource,
    InlineUri,
    Name,
    Select,
    Width,
}

impl OptionKey {
    /// Key as written in directive attributes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Align => "align",
            Self::Alt => "alt",
            Self::Color => "color",
            Self::FigClass => "figclass",
            Self::FigWidth => "figwidth",
            Self::Height => "height",
            Self::IncludeSource => "include-source",
            Self::InlineUri => "inline-uri",
            Self::Name => "name",
            Self::Select => "select",
            Self::Width => "width",
        }
    }
}

/// Validated directive options.
///
/// Unset options stay `None`; each directive applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveOptions {
    pub align: Option<Align>,
    pub alt: Option<String>,
    pub color: Option<Rgba>,
    pub figclass: Vec<String>,
    pub figwidth: Option<String>,
    pub height: Option<String>,
    /// Explicit `include-source`; `None` inherits the build-wide default.
    pub include_source: Option<bool>,
    pub inline_uri: bool,
    pub name: Option<String>,
    pub select: Option<String>,
    pub width: Option<String>,
}

impl DirectiveOptions {
    /// Validate raw attributes against the keys a directive accepts.
    ///
    /// Values of `None` are bare flags (`{inline-uri}`).
    pub fn parse(
        attrs: &BTreeMap<String, Option<String>>,
        allowed: &[OptionKey],
    ) -> Result<Self, OptionError> {
        let mut options = Self::default();

        for (key, value) in attrs {
            let option = allowed
                .iter()
                .copied()
                .find(|k| k.as_str() == key)
                .ok_or_else(|| OptionError::Unknown(key.clone()))?;

            if option == OptionKey::InlineUri {
                options.inline_uri = true;
                continue;
            }

            let value = value
                .as_deref()
                .ok_or_else(|| OptionError::MissingValue(key.clone()))?;
            options
                .apply(option, value)
                .map_err(|e| e.for_option(key))?;
        }

        Ok(options)
    }

    fn apply(&mut self, option: OptionKey, value: &str) -> Result<(), OptionError> {
        match option {
            OptionKey::Align => self.align = Some(horizontal_align(value)?),
            OptionKey::Alt => self.alt = Some(value.to_owned()),
            OptionKey::Color => self.color = Some(rgba(value)?),
            OptionKey::FigClass => self.figclass = class_option(value)?,
            OptionKey::FigWidth => self.figwidth = Some(length_or_percentage_or_unitless(value)?),
            OptionKey::Height => self.height = Some(length_or_percentage_or_unitless(value)?),
            OptionKey::IncludeSource => self.include_source = Some(yes_no(value)?),
            OptionKey::InlineUri => self.inline_uri = true,
            OptionKey::Name => self.name = Some(value.trim().to_owned()),
            OptionKey::Select => self.select = Some(value.trim().to_owned()),
            OptionKey::Width => self.width = Some(length_or_percentage_or_unitless(value)?),
        }
        Ok(())
    }

    /// Selection key, defaulting to `result`.
    #[must_use]
    pub fn select_key(&self) -> &str {
        self.select.as_deref().unwrap_or(crate::select::DEFAULT_SELECT)
    }

    /// Resolve `include-source` against the build-wide default.
    #[must_use]
    pub fn include_source(&self, config_default: bool) -> bool {
        include_source(self.include_source, config_default)
    }
}

/// Decide whether the source listing is shown.
///
/// An explicit `yes`/`no` wins; otherwise the config value applies.
#[must_use]
pub fn include_source(option_value: Option<bool>, config_value: bool) -> bool {
    option_value.unwrap_or(config_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn attrs(pairs: &[(&str, Option<&str>)]) -> BTreeMap<String, Option<String>> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.map(str::to_owned)))
            .collect()
    }

    #[test]
    fn test_rgba_comma_separator() {
        let result = rgba("0.1, 0.2, 0.3, 1").unwrap();
        assert_eq!(result, Rgba::new(0.1, 0.2, 0.3, 1.0));
    }

    #[test]
    fn test_rgba_space_separator() {
        let result = rgba("0.1 0.2 0.3 1").unwrap();
        assert_eq!(result, Rgba::new(0.1, 0.2, 0.3, 1.0));
    }

    #[test]
    fn test_rgba_separators_agree() {
        assert_eq!(rgba("0.1,0.2,0.3,1"), rgba("0.1 0.2 0.3 1"));
    }

    #[test]
    fn test_rgba_wrong_token_count() {
        assert!(rgba("0.1,0.2,0.3").is_err());
        assert!(rgba("0.1 0.2 0.3").is_err());
        assert!(rgba("0.1,0.2,0.3,0.4,0.5").is_err());
        assert!(rgba("0.1 0.2 0.3 0.4 0.5").is_err());
    }

    #[test]
    fn test_rgba_out_of_range_fails() {
        assert!(rgba("0.1 0.2 0.3 1.5").is_err());
    }

    #[test]
    fn test_color_channel_zero() {
        assert_eq!(color_channel_value("0").unwrap(), 0.0);
    }

    #[test]
    fn test_color_channel_one() {
        assert_eq!(color_channel_value("1").unwrap(), 1.0);
    }

    #[test]
    fn test_color_channel_fraction_leading_zero() {
        assert_eq!(color_channel_value("0.5").unwrap(), 0.5);
    }

    #[test]
    fn test_color_channel_fraction_no_leading_zero() {
        assert_eq!(color_channel_value(".5").unwrap(), 0.5);
    }

    #[test]
    fn test_color_channel_greater_than_one() {
        assert!(color_channel_value("2").is_err());
    }

    #[test]
    fn test_color_channel_less_than_zero() {
        assert!(color_channel_value("-1").is_err());
    }

    #[test]
    fn test_color_channel_non_numeric() {
        assert!(color_channel_value("a").is_err());
    }

    #[test]
    fn test_horizontal_align() {
        assert_eq!(horizontal_align("left").unwrap(), Align::Left);
        assert_eq!(horizontal_align("center").unwrap(), Align::Center);
        assert_eq!(horizontal_align("right").unwrap(), Align::Right);
        assert!(horizontal_align("justify").is_err());
        assert!(horizontal_align("Left").is_err());
        assert!(horizontal_align("").is_err());
    }

    #[test]
    fn test_yes_no() {
        assert!(yes_no("yes").unwrap());
        assert!(!yes_no("no").unwrap());
        assert!(yes_no("true").is_err());
        assert!(yes_no("").is_err());
    }

    #[test]
    fn test_lengths() {
        assert_eq!(length_or_unitless("500px").unwrap(), "500px");
        assert_eq!(length_or_unitless("500").unwrap(), "500");
        assert!(length_or_unitless("50%").is_err());
        assert_eq!(length_or_percentage_or_unitless("50%").unwrap(), "50%");
        assert_eq!(length_or_percentage_or_unitless("2.5 em").unwrap(), "2.5em");
        assert!(length_or_percentage_or_unitless("wide").is_err());
        assert!(length_or_percentage_or_unitless("10parsecs").is_err());
    }

    #[test]
    fn test_class_option() {
        assert_eq!(
            class_option("Wide  my_model").unwrap(),
            vec!["wide".to_owned(), "my-model".to_owned()]
        );
        assert!(class_option("").is_err());
        assert!(class_option("!!!").is_err());
    }

    #[test]
    fn test_include_source_inheritance() {
        assert!(include_source(None, true));
        assert!(!include_source(None, false));
        assert!(include_source(Some(true), false));
        assert!(!include_source(Some(false), true));
    }

    #[test]
    fn test_parse_options() {
        let attrs = attrs(&[
            ("align", Some("center")),
            ("color", Some("1 0 0 1")),
            ("include-source", Some("no")),
            ("inline-uri", None),
            ("select", Some("part")),
        ]);
        let allowed = [
            OptionKey::Align,
            OptionKey::Color,
            OptionKey::IncludeSource,
            OptionKey::InlineUri,
            OptionKey::Select,
        ];

        let options = DirectiveOptions::parse(&attrs, &allowed).unwrap();

        assert_eq!(options.align, Some(Align::Center));
        assert_eq!(options.color, Some(Rgba::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(options.include_source, Some(false));
        assert!(options.inline_uri);
        assert_eq!(options.select_key(), "part");
    }

    #[test]
    fn test_parse_options_unknown_key() {
        let attrs = attrs(&[("colour", Some("red"))]);
        let err = DirectiveOptions::parse(&attrs, &[OptionKey::Color]).unwrap_err();
        assert_eq!(err, OptionError::Unknown("colour".to_owned()));
    }

    #[test]
    fn test_parse_options_invalid_value_names_key() {
        let attrs = attrs(&[("align", Some("middle"))]);
        let err = DirectiveOptions::parse(&attrs, &[OptionKey::Align]).unwrap_err();
        assert!(err.to_string().contains("\"align\""));
    }

    #[test]
    fn test_parse_options_missing_value() {
        let attrs = attrs(&[("select", None)]);
        let err = DirectiveOptions::parse(&attrs, &[OptionKey::Select]).unwrap_err();
        assert_eq!(err, OptionError::MissingValue("select".to_owned()));
    }

    #[test]
    fn test_select_key_default() {
        assert_eq!(DirectiveOptions::default().select_key(), "result");
    }
}
